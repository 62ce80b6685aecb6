//! The `LavinMQ` custom resource.

use k8s_openapi::api::core::v1::{ContainerPort, PersistentVolumeClaimSpec, SecretReference};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::LavinMQConfig;

/// Image used when the spec does not name one.
pub const DEFAULT_IMAGE: &str = "cloudamqp/lavinmq:2.2.0";

/// Replica count used when the spec does not set one.
pub const DEFAULT_REPLICAS: i32 = 1;

/// Desired state of a LavinMQ cluster.
#[derive(CustomResource, Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "cloudamqp.com",
    version = "v1alpha1",
    kind = "LavinMQ",
    plural = "lavinmqs",
    shortname = "lmq",
    namespaced,
    status = "LavinMQStatus",
    derive = "PartialEq",
    printcolumn = r#"{"name":"Image","type":"string","jsonPath":".spec.image"}"#,
    printcolumn = r#"{"name":"Replicas","type":"integer","jsonPath":".spec.replicas"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct LavinMQSpec {
    #[serde(default = "default_image")]
    pub image: String,

    #[serde(default = "default_replicas")]
    #[schemars(range(min = 1, max = 3))]
    pub replicas: i32,

    #[serde(default = "default_ports")]
    pub ports: Vec<ContainerPort>,

    /// Claim template for the broker data directory. The access mode is
    /// always forced to `ReadWriteOnce`.
    #[serde(rename = "dataVolumeClaim")]
    pub data_volume_claim: PersistentVolumeClaimSpec,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub etcd_endpoints: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_secret: Option<SecretReference>,

    #[serde(default)]
    pub config: LavinMQConfig,
}

impl LavinMQSpec {
    /// Create a spec with defaults for everything but the data volume claim.
    pub fn new(data_volume_claim: PersistentVolumeClaimSpec) -> Self {
        Self {
            image: default_image(),
            replicas: default_replicas(),
            ports: default_ports(),
            data_volume_claim,
            etcd_endpoints: Vec::new(),
            tls_secret: None,
            config: LavinMQConfig::default(),
        }
    }

    /// Name of the referenced TLS secret, if one is configured.
    pub fn tls_secret_name(&self) -> Option<&str> {
        self.tls_secret
            .as_ref()
            .and_then(|secret| secret.name.as_deref())
            .filter(|name| !name.is_empty())
    }

    /// Whether the instance is configured to join an etcd-backed cluster.
    pub fn clustering_enabled(&self) -> bool {
        !self.etcd_endpoints.is_empty()
    }
}

/// Observed state of a LavinMQ cluster.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LavinMQStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

/// Status of a condition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

/// A single status condition, upserted by `condition_type`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: ConditionStatus,
    pub reason: String,
    #[serde(default)]
    pub message: String,
    /// RFC 3339 timestamp of the last status flip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

fn default_image() -> String {
    DEFAULT_IMAGE.to_string()
}

const fn default_replicas() -> i32 {
    DEFAULT_REPLICAS
}

/// Ports exposed when the spec does not declare any: AMQP, HTTP management
/// and MQTT.
pub fn default_ports() -> Vec<ContainerPort> {
    [("amqp", 5672), ("http", 15672), ("mqtt", 1883)]
        .into_iter()
        .map(|(name, port)| ContainerPort {
            name: Some(name.to_string()),
            container_port: port,
            ..ContainerPort::default()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::indexing_slicing)]

    use super::*;
    use kube::CustomResourceExt;

    const MINIMAL: &str = r#"
apiVersion: cloudamqp.com/v1alpha1
kind: LavinMQ
metadata:
  name: broker
  namespace: default
spec:
  dataVolumeClaim:
    resources:
      requests:
        storage: 1Gi
"#;

    #[test]
    fn test_minimal_manifest_gets_defaults() {
        let instance: LavinMQ = serde_yaml::from_str(MINIMAL).unwrap();
        assert_eq!(instance.spec.image, DEFAULT_IMAGE);
        assert_eq!(instance.spec.replicas, 1);
        assert_eq!(instance.spec.ports.len(), 3);
        assert!(instance.spec.etcd_endpoints.is_empty());
        assert!(instance.spec.tls_secret_name().is_none());
        assert!(!instance.spec.clustering_enabled());
    }

    #[test]
    fn test_default_ports() {
        let ports = default_ports();
        let pairs: Vec<(Option<&str>, i32)> = ports
            .iter()
            .map(|p| (p.name.as_deref(), p.container_port))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (Some("amqp"), 5672),
                (Some("http"), 15672),
                (Some("mqtt"), 1883)
            ]
        );
    }

    #[test]
    fn test_tls_secret_name_ignores_empty_name() {
        let mut spec = LavinMQSpec::new(PersistentVolumeClaimSpec::default());
        spec.tls_secret = Some(SecretReference {
            name: Some(String::new()),
            namespace: None,
        });
        assert!(spec.tls_secret_name().is_none());

        spec.tls_secret = Some(SecretReference {
            name: Some("broker-tls".to_string()),
            namespace: None,
        });
        assert_eq!(spec.tls_secret_name(), Some("broker-tls"));
    }

    #[test]
    fn test_crd_metadata() {
        let crd = LavinMQ::crd();
        assert_eq!(crd.spec.group, "cloudamqp.com");
        assert_eq!(crd.spec.names.kind, "LavinMQ");
        assert_eq!(crd.spec.names.plural, "lavinmqs");
        assert_eq!(crd.spec.scope, "Namespaced");
    }

    #[test]
    fn test_condition_serializes_type_field() {
        let condition = Condition {
            condition_type: "Available".to_string(),
            status: ConditionStatus::True,
            reason: "Reconciled".to_string(),
            ..Condition::default()
        };
        let json = serde_json::to_value(&condition).unwrap();
        assert_eq!(json["type"], "Available");
        assert_eq!(json["status"], "True");
    }
}
