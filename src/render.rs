//! Offline rendering of the CRD and of the objects an instance would own.

use kube::CustomResourceExt;
use lavinmq_api::LavinMQ;
use lavinmq_reconciler::build_all;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid LavinMQ manifest: {0}")]
    Manifest(#[source] serde_yaml::Error),

    #[error("failed to serialize {kind}: {source}")]
    Serialize {
        kind: &'static str,
        #[source]
        source: serde_yaml::Error,
    },
}

/// The `LavinMQ` CustomResourceDefinition as YAML.
pub fn crd_yaml() -> Result<String, RenderError> {
    to_yaml("CustomResourceDefinition", &LavinMQ::crd())
}

/// Parse a `LavinMQ` manifest. JSON is accepted as a subset of YAML.
pub fn parse_manifest(manifest: &str) -> Result<LavinMQ, RenderError> {
    serde_yaml::from_str(manifest).map_err(RenderError::Manifest)
}

/// Render every object `instance` would own as a multi-document YAML stream,
/// in reconcile order. Owner references are omitted since the instance has
/// no cluster identity yet.
pub fn render_objects(instance: &LavinMQ) -> Result<String, RenderError> {
    let desired = build_all(instance);

    let mut documents = vec![to_yaml("ConfigMap", &desired.config_map)?];
    documents.push(to_yaml("Service", &desired.service)?);
    for pvc in &desired.pvcs {
        documents.push(to_yaml("PersistentVolumeClaim", pvc)?);
    }
    documents.push(to_yaml("StatefulSet", &desired.statefulset)?);

    Ok(documents
        .iter()
        .map(|doc| format!("---\n{doc}"))
        .collect::<String>())
}

fn to_yaml<T: Serialize>(kind: &'static str, value: &T) -> Result<String, RenderError> {
    serde_yaml::to_string(value).map_err(|source| RenderError::Serialize { kind, source })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    const MANIFEST: &str = r"
apiVersion: cloudamqp.com/v1alpha1
kind: LavinMQ
metadata:
  name: broker
  namespace: queues
spec:
  replicas: 2
  dataVolumeClaim:
    resources:
      requests:
        storage: 1Gi
";

    #[test]
    fn test_crd_names_the_group() {
        let crd = crd_yaml().unwrap();
        assert!(crd.contains("lavinmqs.cloudamqp.com"));
        assert!(crd.contains("v1alpha1"));
    }

    #[test]
    fn test_render_objects_in_reconcile_order() {
        let instance = parse_manifest(MANIFEST).unwrap();
        let rendered = render_objects(&instance).unwrap();

        let position = |needle: &str| rendered.find(needle).unwrap();
        assert!(position("broker-config") < position("broker-service"));
        assert!(position("broker-service") < position("broker-data-0"));
        assert!(position("broker-data-1") < position("kind: StatefulSet"));
        assert_eq!(rendered.matches("---\n").count(), 5);
        assert!(!rendered.contains("ownerReferences"));
    }

    #[test]
    fn test_bad_manifest_is_rejected() {
        let result = parse_manifest("spec: [1, 2]");
        assert!(matches!(result, Err(RenderError::Manifest(_))));
    }
}
