//! Desired `PersistentVolumeClaim`s, one per replica ordinal.

use k8s_openapi::api::core::v1::{PersistentVolumeClaim, PersistentVolumeClaimSpec};
use lavinmq_api::LavinMQ;

use super::READ_WRITE_ONCE;
use crate::identity;

/// The spec's claim template with the access mode pinned to
/// `ReadWriteOnce`.
pub fn claim_spec(instance: &LavinMQ) -> PersistentVolumeClaimSpec {
    PersistentVolumeClaimSpec {
        access_modes: Some(vec![READ_WRITE_ONCE.to_string()]),
        ..instance.spec.data_volume_claim.clone()
    }
}

/// Desired claims `<instance>-data-0 .. <instance>-data-<replicas - 1>`.
pub fn build(instance: &LavinMQ) -> Vec<PersistentVolumeClaim> {
    (0..instance.spec.replicas.max(0))
        .map(|index| PersistentVolumeClaim {
            metadata: identity::object_meta(instance, identity::pvc_name(instance, index)),
            spec: Some(claim_spec(instance)),
            ..PersistentVolumeClaim::default()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::fixtures::instance;

    #[test]
    fn test_one_claim_per_replica() {
        let mut instance = instance("broker");
        instance.spec.replicas = 3;
        let names: Vec<Option<String>> = build(&instance)
            .into_iter()
            .map(|pvc| pvc.metadata.name)
            .collect();
        assert_eq!(
            names,
            vec![
                Some("broker-data-0".to_string()),
                Some("broker-data-1".to_string()),
                Some("broker-data-2".to_string())
            ]
        );
    }

    #[test]
    fn test_access_mode_is_forced() {
        let mut instance = instance("broker");
        instance.spec.data_volume_claim.access_modes =
            Some(vec!["ReadWriteMany".to_string(), "ReadOnlyMany".to_string()]);
        instance.spec.data_volume_claim.storage_class_name = Some("fast".to_string());

        let claims = build(&instance);
        let spec = claims.first().and_then(|pvc| pvc.spec.clone()).unwrap_or_default();
        assert_eq!(spec.access_modes, Some(vec!["ReadWriteOnce".to_string()]));
        assert_eq!(spec.storage_class_name.as_deref(), Some("fast"));
        assert_eq!(spec.resources, instance.spec.data_volume_claim.resources);
    }
}
