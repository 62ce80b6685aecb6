//! Labels, names and ownership shared by every managed object.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::{Resource, ResourceExt};
use lavinmq_api::LavinMQ;

use crate::error::{Error, Result};

pub const NAME_LABEL: &str = "app.kubernetes.io/name";
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
pub const INSTANCE_LABEL: &str = "app.kubernetes.io/instance";

pub const APP_NAME: &str = "lavinmq";
pub const MANAGED_BY: &str = "lavinmq-operator";

/// Canonical label set for every object owned by `instance`.
pub fn labels(instance: &LavinMQ) -> BTreeMap<String, String> {
    BTreeMap::from([
        (NAME_LABEL.to_string(), APP_NAME.to_string()),
        (MANAGED_BY_LABEL.to_string(), MANAGED_BY.to_string()),
        (INSTANCE_LABEL.to_string(), instance.name_any()),
    ])
}

/// `<instance>-<suffix>`.
pub fn name(instance: &LavinMQ, suffix: &str) -> String {
    format!("{}-{suffix}", instance.name_any())
}

pub fn config_map_name(instance: &LavinMQ) -> String {
    name(instance, "config")
}

pub fn service_name(instance: &LavinMQ) -> String {
    name(instance, "service")
}

pub fn statefulset_name(instance: &LavinMQ) -> String {
    instance.name_any()
}

/// Claim name for the replica with the given ordinal.
pub fn pvc_name(instance: &LavinMQ, index: i32) -> String {
    name(instance, &format!("data-{index}"))
}

/// Namespace of the instance; objects are always created next to it.
pub fn namespace(instance: &LavinMQ) -> String {
    instance.namespace().unwrap_or_else(|| "default".to_string())
}

/// Metadata for a managed object: name, the instance's namespace and the
/// canonical labels. Ownership is attached at create time.
pub fn object_meta(instance: &LavinMQ, name: String) -> ObjectMeta {
    ObjectMeta {
        name: Some(name),
        namespace: Some(namespace(instance)),
        labels: Some(labels(instance)),
        ..ObjectMeta::default()
    }
}

/// Controller owner reference pointing at `instance`.
///
/// # Errors
///
/// Returns [`Error::InvalidSpec`] when the instance has not been persisted
/// yet (no `uid`), since the platform could not resolve the reference.
pub fn owner_reference(instance: &LavinMQ) -> Result<OwnerReference> {
    instance.controller_owner_ref(&()).ok_or_else(|| {
        Error::invalid_spec(format!(
            "LavinMQ '{}' has no uid; cannot own dependents",
            instance.name_any()
        ))
    })
}

/// Attach a controller owner reference to `meta`, replacing any previous
/// reference to the same owner.
///
/// # Errors
///
/// See [`owner_reference`].
pub fn set_owner(meta: &mut ObjectMeta, instance: &LavinMQ) -> Result<()> {
    let owner = owner_reference(instance)?;
    let refs = meta.owner_references.get_or_insert_with(Vec::new);
    refs.retain(|existing| existing.uid != owner.uid);
    refs.push(owner);
    Ok(())
}
