//! `PersistentVolumeClaim` diff: only the storage request is owned, and it
//! may only grow.

use std::cmp::Ordering;

use k8s_openapi::api::core::v1::PersistentVolumeClaim;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::ResourceExt;

use super::Diff;
use crate::error::{Error, Result};
use crate::quantity;

const KIND: &str = "PersistentVolumeClaim";
const STORAGE: &str = "storage";

fn storage_request(pvc: &PersistentVolumeClaim) -> Option<&Quantity> {
    pvc.spec
        .as_ref()?
        .resources
        .as_ref()?
        .requests
        .as_ref()?
        .get(STORAGE)
}

/// Grow the live claim to the desired size.
///
/// # Errors
///
/// - [`Error::InvalidSpec`] when the desired claim carries no storage request.
/// - [`Error::PolicyViolation`] when the desired size is smaller than the
///   live one. The live claim is not modified.
/// - [`Error::InvalidQuantity`] when either size cannot be parsed.
pub fn diff(
    mut live: PersistentVolumeClaim,
    desired: &PersistentVolumeClaim,
) -> Result<Diff<PersistentVolumeClaim>> {
    let wanted = storage_request(desired).cloned().ok_or_else(|| {
        Error::invalid_spec(format!(
            "claim '{}' has no storage request",
            desired.name_any()
        ))
    })?;

    let ordering = match storage_request(&live) {
        Some(current) => quantity::compare(&wanted, current)?,
        None => Ordering::Greater,
    };

    match ordering {
        Ordering::Equal => Ok(Diff::unchanged(live)),
        Ordering::Less => Err(Error::policy_violation(
            KIND,
            live.name_any(),
            format!(
                "cannot shrink storage from {} to {}",
                storage_request(&live).map(|q| q.0.as_str()).unwrap_or_default(),
                wanted.0
            ),
        )),
        Ordering::Greater => {
            live.spec
                .get_or_insert_with(Default::default)
                .resources
                .get_or_insert_with(Default::default)
                .requests
                .get_or_insert_with(Default::default)
                .insert(STORAGE.to_string(), wanted);
            Ok(Diff::new(live, true))
        }
    }
}
