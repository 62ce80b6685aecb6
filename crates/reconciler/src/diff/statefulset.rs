//! `StatefulSet` diff.
//!
//! The live object must run exactly one container. Replicas, image, args
//! and ports are owned outright; for volumes and mounts only the `tls`
//! entry is owned, everything else in those lists is left as found.

use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{Container, PodSpec, Volume, VolumeMount};
use kube::ResourceExt;

use super::{Diff, assign};
use crate::builders::TLS_VOLUME;
use crate::error::{Error, Result};

const KIND: &str = "StatefulSet";

fn pod_spec(sts: &StatefulSet) -> Option<&PodSpec> {
    sts.spec.as_ref()?.template.spec.as_ref()
}

fn tls_volume(volumes: Option<&Vec<Volume>>) -> Option<&Volume> {
    volumes?.iter().find(|v| v.name == TLS_VOLUME)
}

fn tls_mount(mounts: Option<&Vec<VolumeMount>>) -> Option<&VolumeMount> {
    mounts?.iter().find(|m| m.name == TLS_VOLUME)
}

/// Add, remove or correct the `tls` volume. When a secret-backed volume
/// exists on both sides only the secret name is owned, so platform defaults
/// such as `defaultMode` survive. A `tls` volume with any other source is
/// replaced.
fn sync_tls_volume(volumes: &mut Option<Vec<Volume>>, desired: Option<&Volume>) -> bool {
    let position = volumes
        .as_ref()
        .and_then(|list| list.iter().position(|v| v.name == TLS_VOLUME));

    match (position, desired) {
        (None, None) => false,
        (None, Some(wanted)) => {
            volumes.get_or_insert_with(Vec::new).push(wanted.clone());
            true
        }
        (Some(index), None) => {
            if let Some(list) = volumes.as_mut() {
                list.remove(index);
            }
            true
        }
        (Some(index), Some(wanted)) => {
            let Some(current) = volumes.as_mut().and_then(|list| list.get_mut(index)) else {
                return false;
            };
            match current.secret.as_mut() {
                Some(secret) => {
                    let wanted_secret = wanted.secret.as_ref().and_then(|s| s.secret_name.clone());
                    assign(&mut secret.secret_name, wanted_secret)
                }
                // A volume carries exactly one source; swap the foreign one out whole.
                None => assign(current, wanted.clone()),
            }
        }
    }
}

/// Add or remove the `tls` mount. An existing mount is kept as is.
fn sync_tls_mount(mounts: &mut Option<Vec<VolumeMount>>, desired: Option<&VolumeMount>) -> bool {
    let present = tls_mount(mounts.as_ref()).is_some();
    match (present, desired) {
        (false, Some(wanted)) => {
            mounts.get_or_insert_with(Vec::new).push(wanted.clone());
            true
        }
        (true, None) => {
            if let Some(list) = mounts.as_mut() {
                list.retain(|m| m.name != TLS_VOLUME);
            }
            true
        }
        _ => false,
    }
}

fn sync_container(live: &mut Container, desired: &Container) -> bool {
    let mut changed = false;
    changed |= assign(&mut live.image, desired.image.clone());
    changed |= assign(&mut live.args, desired.args.clone());
    changed |= assign(&mut live.ports, desired.ports.clone());
    changed |= sync_tls_mount(
        &mut live.volume_mounts,
        tls_mount(desired.volume_mounts.as_ref()),
    );
    changed
}

/// Bring the live `StatefulSet` in line with `desired`.
///
/// # Errors
///
/// - [`Error::StructuralMismatch`] when the live pod template does not have
///   exactly one container.
/// - [`Error::InvalidSpec`] when `desired` itself has no container.
pub fn diff(mut live: StatefulSet, desired: &StatefulSet) -> Result<Diff<StatefulSet>> {
    let live_containers = pod_spec(&live).map_or(0, |spec| spec.containers.len());
    if live_containers != 1 {
        return Err(Error::structural_mismatch(
            KIND,
            live.name_any(),
            format!("expected exactly 1 container, found {live_containers}"),
        ));
    }

    let desired_pod = pod_spec(desired);
    let desired_container = desired_pod
        .and_then(|spec| spec.containers.first())
        .ok_or_else(|| {
            Error::invalid_spec(format!("desired {KIND} '{}' has no container", desired.name_any()))
        })?;
    let desired_replicas = desired.spec.as_ref().and_then(|spec| spec.replicas);
    let desired_tls_volume = tls_volume(desired_pod.and_then(|spec| spec.volumes.as_ref()));

    let mut changed = false;
    if let Some(spec) = live.spec.as_mut() {
        changed |= assign(&mut spec.replicas, desired_replicas);

        if let Some(pod) = spec.template.spec.as_mut() {
            if let Some(container) = pod.containers.first_mut() {
                changed |= sync_container(container, desired_container);
            }
            changed |= sync_tls_volume(&mut pod.volumes, desired_tls_volume);
        }
    }

    Ok(Diff::new(live, changed))
}
