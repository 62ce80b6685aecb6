//! Desired `StatefulSet` running the broker.

use k8s_openapi::api::apps::v1::{StatefulSet, StatefulSetSpec};
use k8s_openapi::api::core::v1::{
    ConfigMapVolumeSource, Container, ContainerPort, EnvVar, EnvVarSource, ObjectFieldSelector,
    PersistentVolumeClaim, PodSpec, PodTemplateSpec, SecretVolumeSource, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use lavinmq_api::LavinMQ;

use super::{
    CLUSTERING_PORT, CONFIG_MOUNT_PATH, CONTAINER_NAME, DATA_DIR, DATA_VOLUME, TCP,
    TLS_MOUNT_PATH, TLS_VOLUME, pvc,
};
use crate::identity;

const BROKER_BINARY: &str = "/usr/bin/lavinmq";

/// Container arguments: bind flags, plus the advertised clustering URI built
/// from the pod's ordinal hostname under the headless service. The URI is
/// only passed to a clustered instance with at least one replica.
pub fn args(instance: &LavinMQ) -> Vec<String> {
    let mut args = vec![
        "--bind=0.0.0.0".to_string(),
        "--guest-only-loopback=false".to_string(),
    ];
    if instance.spec.replicas > 0 && instance.spec.clustering_enabled() {
        args.push(format!(
            "--clustering-advertised-uri=tcp://$(POD_NAME).{}.$(POD_NAMESPACE).svc.cluster.local:{CLUSTERING_PORT}",
            identity::service_name(instance)
        ));
    }
    args
}

/// Declared ports with the protocol made explicit, as the API server
/// would default it.
pub fn container_ports(instance: &LavinMQ) -> Vec<ContainerPort> {
    instance
        .spec
        .ports
        .iter()
        .cloned()
        .map(|port| ContainerPort {
            protocol: Some(port.protocol.unwrap_or_else(|| TCP.to_string())),
            ..port
        })
        .collect()
}

/// The `tls` volume, when a TLS secret is referenced.
pub fn tls_volume(instance: &LavinMQ) -> Option<Volume> {
    instance.spec.tls_secret_name().map(|secret| Volume {
        name: TLS_VOLUME.to_string(),
        secret: Some(SecretVolumeSource {
            secret_name: Some(secret.to_string()),
            ..SecretVolumeSource::default()
        }),
        ..Volume::default()
    })
}

/// The read-only `tls` mount, when a TLS secret is referenced.
pub fn tls_mount(instance: &LavinMQ) -> Option<VolumeMount> {
    instance.spec.tls_secret_name().map(|_| VolumeMount {
        name: TLS_VOLUME.to_string(),
        mount_path: TLS_MOUNT_PATH.to_string(),
        read_only: Some(true),
        ..VolumeMount::default()
    })
}

fn pod_field_env(name: &str, field_path: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value_from: Some(EnvVarSource {
            field_ref: Some(ObjectFieldSelector {
                field_path: field_path.to_string(),
                ..ObjectFieldSelector::default()
            }),
            ..EnvVarSource::default()
        }),
        ..EnvVar::default()
    }
}

fn container(instance: &LavinMQ) -> Container {
    let config_volume = identity::config_map_name(instance);
    let mounts = [
        Some(VolumeMount {
            name: DATA_VOLUME.to_string(),
            mount_path: DATA_DIR.to_string(),
            ..VolumeMount::default()
        }),
        Some(VolumeMount {
            name: config_volume,
            mount_path: CONFIG_MOUNT_PATH.to_string(),
            read_only: Some(true),
            ..VolumeMount::default()
        }),
        tls_mount(instance),
    ];

    Container {
        name: CONTAINER_NAME.to_string(),
        image: Some(instance.spec.image.clone()),
        command: Some(vec![BROKER_BINARY.to_string()]),
        args: Some(args(instance)),
        ports: Some(container_ports(instance)),
        env: Some(vec![
            pod_field_env("POD_NAME", "metadata.name"),
            pod_field_env("POD_NAMESPACE", "metadata.namespace"),
        ]),
        volume_mounts: Some(mounts.into_iter().flatten().collect()),
        ..Container::default()
    }
}

fn volumes(instance: &LavinMQ) -> Vec<Volume> {
    let config_map = identity::config_map_name(instance);
    let config = Volume {
        name: config_map.clone(),
        config_map: Some(ConfigMapVolumeSource {
            name: config_map.into(),
            ..ConfigMapVolumeSource::default()
        }),
        ..Volume::default()
    };
    std::iter::once(config).chain(tls_volume(instance)).collect()
}

/// Desired `StatefulSet` for `instance`.
pub fn build(instance: &LavinMQ) -> StatefulSet {
    let labels = identity::labels(instance);
    StatefulSet {
        metadata: identity::object_meta(instance, identity::statefulset_name(instance)),
        spec: Some(StatefulSetSpec {
            replicas: Some(instance.spec.replicas),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..LabelSelector::default()
            },
            service_name: identity::service_name(instance).into(),
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..ObjectMeta::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![container(instance)],
                    volumes: Some(volumes(instance)),
                    ..PodSpec::default()
                }),
            },
            volume_claim_templates: Some(vec![PersistentVolumeClaim {
                metadata: ObjectMeta {
                    name: Some(DATA_VOLUME.to_string()),
                    labels: Some(identity::labels(instance)),
                    ..ObjectMeta::default()
                },
                spec: Some(pvc::claim_spec(instance)),
                ..PersistentVolumeClaim::default()
            }]),
            ..StatefulSetSpec::default()
        }),
        ..StatefulSet::default()
    }
}
