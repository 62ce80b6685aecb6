//! Desired-state builders.
//!
//! Every function here is a pure `&LavinMQ -> object` mapping: no clients,
//! no clocks, no randomness. Calling a builder twice on equal input yields
//! equal output, which is what makes the diff engine's "unchanged" answer
//! meaningful.

use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim, Service};
use lavinmq_api::LavinMQ;

pub mod config;
pub mod pvc;
pub mod service;
pub mod statefulset;

/// Broker data directory inside the container.
pub const DATA_DIR: &str = "/var/lib/lavinmq";
/// Key of the rendered configuration inside the `ConfigMap`.
pub const CONFIG_FILE_NAME: &str = "lavinmq.ini";
pub const CONFIG_MOUNT_PATH: &str = "/etc/lavinmq";
pub const TLS_MOUNT_PATH: &str = "/etc/lavinmq/tls";

/// Port replicas use to talk to each other when clustered.
pub const CLUSTERING_PORT: i32 = 5679;
pub const CLUSTERING_PORT_NAME: &str = "clustering";

pub const TCP: &str = "TCP";
pub const READ_WRITE_ONCE: &str = "ReadWriteOnce";

pub const CONTAINER_NAME: &str = "lavinmq";
pub const DATA_VOLUME: &str = "data";
pub const TLS_VOLUME: &str = "tls";

/// All objects one instance should own, in reconcile order.
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredObjects {
    pub config_map: ConfigMap,
    pub service: Service,
    pub pvcs: Vec<PersistentVolumeClaim>,
    pub statefulset: StatefulSet,
}

/// Build every desired object for `instance`.
pub fn build_all(instance: &LavinMQ) -> DesiredObjects {
    DesiredObjects {
        config_map: config::build(instance),
        service: service::build(instance),
        pvcs: pvc::build(instance),
        statefulset: statefulset::build(instance),
    }
}
