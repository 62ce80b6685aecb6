//! Property-based tests for the builders, diff engine and reconciler.
//!
//! Properties verified:
//! - Building desired objects is deterministic
//! - Claim capacity only grows
//! - Service ports fan out one-to-one plus at most one clustering port
//! - A second cycle over an unchanged instance writes nothing

#![allow(clippy::panic)]

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    ContainerPort, PersistentVolumeClaim, PersistentVolumeClaimSpec, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use lavinmq_api::{LavinMQ, LavinMQSpec};
use lavinmq_reconciler::builders::{self, CLUSTERING_PORT_NAME};
use lavinmq_reconciler::{Error, InMemoryClient, Reconciler, ResourceClient, diff};
use proptest::prelude::*;

/// Test helper: Unwrap a Result or panic with context
fn unwrap_result<T, E: std::fmt::Display>(result: std::result::Result<T, E>, context: &str) -> T {
    match result {
        Ok(value) => value,
        Err(e) => panic!("{}: {}", context, e),
    }
}

fn claim(size: &str) -> PersistentVolumeClaimSpec {
    PersistentVolumeClaimSpec {
        resources: Some(VolumeResourceRequirements {
            requests: Some(BTreeMap::from([(
                "storage".to_string(),
                Quantity(size.to_string()),
            )])),
            ..VolumeResourceRequirements::default()
        }),
        ..PersistentVolumeClaimSpec::default()
    }
}

fn pvc(size: &str) -> PersistentVolumeClaim {
    PersistentVolumeClaim {
        metadata: ObjectMeta {
            name: Some("broker-data-0".to_string()),
            ..ObjectMeta::default()
        },
        spec: Some(claim(size)),
        ..PersistentVolumeClaim::default()
    }
}

fn instance(
    name: &str,
    replicas: i32,
    ports: Vec<ContainerPort>,
    endpoints: Vec<String>,
    heartbeat: Option<u64>,
) -> LavinMQ {
    let mut spec = LavinMQSpec::new(claim("1Gi"));
    spec.replicas = replicas;
    spec.ports = ports;
    spec.etcd_endpoints = endpoints;
    spec.config.amqp.heartbeat = heartbeat;
    LavinMQ {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("default".to_string()),
            uid: Some(format!("uid-{name}")),
            ..ObjectMeta::default()
        },
        spec,
        status: None,
    }
}

fn port_strategy() -> impl Strategy<Value = Vec<ContainerPort>> {
    prop::collection::btree_map("[a-z]{1,8}", 1024..65535i32, 0..8).prop_map(|ports| {
        ports
            .into_iter()
            .filter(|(name, _)| name != CLUSTERING_PORT_NAME)
            .map(|(name, port)| ContainerPort {
                name: Some(name),
                container_port: port,
                ..ContainerPort::default()
            })
            .collect()
    })
}

fn endpoint_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("etcd-[0-9]:2379", 0..4)
}

proptest! {
    /// Property: equal instances always build equal objects and render
    /// byte-identical configuration.
    #[test]
    fn prop_builders_are_deterministic(
        name in "[a-z][a-z0-9]{0,10}",
        replicas in 0..4i32,
        ports in port_strategy(),
        endpoints in endpoint_strategy(),
        heartbeat in prop::option::of(0..600u64),
    ) {
        let a = instance(&name, replicas, ports.clone(), endpoints.clone(), heartbeat);
        let b = instance(&name, replicas, ports, endpoints, heartbeat);
        prop_assert_eq!(builders::build_all(&a), builders::build_all(&b));
        prop_assert_eq!(builders::config::render(&a), builders::config::render(&b));
        prop_assert_eq!(builders::pvc::build(&a).len(), usize::try_from(replicas).unwrap_or(0));
    }

    /// Property: a claim is resized exactly when the desired size is larger,
    /// left alone when equal and refused when smaller.
    #[test]
    fn prop_capacity_only_grows(live in 1..4096u32, desired in 1..4096u32) {
        let result = diff::pvc::diff(pvc(&format!("{live}Mi")), &pvc(&format!("{desired}Mi")));
        match desired.cmp(&live) {
            std::cmp::Ordering::Greater => {
                let merged = unwrap_result(result, "growth should be applied");
                prop_assert!(merged.changed);
            }
            std::cmp::Ordering::Equal => {
                let merged = unwrap_result(result, "equal size should be accepted");
                prop_assert!(!merged.changed);
            }
            std::cmp::Ordering::Less => {
                let is_violation = matches!(result, Err(Error::PolicyViolation { .. }));
                prop_assert!(is_violation);
            }
        }
    }

    /// Property: one service port per declared port, plus exactly one
    /// clustering port whenever any endpoint is configured.
    #[test]
    fn prop_service_port_fan_out(ports in port_strategy(), endpoints in endpoint_strategy()) {
        let declared = ports.len();
        let clustered = !endpoints.is_empty();
        let lavinmq = instance("broker", 1, ports, endpoints, None);
        let service_ports = builders::service::ports(&lavinmq);

        prop_assert_eq!(service_ports.len(), declared + usize::from(clustered));
        let clustering = service_ports
            .iter()
            .filter(|p| p.name.as_deref() == Some(CLUSTERING_PORT_NAME))
            .count();
        prop_assert_eq!(clustering, usize::from(clustered));
        prop_assert!(service_ports.iter().all(|p| p.protocol.as_deref() == Some("TCP")));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: reconciling an unchanged instance twice issues no writes
    /// on the second cycle.
    #[test]
    fn prop_second_cycle_is_idempotent(
        replicas in 1..4i32,
        ports in port_strategy(),
        endpoints in endpoint_strategy(),
        heartbeat in prop::option::of(0..600u64),
    ) {
        let rt = unwrap_result(
            tokio::runtime::Runtime::new(),
            "runtime creation should succeed"
        );
        let (first, second) = unwrap_result(
            rt.block_on(async {
                let client = InMemoryClient::new_arc();
                client
                    .create("default", &instance("broker", replicas, ports, endpoints, heartbeat))
                    .await?;
                let reconciler = Reconciler::new(client.clone());
                let first = reconciler.reconcile("default", "broker").await?;
                let before = client.write_count().await;
                reconciler.reconcile("default", "broker").await?;
                Ok::<_, Error>((first, client.write_count().await - before))
            }),
            "reconcile should succeed"
        );
        prop_assert_eq!(first.order(), vec!["config", "service", "pvc", "statefulset"]);
        prop_assert_eq!(second, 0);
    }
}
