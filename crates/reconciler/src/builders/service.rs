//! Desired headless `Service` giving each replica a stable DNS name.

use k8s_openapi::api::core::v1::{ContainerPort, Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use lavinmq_api::LavinMQ;

use super::{CLUSTERING_PORT, CLUSTERING_PORT_NAME, TCP};
use crate::identity;

fn service_port(name: Option<String>, port: i32, protocol: Option<&str>) -> ServicePort {
    ServicePort {
        name,
        port,
        target_port: Some(IntOrString::Int(port)),
        protocol: Some(protocol.unwrap_or(TCP).to_string()),
        ..ServicePort::default()
    }
}

/// One service port per declared container port, keeping its protocol
/// (TCP when unset), plus a single clustering port when etcd endpoints are
/// configured.
pub fn ports(instance: &LavinMQ) -> Vec<ServicePort> {
    let declared = instance
        .spec
        .ports
        .iter()
        .map(|ContainerPort { name, container_port, protocol, .. }| {
            service_port(name.clone(), *container_port, protocol.as_deref())
        });
    let clustering = instance
        .spec
        .clustering_enabled()
        .then(|| service_port(Some(CLUSTERING_PORT_NAME.to_string()), CLUSTERING_PORT, None));
    declared.chain(clustering).collect()
}

/// Desired `Service` for `instance`. Cluster-internal only.
pub fn build(instance: &LavinMQ) -> Service {
    Service {
        metadata: identity::object_meta(instance, identity::service_name(instance)),
        spec: Some(ServiceSpec {
            cluster_ip: Some("None".to_string()),
            selector: Some(identity::labels(instance)),
            ports: Some(ports(instance)),
            ..ServiceSpec::default()
        }),
        ..Service::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::fixtures::instance;

    #[test]
    fn test_default_ports_without_clustering() {
        let ports = ports(&instance("broker"));
        assert_eq!(ports.len(), 3);
        assert!(ports.iter().all(|p| p.protocol.as_deref() == Some("TCP")));
        assert_eq!(ports.first().map(|p| p.port), Some(5672));
        assert_eq!(
            ports.first().and_then(|p| p.target_port.clone()),
            Some(IntOrString::Int(5672))
        );
    }

    #[test]
    fn test_single_clustering_port_for_many_endpoints() {
        let mut instance = instance("broker");
        instance.spec.etcd_endpoints = vec!["a:2379".into(), "b:2379".into(), "c:2379".into()];
        let ports = ports(&instance);
        assert_eq!(ports.len(), 4);
        let clustering: Vec<&ServicePort> = ports
            .iter()
            .filter(|p| p.name.as_deref() == Some("clustering"))
            .collect();
        assert_eq!(clustering.len(), 1);
        assert_eq!(clustering.first().map(|p| p.port), Some(5679));
    }

    #[test]
    fn test_declared_protocol_is_kept() {
        let mut instance = instance("broker");
        instance.spec.ports.push(ContainerPort {
            name: Some("syslog".to_string()),
            container_port: 514,
            protocol: Some("UDP".to_string()),
            ..ContainerPort::default()
        });
        let ports = ports(&instance);
        let syslog = ports.iter().find(|p| p.name.as_deref() == Some("syslog")).cloned();
        assert_eq!(syslog.and_then(|p| p.protocol).as_deref(), Some("UDP"));
        assert_eq!(
            ports.iter().filter(|p| p.protocol.as_deref() == Some("TCP")).count(),
            3
        );
    }

    #[test]
    fn test_headless_and_selected_by_labels() {
        let instance = instance("broker");
        let service = build(&instance);
        assert_eq!(service.metadata.name.as_deref(), Some("broker-service"));
        let spec = service.spec.unwrap_or_default();
        assert_eq!(spec.cluster_ip.as_deref(), Some("None"));
        assert_eq!(spec.selector, Some(identity::labels(&instance)));
    }
}
