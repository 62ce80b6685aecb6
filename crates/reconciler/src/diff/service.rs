//! `Service` diff: only the ordered port list is owned.

use k8s_openapi::api::core::v1::Service;

use super::{Diff, assign};

pub fn diff(mut live: Service, desired: &Service) -> Diff<Service> {
    let wanted = desired.spec.as_ref().and_then(|spec| spec.ports.clone());
    let spec = live.spec.get_or_insert_with(Default::default);
    let changed = assign(&mut spec.ports, wanted);
    Diff::new(live, changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::service::build;
    use crate::identity::fixtures::instance;

    #[test]
    fn test_same_ports_unchanged() {
        let desired = build(&instance("broker"));
        let mut live = desired.clone();
        live.spec
            .get_or_insert_with(Default::default)
            .cluster_ips = Some(vec!["None".to_string()]);

        let result = diff(live.clone(), &desired);
        assert!(!result.changed);
        assert_eq!(result.object, live);
    }

    #[test]
    fn test_added_clustering_port_replaces_list() {
        let mut instance = instance("broker");
        let live = build(&instance);
        instance.spec.etcd_endpoints = vec!["etcd:2379".to_string()];
        let desired = build(&instance);

        let result = diff(live, &desired);
        assert!(result.changed);
        let ports = result.object.spec.and_then(|s| s.ports).unwrap_or_default();
        assert_eq!(ports.len(), 4);
    }

    #[test]
    fn test_reordered_ports_are_a_change() {
        let desired = build(&instance("broker"));
        let mut live = desired.clone();
        if let Some(ports) = live.spec.as_mut().and_then(|s| s.ports.as_mut()) {
            ports.reverse();
        }
        assert!(diff(live, &desired).changed);
    }
}
