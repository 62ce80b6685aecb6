//! `ConfigMap` diff: the rendered document is compared byte for byte.

use k8s_openapi::api::core::v1::ConfigMap;

use super::{Diff, assign};
use crate::builders::CONFIG_FILE_NAME;

/// Bring the live document in line with the desired one. Other keys in the
/// live `ConfigMap` are left alone.
pub fn diff(mut live: ConfigMap, desired: &ConfigMap) -> Diff<ConfigMap> {
    let wanted = desired
        .data
        .as_ref()
        .and_then(|data| data.get(CONFIG_FILE_NAME))
        .cloned();

    let Some(wanted) = wanted else {
        return Diff::unchanged(live);
    };

    let data = live.data.get_or_insert_with(Default::default);
    let slot = data.entry(CONFIG_FILE_NAME.to_string()).or_default();
    let changed = assign(slot, wanted);
    Diff::new(live, changed)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::builders::config::build;
    use crate::identity::fixtures::instance;

    #[test]
    fn test_identical_document_is_unchanged() {
        let desired = build(&instance("broker"));
        let result = diff(desired.clone(), &desired);
        assert!(!result.changed);
        assert_eq!(result.object, desired);
    }

    #[test]
    fn test_document_is_replaced() {
        let mut instance = instance("broker");
        let live = build(&instance);
        instance.spec.config.amqp.heartbeat = Some(30);
        let desired = build(&instance);

        let result = diff(live, &desired);
        assert!(result.changed);
        assert_eq!(result.object.data, desired.data);
    }

    #[test]
    fn test_foreign_keys_survive() {
        let desired = build(&instance("broker"));
        let mut live = desired.clone();
        live.metadata.resource_version = Some("7".to_string());
        live.data = Some(BTreeMap::from([
            ("extra".to_string(), "keep".to_string()),
            (CONFIG_FILE_NAME.to_string(), "[main]\n".to_string()),
        ]));

        let result = diff(live, &desired);
        assert!(result.changed);
        let data = result.object.data.clone().unwrap_or_default();
        assert_eq!(data.get("extra").map(String::as_str), Some("keep"));
        assert_eq!(result.object.metadata.resource_version.as_deref(), Some("7"));
    }

    #[test]
    fn test_missing_live_data_is_filled() {
        let desired = build(&instance("broker"));
        let mut live = desired.clone();
        live.data = None;
        assert!(diff(live, &desired).changed);
    }
}
