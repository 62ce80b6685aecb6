//! Desired `ConfigMap` carrying the rendered `lavinmq.ini`.

use std::collections::BTreeMap;
use std::fmt::Display;

use ini::{EscapePolicy, Ini, LineSeparator, WriteOption};
use k8s_openapi::api::core::v1::ConfigMap;
use kube::ResourceExt;
use lavinmq_api::LavinMQ;

use super::{CLUSTERING_PORT, CONFIG_FILE_NAME, DATA_DIR, TLS_MOUNT_PATH};
use crate::identity;

const MAIN: &str = "main";
const MGMT: &str = "mgmt";
const AMQP: &str = "amqp";
const MQTT: &str = "mqtt";
const CLUSTERING: &str = "clustering";

const BIND_ALL: &str = "0.0.0.0";

fn set(doc: &mut Ini, section: &str, key: &str, value: impl Display) {
    doc.set_to(Some(section), key.to_string(), value.to_string());
}

/// Set `key` only when a value was supplied. `Some(0)` and `Some(false)` are
/// written like any other value.
fn set_opt<T: Display>(doc: &mut Ini, section: &str, key: &str, value: Option<T>) {
    if let Some(value) = value {
        set(doc, section, key, value);
    }
}

/// `key = value` lines, `\n` endings and no escaping, so values such as
/// passwords land in the file verbatim.
fn write_options() -> WriteOption {
    WriteOption {
        escape_policy: EscapePolicy::Nothing,
        line_separator: LineSeparator::CR,
        kv_separator: " = ",
    }
}

/// Build the broker configuration document for `instance`.
pub fn document(instance: &LavinMQ) -> Ini {
    let spec = &instance.spec;
    let config = &spec.config;
    let mut doc = Ini::new();

    set(&mut doc, MAIN, "data_dir", DATA_DIR);
    set(&mut doc, MGMT, "bind", BIND_ALL);
    set(&mut doc, AMQP, "bind", BIND_ALL);
    set(&mut doc, MQTT, "bind", BIND_ALL);

    // Declared container ports feed the listener ports; explicit section
    // overrides below win.
    for port in &spec.ports {
        let section = match port.name.as_deref() {
            Some("amqp") => AMQP,
            Some("http") => MGMT,
            Some("mqtt") => MQTT,
            _ => continue,
        };
        set(&mut doc, section, "port", port.container_port);
    }

    let main = &config.main;
    set_opt(&mut doc, MAIN, "consumer_timeout", main.consumer_timeout);
    set_opt(&mut doc, MAIN, "default_consumer_prefetch", main.default_consumer_prefetch);
    set_opt(&mut doc, MAIN, "default_password", main.default_password.as_deref());
    set_opt(&mut doc, MAIN, "default_user", main.default_user.as_deref());
    set_opt(&mut doc, MAIN, "free_disk_min", main.free_disk_min);
    set_opt(&mut doc, MAIN, "free_disk_warn", main.free_disk_warn);
    set_opt(&mut doc, MAIN, "log_exchange", main.log_exchange);
    set_opt(&mut doc, MAIN, "log_level", main.log_level.as_deref());
    set_opt(&mut doc, MAIN, "max_deleted_definitions", main.max_deleted_definitions);
    set_opt(&mut doc, MAIN, "segment_size", main.segment_size);
    set_opt(&mut doc, MAIN, "set_timestamp", main.set_timestamp);
    set_opt(&mut doc, MAIN, "socket_buffer_size", main.socket_buffer_size);
    set_opt(&mut doc, MAIN, "stats_interval", main.stats_interval);
    set_opt(&mut doc, MAIN, "stats_log_size", main.stats_log_size);
    set_opt(&mut doc, MAIN, "tcp_keepalive", main.tcp_keepalive.as_deref());
    set_opt(&mut doc, MAIN, "tcp_nodelay", main.tcp_nodelay);
    set_opt(&mut doc, MAIN, "tls_ciphers", main.tls_ciphers.as_deref());
    set_opt(&mut doc, MAIN, "tls_min_version", main.tls_min_version.as_deref());

    if spec.tls_secret_name().is_some() {
        set(&mut doc, MAIN, "tls_cert", format!("{TLS_MOUNT_PATH}/tls.crt"));
        set(&mut doc, MAIN, "tls_key", format!("{TLS_MOUNT_PATH}/tls.key"));
    }

    set_opt(&mut doc, MGMT, "port", config.mgmt.port);
    set_opt(&mut doc, MGMT, "tls_port", config.mgmt.tls_port);

    let amqp = &config.amqp;
    set_opt(&mut doc, AMQP, "channel_max", amqp.channel_max);
    set_opt(&mut doc, AMQP, "frame_max", amqp.frame_max);
    set_opt(&mut doc, AMQP, "heartbeat", amqp.heartbeat);
    set_opt(&mut doc, AMQP, "max_message_size", amqp.max_message_size);
    set_opt(&mut doc, AMQP, "port", amqp.port);
    set_opt(&mut doc, AMQP, "tls_port", amqp.tls_port);

    let mqtt = &config.mqtt;
    set_opt(&mut doc, MQTT, "max_inflight_messages", mqtt.max_inflight_messages);
    set_opt(&mut doc, MQTT, "port", mqtt.port);
    set_opt(&mut doc, MQTT, "tls_port", mqtt.tls_port);

    if spec.clustering_enabled() {
        set(&mut doc, CLUSTERING, "enabled", true);
    }
    set(&mut doc, CLUSTERING, "bind", BIND_ALL);
    set(&mut doc, CLUSTERING, "port", CLUSTERING_PORT);
    set(&mut doc, CLUSTERING, "etcd_prefix", instance.name_any());
    if spec.clustering_enabled() {
        set(&mut doc, CLUSTERING, "etcd_endpoints", spec.etcd_endpoints.join(","));
    }
    set_opt(
        &mut doc,
        CLUSTERING,
        "max_unsynced_actions",
        config.clustering.max_unsynced_actions,
    );

    doc
}

/// Rendered `lavinmq.ini` for `instance`.
pub fn render(instance: &LavinMQ) -> String {
    let mut out = Vec::new();
    // Writes into a `Vec` cannot fail.
    let _ = document(instance).write_to_opt(&mut out, write_options());
    String::from_utf8_lossy(&out).into_owned()
}

/// Desired `ConfigMap` for `instance`.
pub fn build(instance: &LavinMQ) -> ConfigMap {
    ConfigMap {
        metadata: identity::object_meta(instance, identity::config_map_name(instance)),
        data: Some(BTreeMap::from([(
            CONFIG_FILE_NAME.to_string(),
            render(instance),
        )])),
        ..ConfigMap::default()
    }
}
