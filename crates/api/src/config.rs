//! Broker configuration overrides, grouped by `lavinmq.ini` section.
//!
//! Every field is optional. `None` means "keep the broker default"; any
//! `Some` value, including `0`, `false` and `""`, is written to the rendered
//! configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// All configuration sections of a LavinMQ instance.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LavinMQConfig {
    #[serde(default)]
    pub main: MainConfig,
    #[serde(default)]
    pub mgmt: MgmtConfig,
    #[serde(default)]
    pub amqp: AmqpConfig,
    #[serde(default)]
    pub mqtt: MqttConfig,
    #[serde(default)]
    pub clustering: ClusteringConfig,
}

/// `[main]` section.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MainConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_consumer_prefetch: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_disk_min: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_disk_warn: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_exchange: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_deleted_definitions: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_timestamp: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_buffer_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_interval: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_log_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_keepalive: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_nodelay: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_ciphers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_min_version: Option<String>,
}

/// `[mgmt]` section (HTTP management interface).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MgmtConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_port: Option<u16>,
}

/// `[amqp]` section.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AmqpConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_max: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_max: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartbeat: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_message_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_port: Option<u16>,
}

/// `[mqtt]` section.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MqttConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_inflight_messages: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_port: Option<u16>,
}

/// `[clustering]` section.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ClusteringConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_unsynced_actions: Option<u64>,
}
