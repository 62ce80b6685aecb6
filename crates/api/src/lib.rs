//! Custom resource types for the LavinMQ operator.
//!
//! A [`LavinMQ`] object describes one broker cluster: the image to run, how
//! many replicas, which ports to expose, the data volume to claim and the
//! broker configuration grouped by subsystem. The operator reads it and never
//! writes the spec back; only [`LavinMQStatus`] is written.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod config;
pub mod lavinmq;

pub use config::{
    AmqpConfig, ClusteringConfig, LavinMQConfig, MainConfig, MgmtConfig, MqttConfig,
};
pub use lavinmq::{
    Condition, ConditionStatus, DEFAULT_IMAGE, DEFAULT_REPLICAS, LavinMQ, LavinMQSpec,
    LavinMQStatus, default_ports,
};
