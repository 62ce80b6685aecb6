//! LavinMQ operator binary support: command-line parsing, configuration
//! loading and offline rendering.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod cli;
pub mod config;
pub mod render;

pub use config::{ConfigError, OperatorConfig};
pub use render::{RenderError, crd_yaml, parse_manifest, render_objects};
