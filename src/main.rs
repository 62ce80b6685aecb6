//! # lavinmq-operator
//!
//! Entry point for the LavinMQ Kubernetes operator.
//!
//! ## Commands
//!
//! - `run`: watch `LavinMQ` objects and converge what they own until
//!   SIGTERM/SIGINT
//! - `crd`: print the CustomResourceDefinition
//! - `render`: print the objects a manifest would produce, no cluster needed
//!
//! ## Configuration
//!
//! Defaults, then an optional config file, then `LAVINMQ_OPERATOR_*`
//! environment variables, then command-line flags. `RUST_LOG` overrides the
//! configured log filter.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(clippy::expect_used)]

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use lavinmq_operator::OperatorConfig;
use lavinmq_operator::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, namespace } => {
            let config = load_config(config.as_deref(), namespace)?;
            init_tracing(&config.log_filter);
            run(config).await
        }
        Commands::Crd => {
            print!("{}", lavinmq_operator::crd_yaml()?);
            Ok(())
        }
        Commands::Render { file } => {
            let manifest = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read manifest {}", file.display()))?;
            let instance = lavinmq_operator::parse_manifest(&manifest)?;
            print!("{}", lavinmq_operator::render_objects(&instance)?);
            Ok(())
        }
    }
}

/// Initialize tracing subscriber.
///
/// `RUST_LOG` wins over the configured filter.
fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_config(path: Option<&Path>, namespace: Option<String>) -> Result<OperatorConfig> {
    let base = match path {
        Some(path) => OperatorConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => OperatorConfig::default(),
    };
    let config = base
        .with_env()
        .context("Invalid LAVINMQ_OPERATOR_* environment")?;

    Ok(match namespace {
        Some(namespace) => config.namespace(namespace),
        None => config,
    })
}

async fn run(config: OperatorConfig) -> Result<()> {
    info!(namespace = ?config.namespace, "LavinMQ operator starting...");

    let client = kube::Client::try_default()
        .await
        .context("Failed to create Kubernetes client. Check KUBECONFIG or in-cluster service account")?;

    lavinmq_reconciler::run(client, config.namespace.clone(), config.settings())
        .await
        .context("Controller terminated with an error")?;

    info!("LavinMQ operator stopped");
    Ok(())
}
