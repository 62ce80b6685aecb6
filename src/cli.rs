//! CLI command definitions using clap.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// LavinMQ operator
#[derive(Parser, Debug)]
#[command(name = "lavinmq-operator")]
#[command(version)]
#[command(about = "Kubernetes operator for LavinMQ message broker clusters")]
#[command(
    long_about = "Watches LavinMQ custom resources and converges the ConfigMap, headless Service, PersistentVolumeClaims and StatefulSet each one owns."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the controller against the current cluster
    Run {
        /// Configuration file (TOML, or JSON with a .json extension)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Watch only this namespace
        #[arg(short, long)]
        namespace: Option<String>,
    },

    /// Print the LavinMQ CustomResourceDefinition as YAML
    Crd,

    /// Print the objects a LavinMQ manifest would produce, without a cluster
    Render {
        /// LavinMQ manifest (YAML or JSON)
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::try_parse_from(["lavinmq-operator", "run", "--namespace", "queues"]);
        let namespace = cli.ok().and_then(|cli| match cli.command {
            Commands::Run { namespace, .. } => namespace,
            _ => None,
        });
        assert_eq!(namespace.as_deref(), Some("queues"));
    }

    #[test]
    fn test_render_requires_file() {
        assert!(Cli::try_parse_from(["lavinmq-operator", "render"]).is_err());
    }
}
