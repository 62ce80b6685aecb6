//! K8s-style reconciliation for LavinMQ clusters.
//!
//! Given a `LavinMQ` instance this crate converges the objects it owns:
//!
//! - **Config**: a `ConfigMap` holding the rendered `lavinmq.ini`
//! - **Service**: a headless `Service` giving each replica a stable name
//! - **PVC**: one `PersistentVolumeClaim` per replica
//! - **StatefulSet**: the broker workload mounting all of the above
//!
//! # Key Concepts
//!
//! ## Reconciliation
//!
//! Each cycle:
//! 1. Fetches the instance (absent means nothing to do)
//! 2. Builds the desired objects from the instance ([`builders`])
//! 3. Fetches the live objects and merges owned fields ([`diff`])
//! 4. Creates what is missing and updates what changed
//!
//! Components run in the fixed order config, service, pvc, statefulset and
//! the cycle stops at the first error, attributed to the failing component.
//!
//! ## Invariants
//!
//! - Claims always use `ReadWriteOnce`
//! - Claim capacity only grows; shrinking is a [`Error::PolicyViolation`]
//! - The live workload runs exactly one container, otherwise
//!   [`Error::StructuralMismatch`]
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use lavinmq_reconciler::{InMemoryClient, Reconciler};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = InMemoryClient::new_arc();
//!     let reconciler = Reconciler::new(client);
//!     let report = reconciler.reconcile("default", "broker").await;
//! }
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod builders;
pub mod client;
pub mod conditions;
pub mod controller;
pub mod diff;
pub mod error;
pub mod identity;
pub mod quantity;
pub mod reconciler;
pub mod resource;
pub mod types;

// Re-export main types
pub use builders::{DesiredObjects, build_all};
pub use client::{InMemoryClient, KubeClient, ManagedResource, Operation, ResourceClient, WriteRecord};
pub use controller::{Context, ControllerSettings, error_policy, reconcile, retry_delay, run};
pub use diff::Diff;
pub use error::{Error, Result};
pub use reconciler::{Reconciler, ReconcilerBuilder, default_components};
pub use resource::{
    ConfigReconciler, PvcReconciler, ResourceReconciler, ServiceReconciler, StatefulSetReconciler,
};
pub use types::{ComponentReport, CycleReport, ObjectOutcome, Outcome};
