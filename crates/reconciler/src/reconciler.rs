//! Reconciler implementation.

use std::sync::Arc;

use chrono::Utc;
use kube::ResourceExt;
use lavinmq_api::LavinMQ;
use tracing::{debug, info, instrument, warn};

use crate::client::ResourceClient;
use crate::conditions;
use crate::error::{Error, Result};
use crate::resource::{
    ConfigReconciler, PvcReconciler, ResourceReconciler, ServiceReconciler, StatefulSetReconciler,
};
use crate::types::CycleReport;

/// The fixed component order: config, service, claims, then the workload
/// that mounts them.
pub fn default_components<C: ResourceClient + 'static>() -> Vec<Box<dyn ResourceReconciler<C>>> {
    vec![
        Box::new(ConfigReconciler),
        Box::new(ServiceReconciler),
        Box::new(PvcReconciler),
        Box::new(StatefulSetReconciler),
    ]
}

/// Top-level reconciler for `LavinMQ` instances.
pub struct Reconciler<C: ResourceClient + 'static> {
    client: Arc<C>,
    components: Vec<Box<dyn ResourceReconciler<C>>>,
}

impl<C: ResourceClient + 'static> Reconciler<C> {
    /// Create a reconciler running the default components.
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            components: default_components(),
        }
    }

    /// Fetch the named instance and converge everything it owns.
    ///
    /// An instance that no longer exists is not an error: its dependents
    /// are garbage-collected by the platform through owner references.
    ///
    /// # Errors
    ///
    /// The first component failure, wrapped in [`Error::Component`]. Errors
    /// fetching the instance itself are returned unwrapped.
    #[instrument(skip(self))]
    pub async fn reconcile(&self, namespace: &str, name: &str) -> Result<CycleReport> {
        match self.client.get::<LavinMQ>(namespace, name).await? {
            Some(instance) => self.reconcile_instance(&instance).await,
            None => {
                info!("LavinMQ not found; nothing to reconcile");
                Ok(CycleReport::deleted())
            }
        }
    }

    /// Converge the dependents of an already fetched instance. Components
    /// run in order and the cycle stops at the first failure.
    ///
    /// # Errors
    ///
    /// See [`reconcile`](Self::reconcile).
    pub async fn reconcile_instance(&self, instance: &LavinMQ) -> Result<CycleReport> {
        let mut report = CycleReport {
            observed_generation: instance.metadata.generation,
            ..CycleReport::default()
        };

        for component in &self.components {
            let name = component.name();
            debug!(component = name, "running component");
            let result = component
                .reconcile(self.client.as_ref(), instance)
                .await
                .map_err(|e| e.in_component(name))?;
            report.push(result);
        }

        if report.converged() {
            info!(instance = %instance.name_any(), "converged");
        } else {
            info!(
                instance = %instance.name_any(),
                changed = report.changed(),
                summary = %report.summary(),
                "reconciliation complete"
            );
        }
        Ok(report)
    }

    /// Write `Available`/`Degraded` conditions for a finished cycle. Skips
    /// the write when the conditions would not change.
    ///
    /// # Errors
    ///
    /// Errors from the status write.
    pub async fn record_status(
        &self,
        instance: &LavinMQ,
        outcome: std::result::Result<&CycleReport, &Error>,
    ) -> Result<()> {
        let current = instance.status.as_ref();
        let now = Utc::now();
        let status = match outcome {
            Ok(report) => conditions::succeeded(current, report, now),
            Err(error) => conditions::failed(current, error, instance.metadata.generation, now),
        };
        if current == Some(&status) {
            return Ok(());
        }

        let namespace = crate::identity::namespace(instance);
        self.client
            .update_status(&namespace, &instance.name_any(), &status)
            .await
            .inspect_err(|e| warn!(error = %e, "failed to record status"))
    }

    /// Component names in execution order.
    pub fn components(&self) -> Vec<&'static str> {
        self.components.iter().map(|c| c.name()).collect()
    }
}

/// Builder for Reconciler.
pub struct ReconcilerBuilder<C: ResourceClient + 'static> {
    client: Option<Arc<C>>,
    components: Option<Vec<Box<dyn ResourceReconciler<C>>>>,
}

impl<C: ResourceClient + 'static> ReconcilerBuilder<C> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            client: None,
            components: None,
        }
    }

    /// Set the platform client.
    pub fn with_client(mut self, client: Arc<C>) -> Self {
        self.client = Some(client);
        self
    }

    /// Replace the default component pipeline.
    pub fn with_components(mut self, components: Vec<Box<dyn ResourceReconciler<C>>>) -> Self {
        self.components = Some(components);
        self
    }

    /// Build the reconciler.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] when no client was set or the pipeline is
    /// empty.
    pub fn build(self) -> Result<Reconciler<C>> {
        let client = self
            .client
            .ok_or_else(|| Error::invalid_config("a resource client is required"))?;
        let components = self.components.unwrap_or_else(default_components);
        if components.is_empty() {
            return Err(Error::invalid_config("at least one component is required"));
        }
        Ok(Reconciler { client, components })
    }
}

impl<C: ResourceClient + 'static> Default for ReconcilerBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}
