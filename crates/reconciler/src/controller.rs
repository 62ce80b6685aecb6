//! kube-runtime wiring.
//!
//! The controller watches `LavinMQ` instances and the four object kinds they
//! own, and hands each triggered instance to [`Reconciler`]. Requeue timing
//! is decided by [`retry_delay`].

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim, Service};
use kube::api::Api;
use kube::runtime::controller::{Action, Controller};
use kube::runtime::watcher;
use kube::{Client, ResourceExt};
use lavinmq_api::LavinMQ;
use tracing::{debug, error, info, instrument, warn};

use crate::client::{KubeClient, ManagedResource, ResourceClient};
use crate::error::{Error, Result};
use crate::reconciler::Reconciler;

/// Requeue timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Periodic resync after a successful cycle.
    pub requeue: Duration,
    /// Delay before retrying a transient failure.
    pub error_requeue: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            requeue: Duration::from_secs(300),
            error_requeue: Duration::from_secs(15),
        }
    }
}

/// Shared state handed to every reconcile call.
pub struct Context<C: ResourceClient + 'static> {
    pub reconciler: Reconciler<C>,
    pub settings: ControllerSettings,
}

impl<C: ResourceClient + 'static> Context<C> {
    pub fn new(reconciler: Reconciler<C>, settings: ControllerSettings) -> Self {
        Self {
            reconciler,
            settings,
        }
    }
}

/// When to retry after `error`: transient failures after
/// `error_requeue`, everything else only once the instance changes.
pub fn retry_delay(error: &Error, settings: &ControllerSettings) -> Option<Duration> {
    error.is_transient().then_some(settings.error_requeue)
}

/// Reconcile one instance and record the outcome in its status. A failed
/// status write is logged and does not fail the cycle.
///
/// # Errors
///
/// The reconcile error, for [`error_policy`] to classify.
#[instrument(skip(instance, ctx), fields(instance = %instance.name_any(), namespace = ?instance.namespace()))]
pub async fn reconcile<C: ResourceClient + 'static>(
    instance: Arc<LavinMQ>,
    ctx: Arc<Context<C>>,
) -> Result<Action> {
    let outcome = ctx.reconciler.reconcile_instance(&instance).await;
    if let Err(e) = ctx.reconciler.record_status(&instance, outcome.as_ref()).await {
        warn!(error = %e, "status not recorded");
    }
    outcome.map(|_| Action::requeue(ctx.settings.requeue))
}

/// Requeue policy for failed cycles.
pub fn error_policy<C: ResourceClient + 'static>(
    instance: Arc<LavinMQ>,
    error: &Error,
    ctx: Arc<Context<C>>,
) -> Action {
    let delay = retry_delay(error, &ctx.settings);
    error!(
        instance = %instance.name_any(),
        component = error.component().unwrap_or("instance"),
        transient = delay.is_some(),
        %error,
        "reconciliation failed"
    );
    delay.map_or_else(Action::await_change, Action::requeue)
}

fn scoped<K: ManagedResource>(client: &Client, namespace: Option<&str>) -> Api<K> {
    match namespace {
        Some(namespace) => Api::namespaced(client.clone(), namespace),
        None => Api::all(client.clone()),
    }
}

/// Run the controller until a shutdown signal arrives.
///
/// `namespace` limits the watch to one namespace; `None` watches all.
///
/// # Errors
///
/// Currently never fails once started; errors of individual cycles are
/// handled by [`error_policy`].
pub async fn run(client: Client, namespace: Option<String>, settings: ControllerSettings) -> Result<()> {
    let scope = namespace.as_deref();
    info!(namespace = scope.unwrap_or("<all>"), ?settings, "starting LavinMQ controller");

    let reconciler = Reconciler::new(Arc::new(KubeClient::new(client.clone())));
    let context = Arc::new(Context::new(reconciler, settings));

    Controller::new(scoped::<LavinMQ>(&client, scope), watcher::Config::default())
        .owns(scoped::<ConfigMap>(&client, scope), watcher::Config::default())
        .owns(scoped::<Service>(&client, scope), watcher::Config::default())
        .owns(scoped::<PersistentVolumeClaim>(&client, scope), watcher::Config::default())
        .owns(scoped::<StatefulSet>(&client, scope), watcher::Config::default())
        .shutdown_on_signal()
        .run(reconcile::<KubeClient>, error_policy::<KubeClient>, context)
        .for_each(|result| async move {
            match result {
                Ok((object, _)) => debug!(instance = %object.name, "reconciled"),
                Err(e) => debug!(error = %e, "controller event"),
            }
        })
        .await;

    info!("controller stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::client::{InMemoryClient, Operation};
    use crate::conditions;
    use crate::identity::fixtures::instance;
    use lavinmq_api::ConditionStatus;

    fn settings() -> ControllerSettings {
        ControllerSettings {
            requeue: Duration::from_secs(60),
            error_requeue: Duration::from_secs(5),
        }
    }

    async fn context() -> (Arc<Context<InMemoryClient>>, Arc<InMemoryClient>, Arc<LavinMQ>) {
        let client = InMemoryClient::new_arc();
        let stored = client.create("default", &instance("broker")).await.unwrap();
        let ctx = Arc::new(Context::new(Reconciler::new(client.clone()), settings()));
        (ctx, client, Arc::new(stored))
    }

    #[test]
    fn test_retry_delay_by_error_class() {
        let settings = settings();
        assert_eq!(
            retry_delay(&Error::transient("timeout").in_component("pvc"), &settings),
            Some(Duration::from_secs(5))
        );
        assert_eq!(
            retry_delay(&Error::conflict("Service", "svc", "stale"), &settings),
            Some(Duration::from_secs(5))
        );
        assert_eq!(
            retry_delay(
                &Error::policy_violation("PersistentVolumeClaim", "pvc", "shrink").in_component("pvc"),
                &settings
            ),
            None
        );
        assert_eq!(
            retry_delay(&Error::structural_mismatch("StatefulSet", "sts", "2"), &settings),
            None
        );
        assert_eq!(
            retry_delay(
                &Error::rejected("StatefulSet", "broker", 422, "field is immutable")
                    .in_component("statefulset"),
                &settings
            ),
            None
        );
    }

    #[tokio::test]
    async fn test_reconcile_marks_available() {
        let (ctx, client, instance) = context().await;
        assert!(reconcile(instance, ctx).await.is_ok());

        let stored: LavinMQ = client.get("default", "broker").await.unwrap().unwrap();
        let status = stored.status.unwrap_or_default();
        assert_eq!(
            conditions::find(&status, conditions::AVAILABLE).map(|c| c.status),
            Some(ConditionStatus::True)
        );
    }

    #[tokio::test]
    async fn test_reconcile_failure_marks_degraded() {
        let (ctx, client, instance) = context().await;
        client.inject_failure(Operation::Create, "StatefulSet").await;

        let err = reconcile(instance, ctx).await.unwrap_err();
        assert_eq!(err.component(), Some("statefulset"));

        let stored: LavinMQ = client.get("default", "broker").await.unwrap().unwrap();
        let degraded = stored
            .status
            .as_ref()
            .and_then(|s| conditions::find(s, conditions::DEGRADED))
            .cloned()
            .unwrap_or_default();
        assert_eq!(degraded.status, ConditionStatus::True);
        assert_eq!(degraded.reason, conditions::REASON_FAILED);
    }

    #[tokio::test]
    async fn test_status_failure_does_not_fail_cycle() {
        let (ctx, client, instance) = context().await;
        client.inject_failure(Operation::UpdateStatus, "LavinMQ").await;
        assert!(reconcile(instance, ctx).await.is_ok());
    }
}
