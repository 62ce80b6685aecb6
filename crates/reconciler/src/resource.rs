//! Per-type reconcilers.
//!
//! Each one builds its desired objects, fetches the live ones and either
//! creates (with a controller owner reference), updates (with the merged
//! live object) or leaves them alone. A create is never followed by a diff
//! in the same cycle.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim, Service};
use kube::ResourceExt;
use lavinmq_api::LavinMQ;
use tracing::{debug, info};

use crate::builders;
use crate::client::{ManagedResource, ResourceClient};
use crate::diff::{self, Diff};
use crate::error::Result;
use crate::identity;
use crate::types::{ComponentReport, Outcome};

/// Converges one kind of managed object for an instance.
#[async_trait]
pub trait ResourceReconciler<C: ResourceClient>: Send + Sync {
    /// Stable component name used in reports and error attribution.
    fn name(&self) -> &'static str;

    async fn reconcile(&self, client: &C, instance: &LavinMQ) -> Result<ComponentReport>;
}

/// Create `desired` if absent, otherwise merge it into the live object with
/// `diff` and write back only when something changed.
///
/// # Errors
///
/// Fetch and write errors from the client and diff errors are returned
/// unchanged.
pub async fn converge<C, K, F>(
    client: &C,
    instance: &LavinMQ,
    desired: K,
    diff: F,
) -> Result<Outcome>
where
    C: ResourceClient,
    K: ManagedResource,
    F: FnOnce(K, &K) -> Result<Diff<K>> + Send,
{
    let namespace = identity::namespace(instance);
    let name = desired.name_any();
    let kind = K::kind(&());

    match client.get::<K>(&namespace, &name).await? {
        None => {
            let mut object = desired;
            identity::set_owner(object.meta_mut(), instance)?;
            client.create(&namespace, &object).await?;
            info!(%kind, %namespace, %name, "created");
            Ok(Outcome::Created)
        }
        Some(live) => {
            let Diff { object, changed } = diff(live, &desired)?;
            if changed {
                client.update(&namespace, &object).await?;
                info!(%kind, %namespace, %name, "updated");
                Ok(Outcome::Updated)
            } else {
                debug!(%kind, %namespace, %name, "up to date");
                Ok(Outcome::Unchanged)
            }
        }
    }
}

/// The `lavinmq.ini` `ConfigMap`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigReconciler;

#[async_trait]
impl<C: ResourceClient> ResourceReconciler<C> for ConfigReconciler {
    fn name(&self) -> &'static str {
        "config"
    }

    async fn reconcile(&self, client: &C, instance: &LavinMQ) -> Result<ComponentReport> {
        let desired: ConfigMap = builders::config::build(instance);
        let name = desired.name_any();
        let outcome = converge(client, instance, desired, |live, desired| {
            Ok(diff::config::diff(live, desired))
        })
        .await?;
        Ok(ComponentReport::new(ResourceReconciler::<C>::name(self)).with(name, outcome))
    }
}

/// The headless `Service`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceReconciler;

#[async_trait]
impl<C: ResourceClient> ResourceReconciler<C> for ServiceReconciler {
    fn name(&self) -> &'static str {
        "service"
    }

    async fn reconcile(&self, client: &C, instance: &LavinMQ) -> Result<ComponentReport> {
        let desired: Service = builders::service::build(instance);
        let name = desired.name_any();
        let outcome = converge(client, instance, desired, |live, desired| {
            Ok(diff::service::diff(live, desired))
        })
        .await?;
        Ok(ComponentReport::new(ResourceReconciler::<C>::name(self)).with(name, outcome))
    }
}

/// One `PersistentVolumeClaim` per replica, converged in ordinal order.
#[derive(Debug, Clone, Copy, Default)]
pub struct PvcReconciler;

#[async_trait]
impl<C: ResourceClient> ResourceReconciler<C> for PvcReconciler {
    fn name(&self) -> &'static str {
        "pvc"
    }

    async fn reconcile(&self, client: &C, instance: &LavinMQ) -> Result<ComponentReport> {
        let mut report = ComponentReport::new(ResourceReconciler::<C>::name(self));
        for desired in builders::pvc::build(instance) {
            let name = desired.name_any();
            let outcome: Outcome =
                converge::<C, PersistentVolumeClaim, _>(client, instance, desired, diff::pvc::diff)
                    .await?;
            report.push(name, outcome);
        }
        Ok(report)
    }
}

/// The broker `StatefulSet`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatefulSetReconciler;

#[async_trait]
impl<C: ResourceClient> ResourceReconciler<C> for StatefulSetReconciler {
    fn name(&self) -> &'static str {
        "statefulset"
    }

    async fn reconcile(&self, client: &C, instance: &LavinMQ) -> Result<ComponentReport> {
        let desired: StatefulSet = builders::statefulset::build(instance);
        let name = desired.name_any();
        let outcome =
            converge::<C, StatefulSet, _>(client, instance, desired, diff::statefulset::diff)
                .await?;
        Ok(ComponentReport::new(ResourceReconciler::<C>::name(self)).with(name, outcome))
    }
}
