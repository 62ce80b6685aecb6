//! [`ResourceClient`] backed by the Kubernetes API server.

use async_trait::async_trait;
use kube::api::{Api, Patch, PatchParams, PostParams};
use kube::{Client, ResourceExt};
use lavinmq_api::{LavinMQ, LavinMQStatus};
use serde_json::json;
use tracing::debug;

use super::{ManagedResource, ResourceClient};
use crate::error::{Error, Result, is_retryable_status};

const CONFLICT: u16 = 409;

/// Thin wrapper over [`kube::Client`].
#[derive(Clone)]
pub struct KubeClient {
    client: Client,
}

impl KubeClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api<K: ManagedResource>(&self, namespace: &str) -> Api<K> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// 409s become [`Error::Conflict`]. Other refusals the API server will
/// repeat on retry become [`Error::Rejected`]; throttling, server errors and
/// transport failures stay [`Error::Kube`] and are retried.
fn classify<K: ManagedResource>(name: &str, err: kube::Error) -> Error {
    match err {
        kube::Error::Api(response) if response.code == CONFLICT => {
            Error::conflict(K::kind(&()), name, response.message)
        }
        kube::Error::Api(response) if !is_retryable_status(response.code) => {
            Error::rejected(K::kind(&()), name, response.code, response.message)
        }
        other => Error::Kube(other),
    }
}

#[async_trait]
impl ResourceClient for KubeClient {
    async fn get<K: ManagedResource>(&self, namespace: &str, name: &str) -> Result<Option<K>> {
        let object = self
            .api::<K>(namespace)
            .get_opt(name)
            .await
            .map_err(|e| classify::<K>(name, e))?;
        if object.is_none() {
            debug!(kind = %K::kind(&()), %namespace, %name, "object not found");
        }
        Ok(object)
    }

    async fn create<K: ManagedResource>(&self, namespace: &str, object: &K) -> Result<K> {
        let name = object.name_any();
        self.api::<K>(namespace)
            .create(&PostParams::default(), object)
            .await
            .map_err(|e| classify::<K>(&name, e))
    }

    async fn update<K: ManagedResource>(&self, namespace: &str, object: &K) -> Result<K> {
        let name = object.name_any();
        self.api::<K>(namespace)
            .replace(&name, &PostParams::default(), object)
            .await
            .map_err(|e| classify::<K>(&name, e))
    }

    async fn update_status(
        &self,
        namespace: &str,
        name: &str,
        status: &LavinMQStatus,
    ) -> Result<()> {
        let patch = json!({ "status": status });
        self.api::<LavinMQ>(namespace)
            .patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|e| classify::<LavinMQ>(name, e))?;
        Ok(())
    }
}
