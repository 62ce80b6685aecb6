//! Platform access.
//!
//! The reconcilers only ever fetch, create and replace namespaced objects,
//! plus write the instance status. [`ResourceClient`] captures exactly that
//! surface so the engine runs against the API server ([`KubeClient`]) or
//! against a per-test in-memory store ([`InMemoryClient`]).

use std::fmt::Debug;

use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use kube::Resource;
use lavinmq_api::LavinMQStatus;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;

mod kube_client;
mod memory;

pub use kube_client::KubeClient;
pub use memory::{InMemoryClient, Operation, WriteRecord};

/// Any namespaced object the operator can manage.
pub trait ManagedResource:
    Resource<Scope = NamespaceResourceScope, DynamicType = ()>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
}

impl<K> ManagedResource for K where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static
{
}

/// Object store operations used by the reconcilers.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Fetch an object. A missing object is `Ok(None)`, never an error.
    async fn get<K: ManagedResource>(&self, namespace: &str, name: &str) -> Result<Option<K>>;

    /// Create an object and return it as stored.
    async fn create<K: ManagedResource>(&self, namespace: &str, object: &K) -> Result<K>;

    /// Replace an object. The object's `resourceVersion` is the optimistic
    /// concurrency token; a stale one fails with a conflict.
    async fn update<K: ManagedResource>(&self, namespace: &str, object: &K) -> Result<K>;

    /// Replace the status of a `LavinMQ` instance.
    async fn update_status(&self, namespace: &str, name: &str, status: &LavinMQStatus)
    -> Result<()>;
}
