//! In-memory [`ResourceClient`] for tests and dry runs.
//!
//! Behaves like a small API server: assigns uids, bumps resource versions
//! on every write, rejects stale replaces, bumps `generation` when `spec`
//! changes and garbage-collects dependents through owner references on
//! delete. Each instance is independent; nothing is process-global.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::{Resource, ResourceExt};
use lavinmq_api::{LavinMQ, LavinMQStatus};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, trace};
use ulid::Ulid;

use super::{ManagedResource, ResourceClient};
use crate::error::{Error, Result};

/// Client operations that can be recorded or made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    Create,
    Update,
    UpdateStatus,
}

/// One successful write, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    pub operation: Operation,
    pub kind: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ObjectKey {
    kind: String,
    namespace: String,
    name: String,
}

impl ObjectKey {
    fn new<K: ManagedResource>(namespace: &str, name: &str) -> Self {
        Self {
            kind: K::kind(&()).into_owned(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    meta: ObjectMeta,
    value: Value,
}

impl Entry {
    fn decode<K: ManagedResource>(&self) -> Result<K> {
        Ok(serde_json::from_value(self.value.clone())?)
    }
}

/// In-memory object store.
#[derive(Default)]
pub struct InMemoryClient {
    objects: RwLock<BTreeMap<ObjectKey, Entry>>,
    failures: RwLock<Vec<(Operation, String)>>,
    journal: RwLock<Vec<WriteRecord>>,
    revision: AtomicU64,
}

impl InMemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Make every `operation` on objects of `kind` fail with a transient
    /// error until [`clear_failures`](Self::clear_failures) is called.
    pub async fn inject_failure(&self, operation: Operation, kind: &str) {
        self.failures
            .write()
            .await
            .push((operation, kind.to_string()));
    }

    pub async fn clear_failures(&self) {
        self.failures.write().await.clear();
    }

    /// Successful writes so far, oldest first.
    pub async fn writes(&self) -> Vec<WriteRecord> {
        self.journal.read().await.clone()
    }

    pub async fn write_count(&self) -> usize {
        self.journal.read().await.len()
    }

    /// All objects of kind `K` in `namespace`, ordered by name.
    ///
    /// # Errors
    ///
    /// Fails if a stored object no longer decodes as `K`.
    pub async fn list<K: ManagedResource>(&self, namespace: &str) -> Result<Vec<K>> {
        let kind = K::kind(&());
        self.objects
            .read()
            .await
            .iter()
            .filter(|(key, _)| key.kind == kind && key.namespace == namespace)
            .map(|(_, entry)| entry.decode())
            .collect()
    }

    /// Delete an object and, transitively, everything it owns. Returns
    /// whether the object existed.
    pub async fn delete<K: ManagedResource>(&self, namespace: &str, name: &str) -> bool {
        let mut objects = self.objects.write().await;
        let Some(root) = objects.remove(&ObjectKey::new::<K>(namespace, name)) else {
            return false;
        };
        debug!(kind = %K::kind(&()), %namespace, %name, "deleted object");

        let mut owners: Vec<String> = root.meta.uid.into_iter().collect();
        while let Some(owner) = owners.pop() {
            let dependents: Vec<ObjectKey> = objects
                .iter()
                .filter(|(_, entry)| {
                    entry
                        .meta
                        .owner_references
                        .iter()
                        .flatten()
                        .any(|reference| reference.uid == owner)
                })
                .map(|(key, _)| key.clone())
                .collect();
            for key in dependents {
                if let Some(entry) = objects.remove(&key) {
                    trace!(kind = %key.kind, name = %key.name, "garbage collected dependent");
                    owners.extend(entry.meta.uid);
                }
            }
        }
        true
    }

    async fn check_failure(&self, operation: Operation, kind: &str) -> Result<()> {
        let injected = self
            .failures
            .read()
            .await
            .iter()
            .any(|(op, k)| *op == operation && k == kind);
        if injected {
            Err(Error::transient(format!(
                "injected {operation:?} failure for {kind}"
            )))
        } else {
            Ok(())
        }
    }

    fn next_revision(&self) -> String {
        (self.revision.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }

    async fn record(&self, operation: Operation, key: &ObjectKey) {
        self.journal.write().await.push(WriteRecord {
            operation,
            kind: key.kind.clone(),
            name: key.name.clone(),
        });
    }
}

fn missing(key: &ObjectKey) -> Error {
    Error::conflict(key.kind.clone(), key.name.clone(), "object does not exist")
}

#[async_trait]
impl ResourceClient for InMemoryClient {
    async fn get<K: ManagedResource>(&self, namespace: &str, name: &str) -> Result<Option<K>> {
        self.check_failure(Operation::Get, &K::kind(&())).await?;
        let key = ObjectKey::new::<K>(namespace, name);
        self.objects
            .read()
            .await
            .get(&key)
            .map(Entry::decode)
            .transpose()
    }

    async fn create<K: ManagedResource>(&self, namespace: &str, object: &K) -> Result<K> {
        self.check_failure(Operation::Create, &K::kind(&())).await?;
        let key = ObjectKey::new::<K>(namespace, &object.name_any());

        let mut objects = self.objects.write().await;
        if objects.contains_key(&key) {
            return Err(Error::conflict(
                key.kind.clone(),
                key.name.clone(),
                "object already exists",
            ));
        }

        let mut stored = object.clone();
        let meta = stored.meta_mut();
        meta.namespace = Some(namespace.to_string());
        meta.uid = Some(Ulid::new().to_string());
        meta.resource_version = Some(self.next_revision());
        meta.generation = Some(1);

        let entry = Entry {
            meta: stored.meta().clone(),
            value: serde_json::to_value(&stored)?,
        };
        objects.insert(key.clone(), entry);
        drop(objects);

        self.record(Operation::Create, &key).await;
        Ok(stored)
    }

    async fn update<K: ManagedResource>(&self, namespace: &str, object: &K) -> Result<K> {
        self.check_failure(Operation::Update, &K::kind(&())).await?;
        let key = ObjectKey::new::<K>(namespace, &object.name_any());

        let mut objects = self.objects.write().await;
        let current = objects.get(&key).ok_or_else(|| missing(&key))?;

        if let Some(version) = object.resource_version() {
            if current.meta.resource_version.as_deref() != Some(version.as_str()) {
                return Err(Error::conflict(
                    key.kind.clone(),
                    key.name.clone(),
                    format!("stale resourceVersion {version}"),
                ));
            }
        }

        let mut stored = object.clone();
        let spec_changed = serde_json::to_value(&stored)?.get("spec") != current.value.get("spec");
        let generation = current.meta.generation.unwrap_or(1);
        let meta = stored.meta_mut();
        meta.namespace = Some(namespace.to_string());
        meta.uid.clone_from(&current.meta.uid);
        meta.resource_version = Some(self.next_revision());
        meta.generation = Some(if spec_changed {
            generation.saturating_add(1)
        } else {
            generation
        });

        // Status is only writable through the status surface.
        let mut value = serde_json::to_value(&stored)?;
        if let (Some(fields), Some(status)) =
            (value.as_object_mut(), current.value.get("status").cloned())
        {
            fields.insert("status".to_string(), status);
        }
        let entry = Entry {
            meta: stored.meta().clone(),
            value,
        };
        let result = entry.decode()?;
        objects.insert(key.clone(), entry);
        drop(objects);

        self.record(Operation::Update, &key).await;
        Ok(result)
    }

    async fn update_status(
        &self,
        namespace: &str,
        name: &str,
        status: &LavinMQStatus,
    ) -> Result<()> {
        self.check_failure(Operation::UpdateStatus, &LavinMQ::kind(&()))
            .await?;
        let key = ObjectKey::new::<LavinMQ>(namespace, name);

        let mut objects = self.objects.write().await;
        let entry = objects.get_mut(&key).ok_or_else(|| missing(&key))?;
        let mut instance: LavinMQ = entry.decode()?;
        instance.status = Some(status.clone());
        instance.meta_mut().resource_version = Some(self.next_revision());
        entry.meta = instance.meta().clone();
        entry.value = serde_json::to_value(&instance)?;
        drop(objects);

        self.record(Operation::UpdateStatus, &key).await;
        Ok(())
    }
}
