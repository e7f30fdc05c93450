//! In-memory [`ResourceStore`] for tests.
//!
//! Keeps objects in a map behind a mutex and supports injecting transient
//! failures, so polling loops can be exercised against store outages without
//! a live API server. Handles are cheap clones sharing the same map, which
//! lets a test play the background controller by mutating an object while a
//! watcher polls it.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use kube::core::ErrorResponse;

use super::ResourceStore;
use crate::error::{Error, Result};

/// In-memory object store.
pub struct MemoryStore<K> {
    objects: Arc<Mutex<BTreeMap<String, K>>>,
    fail_gets: Arc<AtomicUsize>,
    fail_deletes: Arc<AtomicBool>,
}

impl<K> Clone for MemoryStore<K> {
    fn clone(&self) -> Self {
        Self {
            objects: Arc::clone(&self.objects),
            fail_gets: Arc::clone(&self.fail_gets),
            fail_deletes: Arc::clone(&self.fail_deletes),
        }
    }
}

impl<K> Default for MemoryStore<K>
where
    K: kube::Resource + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> MemoryStore<K>
where
    K: kube::Resource + Clone,
{
    /// Empty store.
    pub fn new() -> Self {
        Self {
            objects: Arc::new(Mutex::new(BTreeMap::new())),
            fail_gets: Arc::new(AtomicUsize::new(0)),
            fail_deletes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Insert or replace an object, bypassing create-uniqueness. This is how
    /// tests seed state and simulate the background controller's writes.
    pub fn upsert(&self, resource: K) {
        let name = resource.meta().name.clone().unwrap_or_default();
        self.objects.lock().unwrap().insert(name, resource);
    }

    /// Whether an object with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.objects.lock().unwrap().contains_key(name)
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make the next `n` gets fail with a transient (503) error.
    pub fn fail_next_gets(&self, n: usize) {
        self.fail_gets.store(n, Ordering::SeqCst);
    }

    /// Make every delete fail with a transient (503) error.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    fn unavailable(message: &str) -> Error {
        Error::Kube(kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: message.to_string(),
            reason: "ServiceUnavailable".to_string(),
            code: 503,
        }))
    }

    fn kind() -> String
    where
        K::DynamicType: Default,
    {
        K::kind(&K::DynamicType::default()).into_owned()
    }
}

#[async_trait]
impl<K> ResourceStore<K> for MemoryStore<K>
where
    K: kube::Resource + Clone + Send + Sync,
    K::DynamicType: Default,
{
    async fn get(&self, name: &str) -> Result<Option<K>> {
        if self
            .fail_gets
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(Self::unavailable("injected get failure"));
        }
        Ok(self.objects.lock().unwrap().get(name).cloned())
    }

    async fn create(&self, resource: &K) -> Result<()> {
        let name = resource.meta().name.clone().unwrap_or_default();
        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(&name) {
            return Err(Error::AlreadyExists {
                kind: Self::kind(),
                name,
            });
        }
        objects.insert(name, resource.clone());
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(Self::unavailable("injected delete failure"));
        }
        match self.objects.lock().unwrap().remove(name) {
            Some(_) => Ok(()),
            None => Err(Error::Kube(kube::Error::Api(ErrorResponse {
                status: "Failure".to_string(),
                message: format!("{} not found", name),
                reason: "NotFound".to_string(),
                code: 404,
            }))),
        }
    }

    async fn list(&self, label_selector: &str) -> Result<Vec<K>> {
        let objects = self.objects.lock().unwrap();
        Ok(objects
            .values()
            .filter(|obj| selector_matches(label_selector, obj.meta().labels.as_ref()))
            .cloned()
            .collect())
    }
}

/// Conjunctive `k=v,k2=v2` selector match. An empty selector matches all.
fn selector_matches(selector: &str, labels: Option<&BTreeMap<String, String>>) -> bool {
    selector
        .split(',')
        .filter(|clause| !clause.is_empty())
        .all(|clause| match clause.split_once('=') {
            Some((key, value)) => {
                labels.is_some_and(|l| l.get(key).map(String::as_str) == Some(value))
            }
            None => false,
        })
}
