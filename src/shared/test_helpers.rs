use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::core::error::{AppError, Result};
use crate::modules::storage::{public_object_url, ObjectStore};

pub const TEST_BUCKET: &str = "test-bucket";
pub const TEST_PUBLIC_BASE_URL: &str = "https://storage.googleapis.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
    pub public: bool,
}

/// Bucket kept in memory, with switches to simulate backend failures
#[derive(Default)]
pub struct InMemoryStore {
    objects: Mutex<HashMap<String, StoredObject>>,
    calls: Mutex<Vec<String>>,
    fail_put: AtomicBool,
    fail_make_public: AtomicBool,
    stall_put: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_put() -> Self {
        let store = Self::default();
        store.fail_put.store(true, Ordering::SeqCst);
        store
    }

    pub fn failing_make_public() -> Self {
        let store = Self::default();
        store.fail_make_public.store(true, Ordering::SeqCst);
        store
    }

    /// Writes never complete
    pub fn stalling_put() -> Self {
        let store = Self::default();
        store.stall_put.store(true, Ordering::SeqCst);
        store
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    /// Calls in order, as "put:<key>" / "make_public:<key>"
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    fn bucket_name(&self) -> &str {
        TEST_BUCKET
    }

    async fn put_object(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
        self.calls.lock().unwrap().push(format!("put:{}", key));

        if self.stall_put.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(AppError::StorageWrite(format!("simulated write failure for '{}'", key)));
        }

        // Overwrite resets visibility, like a fresh object
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
                public: false,
            },
        );
        Ok(())
    }

    async fn make_public(&self, key: &str) -> Result<()> {
        self.calls.lock().unwrap().push(format!("make_public:{}", key));

        if self.fail_make_public.load(Ordering::SeqCst) {
            return Err(AppError::StorageVisibility(format!(
                "simulated ACL failure for '{}'",
                key
            )));
        }

        match self.objects.lock().unwrap().get_mut(key) {
            Some(object) => {
                object.public = true;
                Ok(())
            }
            None => Err(AppError::StorageVisibility(format!("no such object '{}'", key))),
        }
    }

    fn public_url(&self, key: &str) -> String {
        public_object_url(TEST_PUBLIC_BASE_URL, TEST_BUCKET, key)
    }
}
