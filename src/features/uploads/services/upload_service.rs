use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::core::error::{AppError, Result};
use crate::features::uploads::models::{PendingUpload, PublishedObject};
use crate::modules::storage::ObjectStore;

/// Writes buffered uploads to the bucket and publishes them
pub struct UploadService {
    store: Arc<dyn ObjectStore>,
    timeout: Duration,
}

impl UploadService {
    pub fn new(store: Arc<dyn ObjectStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn bucket_name(&self) -> &str {
        self.store.bucket_name()
    }

    /// Store the upload under its original filename and make it public
    ///
    /// The object is made public only after the write has been acknowledged,
    /// and the public URL is returned only after both steps succeeded.
    /// Neither step is retried.
    pub async fn publish(&self, upload: PendingUpload) -> Result<PublishedObject> {
        let PendingUpload {
            original_filename: key,
            content_type,
            data,
        } = upload;
        let size = data.len();

        self.bounded("write", &key, self.store.put_object(&key, data, &content_type))
            .await?;
        debug!("Object '{}' written ({} bytes)", key, size);

        self.bounded("make public", &key, self.store.make_public(&key))
            .await?;

        let published = PublishedObject {
            public_url: self.store.public_url(&key),
            key,
            content_type,
            size,
        };

        info!(
            "Object published: bucket={}, key={}, size={}, content_type={}",
            self.bucket_name(),
            published.key,
            published.size,
            published.content_type
        );

        Ok(published)
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        key: &str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| {
                AppError::StorageTimeout(format!(
                    "{} of '{}' did not finish within {:?}",
                    operation, key, self.timeout
                ))
            })?
    }
}
