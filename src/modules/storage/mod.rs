pub mod gcs_client;

pub use gcs_client::GcsClient;

use async_trait::async_trait;

use crate::core::error::Result;

/// Remote bucket that uploads are written to and published from
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Name of the target bucket
    fn bucket_name(&self) -> &str;

    /// Write the whole buffer to `key`, tagging it with `content_type`.
    ///
    /// Returns only once the backend has acknowledged the object; any
    /// existing object under the same key is overwritten.
    async fn put_object(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<()>;

    /// Grant anonymous read access to an already written object
    async fn make_public(&self, key: &str) -> Result<()>;

    /// Unauthenticated URL of `key`, computed locally
    fn public_url(&self, key: &str) -> String;
}

/// `{base}/{bucket}/{key}` with the key used verbatim
pub fn public_object_url(base_url: &str, bucket: &str, key: &str) -> String {
    format!("{}/{}/{}", base_url.trim_end_matches('/'), bucket, key)
}
