//! Cloud Storage client
//!
//! Talks to the bucket through the S3-interoperable XML API using HMAC
//! keys. Object writes go through rust-s3; the canned-ACL change that
//! publishes an object is a hand-signed (AWS Signature v4) request.

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, Url};
use s3::creds::Credentials;
use s3::{Bucket, Region};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::{public_object_url, ObjectStore};
use crate::core::config::StorageConfig;
use crate::core::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

const SIGNING_ALGORITHM: &str = "AWS4-HMAC-SHA256";
const PUBLIC_READ_ACL: &str = "public-read";

pub struct GcsClient {
    bucket: Box<Bucket>,
    bucket_name: String,
    endpoint: String,
    public_base_url: String,
    /// Access key for AWS Signature v4 signing
    access_key: String,
    /// Secret key for AWS Signature v4 signing
    secret_key: String,
    /// Region name for AWS Signature v4 signing
    region_name: String,
    /// HTTP client for ACL operations
    http_client: Client,
}

impl GcsClient {
    pub fn new(config: StorageConfig) -> Result<Self> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create storage credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| AppError::Internal(format!("Failed to create bucket handle: {}", e)))?;

        // Path-style URLs (https://endpoint/bucket/key) match the public link format
        bucket.set_path_style();

        let http_client = Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "Storage client initialized for endpoint: {}, bucket: {}",
            config.endpoint, config.bucket
        );

        Ok(Self {
            bucket,
            bucket_name: config.bucket,
            endpoint: config.endpoint,
            public_base_url: config.public_base_url,
            access_key: config.access_key,
            secret_key: config.secret_key,
            region_name: config.region,
            http_client,
        })
    }

    /// Apply the `public-read` canned ACL to `key` using AWS Signature v4
    async fn put_public_acl_with_sigv4(&self, key: &str) -> Result<()> {
        let now = Utc::now();
        let date_stamp = now.format("%Y%m%d").to_string();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();

        let endpoint_url = Url::parse(&self.endpoint)
            .map_err(|e| AppError::Internal(format!("Invalid endpoint URL: {}", e)))?;
        let host = endpoint_url
            .host_str()
            .ok_or_else(|| AppError::Internal("Endpoint URL has no host".to_string()))?;
        let host_header = match endpoint_url.port() {
            Some(p) => format!("{}:{}", host, p),
            None => host.to_string(),
        };

        // Keep the endpoint path prefix, as rust-s3 does for the write
        let canonical_uri = format!(
            "{}/{}/{}",
            endpoint_url.path().trim_end_matches('/'),
            self.bucket_name,
            encode_key(key)
        );
        let url = format!("{}://{}{}?acl", endpoint_url.scheme(), host_header, canonical_uri);

        // Empty body
        let payload_hash = hex::encode(Sha256::digest(b""));

        let canonical_headers = format!(
            "host:{}\nx-amz-acl:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n",
            host_header, PUBLIC_READ_ACL, payload_hash, amz_date
        );
        let signed_headers = "host;x-amz-acl;x-amz-content-sha256;x-amz-date";

        let canonical_request = format!(
            "PUT\n{}\n{}\n{}\n{}\n{}",
            canonical_uri, "acl=", canonical_headers, signed_headers, payload_hash
        );

        let credential_scope = format!("{}/{}/s3/aws4_request", date_stamp, self.region_name);
        let canonical_request_hash = hex::encode(Sha256::digest(canonical_request.as_bytes()));
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            SIGNING_ALGORITHM, amz_date, credential_scope, canonical_request_hash
        );

        let key_bytes = signing_key(&self.secret_key, &date_stamp, &self.region_name, "s3")?;
        let signature = hex::encode(hmac_sha256(&key_bytes, string_to_sign.as_bytes())?);

        let authorization_header = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            SIGNING_ALGORITHM, self.access_key, credential_scope, signed_headers, signature
        );

        let response = self
            .http_client
            .put(&url)
            .header("Host", &host_header)
            .header("x-amz-acl", PUBLIC_READ_ACL)
            .header("x-amz-date", &amz_date)
            .header("x-amz-content-sha256", &payload_hash)
            .header("Authorization", &authorization_header)
            .send()
            .await
            .map_err(|e| {
                AppError::StorageVisibility(format!("Failed to send ACL request for '{}': {}", key, e))
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(AppError::StorageVisibility(format!(
                "Failed to make '{}' public: {} - {}",
                key, status, body
            )))
        }
    }
}

#[async_trait]
impl ObjectStore for GcsClient {
    fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    async fn put_object(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
        let response = self
            .bucket
            .put_object_with_content_type(key, &data, content_type)
            .await
            .map_err(|e| AppError::StorageWrite(format!("Failed to upload '{}': {}", key, e)))?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(AppError::StorageWrite(format!(
                "Failed to upload '{}': status {} - {}",
                key,
                status,
                String::from_utf8_lossy(&response.to_vec())
            )));
        }

        debug!("Uploaded '{}' to bucket '{}'", key, self.bucket_name);
        Ok(())
    }

    async fn make_public(&self, key: &str) -> Result<()> {
        self.put_public_acl_with_sigv4(key).await?;
        debug!("Made '{}' public in bucket '{}'", key, self.bucket_name);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        public_object_url(&self.public_base_url, &self.bucket_name, key)
    }
}

/// Percent-encode each `/`-separated segment of an object key
fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Derive the AWS Signature v4 signing key
fn signing_key(secret_key: &str, date_stamp: &str, region: &str, service: &str) -> Result<Vec<u8>> {
    let k_date = hmac_sha256(
        format!("AWS4{}", secret_key).as_bytes(),
        date_stamp.as_bytes(),
    )?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AppError::Internal(format!("HMAC key error: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}
