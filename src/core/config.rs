use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub storage: StorageConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Origins echoed in `Access-Control-Allow-Origin` ("*" allows any)
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// Cloud Storage configuration (S3-interoperable XML API with HMAC keys)
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// XML API endpoint used for writes and ACL changes
    pub endpoint: String,
    /// Base of the public object URL handed back to clients
    pub public_base_url: String,
    /// HMAC access key id
    pub access_key: String,
    /// HMAC secret
    pub secret_key: String,
    /// Target bucket for every upload
    pub bucket: String,
    /// Signing region ("auto" for Cloud Storage)
    pub region: String,
    /// Upper bound for each individual storage call
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        let cors_allowed_origins =
            parse_origins(&env::var("ORIGIN").unwrap_or_else(|_| "*".to_string()));

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Split a comma-separated origin list, dropping blanks
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Bucket Upload API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "Upload files to a public storage bucket".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl StorageConfig {
    pub const DEFAULT_ENDPOINT: &'static str = "https://storage.googleapis.com";
    const DEFAULT_REGION: &'static str = "auto";
    const DEFAULT_TIMEOUT_SECS: u64 = 60;

    pub fn from_env() -> Result<Self, String> {
        let bucket = env::var("GCLOUD_STORAGE_BUCKET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "GCLOUD_STORAGE_BUCKET environment variable is required".to_string())?;

        let endpoint = env::var("GCLOUD_STORAGE_ENDPOINT")
            .unwrap_or_else(|_| Self::DEFAULT_ENDPOINT.to_string());

        // Public links point at Cloud Storage even when writes go through a proxy endpoint
        let public_base_url = env::var("GCLOUD_STORAGE_PUBLIC_URL")
            .unwrap_or_else(|_| Self::DEFAULT_ENDPOINT.to_string());

        let access_key = env::var("GCLOUD_HMAC_ACCESS_KEY")
            .map_err(|_| "GCLOUD_HMAC_ACCESS_KEY environment variable is required".to_string())?;

        let secret_key = env::var("GCLOUD_HMAC_SECRET")
            .map_err(|_| "GCLOUD_HMAC_SECRET environment variable is required".to_string())?;

        let region =
            env::var("GCLOUD_STORAGE_REGION").unwrap_or_else(|_| Self::DEFAULT_REGION.to_string());

        let timeout_secs = env::var("STORAGE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "STORAGE_TIMEOUT_SECS must be a valid number".to_string())?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            access_key,
            secret_key,
            bucket,
            region,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
