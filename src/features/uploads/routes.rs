use axum::{extract::DefaultBodyLimit, routing::post, Router};
use std::sync::Arc;

use crate::features::uploads::handlers::upload_file;
use crate::features::uploads::services::UploadService;
use crate::shared::constants::{MAX_FILE_SIZE, MULTIPART_OVERHEAD};

/// Create routes for the uploads feature
pub fn routes(upload_service: Arc<UploadService>) -> Router {
    Router::new()
        .route(
            "/upload",
            // Allow body size up to MAX_FILE_SIZE + buffer for multipart overhead
            post(upload_file).layer(DefaultBodyLimit::max(MAX_FILE_SIZE + MULTIPART_OVERHEAD)),
        )
        .with_state(upload_service)
}

