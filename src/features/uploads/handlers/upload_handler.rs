use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::debug;

use crate::core::error::AppError;
use crate::features::uploads::dtos::{UploadFileDto, UploadResponseDto};
use crate::features::uploads::models::PendingUpload;
use crate::features::uploads::services::UploadService;
use crate::shared::constants::{DEFAULT_CONTENT_TYPE, FILE_FIELD_NAME, MAX_FILE_SIZE};

/// Upload a file and get its public link
///
/// Accepts multipart/form-data with a single `file` field. The file is stored
/// under its original filename, made publicly readable and its URL returned.
/// Any other fields are ignored.
#[utoipa::path(
    post,
    path = "/upload",
    tag = "uploads",
    request_body(
        content = UploadFileDto,
        content_type = "multipart/form-data",
        description = "Form with a single `file` field (max 5 MB)",
    ),
    responses(
        (status = 200, description = "File stored and public", body = UploadResponseDto),
        (status = 400, description = "No file uploaded.", body = String, content_type = "text/plain"),
        (status = 413, description = "File too large"),
        (status = 502, description = "Storage write or visibility change failed"),
        (status = 504, description = "Storage did not respond in time")
    )
)]
pub async fn upload_file(
    State(service): State<Arc<UploadService>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponseDto>, AppError> {
    // A body that is not multipart at all carries no file either
    let mut multipart = multipart.map_err(|e| {
        debug!("Request is not multipart: {}", e);
        AppError::NoFileUploaded
    })?;

    let upload = read_upload(&mut multipart)
        .await?
        .ok_or(AppError::NoFileUploaded)?;

    let published = service.publish(upload).await?;

    Ok(Json(published.into()))
}

/// Buffer the first `file` part that carries a filename.
///
/// Remaining parts are drained and ignored.
async fn read_upload(multipart: &mut Multipart) -> Result<Option<PendingUpload>, AppError> {
    let mut upload: Option<PendingUpload> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or("").to_string();

        if field_name != FILE_FIELD_NAME || upload.is_some() {
            debug!("Ignoring field: {}", field_name);
            continue;
        }

        // A `file` part without a filename is a plain text field
        let Some(file_name) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(|name| name.to_string())
        else {
            debug!("Ignoring `{}` field without a filename", field_name);
            continue;
        };

        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        let mut data = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            if data.len() + chunk.len() > MAX_FILE_SIZE {
                return Err(AppError::PayloadTooLarge(format!(
                    "File too large. Maximum size is {} bytes ({} MB)",
                    MAX_FILE_SIZE,
                    MAX_FILE_SIZE / 1024 / 1024
                )));
            }
            data.extend_from_slice(&chunk);
        }

        upload = Some(PendingUpload {
            original_filename: file_name,
            content_type,
            data,
        });
    }

    Ok(upload)
}

fn multipart_error(e: MultipartError) -> AppError {
    debug!("Failed to read multipart data: {}", e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(format!("Failed to read multipart data: {}", e.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::uploads::routes;
    use crate::shared::test_helpers::{InMemoryStore, TEST_BUCKET};
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use std::time::Duration;

    fn server(store: Arc<InMemoryStore>) -> TestServer {
        let service = Arc::new(UploadService::new(store, Duration::from_secs(5)));
        TestServer::new(routes(service)).unwrap()
    }

    fn file_part(bytes: Vec<u8>, name: &str, mime: &str) -> Part {
        Part::bytes(bytes).file_name(name).mime_type(mime)
    }

    #[tokio::test]
    async fn test_upload_returns_public_link() {
        let store = Arc::new(InMemoryStore::new());
        let server = server(store.clone());

        let response = server
            .post("/upload")
            .multipart(
                MultipartForm::new().add_part("file", file_part(vec![7u8; 10], "cat.png", "image/png")),
            )
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(
            body,
            json!({ "link": format!("https://storage.googleapis.com/{}/cat.png", TEST_BUCKET) })
        );

        let object = store.object("cat.png").unwrap();
        assert!(object.public);
        assert_eq!(object.content_type, "image/png");
        assert_eq!(object.data, vec![7u8; 10]);
    }

    #[tokio::test]
    async fn test_missing_file_field_is_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let server = server(store.clone());

        let response = server
            .post("/upload")
            .multipart(MultipartForm::new().add_text("description", "no file here"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.text(), "No file uploaded.");
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_non_multipart_body_is_rejected_as_missing_file() {
        let store = Arc::new(InMemoryStore::new());
        let server = server(store.clone());

        let response = server.post("/upload").text("hello").await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.text(), "No file uploaded.");
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_file_field_without_filename_is_ignored() {
        let store = Arc::new(InMemoryStore::new());
        let server = server(store.clone());

        let response = server
            .post("/upload")
            .multipart(MultipartForm::new().add_text("file", "just text"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.text(), "No file uploaded.");
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_extra_fields_and_files_are_ignored() {
        let store = Arc::new(InMemoryStore::new());
        let server = server(store.clone());

        let response = server
            .post("/upload")
            .multipart(
                MultipartForm::new()
                    .add_text("caption", "a cat")
                    .add_part("avatar", file_part(b"other".to_vec(), "dog.png", "image/png"))
                    .add_part("file", file_part(b"first".to_vec(), "first.txt", "text/plain"))
                    .add_part("file", file_part(b"second".to_vec(), "second.txt", "text/plain")),
            )
            .await;

        response.assert_status_ok();
        assert_eq!(store.calls(), vec!["put:first.txt", "make_public:first.txt"]);
        assert_eq!(store.object_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_part_content_type_defaults_to_octet_stream() {
        let store = Arc::new(InMemoryStore::new());
        let server = server(store.clone());

        let response = server
            .post("/upload")
            .multipart(
                MultipartForm::new().add_part("file", Part::bytes(b"raw".to_vec()).file_name("blob.bin")),
            )
            .await;

        response.assert_status_ok();
        assert_eq!(
            store.object("blob.bin").unwrap().content_type,
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn test_file_at_size_limit_is_accepted() {
        let store = Arc::new(InMemoryStore::new());
        let server = server(store.clone());

        let response = server
            .post("/upload")
            .multipart(MultipartForm::new().add_part(
                "file",
                file_part(vec![0u8; MAX_FILE_SIZE], "limit.bin", "application/octet-stream"),
            ))
            .await;

        response.assert_status_ok();
        assert_eq!(store.object("limit.bin").unwrap().data.len(), MAX_FILE_SIZE);
    }

    #[tokio::test]
    async fn test_file_over_size_limit_is_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let server = server(store.clone());

        let response = server
            .post("/upload")
            .multipart(MultipartForm::new().add_part(
                "file",
                file_part(vec![0u8; MAX_FILE_SIZE + 1], "big.bin", "application/octet-stream"),
            ))
            .await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        assert!(store.calls().is_empty());
        assert_eq!(store.object_count(), 0);
    }

    #[tokio::test]
    async fn test_six_megabyte_upload_is_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let server = server(store.clone());

        let response = server
            .post("/upload")
            .multipart(MultipartForm::new().add_part(
                "file",
                file_part(vec![1u8; 6 * 1024 * 1024], "huge.png", "image/png"),
            ))
            .await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_body_over_route_limit_is_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let server = server(store.clone());

        // The file itself is tiny; the trailing field pushes the body past the route limit
        let response = server
            .post("/upload")
            .multipart(
                MultipartForm::new()
                    .add_part("file", file_part(b"tiny".to_vec(), "tiny.txt", "text/plain"))
                    .add_part(
                        "extra",
                        file_part(vec![0u8; 7 * 1024 * 1024], "pad.bin", "application/octet-stream"),
                    ),
            )
            .await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_storage_write_failure_is_not_ok() {
        let store = Arc::new(InMemoryStore::failing_put());
        let server = server(store.clone());

        let response = server
            .post("/upload")
            .multipart(
                MultipartForm::new().add_part("file", file_part(b"data".to_vec(), "cat.png", "image/png")),
            )
            .await;

        response.assert_status(StatusCode::BAD_GATEWAY);
        let body: Value = response.json();
        assert_eq!(body["success"], json!(false));
        assert!(body.get("link").is_none());
    }

    #[tokio::test]
    async fn test_make_public_failure_is_not_ok() {
        let store = Arc::new(InMemoryStore::failing_make_public());
        let server = server(store.clone());

        let response = server
            .post("/upload")
            .multipart(
                MultipartForm::new().add_part("file", file_part(b"data".to_vec(), "cat.png", "image/png")),
            )
            .await;

        response.assert_status(StatusCode::BAD_GATEWAY);
        assert_eq!(store.calls(), vec!["put:cat.png", "make_public:cat.png"]);
    }

    #[tokio::test]
    async fn test_stalled_storage_yields_gateway_timeout() {
        let store = Arc::new(InMemoryStore::stalling_put());
        let service = Arc::new(UploadService::new(store, Duration::from_millis(50)));
        let server = TestServer::new(routes(service)).unwrap();

        let response = server
            .post("/upload")
            .multipart(
                MultipartForm::new().add_part("file", file_part(b"data".to_vec(), "cat.png", "image/png")),
            )
            .await;

        response.assert_status(StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn test_repeated_filename_overwrites_object() {
        let store = Arc::new(InMemoryStore::new());
        let server = server(store.clone());

        let mut links = Vec::new();
        for content in [b"version one".to_vec(), b"version two".to_vec()] {
            let response = server
                .post("/upload")
                .multipart(
                    MultipartForm::new().add_part("file", file_part(content, "notes.txt", "text/plain")),
                )
                .await;
            response.assert_status_ok();
            let body: UploadResponseDto = response.json();
            links.push(body.link);
        }

        assert_eq!(links[0], links[1]);
        assert_eq!(store.object("notes.txt").unwrap().data, b"version two");
    }
}
