use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::uploads::models::PublishedObject;

/// Upload request DTO for OpenAPI documentation
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler uses axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadFileDto {
    /// The file to upload; its filename becomes the object key
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

/// Body returned once the object is stored and public
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponseDto {
    /// Public URL of the stored object
    #[schema(example = "https://storage.googleapis.com/my-bucket/cat.png")]
    pub link: String,
}

impl From<PublishedObject> for UploadResponseDto {
    fn from(object: PublishedObject) -> Self {
        Self {
            link: object.public_url,
        }
    }
}
