use utoipa::{Modify, OpenApi};

use crate::features::uploads::{dtos as uploads_dtos, handlers as uploads_handlers};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Uploads
        uploads_handlers::upload_file,
    ),
    components(
        schemas(
            // Uploads
            uploads_dtos::UploadFileDto,
            uploads_dtos::UploadResponseDto,
        )
    ),
    tags(
        (name = "uploads", description = "Upload files to the public bucket"),
    ),
    info(
        title = "Bucket Upload API",
        version = "0.1.0",
        description = "Upload files to a public storage bucket",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
