/// Multipart field carrying the uploaded file
pub const FILE_FIELD_NAME: &str = "file";

/// Maximum file size in bytes (5MB)
pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

/// Extra body allowance for multipart boundaries and part headers
pub const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Content type assumed when the file part does not declare one
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

pub const NO_FILE_UPLOADED_MESSAGE: &str = "No file uploaded.";
