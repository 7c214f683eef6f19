/// A file received from the multipart body, fully buffered in memory
#[derive(Debug, Clone)]
pub struct PendingUpload {
    /// Original filename, used verbatim as the object key
    pub original_filename: String,
    /// Declared MIME type of the part
    pub content_type: String,
    pub data: Vec<u8>,
}

/// An object that has been written and made publicly readable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedObject {
    pub key: String,
    pub content_type: String,
    pub size: usize,
    pub public_url: String,
}
