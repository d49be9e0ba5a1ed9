/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the capture layer, the analysis session and the UI layer.

/// A single captured or uploaded image, ready for upload to the backend.
///
/// Immutable once produced: a new capture or upload fully replaces the
/// previous image in the session, no history is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedImage {
    /// Raw binary payload (JPEG, PNG, ...)
    pub bytes: Vec<u8>,
    /// MIME type of the payload (e.g., "image/jpeg")
    pub mime: String,
}

impl CapturedImage {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
        }
    }

    /// Suggested filename for the multipart upload, derived from the MIME subtype
    pub fn upload_filename(&self) -> String {
        let ext = self
            .mime
            .split_once('/')
            .map(|(_, subtype)| subtype)
            .filter(|subtype| !subtype.is_empty())
            .unwrap_or("bin");
        format!("frame.{}", ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_filename_from_mime() {
        let image = CapturedImage::new(vec![0xFF, 0xD8], "image/jpeg");
        assert_eq!(image.upload_filename(), "frame.jpeg");
    }

    #[test]
    fn test_upload_filename_fallback() {
        let image = CapturedImage::new(vec![1, 2, 3], "garbage");
        assert_eq!(image.upload_filename(), "frame.bin");
    }
}
