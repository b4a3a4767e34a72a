//! The document being uploaded and the per-call request that carries it.

use std::path::Path;

use bytes::Bytes;
use url::Url;

use crate::progress::ProgressSink;

/// Media type used when the extension is not recognized.
pub const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// A named binary blob with a declared media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    name: String,
    media_type: String,
    bytes: Bytes,
}

impl UploadFile {
    /// Creates a payload from raw parts.
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Reads a file from disk, guessing the media type from its extension.
    ///
    /// # Errors
    ///
    /// Returns the IO error if the file cannot be read.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self::new(name, guess_media_type(path), bytes))
    }

    /// Replaces the declared media type.
    #[must_use]
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = media_type.into();
        self
    }

    /// File name sent in the multipart part.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared media type.
    #[must_use]
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// File contents.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Cheap handle to the contents; clones share one buffer.
    pub(crate) fn shared_bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True for a zero-length payload.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// One upload call: what to send, where, and who to tell about it.
#[derive(Clone, Copy)]
pub struct UploadRequest<'a> {
    /// The document.
    pub payload: &'a UploadFile,
    /// Full endpoint URL.
    pub endpoint: &'a Url,
    /// Receives byte-level transfer events, if any.
    pub progress: Option<&'a dyn ProgressSink>,
}

impl std::fmt::Debug for UploadRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadRequest")
            .field("file", &self.payload.name())
            .field("bytes", &self.payload.len())
            .field("endpoint", &self.endpoint.as_str())
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Guesses a media type from a file extension.
#[must_use]
pub fn guess_media_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("json") => "application/json",
        _ => FALLBACK_MEDIA_TYPE,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_guess_media_type_by_extension() {
        assert_eq!(guess_media_type(Path::new("paper.pdf")), "application/pdf");
        assert_eq!(guess_media_type(Path::new("PAPER.PDF")), "application/pdf");
        assert_eq!(guess_media_type(Path::new("notes.txt")), "text/plain");
        assert_eq!(guess_media_type(Path::new("result.json")), "application/json");
        assert_eq!(guess_media_type(Path::new("archive")), FALLBACK_MEDIA_TYPE);
        assert_eq!(guess_media_type(Path::new("scan.tiff")), FALLBACK_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_from_path_reads_name_type_and_bytes() {
        let dir = TempDir::new().unwrap();
        let path: PathBuf = dir.path().join("2510.15614v1.pdf");
        std::fs::write(&path, b"%PDF-1.7 test").unwrap();

        let file = UploadFile::from_path(&path).await.unwrap();

        assert_eq!(file.name(), "2510.15614v1.pdf");
        assert_eq!(file.media_type(), "application/pdf");
        assert_eq!(file.bytes(), b"%PDF-1.7 test");
        assert_eq!(file.len(), 13);
    }

    #[tokio::test]
    async fn test_from_path_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let result = UploadFile::from_path(&dir.path().join("missing.pdf")).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_with_media_type_overrides_declared_type() {
        let file = UploadFile::new("paper.pdf", "application/pdf", vec![1, 2, 3])
            .with_media_type("text/plain");
        assert_eq!(file.media_type(), "text/plain");
        assert!(!file.is_empty());
    }

    #[test]
    fn test_cloned_payload_shares_buffer() {
        let file = UploadFile::new("paper.pdf", "application/pdf", vec![7; 1024]);
        let copy = file.clone();

        assert_eq!(copy.bytes().as_ptr(), file.bytes().as_ptr());
        assert_eq!(file.shared_bytes().as_ptr(), file.bytes().as_ptr());
    }
}
