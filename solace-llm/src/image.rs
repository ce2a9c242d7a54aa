//! Inline image parts sent alongside a prompt

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::{Path, PathBuf};

use crate::error::{Error, ErrorKind, Result};

/// An image attached to a chat message, already base64-encoded.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePart {
    pub mime_type: String,
    pub data: String,
    pub source: Option<PathBuf>,
}

impl ImagePart {
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: STANDARD.encode(bytes),
            source: None,
        }
    }

    /// Read a staged image back from disk
    pub async fn from_file(path: impl AsRef<Path>, mime_type: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            Error::from(e)
                .with_operation("image::from_file")
                .with_context("path", path.display().to_string())
        })?;
        if bytes.is_empty() {
            return Err(Error::new(ErrorKind::InvalidArgument, "image file is empty")
                .with_operation("image::from_file")
                .with_context("path", path.display().to_string()));
        }

        let mut part = Self::from_bytes(mime_type, &bytes);
        part.source = Some(path.to_path_buf());
        Ok(part)
    }

    /// `data:` URL form used by OpenAI-compatible APIs
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Approximate decoded size in bytes
    pub fn byte_len(&self) -> usize {
        self.data.len() / 4 * 3
    }
}

impl std::fmt::Debug for ImagePart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePart")
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.byte_len())
            .field("source", &self.source)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_bytes_and_data_url() {
        let part = ImagePart::from_bytes("image/png", b"\x89PNG");
        assert_eq!(part.data, "iVBORw==");
        assert_eq!(part.data_url(), "data:image/png;base64,iVBORw==");
        assert!(part.source.is_none());
    }

    #[test]
    fn test_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shot.jpg");
        std::fs::write(&path, b"jpeg-bytes").unwrap();

        let part = tokio_test::block_on(ImagePart::from_file(&path, "image/jpeg")).unwrap();
        assert_eq!(part.mime_type, "image/jpeg");
        assert_eq!(part.source.as_deref(), Some(path.as_path()));
        assert_eq!(STANDARD.decode(&part.data).unwrap(), b"jpeg-bytes");
    }

    #[test]
    fn test_from_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = tokio_test::block_on(ImagePart::from_file(dir.path().join("nope.png"), "image/png"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
    }

    #[test]
    fn test_debug_hides_payload() {
        let part = ImagePart::from_bytes("image/png", b"secret-pixels");
        let debug = format!("{:?}", part);
        assert!(!debug.contains(&part.data));
        assert!(debug.contains("image/png"));
    }
}
