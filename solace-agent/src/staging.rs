//! Image staging - uploads written to a per-request temp directory
//!
//! Each upload is checked and written on its own. An upload that fails is
//! logged and skipped; the rest of the batch carries on. The batch owns its
//! directory, so staged files disappear when the request is done with them.

use solace_llm::{Error, ErrorKind, ImagePart, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Accepted upload types
pub const ACCEPTED_MIME_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

/// An uploaded file as received from the form or the command line
#[derive(Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        }
    }

    /// Read an image from disk, guessing its type from the extension
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            Error::from(e)
                .with_operation("staging::from_path")
                .with_context("path", path.display().to_string())
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        Ok(Self::new(file_name, None, bytes))
    }

    /// The accepted MIME type for this upload, if it has one
    pub fn mime_type(&self) -> Option<&'static str> {
        if let Some(declared) = self.content_type.as_deref() {
            match declared.trim().to_ascii_lowercase().as_str() {
                "image/jpeg" | "image/jpg" | "image/pjpeg" => return Some("image/jpeg"),
                "image/png" => return Some("image/png"),
                "" | "application/octet-stream" => {}
                _ => return None,
            }
        }

        let extension = Path::new(&self.file_name)
            .extension()?
            .to_string_lossy()
            .to_ascii_lowercase();
        match extension.as_str() {
            "jpg" | "jpeg" => Some("image/jpeg"),
            "png" => Some("image/png"),
            _ => None,
        }
    }
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// How many staged images a batch returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StagingMode {
    /// Every upload that stages successfully
    #[default]
    Accumulate,
    /// Stop after the first successful upload (legacy behaviour)
    FirstOnly,
}

/// An upload written to disk and ready to be read back by a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedImage {
    pub path: PathBuf,
    pub mime_type: &'static str,
    pub original_name: String,
}

impl StagedImage {
    pub async fn load(&self) -> Result<ImagePart> {
        ImagePart::from_file(&self.path, self.mime_type).await
    }
}

/// Staged images plus the uploads that were skipped
#[derive(Debug)]
pub struct StagedBatch {
    dir: Option<TempDir>,
    images: Vec<StagedImage>,
    skipped: Vec<Error>,
}

impl StagedBatch {
    pub fn empty() -> Self {
        Self {
            dir: None,
            images: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn images(&self) -> &[StagedImage] {
        &self.images
    }

    pub fn skipped(&self) -> &[Error] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_ref().map(|d| d.path())
    }

    /// Read every staged image back as a provider part.
    ///
    /// A file that can no longer be read is logged and left out, same as
    /// an upload that never staged.
    pub async fn load_parts(&self) -> Vec<ImagePart> {
        let mut parts = Vec::with_capacity(self.images.len());
        for image in &self.images {
            match image.load().await {
                Ok(part) => parts.push(part),
                Err(e) => {
                    tracing::error!(file = %image.original_name, error = %e, "failed to read staged image");
                }
            }
        }
        parts
    }
}

/// Stage uploads into a fresh temp directory
pub async fn stage_images(uploads: &[ImageUpload], mode: StagingMode) -> Result<StagedBatch> {
    if uploads.is_empty() {
        return Ok(StagedBatch::empty());
    }

    let dir = tempfile::Builder::new()
        .prefix("solace-")
        .tempdir()
        .map_err(|e| Error::from(e).with_operation("staging::stage_images"))?;

    let mut batch = StagedBatch {
        dir: None,
        images: Vec::new(),
        skipped: Vec::new(),
    };

    for (index, upload) in uploads.iter().enumerate() {
        match stage_one(dir.path(), index, upload).await {
            Ok(image) => {
                tracing::debug!(file = %image.original_name, path = %image.path.display(), "staged image");
                batch.images.push(image);
                if mode == StagingMode::FirstOnly {
                    break;
                }
            }
            Err(e) => {
                tracing::error!(file = %upload.file_name, error = %e, "error processing image");
                batch.skipped.push(e);
            }
        }
    }

    batch.dir = Some(dir);
    Ok(batch)
}

async fn stage_one(dir: &Path, index: usize, upload: &ImageUpload) -> Result<StagedImage> {
    let mime_type = upload.mime_type().ok_or_else(|| {
        Error::image_staging_failed(&upload.file_name, "unsupported image type; expected JPEG or PNG")
            .with_context(
                "content_type",
                upload.content_type.clone().unwrap_or_else(|| "unknown".to_string()),
            )
    })?;

    if upload.bytes.is_empty() {
        return Err(Error::image_staging_failed(&upload.file_name, "upload is empty"));
    }

    let path = dir.join(format!("temp_{}_{}", index, sanitize_file_name(&upload.file_name)));
    tokio::fs::write(&path, &upload.bytes).await.map_err(|e| {
        Error::new(ErrorKind::ImageStagingFailed, e.to_string())
            .with_operation("staging::write")
            .with_context("file", upload.file_name.clone())
            .set_source(e)
    })?;

    Ok(StagedImage {
        path,
        mime_type,
        original_name: upload.file_name.clone(),
    })
}

/// Keep only the last path component and a conservative character set
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}
