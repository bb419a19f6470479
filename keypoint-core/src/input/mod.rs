//! Input acquisition: file selection, validation, preview and method choice.
//!
//! Files arrive either from a manual pick (file dialog, command line path) or
//! from a drop event. Both paths go through the same checks:
//!
//! 1. a file must be present (a drop event contributes its first file),
//! 2. it must have a display name,
//! 3. its declared media type must start with `image/`,
//! 4. it must not exceed [`MAX_IMAGE_BYTES`].
//!
//! A rejected selection leaves the current image untouched.

mod preview;
mod validation;

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

pub use preview::{MemoryPreviewStore, PreviewHandle, PreviewStore};
pub use validation::{media_type_for_path, validate_file_size, validate_media_type};

use crate::error::{ValidationError, MAX_IMAGE_BYTES};
use crate::method::DetectionMethod;

/// A file as delivered by the picker or a drop event, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedFile {
    pub name: String,
    pub media_type: Option<String>,
    pub data: Vec<u8>,
    /// Size of a payload that was not loaded because it cannot pass validation.
    unread_size: Option<u64>,
}

impl PickedFile {
    pub fn new(name: impl Into<String>, media_type: Option<&str>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.map(str::to_string),
            data,
            unread_size: None,
        }
    }

    /// Read a file from disk, inferring its media type from the extension.
    ///
    /// Files that would be rejected anyway are not read in full: a non-image
    /// is not read at all, a regular file over [`MAX_IMAGE_BYTES`] is sized
    /// from its metadata, and other files (pipes, devices) are read up to one
    /// byte past the limit. In those cases `data` is empty and [`size`]
    /// reports the size that triggers the rejection.
    ///
    /// [`size`]: PickedFile::size
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let media_type = media_type_for_path(path);
        let mut file = Self::new(name, media_type, Vec::new());

        if validate_media_type(media_type).is_err() {
            file.unread_size = Some(std::fs::metadata(path)?.len());
            return Ok(file);
        }

        let handle = std::fs::File::open(path)?;
        let metadata = handle.metadata()?;
        if metadata.is_file() && metadata.len() > MAX_IMAGE_BYTES {
            file.unread_size = Some(metadata.len());
            return Ok(file);
        }

        let mut data = Vec::new();
        handle.take(MAX_IMAGE_BYTES + 1).read_to_end(&mut data)?;
        if data.len() as u64 > MAX_IMAGE_BYTES {
            file.unread_size = Some(data.len() as u64);
        } else {
            file.data = data;
        }

        Ok(file)
    }

    pub fn size(&self) -> u64 {
        self.unread_size.unwrap_or(self.data.len() as u64)
    }
}

/// Where a selection came from.
#[derive(Debug, Clone)]
pub enum FileSource {
    /// File dialog result; `None` when the dialog was dismissed.
    ManualPick(Option<PickedFile>),
    /// Files carried by a drop event; only the first is used.
    Drop(Vec<PickedFile>),
}

impl FileSource {
    fn kind(&self) -> &'static str {
        match self {
            Self::ManualPick(_) => "manual",
            Self::Drop(_) => "drop",
        }
    }

    fn into_file(self) -> Option<PickedFile> {
        match self {
            Self::ManualPick(file) => file,
            Self::Drop(files) => files.into_iter().next(),
        }
    }
}

/// The accepted image, owned by [`InputAcquisition`].
#[derive(Debug)]
pub struct SelectedImage {
    data: Vec<u8>,
    display_name: String,
    size_bytes: u64,
    media_type: Option<String>,
    preview: PreviewHandle,
}

impl SelectedImage {
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    /// Locator of the local preview for this image.
    pub fn preview(&self) -> &str {
        self.preview.locator()
    }
}

/// Holds the current selection, its preview and the active detection method.
pub struct InputAcquisition {
    previews: Arc<dyn PreviewStore>,
    current: Option<SelectedImage>,
    method: DetectionMethod,
    pending_error: Option<ValidationError>,
    max_bytes: u64,
}

impl InputAcquisition {
    pub fn new(previews: Arc<dyn PreviewStore>) -> Self {
        Self {
            previews,
            current: None,
            method: DetectionMethod::default(),
            pending_error: None,
            max_bytes: MAX_IMAGE_BYTES,
        }
    }

    /// Validate and accept a file, replacing the current selection.
    ///
    /// The previous preview is released before the new one is acquired.
    pub fn select_file(&mut self, source: FileSource) -> Result<&SelectedImage, ValidationError> {
        let kind = source.kind();

        let file = match Self::validate(source, self.max_bytes) {
            Ok(file) => file,
            Err(err) => {
                warn!(source = kind, error = %err, "Rejected file selection");
                self.pending_error = Some(err.clone());
                return Err(err);
            }
        };

        // Release the old preview first.
        self.current = None;
        self.pending_error = None;

        let preview = PreviewHandle::acquire(&self.previews, &file.name, &file.data);
        info!(
            source = kind,
            name = %file.name,
            bytes = file.size(),
            "Selected image"
        );

        let selected: &SelectedImage = self.current.insert(SelectedImage {
            size_bytes: file.size(),
            display_name: file.name,
            media_type: file.media_type,
            data: file.data,
            preview,
        });
        Ok(selected)
    }

    fn validate(source: FileSource, max_bytes: u64) -> Result<PickedFile, ValidationError> {
        let file = source.into_file().ok_or(ValidationError::NoFile)?;

        if file.name.trim().is_empty() {
            return Err(ValidationError::UnnamedFile);
        }
        validate_media_type(file.media_type.as_deref())?;
        validate_file_size(file.size(), max_bytes)?;

        Ok(file)
    }

    pub fn set_method(&mut self, method: DetectionMethod) {
        debug!(method = %method, "Detection method changed");
        self.method = method;
    }

    pub fn method(&self) -> DetectionMethod {
        self.method
    }

    pub fn selected(&self) -> Option<&SelectedImage> {
        self.current.as_ref()
    }

    /// Last selection error, cleared by a successful selection or a reset.
    pub fn pending_error(&self) -> Option<&ValidationError> {
        self.pending_error.as_ref()
    }

    /// Clear the selection (releasing its preview) and any pending error.
    pub fn reset(&mut self) {
        if self.current.take().is_some() {
            debug!("Cleared selected image");
        }
        self.pending_error = None;
    }
}
