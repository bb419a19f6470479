//! The feature extractor tool: input acquisition and session wired together.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::debug;

use crate::error::ValidationError;
use crate::gateway::{ExtractionGateway, ImageUpload};
use crate::input::{FileSource, InputAcquisition, PreviewStore, SelectedImage};
use crate::method::DetectionMethod;
use crate::session::{SessionController, SessionState, SubmitOutcome};

/// Read-only view of the selected image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub display_name: String,
    pub size_bytes: u64,
    pub media_type: Option<String>,
    pub preview: String,
}

impl From<&SelectedImage> for Selection {
    fn from(image: &SelectedImage) -> Self {
        Self {
            display_name: image.display_name().to_string(),
            size_bytes: image.size_bytes(),
            media_type: image.media_type().map(str::to_string),
            preview: image.preview().to_string(),
        }
    }
}

/// One upload form: a selection, a method, and the session it feeds.
///
/// All operations take `&self`, so a front-end can keep reacting to events
/// (reset, new selection) while a submission is awaiting the service.
///
/// ## Example
///
/// ```no_run
/// use std::sync::Arc;
/// use keypoint_core::{
///     ClientConfig, DetectionMethod, FeatureExtractor, FileSource, MemoryPreviewStore,
///     PickedFile, ServiceClient,
/// };
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ClientConfig::from_env()?;
/// let timeout = config.timeout;
/// let tool = FeatureExtractor::new(
///     Arc::new(ServiceClient::new(config)?),
///     Arc::new(MemoryPreviewStore::new()),
///     timeout,
/// );
///
/// let file = PickedFile::from_path(std::path::Path::new("scene.png"))?;
/// tool.select_file(FileSource::ManualPick(Some(file)))?;
/// tool.set_method(DetectionMethod::Akaze);
/// tool.submit().await;
///
/// if let Some(result) = tool.current_state().result() {
///     println!("{}", result.message);
/// }
/// # Ok(())
/// # }
/// ```
pub struct FeatureExtractor {
    input: Mutex<InputAcquisition>,
    session: SessionController,
}

impl FeatureExtractor {
    pub fn new(
        gateway: Arc<dyn ExtractionGateway>,
        previews: Arc<dyn PreviewStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            input: Mutex::new(InputAcquisition::new(previews)),
            session: SessionController::new(gateway, timeout),
        }
    }

    /// Validate and accept a file. A displayed result or failure from an
    /// earlier image is cleared; an in-flight submission is left alone.
    pub fn select_file(&self, source: FileSource) -> Result<Selection, ValidationError> {
        let selection = Selection::from(self.input().select_file(source)?);
        self.session.clear_outcome();
        Ok(selection)
    }

    pub fn set_method(&self, method: DetectionMethod) {
        self.input().set_method(method);
    }

    pub fn method(&self) -> DetectionMethod {
        self.input().method()
    }

    pub fn selection(&self) -> Option<Selection> {
        self.input().selected().map(Selection::from)
    }

    pub fn pending_error(&self) -> Option<ValidationError> {
        self.input().pending_error().cloned()
    }

    /// Submit the selected image with the active method.
    pub async fn submit(&self) -> SubmitOutcome {
        if self.session.is_submitting() {
            debug!("Submission already in flight, ignoring");
            return SubmitOutcome::AlreadySubmitting;
        }

        let request = {
            let input = self.input();
            input
                .selected()
                .map(|image| (ImageUpload::from(image), input.method()))
        };

        match request {
            Some((upload, method)) => self.session.submit(upload, method).await,
            None => {
                debug!("No image selected, nothing to submit");
                SubmitOutcome::NoImage
            }
        }
    }

    pub fn current_state(&self) -> SessionState {
        self.session.current_state()
    }

    /// Start over: no image, no preview, no pending error, session `Idle`.
    pub fn reset(&self) {
        self.input().reset();
        self.session.reset();
    }

    fn input(&self) -> MutexGuard<'_, InputAcquisition> {
        self.input.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
