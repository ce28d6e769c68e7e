use crate::error::AppError;
use crate::models::analysis_types::ResultsView;
use crate::models::upload_types::{
    IgnoreReason, Preview, SelectOutcome, SelectedFile, SubmitOutcome, UploadState,
};
use crate::services::analysis_client::AnalysisTransport;
use crate::services::preview_service;
use crate::services::surface::Surface;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub const ANALYSIS_FAILED_MESSAGE: &str = "Error analyzing the image. Please try again.";

/// Drives the upload form: file selection, preview, submission and results.
///
/// The state mutex is never held across the file read or the network request. It is
/// held while a finished request restores the surface, so surface calls must not
/// re-enter the controller on the same thread.
pub struct UploadController {
    surface: Arc<dyn Surface>,
    transport: Arc<dyn AnalysisTransport>,
    max_upload_bytes: u64,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    state: UploadState,
    file: Option<SelectedFile>,
    // Bumped on every selection so a slow read cannot overwrite a newer one.
    selection_seq: u64,
}

impl UploadController {
    pub fn new(
        surface: Arc<dyn Surface>,
        transport: Arc<dyn AnalysisTransport>,
        max_upload_bytes: u64,
    ) -> Self {
        Self {
            surface,
            transport,
            max_upload_bytes,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Put the surface into its page-ready state.
    pub fn initialize(&self) {
        self.surface.set_loading(false);
        self.surface.set_submit_enabled(false);
    }

    pub fn state(&self) -> UploadState {
        self.lock().state
    }

    pub fn selected_file_name(&self) -> Option<String> {
        self.lock().file.as_ref().map(|f| f.name.clone())
    }

    /// Handle a change of the file input. `None` means nothing was picked.
    pub async fn select_path(&self, path: Option<&Path>) -> SelectOutcome {
        let Some(path) = path else {
            tracing::debug!("file selection without a file, ignoring");
            return SelectOutcome::NoFile;
        };

        let seq = self.begin_selection();
        let loaded = preview_service::read_selected_file(path, self.max_upload_bytes).await;
        self.finish_selection(seq, loaded)
    }

    /// Same as [`select_path`](Self::select_path) for content already in memory.
    pub fn select_bytes(&self, name: String, bytes: Vec<u8>) -> SelectOutcome {
        let seq = self.begin_selection();
        let loaded = preview_service::selected_file_from_bytes(name, bytes, self.max_upload_bytes);
        self.finish_selection(seq, loaded)
    }

    fn begin_selection(&self) -> u64 {
        let mut inner = self.lock();
        inner.selection_seq += 1;
        inner.selection_seq
    }

    fn finish_selection(&self, seq: u64, loaded: Result<SelectedFile, AppError>) -> SelectOutcome {
        let prepared = loaded.and_then(|file| {
            let preview = preview_service::build_preview(&file)?;
            Ok((file, preview))
        });

        let mut inner = self.lock();
        if inner.selection_seq != seq {
            tracing::debug!(seq, latest = inner.selection_seq, "dropping superseded file selection");
            return SelectOutcome::Superseded;
        }
        let submitting = inner.state == UploadState::Submitting;

        match prepared {
            Ok((file, preview)) => {
                tracing::info!(file = %file.name, mime = %file.mime, size = file.bytes.len(), "image selected");
                inner.file = Some(file);
                if !submitting {
                    inner.state = UploadState::FileSelected;
                }
                drop(inner);
                self.show_preview(&preview, !submitting);
                SelectOutcome::Previewed
            }
            Err(e) => {
                tracing::warn!(error = %e, "rejected file selection");
                inner.file = None;
                if !submitting {
                    inner.state = UploadState::Idle;
                }
                drop(inner);
                self.surface.set_preview(None);
                if !submitting {
                    self.surface.set_submit_enabled(false);
                }
                self.surface
                    .alert(&format!("Could not use the selected image: {}", e.message));
                SelectOutcome::Rejected
            }
        }
    }

    fn show_preview(&self, preview: &Preview, enable_submit: bool) {
        self.surface.set_preview(Some(preview));
        if enable_submit {
            self.surface.set_submit_enabled(true);
        }
    }

    /// Handle a submit of the upload form.
    pub async fn submit(&self) -> SubmitOutcome {
        let file = {
            let mut inner = self.lock();
            if inner.state == UploadState::Submitting {
                tracing::debug!("submission already in flight, ignoring");
                return SubmitOutcome::Ignored {
                    reason: IgnoreReason::AlreadySubmitting,
                };
            }
            let Some(file) = inner.file.clone() else {
                tracing::debug!("submit without a selected file, ignoring");
                return SubmitOutcome::Ignored {
                    reason: IgnoreReason::NoFileSelected,
                };
            };
            inner.state = UploadState::Submitting;
            file
        };

        self.surface.set_loading(true);
        self.surface.set_submit_enabled(false);

        let result = self.transport.analyze(&file).await;

        // Held until the surface is restored so no second request can start while
        // this one still shows as in flight.
        let mut inner = self.lock();

        self.surface.set_loading(false);
        // A rejected selection during the request leaves nothing to resubmit.
        self.surface.set_submit_enabled(inner.file.is_some());

        let outcome = match result {
            Ok(analysis) => {
                let view = ResultsView::from(&analysis);
                tracing::info!(file = %file.name, entries = view.entries.len(), "analysis complete");
                self.surface.show_results(&view);
                inner.state = UploadState::Success;
                SubmitOutcome::Rendered {
                    entries: view.entries.len(),
                }
            }
            Err(e) => {
                tracing::error!(file = %file.name, kind = ?e.kind, error = %e, "analysis failed");
                self.surface.alert(ANALYSIS_FAILED_MESSAGE);
                inner.state = UploadState::Error;
                SubmitOutcome::Failed
            }
        };
        if inner.file.is_none() {
            inner.state = UploadState::Idle;
        }
        outcome
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::analysis_types::AnalysisResult;
    use crate::services::surface::MemorySurface;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;

    struct EmptyAnalysis;

    impl AnalysisTransport for EmptyAnalysis {
        fn analyze<'a>(&'a self, _file: &'a SelectedFile) -> BoxFuture<'a, Result<AnalysisResult, AppError>> {
            async { Ok(AnalysisResult { diseases: Vec::new() }) }.boxed()
        }
    }

    fn png_file(name: &str, width: u32) -> SelectedFile {
        let img = RgbImage::from_pixel(width, 2, image::Rgb([20, 110, 40]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        SelectedFile {
            name: name.to_string(),
            mime: "image/png".to_string(),
            bytes: buf.into_inner(),
        }
    }

    fn controller() -> (UploadController, Arc<MemorySurface>) {
        let surface = Arc::new(MemorySurface::new());
        let controller = UploadController::new(surface.clone(), Arc::new(EmptyAnalysis), 1 << 20);
        controller.initialize();
        (controller, surface)
    }

    #[test]
    fn slow_earlier_read_does_not_replace_newer_selection() {
        let (controller, surface) = controller();

        let older = controller.begin_selection();
        let newer = controller.begin_selection();
        assert_eq!(
            controller.finish_selection(newer, Ok(png_file("newer.png", 5))),
            SelectOutcome::Previewed
        );
        let kept = surface.snapshot();

        assert_eq!(
            controller.finish_selection(older, Ok(png_file("older.png", 3))),
            SelectOutcome::Superseded
        );

        assert_eq!(surface.snapshot(), kept);
        assert_eq!(kept.preview.as_ref().map(|p| p.width), Some(5));
        assert_eq!(controller.selected_file_name().as_deref(), Some("newer.png"));
        assert_eq!(controller.state(), UploadState::FileSelected);
    }

    #[test]
    fn superseded_failure_raises_no_alert() {
        let (controller, surface) = controller();

        let older = controller.begin_selection();
        let newer = controller.begin_selection();
        controller.finish_selection(newer, Ok(png_file("newer.png", 4)));

        let outcome = controller.finish_selection(older, Err(AppError::new(crate::error::ErrorKind::Io, "gone")));

        assert_eq!(outcome, SelectOutcome::Superseded);
        assert!(surface.alerts().is_empty());
        assert!(surface.snapshot().submit_enabled);
    }
}
