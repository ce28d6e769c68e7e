use crate::models::analysis_types::ResultsView;
use crate::models::upload_types::Preview;
use crate::services::surface::{MemorySurface, Surface, SurfaceSnapshot};
use tauri::{AppHandle, Emitter};
use tauri_plugin_dialog::{DialogExt, MessageDialogKind};

pub const PREVIEW_EVENT: &str = "upload://preview";
pub const LOADING_EVENT: &str = "upload://loading";
pub const SUBMIT_ENABLED_EVENT: &str = "upload://submit-enabled";
pub const RESULTS_EVENT: &str = "upload://results";

const ALERT_TITLE: &str = "Growmate";

/// Surface backed by the webview: every change is emitted to the page, alerts go
/// through the native message dialog.
pub struct WebviewSurface {
    app: AppHandle,
    // Alerts are not recorded here; only the hydration fields are read back.
    last: MemorySurface,
}

impl WebviewSurface {
    pub fn new(app: AppHandle) -> Self {
        Self {
            app,
            last: MemorySurface::new(),
        }
    }

    pub fn snapshot(&self) -> SurfaceSnapshot {
        self.last.snapshot()
    }

    fn emit<S: serde::Serialize + Clone>(&self, event: &str, payload: S) {
        if let Err(e) = self.app.emit(event, payload) {
            tracing::warn!(event, error = %e, "failed to emit surface event");
        }
    }
}

impl Surface for WebviewSurface {
    fn set_preview(&self, preview: Option<&Preview>) {
        self.last.set_preview(preview);
        self.emit(PREVIEW_EVENT, preview.cloned());
    }

    fn set_loading(&self, loading: bool) {
        self.last.set_loading(loading);
        self.emit(LOADING_EVENT, loading);
    }

    fn set_submit_enabled(&self, enabled: bool) {
        self.last.set_submit_enabled(enabled);
        self.emit(SUBMIT_ENABLED_EVENT, enabled);
    }

    fn show_results(&self, view: &ResultsView) {
        self.last.show_results(view);
        self.emit(RESULTS_EVENT, view.clone());
    }

    fn alert(&self, message: &str) {
        self.app
            .dialog()
            .message(message)
            .kind(MessageDialogKind::Error)
            .title(ALERT_TITLE)
            .show(|_| {});
    }
}
