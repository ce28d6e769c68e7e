use crate::models::analysis_types::ResultsView;
use crate::models::upload_types::Preview;
use serde::Serialize;
use std::sync::{Mutex, PoisonError};

/// Rendering capability the controller drives. The host page (or a test) decides
/// how each call shows up on screen. Calls may arrive while the controller holds
/// its state lock, so implementations must not call back into it synchronously.
pub trait Surface: Send + Sync {
    /// `None` clears the preview region.
    fn set_preview(&self, preview: Option<&Preview>);
    fn set_loading(&self, loading: bool);
    fn set_submit_enabled(&self, enabled: bool);
    /// Makes the results region visible and replaces its contents.
    fn show_results(&self, view: &ResultsView);
    /// Blocking, user-facing notice.
    fn alert(&self, message: &str);
}

/// Last state pushed to a surface, so a freshly loaded page can hydrate itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SurfaceSnapshot {
    pub preview: Option<Preview>,
    pub loading: bool,
    pub submit_enabled: bool,
    pub results_visible: bool,
    pub results: Option<ResultsView>,
}

/// In-memory surface that records every call.
#[derive(Debug, Default)]
pub struct MemorySurface {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    snapshot: SurfaceSnapshot,
    alerts: Vec<String>,
    loading_shown: usize,
    results_rendered: usize,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> SurfaceSnapshot {
        self.lock().snapshot.clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.lock().alerts.clone()
    }

    /// How many times the loading indicator went from hidden to visible.
    pub fn loading_shown(&self) -> usize {
        self.lock().loading_shown
    }

    pub fn results_rendered(&self) -> usize {
        self.lock().results_rendered
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Surface for MemorySurface {
    fn set_preview(&self, preview: Option<&Preview>) {
        self.lock().snapshot.preview = preview.cloned();
    }

    fn set_loading(&self, loading: bool) {
        let mut state = self.lock();
        if loading && !state.snapshot.loading {
            state.loading_shown += 1;
        }
        state.snapshot.loading = loading;
    }

    fn set_submit_enabled(&self, enabled: bool) {
        self.lock().snapshot.submit_enabled = enabled;
    }

    fn show_results(&self, view: &ResultsView) {
        let mut state = self.lock();
        state.snapshot.results_visible = true;
        state.snapshot.results = Some(view.clone());
        state.results_rendered += 1;
    }

    fn alert(&self, message: &str) {
        self.lock().alerts.push(message.to_string());
    }
}
