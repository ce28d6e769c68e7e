pub mod analysis_client;
pub mod controller;
pub mod preview_service;
pub mod surface;
#[cfg(feature = "desktop")]
pub mod webview_surface;
