//! Upload-and-preview client for a plant disease analysis service.
//!
//! The controller, transport and preview decoding live in [`services`] and build
//! without a webview toolkit; the `desktop` feature wraps them in a Tauri shell.

#[cfg(feature = "desktop")]
mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use crate::config::ClientConfig;
    use crate::services::analysis_client::HttpAnalysisClient;
    use crate::services::controller::UploadController;
    use crate::services::webview_surface::WebviewSurface;
    use std::sync::Arc;
    use tauri::Manager;

    let _ = tracing_subscriber::fmt().try_init();

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_window_state::Builder::default().build())
        .setup(|app| {
            let app_data_dir = app.path().app_data_dir()?;
            let config = ClientConfig::load(&app_data_dir)?;
            tracing::info!(server = %config.server_url, path = %config.analyze_path, "starting upload client");

            let transport = Arc::new(HttpAnalysisClient::new(&config)?);
            let surface = Arc::new(WebviewSurface::new(app.handle().clone()));

            let controller = UploadController::new(surface.clone(), transport, config.max_upload_bytes);
            controller.initialize();

            app.manage(surface);
            app.manage(controller);
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::upload::pick_image,
            commands::upload::select_image,
            commands::upload::analyze_image,
            commands::upload::get_upload_status,
        ])
        .run(tauri::generate_context!())
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "error while running tauri application");
            std::process::exit(1);
        });
}
