use crate::error::AppError;
use crate::models::upload_types::{SelectOutcome, SubmitOutcome};
use crate::services::controller::UploadController;
use crate::services::surface::SurfaceSnapshot;
use crate::services::webview_surface::WebviewSurface;
use std::path::PathBuf;
use std::sync::Arc;
use tauri::{AppHandle, State};
use tauri_plugin_dialog::DialogExt;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "tif"];

#[tauri::command]
pub async fn pick_image(
    app: AppHandle,
    controller: State<'_, UploadController>,
) -> Result<SelectOutcome, AppError> {
    let (tx, rx) = tokio::sync::oneshot::channel();
    app.dialog()
        .file()
        .add_filter("Images", IMAGE_EXTENSIONS)
        .pick_file(move |picked| {
            let _ = tx.send(picked);
        });

    let picked = rx.await.map_err(|e| AppError::from(format!("File dialog closed unexpectedly: {}", e)))?;
    let path = match picked {
        Some(p) => Some(p.into_path().map_err(|e| AppError::from(e.to_string()))?),
        None => None,
    };

    Ok(controller.select_path(path.as_deref()).await)
}

#[tauri::command]
pub async fn select_image(
    controller: State<'_, UploadController>,
    path: Option<String>,
) -> Result<SelectOutcome, AppError> {
    let path = path.filter(|p| !p.is_empty()).map(PathBuf::from);
    Ok(controller.select_path(path.as_deref()).await)
}

#[tauri::command]
pub async fn analyze_image(controller: State<'_, UploadController>) -> Result<SubmitOutcome, AppError> {
    Ok(controller.submit().await)
}

#[tauri::command]
pub fn get_upload_status(surface: State<'_, Arc<WebviewSurface>>) -> SurfaceSnapshot {
    surface.snapshot()
}
