use crate::error::{AppError, ErrorKind};
use crate::models::upload_types::{Preview, SelectedFile};
use base64::Engine;
use image::ImageReader;
use std::io::Cursor;
use std::path::Path;

pub const PREVIEW_ALT: &str = "Plant Image";

/// Read a picked file from disk and validate it as an uploadable image.
pub async fn read_selected_file(path: &Path, max_bytes: u64) -> Result<SelectedFile, AppError> {
    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        AppError::new(
            ErrorKind::Io,
            format!("Failed to read {}: {}", path.display(), e),
        )
    })?;
    check_size(metadata.len(), max_bytes)?;

    let bytes = tokio::fs::read(path).await.map_err(|e| {
        AppError::new(
            ErrorKind::Io,
            format!("Failed to read {}: {}", path.display(), e),
        )
    })?;

    let name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    selected_file_from_bytes(name, bytes, max_bytes)
}

/// Sniff the image format from the content, not the extension.
pub fn selected_file_from_bytes(
    name: String,
    bytes: Vec<u8>,
    max_bytes: u64,
) -> Result<SelectedFile, AppError> {
    check_size(bytes.len() as u64, max_bytes)?;

    let format = image::guess_format(&bytes).map_err(|_| {
        AppError::new(
            ErrorKind::InvalidImage,
            format!("{} is not a recognised image", name),
        )
    })?;

    Ok(SelectedFile {
        name,
        mime: format.to_mime_type().to_string(),
        bytes,
    })
}

/// Decode the header for dimensions and encode the file as a base64 data URL.
pub fn build_preview(file: &SelectedFile) -> Result<Preview, AppError> {
    let (width, height) = ImageReader::new(Cursor::new(&file.bytes))
        .with_guessed_format()?
        .into_dimensions()
        .map_err(|e| {
            AppError::new(
                ErrorKind::InvalidImage,
                format!("Failed to decode {}: {}", file.name, e),
            )
        })?;

    Ok(Preview {
        data_url: data_url(&file.mime, &file.bytes),
        alt: PREVIEW_ALT.to_string(),
        width,
        height,
    })
}

pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{}", mime, b64)
}

fn check_size(len: u64, max_bytes: u64) -> Result<(), AppError> {
    if len == 0 {
        return Err(AppError::new(ErrorKind::InvalidImage, "Selected file is empty"));
    }
    if len > max_bytes {
        return Err(AppError::new(
            ErrorKind::TooLarge,
            format!("Selected file is {} bytes, the limit is {} bytes", len, max_bytes),
        ));
    }
    Ok(())
}
