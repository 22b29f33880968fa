use crate::error::{ReportError, Result};
use crate::types::PhotoRef;
use bytes::Bytes;
use futures::future::try_join_all;
use image::ImageFormat;
use log::debug;

const FALLBACK_MIME: &str = "image/jpeg";

/// A local photo read into memory, ready to go into a multipart part.
#[derive(Debug, Clone)]
pub struct LoadedPhoto {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Bytes,
}

/// Guesses the content type from the file's magic bytes. Cameras hand us
/// JPEGs, so that is what we claim when the format is unknown.
pub fn sniff_mime(data: &[u8]) -> &'static str {
    match image::guess_format(data) {
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Gif) => "image/gif",
        Ok(ImageFormat::WebP) => "image/webp",
        Ok(ImageFormat::Bmp) => "image/bmp",
        Ok(ImageFormat::Tiff) => "image/tiff",
        _ => FALLBACK_MIME,
    }
}

pub async fn load(photo: &PhotoRef) -> Result<LoadedPhoto> {
    let path = photo.path();
    let data = tokio::fs::read(&path)
        .await
        .map_err(|e| ReportError::PhotoUnreadable(photo.to_string(), e.to_string()))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("foto.jpg")
        .to_string();
    let mime = sniff_mime(&data);
    debug!("Loaded {} ({} bytes, {})", photo, data.len(), mime);
    Ok(LoadedPhoto {
        file_name,
        mime,
        bytes: Bytes::from(data),
    })
}

/// Loads every photo, keeping the input order.
pub async fn load_all(photos: &[PhotoRef]) -> Result<Vec<LoadedPhoto>> {
    try_join_all(photos.iter().map(load)).await
}
