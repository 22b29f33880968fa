use crate::detection::PlateDetectionClient;
use crate::draft::DraftHandoff;
use crate::error::{Permission, ReportError, Result};
use crate::geo::{self, Locator, PermissionStatus};
use crate::types::PhotoRef;
use chrono::{DateTime, FixedOffset, Local};
use log::{info, warn};
use std::path::PathBuf;
use uuid::Uuid;

/// The device camera.
#[allow(async_fn_in_trait)]
pub trait Camera {
    async fn request_permission(&mut self) -> PermissionStatus;

    async fn take_picture(&mut self) -> std::result::Result<PhotoRef, failure::Error>;
}

/// A "camera" that hands back a photo already on disk.
#[derive(Debug, Clone)]
pub struct FileCamera {
    path: PathBuf,
}

impl FileCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileCamera { path: path.into() }
    }
}

impl Camera for FileCamera {
    async fn request_permission(&mut self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn take_picture(&mut self) -> std::result::Result<PhotoRef, failure::Error> {
        let metadata = tokio::fs::metadata(&self.path).await?;
        if !metadata.is_file() {
            return Err(format_err!("{:?} is not a file", self.path));
        }
        let uri = self
            .path
            .to_str()
            .ok_or_else(|| format_err!("{:?} is not valid UTF-8", self.path))?;
        Ok(PhotoRef::new(uri))
    }
}

/// Drives one capture: photo, position, detection. A failed capture leaves
/// the pipeline as it was, ready for another attempt; nothing here is torn
/// down on error.
pub struct CapturePipeline<C, L> {
    camera: C,
    locator: L,
    detector: PlateDetectionClient,
}

impl<C: Camera, L: Locator> CapturePipeline<C, L> {
    pub fn new(camera: C, locator: L, detector: PlateDetectionClient) -> Self {
        CapturePipeline {
            camera,
            locator,
            detector,
        }
    }

    pub async fn capture(&mut self) -> Result<DraftHandoff> {
        if self.camera.request_permission().await != PermissionStatus::Granted {
            warn!("Camera permission denied");
            return Err(ReportError::PermissionDenied(Permission::Camera));
        }
        let photo = self
            .camera
            .take_picture()
            .await
            .map_err(|e| ReportError::CameraUnavailable(e.to_string()))?;
        info!("Captured {}", photo);

        let position = geo::acquire_position(&mut self.locator).await?;
        let captured_at: DateTime<FixedOffset> = Local::now().into();
        let placas = self.detector.detect(&photo).await?;

        Ok(DraftHandoff {
            id: Uuid::new_v4(),
            placas,
            lat: position.latitude,
            lng: position.longitude,
            fecha: captured_at,
            foto: photo,
        })
    }
}
