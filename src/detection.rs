use crate::config::endpoint;
use crate::error::{ReportError, Result};
use crate::photo;
use crate::types::{DetectionResponse, PhotoRef};
use log::{debug, info, warn};
use reqwest::multipart::{Form, Part};
use url::Url;

/// Client for the remote plate detector. The recognition itself is a black
/// box; we only upload the photo and read back candidate plates.
#[derive(Debug, Clone)]
pub struct PlateDetectionClient {
    client: reqwest::Client,
    url: Url,
}

impl PlateDetectionClient {
    pub fn new(client: reqwest::Client, detector_host: &Url) -> Result<Self> {
        Ok(PlateDetectionClient {
            client,
            url: endpoint(detector_host, "detectar-placa")?,
        })
    }

    /// Uploads `photo` and returns the detected plates, best candidate first.
    /// An empty detection is `NoPlateDetected`, never an empty `Vec`.
    pub async fn detect(&self, photo: &PhotoRef) -> Result<Vec<String>> {
        let loaded = photo::load(photo).await?;
        let length = loaded.bytes.len() as u64;
        let part = Part::stream_with_length(loaded.bytes, length)
            .file_name("placa.jpg")
            .mime_str(loaded.mime)
            .map_err(|e| ReportError::DetectionTransport(e.to_string()))?;
        let form = Form::new().part("image", part);

        info!("Sending {} to plate detector at {}", photo, self.url);
        let response = self
            .client
            .post(self.url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| ReportError::DetectionTransport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            warn!("Plate detector returned {}", status);
            return Err(ReportError::DetectionTransport(format!(
                "detector returned {}",
                status
            )));
        }
        let body = response
            .json::<DetectionResponse>()
            .await
            .map_err(|e| ReportError::DetectionTransport(format!("malformed response: {}", e)))?;
        debug!("Detector response: {:?}", body);
        interpret(body)
    }
}

/// The detector reports "nothing found" either as a failed detection with a
/// message or as a successful one with no plates; both mean the same thing.
pub fn interpret(response: DetectionResponse) -> Result<Vec<String>> {
    let plates: Vec<String> = response
        .placas
        .into_iter()
        .map(|plate| plate.trim().to_string())
        .filter(|plate| !plate.is_empty())
        .collect();
    if !response.success || plates.is_empty() {
        info!(
            "No plate detected{}",
            response
                .message
                .map(|m| format!(": {}", m))
                .unwrap_or_default()
        );
        return Err(ReportError::NoPlateDetected);
    }
    info!("Detected plates {:?}", plates);
    Ok(plates)
}
