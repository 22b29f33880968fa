use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A photo stored on the device, as returned by the camera or photo picker.
/// May be a plain path or a `file://` URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoRef(String);

impl PhotoRef {
    pub fn new(uri: impl Into<String>) -> Self {
        PhotoRef(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filesystem location of the photo.
    pub fn path(&self) -> PathBuf {
        PathBuf::from(self.0.strip_prefix("file://").unwrap_or(&self.0))
    }
}

impl fmt::Display for PhotoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PhotoRef {
    fn from(uri: &str) -> Self {
        PhotoRef::new(uri)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Who is filing the report. Every field is optional because the session
/// may be missing or incomplete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReporterIdentity {
    pub id: Option<i64>,
    pub email: Option<String>,
    pub given_name: Option<String>,
    pub surname: Option<String>,
}

impl ReporterIdentity {
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.email.is_none()
            && self.given_name.is_none()
            && self.surname.is_none()
    }
}

/// Body returned by `/detectar-placa`.
#[derive(Debug, Deserialize)]
pub struct DetectionResponse {
    pub success: bool,
    #[serde(default)]
    pub placas: Vec<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body returned by `/create-incidence`.
#[derive(Debug, Deserialize)]
pub struct SubmissionResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}
