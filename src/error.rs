use std::fmt;

/// Which device permission a step needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Camera,
    Location,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permission::Camera => write!(f, "Camera"),
            Permission::Location => write!(f, "Location"),
        }
    }
}

/// Everything that can go wrong between pressing the shutter and getting a
/// confirmation back from the backend. All of these are recoverable: the
/// caller shows the message and lets the user decide what to do next.
#[derive(Debug, Clone, PartialEq, Fail)]
pub enum ReportError {
    #[fail(display = "{} permission denied", _0)]
    PermissionDenied(Permission),
    #[fail(display = "Camera unavailable: {}", _0)]
    CameraUnavailable(String),
    #[fail(display = "Location unavailable: {}", _0)]
    LocationUnavailable(String),
    #[fail(display = "No plate was detected")]
    NoPlateDetected,
    #[fail(display = "Error sending the photo: {}", _0)]
    DetectionTransport(String),
    #[fail(display = "Invalid capture handoff: {}", _0)]
    Handoff(String),
    #[fail(display = "Plate must not be empty")]
    EmptyPlate,
    #[fail(display = "Unable to read photo {}: {}", _0, _1)]
    PhotoUnreadable(String, String),
    #[fail(display = "Incident is already being submitted")]
    SubmissionInFlight,
    #[fail(display = "Error sending the incident: {}", _0)]
    SubmissionTransport(String),
    #[fail(display = "Incident rejected: {}", _0)]
    SubmissionRejected(String),
    #[fail(display = "Error fetching incidents: {}", _0)]
    FeedTransport(String),
    #[fail(display = "Session store error: {}", _0)]
    Session(String),
    #[fail(display = "Configuration error: {}", _0)]
    Config(String),
}

impl ReportError {
    /// Whether repeating the same user action could succeed without changing
    /// anything else first.
    pub fn is_retryable(&self) -> bool {
        match self {
            ReportError::CameraUnavailable(_)
            | ReportError::LocationUnavailable(_)
            | ReportError::NoPlateDetected
            | ReportError::DetectionTransport(_)
            | ReportError::SubmissionInFlight
            | ReportError::SubmissionTransport(_)
            | ReportError::SubmissionRejected(_)
            | ReportError::FeedTransport(_) => true,
            ReportError::PermissionDenied(_)
            | ReportError::Handoff(_)
            | ReportError::EmptyPlate
            | ReportError::PhotoUnreadable(..)
            | ReportError::Session(_)
            | ReportError::Config(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(
            ReportError::PermissionDenied(Permission::Location).to_string(),
            "Location permission denied"
        );
        assert_eq!(
            ReportError::PhotoUnreadable("a.jpg".into(), "missing".into()).to_string(),
            "Unable to read photo a.jpg: missing"
        );
    }

    #[test]
    fn transport_failures_can_be_retried() {
        assert!(ReportError::DetectionTransport("timeout".into()).is_retryable());
        assert!(ReportError::SubmissionRejected("nope".into()).is_retryable());
        assert!(!ReportError::PermissionDenied(Permission::Camera).is_retryable());
        assert!(!ReportError::EmptyPlate.is_retryable());
    }
}
