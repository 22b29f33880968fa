//! Client core for reporting vehicle incidents: photograph a plate, let the
//! remote detector read it, fill in the incident and submit it with evidence.

#[macro_use]
extern crate failure;

pub mod capture;
pub mod config;
pub mod detection;
pub mod draft;
pub mod error;
pub mod evidence;
pub mod feed;
pub mod geo;
pub mod normalize;
pub mod photo;
pub mod session;
pub mod submission;
pub mod types;

pub use capture::{Camera, CapturePipeline, FileCamera};
pub use config::Config;
pub use detection::PlateDetectionClient;
pub use draft::{DraftHandoff, IncidentDraft};
pub use error::{Permission, ReportError, Result};
pub use evidence::EvidenceCollector;
pub use feed::{IncidentFeed, IncidentView};
pub use geo::{FixedLocator, Locator, PermissionStatus};
pub use normalize::{normalize_list, normalize_single, ImageHost};
pub use session::{SessionStore, SessionUser};
pub use submission::SubmissionService;
pub use types::{Coordinates, PhotoRef, ReporterIdentity};
