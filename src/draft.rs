use crate::error::{ReportError, Result};
use crate::evidence::EvidenceCollector;
use crate::types::{Coordinates, PhotoRef, ReporterIdentity};
use chrono::{DateTime, FixedOffset};
use log::info;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the capture time is shown on the form and sent to the backend.
pub const CAPTURED_AT_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// What the capture stage hands to the form stage once a plate is found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftHandoff {
    pub id: Uuid,
    pub placas: Vec<String>,
    pub lat: f64,
    pub lng: f64,
    pub fecha: DateTime<FixedOffset>,
    pub foto: PhotoRef,
}

impl DraftHandoff {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ReportError::Handoff(e.to_string()))
    }

    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| ReportError::Handoff(e.to_string()))
    }
}

/// The incident being filled in on the form.
///
/// Coordinates, capture time and the principal photo are fixed when the
/// draft is created. Only the plate, the description, the reporter and the
/// evidence list change afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentDraft {
    id: Uuid,
    candidate_plates: Vec<String>,
    selected_plate: String,
    coordinates: Coordinates,
    captured_at: String,
    description: String,
    principal_photo: PhotoRef,
    reporter: Option<ReporterIdentity>,
    evidence: EvidenceCollector,
}

impl IncidentDraft {
    pub fn from_handoff(handoff: DraftHandoff) -> Result<Self> {
        let selected_plate = handoff
            .placas
            .first()
            .cloned()
            .ok_or(ReportError::NoPlateDetected)?;
        let draft = IncidentDraft {
            id: handoff.id,
            candidate_plates: handoff.placas,
            selected_plate,
            coordinates: Coordinates {
                latitude: handoff.lat,
                longitude: handoff.lng,
            },
            captured_at: handoff.fecha.format(CAPTURED_AT_FORMAT).to_string(),
            description: String::new(),
            principal_photo: handoff.foto,
            reporter: None,
            evidence: EvidenceCollector::new(),
        };
        info!(
            "Created draft {} for plate {} at {}",
            draft.id, draft.selected_plate, draft.captured_at
        );
        Ok(draft)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn candidate_plates(&self) -> &[String] {
        &self.candidate_plates
    }

    pub fn selected_plate(&self) -> &str {
        &self.selected_plate
    }

    pub fn set_selected_plate(&mut self, plate: impl Into<String>) {
        self.selected_plate = plate.into();
    }

    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    pub fn captured_at(&self) -> &str {
        &self.captured_at
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn principal_photo(&self) -> &PhotoRef {
        &self.principal_photo
    }

    pub fn reporter(&self) -> Option<&ReporterIdentity> {
        self.reporter.as_ref()
    }

    /// Fills in the reporter once the session has been read. The draft is
    /// usable before this happens.
    pub fn attach_reporter(&mut self, identity: ReporterIdentity) {
        self.reporter = if identity.is_empty() {
            None
        } else {
            Some(identity)
        };
    }

    pub fn evidence(&self) -> &EvidenceCollector {
        &self.evidence
    }

    pub fn evidence_mut(&mut self) -> &mut EvidenceCollector {
        &mut self.evidence
    }

    /// The plate as it will be submitted.
    pub fn plate_for_submission(&self) -> Result<&str> {
        let plate = self.selected_plate.trim();
        if plate.is_empty() {
            Err(ReportError::EmptyPlate)
        } else {
            Ok(plate)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn handoff(placas: &[&str]) -> DraftHandoff {
        DraftHandoff {
            id: Uuid::new_v4(),
            placas: placas.iter().map(|p| p.to_string()).collect(),
            lat: 10.0,
            lng: -20.0,
            fecha: FixedOffset::west_opt(6 * 3600)
                .unwrap()
                .with_ymd_and_hms(2024, 3, 7, 9, 5, 2)
                .unwrap(),
            foto: PhotoRef::new("file:///photos/plate.jpg"),
        }
    }

    #[test]
    fn first_candidate_is_selected() {
        let draft = IncidentDraft::from_handoff(handoff(&["ABC123", "ABC128"])).unwrap();
        assert_eq!(draft.selected_plate(), "ABC123");
        assert_eq!(draft.candidate_plates(), &["ABC123", "ABC128"]);
        assert_eq!(draft.coordinates().latitude, 10.0);
        assert_eq!(draft.coordinates().longitude, -20.0);
        assert_eq!(draft.principal_photo().as_str(), "file:///photos/plate.jpg");
        assert!(draft.evidence().is_empty());
        assert!(draft.description().is_empty());
        assert!(draft.reporter().is_none());
    }

    #[test]
    fn capture_time_is_formatted_in_its_own_offset() {
        let draft = IncidentDraft::from_handoff(handoff(&["ABC123"])).unwrap();
        assert_eq!(draft.captured_at(), "07/03/2024 09:05:02");
    }

    #[test]
    fn empty_plate_list_creates_no_draft() {
        assert_eq!(
            IncidentDraft::from_handoff(handoff(&[])),
            Err(ReportError::NoPlateDetected)
        );
    }

    #[test]
    fn handoff_survives_the_wire() {
        let original = handoff(&["ABC123"]);
        let json = original.to_json().unwrap();
        assert!(json.contains("\"placas\":[\"ABC123\"]"));
        assert_eq!(DraftHandoff::from_json(&json).unwrap(), original);
        assert!(DraftHandoff::from_json("{\"placas\": []}").is_err());
    }

    #[test]
    fn blank_plate_cannot_be_submitted() {
        let mut draft = IncidentDraft::from_handoff(handoff(&["ABC123"])).unwrap();
        draft.set_selected_plate("  abc 123 ");
        assert_eq!(draft.plate_for_submission(), Ok("abc 123"));
        draft.set_selected_plate("   ");
        assert_eq!(draft.plate_for_submission(), Err(ReportError::EmptyPlate));
    }

    #[test]
    fn empty_identity_is_not_attached() {
        let mut draft = IncidentDraft::from_handoff(handoff(&["ABC123"])).unwrap();
        draft.attach_reporter(ReporterIdentity::default());
        assert!(draft.reporter().is_none());
        draft.attach_reporter(ReporterIdentity {
            email: Some("ana@example.com".into()),
            ..ReporterIdentity::default()
        });
        assert_eq!(
            draft.reporter().and_then(|r| r.email.as_deref()),
            Some("ana@example.com")
        );
    }
}
