use crate::config::endpoint;
use crate::draft::IncidentDraft;
use crate::error::{ReportError, Result};
use crate::photo::{self, LoadedPhoto};
use crate::types::SubmissionResponse;
use log::{debug, error, info, warn};
use reqwest::multipart::{Form, Part};
use std::collections::HashSet;
use std::sync::Mutex;
use url::Url;
use uuid::Uuid;

const DEFAULT_SUCCESS_MESSAGE: &str = "Incident created";
const DEFAULT_REJECTION_MESSAGE: &str = "Error sending the incident";

/// Posts finished drafts to the backend.
///
/// The service never mutates a draft, so whatever happens here the user can
/// retry with the same plate, description and evidence.
pub struct SubmissionService {
    client: reqwest::Client,
    url: Url,
    token: Option<String>,
    in_flight: Mutex<HashSet<Uuid>>,
}

/// Marks a draft as being submitted until dropped.
struct InFlight<'a> {
    drafts: &'a Mutex<HashSet<Uuid>>,
    id: Uuid,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut drafts = self.drafts.lock().unwrap_or_else(|e| e.into_inner());
        drafts.remove(&self.id);
    }
}

impl SubmissionService {
    pub fn new(client: reqwest::Client, backend_host: &Url) -> Result<Self> {
        Ok(SubmissionService {
            client,
            url: endpoint(backend_host, "create-incidence")?,
            token: None,
            in_flight: Mutex::new(HashSet::new()),
        })
    }

    /// Sends `Authorization: Bearer <token>` with every submission.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Whether a submission for this draft is running. The submit button
    /// should be disabled while this is true.
    pub fn is_in_flight(&self, draft: &IncidentDraft) -> bool {
        let drafts = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        drafts.contains(&draft.id())
    }

    fn begin(&self, id: Uuid) -> Result<InFlight<'_>> {
        let mut drafts = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !drafts.insert(id) {
            warn!("Draft {} is already being submitted", id);
            return Err(ReportError::SubmissionInFlight);
        }
        Ok(InFlight {
            drafts: &self.in_flight,
            id,
        })
    }

    /// Submits the draft and returns the backend's confirmation message.
    /// The caller discards the draft on `Ok` and keeps it on `Err`.
    pub async fn submit(&self, draft: &IncidentDraft) -> Result<String> {
        let plate = draft.plate_for_submission()?;
        let _guard = self.begin(draft.id())?;

        let principal = photo::load(draft.principal_photo()).await?;
        let evidence = photo::load_all(draft.evidence().as_slice()).await?;
        let form = build_form(draft, plate, principal, evidence)
            .map_err(|e| ReportError::SubmissionTransport(e.to_string()))?;

        info!(
            "Submitting draft {} for plate {} with {} evidence photo(s)",
            draft.id(),
            plate,
            draft.evidence().len()
        );
        let mut request = self.client.post(self.url.clone()).multipart(form);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(|e| {
            error!("Error posting draft {}: {}", draft.id(), e);
            ReportError::SubmissionTransport(e.to_string())
        })?;
        let status = response.status();
        if !status.is_success() {
            warn!("Backend returned {} for draft {}", status, draft.id());
            return Err(ReportError::SubmissionTransport(format!(
                "backend returned {}",
                status
            )));
        }
        let body = response
            .json::<SubmissionResponse>()
            .await
            .map_err(|e| ReportError::SubmissionTransport(format!("malformed response: {}", e)))?;
        debug!("Submission response: {:?}", body);
        interpret(body)
    }
}

fn photo_part(photo: LoadedPhoto) -> reqwest::Result<Part> {
    let length = photo.bytes.len() as u64;
    Part::stream_with_length(photo.bytes, length)
        .file_name(photo.file_name)
        .mime_str(photo.mime)
}

/// Lays out the multipart body: scalar fields as text parts, the principal
/// photo as `imgPrincipal` and one `evidencias` part per evidence photo.
fn build_form(
    draft: &IncidentDraft,
    plate: &str,
    principal: LoadedPhoto,
    evidence: Vec<LoadedPhoto>,
) -> reqwest::Result<Form> {
    let coordinates = draft.coordinates();
    let mut form = Form::new()
        .text("placas", plate.to_string())
        .text("descripcion", draft.description().to_string())
        .text("lat", coordinates.latitude.to_string())
        .text("lng", coordinates.longitude.to_string())
        .text("fecha", draft.captured_at().to_string());

    if let Some(reporter) = draft.reporter() {
        if let Some(id) = reporter.id {
            form = form.text("id_usuario", id.to_string());
        }
        if let Some(email) = &reporter.email {
            form = form.text("email", email.clone());
        }
        if let Some(given_name) = &reporter.given_name {
            form = form.text("nombre", given_name.clone());
        }
        if let Some(surname) = &reporter.surname {
            form = form.text("apellidos", surname.clone());
        }
    }

    form = form.part("imgPrincipal", photo_part(principal)?);
    for photo in evidence {
        form = form.part("evidencias", photo_part(photo)?);
    }
    Ok(form)
}

pub fn interpret(response: SubmissionResponse) -> Result<String> {
    if response.success {
        let message = response
            .message
            .unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string());
        info!("Incident accepted: {}", message);
        Ok(message)
    } else {
        let message = response
            .message
            .unwrap_or_else(|| DEFAULT_REJECTION_MESSAGE.to_string());
        warn!("Incident rejected: {}", message);
        Err(ReportError::SubmissionRejected(message))
    }
}
