use crate::error::{ReportError, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Runtime settings, read from the environment.
///
/// * `BACKEND_HOST` (required): base URL of the incidents backend; photo
///   paths returned by the backend are resolved against it too.
/// * `DETECTOR_HOST`: base URL of the plate detector, if it lives elsewhere.
/// * `SESSION_DB`: sqlite file holding the login session.
/// * `REQUEST_TIMEOUT_SECS`: overall timeout for each HTTP request. Unset
///   means the transport default.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend_host: Url,
    pub detector_host: Url,
    pub session_db: PathBuf,
    pub request_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Config> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = lookup("BACKEND_HOST")
            .ok_or_else(|| ReportError::Config("BACKEND_HOST environment variable unset".into()))?;
        let backend_host = parse_host("BACKEND_HOST", &backend)?;
        let detector_host = match lookup("DETECTOR_HOST") {
            Some(detector) => parse_host("DETECTOR_HOST", &detector)?,
            None => backend_host.clone(),
        };
        let session_db = lookup("SESSION_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("session.db"));
        let request_timeout = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(secs) => Some(Duration::from_secs(secs.trim().parse().map_err(|_| {
                ReportError::Config(format!("REQUEST_TIMEOUT_SECS is not a number: {}", secs))
            })?)),
            None => None,
        };
        Ok(Config {
            backend_host,
            detector_host,
            session_db,
            request_timeout,
        })
    }

    /// HTTP client shared by every backend call.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        builder
            .build()
            .map_err(|e| ReportError::Config(format!("Unable to build HTTP client: {}", e)))
    }
}

fn parse_host(name: &str, value: &str) -> Result<Url> {
    let url = Url::parse(value.trim())
        .map_err(|e| ReportError::Config(format!("{} is not a valid URL ({}): {}", name, value, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ReportError::Config(format!(
            "{} must be http or https, got {}",
            name, scheme
        ))),
    }
}

/// Appends `path` to `base`, keeping any path prefix `base` already has.
/// `Url::join` would replace the last segment when `base` has no trailing
/// slash.
pub fn endpoint(base: &Url, path: &str) -> Result<Url> {
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|e| ReportError::Config(format!("Invalid endpoint {}: {}", joined, e)))
}
