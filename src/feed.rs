use crate::config::endpoint;
use crate::error::{ReportError, Result};
use crate::normalize::ImageHost;
use log::{debug, info, warn};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use url::Url;

/// One row of `/obtener-incidencias`, as the backend sends it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IncidentRecord {
    pub id_incidencia: i64,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub fecha: Option<String>,
    #[serde(default)]
    pub placa_vehiculo: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitud: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitud: Option<f64>,
    #[serde(default)]
    pub usuario_reportador: Option<String>,
    #[serde(default)]
    pub usuario_propietario: Option<String>,
    #[serde(default)]
    pub email_propietario: Option<String>,
    #[serde(default)]
    pub foto_principal: Option<String>,
    #[serde(default)]
    pub fotos_evidencia: Option<String>,
}

/// Coordinates come back as numbers or as numeric strings depending on the
/// column type; anything else is treated as missing.
fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

#[derive(Debug, Deserialize)]
struct FeedResponse {
    #[serde(default)]
    incidencias: Vec<IncidentRecord>,
}

/// An incident ready to display, with photo references resolved to URLs.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentView {
    pub id: i64,
    pub description: Option<String>,
    pub date: Option<String>,
    pub plate: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub reporter: Option<String>,
    pub owner: Option<String>,
    pub owner_email: Option<String>,
    pub principal_photo_url: Option<String>,
    pub evidence_photo_urls: Vec<String>,
}

impl IncidentView {
    pub fn from_record(record: IncidentRecord, host: &ImageHost) -> Self {
        IncidentView {
            id: record.id_incidencia,
            principal_photo_url: host.photo_url(record.foto_principal.as_deref()),
            evidence_photo_urls: host.photo_urls(record.fotos_evidencia.as_deref()),
            description: record.descripcion,
            date: record.fecha,
            plate: record.placa_vehiculo,
            latitude: record.latitud,
            longitude: record.longitud,
            reporter: record.usuario_reportador,
            owner: record.usuario_propietario,
            owner_email: record.email_propietario,
        }
    }
}

pub struct IncidentFeed {
    client: reqwest::Client,
    url: Url,
    host: ImageHost,
}

impl IncidentFeed {
    pub fn new(client: reqwest::Client, backend_host: &Url) -> Result<Self> {
        Ok(IncidentFeed {
            client,
            url: endpoint(backend_host, "obtener-incidencias")?,
            host: ImageHost::new(backend_host.as_str()),
        })
    }

    pub async fn fetch(&self) -> Result<Vec<IncidentView>> {
        debug!("Fetching incidents from {}", self.url);
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| ReportError::FeedTransport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            warn!("Incident list returned {}", status);
            return Err(ReportError::FeedTransport(format!(
                "backend returned {}",
                status
            )));
        }
        let body = response
            .json::<FeedResponse>()
            .await
            .map_err(|e| ReportError::FeedTransport(format!("malformed response: {}", e)))?;
        info!("Fetched {} incident(s)", body.incidencias.len());
        Ok(body
            .incidencias
            .into_iter()
            .map(|record| IncidentView::from_record(record, &self.host))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_photos_become_urls() {
        let record: IncidentRecord = serde_json::from_str(
            r#"{
                "id_incidencia": 3,
                "descripcion": "Estacionado en doble fila",
                "placa_vehiculo": "VKR4521",
                "latitud": "24.8049",
                "longitud": -107.394,
                "foto_principal": "uploads\\20240307_090502.jpg",
                "fotos_evidencia": "[\"uploads\\\\e1.jpg\", \"'uploads/e2.jpg'\"]"
            }"#,
        )
        .unwrap();
        let view = IncidentView::from_record(record, &ImageHost::new("http://backend:5000/"));
        assert_eq!(view.id, 3);
        assert_eq!(view.latitude, Some(24.8049));
        assert_eq!(view.longitude, Some(-107.394));
        assert_eq!(
            view.principal_photo_url.as_deref(),
            Some("http://backend:5000/uploads/20240307_090502.jpg")
        );
        assert_eq!(
            view.evidence_photo_urls,
            vec![
                "http://backend:5000/uploads/e1.jpg",
                "http://backend:5000/uploads/e2.jpg"
            ]
        );
    }

    #[test]
    fn missing_photos_are_empty() {
        let record: IncidentRecord =
            serde_json::from_str(r#"{"id_incidencia": 1, "foto_principal": null, "latitud": true}"#)
                .unwrap();
        let view = IncidentView::from_record(record, &ImageHost::new("http://h"));
        assert_eq!(view.principal_photo_url, None);
        assert!(view.evidence_photo_urls.is_empty());
        assert_eq!(view.latitude, None);
    }
}
