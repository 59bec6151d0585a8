// src/health/prober.rs
use super::report::MemberHealthReport;
use super::status::{HealthStatus, MemberStatus};
use crate::cancel::CancelSignal;
use crate::config::ProbeConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, warn};
use url::Url;

/// Evaluates one member endpoint. Implementations never fail: every error
/// condition is folded into the returned report's status.
#[async_trait]
pub trait MemberProbe: Send + Sync {
    async fn probe(&self, name: &str, uri: &str, cancel: CancelSignal) -> MemberHealthReport;
}

#[derive(Debug, thiserror::Error)]
enum ProbeError {
    #[error("Invalid member URI '{uri}': {source}")]
    InvalidUri {
        uri: String,
        source: url::ParseError,
    },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

enum ProbeOutcome {
    Cancelled,
    TimedOut,
    Failed(ProbeError),
    Responded { code: StatusCode, body: String },
}

/// Probes members with a single HTTP GET bounded by a local timeout.
#[derive(Clone)]
pub struct HttpProber {
    client: Client,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(config: &ProbeConfig) -> reqwest::Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: &ProbeConfig) -> Self {
        Self {
            client,
            timeout: config.timeout(),
        }
    }

    async fn fetch(&self, uri: &str) -> Result<(StatusCode, String), ProbeError> {
        let url = Url::parse(uri).map_err(|source| ProbeError::InvalidUri {
            uri: uri.to_string(),
            source,
        })?;
        let response = self.client.get(url).send().await?;
        let code = response.status();
        // Body is read whatever the status code.
        let body = response.text().await?;
        Ok((code, body))
    }
}

#[async_trait]
impl MemberProbe for HttpProber {
    async fn probe(&self, name: &str, uri: &str, mut cancel: CancelSignal) -> MemberHealthReport {
        let start = Instant::now();

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => ProbeOutcome::Cancelled,
            _ = sleep(self.timeout) => ProbeOutcome::TimedOut,
            fetched = self.fetch(uri) => match fetched {
                Ok((code, body)) => ProbeOutcome::Responded { code, body },
                Err(e) => ProbeOutcome::Failed(e),
            },
        };

        let (status, payload): (MemberStatus, String) = match outcome {
            ProbeOutcome::Cancelled => {
                warn!(member = name, uri, "Probe cancelled by caller");
                (HealthStatus::Unreachable.into(), "Request cancelled".to_string())
            }
            ProbeOutcome::TimedOut => {
                warn!(member = name, uri, timeout = ?self.timeout, "Probe timed out");
                (
                    HealthStatus::Unreachable.into(),
                    format!("Timeout after {} seconds", self.timeout.as_secs_f64()),
                )
            }
            ProbeOutcome::Failed(e) => {
                error!(member = name, uri, error = %e, "Error checking member health");
                (HealthStatus::Unreachable.into(), e.to_string())
            }
            ProbeOutcome::Responded { code, body } => {
                let status = classify(code, &body);
                debug!(member = name, uri, %code, %status, "Member responded");
                (status, body)
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        MemberHealthReport::new(name, uri, status, duration_ms, Some(payload))
    }
}

/// Maps an HTTP response to a member status.
///
/// A JSON body with a top-level string `status` (or, failing that, `Status`)
/// field wins verbatim. Anything else falls back to the status code.
pub fn classify(code: StatusCode, body: &str) -> MemberStatus {
    let fallback = || -> MemberStatus { HealthStatus::from_http_success(code.is_success()).into() };

    if body.trim().is_empty() {
        return fallback();
    }

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(doc) => reported_status(&doc)
            .map(|reported| MemberStatus::new(reported))
            .unwrap_or_else(fallback),
        Err(_) => fallback(),
    }
}

fn reported_status(doc: &serde_json::Value) -> Option<&str> {
    doc.get("status")
        .and_then(serde_json::Value::as_str)
        .or_else(|| doc.get("Status").and_then(serde_json::Value::as_str))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_status_field() {
        let status = classify(StatusCode::OK, r#"{"status":"Healthy"}"#);
        assert_eq!(status.as_str(), "Healthy");
    }

    #[test]
    fn test_capitalized_status_field() {
        let status = classify(StatusCode::OK, r#"{"Status":"Degraded"}"#);
        assert_eq!(status.as_str(), "Degraded");
    }

    #[test]
    fn test_lowercase_field_takes_precedence() {
        let status = classify(StatusCode::OK, r#"{"Status":"Degraded","status":"Healthy"}"#);
        assert_eq!(status.as_str(), "Healthy");
    }

    #[test]
    fn test_json_status_overrides_http_code() {
        let status = classify(StatusCode::SERVICE_UNAVAILABLE, r#"{"status":"Degraded"}"#);
        assert_eq!(status.as_str(), "Degraded");
    }

    #[test]
    fn test_other_casings_are_not_recognized() {
        let status = classify(StatusCode::INTERNAL_SERVER_ERROR, r#"{"STATUS":"Healthy"}"#);
        assert!(status.is(HealthStatus::Unhealthy));
    }

    #[test]
    fn test_non_string_status_falls_back() {
        let status = classify(StatusCode::OK, r#"{"status":1,"Status":null}"#);
        assert!(status.is(HealthStatus::Healthy));
    }

    #[test]
    fn test_plain_text_uses_http_code() {
        assert!(classify(StatusCode::OK, "OK").is(HealthStatus::Healthy));
        assert!(classify(StatusCode::INTERNAL_SERVER_ERROR, "OK").is(HealthStatus::Unhealthy));
    }

    #[test]
    fn test_empty_body_uses_http_code() {
        assert!(classify(StatusCode::NO_CONTENT, "").is(HealthStatus::Healthy));
        assert!(classify(StatusCode::BAD_GATEWAY, "  \n").is(HealthStatus::Unhealthy));
    }

    #[test]
    fn test_json_array_uses_http_code() {
        assert!(classify(StatusCode::OK, r#"["status"]"#).is(HealthStatus::Healthy));
    }
}
