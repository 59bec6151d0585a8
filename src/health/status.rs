// src/health/status.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical status names. Application reports always carry one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
    Unreachable,
    Unknown,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "Healthy",
            HealthStatus::Degraded => "Degraded",
            HealthStatus::Unhealthy => "Unhealthy",
            HealthStatus::Unreachable => "Unreachable",
            HealthStatus::Unknown => "Unknown",
        }
    }

    pub fn from_http_success(success: bool) -> Self {
        if success {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A member's status as reported. Member endpoints may answer with any
/// string in their `status` field, so the text is kept verbatim and only
/// compared case-insensitively against the canonical names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberStatus(String);

impl MemberStatus {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is(&self, status: HealthStatus) -> bool {
        self.0.eq_ignore_ascii_case(status.as_str())
    }
}

impl From<HealthStatus> for MemberStatus {
    fn from(status: HealthStatus) -> Self {
        Self(status.as_str().to_string())
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
