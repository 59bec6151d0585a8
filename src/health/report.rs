// src/health/report.rs
use super::aggregate::aggregate;
use super::status::{HealthStatus, MemberStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of one probe against one member.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberHealthReport {
    name: String,
    uri: String,
    status: MemberStatus,
    duration_ms: u64,
    payload: Option<String>,
}

impl MemberHealthReport {
    pub fn new(
        name: impl Into<String>,
        uri: impl Into<String>,
        status: impl Into<MemberStatus>,
        duration_ms: u64,
        payload: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            status: status.into(),
            duration_ms,
            payload,
        }
    }

    pub fn unreachable(
        name: impl Into<String>,
        uri: impl Into<String>,
        duration_ms: u64,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            uri,
            HealthStatus::Unreachable,
            duration_ms,
            Some(reason.into()),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn status(&self) -> &MemberStatus {
        &self.status
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }
}

/// Summarized health of one application at `checked_at`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationHealthReport {
    name: String,
    status: HealthStatus,
    healthy_count: usize,
    total_count: usize,
    average_duration_ms: f64,
    checked_at: DateTime<Utc>,
    members: Vec<MemberHealthReport>,
}

impl ApplicationHealthReport {
    /// Derives counts, mean duration and aggregated status from `members`,
    /// which must already be in configured order.
    pub fn new(
        name: impl Into<String>,
        checked_at: DateTime<Utc>,
        members: Vec<MemberHealthReport>,
    ) -> Self {
        let total_count = members.len();
        let healthy_count = members
            .iter()
            .filter(|m| m.status.is(HealthStatus::Healthy))
            .count();
        let average_duration_ms = average_duration_ms(&members);
        let status = aggregate(members.iter().map(|m| &m.status));

        Self {
            name: name.into(),
            status,
            healthy_count,
            total_count,
            average_duration_ms,
            checked_at,
            members,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> HealthStatus {
        self.status
    }

    pub fn healthy_count(&self) -> usize {
        self.healthy_count
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn average_duration_ms(&self) -> f64 {
        self.average_duration_ms
    }

    pub fn checked_at(&self) -> DateTime<Utc> {
        self.checked_at
    }

    pub fn members(&self) -> &[MemberHealthReport] {
        &self.members
    }
}

fn average_duration_ms(members: &[MemberHealthReport]) -> f64 {
    if members.is_empty() {
        return 0.0;
    }
    let total: u64 = members.iter().map(|m| m.duration_ms).sum();
    let mean = total as f64 / members.len() as f64;
    (mean * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(status: &str, duration_ms: u64) -> MemberHealthReport {
        MemberHealthReport::new("m", "http://m/health", MemberStatus::new(status), duration_ms, None)
    }

    #[test]
    fn test_average_duration() {
        let report = ApplicationHealthReport::new(
            "App",
            Utc::now(),
            vec![member("Healthy", 10), member("Healthy", 20)],
        );
        assert_eq!(report.average_duration_ms(), 15.0);
    }

    #[test]
    fn test_average_duration_rounds_to_two_decimals() {
        let report = ApplicationHealthReport::new(
            "App",
            Utc::now(),
            vec![member("Healthy", 1), member("Healthy", 1), member("Healthy", 2)],
        );
        assert_eq!(report.average_duration_ms(), 1.33);
    }

    #[test]
    fn test_average_duration_midpoint_rounds_to_even() {
        let mut members: Vec<_> = (0..7).map(|_| member("Healthy", 1)).collect();
        members.push(member("Healthy", 2));
        let report = ApplicationHealthReport::new("App", Utc::now(), members);
        assert_eq!(report.average_duration_ms(), 1.12);
    }

    #[test]
    fn test_empty_application() {
        let report = ApplicationHealthReport::new("Empty", Utc::now(), vec![]);
        assert_eq!(report.total_count(), 0);
        assert_eq!(report.healthy_count(), 0);
        assert_eq!(report.average_duration_ms(), 0.0);
        assert_eq!(report.status(), HealthStatus::Unknown);
    }

    #[test]
    fn test_healthy_count_is_case_insensitive() {
        let report = ApplicationHealthReport::new(
            "App",
            Utc::now(),
            vec![member("healthy", 5), member("HEALTHY", 5), member("Degraded", 5)],
        );
        assert_eq!(report.healthy_count(), 2);
        assert_eq!(report.total_count(), 3);
        assert_eq!(report.status(), HealthStatus::Degraded);
    }

    #[test]
    fn test_serializes_camel_case() {
        let report = ApplicationHealthReport::new(
            "App",
            Utc::now(),
            vec![MemberHealthReport::unreachable("m", "http://m", 7, "boom")],
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "Unhealthy");
        assert_eq!(json["healthyCount"], 0);
        assert_eq!(json["totalCount"], 1);
        assert_eq!(json["averageDurationMs"], 7.0);
        assert!(json["checkedAt"].as_str().unwrap().ends_with('Z'));
        assert_eq!(json["members"][0]["durationMs"], 7);
        assert_eq!(json["members"][0]["status"], "Unreachable");
        assert_eq!(json["members"][0]["payload"], "boom");
    }
}
