// src/metrics/collector.rs
use crate::health::{ApplicationHealthReport, HealthStatus, MemberHealthReport};
use anyhow::Result;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    pub fn gather(&self) -> Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(buffer)
    }
}

pub struct MetricsCollector {
    // Probe metrics
    pub probes_total: IntCounterVec,
    pub probe_duration_seconds: HistogramVec,

    // Application metrics
    pub application_status: IntGaugeVec,
    pub application_healthy_members: IntGaugeVec,
    pub application_total_members: IntGaugeVec,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let probes_total = IntCounterVec::new(
            Opts::new("aggregator_probes_total", "Total member probes by outcome"),
            &["member", "status"],
        )?;
        registry.register(Box::new(probes_total.clone()))?;

        let probe_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "aggregator_probe_duration_seconds",
                "Member probe duration in seconds",
            ),
            &["member"],
        )?;
        registry.register(Box::new(probe_duration_seconds.clone()))?;

        let application_status = IntGaugeVec::new(
            Opts::new(
                "aggregator_application_status",
                "Aggregated application status (0=healthy, 1=degraded, 2=unhealthy, 3=unknown)",
            ),
            &["application"],
        )?;
        registry.register(Box::new(application_status.clone()))?;

        let application_healthy_members = IntGaugeVec::new(
            Opts::new(
                "aggregator_application_healthy_members",
                "Healthy members in the last application check",
            ),
            &["application"],
        )?;
        registry.register(Box::new(application_healthy_members.clone()))?;

        let application_total_members = IntGaugeVec::new(
            Opts::new(
                "aggregator_application_total_members",
                "Probed members in the last application check",
            ),
            &["application"],
        )?;
        registry.register(Box::new(application_total_members.clone()))?;

        Ok(Self {
            probes_total,
            probe_duration_seconds,
            application_status,
            application_healthy_members,
            application_total_members,
        })
    }

    pub fn record_probe(&self, member: &MemberHealthReport) {
        // Canonical names only; member-reported text is free-form.
        let status = [
            HealthStatus::Healthy,
            HealthStatus::Degraded,
            HealthStatus::Unhealthy,
            HealthStatus::Unreachable,
        ]
        .into_iter()
        .find(|s| member.status().is(*s))
        .unwrap_or(HealthStatus::Unknown);

        self.probes_total
            .with_label_values(&[member.name(), status.as_str()])
            .inc();

        self.probe_duration_seconds
            .with_label_values(&[member.name()])
            .observe(member.duration_ms() as f64 / 1000.0);
    }

    pub fn record_application(&self, report: &ApplicationHealthReport) {
        let value = match report.status() {
            HealthStatus::Healthy => 0,
            HealthStatus::Degraded => 1,
            HealthStatus::Unhealthy | HealthStatus::Unreachable => 2,
            HealthStatus::Unknown => 3,
        };

        self.application_status
            .with_label_values(&[report.name()])
            .set(value);
        self.application_healthy_members
            .with_label_values(&[report.name()])
            .set(report.healthy_count() as i64);
        self.application_total_members
            .with_label_values(&[report.name()])
            .set(report.total_count() as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::MemberStatus;
    use chrono::Utc;

    #[test]
    fn test_records_application_and_probes() {
        let registry = MetricsRegistry::new().unwrap();
        let collector = registry.collector();

        let members = vec![
            MemberHealthReport::new("a", "http://a", HealthStatus::Healthy, 12, None),
            MemberHealthReport::new("b", "http://b", MemberStatus::new("Warming"), 30, None),
        ];
        for member in &members {
            collector.record_probe(member);
        }
        collector.record_application(&ApplicationHealthReport::new("App", Utc::now(), members));

        let text = String::from_utf8(registry.gather().unwrap()).unwrap();
        assert!(text.contains(r#"aggregator_probes_total{member="a",status="Healthy"} 1"#));
        assert!(text.contains(r#"aggregator_probes_total{member="b",status="Unknown"} 1"#));
        assert!(text.contains(r#"aggregator_application_healthy_members{application="App"} 1"#));
        assert!(text.contains(r#"aggregator_application_status{application="App"} 0"#));
    }
}
