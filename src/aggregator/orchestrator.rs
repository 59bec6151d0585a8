// src/aggregator/orchestrator.rs
use crate::cancel::CancelSignal;
use crate::config::{ApplicationConfig, Settings};
use crate::health::{ApplicationHealthReport, MemberHealthReport, MemberProbe};
use crate::metrics::MetricsCollector;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("Application '{0}' not found")]
    ApplicationNotFound(String),
}

/// Fans out one probe per application member and folds the results into
/// an [`ApplicationHealthReport`].
pub struct ApplicationHealthAggregator {
    prober: Arc<dyn MemberProbe>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl ApplicationHealthAggregator {
    pub fn new(prober: Arc<dyn MemberProbe>, metrics: Option<Arc<MetricsCollector>>) -> Self {
        Self { prober, metrics }
    }

    /// One report per configured application, in configuration order.
    pub async fn all_applications_health(
        &self,
        settings: &Settings,
        cancel: &CancelSignal,
    ) -> Vec<ApplicationHealthReport> {
        let mut reports = Vec::with_capacity(settings.applications.len());
        for app in &settings.applications {
            reports.push(self.check_application(settings, app, cancel).await);
        }
        reports
    }

    pub async fn application_health(
        &self,
        settings: &Settings,
        name: &str,
        cancel: &CancelSignal,
    ) -> Result<ApplicationHealthReport, LookupError> {
        let app = settings
            .application(name)
            .ok_or_else(|| LookupError::ApplicationNotFound(name.to_string()))?;
        Ok(self.check_application(settings, app, cancel).await)
    }

    async fn check_application(
        &self,
        settings: &Settings,
        app: &ApplicationConfig,
        cancel: &CancelSignal,
    ) -> ApplicationHealthReport {
        let checked_at = Utc::now();
        let dispatched = Instant::now();

        let mut targets = Vec::with_capacity(app.members.len());
        let mut tasks = Vec::with_capacity(app.members.len());

        for member in &app.members {
            let Some(uri) = settings.member_uri(member) else {
                warn!(
                    member = %member,
                    application = %app.name,
                    "Health check setting not found for member"
                );
                continue;
            };

            let prober = self.prober.clone();
            let name = member.clone();
            let uri = uri.to_string();
            let cancel = cancel.clone();
            targets.push((name.clone(), uri.clone()));
            tasks.push(tokio::spawn(async move {
                prober.probe(&name, &uri, cancel).await
            }));
        }

        // join_all yields outputs in input order, so slot i belongs to targets[i]
        // whatever order the probes finish in.
        let results = futures::future::join_all(tasks).await;

        let members: Vec<MemberHealthReport> = results
            .into_iter()
            .zip(targets)
            .map(|(result, (name, uri))| match result {
                Ok(report) => report,
                Err(e) => {
                    error!(member = %name, uri = %uri, error = %e, "Probe task failed");
                    let elapsed = dispatched.elapsed().as_millis() as u64;
                    MemberHealthReport::unreachable(name, uri, elapsed, e.to_string())
                }
            })
            .collect();

        if let Some(metrics) = &self.metrics {
            for member in &members {
                metrics.record_probe(member);
            }
        }

        let report = ApplicationHealthReport::new(app.name.clone(), checked_at, members);

        if let Some(metrics) = &self.metrics {
            metrics.record_application(&report);
        }

        info!(
            application = %report.name(),
            status = %report.status(),
            healthy = report.healthy_count(),
            total = report.total_count(),
            "Application health check complete"
        );
        debug!(
            application = %report.name(),
            average_duration_ms = report.average_duration_ms(),
            "Application probe latency"
        );

        report
    }
}
