// src/api/applications.rs
use crate::aggregator::{ApplicationHealthAggregator, LookupError};
use crate::cancel::CancelSignal;
use crate::config::Settings;
use crate::health::ApplicationHealthReport;
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Body of a not-found answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotFound {
    pub message: String,
}

impl From<LookupError> for NotFound {
    fn from(err: LookupError) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

/// List-all and get-by-name over the current settings snapshot.
pub struct ApplicationsApi {
    settings: Arc<ArcSwap<Settings>>,
    aggregator: ApplicationHealthAggregator,
}

impl ApplicationsApi {
    pub fn new(settings: Arc<ArcSwap<Settings>>, aggregator: ApplicationHealthAggregator) -> Self {
        Self {
            settings,
            aggregator,
        }
    }

    /// Immutable for the lifetime of whatever query holds it.
    pub fn snapshot(&self) -> Arc<Settings> {
        self.settings.load_full()
    }

    pub fn has_applications(&self) -> bool {
        !self.settings.load().applications.is_empty()
    }

    pub async fn list(&self, cancel: &CancelSignal) -> Vec<ApplicationHealthReport> {
        let settings = self.snapshot();
        self.aggregator
            .all_applications_health(&settings, cancel)
            .await
    }

    pub async fn get(
        &self,
        name: &str,
        cancel: &CancelSignal,
    ) -> Result<ApplicationHealthReport, NotFound> {
        let settings = self.snapshot();
        self.aggregator
            .application_health(&settings, name, cancel)
            .await
            .map_err(NotFound::from)
    }
}
