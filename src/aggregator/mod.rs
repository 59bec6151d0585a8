// src/aggregator/mod.rs
mod orchestrator;

pub use orchestrator::{ApplicationHealthAggregator, LookupError};
