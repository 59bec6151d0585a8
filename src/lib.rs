// src/lib.rs
pub mod aggregator;
pub mod api;
pub mod cancel;
pub mod config;
pub mod health;
pub mod metrics;
pub mod server;
