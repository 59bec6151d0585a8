// src/health/mod.rs
mod aggregate;
mod prober;
mod report;
mod status;

pub use aggregate::aggregate;
pub use prober::{classify, HttpProber, MemberProbe};
pub use report::{ApplicationHealthReport, MemberHealthReport};
pub use status::{HealthStatus, MemberStatus};
