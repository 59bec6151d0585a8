// src/health/aggregate.rs
use super::status::{HealthStatus, MemberStatus};

/// Combines member statuses into one application status.
///
/// Worst case wins: any `Unhealthy` or `Unreachable` member makes the
/// application `Unhealthy`, otherwise any `Degraded` member makes it
/// `Degraded`, otherwise any `Healthy` member makes it `Healthy`. An empty
/// set, or a set of only unrecognized statuses, is `Unknown`.
pub fn aggregate<'a, I>(statuses: I) -> HealthStatus
where
    I: IntoIterator<Item = &'a MemberStatus>,
{
    let mut degraded = false;
    let mut healthy = false;

    for status in statuses {
        if status.is(HealthStatus::Unhealthy) || status.is(HealthStatus::Unreachable) {
            return HealthStatus::Unhealthy;
        }
        degraded |= status.is(HealthStatus::Degraded);
        healthy |= status.is(HealthStatus::Healthy);
    }

    if degraded {
        HealthStatus::Degraded
    } else if healthy {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unknown
    }
}
