//! Health Checks
//!
//! Liveness and readiness for the health listener. The service is live from
//! start-up and becomes ready once the API listener is bound.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Service is healthy
    Healthy,
    /// Service is unhealthy
    Unhealthy,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        *self == HealthStatus::Healthy
    }

    fn from_flag(flag: bool) -> Self {
        if flag {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "Healthy"),
            HealthStatus::Unhealthy => write!(f, "Unhealthy"),
        }
    }
}

/// Overall health report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// Worst of liveness and readiness
    pub status: HealthStatus,
    pub live: HealthStatus,
    pub ready: HealthStatus,
    /// Crate version
    pub version: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
}

/// Readiness flag and uptime.
///
/// Liveness is answered by the health listener itself: if it responds, the
/// process is live.
#[derive(Debug)]
pub struct HealthCheck {
    start_time: Instant,
    ready: AtomicBool,
}

impl HealthCheck {
    /// Live, not yet ready
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            ready: AtomicBool::new(false),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Relaxed);
    }

    pub fn liveness(&self) -> HealthStatus {
        HealthStatus::Healthy
    }

    pub fn readiness(&self) -> HealthStatus {
        HealthStatus::from_flag(self.ready.load(Ordering::Relaxed))
    }

    /// Combined report
    pub fn report(&self) -> HealthReport {
        let live = self.liveness();
        let ready = self.readiness();
        let status = if live.is_healthy() && ready.is_healthy() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };

        HealthReport {
            status,
            live,
            ready,
            version: crate::VERSION.to_string(),
            uptime_seconds: self.uptime().as_secs(),
        }
    }
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
