//! Server state: provider endpoints and task counters

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crate::core::options::ProviderKind;

/// Deadline for a single isochrone computation
pub const API_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Running and total isochrone computations
#[derive(Debug, Default)]
pub struct TaskCounter {
    running: AtomicUsize,
    total: AtomicU64,
}

impl TaskCounter {
    /// Count a new computation until the guard is dropped
    pub fn start(&self) -> TaskGuard<'_> {
        self.running.fetch_add(1, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);
        TaskGuard { counter: self }
    }

    pub fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }
}

/// Decrements the running count on every exit path
#[derive(Debug)]
pub struct TaskGuard<'a> {
    counter: &'a TaskCounter,
}

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        self.counter.running.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Shared state of the HTTP server
#[derive(Debug)]
pub struct ServerState {
    pub tasks: TaskCounter,
    pub deadline: Duration,
    osrm_endpoint: Option<String>,
    valhalla_endpoint: Option<String>,
}

impl Default for ServerState {
    fn default() -> Self {
        Self {
            tasks: TaskCounter::default(),
            deadline: API_TIMEOUT,
            osrm_endpoint: None,
            valhalla_endpoint: None,
        }
    }
}

impl ServerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a provider to a non-default endpoint
    pub fn with_endpoint(mut self, provider: ProviderKind, endpoint: impl Into<String>) -> Self {
        match provider {
            ProviderKind::Osrm => self.osrm_endpoint = Some(endpoint.into()),
            ProviderKind::Valhalla => self.valhalla_endpoint = Some(endpoint.into()),
        }
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Configured endpoint, `None` for the provider default
    pub fn endpoint(&self, provider: ProviderKind) -> Option<&str> {
        match provider {
            ProviderKind::Osrm => self.osrm_endpoint.as_deref(),
            ProviderKind::Valhalla => self.valhalla_endpoint.as_deref(),
        }
    }
}

/// 1, 5 and 15 minute load averages, zeros where unavailable
pub fn load_average() -> [f64; 3] {
    let mut loads = [0.0f64; 3];
    #[cfg(unix)]
    {
        // SAFETY: `loads` has room for the three samples requested
        let samples = unsafe { libc::getloadavg(loads.as_mut_ptr(), 3) };
        if samples < 0 {
            return [0.0; 3];
        }
    }
    loads
}
