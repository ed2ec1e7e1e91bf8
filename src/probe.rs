//! Simulator liveness probe
//!
//! Before touching any kernel object, startup asks the simulator's local
//! status endpoint whether it is running. The probe is a trait so tests
//! and embedders can substitute their own detection; the default
//! implementation issues the HTTP GET the simulator serves on localhost.
//! Any transport error counts as "not running".

use async_trait::async_trait;
use tracing::debug;

/// The simulator's local status endpoint.
pub const SIM_STATUS_URL: &str = "http://127.0.0.1:32034/get_sim_status?object=simStatus";

/// Marker the status body carries while the simulator is up.
const RUNNING_MARKER: &str = "running:1";

/// Liveness check consulted by `startup` before opening the live region.
#[async_trait]
pub trait SimStatus: Send + Sync {
    /// Returns true iff the simulator reports itself as running.
    async fn is_running(&self) -> bool;
}

/// Default probe: HTTP GET against [`SIM_STATUS_URL`].
#[derive(Debug, Clone)]
pub struct HttpSimStatus {
    client: reqwest::Client,
    url: String,
}

impl HttpSimStatus {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new(), url: SIM_STATUS_URL.to_string() }
    }

    /// Probe a non-default endpoint. Used by tests against a local stub.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), url: url.into() }
    }
}

impl Default for HttpSimStatus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SimStatus for HttpSimStatus {
    async fn is_running(&self) -> bool {
        let response = match self.client.get(&self.url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "Simulator status probe failed");
                return false;
            }
        };
        match response.text().await {
            Ok(body) => body.contains(RUNNING_MARKER),
            Err(e) => {
                debug!(error = %e, "Simulator status body unreadable");
                false
            }
        }
    }
}

/// Fixed-answer probe for tests and headless tooling.
#[derive(Debug, Clone, Copy)]
pub struct StaticSimStatus(pub bool);

#[async_trait]
impl SimStatus for StaticSimStatus {
    async fn is_running(&self) -> bool {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_probe_reports_its_answer() {
        assert!(StaticSimStatus(true).is_running().await);
        assert!(!StaticSimStatus(false).is_running().await);
    }

    #[tokio::test]
    async fn unreachable_endpoint_counts_as_not_running() {
        // Nothing listens on this port; the transport error maps to false.
        let probe = HttpSimStatus::with_url("http://127.0.0.1:1/get_sim_status?object=simStatus");
        assert!(!probe.is_running().await);
    }

    #[test]
    fn status_url_matches_simulator_contract() {
        assert_eq!(SIM_STATUS_URL, "http://127.0.0.1:32034/get_sim_status?object=simStatus");
    }
}
