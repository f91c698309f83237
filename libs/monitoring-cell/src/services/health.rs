// =====================================================================================
// SERVICE HEALTH CHECKER
// =====================================================================================

use std::time::{Duration, Instant};

use chrono::Utc;
use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::config::BackendTarget;
use crate::models::{ServiceHealth, ServiceState};

pub struct ServiceHealthChecker {
    client: Client,
    target: BackendTarget,
}

impl ServiceHealthChecker {
    pub fn new(target: BackendTarget) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(target.timeout_secs.max(1)))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, target }
    }

    /// Probes the backend health endpoint. Transport failures and non-2xx
    /// answers both count as down.
    #[instrument(skip(self))]
    pub async fn check_backend(&self) -> ServiceHealth {
        let url = self.target.health_url();
        let started = Instant::now();
        let result = self.client.get(&url).send().await;
        let response_time_ms = started.elapsed().as_millis() as u64;

        let (status, status_code, error) = match result {
            Ok(response) if response.status().is_success() => {
                debug!("Backend healthy in {}ms", response_time_ms);
                (ServiceState::Up, Some(response.status().as_u16()), None)
            }
            Ok(response) => {
                let code = response.status().as_u16();
                warn!("Backend health check answered {}", code);
                (ServiceState::Down, Some(code), Some(format!("Unexpected status {}", code)))
            }
            Err(e) => {
                warn!("Backend health check failed: {}", e);
                (ServiceState::Down, None, Some(e.to_string()))
            }
        };

        ServiceHealth {
            service: "backend".to_string(),
            url,
            status,
            status_code,
            response_time_ms,
            error,
            checked_at: Utc::now(),
        }
    }
}
