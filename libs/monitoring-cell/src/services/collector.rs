// =====================================================================================
// METRICS COLLECTOR SERVICE
// =====================================================================================

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use sysinfo::{Disks, System};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use shared_database::SupabaseClient;

use crate::error::MonitoringError;
use crate::models::{FrontendMetricsReport, MetricSample};

/// Request counters fed by the tracking middleware and drained on every
/// collection, so API metrics cover the window since the previous one.
#[derive(Debug, Default)]
pub struct RequestTracker {
    request_count: AtomicU64,
    error_count: AtomicU64,
    total_response_time_ms: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestWindow {
    pub requests: u64,
    pub errors: u64,
    pub total_response_time_ms: u64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, response_time_ms: u64, is_error: bool) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        self.total_response_time_ms
            .fetch_add(response_time_ms, Ordering::Relaxed);
        if is_error {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn take_window(&self) -> RequestWindow {
        RequestWindow {
            requests: self.request_count.swap(0, Ordering::Relaxed),
            errors: self.error_count.swap(0, Ordering::Relaxed),
            total_response_time_ms: self.total_response_time_ms.swap(0, Ordering::Relaxed),
        }
    }
}

impl RequestWindow {
    pub fn metrics(&self) -> HashMap<String, f64> {
        let (average, error_rate) = if self.requests > 0 {
            (
                self.total_response_time_ms as f64 / self.requests as f64,
                self.errors as f64 / self.requests as f64 * 100.0,
            )
        } else {
            (0.0, 0.0)
        };

        HashMap::from([
            ("api_response_time".to_string(), round2(average)),
            ("api_error_rate".to_string(), round2(error_rate)),
            ("api_request_count".to_string(), self.requests as f64),
        ])
    }
}

pub struct MetricsCollectorService {
    system: Arc<Mutex<System>>,
    history: RwLock<HashMap<String, VecDeque<MetricSample>>>,
    frontend: RwLock<HashMap<String, f64>>,
    history_limit: usize,
}

impl MetricsCollectorService {
    pub fn new(history_limit: usize) -> Self {
        Self {
            system: Arc::new(Mutex::new(System::new())),
            history: RwLock::new(HashMap::new()),
            frontend: RwLock::new(HashMap::new()),
            history_limit: history_limit.max(1),
        }
    }

    /// CPU, memory and disk usage as percentages. The refresh is blocking and
    /// runs off the async workers.
    pub async fn collect_system(&self) -> HashMap<String, f64> {
        let system = self.system.clone();

        let collected = tokio::task::spawn_blocking(move || {
            let mut sys = match system.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            sys.refresh_cpu_usage();
            sys.refresh_memory();

            let memory = if sys.total_memory() > 0 {
                sys.used_memory() as f64 / sys.total_memory() as f64 * 100.0
            } else {
                0.0
            };

            let disks = Disks::new_with_refreshed_list();
            let (total, available) = disks.list().iter().fold((0u64, 0u64), |(t, a), disk| {
                (t + disk.total_space(), a + disk.available_space())
            });
            let disk = if total > 0 {
                (total - available) as f64 / total as f64 * 100.0
            } else {
                0.0
            };

            HashMap::from([
                ("server_cpu_usage".to_string(), round2(sys.global_cpu_usage() as f64)),
                ("server_memory_usage".to_string(), round2(memory)),
                ("server_disk_space".to_string(), round2(disk)),
            ])
        })
        .await;

        match collected {
            Ok(metrics) => metrics,
            Err(e) => {
                warn!("System metric collection failed: {}", e);
                HashMap::new()
            }
        }
    }

    /// Store round trip time. Nothing is reported when the store is down.
    pub async fn collect_database(&self, supabase: &SupabaseClient) -> HashMap<String, f64> {
        match supabase.ping().await {
            Ok(elapsed) => HashMap::from([(
                "db_query_time".to_string(),
                round2(elapsed.as_secs_f64() * 1000.0),
            )]),
            Err(e) => {
                debug!("Skipping db_query_time: {}", e);
                HashMap::new()
            }
        }
    }

    pub async fn record_frontend(&self, report: FrontendMetricsReport) -> Result<usize, MonitoringError> {
        let mut values = Vec::new();
        if let Some(load) = report.page_load_time {
            values.push(("frontend_page_load_time".to_string(), load));
        }
        if let Some(errors) = report.error_count {
            values.push(("frontend_error_count".to_string(), errors));
        }
        for (name, value) in report.metrics {
            if !name.starts_with("frontend_") {
                return Err(MonitoringError::InvalidMetric(name));
            }
            values.push((name, value));
        }
        if let Some((name, _)) = values.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            return Err(MonitoringError::InvalidMetric(name.clone()));
        }

        let mut frontend = self.frontend.write().await;
        for (name, value) in &values {
            if name == "frontend_error_count" {
                *frontend.entry(name.clone()).or_insert(0.0) += value;
            } else {
                frontend.insert(name.clone(), *value);
            }
        }
        Ok(values.len())
    }

    /// Drains the frontend values reported since the last collection.
    pub async fn take_frontend(&self) -> HashMap<String, f64> {
        std::mem::take(&mut *self.frontend.write().await)
    }

    #[instrument(skip(self, metrics))]
    pub async fn record(&self, metrics: &HashMap<String, f64>) {
        let timestamp = Utc::now();
        let mut history = self.history.write().await;

        for (name, value) in metrics {
            let samples = history.entry(name.clone()).or_default();
            samples.push_back(MetricSample { timestamp, value: *value });
            while samples.len() > self.history_limit {
                samples.pop_front();
            }
        }
    }

    pub async fn history(&self) -> HashMap<String, Vec<MetricSample>> {
        self.history
            .read()
            .await
            .iter()
            .map(|(name, samples)| (name.clone(), samples.iter().cloned().collect()))
            .collect()
    }

    pub async fn last_collected_at(&self) -> Option<chrono::DateTime<Utc>> {
        self.history
            .read()
            .await
            .values()
            .filter_map(|samples| samples.back().map(|s| s.timestamp))
            .max()
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
