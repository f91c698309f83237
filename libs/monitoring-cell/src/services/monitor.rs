// =====================================================================================
// MONITORING SERVICE
// =====================================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::config::MonitoringConfig;
use crate::error::MonitoringError;
use crate::models::{
    Alert, AlertEvent, AlertEventKind, AlertQuery, AlertSummary, CycleReport,
    FrontendMetricsReport, MetricSample, MonitoringStatus, ServiceHealth,
};
use crate::services::notify::{Notification, NotificationDispatcher};
use crate::services::{
    AlertManagerService, MetricsCollectorService, RequestTracker, ServiceHealthChecker,
};

/// Owns the monitoring state for the process: metric history, alerts and
/// the background collection loop.
pub struct MonitoringService {
    config: MonitoringConfig,
    supabase: SupabaseClient,
    tracker: Arc<RequestTracker>,
    collector: MetricsCollectorService,
    alerts: AlertManagerService,
    health: ServiceHealthChecker,
    dispatcher: Arc<NotificationDispatcher>,
    silenced_until: Option<DateTime<Utc>>,
    loop_handle: Mutex<Option<JoinHandle<()>>>,
}

impl MonitoringService {
    pub fn new(app_config: &AppConfig, config: MonitoringConfig) -> Self {
        let dispatcher = Arc::new(NotificationDispatcher::from_config(
            app_config,
            &config.notifications,
        ));
        Self::with_dispatcher(app_config, config, dispatcher)
    }

    pub fn with_dispatcher(
        app_config: &AppConfig,
        config: MonitoringConfig,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        let silenced_until = if config.silence.enabled {
            let until = chrono::Duration::try_seconds(config.silence.duration_secs.max(0))
                .and_then(|window| Utc::now().checked_add_signed(window));
            if until.is_none() {
                warn!(
                    "Ignoring silence window of {}s: duration out of range",
                    config.silence.duration_secs
                );
            }
            until
        } else {
            None
        };
        if silenced_until.is_some() {
            info!(
                "Alert notifications silenced for {}s by '{}': {}",
                config.silence.duration_secs, config.silence.creator, config.silence.reason
            );
        }

        Self {
            supabase: SupabaseClient::new(app_config),
            tracker: Arc::new(RequestTracker::new()),
            collector: MetricsCollectorService::new(config.history_limit),
            alerts: AlertManagerService::new(),
            health: ServiceHealthChecker::new(config.backend.clone()),
            dispatcher,
            silenced_until,
            loop_handle: Mutex::new(None),
            config,
        }
    }

    /// Builds the service from `MONITORING_CONFIG_PATH` or the built-in rules.
    pub fn from_app_config(app_config: &AppConfig) -> Self {
        let config = MonitoringConfig::load_or_default(app_config.monitoring_config_path.as_deref());
        Self::new(app_config, config)
    }

    pub fn config(&self) -> &MonitoringConfig {
        &self.config
    }

    pub fn tracker(&self) -> Arc<RequestTracker> {
        self.tracker.clone()
    }

    pub fn dispatcher(&self) -> Arc<NotificationDispatcher> {
        self.dispatcher.clone()
    }

    pub fn is_silenced(&self) -> bool {
        self.silenced_until.is_some_and(|until| Utc::now() < until)
    }

    // =====================================================================================
    // COLLECTION & EVALUATION
    // =====================================================================================

    /// Collects every metric source, appends to history and evaluates the
    /// metric rules.
    #[instrument(skip(self))]
    pub async fn collect_and_evaluate(&self) -> CycleReport {
        let mut metrics = self.collector.collect_system().await;
        metrics.extend(self.tracker.take_window().metrics());
        metrics.extend(self.collector.collect_database(&self.supabase).await);
        metrics.extend(self.collector.take_frontend().await);

        self.collector.record(&metrics).await;
        let events = self.alerts.evaluate(&self.config, &metrics).await;
        let (triggered, resolved) = count_events(&events);
        self.notify_events(&events).await;

        CycleReport {
            metrics,
            triggered,
            resolved,
            collected_at: Utc::now(),
        }
    }

    #[instrument(skip(self))]
    pub async fn check_service_health(&self) -> ServiceHealth {
        let health = self.health.check_backend().await;
        let events = self.alerts.apply_service_health(&self.config, &health).await;
        self.notify_events(&events).await;
        health
    }

    pub async fn record_frontend_metrics(&self, report: FrontendMetricsReport) -> Result<usize, MonitoringError> {
        self.collector.record_frontend(report).await
    }

    /// One loop iteration: collect, probe the backend, purge old alerts.
    pub async fn run_cycle(&self) {
        let report = self.collect_and_evaluate().await;
        info!(
            metrics = report.metrics.len(),
            triggered = report.triggered,
            resolved = report.resolved,
            "Monitoring cycle complete"
        );

        let health = self.check_service_health().await;
        if !health.is_up() {
            warn!("Backend health check failed: {:?}", health.error);
        }

        if let Err(e) = self.alerts.cleanup(self.config.retention_days).await {
            warn!("Alert cleanup skipped: {}", e);
        }
    }

    async fn notify_events(&self, events: &[AlertEvent]) {
        if events.is_empty() {
            return;
        }
        if self.is_silenced() {
            info!("{} alert notifications suppressed by silence window", events.len());
            return;
        }

        for event in events {
            let channels = self
                .config
                .rules
                .iter()
                .find(|r| r.id == event.alert.rule_id)
                .map(|r| r.notification_channels.clone())
                .unwrap_or_default();

            self.dispatcher
                .dispatch(&Notification::from_event(event), &channels)
                .await;
        }
    }

    // =====================================================================================
    // LOOP CONTROL
    // =====================================================================================

    /// Runs one cycle right away and then every collection interval. A
    /// second call while running is a no-op.
    pub async fn start(self: &Arc<Self>) {
        let mut handle = self.loop_handle.lock().await;
        if handle.as_ref().is_some_and(|h| !h.is_finished()) {
            warn!("Monitoring loop is already running");
            return;
        }

        let interval = Duration::from_secs(self.config.collection_interval_secs.max(1));
        let monitor = Arc::clone(self);
        *handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let cycle = tokio::spawn({
                    let monitor = monitor.clone();
                    async move { monitor.run_cycle().await }
                });
                if let Err(e) = cycle.await {
                    error!("Monitoring cycle failed: {}", e);
                }
            }
        }));

        info!("Monitoring started, collecting every {}s", interval.as_secs());
    }

    pub async fn stop(&self) {
        match self.loop_handle.lock().await.take() {
            Some(handle) => {
                handle.abort();
                info!("Monitoring stopped");
            }
            None => warn!("Monitoring loop is not running"),
        }
    }

    pub async fn is_active(&self) -> bool {
        self.loop_handle
            .lock()
            .await
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    // =====================================================================================
    // QUERIES
    // =====================================================================================

    pub async fn status(&self) -> MonitoringStatus {
        MonitoringStatus {
            is_active: self.is_active().await,
            metrics: self.collector.history().await,
            alerts: self.alerts.all().await,
            last_run: self.collector.last_collected_at().await,
        }
    }

    pub async fn metrics_history(&self) -> HashMap<String, Vec<MetricSample>> {
        self.collector.history().await
    }

    pub async fn alerts(&self, query: &AlertQuery) -> Vec<Alert> {
        self.alerts.list(query).await
    }

    pub async fn alert_summary(&self) -> AlertSummary {
        self.alerts.summary().await
    }

    pub async fn acknowledge(&self, alert_id: &str, by: &str) -> Result<Alert, MonitoringError> {
        self.alerts.acknowledge(alert_id, by).await
    }

    pub async fn cleanup(&self, days: i64) -> Result<usize, MonitoringError> {
        self.alerts.cleanup(days).await
    }
}

fn count_events(events: &[AlertEvent]) -> (usize, usize) {
    events.iter().fold((0, 0), |(t, r), e| match e.kind {
        AlertEventKind::Triggered => (t + 1, r),
        AlertEventKind::Recovered => (t, r + 1),
    })
}
