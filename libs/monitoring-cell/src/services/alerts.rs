// =====================================================================================
// ALERT MANAGER SERVICE
// =====================================================================================

use std::collections::HashMap;

use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::config::{AlertRule, MonitoringConfig, RuleCondition, Severity};
use crate::error::MonitoringError;
use crate::models::{
    Alert, AlertEvent, AlertEventKind, AlertQuery, AlertStatus, AlertSummary, ServiceHealth,
};

/// Outcome of checking one metric rule against the latest values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleCheck {
    pub value: f64,
    pub threshold: f64,
    pub triggered: bool,
}

/// Evaluates a metric rule. `None` means the rule cannot be evaluated this
/// round: not a metric rule, no value collected, or no threshold configured.
pub fn check_rule(
    rule: &AlertRule,
    config: &MonitoringConfig,
    metrics: &HashMap<String, f64>,
) -> Option<RuleCheck> {
    let RuleCondition::Metric { metric, comparison, threshold } = &rule.condition else {
        return None;
    };

    let value = *metrics.get(metric)?;
    let threshold = threshold.resolve(config.metric(metric))?;

    Some(RuleCheck {
        value,
        threshold,
        triggered: comparison.holds(value, threshold),
    })
}

pub fn render_message(template: &str, value: Option<f64>) -> String {
    match value {
        Some(v) => template.replace("{{value}}", &format_value(v)),
        None => template.replace("{{value}}", ""),
    }
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

#[derive(Default)]
pub struct AlertManagerService {
    alerts: RwLock<Vec<Alert>>,
}

impl AlertManagerService {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(skip(self, config, metrics))]
    pub async fn evaluate(
        &self,
        config: &MonitoringConfig,
        metrics: &HashMap<String, f64>,
    ) -> Vec<AlertEvent> {
        let mut events = Vec::new();
        let mut alerts = self.alerts.write().await;

        for rule in &config.rules {
            let Some(check) = check_rule(rule, config, metrics) else {
                if matches!(rule.condition, RuleCondition::Metric { .. }) {
                    debug!("Rule {} skipped, metric or threshold missing", rule.id);
                }
                continue;
            };

            let open = alerts.iter().position(|a| a.rule_id == rule.id && a.is_open());
            let metric = match &rule.condition {
                RuleCondition::Metric { metric, .. } => Some(metric.clone()),
                RuleCondition::ServiceHealth { .. } => None,
            };

            match (check.triggered, open) {
                (true, None) => {
                    let alert = Alert {
                        id: Uuid::new_v4().to_string(),
                        rule_id: rule.id.clone(),
                        name: rule.name.clone(),
                        severity: rule.severity,
                        message: render_message(&rule.message, Some(check.value)),
                        metric,
                        service: None,
                        value: Some(check.value),
                        threshold: Some(check.threshold),
                        status: AlertStatus::Triggered,
                        triggered_at: Utc::now(),
                        resolved_at: None,
                        acknowledged_by: None,
                    };
                    log_triggered(&alert);
                    alerts.push(alert.clone());
                    events.push(AlertEvent {
                        kind: AlertEventKind::Triggered,
                        message: alert.message.clone(),
                        severity: alert.severity,
                        alert,
                    });
                }
                (true, Some(index)) => {
                    alerts[index].value = Some(check.value);
                }
                (false, Some(index)) => {
                    let alert = &mut alerts[index];
                    alert.status = AlertStatus::Resolved;
                    alert.resolved_at = Some(Utc::now());
                    alert.value = Some(check.value);
                    info!(alert_id = %alert.id, rule = %rule.id, "Alert resolved: {}", alert.name);

                    if let Some(recovery) = &rule.recovery_message {
                        events.push(AlertEvent {
                            kind: AlertEventKind::Recovered,
                            message: render_message(recovery, Some(check.value)),
                            severity: Severity::Info,
                            alert: alert.clone(),
                        });
                    }
                }
                (false, None) => {}
            }
        }

        events
    }

    /// Opens or resolves the service-health alerts for the probed service.
    #[instrument(skip(self, config, health), fields(service = %health.service))]
    pub async fn apply_service_health(
        &self,
        config: &MonitoringConfig,
        health: &ServiceHealth,
    ) -> Vec<AlertEvent> {
        let mut events = Vec::new();
        let mut alerts = self.alerts.write().await;

        let rules = config.rules.iter().filter(|rule| {
            matches!(&rule.condition, RuleCondition::ServiceHealth { service } if *service == health.service)
        });

        for rule in rules {
            let open = alerts.iter().position(|a| a.rule_id == rule.id && a.is_open());

            match (health.is_up(), open) {
                (false, None) => {
                    let alert = Alert {
                        id: Uuid::new_v4().to_string(),
                        rule_id: rule.id.clone(),
                        name: rule.name.clone(),
                        severity: rule.severity,
                        message: render_message(&rule.message, None),
                        metric: None,
                        service: Some(health.service.clone()),
                        value: None,
                        threshold: None,
                        status: AlertStatus::Triggered,
                        triggered_at: Utc::now(),
                        resolved_at: None,
                        acknowledged_by: None,
                    };
                    log_triggered(&alert);
                    alerts.push(alert.clone());
                    events.push(AlertEvent {
                        kind: AlertEventKind::Triggered,
                        message: alert.message.clone(),
                        severity: alert.severity,
                        alert,
                    });
                }
                (true, Some(index)) => {
                    let alert = &mut alerts[index];
                    alert.status = AlertStatus::Resolved;
                    alert.resolved_at = Some(Utc::now());
                    info!(alert_id = %alert.id, "Service {} recovered", health.service);

                    if let Some(recovery) = &rule.recovery_message {
                        events.push(AlertEvent {
                            kind: AlertEventKind::Recovered,
                            message: render_message(recovery, None),
                            severity: Severity::Info,
                            alert: alert.clone(),
                        });
                    }
                }
                _ => {}
            }
        }

        events
    }

    /// Newest first, filtered case-insensitively by severity and status.
    pub async fn list(&self, query: &AlertQuery) -> Vec<Alert> {
        let severity = query.severity.as_deref().map(str::to_ascii_uppercase);
        let status = query.status.as_deref().map(str::to_ascii_lowercase);

        let alerts = self.alerts.read().await;
        let mut filtered: Vec<Alert> = alerts
            .iter()
            .filter(|a| severity.as_deref().map_or(true, |s| a.severity.as_str() == s))
            .filter(|a| status.as_deref().map_or(true, |s| a.status.as_str() == s))
            .cloned()
            .collect();
        filtered.sort_by(|a, b| b.triggered_at.cmp(&a.triggered_at));
        filtered
    }

    pub async fn all(&self) -> Vec<Alert> {
        self.alerts.read().await.clone()
    }

    /// Counts of open alerts per severity.
    pub async fn summary(&self) -> AlertSummary {
        let alerts = self.alerts.read().await;
        let mut summary = AlertSummary::default();

        for alert in alerts.iter().filter(|a| a.is_open()) {
            match alert.severity {
                Severity::Info => summary.info += 1,
                Severity::Warning => summary.warning += 1,
                Severity::Error => summary.error += 1,
            }
            summary.total += 1;
        }
        summary
    }

    pub async fn acknowledge(&self, alert_id: &str, by: &str) -> Result<Alert, MonitoringError> {
        let mut alerts = self.alerts.write().await;
        let alert = alerts
            .iter_mut()
            .find(|a| a.id == alert_id)
            .ok_or_else(|| MonitoringError::AlertNotFound(alert_id.to_string()))?;

        match alert.status {
            AlertStatus::Resolved => Err(MonitoringError::AlertResolved(alert_id.to_string())),
            AlertStatus::Acknowledged => Ok(alert.clone()),
            AlertStatus::Triggered => {
                alert.status = AlertStatus::Acknowledged;
                alert.acknowledged_by = Some(by.to_string());
                info!(alert_id = %alert_id, "Alert acknowledged by {}", by);
                Ok(alert.clone())
            }
        }
    }

    /// Drops alerts triggered more than `days` ago. Open alerts are kept so
    /// they keep deduplicating their rule.
    pub async fn cleanup(&self, days: i64) -> Result<usize, MonitoringError> {
        let cutoff = Duration::try_days(days.max(0))
            .and_then(|age| Utc::now().checked_sub_signed(age))
            .ok_or(MonitoringError::RetentionOutOfRange(days))?;
        let mut alerts = self.alerts.write().await;

        let before = alerts.len();
        alerts.retain(|a| a.is_open() || a.triggered_at > cutoff);
        let removed = before - alerts.len();

        if removed > 0 {
            info!("Removed {} alerts older than {} days", removed, days);
        }
        Ok(removed)
    }
}

fn log_triggered(alert: &Alert) {
    match alert.severity {
        Severity::Error => error!(
            alert_id = %alert.id,
            rule = %alert.rule_id,
            value = ?alert.value,
            threshold = ?alert.threshold,
            "ALERT TRIGGERED: {}", alert.message
        ),
        Severity::Warning => warn!(
            alert_id = %alert.id,
            rule = %alert.rule_id,
            value = ?alert.value,
            "WARNING ALERT: {}", alert.message
        ),
        Severity::Info => info!(alert_id = %alert.id, "INFO ALERT: {}", alert.message),
    }
}
