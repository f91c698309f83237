use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::MonitoringError;

// =====================================================================================
// RULE SET
// =====================================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitoringConfig {
    pub system_name: String,
    pub enabled: bool,
    pub collection_interval_secs: u64,
    pub retention_days: i64,
    pub history_limit: usize,
    pub backend: BackendTarget,
    pub metrics: Vec<MetricDefinition>,
    pub rules: Vec<AlertRule>,
    pub notifications: NotificationSettings,
    pub silence: SilenceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackendTarget {
    pub service_url: String,
    pub health_check_endpoint: String,
    pub timeout_secs: u64,
}

impl BackendTarget {
    pub fn health_url(&self) -> String {
        format!(
            "{}{}",
            self.service_url.trim_end_matches('/'),
            self.health_check_endpoint
        )
    }
}

impl Default for BackendTarget {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:5000".to_string(),
            health_check_endpoint: "/api/health".to_string(),
            timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Percentage,
    Milliseconds,
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    System,
    Application,
    Frontend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub kind: MetricKind,
    #[serde(default)]
    pub warning_threshold: Option<f64>,
    #[serde(default)]
    pub critical_threshold: Option<f64>,
    pub collection: Collection,
}

impl MetricDefinition {
    fn new(
        name: &str,
        description: &str,
        kind: MetricKind,
        warning: Option<f64>,
        critical: Option<f64>,
        collection: Collection,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            kind,
            warning_threshold: warning,
            critical_threshold: critical,
            collection,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
    Webhook,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Sms => "sms",
            Channel::Webhook => "webhook",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
}

impl Comparison {
    pub fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::Greater => value > threshold,
            Comparison::GreaterOrEqual => value >= threshold,
            Comparison::Less => value < threshold,
            Comparison::LessOrEqual => value <= threshold,
            Comparison::Equal => (value - threshold).abs() < f64::EPSILON,
            Comparison::NotEqual => (value - threshold).abs() >= f64::EPSILON,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NamedThreshold {
    #[serde(rename = "warningThreshold")]
    Warning,
    #[serde(rename = "criticalThreshold")]
    Critical,
}

/// Either a reference to the metric definition's own threshold or a literal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Threshold {
    Named(NamedThreshold),
    Value(f64),
}

impl Threshold {
    pub fn resolve(&self, definition: Option<&MetricDefinition>) -> Option<f64> {
        match self {
            Threshold::Value(v) => Some(*v),
            Threshold::Named(NamedThreshold::Warning) => definition?.warning_threshold,
            Threshold::Named(NamedThreshold::Critical) => definition?.critical_threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RuleCondition {
    Metric {
        metric: String,
        comparison: Comparison,
        threshold: Threshold,
    },
    ServiceHealth {
        service: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRule {
    pub id: String,
    pub name: String,
    pub condition: RuleCondition,
    pub message: String,
    pub severity: Severity,
    #[serde(default)]
    pub notification_channels: Vec<Channel>,
    #[serde(default)]
    pub recovery_message: Option<String>,
}

impl AlertRule {
    fn metric(
        id: &str,
        name: &str,
        metric: &str,
        threshold: NamedThreshold,
        message: &str,
        severity: Severity,
        channels: &[Channel],
        recovery: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            condition: RuleCondition::Metric {
                metric: metric.to_string(),
                comparison: Comparison::GreaterOrEqual,
                threshold: Threshold::Named(threshold),
            },
            message: message.to_string(),
            severity,
            notification_channels: channels.to_vec(),
            recovery_message: Some(recovery.to_string()),
        }
    }
}

// =====================================================================================
// NOTIFICATION CHANNELS
// =====================================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    pub email: EmailChannel,
    pub sms: SmsChannel,
    pub webhook: WebhookChannel,
}

/// SMTP credentials come from the environment; this only picks recipients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmailChannel {
    pub enabled: bool,
    pub recipients: Vec<String>,
    pub subject_prefix: String,
}

impl Default for EmailChannel {
    fn default() -> Self {
        Self {
            enabled: true,
            recipients: vec!["admin@example.com".to_string()],
            subject_prefix: "[Monitoring Alert]".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SmsChannel {
    pub enabled: bool,
    pub numbers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebhookChannel {
    pub enabled: bool,
    pub urls: Vec<String>,
    pub headers: HashMap<String, String>,
    pub secret: Option<String>,
    pub timeout_secs: u64,
}

impl Default for WebhookChannel {
    fn default() -> Self {
        Self {
            enabled: false,
            urls: Vec::new(),
            headers: HashMap::new(),
            secret: None,
            timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SilenceConfig {
    pub enabled: bool,
    pub duration_secs: i64,
    pub reason: String,
    pub creator: String,
}

impl Default for SilenceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            duration_secs: 3600,
            reason: String::new(),
            creator: String::new(),
        }
    }
}

// =====================================================================================
// DEFAULTS & LOADING
// =====================================================================================

impl Default for MonitoringConfig {
    fn default() -> Self {
        use Channel::*;
        use Collection::*;
        use MetricKind::*;
        use NamedThreshold::{Critical, Warning};

        Self {
            system_name: "shop-backend".to_string(),
            enabled: true,
            collection_interval_secs: 60,
            retention_days: 30,
            history_limit: 1000,
            backend: BackendTarget::default(),
            metrics: vec![
                MetricDefinition::new("server_cpu_usage", "Server CPU usage", Percentage, Some(70.0), Some(90.0), System),
                MetricDefinition::new("server_memory_usage", "Server memory usage", Percentage, Some(75.0), Some(95.0), System),
                MetricDefinition::new("server_disk_space", "Server disk space usage", Percentage, Some(80.0), Some(90.0), System),
                MetricDefinition::new("api_response_time", "Average API response time", Milliseconds, Some(300.0), Some(500.0), Application),
                MetricDefinition::new("api_error_rate", "API error rate", Percentage, Some(2.0), Some(5.0), Application),
                MetricDefinition::new("api_request_count", "API request count", Count, None, None, Application),
                MetricDefinition::new("db_query_time", "Document store round trip", Milliseconds, Some(50.0), Some(100.0), Application),
                MetricDefinition::new("frontend_page_load_time", "Frontend page load time", Milliseconds, Some(2000.0), Some(3000.0), Frontend),
                MetricDefinition::new("frontend_error_count", "Frontend error count", Count, Some(10.0), Some(50.0), Frontend),
            ],
            rules: vec![
                AlertRule::metric(
                    "high_cpu_usage", "High CPU usage", "server_cpu_usage", Critical,
                    "Server CPU usage is too high: {{value}}%", Severity::Error, &[Email, Sms],
                    "Server CPU usage is back to normal: {{value}}%",
                ),
                AlertRule::metric(
                    "high_memory_usage", "High memory usage", "server_memory_usage", Critical,
                    "Server memory usage is too high: {{value}}%", Severity::Error, &[Email, Sms],
                    "Server memory usage is back to normal: {{value}}%",
                ),
                AlertRule::metric(
                    "slow_api_response", "Slow API responses", "api_response_time", Warning,
                    "API response time is too long: {{value}}ms", Severity::Warning, &[Email],
                    "API response time is back to normal: {{value}}ms",
                ),
                AlertRule::metric(
                    "high_api_error_rate", "High API error rate", "api_error_rate", Warning,
                    "API error rate is too high: {{value}}%", Severity::Warning, &[Email],
                    "API error rate is back to normal: {{value}}%",
                ),
                AlertRule {
                    id: "backend_service_down".to_string(),
                    name: "Backend service down".to_string(),
                    condition: RuleCondition::ServiceHealth {
                        service: "backend".to_string(),
                    },
                    message: "Backend service is unavailable, check it immediately".to_string(),
                    severity: Severity::Error,
                    notification_channels: vec![Email, Sms, Webhook],
                    recovery_message: Some("Backend service has recovered".to_string()),
                },
                AlertRule::metric(
                    "frontend_page_load_slow", "Slow frontend page loads", "frontend_page_load_time", Warning,
                    "Frontend page load time is too long: {{value}}ms", Severity::Warning, &[Email],
                    "Frontend page load time is back to normal: {{value}}ms",
                ),
            ],
            notifications: NotificationSettings::default(),
            silence: SilenceConfig::default(),
        }
    }
}

impl MonitoringConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MonitoringError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| MonitoringError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Loads the rule set from `path` when given, falling back to the
    /// built-in rules when the file is missing or malformed.
    pub fn load_or_default(path: Option<&str>) -> Self {
        match path {
            None => Self::default(),
            Some(path) => match Self::from_file(path) {
                Ok(config) => {
                    info!("Loaded monitoring config from {}", path);
                    config
                }
                Err(e) => {
                    warn!("{}, using built-in monitoring rules", e);
                    Self::default()
                }
            },
        }
    }

    pub fn metric(&self, name: &str) -> Option<&MetricDefinition> {
        self.metrics.iter().find(|m| m.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_rules_reference_known_metrics() {
        let config = MonitoringConfig::default();
        for rule in &config.rules {
            if let RuleCondition::Metric { metric, threshold, .. } = &rule.condition {
                let definition = config.metric(metric);
                assert!(definition.is_some(), "rule {} has no metric", rule.id);
                assert!(threshold.resolve(definition).is_some());
            }
        }
    }

    #[test]
    fn comparisons() {
        assert!(Comparison::GreaterOrEqual.holds(90.0, 90.0));
        assert!(!Comparison::Greater.holds(90.0, 90.0));
        assert!(Comparison::Less.holds(1.0, 2.0));
        assert!(Comparison::LessOrEqual.holds(2.0, 2.0));
        assert!(Comparison::Equal.holds(0.5, 0.5));
        assert!(Comparison::NotEqual.holds(0.5, 0.6));
    }

    #[test]
    fn thresholds_parse_named_or_literal() {
        let named: Threshold = serde_json::from_str("\"criticalThreshold\"").unwrap();
        let literal: Threshold = serde_json::from_str("42.5").unwrap();
        assert_eq!(named, Threshold::Named(NamedThreshold::Critical));
        assert_eq!(literal, Threshold::Value(42.5));
        assert!(serde_json::from_str::<Threshold>("\"medianThreshold\"").is_err());
    }

    #[test]
    fn named_threshold_without_definition_is_unresolved() {
        let definition = MetricDefinition::new("x", "", MetricKind::Count, None, None, Collection::Application);
        assert_eq!(Threshold::Named(NamedThreshold::Warning).resolve(Some(&definition)), None);
        assert_eq!(Threshold::Named(NamedThreshold::Warning).resolve(None), None);
        assert_eq!(Threshold::Value(3.0).resolve(None), Some(3.0));
    }

    #[test]
    fn loads_partial_file_over_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "systemName": "staging",
                "collectionIntervalSecs": 15,
                "rules": [{{
                    "id": "errors",
                    "name": "Errors",
                    "condition": {{"type": "metric", "metric": "api_error_rate", "comparison": ">", "threshold": 1}},
                    "message": "Error rate {{{{value}}}}%",
                    "severity": "ERROR",
                    "notificationChannels": ["webhook"]
                }}],
                "notifications": {{"webhook": {{"enabled": true, "urls": ["http://hooks.local"]}}}}
            }}"#
        )
        .unwrap();

        let config = MonitoringConfig::from_file(file.path()).unwrap();

        assert_eq!(config.system_name, "staging");
        assert_eq!(config.collection_interval_secs, 15);
        assert_eq!(config.history_limit, 1000);
        assert_eq!(config.rules.len(), 1);
        assert_eq!(config.rules[0].message, "Error rate {{value}}%");
        assert_eq!(config.rules[0].notification_channels, vec![Channel::Webhook]);
        assert!(config.notifications.webhook.enabled);
        assert_eq!(config.notifications.webhook.timeout_secs, 5);
        assert!(config.notifications.email.enabled);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let path = file.path().to_string_lossy().to_string();
        assert!(MonitoringConfig::from_file(&path).is_err());

        let config = MonitoringConfig::load_or_default(Some(&path));
        assert_eq!(config.rules.len(), MonitoringConfig::default().rules.len());
    }
}
