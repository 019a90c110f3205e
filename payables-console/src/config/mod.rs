use serde::Deserialize;
use service_core::error::AppError;
use std::time::Duration;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub server: ServerSettings,
    pub collaborator: CollaboratorSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub session: SessionSettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// The remote back-office API that owns persistence and business rules.
#[derive(Deserialize, Clone, Debug)]
pub struct CollaboratorSettings {
    /// Base URL, e.g. `http://backoffice-api:8000`.
    pub base_url: String,
    /// Per-request timeout. Unset means transport defaults apply.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl CollaboratorSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout_secs: None,
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP gRPC endpoint (e.g. `http://tempo:4317`). Export is off when unset.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Deserialize, Clone, Debug)]
pub struct SessionSettings {
    #[serde(default = "default_inactivity_hours")]
    pub inactivity_hours: i64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            inactivity_hours: default_inactivity_hours(),
        }
    }
}

fn default_inactivity_hours() -> i64 {
    24
}

pub fn get_configuration() -> Result<Settings, AppError> {
    service_core::config::load_settings("payables-console")
}
