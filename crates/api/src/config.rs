use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use domain::models::RiskLevel;
use domain::services::{
    EngineSettings, EscalationTimings, NotificationPermission, SoundSet, SoundSource,
};
use persistence::repositories::TestZoneConfig;
use persistence::sources::{ZoneSourceConfig, ZoneSourceKind};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub escalation: EscalationConfig,
    #[serde(default)]
    pub zones: ZonesConfig,
    #[serde(default)]
    pub alarm: AlarmConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub dialer: DialerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Grace period for background work on shutdown.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EscalationConfig {
    /// Time the user has to answer before the alarm starts.
    #[serde(default = "default_response_secs")]
    pub response_secs: u64,

    /// Alarm time before the emergency call is placed.
    #[serde(default = "default_auto_sos_secs")]
    pub auto_sos_secs: u64,

    /// Suppress re-entry into a zone just marked safe (0 disables).
    #[serde(default = "default_reentry_cooldown_secs")]
    pub reentry_cooldown_secs: u64,

    #[serde(default = "default_emergency_number")]
    pub emergency_number: String,

    /// Driver wake-up interval while a countdown is visible.
    #[serde(default = "default_countdown_tick_ms")]
    pub countdown_tick_ms: u64,

    /// Drop location samples captured longer ago than this (0 disables).
    #[serde(default = "default_max_sample_age_secs")]
    pub max_sample_age_secs: u64,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            response_secs: default_response_secs(),
            auto_sos_secs: default_auto_sos_secs(),
            reentry_cooldown_secs: default_reentry_cooldown_secs(),
            emergency_number: default_emergency_number(),
            countdown_tick_ms: default_countdown_tick_ms(),
            max_sample_age_secs: default_max_sample_age_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZonesConfig {
    /// Zone data source: file or http
    #[serde(default = "default_zone_source")]
    pub source: String,

    #[serde(default = "default_zone_path")]
    pub path: String,

    /// Endpoint URL (required for the http source)
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_zone_timeout")]
    pub timeout_secs: u64,

    /// Synthetic zone appended to the dataset for field testing
    #[serde(default)]
    pub test_zone: Option<TestZoneSettings>,
}

impl Default for ZonesConfig {
    fn default() -> Self {
        Self {
            source: default_zone_source(),
            path: default_zone_path(),
            url: String::new(),
            timeout_secs: default_zone_timeout(),
            test_zone: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestZoneSettings {
    #[serde(default = "default_test_zone_name")]
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default = "default_test_zone_risk")]
    pub risk_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlarmConfig {
    /// Alarm player: console or command
    #[serde(default = "default_alarm_player")]
    pub player: String,

    /// Program started for each sound (command player)
    #[serde(default)]
    pub command: String,

    /// Arguments; `{source}` is replaced with the sound location
    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub primary: String,

    #[serde(default)]
    pub secondary: String,

    /// Frequency of the last-resort inline tone
    #[serde(default = "default_tone_hz")]
    pub tone_hz: u32,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            player: default_alarm_player(),
            command: String::new(),
            args: Vec::new(),
            primary: String::new(),
            secondary: String::new(),
            tone_hz: default_tone_hz(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsConfig {
    /// Notification provider: console or http
    #[serde(default = "default_console_provider")]
    pub provider: String,

    #[serde(default)]
    pub url: String,

    /// Initial permission state: granted, denied, prompt or unsupported
    #[serde(default = "default_notification_permission")]
    pub permission: String,

    #[serde(default = "default_outbound_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            provider: default_console_provider(),
            url: String::new(),
            permission: default_notification_permission(),
            timeout_ms: default_outbound_timeout_ms(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DialerConfig {
    /// Dialer provider: console or webhook
    #[serde(default = "default_console_provider")]
    pub provider: String,

    #[serde(default)]
    pub url: String,

    #[serde(default = "default_outbound_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for DialerConfig {
    fn default() -> Self {
        Self {
            provider: default_console_provider(),
            url: String::new(),
            timeout_ms: default_outbound_timeout_ms(),
            max_retries: default_max_retries(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_shutdown_timeout() -> u64 {
    10
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_response_secs() -> u64 {
    30
}
fn default_auto_sos_secs() -> u64 {
    20
}
fn default_reentry_cooldown_secs() -> u64 {
    120
}
fn default_max_sample_age_secs() -> u64 {
    60
}
fn default_emergency_number() -> String {
    "112".to_string()
}
fn default_countdown_tick_ms() -> u64 {
    1000
}
fn default_zone_source() -> String {
    "file".to_string()
}
fn default_zone_path() -> String {
    "data/zones.json".to_string()
}
fn default_zone_timeout() -> u64 {
    10
}
fn default_test_zone_name() -> String {
    "Test Zone".to_string()
}
fn default_test_zone_risk() -> String {
    "critical".to_string()
}
fn default_alarm_player() -> String {
    "console".to_string()
}
fn default_tone_hz() -> u32 {
    880
}
fn default_console_provider() -> String {
    "console".to_string()
}
fn default_notification_permission() -> String {
    "prompt".to_string()
}
fn default_outbound_timeout_ms() -> u64 {
    10000
}
fn default_max_retries() -> u32 {
    3
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with ZG__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("ZG").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// This method creates a config entirely from defaults and overrides,
    /// without relying on config files (which may not be accessible during tests).
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        // Embed defaults directly to avoid file system dependency in tests
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30

            [logging]
            level = "info"
            format = "json"

            [escalation]
            response_secs = 30
            auto_sos_secs = 20
            reentry_cooldown_secs = 120
            emergency_number = "112"
            max_sample_age_secs = 60

            [zones]
            source = "file"
            path = "data/zones.json"

            [alarm]
            player = "console"

            [notifications]
            provider = "console"
            permission = "prompt"

            [dialer]
            provider = "console"
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        // Skip validation in tests to allow partial configs
        Ok(cfg)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        // Validate port range
        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.escalation.response_secs == 0 || self.escalation.auto_sos_secs == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Escalation windows must be at least one second".to_string(),
            ));
        }

        if self.escalation.emergency_number.trim().is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "escalation.emergency_number".to_string(),
            ));
        }

        self.zone_source_config()?;

        if let Some(test_zone) = &self.zones.test_zone {
            if RiskLevel::parse(&test_zone.risk_level).is_none() {
                return Err(ConfigValidationError::InvalidValue(format!(
                    "Unknown test zone risk level '{}'",
                    test_zone.risk_level
                )));
            }
            if shared::Coordinate::checked(test_zone.lat, test_zone.lng).is_err() {
                return Err(ConfigValidationError::InvalidValue(
                    "Test zone coordinates are out of range".to_string(),
                ));
            }
        }

        match self.alarm.player.as_str() {
            "console" => {}
            "command" if self.alarm.command.trim().is_empty() => {
                return Err(ConfigValidationError::MissingRequired(
                    "alarm.command is required for the command player".to_string(),
                ));
            }
            "command" => {}
            other => {
                return Err(ConfigValidationError::InvalidValue(format!(
                    "Unknown alarm player '{other}'"
                )));
            }
        }

        match self.notifications.provider.as_str() {
            "console" => {}
            "http" if self.notifications.url.is_empty() => {
                return Err(ConfigValidationError::MissingRequired(
                    "notifications.url is required for the http provider".to_string(),
                ));
            }
            "http" => {}
            other => {
                return Err(ConfigValidationError::InvalidValue(format!(
                    "Unknown notification provider '{other}'"
                )));
            }
        }
        if NotificationPermission::parse(&self.notifications.permission).is_none() {
            return Err(ConfigValidationError::InvalidValue(format!(
                "Unknown notification permission '{}'",
                self.notifications.permission
            )));
        }

        match self.dialer.provider.as_str() {
            "console" => {}
            "webhook" if self.dialer.url.is_empty() => {
                return Err(ConfigValidationError::MissingRequired(
                    "dialer.url is required for the webhook provider".to_string(),
                ));
            }
            "webhook" => {}
            other => {
                return Err(ConfigValidationError::InvalidValue(format!(
                    "Unknown dialer provider '{other}'"
                )));
            }
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            timings: EscalationTimings {
                response_window: Duration::from_secs(self.escalation.response_secs),
                auto_sos_window: Duration::from_secs(self.escalation.auto_sos_secs),
            },
            reentry_cooldown: Duration::from_secs(self.escalation.reentry_cooldown_secs),
            max_sample_age: Duration::from_secs(self.escalation.max_sample_age_secs),
        }
    }

    pub fn countdown_tick(&self) -> Duration {
        Duration::from_millis(self.escalation.countdown_tick_ms.max(1))
    }

    pub fn zone_source_config(&self) -> Result<ZoneSourceConfig, ConfigValidationError> {
        let kind = ZoneSourceKind::parse(&self.zones.source).ok_or_else(|| {
            ConfigValidationError::InvalidValue(format!(
                "Unknown zone source '{}'",
                self.zones.source
            ))
        })?;

        if kind == ZoneSourceKind::Http && self.zones.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "zones.url is required for the http source".to_string(),
            ));
        }

        Ok(ZoneSourceConfig {
            kind,
            path: PathBuf::from(&self.zones.path),
            url: Some(self.zones.url.clone()).filter(|u| !u.is_empty()),
            timeout_secs: self.zones.timeout_secs,
        })
    }

    pub fn test_zone(&self) -> Option<TestZoneConfig> {
        let settings = self.zones.test_zone.as_ref()?;
        Some(TestZoneConfig {
            name: settings.name.clone(),
            lat: settings.lat,
            lng: settings.lng,
            risk_level: RiskLevel::parse(&settings.risk_level).unwrap_or(RiskLevel::Critical),
        })
    }

    pub fn notification_permission(&self) -> NotificationPermission {
        NotificationPermission::parse(&self.notifications.permission).unwrap_or_default()
    }

    pub fn sound_set(&self) -> SoundSet {
        let asset = |location: &str| {
            Some(location.trim())
                .filter(|l| !l.is_empty())
                .map(|l| SoundSource::Asset(l.to_string()))
        };
        SoundSet {
            primary: asset(&self.alarm.primary),
            secondary: asset(&self.alarm.secondary),
            inline: SoundSource::Tone {
                frequency_hz: self.alarm.tone_hz,
            },
        }
    }
}
