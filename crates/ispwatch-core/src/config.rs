//! Configuration types for the ispwatch system
//!
//! This module defines the read-only inputs the engine and scheduler consume.
//! Loading is left to the embedding application (the `ispwatchd` daemon reads
//! environment variables); validation lives here.

use std::time::Duration;

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// Interval used when the configured check interval is 0
pub const DEFAULT_CHECK_INTERVAL_MINUTES: u64 = 60;

/// Longest accepted check interval (one year)
pub const MAX_CHECK_INTERVAL_MINUTES: u64 = 525_600;

/// Longest accepted heartbeat period (ten years)
pub const MAX_HEARTBEAT_INTERVAL_DAYS: u64 = 3650;

/// Main monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Primary address source queried every cycle
    pub primary_endpoint: String,

    /// Fallback sources, queried in order
    pub backup_endpoints: Vec<String>,

    /// Timer settings
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Outbound HTTP settings
    #[serde(default)]
    pub http: HttpConfig,
}

impl MonitorConfig {
    /// Create a configuration with default schedule and HTTP settings
    pub fn new(primary_endpoint: impl Into<String>, backup_endpoints: Vec<String>) -> Self {
        Self {
            primary_endpoint: primary_endpoint.into(),
            backup_endpoints,
            schedule: ScheduleConfig::default(),
            http: HttpConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.primary_endpoint.trim().is_empty() {
            return Err(crate::Error::config("Primary endpoint cannot be empty"));
        }
        validate_url("Primary endpoint", &self.primary_endpoint)?;

        if self.backup_endpoints.is_empty() {
            return Err(crate::Error::config(
                "At least one backup endpoint is required",
            ));
        }

        for (index, url) in self.backup_endpoints.iter().enumerate() {
            validate_url(&format!("Backup endpoint {}", index), url)?;
        }

        self.schedule.validate()?;
        self.http.validate()?;

        Ok(())
    }
}

fn validate_url(label: &str, url: &str) -> Result<(), crate::Error> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(crate::Error::config(format!(
            "{} must use HTTP or HTTPS scheme. Got: {}",
            label, url
        )));
    }
    Ok(())
}

/// Timer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Minutes between checks (0 means the default of 60)
    #[serde(default = "default_check_interval_minutes")]
    pub check_interval_minutes: u64,

    /// Day of week the heartbeat is anchored to
    #[serde(default = "default_heartbeat_day_of_week")]
    pub heartbeat_day_of_week: Weekday,

    /// Local time of day the heartbeat is anchored to
    #[serde(default = "default_heartbeat_time_of_day")]
    pub heartbeat_time_of_day: NaiveTime,

    /// Days between heartbeats
    #[serde(default = "default_heartbeat_interval_days")]
    pub heartbeat_interval_days: u64,
}

impl ScheduleConfig {
    /// Effective check interval in minutes (0 is treated as 60)
    pub fn check_interval_minutes(&self) -> u64 {
        if self.check_interval_minutes == 0 {
            DEFAULT_CHECK_INTERVAL_MINUTES
        } else {
            self.check_interval_minutes
        }
    }

    /// Effective check interval
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_minutes().saturating_mul(60))
    }

    /// Heartbeat period
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_days.saturating_mul(24 * 60 * 60))
    }

    /// Validate the schedule
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.heartbeat_interval_days == 0 {
            return Err(crate::Error::config("Heartbeat interval must be > 0 days"));
        }

        if self.heartbeat_interval_days > MAX_HEARTBEAT_INTERVAL_DAYS {
            return Err(crate::Error::config(format!(
                "Heartbeat interval must be <= {} days. Got: {}",
                MAX_HEARTBEAT_INTERVAL_DAYS, self.heartbeat_interval_days
            )));
        }

        if self.check_interval_minutes > MAX_CHECK_INTERVAL_MINUTES {
            return Err(crate::Error::config(format!(
                "Check interval must be <= {} minutes. Got: {}",
                MAX_CHECK_INTERVAL_MINUTES, self.check_interval_minutes
            )));
        }

        Ok(())
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            check_interval_minutes: default_check_interval_minutes(),
            heartbeat_day_of_week: default_heartbeat_day_of_week(),
            heartbeat_time_of_day: default_heartbeat_time_of_day(),
            heartbeat_interval_days: default_heartbeat_interval_days(),
        }
    }
}

/// Outbound HTTP settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl HttpConfig {
    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the HTTP settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("HTTP timeout must be > 0 seconds"));
        }
        Ok(())
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_check_interval_minutes() -> u64 {
    DEFAULT_CHECK_INTERVAL_MINUTES
}

fn default_heartbeat_day_of_week() -> Weekday {
    Weekday::Mon
}

fn default_heartbeat_time_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default()
}

fn default_heartbeat_interval_days() -> u64 {
    7
}

fn default_timeout_secs() -> u64 {
    30
}
