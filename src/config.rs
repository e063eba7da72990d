use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    pub blobs: BlobConfig,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize)]
pub struct BlobConfig {
    pub endpoint: Option<String>,
    pub region: String,
    pub bucket: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EventsConfig {
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        EventsConfig {
            capacity: default_event_capacity(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    /// Age in days after which inspections and their images expire
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Shorter window for cached analytics snapshots
    #[serde(default = "default_analytics_retention_days")]
    pub analytics_retention_days: u32,

    #[serde(default = "default_sweep_interval_hours")]
    pub sweep_interval_hours: u64,

    #[serde(default = "default_startup_delay_seconds")]
    pub startup_delay_seconds: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        RetentionConfig {
            retention_days: default_retention_days(),
            analytics_retention_days: default_analytics_retention_days(),
            sweep_interval_hours: default_sweep_interval_hours(),
            startup_delay_seconds: default_startup_delay_seconds(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path; console-only when absent
    pub file: Option<String>,

    /// Size at which the log file rolls over, in megabytes
    #[serde(default = "default_log_roll_mb")]
    pub roll_size_mb: u64,

    /// How many rolled files to keep before the oldest is dropped
    #[serde(default = "default_log_keep_files")]
    pub keep_files: usize,
}

fn default_event_capacity() -> usize {
    256
}

fn default_retention_days() -> u32 {
    90
}

fn default_analytics_retention_days() -> u32 {
    30
}

fn default_sweep_interval_hours() -> u64 {
    24
}

fn default_startup_delay_seconds() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_roll_mb() -> u64 {
    50
}

fn default_log_keep_files() -> usize {
    5
}

pub fn load_config(path: &str) -> Result<Config> {
    let config_text = fs::read_to_string(Path::new(path))?;
    let config: Config = toml::from_str(&config_text)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let config: Config = toml::from_str(
            r#"
            [store]
            db_path = "data/inspections.db"

            [blobs]
            region = "us-east-1"
            bucket = "inspection-images"
            "#,
        )
        .unwrap();

        assert_eq!(config.retention.retention_days, 90);
        assert_eq!(config.retention.analytics_retention_days, 30);
        assert_eq!(config.retention.sweep_interval_hours, 24);
        assert_eq!(config.retention.startup_delay_seconds, 60);
        assert_eq!(config.events.capacity, 256);
        assert!(config.logging.is_none());
    }

    #[test]
    fn retention_overrides_are_honored() {
        let config: Config = toml::from_str(
            r#"
            [store]
            db_path = ":memory:"

            [blobs]
            region = "eu-west-1"
            bucket = "images"
            endpoint = "http://localhost:9000"

            [retention]
            retention_days = 30
            analytics_retention_days = 7
            "#,
        )
        .unwrap();

        assert_eq!(config.retention.retention_days, 30);
        assert_eq!(config.retention.analytics_retention_days, 7);
        assert_eq!(config.retention.sweep_interval_hours, 24);
        assert_eq!(
            config.blobs.endpoint.as_deref(),
            Some("http://localhost:9000")
        );
    }

    #[test]
    fn logging_section_fills_in_rolling_defaults() {
        let config: Config = toml::from_str(
            r#"
            [store]
            db_path = ":memory:"

            [blobs]
            region = "us-east-1"
            bucket = "images"

            [logging]
            file = "logs/railtrace.log"
            "#,
        )
        .unwrap();

        let logging = config.logging.unwrap();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.file.as_deref(), Some("logs/railtrace.log"));
        assert_eq!(logging.roll_size_mb, 50);
        assert_eq!(logging.keep_files, 5);
    }
}
