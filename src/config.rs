//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and field has a default, so an empty file (or no file at
//! all) gives the stock wiring.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::bridge::{DEFAULT_OFFBOARD_MODE, DEFAULT_THRUST_SCALE};
use crate::error::{BridgeError, Result};

/// Largest queue depth accepted for any topic
const MAX_QUEUE_DEPTH: usize = 1000;

/// Log levels accepted in `[logging]`
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub topics: TopicConfig,
    #[serde(default)]
    pub queues: QueueConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Conversion settings
#[derive(Debug, Deserialize, Clone)]
pub struct BridgeConfig {
    /// Multiplier from body thrust to normalized controller thrust
    #[serde(default = "default_thrust_scale")]
    pub thrust_scale: f64,

    /// Mode name in which the command interface counts as enabled
    #[serde(default = "default_offboard_mode")]
    pub offboard_mode: String,

    #[serde(default = "default_vehicle_name")]
    pub vehicle_name: String,

    #[serde(default = "default_vehicle_type")]
    pub vehicle_type: String,
}

/// Topic names
#[derive(Debug, Deserialize, Clone)]
pub struct TopicConfig {
    // Generic interface
    #[serde(default = "default_rate_thrust_topic")]
    pub rate_thrust: String,

    #[serde(default = "default_roll_pitch_yawrate_thrust_topic")]
    pub roll_pitch_yawrate_thrust: String,

    #[serde(default = "default_status_topic")]
    pub status: String,

    #[serde(default = "default_rc_topic")]
    pub rc: String,

    // Flight controller interface
    #[serde(default = "default_attitude_target_topic")]
    pub attitude_target: String,

    #[serde(default = "default_rc_in_topic")]
    pub rc_in: String,

    #[serde(default = "default_state_topic")]
    pub state: String,

    #[serde(default = "default_battery_topic")]
    pub battery: String,

    #[serde(default = "default_altitude_topic")]
    pub altitude: String,

    #[serde(default = "default_imu_topic")]
    pub imu: String,
}

/// Queue depths per topic group
#[derive(Debug, Deserialize, Clone)]
pub struct QueueConfig {
    /// Inbound generic commands
    #[serde(default = "default_command_in_depth")]
    pub command_in: usize,

    /// Inbound controller telemetry
    #[serde(default = "default_telemetry_in_depth")]
    pub telemetry_in: usize,

    /// Outbound attitude targets
    #[serde(default = "default_command_out_depth")]
    pub command_out: usize,

    /// Outbound status snapshots
    #[serde(default = "default_latest_value_depth")]
    pub status_out: usize,

    /// Outbound joystick axes
    #[serde(default = "default_latest_value_depth")]
    pub rc_out: usize,
}

/// Record log configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_thrust_scale() -> f64 { DEFAULT_THRUST_SCALE }
fn default_offboard_mode() -> String { DEFAULT_OFFBOARD_MODE.to_string() }
fn default_vehicle_name() -> String { "no type".to_string() }
fn default_vehicle_type() -> String { "no name".to_string() }

fn default_rate_thrust_topic() -> String { "command/rate_thrust".to_string() }
fn default_roll_pitch_yawrate_thrust_topic() -> String { "/shafter3/command/roll_pitch_yawrate_thrust".to_string() }
fn default_status_topic() -> String { "status".to_string() }
fn default_rc_topic() -> String { "rc".to_string() }
fn default_attitude_target_topic() -> String { "/shafter3/mavros/setpoint_raw/attitude".to_string() }
fn default_rc_in_topic() -> String { "/shafter3/mavros/rc/in".to_string() }
fn default_state_topic() -> String { "/shafter3/mavros/state".to_string() }
fn default_battery_topic() -> String { "/shafter3/mavros/battery".to_string() }
fn default_altitude_topic() -> String { "/shafter3/mavros/altitude".to_string() }
fn default_imu_topic() -> String { "/shafter3/mavros/imu/data".to_string() }

fn default_command_in_depth() -> usize { 5 }
fn default_telemetry_in_depth() -> usize { 5 }
fn default_command_out_depth() -> usize { 10 }
fn default_latest_value_depth() -> usize { 1 }

fn default_telemetry_enabled() -> bool { false }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }

fn default_log_level() -> String { "info".to_string() }

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            thrust_scale: default_thrust_scale(),
            offboard_mode: default_offboard_mode(),
            vehicle_name: default_vehicle_name(),
            vehicle_type: default_vehicle_type(),
        }
    }
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            rate_thrust: default_rate_thrust_topic(),
            roll_pitch_yawrate_thrust: default_roll_pitch_yawrate_thrust_topic(),
            status: default_status_topic(),
            rc: default_rc_topic(),
            attitude_target: default_attitude_target_topic(),
            rc_in: default_rc_in_topic(),
            state: default_state_topic(),
            battery: default_battery_topic(),
            altitude: default_altitude_topic(),
            imu: default_imu_topic(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            command_in: default_command_in_depth(),
            telemetry_in: default_telemetry_in_depth(),
            command_out: default_command_out_depth(),
            status_out: default_latest_value_depth(),
            rc_out: default_latest_value_depth(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl TopicConfig {
    /// Inbound topic names, in routing order
    #[must_use]
    pub fn inbound(&self) -> [&str; 7] {
        [
            self.rate_thrust.as_str(),
            self.roll_pitch_yawrate_thrust.as_str(),
            self.rc_in.as_str(),
            self.state.as_str(),
            self.battery.as_str(),
            self.altitude.as_str(),
            self.imu.as_str(),
        ]
    }

    /// Outbound topic names
    #[must_use]
    pub fn outbound(&self) -> [&str; 3] {
        [self.attitude_target.as_str(), self.status.as_str(), self.rc.as_str()]
    }
}

fn invalid(msg: impl std::fmt::Display) -> BridgeError {
    BridgeError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use px4_bridge::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    ///
    /// # Examples
    ///
    /// ```
    /// use px4_bridge::config::Config;
    ///
    /// let config = Config::from_toml("[bridge]\nthrust_scale = 0.05\n")?;
    /// assert_eq!(config.bridge.thrust_scale, 0.05);
    /// assert_eq!(config.topics.status, "status");
    /// # Ok::<(), px4_bridge::error::BridgeError>(())
    /// ```
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        // Bridge settings
        if !self.bridge.thrust_scale.is_finite() {
            return Err(invalid("thrust_scale must be a finite number"));
        }

        if self.bridge.offboard_mode.is_empty() {
            return Err(invalid("offboard_mode cannot be empty"));
        }

        // Topic names
        for name in self.topics.inbound().iter().chain(self.topics.outbound().iter()) {
            if name.is_empty() {
                return Err(invalid("topic names cannot be empty"));
            }
        }

        let inbound = self.topics.inbound();
        for (i, name) in inbound.iter().enumerate() {
            if inbound[i + 1..].contains(name) {
                return Err(invalid(format!("inbound topic {} is used more than once", name)));
            }
        }

        let outbound = self.topics.outbound();
        for (i, name) in outbound.iter().enumerate() {
            if outbound[i + 1..].contains(name) {
                return Err(invalid(format!("outbound topic {} is used more than once", name)));
            }
        }

        // Queue depths
        for (name, depth) in [
            ("command_in", self.queues.command_in),
            ("telemetry_in", self.queues.telemetry_in),
            ("command_out", self.queues.command_out),
            ("status_out", self.queues.status_out),
            ("rc_out", self.queues.rc_out),
        ] {
            if depth == 0 || depth > MAX_QUEUE_DEPTH {
                return Err(invalid(format!(
                    "{} queue depth must be between 1 and {}",
                    name, MAX_QUEUE_DEPTH
                )));
            }
        }

        // Record log
        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(invalid("telemetry log_dir cannot be empty when enabled"));
        }

        if self.telemetry.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }

        if self.telemetry.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }

        // Logging
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(invalid(format!(
                "logging level must be one of: {}",
                LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = Config::from_toml("").unwrap();

        assert_eq!(config.bridge.thrust_scale, 0.030);
        assert_eq!(config.bridge.offboard_mode, "OFFBOARD");
        assert_eq!(config.topics.rate_thrust, "command/rate_thrust");
        assert_eq!(config.queues.command_out, 10);
        assert!(!config.telemetry.enabled);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[bridge]
thrust_scale = 0.025

[topics]
state = "/uav1/mavros/state"

[queues]
command_in = 8

[telemetry]
enabled = true
log_dir = "/tmp/px4-bridge"

[logging]
level = "debug"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.bridge.thrust_scale, 0.025);
        assert_eq!(config.bridge.offboard_mode, "OFFBOARD");
        assert_eq!(config.topics.state, "/uav1/mavros/state");
        assert_eq!(config.topics.imu, "/shafter3/mavros/imu/data");
        assert_eq!(config.queues.command_in, 8);
        assert_eq!(config.queues.telemetry_in, 5);
        assert!(config.telemetry.enabled);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/px4-bridge.toml");
        assert!(matches!(result, Err(BridgeError::Io(_))));
    }

    #[test]
    fn test_load_malformed_toml() {
        let result = Config::from_toml("[bridge\nthrust_scale = ");
        assert!(matches!(result, Err(BridgeError::Config(_))));
    }

    #[test]
    fn test_wrong_type_rejected() {
        let result = Config::from_toml("[bridge]\nthrust_scale = \"fast\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_non_finite_thrust_scale() {
        let mut config = Config::default();
        config.bridge.thrust_scale = f64::NAN;
        assert!(config.validate().is_err());

        config.bridge.thrust_scale = f64::INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_thrust_scale_allowed() {
        let mut config = Config::default();
        config.bridge.thrust_scale = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_offboard_mode() {
        let mut config = Config::default();
        config.bridge.offboard_mode = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_topic_name() {
        let mut config = Config::default();
        config.topics.battery = String::new();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.topics.rc = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_inbound_topic() {
        let mut config = Config::default();
        config.topics.altitude = config.topics.battery.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_outbound_topic() {
        let mut config = Config::default();
        config.topics.rc = config.topics.status.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_queue_depth_zero() {
        let mut config = Config::default();
        config.queues.status_out = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_queue_depth_too_high() {
        let mut config = Config::default();
        config.queues.command_in = 1001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_dir_when_enabled() {
        let mut config = Config::default();
        config.telemetry.enabled = true;
        config.telemetry.log_dir = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_dir_when_disabled() {
        let mut config = Config::default();
        config.telemetry.enabled = false;
        config.telemetry.log_dir = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_max_records_per_file_zero() {
        let mut config = Config::default();
        config.telemetry.max_records_per_file = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_files_to_keep_zero() {
        let mut config = Config::default();
        config.telemetry.max_files_to_keep = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_log_levels() {
        for level in LOG_LEVELS {
            let mut config = Config::default();
            config.logging.level = level.to_string();
            assert!(config.validate().is_ok(), "Log level {} should be valid", level);
        }
    }

    #[test]
    fn test_inbound_and_outbound_lists() {
        let topics = TopicConfig::default();
        assert_eq!(topics.inbound().len(), 7);
        assert_eq!(topics.outbound(), ["/shafter3/mavros/setpoint_raw/attitude", "status", "rc"]);
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_thrust_scale(), 0.030);
        assert_eq!(default_offboard_mode(), "OFFBOARD");
        assert_eq!(default_vehicle_name(), "no type");
        assert_eq!(default_vehicle_type(), "no name");
        assert_eq!(default_rate_thrust_topic(), "command/rate_thrust");
        assert_eq!(default_roll_pitch_yawrate_thrust_topic(), "/shafter3/command/roll_pitch_yawrate_thrust");
        assert_eq!(default_status_topic(), "status");
        assert_eq!(default_rc_topic(), "rc");
        assert_eq!(default_attitude_target_topic(), "/shafter3/mavros/setpoint_raw/attitude");
        assert_eq!(default_rc_in_topic(), "/shafter3/mavros/rc/in");
        assert_eq!(default_state_topic(), "/shafter3/mavros/state");
        assert_eq!(default_battery_topic(), "/shafter3/mavros/battery");
        assert_eq!(default_altitude_topic(), "/shafter3/mavros/altitude");
        assert_eq!(default_imu_topic(), "/shafter3/mavros/imu/data");
        assert_eq!(default_command_in_depth(), 5);
        assert_eq!(default_telemetry_in_depth(), 5);
        assert_eq!(default_command_out_depth(), 10);
        assert_eq!(default_latest_value_depth(), 1);
        assert_eq!(default_telemetry_enabled(), false);
        assert_eq!(default_log_dir(), "./logs");
        assert_eq!(default_max_records_per_file(), 10000);
        assert_eq!(default_max_files_to_keep(), 10);
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let shipped = Config::from_toml(include_str!("../config/default.toml")).unwrap();
        let defaults = Config::default();

        assert_eq!(shipped.bridge.thrust_scale, defaults.bridge.thrust_scale);
        assert_eq!(shipped.bridge.offboard_mode, defaults.bridge.offboard_mode);
        assert_eq!(shipped.bridge.vehicle_name, defaults.bridge.vehicle_name);
        assert_eq!(shipped.bridge.vehicle_type, defaults.bridge.vehicle_type);
        assert_eq!(shipped.topics.inbound(), defaults.topics.inbound());
        assert_eq!(shipped.topics.outbound(), defaults.topics.outbound());
        assert_eq!(shipped.queues.command_out, defaults.queues.command_out);
        assert_eq!(shipped.queues.status_out, defaults.queues.status_out);
        assert_eq!(shipped.telemetry.enabled, defaults.telemetry.enabled);
        assert_eq!(shipped.logging.level, defaults.logging.level);
    }
}
