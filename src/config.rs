//! Configuration for the presence lock agent.

use crate::bus::PERSON_SENSOR_I2C_ADDRESS;
use crate::core::{ClassifierConfig, PresenceThresholds, MAX_TIMEOUT_COUNT};
use crate::hid::Platform;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration for the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pause between sensor polls; all timeouts are counted in polls
    #[serde(with = "duration_millis", rename = "poll_interval_ms")]
    pub poll_interval: Duration,

    /// Longest a single bus read may block
    #[serde(with = "duration_millis", rename = "read_timeout_ms")]
    pub read_timeout: Duration,

    /// How long the user must be gone before locking
    #[serde(with = "duration_millis", rename = "main_face_timeout_ms")]
    pub main_face_timeout: Duration,

    /// How long an onlooker must be present before minimizing
    #[serde(with = "duration_millis", rename = "lookie_loo_timeout_ms")]
    pub lookie_loo_timeout: Duration,

    /// Face size and confidence thresholds
    pub classifier: ClassifierConfig,

    /// Host platform, which decides the key chords
    pub platform: Platform,

    /// Sensor bus settings
    pub bus: BusConfig,

    /// HID gadget device used to send key chords
    pub hid_device: PathBuf,

    /// What to do with frames whose checksum does not match
    pub checksum_policy: ChecksumPolicy,

    /// Path for persisted statistics
    pub data_path: PathBuf,

    /// Whether the agent is currently paused
    pub paused: bool,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("presence-lock");

        Self {
            poll_interval: Duration::from_millis(200),
            read_timeout: Duration::from_secs(1),
            main_face_timeout: Duration::from_secs(5),
            lookie_loo_timeout: Duration::from_secs(1),
            classifier: ClassifierConfig::default(),
            platform: Platform::default(),
            bus: BusConfig::default(),
            hid_device: PathBuf::from("/dev/hidg0"),
            checksum_policy: ChecksumPolicy::default(),
            data_path: data_dir,
            paused: false,
        }
    }
}

impl Config {
    /// Load configuration from `path`, falling back to defaults if it is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Flip the `paused` flag in the file at `path`, keeping every other setting.
    ///
    /// A file that exists but cannot be read or parsed is left untouched.
    pub fn set_paused(path: &Path, paused: bool) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.paused = paused;
        config.save_to(path)?;
        Ok(config)
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("presence-lock")
            .join("config.json")
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path).map_err(|e| ConfigError::IoError(e.to_string()))
    }

    /// Path of the persisted statistics file.
    pub fn stats_path(&self) -> PathBuf {
        self.data_path.join("stats.json")
    }

    /// Poll counts at which actions fire.
    pub fn presence_thresholds(&self) -> Result<PresenceThresholds, ConfigError> {
        PresenceThresholds::from_timeouts(
            self.main_face_timeout,
            self.lookie_loo_timeout,
            self.poll_interval,
        )
        .ok_or_else(|| {
            ConfigError::Invalid(format!(
                "timeouts must span at most {MAX_TIMEOUT_COUNT} polls of {} ms",
                self.poll_interval.as_millis()
            ))
        })
    }

    /// Reject settings the state machine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.read_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "read_timeout_ms must be greater than zero".to_string(),
            ));
        }

        let thresholds = self.presence_thresholds()?;
        if thresholds.main_face_timeout_count == 0 {
            return Err(ConfigError::Invalid(format!(
                "main_face_timeout_ms ({}) is shorter than one poll interval ({} ms)",
                self.main_face_timeout.as_millis(),
                self.poll_interval.as_millis()
            )));
        }
        if thresholds.lookie_loo_timeout_count == 0 {
            return Err(ConfigError::Invalid(format!(
                "lookie_loo_timeout_ms ({}) is shorter than one poll interval ({} ms)",
                self.lookie_loo_timeout.as_millis(),
                self.poll_interval.as_millis()
            )));
        }
        Ok(())
    }
}

/// Sensor bus settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// I2C character device
    pub device: PathBuf,
    /// 7-bit sensor address
    pub address: u8,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from("/dev/i2c-1"),
            address: PERSON_SENSOR_I2C_ADDRESS,
        }
    }
}

/// Handling of frames whose checksum does not match their contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumPolicy {
    /// Do not check.
    Ignore,
    /// Check, log mismatches, and use the frame anyway.
    #[default]
    Warn,
    /// Check and drop mismatching frames without advancing the counters.
    Discard,
}

impl std::str::FromStr for ChecksumPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ignore" => Ok(ChecksumPolicy::Ignore),
            "warn" => Ok(ChecksumPolicy::Warn),
            "discard" => Ok(ChecksumPolicy::Discard),
            other => Err(format!(
                "unknown checksum policy '{other}' (expected ignore, warn or discard)"
            )),
        }
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration as whole milliseconds.
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("presence-lock-config-test-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.poll_interval, Duration::from_millis(200));
        assert_eq!(config.main_face_timeout, Duration::from_secs(5));
        assert_eq!(config.lookie_loo_timeout, Duration::from_secs(1));
        assert_eq!(config.bus.address, 0x62);
        assert_eq!(config.platform, Platform::Windows);
        assert_eq!(config.checksum_policy, ChecksumPolicy::Warn);
        assert!(!config.paused);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_thresholds() {
        let thresholds = Config::default().presence_thresholds().unwrap();
        assert_eq!(thresholds.main_face_timeout_count, 25);
        assert_eq!(thresholds.lookie_loo_timeout_count, 5);
    }

    #[test]
    fn test_validate_rejects_zero_thresholds() {
        let config = Config {
            lookie_loo_timeout: Duration::from_millis(100),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = Config {
            poll_interval: Duration::ZERO,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_timeouts_too_long_to_count() {
        let config = Config {
            poll_interval: Duration::from_millis(1),
            main_face_timeout: Duration::from_millis(u64::MAX / 2),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        assert!(config.presence_thresholds().is_err());

        let config = Config {
            poll_interval: Duration::from_millis(1),
            lookie_loo_timeout: Duration::from_millis(u64::from(u32::MAX)),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = Config {
            poll_interval: Duration::from_millis(1),
            main_face_timeout: Duration::from_millis(u64::from(MAX_TIMEOUT_COUNT)),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults_for_missing_fields() {
        let config: Config =
            serde_json::from_str(r#"{ "poll_interval_ms": 100, "platform": "macos" }"#).unwrap();
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.platform, Platform::Macos);
        assert_eq!(config.presence_thresholds().unwrap().main_face_timeout_count, 50);
        assert_eq!(config.classifier, ClassifierConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_config_path("config.json");
        let config = Config {
            paused: true,
            checksum_policy: ChecksumPolicy::Discard,
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert!(loaded.paused);
        assert_eq!(loaded.checksum_policy, ChecksumPolicy::Discard);
        assert_eq!(loaded.read_timeout, config.read_timeout);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_set_paused_keeps_other_settings() {
        let path = temp_config_path("pause-keeps.json");
        let config = Config {
            platform: Platform::Macos,
            main_face_timeout: Duration::from_secs(30),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let paused = Config::set_paused(&path, true).unwrap();
        assert!(paused.paused);

        let loaded = Config::load_from(&path).unwrap();
        assert!(loaded.paused);
        assert_eq!(loaded.platform, Platform::Macos);
        assert_eq!(loaded.main_face_timeout, Duration::from_secs(30));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_set_paused_leaves_unparseable_file_alone() {
        let path = temp_config_path("pause-typo.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let original = r#"{ "platform": "macos", "main_face_timeout_ms": 30000, }"#;
        std::fs::write(&path, original).unwrap();

        assert!(matches!(
            Config::set_paused(&path, true),
            Err(ConfigError::ParseError(_))
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_set_paused_creates_missing_file() {
        let path = temp_config_path("pause-new.json");
        let _ = std::fs::remove_file(&path);

        Config::set_paused(&path, true).unwrap();
        assert!(Config::load_from(&path).unwrap().paused);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let loaded = Config::load_from(&temp_config_path("does-not-exist.json")).unwrap();
        assert!(!loaded.paused);
    }

    #[test]
    fn test_checksum_policy_parsing() {
        assert_eq!("Discard".parse::<ChecksumPolicy>().unwrap(), ChecksumPolicy::Discard);
        assert!("strict".parse::<ChecksumPolicy>().is_err());
    }
}
