use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::FixedOffset;
use lmsbot_core::config::parse_utc_offset;
use lmsbot_core::util::is_http_url;
use lmsbot_core::{QuietHours, SyncSettings};
use thiserror::Error;

const DEFAULT_QUIET_HOURS: &str = "2-6";
const DEFAULT_POLL_INTERVAL_SECS: &str = "3600";
const DEFAULT_UTC_OFFSET: &str = "+09:00";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone)]
pub struct AppConfig {
    pub telegram_token: String,
    pub chat_id: String,
    pub telegram_api_url: Option<String>,
    pub lms_api_url: String,
    pub lms_api_key: String,
    pub db_path: PathBuf,
    pub download_dir: PathBuf,
    pub quiet_hours: Option<QuietHours>,
    pub poll_interval: Duration,
    pub reference_zone: FixedOffset,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AppConfig")
            .field("telegram_token", &"[REDACTED]")
            .field("chat_id", &self.chat_id)
            .field("telegram_api_url", &self.telegram_api_url)
            .field("lms_api_url", &self.lms_api_url)
            .field("lms_api_key", &"[REDACTED]")
            .field("db_path", &self.db_path)
            .field("download_dir", &self.download_dir)
            .field("quiet_hours", &self.quiet_hours)
            .field("poll_interval", &self.poll_interval)
            .field("reference_zone", &self.reference_zone)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let telegram_token = required_trimmed(&lookup, "TELEGRAM_TOKEN")?;
        let chat_id = required_trimmed(&lookup, "CHAT_ID")?;
        let telegram_api_url =
            optional_trimmed(&lookup, "TELEGRAM_API_URL").map(|url| trim_trailing(&url).to_string());
        if let Some(url) = telegram_api_url.as_deref() {
            if !is_http_url(url) {
                return Err(ConfigError::Invalid(
                    "TELEGRAM_API_URL must start with http:// or https://".to_string(),
                ));
            }
        }

        let lms_api_key = required_trimmed(&lookup, "LMS_API_KEY")?;
        let lms_api_url = required_trimmed(&lookup, "LMS_API_URL")?;
        if !is_http_url(&lms_api_url) {
            return Err(ConfigError::Invalid(
                "LMS_API_URL must start with http:// or https://".to_string(),
            ));
        }
        let lms_api_url = trim_trailing(&lms_api_url).to_string();

        let db_path = db_path_from_lookup(&lookup);
        let download_dir = optional_trimmed(&lookup, "LMSBOT_DOWNLOAD_DIR")
            .map_or_else(default_download_dir, PathBuf::from);

        let quiet_hours = value_or_default(&lookup, "LMSBOT_QUIET_HOURS", DEFAULT_QUIET_HOURS);
        let quiet_hours = if quiet_hours.eq_ignore_ascii_case("none") {
            None
        } else {
            Some(quiet_hours.parse::<QuietHours>().map_err(|_| {
                ConfigError::Invalid(
                    "LMSBOT_QUIET_HOURS must look like 2-6 (hours 0-23) or be 'none'".to_string(),
                )
            })?)
        };

        let poll_interval_secs =
            value_or_default(&lookup, "LMSBOT_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)
                .parse::<u64>()
                .map_err(|_| {
                    ConfigError::Invalid(
                        "LMSBOT_POLL_INTERVAL_SECS must be an integer in [60, 86400]".to_string(),
                    )
                })?;
        if !(60..=86_400).contains(&poll_interval_secs) {
            return Err(ConfigError::Invalid(
                "LMSBOT_POLL_INTERVAL_SECS must be in [60, 86400]".to_string(),
            ));
        }

        let reference_zone =
            parse_utc_offset(&value_or_default(&lookup, "LMSBOT_UTC_OFFSET", DEFAULT_UTC_OFFSET))
                .map_err(|_| {
                    ConfigError::Invalid("LMSBOT_UTC_OFFSET must look like +09:00".to_string())
                })?;

        Ok(Self {
            telegram_token,
            chat_id,
            telegram_api_url,
            lms_api_url,
            lms_api_key,
            db_path,
            download_dir,
            quiet_hours,
            poll_interval: Duration::from_secs(poll_interval_secs),
            reference_zone,
        })
    }

    /// Apply `--db-path` / `--download-dir` over the environment values
    #[must_use]
    pub fn with_overrides(mut self, db_path: Option<PathBuf>, download_dir: Option<PathBuf>) -> Self {
        if let Some(db_path) = db_path {
            self.db_path = db_path;
        }
        if let Some(download_dir) = download_dir {
            self.download_dir = download_dir;
        }
        self
    }

    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings::new(&self.download_dir).with_reference_zone(self.reference_zone)
    }
}

/// Database location for commands that need no credentials
pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path.unwrap_or_else(|| db_path_from_lookup(|name| env::var(name).ok()))
}

fn db_path_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    optional_trimmed(lookup, "LMSBOT_DB_PATH").map_or_else(default_db_path, PathBuf::from)
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lmsbot")
        .join("lms.db")
}

fn default_download_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Univ")
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn required_trimmed(
    lookup: impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    optional_trimmed(lookup, name).ok_or(ConfigError::MissingVar(name))
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn trim_trailing(value: &str) -> &str {
    value.trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::Path;

    use pretty_assertions::assert_eq;

    use super::*;

    fn minimal() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("TELEGRAM_TOKEN", "123456:sensitive-bot-token"),
            ("CHAT_ID", "-100987"),
            ("LMS_API_KEY", "sensitive-lms-key"),
            ("LMS_API_URL", "https://canvas.example.edu/"),
        ])
    }

    fn load(map: &HashMap<&str, &str>) -> Result<AppConfig, ConfigError> {
        AppConfig::from_lookup(|key| map.get(key).map(|value| (*value).to_string()))
    }

    #[test]
    fn config_requires_credentials() {
        let map: HashMap<&str, &str> = HashMap::new();
        let err = load(&map).unwrap_err();
        assert!(err.to_string().contains("TELEGRAM_TOKEN"));

        let mut map = minimal();
        map.insert("LMS_API_KEY", "   ");
        let err = load(&map).unwrap_err();
        assert!(err.to_string().contains("LMS_API_KEY"));
    }

    #[test]
    fn config_applies_defaults() {
        let config = load(&minimal()).unwrap();
        assert_eq!(config.lms_api_url, "https://canvas.example.edu");
        assert_eq!(config.quiet_hours, Some(QuietHours::new(2, 6).unwrap()));
        assert_eq!(config.poll_interval, Duration::from_secs(3600));
        assert_eq!(config.reference_zone.local_minus_utc(), 9 * 3600);
        assert!(config.db_path.ends_with("lmsbot/lms.db"));
        assert!(config.download_dir.ends_with("Univ"));
        assert_eq!(config.telegram_api_url, None);
    }

    #[test]
    fn config_rejects_non_http_lms_url() {
        let mut map = minimal();
        map.insert("LMS_API_URL", "canvas.example.edu");
        let err = load(&map).unwrap_err();
        assert!(err.to_string().contains("LMS_API_URL"));
    }

    #[test]
    fn config_bounds_poll_interval() {
        let mut map = minimal();
        map.insert("LMSBOT_POLL_INTERVAL_SECS", "59");
        assert!(load(&map).is_err());
        map.insert("LMSBOT_POLL_INTERVAL_SECS", "hourly");
        assert!(load(&map).is_err());
        map.insert("LMSBOT_POLL_INTERVAL_SECS", "86400");
        assert_eq!(
            load(&map).unwrap().poll_interval,
            Duration::from_secs(86_400)
        );
    }

    #[test]
    fn config_parses_quiet_hours_and_offset() {
        let mut map = minimal();
        map.insert("LMSBOT_QUIET_HOURS", "none");
        map.insert("LMSBOT_UTC_OFFSET", "-05:30");
        let config = load(&map).unwrap();
        assert_eq!(config.quiet_hours, None);
        assert_eq!(config.reference_zone.local_minus_utc(), -(5 * 3600 + 30 * 60));

        map.insert("LMSBOT_QUIET_HOURS", "25-6");
        assert!(load(&map)
            .unwrap_err()
            .to_string()
            .contains("LMSBOT_QUIET_HOURS"));

        map.insert("LMSBOT_QUIET_HOURS", "2-6");
        map.insert("LMSBOT_UTC_OFFSET", "KST");
        assert!(load(&map)
            .unwrap_err()
            .to_string()
            .contains("LMSBOT_UTC_OFFSET"));
    }

    #[test]
    fn cli_flags_override_environment_paths() {
        let mut map = minimal();
        map.insert("LMSBOT_DB_PATH", "/var/lib/lmsbot/env.db");
        map.insert("LMSBOT_DOWNLOAD_DIR", "/srv/univ");
        let config = load(&map).unwrap();
        assert_eq!(config.db_path, Path::new("/var/lib/lmsbot/env.db"));

        let config = config.with_overrides(Some(PathBuf::from("/tmp/flag.db")), None);
        assert_eq!(config.db_path, Path::new("/tmp/flag.db"));
        assert_eq!(config.download_dir, Path::new("/srv/univ"));
        assert_eq!(config.sync_settings().download_root, Path::new("/srv/univ"));
    }

    #[test]
    fn config_redacts_sensitive_debug_fields() {
        let config = load(&minimal()).unwrap();
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("sensitive-bot-token"));
        assert!(!debug_output.contains("sensitive-lms-key"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(debug_output.contains("-100987"));
    }
}
