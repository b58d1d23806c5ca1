use crate::Result;
use crate::github::{ProviderSettings, RetryPolicy};
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Name of the configuration file picked up from the working directory.
pub const CONFIG_FILE_NAME: &str = "issue-stats.toml";

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Root of the GitHub REST API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Width of each histogram bin, in days
    #[serde(default = "default_histogram_bin_days")]
    pub histogram_bin_days: u64,

    /// Commenters whose login ends with one of these are treated as bots
    #[serde(default = "default_bot_login_suffixes")]
    pub bot_login_suffixes: Vec<String>,

    /// Commenters with one of these logins are treated as bots
    #[serde(default)]
    pub bot_logins: Vec<String>,

    /// Longest single wait for a rate limit reset
    #[serde(default = "default_max_rate_limit_wait", with = "humantime_serde")]
    pub max_rate_limit_wait: Duration,

    /// Wait for the rate limit reset once fewer requests than this remain
    #[serde(default = "default_rate_limit_threshold")]
    pub rate_limit_threshold: usize,

    /// Upper bound on requests in flight at once
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Longest a single GitHub request may take before it is retried
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

const fn default_histogram_bin_days() -> u64 {
    5
}

fn default_bot_login_suffixes() -> Vec<String> {
    vec!["[bot]".to_string()]
}

const fn default_max_rate_limit_wait() -> Duration {
    Duration::from_hours(1)
}

const fn default_rate_limit_threshold() -> usize {
    10
}

const fn default_max_concurrent_requests() -> usize {
    5
}

const fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `issue-stats.toml` in `base_dir` is used if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading issue-stats configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = base_dir.join(CONFIG_FILE_NAME);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading issue-stats configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        log::debug!("Loaded configuration from '{final_path}'");
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending key
    fn validate(&self) -> Result<()> {
        if self.histogram_bin_days == 0 {
            return Err(app_err!("histogram_bin_days must be at least 1"));
        }

        if self.max_concurrent_requests == 0 {
            return Err(app_err!("max_concurrent_requests must be at least 1"));
        }

        if self.request_timeout.is_zero() {
            return Err(app_err!("request_timeout must be greater than zero"));
        }

        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://")) {
            return Err(app_err!("api_base_url must be an http(s) URL, got '{}'", self.api_base_url));
        }

        Ok(())
    }

    /// The GitHub provider settings carried by this configuration.
    #[must_use]
    pub fn provider_settings(&self) -> ProviderSettings {
        ProviderSettings {
            base_url: self.api_base_url.clone(),
            max_rate_limit_wait: self.max_rate_limit_wait,
            rate_limit_threshold: self.rate_limit_threshold,
            max_concurrent_requests: self.max_concurrent_requests,
            retry: RetryPolicy {
                request_timeout: self.request_timeout,
                ..RetryPolicy::default()
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf8_dir(tmp: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.api_base_url, "https://api.github.com");
        assert_eq!(config.histogram_bin_days, 5);
        assert_eq!(config.bot_login_suffixes, vec!["[bot]".to_string()]);
        assert_eq!(config.max_rate_limit_wait, Duration::from_hours(1));
        assert_eq!(config.rate_limit_threshold, 10);
        assert_eq!(config.max_concurrent_requests, 5);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_empty_file_uses_field_defaults() {
        let config: Config = toml::from_str("").unwrap();
        config.validate().unwrap();
        assert_eq!(config.histogram_bin_days, 5);
        assert!(config.bot_logins.is_empty());
    }

    #[test]
    fn test_validate_zero_bin_days() {
        let config = Config { histogram_bin_days: 0, ..Config::default() };
        let err = config.validate().unwrap_err();
        assert!(format!("{err}").contains("histogram_bin_days"));
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let config = Config { max_concurrent_requests: 0, ..Config::default() };
        let err = config.validate().unwrap_err();
        assert!(format!("{err}").contains("max_concurrent_requests"));
    }

    #[test]
    fn test_validate_zero_request_timeout() {
        let config = Config { request_timeout: Duration::ZERO, ..Config::default() };
        let err = config.validate().unwrap_err();
        assert!(format!("{err}").contains("request_timeout"));
    }

    #[test]
    fn test_validate_bad_base_url() {
        let config = Config { api_base_url: "ftp://example.com".to_string(), ..Config::default() };
        let err = config.validate().unwrap_err();
        assert!(format!("{err}").contains("api_base_url"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let result: Result<Config, _> = toml::from_str("histogram_bins = 3");
        assert!(result.is_err());
    }

    #[test]
    fn test_durations_use_humantime() {
        let config: Config = toml::from_str("max_rate_limit_wait = \"15m\"").unwrap();
        assert_eq!(config.max_rate_limit_wait, Duration::from_mins(15));
    }

    #[test]
    fn test_provider_settings() {
        let config = Config {
            api_base_url: "http://localhost:1234".to_string(),
            rate_limit_threshold: 3,
            request_timeout: Duration::from_secs(5),
            ..Config::default()
        };
        let settings = config.provider_settings();
        assert_eq!(settings.base_url, "http://localhost:1234");
        assert_eq!(settings.rate_limit_threshold, 3);
        assert_eq!(settings.retry.request_timeout, Duration::from_secs(5));
        assert_eq!(settings.max_concurrent_requests, 5);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_explicit_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = utf8_dir(&tmp).join("custom.toml");
        fs::write(&path, "histogram_bin_days = 7\nbot_logins = [\"renovate\"]\n").unwrap();

        let config = Config::load(&utf8_dir(&tmp), Some(&path)).unwrap();
        assert_eq!(config.histogram_bin_days, 7);
        assert_eq!(config.bot_logins, vec!["renovate".to_string()]);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_picks_up_file_in_base_dir() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(utf8_dir(&tmp).join(CONFIG_FILE_NAME), "rate_limit_threshold = 42\n").unwrap();

        let config = Config::load(&utf8_dir(&tmp), None).unwrap();
        assert_eq!(config.rate_limit_threshold, 42);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_missing_config_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load(&utf8_dir(&tmp), None).unwrap();
        config.validate().unwrap();
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_missing_explicit_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let path = utf8_dir(&tmp).join("nope.toml");
        assert!(Config::load(&utf8_dir(&tmp), Some(&path)).is_err());
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_invalid_value_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let path = utf8_dir(&tmp).join("bad.toml");
        fs::write(&path, "histogram_bin_days = 0\n").unwrap();
        let err = Config::load(&utf8_dir(&tmp), Some(&path)).unwrap_err();
        assert!(format!("{err}").contains("histogram_bin_days"));
    }
}
