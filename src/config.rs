//! Strongly-typed configuration for the test harness.
//!
//! Configuration values can be constructed from defaults, loaded from
//! environment variables (with optional `.env` support), or merged with
//! explicit overrides for programmatic updates. The resulting
//! [`ProsceniumConfig`] is immutable and passed explicitly to every component;
//! nothing reads ambient state after construction.

use std::env;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;

use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::LogLevel;

/// Default application under test.
pub const DEFAULT_BASE_URL: &str = "https://example.com";

/// Default WebDriver endpoint (chromedriver, geckodriver, or a Selenium hub).
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";

/// Browser kind a driver session is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    Chrome,
    Firefox,
    Edge,
}

impl Default for Browser {
    fn default() -> Self {
        Browser::Chrome
    }
}

impl Browser {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "chrome" => Some(Browser::Chrome),
            "firefox" => Some(Browser::Firefox),
            "edge" => Some(Browser::Edge),
            _ => None,
        }
    }

    /// The `browserName` value sent in W3C capabilities.
    pub fn wire_name(self) -> &'static str {
        match self {
            Browser::Chrome => "chrome",
            Browser::Firefox => "firefox",
            Browser::Edge => "MicrosoftEdge",
        }
    }
}

/// Fixed browser window dimensions.
///
/// Always non-zero so headless sessions get a deterministic viewport instead
/// of an OS-dependent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSize {
    fn default() -> Self {
        WindowSize {
            width: 1920,
            height: 1080,
        }
    }
}

impl WindowSize {
    /// Parse a `WIDTHxHEIGHT` string such as `1920x1080`.
    fn parse(value: &str) -> Option<Self> {
        let (width, height) = value.trim().split_once(|c| c == 'x' || c == 'X')?;
        let width = width.trim().parse::<u32>().ok()?;
        let height = height.trim().parse::<u32>().ok()?;
        if width == 0 || height == 0 {
            return None;
        }
        Some(WindowSize { width, height })
    }
}

/// Configuration values for a test run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProsceniumConfig {
    pub base_url: String,
    pub browser: Browser,
    pub headless: bool,
    pub webdriver_url: String,
    /// Kept on the settings surface, but never forwarded to the session: the
    /// protocol-level implicit timeout is always pinned to zero so explicit
    /// waits are the only wait mechanism.
    pub implicit_wait_secs: u64,
    pub explicit_wait_secs: u64,
    pub poll_interval_ms: u64,
    pub page_load_timeout_secs: u64,
    pub screenshot_on_failure: bool,
    pub log_level: LogLevel,
    pub window_size: WindowSize,
    pub screenshots_path: PathBuf,
    pub logs_path: PathBuf,
}

impl Default for ProsceniumConfig {
    fn default() -> Self {
        ProsceniumConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            browser: Browser::default(),
            headless: false,
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            implicit_wait_secs: 10,
            explicit_wait_secs: 20,
            poll_interval_ms: 500,
            page_load_timeout_secs: 30,
            screenshot_on_failure: true,
            log_level: LogLevel::Info,
            window_size: WindowSize::default(),
            screenshots_path: PathBuf::from("screenshots"),
            logs_path: PathBuf::from("logs"),
        }
    }
}

impl ProsceniumConfig {
    /// Construct a configuration by reading environment variables, after
    /// loading a `.env` file if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv();
        let mut config = ProsceniumConfig::default();

        if let Some(value) = env_var("BASE_URL") {
            config.base_url = value;
        }

        if let Some(value) = env_var("BROWSER") {
            config.browser = Browser::parse(&value)
                .ok_or_else(|| ConfigError::invalid_enum("BROWSER", value.clone()))?;
        }

        if let Some(value) = env_var("HEADLESS") {
            config.headless = parse_bool("HEADLESS", &value)?;
        }

        if let Some(value) = env_var("WEBDRIVER_URL") {
            config.webdriver_url = value;
        }

        if let Some(value) = env_var("IMPLICIT_WAIT") {
            config.implicit_wait_secs = parse_u64("IMPLICIT_WAIT", &value)?;
        }

        if let Some(value) = env_var("EXPLICIT_WAIT") {
            config.explicit_wait_secs = parse_u64("EXPLICIT_WAIT", &value)?;
        }

        if let Some(value) = env_var("POLL_INTERVAL_MS") {
            config.poll_interval_ms = parse_u64("POLL_INTERVAL_MS", &value)?;
        }

        if let Some(value) = env_var("PAGE_LOAD_TIMEOUT") {
            config.page_load_timeout_secs = parse_u64("PAGE_LOAD_TIMEOUT", &value)?;
        }

        if let Some(value) = env_var("SCREENSHOT_ON_FAILURE") {
            config.screenshot_on_failure = parse_bool("SCREENSHOT_ON_FAILURE", &value)?;
        }

        if let Some(value) = env_var("LOG_LEVEL") {
            config.log_level = LogLevel::parse(&value)
                .ok_or_else(|| ConfigError::invalid_enum("LOG_LEVEL", value.clone()))?;
        }

        if let Some(value) = env_var("WINDOW_SIZE") {
            config.window_size =
                WindowSize::parse(&value).ok_or(ConfigError::InvalidWindowSize { value })?;
        }

        if let Some(value) = env_var("SCREENSHOTS_PATH") {
            config.screenshots_path = PathBuf::from(value);
        }

        if let Some(value) = env_var("LOGS_PATH") {
            config.logs_path = PathBuf::from(value);
        }

        Ok(config)
    }

    /// Create a new configuration with explicit field overrides applied.
    pub fn with_overrides(&self, overrides: ProsceniumConfigOverrides) -> ProsceniumConfig {
        let mut next = self.clone();

        if let Some(value) = overrides.base_url {
            next.base_url = value;
        }
        if let Some(value) = overrides.browser {
            next.browser = value;
        }
        if let Some(value) = overrides.headless {
            next.headless = value;
        }
        if let Some(value) = overrides.webdriver_url {
            next.webdriver_url = value;
        }
        if let Some(value) = overrides.implicit_wait_secs {
            next.implicit_wait_secs = value;
        }
        if let Some(value) = overrides.explicit_wait_secs {
            next.explicit_wait_secs = value;
        }
        if let Some(value) = overrides.poll_interval_ms {
            next.poll_interval_ms = value;
        }
        if let Some(value) = overrides.page_load_timeout_secs {
            next.page_load_timeout_secs = value;
        }
        if let Some(value) = overrides.screenshot_on_failure {
            next.screenshot_on_failure = value;
        }
        if let Some(value) = overrides.log_level {
            next.log_level = value;
        }
        if let Some(value) = overrides.window_size {
            next.window_size = value;
        }
        if let Some(value) = overrides.screenshots_path {
            next.screenshots_path = value;
        }
        if let Some(value) = overrides.logs_path {
            next.logs_path = value;
        }

        next
    }

    pub fn explicit_wait(&self) -> Duration {
        Duration::from_secs(self.explicit_wait_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }
}

/// Field-level overrides for [`ProsceniumConfig::with_overrides`].
#[derive(Debug, Default, Clone)]
pub struct ProsceniumConfigOverrides {
    pub base_url: Option<String>,
    pub browser: Option<Browser>,
    pub headless: Option<bool>,
    pub webdriver_url: Option<String>,
    pub implicit_wait_secs: Option<u64>,
    pub explicit_wait_secs: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub page_load_timeout_secs: Option<u64>,
    pub screenshot_on_failure: Option<bool>,
    pub log_level: Option<LogLevel>,
    pub window_size: Option<WindowSize>,
    pub screenshots_path: Option<PathBuf>,
    pub logs_path: Option<PathBuf>,
}

impl ProsceniumConfigOverrides {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn browser(mut self, browser: Browser) -> Self {
        self.browser = Some(browser);
        self
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = Some(headless);
        self
    }

    pub fn explicit_wait_secs(mut self, secs: u64) -> Self {
        self.explicit_wait_secs = Some(secs);
        self
    }

    pub fn poll_interval_ms(mut self, millis: u64) -> Self {
        self.poll_interval_ms = Some(millis);
        self
    }

    pub fn screenshot_on_failure(mut self, enabled: bool) -> Self {
        self.screenshot_on_failure = Some(enabled);
        self
    }

    pub fn screenshots_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.screenshots_path = Some(path.into());
        self
    }

    pub fn logs_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.logs_path = Some(path.into());
        self
    }
}

/// Errors that can arise while constructing a [`ProsceniumConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {field}")]
    InvalidEnumVariant { field: &'static str, value: String },
    #[error("invalid boolean '{value}' for {field}")]
    InvalidBool { field: &'static str, value: String },
    #[error("invalid number '{value}' for {field}: {source}")]
    InvalidNumber {
        field: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("invalid WINDOW_SIZE '{value}'; expected non-zero WIDTHxHEIGHT")]
    InvalidWindowSize { value: String },
}

impl ConfigError {
    fn invalid_enum(field: &'static str, value: String) -> Self {
        ConfigError::InvalidEnumVariant { field, value }
    }
}

fn env_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_bool(field: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            field,
            value: value.to_string(),
        }),
    }
}

fn parse_u64(field: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|source| ConfigError::InvalidNumber {
            field,
            value: value.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    fn with_env<F, T>(vars: &[(&str, Option<&str>)], f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let _lock = env_lock().lock().expect("env mutex poisoned");
        let saved: Vec<(String, Option<String>)> = vars
            .iter()
            .map(|(key, value)| {
                let original = env::var(key).ok();
                match value {
                    Some(v) => env::set_var(key, v),
                    None => env::remove_var(key),
                }
                ((*key).to_string(), original)
            })
            .collect();

        let result = f();

        for (key, value) in saved {
            match value {
                Some(v) => env::set_var(&key, v),
                None => env::remove_var(&key),
            }
        }
        result
    }

    const ALL_VARS: &[&str] = &[
        "BASE_URL",
        "BROWSER",
        "HEADLESS",
        "WEBDRIVER_URL",
        "IMPLICIT_WAIT",
        "EXPLICIT_WAIT",
        "POLL_INTERVAL_MS",
        "PAGE_LOAD_TIMEOUT",
        "SCREENSHOT_ON_FAILURE",
        "LOG_LEVEL",
        "WINDOW_SIZE",
        "SCREENSHOTS_PATH",
        "LOGS_PATH",
    ];

    fn cleared_env() -> Vec<(&'static str, Option<&'static str>)> {
        ALL_VARS.iter().map(|key| (*key, None)).collect()
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = ProsceniumConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.browser, Browser::Chrome);
        assert!(!config.headless);
        assert_eq!(config.webdriver_url, DEFAULT_WEBDRIVER_URL);
        assert_eq!(config.implicit_wait_secs, 10);
        assert_eq!(config.explicit_wait_secs, 20);
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.page_load_timeout_secs, 30);
        assert!(config.screenshot_on_failure);
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(
            config.window_size,
            WindowSize {
                width: 1920,
                height: 1080
            }
        );
        assert_eq!(config.screenshots_path, PathBuf::from("screenshots"));
        assert_eq!(config.logs_path, PathBuf::from("logs"));
    }

    #[test]
    fn from_env_without_overrides_keeps_defaults() {
        let vars = cleared_env();
        with_env(&vars, || {
            let config = ProsceniumConfig::from_env().expect("config from env");
            assert_eq!(config.browser, Browser::Chrome);
            assert!(!config.headless);
            assert_eq!(config.explicit_wait_secs, 20);
        });
    }

    #[test]
    fn from_env_parses_and_normalises_values() {
        let mut vars = cleared_env();
        vars.extend([
            ("BASE_URL", Some("https://staging.example.com")),
            ("BROWSER", Some("FIREFOX")),
            ("HEADLESS", Some("true")),
            ("WEBDRIVER_URL", Some("http://grid:4444/wd/hub")),
            ("IMPLICIT_WAIT", Some("0")),
            ("EXPLICIT_WAIT", Some("5")),
            ("POLL_INTERVAL_MS", Some("250")),
            ("PAGE_LOAD_TIMEOUT", Some("60")),
            ("SCREENSHOT_ON_FAILURE", Some("off")),
            ("LOG_LEVEL", Some("debug")),
            ("WINDOW_SIZE", Some("1280x720")),
            ("SCREENSHOTS_PATH", Some("/tmp/shots")),
            ("LOGS_PATH", Some("/tmp/logs")),
        ]);

        with_env(&vars, || {
            let config = ProsceniumConfig::from_env().expect("config from env");
            assert_eq!(config.base_url, "https://staging.example.com");
            assert_eq!(config.browser, Browser::Firefox);
            assert!(config.headless);
            assert_eq!(config.webdriver_url, "http://grid:4444/wd/hub");
            assert_eq!(config.implicit_wait_secs, 0);
            assert_eq!(config.explicit_wait_secs, 5);
            assert_eq!(config.poll_interval_ms, 250);
            assert_eq!(config.page_load_timeout_secs, 60);
            assert!(!config.screenshot_on_failure);
            assert_eq!(config.log_level, LogLevel::Debug);
            assert_eq!(
                config.window_size,
                WindowSize {
                    width: 1280,
                    height: 720
                }
            );
            assert_eq!(config.screenshots_path, PathBuf::from("/tmp/shots"));
            assert_eq!(config.logs_path, PathBuf::from("/tmp/logs"));
        });
    }

    #[test]
    fn from_env_rejects_unknown_browser() {
        let mut vars = cleared_env();
        vars.push(("BROWSER", Some("safari")));
        with_env(&vars, || match ProsceniumConfig::from_env() {
            Err(ConfigError::InvalidEnumVariant { field, value }) => {
                assert_eq!(field, "BROWSER");
                assert_eq!(value, "safari");
            }
            other => panic!("expected invalid enum error, got {other:?}"),
        });
    }

    #[test]
    fn from_env_rejects_zero_window_dimension() {
        let mut vars = cleared_env();
        vars.push(("WINDOW_SIZE", Some("1920x0")));
        with_env(&vars, || {
            assert!(matches!(
                ProsceniumConfig::from_env(),
                Err(ConfigError::InvalidWindowSize { .. })
            ));
        });
    }

    #[test]
    fn overrides_replace_only_named_fields() {
        let base = ProsceniumConfig::default();
        let updated = base.with_overrides(
            ProsceniumConfigOverrides::default()
                .browser(Browser::Edge)
                .headless(true)
                .explicit_wait_secs(3)
                .poll_interval_ms(100),
        );

        assert_eq!(updated.browser, Browser::Edge);
        assert!(updated.headless);
        assert_eq!(updated.explicit_wait(), Duration::from_secs(3));
        assert_eq!(updated.poll_interval(), Duration::from_millis(100));
        assert_eq!(updated.base_url, base.base_url);
        assert_eq!(updated.page_load_timeout_secs, base.page_load_timeout_secs);
    }
}
