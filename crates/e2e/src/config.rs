//! Harness configuration
//!
//! Loaded from an optional YAML file, then overridden from `STOREFRONT_*`
//! environment variables. The CLI applies its flags on top of that.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use storefront_common::DEFAULT_BASE_URL;

use crate::error::{E2eError, E2eResult};
use crate::wait::WaitBudget;

/// Harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Storefront under test
    pub base_url: String,

    /// WebDriver endpoint and browser settings
    pub webdriver: WebDriverConfig,

    /// Wait budgets
    pub waits: WaitConfig,

    /// Scenarios run at the same time
    pub concurrency: usize,

    /// Where scenario reports are written
    pub output_dir: PathBuf,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            webdriver: WebDriverConfig::default(),
            waits: WaitConfig::default(),
            concurrency: 1,
            output_dir: PathBuf::from("test-results"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chrome,
    Firefox,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chrome => "chrome",
            Browser::Firefox => "firefox",
        }
    }

    /// WebDriver server binary for this browser
    pub fn driver_binary(&self) -> &'static str {
        match self {
            Browser::Chrome => "chromedriver",
            Browser::Firefox => "geckodriver",
        }
    }
}

impl std::str::FromStr for Browser {
    type Err = E2eError;

    fn from_str(s: &str) -> E2eResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "chrome" | "chromium" => Ok(Browser::Chrome),
            "firefox" | "gecko" => Ok(Browser::Firefox),
            other => Err(E2eError::Config(format!("unknown browser: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebDriverConfig {
    /// Existing WebDriver endpoint. When unset, a driver service is spawned.
    pub url: Option<String>,

    /// Driver service binary (defaults to the browser's driver on `PATH`)
    pub binary_path: Option<PathBuf>,

    /// Port for a spawned driver service (None = find free port)
    pub port: Option<u16>,

    pub browser: Browser,

    pub headless: bool,

    pub viewport: Viewport,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            url: None,
            binary_path: None,
            port: None,
            browser: Browser::default(),
            headless: true,
            viewport: Viewport::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    /// Upper bound for any single wait inside a screen action
    pub action_timeout_ms: u64,

    pub poll_interval_ms: u64,

    /// Upper bound for a whole scenario body
    pub scenario_timeout_ms: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            action_timeout_ms: 10_000,
            poll_interval_ms: 100,
            scenario_timeout_ms: 120_000,
        }
    }
}

impl WaitConfig {
    pub fn action_budget(&self) -> WaitBudget {
        WaitBudget::new(
            Duration::from_millis(self.action_timeout_ms),
            Duration::from_millis(self.poll_interval_ms),
        )
    }

    pub fn scenario_timeout(&self) -> Duration {
        Duration::from_millis(self.scenario_timeout_ms)
    }
}

impl HarnessConfig {
    /// Load configuration from file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> E2eResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_yaml(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Apply `STOREFRONT_*` overrides from the process environment
    pub fn apply_env(&mut self) -> E2eResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> E2eResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("STOREFRONT_BASE_URL") {
            self.base_url = url;
        }
        if let Some(url) = lookup("STOREFRONT_WEBDRIVER_URL") {
            self.webdriver.url = Some(url);
        }
        if let Some(browser) = lookup("STOREFRONT_BROWSER") {
            self.webdriver.browser = browser.parse()?;
        }
        if let Some(headless) = lookup("STOREFRONT_HEADLESS") {
            self.webdriver.headless = parse_flag("STOREFRONT_HEADLESS", &headless)?;
        }
        if let Some(ms) = lookup("STOREFRONT_ACTION_TIMEOUT_MS") {
            self.waits.action_timeout_ms = parse_number("STOREFRONT_ACTION_TIMEOUT_MS", &ms)?;
        }
        if let Some(ms) = lookup("STOREFRONT_SCENARIO_TIMEOUT_MS") {
            self.waits.scenario_timeout_ms = parse_number("STOREFRONT_SCENARIO_TIMEOUT_MS", &ms)?;
        }
        if let Some(n) = lookup("STOREFRONT_CONCURRENCY") {
            self.concurrency = parse_number("STOREFRONT_CONCURRENCY", &n)? as usize;
        }
        Ok(())
    }

    pub fn validate(&self) -> E2eResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(E2eError::Config(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.concurrency == 0 {
            return Err(E2eError::Config("concurrency must be at least 1".into()));
        }
        if self.waits.action_timeout_ms == 0 || self.waits.scenario_timeout_ms == 0 {
            return Err(E2eError::Config("wait timeouts must be non-zero".into()));
        }
        if self.waits.poll_interval_ms > self.waits.action_timeout_ms {
            return Err(E2eError::Config(
                "poll_interval_ms must not exceed action_timeout_ms".into(),
            ));
        }
        Ok(())
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

fn parse_flag(key: &str, value: &str) -> E2eResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(E2eError::Config(format!("{}: not a boolean: {}", key, other))),
    }
}

fn parse_number(key: &str, value: &str) -> E2eResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| E2eError::Config(format!("{}: not a number: {}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_target_public_storefront() {
        let config = HarnessConfig::default();
        assert_eq!(config.base_url(), "https://www.saucedemo.com");
        assert_eq!(config.webdriver.browser, Browser::Chrome);
        assert!(config.webdriver.headless);
        assert_eq!(config.waits.action_budget().timeout, Duration::from_secs(10));
        config.validate().unwrap();
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = HarnessConfig::from_yaml(
            r#"
base_url: http://localhost:3000/
webdriver:
  url: http://127.0.0.1:4444
  browser: firefox
waits:
  action_timeout_ms: 2500
"#,
        )
        .unwrap();
        assert_eq!(config.base_url(), "http://localhost:3000");
        assert_eq!(config.webdriver.url.as_deref(), Some("http://127.0.0.1:4444"));
        assert_eq!(config.webdriver.browser, Browser::Firefox);
        assert_eq!(config.webdriver.viewport, Viewport::default());
        assert_eq!(config.waits.action_timeout_ms, 2500);
        assert_eq!(config.waits.scenario_timeout_ms, 120_000);
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = HarnessConfig::load(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config.concurrency, 1);
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harness.yaml");
        std::fs::write(&path, "concurrency: 4\n").unwrap();
        assert_eq!(HarnessConfig::load(&path).unwrap().concurrency, 4);
    }

    #[test]
    fn env_overrides() {
        let env: HashMap<&str, &str> = [
            ("STOREFRONT_BASE_URL", "http://staging.local"),
            ("STOREFRONT_WEBDRIVER_URL", "http://grid:4444"),
            ("STOREFRONT_BROWSER", "Firefox"),
            ("STOREFRONT_HEADLESS", "off"),
            ("STOREFRONT_ACTION_TIMEOUT_MS", "500"),
            ("STOREFRONT_CONCURRENCY", "3"),
        ]
        .into_iter()
        .collect();

        let mut config = HarnessConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.base_url, "http://staging.local");
        assert_eq!(config.webdriver.url.as_deref(), Some("http://grid:4444"));
        assert_eq!(config.webdriver.browser, Browser::Firefox);
        assert!(!config.webdriver.headless);
        assert_eq!(config.waits.action_timeout_ms, 500);
        assert_eq!(config.concurrency, 3);
    }

    #[test]
    fn bad_override_is_config_error() {
        let mut config = HarnessConfig::default();
        let err = config
            .apply_overrides(|key| (key == "STOREFRONT_HEADLESS").then(|| "maybe".to_string()))
            .unwrap_err();
        assert!(matches!(err, E2eError::Config(_)));
    }

    #[test]
    fn validation_rejects_nonsense() {
        let mut config = HarnessConfig::default();
        config.concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = HarnessConfig::default();
        config.base_url = "www.saucedemo.com".into();
        assert!(config.validate().is_err());

        let mut config = HarnessConfig::default();
        config.waits.poll_interval_ms = 60_000;
        assert!(config.validate().is_err());
    }
}
