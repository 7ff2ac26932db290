//! WebDriver-backed [`Driver`] built on `fantoccini`

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use tracing::{debug, info};

use crate::config::{Browser, WebDriverConfig};
use crate::driver::{Driver, DriverError, DriverFactory, DriverResult};
use crate::locator::Locator;

/// One WebDriver session
pub struct WebDriverSession {
    client: Client,
    closed: AtomicBool,
}

impl WebDriverSession {
    fn check_open(&self) -> DriverResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            Err(DriverError::Closed)
        } else {
            Ok(())
        }
    }

    async fn find_all(&self, locator: &Locator) -> DriverResult<Vec<Element>> {
        self.check_open()?;
        self.client
            .find_all(fantoccini::Locator::XPath(&locator.to_xpath()))
            .await
            .map_err(map_cmd_error)
    }

    async fn nth(&self, locator: &Locator, index: usize) -> DriverResult<Element> {
        self.find_all(locator)
            .await?
            .into_iter()
            .nth(index)
            .ok_or_else(|| DriverError::NoSuchElement {
                locator: locator.to_string(),
                index,
            })
    }
}

fn map_cmd_error(err: CmdError) -> DriverError {
    let message = err.to_string();
    if err.is_no_such_element() {
        DriverError::NoSuchElement {
            locator: message,
            index: 0,
        }
    } else if err.is_stale_element_reference() {
        DriverError::Stale(message)
    } else {
        DriverError::Command(message)
    }
}

#[async_trait]
impl Driver for WebDriverSession {
    async fn goto(&self, url: &str) -> DriverResult<()> {
        self.check_open()?;
        debug!(url, "goto");
        self.client.goto(url).await.map_err(map_cmd_error)
    }

    async fn current_url(&self) -> DriverResult<String> {
        self.check_open()?;
        let url = self.client.current_url().await.map_err(map_cmd_error)?;
        Ok(url.to_string())
    }

    async fn count(&self, locator: &Locator) -> DriverResult<usize> {
        Ok(self.find_all(locator).await?.len())
    }

    async fn is_displayed(&self, locator: &Locator, index: usize) -> DriverResult<bool> {
        let element = self.nth(locator, index).await?;
        element.is_displayed().await.map_err(map_cmd_error)
    }

    async fn click(&self, locator: &Locator, index: usize) -> DriverResult<()> {
        let element = self.nth(locator, index).await?;
        element.click().await.map_err(map_cmd_error)
    }

    async fn fill(&self, locator: &Locator, index: usize, value: &str) -> DriverResult<()> {
        let element = self.nth(locator, index).await?;
        element.clear().await.map_err(map_cmd_error)?;
        if !value.is_empty() {
            element.send_keys(value).await.map_err(map_cmd_error)?;
        }
        Ok(())
    }

    async fn select_option(&self, locator: &Locator, index: usize, value: &str) -> DriverResult<()> {
        let element = self.nth(locator, index).await?;
        element.select_by_value(value).await.map_err(map_cmd_error)
    }

    async fn text(&self, locator: &Locator, index: usize) -> DriverResult<String> {
        let element = self.nth(locator, index).await?;
        let text = element.text().await.map_err(map_cmd_error)?;
        Ok(text.trim().to_string())
    }

    async fn attribute(
        &self,
        locator: &Locator,
        index: usize,
        name: &str,
    ) -> DriverResult<Option<String>> {
        let element = self.nth(locator, index).await?;
        element.attr(name).await.map_err(map_cmd_error)
    }

    async fn close(&self) -> DriverResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.client.clone().close().await.map_err(map_cmd_error)
    }
}

/// Opens a fresh browser session per call
pub struct WebDriverFactory {
    url: String,
    config: WebDriverConfig,
}

impl WebDriverFactory {
    pub fn new(url: impl Into<String>, config: WebDriverConfig) -> Self {
        Self {
            url: url.into(),
            config,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// W3C capabilities for the configured browser
    pub fn capabilities(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut caps = serde_json::Map::new();
        let viewport = self.config.viewport;

        match self.config.browser {
            Browser::Firefox => {
                let mut args = Vec::new();
                if self.config.headless {
                    args.push("--headless".to_string());
                }
                args.push(format!("--width={}", viewport.width));
                args.push(format!("--height={}", viewport.height));
                caps.insert("browserName".to_string(), json!("firefox"));
                caps.insert("moz:firefoxOptions".to_string(), json!({ "args": args }));
            }
            Browser::Chrome => {
                let mut args = vec!["--no-sandbox".to_string()];
                if self.config.headless {
                    args.push("--headless=new".to_string());
                    args.push("--disable-gpu".to_string());
                    args.push("--disable-dev-shm-usage".to_string());
                }
                args.push(format!("--window-size={},{}", viewport.width, viewport.height));
                caps.insert("browserName".to_string(), json!("chrome"));
                caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
            }
        }

        caps
    }
}

#[async_trait]
impl DriverFactory for WebDriverFactory {
    async fn open(&self) -> DriverResult<Arc<dyn Driver>> {
        info!(url = %self.url, browser = self.config.browser.as_str(), "Opening browser session");

        let client = ClientBuilder::rustls()
            .capabilities(self.capabilities())
            .connect(&self.url)
            .await
            .map_err(|e| {
                DriverError::Command(format!("cannot open session at {}: {}", self.url, e))
            })?;

        let viewport = self.config.viewport;
        if let Err(e) = client.set_window_size(viewport.width, viewport.height).await {
            debug!("Could not set window size: {}", e);
        }

        Ok(Arc::new(WebDriverSession {
            client,
            closed: AtomicBool::new(false),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Viewport;
    use fantoccini::error::{ErrorStatus, WebDriver};

    fn factory(browser: Browser, headless: bool) -> WebDriverFactory {
        WebDriverFactory::new(
            "http://127.0.0.1:4444",
            WebDriverConfig {
                browser,
                headless,
                viewport: Viewport {
                    width: 1024,
                    height: 768,
                },
                ..Default::default()
            },
        )
    }

    #[test]
    fn chrome_capabilities() {
        let caps = factory(Browser::Chrome, true).capabilities();
        assert_eq!(caps["browserName"], "chrome");
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args.contains(&json!("--headless=new")));
        assert!(args.contains(&json!("--window-size=1024,768")));
    }

    #[test]
    fn headed_firefox_capabilities() {
        let caps = factory(Browser::Firefox, false).capabilities();
        assert_eq!(caps["browserName"], "firefox");
        let args = caps["moz:firefoxOptions"]["args"].as_array().unwrap();
        assert!(!args.contains(&json!("--headless")));
        assert!(args.contains(&json!("--width=1024")));
    }

    fn webdriver_error(status: ErrorStatus) -> CmdError {
        CmdError::Standard(WebDriver::new(status, "from the browser"))
    }

    #[test]
    fn stale_reference_is_retryable() {
        let mapped = map_cmd_error(webdriver_error(ErrorStatus::StaleElementReference));
        assert!(matches!(mapped, DriverError::Stale(_)));
        assert!(mapped.is_transient());
    }

    #[test]
    fn missing_element_is_retryable() {
        let mapped = map_cmd_error(webdriver_error(ErrorStatus::NoSuchElement));
        assert!(matches!(mapped, DriverError::NoSuchElement { .. }));
        assert!(mapped.is_transient());
    }

    #[test]
    fn other_errors_are_fatal() {
        let mapped = map_cmd_error(webdriver_error(ErrorStatus::ElementNotInteractable));
        assert!(matches!(mapped, DriverError::Command(_)));
        assert!(!mapped.is_transient());
    }
}
