//! WebDriver service management - spawning and health checking chromedriver/geckodriver

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::{Browser, WebDriverConfig};
use crate::error::{E2eError, E2eResult};

/// Handle to a running WebDriver service process
pub struct WebDriverService {
    child: Child,
    pub url: String,
    pub port: u16,
}

impl WebDriverService {
    /// Spawn the driver service for the configured browser
    pub async fn spawn(config: ServiceConfig) -> E2eResult<Self> {
        let port = match config.port {
            Some(port) => port,
            None => find_free_port()?,
        };
        let url = format!("http://127.0.0.1:{}", port);
        let binary = config
            .binary_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(config.browser.driver_binary()));

        info!("Spawning {} on port {}", binary.display(), port);

        let mut cmd = Command::new(&binary);
        match config.browser {
            Browser::Chrome => {
                cmd.arg(format!("--port={}", port));
            }
            Browser::Firefox => {
                cmd.arg("--port").arg(port.to_string());
            }
        }
        cmd.stdout(Stdio::null()).stderr(Stdio::null());

        let child = cmd.spawn().map_err(|e| {
            E2eError::ServiceStartup(format!("Failed to spawn {}: {}", binary.display(), e))
        })?;

        let handle = WebDriverService {
            child,
            url: url.clone(),
            port,
        };

        handle.wait_for_ready(config.startup_timeout).await?;

        info!("WebDriver service is ready at {}", url);
        Ok(handle)
    }

    /// Poll `/status` until the service reports ready
    async fn wait_for_ready(&self, timeout_duration: Duration) -> E2eResult<()> {
        let status_url = format!("{}/status", self.url);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let start = std::time::Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout_duration {
            attempts += 1;

            match client.get(&status_url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    let body: serde_json::Value = resp.json().await?;
                    if is_ready(&body) {
                        return Ok(());
                    }
                }
                Ok(resp) => {
                    warn!("Status check returned {}", resp.status());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for WebDriver service to start...");
                    }
                    if !e.is_connect() {
                        warn!("Status check error: {}", e);
                    }
                }
            }

            sleep(Duration::from_millis(100)).await;
        }

        Err(E2eError::ServiceHealthCheck(attempts))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Stop the service
    pub fn stop(&mut self) -> E2eResult<()> {
        if let Ok(Some(_)) = self.child.try_wait() {
            return Ok(());
        }
        info!("Stopping WebDriver service (pid: {})", self.child.id());

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(self.child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                std::thread::sleep(Duration::from_millis(250));
            }
        }

        let _ = self.child.kill();
        let _ = self.child.wait();

        Ok(())
    }
}

impl Drop for WebDriverService {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// A W3C `/status` body with `value.ready == true`
fn is_ready(body: &serde_json::Value) -> bool {
    body.pointer("/value/ready")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

/// Configuration for spawning a driver service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Driver binary; defaults to the browser's driver on `PATH`
    pub binary_path: Option<PathBuf>,

    pub browser: Browser,

    /// Port to listen on (None = find free port)
    pub port: Option<u16>,

    pub startup_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            binary_path: None,
            browser: Browser::default(),
            port: None,
            startup_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&WebDriverConfig> for ServiceConfig {
    fn from(config: &WebDriverConfig) -> Self {
        Self {
            binary_path: config.binary_path.clone(),
            browser: config.browser,
            port: config.port,
            ..Default::default()
        }
    }
}

/// Find a free port to use
fn find_free_port() -> E2eResult<u16> {
    use std::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_find_free_port() {
        let port = find_free_port().unwrap();
        assert!(port > 1024);
    }

    #[test]
    fn readiness_from_status_body() {
        assert!(is_ready(&json!({ "value": { "ready": true, "message": "ok" } })));
        assert!(!is_ready(&json!({ "value": { "ready": false } })));
        assert!(!is_ready(&json!({ "status": 0 })));
    }

    #[test]
    fn service_config_follows_webdriver_section() {
        let webdriver = WebDriverConfig {
            browser: Browser::Firefox,
            port: Some(4444),
            ..Default::default()
        };
        let config = ServiceConfig::from(&webdriver);
        assert_eq!(config.browser, Browser::Firefox);
        assert_eq!(config.port, Some(4444));
        assert!(config.binary_path.is_none());
    }

    #[tokio::test]
    async fn missing_binary_is_startup_error() {
        let result = WebDriverService::spawn(ServiceConfig {
            binary_path: Some(PathBuf::from("/nonexistent/chromedriver")),
            ..Default::default()
        })
        .await;
        assert!(matches!(result, Err(E2eError::ServiceStartup(_))));
    }
}
