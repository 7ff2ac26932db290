//! Scenario runner entry point
//!
//! Runs the built-in storefront scenarios against a live WebDriver browser.
//! Run with: cargo run --package storefront-e2e -- --tag smoke

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use storefront_e2e::config::HarnessConfig;
use storefront_e2e::runner::ScenarioSuiteResult;
use storefront_e2e::scenarios;
use storefront_e2e::service::{ServiceConfig, WebDriverService};
use storefront_e2e::{ScenarioRunner, SessionFactory, WebDriverFactory};

#[derive(Parser, Debug)]
#[command(name = "storefront-e2e")]
#[command(version = storefront_common::VERSION)]
#[command(about = "E2E scenario runner for the storefront checkout flow")]
struct Args {
    /// Path to the harness configuration file
    #[arg(short, long, default_value = "storefront-e2e.yaml")]
    config: PathBuf,

    /// Run only scenarios carrying this tag
    #[arg(short, long)]
    tag: Option<String>,

    /// Run only a specific scenario by name
    #[arg(short, long)]
    name: Option<String>,

    /// Storefront base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Existing WebDriver endpoint; a driver service is spawned when absent
    #[arg(long)]
    webdriver_url: Option<String>,

    /// Browser to use (chrome, firefox)
    #[arg(long)]
    browser: Option<String>,

    /// Run the browser headless
    #[arg(long)]
    headless: Option<bool>,

    /// Scenarios to run at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Output directory for results
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// List scenarios and exit
    #[arg(long)]
    list: bool,
}

fn main() {
    let args = Args::parse();

    let directive = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = tokio::runtime::Runtime::new()
        .context("Failed to create tokio runtime")
        .and_then(|rt| rt.block_on(async_main(args)));

    match result {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

fn load_config(args: &Args) -> anyhow::Result<HarnessConfig> {
    let mut config = HarnessConfig::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    config.apply_env()?;

    if let Some(url) = &args.base_url {
        config.base_url = url.clone();
    }
    if let Some(url) = &args.webdriver_url {
        config.webdriver.url = Some(url.clone());
    }
    if let Some(browser) = &args.browser {
        config.webdriver.browser = browser.parse()?;
    }
    if let Some(headless) = args.headless {
        config.webdriver.headless = headless;
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }

    config.validate()?;
    Ok(config)
}

async fn async_main(args: Args) -> anyhow::Result<bool> {
    if args.list {
        for scenario in scenarios::catalog() {
            println!("{:<32} [{}] {}", scenario.name, scenario.tags.join(","), scenario.description);
        }
        return Ok(true);
    }

    let config = load_config(&args)?;

    // Held until the run ends; dropping it stops the driver process
    let mut service = None;
    let webdriver_url = match &config.webdriver.url {
        Some(url) => url.clone(),
        None => {
            let spawned = WebDriverService::spawn(ServiceConfig::from(&config.webdriver)).await?;
            let url = spawned.url().to_string();
            service = Some(spawned);
            url
        }
    };

    info!(
        version = storefront_common::VERSION,
        base_url = config.base_url(),
        webdriver = %webdriver_url,
        browser = config.webdriver.browser.as_str(),
        "Starting scenario run"
    );

    let drivers = WebDriverFactory::new(webdriver_url, config.webdriver.clone());
    let sessions = SessionFactory::from_config(Arc::new(drivers), &config);
    let runner = ScenarioRunner::new(sessions)
        .with_concurrency(config.concurrency)
        .with_output_dir(config.output_dir.clone());

    let results = if let Some(name) = &args.name {
        let result = runner.run_named(name).await?;
        ScenarioSuiteResult {
            started_at: chrono::Utc::now(),
            total: 1,
            passed: usize::from(result.success),
            failed: usize::from(!result.success),
            skipped: 0,
            duration_ms: result.duration_ms,
            results: vec![result],
        }
    } else if let Some(tag) = &args.tag {
        runner.run_tagged(tag).await
    } else {
        runner.run_all().await
    };

    runner.write_results(&results)?;

    if let Some(mut service) = service {
        service.stop()?;
    }

    Ok(results.all_passed())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harness.yaml");
        std::fs::write(&path, "base_url: https://staging.example.com\nconcurrency: 2\n").unwrap();

        let args = Args::parse_from([
            "storefront-e2e",
            "--config",
            path.to_str().unwrap(),
            "--concurrency",
            "4",
            "--browser",
            "firefox",
        ]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.base_url(), "https://staging.example.com");
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.webdriver.browser.as_str(), "firefox");
    }

    #[test]
    fn invalid_concurrency_is_rejected() {
        let args = Args::parse_from([
            "storefront-e2e",
            "--config",
            "does-not-exist.yaml",
            "--concurrency",
            "0",
        ]);
        assert!(load_config(&args).is_err());
    }

    #[test]
    fn version_flag_reports_the_crate_version() {
        let err = Args::try_parse_from(["storefront-e2e", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
        assert!(err.to_string().contains(storefront_common::VERSION));
    }
}
