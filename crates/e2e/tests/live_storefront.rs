//! Scenarios against the public storefront through a real browser
//!
//! Needs a running WebDriver endpoint:
//! STOREFRONT_WEBDRIVER_URL=http://127.0.0.1:4444 cargo test --package storefront-e2e --test live_storefront -- --ignored

use std::sync::Arc;

use storefront_e2e::config::HarnessConfig;
use storefront_e2e::{ScenarioRunner, SessionFactory, WebDriverFactory};

fn runner() -> ScenarioRunner {
    let mut config = HarnessConfig::default();
    config.apply_env().unwrap();
    config.validate().unwrap();

    let url = config
        .webdriver
        .url
        .clone()
        .unwrap_or_else(|| "http://127.0.0.1:4444".to_string());
    let drivers = WebDriverFactory::new(url, config.webdriver.clone());
    ScenarioRunner::new(SessionFactory::from_config(Arc::new(drivers), &config))
        .with_concurrency(config.concurrency)
}

#[tokio::test]
#[ignore = "needs a WebDriver endpoint and network access"]
async fn smoke_scenarios_pass_live() {
    let suite = runner().run_tagged("smoke").await;
    let failures: Vec<_> = suite.results.iter().filter(|r| !r.success).collect();
    assert!(failures.is_empty(), "failed: {:#?}", failures);
}

#[tokio::test]
#[ignore = "needs a WebDriver endpoint and network access"]
async fn full_catalog_passes_live() {
    let suite = runner().run_all().await;
    assert!(suite.all_passed(), "{:#?}", suite.results);
}
