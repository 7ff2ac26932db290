//! Storefront E2E harness
//!
//! This crate drives the SauceDemo retail storefront through a WebDriver
//! browser and checks the login, listing, cart and checkout flow:
//! - Starts `chromedriver`/`geckodriver` as a subprocess when no endpoint is given
//! - Resolves elements through bounded, polling waits
//! - Exposes one capability-restricted type per screen
//! - Gives every scenario its own session and always tears it down
//! - Verifies derived order totals to the cent
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Scenario Runner (Rust)                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ScenarioRunner                                             │
//! │    ├── run_all() / run_tagged() / run_named()               │
//! │    └── write_results() -> scenario-results.json             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SessionFactory                                             │
//! │    └── scoped(persona, body)                                │
//! │          connect -> login -> body -> release (always)       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Screens                                                    │
//! │    Login -> Listing -> Cart -> CheckoutInfo                 │
//! │          -> CheckoutOverview -> Complete                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Resolver + WaitBudget      (locator -> live element)       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  dyn Driver                                                 │
//! │    ├── WebDriverSession  (fantoccini)                       │
//! │    └── FakeStorefront    (in-process, test-support)         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod locator;
pub mod runner;
pub mod scenarios;
pub mod screens;
pub mod service;
pub mod session;
pub mod wait;
pub mod webdriver;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use config::HarnessConfig;
pub use driver::{Driver, DriverError, DriverFactory};
pub use error::{E2eError, E2eResult, FailureKind};
pub use locator::Locator;
pub use runner::{ScenarioResult, ScenarioRunner, ScenarioSuiteResult};
pub use scenarios::Scenario;
pub use session::{Session, SessionFactory, SessionSettings, SessionState};
pub use wait::WaitBudget;
pub use webdriver::WebDriverFactory;
