//! Error types for the storefront E2E harness

use serde::{Deserialize, Serialize};
use storefront_common::{ScreenState, TotalMismatch};
use thiserror::Error;

use crate::driver::DriverError;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("{screen}: {operation} could not resolve {locator} within {waited_ms} ms (last saw {observed})")]
    ResolutionFailure {
        screen: ScreenState,
        operation: &'static str,
        locator: String,
        waited_ms: u64,
        observed: String,
    },

    #[error("{screen}: {operation} expected {expected} screen, observed {observed}")]
    StateMismatch {
        screen: ScreenState,
        expected: ScreenState,
        operation: &'static str,
        observed: String,
    },

    #[error("{screen}: {operation} expected {expected}, got {actual}")]
    AssertionFailure {
        screen: ScreenState,
        operation: &'static str,
        expected: String,
        actual: String,
    },

    #[error("{screen}: {mismatch}")]
    DerivedValueMismatch {
        screen: ScreenState,
        mismatch: TotalMismatch,
    },

    #[error("Login as {persona} failed: {reason}")]
    AuthenticationFailure { persona: String, reason: String },

    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("WebDriver endpoint unavailable: {0}")]
    WebDriverUnavailable(String),

    #[error("WebDriver service failed to start: {0}")]
    ServiceStartup(String),

    #[error("WebDriver service health check failed after {0} attempts")]
    ServiceHealthCheck(usize),

    #[error("Scenario {scenario} exceeded {timeout_ms} ms")]
    ScenarioTimeout { scenario: String, timeout_ms: u64 },

    #[error("Scenario panicked: {0}")]
    ScenarioPanicked(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;

/// Coarse failure category recorded in scenario reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Resolution,
    StateMismatch,
    Assertion,
    DerivedValue,
    Authentication,
    Timeout,
    Panic,
    Infrastructure,
}

impl E2eError {
    pub fn kind(&self) -> FailureKind {
        match self {
            E2eError::ResolutionFailure { .. } => FailureKind::Resolution,
            E2eError::StateMismatch { .. } => FailureKind::StateMismatch,
            E2eError::AssertionFailure { .. } => FailureKind::Assertion,
            E2eError::DerivedValueMismatch { .. } => FailureKind::DerivedValue,
            E2eError::AuthenticationFailure { .. } => FailureKind::Authentication,
            E2eError::ScenarioTimeout { .. } => FailureKind::Timeout,
            E2eError::ScenarioPanicked(_) => FailureKind::Panic,
            _ => FailureKind::Infrastructure,
        }
    }

    pub(crate) fn assertion(
        screen: ScreenState,
        operation: &'static str,
        expected: impl std::fmt::Display,
        actual: impl std::fmt::Display,
    ) -> Self {
        E2eError::AssertionFailure {
            screen,
            operation,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_common::verifier::DerivedValue;
    use storefront_common::MoneyAmount;

    #[test]
    fn messages_name_screen_and_operation() {
        let err = E2eError::assertion(ScreenState::Cart, "assert_item_count", 2, 1);
        assert_eq!(err.to_string(), "cart: assert_item_count expected 2, got 1");
        assert_eq!(err.kind(), FailureKind::Assertion);
    }

    #[test]
    fn derived_value_mismatch_is_its_own_kind() {
        let err = E2eError::DerivedValueMismatch {
            screen: ScreenState::CheckoutOverview,
            mismatch: TotalMismatch {
                value: DerivedValue::Total,
                expected: MoneyAmount::from_cents(3239),
                rendered: MoneyAmount::from_cents(3240),
            },
        };
        assert_eq!(err.kind(), FailureKind::DerivedValue);
        assert!(err.to_string().starts_with("checkout-overview: total rendered as $32.40"));
    }

    #[test]
    fn infrastructure_errors_are_grouped() {
        let err = E2eError::Config("base_url is empty".into());
        assert_eq!(err.kind(), FailureKind::Infrastructure);
        let err = E2eError::Driver(DriverError::Closed);
        assert_eq!(err.kind(), FailureKind::Infrastructure);
    }

    #[test]
    fn state_mismatch_names_the_screen_it_left() {
        let login = E2eError::StateMismatch {
            screen: ScreenState::Login,
            expected: ScreenState::Listing,
            operation: "submit",
            observed: "https://www.saucedemo.com/".into(),
        };
        let shipping = E2eError::StateMismatch {
            screen: ScreenState::CheckoutInfo,
            expected: ScreenState::CheckoutOverview,
            operation: "submit",
            observed: "https://www.saucedemo.com/checkout-step-one.html".into(),
        };
        assert!(login.to_string().starts_with("login: submit expected listing screen"));
        assert!(shipping.to_string().starts_with("checkout-info: submit expected checkout-overview screen"));
        assert_eq!(shipping.kind(), FailureKind::StateMismatch);
    }

    #[test]
    fn resolution_failure_reports_what_was_seen() {
        let err = E2eError::ResolutionFailure {
            screen: ScreenState::Listing,
            operation: "add_to_cart",
            locator: r#"[data-test="add-to-cart-unicorn"]"#.into(),
            waited_ms: 200,
            observed: "0 match(es)".into(),
        };
        assert_eq!(
            err.to_string(),
            r#"listing: add_to_cart could not resolve [data-test="add-to-cart-unicorn"] within 200 ms (last saw 0 match(es))"#
        );
        assert_eq!(err.kind(), FailureKind::Resolution);
    }
}
