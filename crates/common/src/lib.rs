//! Storefront Common Library
//!
//! Shared model for the storefront checks: currency amounts, personas, the
//! product catalog, screen states and the derived-value verifier.

pub mod catalog;
pub mod error;
pub mod money;
pub mod persona;
pub mod types;
pub mod verifier;

// Re-export commonly used types
pub use catalog::ProductKey;
pub use error::{Error, Result};
pub use money::MoneyAmount;
pub use persona::Persona;
pub use types::*;
pub use verifier::{expected_total, OrderSummary, TotalMismatch};

/// Storefront checks version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Public storefront the checks run against unless configured otherwise
pub const DEFAULT_BASE_URL: &str = "https://www.saucedemo.com";
