//! Error types for the shared storefront model

use thiserror::Error;

/// Result type alias using the storefront model Error
pub type Result<T> = std::result::Result<T, Error>;

/// Parse and lookup failures for the storefront model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Not a currency amount: {text:?}")]
    InvalidAmount { text: String },

    #[error("Unknown persona: {0}")]
    UnknownPersona(String),

    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    #[error("Unknown sort order: {0}")]
    UnknownSortOrder(String),
}
