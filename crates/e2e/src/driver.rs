//! Seam between the harness and whatever automates the browser
//!
//! Every element operation takes a [`Locator`] and an index and resolves it
//! afresh, so no implementation hands out element references that can go
//! stale between calls.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::locator::Locator;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    #[error("no element matches {locator} at index {index}")]
    NoSuchElement { locator: String, index: usize },

    #[error("element went stale: {0}")]
    Stale(String),

    #[error("driver command failed: {0}")]
    Command(String),

    #[error("driver connection is closed")]
    Closed,
}

impl DriverError {
    /// Errors that a later attempt can be expected to clear while the page settles
    pub fn is_transient(&self) -> bool {
        matches!(self, DriverError::NoSuchElement { .. } | DriverError::Stale(_))
    }
}

pub type DriverResult<T> = Result<T, DriverError>;

/// One browser connection.
///
/// Calls never wait for elements to appear; waiting is layered on top by
/// [`crate::wait::WaitBudget`].
#[async_trait]
pub trait Driver: Send + Sync {
    async fn goto(&self, url: &str) -> DriverResult<()>;

    async fn current_url(&self) -> DriverResult<String>;

    /// Number of elements currently matching `locator`
    async fn count(&self, locator: &Locator) -> DriverResult<usize>;

    async fn is_displayed(&self, locator: &Locator, index: usize) -> DriverResult<bool>;

    async fn click(&self, locator: &Locator, index: usize) -> DriverResult<()>;

    /// Replace the value of a text input
    async fn fill(&self, locator: &Locator, index: usize, value: &str) -> DriverResult<()>;

    /// Pick the `<option>` with the given `value` attribute
    async fn select_option(&self, locator: &Locator, index: usize, value: &str) -> DriverResult<()>;

    /// Rendered text of the element, whitespace-trimmed
    async fn text(&self, locator: &Locator, index: usize) -> DriverResult<String>;

    async fn attribute(
        &self,
        locator: &Locator,
        index: usize,
        name: &str,
    ) -> DriverResult<Option<String>>;

    /// End the browser session. Later calls fail with [`DriverError::Closed`].
    async fn close(&self) -> DriverResult<()>;
}

/// Opens independent driver connections, one per session
#[async_trait]
pub trait DriverFactory: Send + Sync {
    async fn open(&self) -> DriverResult<Arc<dyn Driver>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors() {
        assert!(DriverError::Stale("row".into()).is_transient());
        assert!(DriverError::NoSuchElement {
            locator: "[data-test=\"title\"]".into(),
            index: 0
        }
        .is_transient());
        assert!(!DriverError::Closed.is_transient());
        assert!(!DriverError::Command("session deleted".into()).is_transient());
    }
}
