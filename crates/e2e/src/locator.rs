//! Locator resolution
//!
//! A [`Locator`] describes an element logically: by its `data-test` id, by role
//! and accessible name, by the text it contains, or scoped inside another
//! locator. Positional selection is never part of the description; it is an
//! explicit index given at resolution time.
//!
//! [`Resolver`] waits (within a [`WaitBudget`]) for a locator to match a
//! displayed element and hands back an [`Element`]. An `Element` keeps only
//! the descriptor and index, so every operation on it re-resolves through the
//! driver.

use std::fmt;

use serde::{Deserialize, Serialize};
use storefront_common::ScreenState;
use tracing::debug;

use crate::driver::Driver;
use crate::error::{E2eError, E2eResult};
use crate::wait::{Probe, WaitBudget, WaitError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Button,
    Link,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// `[data-test="<id>"]`
    TestId(String),
    /// `[data-test^="<prefix>"]`
    TestIdPrefix(String),
    /// `[data-test$="<suffix>"]`
    TestIdSuffix(String),
    Role { role: Role, name: String },
    /// `base` elements whose rendered text contains `text`
    Containing { base: Box<Locator>, text: String },
    /// `target` elements nested somewhere inside a `scope` element
    Within { scope: Box<Locator>, target: Box<Locator> },
}

impl Locator {
    pub fn test_id(id: impl Into<String>) -> Self {
        Locator::TestId(id.into())
    }

    pub fn test_id_prefix(prefix: impl Into<String>) -> Self {
        Locator::TestIdPrefix(prefix.into())
    }

    pub fn test_id_suffix(suffix: impl Into<String>) -> Self {
        Locator::TestIdSuffix(suffix.into())
    }

    pub fn role(role: Role, name: impl Into<String>) -> Self {
        Locator::Role {
            role,
            name: name.into(),
        }
    }

    pub fn containing(self, text: impl Into<String>) -> Self {
        Locator::Containing {
            base: Box::new(self),
            text: text.into(),
        }
    }

    /// Narrow to `target` elements inside this one
    pub fn descendant(self, target: Locator) -> Self {
        Locator::Within {
            scope: Box::new(self),
            target: Box::new(target),
        }
    }

    /// Compile to an XPath 1.0 expression
    pub fn to_xpath(&self) -> String {
        match self {
            Locator::TestId(id) => format!("//*[@data-test={}]", xpath_literal(id)),
            Locator::TestIdPrefix(prefix) => {
                format!("//*[starts-with(@data-test, {})]", xpath_literal(prefix))
            }
            Locator::TestIdSuffix(suffix) => format!(
                "//*[substring(@data-test, string-length(@data-test) - {} + 1) = {}]",
                suffix.chars().count(),
                xpath_literal(suffix)
            ),
            Locator::Role {
                role: Role::Button,
                name,
            } => {
                let name = xpath_literal(name);
                format!(
                    "//*[self::button or (self::input and (@type='submit' or @type='button'))]\
                     [normalize-space(.)={name} or @value={name}]"
                )
            }
            Locator::Role {
                role: Role::Link,
                name,
            } => format!("//a[normalize-space(.)={}]", xpath_literal(name)),
            Locator::Containing { base, text } => format!(
                "{}[contains(normalize-space(.), {})]",
                base.to_xpath(),
                xpath_literal(text)
            ),
            Locator::Within { scope, target } => {
                format!("{}{}", scope.to_xpath(), target.to_xpath())
            }
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::TestId(id) => write!(f, "[data-test=\"{}\"]", id),
            Locator::TestIdPrefix(prefix) => write!(f, "[data-test^=\"{}\"]", prefix),
            Locator::TestIdSuffix(suffix) => write!(f, "[data-test$=\"{}\"]", suffix),
            Locator::Role { role, name } => {
                let role = match role {
                    Role::Button => "button",
                    Role::Link => "link",
                };
                write!(f, "role={}[name=\"{}\"]", role, name)
            }
            Locator::Containing { base, text } => write!(f, "{}:has-text(\"{}\")", base, text),
            Locator::Within { scope, target } => write!(f, "{} {}", scope, target),
        }
    }
}

/// Quote `value` as an XPath string literal
fn xpath_literal(value: &str) -> String {
    if !value.contains('"') {
        format!("\"{}\"", value)
    } else if !value.contains('\'') {
        format!("'{}'", value)
    } else {
        let parts: Vec<String> = value
            .split('"')
            .map(|part| format!("\"{}\"", part))
            .collect();
        format!("concat({})", parts.join(", '\"', "))
    }
}

/// Resolves locators on behalf of one screen
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    driver: &'a dyn Driver,
    budget: WaitBudget,
    screen: ScreenState,
}

impl<'a> Resolver<'a> {
    pub fn new(driver: &'a dyn Driver, budget: WaitBudget, screen: ScreenState) -> Self {
        Self {
            driver,
            budget,
            screen,
        }
    }

    pub fn driver(&self) -> &'a dyn Driver {
        self.driver
    }

    pub fn screen(&self) -> ScreenState {
        self.screen
    }

    pub fn budget(&self) -> WaitBudget {
        self.budget
    }

    pub async fn resolve(&self, locator: Locator, operation: &'static str) -> E2eResult<Element<'a>> {
        self.resolve_nth(locator, 0, operation).await
    }

    /// Wait until at least `index + 1` elements match and the selected one is displayed
    pub async fn resolve_nth(
        &self,
        locator: Locator,
        index: usize,
        operation: &'static str,
    ) -> E2eResult<Element<'a>> {
        let driver = self.driver;
        let target = &locator;
        self.budget
            .poll(move || async move {
                let count = driver.count(target).await?;
                if count <= index {
                    return Ok(Probe::Waiting(format!("{} match(es)", count)));
                }
                if driver.is_displayed(target, index).await? {
                    Ok(Probe::Ready(()))
                } else {
                    Ok(Probe::Waiting(format!("match {} is not displayed", index)))
                }
            })
            .await
            .map_err(|err| self.failure(err, &locator, operation))?;

        debug!(screen = %self.screen, operation, locator = %locator, index, "resolved");
        Ok(Element {
            driver: self.driver,
            locator,
            index,
        })
    }

    /// Number of matches right now, without waiting
    pub async fn count(&self, locator: &Locator) -> E2eResult<usize> {
        Ok(self.driver.count(locator).await?)
    }

    /// Wait for at least one match, then read the text of every match in document order.
    ///
    /// Counting and reading happen in one attempt, so a list that re-renders
    /// mid-read is read again rather than failing.
    pub async fn texts(&self, locator: Locator, operation: &'static str) -> E2eResult<Vec<String>> {
        let driver = self.driver;
        let target = &locator;
        let texts = self
            .budget
            .poll(move || async move {
                let count = driver.count(target).await?;
                if count == 0 {
                    return Ok(Probe::Waiting("0 match(es)".to_string()));
                }
                let mut texts = Vec::with_capacity(count);
                for index in 0..count {
                    texts.push(driver.text(target, index).await?);
                }
                Ok(Probe::Ready(texts))
            })
            .await
            .map_err(|err| self.failure(err, &locator, operation))?;

        debug!(screen = %self.screen, operation, locator = %locator, count = texts.len(), "read texts");
        Ok(texts)
    }

    /// Wait for at least one match, then read `name` from every match
    pub async fn attributes(
        &self,
        locator: Locator,
        name: &str,
        operation: &'static str,
    ) -> E2eResult<Vec<Option<String>>> {
        let driver = self.driver;
        let target = &locator;
        self.budget
            .poll(move || async move {
                let count = driver.count(target).await?;
                if count == 0 {
                    return Ok(Probe::Waiting("0 match(es)".to_string()));
                }
                let mut values = Vec::with_capacity(count);
                for index in 0..count {
                    values.push(driver.attribute(target, index, name).await?);
                }
                Ok(Probe::Ready(values))
            })
            .await
            .map_err(|err| self.failure(err, &locator, operation))
    }

    /// Map a wait failure on `locator` to the harness error taxonomy
    pub fn failure(&self, err: WaitError, locator: &Locator, operation: &'static str) -> E2eError {
        match err {
            WaitError::Elapsed {
                waited,
                last_observed,
            } => E2eError::ResolutionFailure {
                screen: self.screen,
                operation,
                locator: locator.to_string(),
                waited_ms: waited.as_millis() as u64,
                observed: last_observed,
            },
            WaitError::Driver(err) => E2eError::Driver(err),
        }
    }
}

/// A live reference to the `index`th match of a locator
#[derive(Clone)]
pub struct Element<'a> {
    driver: &'a dyn Driver,
    locator: Locator,
    index: usize,
}

impl<'a> Element<'a> {
    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub async fn click(&self) -> E2eResult<()> {
        Ok(self.driver.click(&self.locator, self.index).await?)
    }

    pub async fn fill(&self, value: &str) -> E2eResult<()> {
        Ok(self.driver.fill(&self.locator, self.index, value).await?)
    }

    pub async fn select_option(&self, value: &str) -> E2eResult<()> {
        Ok(self.driver.select_option(&self.locator, self.index, value).await?)
    }

    pub async fn text(&self) -> E2eResult<String> {
        Ok(self.driver.text(&self.locator, self.index).await?)
    }

    pub async fn attribute(&self, name: &str) -> E2eResult<Option<String>> {
        Ok(self.driver.attribute(&self.locator, self.index, name).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use crate::driver::{DriverError, DriverResult};

    /// A list that loses its last row once, in the middle of the first read
    struct ShrinkingRows {
        rows: Mutex<Vec<&'static str>>,
        shrink_on_read: AtomicBool,
    }

    impl ShrinkingRows {
        fn new(rows: Vec<&'static str>) -> Self {
            Self {
                rows: Mutex::new(rows),
                shrink_on_read: AtomicBool::new(true),
            }
        }

        fn row(&self, locator: &Locator, index: usize) -> DriverResult<&'static str> {
            let mut rows = self.rows.lock();
            if self.shrink_on_read.swap(false, Ordering::SeqCst) {
                rows.pop();
            }
            rows.get(index).copied().ok_or_else(|| DriverError::NoSuchElement {
                locator: locator.to_string(),
                index,
            })
        }
    }

    #[async_trait]
    impl Driver for ShrinkingRows {
        async fn goto(&self, _url: &str) -> DriverResult<()> {
            Ok(())
        }

        async fn current_url(&self) -> DriverResult<String> {
            Ok("https://www.saucedemo.com/cart.html".to_string())
        }

        async fn count(&self, _locator: &Locator) -> DriverResult<usize> {
            Ok(self.rows.lock().len())
        }

        async fn is_displayed(&self, locator: &Locator, index: usize) -> DriverResult<bool> {
            Ok(index < self.count(locator).await?)
        }

        async fn click(&self, _locator: &Locator, _index: usize) -> DriverResult<()> {
            Err(DriverError::Command("read-only".into()))
        }

        async fn fill(&self, _locator: &Locator, _index: usize, _value: &str) -> DriverResult<()> {
            Err(DriverError::Command("read-only".into()))
        }

        async fn select_option(&self, _locator: &Locator, _index: usize, _value: &str) -> DriverResult<()> {
            Err(DriverError::Command("read-only".into()))
        }

        async fn text(&self, locator: &Locator, index: usize) -> DriverResult<String> {
            self.row(locator, index).map(str::to_string)
        }

        async fn attribute(
            &self,
            locator: &Locator,
            index: usize,
            _name: &str,
        ) -> DriverResult<Option<String>> {
            self.row(locator, index).map(|row| Some(format!("/img/{}.jpg", row)))
        }

        async fn close(&self) -> DriverResult<()> {
            Ok(())
        }
    }

    fn resolver(driver: &dyn Driver) -> Resolver<'_> {
        Resolver::new(
            driver,
            WaitBudget::new(Duration::from_millis(500), Duration::from_millis(5)),
            ScreenState::Cart,
        )
    }

    #[tokio::test]
    async fn texts_reread_a_list_that_shrinks_mid_read() {
        let driver = ShrinkingRows::new(vec!["backpack", "bike-light", "onesie"]);
        let names = resolver(&driver)
            .texts(Locator::test_id("inventory-item-name"), "read_names")
            .await
            .unwrap();
        assert_eq!(names, vec!["backpack", "bike-light"]);
    }

    #[tokio::test]
    async fn attributes_reread_a_list_that_shrinks_mid_read() {
        let driver = ShrinkingRows::new(vec!["backpack", "bike-light", "onesie"]);
        let sources = resolver(&driver)
            .attributes(Locator::test_id_suffix("-img"), "src", "read_image_sources")
            .await
            .unwrap();
        assert_eq!(
            sources,
            vec![Some("/img/backpack.jpg".to_string()), Some("/img/bike-light.jpg".to_string())]
        );
    }

    #[tokio::test]
    async fn empty_list_is_a_resolution_failure_with_what_was_seen() {
        let driver = ShrinkingRows::new(Vec::new());
        let err = resolver(&driver)
            .texts(Locator::test_id("inventory-item-name"), "read_names")
            .await
            .unwrap_err();
        match err {
            E2eError::ResolutionFailure { screen, operation, observed, .. } => {
                assert_eq!(screen, ScreenState::Cart);
                assert_eq!(operation, "read_names");
                assert_eq!(observed, "0 match(es)");
            }
            other => panic!("expected ResolutionFailure, got {:?}", other),
        }
    }

    fn add_to_cart_for(name: &str) -> Locator {
        Locator::test_id("inventory-item")
            .containing(name)
            .descendant(Locator::test_id_prefix("add-to-cart"))
    }

    #[test]
    fn test_id_xpath() {
        assert_eq!(
            Locator::test_id("login-button").to_xpath(),
            r#"//*[@data-test="login-button"]"#
        );
    }

    #[test]
    fn scoped_containment_xpath() {
        assert_eq!(
            add_to_cart_for("Sauce Labs Backpack").to_xpath(),
            r#"//*[@data-test="inventory-item"][contains(normalize-space(.), "Sauce Labs Backpack")]//*[starts-with(@data-test, "add-to-cart")]"#
        );
    }

    #[test]
    fn suffix_xpath() {
        assert_eq!(
            Locator::test_id_suffix("-img").to_xpath(),
            r#"//*[substring(@data-test, string-length(@data-test) - 4 + 1) = "-img"]"#
        );
        assert_eq!(Locator::test_id_suffix("-img").to_string(), r#"[data-test$="-img"]"#);
    }

    #[test]
    fn role_xpath_matches_buttons_by_name() {
        let xpath = Locator::role(Role::Button, "Add to cart").to_xpath();
        assert!(xpath.starts_with("//*[self::button"));
        assert!(xpath.ends_with(r#"[normalize-space(.)="Add to cart" or @value="Add to cart"]"#));
    }

    #[test]
    fn literal_quoting() {
        assert_eq!(xpath_literal("plain"), r#""plain""#);
        assert_eq!(xpath_literal(r#"say "hi""#), r#"'say "hi"'"#);
        assert_eq!(
            xpath_literal(r#"it's "x""#),
            r#"concat("it's ", '"', "x", '"', "")"#
        );
    }

    #[test]
    fn display_reads_like_a_selector() {
        assert_eq!(
            add_to_cart_for("Sauce Labs Backpack").to_string(),
            r#"[data-test="inventory-item"]:has-text("Sauce Labs Backpack") [data-test^="add-to-cart"]"#
        );
        assert_eq!(
            Locator::role(Role::Button, "Finish").to_string(),
            r#"role=button[name="Finish"]"#
        );
    }
}
