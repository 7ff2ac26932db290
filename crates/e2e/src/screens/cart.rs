use std::sync::atomic::{AtomicUsize, Ordering};

use storefront_common::ScreenState;

use super::{CheckoutInfoScreen, ListingScreen, INVENTORY_ITEM, ITEM_NAME};
use crate::error::{E2eError, E2eResult};
use crate::locator::{Locator, Resolver};
use crate::session::Session;
use crate::wait::{Probe, WaitError};

const CHECKOUT: &str = "checkout";
const CONTINUE_SHOPPING: &str = "continue-shopping";

pub struct CartScreen<'s> {
    session: &'s Session,
    resolver: Resolver<'s>,
}

impl<'s> CartScreen<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self {
            session,
            resolver: session.resolver(ScreenState::Cart),
        }
    }

    /// Compare the number of cart rows with `expected` once two consecutive reads agree
    pub async fn assert_item_count(&self, expected: usize) -> E2eResult<()> {
        self.session
            .confirm_screen(self.resolver.screen(), ScreenState::Cart, "assert_item_count")
            .await?;

        let driver = self.session.driver();
        let rows = &Locator::test_id(INVENTORY_ITEM);
        let previous = &AtomicUsize::new(usize::MAX);
        let settled = self
            .resolver
            .budget()
            .poll(move || async move {
                let count = driver.count(rows).await?;
                if previous.swap(count, Ordering::SeqCst) == count {
                    Ok(Probe::Ready(count))
                } else {
                    Ok(Probe::Waiting(format!("{} row(s), still changing", count)))
                }
            })
            .await
            .map_err(|err| match err {
                WaitError::Elapsed { last_observed, .. } => {
                    E2eError::assertion(ScreenState::Cart, "assert_item_count", expected, last_observed)
                }
                WaitError::Driver(err) => E2eError::Driver(err),
            })?;

        if settled == expected {
            Ok(())
        } else {
            Err(E2eError::assertion(
                ScreenState::Cart,
                "assert_item_count",
                expected,
                settled,
            ))
        }
    }

    /// Confirm a row with exactly `product_name` is listed
    pub async fn assert_contains(&self, product_name: &str) -> E2eResult<()> {
        let driver = self.session.driver();
        let names = &Locator::test_id(ITEM_NAME);
        self.resolver
            .budget()
            .poll(move || async move {
                let count = driver.count(names).await?;
                let mut seen = Vec::with_capacity(count);
                for index in 0..count {
                    seen.push(driver.text(names, index).await?);
                }
                Ok(if seen.iter().any(|name| name == product_name) {
                    Probe::Ready(())
                } else {
                    Probe::Waiting(format!("{:?}", seen))
                })
            })
            .await
            .map_err(|err| match err {
                WaitError::Elapsed { last_observed, .. } => E2eError::assertion(
                    ScreenState::Cart,
                    "assert_contains",
                    format!("a row named {:?}", product_name),
                    last_observed,
                ),
                WaitError::Driver(err) => E2eError::Driver(err),
            })
    }

    pub async fn read_names(&self) -> E2eResult<Vec<String>> {
        if self.resolver.count(&Locator::test_id(ITEM_NAME)).await? == 0 {
            return Ok(Vec::new());
        }
        self.resolver
            .texts(Locator::test_id(ITEM_NAME), "read_names")
            .await
    }

    pub async fn proceed_to_checkout(self) -> E2eResult<CheckoutInfoScreen<'s>> {
        self.resolver
            .resolve(Locator::test_id(CHECKOUT), "proceed_to_checkout")
            .await?
            .click()
            .await?;
        self.session
            .confirm_screen(self.resolver.screen(), ScreenState::CheckoutInfo, "proceed_to_checkout")
            .await?;
        Ok(CheckoutInfoScreen::new(self.session))
    }

    pub async fn continue_shopping(self) -> E2eResult<ListingScreen<'s>> {
        self.resolver
            .resolve(Locator::test_id(CONTINUE_SHOPPING), "continue_shopping")
            .await?
            .click()
            .await?;
        self.session
            .confirm_screen(self.resolver.screen(), ScreenState::Listing, "continue_shopping")
            .await?;
        Ok(ListingScreen::new(self.session))
    }
}
