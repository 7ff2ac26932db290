//! Screen abstractions
//!
//! One type per screen of the purchase flow. Each exposes only the actions and
//! observations that make sense on that screen; a method that moves to another
//! screen confirms the move and returns that screen's type.

mod cart;
mod checkout_info;
mod checkout_overview;
mod complete;
mod listing;
mod login;

pub use cart::CartScreen;
pub use checkout_info::CheckoutInfoScreen;
pub use checkout_overview::CheckoutOverviewScreen;
pub use complete::CompleteScreen;
pub use listing::ListingScreen;
pub use login::LoginScreen;

use storefront_common::MoneyAmount;

use crate::error::{E2eError, E2eResult};
use crate::locator::{Locator, Resolver};
use crate::wait::{Probe, WaitError};

/// `data-test` ids shared by several screens
pub const TITLE: &str = "title";
pub const ERROR_BANNER: &str = "error";
pub const INVENTORY_ITEM: &str = "inventory-item";
pub const ITEM_NAME: &str = "inventory-item-name";
pub const ITEM_PRICE: &str = "inventory-item-price";
pub const CART_LINK: &str = "shopping-cart-link";
pub const CART_BADGE: &str = "shopping-cart-badge";

fn parse_amount(resolver: &Resolver<'_>, operation: &'static str, text: &str) -> E2eResult<MoneyAmount> {
    MoneyAmount::parse(text)
        .map_err(|_| E2eError::assertion(resolver.screen(), operation, "a currency amount", text))
}

/// Read every match of `locator` as a currency amount
async fn read_amounts(
    resolver: &Resolver<'_>,
    locator: Locator,
    operation: &'static str,
) -> E2eResult<Vec<MoneyAmount>> {
    resolver
        .texts(locator, operation)
        .await?
        .iter()
        .map(|text| parse_amount(resolver, operation, text))
        .collect()
}

async fn read_amount(
    resolver: &Resolver<'_>,
    locator: Locator,
    operation: &'static str,
) -> E2eResult<MoneyAmount> {
    let text = resolver.resolve(locator, operation).await?.text().await?;
    parse_amount(resolver, operation, &text)
}

/// Wait for `locator` to show exactly `expected`.
///
/// An element that never appears is a `ResolutionFailure`; one that shows other
/// text until the budget runs out is an `AssertionFailure`.
async fn assert_text(
    resolver: &Resolver<'_>,
    locator: Locator,
    expected: &str,
    operation: &'static str,
) -> E2eResult<()> {
    let element = resolver.resolve(locator, operation).await?;
    let driver = resolver.driver();
    let (target, index) = (element.locator(), element.index());
    resolver
        .budget()
        .poll(move || async move {
            let actual = driver.text(target, index).await?;
            Ok(if actual == expected {
                Probe::Ready(())
            } else {
                Probe::Waiting(actual)
            })
        })
        .await
        .map_err(|err| match err {
            WaitError::Elapsed { last_observed, .. } => E2eError::assertion(
                resolver.screen(),
                operation,
                format!("{:?}", expected),
                format!("{:?}", last_observed),
            ),
            WaitError::Driver(err) => E2eError::Driver(err),
        })
}
