use storefront_common::{MoneyAmount, ScreenState, SortOrder};
use tracing::info;

use super::{
    assert_text, read_amounts, CartScreen, CART_BADGE, CART_LINK, INVENTORY_ITEM, ITEM_NAME,
    ITEM_PRICE,
};
use crate::error::{E2eError, E2eResult};
use crate::locator::{Locator, Resolver, Role};
use crate::session::Session;
use crate::wait::{Probe, WaitError};

const INVENTORY_CONTAINER: &str = "inventory-container";
const SORT_SELECT: &str = "product-sort-container";
const ACTIVE_SORT: &str = "active-option";
const ADD_TO_CART: &str = "add-to-cart";
const REMOVE: &str = "remove";
const IMAGE_SUFFIX: &str = "-img";
const ADD_TO_CART_LABEL: &str = "Add to cart";

pub struct ListingScreen<'s> {
    session: &'s Session,
    resolver: Resolver<'s>,
}

impl<'s> ListingScreen<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self {
            session,
            resolver: session.resolver(ScreenState::Listing),
        }
    }

    fn item(name: &str) -> Locator {
        Locator::test_id(INVENTORY_ITEM).containing(name)
    }

    /// Confirm the listing is shown. Safe to call repeatedly.
    pub async fn assert_loaded(&self) -> E2eResult<()> {
        self.session
            .confirm_screen(self.resolver.screen(), ScreenState::Listing, "assert_loaded")
            .await?;
        self.resolver
            .resolve(Locator::test_id(INVENTORY_CONTAINER), "assert_loaded")
            .await?;
        Ok(())
    }

    pub async fn sort_by(&self, order: SortOrder) -> E2eResult<()> {
        info!(order = order.option_value(), "Sorting listing");
        self.resolver
            .resolve(Locator::test_id(SORT_SELECT), "sort_by")
            .await?
            .select_option(order.option_value())
            .await?;
        assert_text(
            &self.resolver,
            Locator::test_id(ACTIVE_SORT),
            order.label(),
            "sort_by",
        )
        .await
    }

    /// Add the product named `product_name`, confirmed by its button turning into "Remove"
    pub async fn add_to_cart(&self, product_name: &str) -> E2eResult<()> {
        info!(product = product_name, "Adding to cart");
        self.resolver
            .resolve(
                Self::item(product_name).descendant(Locator::test_id_prefix(ADD_TO_CART)),
                "add_to_cart",
            )
            .await?
            .click()
            .await?;
        self.resolver
            .resolve(
                Self::item(product_name).descendant(Locator::test_id_prefix(REMOVE)),
                "add_to_cart",
            )
            .await?;
        Ok(())
    }

    /// Press the `position`th "Add to cart" button, confirmed by the cart badge incrementing
    pub async fn add_to_cart_at(&self, position: usize) -> E2eResult<()> {
        let before = self.cart_badge_count().await?;
        info!(position, "Adding to cart by position");
        self.resolver
            .resolve_nth(
                Locator::role(Role::Button, ADD_TO_CART_LABEL),
                position,
                "add_to_cart_at",
            )
            .await?
            .click()
            .await?;
        self.wait_for_badge(before + 1, "add_to_cart_at").await
    }

    /// Listed prices in display order
    pub async fn read_prices(&self) -> E2eResult<Vec<MoneyAmount>> {
        read_amounts(&self.resolver, Locator::test_id(ITEM_PRICE), "read_prices").await
    }

    /// Listed product names in display order
    pub async fn read_names(&self) -> E2eResult<Vec<String>> {
        self.resolver
            .texts(Locator::test_id(ITEM_NAME), "read_names")
            .await
    }

    /// `src` of every product image in display order
    pub async fn read_image_sources(&self) -> E2eResult<Vec<String>> {
        let sources = self
            .resolver
            .attributes(
                Locator::test_id(INVENTORY_ITEM).descendant(Locator::test_id_suffix(IMAGE_SUFFIX)),
                "src",
                "read_image_sources",
            )
            .await?;
        Ok(sources
            .into_iter()
            .map(|src| image_path(&src.unwrap_or_default()).to_string())
            .collect())
    }

    /// Count shown on the cart badge; no badge means an empty cart
    pub async fn cart_badge_count(&self) -> E2eResult<usize> {
        let badge = Locator::test_id(CART_BADGE);
        if self.resolver.count(&badge).await? == 0 {
            return Ok(0);
        }
        let text = self.session.driver().text(&badge, 0).await?;
        text.parse()
            .map_err(|_| E2eError::assertion(ScreenState::Listing, "cart_badge_count", "a count", text))
    }

    /// Wait for the cart badge to show `expected`
    pub async fn assert_cart_badge(&self, expected: usize) -> E2eResult<()> {
        self.wait_for_badge(expected, "assert_cart_badge").await
    }

    async fn wait_for_badge(&self, expected: usize, operation: &'static str) -> E2eResult<()> {
        let driver = self.session.driver();
        let badge = &Locator::test_id(CART_BADGE);
        self.resolver
            .budget()
            .poll(move || async move {
                let shown = if driver.count(badge).await? == 0 {
                    String::from("0")
                } else {
                    driver.text(badge, 0).await?
                };
                Ok(if shown == expected.to_string() {
                    Probe::Ready(())
                } else {
                    Probe::Waiting(shown)
                })
            })
            .await
            .map_err(|err| match err {
                WaitError::Elapsed { last_observed, .. } => {
                    E2eError::assertion(ScreenState::Listing, operation, expected, last_observed)
                }
                WaitError::Driver(err) => E2eError::Driver(err),
            })
    }

    pub async fn go_to_cart(self) -> E2eResult<CartScreen<'s>> {
        self.resolver
            .resolve(Locator::test_id(CART_LINK), "go_to_cart")
            .await?
            .click()
            .await?;
        self.session
            .confirm_screen(self.resolver.screen(), ScreenState::Cart, "go_to_cart")
            .await?;
        Ok(CartScreen::new(self.session))
    }
}

/// Path part of an image URL; the browser reports `src` fully resolved
fn image_path(src: &str) -> &str {
    match src.split_once("://") {
        Some((_, rest)) => rest.find('/').map(|i| &rest[i..]).unwrap_or("/"),
        None => src,
    }
}

#[cfg(test)]
mod tests {
    use super::image_path;

    #[test]
    fn image_paths() {
        assert_eq!(
            image_path("https://www.saucedemo.com/static/media/sl-404.168b1cce.jpg"),
            "/static/media/sl-404.168b1cce.jpg"
        );
        assert_eq!(
            image_path("/static/media/bolt-shirt-1200x1500.jpg"),
            "/static/media/bolt-shirt-1200x1500.jpg"
        );
    }
}
