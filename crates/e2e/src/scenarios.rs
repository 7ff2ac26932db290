//! Built-in storefront scenarios
//!
//! Each scenario is a plain function from a [`Session`] to a boxed future. The
//! runner opens the session, logs in as the scenario's persona (if any) and
//! tears it down afterwards, so bodies start on the listing screen, or on a
//! blank page for anonymous scenarios.

use futures::future::BoxFuture;
use futures::FutureExt;
use storefront_common::catalog::{
    BAD_CREDENTIALS_MESSAGE, FIRST_NAME_REQUIRED_MESSAGE, LOCKED_OUT_MESSAGE,
    ORDER_CONFIRMATION_MESSAGE,
};
use storefront_common::persona::BROKEN_IMAGE_SOURCE;
use storefront_common::verifier::is_ordered;
use storefront_common::{Credential, Persona, ProductKey, ScreenState, ShippingInfo, SortOrder};

use crate::error::{E2eError, E2eResult};
use crate::session::Session;

pub type ScenarioFn = for<'s> fn(&'s Session) -> BoxFuture<'s, E2eResult<()>>;

/// A named, tagged scenario body
#[derive(Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    pub tags: &'static [&'static str],
    /// Logged in before the body runs; `None` leaves the session anonymous
    pub persona: Option<Persona>,
    pub body: ScenarioFn,
}

impl Scenario {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(&tag)
    }
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("persona", &self.persona)
            .finish()
    }
}

/// Every built-in scenario, in execution order
pub fn catalog() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "login-standard",
            description: "Standard user lands on the product listing",
            tags: &["auth", "smoke"],
            persona: Some(Persona::Standard),
            body: lands_on_listing,
        },
        Scenario {
            name: "login-problem",
            description: "Problem user still lands on the product listing",
            tags: &["auth"],
            persona: Some(Persona::Problem),
            body: lands_on_listing,
        },
        Scenario {
            name: "login-performance-glitch",
            description: "Slow user lands on the product listing within the wait budget",
            tags: &["auth", "performance"],
            persona: Some(Persona::DegradedPerformance),
            body: lands_on_listing,
        },
        Scenario {
            name: "login-locked-out",
            description: "Locked-out user is refused with the lockout message",
            tags: &["auth", "negative"],
            persona: None,
            body: locked_out_is_refused,
        },
        Scenario {
            name: "login-wrong-password",
            description: "A wrong secret is refused with the mismatch message",
            tags: &["auth", "negative"],
            persona: None,
            body: wrong_password_is_refused,
        },
        Scenario {
            name: "sort-price-ascending",
            description: "Low to high sort yields non-decreasing prices",
            tags: &["listing", "sort"],
            persona: Some(Persona::Standard),
            body: sorts_price_ascending,
        },
        Scenario {
            name: "sort-price-descending",
            description: "High to low sort yields non-increasing prices",
            tags: &["listing", "sort"],
            persona: Some(Persona::Standard),
            body: sorts_price_descending,
        },
        Scenario {
            name: "sort-name-descending",
            description: "Z to A sort yields non-increasing names",
            tags: &["listing", "sort"],
            persona: Some(Persona::Standard),
            body: sorts_name_descending,
        },
        Scenario {
            name: "cart-single-product",
            description: "One added product shows up alone in the cart",
            tags: &["cart", "smoke"],
            persona: Some(Persona::Standard),
            body: single_product_in_cart,
        },
        Scenario {
            name: "cart-by-position",
            description: "Products added by listing position are counted by the badge and the cart",
            tags: &["cart"],
            persona: Some(Persona::Standard),
            body: add_by_position,
        },
        Scenario {
            name: "cart-continue-shopping",
            description: "Returning from the cart keeps its contents",
            tags: &["cart"],
            persona: Some(Persona::Standard),
            body: continue_shopping_keeps_cart,
        },
        Scenario {
            name: "checkout-purchase",
            description: "Backpack purchase with verified totals ends in the confirmation message",
            tags: &["checkout", "smoke"],
            persona: Some(Persona::Standard),
            body: purchase_backpack,
        },
        Scenario {
            name: "checkout-missing-first-name",
            description: "Checkout refuses shipping details without a given name",
            tags: &["checkout", "negative"],
            persona: Some(Persona::Standard),
            body: missing_first_name_is_refused,
        },
        Scenario {
            name: "problem-user-images",
            description: "Problem user sees the placeholder image for every product",
            tags: &["persona"],
            persona: Some(Persona::Problem),
            body: problem_user_images_are_broken,
        },
        Scenario {
            name: "performance-glitch-add-to-cart",
            description: "Slow user's add-to-cart still reaches a badge of 1",
            tags: &["persona", "performance"],
            persona: Some(Persona::DegradedPerformance),
            body: glitch_add_to_cart,
        },
        Scenario {
            name: "idempotent-assertions",
            description: "Repeated screen assertions leave the screen unchanged",
            tags: &["listing", "checkout"],
            persona: Some(Persona::Standard),
            body: repeated_assertions,
        },
    ]
}

/// Scenarios carrying `tag`
pub fn tagged(tag: &str) -> Vec<Scenario> {
    catalog().into_iter().filter(|s| s.has_tag(tag)).collect()
}

pub fn find(name: &str) -> Option<Scenario> {
    catalog().into_iter().find(|s| s.name == name)
}

async fn expect_screen(session: &Session, expected: ScreenState, operation: &'static str) -> E2eResult<()> {
    let observed = session.current_screen().await?;
    if observed == Some(expected) {
        Ok(())
    } else {
        Err(E2eError::StateMismatch {
            screen: expected,
            expected,
            operation,
            observed: observed.map_or_else(|| "an unknown page".to_string(), |s| s.to_string()),
        })
    }
}

fn lands_on_listing(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        session.listing().assert_loaded().await?;
        expect_screen(session, ScreenState::Listing, "lands_on_listing").await
    }
    .boxed()
}

async fn refused(session: &Session, credential: Credential, message: &str) -> E2eResult<()> {
    let login = session.login();
    login.open().await?;
    login.submit(&credential).await?;
    login.assert_error(message).await?;
    expect_screen(session, ScreenState::Login, "assert_error").await
}

fn locked_out_is_refused(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    refused(session, Persona::LockedOut.credential(), LOCKED_OUT_MESSAGE).boxed()
}

fn wrong_password_is_refused(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    let credential = Credential::new(Persona::Standard.identifier(), "not_the_secret");
    refused(session, credential, BAD_CREDENTIALS_MESSAGE).boxed()
}

async fn check_price_order(session: &Session, order: SortOrder) -> E2eResult<()> {
    let listing = session.listing();
    listing.sort_by(order).await?;
    let prices = listing.read_prices().await?;
    if is_ordered(&prices, order.direction()) {
        Ok(())
    } else {
        let rendered: Vec<String> = prices.iter().map(ToString::to_string).collect();
        Err(E2eError::assertion(
            ScreenState::Listing,
            "read_prices",
            format!("{:?} prices", order.direction()),
            rendered.join(", "),
        ))
    }
}

fn sorts_price_ascending(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    check_price_order(session, SortOrder::PriceAscending).boxed()
}

fn sorts_price_descending(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    check_price_order(session, SortOrder::PriceDescending).boxed()
}

fn sorts_name_descending(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let listing = session.listing();
        listing.sort_by(SortOrder::NameDescending).await?;
        let names = listing.read_names().await?;
        if is_ordered(&names, SortOrder::NameDescending.direction()) {
            Ok(())
        } else {
            Err(E2eError::assertion(
                ScreenState::Listing,
                "read_names",
                "names in Z to A order",
                format!("{:?}", names),
            ))
        }
    }
    .boxed()
}

fn single_product_in_cart(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let product = ProductKey::Backpack.display_name();
        let listing = session.listing();
        listing.add_to_cart(product).await?;
        listing.assert_cart_badge(1).await?;

        let cart = listing.go_to_cart().await?;
        cart.assert_item_count(1).await?;
        cart.assert_contains(product).await
    }
    .boxed()
}

fn add_by_position(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let listing = session.listing();
        listing.add_to_cart_at(0).await?;
        listing.add_to_cart_at(0).await?;
        listing.assert_cart_badge(2).await?;

        let cart = listing.go_to_cart().await?;
        cart.assert_item_count(2).await
    }
    .boxed()
}

fn continue_shopping_keeps_cart(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let listing = session.listing();
        listing.add_to_cart(ProductKey::Onesie.display_name()).await?;

        let listing = listing.go_to_cart().await?.continue_shopping().await?;
        listing.assert_loaded().await?;
        listing.assert_cart_badge(1).await
    }
    .boxed()
}

fn purchase_backpack(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let product = ProductKey::Backpack.display_name();
        let listing = session.listing();
        listing.add_to_cart(product).await?;

        let cart = listing.go_to_cart().await?;
        cart.assert_contains(product).await?;

        let overview = cart
            .proceed_to_checkout()
            .await?
            .submit(&ShippingInfo::default())
            .await?;
        overview.verify_totals().await?;

        let complete = overview.finish().await?;
        complete.assert_confirmed(ORDER_CONFIRMATION_MESSAGE).await
    }
    .boxed()
}

fn missing_first_name_is_refused(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let listing = session.listing();
        listing.add_to_cart(ProductKey::BikeLight.display_name()).await?;

        let info = listing.go_to_cart().await?.proceed_to_checkout().await?;
        let shipping = ShippingInfo::new("", "Doe", "12345");
        info.submit_expecting_rejection(&shipping).await?;
        info.assert_error(FIRST_NAME_REQUIRED_MESSAGE).await
    }
    .boxed()
}

fn problem_user_images_are_broken(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let sources = session.listing().read_image_sources().await?;
        match sources.iter().find(|src| src.as_str() != BROKEN_IMAGE_SOURCE) {
            None if !sources.is_empty() => Ok(()),
            None => Err(E2eError::assertion(
                ScreenState::Listing,
                "read_image_sources",
                "at least one product image",
                "none",
            )),
            Some(other) => Err(E2eError::assertion(
                ScreenState::Listing,
                "read_image_sources",
                BROKEN_IMAGE_SOURCE,
                other,
            )),
        }
    }
    .boxed()
}

fn glitch_add_to_cart(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let listing = session.listing();
        listing.add_to_cart(ProductKey::BikeLight.display_name()).await?;
        listing.assert_cart_badge(1).await
    }
    .boxed()
}

fn repeated_assertions(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let listing = session.listing();
        for _ in 0..3 {
            listing.assert_loaded().await?;
        }
        expect_screen(session, ScreenState::Listing, "assert_loaded").await?;

        listing.add_to_cart(ProductKey::Backpack.display_name()).await?;
        let overview = listing
            .go_to_cart()
            .await?
            .proceed_to_checkout()
            .await?
            .submit(&ShippingInfo::default())
            .await?;
        for _ in 0..3 {
            overview.assert_reached().await?;
        }
        expect_screen(session, ScreenState::CheckoutOverview, "assert_reached").await
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique() {
        let scenarios = catalog();
        let names: HashSet<_> = scenarios.iter().map(|s| s.name).collect();
        assert_eq!(names.len(), scenarios.len());
    }

    #[test]
    fn anonymous_scenarios_are_the_login_refusals() {
        let anonymous: Vec<_> = catalog()
            .into_iter()
            .filter(|s| s.persona.is_none())
            .map(|s| s.name)
            .collect();
        assert_eq!(anonymous, vec!["login-locked-out", "login-wrong-password"]);
    }

    #[test]
    fn every_valid_persona_has_a_login_scenario() {
        let logins = tagged("auth");
        for persona in Persona::valid() {
            assert!(
                logins.iter().any(|s| s.persona == Some(persona)),
                "no login scenario for {}",
                persona
            );
        }
    }

    #[test]
    fn find_by_name() {
        assert_eq!(find("checkout-purchase").map(|s| s.name), Some("checkout-purchase"));
        assert!(find("no-such-scenario").is_none());
    }
}
