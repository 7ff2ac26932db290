//! Core types for the storefront flow

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Login identifier and secret for one persona
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub identifier: String,
    pub secret: String,
}

impl Credential {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }
}

/// Shipping details entered on the checkout information screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub given_name: String,
    pub family_name: String,
    pub postal_code: String,
}

impl ShippingInfo {
    pub fn new(
        given_name: impl Into<String>,
        family_name: impl Into<String>,
        postal_code: impl Into<String>,
    ) -> Self {
        Self {
            given_name: given_name.into(),
            family_name: family_name.into(),
            postal_code: postal_code.into(),
        }
    }
}

impl Default for ShippingInfo {
    fn default() -> Self {
        Self::new("John", "Doe", "12345")
    }
}

/// Where a session currently is in the purchase flow.
///
/// Always derived from the live URL path plus a marker element; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenState {
    Login,
    Listing,
    Cart,
    CheckoutInfo,
    CheckoutOverview,
    Complete,
}

impl ScreenState {
    pub const ALL: [ScreenState; 6] = [
        ScreenState::Login,
        ScreenState::Listing,
        ScreenState::Cart,
        ScreenState::CheckoutInfo,
        ScreenState::CheckoutOverview,
        ScreenState::Complete,
    ];

    /// URL path the storefront serves this screen under
    pub fn path(&self) -> &'static str {
        match self {
            ScreenState::Login => "/",
            ScreenState::Listing => "/inventory.html",
            ScreenState::Cart => "/cart.html",
            ScreenState::CheckoutInfo => "/checkout-step-one.html",
            ScreenState::CheckoutOverview => "/checkout-step-two.html",
            ScreenState::Complete => "/checkout-complete.html",
        }
    }

    /// Heading rendered in the `title` element; the login screen has none
    pub fn title(&self) -> Option<&'static str> {
        match self {
            ScreenState::Login => None,
            ScreenState::Listing => Some("Products"),
            ScreenState::Cart => Some("Your Cart"),
            ScreenState::CheckoutInfo => Some("Checkout: Your Information"),
            ScreenState::CheckoutOverview => Some("Checkout: Overview"),
            ScreenState::Complete => Some("Checkout: Complete!"),
        }
    }

    /// Infer the screen from a full URL or a bare path.
    ///
    /// Query strings and fragments are ignored. Unknown paths yield `None`.
    pub fn from_url(url: &str) -> Option<Self> {
        let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
        let path = if url.contains("://") {
            without_scheme
                .find('/')
                .map(|i| &without_scheme[i..])
                .unwrap_or("/")
        } else {
            without_scheme
        };
        let path = path.split(['?', '#']).next().unwrap_or(path);
        let path = if path.is_empty() || path == "/index.html" { "/" } else { path };

        Self::ALL.into_iter().find(|s| s.path() == path)
    }
}

impl std::fmt::Display for ScreenState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScreenState::Login => write!(f, "login"),
            ScreenState::Listing => write!(f, "listing"),
            ScreenState::Cart => write!(f, "cart"),
            ScreenState::CheckoutInfo => write!(f, "checkout-info"),
            ScreenState::CheckoutOverview => write!(f, "checkout-overview"),
            ScreenState::Complete => write!(f, "complete"),
        }
    }
}

/// Listing sort criteria offered by the storefront
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    NameAscending,
    NameDescending,
    PriceAscending,
    PriceDescending,
}

impl SortOrder {
    /// `value` attribute of the matching `<option>`
    pub fn option_value(&self) -> &'static str {
        match self {
            SortOrder::NameAscending => "az",
            SortOrder::NameDescending => "za",
            SortOrder::PriceAscending => "lohi",
            SortOrder::PriceDescending => "hilo",
        }
    }

    /// Visible label shown once the order is active
    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::NameAscending => "Name (A to Z)",
            SortOrder::NameDescending => "Name (Z to A)",
            SortOrder::PriceAscending => "Price (low to high)",
            SortOrder::PriceDescending => "Price (high to low)",
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            SortOrder::NameAscending | SortOrder::PriceAscending => Direction::Ascending,
            SortOrder::NameDescending | SortOrder::PriceDescending => Direction::Descending,
        }
    }

    pub fn from_option_value(value: &str) -> Result<Self> {
        match value {
            "az" => Ok(SortOrder::NameAscending),
            "za" => Ok(SortOrder::NameDescending),
            "lohi" => Ok(SortOrder::PriceAscending),
            "hilo" => Ok(SortOrder::PriceDescending),
            other => Err(Error::UnknownSortOrder(other.to_string())),
        }
    }
}

impl Default for SortOrder {
    fn default() -> Self {
        Self::NameAscending
    }
}

/// Ordering direction for sequence checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Ascending,
    Descending,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("https://www.saucedemo.com/", ScreenState::Login)]
    #[test_case("https://www.saucedemo.com", ScreenState::Login)]
    #[test_case("https://www.saucedemo.com/inventory.html", ScreenState::Listing)]
    #[test_case("https://www.saucedemo.com/cart.html?x=1", ScreenState::Cart)]
    #[test_case("/checkout-step-one.html", ScreenState::CheckoutInfo)]
    #[test_case("http://localhost:3000/checkout-step-two.html#top", ScreenState::CheckoutOverview)]
    #[test_case("/checkout-complete.html", ScreenState::Complete)]
    fn infers_screen_from_url(url: &str, expected: ScreenState) {
        assert_eq!(ScreenState::from_url(url), Some(expected));
    }

    #[test]
    fn unknown_paths_have_no_screen() {
        assert_eq!(ScreenState::from_url("https://www.saucedemo.com/about.html"), None);
    }

    #[test]
    fn paths_round_trip_through_inference() {
        for state in ScreenState::ALL {
            assert_eq!(ScreenState::from_url(state.path()), Some(state));
        }
    }

    #[test]
    fn sort_order_option_values() {
        for order in [
            SortOrder::NameAscending,
            SortOrder::NameDescending,
            SortOrder::PriceAscending,
            SortOrder::PriceDescending,
        ] {
            assert_eq!(SortOrder::from_option_value(order.option_value()), Ok(order));
        }
        assert!(SortOrder::from_option_value("random").is_err());
    }

    #[test]
    fn default_shipping_info() {
        let info = ShippingInfo::default();
        assert_eq!(info.given_name, "John");
        assert_eq!(info.family_name, "Doe");
        assert_eq!(info.postal_code, "12345");
    }
}
