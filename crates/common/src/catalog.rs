//! Product catalog and the fixed messages the storefront renders

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::money::MoneyAmount;

pub const LOCKED_OUT_MESSAGE: &str = "Epic sadface: Sorry, this user has been locked out.";
pub const BAD_CREDENTIALS_MESSAGE: &str =
    "Epic sadface: Username and password do not match any user in this service";
pub const USERNAME_REQUIRED_MESSAGE: &str = "Epic sadface: Username is required";
pub const PASSWORD_REQUIRED_MESSAGE: &str = "Epic sadface: Password is required";
pub const FIRST_NAME_REQUIRED_MESSAGE: &str = "Error: First Name is required";
pub const LAST_NAME_REQUIRED_MESSAGE: &str = "Error: Last Name is required";
pub const POSTAL_CODE_REQUIRED_MESSAGE: &str = "Error: Postal Code is required";
pub const ORDER_CONFIRMATION_MESSAGE: &str = "Thank you for your order!";

/// Products the storefront lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductKey {
    Backpack,
    BikeLight,
    BoltTShirt,
    FleeceJacket,
    Onesie,
    RedTShirt,
}

impl ProductKey {
    pub const ALL: [ProductKey; 6] = [
        ProductKey::Backpack,
        ProductKey::BikeLight,
        ProductKey::BoltTShirt,
        ProductKey::FleeceJacket,
        ProductKey::Onesie,
        ProductKey::RedTShirt,
    ];

    /// Canonical display name, as rendered in `inventory-item-name`
    pub fn display_name(&self) -> &'static str {
        match self {
            ProductKey::Backpack => "Sauce Labs Backpack",
            ProductKey::BikeLight => "Sauce Labs Bike Light",
            ProductKey::BoltTShirt => "Sauce Labs Bolt T-Shirt",
            ProductKey::FleeceJacket => "Sauce Labs Fleece Jacket",
            ProductKey::Onesie => "Sauce Labs Onesie",
            ProductKey::RedTShirt => "Test.allTheThings() T-Shirt (Red)",
        }
    }

    /// Suffix of the per-product `data-test` ids, e.g. `add-to-cart-<slug>`
    pub fn slug(&self) -> &'static str {
        match self {
            ProductKey::Backpack => "sauce-labs-backpack",
            ProductKey::BikeLight => "sauce-labs-bike-light",
            ProductKey::BoltTShirt => "sauce-labs-bolt-t-shirt",
            ProductKey::FleeceJacket => "sauce-labs-fleece-jacket",
            ProductKey::Onesie => "sauce-labs-onesie",
            ProductKey::RedTShirt => "test.allthethings()-t-shirt-(red)",
        }
    }

    /// Listed price on the public storefront
    pub fn list_price(&self) -> MoneyAmount {
        MoneyAmount::from_cents(match self {
            ProductKey::Backpack => 2999,
            ProductKey::BikeLight => 999,
            ProductKey::BoltTShirt => 1599,
            ProductKey::FleeceJacket => 4999,
            ProductKey::Onesie => 799,
            ProductKey::RedTShirt => 1599,
        })
    }

    pub fn from_display_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.display_name() == name)
    }
}

impl std::fmt::Display for ProductKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ProductKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.to_ascii_lowercase();
        match key.as_str() {
            "backpack" => Ok(ProductKey::Backpack),
            "bike-light" | "bikelight" => Ok(ProductKey::BikeLight),
            "bolt-t-shirt" | "bolttshirt" => Ok(ProductKey::BoltTShirt),
            "fleece-jacket" | "jacket" => Ok(ProductKey::FleeceJacket),
            "onesie" => Ok(ProductKey::Onesie),
            "red-t-shirt" | "redtshirt" => Ok(ProductKey::RedTShirt),
            _ => Self::from_display_name(s).ok_or_else(|| Error::UnknownProduct(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_are_unique() {
        let mut names: Vec<_> = ProductKey::ALL.iter().map(|p| p.display_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ProductKey::ALL.len());
    }

    #[test]
    fn short_keys_resolve() {
        assert_eq!("backpack".parse::<ProductKey>().unwrap(), ProductKey::Backpack);
        assert_eq!("jacket".parse::<ProductKey>().unwrap(), ProductKey::FleeceJacket);
        assert_eq!(
            "Sauce Labs Onesie".parse::<ProductKey>().unwrap(),
            ProductKey::Onesie
        );
        assert!(matches!(
            "umbrella".parse::<ProductKey>(),
            Err(Error::UnknownProduct(_))
        ));
    }

    #[test]
    fn backpack_price() {
        assert_eq!(ProductKey::Backpack.list_price().to_string(), "$29.99");
    }
}
