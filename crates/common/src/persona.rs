//! Persona catalog
//!
//! Every persona logs in with the storefront's shared secret. The persona
//! decides what the storefront does after that: refuse the login, render
//! broken product images, or respond slowly.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::types::Credential;

/// Secret shared by every catalog persona
pub const SHARED_SECRET: &str = "secret_sauce";

/// Image source every product gets for the problem persona
pub const BROKEN_IMAGE_SOURCE: &str = "/static/media/sl-404.168b1cce.jpg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Persona {
    Standard,
    LockedOut,
    Problem,
    DegradedPerformance,
}

impl Persona {
    pub const ALL: [Persona; 4] = [
        Persona::Standard,
        Persona::LockedOut,
        Persona::Problem,
        Persona::DegradedPerformance,
    ];

    /// Login identifier the storefront knows this persona by
    pub fn identifier(&self) -> &'static str {
        match self {
            Persona::Standard => "standard_user",
            Persona::LockedOut => "locked_out_user",
            Persona::Problem => "problem_user",
            Persona::DegradedPerformance => "performance_glitch_user",
        }
    }

    pub fn credential(&self) -> Credential {
        Credential::new(self.identifier(), SHARED_SECRET)
    }

    /// Whether a login with this persona's credential reaches the listing
    pub fn expects_login_success(&self) -> bool {
        !matches!(self, Persona::LockedOut)
    }

    /// Whether the listing renders placeholder images for this persona
    pub fn has_image_defect(&self) -> bool {
        matches!(self, Persona::Problem)
    }

    pub fn from_identifier(identifier: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.identifier() == identifier)
    }

    pub fn valid() -> impl Iterator<Item = Persona> {
        Self::ALL.into_iter().filter(|p| p.expects_login_success())
    }
}

impl std::fmt::Display for Persona {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Persona::Standard => write!(f, "standard"),
            Persona::LockedOut => write!(f, "locked-out"),
            Persona::Problem => write!(f, "problem"),
            Persona::DegradedPerformance => write!(f, "degraded-performance"),
        }
    }
}

impl FromStr for Persona {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "standard" | "standarduser" => Ok(Persona::Standard),
            "lockedout" | "lockedoutuser" => Ok(Persona::LockedOut),
            "problem" | "problemuser" => Ok(Persona::Problem),
            "degradedperformance" | "performanceglitch" | "performanceglitchuser" => {
                Ok(Persona::DegradedPerformance)
            }
            _ => Err(Error::UnknownPersona(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Persona::Standard, "standard_user")]
    #[test_case(Persona::LockedOut, "locked_out_user")]
    #[test_case(Persona::Problem, "problem_user")]
    #[test_case(Persona::DegradedPerformance, "performance_glitch_user")]
    fn catalog_credentials(persona: Persona, identifier: &str) {
        let credential = persona.credential();
        assert_eq!(credential.identifier, identifier);
        assert_eq!(credential.secret, "secret_sauce");
        assert_eq!(Persona::from_identifier(identifier), Some(persona));
    }

    #[test_case("standard", Persona::Standard)]
    #[test_case("lockedOut", Persona::LockedOut)]
    #[test_case("locked_out", Persona::LockedOut)]
    #[test_case("locked-out", Persona::LockedOut)]
    #[test_case("Problem", Persona::Problem)]
    #[test_case("performanceGlitch", Persona::DegradedPerformance)]
    #[test_case("degraded-performance", Persona::DegradedPerformance)]
    fn parses_persona_names(name: &str, expected: Persona) {
        assert_eq!(name.parse::<Persona>().unwrap(), expected);
    }

    #[test]
    fn rejects_unknown_persona() {
        assert!(matches!(
            "visual_user".parse::<Persona>(),
            Err(Error::UnknownPersona(_))
        ));
    }

    #[test]
    fn only_locked_out_is_refused() {
        let valid: Vec<_> = Persona::valid().collect();
        assert_eq!(valid.len(), 3);
        assert!(!valid.contains(&Persona::LockedOut));
    }

    #[test]
    fn display_parses_back() {
        for persona in Persona::ALL {
            assert_eq!(persona.to_string().parse::<Persona>().unwrap(), persona);
        }
    }
}
