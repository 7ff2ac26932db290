use storefront_common::{ScreenState, ShippingInfo};
use tracing::info;

use super::{assert_text, CheckoutOverviewScreen, ERROR_BANNER};
use crate::error::{E2eError, E2eResult};
use crate::locator::{Locator, Resolver};
use crate::session::Session;

const FIRST_NAME: &str = "firstName";
const LAST_NAME: &str = "lastName";
const POSTAL_CODE: &str = "postalCode";
const CONTINUE: &str = "continue";

pub struct CheckoutInfoScreen<'s> {
    session: &'s Session,
    resolver: Resolver<'s>,
}

impl<'s> CheckoutInfoScreen<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self {
            session,
            resolver: session.resolver(ScreenState::CheckoutInfo),
        }
    }

    async fn fill_and_continue(&self, info: &ShippingInfo, operation: &'static str) -> E2eResult<()> {
        for (field, value) in [
            (FIRST_NAME, &info.given_name),
            (LAST_NAME, &info.family_name),
            (POSTAL_CODE, &info.postal_code),
        ] {
            self.resolver
                .resolve(Locator::test_id(field), operation)
                .await?
                .fill(value)
                .await?;
        }
        self.resolver
            .resolve(Locator::test_id(CONTINUE), operation)
            .await?
            .click()
            .await
    }

    /// Enter shipping details and continue to the overview.
    ///
    /// Fields are sent as given; if the storefront rejects them the result is a
    /// `StateMismatch` naming the error banner it showed.
    pub async fn submit(self, info: &ShippingInfo) -> E2eResult<CheckoutOverviewScreen<'s>> {
        info!(postal_code = %info.postal_code, "Submitting shipping details");
        self.fill_and_continue(info, "submit").await?;
        self.session
            .confirm_screen(self.resolver.screen(), ScreenState::CheckoutOverview, "submit")
            .await?;
        Ok(CheckoutOverviewScreen::new(self.session))
    }

    /// Enter shipping details the storefront should refuse, and confirm it stays here
    pub async fn submit_expecting_rejection(&self, info: &ShippingInfo) -> E2eResult<()> {
        self.fill_and_continue(info, "submit_expecting_rejection").await?;
        self.resolver
            .resolve(Locator::test_id(ERROR_BANNER), "submit_expecting_rejection")
            .await?;

        let url = self.session.driver().current_url().await?;
        if ScreenState::from_url(&url) != Some(ScreenState::CheckoutInfo) {
            return Err(E2eError::StateMismatch {
                screen: self.resolver.screen(),
                expected: ScreenState::CheckoutInfo,
                operation: "submit_expecting_rejection",
                observed: url,
            });
        }
        Ok(())
    }

    pub async fn assert_error(&self, expected: &str) -> E2eResult<()> {
        assert_text(&self.resolver, Locator::test_id(ERROR_BANNER), expected, "assert_error").await
    }
}
