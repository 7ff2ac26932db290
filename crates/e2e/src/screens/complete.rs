use storefront_common::ScreenState;

use super::{assert_text, ListingScreen};
use crate::error::E2eResult;
use crate::locator::{Locator, Resolver};
use crate::session::Session;

const COMPLETE_HEADER: &str = "complete-header";
const BACK_HOME: &str = "back-to-products";

pub struct CompleteScreen<'s> {
    session: &'s Session,
    resolver: Resolver<'s>,
}

impl<'s> CompleteScreen<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self {
            session,
            resolver: session.resolver(ScreenState::Complete),
        }
    }

    pub async fn assert_confirmed(&self, expected_message: &str) -> E2eResult<()> {
        self.session
            .confirm_screen(self.resolver.screen(), ScreenState::Complete, "assert_confirmed")
            .await?;
        assert_text(
            &self.resolver,
            Locator::test_id(COMPLETE_HEADER),
            expected_message,
            "assert_confirmed",
        )
        .await
    }

    pub async fn back_home(self) -> E2eResult<ListingScreen<'s>> {
        self.resolver
            .resolve(Locator::test_id(BACK_HOME), "back_home")
            .await?
            .click()
            .await?;
        self.session
            .confirm_screen(self.resolver.screen(), ScreenState::Listing, "back_home")
            .await?;
        Ok(ListingScreen::new(self.session))
    }
}
