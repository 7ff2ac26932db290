use storefront_common::{Credential, ScreenState};
use tracing::info;

use super::{assert_text, ListingScreen, ERROR_BANNER};
use crate::error::{E2eError, E2eResult};
use crate::locator::{Locator, Resolver};
use crate::session::Session;
use crate::wait::{Probe, WaitError};

const USERNAME: &str = "username";
const PASSWORD: &str = "password";
const LOGIN_BUTTON: &str = "login-button";

pub struct LoginScreen<'s> {
    session: &'s Session,
    resolver: Resolver<'s>,
}

impl<'s> LoginScreen<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self {
            session,
            resolver: session.resolver(ScreenState::Login),
        }
    }

    /// Navigate to the login page
    pub async fn open(&self) -> E2eResult<()> {
        let url = self.session.url_for(ScreenState::Login);
        self.session.driver().goto(&url).await?;
        self.session.confirm_screen(self.resolver.screen(), ScreenState::Login, "open").await
    }

    /// Enter `credential` and press login.
    ///
    /// Returns once the storefront has reacted: either the listing is shown or
    /// an error banner is visible.
    pub async fn submit(&self, credential: &Credential) -> E2eResult<()> {
        info!(persona = %credential.identifier, "Submitting credentials");
        self.resolver
            .resolve(Locator::test_id(USERNAME), "submit")
            .await?
            .fill(&credential.identifier)
            .await?;
        self.resolver
            .resolve(Locator::test_id(PASSWORD), "submit")
            .await?
            .fill(&credential.secret)
            .await?;
        self.resolver
            .resolve(Locator::test_id(LOGIN_BUTTON), "submit")
            .await?
            .click()
            .await?;

        let driver = self.session.driver();
        let banner = &Locator::test_id(ERROR_BANNER);
        self.resolver
            .budget()
            .poll(move || async move {
                let url = driver.current_url().await?;
                if ScreenState::from_url(&url) == Some(ScreenState::Listing)
                    || driver.count(banner).await? > 0
                {
                    Ok(Probe::Ready(()))
                } else {
                    Ok(Probe::Waiting(url))
                }
            })
            .await
            .map_err(|err| match err {
                WaitError::Elapsed { last_observed, .. } => E2eError::StateMismatch {
                    screen: ScreenState::Login,
                    expected: ScreenState::Listing,
                    operation: "submit",
                    observed: last_observed,
                },
                WaitError::Driver(err) => E2eError::Driver(err),
            })
    }

    /// Confirm the login went through and hand over the listing
    pub async fn assert_succeeded(self) -> E2eResult<ListingScreen<'s>> {
        self.session
            .confirm_screen(self.resolver.screen(), ScreenState::Listing, "assert_succeeded")
            .await?;
        Ok(ListingScreen::new(self.session))
    }

    /// Confirm the error banner shows exactly `expected` and the session is still at login
    pub async fn assert_error(&self, expected: &str) -> E2eResult<()> {
        assert_text(&self.resolver, Locator::test_id(ERROR_BANNER), expected, "assert_error").await?;

        let url = self.session.driver().current_url().await?;
        if ScreenState::from_url(&url) != Some(ScreenState::Login) {
            return Err(E2eError::StateMismatch {
                screen: self.resolver.screen(),
                expected: ScreenState::Login,
                operation: "assert_error",
                observed: url,
            });
        }
        Ok(())
    }
}
