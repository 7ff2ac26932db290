//! Session context provider
//!
//! A [`Session`] is one isolated driver connection plus the settings every
//! screen needs. It moves through `Uninitialized -> Authenticating -> Ready ->
//! TornDown`. [`SessionFactory::scoped`] runs a scenario body against a fresh
//! session and releases it on every exit path: success, failure, timeout and
//! panic.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use storefront_common::{Credential, ScreenState};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::HarnessConfig;
use crate::driver::{Driver, DriverError, DriverFactory};
use crate::error::{E2eError, E2eResult};
use crate::locator::{Locator, Resolver};
use crate::screens::{ListingScreen, LoginScreen, ERROR_BANNER, TITLE};
use crate::wait::{Probe, WaitBudget, WaitError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Uninitialized,
    Authenticating,
    Ready,
    TornDown,
}

/// Settings shared by every session a factory opens
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub base_url: String,
    pub budget: WaitBudget,
    pub scenario_timeout: Duration,
}

impl SessionSettings {
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self {
            base_url: config.base_url().to_string(),
            budget: config.waits.action_budget(),
            scenario_timeout: config.waits.scenario_timeout(),
        }
    }
}

pub struct Session {
    id: Uuid,
    driver: Arc<dyn Driver>,
    settings: Arc<SessionSettings>,
    state: Mutex<SessionState>,
    identity: Mutex<Option<String>>,
}

impl Session {
    fn new(driver: Arc<dyn Driver>, settings: Arc<SessionSettings>) -> Self {
        Self {
            id: Uuid::new_v4(),
            driver,
            settings,
            state: Mutex::new(SessionState::Uninitialized),
            identity: Mutex::new(None),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    fn set_state(&self, next: SessionState) {
        let mut state = self.state.lock();
        debug!(session = %self.id, from = ?*state, to = ?next, "session state");
        *state = next;
    }

    /// Identifier of the credential this session logged in with
    pub fn identity(&self) -> Option<String> {
        self.identity.lock().clone()
    }

    pub fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    pub fn budget(&self) -> WaitBudget {
        self.settings.budget
    }

    pub fn url_for(&self, screen: ScreenState) -> String {
        format!("{}{}", self.settings.base_url, screen.path())
    }

    pub fn resolver(&self, screen: ScreenState) -> Resolver<'_> {
        Resolver::new(self.driver(), self.settings.budget, screen)
    }

    pub fn login(&self) -> LoginScreen<'_> {
        LoginScreen::new(self)
    }

    pub fn listing(&self) -> ListingScreen<'_> {
        ListingScreen::new(self)
    }

    /// Screen the browser shows right now, if its URL and marker agree
    pub async fn current_screen(&self) -> E2eResult<Option<ScreenState>> {
        let url = self.driver.current_url().await?;
        match ScreenState::from_url(&url) {
            Some(state) if self.marker_present(state).await? => Ok(Some(state)),
            _ => Ok(None),
        }
    }

    async fn marker_present(&self, state: ScreenState) -> Result<bool, DriverError> {
        match state.title() {
            None => {
                let button = Locator::test_id("login-button");
                Ok(self.driver.count(&button).await? > 0)
            }
            Some(expected) => {
                let title = Locator::test_id(TITLE);
                if self.driver.count(&title).await? == 0 {
                    return Ok(false);
                }
                Ok(self.driver.text(&title, 0).await? == expected)
            }
        }
    }

    /// Wait until the browser shows `expected`.
    ///
    /// Fails with `StateMismatch` attributed to `screen`, the screen the
    /// operation started from, naming the last URL seen and any error banner.
    pub async fn confirm_screen(
        &self,
        screen: ScreenState,
        expected: ScreenState,
        operation: &'static str,
    ) -> E2eResult<()> {
        let session = self;
        self.settings
            .budget
            .poll(move || async move {
                let url = session.driver.current_url().await?;
                if ScreenState::from_url(&url) == Some(expected)
                    && session.marker_present(expected).await?
                {
                    return Ok(Probe::Ready(()));
                }
                let banner = Locator::test_id(ERROR_BANNER);
                let observed = if session.driver.count(&banner).await? > 0 {
                    format!("{} with error banner {:?}", url, session.driver.text(&banner, 0).await?)
                } else {
                    url
                };
                Ok(Probe::Waiting(observed))
            })
            .await
            .map_err(|err| match err {
                WaitError::Elapsed { last_observed, .. } => E2eError::StateMismatch {
                    screen,
                    expected,
                    operation,
                    observed: last_observed,
                },
                WaitError::Driver(err) => E2eError::Driver(err),
            })
    }

    /// Tear down: close the driver connection. The session cannot be used afterwards.
    pub async fn release(self) -> E2eResult<()> {
        self.set_state(SessionState::TornDown);
        info!(session = %self.id, "Releasing session");
        match self.driver.close().await {
            Ok(()) | Err(DriverError::Closed) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.state() == SessionState::TornDown {
            return;
        }
        warn!(session = %self.id, "Session dropped without release, closing in background");
        *self.state.lock() = SessionState::TornDown;
        let driver = Arc::clone(&self.driver);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                let _ = driver.close().await;
            });
        }
    }
}

/// Opens isolated sessions
#[derive(Clone)]
pub struct SessionFactory {
    drivers: Arc<dyn DriverFactory>,
    settings: Arc<SessionSettings>,
}

impl SessionFactory {
    pub fn new(drivers: Arc<dyn DriverFactory>, settings: SessionSettings) -> Self {
        Self {
            drivers,
            settings: Arc::new(settings),
        }
    }

    pub fn from_config(drivers: Arc<dyn DriverFactory>, config: &HarnessConfig) -> Self {
        Self::new(drivers, SessionSettings::from_config(config))
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Open a fresh, unauthenticated session
    pub async fn connect(&self) -> E2eResult<Session> {
        let driver = self.drivers.open().await?;
        let session = Session::new(driver, Arc::clone(&self.settings));
        debug!(session = %session.id, "Connected");
        Ok(session)
    }

    /// Open a session and log in, returning it at the listing screen
    pub async fn acquire(&self, credential: &Credential) -> E2eResult<Session> {
        let session = self.connect().await?;
        match authenticate(&session, credential).await {
            Ok(()) => Ok(session),
            Err(err) => {
                if let Err(release_err) = session.release().await {
                    warn!("Release after failed login also failed: {}", release_err);
                }
                Err(err)
            }
        }
    }

    /// Run `body` in a session logged in as `credential`
    pub async fn with_session<T, F>(&self, credential: &Credential, body: F) -> E2eResult<T>
    where
        F: for<'s> FnOnce(&'s Session) -> BoxFuture<'s, E2eResult<T>>,
    {
        self.scoped(&credential.identifier, Some(credential), body).await
    }

    /// Run `body` in a session that has not logged in
    pub async fn with_anonymous_session<T, F>(&self, body: F) -> E2eResult<T>
    where
        F: for<'s> FnOnce(&'s Session) -> BoxFuture<'s, E2eResult<T>>,
    {
        self.scoped("anonymous", None, body).await
    }

    /// Connect, optionally log in, run `body` under the scenario timeout, then release.
    ///
    /// The scenario timeout covers connecting too. Release is bounded by the
    /// action budget so a hung driver cannot stall the caller. `label` names
    /// the run in timeout errors.
    pub async fn scoped<T, F>(
        &self,
        label: &str,
        credential: Option<&Credential>,
        body: F,
    ) -> E2eResult<T>
    where
        F: for<'s> FnOnce(&'s Session) -> BoxFuture<'s, E2eResult<T>>,
    {
        let limit = self.settings.scenario_timeout;
        let deadline = Instant::now() + limit;
        let timed_out = || E2eError::ScenarioTimeout {
            scenario: label.to_string(),
            timeout_ms: limit.as_millis() as u64,
        };

        let session = match tokio::time::timeout_at(deadline, self.connect()).await {
            Ok(connected) => connected?,
            Err(_) => {
                warn!(scenario = label, "Timed out opening a driver session");
                return Err(timed_out());
            }
        };

        let outcome = {
            let work = async {
                if let Some(credential) = credential {
                    authenticate(&session, credential).await?;
                }
                body(&session).await
            };
            match tokio::time::timeout_at(deadline, AssertUnwindSafe(work).catch_unwind()).await {
                Ok(Ok(result)) => result,
                Ok(Err(panic)) => Err(E2eError::ScenarioPanicked(panic_message(panic.as_ref()))),
                Err(_) => Err(timed_out()),
            }
        };

        let id = session.id;
        let release_limit = self.settings.budget.timeout;
        match tokio::time::timeout(release_limit, session.release()).await {
            Ok(Ok(())) => outcome,
            Ok(Err(release_err)) => {
                warn!("Session release failed: {}", release_err);
                outcome.and(Err(release_err))
            }
            Err(_) => {
                warn!(
                    session = %id,
                    "Session release did not finish within {} ms, driver may be left open",
                    release_limit.as_millis()
                );
                outcome
            }
        }
    }
}

/// Log `session` in as `credential` and confirm the listing is shown
async fn authenticate(session: &Session, credential: &Credential) -> E2eResult<()> {
    session.set_state(SessionState::Authenticating);
    *session.identity.lock() = Some(credential.identifier.clone());

    let login = session.login();
    let result = async {
        login.open().await?;
        login.submit(credential).await?;
        login.assert_succeeded().await.map(|_| ())
    }
    .await;

    match result {
        Ok(()) => {
            session.set_state(SessionState::Ready);
            info!(session = %session.id, persona = %credential.identifier, "Authenticated");
            Ok(())
        }
        Err(err) => Err(E2eError::AuthenticationFailure {
            persona: credential.identifier.clone(),
            reason: err.to_string(),
        }),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("kaboom"));
        assert_eq!(panic_message(boxed.as_ref()), "kaboom");
        let boxed: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(boxed.as_ref()), "non-string panic payload");
    }
}
