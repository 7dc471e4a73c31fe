//! Observable login state for whatever renders the login screen.

use thiserror::Error;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::sign_in::{Credentials, SignInOrchestrator, SignInOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginViewState {
    pub is_login_successful: bool,
    /// False while an attempt is in flight; renderers show a busy indicator.
    pub is_request_complete: bool,
    pub error_message: String,
}

impl Default for LoginViewState {
    fn default() -> Self {
        Self {
            is_login_successful: false,
            is_request_complete: true,
            error_message: String::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("a sign-in attempt is already in flight")]
    AlreadyInFlight,
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

pub struct LoginSession {
    orchestrator: SignInOrchestrator,
    state: watch::Sender<LoginViewState>,
}

impl LoginSession {
    pub fn new(orchestrator: SignInOrchestrator) -> Self {
        let (state, _) = watch::channel(LoginViewState::default());
        Self {
            orchestrator,
            state,
        }
    }

    pub fn current(&self) -> LoginViewState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoginViewState> {
        self.state.subscribe()
    }

    pub fn updates(&self) -> WatchStream<LoginViewState> {
        WatchStream::new(self.subscribe())
    }

    /// Runs one attempt and folds its outcome into the observable state.
    /// Only one attempt may be in flight per session.
    pub async fn submit(&self, credentials: &Credentials) -> Result<SignInOutcome, SubmitError> {
        let mut claimed = false;
        self.state.send_if_modified(|state| {
            if !state.is_request_complete {
                return false;
            }
            state.is_request_complete = false;
            claimed = true;
            true
        });
        if !claimed {
            return Err(SubmitError::AlreadyInFlight);
        }
        let mut claim = InFlightClaim {
            state: &self.state,
            settled: false,
        };

        let result = self.orchestrator.sign_in(credentials).await;

        claim.settled = true;
        self.state.send_modify(|state| {
            state.is_request_complete = true;
            match &result {
                Ok(outcome) => {
                    state.is_login_successful = outcome.is_success();
                    state.error_message = outcome.message().unwrap_or_default();
                }
                Err(err) => {
                    state.is_login_successful = false;
                    state.error_message = format!("Sign-in failed: {err}");
                }
            }
        });

        Ok(result?)
    }
}

/// Releases the in-flight flag if the attempt is dropped before it settles.
struct InFlightClaim<'a> {
    state: &'a watch::Sender<LoginViewState>,
    settled: bool,
}

impl Drop for InFlightClaim<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.state.send_modify(|state| state.is_request_complete = true);
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
