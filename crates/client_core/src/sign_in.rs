//! One sign-in attempt: validate, check reachability, fetch, persist.

use std::{collections::HashSet, fmt, sync::Arc};

use anyhow::{Context, Result};
use storage::MedicineStore;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    connectivity::Connectivity,
    remote::{FetchErrorKind, MedicineSource},
};

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Please enter valid credentials";
pub const NO_CONNECTIVITY_MESSAGE: &str = "No internet connection";
pub const EMPTY_RESULT_MESSAGE: &str = "Failed to fetch medicines or empty list.";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInStage {
    Idle,
    Validating,
    CheckingConnectivity,
    Fetching,
    Persisting,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    /// Listing fetched and persisted; `stored` counts distinct ids, so a
    /// listing that repeats an id counts it once.
    Success { stored: usize },
    EmptyResult,
    NoConnectivity,
    InvalidCredentials,
    FetchFailed {
        kind: FetchErrorKind,
        reason: String,
    },
}

impl SignInOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Text shown to the user, `None` on success.
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Success { .. } => None,
            Self::EmptyResult => Some(EMPTY_RESULT_MESSAGE.to_string()),
            Self::NoConnectivity => Some(NO_CONNECTIVITY_MESSAGE.to_string()),
            Self::InvalidCredentials => Some(INVALID_CREDENTIALS_MESSAGE.to_string()),
            Self::FetchFailed { reason, .. } => Some(format!("Failed to fetch medicines: {reason}")),
        }
    }
}

/// Runs sign-in attempts against explicitly supplied dependencies. Holds no
/// per-attempt state; every call to [`SignInOrchestrator::sign_in`] starts
/// from [`SignInStage::Idle`].
pub struct SignInOrchestrator {
    connectivity: Arc<dyn Connectivity>,
    source: Arc<dyn MedicineSource>,
    store: Arc<dyn MedicineStore>,
    stages: Option<mpsc::UnboundedSender<SignInStage>>,
}

impl SignInOrchestrator {
    pub fn new(
        connectivity: Arc<dyn Connectivity>,
        source: Arc<dyn MedicineSource>,
        store: Arc<dyn MedicineStore>,
    ) -> Self {
        Self {
            connectivity,
            source,
            store,
            stages: None,
        }
    }

    /// Reports every stage transition to `observer`.
    pub fn with_stage_observer(mut self, observer: mpsc::UnboundedSender<SignInStage>) -> Self {
        self.stages = Some(observer);
        self
    }

    fn enter(&self, stage: SignInStage) {
        debug!(?stage, "sign-in stage");
        if let Some(stages) = &self.stages {
            let _ = stages.send(stage);
        }
    }

    /// Storage failures while persisting are returned as `Err`; every other
    /// path ends in a [`SignInOutcome`].
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<SignInOutcome> {
        self.enter(SignInStage::Idle);
        let result = self.run(credentials).await;
        self.enter(SignInStage::Done);

        match &result {
            Ok(outcome) => info!(username = %credentials.username, ?outcome, "sign-in attempt finished"),
            Err(err) => warn!(username = %credentials.username, error = %err, "sign-in attempt failed"),
        }
        result
    }

    async fn run(&self, credentials: &Credentials) -> Result<SignInOutcome> {
        self.enter(SignInStage::Validating);
        if !credentials.is_complete() {
            return Ok(SignInOutcome::InvalidCredentials);
        }

        self.enter(SignInStage::CheckingConnectivity);
        if !self.connectivity.is_available() {
            return Ok(SignInOutcome::NoConnectivity);
        }

        self.enter(SignInStage::Fetching);
        let medicines = match self.source.fetch_all().await {
            Ok(medicines) => medicines,
            Err(err) => {
                warn!(kind = ?err.kind(), error = %err, "medicine fetch failed");
                return Ok(SignInOutcome::FetchFailed {
                    kind: err.kind(),
                    reason: err.to_string(),
                });
            }
        };

        if medicines.is_empty() {
            return Ok(SignInOutcome::EmptyResult);
        }

        self.enter(SignInStage::Persisting);
        self.store
            .upsert_all(&medicines)
            .await
            .context("failed to persist fetched medicines")?;

        let stored = medicines
            .iter()
            .map(|medicine| &medicine.id)
            .collect::<HashSet<_>>()
            .len();
        Ok(SignInOutcome::Success { stored })
    }
}

#[cfg(test)]
#[path = "tests/sign_in_tests.rs"]
mod tests;
