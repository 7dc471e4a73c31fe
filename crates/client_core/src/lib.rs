use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use storage::MedicineStore;
use tracing::warn;
use url::Url;

pub mod catalog;
pub mod connectivity;
pub mod remote;
pub mod session;
pub mod sign_in;

pub use catalog::MedicineCatalog;
pub use connectivity::{Connectivity, FixedConnectivity, RouteProbeConnectivity};
pub use remote::{
    FetchError, FetchErrorKind, HttpMedicineSource, MedicineSource, DEFAULT_MEDICINE_ENDPOINT,
};
pub use session::{LoginSession, LoginViewState, SubmitError};
pub use sign_in::{Credentials, SignInOrchestrator, SignInOutcome, SignInStage};

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub endpoint: Url,
    pub request_timeout: Option<Duration>,
    /// Skips the route probe and reports the given reachability instead.
    pub assume_online: Option<bool>,
}

/// Everything the presentation layer needs, built once at startup.
pub struct MedicineClient {
    pub session: LoginSession,
    pub catalog: MedicineCatalog,
}

impl MedicineClient {
    pub fn new(
        connectivity: Arc<dyn Connectivity>,
        source: Arc<dyn MedicineSource>,
        store: Arc<dyn MedicineStore>,
    ) -> Self {
        let orchestrator = SignInOrchestrator::new(connectivity, source, store.clone());
        Self {
            session: LoginSession::new(orchestrator),
            catalog: MedicineCatalog::new(store),
        }
    }

    pub fn from_options(options: &ClientOptions, store: Arc<dyn MedicineStore>) -> Result<Self> {
        let connectivity: Arc<dyn Connectivity> = match options.assume_online {
            Some(online) => Arc::new(FixedConnectivity(online)),
            None => Arc::new(RouteProbeConnectivity::new()),
        };
        let source = match options.request_timeout {
            Some(timeout) => HttpMedicineSource::with_timeout(options.endpoint.clone(), timeout)
                .context("failed to build HTTP client")?,
            None => HttpMedicineSource::new(options.endpoint.clone()),
        };
        Ok(Self::new(connectivity, Arc::new(source), store))
    }

    /// Signs in and, on success, reloads the catalog so list views see the
    /// freshly persisted records. A failed reload leaves the previous
    /// snapshot in place; the outcome still reflects the attempt.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<SignInOutcome, SubmitError> {
        let outcome = self.session.submit(credentials).await?;
        if outcome.is_success() {
            if let Err(err) = self.catalog.refresh().await {
                warn!(error = %err, "catalog reload after sign-in failed");
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
