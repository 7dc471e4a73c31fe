use super::*;
use crate::{
    connectivity::FixedConnectivity,
    remote::{FetchError, MedicineSource},
};
use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use shared::domain::{Medicine, MedicineId};
use std::{sync::Arc, time::Duration};
use storage::{MedicineStore, Storage};
use tokio::sync::Notify;

struct GatedSource {
    release: Notify,
    records: Vec<Medicine>,
}

#[async_trait]
impl MedicineSource for GatedSource {
    async fn fetch_all(&self) -> Result<Vec<Medicine>, FetchError> {
        self.release.notified().await;
        Ok(self.records.clone())
    }
}

struct StaticSource(Vec<Medicine>);

#[async_trait]
impl MedicineSource for StaticSource {
    async fn fetch_all(&self) -> Result<Vec<Medicine>, FetchError> {
        Ok(self.0.clone())
    }
}

struct BrokenStore;

#[async_trait]
impl MedicineStore for BrokenStore {
    async fn upsert_all(&self, _records: &[Medicine]) -> Result<()> {
        anyhow::bail!("database is locked")
    }

    async fn get_all(&self) -> Result<Vec<Medicine>> {
        Ok(Vec::new())
    }

    async fn get_by_id(&self, _id: &MedicineId) -> Result<Option<Medicine>> {
        Ok(None)
    }
}

fn one_medicine() -> Vec<Medicine> {
    vec![Medicine {
        name: Some("Dexlansoprazole".to_string()),
        ..Medicine::new(MedicineId::new("1").expect("id"))
    }]
}

async fn session_with(online: bool, records: Vec<Medicine>) -> LoginSession {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    LoginSession::new(SignInOrchestrator::new(
        Arc::new(FixedConnectivity(online)),
        Arc::new(StaticSource(records)),
        Arc::new(storage),
    ))
}

#[tokio::test]
async fn starts_idle_and_complete() {
    let session = session_with(true, one_medicine()).await;
    assert_eq!(session.current(), LoginViewState::default());
    assert!(session.current().is_request_complete);
}

#[tokio::test]
async fn empty_credentials_set_validation_message() {
    let session = session_with(true, one_medicine()).await;

    let outcome = session
        .submit(&Credentials::new("", ""))
        .await
        .expect("submit");

    assert_eq!(outcome, SignInOutcome::InvalidCredentials);
    let state = session.current();
    assert!(!state.is_login_successful);
    assert!(state.is_request_complete);
    assert_eq!(state.error_message, "Please enter valid credentials");
}

#[tokio::test]
async fn offline_and_empty_results_surface_their_messages() {
    let offline = session_with(false, one_medicine()).await;
    offline
        .submit(&Credentials::new("a", "a"))
        .await
        .expect("submit");
    assert_eq!(offline.current().error_message, "No internet connection");

    let empty = session_with(true, Vec::new()).await;
    empty
        .submit(&Credentials::new("a", "a"))
        .await
        .expect("submit");
    assert_eq!(
        empty.current().error_message,
        "Failed to fetch medicines or empty list."
    );
    assert!(!empty.current().is_login_successful);
}

#[tokio::test]
async fn success_clears_previous_error() {
    let session = session_with(true, one_medicine()).await;
    session
        .submit(&Credentials::new("a", ""))
        .await
        .expect("invalid");
    assert!(!session.current().error_message.is_empty());

    let outcome = session
        .submit(&Credentials::new("a", "a"))
        .await
        .expect("valid");

    assert_eq!(outcome, SignInOutcome::Success { stored: 1 });
    let state = session.current();
    assert!(state.is_login_successful);
    assert!(state.is_request_complete);
    assert!(state.error_message.is_empty());
}

#[tokio::test]
async fn second_submit_while_in_flight_is_rejected() {
    let source = Arc::new(GatedSource {
        release: Notify::new(),
        records: one_medicine(),
    });
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let session = Arc::new(LoginSession::new(SignInOrchestrator::new(
        Arc::new(FixedConnectivity(true)),
        source.clone(),
        Arc::new(storage),
    )));
    let mut rx = session.subscribe();

    let first = tokio::spawn({
        let session = session.clone();
        async move { session.submit(&Credentials::new("a", "a")).await }
    });

    rx.wait_for(|state| !state.is_request_complete)
        .await
        .expect("attempt in flight");

    let err = session
        .submit(&Credentials::new("a", "a"))
        .await
        .expect_err("single flight");
    assert!(matches!(err, SubmitError::AlreadyInFlight), "{err}");

    source.release.notify_one();
    let outcome = first.await.expect("join").expect("submit");
    assert!(outcome.is_success());
    assert!(session.current().is_request_complete);
}

#[tokio::test]
async fn abandoned_submit_releases_the_in_flight_flag() {
    let source = Arc::new(GatedSource {
        release: Notify::new(),
        records: one_medicine(),
    });
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let session = LoginSession::new(SignInOrchestrator::new(
        Arc::new(FixedConnectivity(true)),
        source.clone(),
        Arc::new(storage),
    ));

    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        session.submit(&Credentials::new("a", "a")),
    )
    .await;
    assert!(abandoned.is_err(), "gated fetch should not finish");
    assert!(session.current().is_request_complete);
    assert!(!session.current().is_login_successful);

    source.release.notify_one();
    let outcome = session
        .submit(&Credentials::new("a", "a"))
        .await
        .expect("retry after abandoned attempt");
    assert_eq!(outcome, SignInOutcome::Success { stored: 1 });
    assert!(session.current().is_login_successful);
}

#[tokio::test]
async fn storage_failure_is_reported_in_state_and_result() {
    let session = LoginSession::new(SignInOrchestrator::new(
        Arc::new(FixedConnectivity(true)),
        Arc::new(StaticSource(one_medicine())),
        Arc::new(BrokenStore),
    ));

    let err = session
        .submit(&Credentials::new("a", "a"))
        .await
        .expect_err("persist failure");
    assert!(matches!(err, SubmitError::Failed(_)));

    let state = session.current();
    assert!(!state.is_login_successful);
    assert!(state.is_request_complete);
    assert!(
        state.error_message.starts_with("Sign-in failed"),
        "{}",
        state.error_message
    );
}

#[tokio::test]
async fn update_stream_yields_current_then_settled_state() {
    let session = session_with(false, one_medicine()).await;
    let mut updates = session.updates();

    let initial = updates.next().await.expect("initial");
    assert_eq!(initial, LoginViewState::default());

    session
        .submit(&Credentials::new("a", "a"))
        .await
        .expect("submit");

    let settled = updates.next().await.expect("settled");
    assert!(settled.is_request_complete);
    assert_eq!(settled.error_message, "No internet connection");
}
