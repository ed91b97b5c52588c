//! Single-flight refresh coordination.
//!
//! Any number of call sites may need a fresh access token at once; only
//! one network rotation may be in flight. The in-flight marker is
//! checked and installed under one synchronous lock acquisition, so no
//! await point can slip between the check and the set. Followers
//! subscribe to the leader's outcome and make no network call of their
//! own.

use crate::cache::{CachedSession, TokenStore};
use crate::config::ClientConfig;
use crate::error::ClientError;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Wire shape of `/auth/refresh`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest {
    refresh_token: String,
}

/// A new access/refresh pair from the server.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

type Outcome = Result<TokenPair, ClientError>;

enum Role {
    Leader(broadcast::Sender<Outcome>),
    Follower(broadcast::Receiver<Outcome>),
}

/// One instance per session. Construct explicitly and share via `Arc`;
/// its coordination state is volatile and resets with the process.
pub struct RefreshCoordinator {
    http: reqwest::Client,
    config: ClientConfig,
    store: Arc<dyn TokenStore>,
    in_flight: Mutex<Option<broadcast::Sender<Outcome>>>,
}

impl RefreshCoordinator {
    #[must_use]
    pub fn new(http: reqwest::Client, config: ClientConfig, store: Arc<dyn TokenStore>) -> Self {
        RefreshCoordinator {
            http,
            config,
            store,
            in_flight: Mutex::new(None),
        }
    }

    /// Obtain a fresh access token, coalescing concurrent callers into
    /// one network rotation. Every caller in a burst observes the same
    /// outcome.
    ///
    /// # Errors
    ///
    /// `SessionExpired` (cache already cleared), `NoSession`, or a
    /// retryable `Network`/`Timeout` failure.
    pub async fn get_fresh_token(&self) -> Result<String, ClientError> {
        let role = {
            // Sync lock: check and set are one uninterrupted step.
            let mut guard = self
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match guard.as_ref() {
                Some(tx) => Role::Follower(tx.subscribe()),
                None => {
                    let (tx, _) = broadcast::channel(1);
                    *guard = Some(tx.clone());
                    Role::Leader(tx)
                }
            }
        };

        let outcome = match role {
            Role::Follower(mut rx) => {
                debug!("refresh already in flight, waiting for its outcome");
                rx.recv()
                    .await
                    .unwrap_or(Err(ClientError::Network("refresh aborted".to_string())))
            }
            Role::Leader(tx) => {
                let outcome = self.run_refresh().await;

                // Clear the marker before fan-out so late arrivals start
                // a new flight instead of waiting on a finished one.
                *self
                    .in_flight
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = None;

                // Send fails only when no follower subscribed.
                let _ = tx.send(outcome.clone());
                outcome
            }
        };

        outcome.map(|pair| pair.access_token)
    }

    /// The single network rotation, bounded by the configured timeout.
    async fn run_refresh(&self) -> Outcome {
        let Some(session) = self.store.load().await else {
            return Err(ClientError::NoSession);
        };

        let request = self
            .http
            .post(self.config.refresh_url())
            .json(&RefreshRequest {
                refresh_token: session.refresh_token.clone(),
            })
            .send();

        let response = tokio::time::timeout(self.config.refresh_timeout, request)
            .await
            .map_err(|_| ClientError::Timeout)?
            .map_err(ClientError::from)?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            // The server rejected our refresh token: the session is
            // dead, whatever the underlying reason. Full teardown.
            warn!("refresh rejected, tearing down local session");
            self.store.clear().await;
            return Err(ClientError::SessionExpired);
        }

        if !response.status().is_success() {
            return Err(ClientError::Network(format!(
                "refresh returned {}",
                response.status()
            )));
        }

        let pair: TokenPair = response.json().await.map_err(ClientError::from)?;

        self.store
            .save(CachedSession {
                access_token: pair.access_token.clone(),
                refresh_token: pair.refresh_token.clone(),
                user: session.user,
            })
            .await;

        Ok(pair)
    }
}
