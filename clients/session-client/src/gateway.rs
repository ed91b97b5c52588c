//! Request gateway: every outbound API call goes through here.
//!
//! Attaches the cached access token as a bearer credential, refreshing
//! first when the token is locally expired. A remote 401 triggers
//! exactly one refresh-and-retry; a second 401 is surfaced as
//! `SessionExpired` and the cache is cleared.

use crate::cache::TokenStore;
use crate::claims::is_locally_expired;
use crate::config::ClientConfig;
use crate::coordinator::RefreshCoordinator;
use crate::error::ClientError;
use reqwest::{Method, StatusCode};
use std::sync::Arc;
use tracing::debug;

/// HTTP front door for the application.
pub struct RequestGateway {
    http: reqwest::Client,
    config: ClientConfig,
    store: Arc<dyn TokenStore>,
    coordinator: Arc<RefreshCoordinator>,
}

impl RequestGateway {
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        config: ClientConfig,
        store: Arc<dyn TokenStore>,
        coordinator: Arc<RefreshCoordinator>,
    ) -> Self {
        RequestGateway {
            http,
            config,
            store,
            coordinator,
        }
    }

    /// Issue an authenticated request to `path`.
    ///
    /// # Errors
    ///
    /// `SessionExpired` after the retry is rejected, `NoSession` when
    /// nothing is cached, or a retryable transport failure.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response, ClientError> {
        let token = self.current_or_refreshed_token().await?;
        let response = self.send(method.clone(), path, body.as_ref(), &token).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        // Covers clock skew and server-side revocation the local check
        // cannot see. One refresh, one retry, never a loop.
        debug!(path, "request unauthorized, attempting one refresh-and-retry");
        let token = self.coordinator.get_fresh_token().await?;
        let retried = self.send(method, path, body.as_ref(), &token).await?;

        if retried.status() == StatusCode::UNAUTHORIZED {
            self.store.clear().await;
            return Err(ClientError::SessionExpired);
        }

        Ok(retried)
    }

    /// Convenience GET.
    ///
    /// # Errors
    ///
    /// Same as [`RequestGateway::request`].
    pub async fn get(&self, path: &str) -> Result<reqwest::Response, ClientError> {
        self.request(Method::GET, path, None).await
    }

    /// Cached access token, refreshed first if locally expired.
    async fn current_or_refreshed_token(&self) -> Result<String, ClientError> {
        match self.store.load().await {
            Some(session)
                if !is_locally_expired(&session.access_token, self.config.expiry_leeway) =>
            {
                Ok(session.access_token)
            }
            Some(_) => self.coordinator.get_fresh_token().await,
            None => Err(ClientError::NoSession),
        }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        token: &str,
    ) -> Result<reqwest::Response, ClientError> {
        let url = format!("{}{}", self.config.base_url, path);
        let mut request = self.http.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }
}
