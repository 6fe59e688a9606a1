use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::ApiConfig;
use crate::error::Error;
use crate::flow::Navigator;
use crate::refresh::exchange_refresh_token;
use crate::token::{RefreshCommit, SharedToken, TokenStore};
use crate::transport::{ApiRequest, ApiResponse, Transport};
use crate::types::AccessToken;

/// Authenticated entry point for every API call.
///
/// Attaches the current access token as a bearer header and recovers from a
/// single `401` per request: the refresh credential is exchanged for a new
/// token and the request is re-sent once. Refreshes are coalesced; requests
/// that fail together share one exchange.
pub struct Gateway<T> {
    config: ApiConfig,
    transport: T,
    tokens: Arc<SharedToken>,
    navigator: Arc<dyn Navigator>,
    refresh_guard: tokio::sync::Mutex<()>,
}

impl<T: Transport> Gateway<T> {
    #[must_use]
    pub fn new(
        config: ApiConfig,
        transport: T,
        store: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self::with_shared_token(config, transport, Arc::new(SharedToken::new(store)), navigator)
    }

    /// Build a gateway over an existing token view, so several gateways (or
    /// other components) observe the same current token.
    #[must_use]
    pub fn with_shared_token(
        config: ApiConfig,
        transport: T,
        tokens: Arc<SharedToken>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            config,
            transport,
            tokens,
            navigator,
            refresh_guard: tokio::sync::Mutex::new(()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[must_use]
    pub fn tokens(&self) -> &Arc<SharedToken> {
        &self.tokens
    }

    #[must_use]
    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// Send a request with bearer auth and one-shot refresh-and-retry.
    ///
    /// # Errors
    ///
    /// - [`Error::Api`] for any non-success status, including a `401` on the retry
    /// - [`Error::SessionTerminated`] if the refresh credential was rejected
    /// - [`Error::Http`] on transport failure
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, Error> {
        let (sent_at, sent_with) = self.tokens.snapshot();
        let response = self.transport.send(&request, sent_with.as_ref()).await?;

        if response.status != reqwest::StatusCode::UNAUTHORIZED
            || request.retried
            || self.is_refresh_endpoint(&request)
        {
            return response.ensure_success();
        }

        let fresh = self.refresh_after(sent_at, sent_with.as_ref()).await?;
        let retry = request.into_retry();
        self.transport
            .send(&retry, Some(&fresh))
            .await?
            .ensure_success()
    }

    /// `GET path` and decode the JSON body.
    ///
    /// # Errors
    ///
    /// As [`send`](Self::send), plus [`Error::Decode`] for an unexpected body.
    pub async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, Error> {
        self.send(ApiRequest::get(path)).await?.json()
    }

    /// `POST path` with a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// As [`send`](Self::send), plus [`Error::Decode`] for an unexpected body.
    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, Error>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send(ApiRequest::post(path).with_json(body)?)
            .await?
            .json()
    }

    /// `PUT path` with a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// As [`send`](Self::send), plus [`Error::Decode`] for an unexpected body.
    pub async fn put_json<B, R>(&self, path: &str, body: &B) -> Result<R, Error>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send(ApiRequest::put(path).with_json(body)?)
            .await?
            .json()
    }

    /// `DELETE path`, discarding the body.
    ///
    /// # Errors
    ///
    /// As [`send`](Self::send).
    pub async fn delete(&self, path: &str) -> Result<(), Error> {
        self.send(ApiRequest::delete(path)).await.map(drop)
    }

    fn is_refresh_endpoint(&self, request: &ApiRequest) -> bool {
        request.path == self.config.refresh_path
    }

    /// Obtain a token newer than `failed` (read at epoch `sent_at`), exchanging
    /// the refresh credential only when no other request already did.
    ///
    /// If the session was cleared after the request was sent, the caller fails
    /// without exchanging; whoever cleared it already handled navigation.
    async fn refresh_after(
        &self,
        sent_at: u64,
        failed: Option<&AccessToken>,
    ) -> Result<AccessToken, Error> {
        let _singleflight = self.refresh_guard.lock().await;

        let (epoch, current) = self.tokens.snapshot();
        match current {
            Some(current) if Some(&current) != failed => {
                tracing::debug!("Token already refreshed by a concurrent request");
                return Ok(current);
            }
            None if epoch != sent_at => {
                tracing::debug!("Session ended while waiting to refresh");
                return Err(Error::SessionTerminated(
                    "session ended while refreshing".into(),
                ));
            }
            _ => {}
        }

        let token = match exchange_refresh_token(&self.transport, &self.config).await {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(error = %e, "Token refresh failed, ending session");
                if let Err(clear_err) = self.tokens.clear() {
                    tracing::error!(error = %clear_err, "Failed to clear token store");
                }
                self.navigator.session_terminated();
                return Err(Error::SessionTerminated(e.to_string()));
            }
        };

        match self.tokens.commit_refresh(epoch, token)? {
            RefreshCommit::Committed(token) => {
                tracing::info!("Access token refreshed");
                Ok(token)
            }
            RefreshCommit::Superseded(Some(newer)) => {
                tracing::debug!("Refresh superseded by a newer sign-in");
                Ok(newer)
            }
            RefreshCommit::Superseded(None) => {
                tracing::debug!("Session cleared while refreshing, discarding token");
                Err(Error::SessionTerminated(
                    "session ended while refreshing".into(),
                ))
            }
        }
    }
}

impl<T> std::fmt::Debug for Gateway<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("config", &self.config)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}
