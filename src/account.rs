use std::sync::Arc;

use url::Url;

use crate::error::Error;
use crate::gateway::Gateway;
use crate::transport::{ApiRequest, Transport};
use crate::types::{AccessToken, AccountStatus, FinalizeSignup, LogoutAck};

/// Account-level auth operations on top of a [`Gateway`].
pub struct AccountService<T> {
    gateway: Arc<Gateway<T>>,
}

// Manual Clone: avoid derive adding a `T: Clone` bound.
impl<T> Clone for AccountService<T> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
        }
    }
}

impl<T: Transport> AccountService<T> {
    #[must_use]
    pub fn new(gateway: Arc<Gateway<T>>) -> Self {
        Self { gateway }
    }

    #[must_use]
    pub fn gateway(&self) -> &Arc<Gateway<T>> {
        &self.gateway
    }

    /// Whether an access token is held. It may be expired; the gateway
    /// refreshes it on first use.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.gateway.tokens().current().is_some()
    }

    /// Make `token` the current access token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the token store cannot persist it.
    pub fn sign_in_with_token(&self, token: AccessToken) -> Result<(), Error> {
        self.gateway.tokens().replace(token)
    }

    /// Fetch the account status, including whether signup was finalized.
    ///
    /// # Errors
    ///
    /// Returns any gateway error, or [`Error::Decode`] if the payload lacks
    /// `has_finalized_signup`.
    pub async fn current_status(&self) -> Result<AccountStatus, Error> {
        let path = self.gateway.config().me_path().to_owned();
        self.gateway.get_json(&path).await
    }

    /// Complete onboarding by accepting the terms.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] with the server's `detail` if the API rejects it.
    pub async fn finalize_signup(&self, accepts_terms: bool) -> Result<AccountStatus, Error> {
        let path = self.gateway.config().finalize_path().to_owned();
        self.gateway
            .post_json(&path, &FinalizeSignup { accepts_terms })
            .await
    }

    /// Revoke the refresh credential server-side and drop the local token.
    ///
    /// Server-side failure is logged and ignored; the local token is always
    /// cleared.
    pub async fn logout(&self) {
        let path = self.gateway.config().logout_path().to_owned();
        match self.gateway.send(ApiRequest::post(path)).await {
            Ok(response) => {
                let message = response
                    .json::<LogoutAck>()
                    .ok()
                    .and_then(|ack| ack.message);
                tracing::info!(message = ?message, "Logged out");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Logout request failed (likely already logged out on server)");
            }
        }
        if let Err(e) = self.gateway.tokens().clear() {
            tracing::error!(error = %e, "Failed to clear access token on logout");
        }
    }

    /// URL the UI redirects to in order to start the Google sign-in flow.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Url`] if the configured login path does not form a URL.
    pub fn login_url(&self) -> Result<Url, Error> {
        let config = self.gateway.config();
        config.endpoint(config.login_path())
    }
}
