use tokio_util::sync::CancellationToken;
use url::Url;

use super::config::FlowSettings;
use super::error::CallbackFailure;
use super::navigation::Route;
use crate::account::AccountService;
use crate::transport::Transport;
use crate::types::AccessToken;

/// Query parameters of `/auth/google/callback`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub token: Option<String>,
    pub error: Option<String>,
}

impl CallbackParams {
    /// Parse from a raw query string (leading `?` optional).
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self::from_pairs(url::form_urlencoded::parse(query.as_bytes()))
    }

    /// Parse from the full callback URL.
    #[must_use]
    pub fn from_url(url: &Url) -> Self {
        Self::from_pairs(url.query_pairs())
    }

    fn from_pairs<'a>(
        pairs: impl Iterator<Item = (std::borrow::Cow<'a, str>, std::borrow::Cow<'a, str>)>,
    ) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "token" => &mut params.token,
                "error" => &mut params.error,
                _ => continue,
            };
            if slot.is_none() && !value.is_empty() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }
}

/// Where the callback page stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackState {
    Verifying,
    /// Signed in, terms not yet accepted; sent to the finalization step.
    Finalizing,
    /// Signed in and onboarded; sent to the main application.
    Entering,
    Failed(CallbackFailure),
}

impl CallbackState {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Verifying)
    }

    /// Message to show when the callback failed.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        match self {
            Self::Failed(failure) => Some(failure.to_string()),
            _ => None,
        }
    }
}

/// Resolves one return trip from the identity provider.
///
/// Create one per callback navigation. `lifetime` is cancelled when the page
/// goes away; results that arrive afterwards are dropped.
pub struct CallbackResolver<T> {
    account: AccountService<T>,
    settings: FlowSettings,
    lifetime: CancellationToken,
    state: CallbackState,
    started: bool,
    checking_status: bool,
}

impl<T: Transport> CallbackResolver<T> {
    #[must_use]
    pub fn new(account: AccountService<T>, lifetime: CancellationToken) -> Self {
        Self {
            account,
            settings: FlowSettings::default(),
            lifetime,
            state: CallbackState::Verifying,
            started: false,
            checking_status: false,
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: FlowSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn state(&self) -> &CallbackState {
        &self.state
    }

    /// Progress text while still verifying.
    #[must_use]
    pub fn status_line(&self) -> Option<&'static str> {
        match (&self.state, self.checking_status) {
            (CallbackState::Verifying, false) => Some("Verifying your account..."),
            (CallbackState::Verifying, true) => Some("Checking signup status..."),
            _ => None,
        }
    }

    /// Run the resolution for `params`.
    ///
    /// Only the first call does any work; later calls (re-renders) return the
    /// state reached by the first.
    pub async fn resolve(&mut self, params: &CallbackParams) -> &CallbackState {
        if self.started {
            return &self.state;
        }
        self.started = true;

        if let Some(code) = &params.error {
            tracing::warn!(error = %code, "Identity provider returned an error");
            return self.fail(CallbackFailure::Provider(code.clone()));
        }

        let Some(token) = params.token.as_deref().filter(|t| !t.is_empty()) else {
            tracing::warn!("Callback carried no token");
            return self.fail(CallbackFailure::MissingToken);
        };

        if let Err(e) = self.account.sign_in_with_token(AccessToken::from(token)) {
            tracing::error!(error = %e, "Failed to store access token");
            return self.fail(CallbackFailure::StorageFailed);
        }

        self.checking_status = true;
        let status = self.account.current_status().await;

        if self.lifetime.is_cancelled() {
            tracing::debug!("Callback page gone, dropping status result");
            return &self.state;
        }
        self.checking_status = false;

        match status {
            Ok(status) if !status.has_finalized_signup => {
                tracing::info!("New account, continuing to signup finalization");
                self.state = CallbackState::Finalizing;
                self.navigate(self.settings.finalize_route);
            }
            Ok(_) => {
                tracing::info!("Returning account, entering application");
                self.state = CallbackState::Entering;
                self.navigate(self.settings.app_route);
            }
            Err(e) => {
                tracing::error!(error = %e, "Account status check failed");
                return self.fail(CallbackFailure::StatusUnknown);
            }
        }
        &self.state
    }

    /// Convenience for [`resolve`](Self::resolve) straight from the callback URL.
    pub async fn resolve_url(&mut self, url: &Url) -> &CallbackState {
        let params = CallbackParams::from_url(url);
        self.resolve(&params).await
    }

    /// "Return to Login" action offered on failure.
    pub fn return_to_entry(&self) {
        self.navigate(self.settings.entry_route);
    }

    fn fail(&mut self, failure: CallbackFailure) -> &CallbackState {
        self.state = CallbackState::Failed(failure);
        &self.state
    }

    fn navigate(&self, route: Route) {
        if self.lifetime.is_cancelled() {
            return;
        }
        self.account.gateway().navigator().navigate(route);
    }
}
