use tokio_util::sync::CancellationToken;

use super::config::FlowSettings;
use super::error::FinalizeError;
use crate::account::AccountService;
use crate::error::Error;
use crate::transport::Transport;
use crate::types::AccountStatus;

const GENERIC_FAILURE: &str = "Signup failed. Please try again.";

/// One-time onboarding step: the user must accept the terms before the
/// account is fully set up.
///
/// Submitting is idempotent from the client's side; after a failure the
/// checkbox keeps its value and a retry sends the same flag.
pub struct FinalizationGate<T> {
    account: AccountService<T>,
    settings: FlowSettings,
    lifetime: CancellationToken,
    accepts_terms: bool,
    loading: bool,
    error: Option<String>,
}

impl<T: Transport> FinalizationGate<T> {
    #[must_use]
    pub fn new(account: AccountService<T>, lifetime: CancellationToken) -> Self {
        Self {
            account,
            settings: FlowSettings::default(),
            lifetime,
            accepts_terms: false,
            loading: false,
            error: None,
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: FlowSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn set_accepts_terms(&mut self, accepted: bool) {
        self.accepts_terms = accepted;
    }

    #[must_use]
    pub fn accepts_terms(&self) -> bool {
        self.accepts_terms
    }

    /// Calendar access is requested by the identity provider during sign-in,
    /// so it is always shown as granted.
    #[must_use]
    pub fn calendar_access_granted(&self) -> bool {
        true
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Inline error from the last submission, if it failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the submit action is enabled.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.accepts_terms && !self.loading
    }

    /// Submit the acceptance.
    ///
    /// On success the user is sent to the main application.
    ///
    /// # Errors
    ///
    /// - [`FinalizeError::TermsNotAccepted`] if the checkbox is unchecked; no
    ///   request is made
    /// - [`FinalizeError::Server`] with the server's message if the API rejects it
    pub async fn submit(&mut self) -> Result<AccountStatus, FinalizeError> {
        self.error = None;

        if !self.accepts_terms {
            let err = FinalizeError::TermsNotAccepted;
            self.error = Some(err.to_string());
            return Err(err);
        }

        self.loading = true;
        let result = self.account.finalize_signup(self.accepts_terms).await;

        if self.lifetime.is_cancelled() {
            tracing::debug!("Finalization page gone, dropping result");
            return result.map_err(|e| FinalizeError::Server(failure_message(&e)));
        }
        self.loading = false;

        match result {
            Ok(status) => {
                tracing::info!("Signup finalized");
                self.account
                    .gateway()
                    .navigator()
                    .navigate(self.settings.app_route);
                Ok(status)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Signup finalization rejected");
                let message = failure_message(&e);
                self.error = Some(message.clone());
                Err(FinalizeError::Server(message))
            }
        }
    }
}

fn failure_message(error: &Error) -> String {
    error
        .detail()
        .map_or_else(|| GENERIC_FAILURE.to_owned(), |detail| detail.to_owned())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::ApiConfig;
    use crate::flow::Route;
    use crate::gateway::Gateway;
    use crate::testing::{FakeTransport, RecordingNavigator, json, status};
    use crate::token::MemoryTokenStore;
    use crate::types::AccessToken;

    fn gate(transport: FakeTransport) -> (FinalizationGate<FakeTransport>, Arc<RecordingNavigator>) {
        let navigator = Arc::new(RecordingNavigator::default());
        let gateway = Gateway::new(
            ApiConfig::default(),
            transport,
            Arc::new(MemoryTokenStore::with_token(AccessToken::from("abc123"))),
            navigator.clone(),
        );
        let gate = FinalizationGate::new(
            AccountService::new(Arc::new(gateway)),
            CancellationToken::new(),
        );
        (gate, navigator)
    }

    fn calls(gate: &FinalizationGate<FakeTransport>) -> Vec<crate::testing::RecordedCall> {
        gate.account.gateway().transport().calls()
    }

    fn accepted() -> FakeTransport {
        FakeTransport::new(|_| json(200, serde_json::json!({"id": 1, "has_finalized_signup": true})))
    }

    #[tokio::test]
    async fn unchecked_is_rejected_locally() {
        let (mut gate, navigator) = gate(accepted());
        assert!(!gate.can_submit());

        let err = gate.submit().await.unwrap_err();

        assert_eq!(err, FinalizeError::TermsNotAccepted);
        assert_eq!(
            gate.error(),
            Some("You must agree to the Terms & Conditions to use the application.")
        );
        assert!(calls(&gate).is_empty());
        assert!(navigator.routes().is_empty());
    }

    #[tokio::test]
    async fn checked_submits_and_enters_app() {
        let (mut gate, navigator) = gate(accepted());
        gate.set_accepts_terms(true);
        assert!(gate.can_submit());

        let status = gate.submit().await.unwrap();

        assert!(status.has_finalized_signup);
        let calls = calls(&gate);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].path, "/auth/google/finalize-signup");
        assert_eq!(calls[0].body, Some(serde_json::json!({"accepts_terms": true})));
        assert_eq!(calls[0].bearer.as_deref(), Some("abc123"));
        assert_eq!(navigator.routes(), vec![Route::Dashboard]);
        assert_eq!(gate.error(), None);
        assert!(!gate.is_loading());
    }

    #[tokio::test]
    async fn server_failure_keeps_checkbox_and_shows_detail() {
        let (mut gate, navigator) = gate(FakeTransport::new(|_| {
            json(400, serde_json::json!({"detail": "You must accept the terms to continue."}))
        }));
        gate.set_accepts_terms(true);

        let err = gate.submit().await.unwrap_err();

        assert_eq!(
            err,
            FinalizeError::Server("You must accept the terms to continue.".into())
        );
        assert_eq!(gate.error(), Some("You must accept the terms to continue."));
        assert!(gate.accepts_terms());
        assert!(gate.can_submit());
        assert!(navigator.routes().is_empty());
    }

    #[tokio::test]
    async fn failure_without_detail_uses_generic_message() {
        let (mut gate, _) = gate(FakeTransport::new(|_| status(503)));
        gate.set_accepts_terms(true);

        gate.submit().await.unwrap_err();

        assert_eq!(gate.error(), Some("Signup failed. Please try again."));
    }

    #[tokio::test]
    async fn retry_after_failure_resends_same_flag() {
        let attempts = Arc::new(parking_lot::Mutex::new(0));
        let counter = attempts.clone();
        let transport = FakeTransport::new(move |_| {
            let mut n = counter.lock();
            *n += 1;
            if *n == 1 {
                status(500)
            } else {
                json(200, serde_json::json!({"has_finalized_signup": true}))
            }
        });
        let (mut gate, navigator) = gate(transport);
        gate.set_accepts_terms(true);

        assert!(gate.submit().await.is_err());
        assert!(gate.submit().await.is_ok());

        let calls = calls(&gate);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].body, calls[1].body);
        assert_eq!(gate.error(), None);
        assert_eq!(navigator.routes(), vec![Route::Dashboard]);
    }

    #[tokio::test]
    async fn unmounted_gate_does_not_navigate() {
        let navigator = Arc::new(RecordingNavigator::default());
        let gateway = Gateway::new(
            ApiConfig::default(),
            accepted(),
            Arc::new(MemoryTokenStore::with_token(AccessToken::from("abc123"))),
            navigator.clone(),
        );
        let lifetime = CancellationToken::new();
        let mut gate = FinalizationGate::new(
            AccountService::new(Arc::new(gateway)),
            lifetime.clone(),
        );
        gate.set_accepts_terms(true);

        let (result, ()) = tokio::join!(gate.submit(), async {
            lifetime.cancel();
        });

        assert!(result.is_ok());
        assert!(navigator.routes().is_empty());
    }

    #[test]
    fn calendar_access_always_granted() {
        let (gate, _) = gate(accepted());
        assert!(gate.calendar_access_granted());
    }
}
