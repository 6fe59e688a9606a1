/// Why a Google callback could not sign the user in.
///
/// Every variant is terminal for the callback page; the user has to start
/// over from the entry page.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallbackFailure {
    /// The identity provider redirected back with `?error=<code>`.
    #[error("Login failed: {0}. Please try again.")]
    Provider(String),

    /// Neither an error nor a token was present.
    #[error("Login failed: Token not found in callback URL.")]
    MissingToken,

    /// The token from the callback could not be saved.
    #[error("Login failed: Could not save your session. Please try again.")]
    StorageFailed,

    /// The token was stored but the account status could not be read.
    #[error("Session verified, but could not check user status.")]
    StatusUnknown,
}

/// Why submitting the finalization step failed. Never terminal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FinalizeError {
    /// Rejected locally; no request was sent.
    #[error("You must agree to the Terms & Conditions to use the application.")]
    TermsNotAccepted,

    /// The API rejected the request; carries the message to show.
    #[error("{0}")]
    Server(String),
}
