use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// Short-lived bearer credential authorizing API calls.
///
/// Opaque to the client: never parsed, never inspected for expiry. Expiry is
/// discovered when the API answers `401`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, From, Into)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` when the token carries no characters at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

impl From<&str> for AccessToken {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Numeric account identifier assigned by the API.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Account status returned by `GET /auth/me`.
///
/// Only `has_finalized_signup` is required; the profile fields are accepted
/// when present but nothing in the session flow depends on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct AccountStatus {
    pub has_finalized_signup: bool,
    #[serde(default)]
    pub id: Option<UserId>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl AccountStatus {
    #[must_use]
    pub fn new(has_finalized_signup: bool) -> Self {
        Self {
            has_finalized_signup,
            id: None,
            email: None,
            full_name: None,
            is_active: None,
        }
    }
}

/// Response of `POST /auth/refresh-token`.
#[derive(Debug, Clone, Default, Deserialize)]
#[non_exhaustive]
pub struct TokenGrant {
    #[serde(default)]
    pub access_token: Option<AccessToken>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Body of `POST /auth/google/finalize-signup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeSignup {
    pub accepts_terms: bool,
}

/// Response of `POST /auth/logout`.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct LogoutAck {
    #[serde(default)]
    pub message: Option<String>,
}

/// Error envelope used by the API for every non-success response.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub(crate) detail: Option<serde_json::Value>,
}

impl ApiErrorBody {
    /// Human-readable detail. Validation errors arrive as structured JSON and
    /// are flattened to their string form.
    pub(crate) fn into_message(self) -> Option<String> {
        match self.detail? {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}
