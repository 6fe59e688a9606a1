use crate::config::ApiConfig;
use crate::error::Error;
use crate::transport::{ApiRequest, Transport};
use crate::types::{AccessToken, ApiErrorBody, TokenGrant};

/// Why the refresh credential could not be exchanged. Every variant ends the session.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("refresh rejected ({status}): {}", .detail.as_deref().unwrap_or("no detail"))]
    Rejected { status: u16, detail: Option<String> },

    #[error("refresh response carried no access token")]
    MissingToken,

    #[error("refresh request failed: {0}")]
    Transport(#[source] Error),
}

/// Exchange the cookie-held refresh credential for a new access token.
///
/// The request carries no bearer header; the transport's cookie jar supplies
/// the credential.
///
/// # Errors
///
/// Returns [`RefreshError::Rejected`] on a non-success status,
/// [`RefreshError::MissingToken`] if the body has no usable token, and
/// [`RefreshError::Transport`] if the call itself fails.
pub async fn exchange_refresh_token<T: Transport>(
    transport: &T,
    config: &ApiConfig,
) -> Result<AccessToken, RefreshError> {
    let request = ApiRequest::post(config.refresh_path())
        .with_json(&serde_json::json!({}))
        .map_err(RefreshError::Transport)?;

    let response = transport
        .send(&request, None)
        .await
        .map_err(RefreshError::Transport)?;

    if !response.status.is_success() {
        let detail = response
            .json::<ApiErrorBody>()
            .ok()
            .and_then(ApiErrorBody::into_message);
        return Err(RefreshError::Rejected {
            status: response.status.as_u16(),
            detail,
        });
    }

    let grant: TokenGrant = response.json().unwrap_or_default();
    match grant.access_token {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(RefreshError::MissingToken),
    }
}
