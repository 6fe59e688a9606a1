//! Sign-in flow driven by the Google OAuth callback.
//!
//! The backend completes the provider exchange and redirects the browser to
//! `/auth/google/callback?token=…` (or `?error=…`). From there:
//!
//! ```rust,ignore
//! use taskmgr_session::flow::{CallbackResolver, CallbackState, FinalizationGate};
//!
//! let mut resolver = CallbackResolver::new(account.clone(), page_lifetime.clone());
//! match resolver.resolve_url(&callback_url).await {
//!     CallbackState::Failed(failure) => show_error(failure.to_string()),
//!     _ => {} // navigation already requested through the `Navigator`
//! }
//!
//! // On the finalize page:
//! let mut gate = FinalizationGate::new(account, page_lifetime);
//! gate.set_accepts_terms(true);
//! gate.submit().await?;
//! ```

mod callback;
mod config;
mod error;
mod finalize;
mod navigation;

pub use callback::{CallbackParams, CallbackResolver, CallbackState};
pub use config::FlowSettings;
pub use error::{CallbackFailure, FinalizeError};
pub use finalize::FinalizationGate;
pub use navigation::{Navigator, Route, guard_route};

/// Re-export of the page-lifetime token type used by the flow components.
pub use tokio_util::sync::CancellationToken as PageLifetime;
