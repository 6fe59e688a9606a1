#![doc = include_str!("../README.md")]

pub mod account;
pub mod config;
pub mod error;
pub mod flow;
pub mod gateway;
pub mod refresh;
#[cfg(test)]
pub(crate) mod testing;
pub mod token;
pub mod transport;
pub mod types;

// Re-exports for convenient access
pub use account::AccountService;
pub use config::ApiConfig;
pub use error::Error;
pub use flow::{
    CallbackFailure, CallbackParams, CallbackResolver, CallbackState, FinalizationGate,
    FinalizeError, FlowSettings, Navigator, PageLifetime, Route, guard_route,
};
pub use gateway::Gateway;
pub use refresh::{RefreshError, exchange_refresh_token};
pub use token::{FileTokenStore, MemoryTokenStore, RefreshCommit, SharedToken, TokenStore};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
pub use types::{AccessToken, AccountStatus, FinalizeSignup, LogoutAck, TokenGrant, UserId};
