//! Fakes shared by the unit tests.

use std::sync::Arc;

use parking_lot::Mutex;
use reqwest::{Method, StatusCode};
use tokio::sync::Notify;

use crate::error::Error;
use crate::flow::{Navigator, Route};
use crate::transport::{ApiRequest, ApiResponse, Transport};
use crate::types::AccessToken;

/// One call observed by [`FakeTransport`].
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) bearer: Option<String>,
    pub(crate) body: Option<serde_json::Value>,
    pub(crate) retried: bool,
}

type Handler = Box<dyn Fn(&RecordedCall) -> Result<ApiResponse, Error> + Send + Sync>;

/// Transport answering from a closure and recording every call.
///
/// Each send yields to the runtime once before answering so concurrent
/// requests interleave the way real network calls do.
pub(crate) struct FakeTransport {
    handler: Handler,
    calls: Mutex<Vec<RecordedCall>>,
    held: Option<(String, Arc<Notify>)>,
}

impl FakeTransport {
    pub(crate) fn new(
        handler: impl Fn(&RecordedCall) -> Result<ApiResponse, Error> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
            held: None,
        }
    }

    /// Hold responses for `path` until `release` is notified.
    pub(crate) fn hold(mut self, path: &str, release: Arc<Notify>) -> Self {
        self.held = Some((path.to_owned(), release));
        self
    }

    pub(crate) fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub(crate) fn calls_to(&self, path: &str) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.path == path)
            .cloned()
            .collect()
    }
}

impl Transport for FakeTransport {
    async fn send(
        &self,
        request: &ApiRequest,
        bearer: Option<&AccessToken>,
    ) -> Result<ApiResponse, Error> {
        let call = RecordedCall {
            method: request.method.clone(),
            path: request.path.clone(),
            bearer: bearer.map(|t| t.as_str().to_owned()),
            body: request.body.clone(),
            retried: request.retried,
        };
        self.calls.lock().push(call.clone());
        tokio::task::yield_now().await;
        if let Some((path, release)) = &self.held {
            if *path == call.path {
                release.notified().await;
            }
        }
        (self.handler)(&call)
    }
}

pub(crate) fn json(status: u16, body: serde_json::Value) -> Result<ApiResponse, Error> {
    let status = StatusCode::from_u16(status).expect("valid status");
    Ok(ApiResponse::json_body(status, &body))
}

pub(crate) fn status(status: u16) -> Result<ApiResponse, Error> {
    let status = StatusCode::from_u16(status).expect("valid status");
    Ok(ApiResponse::new(status, Vec::new()))
}

/// Navigator that remembers where it was sent.
#[derive(Debug, Default)]
pub(crate) struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
    terminations: Mutex<usize>,
}

impl RecordingNavigator {
    pub(crate) fn routes(&self) -> Vec<Route> {
        self.routes.lock().clone()
    }

    pub(crate) fn terminations(&self) -> usize {
        *self.terminations.lock()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes.lock().push(route);
    }

    fn session_terminated(&self) {
        *self.terminations.lock() += 1;
        self.navigate(Route::Entry);
    }
}
