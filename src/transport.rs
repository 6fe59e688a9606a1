use std::future::Future;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::ApiConfig;
use crate::error::Error;
use crate::types::{AccessToken, ApiErrorBody};

/// Description of one API call.
///
/// Carries everything needed to re-issue the call, plus whether it already is
/// the one retry the gateway allows.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
    pub retried: bool,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            retried: false,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if `body` cannot be serialized.
    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, Error> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: reqwest::header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// The same request, marked as its single retry.
    #[must_use]
    pub fn into_retry(mut self) -> Self {
        self.retried = true;
        self
    }
}

/// Raw API response: status, headers and the buffered body.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ApiResponse {
    #[must_use]
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Response with a JSON body and matching content type.
    #[must_use]
    pub fn json_body(status: StatusCode, body: &serde_json::Value) -> Self {
        let mut response = Self::new(status, body.to_string());
        response
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_slice(&self.body).map_err(Into::into)
    }

    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Returns the response on 2xx, otherwise an [`Error::Api`] carrying the
    /// server's `detail` when it sent one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] for any non-success status.
    pub fn ensure_success(self) -> Result<Self, Error> {
        if self.status.is_success() {
            return Ok(self);
        }
        let detail = serde_json::from_slice::<ApiErrorBody>(&self.body)
            .ok()
            .and_then(ApiErrorBody::into_message);
        Err(Error::Api {
            status: self.status.as_u16(),
            detail,
            body: self.text(),
        })
    }
}

/// The base request function the gateway wraps.
///
/// Implementations must send cookies with every call: the refresh credential
/// only ever travels in the cookie jar.
pub trait Transport: Send + Sync + 'static {
    /// Send `request`, attaching `bearer` as `Authorization: Bearer` when given.
    ///
    /// Non-success statuses are returned as responses, not errors; only
    /// transport failures are `Err`.
    fn send(
        &self,
        request: &ApiRequest,
        bearer: Option<&AccessToken>,
    ) -> impl Future<Output = Result<ApiResponse, Error>> + Send;
}

/// `reqwest`-backed transport with a persistent cookie jar.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    config: ApiConfig,
    http: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport with cookie storage enabled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the client cannot be constructed (TLS backend).
    pub fn new(config: &ApiConfig) -> Result<Self, Error> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            config: config.clone(),
            http,
        })
    }

    /// Use a custom HTTP client. It must have a cookie store for refresh to work.
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }
}

impl Transport for HttpTransport {
    async fn send(
        &self,
        request: &ApiRequest,
        bearer: Option<&AccessToken>,
    ) -> Result<ApiResponse, Error> {
        let url = self.config.endpoint(&request.path)?;

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .headers(request.headers.clone());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}
