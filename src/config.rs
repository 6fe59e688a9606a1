use url::Url;

use crate::error::Error;

const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Location of the task manager API and its auth endpoints.
///
/// ```rust,ignore
/// use taskmgr_session::ApiConfig;
///
/// let config = ApiConfig::new("https://api.example.com".parse()?)
///     .with_refresh_path("/v2/auth/refresh-token");
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ApiConfig {
    pub(crate) base_url: Url,
    pub(crate) refresh_path: String,
    pub(crate) me_path: String,
    pub(crate) finalize_path: String,
    pub(crate) logout_path: String,
    pub(crate) login_path: String,
}

impl ApiConfig {
    /// Create a configuration rooted at `base_url` with the standard auth paths.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            refresh_path: "/auth/refresh-token".into(),
            me_path: "/auth/me".into(),
            finalize_path: "/auth/google/finalize-signup".into(),
            logout_path: "/auth/logout".into(),
            login_path: "/auth/google/login".into(),
        }
    }

    /// Create config from environment variables.
    ///
    /// # Optional env vars
    /// - `TASKMGR_API_URL`: API origin (default `http://localhost:8000`)
    /// - `TASKMGR_REFRESH_PATH`: Override the refresh endpoint path
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `TASKMGR_API_URL` is not a valid URL.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut config = match var("TASKMGR_API_URL") {
            Some(raw) => {
                let url: Url = raw
                    .parse()
                    .map_err(|e| Error::Config(format!("TASKMGR_API_URL: {e}")))?;
                Self::new(url)
            }
            None => Self::default(),
        };

        if let Some(path) = var("TASKMGR_REFRESH_PATH") {
            config = config.with_refresh_path(path);
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    #[must_use]
    pub fn with_me_path(mut self, path: impl Into<String>) -> Self {
        self.me_path = path.into();
        self
    }

    #[must_use]
    pub fn with_finalize_path(mut self, path: impl Into<String>) -> Self {
        self.finalize_path = path.into();
        self
    }

    #[must_use]
    pub fn with_logout_path(mut self, path: impl Into<String>) -> Self {
        self.logout_path = path.into();
        self
    }

    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// API origin every request path is appended to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Cookie-authenticated endpoint minting a new access token.
    #[must_use]
    pub fn refresh_path(&self) -> &str {
        &self.refresh_path
    }

    #[must_use]
    pub fn me_path(&self) -> &str {
        &self.me_path
    }

    #[must_use]
    pub fn finalize_path(&self) -> &str {
        &self.finalize_path
    }

    #[must_use]
    pub fn logout_path(&self) -> &str {
        &self.logout_path
    }

    /// Provider login entry point. The UI redirects here; it is never fetched.
    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Absolute URL for an API path.
    ///
    /// Paths are appended to the base URL's own path, so an origin mounted
    /// under a prefix (`https://host/api`) keeps that prefix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Url`] if the joined URL does not parse.
    pub fn endpoint(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(format!("{base}/{path}").parse()?)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL.parse().expect("valid default URL"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths() {
        let config = ApiConfig::default();

        assert_eq!(config.base_url().as_str(), "http://localhost:8000/");
        assert_eq!(config.refresh_path(), "/auth/refresh-token");
        assert_eq!(config.me_path(), "/auth/me");
        assert_eq!(config.finalize_path(), "/auth/google/finalize-signup");
        assert_eq!(config.logout_path(), "/auth/logout");
        assert_eq!(config.login_path(), "/auth/google/login");
    }

    #[test]
    fn overrides() {
        let config = ApiConfig::new("https://api.example.com".parse().unwrap())
            .with_refresh_path("/v2/refresh")
            .with_me_path("/v2/me");

        assert_eq!(config.refresh_path(), "/v2/refresh");
        assert_eq!(config.me_path(), "/v2/me");
        assert_eq!(config.logout_path(), "/auth/logout");
    }

    #[test]
    fn endpoint_joins_paths() {
        let config = ApiConfig::default();
        assert_eq!(
            config.endpoint("/auth/me").unwrap().as_str(),
            "http://localhost:8000/auth/me"
        );
        assert_eq!(
            config.endpoint("tasks/").unwrap().as_str(),
            "http://localhost:8000/tasks/"
        );
    }

    #[test]
    fn from_vars_defaults_when_unset() {
        let config = ApiConfig::from_vars(|_| None).unwrap();
        assert_eq!(config.base_url().as_str(), "http://localhost:8000/");
        assert_eq!(config.refresh_path(), "/auth/refresh-token");
    }

    #[test]
    fn from_vars_reads_overrides() {
        let config = ApiConfig::from_vars(|key| match key {
            "TASKMGR_API_URL" => Some("https://api.example.com".into()),
            "TASKMGR_REFRESH_PATH" => Some("/v2/refresh".into()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.base_url().as_str(), "https://api.example.com/");
        assert_eq!(config.refresh_path(), "/v2/refresh");
    }

    #[test]
    fn from_vars_rejects_invalid_url() {
        let err = ApiConfig::from_vars(|key| {
            (key == "TASKMGR_API_URL").then(|| "not a url".to_owned())
        })
        .unwrap_err();

        assert!(matches!(err, Error::Config(ref msg) if msg.starts_with("TASKMGR_API_URL")));
    }

    #[test]
    fn endpoint_keeps_base_prefix() {
        let config = ApiConfig::new("https://host.example/api/".parse().unwrap());
        assert_eq!(
            config.endpoint("/auth/refresh-token").unwrap().as_str(),
            "https://host.example/api/auth/refresh-token"
        );
    }
}
