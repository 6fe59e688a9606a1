/// Client-side routes the session flow moves between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Unauthenticated landing page.
    Entry,
    Terms,
    GoogleCallback,
    FinalizeSignup,
    Dashboard,
    Insights,
}

impl Route {
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Entry => "/",
            Self::Terms => "/terms",
            Self::GoogleCallback => "/auth/google/callback",
            Self::FinalizeSignup => "/finalize-signup",
            Self::Dashboard => "/dashboard",
            Self::Insights => "/insights",
        }
    }

    /// Route for an exact path, ignoring any query string or trailing slash.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            p => p,
        };
        [
            Self::Entry,
            Self::Terms,
            Self::GoogleCallback,
            Self::FinalizeSignup,
            Self::Dashboard,
            Self::Insights,
        ]
        .into_iter()
        .find(|r| r.path() == path)
    }

    /// Routes only reachable with a current access token.
    #[must_use]
    pub fn requires_session(self) -> bool {
        matches!(self, Self::Dashboard | Self::Insights)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Where a navigation to `path` should actually land.
///
/// Private routes without a session go to the entry page; unknown paths go to
/// the dashboard when signed in and to the entry page otherwise.
#[must_use]
pub fn guard_route(path: &str, authenticated: bool) -> Route {
    match Route::from_path(path) {
        Some(route) if route.requires_session() && !authenticated => Route::Entry,
        Some(route) => route,
        None if authenticated => Route::Dashboard,
        None => Route::Entry,
    }
}

/// Navigation side effects requested by the session flow.
///
/// The UI layer implements this; tests record the calls instead of moving
/// between pages.
pub trait Navigator: Send + Sync + 'static {
    fn navigate(&self, route: Route);

    /// The session ended and cannot be recovered (refresh rejected).
    fn session_terminated(&self) {
        self.navigate(Route::Entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn paths_round_trip() {
        for route in [
            Route::Entry,
            Route::Terms,
            Route::GoogleCallback,
            Route::FinalizeSignup,
            Route::Dashboard,
            Route::Insights,
        ] {
            assert_eq!(Route::from_path(route.path()), Some(route));
        }
    }

    #[test]
    fn from_path_ignores_query_and_trailing_slash() {
        assert_eq!(
            Route::from_path("/auth/google/callback?token=abc"),
            Some(Route::GoogleCallback)
        );
        assert_eq!(Route::from_path("/dashboard/"), Some(Route::Dashboard));
        assert_eq!(Route::from_path(""), Some(Route::Entry));
        assert_eq!(Route::from_path("/nope"), None);
    }

    #[test]
    fn private_routes_need_session() {
        assert_eq!(guard_route("/dashboard", false), Route::Entry);
        assert_eq!(guard_route("/insights", false), Route::Entry);
        assert_eq!(guard_route("/dashboard", true), Route::Dashboard);
    }

    #[test]
    fn public_routes_always_reachable() {
        assert_eq!(guard_route("/terms", false), Route::Terms);
        assert_eq!(guard_route("/finalize-signup", false), Route::FinalizeSignup);
        assert_eq!(guard_route("/", true), Route::Entry);
    }

    #[test]
    fn unknown_paths_fall_back() {
        assert_eq!(guard_route("/settings", true), Route::Dashboard);
        assert_eq!(guard_route("/settings", false), Route::Entry);
    }

    #[test]
    fn session_terminated_defaults_to_entry() {
        #[derive(Default)]
        struct Plain(Mutex<Vec<Route>>);

        impl Navigator for Plain {
            fn navigate(&self, route: Route) {
                self.0.lock().push(route);
            }
        }

        let navigator = Plain::default();
        navigator.session_terminated();
        assert_eq!(*navigator.0.lock(), vec![Route::Entry]);
    }
}
