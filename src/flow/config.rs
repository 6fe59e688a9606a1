use super::navigation::Route;

/// Where the sign-in flow sends the user at each exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSettings {
    pub(crate) entry_route: Route,
    pub(crate) finalize_route: Route,
    pub(crate) app_route: Route,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            entry_route: Route::Entry,
            finalize_route: Route::FinalizeSignup,
            app_route: Route::Dashboard,
        }
    }
}

impl FlowSettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Unauthenticated landing page ("Return to Login").
    #[must_use]
    pub fn with_entry_route(mut self, route: Route) -> Self {
        self.entry_route = route;
        self
    }

    /// Terms acceptance step for accounts that have not finalized signup.
    #[must_use]
    pub fn with_finalize_route(mut self, route: Route) -> Self {
        self.finalize_route = route;
        self
    }

    /// Main application page after a complete sign-in.
    #[must_use]
    pub fn with_app_route(mut self, route: Route) -> Self {
        self.app_route = route;
        self
    }

    #[must_use]
    pub fn entry_route(&self) -> Route {
        self.entry_route
    }

    #[must_use]
    pub fn finalize_route(&self) -> Route {
        self.finalize_route
    }

    #[must_use]
    pub fn app_route(&self) -> Route {
        self.app_route
    }
}
