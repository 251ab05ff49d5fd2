// Path to screen mapping.

/// The screens of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Welcome,
    Login,
    Home,
    Scoreboard,
}

impl Route {
    /// All routes, in navigation-key order (F1..F4).
    pub const ALL: [Route; 4] = [Route::Welcome, Route::Login, Route::Home, Route::Scoreboard];

    /// Map a path to a screen. Case-insensitive; query strings, fragments and
    /// trailing slashes are ignored. Unknown paths go to `Welcome`.
    pub fn resolve(path: &str) -> Route {
        let path = path.trim();
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = path.trim_end_matches('/').to_ascii_lowercase();
        match path.as_str() {
            "" | "/welcome" => Route::Welcome,
            "/login" | "/signin" => Route::Login,
            "/home" => Route::Home,
            "/scoreboard" | "/about" => Route::Scoreboard,
            _ => Route::Welcome,
        }
    }

    /// Canonical path of the screen.
    pub fn path(self) -> &'static str {
        match self {
            Route::Welcome => "/welcome",
            Route::Login => "/login",
            Route::Home => "/home",
            Route::Scoreboard => "/scoreboard",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Route::Welcome => "Welcome",
            Route::Login => "Sign in",
            Route::Home => "Study",
            Route::Scoreboard => "Scoreboard",
        }
    }
}
