//! Environment configuration
//!
//! Explicitly constructed at login and passed into the transport and
//! repository; torn down with [`crate::ShareRepository::logout`]. Nothing
//! in the engine reads ambient global state.

/// Session-scoped environment for one authenticated user
#[derive(Clone)]
pub struct EnvironmentConfig {
    /// Base URL of the API, e.g. `https://api.strongbox.example`
    pub api_base_url: String,
    /// App version string sent with every request
    pub app_version: String,
    /// Authenticated user id; scopes every cache row
    pub user_id: String,
    /// Session identifier
    pub session_id: String,
    /// Bearer token for the session
    pub access_token: String,
}

impl EnvironmentConfig {
    /// Build a config for one authenticated session
    pub fn new(
        api_base_url: impl Into<String>,
        app_version: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            app_version: app_version.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
            access_token: access_token.into(),
        }
    }
}

impl std::fmt::Debug for EnvironmentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentConfig")
            .field("api_base_url", &self.api_base_url)
            .field("app_version", &self.app_version)
            .field("user_id", &self.user_id)
            .field("session_id", &self.session_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_access_token() {
        let config = EnvironmentConfig::new("https://api.test", "1.0.0", "u1", "s1", "secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }
}
