//! # Configuration
//!
//! `ApiConfig` names the backend and the application credentials used for
//! the client-credential token exchange. Build it in code, or load it from
//! `CTB_*` environment variables:
//!
//! | Variable | Required | Default |
//! |---|---|---|
//! | `CTB_APP_ID` | yes | |
//! | `CTB_APP_SECRET` | yes | |
//! | `CTB_BASE_URL` | no | `https://api.staging.creatubbles.com` |
//! | `CTB_API_VERSION` | no | `v2` |
//! | `CTB_LOCALE` | no | unset |

use std::fmt;

use anyhow::{bail, Context, Result};

pub const STAGING_BASE_URL: &str = "https://api.staging.creatubbles.com";
pub const PRODUCTION_BASE_URL: &str = "https://api.creatubbles.com";
pub const DEFAULT_API_VERSION: &str = "v2";

#[derive(Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_version: String,
    pub app_id: String,
    pub app_secret: String,
    /// Sent as `Accept-Language` when set.
    pub locale: Option<String>,
}

impl ApiConfig {
    /// Staging configuration for the given application credentials.
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            base_url: STAGING_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            locale: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let app_id = read("CTB_APP_ID").context("CTB_APP_ID must be set")?;
        let app_secret = read("CTB_APP_SECRET").context("CTB_APP_SECRET must be set")?;

        let mut config = Self::new(app_id, app_secret);
        if let Some(base_url) = read("CTB_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(api_version) = read("CTB_API_VERSION") {
            config.api_version = api_version;
        }
        config.locale = read("CTB_LOCALE");

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            bail!("base URL must be an http(s) URL, got '{}'", self.base_url);
        }
        if self.api_version.trim().is_empty() {
            bail!("API version must not be empty");
        }
        Ok(())
    }

    /// `{base_url}/{api_version}`
    pub fn api_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.api_version.trim_matches('/')
        )
    }

    /// Resolves a request path such as `/creations` against the API root.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.api_url(), path)
        } else {
            format!("{}/{}", self.api_url(), path)
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("app_id", &self.app_id)
            .field("app_secret", &"<redacted>")
            .field("locale", &self.locale)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_to_staging_v2() {
        let config =
            ApiConfig::from_lookup(lookup(&[("CTB_APP_ID", "id"), ("CTB_APP_SECRET", "secret")]))
                .unwrap();

        assert_eq!(config.base_url, STAGING_BASE_URL);
        assert_eq!(config.api_version, "v2");
        assert_eq!(config.locale, None);
        assert_eq!(
            config.url_for("/creations"),
            "https://api.staging.creatubbles.com/v2/creations"
        );
    }

    #[test]
    fn missing_credentials_are_reported() {
        let err = ApiConfig::from_lookup(lookup(&[("CTB_APP_ID", "id")])).unwrap_err();
        assert!(err.to_string().contains("CTB_APP_SECRET"));
    }

    #[test]
    fn overrides_are_applied_and_trailing_slash_is_ignored() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("CTB_APP_ID", "id"),
            ("CTB_APP_SECRET", "secret"),
            ("CTB_BASE_URL", "https://api.creatubbles.com/"),
            ("CTB_API_VERSION", "v3"),
            ("CTB_LOCALE", "pl"),
        ]))
        .unwrap();

        assert_eq!(config.url_for("users/me"), "https://api.creatubbles.com/v3/users/me");
        assert_eq!(config.locale.as_deref(), Some("pl"));
    }

    #[test]
    fn rejects_non_http_base_url() {
        let err = ApiConfig::from_lookup(lookup(&[
            ("CTB_APP_ID", "id"),
            ("CTB_APP_SECRET", "secret"),
            ("CTB_BASE_URL", "ftp://example.com"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("http(s)"));
    }

    #[test]
    fn debug_output_hides_secret() {
        let config = ApiConfig::new("id", "top-secret");
        assert!(!format!("{config:?}").contains("top-secret"));
    }
}
