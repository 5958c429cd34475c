//! Managed backend configuration (auth service + REST store)

use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;

/// Connection settings for the managed backend.
///
/// Keys are wrapped in `Secret` so they never show up in `Debug` output.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Project URL, e.g. `https://abc.supabase.co`
    #[serde(default)]
    pub url: String,

    /// Public (anon) key, subject to row-level access policy
    #[serde(default = "empty_secret")]
    pub anon_key: Secret<String>,

    /// Privileged (service-role) key, bypasses row-level access policy
    #[serde(default = "empty_secret")]
    pub service_role_key: Secret<String>,

    /// Public site URL; password-reset links redirect under it
    #[serde(default)]
    pub site_url: String,

    /// JWT signing secret. When set, access tokens are verified locally.
    pub jwt_secret: Option<Secret<String>>,

    /// Timeout for each backend call, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Which required backend settings are present. Reported by the health route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendPresence {
    pub backend_url: bool,
    pub public_key: bool,
    pub privileged_key: bool,
    pub site_url: bool,
}

impl BackendPresence {
    pub fn is_complete(&self) -> bool {
        self.backend_url && self.public_key && self.privileged_key && self.site_url
    }
}

impl BackendConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Redirect target embedded in password-reset emails.
    pub fn password_reset_redirect(&self) -> String {
        format!("{}/reset-password", self.site_url.trim_end_matches('/'))
    }

    pub fn presence(&self) -> BackendPresence {
        BackendPresence {
            backend_url: !self.url.trim().is_empty(),
            public_key: !self.anon_key.expose_secret().trim().is_empty(),
            privileged_key: !self.service_role_key.expose_secret().trim().is_empty(),
            site_url: !self.site_url.trim().is_empty(),
        }
    }

    /// Validate backend configuration
    ///
    /// All four required settings must be present and both URLs must be
    /// http(s). In production, both URLs must use HTTPS.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        let presence = self.presence();
        if !presence.backend_url {
            return Err(ValidationError::MissingRequired("BACKEND__URL"));
        }
        if !presence.public_key {
            return Err(ValidationError::MissingRequired("BACKEND__ANON_KEY"));
        }
        if !presence.privileged_key {
            return Err(ValidationError::MissingRequired("BACKEND__SERVICE_ROLE_KEY"));
        }
        if !presence.site_url {
            return Err(ValidationError::MissingRequired("BACKEND__SITE_URL"));
        }

        for (name, url) in [("BACKEND__URL", &self.url), ("BACKEND__SITE_URL", &self.site_url)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidUrl(name));
            }
            if *environment == Environment::Production && !url.starts_with("https://") {
                return Err(ValidationError::MustBeHttps(name));
            }
        }

        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }

        Ok(())
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: empty_secret(),
            service_role_key: empty_secret(),
            site_url: String::new(),
            jwt_secret: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn empty_secret() -> Secret<String> {
    Secret::new(String::new())
}

fn default_timeout() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> BackendConfig {
        BackendConfig {
            url: "https://project.supabase.co".to_string(),
            anon_key: Secret::new("anon".to_string()),
            service_role_key: Secret::new("service".to_string()),
            site_url: "https://app.example.com/".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_backend_config_defaults() {
        let config = BackendConfig::default();
        assert_eq!(config.timeout_secs, 10);
        assert!(config.jwt_secret.is_none());
        assert!(!config.presence().is_complete());
    }

    #[test]
    fn test_complete_config_validates() {
        assert!(complete().validate(&Environment::Production).is_ok());
        assert!(complete().presence().is_complete());
    }

    #[test]
    fn test_missing_privileged_key() {
        let config = BackendConfig {
            service_role_key: empty_secret(),
            ..complete()
        };
        assert_eq!(
            config.validate(&Environment::Development),
            Err(ValidationError::MissingRequired("BACKEND__SERVICE_ROLE_KEY"))
        );
        assert!(!config.presence().privileged_key);
    }

    #[test]
    fn test_production_requires_https() {
        let config = BackendConfig {
            url: "http://localhost:54321".to_string(),
            ..complete()
        };
        assert!(config.validate(&Environment::Development).is_ok());
        assert_eq!(
            config.validate(&Environment::Production),
            Err(ValidationError::MustBeHttps("BACKEND__URL"))
        );
    }

    #[test]
    fn test_rejects_non_http_url() {
        let config = BackendConfig {
            site_url: "app.example.com".to_string(),
            ..complete()
        };
        assert_eq!(
            config.validate(&Environment::Development),
            Err(ValidationError::InvalidUrl("BACKEND__SITE_URL"))
        );
    }

    #[test]
    fn test_password_reset_redirect_trims_trailing_slash() {
        assert_eq!(
            complete().password_reset_redirect(),
            "https://app.example.com/reset-password"
        );
    }

    #[test]
    fn test_debug_hides_keys() {
        let rendered = format!("{:?}", complete());
        assert!(!rendered.contains("service\""));
        assert!(rendered.contains("REDACTED"));
    }
}
