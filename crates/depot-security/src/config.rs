//! Security configuration
//!
//! Loaded from a TOML or JSON file (picked by extension), then overlaid with
//! environment variables, then validated:
//!
//! ```toml
//! secret = "app-secret"
//! policy_ttl_secs = 3600
//!
//! [default_constraints]
//! container = "uploads-.*"
//! ```
//!
//! | Variable | Field |
//! |----------|-------|
//! | `DEPOT_POLICY_SECRET` | `secret` |
//! | `DEPOT_POLICY_TTL_SECS` | `policy_ttl_secs` |

use crate::policy::PolicyConstraints;
use crate::secret::PolicySecret;
use depot_core::ConfigError;
use serde::Deserialize;
use std::path::Path;

/// Environment variable overriding the signing secret
pub const SECRET_ENV: &str = "DEPOT_POLICY_SECRET";

/// Environment variable overriding the policy lifetime
pub const TTL_ENV: &str = "DEPOT_POLICY_TTL_SECS";

/// Default policy lifetime: one hour
pub const DEFAULT_POLICY_TTL_SECS: u64 = 3600;

/// Read-only settings for issuing and verifying policies
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    /// Application secret keying every signature
    pub secret: PolicySecret,
    /// Lifetime of issued policies, seconds
    pub policy_ttl_secs: u64,
    /// Constraints applied to every issued policy unless overridden
    pub default_constraints: PolicyConstraints,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            secret: PolicySecret::default(),
            policy_ttl_secs: DEFAULT_POLICY_TTL_SECS,
            default_constraints: PolicyConstraints::default(),
        }
    }
}

impl SecurityConfig {
    /// Configuration with `secret` and defaults elsewhere
    pub fn new(secret: impl Into<PolicySecret>) -> Self {
        Self {
            secret: secret.into(),
            ..Self::default()
        }
    }

    /// Load a configuration file without overlaying the environment
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            message: format!("{}: {e}", path.display()),
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                message: format!("Invalid JSON: {e}"),
            }),
            _ => Err(ConfigError::Parse {
                message: format!("Unsupported config format: {}", path.display()),
            }),
        }
    }

    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: format!("Invalid TOML: {e}"),
        })
    }

    /// Overlay process environment variables
    pub fn merge_with_env(&mut self) -> Result<(), ConfigError> {
        self.merge_with_vars(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup`, keyed by environment variable name
    pub fn merge_with_vars<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup(SECRET_ENV) {
            self.secret = PolicySecret::from(secret);
        }
        if let Some(ttl) = lookup(TTL_ENV) {
            self.policy_ttl_secs = ttl.trim().parse().map_err(|_| ConfigError::InvalidField {
                field: "policy_ttl_secs".to_string(),
                message: format!("invalid integer in {TTL_ENV}"),
            })?;
        }
        Ok(())
    }

    /// Check the configuration can issue policies
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::InvalidField {
                field: "secret".to_string(),
                message: format!("required (set it in the config file or {SECRET_ENV})"),
            });
        }
        if self.policy_ttl_secs == 0 {
            return Err(ConfigError::InvalidField {
                field: "policy_ttl_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if let (Some(min), Some(max)) = (
            self.default_constraints.min_size,
            self.default_constraints.max_size,
        ) {
            if min > max {
                return Err(ConfigError::InvalidField {
                    field: "default_constraints.min_size".to_string(),
                    message: format!("{min} exceeds max_size {max}"),
                });
            }
        }
        Ok(())
    }

    /// Load `path` if given, overlay the environment and validate
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.merge_with_env()?;
        config.validate()?;

        tracing::debug!(
            policy_ttl_secs = config.policy_ttl_secs,
            has_default_constraints = !config.default_constraints.is_empty(),
            "Loaded security config"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_parse_toml() {
        let config = SecurityConfig::from_toml_str(
            r#"
            secret = "app-secret"
            policy_ttl_secs = 600

            [default_constraints]
            container = "uploads-.*"
            max_size = 1048576
            "#,
        )
        .unwrap();

        assert_eq!(config.secret.expose(), b"app-secret");
        assert_eq!(config.policy_ttl_secs, 600);
        assert_eq!(
            config.default_constraints.container.as_deref(),
            Some("uploads-.*")
        );
        assert_eq!(config.default_constraints.max_size, Some(1_048_576));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_apply() {
        let config = SecurityConfig::from_toml_str(r#"secret = "x""#).unwrap();
        assert_eq!(config.policy_ttl_secs, DEFAULT_POLICY_TTL_SECS);
        assert!(config.default_constraints.is_empty());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert_matches!(
            SecurityConfig::from_toml_str("secrit = \"typo\""),
            Err(ConfigError::Parse { .. })
        );
    }

    #[test]
    fn test_vars_override_file() {
        let vars: HashMap<&str, &str> = [(SECRET_ENV, "from-env"), (TTL_ENV, " 90 ")].into();
        let mut config = SecurityConfig::new("from-file");
        config
            .merge_with_vars(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.secret.expose(), b"from-env");
        assert_eq!(config.policy_ttl_secs, 90);
    }

    #[test]
    fn test_bad_ttl_var() {
        let mut config = SecurityConfig::new("s");
        let result = config.merge_with_vars(|key| (key == TTL_ENV).then(|| "soon".to_string()));
        assert_matches!(result, Err(ConfigError::InvalidField { field, .. }) if field == "policy_ttl_secs");
    }

    #[test]
    fn test_validate_rejects_missing_secret_and_zero_ttl() {
        assert_matches!(
            SecurityConfig::default().validate(),
            Err(ConfigError::InvalidField { field, .. }) if field == "secret"
        );

        let mut config = SecurityConfig::new("s");
        config.policy_ttl_secs = 0;
        assert_matches!(
            config.validate(),
            Err(ConfigError::InvalidField { field, .. }) if field == "policy_ttl_secs"
        );
    }

    #[test]
    fn test_load_from_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"secret":"json-secret","policy_ttl_secs":30}}"#).unwrap();

        let config = SecurityConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.secret.expose(), b"json-secret");
        assert_eq!(config.policy_ttl_secs, 30);
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        assert_matches!(
            SecurityConfig::load_from_file(file.path()),
            Err(ConfigError::Parse { .. })
        );
    }
}
