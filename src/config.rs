use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::enums::RiskPolicyKind;

/// Application-level constants
pub const APP_NAME: &str = "DermSight";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_MAX_IMAGE_MB: usize = 5;
const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_LLM_MODEL: &str = "llama-3.1-8b-instant";
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 20;

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "dermsight_lib=info,dermsight=info,tower_http=info"
}

/// Get the application data directory
/// ~/DermSight/ on all platforms
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default location of the case database.
pub fn default_database_path() -> PathBuf {
    app_data_dir().join("dermsight.db")
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Settings for the external explanation collaborator.
///
/// Passed explicitly to the client at construction; nothing here is global.
#[derive(Debug, Clone)]
pub struct ExplanationConfig {
    pub base_url: String,
    pub model: String,
    /// `None` disables the collaborator; responses carry the placeholder.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ExplanationConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            api_key: None,
            timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
        }
    }
}

/// Runtime configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    pub risk_policy: RiskPolicyKind,
    /// Upper bound on uploaded image size, enforced before decode.
    pub max_image_bytes: usize,
    pub explanation: ExplanationConfig,
}

impl AppConfig {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env file"),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_raw = get("DERMSIGHT_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidValue {
                key: "DERMSIGHT_BIND_ADDR",
                value: bind_raw.clone(),
            })?;

        let database_path = get("DERMSIGHT_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path);

        let risk_policy = match get("DERMSIGHT_RISK_POLICY") {
            Some(raw) => raw
                .trim()
                .to_ascii_lowercase()
                .parse::<RiskPolicyKind>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "DERMSIGHT_RISK_POLICY",
                    value: raw,
                })?,
            None => RiskPolicyKind::Additive,
        };

        let max_image_bytes = match get("DERMSIGHT_MAX_IMAGE_MB") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(mb) if mb > 0 => mb.checked_mul(1024 * 1024).ok_or_else(|| {
                    ConfigError::InvalidValue {
                        key: "DERMSIGHT_MAX_IMAGE_MB",
                        value: raw.clone(),
                    }
                })?,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "DERMSIGHT_MAX_IMAGE_MB",
                        value: raw,
                    })
                }
            },
            None => DEFAULT_MAX_IMAGE_MB * 1024 * 1024,
        };

        let timeout_secs = match get("DERMSIGHT_LLM_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "DERMSIGHT_LLM_TIMEOUT_SECS",
                        value: raw,
                    })
                }
            },
            None => DEFAULT_LLM_TIMEOUT_SECS,
        };

        let explanation = ExplanationConfig {
            base_url: get("DERMSIGHT_LLM_BASE_URL")
                .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.into()),
            model: get("DERMSIGHT_LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.into()),
            api_key: get("DERMSIGHT_LLM_API_KEY").or_else(|| get("GROQ_API_KEY")),
            timeout_secs,
        };

        Ok(Self {
            bind_addr,
            database_path,
            risk_policy,
            max_image_bytes,
            explanation,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn app_data_dir_ends_with_app_name() {
        assert!(app_data_dir().ends_with("DermSight"));
    }

    #[test]
    fn database_path_under_app_data() {
        let db = default_database_path();
        assert!(db.starts_with(app_data_dir()));
        assert!(db.ends_with("dermsight.db"));
    }

    #[test]
    fn defaults_when_environment_empty() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8000");
        assert_eq!(config.risk_policy, RiskPolicyKind::Additive);
        assert_eq!(config.max_image_bytes, 5 * 1024 * 1024);
        assert!(config.explanation.api_key.is_none());
        assert_eq!(config.explanation.model, "llama-3.1-8b-instant");
    }

    #[test]
    fn weighted_policy_selected_case_insensitively() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("DERMSIGHT_RISK_POLICY", "Weighted")])).unwrap();
        assert_eq!(config.risk_policy, RiskPolicyKind::Weighted);
    }

    #[test]
    fn unknown_policy_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("DERMSIGHT_RISK_POLICY", "blended")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { key: "DERMSIGHT_RISK_POLICY", .. }
        ));
    }

    #[test]
    fn zero_image_limit_rejected() {
        let err =
            AppConfig::from_lookup(lookup_from(&[("DERMSIGHT_MAX_IMAGE_MB", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn overflowing_image_limit_rejected() {
        let huge = usize::MAX.to_string();
        let err = AppConfig::from_lookup(lookup_from(&[("DERMSIGHT_MAX_IMAGE_MB", huge.as_str())]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { key: "DERMSIGHT_MAX_IMAGE_MB", .. }
        ));
    }

    #[test]
    fn image_limit_converted_to_bytes() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("DERMSIGHT_MAX_IMAGE_MB", "8")])).unwrap();
        assert_eq!(config.max_image_bytes, 8 * 1024 * 1024);
    }

    #[test]
    fn zero_explanation_timeout_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("DERMSIGHT_LLM_TIMEOUT_SECS", "0")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { key: "DERMSIGHT_LLM_TIMEOUT_SECS", .. }
        ));
    }

    #[test]
    fn explanation_timeout_parsed() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("DERMSIGHT_LLM_TIMEOUT_SECS", "45")])).unwrap();
        assert_eq!(config.explanation.timeout_secs, 45);
    }

    #[test]
    fn bad_bind_addr_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("DERMSIGHT_BIND_ADDR", "localhost")]))
            .unwrap_err();
        assert!(err.to_string().contains("DERMSIGHT_BIND_ADDR"));
    }

    #[test]
    fn groq_key_used_as_fallback() {
        let config = AppConfig::from_lookup(lookup_from(&[("GROQ_API_KEY", "gsk-test")])).unwrap();
        assert_eq!(config.explanation.api_key.as_deref(), Some("gsk-test"));
    }

    #[test]
    fn blank_key_counts_as_unset() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("DERMSIGHT_LLM_API_KEY", "   ")])).unwrap();
        assert!(config.explanation.api_key.is_none());
    }

    #[test]
    fn app_name_is_dermsight() {
        assert_eq!(APP_NAME, "DermSight");
    }
}
