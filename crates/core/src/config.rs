// Engine configuration (loaded once at startup)

use crate::application::dispatcher::constants::{
    DEFAULT_DRAIN_TIMEOUT, DEFAULT_DRAIN_TIMEOUT_SECS, DEFAULT_WORKERS,
};
use crate::domain::{KindConfig, KindId};
use crate::error::{AppError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Kind entry as written in the config file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawKindConfig {
    language: Option<String>,
    #[serde(default)]
    validators: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEngineConfig {
    #[serde(default = "default_enabled")]
    enabled: bool,
    #[serde(default)]
    enabled_env: Option<String>,
    #[serde(default = "default_workers")]
    workers: usize,
    #[serde(default = "default_drain_timeout_secs")]
    drain_timeout_secs: u64,
    #[serde(default)]
    identifiers: BTreeMap<KindId, RawKindConfig>,
}

fn default_enabled() -> bool {
    true
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_drain_timeout_secs() -> u64 {
    DEFAULT_DRAIN_TIMEOUT_SECS
}

/// Validated engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub enabled: bool,
    /// Env var consulted when `enabled` is false
    pub enabled_env: Option<String>,
    pub workers: usize,
    pub drain_timeout: Duration,
    pub kinds: BTreeMap<KindId, KindConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            enabled_env: None,
            workers: DEFAULT_WORKERS,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            kinds: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// Parse YAML configuration
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let raw: RawEngineConfig = serde_yaml_ng::from_str(text)
            .map_err(|e| AppError::Config(format!("invalid YAML config: {}", e)))?;
        Self::from_raw(raw)
    }

    /// Parse JSON configuration
    pub fn from_json_str(text: &str) -> Result<Self> {
        let raw: RawEngineConfig = serde_json::from_str(text)
            .map_err(|e| AppError::Config(format!("invalid JSON config: {}", e)))?;
        Self::from_raw(raw)
    }

    /// Load from a file; `.json` is parsed as JSON, everything else as YAML
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("cannot read config {}: {}", path.display(), e))
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_yaml_str(&text),
        }
    }

    fn from_raw(raw: RawEngineConfig) -> Result<Self> {
        if raw.workers == 0 {
            return Err(AppError::Config("workers must be at least 1".to_string()));
        }
        if raw.drain_timeout_secs == 0 {
            return Err(AppError::Config(
                "drain_timeout_secs must be at least 1".to_string(),
            ));
        }

        let mut kinds = BTreeMap::new();
        for (kind, entry) in raw.identifiers {
            if let Some(blank) = entry.validators.iter().position(|v| v.trim().is_empty()) {
                return Err(AppError::Config(format!(
                    "identifier '{}': validator #{} is empty",
                    kind,
                    blank + 1
                )));
            }
            let language = entry.language.unwrap_or_else(|| kind.clone());
            kinds.insert(kind, KindConfig::new(language, entry.validators));
        }

        Ok(Self {
            enabled: raw.enabled,
            enabled_env: raw.enabled_env,
            workers: raw.workers,
            drain_timeout: Duration::from_secs(raw.drain_timeout_secs),
            kinds,
        })
    }

    /// Resolve the effective on/off switch from the process environment
    pub fn resolve_enabled(&self) -> Result<bool> {
        self.resolve_enabled_with(|name| std::env::var(name).ok())
    }

    /// Resolve the on/off switch using `lookup` for environment variables
    pub fn resolve_enabled_with<F>(&self, lookup: F) -> Result<bool>
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.enabled {
            return Ok(true);
        }
        let Some(name) = &self.enabled_env else {
            return Ok(false);
        };
        match lookup(name) {
            None => Ok(false),
            Some(value) => parse_truthy(&value).ok_or_else(|| {
                AppError::Config(format!(
                    "environment variable {} has non-boolean value '{}'",
                    name, value
                ))
            }),
        }
    }
}

/// `1/true/yes/on` and `0/false/no/off`, case-insensitive
pub fn parse_truthy(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
enabled: false
enabled_env: CHECK_CODE
identifiers:
  bash:
    validators:
      - grep -q foo
      - sh -n $<
  pycon:
    language: python
"#;

    #[test]
    fn test_language_defaults_to_kind() {
        let config = EngineConfig::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(config.kinds["bash"].language, "bash");
        assert_eq!(config.kinds["bash"].validators.len(), 2);
        assert_eq!(config.kinds["pycon"].language, "python");
        assert!(config.kinds["pycon"].validators.is_empty());
        assert_eq!(config.workers, DEFAULT_WORKERS);
        assert_eq!(config.drain_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_env_override() {
        let config = EngineConfig::from_yaml_str(SAMPLE).unwrap();
        assert!(config
            .resolve_enabled_with(|_| Some("Yes".to_string()))
            .unwrap());
        assert!(!config
            .resolve_enabled_with(|_| Some("OFF".to_string()))
            .unwrap());
        assert!(!config.resolve_enabled_with(|_| None).unwrap());
        assert!(config
            .resolve_enabled_with(|_| Some("maybe".to_string()))
            .is_err());
    }

    #[test]
    fn test_literal_true_ignores_env() {
        let config = EngineConfig::from_yaml_str("enabled: true\nenabled_env: X\n").unwrap();
        assert!(config
            .resolve_enabled_with(|_| Some("0".to_string()))
            .unwrap());
    }

    #[test]
    fn test_wrong_types_rejected() {
        let err = EngineConfig::from_yaml_str("identifiers:\n  bash:\n    validators: 3\n")
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));

        let err = EngineConfig::from_yaml_str("identifiers:\n  bash:\n    validatorz: []\n")
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_blank_validator_rejected() {
        let err = EngineConfig::from_yaml_str("identifiers:\n  bash:\n    validators: ['  ']\n")
            .unwrap_err();
        assert!(err.to_string().contains("validator #1 is empty"));
    }

    #[test]
    fn test_unreadable_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::from_path(dir.path().join("missing.yml")).unwrap_err();
        assert!(matches!(err, AppError::Config(ref msg) if msg.contains("missing.yml")));

        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = EngineConfig::from_path(&path).unwrap_err();
        assert!(matches!(err, AppError::Config(ref msg) if msg.starts_with("invalid JSON")));
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(EngineConfig::from_yaml_str("workers: 0\n").is_err());
    }

    #[test]
    fn test_json_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fencecheck.json");
        std::fs::write(
            &path,
            r#"{"identifiers": {"sh": {"validators": ["sh -n"]}}, "workers": 2}"#,
        )
        .unwrap();

        let config = EngineConfig::from_path(&path).unwrap();
        assert_eq!(config.workers, 2);
        assert_eq!(config.kinds["sh"].validators, vec!["sh -n".to_string()]);
    }
}
