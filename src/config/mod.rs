//! Configuration management for `issue_tracker`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`ISSUES_<KEY>`)
//! 3. Project config (`.issues/config.yaml`)
//! 4. User config (`~/.config/issues/config.yaml`)
//! 5. Defaults

use crate::error::{IssueError, Result};
use crate::storage::{SqliteStorage, UpdateTargetPolicy};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory holding project config and the default database.
pub const PROJECT_DIR: &str = ".issues";
/// Default database filename inside [`PROJECT_DIR`].
const DEFAULT_DB_FILENAME: &str = "issues.db";
/// Default busy timeout in milliseconds.
const DEFAULT_LOCK_TIMEOUT_MS: u64 = 30_000;
/// Prefix for environment overrides.
const ENV_PREFIX: &str = "ISSUES_";

/// A configuration layer: normalized key to raw value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub values: HashMap<String, String>,
}

impl ConfigLayer {
    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(normalize_key(key), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&normalize_key(key)).map(String::as_str)
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&contents)?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(layer_from_yaml_value(&value))
    }

    /// Build a layer from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_vars(env::vars())
    }

    /// Build a layer from `ISSUES_<KEY>` variables.
    #[must_use]
    pub fn from_env_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut layer = Self::default();
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layer.insert(stripped, value);
            }
        }
        layer
    }
}

/// CLI overrides for config loading.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub db: Option<PathBuf>,
    pub lock_timeout: Option<u64>,
    pub update_target: Option<String>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();

        if let Some(path) = &self.db {
            layer.insert("db", path.to_string_lossy());
        }
        if let Some(lock_timeout) = self.lock_timeout {
            layer.insert("lock-timeout", lock_timeout.to_string());
        }
        if let Some(update_target) = &self.update_target {
            layer.insert("update-target", update_target.clone());
        }

        layer
    }
}

/// Resolved settings after all layers are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub db_path: PathBuf,
    pub lock_timeout_ms: u64,
    pub update_target: UpdateTargetPolicy,
}

impl Settings {
    /// Interpret a merged layer.
    ///
    /// # Errors
    ///
    /// Returns `IssueError::Config` for a non-numeric lock timeout or an
    /// unknown update target.
    pub fn from_layer(layer: &ConfigLayer) -> Result<Self> {
        let db_path = layer
            .get("db")
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map_or_else(default_db_path, PathBuf::from);

        let lock_timeout_ms = match layer.get("lock-timeout") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                IssueError::Config(format!("invalid lock-timeout '{raw}': expected milliseconds"))
            })?,
            None => DEFAULT_LOCK_TIMEOUT_MS,
        };

        let update_target = layer
            .get("update-target")
            .map(str::parse::<UpdateTargetPolicy>)
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            db_path,
            lock_timeout_ms,
            update_target,
        })
    }

    /// Open the configured database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open_storage(&self) -> Result<SqliteStorage> {
        SqliteStorage::open_with_timeout(&self.db_path, Some(self.lock_timeout_ms))
    }
}

fn default_db_path() -> PathBuf {
    Path::new(PROJECT_DIR).join(DEFAULT_DB_FILENAME)
}

/// Load project config (`<project_dir>/config.yaml`).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_dir: &Path) -> Result<ConfigLayer> {
    ConfigLayer::from_yaml(&project_dir.join("config.yaml"))
}

/// Load user config (`~/.config/issues/config.yaml`).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<ConfigLayer> {
    let Ok(home) = env::var("HOME") else {
        return Ok(ConfigLayer::default());
    };
    let path = Path::new(&home)
        .join(".config")
        .join("issues")
        .join("config.yaml");
    ConfigLayer::from_yaml(&path)
}

/// Load settings with the full precedence order.
///
/// # Errors
///
/// Returns an error if any config file cannot be read or parsed, or a value
/// is invalid.
pub fn load_settings(project_dir: &Path, cli: &CliOverrides) -> Result<Settings> {
    let layer = ConfigLayer::merge_layers(&[
        load_user_config()?,
        load_project_config(project_dir)?,
        ConfigLayer::from_env(),
        cli.as_layer(),
    ]);
    let settings = Settings::from_layer(&layer)?;
    debug!(?settings, "Resolved settings");
    Ok(settings)
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('_', "-")
}

fn layer_from_yaml_value(value: &serde_yaml::Value) -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    let mut flat = HashMap::new();
    flatten_yaml(value, "", &mut flat);

    for (key, value) in flat {
        layer.insert(&key, value);
    }

    layer
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = key.as_str() else {
                    continue;
                };
                let next_prefix = if prefix.is_empty() {
                    key_str.to_string()
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(value, &next_prefix, out);
            }
        }
        _ => {
            if let Some(value) = yaml_scalar_to_string(value) {
                out.insert(prefix.to_string(), value);
            }
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(v) => Some(v.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_nothing_configured() {
        let settings = Settings::from_layer(&ConfigLayer::default()).expect("settings");
        assert_eq!(settings.db_path, Path::new(".issues").join("issues.db"));
        assert_eq!(settings.lock_timeout_ms, 30_000);
        assert_eq!(settings.update_target, UpdateTargetPolicy::FirstMatch);
    }

    #[test]
    fn yaml_keys_are_normalized_and_flattened() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("config.yaml");
        fs::write(
            &path,
            "update_target: reject-ambiguous\nlock-timeout: 500\nstore:\n  path: x.db\n",
        )
        .expect("write config");

        let layer = ConfigLayer::from_yaml(&path).expect("layer");
        assert_eq!(layer.get("update-target"), Some("reject-ambiguous"));
        assert_eq!(layer.get("lock_timeout"), Some("500"));
        assert_eq!(layer.get("store.path"), Some("x.db"));
    }

    #[test]
    fn missing_yaml_is_empty() {
        let temp = TempDir::new().expect("tempdir");
        let layer = ConfigLayer::from_yaml(&temp.path().join("absent.yaml")).expect("layer");
        assert!(layer.values.is_empty());
    }

    #[test]
    fn precedence_cli_over_env_over_project() {
        let mut project = ConfigLayer::default();
        project.insert("db", "project.db");
        project.insert("lock-timeout", "100");
        project.insert("update-target", "reject-ambiguous");

        let env_layer = ConfigLayer::from_env_vars([
            ("ISSUES_DB".to_string(), "env.db".to_string()),
            ("ISSUES_LOCK_TIMEOUT".to_string(), "200".to_string()),
            ("UNRELATED".to_string(), "x".to_string()),
        ]);
        assert_eq!(env_layer.values.len(), 2);

        let cli = CliOverrides {
            db: Some(PathBuf::from("cli.db")),
            ..CliOverrides::default()
        };

        let merged = ConfigLayer::merge_layers(&[project, env_layer, cli.as_layer()]);
        let settings = Settings::from_layer(&merged).expect("settings");
        assert_eq!(settings.db_path, PathBuf::from("cli.db"));
        assert_eq!(settings.lock_timeout_ms, 200);
        assert_eq!(settings.update_target, UpdateTargetPolicy::RejectAmbiguous);
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let mut layer = ConfigLayer::default();
        layer.insert("lock-timeout", "soon");
        assert!(matches!(
            Settings::from_layer(&layer),
            Err(IssueError::Config(_))
        ));

        let mut layer = ConfigLayer::default();
        layer.insert("update-target", "newest");
        assert!(matches!(
            Settings::from_layer(&layer),
            Err(IssueError::Config(_))
        ));
    }

    #[test]
    fn open_storage_uses_configured_path() {
        let temp = TempDir::new().expect("tempdir");
        let mut layer = ConfigLayer::default();
        layer.insert("db", temp.path().join("sub").join("t.db").to_string_lossy());
        let settings = Settings::from_layer(&layer).expect("settings");
        settings.open_storage().expect("open");
        assert!(settings.db_path.exists());
    }
}
