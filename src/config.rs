//! Bot configuration: a YAML file under the platform config directory,
//! verified against the known key set and repaired in place when keys
//! are missing.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use poise::serenity_prelude::{GuildId, RoleId};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine the platform config directory")]
    NoConfigDir,

    #[error(
        "Configuration file does not exist; a template was written to {0}. \
         Fill in `guild` and `token` before starting the bot"
    )]
    Template(PathBuf),

    #[error("Configuration file is not a YAML mapping")]
    NotAMapping,

    #[error("`guild` is not set in the configuration file")]
    MissingGuild,

    #[error("No Discord token: set DISCORD_TOKEN or the `token` config key")]
    MissingToken,

    #[error("Failed to read or write configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// The single guild this bot serves.
    pub guild: GuildId,
    /// Bot token; the DISCORD_TOKEN env var takes precedence.
    #[serde(default)]
    pub token: Option<String>,
    /// Application ID, used only to log an invite URL on startup.
    #[serde(default)]
    pub client_id: Option<u64>,
    /// Role allowed to manage and play tracks. Guild administrators are
    /// always allowed.
    #[serde(default)]
    pub role: Option<RoleId>,
}

/// Every key the config file is expected to carry, with placeholder values.
fn default_mapping() -> Mapping {
    let mut map = Mapping::new();
    map.insert(Value::from("guild"), Value::Null);
    map.insert(Value::from("token"), Value::Null);
    map.insert(Value::from("client_id"), Value::Null);
    map.insert(Value::from("role"), Value::Null);
    map
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(dir.join("soundtrack").join("config.yml"))
}

impl Config {
    /// Load the config from its default location, writing a template and
    /// bailing out if it does not exist yet.
    pub fn load_or_init() -> Result<Self, ConfigError> {
        let path = default_config_path()?;
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, serde_yaml::to_string(&default_mapping())?)?;
            return Err(ConfigError::Template(path));
        }
        Self::load(&path)
    }

    /// Load and, if necessary, repair the config file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let mut map = match serde_yaml::from_str::<Value>(&raw)? {
            // An empty file parses as null; treat it as an empty mapping
            // so repair can fill in the template keys.
            Value::Null => Mapping::new(),
            Value::Mapping(map) => map,
            _ => return Err(ConfigError::NotAMapping),
        };

        let missing = repair(&mut map, &default_mapping(), "");
        if missing.is_empty() {
            info!("Config did not need repaired");
        } else {
            warn!("Repairing configuration file, missing keys: {missing:?}");
            fs::write(path, serde_yaml::to_string(&map)?)?;
        }

        match map.get("guild") {
            None | Some(Value::Null) => return Err(ConfigError::MissingGuild),
            Some(_) => {}
        }

        Ok(serde_yaml::from_value(Value::Mapping(map))?)
    }

    pub fn discord_token(&self) -> Result<String, ConfigError> {
        resolve_token(env::var("DISCORD_TOKEN").ok(), self.token.as_deref())
    }
}

fn resolve_token(env: Option<String>, config: Option<&str>) -> Result<String, ConfigError> {
    env.or_else(|| config.map(str::to_owned))
        .ok_or(ConfigError::MissingToken)
}

/// Add any key present in `defaults` but absent from `map`, recursing into
/// nested mappings. Returns the dotted paths of the keys that were added.
/// Keys the operator already set are never touched.
fn repair(map: &mut Mapping, defaults: &Mapping, prefix: &str) -> Vec<String> {
    let mut missing = Vec::new();
    for (key, default_value) in defaults {
        let name = key.as_str().unwrap_or("?");
        let path = format!("{prefix}.{name}");
        match map.get_mut(key) {
            None => {
                missing.push(path);
                map.insert(key.clone(), default_value.clone());
            }
            Some(Value::Mapping(nested)) => {
                if let Value::Mapping(nested_defaults) = default_value {
                    missing.extend(repair(nested, nested_defaults, &path));
                }
            }
            Some(_) => {}
        }
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mapping(yaml: &str) -> Mapping {
        match serde_yaml::from_str::<Value>(yaml).unwrap() {
            Value::Mapping(map) => map,
            Value::Null => Mapping::new(),
            other => panic!("not a mapping: {other:?}"),
        }
    }

    #[test]
    fn repair_fills_missing_keys() {
        let mut map = mapping("guild: 1234");
        let missing = repair(&mut map, &default_mapping(), "");
        assert_eq!(missing, vec![".token", ".client_id", ".role"]);
        assert!(map.contains_key("token"));
        assert_eq!(map.get("guild"), Some(&Value::from(1234)));
    }

    #[test]
    fn repair_keeps_operator_values() {
        let mut map = mapping("guild: 1\ntoken: abc\nclient_id: 2\nrole: 3");
        let missing = repair(&mut map, &default_mapping(), "");
        assert!(missing.is_empty());
        assert_eq!(map.get("token"), Some(&Value::from("abc")));
    }

    #[test]
    fn repair_recurses_into_nested_mappings() {
        let mut defaults = Mapping::new();
        let mut inner = Mapping::new();
        inner.insert(Value::from("b"), Value::from(2));
        defaults.insert(Value::from("a"), Value::Mapping(inner));

        let mut map = mapping("a: {}");
        let missing = repair(&mut map, &defaults, "");
        assert_eq!(missing, vec![".a.b"]);
    }

    #[test]
    fn load_repairs_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "guild: 99\ntoken: tok\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.guild, GuildId::new(99));
        assert_eq!(config.token.as_deref(), Some("tok"));
        assert_eq!(config.role, None);

        // The repaired file now carries every expected key.
        let rewritten = fs::read_to_string(&path).unwrap();
        assert!(rewritten.contains("client_id"));
        assert!(rewritten.contains("role"));
    }

    #[test]
    fn load_rejects_missing_guild() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "token: tok\n").unwrap();

        assert!(matches!(
            Config::load(&path),
            Err(ConfigError::MissingGuild)
        ));
    }

    #[test]
    fn load_rejects_non_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "- just\n- a\n- list\n").unwrap();

        assert!(matches!(Config::load(&path), Err(ConfigError::NotAMapping)));
    }

    #[test]
    fn token_prefers_environment() {
        assert_eq!(
            resolve_token(Some("env".into()), Some("cfg")).unwrap(),
            "env"
        );
        assert_eq!(resolve_token(None, Some("cfg")).unwrap(), "cfg");
        assert!(matches!(
            resolve_token(None, None),
            Err(ConfigError::MissingToken)
        ));
    }
}
