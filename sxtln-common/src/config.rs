///! CLI configuration management
///!
///! The config is stored as YAML under `$HOME/.sxtln/config`. Loading
///! accepts either JSON or YAML so hand-edited files of both shapes work.

use crate::error::{Error, Result};
use crate::value::Document;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::{Path, PathBuf};

/// Output format preference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    /// Anything other than `yaml` normalizes to JSON
    pub fn normalize(s: &str) -> Self {
        if s == "yaml" {
            OutputFormat::Yaml
        } else {
            OutputFormat::Json
        }
    }

    /// Strict variant used for command-line overrides
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "json" => Some(OutputFormat::Json),
            "yaml" => Some(OutputFormat::Yaml),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
        }
    }
}

impl Serialize for OutputFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OutputFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = Option::<String>::deserialize(deserializer)?;
        Ok(s.map(|s| OutputFormat::normalize(&s)).unwrap_or_default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub token: String,
    #[serde(rename = "apiKey", skip_serializing_if = "String::is_empty")]
    pub api_key: String,
    pub output: OutputFormat,
}

impl Config {
    /// Read a single key; unknown keys yield an empty document
    pub fn get(&self, key: &str) -> Document {
        let doc = Document::new();
        match key.to_lowercase().as_str() {
            "token" => doc.with("token", self.token.as_str()),
            "apikey" => doc.with("apiKey", self.api_key.as_str()),
            "output" => doc.with("output", self.output.as_str()),
            _ => doc,
        }
    }

    /// Update a single key, returning whether anything was set.
    /// A missing value clears the key.
    pub fn set(&mut self, key: &str, value: Option<&str>) -> bool {
        let value = value.unwrap_or_default();
        match key.to_lowercase().as_str() {
            "token" => self.token = value.to_string(),
            "apikey" => self.api_key = value.to_string(),
            "output" => self.output = OutputFormat::normalize(value),
            _ => return false,
        }
        true
    }

    pub fn to_document(&self) -> Result<Document> {
        Document::from_serializable(self)
    }
}

/// Location of the persisted config file
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$HOME/.sxtln/config`
    pub fn default_location() -> Result<Self> {
        let home = std::env::var("HOME")
            .map_err(|_| Error::InvalidConfig("HOME is not set".to_string()))?;
        Ok(Self::new(PathBuf::from(home).join(".sxtln").join("config")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config, falling back to defaults when no file exists
    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            return Ok(Config::default());
        }

        let contents = std::fs::read(&self.path)?;
        if contents.iter().all(u8::is_ascii_whitespace) {
            return Ok(Config::default());
        }

        match serde_json::from_slice(&contents) {
            Ok(config) => Ok(config),
            Err(json_err) => {
                tracing::debug!(error = %json_err, "config is not JSON, trying YAML");
                Ok(serde_yaml::from_slice(&contents)?)
            }
        }
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_yaml::to_string(config)?;
        std::fs::write(&self.path, contents)?;
        tracing::debug!(path = %self.path.display(), "config saved");

        Ok(())
    }
}

/// `config set`: update one key and persist when something changed
pub fn set_config(
    config: &mut Config,
    store: &ConfigStore,
    key: &str,
    value: Option<&str>,
) -> Result<Document> {
    if config.set(key, value) {
        store.save(config)?;
    }
    config.to_document()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, ConfigStore) {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join(".sxtln").join("config"));
        (dir, store)
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let (_dir, store) = temp_store();
        let config = store.load().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.output, OutputFormat::Json);
    }

    #[test]
    fn test_config_save_and_load() {
        let (_dir, store) = temp_store();
        let config = Config {
            token: "tok".to_string(),
            api_key: "key".to_string(),
            output: OutputFormat::Yaml,
        };

        store.save(&config).unwrap();
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("apiKey: key"));

        assert_eq!(store.load().unwrap(), config);
    }

    #[test]
    fn test_yaml_only_file_loads_through_fallback() {
        let (dir, store) = temp_store();
        std::fs::create_dir_all(dir.path().join(".sxtln")).unwrap();
        std::fs::write(store.path(), "token: abc\napiKey: def\noutput: yaml\n").unwrap();

        let config = store.load().unwrap();
        assert_eq!(config.token, "abc");
        assert_eq!(config.api_key, "def");
        assert_eq!(config.output, OutputFormat::Yaml);
    }

    #[test]
    fn test_json_file_loads() {
        let (dir, store) = temp_store();
        std::fs::create_dir_all(dir.path().join(".sxtln")).unwrap();
        std::fs::write(store.path(), r#"{"apiKey": "def"}"#).unwrap();

        let config = store.load().unwrap();
        assert_eq!(config.api_key, "def");
        assert!(config.token.is_empty());
        assert_eq!(config.output, OutputFormat::Json);
    }

    #[test]
    fn test_set_output_normalizes_and_persists() {
        let (_dir, store) = temp_store();
        let mut config = Config::default();

        set_config(&mut config, &store, "output", Some("yaml")).unwrap();
        assert_eq!(store.load().unwrap().output, OutputFormat::Yaml);

        let doc = set_config(&mut config, &store, "output", Some("table")).unwrap();
        assert_eq!(config.output, OutputFormat::Json);
        assert_eq!(doc.require_str("output").unwrap(), "json");
        assert_eq!(store.load().unwrap().output, OutputFormat::Json);
    }

    #[test]
    fn test_set_and_clear_keys() {
        let (_dir, store) = temp_store();
        let mut config = Config::default();

        set_config(&mut config, &store, "token", Some("test value")).unwrap();
        assert_eq!(config.token, "test value");
        set_config(&mut config, &store, "token", None).unwrap();
        assert!(config.token.is_empty());

        set_config(&mut config, &store, "apiKey", Some("test value")).unwrap();
        assert_eq!(
            config.get("APIKEY").require_str("apiKey").unwrap(),
            "test value"
        );
    }

    #[test]
    fn test_unknown_key_does_not_persist() {
        let (_dir, store) = temp_store();
        let mut config = Config::default();

        set_config(&mut config, &store, "colour", Some("blue")).unwrap();
        assert!(!store.path().exists());
        assert!(config.get("colour").is_empty());
    }
}
