///! Command handlers and the per-invocation context they share

pub mod auth;
pub mod cluster;
pub mod config;

use anyhow::Result;
use sxtln_common::{ApiClient, Config, ConfigStore, Credentials, OutputFormat};

/// Per-invocation overrides from global flags. They shape this run's
/// requests and output but are never written back to the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub output: Option<OutputFormat>,
    pub token: Option<String>,
    pub api_key: Option<String>,
}

/// Everything a command handler needs, passed explicitly
pub struct Context {
    pub server: String,
    pub store: ConfigStore,
    /// Persisted config; handlers mutate and save this one
    pub config: Config,
    pub overrides: Overrides,
}

impl Context {
    /// Persisted config with this invocation's overrides applied
    pub fn effective_config(&self) -> Config {
        let mut effective = self.config.clone();
        if let Some(output) = self.overrides.output {
            effective.output = output;
        }
        if let Some(token) = self.overrides.token.as_ref().filter(|t| !t.is_empty()) {
            effective.token = token.clone();
        }
        if let Some(key) = self.overrides.api_key.as_ref().filter(|k| !k.is_empty()) {
            effective.api_key = key.clone();
        }
        effective
    }

    pub fn output_format(&self) -> OutputFormat {
        self.effective_config().output
    }

    pub fn api(&self) -> Result<ApiClient> {
        let credentials = Credentials::from_config(&self.effective_config());
        Ok(ApiClient::new(&self.server, credentials)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_do_not_touch_persisted_config() {
        let ctx = Context {
            server: sxtln_common::DEFAULT_BASE_URL.to_string(),
            store: ConfigStore::new("/nonexistent/config"),
            config: Config {
                api_key: "stored".to_string(),
                ..Default::default()
            },
            overrides: Overrides {
                output: Some(OutputFormat::Yaml),
                token: Some("flag-token".to_string()),
                api_key: None,
            },
        };

        let effective = ctx.effective_config();
        assert_eq!(effective.token, "flag-token");
        assert_eq!(effective.api_key, "stored");
        assert_eq!(ctx.output_format(), OutputFormat::Yaml);
        assert!(ctx.config.token.is_empty());
        assert_eq!(
            ctx.api().unwrap().credentials(),
            &Credentials::Token("flag-token".to_string())
        );
    }
}
