//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, path::PathBuf, sync::Arc};

use serde::Deserialize;

use super::types::Res;

/// Default path of the persisted store document.
fn default_store_path() -> PathBuf {
    PathBuf::from("cache.json")
}

/// Default Yammer REST API base URL.
fn default_yammer_api_url() -> String {
    "https://www.yammer.com/api/v1".to_string()
}

/// Default docomo dialogue endpoint.
fn default_docomo_dialogue_url() -> String {
    "https://api.apigw.smt.docomo.ne.jp/dialogue/v1/dialogue".to_string()
}

fn default_fallback_enabled() -> bool {
    true
}

/// Default place reported to the dialogue service.
fn default_fallback_place() -> String {
    "東京".to_string()
}

/// Default character id of the dialogue persona.
fn default_fallback_character() -> u32 {
    20
}

/// Default marker that prefixes group names.
fn default_group_marker() -> char {
    '%'
}

/// Configuration for the mention-bot application.
#[derive(Debug, Clone)]
pub struct Config {
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConfigInner {
    /// Path of the JSON document holding credentials and mention groups (`STORE_PATH`).
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    /// Yammer REST API base URL (`YAMMER_API_URL`).
    #[serde(default = "default_yammer_api_url")]
    pub yammer_api_url: String,
    /// Yammer access token (`YAMMER_ACCESS_TOKEN`).
    /// When empty, the `accessToken` of the store document is used.
    #[serde(default)]
    pub yammer_access_token: String,
    /// docomo dialogue endpoint (`DOCOMO_DIALOGUE_URL`).
    #[serde(default = "default_docomo_dialogue_url")]
    pub docomo_dialogue_url: String,
    /// docomo API key (`DOCOMO_API_KEY`).
    /// When empty, the `apiKey` of the store document is used.
    #[serde(default)]
    pub docomo_api_key: String,
    /// Whether unmatched messages are answered by the dialogue service (`FALLBACK_ENABLED`).
    #[serde(default = "default_fallback_enabled")]
    pub fallback_enabled: bool,
    /// Place sent with every dialogue request (`FALLBACK_PLACE`).
    #[serde(default = "default_fallback_place")]
    pub fallback_place: String,
    /// Persona character id sent with every dialogue request (`FALLBACK_CHARACTER`).
    #[serde(default = "default_fallback_character")]
    pub fallback_character: u32,
    /// Marker prefixing group names in commands (`GROUP_MARKER`).
    #[serde(default = "default_group_marker")]
    pub group_marker: char,
}

impl Default for ConfigInner {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            yammer_api_url: default_yammer_api_url(),
            yammer_access_token: String::new(),
            docomo_dialogue_url: default_docomo_dialogue_url(),
            docomo_api_key: String::new(),
            fallback_enabled: default_fallback_enabled(),
            fallback_place: default_fallback_place(),
            fallback_character: default_fallback_character(),
            group_marker: default_group_marker(),
        }
    }
}

impl Config {
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("MENTION_BOT"));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        result.validate()?;

        Ok(result)
    }

    fn validate(&self) -> Res<()> {
        if !self.group_marker.is_ascii_punctuation() {
            return Err(anyhow::anyhow!("Group marker must be a single ASCII punctuation character."));
        }

        if self.yammer_api_url.is_empty() {
            return Err(anyhow::anyhow!("Yammer API URL must not be empty."));
        }

        Ok(())
    }
}

impl From<ConfigInner> for Config {
    fn from(inner: ConfigInner) -> Self {
        Self { inner: Arc::new(inner) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::from(ConfigInner::default());

        assert!(config.validate().is_ok());
        assert_eq!(config.group_marker, '%');
        assert_eq!(config.store_path, PathBuf::from("cache.json"));
        assert!(config.fallback_enabled);
    }

    #[test]
    fn rejects_alphanumeric_marker() {
        let config = Config::from(ConfigInner {
            group_marker: 'g',
            ..Default::default()
        });

        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "store_path = \"groups.json\"\ngroup_marker = \"#\"\nfallback_enabled = false\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.store_path, PathBuf::from("groups.json"));
        assert_eq!(config.group_marker, '#');
        assert!(!config.fallback_enabled);
        assert_eq!(config.fallback_place, "東京");
    }
}
