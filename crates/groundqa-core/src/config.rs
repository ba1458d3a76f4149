//! Layered configuration and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml` +
//! `APP_*` env vars (nested keys split on `__`, e.g. `APP_INDEX__CHUNK_SIZE`).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Typed view of the merged configuration, validated.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to extract settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub index: IndexSettings,
    pub query: QuerySettings,
    pub eval: EvalSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub docs_dir: String,
    pub index_dir: String,
    pub table: String,
    pub embed_model: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub batch_size: usize,
    pub prune_stale: bool,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            docs_dir: "data/docs".to_string(),
            index_dir: "vectorstore".to_string(),
            table: "ai_docs".to_string(),
            embed_model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            chunk_size: 900,
            chunk_overlap: 150,
            batch_size: 128,
            prune_stale: false,
        }
    }
}

impl IndexSettings {
    pub fn docs_dir(&self, base: &Path) -> PathBuf { resolve_with_base(base, &self.docs_dir) }
    pub fn index_dir(&self, base: &Path) -> PathBuf { resolve_with_base(base, &self.index_dir) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    pub top_k: usize,
    pub top_sentences: usize,
    pub support_threshold: f32,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self { top_k: 5, top_sentences: 6, support_threshold: 0.6 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalSettings {
    pub questions_file: String,
    pub reports_dir: String,
}

impl Default for EvalSettings {
    fn default() -> Self {
        Self { questions_file: "data/qa/qa.yml".to_string(), reports_dir: "reports".to_string() }
    }
}

impl EvalSettings {
    pub fn questions_file(&self, base: &Path) -> PathBuf { resolve_with_base(base, &self.questions_file) }
    pub fn reports_dir(&self, base: &Path) -> PathBuf { resolve_with_base(base, &self.reports_dir) }
}

impl Settings {
    pub fn validate(&self) -> Result<(), Error> {
        let ix = &self.index;
        if ix.chunk_size == 0 {
            return Err(Error::InvalidConfig("index.chunk_size must be at least 1".into()));
        }
        if ix.chunk_overlap >= ix.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "index.chunk_overlap ({}) must be smaller than index.chunk_size ({})",
                ix.chunk_overlap, ix.chunk_size
            )));
        }
        if ix.batch_size == 0 {
            return Err(Error::InvalidConfig("index.batch_size must be at least 1".into()));
        }
        if ix.embed_model.trim().is_empty() {
            return Err(Error::InvalidConfig("index.embed_model must not be empty".into()));
        }
        if self.query.top_k == 0 {
            return Err(Error::InvalidConfig("query.top_k must be at least 1".into()));
        }
        if self.query.top_sentences == 0 {
            return Err(Error::InvalidConfig("query.top_sentences must be at least 1".into()));
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
