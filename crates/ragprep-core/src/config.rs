//! Configuration loading for the pipeline binaries.
//!
//! Uses Figment to merge `ragprep.toml` + `ragprep.<env>.toml` + the plain
//! environment variables the batch handler recognizes, then validates the
//! result into an [`EmbedSettings`] value. Also provides helpers to expand
//! `~` and `${VAR}` and to resolve relative paths against a base directory.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::scalar::opt_string;

pub const DEFAULT_CORPUS_KEY: &str = "processed/corpus.json";
pub const DEFAULT_OUTPUT_PREFIX: &str = "embeddings/";
pub const DEFAULT_MODEL_ID: &str = "amazon.titan-embed-text-v2:0";
pub const DEFAULT_BATCH_SIZE: usize = 25;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_FAKE_DIMENSION: usize = 1024;

/// Environment variables recognized by the batch embedding pipeline.
pub const EMBED_ENV_KEYS: &[&str] = &[
    "CORPUS_LOCATION",
    "CORPUS_KEY",
    "OUTPUT_LOCATION",
    "OUTPUT_PREFIX",
    "MODEL_ID",
    "BATCH_SIZE",
    "MAX_RETRIES",
    "REGION",
    "EMBED_ENDPOINT",
    "EMBED_API_KEY",
    "USE_FAKE_EMBEDDINGS",
    "FAKE_DIMENSION",
    "EXPECTED_DIMENSION",
];

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Ok(Self { figment: Self::figment_for_env(&env_name) })
    }

    /// `ragprep.toml`, then the per-environment file, then process env.
    /// `AWS_REGION` fills `region` only when `REGION` is unset.
    pub fn figment_for_env(env_name: &str) -> Figment {
        let mut figment = Figment::new().merge(Toml::file("ragprep.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("ragprep.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("ragprep.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("ragprep.test.toml")),
            _ => {}
        }
        figment
            .merge(Env::raw().only(&["AWS_REGION"]).map(|_| "region".into()))
            .merge(Env::raw().only(EMBED_ENV_KEYS))
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn embed_settings(&self) -> Result<EmbedSettings> {
        let raw: RawEmbedSettings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        raw.validate()
    }
}

/// Resolved configuration of the batch embedding pipeline.
///
/// Built once at process start and handed to each component constructor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedSettings {
    pub corpus_location: String,
    pub corpus_key: String,
    pub output_location: String,
    pub output_prefix: String,
    pub model_id: String,
    pub batch_size: usize,
    pub max_retries: u32,
    pub region: String,
    pub embed_endpoint: Option<String>,
    #[serde(skip_serializing)]
    pub embed_api_key: Option<String>,
    pub use_fake_embeddings: bool,
    pub fake_dimension: usize,
    pub expected_dimension: Option<usize>,
}

impl EmbedSettings {
    /// Defaults for everything except the corpus location.
    pub fn new(corpus_location: impl Into<String>) -> Self {
        let corpus_location = corpus_location.into();
        Self {
            output_location: corpus_location.clone(),
            corpus_location,
            corpus_key: DEFAULT_CORPUS_KEY.to_string(),
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            region: DEFAULT_REGION.to_string(),
            embed_endpoint: None,
            embed_api_key: None,
            use_fake_embeddings: false,
            fake_dimension: DEFAULT_FAKE_DIMENSION,
            expected_dimension: None,
        }
    }

    /// Provider endpoint, derived from the region unless set explicitly.
    pub fn endpoint(&self) -> String {
        match &self.embed_endpoint {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://bedrock-runtime.{}.amazonaws.com", self.region),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawEmbedSettings {
    #[serde(default, deserialize_with = "opt_string")]
    corpus_location: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    corpus_key: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    output_location: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    output_prefix: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    model_id: Option<String>,
    batch_size: Option<usize>,
    max_retries: Option<u32>,
    #[serde(default, deserialize_with = "opt_string")]
    region: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    embed_endpoint: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    embed_api_key: Option<String>,
    #[serde(default, deserialize_with = "de_flag")]
    use_fake_embeddings: bool,
    fake_dimension: Option<usize>,
    expected_dimension: Option<usize>,
}

impl RawEmbedSettings {
    fn validate(self) -> Result<EmbedSettings> {
        let corpus_location = self
            .corpus_location
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| Error::InvalidConfig("CORPUS_LOCATION is required".to_string()))?;
        let mut settings = EmbedSettings::new(corpus_location);
        if let Some(v) = self.corpus_key { settings.corpus_key = v; }
        if let Some(v) = self.output_location.filter(|s| !s.trim().is_empty()) { settings.output_location = v; }
        if let Some(v) = self.output_prefix { settings.output_prefix = v; }
        if let Some(v) = self.model_id { settings.model_id = v; }
        if let Some(v) = self.batch_size { settings.batch_size = v; }
        if let Some(v) = self.max_retries { settings.max_retries = v; }
        if let Some(v) = self.region.filter(|s| !s.trim().is_empty()) { settings.region = v; }
        if let Some(v) = self.fake_dimension { settings.fake_dimension = v; }
        settings.embed_endpoint = self.embed_endpoint.filter(|s| !s.trim().is_empty());
        settings.embed_api_key = self.embed_api_key.filter(|s| !s.trim().is_empty());
        settings.use_fake_embeddings = self.use_fake_embeddings;
        settings.expected_dimension = self.expected_dimension;

        if settings.batch_size == 0 {
            return Err(Error::InvalidConfig("BATCH_SIZE must be greater than zero".to_string()));
        }
        if settings.max_retries == 0 {
            return Err(Error::InvalidConfig("MAX_RETRIES must be at least 1".to_string()));
        }
        if settings.fake_dimension == 0 {
            return Err(Error::InvalidConfig("FAKE_DIMENSION must be greater than zero".to_string()));
        }
        Ok(settings)
    }
}

/// Accepts `true`/`false`, `1`/`0`, or their string spellings.
fn de_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }
    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
        Flag::Text(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
    })
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
