//! Configuration system for AKGC.
//!
//! Uses `figment` for layered configuration: defaults -> user config ->
//! workspace config -> explicit file -> environment. Callers such as the CLI
//! apply flag overrides on the extracted struct and re-run [`AkgcConfig::validate`].

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::embeddings::EmbeddingConfig;
use crate::error::ConfigError;
use crate::hvi::HviWeights;

/// Top-level configuration for the correction pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AkgcConfig {
    /// Similarity below this value is reported as context drift.
    #[serde(default = "default_sim_threshold")]
    pub sim_threshold: f64,
    /// Responses scoring below this HVI are corrected.
    #[serde(default = "default_hvi_threshold")]
    pub hvi_threshold: f64,
    #[serde(default)]
    pub hvi: HviWeights,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub similarity: SimilarityConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub support: SupportConfig,
}

fn default_sim_threshold() -> f64 {
    0.8
}

fn default_hvi_threshold() -> f64 {
    0.7
}

impl Default for AkgcConfig {
    fn default() -> Self {
        Self {
            sim_threshold: default_sim_threshold(),
            hvi_threshold: default_hvi_threshold(),
            hvi: HviWeights::default(),
            generation: GenerationConfig::default(),
            embedding: EmbeddingConfig::default(),
            similarity: SimilarityConfig::default(),
            knowledge: KnowledgeConfig::default(),
            support: SupportConfig::default(),
        }
    }
}

/// Generation collaborator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Backend name: "ollama" (default) or "echo".
    #[serde(default = "default_generation_provider")]
    pub provider: String,
    /// Model identifier passed to the backend.
    #[serde(default = "default_generation_model")]
    pub model: String,
    #[serde(default = "default_ollama_url")]
    pub base_url: String,
    /// Upper bound on generated tokens.
    #[serde(default = "default_generation_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
    /// Device preference; `false` asks the backend to stay on CPU.
    #[serde(default = "default_true")]
    pub use_gpu: bool,
}

fn default_generation_provider() -> String {
    "ollama".into()
}

fn default_generation_model() -> String {
    "llama3.2".into()
}

pub(crate) fn default_ollama_url() -> String {
    "http://localhost:11434".into()
}

fn default_generation_max_tokens() -> usize {
    64
}

fn default_generation_timeout() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_generation_provider(),
            model: default_generation_model(),
            base_url: default_ollama_url(),
            max_tokens: default_generation_max_tokens(),
            timeout_secs: default_generation_timeout(),
            use_gpu: true,
        }
    }
}

/// Similarity scorer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityConfig {
    /// Call the embedding collaborator; when off, lexical overlap is used.
    #[serde(default = "default_true")]
    pub use_embeddings: bool,
    /// Input truncation bound in tokens.
    #[serde(default = "default_similarity_max_tokens")]
    pub max_tokens: usize,
}

fn default_similarity_max_tokens() -> usize {
    512
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            use_embeddings: true,
            max_tokens: default_similarity_max_tokens(),
        }
    }
}

/// Fact provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Location of the persisted fact cache.
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,
    /// Query the remote knowledge source on curated-table misses.
    #[serde(default = "default_true")]
    pub external_lookup: bool,
    #[serde(default = "default_wikipedia_url")]
    pub base_url: String,
    /// Per-attempt timeout for the remote lookup.
    #[serde(default = "default_lookup_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_summary_chars")]
    pub max_summary_chars: usize,
    /// Allow substring matches against curated table keys.
    #[serde(default = "default_true")]
    pub substring_match: bool,
    /// Synthesize templated facts from prompt keywords when nothing is known.
    #[serde(default = "default_true")]
    pub contextual_fallback: bool,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_cache_path() -> PathBuf {
    PathBuf::from(".akgc").join("kg_cache.json")
}

fn default_wikipedia_url() -> String {
    "https://en.wikipedia.org".into()
}

fn default_lookup_timeout() -> u64 {
    5
}

fn default_max_summary_chars() -> usize {
    300
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            cache_path: default_cache_path(),
            external_lookup: true,
            base_url: default_wikipedia_url(),
            timeout_secs: default_lookup_timeout(),
            max_summary_chars: default_max_summary_chars(),
            substring_match: true,
            contextual_fallback: true,
            retry: RetryConfig::default(),
        }
    }
}

/// Bounded retry with a fixed delay between attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    2
}

fn default_backoff_ms() -> u64 {
    1000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

/// Secondary acceptance gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportConfig {
    /// Minimum share of a fact's tokens the response must echo.
    #[serde(default = "default_min_overlap")]
    pub min_overlap: f64,
}

fn default_min_overlap() -> f64 {
    0.6
}

impl Default for SupportConfig {
    fn default() -> Self {
        Self {
            min_overlap: default_min_overlap(),
        }
    }
}

/// Speed/accuracy preset applied on top of a loaded configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Accurate,
    Fast,
}

impl Profile {
    pub fn apply(self, config: &mut AkgcConfig) {
        match self {
            Profile::Accurate => {}
            Profile::Fast => {
                config.similarity.max_tokens = 64;
                config.similarity.use_embeddings = false;
                config.knowledge.external_lookup = false;
            }
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Profile::Accurate => write!(f, "accurate"),
            Profile::Fast => write!(f, "fast"),
        }
    }
}

impl AkgcConfig {
    /// Check ranges and cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("sim_threshold", self.sim_threshold),
            ("hvi_threshold", self.hvi_threshold),
            ("support.min_overlap", self.support.min_overlap),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid {
                    message: format!("{name} must be within [0, 1], got {value}"),
                });
            }
        }
        self.hvi.validate()?;
        if self.knowledge.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                message: "knowledge.retry.max_attempts must be at least 1".into(),
            });
        }
        if self.generation.max_tokens == 0 || self.similarity.max_tokens == 0 {
            return Err(ConfigError::Invalid {
                message: "token bounds must be positive".into(),
            });
        }
        Ok(())
    }
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with `AKGC_`, nested with `__`)
/// 2. Explicit config file
/// 3. Workspace-local config (`.akgc/config.toml`)
/// 4. User config (`~/.config/akgc/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    config_file: Option<&Path>,
) -> Result<AkgcConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(AkgcConfig::default()));

    if let Some(user_config) = user_config_path()
        && user_config.exists()
    {
        figment = figment.merge(Toml::file(&user_config));
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".akgc").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    if let Some(path) = config_file {
        if !path.exists() {
            return Err(ConfigError::Load {
                message: format!("config file not found: {}", path.display()),
            });
        }
        figment = figment.merge(Toml::file(path));
    }

    // AKGC_HVI_THRESHOLD, AKGC_GENERATION__MODEL, AKGC_KNOWLEDGE__RETRY__MAX_ATTEMPTS, ...
    figment = figment.merge(Env::prefixed("AKGC_").split("__"));

    let config: AkgcConfig = figment.extract().map_err(|e| ConfigError::Load {
        message: e.to_string(),
    })?;
    config.validate()?;
    Ok(config)
}

/// Path of the user-level config file, when a home directory is known.
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "akgc", "akgc")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AkgcConfig::default();
        assert_eq!(config.sim_threshold, 0.8);
        assert_eq!(config.hvi_threshold, 0.7);
        assert_eq!(config.hvi.similarity_weight, 0.4);
        assert_eq!(config.hvi.grounding_weight, 0.6);
        assert_eq!(config.generation.provider, "ollama");
        assert_eq!(config.generation.max_tokens, 64);
        assert_eq!(config.knowledge.retry.max_attempts, 2);
        assert_eq!(config.knowledge.max_summary_chars, 300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_empty() {
        let config: AkgcConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.hvi_threshold, 0.7);
        assert_eq!(config.similarity.max_tokens, 512);
        assert!(config.knowledge.external_lookup);
    }

    #[test]
    fn test_validate_rejects_threshold_out_of_range() {
        let config = AkgcConfig {
            hvi_threshold: 1.5,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("hvi_threshold"));
    }

    #[test]
    fn test_validate_rejects_unbalanced_weights() {
        let mut config = AkgcConfig::default();
        config.hvi.similarity_weight = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = AkgcConfig::default();
        config.knowledge.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fast_profile() {
        let mut config = AkgcConfig::default();
        Profile::Fast.apply(&mut config);
        assert_eq!(config.similarity.max_tokens, 64);
        assert!(!config.similarity.use_embeddings);
        assert!(!config.knowledge.external_lookup);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_accurate_profile_is_noop() {
        let mut config = AkgcConfig::default();
        Profile::Accurate.apply(&mut config);
        assert_eq!(config.similarity.max_tokens, 512);
        assert!(config.similarity.use_embeddings);
    }

    /// Point the user config directory into the jail so a developer's own
    /// config file never leaks into a test.
    fn isolate_user_dirs(jail: &mut figment::Jail) {
        let home = jail.directory().join("home");
        jail.set_env("HOME", home.display());
        jail.set_env("XDG_CONFIG_HOME", home.join(".config").display());
    }

    #[test]
    fn test_load_config_from_workspace() {
        figment::Jail::expect_with(|jail| {
            isolate_user_dirs(jail);
            jail.create_dir(".akgc")?;
            jail.create_file(
                ".akgc/config.toml",
                r#"
hvi_threshold = 0.65

[generation]
provider = "echo"
model = "distilgpt2"

[hvi]
similarity_weight = 0.6
grounding_weight = 0.4
"#,
            )?;
            let config = load_config(Some(jail.directory()), None).map_err(|e| e.to_string())?;
            assert_eq!(config.hvi_threshold, 0.65);
            assert_eq!(config.generation.provider, "echo");
            assert_eq!(config.generation.model, "distilgpt2");
            assert_eq!(config.hvi.similarity_weight, 0.6);
            // untouched sections keep their defaults
            assert_eq!(config.sim_threshold, 0.8);
            assert_eq!(config.knowledge.timeout_secs, 5);
            Ok(())
        });
    }

    #[test]
    fn test_explicit_file_overrides_workspace() {
        figment::Jail::expect_with(|jail| {
            isolate_user_dirs(jail);
            jail.create_dir(".akgc")?;
            jail.create_file(".akgc/config.toml", "hvi_threshold = 0.65")?;
            jail.create_file("custom.toml", "hvi_threshold = 0.55")?;
            let custom = jail.directory().join("custom.toml");
            let config = load_config(Some(jail.directory()), Some(&custom))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.hvi_threshold, 0.55);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_files() {
        figment::Jail::expect_with(|jail| {
            isolate_user_dirs(jail);
            jail.create_dir(".akgc")?;
            jail.create_file(".akgc/config.toml", "hvi_threshold = 0.65")?;
            jail.set_env("AKGC_HVI_THRESHOLD", "0.5");
            jail.set_env("AKGC_GENERATION__MODEL", "mistral");
            jail.set_env("AKGC_KNOWLEDGE__RETRY__MAX_ATTEMPTS", "3");
            let config = load_config(Some(jail.directory()), None).map_err(|e| e.to_string())?;
            assert_eq!(config.hvi_threshold, 0.5);
            assert_eq!(config.generation.model, "mistral");
            assert_eq!(config.knowledge.retry.max_attempts, 3);
            Ok(())
        });
    }

    #[test]
    fn test_load_config_rejects_invalid_values() {
        figment::Jail::expect_with(|jail| {
            isolate_user_dirs(jail);
            jail.create_dir(".akgc")?;
            jail.create_file(".akgc/config.toml", "sim_threshold = 2.0")?;
            let result = load_config(Some(jail.directory()), None);
            assert!(matches!(result, Err(ConfigError::Invalid { .. })));
            Ok(())
        });
    }

    #[test]
    fn test_user_config_sits_below_workspace() {
        figment::Jail::expect_with(|jail| {
            isolate_user_dirs(jail);
            let user_config = user_config_path().ok_or_else(|| "no user config dir".to_string())?;
            assert!(user_config.starts_with(jail.directory()));
            std::fs::create_dir_all(user_config.parent().ok_or_else(|| "no parent".to_string())?)
                .map_err(|e| e.to_string())?;
            std::fs::write(
                &user_config,
                "hvi_threshold = 0.75\nsim_threshold = 0.6\n",
            )
            .map_err(|e| e.to_string())?;

            let config = load_config(Some(jail.directory()), None).map_err(|e| e.to_string())?;
            assert_eq!(config.hvi_threshold, 0.75);
            assert_eq!(config.sim_threshold, 0.6);

            jail.create_dir(".akgc")?;
            jail.create_file(".akgc/config.toml", "hvi_threshold = 0.65")?;
            let config = load_config(Some(jail.directory()), None).map_err(|e| e.to_string())?;
            assert_eq!(config.hvi_threshold, 0.65);
            assert_eq!(config.sim_threshold, 0.6);
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = load_config(None, Some(Path::new("/nonexistent/akgc.toml")));
        assert!(matches!(result, Err(ConfigError::Load { .. })));
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let config = AkgcConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: AkgcConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(deserialized.hvi_threshold, config.hvi_threshold);
        assert_eq!(deserialized.knowledge.cache_path, config.knowledge.cache_path);
        assert_eq!(deserialized.embedding.provider, config.embedding.provider);
    }
}
