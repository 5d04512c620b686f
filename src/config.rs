//! Layered configuration.
//!
//! Settings merge in order: built-in defaults, then `cartograph.toml`, then
//! environment variables. Environment variables use the `CARTOGRAPH_`
//! prefix with double underscores between nested levels:
//! `CARTOGRAPH_INDEXING__PARALLEL_THREADS=8` sets
//! `indexing.parallel_threads`.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{IndexError, IndexResult};
use crate::lang::{Language, all_languages};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub indexing: IndexingConfig,

    /// Per-language enable switches, keyed by config key ("go", "python", …).
    #[serde(default = "default_languages")]
    pub languages: HashMap<String, LanguageConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IndexingConfig {
    /// Number of worker threads for parse/resolve/hash loops. The
    /// orchestrator additionally caps this at the number of files.
    #[serde(default = "default_parallel_threads")]
    pub parallel_threads: usize,

    /// Glob patterns excluded from discovery, on top of .gitignore.
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,

    /// Files above this size are skipped.
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LanguageConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level filter ("error", "warn", "info", "debug", "trace").
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module level overrides, e.g. `pipeline = "debug"`.
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_version() -> u32 {
    1
}

fn default_parallel_threads() -> usize {
    num_cpus::get()
}

fn default_ignore_patterns() -> Vec<String> {
    vec![
        "target/**".to_string(),
        "node_modules/**".to_string(),
        "vendor/**".to_string(),
        "dist/**".to_string(),
        "*.min.js".to_string(),
    ]
}

fn default_max_file_size() -> u64 {
    2 * 1024 * 1024
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_languages() -> HashMap<String, LanguageConfig> {
    all_languages()
        .iter()
        .map(|lang| (lang.config_key().to_string(), LanguageConfig { enabled: true }))
        .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            indexing: IndexingConfig::default(),
            languages: default_languages(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            parallel_threads: default_parallel_threads(),
            ignore_patterns: default_ignore_patterns(),
            max_file_size_bytes: default_max_file_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load settings: defaults, then the given TOML file (if it exists),
    /// then `CARTOGRAPH_*` environment variables.
    pub fn load(config_path: Option<&Path>) -> IndexResult<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        } else {
            figment = figment.merge(Toml::file("cartograph.toml"));
        }
        figment
            .merge(Env::prefixed("CARTOGRAPH_").split("__"))
            .extract()
            .map_err(|e| IndexError::Config {
                reason: e.to_string(),
            })
    }

    /// Whether a language is enabled. Unlisted languages default to on.
    pub fn language_enabled(&self, language: Language) -> bool {
        self.languages
            .get(language.config_key())
            .map(|c| c.enabled)
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_all_languages() {
        let settings = Settings::default();
        for lang in all_languages() {
            assert!(settings.language_enabled(*lang), "{lang} should default on");
        }
    }

    #[test]
    fn disabled_language_is_respected() {
        let mut settings = Settings::default();
        settings
            .languages
            .insert("lua".to_string(), LanguageConfig { enabled: false });
        assert!(!settings.language_enabled(Language::Lua));
        assert!(settings.language_enabled(Language::Go));
    }

    #[test]
    fn default_thread_count_is_positive() {
        assert!(Settings::default().indexing.parallel_threads >= 1);
    }
}
