//! Configuration for the engine.
//!
//! Layered: defaults, then an `ariadne.toml` file, then environment variable
//! overrides. Environment variables are prefixed with `ARIADNE_` and use
//! double underscores for nesting: `ARIADNE_RESOLUTION__FIXPOINT_HOPS=3`
//! sets `resolution.fixpoint_hops`.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Hard cap on source file size in bytes. Oversized files fail with
    /// `FileTooLarge` instead of hanging the parser.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,

    #[serde(default)]
    pub resolution: ResolutionConfig,

    #[serde(default)]
    pub python: PythonConfig,

    /// Per-language settings, keyed by language config name.
    #[serde(default)]
    pub languages: HashMap<String, LanguageConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ResolutionConfig {
    /// How many hops of dependents to re-resolve after a file update.
    /// One hop is the documented default; callers wanting fixpoint behavior
    /// raise this.
    #[serde(default = "default_fixpoint_hops")]
    pub fixpoint_hops: u32,

    /// Depth budget when walking inheritance chains. Breaks cycles among
    /// unresolved parents.
    #[serde(default = "default_max_inheritance_depth")]
    pub max_inheritance_depth: u32,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            fixpoint_hops: default_fixpoint_hops(),
            max_inheritance_depth: default_max_inheritance_depth(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PythonConfig {
    /// When a module assigns a literal `__all__`, restrict its exports to
    /// the listed names.
    #[serde(default = "default_true")]
    pub respect_dunder_all: bool,
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            respect_dunder_all: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LanguageConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Extra file extensions mapped to this language.
    #[serde(default)]
    pub extensions: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level: error, warn, info, debug, trace.
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module overrides, e.g. `resolution = "debug"`.
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            resolution: ResolutionConfig::default(),
            python: PythonConfig::default(),
            languages: HashMap::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings from defaults, `ariadne.toml` in the working directory,
    /// and `ARIADNE_*` environment overrides.
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(Path::new("ariadne.toml"))
    }

    /// Load settings with an explicit config file path.
    pub fn load_from(config_path: &Path) -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("ARIADNE_").split("__"))
            .extract()
    }

    pub fn language_enabled(&self, config_key: &str) -> bool {
        self.languages
            .get(config_key)
            .map(|l| l.enabled)
            .unwrap_or(true)
    }
}

fn default_max_file_size() -> usize {
    10 * 1024 * 1024
}

fn default_fixpoint_hops() -> u32 {
    1
}

fn default_max_inheritance_depth() -> u32 {
    32
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.max_file_size, 10 * 1024 * 1024);
        assert_eq!(s.resolution.fixpoint_hops, 1);
        assert_eq!(s.resolution.max_inheritance_depth, 32);
        assert!(s.python.respect_dunder_all);
        assert!(s.language_enabled("python"));
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ariadne.toml");
        std::fs::write(
            &path,
            r#"
max_file_size = 1024

[resolution]
fixpoint_hops = 3

[python]
respect_dunder_all = false

[languages.rust]
enabled = false
"#,
        )
        .unwrap();

        let s = Settings::load_from(&path).unwrap();
        assert_eq!(s.max_file_size, 1024);
        assert_eq!(s.resolution.fixpoint_hops, 3);
        assert!(!s.python.respect_dunder_all);
        assert!(!s.language_enabled("rust"));
        assert!(s.language_enabled("python"));
        // Untouched values keep their defaults.
        assert_eq!(s.resolution.max_inheritance_depth, 32);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let s = Settings::load_from(Path::new("/nonexistent/ariadne.toml")).unwrap();
        assert_eq!(s.max_file_size, Settings::default().max_file_size);
    }
}
