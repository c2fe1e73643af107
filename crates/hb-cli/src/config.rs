//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use hb_core::{DiaperConfig, FeedConfig, ProcessorConfig};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Export file analyzed when `--input` is not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_path: Option<PathBuf>,

    /// Diaper extraction settings.
    #[serde(default)]
    pub diaper: DiaperConfig,

    /// Feed processing settings.
    #[serde(default)]
    pub feed: FeedConfig,
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (HB_*, nested keys split on "__")
        figment = figment.merge(Env::prefixed("HB_").split("__"));

        figment.extract()
    }

    /// Settings handed to the event processors.
    pub fn processors(&self) -> ProcessorConfig {
        ProcessorConfig {
            diaper: self.diaper.clone(),
            feed: self.feed.clone(),
        }
    }
}

/// Returns the platform-specific config directory for hb.
///
/// On Linux: `~/.config/hb`
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("hb"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use hb_core::{DomainPolicy, EventField};

    #[test]
    fn test_dirs_config_path_ends_with_hb() {
        let path = dirs_config_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "hb");
    }

    #[test]
    fn test_default_config_has_no_input() {
        let config = Config::default();
        assert!(config.input_path.is_none());
        assert_eq!(config.diaper.domain_policy, DomainPolicy::Fixed);
        assert_eq!(config.feed.rolling_window, 7);
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("hb.toml");
        std::fs::write(
            &path,
            r#"
input_path = "/data/export.csv"

[diaper]
domain_policy = "observed"

[[diaper.pee]]
field = "notes"
pattern = 'wet:(\w+)'

[feed]
thresholds_ml = [150]
"#,
        )
        .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.input_path, Some(PathBuf::from("/data/export.csv")));
        assert_eq!(config.diaper.domain_policy, DomainPolicy::Observed);
        assert_eq!(config.diaper.pee.len(), 1);
        assert_eq!(config.diaper.pee[0].field, EventField::Notes);
        assert_eq!(config.diaper.poo, DiaperConfig::default().poo);
        assert_eq!(config.feed.thresholds_ml, vec![150]);
        assert_eq!(config.feed.rolling_window, 7);
    }

    #[test]
    fn test_processors_mirror_sections() {
        let config = Config::default();
        let processors = config.processors();
        assert_eq!(processors.diaper, config.diaper);
        assert_eq!(processors.feed, config.feed);
    }
}
