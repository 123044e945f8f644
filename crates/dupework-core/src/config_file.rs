//! On-disk TOML configuration.
//!
//! All fields are optional so partial configs work (merge with defaults).
//! Read-only input: preferences are never written back.

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    pub matching: Option<MatchingConfig>,
    pub traversal: Option<TraversalConfig>,
    pub network: Option<NetworkConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchingConfig {
    pub include_subtitles: Option<bool>,
    pub aggressive_normalization: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TraversalConfig {
    pub search_until_similarity: Option<bool>,
    pub max_auto_visits: Option<usize>,
    pub visit_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkConfig {
    pub base_url: Option<String>,
    pub retries: Option<u32>,
    pub timeout_secs: Option<u64>,
}

/// Platform config path: `<config_dir>/dupework/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("dupework").join("config.toml"))
}

/// Load config by cascading CWD `.dupework.toml` over the platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(&PathBuf::from(".dupework.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &PathBuf) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        matching: Some(MatchingConfig {
            include_subtitles: overlay
                .matching
                .as_ref()
                .and_then(|m| m.include_subtitles)
                .or_else(|| base.matching.as_ref().and_then(|m| m.include_subtitles)),
            aggressive_normalization: overlay
                .matching
                .as_ref()
                .and_then(|m| m.aggressive_normalization)
                .or_else(|| {
                    base.matching
                        .as_ref()
                        .and_then(|m| m.aggressive_normalization)
                }),
        }),
        traversal: Some(TraversalConfig {
            search_until_similarity: overlay
                .traversal
                .as_ref()
                .and_then(|t| t.search_until_similarity)
                .or_else(|| {
                    base.traversal
                        .as_ref()
                        .and_then(|t| t.search_until_similarity)
                }),
            max_auto_visits: overlay
                .traversal
                .as_ref()
                .and_then(|t| t.max_auto_visits)
                .or_else(|| base.traversal.as_ref().and_then(|t| t.max_auto_visits)),
            visit_delay_ms: overlay
                .traversal
                .as_ref()
                .and_then(|t| t.visit_delay_ms)
                .or_else(|| base.traversal.as_ref().and_then(|t| t.visit_delay_ms)),
        }),
        network: Some(NetworkConfig {
            base_url: overlay
                .network
                .as_ref()
                .and_then(|n| n.base_url.clone())
                .or_else(|| base.network.as_ref().and_then(|n| n.base_url.clone())),
            retries: overlay
                .network
                .as_ref()
                .and_then(|n| n.retries)
                .or_else(|| base.network.as_ref().and_then(|n| n.retries)),
            timeout_secs: overlay
                .network
                .as_ref()
                .and_then(|n| n.timeout_secs)
                .or_else(|| base.network.as_ref().and_then(|n| n.timeout_secs)),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_parses() {
        let parsed: ConfigFile =
            toml::from_str("[matching]\ninclude_subtitles = false\n").unwrap();
        assert_eq!(
            parsed.matching.unwrap().include_subtitles,
            Some(false)
        );
        assert!(parsed.network.is_none());
    }

    #[test]
    fn unknown_sections_are_tolerated() {
        let parsed: ConfigFile =
            toml::from_str("[display]\ntheme = \"dark\"\n[network]\nretries = 5\n").unwrap();
        assert_eq!(parsed.network.unwrap().retries, Some(5));
    }

    #[test]
    fn merge_overlay_wins() {
        let base: ConfigFile =
            toml::from_str("[network]\nbase_url = \"https://base\"\nretries = 1\n").unwrap();
        let overlay: ConfigFile =
            toml::from_str("[network]\nbase_url = \"https://overlay\"\n").unwrap();

        let merged = merge(base, overlay);
        let network = merged.network.unwrap();
        assert_eq!(network.base_url.as_deref(), Some("https://overlay"));
        // Base value preserved where the overlay is silent.
        assert_eq!(network.retries, Some(1));
    }

    #[test]
    fn merge_with_empty_overlay_keeps_base() {
        let base: ConfigFile =
            toml::from_str("[traversal]\nsearch_until_similarity = false\n").unwrap();
        let merged = merge(base, ConfigFile::default());
        assert_eq!(
            merged.traversal.unwrap().search_until_similarity,
            Some(false)
        );
    }
}
