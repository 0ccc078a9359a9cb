//! Cset log configuration.

use serde::{Deserialize, Serialize};

/// Optional upstream cache placed in front of the `hg.branch` changelog.
/// Absent means the fetcher hits the upstream host directly.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HgCacheConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Configuration for the changeset log cache.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CsetConfig {
    /// Path or identifier for the SQL store. Default: "cset_log.db".
    pub database_name: Option<String>,
    /// URL branch segment substituted into every fetch, e.g. "mozilla-central".
    pub hg_branch: Option<String>,
    /// Scheme+host of the upstream changelog server.
    /// Default: "https://hg.mozilla.org/".
    pub hg_url: Option<String>,
    /// Optional upstream cache; absent means direct fetch.
    pub hg_cache: Option<HgCacheConfig>,
    /// When true, the tip worker sleeps without doing work.
    pub disable_tipfilling: Option<bool>,
    /// When true, the backfill worker sleeps without doing work.
    pub disable_backfilling: Option<bool>,
    /// When true, the maintenance worker sleeps without doing work.
    pub disable_maintenance: Option<bool>,
    /// When true, the deleter worker sleeps without doing work.
    pub disable_deletion: Option<bool>,
    /// Toggles the optional frontier-advance step run by maintenance
    /// before scheduling a deletion boundary. Default: false.
    pub update_very_old_frontiers: Option<bool>,
    /// Newest rows (by revnum) exempt from age-based retention.
    /// Default: 1000.
    pub min_permanent: Option<i64>,
    /// Non-permanent rows kept before the oldest are scheduled for
    /// deletion. Default: 20000.
    pub max_nonpermanent: Option<i64>,
}

impl CsetConfig {
    pub fn effective_database_name(&self) -> String {
        self.database_name
            .clone()
            .unwrap_or_else(|| "cset_log.db".to_string())
    }

    pub fn effective_hg_branch(&self) -> String {
        self.hg_branch
            .clone()
            .unwrap_or_else(|| "mozilla-central".to_string())
    }

    pub fn effective_hg_url(&self) -> String {
        self.hg_url
            .clone()
            .unwrap_or_else(|| "https://hg.mozilla.org/".to_string())
    }

    pub fn tipfilling_enabled(&self) -> bool {
        !self.disable_tipfilling.unwrap_or(false)
    }

    pub fn backfilling_enabled(&self) -> bool {
        !self.disable_backfilling.unwrap_or(false)
    }

    pub fn maintenance_enabled(&self) -> bool {
        !self.disable_maintenance.unwrap_or(false)
    }

    pub fn deletion_enabled(&self) -> bool {
        !self.disable_deletion.unwrap_or(false)
    }

    pub fn frontier_advance_enabled(&self) -> bool {
        self.update_very_old_frontiers.unwrap_or(false)
    }

    pub fn effective_min_permanent(&self) -> i64 {
        self.min_permanent.unwrap_or(crate::constants::MIN_PERMANENT)
    }

    pub fn effective_max_nonpermanent(&self) -> i64 {
        self.max_nonpermanent
            .unwrap_or(crate::constants::MAX_NONPERMANENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_upstream_constants() {
        let cfg = CsetConfig::default();
        assert_eq!(cfg.effective_min_permanent(), 1000);
        assert_eq!(cfg.effective_max_nonpermanent(), 20000);
        assert!(cfg.tipfilling_enabled());
        assert!(!cfg.frontier_advance_enabled());
    }

    #[test]
    fn toml_round_trip() {
        let toml_str = r#"
            hg_branch = "integration"
            disable_deletion = true
            min_permanent = 5
        "#;
        let cfg: CsetConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.effective_hg_branch(), "integration");
        assert!(!cfg.deletion_enabled());
        assert_eq!(cfg.effective_min_permanent(), 5);
    }
}
