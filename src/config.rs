use crate::constants::{DEFAULT_HISTORY_TIME, PROFILE_PAGE_MARKER};
use crate::error::{ImportError, Result};
use chrono::NaiveTime;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

/// What happens to the forward-filled date when the walk enters a new tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateCarry {
    /// Every tab starts without a known date
    #[default]
    ResetPerTab,
    /// The last date of a tab keeps filling blank dates of the next one
    CarryAcrossTabs,
}

/// Which link an account keeps when several rows for the same name carry one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkMerge {
    #[default]
    FirstValid,
    LatestValid,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MetricColumn {
    pub name: String,
    pub column: usize,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub import: ImportSettings,
    #[serde(default)]
    pub platforms: BTreeMap<String, PlatformConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ImportSettings {
    #[serde(default)]
    pub name_column: usize,
    #[serde(default = "default_header_rows")]
    pub header_rows: usize,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub date_carry: DateCarry,
    #[serde(default)]
    pub link_merge: LinkMerge,
    #[serde(default = "default_history_time")]
    pub history_time: String,
}

#[derive(Debug, Deserialize)]
pub struct PlatformConfig {
    pub collection: Option<String>,
    pub domain: String,
    pub link_column: usize,
    pub date_column: usize,
    pub metrics: Vec<MetricColumn>,
    #[serde(default = "default_profile_markers")]
    pub profile_markers: Vec<String>,
    /// Overrides the shared category labels for this platform's sheet
    pub categories: Option<Vec<String>>,
}

fn default_header_rows() -> usize {
    1
}

fn default_history_time() -> String {
    DEFAULT_HISTORY_TIME.to_string()
}

fn default_profile_markers() -> Vec<String> {
    vec![PROFILE_PAGE_MARKER.to_string()]
}

/// Fully resolved settings for importing one platform's sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    pub platform: String,
    pub collection: String,
    pub domain: String,
    pub name_column: usize,
    pub link_column: usize,
    pub date_column: usize,
    pub metrics: Vec<MetricColumn>,
    pub categories: Vec<String>,
    pub profile_markers: Vec<String>,
    pub header_rows: usize,
    pub date_carry: DateCarry,
    pub link_merge: LinkMerge,
    pub history_time: NaiveTime,
}

impl ImportConfig {
    pub fn metric_names(&self) -> impl Iterator<Item = &str> {
        self.metrics.iter().map(|m| m.name.as_str())
    }

    pub fn has_metric(&self, name: &str) -> bool {
        self.metrics.iter().any(|m| m.name == name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.metrics.is_empty() {
            return Err(ImportError::Config(format!(
                "platform '{}' declares no metric columns",
                self.platform
            )));
        }

        let mut columns = HashSet::new();
        let fixed = [
            ("name", self.name_column),
            ("link", self.link_column),
            ("date", self.date_column),
        ];
        let metric_columns = self.metrics.iter().map(|m| (m.name.as_str(), m.column));
        for (label, column) in fixed.into_iter().chain(metric_columns) {
            if !columns.insert(column) {
                return Err(ImportError::Config(format!(
                    "platform '{}': column {} ('{}') is used twice",
                    self.platform, column, label
                )));
            }
        }

        let mut names = HashSet::new();
        for metric in &self.metrics {
            if metric.name == "date" || !names.insert(metric.name.as_str()) {
                return Err(ImportError::Config(format!(
                    "platform '{}': metric name '{}' is reserved or duplicated",
                    self.platform, metric.name
                )));
            }
        }

        Ok(())
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ImportError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Resolve and validate the import settings of one platform.
    pub fn import_config(&self, platform: &str) -> Result<ImportConfig> {
        let p = self
            .platforms
            .get(platform)
            .ok_or_else(|| ImportError::UnknownPlatform(platform.to_string()))?;

        let history_time = NaiveTime::parse_from_str(&self.import.history_time, "%H:%M:%S")
            .map_err(|e| {
                ImportError::Config(format!(
                    "invalid history_time '{}': {}",
                    self.import.history_time, e
                ))
            })?;

        let config = ImportConfig {
            platform: platform.to_string(),
            collection: p.collection.clone().unwrap_or_else(|| platform.to_string()),
            domain: p.domain.clone(),
            name_column: self.import.name_column,
            link_column: p.link_column,
            date_column: p.date_column,
            metrics: p.metrics.clone(),
            categories: p
                .categories
                .clone()
                .unwrap_or_else(|| self.import.categories.clone()),
            profile_markers: p.profile_markers.clone(),
            header_rows: self.import.header_rows,
            date_carry: self.import.date_carry,
            link_merge: self.import.link_merge,
            history_time,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
pub(crate) fn facebook_test_config() -> ImportConfig {
    ImportConfig {
        platform: "facebook".to_string(),
        collection: "facebook".to_string(),
        domain: "facebook.com".to_string(),
        name_column: 0,
        link_column: 2,
        date_column: 5,
        metrics: vec![
            MetricColumn { name: "likes".to_string(), column: 3 },
            MetricColumn { name: "followers".to_string(), column: 4 },
        ],
        categories: vec!["Frentes".to_string(), "Coletivos".to_string()],
        profile_markers: vec!["pg".to_string()],
        header_rows: 1,
        date_carry: DateCarry::ResetPerTab,
        link_merge: LinkMerge::FirstValid,
        history_time: NaiveTime::from_hms_opt(2, 0, 0).unwrap(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [import]
        categories = ["Frentes", "Organizações"]
        date_carry = "carry_across_tabs"

        [platforms.facebook]
        domain = "facebook.com"
        link_column = 3
        date_column = 6
        metrics = [{ name = "likes", column = 4 }, { name = "followers", column = 5 }]

        [platforms.youtube]
        collection = "youtubeAccounts"
        domain = "youtube.com"
        link_column = 2
        date_column = 6
        profile_markers = ["user", "channel", "c"]
        categories = ["Canais"]
        metrics = [
            { name = "subscribers", column = 3 },
            { name = "videos", column = 4 },
            { name = "views", column = 5 },
        ]
    "#;

    #[test]
    fn test_resolves_platform_with_defaults() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        let fb = config.import_config("facebook").unwrap();

        assert_eq!(fb.collection, "facebook");
        assert_eq!(fb.name_column, 0);
        assert_eq!(fb.header_rows, 1);
        assert_eq!(fb.profile_markers, vec!["pg".to_string()]);
        assert_eq!(fb.date_carry, DateCarry::CarryAcrossTabs);
        assert_eq!(fb.link_merge, LinkMerge::FirstValid);
        assert_eq!(fb.history_time, NaiveTime::from_hms_opt(2, 0, 0).unwrap());
        assert_eq!(fb.categories.len(), 2);
        assert_eq!(fb.metric_names().collect::<Vec<_>>(), vec!["likes", "followers"]);
    }

    #[test]
    fn test_platform_overrides() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        let yt = config.import_config("youtube").unwrap();

        assert_eq!(yt.collection, "youtubeAccounts");
        assert_eq!(yt.categories, vec!["Canais".to_string()]);
        assert!(yt.has_metric("views"));
        assert!(!yt.has_metric("likes"));
    }

    #[test]
    fn test_unknown_platform() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        assert!(matches!(
            config.import_config("myspace"),
            Err(ImportError::UnknownPlatform(_))
        ));
    }

    #[test]
    fn test_rejects_overlapping_columns() {
        let mut config = facebook_test_config();
        config.metrics[0].column = config.link_column;
        assert!(matches!(config.validate(), Err(ImportError::Config(_))));
    }

    #[test]
    fn test_rejects_bad_history_time() {
        let toml = SAMPLE.replace(
            "date_carry = \"carry_across_tabs\"",
            "history_time = \"25:00\"",
        );
        let config = Config::from_toml_str(&toml).unwrap();
        assert!(matches!(
            config.import_config("facebook"),
            Err(ImportError::Config(_))
        ));
    }
}
