//! Read-side helpers over stored account histories.

use crate::config::ImportConfig;
use crate::error::{ImportError, Result};
use crate::types::{HistoryEntry, PersistedAccount};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Most recent non-null value of every metric, walking the history backwards.
/// Metrics that were never observed are left out.
pub fn latest<'a>(
    history: &[HistoryEntry],
    metrics: impl IntoIterator<Item = &'a str>,
) -> BTreeMap<String, i64> {
    let mut wanted: Vec<&str> = metrics.into_iter().collect();
    let mut found = BTreeMap::new();

    for entry in history.iter().rev() {
        if wanted.is_empty() {
            break;
        }
        wanted.retain(|metric| match entry.metric(metric) {
            Some(value) => {
                found.insert(metric.to_string(), value);
                false
            }
            None => true,
        });
    }

    found
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    pub date: DateTime<Utc>,
    pub value: i64,
}

/// Points of one metric over time, as fed to the chart renderer.
/// Entries without a date or without a value for the metric are skipped.
pub fn series(
    account: &PersistedAccount,
    config: &ImportConfig,
    metric: &str,
) -> Result<Vec<SeriesPoint>> {
    if !config.has_metric(metric) {
        return Err(ImportError::UnknownMetric {
            platform: config.platform.clone(),
            metric: metric.to_string(),
        });
    }

    Ok(account
        .history
        .iter()
        .filter_map(|entry| {
            Some(SeriesPoint {
                date: entry.date?,
                value: entry.metric(metric)?,
            })
        })
        .collect())
}
