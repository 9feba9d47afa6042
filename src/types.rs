use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// One spreadsheet cell as delivered by the fetching side.
///
/// Sheets exports mix strings, numbers and nulls; everything is kept as text
/// and `None` means the cell was absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "serde_json::Value")]
pub struct Cell(pub Option<String>);

impl Cell {
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl From<serde_json::Value> for Cell {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Cell(None),
            serde_json::Value::String(s) => Cell(Some(s)),
            serde_json::Value::Number(n) => Cell(number_text(&n)),
            serde_json::Value::Bool(b) => Cell(Some(b.to_string())),
            other => Cell(Some(other.to_string())),
        }
    }
}

/// Counts exported as floats (`42.0`, `1500.5`) keep only their integer part.
/// A `.` left in the text would be read as a thousands separator later on.
fn number_text(n: &serde_json::Number) -> Option<String> {
    if n.is_i64() || n.is_u64() {
        return Some(n.to_string());
    }
    let value = n.as_f64()?.trunc();
    if value.is_finite() && value.abs() < i64::MAX as f64 {
        Some((value as i64).to_string())
    } else {
        None
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell(Some(value.to_string()))
    }
}

pub type Row = Vec<Cell>;

/// Look up a cell, treating cells past the end of a ragged row as absent.
pub fn cell_at(row: &[Cell], column: usize) -> Option<&str> {
    row.get(column).and_then(Cell::as_str)
}

/// One sheet/page of the imported spreadsheet
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Tab {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl Tab {
    pub fn new(name: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            name: Some(name.into()),
            rows,
        }
    }
}

/// The whole spreadsheet snapshot, tab by tab
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGrid {
    pub tabs: Vec<Tab>,
}

impl RawGrid {
    pub fn from_json_str(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// One dated observation of an account's metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub metrics: BTreeMap<String, Option<i64>>,
}

impl HistoryEntry {
    pub fn metric(&self, name: &str) -> Option<i64> {
        self.metrics.get(name).copied().flatten()
    }
}

/// In-progress account during a single import run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountDraft {
    pub name: String,
    pub category: String,
    pub link: Option<String>,
    pub username: Option<String>,
    pub history: Vec<HistoryEntry>,
}

/// The durable per-account document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedAccount {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub link: Option<String>,
    pub username: Option<String>,
    pub history: Vec<HistoryEntry>,
}

impl PersistedAccount {
    /// Build the stored document for a draft. The id only depends on the
    /// collection and the account name, so re-imports produce the same id.
    pub fn from_draft(draft: AccountDraft, collection: &str) -> Self {
        let key = format!("{}/{}", collection, draft.name);
        Self {
            id: Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()),
            name: draft.name,
            category: draft.category,
            link: draft.link,
            username: draft.username,
            history: draft.history,
        }
    }
}

/// Summary of one import run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub platform: String,
    pub collection: String,
    pub tabs: usize,
    pub rows_seen: usize,
    pub markers: usize,
    pub rows_without_link: usize,
    pub history_entries: usize,
    pub accounts: usize,
    pub digest: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_grid_accepts_mixed_cell_types() {
        let grid = RawGrid::from_json_str(
            r#"{"tabs":[{"name":"Grupos","rows":[["José", null, 42, true]]}]}"#,
        )
        .unwrap();

        let row = &grid.tabs[0].rows[0];
        assert_eq!(cell_at(row, 0), Some("José"));
        assert_eq!(cell_at(row, 1), None);
        assert_eq!(cell_at(row, 2), Some("42"));
        assert_eq!(cell_at(row, 3), Some("true"));
        assert_eq!(cell_at(row, 9), None);
    }

    #[test]
    fn test_float_cells_keep_integer_part() {
        let grid = RawGrid::from_json_str(
            r#"{"tabs":[{"rows":[[42.0, 1500.5, -3.9, 1e300, 7]]}]}"#,
        )
        .unwrap();

        let row = &grid.tabs[0].rows[0];
        assert_eq!(cell_at(row, 0), Some("42"));
        assert_eq!(cell_at(row, 1), Some("1500"));
        assert_eq!(cell_at(row, 2), Some("-3"));
        assert_eq!(cell_at(row, 3), None);
        assert_eq!(cell_at(row, 4), Some("7"));
    }

    #[test]
    fn test_history_entry_flattens_metrics() {
        let mut metrics = BTreeMap::new();
        metrics.insert("likes".to_string(), Some(42));
        metrics.insert("followers".to_string(), None);
        let entry = HistoryEntry {
            date: Some(Utc.with_ymd_and_hms(1994, 12, 24, 2, 0, 0).unwrap()),
            metrics,
        };

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["likes"], 42);
        assert!(value["followers"].is_null());
        assert_eq!(value["date"], "1994-12-24T02:00:00Z");
    }

    #[test]
    fn test_persisted_id_is_stable_per_collection_and_name() {
        let draft = AccountDraft {
            name: "José".to_string(),
            category: "Frentes".to_string(),
            link: None,
            username: None,
            history: Vec::new(),
        };
        let a = PersistedAccount::from_draft(draft.clone(), "facebook");
        let b = PersistedAccount::from_draft(draft.clone(), "facebook");
        let c = PersistedAccount::from_draft(draft, "instagram");
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
    }
}
