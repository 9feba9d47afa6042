use crate::config::ImportConfig;
use crate::pipeline::normalize::{normalize_date, normalize_integer, validate_cell, DateTriplet};
use crate::types::{cell_at, AccountDraft, Cell, HistoryEntry};
use std::collections::BTreeMap;

/// Turn the metric and date cells of one linked data row into a history
/// entry on `draft`.
///
/// Placeholder or unparsable metric cells become `None`. A blank or malformed
/// date cell reuses `last_date`. The date that applies to this row is
/// returned so the caller can thread it into the next row.
pub fn append_history(
    draft: &mut AccountDraft,
    cells: &[Cell],
    config: &ImportConfig,
    last_date: Option<DateTriplet>,
) -> Option<DateTriplet> {
    let metrics: BTreeMap<String, Option<i64>> = config
        .metrics
        .iter()
        .map(|metric| {
            let raw = cell_at(cells, metric.column);
            let value = if validate_cell(raw) {
                raw.and_then(normalize_integer)
            } else {
                None
            };
            (metric.name.clone(), value)
        })
        .collect();

    let date = normalize_date(cell_at(cells, config.date_column), last_date);

    draft.history.push(HistoryEntry {
        date: date
            .as_ref()
            .and_then(|d| d.to_datetime(config.history_time)),
        metrics,
    });

    date
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::facebook_test_config;
    use chrono::{TimeZone, Utc};

    fn draft() -> AccountDraft {
        AccountDraft {
            name: "José".to_string(),
            category: "Frentes".to_string(),
            link: Some("joseLink/jose/".to_string()),
            username: None,
            history: Vec::new(),
        }
    }

    fn cells(values: &[&str]) -> Vec<Cell> {
        values.iter().map(|v| Cell::from(*v)).collect()
    }

    #[test]
    fn test_appends_typed_entry() {
        let config = facebook_test_config();
        let mut d = draft();
        let row = cells(&["José", "-", "joseLink/jose/", "1.042", "420", "24/12/1994"]);

        let last = append_history(&mut d, &row, &config, None);

        assert_eq!(last, Some(DateTriplet::new("24", "12", "1994")));
        assert_eq!(d.history.len(), 1);
        let entry = &d.history[0];
        assert_eq!(entry.metric("likes"), Some(1042));
        assert_eq!(entry.metric("followers"), Some(420));
        assert_eq!(entry.date, Some(Utc.with_ymd_and_hms(1994, 12, 24, 2, 0, 0).unwrap()));
    }

    #[test]
    fn test_blank_date_is_forward_filled() {
        let config = facebook_test_config();
        let mut d = draft();
        let previous = Some(DateTriplet::new("24", "01", "1995"));
        let row = cells(&["José", "-", "joseLink/jose/", "S/", "abc"]);

        let last = append_history(&mut d, &row, &config, previous.clone());

        assert_eq!(last, previous);
        let entry = &d.history[0];
        assert_eq!(entry.metric("likes"), None);
        assert_eq!(entry.metric("followers"), None);
        assert!(entry.metrics.contains_key("likes"));
        assert_eq!(entry.date, Some(Utc.with_ymd_and_hms(1995, 1, 24, 2, 0, 0).unwrap()));
    }

    #[test]
    fn test_no_known_date_gives_null_date() {
        let config = facebook_test_config();
        let mut d = draft();
        let row = cells(&["José", "-", "joseLink/jose/", "1", "2", ""]);

        assert_eq!(append_history(&mut d, &row, &config, None), None);
        assert_eq!(d.history[0].date, None);
    }

    #[test]
    fn test_entries_keep_row_order() {
        let config = facebook_test_config();
        let mut d = draft();
        let mut last = None;
        for (likes, date) in [("3", "01/03/2018"), ("1", "01/01/2018"), ("2", "01/02/2018")] {
            let row = cells(&["José", "-", "l", likes, "0", date]);
            last = append_history(&mut d, &row, &config, last);
        }
        let likes: Vec<_> = d.history.iter().map(|e| e.metric("likes")).collect();
        assert_eq!(likes, vec![Some(3), Some(1), Some(2)]);
    }
}
