use crate::config::ImportConfig;
use crate::types::{cell_at, Cell, RawGrid};

/// Finite-state position in the configured category label list.
///
/// The first label is the opening category of every tab. A row whose name is
/// the next label moves the cursor forward; once on the last label the cursor
/// stays there.
#[derive(Debug, Clone)]
pub struct CategoryCursor<'a> {
    labels: &'a [String],
    position: usize,
}

impl<'a> CategoryCursor<'a> {
    pub fn new(labels: &'a [String]) -> Self {
        Self { labels, position: 0 }
    }

    /// Label of the category rows are currently assigned to
    pub fn current(&self) -> &'a str {
        self.labels
            .get(self.position)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// The label that would open the next category
    pub fn next_label(&self) -> Option<&'a str> {
        self.labels.get(self.position + 1).map(String::as_str)
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_saturated(&self) -> bool {
        self.next_label().is_none()
    }

    /// Feed the name cell of a row. Returns true when the row is a category
    /// marker rather than account data.
    pub fn observe(&mut self, name: &str) -> bool {
        let name = name.trim();
        if self.next_label() == Some(name) {
            self.position += 1;
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }
}

/// A non-blank, non-header row together with its classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedRow<'a> {
    pub tab_index: usize,
    pub row_index: usize,
    pub name: &'a str,
    pub cells: &'a [Cell],
    pub is_category_marker: bool,
    pub category: &'a str,
}

/// Lazily walks every tab of a grid, skipping header and blank-name rows and
/// tracking the category cursor. The cursor restarts at the top of each tab.
pub struct SheetWalker<'a> {
    grid: &'a RawGrid,
    config: &'a ImportConfig,
    tab_index: usize,
    row_index: usize,
    cursor: CategoryCursor<'a>,
}

impl<'a> SheetWalker<'a> {
    pub fn new(grid: &'a RawGrid, config: &'a ImportConfig) -> Self {
        Self {
            grid,
            config,
            tab_index: 0,
            row_index: 0,
            cursor: CategoryCursor::new(&config.categories),
        }
    }
}

impl<'a> Iterator for SheetWalker<'a> {
    type Item = WalkedRow<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let tab = self.grid.tabs.get(self.tab_index)?;

            if self.row_index >= tab.rows.len() {
                self.tab_index += 1;
                self.row_index = 0;
                self.cursor.reset();
                continue;
            }

            let row_index = self.row_index;
            self.row_index += 1;

            if row_index < self.config.header_rows {
                continue;
            }

            let cells = tab.rows[row_index].as_slice();
            let name = match cell_at(cells, self.config.name_column) {
                Some(name) if !name.trim().is_empty() => name,
                _ => continue,
            };

            let is_category_marker = self.cursor.observe(name);

            return Some(WalkedRow {
                tab_index: self.tab_index,
                row_index,
                name,
                cells,
                is_category_marker,
                category: self.cursor.current(),
            });
        }
    }
}
