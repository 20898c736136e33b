use crate::table::{TableModel, Tone};

/// Colors the cells whose text reference contains `query` and returns the
/// matching body rows in ascending order. An empty `columns` slice searches
/// every column; an empty query only clears.
pub fn highlight(table: &mut TableModel, query: &str, columns: &[usize]) -> Vec<usize> {
    clear_highlights(table);
    if query.is_empty() {
        return Vec::new();
    }

    let all_columns = (0..table.column_count()).collect::<Vec<_>>();
    let columns = if columns.is_empty() {
        all_columns.as_slice()
    } else {
        columns
    };

    let mut matches = Vec::new();
    for row in table.body_rows() {
        let mut matched = false;
        for &column in columns {
            let hit = table
                .reference(row, column)
                .and_then(|reference| reference.as_text())
                .is_some_and(|text| text.contains(query));
            if hit {
                if let Some(cell) = table.cell_mut(row, column) {
                    cell.tone = Tone::Tertiary;
                }
                matched = true;
            }
        }
        if matched {
            matches.push(row);
        }
    }
    matches
}

pub fn clear_highlights(table: &mut TableModel) {
    for row in table.body_rows() {
        for column in 0..table.column_count() {
            if let Some(cell) = table.cell_mut(row, column) {
                cell.tone = Tone::Primary;
            }
        }
    }
}

/// Committed query of one table plus the `n`/`N` cursor over its matches.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    query: String,
    matches: Vec<usize>,
    cursor: Option<usize>,
}

impl SearchState {
    pub fn commit(&mut self, table: &mut TableModel, query: &str, columns: &[usize]) -> &[usize] {
        self.query = query.to_string();
        self.matches = highlight(table, query, columns);
        self.cursor = None;
        &self.matches
    }

    /// Re-runs the committed query after the table's rows were replaced.
    pub fn reapply(&mut self, table: &mut TableModel, columns: &[usize]) {
        let query = std::mem::take(&mut self.query);
        self.commit(table, &query, columns);
    }

    pub fn clear(&mut self, table: &mut TableModel) {
        self.query.clear();
        self.matches.clear();
        self.cursor = None;
        clear_highlights(table);
    }

    #[cfg(test)]
    fn query(&self) -> &str {
        &self.query
    }

    #[cfg(test)]
    fn matches(&self) -> &[usize] {
        &self.matches
    }

    /// Selects the next match row, wrapping. Returns the selected row.
    pub fn next(&mut self, table: &mut TableModel) -> Option<usize> {
        let count = self.matches.len();
        if count == 0 {
            return None;
        }
        let cursor = self.cursor.map_or(0, |cursor| (cursor + 1) % count);
        self.select(table, cursor)
    }

    pub fn prev(&mut self, table: &mut TableModel) -> Option<usize> {
        let count = self.matches.len();
        if count == 0 {
            return None;
        }
        let cursor = self
            .cursor
            .map_or(count - 1, |cursor| (cursor + count - 1) % count);
        self.select(table, cursor)
    }

    fn select(&mut self, table: &mut TableModel, cursor: usize) -> Option<usize> {
        self.cursor = Some(cursor);
        let row = self.matches[cursor];
        let (_, column) = table.selected();
        table.select(row, column);
        Some(row)
    }
}
