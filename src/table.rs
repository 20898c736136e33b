use serde_json::Value;
use std::ops::Range;

use crate::model::{QueryRecord, value_text};
use crate::widgets::Titled;

/// Longest display text a cell renders; the reference keeps the full value.
pub const DISPLAY_LIMIT: usize = 180;
/// Preview length for dynamic-schema result cells.
pub const PREVIEW_LIMIT: usize = 100;

/// Hidden per-cell payload consulted by search, drill-down and the detail views.
#[derive(Debug, Clone, PartialEq)]
pub enum Reference {
    Text(String),
    Json(Value),
}

impl Reference {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Json(_) => None,
        }
    }

    /// Full rendering for the expanded-text panel.
    pub fn expanded(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Json(value) => serde_yaml::to_string(value)
                .unwrap_or_else(|error| format!("failed to format value: {error}")),
        }
    }

    #[cfg(test)]
    fn is_structured(&self) -> bool {
        matches!(self, Self::Json(Value::Array(_) | Value::Object(_)))
    }

    fn display(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Json(value) => value_text(value),
        }
    }
}

impl From<String> for Reference {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Reference {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Value> for Reference {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            other => Self::Json(other),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum Tone {
    #[default]
    Primary,
    Tertiary,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableCell {
    pub text: String,
    pub reference: Option<Reference>,
    pub heading: bool,
    pub tone: Tone,
}

impl TableCell {
    fn heading(text: &str) -> Self {
        Self {
            text: clamp_display(text, DISPLAY_LIMIT),
            reference: Some(Reference::Text(text.to_string())),
            heading: true,
            tone: Tone::Primary,
        }
    }

    fn body(reference: Reference, limit: usize) -> Self {
        Self {
            text: clamp_display(&reference.display(), limit),
            reference: Some(reference),
            heading: false,
            tone: Tone::Primary,
        }
    }

    fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SelectMode {
    None,
    Rows,
    Cells,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum HeadingStyle {
    TopRow,
    LeftColumn,
}

/// Rectangular cell store backing every table on screen.
///
/// Row 0 is the heading row for `TopRow` tables and the body starts at row 1;
/// `LeftColumn` tables use column 0 as headings and every row is body. Row
/// indices used by selection and search are positions in this store.
#[derive(Debug, Clone)]
pub struct TableModel {
    name: String,
    title: String,
    cells: Vec<Vec<TableCell>>,
    columns: usize,
    heading: HeadingStyle,
    mode: SelectMode,
    selected: (usize, usize),
    offset: usize,
    search_columns: Vec<usize>,
}

impl TableModel {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            title: name.clone(),
            name,
            cells: vec![Vec::new()],
            columns: 0,
            heading: HeadingStyle::TopRow,
            mode: SelectMode::None,
            selected: (0, 0),
            offset: 0,
            search_columns: Vec::new(),
        }
    }

    /// Clears the table and fills it with `headings` plus one row per entry of
    /// `rows`, selectable by row. Panics when a row's width differs from the
    /// headings: that can only be a caller bug.
    pub fn init_selectable(
        &mut self,
        title: &str,
        headings: &[&str],
        rows: Vec<Vec<String>>,
        search_columns: &[usize],
    ) {
        assert_row_widths(title, headings.len(), &rows);

        let body_len = rows.len();
        self.cells.clear();
        self.cells
            .push(headings.iter().map(|text| TableCell::heading(text)).collect());
        self.cells.extend(rows.into_iter().map(|row| {
            row.into_iter()
                .map(|value| TableCell::body(Reference::Text(value), DISPLAY_LIMIT))
                .collect()
        }));
        self.name = title.to_string();
        self.title = counted_title(title, body_len);
        self.columns = headings.len();
        self.heading = HeadingStyle::TopRow;
        self.mode = SelectMode::Rows;
        self.selected = (0, 0);
        self.offset = 0;
        self.search_columns = search_columns.to_vec();
    }

    /// Key/value style table selectable by cell. With `heading_top` row 0 holds
    /// the headings; otherwise column 0 does.
    pub fn init_basic(&mut self, title: &str, rows: Vec<Vec<Reference>>, heading_top: bool) {
        self.columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        self.heading = if heading_top {
            HeadingStyle::TopRow
        } else {
            HeadingStyle::LeftColumn
        };
        self.cells = rows
            .into_iter()
            .enumerate()
            .map(|(row, values)| {
                values
                    .into_iter()
                    .enumerate()
                    .map(|(column, value)| {
                        let is_heading = if heading_top { row == 0 } else { column == 0 };
                        let mut cell = TableCell::body(value, DISPLAY_LIMIT);
                        cell.heading = is_heading;
                        cell
                    })
                    .collect()
            })
            .collect();
        if self.cells.is_empty() {
            self.cells.push(Vec::new());
        }
        self.name = title.to_string();
        self.title = title.to_string();
        self.mode = SelectMode::Cells;
        self.offset = 0;
        self.search_columns.clear();
        self.selected = self.first_selectable_cell().unwrap_or((0, 0));
    }

    /// Appends `rows` after the last row, keeping headings and selection.
    pub fn extend(&mut self, title: &str, rows: Vec<Vec<String>>) {
        if self.columns > 0 {
            assert_row_widths(title, self.columns, &rows);
        }
        self.cells.extend(rows.into_iter().map(|row| {
            row.into_iter()
                .map(|value| TableCell::body(Reference::Text(value), DISPLAY_LIMIT))
                .collect()
        }));
        self.name = title.to_string();
        self.title = counted_title(title, self.body_len());
    }

    /// Dynamic-schema fill: columns are assigned in first-seen field order and
    /// records missing a field leave that cell empty.
    pub fn init_query_results(&mut self, records: Vec<QueryRecord>) {
        let mut fields: Vec<String> = Vec::new();
        for record in &records {
            for (field, _) in record {
                if !fields.iter().any(|known| known == field) {
                    fields.push(field.clone());
                }
            }
        }

        let body_len = records.len();
        self.cells.clear();
        self.cells
            .push(fields.iter().map(|field| TableCell::heading(field)).collect());
        for record in records {
            let mut row = vec![TableCell::empty(); fields.len()];
            for (field, value) in record {
                if let Some(column) = fields.iter().position(|known| *known == field) {
                    row[column] = TableCell::body(Reference::Text(value), PREVIEW_LIMIT);
                }
            }
            self.cells.push(row);
        }

        self.columns = fields.len();
        self.heading = HeadingStyle::TopRow;
        self.title = counted_title(&self.name, body_len);
        self.offset = 0;
        self.search_columns.clear();
        if body_len == 0 {
            self.mode = SelectMode::None;
            self.selected = (0, 0);
        } else {
            self.mode = SelectMode::Cells;
            self.selected = (1, 0);
        }
    }

    #[cfg(test)]
    pub fn row_count(&self) -> usize {
        self.cells.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns
    }

    pub fn body_rows(&self) -> Range<usize> {
        self.first_body_row()..self.cells.len()
    }

    pub fn body_len(&self) -> usize {
        self.body_rows().len()
    }

    pub fn heading_style(&self) -> HeadingStyle {
        self.heading
    }

    pub fn select_mode(&self) -> SelectMode {
        self.mode
    }

    pub fn search_columns(&self) -> &[usize] {
        &self.search_columns
    }

    pub fn headings(&self) -> Vec<&str> {
        match self.heading {
            HeadingStyle::TopRow => self.cells[0].iter().map(|cell| cell.text.as_str()).collect(),
            HeadingStyle::LeftColumn => Vec::new(),
        }
    }

    pub fn rows(&self) -> &[Vec<TableCell>] {
        &self.cells
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&TableCell> {
        self.cells.get(row).and_then(|cells| cells.get(column))
    }

    pub fn cell_mut(&mut self, row: usize, column: usize) -> Option<&mut TableCell> {
        self.cells.get_mut(row).and_then(|cells| cells.get_mut(column))
    }

    pub fn reference(&self, row: usize, column: usize) -> Option<&Reference> {
        self.cell(row, column).and_then(|cell| cell.reference.as_ref())
    }

    /// Replaces one cell's text while keeping the row's shape.
    pub fn set_cell_text(&mut self, row: usize, column: usize, text: &str) {
        if let Some(cell) = self.cell_mut(row, column) {
            cell.text = clamp_display(text, DISPLAY_LIMIT);
            cell.reference = Some(Reference::Text(text.to_string()));
        }
    }

    pub fn selected(&self) -> (usize, usize) {
        self.selected
    }

    /// Selected body row, if the selection sits on one.
    pub fn selected_row(&self) -> Option<usize> {
        let (row, _) = self.selected;
        (self.mode != SelectMode::None && self.body_rows().contains(&row)).then_some(row)
    }

    pub fn selected_reference(&self) -> Option<&Reference> {
        let row = self.selected_row()?;
        match self.mode {
            SelectMode::Rows => self.reference(row, 0),
            SelectMode::Cells => self.reference(row, self.selected.1),
            SelectMode::None => None,
        }
    }

    pub fn select(&mut self, row: usize, column: usize) {
        if self.mode == SelectMode::None || self.cells.is_empty() {
            return;
        }
        let row = row.min(self.cells.len() - 1);
        let column = column.min(self.columns.saturating_sub(1));
        self.selected = (row, column);
    }

    pub fn move_rows(&mut self, delta: isize) {
        if self.mode == SelectMode::None || self.body_len() == 0 {
            return;
        }
        let body = self.body_rows();
        let (row, column) = self.selected;
        let current = row.max(body.start) as isize;
        let target = if row < body.start && delta > 0 {
            body.start as isize
        } else {
            current + delta
        };
        let target = target.clamp(body.start as isize, body.end as isize - 1) as usize;
        self.selected = (target, column);
        if self.mode == SelectMode::Cells && self.is_heading_cell(target, column) {
            self.move_columns(1);
        }
    }

    pub fn move_columns(&mut self, delta: isize) {
        if self.mode != SelectMode::Cells || self.columns == 0 {
            return;
        }
        let (row, column) = self.selected;
        let mut target = column as isize;
        loop {
            let next = target + delta.signum();
            if next < 0 || next >= self.columns as isize {
                break;
            }
            target = next;
            if !self.is_heading_cell(row, target as usize) {
                self.selected = (row, target as usize);
                break;
            }
        }
    }

    pub fn select_first(&mut self) {
        let first = self.first_body_row();
        if self.body_len() > 0 {
            self.selected = (first, self.selected.1);
            if self.mode == SelectMode::Cells && self.is_heading_cell(first, self.selected.1) {
                self.move_columns(1);
            }
        }
    }

    pub fn select_last(&mut self) {
        if self.body_len() > 0 {
            self.move_rows(self.cells.len() as isize);
        }
    }

    /// Scroll offset (first visible body row, relative to the body) that keeps
    /// the selection inside a viewport of `height` body rows.
    pub fn visible_offset(&mut self, height: usize) -> usize {
        let height = height.max(1);
        let selected = self
            .selected_row()
            .map(|row| row - self.first_body_row())
            .unwrap_or(0);
        if selected < self.offset {
            self.offset = selected;
        } else if selected >= self.offset + height {
            self.offset = selected + 1 - height;
        }
        self.offset = self.offset.min(self.body_len().saturating_sub(1));
        self.offset
    }

    fn first_body_row(&self) -> usize {
        match self.heading {
            HeadingStyle::TopRow => 1.min(self.cells.len()),
            HeadingStyle::LeftColumn => 0,
        }
    }

    fn is_heading_cell(&self, row: usize, column: usize) -> bool {
        self.cell(row, column).is_some_and(|cell| cell.heading)
    }

    fn first_selectable_cell(&self) -> Option<(usize, usize)> {
        self.cells.iter().enumerate().find_map(|(row, cells)| {
            cells
                .iter()
                .position(|cell| !cell.heading)
                .map(|column| (row, column))
        })
    }
}

impl Titled for TableModel {
    fn title(&self) -> &str {
        &self.title
    }

    fn set_title(&mut self, title: String) {
        self.title = title;
    }
}

pub fn counted_title(name: &str, rows: usize) -> String {
    format!("{name} ({rows})")
}

pub fn clamp_display(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }

    let mut out = value.chars().take(limit.saturating_sub(1)).collect::<String>();
    out.push('…');
    out
}

fn assert_row_widths(title: &str, width: usize, rows: &[Vec<String>]) {
    if let Some((index, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != width) {
        panic!(
            "table '{title}': row {index} has {} cells but {width} headings",
            row.len()
        );
    }
}
