//! Service screen scaffolding.
//!
//! A resource screen is a search input, a primary table over the provider
//! listing, a secondary widget for the selected row and an expanded-text
//! panel. Every refresh goes through the [`Loader`]; the apply closures find
//! the screen again by page index on the render thread.

use ratatui::layout::Rect;
use tracing::debug;

use crate::app::App;
use crate::focus::{FocusRing, PanePair};
use crate::input::{Action, KeyContext};
use crate::loader::{LoadOutcome, Loader};
use crate::model::{Record, SecondaryKind, Service};
use crate::provider::{Sources, or_empty};
use crate::search::SearchState;
use crate::table::{Reference, SelectMode, TableModel};
use crate::widgets::{TextInput, TextPanel, Titled};

pub const PAGE_ROWS: isize = 10;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Slot {
    Search,
    Primary,
    Secondary,
    Expanded,
    Start,
    End,
    QueryText,
    Results,
    Log,
}

/// Widget handle the loader animates: a slot on one page.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct WidgetId {
    pub page: usize,
    pub slot: Slot,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ScreenState {
    Idle,
    Loading,
    TimedOut,
}

impl ScreenState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::TimedOut => "timed out",
        }
    }
}

/// Counts live loads of one screen to derive its [`ScreenState`].
#[derive(Debug, Clone, Default)]
pub struct LoadTracker {
    in_flight: usize,
    timed_out: bool,
}

impl LoadTracker {
    pub fn started(&mut self) {
        self.in_flight += 1;
        self.timed_out = false;
    }

    pub fn finished(&mut self, outcome: LoadOutcome) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.timed_out = outcome == LoadOutcome::TimedOut;
    }

    pub fn state(&self) -> ScreenState {
        if self.in_flight > 0 {
            ScreenState::Loading
        } else if self.timed_out {
            ScreenState::TimedOut
        } else {
            ScreenState::Idle
        }
    }
}

/// Last rendered rectangle of every widget, for mouse focus.
#[derive(Debug, Clone, Default)]
pub struct Areas {
    rects: Vec<(Slot, Rect)>,
}

impl Areas {
    pub fn clear(&mut self) {
        self.rects.clear();
    }

    pub fn record(&mut self, slot: Slot, area: Rect) {
        self.rects.push((slot, area));
    }

    pub fn slot_at(&self, column: u16, row: u16) -> Option<Slot> {
        self.rects
            .iter()
            .rev()
            .find(|(_, rect)| {
                column >= rect.x
                    && column < rect.x.saturating_add(rect.width)
                    && row >= rect.y
                    && row < rect.y.saturating_add(rect.height)
            })
            .map(|(slot, _)| *slot)
    }
}

/// What a screen asks the shell to do after handling a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenEffect {
    None,
    Back,
    Drill { service: Service, id: String },
}

/// Render-thread context a screen needs to start loads.
pub struct ScreenCtx<'a> {
    pub loader: &'a Loader<App>,
    pub page: usize,
}

impl ScreenCtx<'_> {
    pub fn widget(&self, slot: Slot) -> WidgetId {
        WidgetId {
            page: self.page,
            slot,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PrimaryRefresh {
    Cached,
    Force,
}

/// How a primary table is fetched: the full list or a name filter.
pub enum Listing {
    List { reset: bool },
    Filter(String),
}

impl Listing {
    pub fn is_filtered(&self) -> bool {
        matches!(self, Self::Filter(_))
    }
}

pub struct ResourceScreen {
    service: Service,
    sources: Sources,
    search: TextInput,
    primary: TableModel,
    primary_records: Vec<Record>,
    primary_search: SearchState,
    secondary: TableModel,
    secondary_records: Vec<Record>,
    secondary_search: SearchState,
    secondary_id: Option<String>,
    expanded: TextPanel,
    last_table: Slot,
    ring: FocusRing<Slot>,
    panes: PanePair,
    tracker: LoadTracker,
    areas: Areas,
    opened: bool,
}

impl ResourceScreen {
    pub fn new(service: Service, sources: Sources) -> Self {
        let headings = service
            .columns()
            .iter()
            .map(|column| column.heading)
            .collect::<Vec<_>>();
        let mut primary = TableModel::new(service.table_name());
        primary.init_selectable(service.table_name(), &headings, Vec::new(), service.search_columns());
        Self {
            service,
            sources,
            search: TextInput::new("Search"),
            primary,
            primary_records: Vec::new(),
            primary_search: SearchState::default(),
            secondary: TableModel::new(service.secondary_name()),
            secondary_records: Vec::new(),
            secondary_search: SearchState::default(),
            secondary_id: None,
            expanded: TextPanel::new("Expanded"),
            last_table: Slot::Primary,
            ring: FocusRing::new(vec![Slot::Search, Slot::Primary, Slot::Secondary, Slot::Expanded]),
            panes: PanePair::new(3, 2),
            tracker: LoadTracker::default(),
            areas: Areas::default(),
            opened: false,
        }
    }

    pub fn search(&self) -> &TextInput {
        &self.search
    }

    pub fn primary(&self) -> &TableModel {
        &self.primary
    }

    pub fn secondary(&self) -> &TableModel {
        &self.secondary
    }

    pub fn expanded(&self) -> &TextPanel {
        &self.expanded
    }

    pub fn panes(&self) -> PanePair {
        self.panes
    }

    pub fn tracker_mut(&mut self) -> &mut LoadTracker {
        &mut self.tracker
    }

    pub fn state(&self) -> ScreenState {
        self.tracker.state()
    }

    pub fn areas_mut(&mut self) -> &mut Areas {
        &mut self.areas
    }

    pub fn primary_mut(&mut self) -> &mut TableModel {
        &mut self.primary
    }

    pub fn secondary_mut(&mut self) -> &mut TableModel {
        &mut self.secondary
    }

    pub fn focused(&self) -> Slot {
        self.ring.current()
    }

    /// Moves terminal focus to `slot`; the ring observer follows.
    pub fn focus(&mut self, slot: Slot) {
        if self.ring.observe(slot) {
            self.focus_changed();
        }
    }

    pub fn click(&mut self, column: u16, row: u16) -> bool {
        match self.areas.slot_at(column, row) {
            Some(slot) => {
                self.focus(slot);
                true
            }
            None => false,
        }
    }

    pub fn key_context(&self) -> KeyContext {
        match self.focused() {
            Slot::Search => KeyContext::TextInput,
            Slot::Expanded => KeyContext::Text,
            _ => KeyContext::Table,
        }
    }

    pub fn titled_mut(&mut self, slot: Slot) -> Option<&mut dyn Titled> {
        match slot {
            Slot::Search => Some(&mut self.search),
            Slot::Primary => Some(&mut self.primary),
            Slot::Secondary => Some(&mut self.secondary),
            Slot::Expanded => Some(&mut self.expanded),
            _ => None,
        }
    }

    /// First visit: populate the primary table once.
    pub fn open(&mut self, ctx: &ScreenCtx<'_>) {
        if self.opened {
            return;
        }
        self.opened = true;
        self.refresh_primary(ctx, PrimaryRefresh::Cached);
    }

    pub fn apply_action(&mut self, action: Action, ctx: &ScreenCtx<'_>) -> ScreenEffect {
        match action {
            Action::FocusNext => {
                self.ring.next();
                self.focus_changed();
            }
            Action::FocusPrev => {
                self.ring.prev();
                self.focus_changed();
            }
            Action::GrowPane => {
                self.panes.grow_first();
            }
            Action::ShrinkPane => {
                self.panes.shrink_first();
            }
            Action::HardRefresh => {
                self.refresh_primary(ctx, PrimaryRefresh::Force);
                if let Some(id) = self.secondary_id.clone() {
                    self.refresh_secondary(ctx, &id, false);
                }
            }
            Action::ToSelector => return ScreenEffect::Back,
            _ => {
                return match self.focused() {
                    Slot::Search => self.search_action(action, ctx),
                    Slot::Primary => self.primary_action(action, ctx),
                    Slot::Secondary => {
                        self.secondary_action(action, ctx);
                        ScreenEffect::None
                    }
                    _ => {
                        self.expanded_action(action);
                        ScreenEffect::None
                    }
                };
            }
        }
        ScreenEffect::None
    }

    fn search_action(&mut self, action: Action, ctx: &ScreenCtx<'_>) -> ScreenEffect {
        match action {
            Action::Submit => self.commit_search(ctx),
            Action::Cancel if self.search.is_empty() => return ScreenEffect::Back,
            Action::Cancel => self.search.clear(),
            other => edit_input(&mut self.search, other),
        }
        ScreenEffect::None
    }

    fn primary_action(&mut self, action: Action, ctx: &ScreenCtx<'_>) -> ScreenEffect {
        match action {
            Action::RefreshCached => self.refresh_primary(ctx, PrimaryRefresh::Cached),
            Action::RefreshForce => self.refresh_primary(ctx, PrimaryRefresh::Force),
            Action::Extend | Action::ExtendLegacy => {
                debug!(service = %self.service, "primary listing has no next page");
            }
            Action::NextMatch => {
                self.primary_search.next(&mut self.primary);
                self.sync_expanded();
            }
            Action::PrevMatch => {
                self.primary_search.prev(&mut self.primary);
                self.sync_expanded();
            }
            Action::Submit => {
                let Some(record) = self.selected_record().cloned() else {
                    return ScreenEffect::None;
                };
                if self.service == Service::Logs {
                    return ScreenEffect::Drill {
                        service: Service::Insights,
                        id: record.id,
                    };
                }
                self.refresh_secondary(ctx, &record.id, false);
                self.focus(Slot::Secondary);
            }
            other => {
                move_selection(&mut self.primary, &other);
                self.sync_expanded();
            }
        }
        ScreenEffect::None
    }

    fn secondary_action(&mut self, action: Action, ctx: &ScreenCtx<'_>) {
        match action {
            Action::RefreshCached | Action::RefreshForce => {
                if let Some(id) = self.secondary_target() {
                    self.refresh_secondary(ctx, &id, false);
                }
            }
            Action::Extend | Action::ExtendLegacy => match self.secondary_id.clone() {
                Some(id) if self.pages_secondary() => self.refresh_secondary(ctx, &id, true),
                _ => debug!(service = %self.service, "nothing to extend"),
            },
            Action::NextMatch => {
                self.secondary_search.next(&mut self.secondary);
                self.sync_expanded();
            }
            Action::PrevMatch => {
                self.secondary_search.prev(&mut self.secondary);
                self.sync_expanded();
            }
            other => {
                move_selection(&mut self.secondary, &other);
                self.sync_expanded();
            }
        }
    }

    fn expanded_action(&mut self, action: Action) {
        match action {
            Action::Down => self.expanded.scroll_by(1),
            Action::Up => self.expanded.scroll_by(-1),
            Action::PageDown => self.expanded.scroll_by(PAGE_ROWS as i32),
            Action::PageUp => self.expanded.scroll_by(-(PAGE_ROWS as i32)),
            Action::Top => self.expanded.scroll_to_top(),
            Action::Bottom => self.expanded.scroll_to_end(),
            _ => {}
        }
    }

    /// Enter in the search input: highlight the secondary right away and
    /// issue a filtered refresh of the primary whose apply re-highlights.
    fn commit_search(&mut self, ctx: &ScreenCtx<'_>) {
        let query = self.search.value().to_string();
        self.secondary_search.commit(&mut self.secondary, &query, &[]);
        self.primary_search
            .commit(&mut self.primary, &query, self.service.search_columns());

        if !query.is_empty() {
            self.load_primary(ctx, Listing::Filter(query));
        } else if self.service.filter_only() {
            debug!(service = %self.service, "listing waits for a search string");
        } else {
            self.load_primary(ctx, Listing::List { reset: false });
        }
    }

    pub fn refresh_primary(&mut self, ctx: &ScreenCtx<'_>, mode: PrimaryRefresh) {
        if self.service.filter_only() {
            let query = self.search.value().to_string();
            if query.is_empty() {
                debug!(service = %self.service, "listing waits for a search string");
                return;
            }
            self.load_primary(ctx, Listing::Filter(query));
            return;
        }
        let reset = mode == PrimaryRefresh::Force;
        self.load_primary(ctx, Listing::List { reset });
    }

    fn load_primary(&self, ctx: &ScreenCtx<'_>, listing: Listing) {
        let list = self.sources.list.clone();
        let page = ctx.page;
        ctx.loader.load(
            ctx.widget(Slot::Primary),
            self.primary.title(),
            async move {
                match listing {
                    Listing::List { reset } => or_empty("list", list.list(reset)).await,
                    Listing::Filter(needle) => or_empty("filter", list.filter(&needle)).await,
                }
            },
            move |app: &mut App, records| {
                if let Some(screen) = app.resource_mut(page) {
                    screen.apply_primary(records);
                }
            },
        );
    }

    pub fn apply_primary(&mut self, records: Vec<Record>) {
        let columns = self.service.columns();
        let headings = columns.iter().map(|column| column.heading).collect::<Vec<_>>();
        let rows = records
            .iter()
            .map(|record| columns.iter().map(|column| record.field_text(column.field)).collect())
            .collect();
        self.primary.init_selectable(
            self.service.table_name(),
            &headings,
            rows,
            self.service.search_columns(),
        );
        self.primary_records = records;
        self.primary_search
            .reapply(&mut self.primary, self.service.search_columns());
        self.sync_expanded();
    }

    /// Loads the secondary widget for `id`. `extend` appends the provider's
    /// next page and only applies to the id already shown.
    pub fn refresh_secondary(&mut self, ctx: &ScreenCtx<'_>, id: &str, extend: bool) {
        let extend = extend && self.secondary_id.as_deref() == Some(id);
        let page = ctx.page;
        let widget = ctx.widget(Slot::Secondary);
        let title = self.secondary.title().to_string();
        let id = id.to_string();

        match self.service.secondary() {
            SecondaryKind::Detail => {
                let Some(detail) = self.sources.detail.clone() else {
                    return;
                };
                let target = id.clone();
                ctx.loader.load(
                    widget,
                    &title,
                    async move { or_empty("describe", detail.describe(&target)).await },
                    move |app: &mut App, record| {
                        if let Some(screen) = app.resource_mut(page) {
                            screen.apply_detail(id, record);
                        }
                    },
                );
            }
            SecondaryKind::History | SecondaryKind::Events => {
                let Some(history) = self.sources.history.clone() else {
                    return;
                };
                let events = self.service.secondary() == SecondaryKind::Events;
                let target = id.clone();
                ctx.loader.load(
                    widget,
                    &title,
                    async move {
                        if events {
                            or_empty("events", history.events(&target, extend)).await
                        } else {
                            or_empty("history", history.history(&target, extend)).await
                        }
                    },
                    move |app: &mut App, entries| {
                        if let Some(screen) = app.resource_mut(page) {
                            screen.apply_history(id, entries, extend);
                        }
                    },
                );
            }
            SecondaryKind::Scan => {
                let (Some(detail), Some(scan)) =
                    (self.sources.detail.clone(), self.sources.scan.clone())
                else {
                    return;
                };
                let target = id.clone();
                ctx.loader.load(
                    widget,
                    &title,
                    async move {
                        match or_empty("describe", detail.describe(&target)).await {
                            Some(table) => or_empty("scan", scan.scan(&table)).await,
                            None => Vec::new(),
                        }
                    },
                    move |app: &mut App, items| {
                        if let Some(screen) = app.resource_mut(page) {
                            screen.secondary.init_query_results(items);
                            screen.secondary_records.clear();
                            screen.after_secondary(id);
                        }
                    },
                );
            }
            SecondaryKind::Query => {}
        }
    }

    fn apply_detail(&mut self, id: String, record: Option<Record>) {
        let rows = record.map(detail_rows).unwrap_or_default();
        self.secondary
            .init_basic(self.service.secondary_name(), rows, false);
        self.secondary_records.clear();
        self.after_secondary(id);
    }

    fn apply_history(&mut self, id: String, entries: Vec<Record>, extend: bool) {
        let columns = self.service.secondary_columns();
        let name = self.service.secondary_name();
        let rows = entries
            .iter()
            .map(|entry| columns.iter().map(|column| entry.field_text(column.field)).collect())
            .collect();
        if extend {
            self.secondary.extend(name, rows);
            self.secondary_records.extend(entries);
        } else {
            let headings = columns.iter().map(|column| column.heading).collect::<Vec<_>>();
            self.secondary.init_selectable(name, &headings, rows, &[]);
            self.secondary_records = entries;
        }
        self.after_secondary(id);
    }

    fn after_secondary(&mut self, id: String) {
        self.secondary_id = Some(id);
        self.secondary_search.reapply(&mut self.secondary, &[]);
        self.sync_expanded();
    }

    fn pages_secondary(&self) -> bool {
        matches!(
            self.service.secondary(),
            SecondaryKind::History | SecondaryKind::Events
        )
    }

    fn secondary_target(&self) -> Option<String> {
        self.secondary_id
            .clone()
            .or_else(|| self.selected_record().map(|record| record.id.clone()))
    }

    pub fn selected_record(&self) -> Option<&Record> {
        let row = self.primary.selected_row()?;
        self.primary_records.get(row - 1)
    }

    fn focus_changed(&mut self) {
        let focused = self.ring.current();
        if matches!(focused, Slot::Primary | Slot::Secondary) {
            self.last_table = focused;
            self.sync_expanded();
        }
    }

    /// Shows the full payload behind the selection of the last focused table.
    fn sync_expanded(&mut self) {
        let text = match self.last_table {
            Slot::Primary => self.selected_record().map(record_yaml),
            _ => match self.secondary.select_mode() {
                SelectMode::Rows => self
                    .secondary
                    .selected_row()
                    .and_then(|row| self.secondary_records.get(row - 1))
                    .map(record_yaml),
                _ => self.secondary.selected_reference().map(Reference::expanded),
            },
        };
        self.expanded.set_text(text.unwrap_or_default());
    }
}

fn detail_rows(record: Record) -> Vec<Vec<Reference>> {
    let mut rows = vec![
        vec![Reference::from("id"), Reference::from(record.id)],
        vec![Reference::from("name"), Reference::from(record.name)],
    ];
    rows.extend(
        record
            .fields
            .into_iter()
            .map(|(key, value)| vec![Reference::from(key), Reference::from(value)]),
    );
    rows
}

pub fn record_yaml(record: &Record) -> String {
    serde_yaml::to_string(record).unwrap_or_else(|error| format!("failed to format record: {error}"))
}

/// Shared text-editing keys for every input field.
pub fn edit_input(input: &mut TextInput, action: Action) {
    match action {
        Action::InputChar(ch) => input.insert(ch),
        Action::Backspace => input.backspace(),
        Action::Delete => input.delete(),
        Action::CursorLeft => input.left(),
        Action::CursorRight => input.right(),
        Action::CursorHome => input.home(),
        Action::CursorEnd => input.end(),
        _ => {}
    }
}

/// Shared selection keys for every table.
pub fn move_selection(table: &mut TableModel, action: &Action) {
    match action {
        Action::Down => table.move_rows(1),
        Action::Up => table.move_rows(-1),
        Action::PageDown => table.move_rows(PAGE_ROWS),
        Action::PageUp => table.move_rows(-PAGE_ROWS),
        Action::Top => table.select_first(),
        Action::Bottom => table.select_last(),
        Action::Left => table.move_columns(-1),
        Action::Right => table.move_columns(1),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::{Areas, LoadTracker, ScreenState, Slot};
    use crate::loader::LoadOutcome;
    use ratatui::layout::Rect;

    #[test]
    fn tracker_follows_load_lifecycle() {
        let mut tracker = LoadTracker::default();
        assert_eq!(tracker.state(), ScreenState::Idle);
        tracker.started();
        tracker.started();
        assert_eq!(tracker.state(), ScreenState::Loading);
        tracker.finished(LoadOutcome::TimedOut);
        assert_eq!(tracker.state(), ScreenState::Loading);
        tracker.finished(LoadOutcome::TimedOut);
        assert_eq!(tracker.state(), ScreenState::TimedOut);
        tracker.started();
        assert_eq!(tracker.state(), ScreenState::Loading);
        tracker.finished(LoadOutcome::Applied);
        assert_eq!(tracker.state(), ScreenState::Idle);
    }

    #[test]
    fn areas_resolve_clicks_to_slots() {
        let mut areas = Areas::default();
        areas.record(Slot::Search, Rect::new(0, 1, 80, 3));
        areas.record(Slot::Primary, Rect::new(0, 4, 80, 20));
        assert_eq!(areas.slot_at(10, 2), Some(Slot::Search));
        assert_eq!(areas.slot_at(79, 23), Some(Slot::Primary));
        assert_eq!(areas.slot_at(80, 23), None);
        areas.clear();
        assert_eq!(areas.slot_at(10, 2), None);
    }
}
