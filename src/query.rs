use chrono::{DateTime, Duration as TimeDelta, Local, NaiveDateTime, TimeZone};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::debug;

use crate::app::App;
use crate::focus::{FocusRing, PanePair};
use crate::input::{Action, KeyContext};
use crate::model::{QueryParams, QueryRecord, Record};
use crate::provider::{QuerySource, Sources, or_empty};
use crate::screen::{
    Areas, Listing, LoadTracker, PrimaryRefresh, ScreenCtx, ScreenEffect, ScreenState, Slot, edit_input,
    move_selection,
};
use crate::search::SearchState;
use crate::table::{Reference, TableModel};
use crate::widgets::{TextInput, TextPanel, Titled};

pub const POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_START: &str = "-1h";
pub const DEFAULT_END: &str = "now";
pub const DEFAULT_QUERY: &str = "fields @timestamp, @message | sort @timestamp desc | limit 50";

const CHOSEN: &str = "●";
const GROUP_HEADINGS: [&str; 3] = ["Use", "Log group", "Retention"];

/// Log-query screen: choose groups, a time window and a query text, then
/// browse dynamic-schema results.
pub struct QueryScreen {
    sources: Sources,
    search: TextInput,
    groups: TableModel,
    group_ids: Vec<String>,
    chosen: BTreeSet<String>,
    groups_search: SearchState,
    start: TextInput,
    end: TextInput,
    text: TextInput,
    results: TableModel,
    results_search: SearchState,
    expanded: TextPanel,
    ring: FocusRing<Slot>,
    panes: PanePair,
    tracker: LoadTracker,
    areas: Areas,
    opened: bool,
}

impl QueryScreen {
    pub fn new(sources: Sources) -> Self {
        let mut groups = TableModel::new("Log groups");
        groups.init_selectable("Log groups", &GROUP_HEADINGS, Vec::new(), &[1]);
        let mut results = TableModel::new("Results");
        results.init_query_results(Vec::new());
        Self {
            sources,
            search: TextInput::new("Search"),
            groups,
            group_ids: Vec::new(),
            chosen: BTreeSet::new(),
            groups_search: SearchState::default(),
            start: TextInput::new("Start").with_value(DEFAULT_START),
            end: TextInput::new("End").with_value(DEFAULT_END),
            text: TextInput::new("Query").with_value(DEFAULT_QUERY),
            results,
            results_search: SearchState::default(),
            expanded: TextPanel::new("Expanded"),
            ring: FocusRing::new(vec![
                Slot::Search,
                Slot::Primary,
                Slot::Start,
                Slot::End,
                Slot::QueryText,
                Slot::Results,
                Slot::Expanded,
            ]),
            panes: PanePair::new(1, 3),
            tracker: LoadTracker::default(),
            areas: Areas::default(),
            opened: false,
        }
    }

    pub fn search(&self) -> &TextInput {
        &self.search
    }

    pub fn groups(&self) -> &TableModel {
        &self.groups
    }

    pub fn chosen(&self) -> &BTreeSet<String> {
        &self.chosen
    }

    pub fn start(&self) -> &TextInput {
        &self.start
    }

    pub fn end(&self) -> &TextInput {
        &self.end
    }

    pub fn text(&self) -> &TextInput {
        &self.text
    }

    pub fn results(&self) -> &TableModel {
        &self.results
    }

    pub fn expanded(&self) -> &TextPanel {
        &self.expanded
    }

    pub fn panes(&self) -> PanePair {
        self.panes
    }

    pub fn groups_mut(&mut self) -> &mut TableModel {
        &mut self.groups
    }

    pub fn results_mut(&mut self) -> &mut TableModel {
        &mut self.results
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

    pub fn focused(&self) -> Slot {
        self.ring.current()
    }

    pub fn focus(&mut self, slot: Slot) {
        if self.ring.observe(slot) {
            self.sync_expanded();
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
            Slot::Primary | Slot::Results => KeyContext::Table,
            Slot::Expanded => KeyContext::Text,
            _ => KeyContext::TextInput,
        }
    }

    pub fn titled_mut(&mut self, slot: Slot) -> Option<&mut dyn Titled> {
        match slot {
            Slot::Search => Some(&mut self.search),
            Slot::Primary => Some(&mut self.groups),
            Slot::Start => Some(&mut self.start),
            Slot::End => Some(&mut self.end),
            Slot::QueryText => Some(&mut self.text),
            Slot::Results => Some(&mut self.results),
            Slot::Expanded => Some(&mut self.expanded),
            _ => None,
        }
    }

    pub fn open(&mut self, ctx: &ScreenCtx<'_>) {
        if self.opened {
            return;
        }
        self.opened = true;
        self.refresh_groups(ctx, PrimaryRefresh::Cached);
    }

    /// Drill-down from the log groups screen: choose only `group` and run
    /// the current query against it.
    pub fn drill(&mut self, ctx: &ScreenCtx<'_>, group: &str) {
        self.chosen = BTreeSet::from([group.to_string()]);
        self.mark_chosen();
        self.focus(Slot::Primary);
        self.open(ctx);
        self.run_query(ctx);
    }

    pub fn apply_action(&mut self, action: Action, ctx: &ScreenCtx<'_>) -> ScreenEffect {
        match action {
            Action::FocusNext => {
                self.ring.next();
                self.sync_expanded();
            }
            Action::FocusPrev => {
                self.ring.prev();
                self.sync_expanded();
            }
            Action::GrowPane => {
                self.panes.grow_first();
            }
            Action::ShrinkPane => {
                self.panes.shrink_first();
            }
            Action::HardRefresh => {
                self.refresh_groups(ctx, PrimaryRefresh::Force);
                self.run_query(ctx);
            }
            Action::ToSelector => return ScreenEffect::Back,
            other => return self.focused_action(other, ctx),
        }
        ScreenEffect::None
    }

    fn focused_action(&mut self, action: Action, ctx: &ScreenCtx<'_>) -> ScreenEffect {
        match self.focused() {
            Slot::Primary => match action {
                Action::Toggle => self.toggle_selected_group(),
                Action::Submit => self.run_query(ctx),
                Action::RefreshCached => self.refresh_groups(ctx, PrimaryRefresh::Cached),
                Action::RefreshForce => self.refresh_groups(ctx, PrimaryRefresh::Force),
                Action::NextMatch => {
                    self.groups_search.next(&mut self.groups);
                }
                Action::PrevMatch => {
                    self.groups_search.prev(&mut self.groups);
                }
                other => move_selection(&mut self.groups, &other),
            },
            Slot::Results => match action {
                Action::Submit | Action::RefreshCached | Action::RefreshForce => self.run_query(ctx),
                Action::NextMatch => {
                    self.results_search.next(&mut self.results);
                    self.sync_expanded();
                }
                Action::PrevMatch => {
                    self.results_search.prev(&mut self.results);
                    self.sync_expanded();
                }
                other => {
                    move_selection(&mut self.results, &other);
                    self.sync_expanded();
                }
            },
            Slot::Expanded => match action {
                Action::Down => self.expanded.scroll_by(1),
                Action::Up => self.expanded.scroll_by(-1),
                Action::Top => self.expanded.scroll_to_top(),
                Action::Bottom => self.expanded.scroll_to_end(),
                _ => {}
            },
            Slot::Search if action == Action::Submit => self.commit_search(ctx),
            _ if action == Action::Submit => self.run_query(ctx),
            slot => {
                let Some(input) = self.input_mut(slot) else {
                    return ScreenEffect::None;
                };
                match action {
                    Action::Cancel if input.is_empty() => return ScreenEffect::Back,
                    Action::Cancel => input.clear(),
                    other => edit_input(input, other),
                }
            }
        }
        ScreenEffect::None
    }

    fn input_mut(&mut self, slot: Slot) -> Option<&mut TextInput> {
        match slot {
            Slot::Search => Some(&mut self.search),
            Slot::Start => Some(&mut self.start),
            Slot::End => Some(&mut self.end),
            Slot::QueryText => Some(&mut self.text),
            _ => None,
        }
    }

    /// Highlights matches in both tables and narrows the groups table to
    /// the search string; an empty string lists every group again.
    fn commit_search(&mut self, ctx: &ScreenCtx<'_>) {
        let query = self.search.value().to_string();
        self.groups_search.commit(&mut self.groups, &query, &[1]);
        self.results_search.commit(&mut self.results, &query, &[]);

        if query.is_empty() {
            self.load_groups(ctx, Listing::List { reset: false });
        } else {
            self.load_groups(ctx, Listing::Filter(query));
        }
    }

    /// Lists every group, keeping only the chosen ones that still exist.
    pub fn refresh_groups(&mut self, ctx: &ScreenCtx<'_>, mode: PrimaryRefresh) {
        let reset = mode == PrimaryRefresh::Force;
        self.load_groups(ctx, Listing::List { reset });
    }

    fn load_groups(&self, ctx: &ScreenCtx<'_>, listing: Listing) {
        let list = self.sources.list.clone();
        let page = ctx.page;
        let filtered = listing.is_filtered();
        ctx.loader.load(
            ctx.widget(Slot::Primary),
            self.groups.title(),
            async move {
                match listing {
                    Listing::List { reset } => or_empty("list", list.list(reset)).await,
                    Listing::Filter(needle) => or_empty("filter", list.filter(&needle)).await,
                }
            },
            move |app: &mut App, records| {
                if let Some(screen) = app.query_mut(page) {
                    screen.apply_groups(records, filtered);
                }
            },
        );
    }

    /// A filtered listing hides groups without dropping them from the
    /// chosen set.
    pub fn apply_groups(&mut self, records: Vec<Record>, filtered: bool) {
        let rows = records
            .iter()
            .map(|record| {
                vec![
                    String::new(),
                    record.display_name().to_string(),
                    record.field_text("retention"),
                ]
            })
            .collect();
        self.groups
            .init_selectable("Log groups", &GROUP_HEADINGS, rows, &[1]);
        self.group_ids = records.into_iter().map(|record| record.id).collect();
        if !filtered {
            self.chosen.retain(|id| self.group_ids.contains(id));
        }
        self.mark_chosen();
        self.groups_search.reapply(&mut self.groups, &[1]);
    }

    fn toggle_selected_group(&mut self) {
        let Some(row) = self.groups.selected_row() else {
            return;
        };
        let Some(id) = self.group_ids.get(row - 1).cloned() else {
            return;
        };
        if !self.chosen.remove(&id) {
            self.chosen.insert(id);
        }
        self.mark_chosen();
    }

    fn mark_chosen(&mut self) {
        for (index, id) in self.group_ids.iter().enumerate() {
            let marker = if self.chosen.contains(id) { CHOSEN } else { "" };
            self.groups.set_cell_text(index + 1, 0, marker);
        }
    }

    /// Starts the query and polls it to completion. Invalid times, an empty
    /// window or no chosen group refuse the request.
    pub fn run_query(&mut self, ctx: &ScreenCtx<'_>) {
        let Some(params) = self.query_params(Local::now()) else {
            return;
        };
        let Some(query) = self.sources.query.clone() else {
            return;
        };
        let page = ctx.page;
        ctx.loader.load(
            ctx.widget(Slot::Results),
            self.results.title(),
            async move { poll_query(query.as_ref(), &params).await },
            move |app: &mut App, records| {
                if let Some(screen) = app.query_mut(page) {
                    screen.apply_results(records);
                }
            },
        );
    }

    pub fn query_params(&self, now: DateTime<Local>) -> Option<QueryParams> {
        let Some(start) = parse_time(self.start.value(), now) else {
            debug!(start = self.start.value(), "query refused: invalid start");
            return None;
        };
        let Some(end) = parse_time(self.end.value(), now) else {
            debug!(end = self.end.value(), "query refused: invalid end");
            return None;
        };
        if start >= end {
            debug!("query refused: start is not before end");
            return None;
        }
        if self.chosen.is_empty() {
            debug!("query refused: no log group chosen");
            return None;
        }
        Some(QueryParams {
            groups: self.chosen.iter().cloned().collect(),
            start,
            end,
            text: self.text.value().to_string(),
        })
    }

    pub fn apply_results(&mut self, records: Vec<QueryRecord>) {
        self.results.init_query_results(records);
        self.results_search.reapply(&mut self.results, &[]);
        self.sync_expanded();
    }

    fn sync_expanded(&mut self) {
        let text = self
            .results
            .selected_reference()
            .map(Reference::expanded)
            .unwrap_or_default();
        self.expanded.set_text(text);
    }
}

async fn poll_query(
    query: &dyn QuerySource,
    params: &QueryParams,
) -> Vec<QueryRecord> {
    let id = match query.start_query(params).await {
        Ok(id) => id,
        Err(error) => {
            debug!("start query produced an empty refresh: {error:#}");
            return Vec::new();
        }
    };
    loop {
        match query.query_results(&id).await {
            Ok(page) if page.status.is_terminal() => return page.records,
            Ok(page) => debug!(%id, partial = page.records.len(), status = ?page.status, "query pending"),
            Err(error) => {
                debug!(%id, "query results produced an empty refresh: {error:#}");
                return Vec::new();
            }
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Parses a start/end field relative to `now`.
///
/// Accepts `now`, offsets into the past such as `15m`, `-1h` or `2d`, local
/// `YYYY-MM-DD HH:MM[:SS]` and RFC 3339.
pub fn parse_time(text: &str, now: DateTime<Local>) -> Option<DateTime<Local>> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("now") {
        return Some(now);
    }
    if let Some(offset) = parse_offset(text) {
        return now.checked_sub_signed(offset);
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Local.from_local_datetime(&naive).single();
        }
    }
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|time| time.with_timezone(&Local))
}

fn parse_offset(text: &str) -> Option<TimeDelta> {
    let body = text.strip_prefix('-').unwrap_or(text);
    let unit = body.chars().last()?;
    let amount = body[..body.len() - unit.len_utf8()].parse::<i64>().ok()?;
    match unit {
        's' => TimeDelta::try_seconds(amount),
        'm' => TimeDelta::try_minutes(amount),
        'h' => TimeDelta::try_hours(amount),
        'd' => TimeDelta::try_days(amount),
        'w' => TimeDelta::try_weeks(amount),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{QueryScreen, parse_time};
    use crate::catalog::{Catalog, CatalogOptions};
    use crate::model::{Record, Service};
    use crate::widgets::Titled;
    use chrono::{Duration, Local, TimeZone};

    fn screen() -> QueryScreen {
        let catalog = Catalog::from_yaml("services: {}\n", CatalogOptions::default())
            .expect("empty catalog");
        QueryScreen::new(catalog.sources(Service::Insights))
    }

    #[test]
    fn parse_time_accepts_relative_absolute_and_rfc3339() {
        let now = Local.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap();
        assert_eq!(parse_time("now", now), Some(now));
        assert_eq!(parse_time("15m", now), Some(now - Duration::minutes(15)));
        assert_eq!(parse_time("-1h", now), Some(now - Duration::hours(1)));
        assert_eq!(parse_time("2d", now), Some(now - Duration::days(2)));
        assert_eq!(
            parse_time("2026-10-14 09:30", now),
            Some(Local.with_ymd_and_hms(2026, 10, 14, 9, 30, 0).unwrap())
        );
        assert_eq!(
            parse_time("2026-10-14 09:30:15", now),
            Some(Local.with_ymd_and_hms(2026, 10, 14, 9, 30, 15).unwrap())
        );
        assert!(parse_time("2026-10-14T09:30:00Z", now).is_some());
        assert_eq!(parse_time("yesterday", now), None);
        assert_eq!(parse_time("5y", now), None);
        assert_eq!(parse_time("", now), None);
    }

    #[test]
    fn query_params_refuse_invalid_input() {
        let now = Local::now();
        let mut screen = screen();
        screen.apply_groups(vec![Record::new("/aws/lambda/billing-api")], false);
        assert_eq!(screen.query_params(now), None);

        screen.groups.select(1, 0);
        screen.toggle_selected_group();
        let params = screen.query_params(now).expect("valid query");
        assert_eq!(params.groups, vec!["/aws/lambda/billing-api".to_string()]);
        assert_eq!(params.end, now);

        screen.start.set_value("now");
        screen.end.set_value("-1h");
        assert_eq!(screen.query_params(now), None);

        screen.start.set_value("soon");
        assert_eq!(screen.query_params(now), None);
    }

    #[test]
    fn toggle_marks_chosen_groups() {
        let mut screen = screen();
        screen.apply_groups(vec![Record::new("/a"), Record::new("/b")], false);
        screen.groups.select(2, 0);
        screen.toggle_selected_group();
        assert_eq!(screen.groups().cell(2, 0).map(|cell| cell.text.as_str()), Some("●"));
        assert_eq!(screen.groups().cell(1, 0).map(|cell| cell.text.as_str()), Some(""));
        screen.toggle_selected_group();
        assert!(screen.chosen().is_empty());
        assert_eq!(screen.groups().cell(2, 0).map(|cell| cell.text.as_str()), Some(""));
    }

    #[test]
    fn reloaded_groups_keep_known_choices() {
        let mut screen = screen();
        screen.apply_groups(vec![Record::new("/a"), Record::new("/b")], false);
        screen.groups.select(1, 0);
        screen.toggle_selected_group();
        screen.apply_groups(vec![Record::new("/c"), Record::new("/a")], false);
        assert_eq!(screen.chosen().iter().collect::<Vec<_>>(), ["/a"]);
        assert_eq!(screen.groups().cell(2, 0).map(|cell| cell.text.as_str()), Some("●"));
    }

    #[test]
    fn filtered_groups_keep_hidden_choices() {
        let mut screen = screen();
        screen.apply_groups(vec![Record::new("/a"), Record::new("/b")], false);
        screen.groups.select(1, 0);
        screen.toggle_selected_group();
        screen.apply_groups(vec![Record::new("/b")], true);
        assert_eq!(screen.groups().title(), "Log groups (1)");
        assert_eq!(screen.chosen().iter().collect::<Vec<_>>(), ["/a"]);
        assert_eq!(screen.groups().cell(1, 0).map(|cell| cell.text.as_str()), Some(""));
    }
}
