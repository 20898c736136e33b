use ratatui::style::Color;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::input::{Action, KeyContext};
use crate::loader::{LOAD_TIMEOUT, LoadOutcome, Loader, UiQueue, WidgetHost};
use crate::logsink::LogSink;
use crate::model::{SecondaryKind, Service};
use crate::pages::PageStack;
use crate::provider::Sources;
use crate::query::QueryScreen;
use crate::screen::{
    Areas, ResourceScreen, ScreenCtx, ScreenEffect, ScreenState, Slot, WidgetId,
};
use crate::selector::{LOG_PAGE, Selector};
use crate::widgets::{TextPanel, Titled};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Body {
    Selector,
    Pages,
}

/// Process-level settings the shell is started with.
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub region: String,
    pub profile: String,
    pub origin: String,
    pub timeout: Duration,
    pub accents: HashMap<Service, Color>,
    pub log: LogSink,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            region: "-".to_string(),
            profile: "-".to_string(),
            origin: "built-in demo".to_string(),
            timeout: LOAD_TIMEOUT,
            accents: HashMap::new(),
            log: LogSink::default(),
        }
    }
}

pub enum Page {
    Resource(ResourceScreen),
    Query(QueryScreen),
    Log(LogPage),
}

impl Page {
    pub fn state(&self) -> ScreenState {
        match self {
            Self::Resource(screen) => screen.state(),
            Self::Query(screen) => screen.state(),
            Self::Log(_) => ScreenState::Idle,
        }
    }

    fn key_context(&self) -> KeyContext {
        match self {
            Self::Resource(screen) => screen.key_context(),
            Self::Query(screen) => screen.key_context(),
            Self::Log(_) => KeyContext::Text,
        }
    }

    fn titled_mut(&mut self, slot: Slot) -> Option<&mut dyn Titled> {
        match self {
            Self::Resource(screen) => screen.titled_mut(slot),
            Self::Query(screen) => screen.titled_mut(slot),
            Self::Log(log) => (slot == Slot::Log).then_some(&mut log.panel as &mut dyn Titled),
        }
    }

    fn focus(&mut self, slot: Slot) {
        match self {
            Self::Resource(screen) => screen.focus(slot),
            Self::Query(screen) => screen.focus(slot),
            Self::Log(_) => {}
        }
    }
}

/// The in-app log page over the tracing ring.
pub struct LogPage {
    panel: TextPanel,
    sink: LogSink,
    follow: bool,
    areas: Areas,
}

impl LogPage {
    fn new(sink: LogSink) -> Self {
        Self {
            panel: TextPanel::new("Log"),
            sink,
            follow: true,
            areas: Areas::default(),
        }
    }

    pub fn panel(&self) -> &TextPanel {
        &self.panel
    }

    pub fn areas_mut(&mut self) -> &mut Areas {
        &mut self.areas
    }

    /// Pulls the latest lines; keeps the reader's position unless following.
    pub fn sync(&mut self) {
        let text = self.sink.snapshot().join("\n");
        if text == self.panel.text() {
            return;
        }
        let scroll = self.panel.scroll();
        self.panel.set_text(text);
        if self.follow {
            self.panel.scroll_to_end();
        } else {
            self.panel.scroll_by(i32::from(scroll));
        }
    }

    fn apply_action(&mut self, action: Action) {
        match action {
            Action::Down => self.scroll(1),
            Action::Up => self.scroll(-1),
            Action::PageDown => self.scroll(10),
            Action::PageUp => self.scroll(-10),
            Action::Top => {
                self.follow = false;
                self.panel.scroll_to_top();
            }
            Action::Bottom | Action::RefreshCached | Action::RefreshForce | Action::HardRefresh => {
                self.follow = true;
                self.sync();
                self.panel.scroll_to_end();
            }
            _ => {}
        }
    }

    fn scroll(&mut self, delta: i32) {
        self.follow = false;
        self.panel.scroll_by(delta);
    }
}

pub struct App {
    running: bool,
    body: Body,
    selector: Selector,
    pages: PageStack,
    screens: Vec<Page>,
    services: Vec<Option<Service>>,
    loader: Loader<App>,
    status: String,
    options: AppOptions,
}

impl App {
    /// Builds every screen once; `sources` supplies each service's provider.
    pub fn new<F>(options: AppOptions, queue: UiQueue<App>, sources: F) -> Self
    where
        F: Fn(Service) -> Sources,
    {
        let mut names = Vec::new();
        let mut screens = Vec::new();
        let mut services = Vec::new();
        for service in Service::ALL {
            let page = match service.secondary() {
                SecondaryKind::Query => Page::Query(QueryScreen::new(sources(service))),
                _ => Page::Resource(ResourceScreen::new(service, sources(service))),
            };
            names.push(service.id().to_string());
            screens.push(page);
            services.push(Some(service));
        }
        names.push(LOG_PAGE.to_string());
        screens.push(Page::Log(LogPage::new(options.log.clone())));
        services.push(None);

        Self {
            running: true,
            body: Body::Selector,
            selector: Selector::new(),
            pages: PageStack::new(names),
            screens,
            services,
            loader: Loader::new(queue, options.timeout),
            status: "Pick a service: type to filter, Tab completes, Enter opens".to_string(),
            options,
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn body(&self) -> Body {
        self.body
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn pages(&self) -> &PageStack {
        &self.pages
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn region(&self) -> &str {
        &self.options.region
    }

    pub fn profile(&self) -> &str {
        &self.options.profile
    }

    pub fn origin(&self) -> &str {
        &self.options.origin
    }

    pub fn current_page(&self) -> usize {
        self.pages.current()
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.screens.get(index)
    }

    pub fn page_mut(&mut self, index: usize) -> Option<&mut Page> {
        self.screens.get_mut(index)
    }

    pub fn page_service(&self, index: usize) -> Option<Service> {
        self.services.get(index).copied().flatten()
    }

    pub fn page_of(&self, service: Service) -> Option<usize> {
        self.services
            .iter()
            .position(|candidate| *candidate == Some(service))
    }

    pub fn accent(&self, index: usize) -> Color {
        match self.page_service(index) {
            Some(service) => self
                .options
                .accents
                .get(&service)
                .copied()
                .unwrap_or_else(|| service.accent()),
            None => Color::Rgb(140, 156, 178),
        }
    }

    pub fn resource_mut(&mut self, index: usize) -> Option<&mut ResourceScreen> {
        match self.screens.get_mut(index) {
            Some(Page::Resource(screen)) => Some(screen),
            _ => None,
        }
    }

    pub fn query_mut(&mut self, index: usize) -> Option<&mut QueryScreen> {
        match self.screens.get_mut(index) {
            Some(Page::Query(screen)) => Some(screen),
            _ => None,
        }
    }

    pub fn key_context(&self) -> KeyContext {
        match self.body {
            Body::Selector => KeyContext::Selector,
            Body::Pages => self.screens[self.pages.current()].key_context(),
        }
    }

    /// Refreshes render-only state right before a frame is drawn.
    pub fn before_draw(&mut self) {
        if let Some(Page::Log(log)) = self.screens.get_mut(self.pages.current()) {
            log.sync();
        }
    }

    pub fn apply_action(&mut self, action: Action) {
        if action == Action::Quit {
            self.running = false;
            self.set_status("Exit requested");
            return;
        }
        match self.body {
            Body::Selector => self.selector_action(action),
            Body::Pages => self.page_action(action),
        }
    }

    fn selector_action(&mut self, action: Action) {
        match action {
            Action::Submit => match self.selector.commit() {
                Some(id) => {
                    self.selector.reset();
                    self.open_page_id(id);
                }
                None => self.set_status("No service matches"),
            },
            Action::Cancel => self.selector.reset(),
            Action::Complete => self.selector.complete(),
            Action::Down => self.selector.next(),
            Action::Up => self.selector.prev(),
            Action::NextPage => {
                self.pages.next();
                self.show_pages();
            }
            Action::PrevPage => {
                self.pages.prev();
                self.show_pages();
            }
            other => {
                crate::screen::edit_input(self.selector.input_mut(), other);
                self.selector.rank();
            }
        }
    }

    fn page_action(&mut self, action: Action) {
        match action {
            Action::NextPage => {
                if self.pages.next() {
                    self.open_current();
                }
                return;
            }
            Action::PrevPage => {
                if self.pages.prev() {
                    self.open_current();
                }
                return;
            }
            _ => {}
        }

        let page = self.pages.current();
        let ctx = ScreenCtx {
            loader: &self.loader,
            page,
        };
        let effect = match &mut self.screens[page] {
            Page::Resource(screen) => screen.apply_action(action, &ctx),
            Page::Query(screen) => screen.apply_action(action, &ctx),
            Page::Log(log) => {
                if action == Action::ToSelector {
                    ScreenEffect::Back
                } else {
                    log.apply_action(action);
                    ScreenEffect::None
                }
            }
        };

        match effect {
            ScreenEffect::None => {}
            ScreenEffect::Back => {
                self.body = Body::Selector;
                self.set_status("Pick a service");
            }
            ScreenEffect::Drill { service, id } => self.drill(service, &id),
        }
    }

    pub fn open_page_id(&mut self, id: &str) -> bool {
        match self.pages.position(id) {
            Some(index) => {
                self.change_page(index, Slot::Primary);
                true
            }
            None => {
                warn!(page = id, "unknown page");
                false
            }
        }
    }

    /// Shows page `index` and focuses `focus` on it.
    pub fn change_page(&mut self, index: usize, focus: Slot) {
        if index >= self.screens.len() {
            return;
        }
        self.pages.change_page(index);
        self.screens[index].focus(focus);
        self.show_pages();
    }

    fn show_pages(&mut self) {
        self.body = Body::Pages;
        self.open_current();
    }

    fn open_current(&mut self) {
        let page = self.pages.current();
        let ctx = ScreenCtx {
            loader: &self.loader,
            page,
        };
        match &mut self.screens[page] {
            Page::Resource(screen) => screen.open(&ctx),
            Page::Query(screen) => screen.open(&ctx),
            Page::Log(log) => log.sync(),
        }
        self.status = format!("{} {}", self.pages.current_name(), self.pages.paginator());
    }

    fn drill(&mut self, service: Service, id: &str) {
        let Some(index) = self.page_of(service) else {
            return;
        };
        info!(service = %service, id, "drill down");
        self.change_page(index, Slot::Primary);
        let ctx = ScreenCtx {
            loader: &self.loader,
            page: index,
        };
        match &mut self.screens[index] {
            Page::Query(screen) => screen.drill(&ctx, id),
            Page::Resource(screen) => screen.refresh_secondary(&ctx, id, false),
            Page::Log(_) => {}
        }
    }

    pub fn click(&mut self, column: u16, row: u16) {
        if self.body != Body::Pages {
            return;
        }
        let focused = match &mut self.screens[self.pages.current()] {
            Page::Resource(screen) => screen.click(column, row),
            Page::Query(screen) => screen.click(column, row),
            Page::Log(_) => false,
        };
        if focused {
            debug!(column, row, "focus follows click");
        }
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = normalize_status_text(status.into());
    }
}

impl WidgetHost for App {
    type WidgetId = WidgetId;

    fn set_widget_title(&mut self, id: WidgetId, title: String) {
        if let Some(widget) = self
            .screens
            .get_mut(id.page)
            .and_then(|page| page.titled_mut(id.slot))
        {
            widget.set_title(title);
        }
    }

    fn load_started(&mut self, id: WidgetId) {
        match self.screens.get_mut(id.page) {
            Some(Page::Resource(screen)) => screen.tracker_mut().started(),
            Some(Page::Query(screen)) => screen.tracker_mut().started(),
            _ => {}
        }
    }

    fn load_finished(&mut self, id: WidgetId, outcome: LoadOutcome) {
        match self.screens.get_mut(id.page) {
            Some(Page::Resource(screen)) => screen.tracker_mut().finished(outcome),
            Some(Page::Query(screen)) => screen.tracker_mut().finished(outcome),
            _ => {}
        }
        if outcome == LoadOutcome::TimedOut {
            let name = self
                .pages
                .names()
                .get(id.page)
                .cloned()
                .unwrap_or_default();
            self.set_status(format!("{name}: {:?} load timed out", id.slot));
        }
    }
}

fn normalize_status_text(status: String) -> String {
    const MAX_STATUS_LEN: usize = 180;
    if status.chars().count() <= MAX_STATUS_LEN {
        return status;
    }

    let mut shortened = status
        .chars()
        .take(MAX_STATUS_LEN.saturating_sub(1))
        .collect::<String>();
    shortened.push('…');
    shortened
}

#[cfg(test)]
mod tests {
    use super::{App, AppOptions, Body, Page};
    use crate::catalog::{Catalog, CatalogOptions};
    use crate::input::{Action, map_key};
    use crate::loader::{TIMED_OUT_TITLE, UiQueue, UiReceiver, drain};
    use crate::model::{Record, Service};
    use crate::provider::{DetailSource, ListSource, Sources};
    use crate::screen::{ScreenState, Slot};
    use crate::widgets::Titled;
    use anyhow::Result;
    use async_trait::async_trait;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::fmt::Write;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn catalog_yaml() -> String {
        let mut yaml = String::from(
            "services:
  lambda:
    records:
      - {id: fn-billing, name: billing-api, runtime: python3.12}
      - {id: fn-orders, name: orders-worker, runtime: nodejs20.x}
    details:
      fn-billing: {handler: app.handler, environment: {STAGE: prod}}
  logs:
    records:
      - {id: /aws/lambda/billing-api, name: /aws/lambda/billing-api, retention: 14}
      - {id: /ecs/checkout, name: /ecs/checkout, retention: 30}
    query_rows:
      - {\"@log\": /aws/lambda/billing-api, \"@timestamp\": \"2026-10-14 09:00:01\", \"@message\": START}
      - {\"@log\": /aws/lambda/billing-api, \"@timestamp\": \"2026-10-14 09:00:02\", \"@message\": ERROR boom, level: ERROR}
      - {\"@log\": /ecs/checkout, \"@timestamp\": \"2026-10-14 09:00:03\", \"@message\": other}
  dynamodb:
    records:
      - {id: orders, name: orders}
    items:
      orders:
        - {pk: '1', total: 12}
        - {pk: '2', note: late}
  stepfunctions:
    records:
      - {id: ex-1, name: nightly-export-1, state_machine: nightly-export}
      - {id: ex-2, name: invoice-batch-2, state_machine: invoice-batch}
      - {id: ex-3, name: nightly-export-3, state_machine: nightly-export}
  alarms:
    records:
      - {id: cpu-high, name: cpu-high, state: ALARM}
    history:
      cpu-high:
",
        );
        for index in 0..120 {
            let _ = writeln!(
                yaml,
                "        - {{id: h{index}, summary: change {index}, type: StateUpdate}}"
            );
        }
        yaml
    }

    fn app_with(sources: impl Fn(Service) -> Sources) -> (App, UiReceiver<App>) {
        let (queue, rx) = UiQueue::channel();
        (App::new(AppOptions::default(), queue, sources), rx)
    }

    fn catalog_app() -> (App, UiReceiver<App>) {
        let options = CatalogOptions {
            page_size: 50,
            ..CatalogOptions::default()
        };
        let catalog = Catalog::from_yaml(&catalog_yaml(), options).expect("catalog parses");
        app_with(|service| catalog.sources(service))
    }

    async fn settle(app: &mut App, rx: &mut UiReceiver<App>, wait: Duration) {
        tokio::time::sleep(wait).await;
        drain(rx, app);
    }

    fn resource(app: &App) -> &crate::screen::ResourceScreen {
        match app.page(app.current_page()) {
            Some(Page::Resource(screen)) => screen,
            _ => panic!("current page is not a resource screen"),
        }
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.apply_action(Action::InputChar(ch));
        }
    }

    fn press(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
        if let Some(action) = map_key(app.key_context(), KeyEvent::new(code, modifiers)) {
            app.apply_action(action);
        }
    }

    /// Counts calls and resets and stalls the first call for `stall`.
    struct ScriptedList {
        calls: AtomicUsize,
        resets: AtomicUsize,
        describes: AtomicUsize,
        stall: Duration,
    }

    impl ScriptedList {
        fn new(stall: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                resets: AtomicUsize::new(0),
                describes: AtomicUsize::new(0),
                stall,
            })
        }

        fn counts(&self) -> (usize, usize) {
            (self.calls.load(Ordering::SeqCst), self.resets.load(Ordering::SeqCst))
        }
    }

    #[async_trait]
    impl ListSource for ScriptedList {
        async fn list(&self, reset: bool) -> Result<Vec<Record>> {
            if reset {
                self.resets.fetch_add(1, Ordering::SeqCst);
            }
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                tokio::time::sleep(self.stall).await;
            }
            Ok(vec![
                Record::new("fn-billing").with("name", "billing-api"),
                Record::new("fn-orders").with("name", "orders-worker"),
            ])
        }

        async fn filter(&self, needle: &str) -> Result<Vec<Record>> {
            let all = self.list(false).await?;
            Ok(all.into_iter().filter(|record| record.matches_name(needle)).collect())
        }
    }

    #[async_trait]
    impl DetailSource for ScriptedList {
        async fn describe(&self, id: &str) -> Result<Option<Record>> {
            self.describes.fetch_add(1, Ordering::SeqCst);
            Ok(Some(Record::new(id).with("handler", "app.handler")))
        }
    }

    fn scripted_app(list: &Arc<ScriptedList>) -> (App, UiReceiver<App>) {
        let shared = list.clone();
        app_with(move |_| Sources {
            detail: Some(shared.clone() as Arc<dyn DetailSource>),
            ..Sources::listing(shared.clone())
        })
    }

    #[tokio::test(start_paused = true)]
    async fn list_filter_then_force_refresh() {
        let list = ScriptedList::new(Duration::ZERO);
        let shared = list.clone();
        let (mut app, mut rx) = app_with(move |_| Sources::listing(shared.clone()));

        type_text(&mut app, "lambda");
        app.apply_action(Action::Submit);
        assert_eq!(app.body(), Body::Pages);
        settle(&mut app, &mut rx, Duration::from_millis(300)).await;
        assert_eq!(resource(&app).primary().title(), "Functions (2)");
        assert_eq!(resource(&app).focused(), Slot::Primary);

        app.apply_action(Action::FocusPrev);
        assert_eq!(resource(&app).focused(), Slot::Search);
        type_text(&mut app, "orders");
        app.apply_action(Action::Submit);
        settle(&mut app, &mut rx, Duration::from_millis(300)).await;
        assert_eq!(resource(&app).primary().title(), "Functions (1)");

        app.apply_action(Action::FocusNext);
        app.apply_action(Action::RefreshForce);
        settle(&mut app, &mut rx, Duration::from_millis(300)).await;
        assert_eq!(list.resets.load(Ordering::SeqCst), 1);
        assert_eq!(resource(&app).primary().title(), "Functions (2)");
        assert_eq!(resource(&app).state(), ScreenState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_keys_choose_cached_or_reset_listing() {
        let list = ScriptedList::new(Duration::ZERO);
        let (mut app, mut rx) = scripted_app(&list);
        assert!(app.open_page_id("lambda"));
        settle(&mut app, &mut rx, Duration::from_millis(300)).await;
        assert_eq!(list.counts(), (1, 0));

        press(&mut app, KeyCode::Char('r'), KeyModifiers::NONE);
        settle(&mut app, &mut rx, Duration::from_millis(300)).await;
        assert_eq!(list.counts(), (2, 0));
        assert_eq!(resource(&app).primary().title(), "Functions (2)");

        press(&mut app, KeyCode::Char('r'), KeyModifiers::CONTROL);
        settle(&mut app, &mut rx, Duration::from_millis(300)).await;
        assert_eq!(list.counts(), (3, 1));
        assert_eq!(resource(&app).primary().title(), "Functions (2)");
    }

    #[tokio::test(start_paused = true)]
    async fn f5_resets_primary_and_reloads_shown_secondary() {
        let list = ScriptedList::new(Duration::ZERO);
        let (mut app, mut rx) = scripted_app(&list);
        assert!(app.open_page_id("lambda"));
        settle(&mut app, &mut rx, Duration::from_millis(300)).await;

        press(&mut app, KeyCode::F(5), KeyModifiers::NONE);
        settle(&mut app, &mut rx, Duration::from_millis(300)).await;
        assert_eq!(list.counts(), (2, 1));
        assert_eq!(list.describes.load(Ordering::SeqCst), 0);

        press(&mut app, KeyCode::Down, KeyModifiers::NONE);
        press(&mut app, KeyCode::Enter, KeyModifiers::NONE);
        settle(&mut app, &mut rx, Duration::from_millis(300)).await;
        assert_eq!(list.describes.load(Ordering::SeqCst), 1);
        assert_eq!(resource(&app).secondary().title(), "Configuration");

        press(&mut app, KeyCode::F(5), KeyModifiers::NONE);
        settle(&mut app, &mut rx, Duration::from_millis(300)).await;
        assert_eq!(list.counts(), (3, 2));
        assert_eq!(list.describes.load(Ordering::SeqCst), 2);
        assert_eq!(resource(&app).secondary().title(), "Configuration");
        assert_eq!(resource(&app).primary().title(), "Functions (2)");
    }

    #[tokio::test(start_paused = true)]
    async fn escape_in_search_clears_before_leaving() {
        let list = ScriptedList::new(Duration::ZERO);
        let (mut app, mut rx) = scripted_app(&list);
        assert!(app.open_page_id("lambda"));
        settle(&mut app, &mut rx, Duration::from_millis(300)).await;

        press(&mut app, KeyCode::Char('j'), KeyModifiers::CONTROL);
        assert_eq!(resource(&app).focused(), Slot::Search);
        type_text(&mut app, "orders");
        assert_eq!(resource(&app).search().value(), "orders");

        press(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(resource(&app).search().value(), "");
        assert_eq!(app.body(), Body::Pages);
        assert_eq!(resource(&app).focused(), Slot::Search);

        press(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(app.body(), Body::Selector);
    }

    #[tokio::test(start_paused = true)]
    async fn alt_arrows_resize_panes_within_bounds() {
        let list = ScriptedList::new(Duration::ZERO);
        let (mut app, mut rx) = scripted_app(&list);
        assert!(app.open_page_id("lambda"));
        settle(&mut app, &mut rx, Duration::from_millis(300)).await;
        assert_eq!(resource(&app).panes().weights(), (3, 2));

        press(&mut app, KeyCode::Up, KeyModifiers::ALT);
        assert_eq!(resource(&app).panes().weights(), (4, 1));
        press(&mut app, KeyCode::Up, KeyModifiers::ALT);
        assert_eq!(resource(&app).panes().weights(), (4, 1));

        for _ in 0..4 {
            press(&mut app, KeyCode::Down, KeyModifiers::ALT);
        }
        assert_eq!(resource(&app).panes().weights(), (1, 4));
        assert_eq!(resource(&app).primary().selected_row(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn insights_search_narrows_groups_and_keeps_choices() {
        let (mut app, mut rx) = catalog_app();
        assert!(app.open_page_id("insights"));
        settle(&mut app, &mut rx, Duration::from_millis(300)).await;
        let insights = app.current_page();
        let groups = |app: &App| match app.page(insights) {
            Some(Page::Query(screen)) => (
                screen.groups().title().to_string(),
                screen.chosen().iter().cloned().collect::<Vec<_>>(),
            ),
            _ => panic!("insights is a query screen"),
        };
        assert_eq!(groups(&app).0, "Log groups (2)");

        press(&mut app, KeyCode::Down, KeyModifiers::NONE);
        press(&mut app, KeyCode::Char(' '), KeyModifiers::NONE);
        assert_eq!(groups(&app).1, ["/aws/lambda/billing-api"]);

        press(&mut app, KeyCode::Char('j'), KeyModifiers::CONTROL);
        type_text(&mut app, "checkout");
        press(&mut app, KeyCode::Enter, KeyModifiers::NONE);
        settle(&mut app, &mut rx, Duration::from_millis(300)).await;
        assert_eq!(groups(&app).0, "Log groups (1)");
        assert_eq!(groups(&app).1, ["/aws/lambda/billing-api"]);

        press(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        press(&mut app, KeyCode::Enter, KeyModifiers::NONE);
        settle(&mut app, &mut rx, Duration::from_millis(300)).await;
        assert_eq!(groups(&app).0, "Log groups (2)");
        assert_eq!(groups(&app).1, ["/aws/lambda/billing-api"]);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_then_successful_refresh() {
        let list = ScriptedList::new(Duration::from_secs(45));
        let shared = list.clone();
        let (mut app, mut rx) = app_with(move |_| Sources::listing(shared.clone()));

        assert!(app.open_page_id("lambda"));
        settle(&mut app, &mut rx, Duration::from_secs(10)).await;
        assert_eq!(resource(&app).state(), ScreenState::Loading);

        settle(&mut app, &mut rx, Duration::from_secs(21)).await;
        assert_eq!(resource(&app).primary().title(), TIMED_OUT_TITLE);
        assert_eq!(resource(&app).state(), ScreenState::TimedOut);
        assert_eq!(resource(&app).primary().body_len(), 0);
        assert!(app.status().contains("timed out"));

        app.apply_action(Action::RefreshForce);
        settle(&mut app, &mut rx, Duration::from_millis(300)).await;
        assert_eq!(resource(&app).primary().title(), "Functions (2)");
        assert_eq!(resource(&app).state(), ScreenState::Idle);

        settle(&mut app, &mut rx, Duration::from_secs(60)).await;
        assert_eq!(resource(&app).primary().title(), "Functions (2)");
    }

    #[tokio::test(start_paused = true)]
    async fn extend_appends_next_history_page() {
        let (mut app, mut rx) = catalog_app();
        assert!(app.open_page_id("alarms"));
        settle(&mut app, &mut rx, Duration::from_millis(300)).await;

        app.apply_action(Action::Down);
        app.apply_action(Action::Submit);
        settle(&mut app, &mut rx, Duration::from_millis(300)).await;
        assert_eq!(resource(&app).focused(), Slot::Secondary);
        assert_eq!(resource(&app).secondary().title(), "History (50)");

        for _ in 0..27 {
            app.apply_action(Action::Down);
        }
        assert_eq!(resource(&app).secondary().selected_row(), Some(27));

        app.apply_action(Action::Extend);
        settle(&mut app, &mut rx, Duration::from_millis(300)).await;
        let secondary = resource(&app).secondary();
        assert_eq!(secondary.title(), "History (100)");
        assert_eq!(secondary.row_count(), 101);
        assert_eq!(secondary.selected_row(), Some(27));
        assert_eq!(secondary.headings(), vec!["Summary", "Type", "Timestamp"]);

        app.apply_action(Action::ExtendLegacy);
        settle(&mut app, &mut rx, Duration::from_millis(300)).await;
        assert_eq!(resource(&app).secondary().title(), "History (120)");
    }

    #[tokio::test(start_paused = true)]
    async fn executions_list_only_once_searched() {
        let (mut app, mut rx) = catalog_app();
        assert!(app.open_page_id("stepfunctions"));
        settle(&mut app, &mut rx, Duration::from_millis(300)).await;
        assert_eq!(resource(&app).primary().title(), "Executions (0)");

        app.apply_action(Action::FocusPrev);
        type_text(&mut app, "nightly");
        app.apply_action(Action::Submit);
        settle(&mut app, &mut rx, Duration::from_millis(300)).await;
        assert_eq!(resource(&app).primary().title(), "Executions (2)");

        app.apply_action(Action::FocusNext);
        app.apply_action(Action::NextMatch);
        assert_eq!(resource(&app).primary().selected_row(), Some(1));
        app.apply_action(Action::NextMatch);
        assert_eq!(resource(&app).primary().selected_row(), Some(2));
        app.apply_action(Action::NextMatch);
        assert_eq!(resource(&app).primary().selected_row(), Some(1));
        assert!(resource(&app).expanded().text().contains("nightly-export-1"));

        app.apply_action(Action::Extend);
        settle(&mut app, &mut rx, Duration::from_millis(300)).await;
        assert_eq!(resource(&app).primary().title(), "Executions (2)");
    }

    #[tokio::test(start_paused = true)]
    async fn log_group_drills_into_insights() {
        let (mut app, mut rx) = catalog_app();
        assert!(app.open_page_id("logs"));
        settle(&mut app, &mut rx, Duration::from_millis(300)).await;
        app.apply_action(Action::Down);
        app.apply_action(Action::Submit);

        let insights = app.page_of(Service::Insights).expect("insights page");
        assert_eq!(app.current_page(), insights);
        assert_eq!(app.pages().paginator(), format!("{}/9", insights + 1));

        settle(&mut app, &mut rx, Duration::from_secs(3)).await;
        let Some(Page::Query(screen)) = app.page(insights) else {
            panic!("insights is a query screen");
        };
        assert_eq!(screen.focused(), Slot::Primary);
        assert_eq!(screen.groups().title(), "Log groups (2)");
        assert_eq!(
            screen.chosen().iter().collect::<Vec<_>>(),
            ["/aws/lambda/billing-api"]
        );
        assert_eq!(screen.groups().cell(1, 0).map(|cell| cell.text.as_str()), Some("●"));
        assert_eq!(screen.results().title(), "Results (2)");
        assert_eq!(screen.results().headings(), vec!["@timestamp", "@message"]);
    }

    #[tokio::test(start_paused = true)]
    async fn table_scan_fills_dynamic_columns() {
        let (mut app, mut rx) = catalog_app();
        assert!(app.open_page_id("dynamodb"));
        settle(&mut app, &mut rx, Duration::from_millis(300)).await;
        app.apply_action(Action::Down);
        app.apply_action(Action::Submit);
        settle(&mut app, &mut rx, Duration::from_millis(300)).await;

        let items = resource(&app).secondary();
        assert_eq!(items.title(), "Items (2)");
        assert_eq!(items.headings(), vec!["pk", "total", "note"]);
        assert_eq!(items.reference(2, 1), None);
    }

    #[tokio::test(start_paused = true)]
    async fn detail_panel_shows_key_values_and_expanded_yaml() {
        let (mut app, mut rx) = catalog_app();
        assert!(app.open_page_id("lambda"));
        settle(&mut app, &mut rx, Duration::from_millis(300)).await;
        app.apply_action(Action::Down);
        app.apply_action(Action::Submit);
        settle(&mut app, &mut rx, Duration::from_millis(300)).await;

        let detail = resource(&app).secondary();
        assert_eq!(detail.title(), "Configuration");
        let keys = detail
            .rows()
            .iter()
            .filter_map(|row| row.first().map(|cell| cell.text.clone()))
            .collect::<Vec<_>>();
        assert!(keys.contains(&"environment".to_string()), "{keys:?}");

        let row = keys.iter().position(|key| key == "environment").expect("row");
        while resource(&app).secondary().selected().0 < row {
            app.apply_action(Action::Down);
        }
        assert!(resource(&app).expanded().text().contains("STAGE: prod"));
    }

    #[tokio::test(start_paused = true)]
    async fn escape_returns_to_selector_and_pages_cycle() {
        let (mut app, mut rx) = catalog_app();
        assert!(app.open_page_id("s3"));
        settle(&mut app, &mut rx, Duration::from_millis(300)).await;
        assert_eq!(app.pages().paginator(), "5/9");

        app.apply_action(Action::NextPage);
        assert_eq!(app.pages().current_name(), "dynamodb");
        app.apply_action(Action::PrevPage);
        app.apply_action(Action::PrevPage);
        assert_eq!(app.pages().paginator(), "4/9");

        app.apply_action(Action::ToSelector);
        assert_eq!(app.body(), Body::Selector);
        type_text(&mut app, "log");
        app.apply_action(Action::Cancel);
        assert_eq!(app.selector().input().value(), "");

        app.apply_action(Action::Quit);
        assert!(!app.running());
    }

    #[tokio::test(start_paused = true)]
    async fn clicks_move_focus_through_the_ring() {
        let (mut app, mut rx) = catalog_app();
        assert!(app.open_page_id("lambda"));
        settle(&mut app, &mut rx, Duration::from_millis(300)).await;
        let page = app.current_page();
        if let Some(screen) = app.resource_mut(page) {
            let areas = screen.areas_mut();
            areas.record(Slot::Search, ratatui::layout::Rect::new(0, 1, 80, 3));
            areas.record(Slot::Secondary, ratatui::layout::Rect::new(0, 20, 80, 10));
        }
        app.click(5, 22);
        assert_eq!(resource(&app).focused(), Slot::Secondary);
        app.apply_action(Action::FocusNext);
        assert_eq!(resource(&app).focused(), Slot::Expanded);
        app.click(5, 2);
        assert_eq!(resource(&app).focused(), Slot::Search);
    }
}
