use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap};

use crate::app::{App, Body, Page};
use crate::input::KeyContext;
use crate::query::QueryScreen;
use crate::screen::{Areas, ResourceScreen, ScreenState, Slot};
use crate::table::{HeadingStyle, SelectMode, TableModel, Tone};
use crate::theme::{self, palette};
use crate::widgets::{TextInput, TextPanel, Titled};

const WARN: Color = Color::Rgb(251, 191, 36);
const ERROR: Color = Color::Rgb(248, 113, 113);
const PL_A: Color = Color::Rgb(17, 94, 89);
const PL_B: Color = Color::Rgb(30, 64, 175);
const PL_C: Color = Color::Rgb(55, 48, 163);
const PL_E: Color = Color::Rgb(13, 148, 136);
const YAML_KEY: Color = Color::Rgb(103, 232, 249);

pub fn render(frame: &mut Frame, app: &mut App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, root[0], app);
    render_body(frame, root[1], app);
    render_footer(frame, root[2], app);
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let base = palette();
    let left_line = build_left_header_line(app);
    let right_line = build_right_header_line(app);
    let right_width = spans_width(&right_line.spans) as u16;
    if area.width < 42 || right_width == 0 || right_width >= area.width {
        frame.render_widget(
            Paragraph::new(left_line).style(Style::default().bg(base.background).fg(Color::White)),
            area,
        );
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(right_width)])
        .split(area);
    frame.render_widget(
        Paragraph::new(left_line).style(Style::default().bg(base.background).fg(Color::White)),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(right_line).style(Style::default().bg(base.background)),
        chunks[1],
    );
}

fn build_left_header_line(app: &App) -> Line<'static> {
    let base = palette();
    let (page_label, page_bg) = match app.body() {
        Body::Selector => (" select ".to_string(), PL_B),
        Body::Pages => (
            format!(" {} ", compact_text(app.pages().current_name(), 18)),
            app.accent(app.current_page()),
        ),
    };
    let context = format!(
        " {} · {} ",
        compact_text(app.region(), 20),
        compact_text(app.profile(), 20)
    );

    let mut spans = Vec::new();
    push_powerline_segment(&mut spans, " nimbus ", Color::Black, PL_E, page_bg);
    push_powerline_segment(&mut spans, page_label, Color::Black, page_bg, PL_C);
    push_powerline_segment(&mut spans, context, Color::White, PL_C, base.background);
    Line::from(spans)
}

fn build_right_header_line(app: &App) -> Line<'static> {
    let base = palette();
    let state = match app.body() {
        Body::Selector => ScreenState::Idle,
        Body::Pages => app
            .page(app.current_page())
            .map_or(ScreenState::Idle, Page::state),
    };
    let (state_fg, state_bg) = match state {
        ScreenState::Idle => (Color::White, PL_A),
        ScreenState::Loading => (Color::Black, WARN),
        ScreenState::TimedOut => (Color::Black, ERROR),
    };

    let mut spans = Vec::new();
    push_powerline_segment_rtl(
        &mut spans,
        format!(" {} ", app.pages().paginator()),
        Color::White,
        PL_B,
        base.background,
    );
    push_powerline_segment_rtl(
        &mut spans,
        format!(" {} ", state.label()),
        state_fg,
        state_bg,
        PL_B,
    );
    spans.push(Span::styled(" ", Style::default().bg(state_bg)));
    Line::from(spans)
}

fn render_body(frame: &mut Frame, area: Rect, app: &mut App) {
    if app.body() == Body::Selector {
        render_selector(frame, area, app);
        return;
    }

    let index = app.current_page();
    let _accent = theme::push_accent(app.accent(index));
    match app.page_mut(index) {
        Some(Page::Resource(screen)) => render_resource(frame, area, screen),
        Some(Page::Query(screen)) => render_query(frame, area, screen),
        Some(Page::Log(log)) => {
            log.areas_mut().clear();
            log.areas_mut().record(Slot::Log, area);
            render_text(frame, area, log.panel(), true, false);
        }
        None => {}
    }
}

fn render_selector(frame: &mut Frame, area: Rect, app: &App) {
    let base = palette();
    let boxed = centered_rect(60, 70, area);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(boxed);

    let selector = app.selector();
    render_input(frame, chunks[0], selector.input(), true);

    let lines = selector
        .candidates()
        .into_iter()
        .enumerate()
        .map(|(index, (id, title))| {
            let selected = index == selector.cursor();
            let marker = if selected { "▶ " } else { "  " };
            let style = if selected {
                Style::default()
                    .fg(base.tertiary)
                    .bg(base.more_contrast_background)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(base.primary_text)
            };
            Line::from(vec![
                Span::styled(format!("{marker}{title:<16}"), style),
                Span::styled(format!(" {id}"), Style::default().fg(base.secondary_text)),
            ])
        })
        .collect::<Vec<_>>();
    let list = Paragraph::new(Text::from(lines)).block(
        Block::default()
            .title(format!("Services · {}", app.origin()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(base.secondary_text))
            .style(Style::default().bg(base.contrast_background)),
    );
    frame.render_widget(list, chunks[1]);
}

fn render_resource(frame: &mut Frame, area: Rect, screen: &mut ResourceScreen) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(rows[1]);
    let panes = Layout::default()
        .direction(Direction::Vertical)
        .constraints(screen.panes().constraints())
        .split(columns[0]);

    let focused = screen.focused();
    record_areas(
        screen.areas_mut(),
        &[
            (Slot::Search, rows[0]),
            (Slot::Primary, panes[0]),
            (Slot::Secondary, panes[1]),
            (Slot::Expanded, columns[1]),
        ],
    );

    render_input(frame, rows[0], screen.search(), focused == Slot::Search);
    render_table(frame, panes[0], screen.primary_mut(), focused == Slot::Primary);
    render_table(frame, panes[1], screen.secondary_mut(), focused == Slot::Secondary);
    render_text(frame, columns[1], screen.expanded(), focused == Slot::Expanded, true);
}

fn render_query(frame: &mut Frame, area: Rect, screen: &mut QueryScreen) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(screen.panes().constraints())
        .split(rows[1]);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Fill(3),
            Constraint::Fill(1),
        ])
        .split(columns[1]);
    let window = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(right[0]);

    let focused = screen.focused();
    record_areas(
        screen.areas_mut(),
        &[
            (Slot::Search, rows[0]),
            (Slot::Primary, columns[0]),
            (Slot::Start, window[0]),
            (Slot::End, window[1]),
            (Slot::QueryText, right[1]),
            (Slot::Results, right[2]),
            (Slot::Expanded, right[3]),
        ],
    );

    render_input(frame, rows[0], screen.search(), focused == Slot::Search);
    render_table(frame, columns[0], screen.groups_mut(), focused == Slot::Primary);
    render_input(frame, window[0], screen.start(), focused == Slot::Start);
    render_input(frame, window[1], screen.end(), focused == Slot::End);
    render_input(frame, right[1], screen.text(), focused == Slot::QueryText);
    render_table(frame, right[2], screen.results_mut(), focused == Slot::Results);
    render_text(frame, right[3], screen.expanded(), focused == Slot::Expanded, true);
}

fn record_areas(areas: &mut Areas, rects: &[(Slot, Rect)]) {
    areas.clear();
    for (slot, rect) in rects {
        areas.record(*slot, *rect);
    }
}

fn panel_block(title: &str, focused: bool) -> Block<'static> {
    let base = palette();
    Block::default()
        .title(Span::styled(
            title.to_string(),
            Style::default().fg(base.title).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(if focused {
            Style::default().fg(base.tertiary)
        } else {
            Style::default().fg(base.secondary_text)
        })
        .style(Style::default().bg(base.contrast_background))
}

fn render_input(frame: &mut Frame, area: Rect, input: &TextInput, focused: bool) {
    let base = palette();
    let paragraph = Paragraph::new(input.value().to_string())
        .style(Style::default().fg(base.primary_text))
        .block(panel_block(input.title(), focused));
    frame.render_widget(paragraph, area);

    if focused && area.width > 2 && area.height > 2 {
        let max_x = area.x + area.width - 2;
        let x = (area.x + 1).saturating_add(input.cursor() as u16).min(max_x);
        frame.set_cursor_position((x, area.y + 1));
    }
}

fn render_text(frame: &mut Frame, area: Rect, panel: &TextPanel, focused: bool, structured: bool) {
    let base = palette();
    let text = if structured {
        highlight_yaml_text(panel.text())
    } else {
        Text::from(panel.text().to_string())
    };
    let paragraph = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .scroll((panel.scroll(), 0))
        .style(Style::default().fg(base.primary_text))
        .block(panel_block(panel.title(), focused));
    frame.render_widget(paragraph, area);
}

fn render_table(frame: &mut Frame, area: Rect, table: &mut TableModel, focused: bool) {
    let base = palette();
    let block = panel_block(table.title(), focused);
    let heading_rows = usize::from(table.heading_style() == HeadingStyle::TopRow);
    let height = table_rows_visible(area, heading_rows);
    let offset = table.visible_offset(height);
    let selected = table.selected();
    let mode = table.select_mode();
    let selected_row = table.selected_row();

    let cell_style = |row: usize, column: usize, heading: bool, tone: Tone| {
        let mut style = if heading {
            Style::default()
                .fg(base.secondary_text)
                .add_modifier(Modifier::BOLD)
        } else if tone == Tone::Tertiary {
            Style::default().fg(base.tertiary).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(base.primary_text)
        };
        let is_selected = match mode {
            SelectMode::Rows => selected_row == Some(row),
            SelectMode::Cells => selected_row == Some(row) && selected.1 == column,
            SelectMode::None => false,
        };
        if is_selected {
            style = style.bg(base.more_contrast_background);
            if focused {
                style = style.add_modifier(Modifier::REVERSED);
            }
        }
        style
    };

    let body = table.body_rows();
    let rows = table
        .rows()
        .iter()
        .enumerate()
        .skip(body.start + offset)
        .take(height)
        .map(|(row, cells)| {
            Row::new(cells.iter().enumerate().map(|(column, cell)| {
                Cell::from(cell.text.clone()).style(cell_style(row, column, cell.heading, cell.tone))
            }))
        })
        .collect::<Vec<_>>();

    let constraints = column_constraints(table);
    let mut widget = Table::new(rows, constraints)
        .block(block)
        .column_spacing(1);
    if heading_rows == 1 && table.column_count() > 0 {
        let header = Row::new(table.headings().into_iter().map(|heading| {
            Cell::from(heading.to_string()).style(
                Style::default()
                    .fg(base.secondary_text)
                    .bg(base.contrast_background)
                    .add_modifier(Modifier::BOLD),
            )
        }))
        .height(1);
        widget = widget.header(header);
    }
    frame.render_widget(widget, area);

    if table.body_len() == 0 && area.height > 3 {
        let inner = Rect {
            x: area.x + 1,
            y: area.y + 1 + heading_rows as u16,
            width: area.width.saturating_sub(2),
            height: 1,
        };
        frame.render_widget(
            Paragraph::new("nothing to show")
                .alignment(Alignment::Center)
                .style(Style::default().fg(base.secondary_text)),
            inner,
        );
    }
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let base = palette();
    let status = app.status().to_string();
    let mut spans = Vec::new();
    let status_width = area.width.saturating_sub(24).min(120) as usize;
    push_powerline_segment(
        &mut spans,
        format!(" {} ", compact_text(&status, status_width.max(8))),
        Color::White,
        PL_B,
        base.background,
    );
    spans.push(Span::styled(
        format!(" {}", key_hints(app.key_context())),
        Style::default().fg(base.secondary_text),
    ));
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(base.background)),
        area,
    );
}

fn key_hints(context: KeyContext) -> &'static str {
    match context {
        KeyContext::Selector => "type to filter · Tab complete · Enter open · Ctrl-H/L pages · Ctrl-C quit",
        KeyContext::TextInput => "Enter submit · Esc clear/back · Ctrl-J/K focus · Ctrl-C quit",
        KeyContext::Table => {
            "j/k move · Enter open · r refresh · Ctrl-R force · Ctrl-N more · n/N match · Esc back · q quit"
        }
        KeyContext::Text => "j/k scroll · g/G top/end · Ctrl-J/K focus · Esc back · q quit",
    }
}

fn highlight_yaml_text(input: &str) -> Text<'static> {
    let lines = input
        .lines()
        .map(highlight_yaml_line)
        .collect::<Vec<Line<'static>>>();
    Text::from(lines)
}

fn highlight_yaml_line(line: &str) -> Line<'static> {
    let base = palette();
    let indent_len = line
        .as_bytes()
        .iter()
        .take_while(|byte| **byte == b' ' || **byte == b'\t')
        .count();
    let indent = &line[..indent_len];
    let trimmed = &line[indent_len..];

    let mut spans = vec![Span::raw(indent.to_string())];
    if trimmed.is_empty() {
        return Line::from(spans);
    }

    if let Some(rest) = trimmed.strip_prefix("- ") {
        spans.push(Span::styled("- ", Style::default().fg(base.tertiary)));
        spans.extend(highlight_yaml_content(rest));
        return Line::from(spans);
    }

    spans.extend(highlight_yaml_content(trimmed));
    Line::from(spans)
}

fn highlight_yaml_content(content: &str) -> Vec<Span<'static>> {
    let base = palette();
    if let Some((key, value)) = split_yaml_key_value(content) {
        let mut spans = vec![
            Span::styled(key.to_string(), Style::default().fg(YAML_KEY)),
            Span::styled(":", Style::default().fg(base.secondary_text)),
        ];

        if value.trim().is_empty() {
            return spans;
        }

        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            value.trim_start().to_string(),
            Style::default().fg(yaml_value_color(value.trim())),
        ));
        spans
    } else {
        vec![Span::styled(
            content.to_string(),
            Style::default().fg(base.primary_text),
        )]
    }
}

fn split_yaml_key_value(content: &str) -> Option<(&str, &str)> {
    let (key, value) = content.split_once(':')?;
    let key = key.trim_end();
    if key.is_empty() || key.contains(' ') {
        return None;
    }
    if !value.is_empty() && !value.starts_with(' ') {
        return None;
    }
    Some((key, value))
}

fn yaml_value_color(value: &str) -> Color {
    if value.starts_with('"') || value.starts_with('\'') {
        Color::Rgb(125, 211, 252)
    } else if matches!(value, "true" | "false" | "null" | "~") {
        WARN
    } else if value.parse::<f64>().is_ok() {
        Color::Rgb(251, 146, 60)
    } else if value.starts_with('{') || value.starts_with('[') {
        palette().secondary_text
    } else {
        Color::Rgb(147, 197, 253)
    }
}

fn push_powerline_segment(
    spans: &mut Vec<Span<'static>>,
    content: impl Into<String>,
    fg: Color,
    bg: Color,
    next_bg: Color,
) {
    spans.push(Span::styled(
        content.into(),
        Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled("", Style::default().fg(bg).bg(next_bg)));
}

fn push_powerline_segment_rtl(
    spans: &mut Vec<Span<'static>>,
    content: impl Into<String>,
    fg: Color,
    bg: Color,
    next_bg: Color,
) {
    spans.push(Span::styled("", Style::default().fg(bg).bg(next_bg)));
    spans.push(Span::styled(
        content.into(),
        Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD),
    ));
}

fn spans_width(spans: &[Span<'_>]) -> usize {
    spans.iter().map(|span| span.content.chars().count()).sum()
}

fn table_rows_visible(area: Rect, heading_rows: usize) -> usize {
    (area.height.saturating_sub(2) as usize)
        .saturating_sub(heading_rows)
        .max(1)
}

fn compact_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }

    if max_chars <= 1 {
        return "…".to_string();
    }

    let mut out = value
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    out.push('…');
    out
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

const MARKER_WIDTH: usize = 4;
const FITTED_WIDTH: usize = 24;

fn column_width(table: &TableModel, column: usize) -> usize {
    table
        .rows()
        .iter()
        .filter_map(|row| row.get(column))
        .map(|cell| cell.text.chars().count())
        .max()
        .unwrap_or(0)
}

/// Key/value tables size the key column to its longest heading. Other tables
/// give the first column a double share and fit short columns to their
/// content; long columns share what is left.
fn column_constraints(table: &TableModel) -> Vec<Constraint> {
    let columns = table.column_count();
    if columns == 0 {
        return vec![Constraint::Percentage(100)];
    }

    if table.heading_style() == HeadingStyle::LeftColumn {
        let key_width = table
            .rows()
            .iter()
            .filter_map(|row| row.first())
            .map(|cell| cell.text.chars().count())
            .max()
            .unwrap_or(4)
            .clamp(4, 28) as u16;
        let mut constraints = vec![Constraint::Length(key_width)];
        constraints.extend((1..columns).map(|_| Constraint::Fill(1)));
        return constraints;
    }

    (0..columns)
        .map(|column| {
            let width = column_width(table, column).max(1);
            match column {
                0 if width <= MARKER_WIDTH => Constraint::Length(width as u16),
                0 => Constraint::Fill(2),
                _ if width <= FITTED_WIDTH => Constraint::Length(width as u16),
                _ => Constraint::Fill(1),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        column_constraints, compact_text, highlight_yaml_line, render, split_yaml_key_value,
    };
    use crate::app::{App, AppOptions};
    use crate::catalog::{Catalog, CatalogOptions};
    use crate::input::Action;
    use crate::loader::{UiQueue, drain};
    use crate::table::TableModel;
    use crate::theme::BASE;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use ratatui::layout::Constraint;
    use std::time::Duration;

    fn demo_app() -> (App, crate::loader::UiReceiver<App>) {
        let catalog = Catalog::load(None, CatalogOptions::default()).expect("demo catalog");
        let (queue, rx) = UiQueue::channel();
        (
            App::new(AppOptions::default(), queue, |service| catalog.sources(service)),
            rx,
        )
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn selector_frame_lists_services() {
        let (mut app, _rx) = demo_app();
        let mut terminal = Terminal::new(TestBackend::new(120, 32)).expect("terminal");
        terminal.draw(|frame| render(frame, &mut app)).expect("draw");
        let text = screen_text(&terminal);
        assert!(text.contains("nimbus"));
        assert!(text.contains("Lambda"));
        assert!(text.contains("CloudFormation"));
        assert!(text.contains("1/9"));
    }

    #[tokio::test(start_paused = true)]
    async fn resource_frame_shows_tables_and_records_click_areas() {
        let (mut app, mut rx) = demo_app();
        assert!(app.open_page_id("lambda"));
        tokio::time::sleep(Duration::from_millis(300)).await;
        drain(&mut rx, &mut app);

        let mut terminal = Terminal::new(TestBackend::new(140, 40)).expect("terminal");
        terminal.draw(|frame| render(frame, &mut app)).expect("draw");
        let text = screen_text(&terminal);
        assert!(text.contains("Functions ("));
        assert!(text.contains("Search"));
        assert!(text.contains("Expanded"));
        assert!(text.contains("idle"));

        app.click(2, 2);
        app.apply_action(Action::InputChar('x'));
        let page = app.current_page();
        let screen = app.resource_mut(page).expect("lambda screen");
        assert_eq!(screen.search().value(), "x");
    }

    fn find_text(terminal: &Terminal<TestBackend>, needle: &str) -> Option<(u16, u16)> {
        let buffer = terminal.backend().buffer();
        let chars = needle.chars().map(String::from).collect::<Vec<_>>();
        let width = chars.len() as u16;
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width.saturating_sub(width) {
                let hit = chars
                    .iter()
                    .enumerate()
                    .all(|(offset, ch)| buffer[(x + offset as u16, y)].symbol() == ch);
                if hit {
                    return Some((x, y));
                }
            }
        }
        None
    }

    #[tokio::test(start_paused = true)]
    async fn table_headings_use_muted_text_on_contrast_background() {
        let (mut app, mut rx) = demo_app();
        assert!(app.open_page_id("lambda"));
        tokio::time::sleep(Duration::from_millis(300)).await;
        drain(&mut rx, &mut app);

        let mut terminal = Terminal::new(TestBackend::new(140, 40)).expect("terminal");
        terminal.draw(|frame| render(frame, &mut app)).expect("draw");
        let (x, y) = find_text(&terminal, "Runtime").expect("runtime heading");
        let cell = &terminal.backend().buffer()[(x, y)];
        assert_eq!(cell.fg, BASE.secondary_text);
        assert_eq!(cell.bg, BASE.contrast_background);
    }

    #[test]
    fn first_column_takes_double_share_and_short_columns_fit() {
        let mut table = TableModel::new("Functions");
        table.init_selectable(
            "Functions",
            &["Name", "Runtime", "Description"],
            vec![vec![
                "billing-api".to_string(),
                "python3.12".to_string(),
                "settles invoices for every tenant nightly".to_string(),
            ]],
            &[0],
        );
        assert_eq!(
            column_constraints(&table),
            vec![Constraint::Fill(2), Constraint::Length(10), Constraint::Fill(1)]
        );

        let mut groups = TableModel::new("Log groups");
        groups.init_selectable(
            "Log groups",
            &["Use", "Log group", "Retention"],
            vec![vec!["●".to_string(), "/ecs/checkout".to_string(), "30".to_string()]],
            &[1],
        );
        assert_eq!(
            column_constraints(&groups),
            vec![Constraint::Length(3), Constraint::Length(13), Constraint::Length(9)]
        );
    }

    #[test]
    fn yaml_lines_split_keys_from_values() {
        assert_eq!(split_yaml_key_value("name: orders"), Some(("name", " orders")));
        assert_eq!(split_yaml_key_value("url: http://x"), Some(("url", " http://x")));
        assert_eq!(split_yaml_key_value("http://x"), None);
        assert_eq!(split_yaml_key_value("two words: x"), None);

        let line = highlight_yaml_line("  - timeout: 30");
        let rendered = line
            .spans
            .iter()
            .map(|span| span.content.as_ref())
            .collect::<String>();
        assert_eq!(rendered, "  - timeout: 30");
    }

    #[test]
    fn compact_text_clamps_with_ellipsis() {
        assert_eq!(compact_text("eu-west-1", 20), "eu-west-1");
        assert_eq!(compact_text("a-very-long-profile", 6), "a-ver…");
        assert_eq!(compact_text("abc", 1), "…");
    }
}
