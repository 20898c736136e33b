mod app;
mod catalog;
mod cli;
mod config;
mod focus;
mod input;
mod loader;
mod logsink;
mod model;
mod pages;
mod provider;
mod query;
mod screen;
mod search;
mod selector;
mod table;
mod theme;
mod ui;
mod widgets;

use anyhow::{Context, Result};
use app::{App, AppOptions};
use catalog::{Catalog, CatalogOptions};
use clap::Parser;
use cli::CliArgs;
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyEventKind,
    KeyboardEnhancementFlags, MouseButton, MouseEventKind, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
    supports_keyboard_enhancement,
};
use futures::StreamExt;
use loader::{UiQueue, UiReceiver, drain};
use logsink::LogSink;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    let log = LogSink::default();
    init_tracing(&args.log_filter, log.clone())?;

    let settings = config::load_settings(&args)?;
    let catalog = Catalog::load(
        settings.catalog.as_deref(),
        CatalogOptions {
            page_size: settings.page_size,
            latency: settings.latency,
            region: Some(settings.region.clone()),
            profile: Some(settings.profile.clone()),
        },
    )?;
    info!(
        catalog = catalog.origin(),
        config = settings.source.as_deref().unwrap_or("none"),
        region = settings.region.as_str(),
        profile = settings.profile.as_str(),
        "starting nimbus"
    );

    let (queue, rx) = UiQueue::channel();
    let options = AppOptions {
        region: settings.region.clone(),
        profile: settings.profile.clone(),
        origin: catalog.origin().to_string(),
        timeout: settings.timeout,
        accents: settings.accents.clone(),
        log,
    };
    let mut app = App::new(options, queue, |service| catalog.sources(service));
    if let Some(service) = settings.service {
        app.open_page_id(service.id());
    }

    run(&mut app, rx).await
}

fn init_tracing(level_filter: &str, sink: LogSink) -> Result<()> {
    let filter = EnvFilter::try_new(level_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .compact()
        .with_writer(sink)
        .try_init();

    Ok(())
}

async fn run(app: &mut App, rx: UiReceiver<App>) -> Result<()> {
    let (mut terminal, keyboard_enhanced) = init_terminal()?;
    let run_result = run_loop(&mut terminal, app, rx).await;
    let restore_result = restore_terminal(&mut terminal, keyboard_enhanced);

    match (run_result, restore_result) {
        (Err(run_error), Err(restore_error)) => Err(anyhow::anyhow!(
            "{run_error:#}\nterminal restore error: {restore_error:#}"
        )),
        (Err(error), _) => Err(error),
        (_, Err(error)) => Err(error),
        (Ok(()), Ok(())) => Ok(()),
    }
}

fn init_terminal() -> Result<(TuiTerminal, bool)> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    let keyboard_enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    if keyboard_enhanced {
        execute!(
            stdout,
            EnterAlternateScreen,
            EnableMouseCapture,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_ALTERNATE_KEYS
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )
        .context("failed to enter alternate screen with keyboard enhancement")?;
    } else {
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
            .context("failed to enter alternate screen")?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().context("failed to clear terminal")?;
    Ok((terminal, keyboard_enhanced))
}

fn restore_terminal(terminal: &mut TuiTerminal, keyboard_enhanced: bool) -> Result<()> {
    if keyboard_enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)
            .context("failed to pop keyboard enhancement flags")?;
    }
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )
    .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

/// Render-thread loop: every widget mutation, queued or key-driven, happens
/// here between two frames.
async fn run_loop(
    terminal: &mut TuiTerminal,
    app: &mut App,
    mut rx: UiReceiver<App>,
) -> Result<()> {
    let mut reader = EventStream::new();

    loop {
        drain(&mut rx, app);
        app.before_draw();
        terminal
            .draw(|frame| ui::render(frame, app))
            .context("failed to render terminal frame")?;

        if !app.running() {
            break;
        }

        tokio::select! {
            maybe_event = reader.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        if let Some(action) = input::map_key(app.key_context(), key) {
                            debug!("action={action:?}");
                            app.apply_action(action);
                        }
                    }
                    Some(Ok(Event::Mouse(mouse))) => {
                        if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
                            app.click(mouse.column, mouse.row);
                        }
                    }
                    Some(Ok(Event::Resize(_, _))) => {}
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        app.set_status(format!("terminal event error: {error}"));
                    }
                    None => {
                        app.set_status("terminal event stream closed");
                        break;
                    }
                }
            }
            maybe_update = rx.recv() => {
                match maybe_update {
                    Some(update) => update(app),
                    None => break,
                }
            }
        }
    }

    Ok(())
}
