mod aggregate;
mod api;
mod app;
mod catalog;
mod cli;
mod config;
mod input;
mod model;
mod quantity;
mod refresh;
mod status;
mod ui;

use anyhow::{Context, Result};
use api::{ApiGateway, PodSource};
use app::{App, AppCommand};
use clap::Parser;
use cli::CliArgs;
use config::Settings;
use crossterm::event::{
    Event, EventStream, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
    supports_keyboard_enhancement,
};
use futures::StreamExt;
use model::{NamespaceDescriptor, NamespaceScope, PodRecord};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::fs::OpenOptions;
use std::io::{self, Stdout};
use std::path::Path;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval, interval_at};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;
const PULSE_INTERVAL: Duration = Duration::from_millis(600);
const IDLE_TICK: Duration = Duration::from_secs(3600);

enum FetchEvent {
    Pods(Result<Vec<PodRecord>>),
    Namespaces(Result<Vec<NamespaceDescriptor>>),
    Detail {
        namespace: String,
        name: String,
        result: Result<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(&args.log_filter, args.log_file.as_deref())?;

    let settings = Settings::load(&args)?;
    info!(
        "starting server={} scope={} config={}",
        settings.server,
        settings.scope,
        settings.source.as_deref().unwrap_or("none")
    );
    let gateway = ApiGateway::new(&settings.server, settings.request_timeout)?;

    let mut app = App::new(
        gateway.server().to_string(),
        settings.scope.clone(),
        settings.refresh_interval,
    );

    run(&mut app, &gateway).await
}

fn init_tracing(level_filter: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_new(level_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .compact();

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            let _ = builder.with_writer(Mutex::new(file)).try_init();
        }
        None => {
            let _ = builder.with_writer(io::sink).try_init();
        }
    }

    Ok(())
}

async fn run(app: &mut App, gateway: &ApiGateway) -> Result<()> {
    let (mut terminal, keyboard_enhanced) = init_terminal()?;
    let run_result = run_loop(&mut terminal, app, gateway).await;
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
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )
        .context("failed to enter alternate screen with keyboard enhancement")?;
    } else {
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
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
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

async fn run_loop(terminal: &mut TuiTerminal, app: &mut App, gateway: &ApiGateway) -> Result<()> {
    let (fetch_tx, mut fetch_rx) = mpsc::unbounded_channel::<FetchEvent>();

    spawn_catalog_load(gateway, &fetch_tx);
    let scope = app.scope().clone();
    start_pod_refresh(app, gateway, scope, &fetch_tx);

    let mut reader = EventStream::new();
    let auto_refresh = app.refresh_interval().is_some();
    let period = app.refresh_interval().unwrap_or(IDLE_TICK);
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut pulse = interval(PULSE_INTERVAL);
    pulse.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
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
                        if let Some(action) = input::map_key(key) {
                            debug!("action={action:?}");
                            let command = app.apply_action(action);
                            execute_app_command(app, gateway, command, &fetch_tx);
                        }
                    }
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
            _ = ticker.tick(), if auto_refresh => {
                let command = app.tick_refresh();
                execute_app_command(app, gateway, command, &fetch_tx);
            }
            _ = pulse.tick() => {
                app.advance_pulse();
            }
            maybe_fetch = fetch_rx.recv() => {
                let Some(event) = maybe_fetch else {
                    break;
                };
                match event {
                    FetchEvent::Pods(result) => {
                        let command = app.finish_refresh(result);
                        execute_app_command(app, gateway, command, &fetch_tx);
                    }
                    FetchEvent::Namespaces(result) => app.finish_catalog(result),
                    FetchEvent::Detail { namespace, name, result } => {
                        app.finish_detail(&namespace, &name, result);
                    }
                }
            }
        }
    }

    Ok(())
}

fn execute_app_command(
    app: &mut App,
    gateway: &ApiGateway,
    command: AppCommand,
    fetch_tx: &mpsc::UnboundedSender<FetchEvent>,
) {
    match command {
        AppCommand::None => {}
        AppCommand::RefreshPods { scope } => start_pod_refresh(app, gateway, scope, fetch_tx),
        AppCommand::LoadDetail { namespace, name } => {
            debug!("manifest fetch started {namespace}/{name}");
            let gateway = gateway.clone();
            let fetch_tx = fetch_tx.clone();
            tokio::spawn(async move {
                let result = gateway.fetch_descriptor(&namespace, &name).await;
                let _ = fetch_tx.send(FetchEvent::Detail {
                    namespace,
                    name,
                    result,
                });
            });
        }
    }
}

fn start_pod_refresh(
    app: &mut App,
    gateway: &ApiGateway,
    scope: NamespaceScope,
    fetch_tx: &mpsc::UnboundedSender<FetchEvent>,
) {
    app.begin_refresh(&scope);
    let gateway = gateway.clone();
    let fetch_tx = fetch_tx.clone();
    tokio::spawn(async move {
        let result = gateway.list_pods(&scope).await;
        let _ = fetch_tx.send(FetchEvent::Pods(result));
    });
}

fn spawn_catalog_load(gateway: &ApiGateway, fetch_tx: &mpsc::UnboundedSender<FetchEvent>) {
    let gateway = gateway.clone();
    let fetch_tx = fetch_tx.clone();
    tokio::spawn(async move {
        let result = gateway.list_namespaces().await;
        let _ = fetch_tx.send(FetchEvent::Namespaces(result));
    });
}
