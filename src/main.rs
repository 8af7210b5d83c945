use dpw::api::parser::ProvisionRequest;
use dpw::api::StatusClient;
use dpw::app::AppState;
use dpw::cli::{self, Cli, Command};
use dpw::events::{AppEvent, EventHandler};
use dpw::input::{self, Action, InputContext};
use dpw::notify;
use dpw::session::PollingSession;
use dpw::tui;

use clap::Parser;
use color_eyre::eyre::{eyre, Result};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn setup_verbose_logging() -> Result<()> {
    let state_dir = state_dir_or_fallback();
    std::fs::create_dir_all(&state_dir)
        .map_err(|e| eyre!("Failed to create log directory {state_dir:?}: {e}"))?;
    let log_path = state_dir.join("debug.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| eyre!("Failed to open log file {log_path:?}: {e}"))?;
    tracing_subscriber::fmt()
        .with_writer(file)
        .with_ansi(false)
        .init();
    tracing::info!(
        "dpw v{} starting with verbose logging",
        env!("CARGO_PKG_VERSION")
    );
    Ok(())
}

fn state_dir_or_fallback() -> std::path::PathBuf {
    if let Some(state) = std::env::var_os("XDG_STATE_HOME") {
        std::path::PathBuf::from(state).join("dpw")
    } else if let Some(home) = std::env::var_os("HOME") {
        std::path::PathBuf::from(home)
            .join(".local")
            .join("state")
            .join("dpw")
    } else {
        std::env::temp_dir().join("dpw")
    }
}

async fn open_in_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    let opener = "open";
    #[cfg(not(target_os = "macos"))]
    let opener = "xdg-open";

    let status = tokio::process::Command::new(opener)
        .arg(url)
        .status()
        .await
        .map_err(|e| eyre!("failed to run {opener}: {e}"))?;
    if !status.success() {
        return Err(eyre!("{opener} exited with {status}"));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    if args.verbose {
        setup_verbose_logging()?;
    }

    let client = match StatusClient::new(&args.base_url, args.token.clone()) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let (project_id, pipeline_id, pipeline_url) = match &args.command {
        Command::Watch {
            project_id,
            pipeline_id,
        } => (*project_id, *pipeline_id, None),
        Command::Submit {
            choice,
            title,
            desc,
            subnet,
            flavor,
            cloud_project_id,
        } => {
            if let Err(e) = cli::validate_subnet(subnet) {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
            if let Err(e) = cli::validate_flavor(flavor) {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
            let request = ProvisionRequest {
                choice: choice.clone(),
                title: title.clone(),
                desc: desc.clone(),
                subnet: subnet.clone(),
                flavor: flavor.clone(),
                cloud_project_id: cloud_project_id.clone(),
            };
            match client.submit(&request).await {
                Ok(receipt) => {
                    println!(
                        "Provisioning accepted: project {} pipeline {}",
                        receipt.project_id, receipt.pipeline_id
                    );
                    (receipt.project_id, receipt.pipeline_id, receipt.pipeline_url)
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }
    };

    let mut state = AppState::new(project_id, pipeline_id);
    state.pipeline_url = pipeline_url;
    state.desktop_notify = !args.no_notify;

    // Setup terminal with panic hook
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = terminal::disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let events = EventHandler::new(Duration::from_millis(100));
    let tx = events.sender();

    let session = PollingSession::spawn(
        client,
        project_id,
        pipeline_id,
        args.flow.poll_config(),
        tx.clone(),
    );

    let result = run_app(&mut terminal, &mut state, events, &tx, &session).await;

    session.stop();

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
    mut events: EventHandler,
    tx: &tokio::sync::mpsc::UnboundedSender<AppEvent>,
    session: &PollingSession,
) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| tui::render::render(f, state))?;

        // Countdown to the next poll
        if let Some(last) = state.last_poll {
            if !state.is_finished() {
                let elapsed = last.elapsed().as_secs();
                state.next_poll_in = state.poll_delay_ms.div_ceil(1000).saturating_sub(elapsed);
            }
        }
        state.prune_error();

        if let Some(event) = events.next().await {
            match event {
                AppEvent::Key(key) => {
                    let ctx = InputContext {
                        has_error: state.error_message().is_some(),
                        is_loading: state.is_loading,
                        is_finished: state.is_finished(),
                    };
                    match input::map_key(key, &ctx) {
                        Action::Quit => state.should_quit = true,
                        Action::DismissError => state.clear_error(),
                        Action::Refresh => {
                            state.is_loading = true;
                            session.poll_now();
                        }
                        Action::OpenBrowser => {
                            if let Some(url) = state.pipeline_url.clone() {
                                let tx2 = tx.clone();
                                tokio::spawn(async move {
                                    if let Err(e) = open_in_browser(&url).await {
                                        let _ = tx2.send(AppEvent::Error(format!("{e}")));
                                    }
                                });
                            } else {
                                state.set_error("No pipeline URL yet".to_string());
                            }
                        }
                        Action::None => {}
                    }
                }
                AppEvent::Tick => {
                    if last_tick.elapsed() >= Duration::from_millis(100) {
                        state.advance_spinner();
                        last_tick = Instant::now();
                    }
                }
                AppEvent::Snapshot {
                    snapshot,
                    next_delay_ms,
                } => {
                    state.apply_snapshot(&snapshot, next_delay_ms);
                }
                AppEvent::Finished { outcome, summary } => {
                    state.finish(outcome, summary);
                    if state.desktop_notify {
                        notify::send_desktop(outcome, state.closing_summary.as_deref());
                    }
                }
                AppEvent::StatusUnavailable { message } => {
                    state.set_unavailable(message);
                }
                AppEvent::Error(e) => {
                    state.is_loading = false;
                    state.set_error(e);
                }
            }
        }

        if state.should_quit {
            return Ok(());
        }
    }
}
