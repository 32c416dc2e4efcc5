use std::{
    io::{self, BufRead},
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};

use anyhow::{bail, Result};
use clap::Parser;
use client_core::FilterState;
use crossbeam_channel::{select, Receiver, RecvTimeoutError, Sender};
use tracing_subscriber::EnvFilter;

mod backend_bridge;
mod config;
mod controller;
mod ui;

use backend_bridge::commands::BackendCommand;
use config::load_settings;
use controller::{
    commands::{parse_command, UserCommand, HELP},
    events::UiEvent,
    orchestration::dispatch_backend_command,
};
use ui::{DashboardView, ViewUpdate};

#[derive(Parser, Debug)]
#[command(name = "crm-dashboard", about = "Terminal dashboard for the CRM customer API")]
struct Args {
    /// Base URL of the API, e.g. http://localhost:8000/api/
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long, default_value = "dashboard.toml")]
    config: PathBuf,
    /// Initial free-text search
    #[arg(long)]
    search: Option<String>,
    /// Load the first page once, print it and exit
    #[arg(long)]
    once: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(&args.config)?;
    if let Some(api_url) = args.api_url {
        settings.api_url = api_url;
    }
    tracing::info!(api_url = %settings.api_url, "starting dashboard");

    let mut initial = FilterState::default();
    if let Some(search) = args.search {
        initial = initial.set_search_text(search);
    }

    let (cmd_tx, cmd_rx) = crossbeam_channel::bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = crossbeam_channel::unbounded::<UiEvent>();
    let mut view = DashboardView::new(initial.clone(), settings.page_size);
    let wait_limit = settings.request_timeout() + Duration::from_secs(2);
    let backend = backend_bridge::runtime::launch(settings, initial, cmd_rx, ui_tx);

    let outcome = if args.once {
        run_once(&ui_rx, &mut view, wait_limit)
    } else {
        run_interactive(&cmd_tx, &ui_rx, &mut view)
    };

    let _ = cmd_tx.send(BackendCommand::Shutdown);
    drop(cmd_tx);
    if backend.join().is_err() {
        tracing::error!("backend worker panicked");
    }
    outcome
}

fn run_once(ui_rx: &Receiver<UiEvent>, view: &mut DashboardView, wait_limit: Duration) -> Result<()> {
    let deadline = Instant::now() + wait_limit;
    while !view.is_settled() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match ui_rx.recv_timeout(remaining) {
            Ok(event) => {
                view.apply(event);
            }
            Err(RecvTimeoutError::Timeout) => bail!("timed out waiting for the CRM API"),
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    print!("{}", view.render());
    if let Some(err) = view.startup_error() {
        bail!("{}", err.summary());
    }
    Ok(())
}

fn run_interactive(
    cmd_tx: &Sender<BackendCommand>,
    ui_rx: &Receiver<UiEvent>,
    view: &mut DashboardView,
) -> Result<()> {
    let line_rx = spawn_stdin_reader();
    println!("{HELP}");

    loop {
        select! {
            recv(line_rx) -> line => {
                let Ok(line) = line else {
                    tracing::debug!("stdin closed");
                    break;
                };
                let command = match parse_command(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(err) => {
                        println!("{err}");
                        continue;
                    }
                };
                let backend_cmd = match command {
                    UserCommand::Apply(action) => BackendCommand::Apply(action),
                    UserCommand::Refresh => BackendCommand::Refresh,
                    UserCommand::Help => {
                        println!("{HELP}");
                        continue;
                    }
                    UserCommand::Quit => break,
                };
                if let Err(status) = dispatch_backend_command(cmd_tx, backend_cmd) {
                    println!("{status}");
                }
            }
            recv(ui_rx) -> event => {
                let Ok(event) = event else {
                    println!("Backend worker stopped.");
                    break;
                };
                match view.apply(event) {
                    ViewUpdate::Nothing => {}
                    ViewUpdate::Status(message) => println!("{message}"),
                    ViewUpdate::Redraw => println!("\n{}", view.render()),
                }
            }
        }
    }
    Ok(())
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (line_tx, line_rx) = crossbeam_channel::unbounded();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if line_tx.send(line).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    tracing::warn!("failed to read stdin: {err}");
                    break;
                }
            }
        }
    });
    line_rx
}
