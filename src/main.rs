use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use ratatui::crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use ratatui::crossterm::execute;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod controller;
mod domain;
mod filter;
mod inputter;
mod model;
mod sorter;
mod toast;
mod ui;

use controller::Controller;
use domain::{ShopConfig, ShopError};
use model::{Model, Status};
use ui::TableUI;

/// A tui viewer for product listing tables with a live filter and
/// click-to-sort columns.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// CSV export of the product listing
    file: String,

    /// Startup notice shown as a toast; may be given multiple times
    #[arg(long)]
    notice: Vec<String>,

    /// Write logs to this file (filtered by RUST_LOG)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Event poll timeout in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,
}

fn main() -> ExitCode {
    let result = run();
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();
    match result {
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

// Logs go to a file; the terminal belongs to the UI.
fn init_logging(log_file: &Option<PathBuf>) -> Result<(), ShopError> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = std::fs::File::create(path)?;
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(ErrorLayer::default())
        .with(fmt::layer().with_writer(Arc::new(file)).with_ansi(false))
        .init();
    Ok(())
}

fn run() -> Result<(), ShopError> {
    let args = Args::parse();
    init_logging(&args.log_file)?;
    info!("Starting shoptable!");

    let path = shellexpand::full(&args.file)
        .map_err(|e| ShopError::LoadingFailed(e.to_string()))?
        .into_owned();

    let cfg = ShopConfig {
        event_poll_time: args.poll_ms,
        ..ShopConfig::default()
    };

    let mut terminal = ratatui::init();
    execute!(std::io::stdout(), EnableMouseCapture)?;
    let size = terminal.size()?;

    let mut model = Model::init(&cfg, size.width as usize, size.height as usize);
    model.load_file(PathBuf::from(path))?;
    for notice in args.notice {
        model.add_notice(notice);
    }

    let ui = TableUI::new();
    let controller = Controller::new(&cfg);

    while model.status != Status::QUITTING {
        terminal.draw(|f| ui.draw(&model, f))?;
        model.tick();
        if let Some(message) = controller.handle_event(&model)? {
            model.update(message)?;
        }
    }

    Ok(())
}
