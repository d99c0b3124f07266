//! query-console - a terminal query console for embedded SQLite databases.

use query_console::cli::Cli;
use query_console::config::Config;
use query_console::console::{Console, ConsoleSettings};
use query_console::engine::{spawn_worker, SqliteEngine};
use query_console::error::Result;
use query_console::headless::{self, HeadlessOptions};
use query_console::logging;
use query_console::persistence::StateStore;
use query_console::tui::Tui;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    if let Err(message) = cli.validate() {
        eprintln!("error: {message}");
        std::process::exit(2);
    }

    logging::init(logging::LogTarget::for_mode(cli.is_headless()));

    if let Err(e) = run(cli).await {
        error!("{}: {}", e.category(), e);
        eprintln!("{e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?.with_threshold(cli.threshold)?;

    let export_path = cli.save.clone().unwrap_or_else(|| config.export.path());
    let settings = ConsoleSettings {
        threshold: config.display.threshold,
        export_path,
    };

    let store = open_store(&config).await;

    let engine = SqliteEngine::new().await?;
    let (handle, worker) = spawn_worker(Box::new(engine));
    let mut console = Console::new(handle.clone(), store.clone(), settings).await;

    let result = if cli.is_headless() {
        run_headless(&cli, &mut console).await
    } else {
        run_tui(&cli, &mut console).await
    };

    handle.shutdown();
    if let Err(e) = worker.await {
        warn!("Engine worker ended abnormally: {}", e);
    }
    if let Some(store) = store {
        store.close().await;
    }

    result
}

/// Opens the last-query store. Failure is not fatal: the console then runs
/// without remembering the query.
async fn open_store(config: &Config) -> Option<StateStore> {
    let opened = match &config.state.path {
        Some(path) => StateStore::open(path).await,
        None => StateStore::open_default().await,
    };

    match opened {
        Ok(store) => Some(store),
        Err(e) => {
            warn!("Query persistence disabled: {}", e);
            None
        }
    }
}

async fn run_tui(cli: &Cli, console: &mut Console) -> Result<()> {
    let initial = match &cli.database {
        Some(path) => console.load_file(path).await,
        None => None,
    };

    let mut tui = Tui::new()?;
    tui.run(console, initial).await
}

async fn run_headless(cli: &Cli, console: &mut Console) -> Result<()> {
    let options = HeadlessOptions::from_cli(cli)?;
    let report = headless::run(console, cli.database.as_deref(), &options).await?;

    let mut stdout = std::io::stdout().lock();
    headless::write_report(&report, options.format, &mut stdout)?;

    if let Some(saved) = &report.saved {
        eprintln!("{saved}");
    }
    Ok(())
}
