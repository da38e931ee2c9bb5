use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use ersha_client::{CollectionClient, HttpCollectionClient, InMemoryCollection, StaticToken};
use ersha_console::render::TerminalView;
use ersha_console::{BackendConfig, Config, Console, ConsoleSettings, Exit, SessionGuard};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const TOKEN_ENV: &str = "ERSHA_API_TOKEN";

#[derive(Parser)]
#[command(name = "ersha-console")]
#[command(about = "Ersha device inventory console")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "ersha-console.toml")]
    config: PathBuf,

    /// Use a seeded in-memory inventory instead of the configured backend
    #[arg(long)]
    demo: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // stdout belongs to the console itself.
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        "tracing=info,ersha_console=info,ersha_client=info".to_owned()
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = if cli.config.exists() {
        info!(path = ?cli.config, "Loading configuration");
        Config::load(&cli.config)?
    } else {
        info!("No configuration file found, using defaults");
        Config::default()
    };

    if cli.demo {
        config.backend = BackendConfig::Memory;
    }

    let settings = config.console.settings();
    let cancel = CancellationToken::new();
    let session = SessionGuard::new(cancel.clone());
    let lines = spawn_stdin_reader(cancel.clone());

    let exit = match config.backend {
        BackendConfig::Memory => {
            info!("Using seeded in-memory inventory");
            run_console(InMemoryCollection::seeded(), settings, session, lines, cancel).await
        }
        BackendConfig::Http {
            base_url,
            timeout_secs,
            token,
        } => {
            let token = std::env::var(TOKEN_ENV).ok().or(token);
            if token.is_none() {
                warn!("No API token configured, requests will be anonymous");
            }
            info!(%base_url, timeout_secs, "Using inventory API");

            let client =
                HttpCollectionClient::with_timeout(&base_url, Duration::from_secs(timeout_secs))?
                    .with_credentials(StaticToken(token));
            run_console(client, settings, session, lines, cancel).await
        }
    };

    match exit {
        Exit::SessionExpired => {
            error!("Session rejected by the server");
            Err(color_eyre::eyre::eyre!(
                "session expired, set {TOKEN_ENV} to a valid token and restart"
            ))
        }
        Exit::Quit | Exit::Cancelled => {
            info!("ersha-console shut down complete");
            Ok(())
        }
    }
}

async fn run_console<C: CollectionClient>(
    client: C,
    settings: ConsoleSettings,
    session: SessionGuard,
    lines: mpsc::Receiver<String>,
    cancel: CancellationToken,
) -> Exit {
    let console = Console::new(client, TerminalView::stdout(), session, settings);

    tokio::select! {
        exit = console.run(lines, cancel.clone()) => exit,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
            cancel.cancel();
            Exit::Cancelled
        }
    }
}

fn spawn_stdin_reader(cancel: CancellationToken) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(64);

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if tx.send(line).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        error!(error = %e, "Failed to read input");
                        break;
                    }
                },
            }
        }
    });

    rx
}
