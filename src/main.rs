//! shelf: catalog and page cache server for comic archives.
//!
//! Loads the configuration, opens the catalog, then either serves it over
//! HTTP while the library is scanned in the background (`serve`, the
//! default) or scans the library once and exits (`scan`).

mod cli;
mod error;

use clap::Parser;
use exn::ResultExt;
use futures::StreamExt;
use shelf_config::Config;
use shelf_library::error::ErrorKind as LibraryErrorKind;
use shelf_library::{Context, ScanEvent, ScanOptions};
use shelf_pages::{GenerateOutcome, PageCache};
use shelf_registry::{Database, Registration, Registry};
use shelf_server::{AppState, Server};
use shelf_storage::LocalBackend;
use std::path::Path;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::{ErrorKind, Result};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level());
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:?}");
            ExitCode::FAILURE
        },
    }
}

/// `RUST_LOG` wins over the verbosity flags.
fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref(), &cli.overrides()).or_raise(|| ErrorKind::Config)?;
    let library = config.library().or_raise(|| ErrorKind::Config)?;
    create_dir(&config.cache).await?;
    if let Some(parent) = config.database.parent() {
        create_dir(parent).await?;
    }
    let backend = LocalBackend::new(library).or_raise(|| ErrorKind::Library)?;
    let db = Database::connect(&config.database).await.or_raise(|| ErrorKind::Database)?;
    let ctx = Context {
        backend,
        registry: Registry::from(&db),
        pages: PageCache::new(&config.cache),
        options: ScanOptions {
            skip_hidden: config.scan.skip_hidden,
            extensions: config.scan.extensions.clone(),
        },
    };
    info!(
        library = %ctx.backend.root().display(),
        cache = %ctx.pages.root().display(),
        database = %config.database.display(),
        "starting"
    );

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(shutdown.clone()));
    let result = match cli.subcommand() {
        Command::Serve => serve(&config, ctx, shutdown).await,
        Command::Scan => scan(&ctx, shutdown).await.map(|_| ()),
    };
    db.close().await;
    result
}

async fn create_dir(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path).await.or_raise(|| ErrorKind::Setup(path.to_path_buf()))
}

async fn cancel_on_ctrl_c(token: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl-C, shutting down"),
        Err(err) => error!(error = %err, "failed to listen for Ctrl-C"),
    }
    token.cancel();
}

/// Serve HTTP until shut down, scanning the library in the background.
async fn serve(config: &Config, ctx: Context, shutdown: CancellationToken) -> Result<()> {
    let state = AppState { registry: ctx.registry.clone(), pages: ctx.pages.clone() };
    let server = Server::bind(config.listen, state).await.or_raise(|| ErrorKind::Server)?;

    let scan_token = shutdown.child_token();
    let scanner = tokio::spawn({
        let token = scan_token.clone();
        async move {
            match scan(&ctx, token).await {
                Ok(_) => {},
                Err(err) if matches!(&*err, ErrorKind::Canceled) => {},
                Err(err) => error!("{err:?}"),
            }
        }
    });

    let served = server.run(shutdown, config.grace_period()).await.or_raise(|| ErrorKind::Server);
    scan_token.cancel();
    if let Err(err) = scanner.await {
        error!(error = %err, "scan task failed");
    }
    served
}

/// Counters reported at the end of a scan.
#[derive(Debug, Default)]
struct Summary {
    scanned: usize,
    registered: usize,
    extracted: usize,
    failed: usize,
}

/// Scan the whole library. Failures of single files are logged and counted.
async fn scan(ctx: &Context, cancel: CancellationToken) -> Result<Summary> {
    let mut summary = Summary::default();
    let mut events = std::pin::pin!(shelf_library::scan(ctx, cancel));
    while let Some(event) = events.next().await {
        match event {
            Ok(ScanEvent::Started) => info!("scan started"),
            Ok(ScanEvent::Scanned(scan)) => {
                summary.scanned += 1;
                if scan.registration == Registration::Registered {
                    summary.registered += 1;
                }
                if matches!(scan.pages, GenerateOutcome::Extracted(_)) {
                    summary.extracted += 1;
                }
            },
            Ok(ScanEvent::Complete) => {
                let count = ctx.registry.count().await.or_raise(|| ErrorKind::Database)?;
                info!(
                    scanned = summary.scanned,
                    registered = summary.registered,
                    extracted = summary.extracted,
                    failed = summary.failed,
                    books = count,
                    "scan complete"
                );
            },
            Err(err) if matches!(&*err, LibraryErrorKind::Canceled) => {
                warn!(scanned = summary.scanned, failed = summary.failed, "scan canceled");
                return Err(err.raise(ErrorKind::Canceled));
            },
            Err(err) => {
                summary.failed += 1;
                warn!("{err:?}");
            },
        }
    }
    Ok(summary)
}
