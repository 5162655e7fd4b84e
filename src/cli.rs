use clap::{ArgAction, Parser, Subcommand};
use shelf_config::Overrides;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "shelf", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON).
    #[arg(short, long, env = "SHELF_CONFIG", global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Root directory of the library.
    #[arg(long, global = true, value_name = "DIR")]
    pub library: Option<PathBuf>,
    /// Root of the page cache.
    #[arg(long, global = true, value_name = "DIR")]
    pub cache: Option<PathBuf>,
    /// Catalog database file.
    #[arg(long, global = true, value_name = "FILE")]
    pub database: Option<PathBuf>,
    /// Address the HTTP server listens on.
    #[arg(long, global = true, value_name = "ADDR")]
    pub listen: Option<SocketAddr>,
    /// Seconds to wait for open connections on shutdown.
    #[arg(long, global = true, value_name = "SECS")]
    pub graceful_timeout: Option<u64>,
    /// Increase verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Option<Command>,
}
impl Cli {
    pub fn subcommand(&self) -> Command {
        self.command.unwrap_or_default()
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            library: self.library.clone(),
            cache: self.cache.clone(),
            database: self.database.clone(),
            listen: self.listen,
            graceful_timeout: self.graceful_timeout,
        }
    }

    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Scan the library in the background and serve the catalog (default).
    #[default]
    Serve,
    /// Scan the library once and exit.
    Scan,
}
