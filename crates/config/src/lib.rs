//! Layered configuration.
//!
//! Sources, from lowest to highest priority:
//!
//! 1. built-in defaults,
//! 2. a configuration file (TOML, YAML or JSON, picked by extension),
//! 3. `SHELF_*` environment variables (`__` separates nested keys, as in
//!    `SHELF_SCAN__SKIP_HIDDEN=false`),
//! 4. command-line [`Overrides`].

pub mod error;

use directories::ProjectDirs;
use exn::OptionExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{ErrorKind, Result};

const ENV_PREFIX: &str = "SHELF_";
const FALLBACK_DIR: &str = "/tmp/shelf";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "shelf")
}

/// Where the configuration file is looked for when none is given.
pub fn default_config_file() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Root directory of the library; required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library: Option<PathBuf>,
    /// Root of the page cache.
    pub cache: PathBuf,
    /// Catalog database file.
    pub database: PathBuf,
    pub listen: SocketAddr,
    /// Seconds to wait for open connections on shutdown.
    pub graceful_timeout: u64,
    pub scan: ScanConfig,
}
impl Default for Config {
    fn default() -> Self {
        let dirs = project_dirs();
        Self {
            library: None,
            cache: dirs
                .as_ref()
                .map(|dirs| dirs.cache_dir().join("pages"))
                .unwrap_or_else(|| PathBuf::from(FALLBACK_DIR)),
            database: dirs
                .as_ref()
                .map(|dirs| dirs.data_dir().join("catalog.sqlite"))
                .unwrap_or_else(|| Path::new(FALLBACK_DIR).join("catalog.sqlite")),
            listen: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080)),
            graceful_timeout: 15,
            scan: ScanConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Skip dot-files and dot-directories.
    pub skip_hidden: bool,
    /// Archive extensions to pick up, without the dot.
    pub extensions: Vec<String>,
}
impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            skip_hidden: true,
            extensions: ["zip", "cbz", "cbr"].map(String::from).to_vec(),
        }
    }
}

/// Values given on the command line; `None` leaves lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listen: Option<SocketAddr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graceful_timeout: Option<u64>,
}

impl Config {
    /// Load the configuration, reading `file` or, when not given, the
    /// default configuration file if there is one.
    pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let file = file.map(Path::to_path_buf).or_else(|| default_config_file().filter(|path| path.is_file()));
        Self::load_from(file.as_deref(), overrides)
    }

    /// Load the configuration from exactly the given layers: no file at all
    /// when `file` is `None`.
    pub fn load_from(file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = file {
            if !file.is_file() {
                exn::bail!(ErrorKind::Load(format!("no such file: {}", file.display())));
            }
            debug!(path = %file.display(), "reading configuration file");
            figment = match file.extension().and_then(|ext| ext.to_str()) {
                Some("yaml" | "yml") => figment.merge(Yaml::file(file)),
                Some("json") => figment.merge(Json::file(file)),
                _ => figment.merge(Toml::file(file)),
            };
        }
        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Serialized::defaults(overrides))
            .extract()
            .map_err(|err| ErrorKind::Load(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let library = self.library()?;
        if !library.is_absolute() {
            exn::bail!(ErrorKind::Invalid(format!("library must be an absolute path: {}", library.display())));
        }
        if self.scan.extensions.is_empty() {
            exn::bail!(ErrorKind::Invalid("at least one archive extension is required".to_string()));
        }
        Ok(())
    }

    /// The library root. Only `None` before validation.
    pub fn library(&self) -> Result<&Path> {
        self.library.as_deref().ok_or_raise(|| ErrorKind::Invalid("a library directory is required".to_string()))
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.graceful_timeout)
    }
}
