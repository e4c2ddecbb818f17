//! Layered settings.
//!
//! Sources, lowest precedence first: built-in defaults, an optional TOML
//! file, `LANDSLIDE_*` environment variables, then command-line flags.
//!
//! ```toml
//! api_base = "https://landslide.example.org/api"
//! page_size = 20
//! refresh_secs = 60
//! username = "curator"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, Map};
use serde::Deserialize;

use crate::api::DEFAULT_API_BASE;

/// Prefix of environment variables read as settings (`LANDSLIDE_API_BASE`).
pub const ENV_PREFIX: &str = "LANDSLIDE";

/// Resolved settings for a run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub api_base: String,
    pub timeout_secs: u64,
    pub page_size: u32,
    /// Periodic reload of the current view; 0 disables it.
    pub refresh_secs: u64,
    pub session_file: PathBuf,
    pub log_file: PathBuf,
    pub log_filter: String,
    /// Prefills the login form; used to sign in for non-interactive commands.
    pub username: String,
    pub password: String,
    /// Default note attached to NetCDF uploads.
    pub note: String,
}

/// Values given on the command line. `None` leaves lower layers in effect.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_base: Option<String>,
    pub page_size: Option<u32>,
    pub refresh_secs: Option<u64>,
    pub session_file: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub note: Option<String>,
}

impl Settings {
    /// Load settings from `file` (if given), the process environment and
    /// `overrides`.
    pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        Self::load_with_env(file, overrides, None)
    }

    /// Like [`Settings::load`], reading environment variables from `env`
    /// instead of the process environment when given.
    fn load_with_env(
        file: Option<&Path>,
        overrides: &Overrides,
        env: Option<Map<String, String>>,
    ) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("api_base", DEFAULT_API_BASE)?
            .set_default("timeout_secs", 30u64)?
            .set_default("page_size", 10u64)?
            .set_default("refresh_secs", 0u64)?
            .set_default("session_file", ".landslide-watch-session.json")?
            .set_default("log_file", "landslide-watch.log")?
            .set_default("log_filter", "info")?
            .set_default("username", "")?
            .set_default("password", "")?
            .set_default("note", "")?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true).source(env));

        let path_string = |p: &Option<PathBuf>| p.as_ref().map(|p| p.to_string_lossy().into_owned());
        builder = builder
            .set_override_option("api_base", overrides.api_base.clone())?
            .set_override_option("page_size", overrides.page_size.map(u64::from))?
            .set_override_option("refresh_secs", overrides.refresh_secs)?
            .set_override_option("session_file", path_string(&overrides.session_file))?
            .set_override_option("log_file", path_string(&overrides.log_file))?
            .set_override_option("note", overrides.note.clone())?;

        let settings: Settings = builder
            .build()
            .context("Failed to load settings")?
            .try_deserialize()
            .context("Invalid settings")?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
            bail!("api_base must be an http(s) URL, got {:?}", self.api_base);
        }
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be at least 1");
        }
        if self.page_size == 0 {
            bail!("page_size must be at least 1");
        }
        Ok(())
    }

    /// Whether credentials for a non-interactive login are configured.
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}
