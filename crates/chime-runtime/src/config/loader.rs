//! Layered configuration loading.
//!
//! Sources, each overriding the previous one:
//!
//! ```text
//!   ChimeConfig::default()
//!   ConfigLoader::merge(..)             programmatic overrides
//!   chime.toml | config.toml            first one found (toml-config)
//!   chime.yaml | chime.yml              (yaml-config)
//!   chime.<profile>.toml                next to the file above
//!   CHIME_* environment variables       CHIME_STORAGE__BACKEND=memory
//! ```
//!
//! Files are searched in the current directory, then in the user config
//! directory (`~/.config/chime` on Linux), unless search paths or an
//! explicit file are given. The profile comes from `CHIME_PROFILE`.

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "toml-config", feature = "yaml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info};

use super::error::{ConfigError, ConfigResult};
use super::schema::ChimeConfig;
use super::validation::validate_config;

/// Environment variable naming the profile.
pub const PROFILE_ENV: &str = "CHIME_PROFILE";

const ENV_PREFIX: &str = "CHIME_";

/// File names looked for in every search directory, in order.
fn file_names() -> Vec<&'static str> {
    let mut names = Vec::new();
    #[cfg(feature = "toml-config")]
    names.extend(["chime.toml", "config.toml"]);
    #[cfg(feature = "yaml-config")]
    names.extend(["chime.yaml", "chime.yml"]);
    names
}

/// Builds a [`ChimeConfig`] from defaults, files and the environment.
#[derive(Debug)]
pub struct ConfigLoader {
    overrides: Option<ChimeConfig>,
    profile: Option<String>,
    search_paths: Vec<PathBuf>,
    file: Option<PathBuf>,
    env: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader using the profile from `CHIME_PROFILE`.
    pub fn new() -> Self {
        Self {
            overrides: None,
            profile: std::env::var(PROFILE_ENV)
                .ok()
                .filter(|p| !p.is_empty())
                .map(|p| p.to_lowercase()),
            search_paths: Vec::new(),
            file: None,
            env: true,
        }
    }

    /// Sets the profile, e.g. `production` loads `chime.production.toml`.
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Some(profile.as_ref().to_lowercase());
        self
    }

    /// Searches `path` for config files. Replaces the default directories.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Loads exactly this file instead of searching. It must exist.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Reads `CHIME_*` environment variables (the default).
    pub fn with_env(mut self) -> Self {
        self.env = true;
        self
    }

    /// Ignores the environment.
    pub fn without_env(mut self) -> Self {
        self.env = false;
        self
    }

    /// Layers `config` right above the defaults, below files and the
    /// environment.
    pub fn merge(mut self, config: ChimeConfig) -> Self {
        self.overrides = Some(config);
        self
    }

    /// Loads and validates the configuration.
    pub fn load(self) -> ConfigResult<ChimeConfig> {
        let config: ChimeConfig = self.figment()?.extract()?;
        validate_config(&config)?;

        debug!(
            profile = self.profile.as_deref().unwrap_or("-"),
            level = %config.logging.level,
            storage = ?config.storage.backend,
            "Configuration loaded"
        );
        Ok(config)
    }

    fn figment(&self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(ChimeConfig::default()));
        if let Some(overrides) = &self.overrides {
            figment = figment.merge(Serialized::defaults(overrides));
        }

        let base = match &self.file {
            Some(path) if !path.exists() => return Err(ConfigError::FileNotFound(path.clone())),
            Some(path) => Some(path.clone()),
            None => self.discover(),
        };

        match base {
            Some(base) => {
                info!(path = %base.display(), "Loading configuration file");
                figment = merge_file(figment, &base)?;

                if let Some(profiled) = self.profiled(&base)
                    && profiled.exists()
                {
                    info!(path = %profiled.display(), "Loading profile configuration file");
                    figment = merge_file(figment, &profiled)?;
                }
            }
            None => debug!("No configuration file found, using defaults"),
        }

        if self.env {
            figment = figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["profile"]).split("__"));
        }
        Ok(figment)
    }

    /// Returns the first known config file in the search directories.
    fn discover(&self) -> Option<PathBuf> {
        let search: Vec<PathBuf> = if self.search_paths.is_empty() {
            std::env::current_dir()
                .ok()
                .into_iter()
                .chain(dirs::config_dir().map(|dir| dir.join("chime")))
                .collect()
        } else {
            self.search_paths.clone()
        };

        let names = file_names();
        search
            .iter()
            .flat_map(|dir| names.iter().map(move |name| dir.join(name)))
            .find(|path| path.is_file())
    }

    /// `chime.toml` becomes `chime.<profile>.toml`.
    fn profiled(&self, base: &Path) -> Option<PathBuf> {
        let profile = self.profile.as_deref()?;
        let stem = base.file_stem()?.to_str()?;
        let ext = base.extension()?.to_str()?;
        Some(base.with_file_name(format!("{stem}.{profile}.{ext}")))
    }
}

fn merge_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    match ext {
        #[cfg(feature = "toml-config")]
        "toml" => Ok(figment.merge(Toml::file(path))),
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
    }
}
