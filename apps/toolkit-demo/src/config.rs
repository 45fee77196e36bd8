//! Layered configuration: defaults -> YAML file -> `TOOLKIT__*` env -> CLI.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::ArgMatches;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use toolkit_log::OptionsError;

pub const ENV_PREFIX: &str = "TOOLKIT__";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file does not exist: {}", .0.display())]
    MissingFile(PathBuf),
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
    #[error("invalid logging configuration: {}", join(.0))]
    Logging(Vec<OptionsError>),
    #[error("invalid server.bind_addr '{addr}': {source}")]
    BindAddr {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

fn join(errs: &[OptionsError]) -> String {
    errs.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Turn a prefix-stripped env key into a figment key path.
///
/// `__` separates nesting levels. Logging options are kebab-case, so single
/// underscores below `logging` become dashes.
fn env_key(key: &str) -> String {
    let mut parts = key.split("__");
    let Some(section) = parts.next() else {
        return String::new();
    };
    let kebab = section.eq_ignore_ascii_case("logging");
    parts.fold(section.to_owned(), |mut path, part| {
        path.push('.');
        if kebab {
            path.push_str(&part.replace('_', "-"));
        } else {
            path.push_str(part);
        }
        path
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8087".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: toolkit_log::Options,
}

impl AppConfig {
    /// Load defaults, then `path` (if any), then `TOOLKIT__*` environment variables.
    ///
    /// Nested keys are separated by `__` in the environment, e.g.
    /// `TOOLKIT__SERVER__BIND_ADDR` or `TOOLKIT__LOGGING__ENABLE_COLOR`.
    ///
    /// # Errors
    /// [`ConfigError::MissingFile`] if `path` is not a file, [`ConfigError::Load`]
    /// if a provider fails to parse or extract.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            if !path.is_file() {
                return Err(ConfigError::MissingFile(path.to_path_buf()));
            }
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).map(|key| env_key(key.as_str()).into()))
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// Apply explicit command-line overrides on top of the loaded layers.
    pub fn apply_cli_overrides(
        &mut self,
        bind: Option<&str>,
        log: &toolkit_log::Options,
        matches: &ArgMatches,
    ) {
        if let Some(bind) = bind {
            bind.clone_into(&mut self.server.bind_addr);
        }
        self.logging.apply_cli(log, matches);
    }

    /// # Errors
    /// Returns the first section that fails validation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let errs = self.logging.validate();
        if !errs.is_empty() {
            return Err(ConfigError::Logging(errs));
        }
        self.bind_addr().map(|_| ())
    }

    /// # Errors
    /// [`ConfigError::BindAddr`] if `server.bind_addr` is not `ip:port`.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind_addr
            .parse()
            .map_err(|source| ConfigError::BindAddr {
                addr: self.server.bind_addr.clone(),
                source,
            })
    }

    /// # Errors
    /// Fails only if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
