//! config-rs/lib.rs
//! Shared configuration utilities for the research services.
//! Provides config file resolution, `${VAR}` expansion and port/address management.

use std::env;
use std::fs;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use thiserror::Error;

/// Environment variable that overrides the research config location
pub const CONFIG_PATH_ENV: &str = "RESEARCH_CONFIG";

/// Config location used when `RESEARCH_CONFIG` is unset
pub const DEFAULT_CONFIG_PATH: &str = "Config/research.toml";

static ENV_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Z0-9_]+)\}").expect("env token pattern is valid")
});

/// Errors raised while reading a configuration document
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Load a `.env` file from the working directory if one exists.
///
/// Returns true when a file was found and applied.
pub fn load_dotenv() -> bool {
    match dotenv::dotenv() {
        Ok(path) => {
            log::debug!("Loaded environment from {}", path.display());
            true
        }
        Err(_) => false,
    }
}

/// Resolve the research config path from `RESEARCH_CONFIG` or the default location
pub fn config_path() -> PathBuf {
    env::var(CONFIG_PATH_ENV)
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Replace every `${VAR}` token in a string with the process environment value.
///
/// Tokens naming unset variables stay literal.
pub fn expand_env_str(input: &str) -> String {
    ENV_TOKEN
        .replace_all(input, |caps: &Captures| {
            env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

/// Apply `${VAR}` expansion to every string inside a TOML document
pub fn expand_env_vars(value: &mut toml::Value) {
    match value {
        toml::Value::String(s) => {
            if s.contains("${") {
                *s = expand_env_str(s);
            }
        }
        toml::Value::Array(items) => {
            for item in items {
                expand_env_vars(item);
            }
        }
        toml::Value::Table(table) => {
            for (_, item) in table.iter_mut() {
                expand_env_vars(item);
            }
        }
        _ => {}
    }
}

/// Parse a TOML document from text and expand environment tokens
pub fn parse_document(text: &str, origin: &Path) -> Result<toml::Value, ConfigError> {
    let mut value: toml::Value = toml::from_str(text).map_err(|source| ConfigError::Parse {
        path: origin.to_path_buf(),
        source,
    })?;
    expand_env_vars(&mut value);
    Ok(value)
}

/// Read a TOML config document from disk.
///
/// A missing file yields `Ok(None)` so callers can fall back to built-in defaults.
pub fn load_document(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            log::debug!("Config file {} not found, using defaults", path.display());
            return Ok(None);
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    parse_document(&text, path).map(Some)
}

/// Get service port from environment variables with proper fallback
///
/// # Arguments
/// * `service_name` - The name of the service (e.g., "RESEARCH")
/// * `default_port` - The default port to use if not specified in environment
pub fn get_service_port(service_name: &str, default_port: u16) -> u16 {
    let var_name = format!("{}_SERVICE_PORT", service_name.to_uppercase());
    match env::var(&var_name) {
        Ok(raw) => raw.trim().parse::<u16>().unwrap_or_else(|_| {
            log::warn!("Invalid port in {}, using default {}", var_name, default_port);
            default_port
        }),
        Err(_) => default_port,
    }
}

/// Create a SocketAddr for binding a service
///
/// `{SERVICE}_SERVICE_ADDR` overrides everything (plain `host:port` or
/// `http://host:port`). Otherwise the host comes from `BIND_ADDRESS`
/// (default `0.0.0.0`) and the port from [`get_service_port`].
pub fn get_bind_address(service_name: &str, default_port: u16) -> SocketAddr {
    let var_name = format!("{}_SERVICE_ADDR", service_name.to_uppercase());

    if let Ok(addr_str) = env::var(&var_name) {
        let stripped = addr_str
            .strip_prefix("http://")
            .or_else(|| addr_str.strip_prefix("https://"))
            .unwrap_or(&addr_str);
        match stripped.parse::<SocketAddr>() {
            Ok(addr) => return addr,
            Err(_) => log::warn!("Invalid address format in {}, using default", var_name),
        }
    }

    let port = get_service_port(service_name, default_port);
    let host = env::var("BIND_ADDRESS")
        .ok()
        .and_then(|h| match h.trim().parse::<IpAddr>() {
            Ok(ip) => Some(ip),
            Err(_) => {
                log::warn!("Invalid BIND_ADDRESS '{}', binding to 0.0.0.0", h);
                None
            }
        })
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    SocketAddr::new(host, port)
}
