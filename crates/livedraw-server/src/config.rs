//! Server configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::warn;

/// Default listen address.
pub const DEFAULT_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 5000);

/// Canvas width used when a viewer sends no usable width.
pub const DEFAULT_WIDTH: u32 = 400;

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on (`LIVEDRAW_ADDR`).
    pub addr: SocketAddr,
    /// Directory served for unmatched paths (`LIVEDRAW_STATIC_DIR`).
    pub static_dir: PathBuf,
    /// Width for streams and downloads with no usable width, and for edits
    /// from unknown sessions (`LIVEDRAW_DEFAULT_WIDTH`).
    pub default_width: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(DEFAULT_ADDR),
            static_dir: PathBuf::from("static"),
            default_width: DEFAULT_WIDTH,
        }
    }
}

impl ServerConfig {
    /// Read overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from defaults plus whatever `lookup` returns.
    ///
    /// Malformed values are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(value) = lookup("LIVEDRAW_ADDR") {
            match value.parse() {
                Ok(addr) => config.addr = addr,
                Err(e) => warn!("Ignoring LIVEDRAW_ADDR={:?}: {}", value, e),
            }
        }
        if let Some(value) = lookup("LIVEDRAW_STATIC_DIR") {
            config.static_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("LIVEDRAW_DEFAULT_WIDTH") {
            match value.parse::<u32>() {
                Ok(width) if livedraw_core::validate_size(width, width).is_ok() => {
                    config.default_width = width
                }
                Ok(width) => warn!("Ignoring LIVEDRAW_DEFAULT_WIDTH={}: out of range", width),
                Err(e) => warn!("Ignoring LIVEDRAW_DEFAULT_WIDTH={:?}: {}", value, e),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.addr.port(), 5000);
        assert_eq!(config.default_width, 400);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("LIVEDRAW_ADDR", "127.0.0.1:8080"),
            ("LIVEDRAW_STATIC_DIR", "/srv/livedraw"),
            ("LIVEDRAW_DEFAULT_WIDTH", "640"),
        ]));
        assert_eq!(config.addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.static_dir, PathBuf::from("/srv/livedraw"));
        assert_eq!(config.default_width, 640);
    }

    #[test]
    fn test_malformed_values_ignored() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("LIVEDRAW_ADDR", "not an address"),
            ("LIVEDRAW_DEFAULT_WIDTH", "0"),
        ]));
        assert_eq!(config.addr, ServerConfig::default().addr);
        assert_eq!(config.default_width, DEFAULT_WIDTH);
    }
}
