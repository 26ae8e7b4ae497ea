//! Server configuration from environment variables.
//!
//! - `RANSIM_DB_PATH`: SQLite file for runs (default `ransim.db`)
//! - `RANSIM_PORT`: listen port (default `3000`)
//! - `RANSIM_STORE`: `sqlite` or `memory` (default `sqlite`)
//! - `RANSIM_CELLS_CHUNK`, `RANSIM_UE_CHUNK`: chunk sizes for a fresh
//!   simulation (default 48 and 500, `0` disables chunking)

use ransim_compute::ChunkSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Sqlite,
    Memory,
}

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("invalid {var}='{value}': {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub db_path: String,
    pub port: u16,
    pub store: StoreKind,
    pub chunks: ChunkSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            db_path: "ransim.db".to_string(),
            port: 3000,
            store: StoreKind::Sqlite,
            chunks: ChunkSettings::new(Some(48), Some(500)),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = ServerConfig::default();
        if let Some(path) = lookup("RANSIM_DB_PATH") {
            config.db_path = path;
        }
        if let Some(port) = lookup("RANSIM_PORT") {
            config.port = port.parse().map_err(|_| ConfigError {
                var: "RANSIM_PORT",
                value: port.clone(),
                reason: "expected a port number",
            })?;
        }
        if let Some(store) = lookup("RANSIM_STORE") {
            config.store = match store.to_ascii_lowercase().as_str() {
                "sqlite" => StoreKind::Sqlite,
                "memory" => StoreKind::Memory,
                _ => {
                    return Err(ConfigError {
                        var: "RANSIM_STORE",
                        value: store,
                        reason: "expected 'sqlite' or 'memory'",
                    })
                }
            };
        }
        if let Some(chunk) = lookup("RANSIM_CELLS_CHUNK") {
            config.chunks.cells_chunk = parse_chunk("RANSIM_CELLS_CHUNK", chunk)?;
        }
        if let Some(chunk) = lookup("RANSIM_UE_CHUNK") {
            config.chunks.ue_chunk = parse_chunk("RANSIM_UE_CHUNK", chunk)?;
        }
        Ok(config)
    }
}

fn parse_chunk(var: &'static str, value: String) -> Result<Option<usize>, ConfigError> {
    match value.parse::<usize>() {
        Ok(0) => Ok(None),
        Ok(n) => Ok(Some(n)),
        Err(_) => Err(ConfigError {
            var,
            value,
            reason: "expected a non-negative integer",
        }),
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
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("RANSIM_PORT", "8080"),
            ("RANSIM_STORE", "memory"),
            ("RANSIM_CELLS_CHUNK", "0"),
            ("RANSIM_UE_CHUNK", "128"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.chunks, ChunkSettings::new(None, Some(128)));
    }

    #[test]
    fn rejects_bad_values() {
        let err = ServerConfig::from_lookup(lookup(&[("RANSIM_STORE", "redis")])).unwrap_err();
        assert_eq!(err.var, "RANSIM_STORE");
        assert!(ServerConfig::from_lookup(lookup(&[("RANSIM_PORT", "http")])).is_err());
    }
}
