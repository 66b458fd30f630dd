//! Centralized constants for paths and the diagnostics listener.

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/renewd/config.toml";

/// Address the introspection endpoint binds when `--profile` is set.
pub const STATUS_ADDR: &str = "127.0.0.1:6060";
