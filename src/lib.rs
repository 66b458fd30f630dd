//! Certificate renewal fan-out daemon.
//!
//! Watches the TLS certificate files an external authority manages and, on
//! each renewal, distributes fresh copies (optionally combined into a full
//! chain) to configured destinations, wrapped in per-target pre/post hook
//! commands.
//!
//! ## Modules
//! - `cli` — Command-line surface and daemon bootstrap
//! - `core` — Watch loop, action runner, file and command primitives
//! - `models` — Configuration data structures
//! - `introspect` — Optional localhost diagnostics endpoint

pub mod cli;
pub mod constants;
pub mod core;
pub mod introspect;
pub mod models;
