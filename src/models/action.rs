//! Distribution target model.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One configured distribution target.
///
/// Built once from configuration at startup and never mutated afterwards;
/// workers read it concurrently during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionSpec {
    /// Display name, used only in log output.
    pub name: String,
    /// Destination path for the certificate copy.
    pub cert: PathBuf,
    /// Destination path for the key copy.
    pub key: PathBuf,
    /// Destination for the generated full-chain file; absent means skip.
    #[serde(default)]
    pub fullchain: Option<PathBuf>,
    /// Commands to run before the copies, in order.
    #[serde(default)]
    pub pre: Vec<HookCommand>,
    /// Commands to run after the copies, in order.
    #[serde(default)]
    pub post: Vec<HookCommand>,
}

/// A hook command, configured either as explicit argv tokens or as a single
/// line split on ASCII whitespace.
///
/// The line form does no quoting or shell interpretation, so an argument
/// containing a space can only be expressed with the argv form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HookCommand {
    Line(String),
    Argv(Vec<String>),
}

impl HookCommand {
    /// Resolve to the argv tokens that will be executed.
    pub fn argv(&self) -> Vec<String> {
        match self {
            HookCommand::Line(line) => split_command_line(line),
            HookCommand::Argv(argv) => argv.clone(),
        }
    }
}

impl std::fmt::Display for HookCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookCommand::Line(line) => f.write_str(line),
            HookCommand::Argv(argv) => f.write_str(&argv.join(" ")),
        }
    }
}

/// Split a command line on whitespace into argv tokens.
///
/// Quotes are ordinary characters here.
pub fn split_command_line(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}
