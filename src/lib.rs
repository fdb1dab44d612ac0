//! shline: a structural parser for interactive shell input lines.
//!
//! One line of raw shell syntax goes in; an ordered list of
//! [`Command`](parse::Command)s comes out, each made of pipeline stages
//! ([`Subcommand`](parse::Subcommand)s) with their tokens and redirections.
//! Expansion and execution are left to whoever consumes the tree.
//!
//! # Architecture
//!
//! - **[`parse`]** — The parsing core: token/redirection/command types, the state stack, the character-level engine, continuation handling.
//! - **[`render`]** — Output formats: indented tree, JSON, re-quoted shell text, error carets.
//! - **[`config`]** — Configuration loading: embedded defaults + user overlay merge.
//! - **[`logging`]** — `log` + `simplelog` setup and per-line parse records.

/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Logger setup and parse logging.
pub mod logging;
/// Line parsing: data model, state stack, engine, continuation.
pub mod parse;
/// Tree, JSON, and shell renderings of parse results.
pub mod render;

pub use parse::{Command, SyntaxError};

/// Parse one line of shell input.
///
/// This is the main entry point for tests and simple usage.
/// Multi-line input (open quotes, trailing pipes) goes through
/// [`parse::LineAccumulator`].
pub fn parse(line: &str) -> Result<Vec<Command>, SyntaxError> {
    parse::parse(line)
}
