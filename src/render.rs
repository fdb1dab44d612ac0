//! Output formats for parsed lines.

use crate::parse::{Command, Redirection, SyntaxError, Token};
use serde_json::json;
use std::fmt::Write;

fn token_line(out: &mut String, indent: &str, label: &str, token: &Token, show_offsets: bool) {
    let _ = write!(out, "{indent}{label} {} {:?}", token.kind.as_str(), token.text);
    if show_offsets {
        let _ = write!(out, " @{}..{}", token.start, token.start + token.len);
    }
    out.push('\n');
}

fn redirection_line(out: &mut String, redirection: &Redirection, show_offsets: bool) {
    let _ = write!(
        out,
        "    redirect {} fd={}",
        redirection.kind.as_str(),
        redirection.fd
    );
    match &redirection.path {
        Some(path) => {
            out.push('\n');
            token_line(out, "      ", "path", path, show_offsets);
        }
        None => out.push('\n'),
    }
}

/// Indented human-readable dump of every command, stage, token and redirection.
pub fn tree(commands: &[Command], show_offsets: bool) -> String {
    let mut out = String::new();
    for (ci, command) in commands.iter().enumerate() {
        let _ = write!(out, "command {ci}");
        if !command.attributes.as_str().is_empty() {
            let _ = write!(out, " [{}]", command.attributes.as_str());
        }
        out.push('\n');
        for (si, sub) in command.subcommands.iter().enumerate() {
            let _ = writeln!(out, "  stage {si}");
            for token in &sub.tokens {
                token_line(&mut out, "    ", "token", token, show_offsets);
            }
            for redirection in &sub.redirections {
                redirection_line(&mut out, redirection, show_offsets);
            }
        }
    }
    out
}

/// Commands re-rendered as shell text, one per line.
///
/// Lossy in two ways: comments move to the end of their command's line,
/// and only the first file redirection of a stage reparses as written. Any
/// later `>`/`<` falls inside the first one's path and comes back as a read
/// redirection.
pub fn shell(commands: &[Command]) -> String {
    commands.iter().map(|c| format!("{c}\n")).collect()
}

fn error_kind(err: &SyntaxError) -> &'static str {
    match err {
        SyntaxError::DanglingPipe { .. } => "dangling_pipe",
        SyntaxError::DanglingEscape { .. } => "dangling_escape",
        SyntaxError::TrailingPipe { .. } => "trailing_pipe",
    }
}

/// JSON record for one parsed line.
pub fn json(line: &str, result: &Result<Vec<Command>, SyntaxError>) -> serde_json::Value {
    match result {
        Ok(commands) => json!({
            "line": line,
            "commands": commands,
        }),
        Err(e) => json!({
            "line": line,
            "error": {
                "kind": error_kind(e),
                "message": e.to_string(),
                "offset": e.offset(),
            },
        }),
    }
}

/// `shline: syntax error: ...` followed by the line and a caret under the
/// offending character.
pub fn error(line: &str, err: &SyntaxError) -> String {
    // Only the physical line holding the offset is shown.
    let mut offset = err.offset().min(line.len());
    if !line.is_char_boundary(offset) {
        offset = line.len();
    }
    let line_start = line[..offset].rfind('\n').map_or(0, |i| i + 1);
    let line_end = line[offset..].find('\n').map_or(line.len(), |i| offset + i);
    let column = line[line_start..offset].chars().count();
    format!(
        "shline: syntax error: {err}\n  {}\n  {}^\n",
        &line[line_start..line_end],
        " ".repeat(column)
    )
}
