//! Multi-line input: deciding when a line is incomplete and stitching
//! continuation lines onto it.

use super::error::SyntaxError;
use super::parser::{Parsed, Parser};
use super::types::Command;

/// Would reading another line complete this input?
///
/// True when input ran out inside quotes, or when the line ends in a pipe
/// with nothing after it.
pub fn needs_continuation(line: &str, parsed: &Parsed) -> bool {
    match &parsed.result {
        Ok(_) => parsed.open_quote,
        Err(SyntaxError::TrailingPipe { offset }) => line
            .get(offset + 1..)
            .is_some_and(|rest| rest.trim().is_empty()),
        Err(_) => false,
    }
}

/// Outcome of feeding one physical line to a [`LineAccumulator`].
#[derive(Debug, PartialEq, Eq)]
pub enum Feed {
    /// More input is needed; nothing to report yet.
    Incomplete,
    /// The accumulated text parsed to a final result.
    Complete {
        text: String,
        result: Result<Vec<Command>, SyntaxError>,
    },
}

/// Joins physical lines with `\n` until they parse to something complete.
#[derive(Debug, Default)]
pub struct LineAccumulator {
    pending: Option<String>,
}

impl LineAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Is a partial input waiting for more lines?
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn feed(&mut self, line: &str) -> Feed {
        let text = match self.pending.take() {
            Some(mut text) => {
                text.push('\n');
                text.push_str(line);
                text
            }
            None => line.to_string(),
        };
        let parsed = Parser::new(&text).finish();
        if needs_continuation(&text, &parsed) {
            self.pending = Some(text);
            return Feed::Incomplete;
        }
        Feed::Complete {
            text,
            result: parsed.result,
        }
    }

    /// End of input: whatever is pending is parsed as-is.
    pub fn finish(&mut self) -> Option<Feed> {
        let text = self.pending.take()?;
        let result = Parser::new(&text).parse();
        Some(Feed::Complete { text, result })
    }
}
