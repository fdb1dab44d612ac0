use thiserror::Error;

/// Input the parser rejects outright. Each variant carries the byte offset
/// of the character that triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("nothing before pipe (|) at byte {offset}")]
    DanglingPipe { offset: usize },
    #[error("nothing to escape (\\) at byte {offset}")]
    DanglingEscape { offset: usize },
    #[error("nothing after last pipe (|) at byte {offset}")]
    TrailingPipe { offset: usize },
}

impl SyntaxError {
    pub fn offset(&self) -> usize {
        match *self {
            SyntaxError::DanglingPipe { offset }
            | SyntaxError::DanglingEscape { offset }
            | SyntaxError::TrailingPipe { offset } => offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(
            SyntaxError::DanglingPipe { offset: 0 }.to_string(),
            "nothing before pipe (|) at byte 0"
        );
        assert_eq!(
            SyntaxError::DanglingEscape { offset: 3 }.to_string(),
            "nothing to escape (\\) at byte 3"
        );
        assert_eq!(SyntaxError::TrailingPipe { offset: 7 }.offset(), 7);
    }
}
