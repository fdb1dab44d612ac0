//! Character-at-a-time structural parser for one shell input line.
//!
//! The parser walks the line once, driven by the state on top of a
//! [`StateStack`]. Pending text is accumulated into a token buffer and
//! finalized whenever an operator, blank, or quote boundary is reached;
//! finalized tokens and redirections are then grouped into subcommands
//! (pipeline stages) and commands.

use log::debug;

use super::error::SyntaxError;
use super::state::{State, StateStack};
use super::types::{
    Attributes, Command, Redirection, RedirectionKind, STDIN_FILENO, STDOUT_FILENO,
    Subcommand, Token, TokenKind,
};

/// Whether finalizing an empty token buffer still produces a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AllowEmpty {
    Yes,
    No,
}

/// Word separators outside quotes. A newline only shows up where
/// continuation lines were joined, and counts as a space. Tabs and carriage
/// returns are ordinary characters.
fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\n')
}

/// A finished parse plus how the input ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    pub result: Result<Vec<Command>, SyntaxError>,
    /// Input ran out with a quote still open, whether or not it produced a
    /// command.
    pub open_quote: bool,
}

/// Parses a single line. Consumed by [`Parser::parse`]; all intermediate
/// buffers live and die with the value.
pub struct Parser<'a> {
    line: &'a str,
    chars: Vec<(usize, char)>,
    state: StateStack,

    token: String,
    /// Byte offset where the pending token's source span begins.
    token_start: Option<usize>,
    /// Byte offset just past the last source byte consumed for the pending token.
    token_end: usize,

    tokens: Vec<Token>,
    redirections: Vec<Redirection>,
    subcommands: Vec<Subcommand>,
    commands: Vec<Command>,
    last_pipe: usize,
    open_quote: bool,
}

impl<'a> Parser<'a> {
    pub fn new(line: &'a str) -> Self {
        Self {
            line,
            chars: line.char_indices().collect(),
            state: StateStack::new(),
            token: String::new(),
            token_start: None,
            token_end: 0,
            tokens: Vec::new(),
            redirections: Vec::new(),
            subcommands: Vec::new(),
            commands: Vec::new(),
            last_pipe: 0,
            open_quote: false,
        }
    }

    /// Run the parser to completion.
    ///
    /// Unterminated quotes are not errors: they come back as
    /// [`TokenKind::UnterminatedSingleQuoted`] / [`TokenKind::UnterminatedDoubleQuoted`]
    /// tokens carrying whatever text was read.
    pub fn parse(self) -> Result<Vec<Command>, SyntaxError> {
        self.finish().result
    }

    /// Like [`Parser::parse`], also reporting whether a quote was left open.
    pub fn finish(mut self) -> Parsed {
        let result = match self.run() {
            Ok(()) => Ok(std::mem::take(&mut self.commands)),
            Err(e) => {
                debug!("rejected {:?}: {e}", self.line);
                Err(e)
            }
        };
        Parsed {
            result,
            open_quote: self.open_quote,
        }
    }

    fn run(&mut self) -> Result<(), SyntaxError> {
        let mut i = 0;
        while i < self.chars.len() {
            i = self.dispatch(i)?;
        }

        self.unwind();

        let end = self.chars.len();
        self.commit_token(TokenKind::Bare, AllowEmpty::No, end);
        self.end_command(Attributes::None)
    }

    /// Handle the character at `i` under the current state and return the
    /// index of the next unconsumed character.
    fn dispatch(&mut self, i: usize) -> Result<usize, SyntaxError> {
        let ch = self.chars[i].1;
        match self.state.current() {
            State::Free => self.free(i, ch),
            State::InWriteAppendOrRedirectionPath => self.write_append_or_path(i, ch),
            State::InRedirectionPath => self.redirection_path(i, ch),
            State::InSingleQuotes => Ok(self.single_quotes(i, ch)),
            State::InDoubleQuotes => self.double_quotes(i, ch),
        }
    }

    // ── States ──

    fn free(&mut self, i: usize, ch: char) -> Result<usize, SyntaxError> {
        match ch {
            '#' => Ok(self.comment(i)),
            c if is_blank(c) => {
                self.commit_token(TokenKind::Bare, AllowEmpty::No, i);
                Ok(i + 1)
            }
            ';' => {
                self.commit_token(TokenKind::Bare, AllowEmpty::No, i);
                self.end_command(Attributes::None)?;
                Ok(i + 1)
            }
            '&' => {
                self.commit_token(TokenKind::Special, AllowEmpty::No, i);
                if self.peek(i + 1) == Some('&') {
                    self.end_command(Attributes::ShortCircuitOnFailure)?;
                    Ok(i + 2)
                } else {
                    self.end_command(Attributes::InBackground)?;
                    Ok(i + 1)
                }
            }
            '|' => {
                self.commit_token(TokenKind::Special, AllowEmpty::No, i);
                self.pipe(i)?;
                Ok(i + 1)
            }
            '>' | '<' => {
                self.commit_token(TokenKind::Special, AllowEmpty::No, i);
                let fd = if ch == '>' { STDOUT_FILENO } else { STDIN_FILENO };
                self.begin_redirect(ch, fd);
                Ok(i + 1)
            }
            '\\' => match self.peek(i + 1) {
                Some(escaped) => {
                    self.append(escaped, i, i + 2);
                    Ok(i + 2)
                }
                None => Err(SyntaxError::DanglingEscape {
                    offset: self.offset(i),
                }),
            },
            '\'' => {
                self.open_quote(i, State::InSingleQuotes);
                Ok(i + 1)
            }
            '"' => {
                self.open_quote(i, State::InDoubleQuotes);
                Ok(i + 1)
            }
            '{' => match self.brace_fd(i) {
                Some((fd, op)) => {
                    let operator = self.chars[op].1;
                    self.commit_token(TokenKind::Special, AllowEmpty::No, i);
                    self.begin_redirect(operator, fd);
                    Ok(op + 1)
                }
                None => {
                    self.append(ch, i, i + 1);
                    Ok(i + 1)
                }
            },
            c if c.is_ascii_digit() && matches!(self.peek(i + 1), Some('>' | '<')) => {
                self.commit_token(TokenKind::Special, AllowEmpty::No, i);
                let fd = c.to_digit(10).unwrap_or(0);
                let operator = self.chars[i + 1].1;
                self.begin_redirect(operator, fd);
                Ok(i + 2)
            }
            _ => {
                self.append(ch, i, i + 1);
                Ok(i + 1)
            }
        }
    }

    /// Directly after `>`: a second `>` turns the redirection into an append,
    /// anything else is the start of the path.
    fn write_append_or_path(&mut self, i: usize, ch: char) -> Result<usize, SyntaxError> {
        if ch == '>' {
            self.commit_token(TokenKind::Special, AllowEmpty::No, i);
            self.state.replace_top(State::InRedirectionPath);
            if let Some(last) = self.redirections.last_mut() {
                last.kind = RedirectionKind::FileWriteAppend;
            }
            return Ok(i + 1);
        }
        self.state.replace_top(State::InRedirectionPath);
        self.redirection_path(i, ch)
    }

    fn redirection_path(&mut self, i: usize, ch: char) -> Result<usize, SyntaxError> {
        match ch {
            '<' | '>' => {
                self.commit_token(TokenKind::Special, AllowEmpty::No, i);
                // Both open a read redirection; only the descriptor differs.
                let fd = if ch == '<' { STDIN_FILENO } else { STDOUT_FILENO };
                self.redirections.push(Redirection::read(fd));
                self.state.replace_top(State::InRedirectionPath);
            }
            '|' => {
                self.commit_token(TokenKind::Special, AllowEmpty::No, i);
                self.pipe(i)?;
                self.state.pop();
            }
            '\'' => self.open_quote(i, State::InSingleQuotes),
            '"' => self.open_quote(i, State::InDoubleQuotes),
            // Blanks neither end nor join the path.
            c if is_blank(c) => {}
            _ => self.append(ch, i, i + 1),
        }
        Ok(i + 1)
    }

    fn single_quotes(&mut self, i: usize, ch: char) -> usize {
        if ch == '\'' {
            self.close_quote(i, TokenKind::SingleQuoted);
        } else {
            self.append(ch, i, i + 1);
        }
        i + 1
    }

    fn double_quotes(&mut self, i: usize, ch: char) -> Result<usize, SyntaxError> {
        match ch {
            '"' => {
                self.close_quote(i, TokenKind::DoubleQuoted);
                Ok(i + 1)
            }
            '\\' => match self.peek(i + 1) {
                Some(escaped @ ('$' | '`' | '"' | '\\')) => {
                    self.append(escaped, i, i + 2);
                    Ok(i + 2)
                }
                // Backslash stays, the next character is read on its own.
                Some(_) => {
                    self.append('\\', i, i + 1);
                    Ok(i + 1)
                }
                None => Err(SyntaxError::DanglingEscape {
                    offset: self.offset(i),
                }),
            },
            _ => {
                self.append(ch, i, i + 1);
                Ok(i + 1)
            }
        }
    }

    /// `#` in free context: the rest of the line (up to a newline) is one
    /// comment token.
    fn comment(&mut self, i: usize) -> usize {
        self.commit_token(TokenKind::Bare, AllowEmpty::No, i);
        let mut j = i + 1;
        while let Some(c) = self.peek(j) {
            if c == '\n' {
                break;
            }
            self.append(c, j, j + 1);
            j += 1;
        }
        self.commit_token(TokenKind::Comment, AllowEmpty::No, j);
        // Skip the newline, if there was one.
        j + 1
    }

    /// Pop every state above `Free`, finalizing whatever each one held.
    fn unwind(&mut self) {
        let end = self.chars.len();
        loop {
            match self.state.current() {
                State::Free => break,
                State::InDoubleQuotes => {
                    self.open_quote = true;
                    self.state.pop();
                    self.commit_token(TokenKind::UnterminatedDoubleQuoted, AllowEmpty::Yes, end);
                }
                State::InSingleQuotes => {
                    self.open_quote = true;
                    self.state.pop();
                    self.commit_token(TokenKind::UnterminatedSingleQuoted, AllowEmpty::Yes, end);
                }
                State::InRedirectionPath | State::InWriteAppendOrRedirectionPath => {
                    self.commit_token(TokenKind::Bare, AllowEmpty::No, end);
                    self.state.pop();
                }
            }
        }
    }

    // ── Lookahead ──

    fn peek(&self, i: usize) -> Option<char> {
        self.chars.get(i).map(|&(_, c)| c)
    }

    /// Byte offset of the character at index `i` (line length past the end).
    fn offset(&self, i: usize) -> usize {
        self.chars.get(i).map_or(self.line.len(), |&(o, _)| o)
    }

    /// Match `{digits}>` or `{digits}<` starting at the `{` at `i`.
    /// Returns the descriptor and the index of the operator.
    fn brace_fd(&self, i: usize) -> Option<(u32, usize)> {
        let mut close = i + 1;
        while self.peek(close).is_some_and(|c| c.is_ascii_digit()) {
            close += 1;
        }
        if close == i + 1 || self.peek(close) != Some('}') {
            return None;
        }
        let op = close + 1;
        if !matches!(self.peek(op), Some('>' | '<')) {
            return None;
        }
        let digits = &self.line[self.offset(i + 1)..self.offset(close)];
        let fd = digits.parse().ok()?;
        Some((fd, op))
    }

    // ── Accumulation ──

    /// Append `ch`, produced by source characters `from..to`.
    fn append(&mut self, ch: char, from: usize, to: usize) {
        if self.token_start.is_none() {
            self.token_start = Some(self.offset(from));
        }
        self.token.push(ch);
        self.token_end = self.offset(to);
    }

    fn open_quote(&mut self, i: usize, state: State) {
        if self.token_start.is_none() {
            let inside = self.offset(i + 1);
            self.token_start = Some(inside);
            self.token_end = inside;
        }
        self.state.push(state);
    }

    /// Closing quote. Inside a redirection path the quoted text keeps
    /// accumulating into the path instead of becoming a token.
    fn close_quote(&mut self, i: usize, kind: TokenKind) {
        if !self.state.contains(State::InRedirectionPath) {
            self.commit_token(kind, AllowEmpty::Yes, i);
        }
        self.state.pop();
    }

    /// Finalize the pending buffer. In a redirection path the token becomes
    /// the path of the latest redirection instead of a word.
    fn commit_token(&mut self, kind: TokenKind, allow_empty: AllowEmpty, at: usize) {
        if self.token.is_empty() && allow_empty == AllowEmpty::No {
            self.token_start = None;
            return;
        }
        let (start, len) = match self.token_start.take() {
            Some(start) => (start, self.token_end.saturating_sub(start)),
            None => (self.offset(at), 0),
        };
        let token = Token {
            kind,
            text: std::mem::take(&mut self.token),
            start,
            len,
        };
        if self.state.current() == State::InRedirectionPath
            && let Some(redirection) = self.redirections.last_mut()
        {
            redirection.path = Some(token);
            return;
        }
        self.tokens.push(token);
    }

    fn begin_redirect(&mut self, op: char, fd: u32) {
        if op == '>' {
            self.redirections.push(Redirection::write(fd));
            self.state.push(State::InWriteAppendOrRedirectionPath);
        } else {
            self.redirections.push(Redirection::read(fd));
            self.state.push(State::InRedirectionPath);
        }
    }

    fn has_words(&self) -> bool {
        self.tokens.iter().any(|t| t.kind != TokenKind::Comment)
    }

    fn pipe(&mut self, i: usize) -> Result<(), SyntaxError> {
        if !self.has_words() {
            return Err(SyntaxError::DanglingPipe {
                offset: self.offset(i),
            });
        }
        self.last_pipe = self.offset(i);
        self.redirections.push(Redirection::pipe());
        self.commit_subcommand();
        Ok(())
    }

    /// Package pending tokens and redirections into a pipeline stage.
    /// No-op until at least one non-comment token is pending.
    fn commit_subcommand(&mut self) {
        if !self.has_words() {
            return;
        }
        self.subcommands.push(Subcommand {
            tokens: std::mem::take(&mut self.tokens),
            redirections: std::mem::take(&mut self.redirections),
        });
    }

    fn commit_command(&mut self, attributes: Attributes) {
        if self.subcommands.is_empty() {
            return;
        }
        let command = Command {
            subcommands: std::mem::take(&mut self.subcommands),
            attributes,
        };
        debug!("command: {command}");
        self.commands.push(command);
    }

    /// Close the current command at a `;`, `&`, `&&`, or end of line.
    /// A pipeline whose last stage still ends in `|` has nothing to feed.
    fn end_command(&mut self, attributes: Attributes) -> Result<(), SyntaxError> {
        self.commit_subcommand();
        if self.subcommands.last().is_some_and(Subcommand::ends_in_pipe) {
            return Err(SyntaxError::TrailingPipe {
                offset: self.last_pipe,
            });
        }
        self.commit_command(attributes);
        Ok(())
    }
}

/// Parse one line of shell input into commands.
pub fn parse(line: &str) -> Result<Vec<Command>, SyntaxError> {
    Parser::new(line).parse()
}
