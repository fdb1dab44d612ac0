//! Types produced by the line parser and consumed by an expander/executor.

use serde::Serialize;
use std::fmt;
use std::ops::Range;

/// Conventional standard-input descriptor.
pub const STDIN_FILENO: u32 = 0;
/// Conventional standard-output descriptor.
pub const STDOUT_FILENO: u32 = 1;

/// How the text of a [`Token`] was delimited in the source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Unquoted literal text.
    Bare,
    /// Text finalized because a shell operator followed it.
    Special,
    /// `'...'`
    SingleQuoted,
    /// `"..."`
    DoubleQuoted,
    /// Everything after `#` up to the end of the line.
    Comment,
    /// `'...` with no closing quote before end of input.
    UnterminatedSingleQuoted,
    /// `"...` with no closing quote before end of input.
    UnterminatedDoubleQuoted,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Bare => "bare",
            TokenKind::Special => "special",
            TokenKind::SingleQuoted => "single_quoted",
            TokenKind::DoubleQuoted => "double_quoted",
            TokenKind::Comment => "comment",
            TokenKind::UnterminatedSingleQuoted => "unterminated_single_quoted",
            TokenKind::UnterminatedDoubleQuoted => "unterminated_double_quoted",
        }
    }

    pub fn is_unterminated(self) -> bool {
        matches!(
            self,
            TokenKind::UnterminatedSingleQuoted | TokenKind::UnterminatedDoubleQuoted
        )
    }
}

/// A finalized piece of text together with where it came from.
///
/// `start` and `len` are byte offsets into the parsed line. The span covers
/// the source bytes that produced `text`: escape backslashes are inside it,
/// a closing quote is not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub start: usize,
    pub len: usize,
}

impl Token {
    /// Byte range of the token in the source line.
    pub fn span(&self) -> Range<usize> {
        self.start..self.start + self.len
    }

    /// The raw source text the token was built from.
    ///
    /// Returns an empty string if `line` is not the line this token came from.
    pub fn source<'a>(&self, line: &'a str) -> &'a str {
        line.get(self.span()).unwrap_or("")
    }
}

/// What a [`Redirection`] binds its descriptor to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectionKind {
    /// `|` — stdout feeds the next subcommand
    Pipe,
    /// `<`
    FileRead,
    /// `>`
    FileWrite,
    /// `>>`
    FileWriteAppend,
}

impl RedirectionKind {
    /// The operator's shell syntax.
    pub fn as_str(self) -> &'static str {
        match self {
            RedirectionKind::Pipe => "|",
            RedirectionKind::FileRead => "<",
            RedirectionKind::FileWrite => ">",
            RedirectionKind::FileWriteAppend => ">>",
        }
    }
}

/// A request to bind a file descriptor to a pipe or a file path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirection {
    pub kind: RedirectionKind,
    pub fd: u32,
    /// Target path; filled in once the text after the operator is finalized.
    /// Never set for [`RedirectionKind::Pipe`].
    pub path: Option<Token>,
}

impl Redirection {
    pub fn pipe() -> Self {
        Self {
            kind: RedirectionKind::Pipe,
            fd: STDOUT_FILENO,
            path: None,
        }
    }

    pub fn read(fd: u32) -> Self {
        Self {
            kind: RedirectionKind::FileRead,
            fd,
            path: None,
        }
    }

    pub fn write(fd: u32) -> Self {
        Self {
            kind: RedirectionKind::FileWrite,
            fd,
            path: None,
        }
    }
}

/// One pipeline stage: an invocable unit plus its own redirections.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Subcommand {
    pub tokens: Vec<Token>,
    /// In declaration order. A [`RedirectionKind::Pipe`], if present, is last.
    pub redirections: Vec<Redirection>,
}

impl Subcommand {
    /// Texts of every non-comment token, in order.
    pub fn argv(&self) -> Vec<&str> {
        self.tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Comment)
            .map(|t| t.text.as_str())
            .collect()
    }

    pub fn ends_in_pipe(&self) -> bool {
        self.redirections
            .last()
            .is_some_and(|r| r.kind == RedirectionKind::Pipe)
    }

    /// Whether any token or redirection path was cut off by end of input
    /// while still inside quotes.
    pub fn has_unterminated_quote(&self) -> bool {
        self.tokens.iter().any(|t| t.kind.is_unterminated())
            || self
                .redirections
                .iter()
                .filter_map(|r| r.path.as_ref())
                .any(|p| p.kind.is_unterminated())
    }
}

/// Execution attributes attached to a [`Command`] by its terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Attributes {
    /// `;` or end of line
    #[default]
    None,
    /// `&`
    InBackground,
    /// `&&` — the next command runs only if this one succeeded
    ShortCircuitOnFailure,
}

impl Attributes {
    /// The terminator's shell syntax (empty for [`Attributes::None`]).
    pub fn as_str(self) -> &'static str {
        match self {
            Attributes::None => "",
            Attributes::InBackground => "&",
            Attributes::ShortCircuitOnFailure => "&&",
        }
    }
}

/// A top-level unit: pipeline-joined subcommands plus execution attributes.
///
/// Never constructed with an empty subcommand list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    pub subcommands: Vec<Subcommand>,
    pub attributes: Attributes,
}

impl Command {
    pub fn has_unterminated_quote(&self) -> bool {
        self.subcommands.iter().any(Subcommand::has_unterminated_quote)
    }
}

// ── Shell rendering ──

fn write_word(f: &mut fmt::Formatter<'_>, token: &Token) -> fmt::Result {
    if token.kind == TokenKind::Comment {
        return write!(f, "#{}", token.text);
    }
    match shlex::try_quote(&token.text) {
        Ok(quoted) => f.write_str(&quoted),
        // Interior NUL: shlex refuses, fall back to the raw text
        Err(_) => f.write_str(&token.text),
    }
}

impl fmt::Display for Redirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind == RedirectionKind::Pipe {
            return f.write_str("|");
        }
        let default_fd = match self.kind {
            RedirectionKind::FileRead => STDIN_FILENO,
            _ => STDOUT_FILENO,
        };
        if self.fd != default_fd {
            if self.fd > 9 {
                write!(f, "{{{}}}", self.fd)?;
            } else {
                write!(f, "{}", self.fd)?;
            }
        }
        f.write_str(self.kind.as_str())?;
        if let Some(path) = &self.path {
            f.write_str(" ")?;
            write_word(f, path)?;
        }
        Ok(())
    }
}

/// Words then file redirections, space-separated. The pipe is left to the
/// caller, as are comments when `with_comments` is false.
fn write_stage(f: &mut fmt::Formatter<'_>, sub: &Subcommand, with_comments: bool) -> fmt::Result {
    let mut first = true;
    let mut sep = |f: &mut fmt::Formatter<'_>| {
        let was_first = first;
        first = false;
        if was_first { Ok(()) } else { f.write_str(" ") }
    };
    for token in sub.tokens.iter().filter(|t| t.kind != TokenKind::Comment) {
        sep(f)?;
        write_word(f, token)?;
    }
    for redirection in sub
        .redirections
        .iter()
        .filter(|r| r.kind != RedirectionKind::Pipe)
    {
        sep(f)?;
        write!(f, "{redirection}")?;
    }
    if with_comments {
        // Comments run to end of line, so they go last.
        for comment in sub.tokens.iter().filter(|t| t.kind == TokenKind::Comment) {
            sep(f)?;
            write_word(f, comment)?;
        }
    }
    Ok(())
}

impl fmt::Display for Subcommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_stage(f, self, true)
    }
}

impl fmt::Display for Command {
    /// Comments from every stage are moved after the terminator so they
    /// cannot swallow a `|`, `&` or `&&`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, sub) in self.subcommands.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write_stage(f, sub, false)?;
        }
        if self.attributes != Attributes::None {
            write!(f, " {}", self.attributes.as_str())?;
        }
        let comments = self
            .subcommands
            .iter()
            .flat_map(|s| &s.tokens)
            .filter(|t| t.kind == TokenKind::Comment);
        for comment in comments {
            f.write_str(" ")?;
            write_word(f, comment)?;
        }
        Ok(())
    }
}
