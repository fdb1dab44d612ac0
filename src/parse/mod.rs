pub mod continuation;
pub mod error;
pub mod parser;
pub mod state;
pub mod types;

pub use continuation::{Feed, LineAccumulator, needs_continuation};
pub use error::SyntaxError;
pub use parser::{Parsed, Parser, parse};
pub use state::{State, StateStack};
pub use types::{
    Attributes, Command, Redirection, RedirectionKind, STDIN_FILENO, STDOUT_FILENO, Subcommand,
    Token, TokenKind,
};
