//! Result and errors.
use std::{
    fmt::{self, Display, Formatter},
    io,
};

use crate::lex::Token;

pub type JackResult<T> = std::result::Result<T, JackError>;

/// Every variant is fatal to the compilation unit it was raised in.
#[derive(Debug)]
pub enum JackError {
    /// Source text could not be broken into tokens.
    Lex(LexError),
    /// Token does not fit the grammar at this point.
    Syntax(SourceError),
    /// Variable used without a declaration in either scope.
    UndefinedSymbol(SourceError),
    /// Name declared twice in one scope, under strict declarations.
    DuplicateSymbol(SourceError),
    /// Valid grammar that can't be expressed in VM code.
    Unsupported(SourceError),
    Io(io::Error),
}

impl Display for JackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex(err) => write!(f, "lexical error: {err}"),
            Self::Syntax(err) => write!(f, "syntax error: {err}"),
            Self::UndefinedSymbol(err) => write!(f, "undefined symbol: {err}"),
            Self::DuplicateSymbol(err) => write!(f, "duplicate symbol: {err}"),
            Self::Unsupported(err) => write!(f, "unsupported construct: {err}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for JackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for JackError {
    fn from(err: io::Error) -> Self {
        JackError::Io(err)
    }
}

impl From<LexError> for JackError {
    fn from(err: LexError) -> Self {
        JackError::Lex(err)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
    /// String literal not closed before a newline or end-of-file.
    UnterminatedString,
    /// Block comment `/* ...` not closed before end-of-file.
    UnterminatedComment,
    /// Integer literal outside of 0..=32767
    IntegerOverflow,
    /// Attempt to advance past the last token.
    EndOfInput,
}

impl LexError {
    pub fn new(kind: LexErrorKind, line: u32, column: u32) -> Self {
        Self { kind, line, column }
    }
}

impl Display for LexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let message = match self.kind {
            LexErrorKind::UnterminatedString => "unterminated string constant",
            LexErrorKind::UnterminatedComment => "unterminated block comment",
            LexErrorKind::IntegerOverflow => "integer constant exceeds 32767",
            LexErrorKind::EndOfInput => "unexpected end of input",
        };
        write!(f, "{}:{}: {}", self.line, self.column, message)
    }
}

impl std::error::Error for LexError {}

/// Diagnostic pointing at a token in the source text.
#[derive(Debug, Clone)]
pub struct SourceError {
    pub line: u32,
    pub column: u32,
    pub message: String,
    /// Source line containing the token.
    pub source_line: String,
}

impl SourceError {
    pub fn new(source_code: &str, token: &Token, message: impl ToString) -> Self {
        let (line, _) = token.span.surrounding_line(source_code);
        Self {
            line: token.line,
            column: token.column,
            message: message.to_string(),
            source_line: line.to_owned(),
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:{}: {}", self.line, self.column, self.message)?;
        writeln!(f, "    {}", self.source_line)?;
        write!(f, "    {: >width$}", "^", width = self.column.max(1) as usize)
    }
}
