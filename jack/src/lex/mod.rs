//! Scanner
mod cursor;
mod lexer;
mod scanner;
mod tokens;

pub use self::{
    lexer::{Lexer, LexerIter},
    scanner::Scanner,
    tokens::{Keyword, Span, Symbol, Token, TokenKind},
};
