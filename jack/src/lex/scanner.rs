//! Pull based token scanner with a single token of look ahead.
use crate::error::{JackError, JackResult, LexError, LexErrorKind, SourceError};

use super::{Keyword, Lexer, Symbol, Token, TokenKind};

/// Token stream exposing a current token and one token of look ahead.
///
/// Tokens are lazily lexed. Peeking or advancing triggers the internal
/// lexer, and no more than two tokens are ever held at once.
///
/// Initially there is no current token; call [`Scanner::advance`] first.
pub struct Scanner<'a> {
    lexer: Lexer<'a>,
    /// Keep reference to the source so the parser can
    /// slice fragments from it.
    original: &'a str,
    current: Option<Token>,
    lookahead: Option<Token>,
}

impl<'a> Scanner<'a> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        Self {
            original: lexer.source_code(),
            lexer,
            current: None,
            lookahead: None,
        }
    }

    pub fn source_code(&self) -> &'a str {
        self.original
    }

    /// Lex the next token into the look ahead slot, if it's empty.
    fn fill(&mut self) -> JackResult<&Token> {
        let token = match self.lookahead.take() {
            Some(token) => token,
            None => self.lexer.next_token()?,
        };
        Ok(&*self.lookahead.insert(token))
    }

    /// Indicates whether another token follows the current one.
    ///
    /// # Errors
    ///
    /// Returns a lexical error if the following text can't be tokenized.
    pub fn has_more(&mut self) -> JackResult<bool> {
        Ok(self.fill()?.kind != TokenKind::EOF)
    }

    /// Make the next token the current token.
    ///
    /// # Errors
    ///
    /// Fails with [`LexErrorKind::EndOfInput`] when there are no tokens left.
    pub fn advance(&mut self) -> JackResult<()> {
        let next = self.fill()?;
        if next.kind == TokenKind::EOF {
            return Err(LexError::new(LexErrorKind::EndOfInput, next.line, next.column).into());
        }
        self.current = self.lookahead.take();
        Ok(())
    }

    /// Literal text of the token after the current one, without consuming it.
    ///
    /// Returns `None` at the end of input.
    pub fn peek(&mut self) -> JackResult<Option<&'a str>> {
        let original = self.original;
        let token = self.fill()?;
        Ok(match token.kind {
            TokenKind::EOF => None,
            _ => Some(token.span.fragment(original)),
        })
    }

    /// The current token.
    pub fn current(&self) -> JackResult<&Token> {
        self.current.as_ref().ok_or_else(|| {
            let line = self.lookahead.as_ref().map(|t| t.line).unwrap_or(1);
            LexError::new(LexErrorKind::EndOfInput, line, 1).into()
        })
    }

    /// Kind of the current token, or `None` before the first advance.
    #[inline]
    pub fn current_kind(&self) -> Option<TokenKind> {
        self.current.as_ref().map(|token| token.kind)
    }

    /// Literal source text of the current token.
    pub fn lexeme(&self) -> JackResult<&'a str> {
        Ok(self.current()?.span.fragment(self.original))
    }

    /// Build a syntax error pointing at the current token.
    #[inline(never)]
    #[cold]
    pub fn error(&self, message: impl ToString) -> JackError {
        match self.current.as_ref() {
            Some(token) => JackError::Syntax(SourceError::new(self.original, token, message)),
            None => LexError::new(LexErrorKind::EndOfInput, 1, 1).into(),
        }
    }

    #[cold]
    fn mismatch(&self, expected: &str) -> JackError {
        match self.current.as_ref() {
            Some(token) => self.error(format!(
                "expected {expected}, found {} `{}`",
                token.kind.class_name(),
                token.span.fragment(self.original)
            )),
            None => self.error(expected),
        }
    }

    /// Valid only when the current token is a keyword.
    pub fn keyword(&self) -> JackResult<Keyword> {
        match self.current_kind() {
            Some(TokenKind::Keyword(keyword)) => Ok(keyword),
            _ => Err(self.mismatch("keyword")),
        }
    }

    /// Valid only when the current token is a symbol.
    pub fn symbol(&self) -> JackResult<Symbol> {
        match self.current_kind() {
            Some(TokenKind::Symbol(symbol)) => Ok(symbol),
            _ => Err(self.mismatch("symbol")),
        }
    }

    /// Valid only when the current token is an identifier.
    pub fn identifier(&self) -> JackResult<&'a str> {
        match self.current_kind() {
            Some(TokenKind::Ident) => self.lexeme(),
            _ => Err(self.mismatch("identifier")),
        }
    }

    /// Valid only when the current token is an integer constant.
    pub fn int_value(&self) -> JackResult<u16> {
        match self.current_kind() {
            Some(TokenKind::Int(value)) => Ok(value),
            _ => Err(self.mismatch("integer constant")),
        }
    }

    /// String constant without its surrounding quotes.
    ///
    /// Valid only when the current token is a string constant.
    pub fn string_value(&self) -> JackResult<&'a str> {
        match self.current_kind() {
            Some(TokenKind::Str) => {
                let lexeme = self.lexeme()?;
                Ok(&lexeme[1..lexeme.len() - 1])
            }
            _ => Err(self.mismatch("string constant")),
        }
    }
}
