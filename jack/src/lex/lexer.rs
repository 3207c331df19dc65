//! Lexical analysis
use crate::{
    constants::MAX_CONSTANT,
    error::{LexError, LexErrorKind},
};

use super::{
    cursor::Cursor,
    tokens::{Keyword, Span, Symbol, Token, TokenKind},
};

pub struct Lexer<'a> {
    /// Character scanner
    cursor: Cursor<'a>,
    /// Keep reference to the source so the parser can
    /// slice fragments from it.
    original: &'a str,
    /// Start absolute byte position of the current token
    /// in the source.
    start_pos: u32,
    start_line: u32,
    start_column: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source_code: &'a str) -> Self {
        let mut cursor = Cursor::new(source_code);

        // Initial state of the cursor is a non-existant EOF char,
        // but the initial state of the lexer should be a valid
        // token starting character.
        //
        // Prime the cursor for the first iteration.
        cursor.next();

        let start_pos = cursor.offset();

        Self {
            start_line: cursor.line(),
            start_column: cursor.column(),
            cursor,
            original: source_code,
            start_pos,
        }
    }

    /// Original source code that was passed in during construction.
    pub fn source_code(&self) -> &'a str {
        self.original
    }

    /// Scan the source characters and construct the next token.
    ///
    /// ## Implementation
    ///
    /// Each iteration starts with the assumption that the internal cursor
    /// is pointing to the start of the remaining source to be consumed.
    /// Whitespace and all three comment forms are erased before the token
    /// is started.
    ///
    /// When an iteration is done building a token, it must leave the cursor
    /// at the start of the next token's text.
    ///
    /// Once the source is exhausted every call returns an [`TokenKind::EOF`] token.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        use TokenKind as TK;

        self.erase_trivia()?;

        self.start_token();

        if self.cursor.at_end() {
            return Ok(self.make_eof());
        }

        match self.cursor.current() {
            '"' => self.consume_string(),
            '0'..='9' => self.consume_number(),
            '_' | 'a'..='z' | 'A'..='Z' => Ok(self.consume_ident()),
            c => match Symbol::parse(c) {
                Some(symbol) => Ok(self.make_token(TK::Symbol(symbol))),
                None => Ok(self.make_token(TK::Unknown)),
            },
        }
    }

    /// Indicates whether the lexer is at the end of the source.
    pub fn at_end(&self) -> bool {
        self.cursor.at_end()
    }

    /// Create a span using the starting position of the current token,
    /// and the offset just past the cursor's current character.
    fn make_span(&mut self) -> Span {
        let start = self.start_pos;
        let end = self.cursor.peek_offset();

        debug_assert!(end >= start);
        let size = end - start;

        Span { index: start, size }
    }

    fn fragment(&mut self) -> &'a str {
        self.make_span().fragment(self.original)
    }

    /// Primes the lexer to consume the next token.
    fn start_token(&mut self) {
        self.start_pos = self.cursor.offset();
        self.start_line = self.cursor.line();
        self.start_column = self.cursor.column();
    }

    /// Build a token, using the source text from the position
    /// stored by [`start_token`](struct.Lexer.html#fn-start_token) to the
    /// current cursor position.
    ///
    /// Also prepare the cursor for the next iteration.
    fn make_token(&mut self, kind: TokenKind) -> Token {
        let token = Token {
            span: self.make_span(),
            kind,
            line: self.start_line,
            column: self.start_column,
        };

        // Position the cursor to the starting character for the
        // next token, so the lexer's internal state is primed
        // for the next iteration.
        self.cursor.next();
        debug_assert_eq!(self.cursor.offset(), token.span.end());

        token
    }

    fn make_eof(&self) -> Token {
        Token {
            span: Span::new(self.start_pos, 0),
            kind: TokenKind::EOF,
            line: self.start_line,
            column: self.start_column,
        }
    }

    fn error(&self, kind: LexErrorKind) -> LexError {
        LexError::new(kind, self.start_line, self.start_column)
    }
}

/// Trivia.
impl<'a> Lexer<'a> {
    /// Erase whitespace and comments up to the start of the next token.
    fn erase_trivia(&mut self) -> Result<(), LexError> {
        loop {
            while !self.cursor.at_end() && is_whitespace(self.cursor.current()) {
                self.cursor.next();
            }

            if self.cursor.current() == '/' && !self.cursor.at_end() {
                match self.cursor.peek() {
                    '/' => {
                        self.erase_line_comment();
                        continue;
                    }
                    '*' => {
                        self.erase_block_comment()?;
                        continue;
                    }
                    _ => {}
                }
            }

            return Ok(());
        }
    }

    /// Erase comment line up to, but not including, the trailing newline.
    fn erase_line_comment(&mut self) {
        debug_assert_eq!(self.cursor.current(), '/');

        while !self.cursor.at_end() && !is_newline(self.cursor.current()) {
            self.cursor.next();
        }
    }

    /// Erase a `/* ... */` or `/** ... */` comment, including the closing marker.
    fn erase_block_comment(&mut self) -> Result<(), LexError> {
        debug_assert_eq!(self.cursor.current(), '/');

        // Errors point at the opening marker.
        self.start_token();

        // Opening marker
        self.cursor.next();
        self.cursor.next();

        loop {
            if self.cursor.at_end() {
                return Err(self.error(LexErrorKind::UnterminatedComment));
            }

            if self.cursor.current() == '*' && self.cursor.peek() == '/' {
                self.cursor.next();
                self.cursor.next();
                return Ok(());
            }

            self.cursor.next();
        }
    }
}

/// Specialised tokens.
impl<'a> Lexer<'a> {
    /// Make an identifier or keyword token.
    fn consume_ident(&mut self) -> Token {
        debug_assert!(is_letter(self.cursor.current()));

        while is_letter_or_digit(self.cursor.peek()) {
            self.cursor.next();
        }

        // The run is maximal, so a keyword followed by identifier
        // characters stays an identifier.
        let token_kind = match Keyword::parse(self.fragment()) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Ident,
        };

        self.make_token(token_kind)
    }

    /// Make a decimal number literal token.
    fn consume_number(&mut self) -> Result<Token, LexError> {
        debug_assert!(is_digit(self.cursor.current()));

        while is_digit(self.cursor.peek()) {
            self.cursor.next();
        }

        let value = self
            .fragment()
            .parse::<u32>()
            .ok()
            .filter(|value| *value <= MAX_CONSTANT)
            .ok_or_else(|| self.error(LexErrorKind::IntegerOverflow))?;

        Ok(self.make_token(TokenKind::Int(value as u16)))
    }

    /// Make a string literal token, spanning both quotes.
    fn consume_string(&mut self) -> Result<Token, LexError> {
        debug_assert_eq!(self.cursor.current(), '"');

        loop {
            self.cursor.next();

            if self.cursor.at_end() || is_newline(self.cursor.current()) {
                return Err(self.error(LexErrorKind::UnterminatedString));
            }

            if self.cursor.current() == '"' {
                return Ok(self.make_token(TokenKind::Str));
            }
        }
    }
}

/// Test whether the character is considered whitespace
/// that should be ignored by the parser later.
fn is_whitespace(c: char) -> bool {
    matches!(
        c,
        '\u{0020}' // space
            | '\u{0009}' // tab
            | '\u{000A}' // line feed
            | '\u{000D}' // carriage return
            | '\u{000C}' // form feed
            | '\u{00A0}' // no-break space
            | '\u{FEFF}' // zero width no-break space
    )
}

fn is_newline(c: char) -> bool {
    matches!(c, '\r' | '\n')
}

#[allow(clippy::manual_is_ascii_check)] // consistency with other functions
fn is_digit(c: char) -> bool {
    matches!(c, '0'..='9')
}

fn is_letter(c: char) -> bool {
    matches!(c, 'a'..='z' | 'A'..='Z' | '_')
}

fn is_letter_or_digit(c: char) -> bool {
    is_letter(c) || is_digit(c)
}

impl<'a> IntoIterator for Lexer<'a> {
    type Item = Result<Token, LexError>;
    type IntoIter = LexerIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        LexerIter {
            lexer: self,
            done: false,
        }
    }
}

/// Convenience iterator that wraps the lexer.
///
/// Stops after the first EOF token or the first error.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct LexerIter<'a> {
    // Track end so an EOF token is emitted once.
    done: bool,
    lexer: Lexer<'a>,
}

impl<'a> Iterator for LexerIter<'a> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.lexer.next_token();
        match &result {
            Ok(token) if token.kind != TokenKind::EOF => {}
            _ => self.done = true,
        }

        Some(result)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .into_iter()
            .map(|result| result.map(|token| token.kind))
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    fn fragments(source: &str) -> Vec<&str> {
        Lexer::new(source)
            .into_iter()
            .map(|result| result.unwrap())
            .filter(|token| token.kind != TokenKind::EOF)
            .map(|token| token.span.fragment(source))
            .collect()
    }

    #[test]
    fn test_simple_statement() {
        use Symbol as S;
        use TokenKind as TK;

        assert_eq!(
            kinds("let x = a[2];"),
            vec![
                TK::Keyword(Keyword::Let),
                TK::Ident,
                TK::Symbol(S::Eq),
                TK::Ident,
                TK::Symbol(S::LeftBracket),
                TK::Int(2),
                TK::Symbol(S::RightBracket),
                TK::Symbol(S::Semicolon),
                TK::EOF,
            ]
        );
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        use TokenKind as TK;

        assert_eq!(
            kinds("class classy do_it if1 this"),
            vec![
                TK::Keyword(Keyword::Class),
                TK::Ident,
                TK::Ident,
                TK::Ident,
                TK::Keyword(Keyword::This),
                TK::EOF,
            ]
        );
    }

    #[test]
    fn test_comments_are_erased() {
        const CODE: &str = concat!(
            "// line comment\n",
            "/** doc\n * comment */\n",
            "x /* inline */ + // trailing\n",
            "/*/ still comment */ y / z",
        );

        assert_eq!(fragments(CODE), vec!["x", "+", "y", "/", "z"]);
    }

    #[test]
    fn test_string_constant() {
        const CODE: &str = "do Output.printString(\"a // b /* c */\");";

        let strings: Vec<_> = Lexer::new(CODE)
            .into_iter()
            .map(|result| result.unwrap())
            .filter(|token| token.kind == TokenKind::Str)
            .map(|token| token.span.fragment(CODE))
            .collect();

        assert_eq!(strings, vec!["\"a // b /* c */\""]);
    }

    #[test]
    fn test_integer_run() {
        assert_eq!(fragments("123abc"), vec!["123", "abc"]);
        assert_eq!(
            kinds("0 32767"),
            vec![TokenKind::Int(0), TokenKind::Int(32767), TokenKind::EOF]
        );
    }

    #[test]
    fn test_integer_overflow() {
        let err = Lexer::new("let x = 32768;")
            .into_iter()
            .find_map(|result| result.err())
            .unwrap();
        assert_eq!(err, LexError::new(LexErrorKind::IntegerOverflow, 1, 9));
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("\"abc");
        assert_eq!(
            lexer.next_token().unwrap_err().kind,
            LexErrorKind::UnterminatedString
        );

        let mut lexer = Lexer::new("x\n  \"abc\ndef\"");
        lexer.next_token().unwrap();
        assert_eq!(
            lexer.next_token().unwrap_err(),
            LexError::new(LexErrorKind::UnterminatedString, 2, 3)
        );
    }

    #[test]
    fn test_unterminated_comment() {
        let mut lexer = Lexer::new("x /* never closed *");
        lexer.next_token().unwrap();
        assert_eq!(
            lexer.next_token().unwrap_err(),
            LexError::new(LexErrorKind::UnterminatedComment, 1, 3)
        );
    }

    #[test]
    fn test_positions() {
        let tokens: Vec<_> = Lexer::new("class Main {\n  field int x;\n}")
            .into_iter()
            .map(|result| result.unwrap())
            .map(|token| (token.line, token.column))
            .collect();

        assert_eq!(
            tokens,
            vec![(1, 1), (1, 7), (1, 12), (2, 3), (2, 9), (2, 13), (2, 14), (3, 1), (3, 2)]
        );
    }

    #[test]
    fn test_unknown_character() {
        assert_eq!(
            kinds("a @ b"),
            vec![TokenKind::Ident, TokenKind::Unknown, TokenKind::Ident, TokenKind::EOF]
        );
    }

    #[test]
    fn test_trivia_is_inert() {
        const CODE: &str = include_str!("../../tests/Counter.jack");

        let stripped = fragments(CODE).join(" ");
        assert!(!stripped.contains("//"));
        assert_eq!(fragments(&stripped), fragments(CODE));
        assert_eq!(kinds(&stripped), kinds(CODE));
    }

    #[test]
    fn test_eof_repeats() {
        let mut lexer = Lexer::new("  ");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::EOF);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::EOF);
        assert!(lexer.at_end());
    }
}
