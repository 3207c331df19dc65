//! Character cursor over source text.
use itertools::{multipeek, MultiPeek};
use std::str::CharIndices;

/// Returned by the cursor when it is positioned past the last character.
///
/// Source text may contain a literal null character, so
/// [`Cursor::at_end`] is the authority on end-of-file.
pub const EOF_CHAR: char = '\0';

pub struct Cursor<'a> {
    /// Iterator over UTF-8 encoded source code.
    ///
    /// `MultiPeek` buffers ahead so the lexer can inspect the character
    /// after the current one when deciding between `/`, `//` and `/*`.
    /// The peek cursor offset is restored by `next()` and `reset_peek()`.
    chars: MultiPeek<CharIndices<'a>>,
    /// Byte offset and value of the current character.
    current: (u32, char),
    /// Size of the source in bytes.
    len: u32,
    line: u32,
    column: u32,
}

impl<'a> Cursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            chars: multipeek(text.char_indices()),
            current: (0, EOF_CHAR),
            len: text.len() as u32,
            line: 1,
            column: 0,
        }
    }

    /// Advance to the next character and return it.
    ///
    /// Returns `None` once the end of the source is reached, and the
    /// cursor stays positioned there.
    pub fn next(&mut self) -> Option<char> {
        match self.chars.next() {
            Some((index, c)) => {
                if self.current.1 == '\n' {
                    self.line += 1;
                    self.column = 1;
                } else {
                    self.column += 1;
                }
                self.current = (index as u32, c);
                Some(c)
            }
            None => {
                if !self.at_end() {
                    self.column += 1;
                }
                self.current = (self.len, EOF_CHAR);
                None
            }
        }
    }

    /// Character under the cursor.
    #[inline]
    pub fn current(&self) -> char {
        self.current.1
    }

    /// Character after the current one, without advancing.
    #[inline]
    pub fn peek(&mut self) -> char {
        self.chars.reset_peek();
        let c = self.chars.peek().map(|(_, c)| *c).unwrap_or(EOF_CHAR);
        self.chars.reset_peek();
        c
    }

    /// Byte offset of the current character.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.current.0
    }

    /// Byte offset of the character after the current one,
    /// or the source length when the current character is the last.
    #[inline]
    pub fn peek_offset(&mut self) -> u32 {
        self.chars.reset_peek();
        let offset = self
            .chars
            .peek()
            .map(|(i, _)| *i as u32)
            .unwrap_or(self.len);
        self.chars.reset_peek();
        offset
    }

    #[inline]
    pub fn at_end(&self) -> bool {
        self.current.0 >= self.len
    }

    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    #[inline]
    pub fn column(&self) -> u32 {
        self.column
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cursor_positions() {
        let mut cursor = Cursor::new("ab\ncd");
        cursor.next();
        assert_eq!((cursor.current(), cursor.line(), cursor.column()), ('a', 1, 1));
        assert_eq!(cursor.peek(), 'b');
        assert_eq!(cursor.peek_offset(), 1);

        cursor.next();
        cursor.next();
        assert_eq!((cursor.current(), cursor.line(), cursor.column()), ('\n', 1, 3));

        cursor.next();
        assert_eq!((cursor.current(), cursor.line(), cursor.column()), ('c', 2, 1));

        cursor.next();
        assert_eq!(cursor.peek(), EOF_CHAR);
        assert_eq!(cursor.peek_offset(), 5);
        assert_eq!(cursor.next(), None);
        assert!(cursor.at_end());
        assert_eq!(cursor.offset(), 5);
    }

    #[test]
    fn test_cursor_multibyte() {
        let mut cursor = Cursor::new("é!");
        cursor.next();
        assert_eq!(cursor.current(), 'é');
        assert_eq!(cursor.peek_offset(), 2);
        cursor.next();
        assert_eq!((cursor.current(), cursor.offset()), ('!', 2));
    }

    #[test]
    fn test_cursor_empty() {
        let mut cursor = Cursor::new("");
        assert_eq!(cursor.next(), None);
        assert!(cursor.at_end());
        assert_eq!(cursor.current(), EOF_CHAR);
    }
}
