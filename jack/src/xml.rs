//! Token stream and parse tree dumps in XML.
use std::io;

use crate::{
    error::{JackError, JackResult},
    lex::{Keyword, Lexer, Scanner, Symbol, TokenKind},
};

/// Escape markup characters in element text.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Write the current token as a single line terminal element.
fn write_terminal<W: io::Write>(scanner: &Scanner, indent: usize, out: &mut W) -> JackResult<()> {
    let text = match scanner.current_kind() {
        Some(TokenKind::Str) => scanner.string_value()?,
        Some(TokenKind::Unknown) => return Err(scanner.error("unexpected character")),
        _ => scanner.lexeme()?,
    };
    let tag = scanner.current()?.kind.class_name();

    writeln!(out, "{:indent$}<{tag}> {} </{tag}>", "", escape(text))?;

    Ok(())
}

/// Write every token of the source as one element per line,
/// wrapped in a `<tokens>` root element.
///
/// Lexical errors, and characters that don't form a token,
/// stop the dump with an error.
pub fn write_tokens<W: io::Write>(source_code: &str, mut out: W) -> JackResult<W> {
    let mut scanner = Scanner::new(Lexer::new(source_code));

    writeln!(out, "<tokens>")?;

    while scanner.has_more()? {
        scanner.advance()?;
        write_terminal(&scanner, 0, &mut out)?;
    }

    writeln!(out, "</tokens>")?;

    Ok(out)
}

/// Write the parse tree of one class.
///
/// Each grammar rule becomes an element holding its terminals and
/// nested rules, indented by two spaces per level. Subroutine calls
/// are written flat into the enclosing term or statement.
///
/// The tree is streamed while the class is parsed. On error the output
/// holds a partial tree, which should be discarded.
pub fn write_parse_tree<W: io::Write>(source_code: &str, out: W) -> JackResult<W> {
    let mut tree = TreeWriter {
        scanner: Scanner::new(Lexer::new(source_code)),
        out,
        depth: 0,
    };

    tree.scanner.advance()?;
    tree.class()?;

    Ok(tree.out)
}

struct TreeWriter<'a, W> {
    scanner: Scanner<'a>,
    out: W,
    depth: usize,
}

/// Elements
impl<'a, W: io::Write> TreeWriter<'a, W> {
    fn open(&mut self, tag: &str) -> JackResult<()> {
        writeln!(self.out, "{:indent$}<{tag}>", "", indent = self.depth * 2)?;
        self.depth += 1;
        Ok(())
    }

    fn close(&mut self, tag: &str) -> JackResult<()> {
        self.depth -= 1;
        writeln!(self.out, "{:indent$}</{tag}>", "", indent = self.depth * 2)?;
        Ok(())
    }

    /// Write the current token and move past it.
    fn terminal(&mut self) -> JackResult<()> {
        write_terminal(&self.scanner, self.depth * 2, &mut self.out)?;
        self.scanner.advance()
    }

    #[inline]
    fn is_symbol(&self, symbol: Symbol) -> bool {
        self.scanner.current_kind() == Some(TokenKind::Symbol(symbol))
    }

    #[inline]
    fn is_keyword(&self, keyword: Keyword) -> bool {
        self.scanner.current_kind() == Some(TokenKind::Keyword(keyword))
    }

    fn symbol(&mut self, symbol: Symbol) -> JackResult<()> {
        if !self.is_symbol(symbol) {
            return Err(self.unexpected(&format!("`{symbol}`")));
        }
        self.terminal()
    }

    fn keyword(&mut self, keyword: Keyword) -> JackResult<()> {
        if !self.is_keyword(keyword) {
            return Err(self.unexpected(&format!("`{keyword}`")));
        }
        self.terminal()
    }

    fn identifier(&mut self) -> JackResult<()> {
        self.scanner.identifier()?;
        self.terminal()
    }

    #[inline(never)]
    #[cold]
    fn unexpected(&self, expected: &str) -> JackError {
        match self.scanner.lexeme() {
            Ok(lexeme) => self
                .scanner
                .error(format!("expected {expected}, found `{lexeme}`")),
            Err(err) => err,
        }
    }
}

/// Grammar rules
impl<'a, W: io::Write> TreeWriter<'a, W> {
    fn class(&mut self) -> JackResult<()> {
        self.open("class")?;
        self.keyword(Keyword::Class)?;
        self.identifier()?;
        self.symbol(Symbol::LeftBrace)?;

        while self.is_keyword(Keyword::Static) || self.is_keyword(Keyword::Field) {
            self.class_var_dec()?;
        }

        while matches!(
            self.scanner.current_kind(),
            Some(TokenKind::Keyword(
                Keyword::Constructor | Keyword::Function | Keyword::Method
            ))
        ) {
            self.subroutine_dec()?;
        }

        if !self.is_symbol(Symbol::RightBrace) {
            return Err(self.unexpected("`}` or a subroutine declaration"));
        }

        // Closing brace is the last token, so there is nothing to advance to.
        write_terminal(&self.scanner, self.depth * 2, &mut self.out)?;
        if self.scanner.has_more()? {
            self.scanner.advance()?;
            return Err(self.scanner.error("unexpected token after the end of the class"));
        }

        self.close("class")
    }

    fn class_var_dec(&mut self) -> JackResult<()> {
        self.open("classVarDec")?;
        self.terminal()?;
        self.var_names()?;
        self.close("classVarDec")
    }

    fn var_dec(&mut self) -> JackResult<()> {
        self.open("varDec")?;
        self.keyword(Keyword::Var)?;
        self.var_names()?;
        self.close("varDec")
    }

    /// `type varName (',' varName)* ';'`
    fn var_names(&mut self) -> JackResult<()> {
        self.var_type()?;
        self.identifier()?;
        while self.is_symbol(Symbol::Comma) {
            self.terminal()?;
            self.identifier()?;
        }
        self.symbol(Symbol::Semicolon)
    }

    fn var_type(&mut self) -> JackResult<()> {
        match self.scanner.current_kind() {
            Some(TokenKind::Keyword(Keyword::Int | Keyword::Char | Keyword::Boolean))
            | Some(TokenKind::Ident) => self.terminal(),
            _ => Err(self.unexpected("a type")),
        }
    }

    fn subroutine_dec(&mut self) -> JackResult<()> {
        self.open("subroutineDec")?;
        self.terminal()?;

        if self.is_keyword(Keyword::Void) {
            self.terminal()?;
        } else {
            self.var_type()?;
        }
        self.identifier()?;

        self.symbol(Symbol::LeftParen)?;
        self.parameter_list()?;
        self.symbol(Symbol::RightParen)?;

        self.open("subroutineBody")?;
        self.symbol(Symbol::LeftBrace)?;
        while self.is_keyword(Keyword::Var) {
            self.var_dec()?;
        }
        self.statements()?;
        self.symbol(Symbol::RightBrace)?;
        self.close("subroutineBody")?;

        self.close("subroutineDec")
    }

    fn parameter_list(&mut self) -> JackResult<()> {
        // Written even when there are no parameters.
        self.open("parameterList")?;

        if !self.is_symbol(Symbol::RightParen) {
            loop {
                self.var_type()?;
                self.identifier()?;
                if !self.is_symbol(Symbol::Comma) {
                    break;
                }
                self.terminal()?;
            }
        }

        self.close("parameterList")
    }

    fn statements(&mut self) -> JackResult<()> {
        self.open("statements")?;

        while let Some(TokenKind::Keyword(keyword)) = self.scanner.current_kind() {
            match keyword {
                Keyword::Let => self.let_statement()?,
                Keyword::If => self.if_statement()?,
                Keyword::While => self.while_statement()?,
                Keyword::Do => self.do_statement()?,
                Keyword::Return => self.return_statement()?,
                _ => break,
            }
        }

        self.close("statements")
    }

    fn let_statement(&mut self) -> JackResult<()> {
        self.open("letStatement")?;
        self.terminal()?;
        self.identifier()?;

        if self.is_symbol(Symbol::LeftBracket) {
            self.terminal()?;
            self.expression()?;
            self.symbol(Symbol::RightBracket)?;
        }

        self.symbol(Symbol::Eq)?;
        self.expression()?;
        self.symbol(Symbol::Semicolon)?;
        self.close("letStatement")
    }

    fn if_statement(&mut self) -> JackResult<()> {
        self.open("ifStatement")?;
        self.terminal()?;
        self.condition()?;
        self.block()?;

        if self.is_keyword(Keyword::Else) {
            self.terminal()?;
            self.block()?;
        }

        self.close("ifStatement")
    }

    fn while_statement(&mut self) -> JackResult<()> {
        self.open("whileStatement")?;
        self.terminal()?;
        self.condition()?;
        self.block()?;
        self.close("whileStatement")
    }

    /// `'(' expression ')'`
    fn condition(&mut self) -> JackResult<()> {
        self.symbol(Symbol::LeftParen)?;
        self.expression()?;
        self.symbol(Symbol::RightParen)
    }

    /// `'{' statements '}'`
    fn block(&mut self) -> JackResult<()> {
        self.symbol(Symbol::LeftBrace)?;
        self.statements()?;
        self.symbol(Symbol::RightBrace)
    }

    fn do_statement(&mut self) -> JackResult<()> {
        self.open("doStatement")?;
        self.terminal()?;
        self.subroutine_call()?;
        self.symbol(Symbol::Semicolon)?;
        self.close("doStatement")
    }

    fn return_statement(&mut self) -> JackResult<()> {
        self.open("returnStatement")?;
        self.terminal()?;
        if !self.is_symbol(Symbol::Semicolon) {
            self.expression()?;
        }
        self.symbol(Symbol::Semicolon)?;
        self.close("returnStatement")
    }

    fn expression(&mut self) -> JackResult<()> {
        self.open("expression")?;
        self.term()?;
        while matches!(self.scanner.current_kind(), Some(TokenKind::Symbol(op)) if op.is_binary_op()) {
            self.terminal()?;
            self.term()?;
        }
        self.close("expression")
    }

    fn term(&mut self) -> JackResult<()> {
        self.open("term")?;

        match self.scanner.current_kind() {
            Some(TokenKind::Int(_) | TokenKind::Str) => self.terminal()?,
            Some(TokenKind::Keyword(
                Keyword::True | Keyword::False | Keyword::Null | Keyword::This,
            )) => self.terminal()?,
            Some(TokenKind::Symbol(Symbol::LeftParen)) => {
                self.terminal()?;
                self.expression()?;
                self.symbol(Symbol::RightParen)?;
            }
            Some(TokenKind::Symbol(op)) if op.is_unary_op() => {
                self.terminal()?;
                self.term()?;
            }
            Some(TokenKind::Ident) => match self.scanner.peek()? {
                Some("[") => {
                    self.terminal()?;
                    self.terminal()?;
                    self.expression()?;
                    self.symbol(Symbol::RightBracket)?;
                }
                Some("." | "(") => self.subroutine_call()?,
                _ => self.terminal()?,
            },
            _ => return Err(self.unexpected("a term")),
        }

        self.close("term")
    }

    /// `subroutineName '(' expressionList ')'`, optionally qualified
    /// by a class or variable name.
    fn subroutine_call(&mut self) -> JackResult<()> {
        self.identifier()?;
        if self.is_symbol(Symbol::Dot) {
            self.terminal()?;
            self.identifier()?;
        }
        self.symbol(Symbol::LeftParen)?;
        self.expression_list()?;
        self.symbol(Symbol::RightParen)
    }

    fn expression_list(&mut self) -> JackResult<()> {
        self.open("expressionList")?;

        if !self.is_symbol(Symbol::RightParen) {
            self.expression()?;
            while self.is_symbol(Symbol::Comma) {
                self.terminal()?;
                self.expression()?;
            }
        }

        self.close("expressionList")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn dump(source: &str) -> JackResult<String> {
        write_tokens(source, Vec::new()).map(|out| String::from_utf8(out).unwrap())
    }

    fn tree(source: &str) -> JackResult<String> {
        write_parse_tree(source, Vec::new()).map(|out| String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_token_elements() {
        let xml = dump("class Main { let s = \"a<b\"; /* skip */ if (x < 7) {} }").unwrap();

        assert_eq!(
            xml,
            concat!(
                "<tokens>\n",
                "<keyword> class </keyword>\n",
                "<identifier> Main </identifier>\n",
                "<symbol> { </symbol>\n",
                "<keyword> let </keyword>\n",
                "<identifier> s </identifier>\n",
                "<symbol> = </symbol>\n",
                "<stringConstant> a&lt;b </stringConstant>\n",
                "<symbol> ; </symbol>\n",
                "<keyword> if </keyword>\n",
                "<symbol> ( </symbol>\n",
                "<identifier> x </identifier>\n",
                "<symbol> &lt; </symbol>\n",
                "<integerConstant> 7 </integerConstant>\n",
                "<symbol> ) </symbol>\n",
                "<symbol> { </symbol>\n",
                "<symbol> } </symbol>\n",
                "<symbol> } </symbol>\n",
                "</tokens>\n",
            )
        );
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a & b > \"c\""), "a &amp; b &gt; &quot;c&quot;");
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(dump("// nothing here\n").unwrap(), "<tokens>\n</tokens>\n");
    }

    #[test]
    fn test_errors_propagate() {
        assert!(matches!(dump("let x = 99999;"), Err(JackError::Lex(_))));
        assert!(matches!(dump("let x = $;"), Err(JackError::Syntax(_))));
    }

    #[test]
    fn test_tree_statements_and_terms() {
        let xml = tree(
            "class A { function void f() { var Array a; let a[0] = -x; do B.g(a, \"s\"); return; } }",
        )
        .unwrap();

        assert_eq!(
            xml,
            concat!(
                "<class>\n",
                "  <keyword> class </keyword>\n",
                "  <identifier> A </identifier>\n",
                "  <symbol> { </symbol>\n",
                "  <subroutineDec>\n",
                "    <keyword> function </keyword>\n",
                "    <keyword> void </keyword>\n",
                "    <identifier> f </identifier>\n",
                "    <symbol> ( </symbol>\n",
                "    <parameterList>\n",
                "    </parameterList>\n",
                "    <symbol> ) </symbol>\n",
                "    <subroutineBody>\n",
                "      <symbol> { </symbol>\n",
                "      <varDec>\n",
                "        <keyword> var </keyword>\n",
                "        <identifier> Array </identifier>\n",
                "        <identifier> a </identifier>\n",
                "        <symbol> ; </symbol>\n",
                "      </varDec>\n",
                "      <statements>\n",
                "        <letStatement>\n",
                "          <keyword> let </keyword>\n",
                "          <identifier> a </identifier>\n",
                "          <symbol> [ </symbol>\n",
                "          <expression>\n",
                "            <term>\n",
                "              <integerConstant> 0 </integerConstant>\n",
                "            </term>\n",
                "          </expression>\n",
                "          <symbol> ] </symbol>\n",
                "          <symbol> = </symbol>\n",
                "          <expression>\n",
                "            <term>\n",
                "              <symbol> - </symbol>\n",
                "              <term>\n",
                "                <identifier> x </identifier>\n",
                "              </term>\n",
                "            </term>\n",
                "          </expression>\n",
                "          <symbol> ; </symbol>\n",
                "        </letStatement>\n",
                "        <doStatement>\n",
                "          <keyword> do </keyword>\n",
                "          <identifier> B </identifier>\n",
                "          <symbol> . </symbol>\n",
                "          <identifier> g </identifier>\n",
                "          <symbol> ( </symbol>\n",
                "          <expressionList>\n",
                "            <expression>\n",
                "              <term>\n",
                "                <identifier> a </identifier>\n",
                "              </term>\n",
                "            </expression>\n",
                "            <symbol> , </symbol>\n",
                "            <expression>\n",
                "              <term>\n",
                "                <stringConstant> s </stringConstant>\n",
                "              </term>\n",
                "            </expression>\n",
                "          </expressionList>\n",
                "          <symbol> ) </symbol>\n",
                "          <symbol> ; </symbol>\n",
                "        </doStatement>\n",
                "        <returnStatement>\n",
                "          <keyword> return </keyword>\n",
                "          <symbol> ; </symbol>\n",
                "        </returnStatement>\n",
                "      </statements>\n",
                "      <symbol> } </symbol>\n",
                "    </subroutineBody>\n",
                "  </subroutineDec>\n",
                "  <symbol> } </symbol>\n",
                "</class>\n",
            )
        );
    }

    #[test]
    fn test_tree_empty_class() {
        assert_eq!(
            tree("class E {}").unwrap(),
            concat!(
                "<class>\n",
                "  <keyword> class </keyword>\n",
                "  <identifier> E </identifier>\n",
                "  <symbol> { </symbol>\n",
                "  <symbol> } </symbol>\n",
                "</class>\n",
            )
        );
    }

    #[test]
    fn test_tree_syntax_errors() {
        let err = tree("class A { function void f() { let = 1; } }").unwrap_err();
        match err {
            JackError::Syntax(err) => {
                assert_eq!(err.column, 35);
                assert!(err.message.contains("`=`"), "{}", err.message);
            }
            err => panic!("unexpected error: {err:?}"),
        }

        assert!(matches!(tree("class A { } }"), Err(JackError::Syntax(_))));
        assert!(matches!(tree("class A { field int x"), Err(JackError::Lex(_))));
        assert!(matches!(tree("class A { function void f() { return 1 $ 2; } }"), Err(JackError::Syntax(_))));
    }
}
