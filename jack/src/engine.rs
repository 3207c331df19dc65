//! Single pass compilation engine.
//!
//! One method per grammar rule. Each method expects the scanner's current
//! token to be the first token of its rule, and leaves the current token
//! on the first token after it. Code is emitted as soon as a construct is
//! recognised; nothing is buffered or patched afterwards.
use smol_str::SmolStr;
use std::io;

use crate::{
    constants::*,
    error::{JackError, JackResult, SourceError},
    lex::{Keyword, Scanner, Symbol, TokenKind},
    symbol::{Defined, SymbolKind, SymbolTable},
    vm_writer::{Command, Segment, VmWriter},
};

/// Compiler configuration parameters.
#[derive(Debug, Default, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CompileConf {
    /// Reject a second declaration of a name in the same scope,
    /// instead of silently keeping the first one.
    pub strict_declarations: bool,
}

/// Compiles one class from a token scanner into VM instructions.
pub struct CompileEngine<'a, W> {
    scanner: Scanner<'a>,
    writer: VmWriter<W>,
    symbols: SymbolTable,
    conf: CompileConf,
    class_name: SmolStr,
    /// Suffix for generated labels, shared by all control flow
    /// constructs so labels are unique across the class.
    label_counter: usize,
}

/// Binary operator, emitted after both operands.
#[derive(Debug, Clone, Copy)]
enum BinaryOp {
    Command(Command),
    /// Two argument library routine.
    Call(&'static str),
}

#[rustfmt::skip]
fn binary_op(symbol: Symbol) -> Option<BinaryOp> {
    use BinaryOp as B;
    match symbol {
        Symbol::Plus    => Some(B::Command(Command::Add)),
        Symbol::Minus   => Some(B::Command(Command::Sub)),
        Symbol::Amp     => Some(B::Command(Command::And)),
        Symbol::Pipe    => Some(B::Command(Command::Or)),
        Symbol::Eq      => Some(B::Command(Command::Eq)),
        Symbol::Greater => Some(B::Command(Command::Gt)),
        Symbol::Less    => Some(B::Command(Command::Lt)),
        Symbol::Star    => Some(B::Call(MATH_MULTIPLY)),
        Symbol::Slash   => Some(B::Call(MATH_DIVIDE)),
        _ => None,
    }
}

#[rustfmt::skip]
fn unary_op(symbol: Symbol) -> Option<Command> {
    match symbol {
        Symbol::Minus => Some(Command::Neg),
        Symbol::Tilde => Some(Command::Not),
        Symbol::Caret => Some(Command::ShiftLeft),
        Symbol::Hash  => Some(Command::ShiftRight),
        _ => None,
    }
}

impl<'a, W: io::Write> CompileEngine<'a, W> {
    pub fn new(scanner: Scanner<'a>, writer: VmWriter<W>, conf: CompileConf) -> Self {
        Self {
            scanner,
            writer,
            symbols: SymbolTable::new(),
            conf,
            class_name: SmolStr::default(),
            label_counter: 0,
        }
    }

    /// Compile the class and hand back the output.
    ///
    /// The scanner must not have been advanced yet. Any error aborts
    /// the whole unit, and output written so far must be discarded.
    pub fn compile(mut self) -> JackResult<W> {
        self.scanner.advance()?;
        self.compile_class()?;
        Ok(self.writer.into_inner())
    }
}

/// Token matching
impl<'a, W: io::Write> CompileEngine<'a, W> {
    #[inline]
    fn is_symbol(&self, symbol: Symbol) -> bool {
        self.scanner.current_kind() == Some(TokenKind::Symbol(symbol))
    }

    #[inline]
    fn is_keyword(&self, keyword: Keyword) -> bool {
        self.scanner.current_kind() == Some(TokenKind::Keyword(keyword))
    }

    /// Move past the current token.
    #[inline]
    fn bump(&mut self) -> JackResult<()> {
        self.scanner.advance()
    }

    fn expect_symbol(&mut self, symbol: Symbol) -> JackResult<()> {
        if !self.is_symbol(symbol) {
            return Err(self.unexpected(&format!("`{symbol}`")));
        }
        self.bump()
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> JackResult<()> {
        if !self.is_keyword(keyword) {
            return Err(self.unexpected(&format!("`{keyword}`")));
        }
        self.bump()
    }

    fn expect_identifier(&mut self) -> JackResult<SmolStr> {
        let name = SmolStr::new(self.scanner.identifier()?);
        self.bump()?;
        Ok(name)
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

    /// Build a non-syntax diagnostic pointing at the current token.
    #[cold]
    fn error_with(&self, wrap: fn(SourceError) -> JackError, message: impl ToString) -> JackError {
        match self.scanner.current() {
            Ok(token) => wrap(SourceError::new(self.scanner.source_code(), token, message)),
            Err(err) => err,
        }
    }

    fn next_label_id(&mut self) -> usize {
        let id = self.label_counter;
        self.label_counter += 1;
        id
    }
}

/// Declarations
impl<'a, W: io::Write> CompileEngine<'a, W> {
    /// `'class' className '{' classVarDec* subroutineDec* '}'`
    fn compile_class(&mut self) -> JackResult<()> {
        self.expect_keyword(Keyword::Class)?;
        self.class_name = self.expect_identifier()?;
        log::debug!("compiling class {}", self.class_name);
        self.expect_symbol(Symbol::LeftBrace)?;

        while self.is_keyword(Keyword::Static) || self.is_keyword(Keyword::Field) {
            self.compile_class_var_dec()?;
        }

        while matches!(
            self.scanner.current_kind(),
            Some(TokenKind::Keyword(
                Keyword::Constructor | Keyword::Function | Keyword::Method
            ))
        ) {
            self.compile_subroutine()?;
        }

        if !self.is_symbol(Symbol::RightBrace) {
            return Err(self.unexpected("`}` or a subroutine declaration"));
        }

        // The closing brace must be the last token of the unit.
        if self.scanner.has_more()? {
            self.bump()?;
            return Err(self.scanner.error("unexpected token after the end of the class"));
        }

        Ok(())
    }

    /// `('static' | 'field') type varName (',' varName)* ';'`
    fn compile_class_var_dec(&mut self) -> JackResult<()> {
        let kind = match self.scanner.keyword()? {
            Keyword::Static => SymbolKind::Static,
            Keyword::Field => SymbolKind::Field,
            _ => return Err(self.unexpected("`static` or `field`")),
        };
        self.bump()?;

        let ty = self.compile_type()?;
        self.compile_var_names(&ty, kind)
    }

    /// `'var' type varName (',' varName)* ';'`
    fn compile_var_dec(&mut self) -> JackResult<()> {
        self.expect_keyword(Keyword::Var)?;
        let ty = self.compile_type()?;
        self.compile_var_names(&ty, SymbolKind::Local)
    }

    /// `varName (',' varName)* ';'`
    fn compile_var_names(&mut self, ty: &str, kind: SymbolKind) -> JackResult<()> {
        loop {
            self.declare(ty, kind)?;
            if !self.is_symbol(Symbol::Comma) {
                break;
            }
            self.bump()?;
        }
        self.expect_symbol(Symbol::Semicolon)
    }

    /// Define the identifier under the cursor, then move past it.
    fn declare(&mut self, ty: &str, kind: SymbolKind) -> JackResult<()> {
        let name = self.scanner.identifier()?;

        match self.symbols.define(name, ty, kind) {
            Defined::Inserted => {}
            Defined::Duplicate if self.conf.strict_declarations => {
                return Err(self.error_with(
                    JackError::DuplicateSymbol,
                    format!("`{name}` is already declared in this scope"),
                ));
            }
            Defined::Duplicate => log::debug!("ignoring redeclaration of `{name}`"),
            Defined::Exhausted => {
                return Err(self.error_with(
                    JackError::Unsupported,
                    format!("too many {kind:?} variables to declare `{name}`"),
                ));
            }
        }

        self.bump()
    }

    /// `'int' | 'char' | 'boolean' | className`
    fn compile_type(&mut self) -> JackResult<SmolStr> {
        let ty = match self.scanner.current_kind() {
            Some(TokenKind::Keyword(
                keyword @ (Keyword::Int | Keyword::Char | Keyword::Boolean),
            )) => SmolStr::new(keyword.as_str()),
            Some(TokenKind::Ident) => SmolStr::new(self.scanner.lexeme()?),
            _ => return Err(self.unexpected("a type")),
        };
        self.bump()?;
        Ok(ty)
    }

    /// `('constructor' | 'function' | 'method') ('void' | type) subroutineName
    ///  '(' parameterList ')' '{' varDec* statements '}'`
    fn compile_subroutine(&mut self) -> JackResult<()> {
        let subroutine_kind = self.scanner.keyword()?;
        self.bump()?;

        // Return type is not checked.
        if self.is_keyword(Keyword::Void) {
            self.bump()?;
        } else {
            self.compile_type()?;
        }

        let name = self.expect_identifier()?;
        let full_name = format!("{}.{}", self.class_name, name);
        log::debug!("compiling {subroutine_kind} {full_name}");

        self.symbols.start_subroutine();
        if subroutine_kind == Keyword::Method {
            self.symbols
                .define(RECEIVER, &self.class_name, SymbolKind::Argument);
        }

        self.expect_symbol(Symbol::LeftParen)?;
        self.compile_parameter_list()?;
        self.expect_symbol(Symbol::RightParen)?;

        self.expect_symbol(Symbol::LeftBrace)?;
        while self.is_keyword(Keyword::Var) {
            self.compile_var_dec()?;
        }

        let local_count = self.symbols.var_count(SymbolKind::Local);
        self.writer.write_function(&full_name, local_count)?;

        match subroutine_kind {
            Keyword::Constructor => {
                let field_count = self.symbols.var_count(SymbolKind::Field);
                self.writer.write_push(Segment::Constant, field_count)?;
                self.writer.write_call(MEMORY_ALLOC, 1)?;
                self.writer.write_pop(Segment::Pointer, POINTER_THIS)?;
            }
            Keyword::Method => {
                self.writer.write_push(Segment::Argument, 0)?;
                self.writer.write_pop(Segment::Pointer, POINTER_THIS)?;
            }
            _ => {}
        }

        self.compile_statements()?;
        self.expect_symbol(Symbol::RightBrace)
    }

    /// `((type varName) (',' type varName)*)?`
    fn compile_parameter_list(&mut self) -> JackResult<()> {
        if self.is_symbol(Symbol::RightParen) {
            return Ok(());
        }

        loop {
            let ty = self.compile_type()?;
            self.declare(&ty, SymbolKind::Argument)?;

            if !self.is_symbol(Symbol::Comma) {
                return Ok(());
            }
            self.bump()?;
        }
    }
}

/// Statements
impl<'a, W: io::Write> CompileEngine<'a, W> {
    /// `statement*`
    fn compile_statements(&mut self) -> JackResult<()> {
        while let Some(TokenKind::Keyword(
            keyword @ (Keyword::Let | Keyword::If | Keyword::While | Keyword::Do | Keyword::Return),
        )) = self.scanner.current_kind()
        {
            self.compile_statement(keyword)?;
        }
        Ok(())
    }

    fn compile_statement(&mut self, keyword: Keyword) -> JackResult<()> {
        match keyword {
            Keyword::Let => self.compile_let(),
            Keyword::If => self.compile_if(),
            Keyword::While => self.compile_while(),
            Keyword::Do => self.compile_do(),
            Keyword::Return => self.compile_return(),
            _ => Err(self.unexpected("a statement")),
        }
    }

    /// `'let' varName ('[' expression ']')? '=' expression ';'`
    fn compile_let(&mut self) -> JackResult<()> {
        self.expect_keyword(Keyword::Let)?;

        let name = self.scanner.identifier()?;
        let (segment, index) = self.resolve(name)?;
        self.bump()?;

        if self.is_symbol(Symbol::LeftBracket) {
            self.bump()?;

            self.writer.write_push(segment, index)?;
            self.compile_expression()?;
            self.expect_symbol(Symbol::RightBracket)?;
            self.writer.write_arithmetic(Command::Add)?;

            self.expect_symbol(Symbol::Eq)?;
            self.compile_expression()?;

            // Park the value in `temp 0` before repointing `that`.
            self.writer.write_pop(Segment::Temp, SCRATCH_TEMP)?;
            self.writer.write_pop(Segment::Pointer, POINTER_THAT)?;
            self.writer.write_push(Segment::Temp, SCRATCH_TEMP)?;
            self.writer.write_pop(Segment::That, 0)?;
        } else {
            self.expect_symbol(Symbol::Eq)?;
            self.compile_expression()?;
            self.writer.write_pop(segment, index)?;
        }

        self.expect_symbol(Symbol::Semicolon)
    }

    /// `'if' '(' expression ')' '{' statements '}' ('else' '{' statements '}')?`
    fn compile_if(&mut self) -> JackResult<()> {
        let id = self.next_label_id();
        let else_label = format!("else_lbl{id}");
        let done_label = format!("if_done{id}");

        self.expect_keyword(Keyword::If)?;
        self.expect_symbol(Symbol::LeftParen)?;
        self.compile_expression()?;
        self.expect_symbol(Symbol::RightParen)?;

        self.writer.write_arithmetic(Command::Not)?;
        self.writer.write_if(&else_label)?;

        self.compile_block()?;
        self.writer.write_goto(&done_label)?;
        self.writer.write_label(&else_label)?;

        if self.is_keyword(Keyword::Else) {
            self.bump()?;
            self.compile_block()?;
        }

        self.writer.write_label(&done_label)?;
        Ok(())
    }

    /// `'while' '(' expression ')' '{' statements '}'`
    fn compile_while(&mut self) -> JackResult<()> {
        let id = self.next_label_id();
        let top_label = format!("while{id}");
        let end_label = format!("while_end{id}");

        self.expect_keyword(Keyword::While)?;
        self.writer.write_label(&top_label)?;

        self.expect_symbol(Symbol::LeftParen)?;
        self.compile_expression()?;
        self.expect_symbol(Symbol::RightParen)?;

        self.writer.write_arithmetic(Command::Not)?;
        self.writer.write_if(&end_label)?;

        self.compile_block()?;
        self.writer.write_goto(&top_label)?;
        self.writer.write_label(&end_label)?;
        Ok(())
    }

    /// `'{' statements '}'`
    fn compile_block(&mut self) -> JackResult<()> {
        self.expect_symbol(Symbol::LeftBrace)?;
        self.compile_statements()?;
        self.expect_symbol(Symbol::RightBrace)
    }

    /// `'do' subroutineCall ';'`
    fn compile_do(&mut self) -> JackResult<()> {
        self.expect_keyword(Keyword::Do)?;

        let name = self.expect_identifier()?;
        self.compile_subroutine_call(&name)?;

        // Every subroutine returns a value, void ones included.
        self.writer.write_pop(Segment::Temp, SCRATCH_TEMP)?;

        self.expect_symbol(Symbol::Semicolon)
    }

    /// `'return' expression? ';'`
    fn compile_return(&mut self) -> JackResult<()> {
        self.expect_keyword(Keyword::Return)?;

        if self.is_symbol(Symbol::Semicolon) {
            self.writer.write_push(Segment::Constant, 0)?;
        } else {
            self.compile_expression()?;
        }
        self.writer.write_return()?;

        self.expect_symbol(Symbol::Semicolon)
    }
}

/// Expressions
impl<'a, W: io::Write> CompileEngine<'a, W> {
    /// `term (op term)*`
    ///
    /// Operators have no precedence. Each is applied as soon as its right
    /// operand is on the stack, so `a + b * c` computes `(a + b) * c`.
    fn compile_expression(&mut self) -> JackResult<()> {
        self.compile_term()?;

        while let Some(op) = self.current_binary_op() {
            self.bump()?;
            self.compile_term()?;

            match op {
                BinaryOp::Command(command) => self.writer.write_arithmetic(command)?,
                BinaryOp::Call(routine) => self.writer.write_call(routine, 2)?,
            }
        }

        Ok(())
    }

    fn current_binary_op(&self) -> Option<BinaryOp> {
        match self.scanner.current_kind() {
            Some(TokenKind::Symbol(symbol)) => binary_op(symbol),
            _ => None,
        }
    }

    /// `integerConstant | stringConstant | keywordConstant | varName |
    ///  varName '[' expression ']' | subroutineCall | '(' expression ')' | unaryOp term`
    fn compile_term(&mut self) -> JackResult<()> {
        match self.scanner.current_kind() {
            Some(TokenKind::Int(_)) => {
                let value = self.scanner.int_value()?;
                self.writer.write_push(Segment::Constant, value)?;
                self.bump()
            }
            Some(TokenKind::Str) => {
                let text = self.scanner.string_value()?;
                self.compile_string(text)?;
                self.bump()
            }
            Some(TokenKind::Keyword(_)) => {
                let keyword = self.scanner.keyword()?;
                self.compile_keyword_constant(keyword)?;
                self.bump()
            }
            Some(TokenKind::Symbol(_)) => match self.scanner.symbol()? {
                Symbol::LeftParen => {
                    self.bump()?;
                    self.compile_expression()?;
                    self.expect_symbol(Symbol::RightParen)
                }
                symbol => match unary_op(symbol) {
                    Some(command) => {
                        self.bump()?;
                        self.compile_term()?;
                        self.writer.write_arithmetic(command)?;
                        Ok(())
                    }
                    None => Err(self.unexpected("a term")),
                },
            },
            Some(TokenKind::Ident) => self.compile_name_term(),
            _ => Err(self.unexpected("a term")),
        }
    }

    /// `'true' | 'false' | 'null' | 'this'`
    fn compile_keyword_constant(&mut self, keyword: Keyword) -> JackResult<()> {
        match keyword {
            Keyword::True => {
                // All bits set.
                self.writer.write_push(Segment::Constant, 1)?;
                self.writer.write_arithmetic(Command::Neg)?;
            }
            Keyword::False | Keyword::Null => {
                self.writer.write_push(Segment::Constant, 0)?;
            }
            Keyword::This => {
                self.writer.write_push(Segment::Pointer, POINTER_THIS)?;
            }
            _ => return Err(self.unexpected("a term")),
        }
        Ok(())
    }

    /// Build a string object one character at a time.
    fn compile_string(&mut self, text: &str) -> JackResult<()> {
        if let Some(c) = text.chars().find(|c| u32::from(*c) > MAX_CONSTANT) {
            return Err(self.error_with(
                JackError::Unsupported,
                format!("character {c:?} in string constant exceeds the constant range"),
            ));
        }

        let length = u16::try_from(text.chars().count())
            .ok()
            .filter(|length| u32::from(*length) <= MAX_CONSTANT)
            .ok_or_else(|| self.error_with(JackError::Unsupported, "string constant is too long"))?;

        self.writer.write_push(Segment::Constant, length)?;
        self.writer.write_call(STRING_NEW, 1)?;

        for c in text.chars() {
            self.writer.write_push(Segment::Constant, u32::from(c) as u16)?;
            self.writer.write_call(STRING_APPEND_CHAR, 2)?;
        }

        Ok(())
    }

    /// Term starting with an identifier.
    ///
    /// The token after the name decides between an array element,
    /// a subroutine call and a plain variable.
    fn compile_name_term(&mut self) -> JackResult<()> {
        let name = self.scanner.identifier()?;

        match self.scanner.peek()? {
            Some("[") => {
                let (segment, index) = self.resolve(name)?;
                self.bump()?;
                self.bump()?;

                self.writer.write_push(segment, index)?;
                self.compile_expression()?;
                self.expect_symbol(Symbol::RightBracket)?;

                self.writer.write_arithmetic(Command::Add)?;
                self.writer.write_pop(Segment::Pointer, POINTER_THAT)?;
                self.writer.write_push(Segment::That, 0)?;
                Ok(())
            }
            Some("." | "(") => {
                self.bump()?;
                self.compile_subroutine_call(name)
            }
            _ => {
                let (segment, index) = self.resolve(name)?;
                self.writer.write_push(segment, index)?;
                self.bump()
            }
        }
    }

    /// `subroutineName '(' expressionList ')' |
    ///  (className | varName) '.' subroutineName '(' expressionList ')'`
    ///
    /// The leading name has already been consumed.
    fn compile_subroutine_call(&mut self, name: &str) -> JackResult<()> {
        let (callee, receiver_count) = if self.is_symbol(Symbol::Dot) {
            self.bump()?;
            let subroutine = self.expect_identifier()?;

            match self.symbols.type_of(name) {
                Some(ty) => {
                    // Method on an object, passed as the first argument.
                    let callee = format!("{ty}.{subroutine}");
                    let (segment, index) = self.resolve(name)?;
                    self.writer.write_push(segment, index)?;
                    (callee, 1)
                }
                // Otherwise the name is a class, and this is a function or constructor.
                None => (format!("{name}.{subroutine}"), 0),
            }
        } else {
            // Unqualified calls are methods on the current object.
            self.writer.write_push(Segment::Pointer, POINTER_THIS)?;
            (format!("{}.{}", self.class_name, name), 1)
        };

        self.expect_symbol(Symbol::LeftParen)?;
        let arg_count = self.compile_expression_list()?;
        self.expect_symbol(Symbol::RightParen)?;

        let arg_count = arg_count
            .checked_add(receiver_count)
            .ok_or_else(|| self.error_with(JackError::Unsupported, "too many arguments"))?;
        self.writer.write_call(&callee, arg_count)?;
        Ok(())
    }

    /// `(expression (',' expression)*)?`
    ///
    /// Returns the number of expressions compiled.
    fn compile_expression_list(&mut self) -> JackResult<u16> {
        if self.is_symbol(Symbol::RightParen) {
            return Ok(0);
        }

        let mut count: u16 = 0;
        loop {
            self.compile_expression()?;
            count = count
                .checked_add(1)
                .ok_or_else(|| self.error_with(JackError::Unsupported, "too many arguments"))?;

            if !self.is_symbol(Symbol::Comma) {
                return Ok(count);
            }
            self.bump()?;
        }
    }

    /// Segment and index of a declared variable.
    fn resolve(&self, name: &str) -> JackResult<(Segment, u16)> {
        match (self.symbols.kind_of(name), self.symbols.index_of(name)) {
            (Some(kind), Some(index)) => Ok((kind.segment(), index)),
            _ => Err(self.error_with(
                JackError::UndefinedSymbol,
                format!("`{name}` is not declared"),
            )),
        }
    }
}
