//! Textual VM instruction emitter.
use std::{fmt, io};

/// Addressable memory region of the virtual machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

impl Segment {
    #[rustfmt::skip]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Argument => "argument",
            Self::Local    => "local",
            Self::Static   => "static",
            Self::This     => "this",
            Self::That     => "that",
            Self::Pointer  => "pointer",
            Self::Temp     => "temp",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arithmetic and logical stack commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Add,
    Sub,
    /// Arithmetic negation
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    /// Bitwise not
    Not,
    ShiftLeft,
    ShiftRight,
}

impl Command {
    #[rustfmt::skip]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add        => "add",
            Self::Sub        => "sub",
            Self::Neg        => "neg",
            Self::Eq         => "eq",
            Self::Gt         => "gt",
            Self::Lt         => "lt",
            Self::And        => "and",
            Self::Or         => "or",
            Self::Not        => "not",
            Self::ShiftLeft  => "shiftleft",
            Self::ShiftRight => "shiftright",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Writes one VM instruction per line to the output.
///
/// Nothing is buffered or validated here; the caller is
/// responsible for emitting well formed segments and names.
pub struct VmWriter<W> {
    out: W,
}

impl<W: io::Write> VmWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Unwrap the underlying output.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, line: fmt::Arguments) -> io::Result<()> {
        log::trace!("{line}");
        self.out.write_fmt(line)?;
        self.out.write_all(b"\n")
    }

    pub fn write_push(&mut self, segment: Segment, index: u16) -> io::Result<()> {
        self.emit(format_args!("push {segment} {index}"))
    }

    pub fn write_pop(&mut self, segment: Segment, index: u16) -> io::Result<()> {
        self.emit(format_args!("pop {segment} {index}"))
    }

    pub fn write_arithmetic(&mut self, command: Command) -> io::Result<()> {
        self.emit(format_args!("{command}"))
    }

    pub fn write_label(&mut self, label: &str) -> io::Result<()> {
        self.emit(format_args!("label {label}"))
    }

    pub fn write_goto(&mut self, label: &str) -> io::Result<()> {
        self.emit(format_args!("goto {label}"))
    }

    pub fn write_if(&mut self, label: &str) -> io::Result<()> {
        self.emit(format_args!("if-goto {label}"))
    }

    pub fn write_call(&mut self, name: &str, arg_count: u16) -> io::Result<()> {
        self.emit(format_args!("call {name} {arg_count}"))
    }

    pub fn write_function(&mut self, name: &str, local_count: u16) -> io::Result<()> {
        self.emit(format_args!("function {name} {local_count}"))
    }

    pub fn write_return(&mut self) -> io::Result<()> {
        self.emit(format_args!("return"))
    }
}
