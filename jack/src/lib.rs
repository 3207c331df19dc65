pub mod constants;
mod engine;
mod error;
pub mod lex;
mod symbol;
mod vm_writer;
pub mod xml;

use std::io;

use self::{
    engine::{CompileConf, CompileEngine},
    error::{JackError, JackResult},
    lex::{Lexer, Scanner},
    vm_writer::VmWriter,
};

pub const IMPL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compile one class to VM instruction text, with the default configuration.
pub fn compile(source_code: impl AsRef<str>) -> JackResult<String> {
    compile_with(source_code, CompileConf::default())
}

pub fn compile_with(source_code: impl AsRef<str>, conf: CompileConf) -> JackResult<String> {
    let out = compile_to(source_code.as_ref(), conf, Vec::new())?;
    String::from_utf8(out).map_err(|err| JackError::Io(io::Error::new(io::ErrorKind::InvalidData, err)))
}

/// Compile one class, streaming instructions into the given output.
///
/// On error the output may hold a partial translation, which should be discarded.
pub fn compile_to<W: io::Write>(source_code: &str, conf: CompileConf, out: W) -> JackResult<W> {
    let scanner = Scanner::new(Lexer::new(source_code));
    CompileEngine::new(scanner, VmWriter::new(out), conf).compile()
}

pub mod prelude {
    pub use super::{
        engine::{CompileConf, CompileEngine},
        error::{JackError, JackResult, LexError, LexErrorKind, SourceError},
        symbol::{Defined, Symbol, SymbolKind, SymbolTable},
        vm_writer::{Command, Segment, VmWriter},
    };
}
