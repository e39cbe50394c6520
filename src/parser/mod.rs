//! BSL parsing: source text in, statement tree out.
//!
//! Graph construction only depends on the [`ModuleParser`] trait, so the
//! hand-written [`BslParser`] can be swapped for any other implementation
//! that produces a [`ModuleTree`].

pub mod ast;
mod globals;
mod grammar;
pub mod lexer;

use thiserror::Error;

pub use ast::{
    CallChainStatement, FunctionKind, FunctionOrProcedure, MethodStatement, ModuleTree, Statement,
};
pub use globals::is_global_function;

/// UTF-8 byte-order mark.
pub const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// A syntax error with its 1-based position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}, column {column}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

/// Turns source text into a module tree.
pub trait ModuleParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<ModuleTree, ParseError>;
}

/// The built-in recursive-descent parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct BslParser;

impl ModuleParser for BslParser {
    fn parse(&self, text: &str) -> Result<ModuleTree, ParseError> {
        let tokens = lexer::tokenize(text)?;
        grammar::Parser::new(tokens).parse_module()
    }
}

/// Drop a leading UTF-8 BOM, if any.
pub fn strip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(UTF8_BOM).unwrap_or(data)
}
