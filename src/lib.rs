//! Compiles arithmetic expressions (`+ - * /`, parentheses, numbers) into a
//! JavaScript program printing their value.
//!
//! Source text goes through [`frontend::lexer`], [`frontend::parser`] and
//! [`backend::js_backend`] in turn. The remaining modules make up the
//! command line driver.

pub mod backend;
pub mod cli;
pub mod compile;
pub mod config;
pub mod frontend;
pub mod repl;
mod stack;

pub use backend::js_backend::{generate, BackendError};
pub use compile::{compile_str, CompileError, Compiled};
pub use frontend::{
    ast::Node,
    lexer::{tokenize, LexerError, Ops, Token, Value},
    lookahead::{Lookahead, LookaheadError},
    parser::{parse, ParserError},
};
