pub mod ast;
pub mod lexer;
pub mod lookahead;
pub mod parser;
