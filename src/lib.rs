pub mod lexer;
pub mod parser;
pub mod ast;
pub mod codegen;
pub mod compiler;

pub mod cli;
