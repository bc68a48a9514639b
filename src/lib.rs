pub mod ast;
pub mod catalog;
pub mod completer;
pub mod config;
pub mod favorites;
pub mod lexer;
pub mod parser;
pub mod replace;
pub mod resolver;
pub mod session;
pub mod sql_compiler;
pub mod token;
