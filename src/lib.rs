pub mod config;
pub mod engine;
pub mod error;
pub mod lexing;
pub mod repl;
pub mod scan;
pub mod utils;

pub use config::{ColorMode, Config};
pub use engine::runtime::Interpreter;
pub use engine::value::RuntimeVal;
pub use error::{LoxError, ParseError, RuntimeError};
pub use lexing::ast::Ast;
pub use scan::scanner::Scanned;

use lexing::parser::Parser;
use scan::scanner::Scanner;

pub fn scan(source: &str) -> Scanned {
    Scanner::new(source).scan_tokens()
}

/// Scans and parses `source`. Any bad token fails the whole program before parsing.
pub fn parse(source: &str) -> Result<Ast, LoxError> {
    let scanned = scan(source);
    if scanned.had_error {
        let diagnostics = scanned.errors().filter_map(|t| t.diagnostic()).collect();
        return Err(LoxError::Scan { diagnostics });
    }

    let ast = Parser::new(scanned.tokens).parse()?;
    tracing::trace!(program = %ast, "syntax tree");
    Ok(ast)
}

pub fn run_source(source: &str, interpreter: &mut Interpreter) -> Result<(), LoxError> {
    let ast = parse(source)?;
    interpreter.eval_program(&ast)?;
    Ok(())
}
