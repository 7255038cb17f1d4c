mod basics;
mod overloads;

use crate::diagnostic::Diagnostic;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::typecheck::{ClassTable, TypeChecker};

pub(super) fn check(source: &str) -> Result<ClassTable, Vec<Diagnostic>> {
    let (tokens, lex_diags) = Lexer::new(source, 0).tokenize();
    assert!(lex_diags.is_empty(), "lex errors: {:?}", lex_diags);
    let program = Parser::new(tokens).parse_file().expect("parse errors");
    TypeChecker::new().check_program(&program)
}

pub(super) fn check_err(source: &str) -> Vec<Diagnostic> {
    match check(source) {
        Ok(_) => vec![],
        Err(diags) => diags,
    }
}
