//! A compiler front end for JLite: lexer, recursive-descent parser,
//! multi-pass type checker, IR3 three-address lowering, and CFG
//! construction with two intra-block optimizations.
//!
//! Pipeline: `bytes -> Lexer -> tokens -> Parser -> AST -> TypeChecker
//! -> ClassTable -> IR3 lowering -> Program3 -> CFG + optimize`. Every
//! stage returns `Result<_, Vec<Diagnostic>>` and stops at the first
//! error; there is no error recovery.

pub mod ast;
pub mod cfg;
pub mod diagnostic;
pub mod ir3;
pub mod lexeme;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod typecheck;
pub mod types;

use std::fmt::Write as _;

use diagnostic::Diagnostic;
use lexer::Lexer;
use parser::Parser;
use typecheck::TypeChecker;

/// Everything produced by a successful compilation: the lowered IR3
/// program and, for every method, its control-flow graph.
pub struct CompileOutput {
    pub program3: ir3::Program3,
    pub cfgs: Vec<(String, cfg::Cfg)>,
}

/// Run the full pipeline with CFG optimization enabled, no trace output.
pub fn compile(source: &str, file_id: u16) -> Result<CompileOutput, Vec<Diagnostic>> {
    compile_with_trace(source, file_id, true, None)
}

/// Run the full pipeline, optionally narrating each stage to `trace` as it
/// runs. This is the teacher's `debug: bool` + injected-sink pattern
/// (`original_source/control_flow.py`'s own `debug` flag) rather than a
/// logging-crate dependency: the trace sink is a constructor-style
/// argument, not global logger state.
pub fn compile_with_trace(
    source: &str,
    file_id: u16,
    optimize: bool,
    mut trace: Option<&mut dyn std::fmt::Write>,
) -> Result<CompileOutput, Vec<Diagnostic>> {
    let (tokens, lex_diags) = Lexer::new(source, file_id).tokenize();
    if let Some(sink) = trace.as_deref_mut() {
        let _ = writeln!(sink, "lex: {} tokens", tokens.len());
    }
    if !lex_diags.is_empty() {
        return Err(lex_diags);
    }

    let program = Parser::new(tokens).parse_file().map_err(|diags| {
        if let Some(sink) = trace.as_deref_mut() {
            let _ = writeln!(sink, "parse: {} errors", diags.len());
        }
        diags
    })?;
    if let Some(sink) = trace.as_deref_mut() {
        let _ = writeln!(sink, "parse: {} classes", program.classes.len());
    }

    let class_table = TypeChecker::new().check_program(&program).map_err(|diags| {
        if let Some(sink) = trace.as_deref_mut() {
            let _ = writeln!(sink, "typecheck: {} errors", diags.len());
        }
        diags
    })?;
    if let Some(sink) = trace.as_deref_mut() {
        let _ = writeln!(sink, "typecheck: ok");
    }

    let mut program3 = ir3::lower_program(&program, &class_table);
    if let Some(sink) = trace.as_deref_mut() {
        let _ = writeln!(sink, "ir3: {} methods lowered", program3.methods.len());
    }

    let mut cfgs = Vec::with_capacity(program3.methods.len());
    for method in &mut program3.methods {
        let built = cfg::build_and_optimize(method, optimize);
        if let Some(sink) = trace.as_deref_mut() {
            let _ = writeln!(sink, "cfg: {} -> {} basic blocks", method.method_id, built.block_count);
        }
        cfgs.push((method.method_id.clone(), built));
    }

    Ok(CompileOutput { program3, cfgs })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_a_minimal_program() {
        let result = compile("class Main { Void main () { println(1); } }", 0);
        let output = result.expect("expected a successful compile");
        assert_eq!(output.program3.methods.len(), 1);
        assert_eq!(output.cfgs.len(), 1);
    }

    #[test]
    fn stops_at_the_first_typecheck_error() {
        let result = compile("class Main { Void main () { println(x); } }", 0);
        let diags = result.expect_err("expected a typecheck error");
        assert_eq!(diags[0].stage, diagnostic::Stage::TypeCheck);
    }

    #[test]
    fn trace_sink_receives_a_line_per_stage() {
        let mut trace = String::new();
        let result = compile_with_trace("class Main { Void main () { println(1); } }", 0, true, Some(&mut trace));
        assert!(result.is_ok());
        assert!(trace.contains("lex:"));
        assert!(trace.contains("typecheck: ok"));
        assert!(trace.contains("cfg:"));
    }
}
