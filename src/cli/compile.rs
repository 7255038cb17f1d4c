use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Args;

use jlite::diagnostic::{render_diagnostics, Diagnostic};

/// The CLI surface here is intentionally a stub around the real
/// deliverable (the library): a single positional `.j` path, stage-tagged
/// diagnostics to stderr, nonzero exit on error.
#[derive(Args)]
pub struct CompileArgs {
    /// Input .j source file
    pub input: PathBuf,
    /// Skip the CFG's constant-propagation and algebraic-identity passes
    #[arg(long)]
    pub no_optimize: bool,
    /// Print the lowered IR3 listing on success
    #[arg(long)]
    pub emit_ir3: bool,
}

/// The testable core of `cmd_compile`, split out so tests can drive it
/// without going through `process::exit`.
fn compile_source(
    source: &str,
    optimize: bool,
    emit_ir3: bool,
) -> Result<Option<String>, Vec<Diagnostic>> {
    let output = jlite::compile_with_trace(source, 0, optimize, None)?;
    Ok(emit_ir3.then(|| output.program3.to_string()))
}

pub fn cmd_compile(args: CompileArgs) {
    let source = match fs::read_to_string(&args.input) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("internal: cannot read {}: {err}", args.input.display());
            process::exit(1);
        }
    };
    let filename = args.input.display().to_string();

    match compile_source(&source, !args.no_optimize, args.emit_ir3) {
        Ok(Some(listing)) => println!("{listing}"),
        Ok(None) => {}
        Err(diagnostics) => {
            render_diagnostics(&diagnostics, &filename, &source);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn compiles_a_program_written_to_a_real_file() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        write!(file, "class Main {{ Void main () {{ println(1); }} }}").unwrap();
        let source = fs::read_to_string(file.path()).unwrap();

        let listing = compile_source(&source, true, true)
            .expect("expected a successful compile")
            .expect("expected an IR3 listing");
        assert!(listing.contains("println(1);"));
    }

    #[test]
    fn reports_a_typecheck_error_for_a_real_file() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        write!(file, "class Main {{ Void main () {{ println(x); }} }}").unwrap();
        let source = fs::read_to_string(file.path()).unwrap();

        let diags = compile_source(&source, true, false).expect_err("expected a typecheck error");
        assert_eq!(diags[0].stage, jlite::diagnostic::Stage::TypeCheck);
    }
}
