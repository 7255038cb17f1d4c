use crate::span::Span;

/// Which pipeline stage raised a diagnostic. Every user-visible error names
/// its stage, per the CLI contract in §6/§9 of the spec: "a one-line
/// diagnostic naming the stage (lex/parse/typecheck) and the offending
/// token/identifier with line and column".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Lex,
    Parse,
    TypeCheck,
    Internal,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Lex => "lex",
            Stage::Parse => "parse",
            Stage::TypeCheck => "typecheck",
            Stage::Internal => "internal",
        }
    }
}

/// A compiler diagnostic (error or warning).
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub stage: Stage,
    pub message: String,
    pub span: Span,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Diagnostic {
    pub fn error(stage: Stage, message: String, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            stage,
            message,
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn warning(stage: Stage, message: String, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            stage,
            message,
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    /// The one-line form the CLI prints: `stage: message (line:col)`.
    pub fn one_line(&self) -> String {
        format!(
            "{}: {} ({}:{})",
            self.stage.as_str(),
            self.message,
            self.span.line,
            self.span.col
        )
    }

    /// Render the diagnostic to stderr using ariadne, for a richer
    /// source-mapped report in addition to the one-line form above.
    pub fn render(&self, filename: &str, source: &str) {
        use ariadne::{Color, Label, Report, ReportKind, Source};

        let kind = match self.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
        };
        let color = match self.severity {
            Severity::Error => Color::Red,
            Severity::Warning => Color::Yellow,
        };

        let mut report = Report::build(kind, filename, self.span.start as usize)
            .with_message(&self.message)
            .with_label(
                Label::new((filename, self.span.start as usize..self.span.end as usize))
                    .with_message(&self.message)
                    .with_color(color),
            );

        for note in &self.notes {
            report = report.with_note(note);
        }
        if let Some(help) = &self.help {
            report = report.with_help(help);
        }

        report
            .finish()
            .eprint((filename, Source::from(source)))
            .unwrap();
    }
}

/// Render a list of diagnostics: the required one-line form to stderr for
/// every diagnostic, followed by the fuller ariadne report.
pub fn render_diagnostics(diagnostics: &[Diagnostic], filename: &str, source: &str) {
    for diag in diagnostics {
        eprintln!("{}", diag.one_line());
        diag.render(filename, source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_construction() {
        let span = Span::new(0, 10, 15, 2, 3);
        let d = Diagnostic::error(Stage::Lex, "bad byte".to_string(), span);
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.stage, Stage::Lex);
        assert!(d.notes.is_empty());
        assert!(d.help.is_none());
    }

    #[test]
    fn warning_construction() {
        let d = Diagnostic::warning(Stage::TypeCheck, "unused variable".to_string(), Span::dummy());
        assert_eq!(d.severity, Severity::Warning);
        assert_eq!(d.stage, Stage::TypeCheck);
    }

    #[test]
    fn one_line_format() {
        let span = Span::new(0, 0, 1, 4, 7);
        let d = Diagnostic::error(
            Stage::TypeCheck,
            "undeclared variable 'x'".to_string(),
            span,
        );
        assert_eq!(d.one_line(), "typecheck: undeclared variable 'x' (4:7)");
    }

    #[test]
    fn with_note_and_help_chain() {
        let d = Diagnostic::error(Stage::Parse, "unexpected token".to_string(), Span::dummy())
            .with_note("expected ';'".to_string())
            .with_help("add a semicolon".to_string());
        assert_eq!(d.notes, vec!["expected ';'".to_string()]);
        assert_eq!(d.help.as_deref(), Some("add a semicolon"));
    }

    #[test]
    fn render_does_not_panic() {
        let source = "class Main { Void main(){ x = 1; } }\n";
        let d = Diagnostic::error(
            Stage::TypeCheck,
            "undeclared variable 'x'".to_string(),
            Span::new(0, 27, 28, 1, 27),
        );
        d.render("test.j", source);
    }

    #[test]
    fn render_diagnostics_multiple() {
        let source = "class Main { Void main(){ println(x); } }\n";
        let diagnostics = vec![
            Diagnostic::error(Stage::TypeCheck, "undeclared variable 'x'".to_string(), Span::new(0, 34, 35, 1, 34)),
        ];
        render_diagnostics(&diagnostics, "test.j", source);
    }
}
