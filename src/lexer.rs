use crate::diagnostic::{Diagnostic, Stage};
use crate::lexeme::Lexeme;
use crate::span::{Span, Spanned};

/// Sub-states of a string literal's escape grammar. `\x` needs exactly two
/// hex digits and `\d` (decimal) needs exactly three digits before the
/// string resumes its normal state; other escapes (`\n \t \b \r \" \\`)
/// resolve in a single step. Modeled as an explicit enum rather than a flat
/// loop because the lookahead genuinely varies by escape kind.
#[derive(Clone, Copy, PartialEq, Eq)]
enum StringState {
    Normal,
    Backslash,
    Hex(u8),     // digits consumed so far, need 2
    Decimal(u8), // digits consumed so far, need 3
}

pub struct Lexer<'src> {
    source: &'src [u8],
    file_id: u16,
    pos: usize,
    line: u32,
    line_start: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str, file_id: u16) -> Self {
        Self {
            source: source.as_bytes(),
            file_id,
            pos: 0,
            line: 1,
            line_start: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> (Vec<Spanned<Lexeme>>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let is_eof = tok.node == Lexeme::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
            if !self.diagnostics.is_empty() {
                // Unterminated strings/comments and out-of-range integer
                // literals are unrecoverable: stop at the first one rather
                // than attempting error recovery. Unrecognized bytes never
                // reach here: they are skipped in next_token without being
                // recorded as a diagnostic at all.
                break;
            }
        }
        (tokens, self.diagnostics)
    }

    fn next_token(&mut self) -> Spanned<Lexeme> {
        loop {
            self.skip_whitespace_and_comments();

            if self.pos >= self.source.len() {
                return self.make_token(Lexeme::Eof, self.pos, self.pos);
            }

            let start = self.pos;
            let ch = self.source[self.pos];

            if is_ident_start(ch) {
                return self.scan_ident_or_keyword();
            }
            if ch.is_ascii_digit() {
                return self.scan_number();
            }
            if ch == b'"' {
                return self.scan_string();
            }

            if let Some(tok) = self.scan_symbol(start) {
                return tok;
            }
            // An unrecognized byte (or a lone '&'/'|') has no transition out
            // of the start state: skip it and keep scanning for the next
            // lexeme, producing no diagnostic.
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.pos < self.source.len() && self.source[self.pos].is_ascii_whitespace() {
                self.advance_byte();
            }

            if self.pos + 1 < self.source.len()
                && self.source[self.pos] == b'/'
                && self.source[self.pos + 1] == b'/'
            {
                while self.pos < self.source.len() && self.source[self.pos] != b'\n' {
                    self.advance_byte();
                }
                continue;
            }

            if self.pos + 1 < self.source.len()
                && self.source[self.pos] == b'/'
                && self.source[self.pos + 1] == b'*'
            {
                self.skip_block_comment();
                continue;
            }

            break;
        }
    }

    /// Skips a `/* ... */` comment, tracking nesting depth so `/* /* */ */`
    /// closes only at the outer `*/`.
    fn skip_block_comment(&mut self) {
        let start = self.pos;
        self.advance_byte(); // '/'
        self.advance_byte(); // '*'
        let mut depth: u32 = 1;
        while depth > 0 {
            if self.pos >= self.source.len() {
                self.diagnostics.push(Diagnostic::error(
                    Stage::Lex,
                    "unterminated block comment".to_string(),
                    self.span_from(start),
                ));
                return;
            }
            if self.pos + 1 < self.source.len()
                && self.source[self.pos] == b'/'
                && self.source[self.pos + 1] == b'*'
            {
                depth += 1;
                self.advance_byte();
                self.advance_byte();
            } else if self.pos + 1 < self.source.len()
                && self.source[self.pos] == b'*'
                && self.source[self.pos + 1] == b'/'
            {
                depth -= 1;
                self.advance_byte();
                self.advance_byte();
            } else {
                self.advance_byte();
            }
        }
    }

    fn scan_ident_or_keyword(&mut self) -> Spanned<Lexeme> {
        let start = self.pos;
        let line = self.line;
        let col = (self.pos - self.line_start) as u32;
        while self.pos < self.source.len() && is_ident_continue(self.source[self.pos]) {
            self.advance_byte();
        }
        let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap();
        let token = Lexeme::from_keyword(text).unwrap_or_else(|| {
            if text.as_bytes()[0].is_ascii_uppercase() {
                Lexeme::ClassName(text.to_string())
            } else {
                Lexeme::Ident(text.to_string())
            }
        });
        self.make_token_at(token, start, self.pos, line, col)
    }

    fn scan_number(&mut self) -> Spanned<Lexeme> {
        let start = self.pos;
        let line = self.line;
        let col = (self.pos - self.line_start) as u32;
        while self.pos < self.source.len() && self.source[self.pos].is_ascii_digit() {
            self.advance_byte();
        }
        let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap();
        match text.parse::<i32>() {
            Ok(n) => self.make_token_at(Lexeme::IntegerLiteral(n), start, self.pos, line, col),
            Err(_) => {
                self.diagnostics.push(Diagnostic::error(
                    Stage::Lex,
                    format!("integer literal '{}' out of range", text),
                    self.span_from(start),
                ));
                self.make_token_at(Lexeme::IntegerLiteral(0), start, self.pos, line, col)
            }
        }
    }

    /// Scans a `"..."` string literal, following the escape sub-state
    /// machine of the original lexer: `\n \t \b \r \" \\` resolve in one
    /// step, `\xHH` needs exactly two hex digits, and `\ddd` needs exactly
    /// three decimal digits before the string resumes.
    fn scan_string(&mut self) -> Spanned<Lexeme> {
        let start = self.pos;
        let line = self.line;
        let col = (self.pos - self.line_start) as u32;
        self.advance_byte(); // opening quote

        let mut value = String::new();
        let mut state = StringState::Normal;
        let mut pending_digits = String::new();

        loop {
            if self.pos >= self.source.len() || self.source[self.pos] == b'\n' {
                self.diagnostics.push(Diagnostic::error(
                    Stage::Lex,
                    "unterminated string literal".to_string(),
                    self.span_from(start),
                ));
                return self.make_token_at(
                    Lexeme::StringLiteral(value),
                    start,
                    self.pos,
                    line,
                    col,
                );
            }

            let ch = self.source[self.pos];
            match state {
                StringState::Normal => {
                    if ch == b'"' {
                        self.advance_byte();
                        return self.make_token_at(
                            Lexeme::StringLiteral(value),
                            start,
                            self.pos,
                            line,
                            col,
                        );
                    } else if ch == b'\\' {
                        state = StringState::Backslash;
                        self.advance_byte();
                    } else {
                        value.push(ch as char);
                        self.advance_byte();
                    }
                }
                StringState::Backslash => match ch {
                    b'n' => {
                        value.push('\n');
                        state = StringState::Normal;
                        self.advance_byte();
                    }
                    b't' => {
                        value.push('\t');
                        state = StringState::Normal;
                        self.advance_byte();
                    }
                    b'b' => {
                        value.push('\u{8}');
                        state = StringState::Normal;
                        self.advance_byte();
                    }
                    b'r' => {
                        value.push('\r');
                        state = StringState::Normal;
                        self.advance_byte();
                    }
                    b'"' => {
                        value.push('"');
                        state = StringState::Normal;
                        self.advance_byte();
                    }
                    b'\\' => {
                        value.push('\\');
                        state = StringState::Normal;
                        self.advance_byte();
                    }
                    b'x' => {
                        state = StringState::Hex(0);
                        pending_digits.clear();
                        self.advance_byte();
                    }
                    b'0'..=b'9' => {
                        state = StringState::Decimal(0);
                        pending_digits.clear();
                        // reprocess this digit under Decimal below
                    }
                    other => {
                        self.diagnostics.push(Diagnostic::error(
                            Stage::Lex,
                            format!("unknown escape sequence '\\{}'", other as char),
                            self.span_from(self.pos.saturating_sub(1)),
                        ));
                        return self.make_token_at(
                            Lexeme::StringLiteral(value),
                            start,
                            self.pos,
                            line,
                            col,
                        );
                    }
                },
                StringState::Hex(count) => {
                    if ch.is_ascii_hexdigit() && count < 2 {
                        pending_digits.push(ch as char);
                        self.advance_byte();
                        if count + 1 == 2 {
                            let byte = u8::from_str_radix(&pending_digits, 16).unwrap_or(0);
                            value.push(byte as char);
                            state = StringState::Normal;
                        } else {
                            state = StringState::Hex(count + 1);
                        }
                    } else {
                        self.diagnostics.push(Diagnostic::error(
                            Stage::Lex,
                            "\\x escape requires exactly two hex digits".to_string(),
                            self.span_from(self.pos),
                        ));
                        return self.make_token_at(
                            Lexeme::StringLiteral(value),
                            start,
                            self.pos,
                            line,
                            col,
                        );
                    }
                }
                StringState::Decimal(count) => {
                    if ch.is_ascii_digit() && count < 3 {
                        pending_digits.push(ch as char);
                        self.advance_byte();
                        if count + 1 == 3 {
                            let byte: u32 = pending_digits.parse().unwrap_or(0);
                            value.push(char::from_u32(byte.min(255)).unwrap_or('\0'));
                            state = StringState::Normal;
                        } else {
                            state = StringState::Decimal(count + 1);
                        }
                    } else {
                        self.diagnostics.push(Diagnostic::error(
                            Stage::Lex,
                            "\\ decimal escape requires exactly three digits".to_string(),
                            self.span_from(self.pos),
                        ));
                        return self.make_token_at(
                            Lexeme::StringLiteral(value),
                            start,
                            self.pos,
                            line,
                            col,
                        );
                    }
                }
            }
        }
    }

    /// Scans a single operator/punctuation token starting at `start`.
    /// Returns `None` for a byte with no valid transition out of the lexer's
    /// start state (an unrecognized byte, or a lone `&`/`|` not paired into
    /// `&&`/`||`): the byte is consumed and the caller resumes scanning,
    /// mirroring the original lexer's DFA, which simply drops such bytes and
    /// restarts from its start state rather than raising an error.
    fn scan_symbol(&mut self, start: usize) -> Option<Spanned<Lexeme>> {
        let line = self.line;
        let col = (self.pos - self.line_start) as u32;
        let ch = self.source[self.pos];
        self.advance_byte();

        let token = match ch {
            b'(' => Lexeme::LParen,
            b')' => Lexeme::RParen,
            b'{' => Lexeme::LBrace,
            b'}' => Lexeme::RBrace,
            b',' => Lexeme::Comma,
            b';' => Lexeme::Semicolon,
            b'.' => Lexeme::Dot,
            b'+' => Lexeme::Plus,
            b'-' => Lexeme::Minus,
            b'*' => Lexeme::Star,
            b'/' => Lexeme::Slash,
            b'=' => {
                if self.peek() == Some(b'=') {
                    self.advance_byte();
                    Lexeme::Eq
                } else {
                    Lexeme::Assign
                }
            }
            b'!' => {
                if self.peek() == Some(b'=') {
                    self.advance_byte();
                    Lexeme::Ne
                } else {
                    Lexeme::Not
                }
            }
            b'<' => {
                if self.peek() == Some(b'=') {
                    self.advance_byte();
                    Lexeme::Le
                } else {
                    Lexeme::Lt
                }
            }
            b'>' => {
                if self.peek() == Some(b'=') {
                    self.advance_byte();
                    Lexeme::Ge
                } else {
                    Lexeme::Gt
                }
            }
            b'&' => {
                if self.peek() == Some(b'&') {
                    self.advance_byte();
                    Lexeme::And
                } else {
                    return None;
                }
            }
            b'|' => {
                if self.peek() == Some(b'|') {
                    self.advance_byte();
                    Lexeme::Or
                } else {
                    return None;
                }
            }
            _ => return None,
        };

        Some(self.make_token_at(token, start, self.pos, line, col))
    }

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn advance_byte(&mut self) {
        if self.pos < self.source.len() {
            if self.source[self.pos] == b'\n' {
                self.line += 1;
                self.line_start = self.pos + 1;
            }
            self.pos += 1;
        }
    }

    fn span_from(&self, start: usize) -> Span {
        // Column is relative to the line the token started on, not
        // necessarily the lexer's current line (a string may span lines
        // before failing, but we report at the start for unterminated cases).
        Span::new(
            self.file_id,
            start as u32,
            self.pos as u32,
            self.line,
            (start.saturating_sub(self.line_start)) as u32,
        )
    }

    fn make_token(&self, token: Lexeme, start: usize, end: usize) -> Spanned<Lexeme> {
        self.make_token_at(token, start, end, self.line, (start - self.line_start) as u32)
    }

    fn make_token_at(
        &self,
        token: Lexeme,
        start: usize,
        end: usize,
        line: u32,
        col: u32,
    ) -> Spanned<Lexeme> {
        Spanned::new(
            token,
            Span::new(self.file_id, start as u32, end as u32, line, col),
        )
    }
}

fn is_ident_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

fn is_ident_continue(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_'
}
