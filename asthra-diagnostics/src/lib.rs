// Structured diagnostics for the Asthra front-end
// Accumulates coded errors/warnings with spans and suggestions; rendering
// beyond plain text (colors, snippets) is left to the host driver.

use std::fmt;

/// Source code location (line, column, file)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub length: usize,
}

impl Span {
    pub fn new(file: String, line: usize, column: usize, length: usize) -> Self {
        Self {
            file,
            line,
            column,
            length,
        }
    }

    /// Resolve a byte range in `source` to a line/column span.
    pub fn from_file_and_span(file: &str, source: &str, span: std::ops::Range<usize>) -> Self {
        let start = span.start.min(source.len());
        let before = &source[..start];
        let line = before.chars().filter(|&c| c == '\n').count() + 1;
        let column = before
            .rfind('\n')
            .map_or(before.len() + 1, |pos| before.len() - pos);
        let length = span.end.saturating_sub(span.start).max(1);

        Self {
            file: file.to_string(),
            line,
            column,
            length,
        }
    }

    pub fn unknown() -> Self {
        Self {
            file: "<unknown>".to_string(),
            line: 0,
            column: 0,
            length: 0,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
    Help,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
            Severity::Help => write!(f, "help"),
        }
    }
}

/// Structured diagnostic message
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: u16,
    pub message: String,
    pub span: Span,
    pub notes: Vec<String>,
    pub help: Option<String>,
    pub suggestion: Option<Suggestion>,
}

/// Code suggestion with replacement text
#[derive(Debug, Clone)]
pub struct Suggestion {
    pub message: String,
    pub replacement: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(severity: Severity, code: u16, message: String, span: Span) -> Self {
        Self {
            severity,
            code,
            message,
            span,
            notes: Vec::new(),
            help: None,
            suggestion: None,
        }
    }

    pub fn error(code: u16, message: String, span: Span) -> Self {
        Self::new(Severity::Error, code, message, span)
    }

    pub fn warning(code: u16, message: String, span: Span) -> Self {
        Self::new(Severity::Warning, code, message, span)
    }

    pub fn note(message: String, span: Span) -> Self {
        Self::new(Severity::Note, 0, message, span)
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    pub fn with_suggestion(mut self, message: String, replacement: String, span: Span) -> Self {
        self.suggestion = Some(Suggestion {
            message,
            replacement,
            span,
        });
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}[{}]: {}", self.severity, self.code, self.message)?;
        writeln!(
            f,
            " --> {}:{}:{}",
            self.span.file, self.span.line, self.span.column
        )?;
        for note in &self.notes {
            writeln!(f, " = note: {}", note)?;
        }
        if let Some(help) = &self.help {
            writeln!(f, " = help: {}", help)?;
        }
        if let Some(suggestion) = &self.suggestion {
            writeln!(
                f,
                " = help: {}: `{}`",
                suggestion.message, suggestion.replacement
            )?;
        }
        Ok(())
    }
}

/// Diagnostic collection and reporting engine
#[derive(Debug)]
pub struct DiagnosticEngine {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
    max_errors: usize,
    limit_reached: bool,
}

impl Default for DiagnosticEngine {
    fn default() -> Self {
        Self::new()
    }
}

pub const DEFAULT_MAX_ERRORS: usize = 100;

impl DiagnosticEngine {
    pub fn new() -> Self {
        Self::with_max_errors(DEFAULT_MAX_ERRORS)
    }

    pub fn with_max_errors(max_errors: usize) -> Self {
        Self {
            diagnostics: Vec::new(),
            error_count: 0,
            warning_count: 0,
            max_errors,
            limit_reached: false,
        }
    }

    /// Record a diagnostic. Error-level items past `max_errors` are dropped;
    /// a single terminal note marks the cutoff.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity == Severity::Error {
            if self.error_count >= self.max_errors {
                if !self.limit_reached {
                    self.limit_reached = true;
                    self.diagnostics.push(Diagnostic::note(
                        format!("further errors suppressed after {}", self.max_errors),
                        diagnostic.span.clone(),
                    ));
                }
                return;
            }
            self.error_count += 1;
        } else if diagnostic.severity == Severity::Warning {
            self.warning_count += 1;
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn emit_error(&mut self, code: u16, message: String, span: Span) {
        self.emit(Diagnostic::error(code, message, span));
    }

    pub fn emit_warning(&mut self, code: u16, message: String, span: Span) {
        self.emit(Diagnostic::warning(code, message, span));
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    pub fn at_error_limit(&self) -> bool {
        self.limit_reached
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Merge another engine's diagnostics, preserving source order within
    /// each engine.
    pub fn absorb(&mut self, other: DiagnosticEngine) {
        for diag in other.diagnostics {
            self.emit(diag);
        }
    }

    /// Exit status for the host driver: 0 iff no error-level diagnostics.
    pub fn exit_status(&self) -> i32 {
        if self.has_errors() {
            1
        } else {
            0
        }
    }

    /// Export diagnostics as JSON for IDEs and external tooling.
    pub fn to_json(&self) -> String {
        let mut json = String::from("{\"diagnostics\":[");

        for (i, diag) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                json.push(',');
            }

            json.push_str(&format!(
                "{{\"severity\":\"{}\",\"code\":{},\"message\":\"{}\",\"file\":\"{}\",\"line\":{},\"column\":{},\"length\":{}",
                diag.severity,
                diag.code,
                escape_json(&diag.message),
                escape_json(&diag.span.file),
                diag.span.line,
                diag.span.column,
                diag.span.length
            ));

            if !diag.notes.is_empty() {
                json.push_str(",\"notes\":[");
                for (j, note) in diag.notes.iter().enumerate() {
                    if j > 0 {
                        json.push(',');
                    }
                    json.push_str(&format!("\"{}\"", escape_json(note)));
                }
                json.push(']');
            }

            if let Some(help) = &diag.help {
                json.push_str(&format!(",\"help\":\"{}\"", escape_json(help)));
            }

            json.push('}');
        }

        json.push_str("]}");
        json
    }

    pub fn clear(&mut self) {
        self.diagnostics.clear();
        self.error_count = 0;
        self.warning_count = 0;
        self.limit_reached = false;
    }
}

fn escape_json(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// Helper constructors for common diagnostic patterns
impl DiagnosticEngine {
    pub fn type_mismatch(&mut self, expected: &str, found: &str, span: Span) {
        self.emit(
            Diagnostic::error(
                error_codes::TYPE_MISMATCH,
                "mismatched types".to_string(),
                span,
            )
            .with_note(format!("expected `{}`, found `{}`", expected, found)),
        );
    }

    pub fn undefined_symbol(&mut self, name: &str, span: Span, candidates: &[String]) {
        let mut diag = Diagnostic::error(
            error_codes::UNDEFINED_SYMBOL,
            format!("cannot find `{}` in this scope", name),
            span,
        );

        let similar = fuzzy::find_similar_names(name, candidates, 0.7, 3);
        if !similar.is_empty() {
            diag = diag.with_help(format!("did you mean `{}`?", similar.join("`, `")));
        }

        self.emit(diag);
    }

    pub fn duplicate_symbol(&mut self, name: &str, span: Span) {
        self.emit(Diagnostic::error(
            error_codes::DUPLICATE_SYMBOL,
            format!("`{}` is already declared in this scope", name),
            span,
        ));
    }

    pub fn argument_count_mismatch(&mut self, fn_name: &str, expected: usize, found: usize, span: Span) {
        self.emit(
            Diagnostic::error(
                error_codes::ARGUMENT_COUNT,
                format!(
                    "this function takes {} argument{} but {} {} supplied",
                    expected,
                    if expected == 1 { "" } else { "s" },
                    found,
                    if found == 1 { "was" } else { "were" }
                ),
                span,
            )
            .with_note(format!("function `{}` defined here", fn_name)),
        );
    }
}

/// Numeric error code taxonomy, stable across releases and surfaced to
/// tooling. Lexical 1xxx, syntax 2xxx, semantic 3xxx, grammar/advisory
/// 4xxx, recovery 5xxx, import 6xxx.
pub mod error_codes {
    // Lexical (1xxx)
    pub const INVALID_TOKEN: u16 = 1000;
    pub const UNTERMINATED_STRING: u16 = 1001;
    pub const INVALID_NUMBER: u16 = 1002;
    pub const INVALID_ESCAPE: u16 = 1003;
    pub const STRAY_COMMENT_CLOSE: u16 = 1004;

    // Syntax (2xxx)
    pub const UNEXPECTED_TOKEN: u16 = 2000;
    pub const MISSING_TOKEN: u16 = 2001;
    pub const INVALID_EXPRESSION: u16 = 2002;
    pub const MISSING_TYPE_ANNOTATION: u16 = 2003;
    pub const RESERVED_KEYWORD: u16 = 2004;
    pub const TRAILING_COMMA: u16 = 2005;
    pub const VOID_ARGUMENT_LIST: u16 = 2006;
    pub const POSTFIX_PATH: u16 = 2007;
    pub const UNQUALIFIED_ENUM_PATTERN: u16 = 2008;

    // Semantic (3xxx)
    pub const UNDEFINED_SYMBOL: u16 = 3000;
    pub const DUPLICATE_SYMBOL: u16 = 3001;
    pub const TYPE_MISMATCH: u16 = 3002;
    pub const INVALID_OPERATION: u16 = 3003;
    pub const INVALID_RETURN: u16 = 3004;
    pub const INVALID_PATTERN: u16 = 3005;
    pub const UNSUPPORTED_CONSTRUCT: u16 = 3006;
    pub const ARGUMENT_COUNT: u16 = 3007;
    pub const UNKNOWN_MEMBER: u16 = 3008;
    pub const IMMUTABLE_ASSIGN: u16 = 3009;
    pub const UNSAFE_REQUIRED: u16 = 3010;

    // Grammar / advisory (4xxx)
    pub const UNREACHABLE_CODE: u16 = 4001;
    pub const NON_EXHAUSTIVE_MATCH: u16 = 4002;
    pub const UNUSED_IMPORT: u16 = 4003;
    pub const UNINITIALIZED_READ: u16 = 4004;

    // Recovery (5xxx)
    pub const PARSE_RECOVERY: u16 = 5000;
    pub const RECOVERY_LIMIT: u16 = 5001;

    // Import (6xxx)
    pub const UNKNOWN_MODULE_ALIAS: u16 = 6000;
    pub const DUPLICATE_MODULE_ALIAS: u16 = 6001;
}

/// Fuzzy matching utilities for "did you mean?" suggestions
pub mod fuzzy {
    use strsim::jaro_winkler;

    /// Find similar names using Jaro-Winkler distance.
    /// Returns up to `max_suggestions` names with similarity > threshold.
    pub fn find_similar_names(
        target: &str,
        candidates: &[String],
        threshold: f64,
        max_suggestions: usize,
    ) -> Vec<String> {
        let mut scored: Vec<(String, f64)> = candidates
            .iter()
            .map(|candidate| {
                let similarity = jaro_winkler(target, candidate);
                (candidate.clone(), similarity)
            })
            .filter(|(_, score)| *score > threshold)
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .take(max_suggestions)
            .map(|(name, _)| name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_from_byte_range() {
        let source = "fn main(none) -> void {\n    let x: i32 = 0;\n}";
        let offset = source.find("let").unwrap();
        let span = Span::from_file_and_span("main.asthra", source, offset..offset + 3);

        assert_eq!(span.line, 2);
        assert_eq!(span.column, 5);
        assert_eq!(span.length, 3);
    }

    #[test]
    fn test_diagnostic_display() {
        let span = Span::new("test.asthra".to_string(), 2, 21, 7);
        let diag = Diagnostic::error(error_codes::TYPE_MISMATCH, "mismatched types".to_string(), span)
            .with_note("expected `i32`, found `string`".to_string());

        let formatted = diag.to_string();
        assert!(formatted.contains("error[3002]"));
        assert!(formatted.contains("test.asthra:2:21"));
        assert!(formatted.contains("expected `i32`, found `string`"));
    }

    #[test]
    fn test_error_limit() {
        let mut engine = DiagnosticEngine::with_max_errors(2);
        for i in 0..5 {
            engine.emit_error(
                error_codes::UNEXPECTED_TOKEN,
                format!("error {}", i),
                Span::unknown(),
            );
        }

        assert_eq!(engine.error_count(), 2);
        assert!(engine.at_error_limit());
        // 2 errors + 1 terminal note
        assert_eq!(engine.diagnostics().len(), 3);
    }

    #[test]
    fn test_warnings_do_not_fail_unit() {
        let mut engine = DiagnosticEngine::new();
        engine.emit_warning(
            error_codes::NON_EXHAUSTIVE_MATCH,
            "match may not be exhaustive".to_string(),
            Span::unknown(),
        );

        assert!(!engine.has_errors());
        assert_eq!(engine.exit_status(), 0);
        assert_eq!(engine.warning_count(), 1);
    }

    #[test]
    fn test_to_json_is_valid() {
        let mut engine = DiagnosticEngine::new();
        engine.emit_error(
            error_codes::UNDEFINED_SYMBOL,
            "cannot find `foo` in this scope".to_string(),
            Span::new("a.asthra".to_string(), 1, 1, 3),
        );

        let json = engine.to_json();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["diagnostics"][0]["code"], 3000);
    }

    #[test]
    fn test_fuzzy_suggestions() {
        let candidates = vec![
            "range".to_string(),
            "panic".to_string(),
            "log".to_string(),
        ];
        let similar = fuzzy::find_similar_names("rnge", &candidates, 0.7, 3);
        assert_eq!(similar, vec!["range".to_string()]);
    }
}
