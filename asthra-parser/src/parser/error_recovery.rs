// Error recovery - continue parsing after errors and collect multiple
// diagnostics instead of stopping at the first one. Recovery happens only
// at statement boundaries (see Parser::synchronize_statement) and at
// declaration boundaries (here).

use super::Parser;
use crate::ParseError;
use asthra_ast::Program;
use asthra_diagnostics::{error_codes, Diagnostic, Span};
use asthra_lexer::Token;

impl<'a> Parser<'a> {
    /// Parse with panic-mode recovery, returning the (possibly partial)
    /// program plus every collected diagnostic.
    pub fn parse_with_recovery(&mut self) -> (Program, Vec<Diagnostic>) {
        self.options.allow_incomplete_parse = true;

        let program = match self.parse_program() {
            Ok(program) => program,
            Err(err) => {
                // Only the error cap bails out of recovery mode; keep what
                // diagnostics we have and return an empty spine.
                self.record(err);
                Program {
                    package: None,
                    imports: Vec::new(),
                    decls: Vec::new(),
                }
            }
        };

        (program, self.diagnostics.diagnostics().to_vec())
    }

    /// Record the error and resynchronize, or bail out when recovery is
    /// disabled / the error cap was hit.
    pub(crate) fn recover_or_bail(&mut self, err: ParseError) -> Result<(), ParseError> {
        if !self.options.allow_incomplete_parse {
            return Err(err);
        }
        self.record(err);
        if self.diagnostics.at_error_limit() {
            // Stop scanning; jump to the Eof sentinel.
            self.current = self.tokens.len() - 1;
        } else {
            self.recover_to_next_decl();
        }
        Ok(())
    }

    /// Convert a parse error into a coded diagnostic (attaching the fix-it
    /// payloads the code calls for) and record it.
    pub(crate) fn record(&mut self, err: ParseError) {
        let span = Span::from_file_and_span(&self.file_name, self.source, err.span());
        let mut diagnostic = Diagnostic::error(err.code(), err.message(), span.clone());

        match err.code() {
            error_codes::UNQUALIFIED_ENUM_PATTERN => {
                diagnostic = diagnostic.with_suggestion(
                    "qualify the variant with its enum".to_string(),
                    "Option.Some(x) / Result.Ok(x)".to_string(),
                    span,
                );
            }
            error_codes::VOID_ARGUMENT_LIST => {
                diagnostic = diagnostic.with_suggestion(
                    "use the `none` marker".to_string(),
                    "none".to_string(),
                    span,
                );
            }
            error_codes::MISSING_TYPE_ANNOTATION => {
                diagnostic = diagnostic
                    .with_help("every let declaration carries a type: let x: i32 = …".to_string());
            }
            _ => {}
        }

        self.diagnostics.emit(diagnostic);
    }

    pub(crate) fn emit_lex_diagnostics(&mut self) {
        let errors = std::mem::take(&mut self.lex_errors);
        for err in errors {
            let wrapped = ParseError::Lex(err);
            let span = Span::from_file_and_span(&self.file_name, self.source, wrapped.span());
            self.diagnostics
                .emit(Diagnostic::error(wrapped.code(), wrapped.message(), span));
        }
    }

    /// Skip to the next declaration boundary, balancing braces on the way.
    fn recover_to_next_decl(&mut self) {
        let start = self.current;
        let mut depth = 0usize;

        while !self.is_at_end() {
            match self.peek() {
                Token::Fn
                | Token::Struct
                | Token::Enum
                | Token::Impl
                | Token::Extern
                | Token::Import
                | Token::Package
                | Token::Pub
                | Token::Priv
                | Token::Hash
                    if depth == 0 =>
                {
                    break;
                }
                Token::LBrace => {
                    depth += 1;
                    self.advance();
                }
                Token::RBrace => {
                    self.advance();
                    if depth <= 1 {
                        break;
                    }
                    depth -= 1;
                }
                Token::Semicolon => {
                    self.advance();
                    if depth == 0 {
                        break;
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }

        // The failure may sit exactly on a declaration keyword; force
        // progress so the program loop cannot spin on it.
        if self.current == start && !self.is_at_end() {
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovery_collects_multiple_errors() {
        let source = r#"
            pub fn valid1(none) -> i32 { return 42; }
            pub fn broken1( { bad syntax }
            pub fn valid2(none) -> i32 { return 100; }
            pub fn broken2(none) -> { another error
            pub fn valid3(none) -> i32 { return 200; }
        "#;

        let mut parser = Parser::new(source, "recovery.asthra");
        let (program, diagnostics) = parser.parse_with_recovery();

        assert!(diagnostics.len() >= 2, "expected at least 2 diagnostics");
        // Functions before and after the first breakage survive recovery
        // (broken2's unmatched '{' legitimately swallows what follows it).
        let names: Vec<_> = program
            .decls
            .iter()
            .filter_map(|d| match d {
                asthra_ast::Decl::Function(f) => Some(f.name.as_str()),
                _ => None,
            })
            .collect();
        assert!(names.contains(&"valid1"));
        assert!(names.contains(&"valid2"));
    }

    #[test]
    fn test_recovery_resumes_at_statement_boundary() {
        let source = r#"
            pub fn f(none) -> i32 {
                let broken = 3;
                let ok: i32 = 1;
                return ok;
            }
        "#;

        let mut parser = Parser::new(source, "stmt.asthra");
        let (program, diagnostics) = parser.parse_with_recovery();

        // The missing ':' on the first let is reported...
        assert!(diagnostics
            .iter()
            .any(|d| d.code == error_codes::MISSING_TYPE_ANNOTATION));
        // ...and the rest of the body still parses.
        let func = match &program.decls[0] {
            asthra_ast::Decl::Function(f) => f,
            other => panic!("expected function, got {:?}", other),
        };
        assert!(func.body.statements.len() >= 2);
    }

    #[test]
    fn test_strict_mode_stops_at_first_error() {
        let source = "pub fn f(none) -> i32 { let x = 1; return x; }";
        let mut parser = Parser::with_options(
            source,
            "strict.asthra",
            crate::ParserOptions {
                allow_incomplete_parse: false,
                max_errors: 10,
            },
        );

        let err = parser.parse_program().unwrap_err();
        assert_eq!(err.code(), error_codes::MISSING_TYPE_ANNOTATION);
        assert_eq!(
            err.message(),
            "Expected ':' after variable name in declaration"
        );
    }

    #[test]
    fn test_lexical_errors_become_diagnostics() {
        let source = "pub fn f(none) -> i32 { let x: i32 = 0b2; return x; }";
        let mut parser = Parser::new(source, "lex.asthra");
        let (_, diagnostics) = parser.parse_with_recovery();

        assert!(diagnostics
            .iter()
            .any(|d| d.code == error_codes::INVALID_NUMBER));
    }
}
