// Modular parser for the Asthra language
// Hand-written recursive descent over the materialized token stream with
// one-token lookahead plus bounded peek_ahead for the context-sensitive
// spots (struct literals, generic arguments, receivers).

use std::collections::HashSet;

use asthra_ast::*;
use asthra_diagnostics::{error_codes, DiagnosticEngine};
use asthra_lexer::{LexError, Lexer, Token, TokenSpan};

use crate::ParseError;

mod error_recovery;
mod expressions;
mod items;
mod patterns;
mod primaries;
mod statements;
mod types;

/// Driver-supplied parser configuration
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Keep parsing past errors (panic-mode recovery at statement and
    /// declaration boundaries) instead of stopping at the first failure.
    pub allow_incomplete_parse: bool,
    /// Error-level diagnostics accepted before the unit gives up.
    pub max_errors: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            allow_incomplete_parse: true,
            max_errors: asthra_diagnostics::DEFAULT_MAX_ERRORS,
        }
    }
}

pub struct Parser<'a> {
    pub(crate) tokens: Vec<TokenSpan>,
    pub(crate) current: usize,
    pub(crate) source: &'a str,
    pub(crate) file_name: String,
    pub(crate) options: ParserOptions,
    /// Struct/enum names declared anywhere in this unit (pre-scanned so
    /// forward references feed the struct-literal decision).
    pub(crate) known_types: HashSet<String>,
    /// Subset of `known_types` declared with `enum`.
    pub(crate) known_enums: HashSet<String>,
    /// Cleared while parsing if-conditions, match scrutinees and for
    /// iterables so a `{` there opens the body, not a struct literal.
    /// Restored inside any parenthesized or bracketed subexpression.
    pub(crate) struct_literal_allowed: bool,
    pub(crate) diagnostics: DiagnosticEngine,
    pub(crate) lex_errors: Vec<LexError>,
    next_node_id: u32,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, file_name: &str) -> Self {
        Self::with_options(source, file_name, ParserOptions::default())
    }

    pub fn with_options(source: &'a str, file_name: &str, options: ParserOptions) -> Self {
        let mut tokens = Vec::new();
        let mut lex_errors = Vec::new();
        for item in Lexer::new(source) {
            match item {
                Ok(token_span) => tokens.push(token_span),
                Err(err) => lex_errors.push(err),
            }
        }
        tokens.push(TokenSpan {
            token: Token::Eof,
            span: source.len()..source.len(),
        });

        // Pre-scan declared type names: `struct Foo` / `enum Bar`
        let mut known_types = HashSet::new();
        let mut known_enums = HashSet::new();
        for window in tokens.windows(2) {
            if let Token::Ident(name) = &window[1].token {
                match window[0].token {
                    Token::Struct => {
                        known_types.insert(name.clone());
                    }
                    Token::Enum => {
                        known_types.insert(name.clone());
                        known_enums.insert(name.clone());
                    }
                    _ => {}
                }
            }
        }

        let max_errors = options.max_errors;
        Self {
            tokens,
            current: 0,
            source,
            file_name: file_name.to_string(),
            options,
            known_types,
            known_enums,
            struct_literal_allowed: true,
            diagnostics: DiagnosticEngine::with_max_errors(max_errors),
            lex_errors,
            next_node_id: 0,
        }
    }

    /// Parse the whole unit. With `allow_incomplete_parse` set, errors are
    /// recorded as diagnostics and parsing resumes at the next declaration
    /// boundary; otherwise the first error is returned.
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        if self.options.allow_incomplete_parse {
            self.emit_lex_diagnostics();
        } else if let Some(err) = self.lex_errors.first() {
            return Err(ParseError::Lex(err.clone()));
        }

        let package = if self.match_token(&Token::Package) {
            let name = self.consume_identifier("package name")?;
            self.consume(&Token::Semicolon, "Expected ';' after package name")?;
            Some(name)
        } else {
            None
        };

        let mut imports = Vec::new();
        let mut decls = Vec::new();

        while !self.is_at_end() {
            if self.check(&Token::Import) {
                match self.parse_import() {
                    Ok(import) => imports.push(import),
                    Err(err) => self.recover_or_bail(err)?,
                }
                continue;
            }
            match self.parse_decl() {
                Ok(decl) => decls.push(decl),
                Err(err) => self.recover_or_bail(err)?,
            }
        }

        log::debug!(
            "parsed {}: {} imports, {} declarations, {} errors",
            self.file_name,
            imports.len(),
            decls.len(),
            self.diagnostics.error_count()
        );

        Ok(Program {
            package,
            imports,
            decls,
        })
    }

    /// Diagnostics accumulated while parsing (recovery mode); lexical
    /// errors come first, in source order.
    pub fn diagnostics(&self) -> &DiagnosticEngine {
        &self.diagnostics
    }

    // ==================== Helper Methods ====================

    pub(crate) fn match_token(&mut self, kind: &Token) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn match_tokens(&mut self, kinds: &[Token]) -> bool {
        for kind in kinds {
            if self.check(kind) {
                self.advance();
                return true;
            }
        }
        false
    }

    pub(crate) fn check(&self, kind: &Token) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(kind)
    }

    pub(crate) fn check_ahead(&self, offset: usize, kind: &Token) -> bool {
        std::mem::discriminant(self.peek_ahead(offset)) == std::mem::discriminant(kind)
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof)
    }

    pub(crate) fn peek_span(&self) -> &TokenSpan {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.peek_span().token
    }

    pub(crate) fn peek_ahead(&self, offset: usize) -> &Token {
        let index = (self.current + offset).min(self.tokens.len() - 1);
        &self.tokens[index].token
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)].token
    }

    /// End offset of the most recently consumed token.
    pub(crate) fn prev_end(&self) -> usize {
        self.tokens[self.current.saturating_sub(1)].span.end
    }

    pub(crate) fn current_start(&self) -> usize {
        self.peek_span().span.start
    }

    pub(crate) fn consume(&mut self, kind: &Token, message: &str) -> Result<(), ParseError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(error_codes::MISSING_TOKEN, message))
        }
    }

    /// Consume an identifier; reserved keywords get their dedicated error.
    pub(crate) fn consume_identifier(&mut self, what: &str) -> Result<String, ParseError> {
        match self.peek() {
            Token::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            other => {
                if let Some(keyword) = keyword_spelling(other) {
                    Err(self.error(
                        error_codes::RESERVED_KEYWORD,
                        &format!("reserved keyword `{}` cannot be used as {}", keyword, what),
                    ))
                } else {
                    Err(self.error(
                        error_codes::UNEXPECTED_TOKEN,
                        &format!("Expected {}, found {:?}", what, other),
                    ))
                }
            }
        }
    }

    /// Close a type-argument list. A `>>` left by the lexer (nested
    /// generics like `Vec<Vec<i32>>`) is split into two closes.
    pub(crate) fn expect_gt(&mut self) -> Result<(), ParseError> {
        if self.check(&Token::Gt) {
            self.advance();
            Ok(())
        } else if self.check(&Token::RShift) {
            let span = self.peek_span().span.clone();
            self.tokens[self.current] = TokenSpan {
                token: Token::Gt,
                span: span.start + 1..span.end,
            };
            Ok(())
        } else {
            Err(self.error(error_codes::MISSING_TOKEN, "Expected '>' after type arguments"))
        }
    }

    pub(crate) fn error(&self, code: u16, message: &str) -> ParseError {
        ParseError::Syntax {
            code,
            message: message.to_string(),
            span: self.peek_span().span.clone(),
        }
    }

    pub(crate) fn error_at(
        &self,
        code: u16,
        message: &str,
        span: std::ops::Range<usize>,
    ) -> ParseError {
        ParseError::Syntax {
            code,
            message: message.to_string(),
            span,
        }
    }

    pub(crate) fn mk_expr(&mut self, span: ByteSpan, kind: ExprKind) -> Expr {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        Expr { id, span, kind }
    }

    pub(crate) fn parse_block(&mut self) -> Result<Block, ParseError> {
        let start = self.current_start();
        self.consume(&Token::LBrace, "Expected '{'")?;
        let mut statements = Vec::new();

        while !self.check(&Token::RBrace) && !self.is_at_end() {
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    if self.options.allow_incomplete_parse && !self.diagnostics.at_error_limit() {
                        self.record(err);
                        self.synchronize_statement();
                    } else {
                        return Err(err);
                    }
                }
            }
        }

        self.consume(&Token::RBrace, "Expected '}'")?;

        Ok(Block {
            statements,
            span: start..self.prev_end(),
        })
    }

    /// Panic-mode resync: skip to the next statement boundary — a `;`
    /// (consumed), a statement keyword, a `{`, or the matching `}` of the
    /// enclosing block.
    pub(crate) fn synchronize_statement(&mut self) {
        let mut depth = 0usize;
        while !self.is_at_end() {
            match self.peek() {
                Token::Semicolon => {
                    self.advance();
                    if depth == 0 {
                        return;
                    }
                }
                Token::LBrace => {
                    depth += 1;
                    self.advance();
                }
                Token::RBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    self.advance();
                }
                Token::Let
                | Token::Return
                | Token::If
                | Token::For
                | Token::Match
                | Token::Spawn
                | Token::SpawnWithHandle
                | Token::Unsafe
                | Token::Break
                | Token::Continue
                    if depth == 0 =>
                {
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }
}

/// Spelling of a reserved keyword token, if this is one.
pub(crate) fn keyword_spelling(token: &Token) -> Option<&'static str> {
    let spelling = match token {
        Token::Fn => "fn",
        Token::Let => "let",
        Token::Mut => "mut",
        Token::Const => "const",
        Token::If => "if",
        Token::Else => "else",
        Token::Match => "match",
        Token::Return => "return",
        Token::Struct => "struct",
        Token::Enum => "enum",
        Token::Impl => "impl",
        Token::Pub => "pub",
        Token::Priv => "priv",
        Token::Extern => "extern",
        Token::Spawn => "spawn",
        Token::SpawnWithHandle => "spawn_with_handle",
        Token::Unsafe => "unsafe",
        Token::Await => "await",
        Token::For => "for",
        Token::In => "in",
        Token::Break => "break",
        Token::Continue => "continue",
        Token::Sizeof => "sizeof",
        Token::Package => "package",
        Token::Import => "import",
        Token::As => "as",
        Token::SelfKw => "self",
        Token::ResultKw => "Result",
        Token::OptionKw => "Option",
        Token::TaskHandleKw => "TaskHandle",
        Token::True => "true",
        Token::False => "false",
        Token::I8 => "i8",
        Token::I16 => "i16",
        Token::I32 => "i32",
        Token::I64 => "i64",
        Token::I128 => "i128",
        Token::U8 => "u8",
        Token::U16 => "u16",
        Token::U32 => "u32",
        Token::U64 => "u64",
        Token::U128 => "u128",
        Token::F32 => "f32",
        Token::F64 => "f64",
        Token::Bool => "bool",
        Token::Char => "char",
        Token::String => "string",
        Token::Void => "void",
        Token::Usize => "usize",
        Token::Isize => "isize",
        Token::Never => "Never",
        Token::Int => "int",
        Token::Float => "float",
        _ => return None,
    };
    Some(spelling)
}
