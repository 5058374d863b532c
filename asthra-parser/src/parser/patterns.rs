// Match expression and pattern parsing. Patterns use `.` for variant
// access (Option.Some(x)); `::` never appears in pattern position, and the
// unqualified Variant(x) shorthand is rejected with a fix-it.

use super::Parser;
use crate::ParseError;
use asthra_ast::*;
use asthra_diagnostics::error_codes;
use asthra_lexer::Token;

impl<'a> Parser<'a> {
    /// match value { pattern => body, … } as an expression ('match' not yet
    /// consumed).
    pub(crate) fn parse_match_expression(&mut self, start: usize) -> Result<Expr, ParseError> {
        self.consume(&Token::Match, "Expected 'match'")?;
        let scrutinee = self.parse_restricted_expr()?;

        self.consume(&Token::LBrace, "Expected '{' after match value")?;
        let arms = self.parse_match_arms()?;
        self.consume(&Token::RBrace, "Expected '}' after match arms")?;

        Ok(self.mk_expr(
            start..self.prev_end(),
            ExprKind::Match {
                scrutinee: Box::new(scrutinee),
                arms,
            },
        ))
    }

    /// Arms up to the closing brace. Arms are comma-separated; a comma
    /// after the last arm is rejected.
    pub(crate) fn parse_match_arms(&mut self) -> Result<Vec<MatchArm>, ParseError> {
        let mut arms = Vec::new();

        while !self.check(&Token::RBrace) && !self.is_at_end() {
            let start = self.current_start();
            let pattern = self.parse_pattern()?;
            self.consume(&Token::FatArrow, "Expected '=>' after match pattern")?;

            let body = if self.check(&Token::LBrace) {
                ArmBody::Block(self.parse_block()?)
            } else {
                ArmBody::Expr(self.parse_expression()?)
            };

            arms.push(MatchArm {
                pattern,
                body,
                span: start..self.prev_end(),
            });

            if self.match_token(&Token::Comma) {
                if self.check(&Token::RBrace) {
                    return Err(self.error(
                        error_codes::TRAILING_COMMA,
                        "Trailing comma is not allowed after the last match arm",
                    ));
                }
            } else if !self.check(&Token::RBrace) {
                return Err(self.error(
                    error_codes::MISSING_TOKEN,
                    "Expected ',' between match arms",
                ));
            }
        }

        Ok(arms)
    }

    pub(crate) fn parse_pattern(&mut self) -> Result<Pattern, ParseError> {
        let start = self.current_start();

        // Wildcard: _
        if self.match_token(&Token::Underscore) {
            return Ok(Pattern {
                span: start..self.prev_end(),
                kind: PatternKind::Wildcard,
            });
        }

        // Tuple pattern: (a, b, _) — (p) is just p, (p,) is a 1-tuple
        if self.match_token(&Token::LParen) {
            let mut patterns = Vec::new();
            let mut trailing_comma = false;

            if self.check(&Token::RParen) {
                return Err(self.error(
                    error_codes::MISSING_TOKEN,
                    "Expected pattern inside '()'",
                ));
            }

            loop {
                patterns.push(self.parse_pattern()?);
                if !self.match_token(&Token::Comma) {
                    break;
                }
                if self.check(&Token::RParen) {
                    trailing_comma = true;
                    break;
                }
            }
            self.consume(&Token::RParen, "Expected ')' after tuple pattern")?;

            if patterns.len() == 1 && !trailing_comma {
                let mut inner = patterns.remove(0);
                inner.span = start..self.prev_end();
                return Ok(inner);
            }
            return Ok(Pattern {
                span: start..self.prev_end(),
                kind: PatternKind::Tuple(patterns),
            });
        }

        // Literal patterns
        if let Some(kind) = self.try_parse_literal_pattern()? {
            return Ok(Pattern {
                span: start..self.prev_end(),
                kind,
            });
        }

        // Builtin enums keep their keyword spelling
        if self.match_token(&Token::OptionKw) {
            return self.parse_enum_pattern(start, "Option".to_string());
        }
        if self.match_token(&Token::ResultKw) {
            return self.parse_enum_pattern(start, "Result".to_string());
        }

        if let Token::Ident(name) = self.peek() {
            let name = name.clone();
            self.advance();

            // Qualified enum pattern: E.Variant or E.Variant(pattern)
            if self.check(&Token::Dot) {
                return self.parse_enum_pattern(start, name);
            }

            // Unqualified Variant(x) shorthand is not accepted
            if self.check(&Token::LParen) {
                return Err(self.error_at(
                    error_codes::UNQUALIFIED_ENUM_PATTERN,
                    &format!(
                        "unqualified enum pattern `{}(…)`; write the qualified form instead",
                        name
                    ),
                    start..self.prev_end(),
                ));
            }

            // Struct pattern: S { field: pat, .. } or S<T> { … }
            if self.check(&Token::LBrace) || self.check(&Token::Lt) {
                return self.parse_struct_pattern(start, name);
            }

            // Plain identifier binding
            return Ok(Pattern {
                span: start..self.prev_end(),
                kind: PatternKind::Ident(name),
            });
        }

        Err(self.error(
            error_codes::UNEXPECTED_TOKEN,
            &format!("Expected pattern, found {:?}", self.peek()),
        ))
    }

    fn try_parse_literal_pattern(&mut self) -> Result<Option<PatternKind>, ParseError> {
        let negative = if self.check(&Token::Minus)
            && matches!(
                self.peek_ahead(1),
                Token::IntLiteral(_) | Token::FloatLiteral(_)
            ) {
            self.advance();
            true
        } else {
            false
        };

        let kind = match self.peek().clone() {
            Token::IntLiteral(value) => {
                self.advance();
                Some(PatternKind::Literal(LiteralPattern::Int(if negative {
                    -value
                } else {
                    value
                })))
            }
            Token::FloatLiteral(value) => {
                self.advance();
                Some(PatternKind::Literal(LiteralPattern::Float(if negative {
                    -value
                } else {
                    value
                })))
            }
            Token::StringLiteral(value) => {
                self.advance();
                Some(PatternKind::Literal(LiteralPattern::String(value)))
            }
            Token::CharLiteral(value) => {
                self.advance();
                Some(PatternKind::Literal(LiteralPattern::Char(value)))
            }
            Token::True => {
                self.advance();
                Some(PatternKind::Literal(LiteralPattern::Bool(true)))
            }
            Token::False => {
                self.advance();
                Some(PatternKind::Literal(LiteralPattern::Bool(false)))
            }
            _ => None,
        };

        Ok(kind)
    }

    /// E.Variant / E.Variant(nested) with the enum name already consumed.
    fn parse_enum_pattern(&mut self, start: usize, enum_name: String) -> Result<Pattern, ParseError> {
        self.consume(
            &Token::Dot,
            &format!("Expected '.' after enum name `{}` in pattern", enum_name),
        )?;
        let variant = self.consume_identifier("a variant name")?;

        let inner = if self.match_token(&Token::LParen) {
            let nested = self.parse_pattern()?;
            self.consume(&Token::RParen, "Expected ')' after nested pattern")?;
            Some(Box::new(nested))
        } else {
            None
        };

        Ok(Pattern {
            span: start..self.prev_end(),
            kind: PatternKind::Enum {
                enum_name,
                variant,
                inner,
            },
        })
    }

    /// S { field: pattern, …, [..] } with optional type arguments; no
    /// trailing comma.
    fn parse_struct_pattern(&mut self, start: usize, name: String) -> Result<Pattern, ParseError> {
        let mut type_args = Vec::new();
        if self.match_token(&Token::Lt) {
            loop {
                type_args.push(self.parse_type()?);
                if !self.match_token(&Token::Comma) {
                    break;
                }
            }
            self.expect_gt()?;
        }

        self.consume(&Token::LBrace, "Expected '{' in struct pattern")?;

        let mut fields = Vec::new();
        let mut has_rest = false;

        while !self.check(&Token::RBrace) && !self.is_at_end() {
            if self.match_token(&Token::DotDot) {
                has_rest = true;
                if self.check(&Token::Comma) {
                    return Err(self.error(
                        error_codes::TRAILING_COMMA,
                        "`..` must be the last element of a struct pattern",
                    ));
                }
                break;
            }

            let field_name = self.consume_identifier("a field name")?;
            self.consume(&Token::Colon, "Expected ':' after field name in pattern")?;
            let pattern = self.parse_pattern()?;
            fields.push((field_name, pattern));

            if self.match_token(&Token::Comma) {
                if self.check(&Token::RBrace) {
                    return Err(self.error(
                        error_codes::TRAILING_COMMA,
                        "Trailing comma is not allowed in struct patterns",
                    ));
                }
            } else {
                break;
            }
        }

        self.consume(&Token::RBrace, "Expected '}' after struct pattern")?;

        Ok(Pattern {
            span: start..self.prev_end(),
            kind: PatternKind::Struct {
                name,
                type_args,
                fields,
                has_rest,
            },
        })
    }
}
