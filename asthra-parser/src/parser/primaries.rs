// Primary and postfix expression parsing: literals, identifiers, tuples,
// calls, field/tuple access, indexing and slicing, struct literals and the
// context-sensitive decisions around them.

use super::Parser;
use crate::ParseError;
use asthra_ast::*;
use asthra_diagnostics::error_codes;
use asthra_lexer::Token;

impl<'a> Parser<'a> {
    pub(crate) fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_start();

        match self.peek().clone() {
            Token::IntLiteral(value) => {
                self.advance();
                Ok(self.mk_expr(start..self.prev_end(), ExprKind::IntLiteral(value)))
            }
            Token::FloatLiteral(value) => {
                self.advance();
                Ok(self.mk_expr(start..self.prev_end(), ExprKind::FloatLiteral(value)))
            }
            Token::StringLiteral(value) => {
                self.advance();
                Ok(self.mk_expr(start..self.prev_end(), ExprKind::StringLiteral(value)))
            }
            Token::CharLiteral(value) => {
                self.advance();
                Ok(self.mk_expr(start..self.prev_end(), ExprKind::CharLiteral(value)))
            }
            Token::True => {
                self.advance();
                Ok(self.mk_expr(start..self.prev_end(), ExprKind::BoolLiteral(true)))
            }
            Token::False => {
                self.advance();
                Ok(self.mk_expr(start..self.prev_end(), ExprKind::BoolLiteral(false)))
            }

            Token::LParen => self.parse_paren_or_tuple(start),

            Token::LBracket => self.parse_array_literal(start),

            Token::Match => self.parse_match_expression(start),

            Token::Sizeof => {
                self.advance();
                self.consume(&Token::LParen, "Expected '(' after 'sizeof'")?;
                let ty = self.parse_type()?;
                self.consume(&Token::RParen, "Expected ')' after sizeof type")?;
                Ok(self.mk_expr(start..self.prev_end(), ExprKind::SizeOf(ty)))
            }

            Token::OptionKw => {
                self.advance();
                self.parse_enum_constructor(start, "Option".to_string())
            }
            Token::ResultKw => {
                self.advance();
                self.parse_enum_constructor(start, "Result".to_string())
            }

            Token::SelfKw => {
                self.advance();
                Ok(self.mk_expr(start..self.prev_end(), ExprKind::Ident("self".to_string())))
            }

            Token::Ident(name) => {
                self.advance();

                // Type::function(args) — the only legal position for `::`
                if self.check(&Token::DoubleColon) {
                    self.advance();
                    let function = self.consume_identifier("an associated function name")?;
                    self.consume(
                        &Token::LParen,
                        "Expected '(' after associated function name",
                    )?;
                    let args = self.parse_call_args()?;
                    return Ok(self.mk_expr(
                        start..self.prev_end(),
                        ExprKind::AssociatedCall {
                            type_name: name,
                            function,
                            args,
                        },
                    ));
                }

                // Enum.Variant constructor when the name is a declared enum
                if self.known_enums.contains(&name)
                    && self.check(&Token::Dot)
                    && matches!(self.peek_ahead(1), Token::Ident(_))
                {
                    self.advance(); // consume '.'
                    return self.parse_enum_constructor(start, name);
                }

                Ok(self.mk_expr(start..self.prev_end(), ExprKind::Ident(name)))
            }

            other => {
                if let Token::Void = other {
                    // A common migration slip; give the dedicated hint.
                    return Err(self.error(
                        error_codes::VOID_ARGUMENT_LIST,
                        "`void` is not an expression; empty argument lists are written f(none)",
                    ));
                }
                Err(self.error(
                    error_codes::INVALID_EXPRESSION,
                    &format!("Expected expression, found {:?}", other),
                ))
            }
        }
    }

    /// `(…)` at expression position: unit `()`, parenthesized expression,
    /// or tuple `(a, b)` / `(a,)`.
    fn parse_paren_or_tuple(&mut self, start: usize) -> Result<Expr, ParseError> {
        self.consume(&Token::LParen, "Expected '('")?;

        if self.match_token(&Token::RParen) {
            return Ok(self.mk_expr(start..self.prev_end(), ExprKind::Unit));
        }

        let saved = self.struct_literal_allowed;
        self.struct_literal_allowed = true;

        let mut items = Vec::new();
        let mut trailing_comma = false;
        let result = loop {
            match self.parse_expression() {
                Ok(expr) => items.push(expr),
                Err(err) => break Err(err),
            }
            if !self.match_token(&Token::Comma) {
                break Ok(());
            }
            if self.check(&Token::RParen) {
                trailing_comma = true;
                break Ok(());
            }
        };

        self.struct_literal_allowed = saved;
        result?;
        self.consume(&Token::RParen, "Expected ')'")?;

        if items.len() == 1 && !trailing_comma {
            let mut inner = items.remove(0);
            inner.span = start..self.prev_end();
            Ok(inner)
        } else {
            Ok(self.mk_expr(start..self.prev_end(), ExprKind::Tuple(items)))
        }
    }

    fn parse_array_literal(&mut self, start: usize) -> Result<Expr, ParseError> {
        self.consume(&Token::LBracket, "Expected '['")?;

        let saved = self.struct_literal_allowed;
        self.struct_literal_allowed = true;

        let mut items = Vec::new();
        let result: Result<(), ParseError> = (|| {
            while !self.check(&Token::RBracket) {
                items.push(self.parse_expression()?);
                if !self.match_token(&Token::Comma) {
                    break;
                }
            }
            Ok(())
        })();

        self.struct_literal_allowed = saved;
        result?;
        self.consume(&Token::RBracket, "Expected ']' after array elements")?;

        Ok(self.mk_expr(start..self.prev_end(), ExprKind::Array(items)))
    }

    /// Variant access after an enum name and consumed dot:
    /// Option.Some(x), Result.Err(e), Color.Red
    fn parse_enum_constructor(&mut self, start: usize, enum_name: String) -> Result<Expr, ParseError> {
        if enum_name == "Option" || enum_name == "Result" {
            self.consume(&Token::Dot, &format!("Expected '.' after '{}'", enum_name))?;
        }
        let variant = self.consume_identifier("a variant name")?;

        let payload = if self.match_token(&Token::LParen) {
            let saved = self.struct_literal_allowed;
            self.struct_literal_allowed = true;
            let value = self.parse_expression();
            self.struct_literal_allowed = saved;
            let value = value?;
            self.consume(&Token::RParen, "Expected ')' after variant payload")?;
            Some(Box::new(value))
        } else {
            None
        };

        Ok(self.mk_expr(
            start..self.prev_end(),
            ExprKind::EnumConstructor {
                enum_name,
                variant,
                payload,
            },
        ))
    }

    pub(crate) fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            let start = expr.span.start;

            if self.check(&Token::Dot) {
                self.advance();
                expr = self.parse_member_access(start, expr)?;
            } else if self.match_token(&Token::LParen) {
                let args = self.parse_call_args()?;
                expr = self.mk_expr(
                    start..self.prev_end(),
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                );
            } else if self.match_token(&Token::LBracket) {
                expr = self.parse_index_or_slice(start, expr)?;
            } else if self.check(&Token::LBrace) && self.struct_literal_candidate(&expr) {
                expr = self.parse_struct_literal(start, expr, Vec::new())?;
            } else if self.check(&Token::Lt) && matches!(expr.kind, ExprKind::Ident(_)) {
                // Vec<i32> { … }: a type-argument list only when a matching
                // '>' closes before anything that cannot appear in type
                // arguments, and a struct literal body follows.
                match self.scan_type_args_end() {
                    Some(after) if matches!(self.tokens[after].token, Token::LBrace) => {
                        self.advance(); // consume '<'
                        let mut type_args = Vec::new();
                        loop {
                            type_args.push(self.parse_type()?);
                            if !self.match_token(&Token::Comma) {
                                break;
                            }
                        }
                        self.expect_gt()?;
                        expr = self.parse_struct_literal(start, expr, type_args)?;
                    }
                    _ => break, // plain comparison; the relational level owns '<'
                }
            } else if self.check(&Token::DoubleColon) {
                return Err(self.error(
                    error_codes::POSTFIX_PATH,
                    "`::` is only allowed in Type::function position at the start of an expression",
                ));
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Everything after a consumed postfix dot: field access, tuple index
    /// (including the DOT-FLOAT `x.0.1` expansion), or a method call.
    fn parse_member_access(&mut self, start: usize, object: Expr) -> Result<Expr, ParseError> {
        match self.peek().clone() {
            // pair.0 — single tuple index
            Token::IntLiteral(index) => {
                self.advance();
                Ok(self.mk_expr(
                    start..self.prev_end(),
                    ExprKind::FieldAccess {
                        object: Box::new(object),
                        field: index.to_string(),
                    },
                ))
            }

            // pair.0.1 arrives from the lexer as DOT FLOAT(0.1): expand the
            // float into two chained indices (fractional digits trimmed of
            // trailing zeros by the float's round trip).
            Token::FloatLiteral(value) => {
                if value < 0.0 {
                    return Err(self.error(
                        error_codes::INVALID_EXPRESSION,
                        "tuple indices cannot be negative",
                    ));
                }
                self.advance();
                let repr = format!("{}", value);
                match repr.split_once('.') {
                    Some((first, second)) => {
                        let end = self.prev_end();
                        let outer = self.mk_expr(
                            start..end,
                            ExprKind::FieldAccess {
                                object: Box::new(object),
                                field: first.to_string(),
                            },
                        );
                        Ok(self.mk_expr(
                            start..end,
                            ExprKind::FieldAccess {
                                object: Box::new(outer),
                                field: second.to_string(),
                            },
                        ))
                    }
                    None => Err(self.error_at(
                        error_codes::INVALID_EXPRESSION,
                        &format!("invalid tuple index `{}`", repr),
                        start..self.prev_end(),
                    )),
                }
            }

            Token::Ident(name) => {
                self.advance();
                if self.match_token(&Token::LParen) {
                    // obj.method(args)
                    let field_end = self.prev_end();
                    let callee = self.mk_expr(
                        start..field_end,
                        ExprKind::FieldAccess {
                            object: Box::new(object),
                            field: name,
                        },
                    );
                    let args = self.parse_call_args()?;
                    Ok(self.mk_expr(
                        start..self.prev_end(),
                        ExprKind::Call {
                            callee: Box::new(callee),
                            args,
                        },
                    ))
                } else {
                    Ok(self.mk_expr(
                        start..self.prev_end(),
                        ExprKind::FieldAccess {
                            object: Box::new(object),
                            field: name,
                        },
                    ))
                }
            }

            other => Err(self.error(
                error_codes::UNEXPECTED_TOKEN,
                &format!("Expected field or method name after '.', found {:?}", other),
            )),
        }
    }

    /// a[i] index or a[lo:hi] slice with optional bounds ('[' consumed).
    fn parse_index_or_slice(&mut self, start: usize, object: Expr) -> Result<Expr, ParseError> {
        let saved = self.struct_literal_allowed;
        self.struct_literal_allowed = true;

        let result: Result<ExprKind, ParseError> = (|| {
            if self.match_token(&Token::Colon) {
                let end = if self.check(&Token::RBracket) {
                    None
                } else {
                    Some(Box::new(self.parse_expression()?))
                };
                self.consume(&Token::RBracket, "Expected ']' after slice bounds")?;
                return Ok(ExprKind::Slice {
                    object: Box::new(object),
                    start: None,
                    end,
                });
            }

            let first = self.parse_expression()?;
            if self.match_token(&Token::Colon) {
                let end = if self.check(&Token::RBracket) {
                    None
                } else {
                    Some(Box::new(self.parse_expression()?))
                };
                self.consume(&Token::RBracket, "Expected ']' after slice bounds")?;
                Ok(ExprKind::Slice {
                    object: Box::new(object),
                    start: Some(Box::new(first)),
                    end,
                })
            } else {
                self.consume(&Token::RBracket, "Expected ']' after index")?;
                Ok(ExprKind::Index {
                    object: Box::new(object),
                    index: Box::new(first),
                })
            }
        })();

        self.struct_literal_allowed = saved;
        let kind = result?;
        Ok(self.mk_expr(start..self.prev_end(), kind))
    }

    /// Should `IDENT {` open a struct literal here? Yes only if struct
    /// literals are allowed in this position and (a) the identifier is a
    /// registered type, (b) the braces are empty, or (c) the first token
    /// after `{` is a field name followed by ':'. A bare capitalization
    /// heuristic is deliberately not used (it would break
    /// `if DEBUG_MODE { … }`).
    fn struct_literal_candidate(&self, expr: &Expr) -> bool {
        let name = match &expr.kind {
            ExprKind::Ident(name) => name,
            _ => return false,
        };
        if !self.struct_literal_allowed {
            return false;
        }
        let decision = self.known_types.contains(name)
            || self.check_ahead(1, &Token::RBrace)
            || (matches!(self.peek_ahead(1), Token::Ident(_)) && self.check_ahead(2, &Token::Colon));
        log::trace!("struct-literal lookahead for `{}` -> {}", name, decision);
        decision
    }

    fn parse_struct_literal(
        &mut self,
        start: usize,
        name_expr: Expr,
        type_args: Vec<TypeExpr>,
    ) -> Result<Expr, ParseError> {
        let name = match name_expr.kind {
            ExprKind::Ident(name) => name,
            _ => {
                return Err(self.error_at(
                    error_codes::INVALID_EXPRESSION,
                    "struct literals require a type name",
                    name_expr.span,
                ))
            }
        };

        self.consume(&Token::LBrace, "Expected '{' in struct literal")?;

        let saved = self.struct_literal_allowed;
        self.struct_literal_allowed = true;

        let mut fields = Vec::new();
        let result: Result<(), ParseError> = (|| {
            while !self.check(&Token::RBrace) && !self.is_at_end() {
                let field_name = self.consume_identifier("a field name")?;
                self.consume(&Token::Colon, "Expected ':' after field name")?;
                let value = self.parse_expression()?;
                fields.push((field_name, value));
                if !self.match_token(&Token::Comma) {
                    break;
                }
            }
            Ok(())
        })();

        self.struct_literal_allowed = saved;
        result?;
        self.consume(&Token::RBrace, "Expected '}' after struct literal fields")?;

        Ok(self.mk_expr(
            start..self.prev_end(),
            ExprKind::StructLiteral {
                name,
                type_args,
                fields,
            },
        ))
    }

    /// Scan forward from a `<` at the cursor for a matching `>` crossing
    /// only tokens that can appear inside type arguments. Returns the index
    /// of the token after the close.
    fn scan_type_args_end(&self) -> Option<usize> {
        let mut index = self.current;
        debug_assert!(matches!(self.tokens[index].token, Token::Lt));
        let mut depth = 0i32;

        loop {
            let token = &self.tokens.get(index)?.token;
            match token {
                Token::Lt => depth += 1,
                Token::Gt => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(index + 1);
                    }
                }
                Token::RShift => {
                    depth -= 2;
                    if depth == 0 {
                        return Some(index + 1);
                    }
                    if depth < 0 {
                        return None;
                    }
                }
                Token::Eof => return None,
                Token::Ident(_)
                | Token::Comma
                | Token::LBracket
                | Token::RBracket
                | Token::LParen
                | Token::RParen
                | Token::Star
                | Token::Mut
                | Token::Const
                | Token::IntLiteral(_)
                | Token::OptionKw
                | Token::ResultKw
                | Token::TaskHandleKw => {}
                other if super::types::primitive_for_token(other).is_some() => {}
                _ => return None,
            }
            index += 1;
        }
    }

    /// Call argument list ('(' already consumed). Empty lists are `()`
    /// or the spelled-out `f(none)`; `f(void)` gets the dedicated
    /// migration error; trailing commas are rejected.
    pub(crate) fn parse_call_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        if self.check(&Token::Void) {
            return Err(self.error(
                error_codes::VOID_ARGUMENT_LIST,
                "Empty argument lists are written f(none); `void` is no longer accepted here",
            ));
        }

        if let Token::Ident(name) = self.peek() {
            if name == "none" && self.check_ahead(1, &Token::RParen) {
                self.advance();
                self.advance();
                return Ok(Vec::new());
            }
        }

        if self.check(&Token::RParen) {
            self.advance();
            return Ok(Vec::new());
        }

        let saved = self.struct_literal_allowed;
        self.struct_literal_allowed = true;

        let mut args = Vec::new();
        let result = (|| {
            loop {
                args.push(self.parse_expression()?);
                if !self.match_token(&Token::Comma) {
                    break;
                }
                if self.check(&Token::RParen) {
                    return Err(self.error(
                        error_codes::TRAILING_COMMA,
                        "Trailing comma is not allowed in argument lists",
                    ));
                }
            }
            Ok(())
        })();

        self.struct_literal_allowed = saved;
        result?;
        self.consume(&Token::RParen, "Expected ')' after arguments")?;

        Ok(args)
    }
}
