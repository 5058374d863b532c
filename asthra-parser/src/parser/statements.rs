// Statement parsing

use super::{keyword_spelling, Parser};
use crate::ParseError;
use asthra_ast::*;
use asthra_diagnostics::error_codes;
use asthra_lexer::Token;

impl<'a> Parser<'a> {
    pub(crate) fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_start();

        if self.check(&Token::Let) {
            return self.parse_let_statement(start);
        }

        if self.match_token(&Token::Return) {
            // The expression is mandatory; void returns are `return ();`
            if self.check(&Token::Semicolon) {
                return Err(self.error(
                    error_codes::MISSING_TOKEN,
                    "Expected expression after 'return' (void functions use 'return ();')",
                ));
            }
            let value = self.parse_expression()?;
            self.consume(&Token::Semicolon, "Expected ';' after return")?;
            return Ok(Stmt {
                span: start..self.prev_end(),
                kind: StmtKind::Return(value),
            });
        }

        if self.check(&Token::If) {
            return self.parse_if_statement(start);
        }

        if self.match_token(&Token::For) {
            let variable = self.consume_identifier("a loop variable name")?;
            self.consume(&Token::In, "Expected 'in' after loop variable")?;
            let iterable = self.parse_restricted_expr()?;
            let body = self.parse_block()?;
            return Ok(Stmt {
                span: start..self.prev_end(),
                kind: StmtKind::For {
                    variable,
                    iterable,
                    body,
                },
            });
        }

        if self.match_token(&Token::Match) {
            let scrutinee = self.parse_restricted_expr()?;
            self.consume(&Token::LBrace, "Expected '{' after match value")?;
            let arms = self.parse_match_arms()?;
            self.consume(&Token::RBrace, "Expected '}' after match arms")?;
            return Ok(Stmt {
                span: start..self.prev_end(),
                kind: StmtKind::Match { scrutinee, arms },
            });
        }

        if self.match_token(&Token::Spawn) {
            let call = self.parse_expression()?;
            self.require_call_expr(&call, "spawn")?;
            self.consume(&Token::Semicolon, "Expected ';' after spawn")?;
            return Ok(Stmt {
                span: start..self.prev_end(),
                kind: StmtKind::Spawn { call },
            });
        }

        if self.match_token(&Token::SpawnWithHandle) {
            let handle = self.consume_identifier("a handle variable name")?;
            self.consume(&Token::Eq, "Expected '=' after spawn handle name")?;
            let call = self.parse_expression()?;
            self.require_call_expr(&call, "spawn_with_handle")?;
            self.consume(&Token::Semicolon, "Expected ';' after spawn_with_handle")?;
            return Ok(Stmt {
                span: start..self.prev_end(),
                kind: StmtKind::SpawnWithHandle { handle, call },
            });
        }

        if self.match_token(&Token::Unsafe) {
            let block = self.parse_block()?;
            return Ok(Stmt {
                span: start..self.prev_end(),
                kind: StmtKind::Unsafe(block),
            });
        }

        if self.match_token(&Token::Break) {
            self.consume(&Token::Semicolon, "Expected ';' after 'break'")?;
            return Ok(Stmt {
                span: start..self.prev_end(),
                kind: StmtKind::Break,
            });
        }

        if self.match_token(&Token::Continue) {
            self.consume(&Token::Semicolon, "Expected ';' after 'continue'")?;
            return Ok(Stmt {
                span: start..self.prev_end(),
                kind: StmtKind::Continue,
            });
        }

        if self.check(&Token::LBrace) {
            let block = self.parse_block()?;
            return Ok(Stmt {
                span: start..self.prev_end(),
                kind: StmtKind::Block(block),
            });
        }

        // There is no while loop in the language; catch the habit early.
        if let Token::Ident(name) = self.peek() {
            if name == "while" {
                return Err(self.error(
                    error_codes::UNSUPPORTED_CONSTRUCT,
                    "while loops are not supported; use 'for item in collection'",
                ));
            }
        }

        // Assignment or expression statement: parse the expression chain
        // first, then decide on '='.
        let expr = self.parse_expression()?;

        if self.check(&Token::Eq) {
            if !expr.is_lvalue() {
                return Err(self.error_at(
                    error_codes::INVALID_EXPRESSION,
                    "invalid assignment target",
                    expr.span,
                ));
            }
            self.advance();
            let value = self.parse_expression()?;
            self.consume(&Token::Semicolon, "Expected ';' after assignment")?;
            return Ok(Stmt {
                span: start..self.prev_end(),
                kind: StmtKind::Assign {
                    target: expr,
                    value,
                },
            });
        }

        self.consume(&Token::Semicolon, "Expected ';' after expression")?;
        Ok(Stmt {
            span: start..self.prev_end(),
            kind: StmtKind::Expression(expr),
        })
    }

    /// let [mut] NAME : TYPE [ownership-tag]* [= EXPR] ;
    fn parse_let_statement(&mut self, start: usize) -> Result<Stmt, ParseError> {
        self.consume(&Token::Let, "Expected 'let'")?;
        let is_mutable = self.match_token(&Token::Mut);

        let name = match self.peek() {
            Token::Ident(name) => {
                let name = name.clone();
                self.advance();
                name
            }
            other => {
                if let Some(keyword) = keyword_spelling(other) {
                    return Err(self.error(
                        error_codes::RESERVED_KEYWORD,
                        &format!(
                            "reserved keyword `{}` cannot be used as a variable name",
                            keyword
                        ),
                    ));
                }
                return Err(self.error(
                    error_codes::UNEXPECTED_TOKEN,
                    &format!("Expected variable name after 'let', found {:?}", other),
                ));
            }
        };

        // Type annotations are mandatory
        if !self.match_token(&Token::Colon) {
            return Err(self.error(
                error_codes::MISSING_TYPE_ANNOTATION,
                "Expected ':' after variable name in declaration",
            ));
        }
        let ty = self.parse_type()?;

        let ownership = self.parse_ownership_tags()?;

        let value = if self.match_token(&Token::Eq) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        self.consume(&Token::Semicolon, "Expected ';' after let declaration")?;

        Ok(Stmt {
            span: start..self.prev_end(),
            kind: StmtKind::Let {
                is_mutable,
                name,
                ty,
                ownership,
                value,
            },
        })
    }

    /// if COND { … } [else …], or if let PATTERN = EXPR { … } [else { … }]
    fn parse_if_statement(&mut self, start: usize) -> Result<Stmt, ParseError> {
        self.consume(&Token::If, "Expected 'if'")?;

        if self.match_token(&Token::Let) {
            let pattern = self.parse_pattern()?;
            self.consume(&Token::Eq, "Expected '=' after if-let pattern")?;
            let value = self.parse_restricted_expr()?;
            let then_block = self.parse_block()?;
            let else_block = if self.match_token(&Token::Else) {
                Some(self.parse_block()?)
            } else {
                None
            };
            return Ok(Stmt {
                span: start..self.prev_end(),
                kind: StmtKind::IfLet {
                    pattern,
                    value,
                    then_block,
                    else_block,
                },
            });
        }

        let if_stmt = self.parse_if_tail()?;
        Ok(Stmt {
            span: start..self.prev_end(),
            kind: StmtKind::If(if_stmt),
        })
    }

    /// Condition + blocks of a plain if ('if' already consumed); recurses
    /// for `else if` chains.
    fn parse_if_tail(&mut self) -> Result<IfStmt, ParseError> {
        let condition = self.parse_restricted_expr()?;
        let then_block = self.parse_block()?;

        let else_branch = if self.match_token(&Token::Else) {
            if self.match_token(&Token::If) {
                Some(ElseBranch::If(Box::new(self.parse_if_tail()?)))
            } else {
                Some(ElseBranch::Block(self.parse_block()?))
            }
        } else {
            None
        };

        Ok(IfStmt {
            condition,
            then_block,
            else_branch,
        })
    }

    fn require_call_expr(&self, expr: &Expr, construct: &str) -> Result<(), ParseError> {
        match expr.kind {
            ExprKind::Call { .. } | ExprKind::AssociatedCall { .. } => Ok(()),
            _ => Err(self.error_at(
                error_codes::INVALID_EXPRESSION,
                &format!("{} requires a function or method call", construct),
                expr.span.clone(),
            )),
        }
    }
}
