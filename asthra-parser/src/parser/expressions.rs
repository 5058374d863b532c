// Operator precedence parsing. Each level left-associates and hands down
// to the next-tighter one, weakest first: || && | ^ & == != relational
// shift additive multiplicative unary postfix.

use super::Parser;
use crate::ParseError;
use asthra_ast::*;
use asthra_lexer::Token;

impl<'a> Parser<'a> {
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_logical_or()
    }

    /// Parse an expression with struct literals disabled at the top level,
    /// for positions followed by a `{` body (if conditions, match
    /// scrutinees, for iterables). Parenthesized subexpressions restore
    /// the permission.
    pub(crate) fn parse_restricted_expr(&mut self) -> Result<Expr, ParseError> {
        let saved = self.struct_literal_allowed;
        self.struct_literal_allowed = false;
        let result = self.parse_expression();
        self.struct_literal_allowed = saved;
        result
    }

    fn binary(&mut self, op: BinaryOp, left: Expr, right: Expr) -> Expr {
        let span = left.span.start..right.span.end;
        self.mk_expr(
            span,
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
        )
    }

    fn parse_logical_or(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_logical_and()?;
        while self.match_token(&Token::OrOr) {
            let right = self.parse_logical_and()?;
            expr = self.binary(BinaryOp::Or, expr, right);
        }
        Ok(expr)
    }

    fn parse_logical_and(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_bit_or()?;
        while self.match_token(&Token::AndAnd) {
            let right = self.parse_bit_or()?;
            expr = self.binary(BinaryOp::And, expr, right);
        }
        Ok(expr)
    }

    fn parse_bit_or(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_bit_xor()?;
        while self.match_token(&Token::Pipe) {
            let right = self.parse_bit_xor()?;
            expr = self.binary(BinaryOp::BitOr, expr, right);
        }
        Ok(expr)
    }

    fn parse_bit_xor(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_bit_and()?;
        while self.match_token(&Token::Caret) {
            let right = self.parse_bit_and()?;
            expr = self.binary(BinaryOp::BitXor, expr, right);
        }
        Ok(expr)
    }

    fn parse_bit_and(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_equality()?;
        while self.match_token(&Token::Ampersand) {
            let right = self.parse_equality()?;
            expr = self.binary(BinaryOp::BitAnd, expr, right);
        }
        Ok(expr)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_relational()?;
        while self.match_tokens(&[Token::EqEq, Token::NotEq]) {
            let op = match self.previous() {
                Token::EqEq => BinaryOp::Eq,
                _ => BinaryOp::NotEq,
            };
            let right = self.parse_relational()?;
            expr = self.binary(op, expr, right);
        }
        Ok(expr)
    }

    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_shift()?;
        while self.match_tokens(&[Token::Lt, Token::LtEq, Token::Gt, Token::GtEq]) {
            let op = match self.previous() {
                Token::Lt => BinaryOp::Lt,
                Token::LtEq => BinaryOp::LtEq,
                Token::Gt => BinaryOp::Gt,
                _ => BinaryOp::GtEq,
            };
            let right = self.parse_shift()?;
            expr = self.binary(op, expr, right);
        }
        Ok(expr)
    }

    fn parse_shift(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_additive()?;
        while self.match_tokens(&[Token::LShift, Token::RShift]) {
            let op = match self.previous() {
                Token::LShift => BinaryOp::Shl,
                _ => BinaryOp::Shr,
            };
            let right = self.parse_additive()?;
            expr = self.binary(op, expr, right);
        }
        Ok(expr)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_multiplicative()?;
        while self.match_tokens(&[Token::Plus, Token::Minus]) {
            let op = match self.previous() {
                Token::Plus => BinaryOp::Add,
                _ => BinaryOp::Sub,
            };
            let right = self.parse_multiplicative()?;
            expr = self.binary(op, expr, right);
        }
        Ok(expr)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_unary()?;
        while self.match_tokens(&[Token::Star, Token::Slash, Token::Percent]) {
            let op = match self.previous() {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                _ => BinaryOp::Mod,
            };
            let right = self.parse_unary()?;
            expr = self.binary(op, expr, right);
        }
        Ok(expr)
    }

    pub(crate) fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_start();

        // await handle
        if self.match_token(&Token::Await) {
            let operand = self.parse_unary()?;
            let span = start..operand.span.end;
            return Ok(self.mk_expr(span, ExprKind::Await(Box::new(operand))));
        }

        let op = if self.match_token(&Token::Minus) {
            Some(UnaryOp::Neg)
        } else if self.match_token(&Token::Not) {
            Some(UnaryOp::Not)
        } else if self.match_token(&Token::Tilde) {
            Some(UnaryOp::BitNot)
        } else if self.match_token(&Token::Ampersand) {
            Some(UnaryOp::AddrOf)
        } else if self.match_token(&Token::Star) {
            Some(UnaryOp::Deref)
        } else {
            None
        };

        if let Some(op) = op {
            let operand = self.parse_unary()?;
            let span = start..operand.span.end;
            return Ok(self.mk_expr(
                span,
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
            ));
        }

        self.parse_postfix()
    }
}
