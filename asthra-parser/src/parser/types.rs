// Type expression parsing

use super::Parser;
use crate::ParseError;
use asthra_ast::*;
use asthra_diagnostics::error_codes;
use asthra_lexer::Token;

impl<'a> Parser<'a> {
    pub(crate) fn parse_type(&mut self) -> Result<TypeExpr, ParseError> {
        let start = self.current_start();

        // Raw pointer: *mut T or *const T
        if self.match_token(&Token::Star) {
            let is_mutable = if self.match_token(&Token::Mut) {
                true
            } else if self.match_token(&Token::Const) {
                false
            } else {
                return Err(self.error(
                    error_codes::MISSING_TOKEN,
                    "Expected 'mut' or 'const' after '*' in pointer type",
                ));
            };
            let pointee = self.parse_type()?;
            return Ok(TypeExpr {
                span: start..self.prev_end(),
                kind: TypeExprKind::Pointer {
                    is_mutable,
                    pointee: Box::new(pointee),
                },
            });
        }

        // Slice []T or fixed array [N]T
        if self.match_token(&Token::LBracket) {
            if self.match_token(&Token::RBracket) {
                let element = self.parse_type()?;
                return Ok(TypeExpr {
                    span: start..self.prev_end(),
                    kind: TypeExprKind::Slice(Box::new(element)),
                });
            }
            let size = self.parse_expression()?;
            self.consume(&Token::RBracket, "Expected ']' after array length")?;
            let element = self.parse_type()?;
            return Ok(TypeExpr {
                span: start..self.prev_end(),
                kind: TypeExprKind::Array {
                    element: Box::new(element),
                    size: Box::new(size),
                },
            });
        }

        // Tuple (T, U, …) or parenthesized (T)
        if self.match_token(&Token::LParen) {
            let mut types = Vec::new();
            let mut trailing_comma = false;

            if self.check(&Token::RParen) {
                return Err(self.error(error_codes::MISSING_TOKEN, "Expected type inside '()'"));
            }

            loop {
                types.push(self.parse_type()?);
                if !self.match_token(&Token::Comma) {
                    break;
                }
                if self.check(&Token::RParen) {
                    trailing_comma = true;
                    break;
                }
            }
            self.consume(&Token::RParen, "Expected ')' after tuple type")?;

            // (T) is parenthesized; (T,) and (T, U) are tuples
            if types.len() == 1 && !trailing_comma {
                let mut inner = types.remove(0);
                inner.span = start..self.prev_end();
                return Ok(inner);
            }
            return Ok(TypeExpr {
                span: start..self.prev_end(),
                kind: TypeExprKind::Tuple(types),
            });
        }

        // Builtin generic wrappers
        if self.match_token(&Token::OptionKw) {
            self.consume(&Token::Lt, "Expected '<' after 'Option'")?;
            let value = self.parse_type()?;
            self.expect_gt()?;
            return Ok(TypeExpr {
                span: start..self.prev_end(),
                kind: TypeExprKind::Option(Box::new(value)),
            });
        }
        if self.match_token(&Token::ResultKw) {
            self.consume(&Token::Lt, "Expected '<' after 'Result'")?;
            let ok = self.parse_type()?;
            self.consume(&Token::Comma, "Expected ',' between Result type arguments")?;
            let err = self.parse_type()?;
            self.expect_gt()?;
            return Ok(TypeExpr {
                span: start..self.prev_end(),
                kind: TypeExprKind::Result {
                    ok: Box::new(ok),
                    err: Box::new(err),
                },
            });
        }
        if self.match_token(&Token::TaskHandleKw) {
            self.consume(&Token::Lt, "Expected '<' after 'TaskHandle'")?;
            let result = self.parse_type()?;
            self.expect_gt()?;
            return Ok(TypeExpr {
                span: start..self.prev_end(),
                kind: TypeExprKind::TaskHandle(Box::new(result)),
            });
        }

        // Primitive keywords (int/float are spelled aliases of i32/f32)
        if let Some(primitive) = primitive_for_token(self.peek()) {
            self.advance();
            return Ok(TypeExpr {
                span: start..self.prev_end(),
                kind: TypeExprKind::Primitive(primitive),
            });
        }

        // User-declared type, optionally generic: Foo, Vec<T>. Struct vs
        // enum is the analyzer's call.
        if let Token::Ident(name) = self.peek() {
            let name = name.clone();
            self.advance();

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

            return Ok(TypeExpr {
                span: start..self.prev_end(),
                kind: TypeExprKind::Named { name, type_args },
            });
        }

        Err(self.error(
            error_codes::UNEXPECTED_TOKEN,
            &format!("Expected type, found {:?}", self.peek()),
        ))
    }
}

pub(crate) fn primitive_for_token(token: &Token) -> Option<PrimitiveType> {
    let primitive = match token {
        Token::Bool => PrimitiveType::Bool,
        Token::I8 => PrimitiveType::I8,
        Token::I16 => PrimitiveType::I16,
        Token::I32 | Token::Int => PrimitiveType::I32,
        Token::I64 => PrimitiveType::I64,
        Token::I128 => PrimitiveType::I128,
        Token::U8 => PrimitiveType::U8,
        Token::U16 => PrimitiveType::U16,
        Token::U32 => PrimitiveType::U32,
        Token::U64 => PrimitiveType::U64,
        Token::U128 => PrimitiveType::U128,
        Token::Usize => PrimitiveType::Usize,
        Token::Isize => PrimitiveType::Isize,
        Token::F32 | Token::Float => PrimitiveType::F32,
        Token::F64 => PrimitiveType::F64,
        Token::Char => PrimitiveType::Char,
        Token::String => PrimitiveType::String,
        Token::Void => PrimitiveType::Void,
        Token::Never => PrimitiveType::Never,
        _ => return None,
    };
    Some(primitive)
}
