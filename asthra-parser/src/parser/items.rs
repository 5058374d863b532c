// Top-level declaration parsing: imports, functions, structs, enums,
// impl blocks and extern blocks.

use super::Parser;
use crate::ParseError;
use asthra_ast::*;
use asthra_diagnostics::error_codes;
use asthra_lexer::Token;

impl<'a> Parser<'a> {
    pub(crate) fn parse_import(&mut self) -> Result<Import, ParseError> {
        let start = self.current_start();
        self.consume(&Token::Import, "Expected 'import'")?;

        let path = match self.peek() {
            Token::StringLiteral(path) => {
                let path = path.clone();
                self.advance();
                path
            }
            _ => {
                return Err(self.error(
                    error_codes::MISSING_TOKEN,
                    "Expected import path string after 'import'",
                ))
            }
        };

        let alias = if self.match_token(&Token::As) {
            Some(self.consume_identifier("a module alias")?)
        } else {
            None
        };

        self.consume(&Token::Semicolon, "Expected ';' after import")?;

        Ok(Import {
            path,
            alias,
            span: start..self.prev_end(),
        })
    }

    pub(crate) fn parse_decl(&mut self) -> Result<Decl, ParseError> {
        let start = self.current_start();
        let annotations = self.parse_annotations()?;

        let visibility = if self.match_token(&Token::Pub) {
            Visibility::Public
        } else if self.match_token(&Token::Priv) {
            Visibility::Private
        } else {
            Visibility::Private
        };

        if self.check(&Token::Fn) {
            let function = self.parse_function(visibility, annotations, start)?;
            Ok(Decl::Function(function))
        } else if self.check(&Token::Struct) {
            Ok(Decl::Struct(self.parse_struct_decl(visibility, annotations, start)?))
        } else if self.check(&Token::Enum) {
            Ok(Decl::Enum(self.parse_enum_decl(visibility, annotations, start)?))
        } else if self.check(&Token::Impl) {
            Ok(Decl::Impl(self.parse_impl_block(start)?))
        } else if self.check(&Token::Extern) {
            Ok(Decl::Extern(self.parse_extern_block(start)?))
        } else {
            Err(self.error(
                error_codes::UNEXPECTED_TOKEN,
                "Expected top-level declaration (fn, struct, enum, impl, extern or import)",
            ))
        }
    }

    /// Annotation list: #[name] #[other] …
    pub(crate) fn parse_annotations(&mut self) -> Result<Vec<Annotation>, ParseError> {
        let mut annotations = Vec::new();
        while self.check(&Token::Hash) {
            let start = self.current_start();
            self.advance();
            self.consume(&Token::LBracket, "Expected '[' after '#'")?;
            let name = self.consume_identifier("an annotation name")?;
            self.consume(&Token::RBracket, "Expected ']' after annotation name")?;
            annotations.push(Annotation {
                name,
                span: start..self.prev_end(),
            });
        }
        Ok(annotations)
    }

    /// Ownership tags on lets and extern parameters:
    /// #[transfer_full] #[transfer_none] #[borrowed]
    pub(crate) fn parse_ownership_tags(&mut self) -> Result<Vec<OwnershipTag>, ParseError> {
        let mut tags = Vec::new();
        while self.check(&Token::Hash) {
            self.advance();
            self.consume(&Token::LBracket, "Expected '[' after '#'")?;
            let name = self.consume_identifier("an ownership tag")?;
            let tag = match name.as_str() {
                "transfer_full" => OwnershipTag::TransferFull,
                "transfer_none" => OwnershipTag::TransferNone,
                "borrowed" => OwnershipTag::Borrowed,
                other => {
                    return Err(self.error(
                        error_codes::UNEXPECTED_TOKEN,
                        &format!(
                            "unknown ownership tag `{}` (expected transfer_full, transfer_none or borrowed)",
                            other
                        ),
                    ))
                }
            };
            self.consume(&Token::RBracket, "Expected ']' after ownership tag")?;
            tags.push(tag);
        }
        Ok(tags)
    }

    pub(crate) fn parse_function(
        &mut self,
        visibility: Visibility,
        annotations: Vec<Annotation>,
        start: usize,
    ) -> Result<Function, ParseError> {
        self.consume(&Token::Fn, "Expected 'fn'")?;
        let name = self.consume_identifier("a function name")?;

        self.consume(&Token::LParen, "Expected '(' after function name")?;
        let params = self.parse_params()?;
        self.consume(&Token::RParen, "Expected ')' after parameters")?;

        self.consume(&Token::Arrow, "Expected '->' before return type")?;
        let return_type = self.parse_type()?;

        let body = self.parse_block()?;

        Ok(Function {
            visibility,
            annotations,
            name,
            params,
            return_type,
            body,
            span: start..self.prev_end(),
        })
    }

    /// Parameter list: `none` for empty, otherwise `name: T` pairs with no
    /// trailing comma. A bare `self` is only meaningful as a method
    /// receiver; the analyzer enforces placement.
    pub(crate) fn parse_params(&mut self) -> Result<Vec<Param>, ParseError> {
        if self.check(&Token::RParen) {
            return Err(self.error(
                error_codes::MISSING_TOKEN,
                "Empty parameter lists are written (none)",
            ));
        }

        // `none` marker
        if let Token::Ident(name) = self.peek() {
            if name == "none" && self.check_ahead(1, &Token::RParen) {
                self.advance();
                return Ok(Vec::new());
            }
        }

        let mut params = Vec::new();
        loop {
            let start = self.current_start();
            if self.match_token(&Token::SelfKw) {
                params.push(Param {
                    name: "self".to_string(),
                    ty: TypeExpr {
                        span: start..self.prev_end(),
                        kind: TypeExprKind::SelfType,
                    },
                    ownership: Vec::new(),
                    span: start..self.prev_end(),
                });
            } else {
                let name = self.consume_identifier("a parameter name")?;
                self.consume(&Token::Colon, "Expected ':' after parameter name")?;
                let ty = self.parse_type()?;
                let ownership = self.parse_ownership_tags()?;
                params.push(Param {
                    name,
                    ty,
                    ownership,
                    span: start..self.prev_end(),
                });
            }

            if !self.match_token(&Token::Comma) {
                break;
            }
            if self.check(&Token::RParen) {
                return Err(self.error(
                    error_codes::TRAILING_COMMA,
                    "Trailing comma is not allowed in parameter lists",
                ));
            }
        }

        Ok(params)
    }

    pub(crate) fn parse_struct_decl(
        &mut self,
        visibility: Visibility,
        annotations: Vec<Annotation>,
        start: usize,
    ) -> Result<StructDecl, ParseError> {
        self.consume(&Token::Struct, "Expected 'struct'")?;
        let name = self.consume_identifier("a struct name")?;
        let type_params = self.parse_type_params()?;

        self.consume(&Token::LBrace, "Expected '{' after struct name")?;

        let mut fields = Vec::new();
        while !self.check(&Token::RBrace) && !self.is_at_end() {
            let field_start = self.current_start();
            let field_name = self.consume_identifier("a field name")?;
            self.consume(&Token::Colon, "Expected ':' after field name")?;
            let ty = self.parse_type()?;
            fields.push(Field {
                name: field_name,
                ty,
                span: field_start..self.prev_end(),
            });

            if !self.match_token(&Token::Comma) {
                break;
            }
        }

        self.consume(&Token::RBrace, "Expected '}' after struct fields")?;
        self.known_types.insert(name.clone());

        Ok(StructDecl {
            visibility,
            annotations,
            name,
            type_params,
            fields,
            span: start..self.prev_end(),
        })
    }

    pub(crate) fn parse_enum_decl(
        &mut self,
        visibility: Visibility,
        annotations: Vec<Annotation>,
        start: usize,
    ) -> Result<EnumDecl, ParseError> {
        self.consume(&Token::Enum, "Expected 'enum'")?;
        let name = self.consume_identifier("an enum name")?;
        let type_params = self.parse_type_params()?;

        self.consume(&Token::LBrace, "Expected '{' after enum name")?;

        let mut variants = Vec::new();
        while !self.check(&Token::RBrace) && !self.is_at_end() {
            let variant_start = self.current_start();
            let variant_name = self.consume_identifier("a variant name")?;

            let payload = if self.match_token(&Token::LParen) {
                let mut types = Vec::new();
                loop {
                    types.push(self.parse_type()?);
                    if !self.match_token(&Token::Comma) {
                        break;
                    }
                }
                self.consume(&Token::RParen, "Expected ')' after variant payload")?;
                Some(VariantPayload::Tuple(types))
            } else if self.match_token(&Token::LBrace) {
                let mut payload_fields = Vec::new();
                while !self.check(&Token::RBrace) && !self.is_at_end() {
                    let field_start = self.current_start();
                    let field_name = self.consume_identifier("a field name")?;
                    self.consume(&Token::Colon, "Expected ':' after field name")?;
                    let ty = self.parse_type()?;
                    payload_fields.push(Field {
                        name: field_name,
                        ty,
                        span: field_start..self.prev_end(),
                    });
                    if !self.match_token(&Token::Comma) {
                        break;
                    }
                }
                self.consume(&Token::RBrace, "Expected '}' after variant fields")?;
                Some(VariantPayload::Struct(payload_fields))
            } else {
                None
            };

            variants.push(EnumVariant {
                name: variant_name,
                payload,
                span: variant_start..self.prev_end(),
            });

            if !self.match_token(&Token::Comma) {
                break;
            }
        }

        self.consume(&Token::RBrace, "Expected '}' after enum variants")?;
        self.known_types.insert(name.clone());
        self.known_enums.insert(name.clone());

        Ok(EnumDecl {
            visibility,
            annotations,
            name,
            type_params,
            variants,
            span: start..self.prev_end(),
        })
    }

    /// impl S { pub fn m(self, …) -> T { … } } — visibility is mandatory
    /// on every method.
    pub(crate) fn parse_impl_block(&mut self, start: usize) -> Result<ImplBlock, ParseError> {
        self.consume(&Token::Impl, "Expected 'impl'")?;
        let struct_name = self.consume_identifier("a struct name")?;
        self.consume(&Token::LBrace, "Expected '{' after impl target")?;

        let mut methods = Vec::new();
        while !self.check(&Token::RBrace) && !self.is_at_end() {
            let method_start = self.current_start();
            let annotations = self.parse_annotations()?;

            let visibility = if self.match_token(&Token::Pub) {
                Visibility::Public
            } else if self.match_token(&Token::Priv) {
                Visibility::Private
            } else {
                return Err(self.error(
                    error_codes::MISSING_TOKEN,
                    "Methods in impl blocks require an explicit visibility ('pub' or 'priv')",
                ));
            };

            methods.push(self.parse_function(visibility, annotations, method_start)?);
        }

        self.consume(&Token::RBrace, "Expected '}' after impl block")?;

        Ok(ImplBlock {
            struct_name,
            methods,
            span: start..self.prev_end(),
        })
    }

    pub(crate) fn parse_extern_block(&mut self, start: usize) -> Result<ExternBlock, ParseError> {
        self.consume(&Token::Extern, "Expected 'extern'")?;

        let abi = match self.peek() {
            Token::StringLiteral(abi) => {
                let abi = abi.clone();
                self.advance();
                abi
            }
            _ => {
                return Err(self.error(
                    error_codes::MISSING_TOKEN,
                    "Expected ABI string after 'extern' (e.g. extern \"C\")",
                ))
            }
        };

        self.consume(&Token::LBrace, "Expected '{' after extern ABI")?;

        let mut functions = Vec::new();
        while !self.check(&Token::RBrace) && !self.is_at_end() {
            let fn_start = self.current_start();
            let annotations = self.parse_annotations()?;
            self.consume(&Token::Fn, "Expected 'fn' in extern block")?;
            let name = self.consume_identifier("a function name")?;

            self.consume(&Token::LParen, "Expected '(' after function name")?;
            let params = self.parse_params()?;
            self.consume(&Token::RParen, "Expected ')' after parameters")?;

            self.consume(&Token::Arrow, "Expected '->' before return type")?;
            let return_type = self.parse_type()?;
            self.consume(&Token::Semicolon, "Expected ';' after extern declaration")?;

            functions.push(ExternFunction {
                name,
                annotations,
                params,
                return_type,
                span: fn_start..self.prev_end(),
            });
        }

        self.consume(&Token::RBrace, "Expected '}' after extern block")?;

        Ok(ExternBlock {
            abi,
            functions,
            span: start..self.prev_end(),
        })
    }

    /// Generic type parameters on struct/enum declarations: <T, U>
    pub(crate) fn parse_type_params(&mut self) -> Result<Vec<String>, ParseError> {
        if !self.match_token(&Token::Lt) {
            return Ok(Vec::new());
        }

        let mut params = Vec::new();
        loop {
            params.push(self.consume_identifier("a type parameter name")?);
            if !self.match_token(&Token::Comma) {
                break;
            }
        }

        self.expect_gt()?;
        Ok(params)
    }
}
