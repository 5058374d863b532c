// Pattern validation against an expected type, plus match analysis with
// the exhaustiveness advisory. Pattern bindings land in the caller's
// freshly opened pattern scope.

use std::collections::HashSet;

use asthra_ast::*;
use asthra_diagnostics::error_codes;

use super::Analyzer;
use crate::symbols::Symbol;
use crate::types::{TypeId, TypeKind};

impl<'a> Analyzer<'a> {
    /// Recursively validate `pattern` against `expected`, binding pattern
    /// variables in the current scope. Returns false when the pattern
    /// cannot match values of the expected type.
    pub(crate) fn validate_pattern(&mut self, pattern: &Pattern, expected: TypeId) -> bool {
        match &pattern.kind {
            PatternKind::Wildcard => true,

            PatternKind::Ident(name) => {
                if !self
                    .scopes
                    .insert(Symbol::variable(name, expected, false, pattern.span.clone()))
                {
                    let span = self.span(&pattern.span);
                    self.diagnostics.duplicate_symbol(name, span);
                }
                true
            }

            PatternKind::Tuple(elements) => match self.types.kind(expected).clone() {
                TypeKind::Tuple {
                    elements: expected_elements,
                    ..
                } => {
                    if expected_elements.len() != elements.len() {
                        self.error(
                            error_codes::INVALID_PATTERN,
                            format!(
                                "tuple pattern has {} element(s) but the value has {}",
                                elements.len(),
                                expected_elements.len()
                            ),
                            &pattern.span,
                        );
                        return false;
                    }
                    let mut ok = true;
                    for (sub, &ty) in elements.iter().zip(expected_elements.iter()) {
                        ok &= self.validate_pattern(sub, ty);
                    }
                    ok
                }
                _ => {
                    let found = self.types.display(expected);
                    self.error(
                        error_codes::INVALID_PATTERN,
                        format!("tuple pattern cannot match value of type `{}`", found),
                        &pattern.span,
                    );
                    false
                }
            },

            PatternKind::Enum {
                enum_name,
                variant,
                inner,
            } => self.validate_enum_pattern(pattern, enum_name, variant, inner.as_deref(), expected),

            PatternKind::Struct {
                name,
                type_args,
                fields,
                has_rest: _,
            } => self.validate_struct_pattern(pattern, name, type_args, fields, expected),

            PatternKind::Literal(literal) => self.validate_literal_pattern(pattern, literal, expected),
        }
    }

    fn validate_enum_pattern(
        &mut self,
        pattern: &Pattern,
        enum_name: &str,
        variant: &str,
        inner: Option<&Pattern>,
        expected: TypeId,
    ) -> bool {
        // Option/Result carry their payload types directly
        if let TypeKind::Option { value } = *self.types.kind(expected) {
            if enum_name != "Option" {
                return self.pattern_type_clash(pattern, enum_name, expected);
            }
            return match variant {
                "Some" => match inner {
                    Some(sub) => self.validate_pattern(sub, value),
                    None => true,
                },
                "None" => {
                    if inner.is_some() {
                        self.error(
                            error_codes::INVALID_PATTERN,
                            "Option.None carries no payload".to_string(),
                            &pattern.span,
                        );
                        false
                    } else {
                        true
                    }
                }
                other => {
                    self.error(
                        error_codes::INVALID_PATTERN,
                        format!("Option has no variant `{}` (only Some and None)", other),
                        &pattern.span,
                    );
                    false
                }
            };
        }

        if let TypeKind::Result { ok, err } = *self.types.kind(expected) {
            if enum_name != "Result" {
                return self.pattern_type_clash(pattern, enum_name, expected);
            }
            let payload = match variant {
                "Ok" => ok,
                "Err" => err,
                other => {
                    self.error(
                        error_codes::INVALID_PATTERN,
                        format!("Result has no variant `{}` (only Ok and Err)", other),
                        &pattern.span,
                    );
                    return false;
                }
            };
            return match inner {
                Some(sub) => self.validate_pattern(sub, payload),
                None => true,
            };
        }

        // User enums, possibly through a generic instance
        let base = self.types.base_of(expected);
        let mapping = self.types.instance_mapping(expected);
        let enum_type = match self.types.kind(base).clone() {
            TypeKind::Enum(e) => e,
            _ => return self.pattern_type_clash(pattern, enum_name, expected),
        };

        if enum_type.name != enum_name {
            return self.pattern_type_clash(pattern, enum_name, expected);
        }

        let Some(info) = enum_type.variants.iter().find(|v| v.name == variant).cloned() else {
            self.error(
                error_codes::INVALID_PATTERN,
                format!("enum `{}` has no variant `{}`", enum_name, variant),
                &pattern.span,
            );
            return false;
        };

        match (info.payload, inner) {
            (Some(payload), Some(sub)) => {
                let payload = self.types.substitute(payload, &mapping);
                self.validate_pattern(sub, payload)
            }
            (Some(_), None) => true,
            (None, Some(_)) => {
                self.error(
                    error_codes::INVALID_PATTERN,
                    format!("variant `{}.{}` has no payload to bind", enum_name, variant),
                    &pattern.span,
                );
                false
            }
            (None, None) => true,
        }
    }

    fn validate_struct_pattern(
        &mut self,
        pattern: &Pattern,
        name: &str,
        type_args: &[TypeExpr],
        fields: &[(String, Pattern)],
        expected: TypeId,
    ) -> bool {
        let base = self.types.base_of(expected);
        let mapping = self.types.instance_mapping(expected);

        let struct_type = match self.types.kind(base).clone() {
            TypeKind::Struct(s) => s,
            _ => return self.pattern_type_clash(pattern, name, expected),
        };
        if struct_type.name != name {
            return self.pattern_type_clash(pattern, name, expected);
        }

        // Explicit pattern type-args must agree with the instance pairwise
        if !type_args.is_empty() {
            let instance_args = match self.types.kind(expected).clone() {
                TypeKind::GenericInstance { args, .. } => args,
                _ => Vec::new(),
            };
            if type_args.len() != instance_args.len() {
                self.error(
                    error_codes::INVALID_PATTERN,
                    format!(
                        "pattern has {} type argument(s) but the value has {}",
                        type_args.len(),
                        instance_args.len()
                    ),
                    &pattern.span,
                );
                return false;
            }
            for (arg_expr, &instance_arg) in type_args.iter().zip(instance_args.iter()) {
                if let Some(resolved) = self.resolve_type(arg_expr) {
                    if resolved != instance_arg {
                        let want = self.types.display(instance_arg);
                        let got = self.types.display(resolved);
                        self.error(
                            error_codes::INVALID_PATTERN,
                            format!("pattern type argument `{}` does not match `{}`", got, want),
                            &arg_expr.span,
                        );
                        return false;
                    }
                }
            }
        }

        let mut ok = true;
        for (field_name, sub) in fields {
            match struct_type.fields.iter().find(|f| &f.name == field_name) {
                Some(info) => {
                    let field_ty = self.types.substitute(info.ty, &mapping);
                    ok &= self.validate_pattern(sub, field_ty);
                }
                None => {
                    self.error(
                        error_codes::UNKNOWN_MEMBER,
                        format!("struct `{}` has no field `{}`", name, field_name),
                        &sub.span,
                    );
                    ok = false;
                }
            }
        }
        ok
    }

    fn validate_literal_pattern(
        &mut self,
        pattern: &Pattern,
        literal: &LiteralPattern,
        expected: TypeId,
    ) -> bool {
        let ok = match literal {
            LiteralPattern::Int(_) => self.types.is_integer(expected),
            LiteralPattern::Float(_) => {
                matches!(self.types.kind(expected), TypeKind::Primitive(p) if p.is_float())
            }
            LiteralPattern::String(_) => self.types.is_primitive(expected, PrimitiveType::String),
            LiteralPattern::Bool(_) => self.types.is_primitive(expected, PrimitiveType::Bool),
            LiteralPattern::Char(_) => self.types.is_primitive(expected, PrimitiveType::Char),
        };
        if !ok {
            let found = self.types.display(expected);
            self.error(
                error_codes::INVALID_PATTERN,
                format!("literal pattern cannot match value of type `{}`", found),
                &pattern.span,
            );
        }
        ok
    }

    fn pattern_type_clash(&mut self, pattern: &Pattern, pattern_name: &str, expected: TypeId) -> bool {
        let found = self.types.display(expected);
        self.error(
            error_codes::INVALID_PATTERN,
            format!(
                "pattern `{}` cannot match value of type `{}`",
                pattern_name, found
            ),
            &pattern.span,
        );
        false
    }

    /// Shared by statement- and expression-position match. For expression
    /// position (`as_expr` set) arm bodies are typed against the caller's
    /// `expected` type until the first arm settles a running result, and
    /// all arms must agree on it. Non-exhaustive matches warn, never
    /// error.
    pub(crate) fn analyze_match(
        &mut self,
        scrutinee: &Expr,
        arms: &[MatchArm],
        as_expr: Option<&Expr>,
        expected: Option<TypeId>,
    ) -> Option<TypeId> {
        let scrutinee_ty = self.analyze_expr(scrutinee, None);

        let mut covered: HashSet<String> = HashSet::new();
        let mut has_catch_all = false;
        let mut bool_true = false;
        let mut bool_false = false;
        let mut result: Option<TypeId> = None;

        for arm in arms {
            match &arm.pattern.kind {
                PatternKind::Wildcard | PatternKind::Ident(_) => has_catch_all = true,
                PatternKind::Enum { variant, .. } => {
                    covered.insert(variant.clone());
                }
                PatternKind::Literal(LiteralPattern::Bool(true)) => bool_true = true,
                PatternKind::Literal(LiteralPattern::Bool(false)) => bool_false = true,
                _ => {}
            }

            self.scopes.enter_scope();
            if let Some(ty) = scrutinee_ty {
                self.validate_pattern(&arm.pattern, ty);
            }

            match &arm.body {
                ArmBody::Expr(body) => {
                    // Seed literals from the settled arm type, or from the
                    // caller's expected type while no arm (or only a
                    // Never arm) has settled one.
                    let hint = match result {
                        Some(current) if !self.types.is_never(current) => Some(current),
                        _ => expected,
                    };
                    if let Some(ty) = self.analyze_expr(body, hint) {
                        if as_expr.is_some() {
                            result = match result {
                                None => Some(ty),
                                Some(current) if self.types.is_never(current) => Some(ty),
                                Some(current) => {
                                    if !self.types.compatible(current, ty) {
                                        let want = self.types.display(current);
                                        let got = self.types.display(ty);
                                        self.error(
                                            error_codes::TYPE_MISMATCH,
                                            format!(
                                                "match arms disagree: expected `{}`, found `{}`",
                                                want, got
                                            ),
                                            &body.span,
                                        );
                                    }
                                    Some(current)
                                }
                            };
                        }
                    }
                }
                ArmBody::Block(block) => {
                    self.analyze_block(block);
                }
            }
            self.scopes.exit_scope();
        }

        if !has_catch_all {
            let exhaustive = match scrutinee_ty.map(|t| self.types.kind(self.types.base_of(t)).clone())
            {
                Some(TypeKind::Option { .. }) => {
                    covered.contains("Some") && covered.contains("None")
                }
                Some(TypeKind::Result { .. }) => covered.contains("Ok") && covered.contains("Err"),
                Some(TypeKind::Enum(e)) => {
                    e.variants.iter().all(|v| covered.contains(&v.name))
                }
                Some(TypeKind::Primitive(PrimitiveType::Bool)) => bool_true && bool_false,
                _ => false,
            };
            if !exhaustive {
                self.warning(
                    error_codes::NON_EXHAUSTIVE_MATCH,
                    "match may not be exhaustive; consider adding a wildcard arm `_`".to_string(),
                    &scrutinee.span,
                );
            }
        }

        if as_expr.is_some() {
            Some(result.unwrap_or_else(|| self.types.primitive(PrimitiveType::Void)))
        } else {
            None
        }
    }
}
