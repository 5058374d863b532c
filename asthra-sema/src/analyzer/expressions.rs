// Expression typing. Successful analysis records the resolved type in the
// NodeId side table; literals lean on the expected-type context so
// `let x: u64 = 0;` types the literal as u64.

use asthra_ast::*;
use asthra_diagnostics::{error_codes, fuzzy};

use super::Analyzer;
use crate::symbols::SymbolKind;
use crate::types::{TypeId, TypeKind};

impl<'a> Analyzer<'a> {
    pub(crate) fn analyze_expr(&mut self, expr: &Expr, expected: Option<TypeId>) -> Option<TypeId> {
        let ty = match &expr.kind {
            ExprKind::IntLiteral(_) => Some(match expected {
                Some(e) if self.types.is_integer(e) => e,
                _ => self.types.primitive(PrimitiveType::I32),
            }),
            ExprKind::FloatLiteral(_) => Some(match expected {
                Some(e)
                    if matches!(self.types.kind(e), TypeKind::Primitive(p) if p.is_float()) =>
                {
                    e
                }
                _ => self.types.primitive(PrimitiveType::F32),
            }),
            ExprKind::StringLiteral(_) => Some(self.types.primitive(PrimitiveType::String)),
            ExprKind::CharLiteral(_) => Some(self.types.primitive(PrimitiveType::Char)),
            ExprKind::BoolLiteral(_) => Some(self.types.primitive(PrimitiveType::Bool)),
            ExprKind::Unit => Some(self.types.primitive(PrimitiveType::Void)),

            ExprKind::Tuple(items) => self.analyze_tuple(items, expected),
            ExprKind::Array(items) => self.analyze_array(expr, items, expected),

            ExprKind::Ident(name) => self.analyze_ident(expr, name),

            ExprKind::Binary { op, left, right } => self.analyze_binary(expr, *op, left, right),
            ExprKind::Unary { op, operand } => self.analyze_unary(expr, *op, operand),

            ExprKind::FieldAccess { object, field } => {
                self.analyze_field_access(expr, object, field)
            }
            ExprKind::Index { object, index } => self.analyze_index(expr, object, index),
            ExprKind::Slice { object, start, end } => {
                self.analyze_slice(expr, object, start.as_deref(), end.as_deref())
            }

            ExprKind::Call { callee, args } => self.analyze_call(expr, callee, args),
            ExprKind::AssociatedCall {
                type_name,
                function,
                args,
            } => self.analyze_associated_call(expr, type_name, function, args),

            ExprKind::EnumConstructor {
                enum_name,
                variant,
                payload,
            } => self.analyze_enum_constructor(expr, enum_name, variant, payload.as_deref(), expected),

            ExprKind::StructLiteral {
                name,
                type_args,
                fields,
            } => self.analyze_struct_literal(expr, name, type_args, fields, expected),

            ExprKind::SizeOf(ty) => {
                self.resolve_type(ty)?;
                Some(self.types.primitive(PrimitiveType::Usize))
            }

            ExprKind::Await(handle) => self.analyze_await(handle),

            ExprKind::Match { scrutinee, arms } => {
                self.analyze_match(scrutinee, arms, Some(expr), expected)
            }
        };

        if let Some(id) = ty {
            self.record_expr_type(expr, id);
        }
        ty
    }

    fn analyze_ident(&mut self, expr: &Expr, name: &str) -> Option<TypeId> {
        match self.scopes.lookup(name) {
            Some(symbol) => match symbol.kind {
                SymbolKind::Type => {
                    self.error(
                        error_codes::INVALID_OPERATION,
                        format!("type `{}` cannot be used as a value", name),
                        &expr.span,
                    );
                    None
                }
                _ => {
                    let ty = symbol.ty;
                    let initialized = symbol.is_initialized;
                    if !initialized {
                        self.warning(
                            error_codes::UNINITIALIZED_READ,
                            format!("`{}` may be read before it is initialized", name),
                            &expr.span,
                        );
                    }
                    Some(ty)
                }
            },
            None => {
                if self.aliases.resolve(name).is_some() {
                    self.error(
                        error_codes::UNKNOWN_MODULE_ALIAS,
                        format!("module alias `{}` cannot be used as a value", name),
                        &expr.span,
                    );
                } else {
                    self.undefined_symbol(name, &expr.span);
                }
                None
            }
        }
    }

    /// Fold Never into the other operand: an operand that never produces a
    /// value takes the type of its sibling.
    fn join_operands(&self, left: TypeId, right: TypeId) -> Option<TypeId> {
        if left == right {
            Some(left)
        } else if self.types.is_never(left) {
            Some(right)
        } else if self.types.is_never(right) {
            Some(left)
        } else {
            None
        }
    }

    fn analyze_binary(
        &mut self,
        expr: &Expr,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
    ) -> Option<TypeId> {
        let lt = self.analyze_expr(left, None);
        let rt = self.analyze_expr(right, lt);
        let (lt, rt) = (lt?, rt?);
        let bool_t = self.types.primitive(PrimitiveType::Bool);

        let mismatch = |analyzer: &mut Self| {
            let lhs = analyzer.types.display(lt);
            let rhs = analyzer.types.display(rt);
            analyzer.error(
                error_codes::TYPE_MISMATCH,
                format!(
                    "operator `{}` cannot combine `{}` and `{}`",
                    op_symbol(op),
                    lhs,
                    rhs
                ),
                &expr.span,
            );
            None
        };

        match op {
            BinaryOp::Eq | BinaryOp::NotEq => {
                if self.join_operands(lt, rt).is_some() {
                    Some(bool_t)
                } else {
                    mismatch(self)
                }
            }
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
                match self.join_operands(lt, rt) {
                    Some(joined) if self.types.is_numeric(joined) || self.types.is_never(joined) => {
                        Some(bool_t)
                    }
                    _ => mismatch(self),
                }
            }
            BinaryOp::And | BinaryOp::Or => {
                let lt_ok = self.types.is_primitive(lt, PrimitiveType::Bool) || self.types.is_never(lt);
                let rt_ok = self.types.is_primitive(rt, PrimitiveType::Bool) || self.types.is_never(rt);
                if lt_ok && rt_ok {
                    Some(bool_t)
                } else {
                    mismatch(self)
                }
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                match self.join_operands(lt, rt) {
                    Some(joined) if self.types.is_numeric(joined) => Some(joined),
                    _ => mismatch(self),
                }
            }
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => {
                match self.join_operands(lt, rt) {
                    Some(joined) if self.types.is_integer(joined) => Some(joined),
                    _ => mismatch(self),
                }
            }
            BinaryOp::Shl | BinaryOp::Shr => {
                if self.types.is_integer(lt) && self.types.is_integer(rt) {
                    Some(lt)
                } else {
                    mismatch(self)
                }
            }
        }
    }

    fn analyze_unary(&mut self, expr: &Expr, op: UnaryOp, operand: &Expr) -> Option<TypeId> {
        let ty = self.analyze_expr(operand, None)?;
        match op {
            UnaryOp::Neg => {
                if self.types.is_numeric(ty) {
                    Some(ty)
                } else {
                    let found = self.types.display(ty);
                    self.error(
                        error_codes::TYPE_MISMATCH,
                        format!("unary `-` requires a numeric operand, found `{}`", found),
                        &expr.span,
                    );
                    None
                }
            }
            UnaryOp::Not => {
                if self.types.is_primitive(ty, PrimitiveType::Bool) {
                    Some(ty)
                } else {
                    let found = self.types.display(ty);
                    self.error(
                        error_codes::TYPE_MISMATCH,
                        format!("unary `!` requires `bool`, found `{}`", found),
                        &expr.span,
                    );
                    None
                }
            }
            UnaryOp::BitNot => {
                if self.types.is_integer(ty) {
                    Some(ty)
                } else {
                    let found = self.types.display(ty);
                    self.error(
                        error_codes::TYPE_MISMATCH,
                        format!("unary `~` requires an integer operand, found `{}`", found),
                        &expr.span,
                    );
                    None
                }
            }
            UnaryOp::AddrOf => Some(self.types.intern(TypeKind::Pointer {
                pointee: ty,
                is_mutable: false,
            })),
            UnaryOp::Deref => match *self.types.kind(ty) {
                TypeKind::Pointer { pointee, .. } => {
                    if !self.in_unsafe_context {
                        self.error(
                            error_codes::UNSAFE_REQUIRED,
                            "dereferencing a raw pointer requires an unsafe block".to_string(),
                            &expr.span,
                        );
                    }
                    Some(pointee)
                }
                _ => {
                    let found = self.types.display(ty);
                    self.error(
                        error_codes::TYPE_MISMATCH,
                        format!("cannot dereference non-pointer type `{}`", found),
                        &expr.span,
                    );
                    None
                }
            },
        }
    }

    fn analyze_tuple(&mut self, items: &[Expr], expected: Option<TypeId>) -> Option<TypeId> {
        let element_hints: Vec<Option<TypeId>> = match expected.map(|e| self.types.kind(e).clone())
        {
            Some(TypeKind::Tuple { elements, .. }) if elements.len() == items.len() => {
                elements.into_iter().map(Some).collect()
            }
            _ => vec![None; items.len()],
        };

        let mut element_types = Vec::with_capacity(items.len());
        for (item, hint) in items.iter().zip(element_hints) {
            element_types.push(self.analyze_expr(item, hint)?);
        }
        Some(self.types.tuple(element_types))
    }

    fn analyze_array(
        &mut self,
        expr: &Expr,
        items: &[Expr],
        expected: Option<TypeId>,
    ) -> Option<TypeId> {
        // An expected slice/array type fixes the element type (and makes
        // the empty literal `[]` well-typed).
        if let Some(e) = expected {
            let element = match *self.types.kind(e) {
                TypeKind::Slice { element } => Some(element),
                TypeKind::Array { element, .. } => Some(element),
                _ => None,
            };
            if let Some(element) = element {
                for item in items {
                    if let Some(actual) = self.analyze_expr(item, Some(element)) {
                        if !self.types.compatible(element, actual) {
                            self.type_mismatch(element, actual, &item.span);
                        }
                    }
                }
                if let TypeKind::Array { length, .. } = *self.types.kind(e) {
                    if length != items.len() {
                        self.error(
                            error_codes::TYPE_MISMATCH,
                            format!(
                                "array literal has {} element(s) but the type wants {}",
                                items.len(),
                                length
                            ),
                            &expr.span,
                        );
                    }
                }
                return Some(e);
            }
        }

        let Some(first) = items.first() else {
            self.error(
                error_codes::TYPE_MISMATCH,
                "cannot infer the element type of an empty array literal".to_string(),
                &expr.span,
            );
            return None;
        };
        let element = self.analyze_expr(first, None)?;
        for item in &items[1..] {
            if let Some(actual) = self.analyze_expr(item, Some(element)) {
                if !self.types.compatible(element, actual) {
                    self.type_mismatch(element, actual, &item.span);
                }
            }
        }
        Some(self.types.intern(TypeKind::Slice { element }))
    }

    fn analyze_field_access(
        &mut self,
        expr: &Expr,
        object: &Expr,
        field: &str,
    ) -> Option<TypeId> {
        // `E.Variant` where E resolves to an enum type: a unit-variant
        // constructor the parser could not classify (forward reference).
        if let ExprKind::Ident(name) = &object.kind {
            let type_symbol = self
                .scopes
                .lookup(name)
                .filter(|s| s.kind == SymbolKind::Type)
                .map(|s| s.ty);
            if let Some(type_id) = type_symbol {
                return self.construct_unit_variant(expr, type_id, name, field);
            }
        }

        let object_ty = self.analyze_expr(object, None)?;
        let base = self.types.base_of(object_ty);
        let mapping = self.types.instance_mapping(object_ty);

        match self.types.kind(base).clone() {
            TypeKind::Tuple { elements, .. } => match field.parse::<usize>() {
                Ok(index) if index < elements.len() => Some(elements[index]),
                Ok(index) => {
                    self.error(
                        error_codes::UNKNOWN_MEMBER,
                        format!(
                            "tuple has {} element(s), no `.{}`",
                            elements.len(),
                            index
                        ),
                        &expr.span,
                    );
                    None
                }
                Err(_) => {
                    self.error(
                        error_codes::UNKNOWN_MEMBER,
                        format!("tuples are accessed by index, not `.{}`", field),
                        &expr.span,
                    );
                    None
                }
            },

            TypeKind::Struct(s) => match s.fields.iter().find(|f| f.name == field) {
                Some(info) => {
                    let ty = info.ty;
                    Some(self.types.substitute(ty, &mapping))
                }
                None => {
                    let names: Vec<String> = s.fields.iter().map(|f| f.name.clone()).collect();
                    let similar = fuzzy::find_similar_names(field, &names, 0.7, 1);
                    let mut message =
                        format!("no field `{}` on struct `{}`", field, s.name);
                    if let Some(best) = similar.first() {
                        message.push_str(&format!(" (did you mean `{}`?)", best));
                    }
                    self.error(error_codes::UNKNOWN_MEMBER, message, &expr.span);
                    None
                }
            },

            _ => {
                let found = self.types.display(object_ty);
                self.error(
                    error_codes::UNKNOWN_MEMBER,
                    format!("type `{}` has no field `{}`", found, field),
                    &expr.span,
                );
                None
            }
        }
    }

    fn construct_unit_variant(
        &mut self,
        expr: &Expr,
        type_id: TypeId,
        type_name: &str,
        variant: &str,
    ) -> Option<TypeId> {
        match self.types.kind(type_id).clone() {
            TypeKind::Enum(e) => match e.variants.iter().find(|v| v.name == variant) {
                Some(info) => {
                    if info.payload.is_some() {
                        self.error(
                            error_codes::TYPE_MISMATCH,
                            format!(
                                "variant `{}.{}` carries a payload; construct it as `{}.{}(value)`",
                                type_name, variant, type_name, variant
                            ),
                            &expr.span,
                        );
                        return None;
                    }
                    Some(type_id)
                }
                None => {
                    let names: Vec<String> = e.variants.iter().map(|v| v.name.clone()).collect();
                    let similar = fuzzy::find_similar_names(variant, &names, 0.7, 1);
                    let mut message =
                        format!("enum `{}` has no variant `{}`", type_name, variant);
                    if let Some(best) = similar.first() {
                        message.push_str(&format!(" (did you mean `{}`?)", best));
                    }
                    self.error(error_codes::UNKNOWN_MEMBER, message, &expr.span);
                    None
                }
            },
            _ => {
                self.error(
                    error_codes::INVALID_OPERATION,
                    format!("cannot access member `{}` of type `{}`", variant, type_name),
                    &expr.span,
                );
                None
            }
        }
    }

    fn analyze_index(&mut self, expr: &Expr, object: &Expr, index: &Expr) -> Option<TypeId> {
        let object_ty = self.analyze_expr(object, None)?;
        let element = match *self.types.kind(object_ty) {
            TypeKind::Slice { element } => element,
            TypeKind::Array { element, .. } => element,
            _ => {
                let found = self.types.display(object_ty);
                self.error(
                    error_codes::TYPE_MISMATCH,
                    format!("type `{}` cannot be indexed", found),
                    &expr.span,
                );
                return None;
            }
        };

        if let Some(index_ty) = self.analyze_expr(index, None) {
            if !self.types.is_integer(index_ty) && !self.types.is_never(index_ty) {
                let found = self.types.display(index_ty);
                self.error(
                    error_codes::TYPE_MISMATCH,
                    format!("index must be an integer, found `{}`", found),
                    &index.span,
                );
            }
        }
        Some(element)
    }

    fn analyze_slice(
        &mut self,
        expr: &Expr,
        object: &Expr,
        start: Option<&Expr>,
        end: Option<&Expr>,
    ) -> Option<TypeId> {
        let object_ty = self.analyze_expr(object, None)?;
        let element = match *self.types.kind(object_ty) {
            TypeKind::Slice { element } => element,
            TypeKind::Array { element, .. } => element,
            _ => {
                let found = self.types.display(object_ty);
                self.error(
                    error_codes::TYPE_MISMATCH,
                    format!("type `{}` cannot be sliced", found),
                    &expr.span,
                );
                return None;
            }
        };

        for bound in [start, end].into_iter().flatten() {
            if let Some(ty) = self.analyze_expr(bound, None) {
                if !self.types.is_integer(ty) && !self.types.is_never(ty) {
                    let found = self.types.display(ty);
                    self.error(
                        error_codes::TYPE_MISMATCH,
                        format!("slice bound must be an integer, found `{}`", found),
                        &bound.span,
                    );
                }
            }
        }

        Some(self.types.intern(TypeKind::Slice { element }))
    }

    fn analyze_call(&mut self, expr: &Expr, callee: &Expr, args: &[Expr]) -> Option<TypeId> {
        // obj.method(args), or Enum.Variant(payload) for forward-declared
        // enums the parser left as field accesses.
        if let ExprKind::FieldAccess { object, field } = &callee.kind {
            if let ExprKind::Ident(name) = &object.kind {
                let type_symbol = self
                    .scopes
                    .lookup(name)
                    .filter(|s| s.kind == SymbolKind::Type)
                    .map(|s| s.ty);
                if let Some(type_id) = type_symbol {
                    return self.construct_payload_variant(expr, type_id, name, field, args);
                }
            }
            return self.analyze_method_call(expr, callee, object, field, args);
        }

        if let ExprKind::Ident(name) = &callee.kind {
            return self.analyze_named_call(expr, callee, name, args);
        }

        // Calling through a value of function type
        let callee_ty = self.analyze_expr(callee, None)?;
        match self.types.kind(callee_ty).clone() {
            TypeKind::Function(f) => {
                self.check_arguments(expr, "function", &f.params, args);
                Some(f.return_type)
            }
            _ => {
                let found = self.types.display(callee_ty);
                self.error(
                    error_codes::INVALID_OPERATION,
                    format!("expression of type `{}` is not callable", found),
                    &expr.span,
                );
                None
            }
        }
    }

    fn analyze_named_call(
        &mut self,
        expr: &Expr,
        callee: &Expr,
        name: &str,
        args: &[Expr],
    ) -> Option<TypeId> {
        let symbol = match self.scopes.lookup(name) {
            Some(symbol) => symbol.clone(),
            None => {
                for arg in args {
                    self.analyze_expr(arg, None);
                }
                self.undefined_symbol(name, &callee.span);
                return None;
            }
        };

        let function = match self.types.kind(symbol.ty).clone() {
            TypeKind::Function(f) => f,
            _ => {
                let found = self.types.display(symbol.ty);
                self.error(
                    error_codes::INVALID_OPERATION,
                    format!("`{}` of type `{}` is not callable", name, found),
                    &expr.span,
                );
                return None;
            }
        };
        self.record_expr_type(callee, symbol.ty);

        // Calling into foreign code is an unsafe operation
        if function.is_extern && !self.in_unsafe_context {
            self.error(
                error_codes::UNSAFE_REQUIRED,
                format!("calling extern function `{}` requires an unsafe block", name),
                &expr.span,
            );
        }

        // `range` is the one overloaded predeclared name: (end) or
        // (start, end).
        if symbol.is_predeclared && name == "range" && args.len() == 1 {
            let i32_t = self.types.primitive(PrimitiveType::I32);
            if let Some(actual) = self.analyze_expr(&args[0], Some(i32_t)) {
                if !self.types.compatible(i32_t, actual) {
                    self.type_mismatch(i32_t, actual, &args[0].span);
                }
            }
            return Some(function.return_type);
        }

        self.check_arguments(expr, name, &function.params, args);
        Some(function.return_type)
    }

    fn analyze_method_call(
        &mut self,
        expr: &Expr,
        callee: &Expr,
        object: &Expr,
        method: &str,
        args: &[Expr],
    ) -> Option<TypeId> {
        let object_ty = self.analyze_expr(object, None)?;
        let base = self.types.base_of(object_ty);
        let mapping = self.types.instance_mapping(object_ty);

        let info = match self.types.lookup_method(base, method) {
            Some(info) => info.clone(),
            None => {
                let names = self.types.method_names(base);
                let similar = fuzzy::find_similar_names(method, &names, 0.7, 1);
                let type_name = self.types.display(base);
                let mut message = format!("no method `{}` on `{}`", method, type_name);
                if let Some(best) = similar.first() {
                    message.push_str(&format!(" (did you mean `{}`?)", best));
                }
                self.error(error_codes::UNKNOWN_MEMBER, message, &expr.span);
                return None;
            }
        };

        if !info.is_instance_method {
            let type_name = self.types.display(base);
            self.error(
                error_codes::INVALID_OPERATION,
                format!(
                    "`{}` is an associated function; call it as `{}::{}(…)`",
                    method, type_name, method
                ),
                &expr.span,
            );
            return None;
        }

        let function = match self.types.kind(info.ty).clone() {
            TypeKind::Function(f) => f,
            _ => return None,
        };
        self.record_expr_type(callee, info.ty);

        let params: Vec<TypeId> = function
            .params
            .iter()
            .map(|&p| self.types.substitute(p, &mapping))
            .collect();
        self.check_arguments(expr, method, &params, args);
        Some(self.types.substitute(function.return_type, &mapping))
    }

    fn analyze_associated_call(
        &mut self,
        expr: &Expr,
        type_name: &str,
        function: &str,
        args: &[Expr],
    ) -> Option<TypeId> {
        let type_id = match self.scopes.lookup(type_name) {
            Some(symbol) if symbol.kind == SymbolKind::Type => symbol.ty,
            Some(_) => {
                self.error(
                    error_codes::INVALID_OPERATION,
                    format!("`{}` is not a type", type_name),
                    &expr.span,
                );
                return None;
            }
            None => {
                self.undefined_symbol(type_name, &expr.span);
                return None;
            }
        };

        let info = match self.types.lookup_method(type_id, function) {
            Some(info) => info.clone(),
            None => {
                self.error(
                    error_codes::UNKNOWN_MEMBER,
                    format!("no associated function `{}` on `{}`", function, type_name),
                    &expr.span,
                );
                return None;
            }
        };

        if info.is_instance_method {
            self.error(
                error_codes::INVALID_OPERATION,
                format!(
                    "`{}` is an instance method; call it as `value.{}(…)`",
                    function, function
                ),
                &expr.span,
            );
            return None;
        }

        let fn_type = match self.types.kind(info.ty).clone() {
            TypeKind::Function(f) => f,
            _ => return None,
        };
        self.check_arguments(expr, function, &fn_type.params, args);
        Some(fn_type.return_type)
    }

    fn check_arguments(&mut self, expr: &Expr, name: &str, params: &[TypeId], args: &[Expr]) {
        if params.len() != args.len() {
            let span = self.span(&expr.span);
            self.diagnostics
                .argument_count_mismatch(name, params.len(), args.len(), span);
            for arg in args {
                self.analyze_expr(arg, None);
            }
            return;
        }
        for (&param, arg) in params.iter().zip(args.iter()) {
            if let Some(actual) = self.analyze_expr(arg, Some(param)) {
                if !self.types.compatible(param, actual) {
                    self.type_mismatch(param, actual, &arg.span);
                }
            }
        }
    }

    fn construct_payload_variant(
        &mut self,
        expr: &Expr,
        type_id: TypeId,
        type_name: &str,
        variant: &str,
        args: &[Expr],
    ) -> Option<TypeId> {
        let enum_type = match self.types.kind(type_id).clone() {
            TypeKind::Enum(e) => e,
            _ => {
                self.error(
                    error_codes::INVALID_OPERATION,
                    format!("`{}` is not an enum", type_name),
                    &expr.span,
                );
                return None;
            }
        };

        let Some(info) = enum_type.variants.iter().find(|v| v.name == variant).cloned() else {
            self.error(
                error_codes::UNKNOWN_MEMBER,
                format!("enum `{}` has no variant `{}`", type_name, variant),
                &expr.span,
            );
            return None;
        };

        match info.payload {
            Some(payload) => {
                if args.len() != 1 {
                    let span = self.span(&expr.span);
                    self.diagnostics
                        .argument_count_mismatch(variant, 1, args.len(), span);
                    return Some(type_id);
                }
                if let Some(actual) = self.analyze_expr(&args[0], Some(payload)) {
                    if !self.types.compatible(payload, actual) {
                        self.type_mismatch(payload, actual, &args[0].span);
                    }
                }
                Some(type_id)
            }
            None => {
                self.error(
                    error_codes::TYPE_MISMATCH,
                    format!(
                        "variant `{}.{}` has no payload; write `{}.{}`",
                        type_name, variant, type_name, variant
                    ),
                    &expr.span,
                );
                Some(type_id)
            }
        }
    }

    fn analyze_enum_constructor(
        &mut self,
        expr: &Expr,
        enum_name: &str,
        variant: &str,
        payload: Option<&Expr>,
        expected: Option<TypeId>,
    ) -> Option<TypeId> {
        match enum_name {
            "Option" => self.analyze_option_constructor(expr, variant, payload, expected),
            "Result" => self.analyze_result_constructor(expr, variant, payload, expected),
            _ => self.analyze_user_enum_constructor(expr, enum_name, variant, payload, expected),
        }
    }

    fn analyze_option_constructor(
        &mut self,
        expr: &Expr,
        variant: &str,
        payload: Option<&Expr>,
        expected: Option<TypeId>,
    ) -> Option<TypeId> {
        let expected_value = expected.and_then(|e| match *self.types.kind(e) {
            TypeKind::Option { value } => Some(value),
            _ => None,
        });

        match variant {
            "Some" => {
                let Some(payload) = payload else {
                    self.error(
                        error_codes::TYPE_MISMATCH,
                        "Option.Some requires a payload".to_string(),
                        &expr.span,
                    );
                    return None;
                };
                let value = self.analyze_expr(payload, expected_value)?;
                if let Some(expected_value) = expected_value {
                    if !self.types.compatible(expected_value, value) {
                        self.type_mismatch(expected_value, value, &payload.span);
                    }
                    return Some(self.types.intern(TypeKind::Option {
                        value: expected_value,
                    }));
                }
                Some(self.types.intern(TypeKind::Option { value }))
            }
            "None" => {
                if payload.is_some() {
                    self.error(
                        error_codes::TYPE_MISMATCH,
                        "Option.None carries no payload".to_string(),
                        &expr.span,
                    );
                }
                match expected_value {
                    Some(value) => Some(self.types.intern(TypeKind::Option { value })),
                    None => {
                        self.error(
                            error_codes::TYPE_MISMATCH,
                            "cannot infer the value type of Option.None here; annotate the target"
                                .to_string(),
                            &expr.span,
                        );
                        None
                    }
                }
            }
            other => {
                self.error(
                    error_codes::UNKNOWN_MEMBER,
                    format!("Option has no variant `{}` (only Some and None)", other),
                    &expr.span,
                );
                None
            }
        }
    }

    fn analyze_result_constructor(
        &mut self,
        expr: &Expr,
        variant: &str,
        payload: Option<&Expr>,
        expected: Option<TypeId>,
    ) -> Option<TypeId> {
        let expected_pair = expected.and_then(|e| match *self.types.kind(e) {
            TypeKind::Result { ok, err } => Some((ok, err)),
            _ => None,
        });

        let side = match variant {
            "Ok" => expected_pair.map(|(ok, _)| ok),
            "Err" => expected_pair.map(|(_, err)| err),
            other => {
                self.error(
                    error_codes::UNKNOWN_MEMBER,
                    format!("Result has no variant `{}` (only Ok and Err)", other),
                    &expr.span,
                );
                return None;
            }
        };

        let Some(payload) = payload else {
            self.error(
                error_codes::TYPE_MISMATCH,
                format!("Result.{} requires a payload", variant),
                &expr.span,
            );
            return None;
        };

        let actual = self.analyze_expr(payload, side)?;
        match (expected_pair, side) {
            (Some((ok, err)), Some(side)) => {
                if !self.types.compatible(side, actual) {
                    self.type_mismatch(side, actual, &payload.span);
                }
                Some(self.types.intern(TypeKind::Result { ok, err }))
            }
            _ => {
                self.error(
                    error_codes::TYPE_MISMATCH,
                    format!(
                        "cannot infer the other side of Result.{} here; annotate the target",
                        variant
                    ),
                    &expr.span,
                );
                None
            }
        }
    }

    fn analyze_user_enum_constructor(
        &mut self,
        expr: &Expr,
        enum_name: &str,
        variant: &str,
        payload: Option<&Expr>,
        expected: Option<TypeId>,
    ) -> Option<TypeId> {
        let symbol = match self.scopes.lookup(enum_name) {
            Some(symbol) if symbol.kind == SymbolKind::Type => symbol.clone(),
            _ => {
                self.undefined_symbol(enum_name, &expr.span);
                return None;
            }
        };

        let enum_type = match self.types.kind(symbol.ty).clone() {
            TypeKind::Enum(e) => e,
            _ => {
                self.error(
                    error_codes::INVALID_OPERATION,
                    format!("`{}` is not an enum", enum_name),
                    &expr.span,
                );
                return None;
            }
        };

        // A generic enum needs an instance type from context.
        let (result, mapping) = if symbol.is_generic {
            match expected.filter(|&e| self.types.base_of(e) == symbol.ty) {
                Some(instance) => (instance, self.types.instance_mapping(instance)),
                None => {
                    self.error(
                        error_codes::TYPE_MISMATCH,
                        format!(
                            "cannot infer type arguments for generic enum `{}` here; annotate the target",
                            enum_name
                        ),
                        &expr.span,
                    );
                    return None;
                }
            }
        } else {
            (symbol.ty, std::collections::HashMap::new())
        };

        let Some(info) = enum_type.variants.iter().find(|v| v.name == variant).cloned() else {
            let names: Vec<String> = enum_type.variants.iter().map(|v| v.name.clone()).collect();
            let similar = fuzzy::find_similar_names(variant, &names, 0.7, 1);
            let mut message = format!("enum `{}` has no variant `{}`", enum_name, variant);
            if let Some(best) = similar.first() {
                message.push_str(&format!(" (did you mean `{}`?)", best));
            }
            self.error(error_codes::UNKNOWN_MEMBER, message, &expr.span);
            return None;
        };

        match (info.payload, payload) {
            (Some(payload_ty), Some(value)) => {
                let expected_payload = self.types.substitute(payload_ty, &mapping);
                if let Some(actual) = self.analyze_expr(value, Some(expected_payload)) {
                    if !self.types.compatible(expected_payload, actual) {
                        self.type_mismatch(expected_payload, actual, &value.span);
                    }
                }
            }
            (Some(_), None) => {
                self.error(
                    error_codes::TYPE_MISMATCH,
                    format!(
                        "variant `{}.{}` carries a payload; construct it as `{}.{}(value)`",
                        enum_name, variant, enum_name, variant
                    ),
                    &expr.span,
                );
            }
            (None, Some(value)) => {
                self.analyze_expr(value, None);
                self.error(
                    error_codes::TYPE_MISMATCH,
                    format!("variant `{}.{}` has no payload", enum_name, variant),
                    &expr.span,
                );
            }
            (None, None) => {}
        }

        Some(result)
    }

    fn analyze_struct_literal(
        &mut self,
        expr: &Expr,
        name: &str,
        type_args: &[TypeExpr],
        fields: &[(String, Expr)],
        expected: Option<TypeId>,
    ) -> Option<TypeId> {
        let symbol = match self.scopes.lookup(name) {
            Some(symbol) if symbol.kind == SymbolKind::Type => symbol.clone(),
            Some(_) => {
                self.error(
                    error_codes::INVALID_OPERATION,
                    format!("`{}` is not a type", name),
                    &expr.span,
                );
                return None;
            }
            None => {
                self.undefined_symbol(name, &expr.span);
                return None;
            }
        };

        let struct_type = match self.types.kind(symbol.ty).clone() {
            TypeKind::Struct(s) => s,
            _ => {
                self.error(
                    error_codes::INVALID_OPERATION,
                    format!("`{}` is not a struct", name),
                    &expr.span,
                );
                return None;
            }
        };

        let (result, mapping) = if symbol.is_generic {
            if !type_args.is_empty() {
                if type_args.len() != symbol.type_param_count {
                    self.error(
                        error_codes::TYPE_MISMATCH,
                        format!(
                            "struct `{}` expects {} type argument(s), found {}",
                            name,
                            symbol.type_param_count,
                            type_args.len()
                        ),
                        &expr.span,
                    );
                    return None;
                }
                let mut args = Vec::with_capacity(type_args.len());
                for arg in type_args {
                    args.push(self.resolve_type(arg)?);
                }
                let instance = self.types.intern(TypeKind::GenericInstance {
                    base: symbol.ty,
                    args,
                });
                let mapping = self.types.instance_mapping(instance);
                (instance, mapping)
            } else {
                match expected.filter(|&e| self.types.base_of(e) == symbol.ty) {
                    Some(instance) => (instance, self.types.instance_mapping(instance)),
                    None => {
                        self.error(
                            error_codes::TYPE_MISMATCH,
                            format!("generic struct `{}` needs type arguments here", name),
                            &expr.span,
                        );
                        return None;
                    }
                }
            }
        } else {
            if !type_args.is_empty() {
                self.error(
                    error_codes::TYPE_MISMATCH,
                    format!("struct `{}` does not take type arguments", name),
                    &expr.span,
                );
            }
            (symbol.ty, std::collections::HashMap::new())
        };

        let mut seen = std::collections::HashSet::new();
        for (field_name, value) in fields {
            if !seen.insert(field_name.clone()) {
                self.error(
                    error_codes::DUPLICATE_SYMBOL,
                    format!("field `{}` specified more than once", field_name),
                    &value.span,
                );
                continue;
            }
            match struct_type.fields.iter().find(|f| &f.name == field_name) {
                Some(info) => {
                    let field_ty = info.ty;
                    let expected_field = self.types.substitute(field_ty, &mapping);
                    if let Some(actual) = self.analyze_expr(value, Some(expected_field)) {
                        if !self.types.compatible(expected_field, actual) {
                            self.type_mismatch(expected_field, actual, &value.span);
                        }
                    }
                }
                None => {
                    self.error(
                        error_codes::UNKNOWN_MEMBER,
                        format!("struct `{}` has no field `{}`", name, field_name),
                        &value.span,
                    );
                }
            }
        }

        for field in &struct_type.fields {
            if !seen.contains(&field.name) {
                self.error(
                    error_codes::INVALID_OPERATION,
                    format!("missing field `{}` in struct literal `{}`", field.name, name),
                    &expr.span,
                );
            }
        }

        Some(result)
    }

    fn analyze_await(&mut self, handle: &Expr) -> Option<TypeId> {
        let handle_ty = self.analyze_expr(handle, None)?;
        match *self.types.kind(handle_ty) {
            TypeKind::TaskHandle { result } => Some(result),
            _ => {
                let found = self.types.display(handle_ty);
                self.error(
                    error_codes::TYPE_MISMATCH,
                    format!("await requires a TaskHandle, found `{}`", found),
                    &handle.span,
                );
                None
            }
        }
    }
}

fn op_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        BinaryOp::Eq => "==",
        BinaryOp::NotEq => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::LtEq => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::GtEq => ">=",
        BinaryOp::And => "&&",
        BinaryOp::Or => "||",
        BinaryOp::BitAnd => "&",
        BinaryOp::BitOr => "|",
        BinaryOp::BitXor => "^",
        BinaryOp::Shl => "<<",
        BinaryOp::Shr => ">>",
    }
}
