// Semantic analysis over a parsed program. The walk is three-phase so
// forward references resolve: (1) register type declarations, (2) register
// function/method signatures, (3) analyze bodies.

use std::collections::{HashMap, HashSet};

use asthra_ast::*;
use asthra_diagnostics::{error_codes, Diagnostic, DiagnosticEngine, Span};

use crate::symbols::{global_alias_registry, ModuleAliasRegistry, ScopeStack, Symbol, SymbolKind};
use crate::types::{FunctionType, TypeId, TypeKind, TypeTable};

mod declarations;
mod expressions;
mod impls;
mod patterns;
mod statements;

pub struct Analyzer<'a> {
    pub(crate) types: TypeTable,
    pub(crate) scopes: ScopeStack,
    pub(crate) diagnostics: DiagnosticEngine,
    pub(crate) expr_types: HashMap<NodeId, TypeId>,
    /// Process-wide module-alias table shared by concurrently analyzed
    /// units; pre-populated from `AnalyzerOptions` and extended by this
    /// unit's imports.
    pub(crate) aliases: &'static ModuleAliasRegistry,
    source: &'a str,
    file_name: String,
    /// Pushed/popped around each function body; `return` checks against
    /// the top.
    pub(crate) return_type_stack: Vec<TypeId>,
    pub(crate) loop_depth: usize,
    pub(crate) in_unsafe_context: bool,
    /// `Self` binding inside an impl block.
    pub(crate) self_type: Option<TypeId>,
    /// Type parameters in scope while resolving a generic declaration.
    pub(crate) current_type_params: Vec<String>,
}

impl<'a> Analyzer<'a> {
    pub fn new(source: &'a str, file_name: &str, max_errors: usize) -> Self {
        Self {
            types: TypeTable::new(),
            scopes: ScopeStack::new(),
            diagnostics: DiagnosticEngine::with_max_errors(max_errors),
            expr_types: HashMap::new(),
            aliases: global_alias_registry(),
            source,
            file_name: file_name.to_string(),
            return_type_stack: Vec::new(),
            loop_depth: 0,
            in_unsafe_context: false,
            self_type: None,
            current_type_params: Vec::new(),
        }
    }

    pub fn analyze(&mut self, program: &Program) {
        self.predeclare();
        self.register_imports(program);

        log::debug!("{}: registering type declarations", self.file_name);
        self.register_type_declarations(program);

        log::debug!("{}: registering signatures", self.file_name);
        for decl in &program.decls {
            match decl {
                Decl::Function(function) => self.register_function(function),
                Decl::Extern(block) => self.register_extern_block(block),
                Decl::Impl(impl_block) => self.register_impl_block(impl_block),
                Decl::Struct(_) | Decl::Enum(_) => {}
            }
        }

        log::debug!("{}: analyzing bodies", self.file_name);
        for decl in &program.decls {
            match decl {
                Decl::Function(function) => self.analyze_function_body(function, None),
                Decl::Impl(impl_block) => self.analyze_impl_bodies(impl_block),
                _ => {}
            }
        }

        self.check_unused_imports(program);
    }

    // ==================== Shared helpers ====================

    pub(crate) fn span(&self, bytes: &ByteSpan) -> Span {
        Span::from_file_and_span(&self.file_name, self.source, bytes.clone())
    }

    pub(crate) fn error(&mut self, code: u16, message: String, bytes: &ByteSpan) {
        let span = self.span(bytes);
        self.diagnostics.emit(Diagnostic::error(code, message, span));
    }

    pub(crate) fn warning(&mut self, code: u16, message: String, bytes: &ByteSpan) {
        let span = self.span(bytes);
        self.diagnostics
            .emit(Diagnostic::warning(code, message, span));
    }

    pub(crate) fn type_mismatch(&mut self, expected: TypeId, actual: TypeId, bytes: &ByteSpan) {
        let expected = self.types.display(expected);
        let actual = self.types.display(actual);
        let span = self.span(bytes);
        self.diagnostics.type_mismatch(&expected, &actual, span);
    }

    pub(crate) fn undefined_symbol(&mut self, name: &str, bytes: &ByteSpan) {
        let span = self.span(bytes);
        let candidates = self.scopes.visible_names();
        self.diagnostics.undefined_symbol(name, span, &candidates);
    }

    pub(crate) fn record_expr_type(&mut self, expr: &Expr, ty: TypeId) -> TypeId {
        self.expr_types.insert(expr.id, ty);
        ty
    }

    /// Predeclared identifiers inserted into the root scope. `range` is
    /// registered with its two-argument signature; call resolution also
    /// accepts the one-argument form.
    fn predeclare(&mut self) {
        let string_t = self.types.primitive(PrimitiveType::String);
        let void_t = self.types.primitive(PrimitiveType::Void);
        let never_t = self.types.primitive(PrimitiveType::Never);
        let i32_t = self.types.primitive(PrimitiveType::I32);
        let slice_i32 = self.types.intern(TypeKind::Slice { element: i32_t });

        let mut insert = |analyzer: &mut Self, name: &str, params: Vec<TypeId>, ret: TypeId| {
            let ty = analyzer.types.intern(TypeKind::Function(FunctionType {
                params,
                return_type: ret,
                is_extern: false,
                extern_abi: None,
            }));
            let mut symbol = Symbol::function(name, ty, Visibility::Public, 0..0);
            symbol.is_predeclared = true;
            analyzer.scopes.insert(symbol);
        };

        insert(self, "log", vec![string_t], void_t);
        insert(self, "panic", vec![string_t], never_t);
        insert(self, "range", vec![i32_t, i32_t], slice_i32);
    }

    fn register_imports(&mut self, program: &Program) {
        for import in &program.imports {
            if let Some(alias) = &import.alias {
                if !self.aliases.register(alias, &import.path) {
                    self.error(
                        error_codes::DUPLICATE_MODULE_ALIAS,
                        format!("module alias `{}` is already bound", alias),
                        &import.span,
                    );
                }
            }
        }
    }

    /// Unused-import advisory: an aliased import whose alias never appears
    /// as an identifier in the unit.
    fn check_unused_imports(&mut self, program: &Program) {
        struct IdentCollector {
            used: HashSet<String>,
        }
        impl visit::Visitor for IdentCollector {
            fn enter_expr(&mut self, expr: &Expr) {
                if let ExprKind::Ident(name) = &expr.kind {
                    self.used.insert(name.clone());
                }
            }
        }

        let mut collector = IdentCollector {
            used: HashSet::new(),
        };
        visit::walk_program(&mut collector, program);

        for import in &program.imports {
            if let Some(alias) = &import.alias {
                if !collector.used.contains(alias) {
                    self.warning(
                        error_codes::UNUSED_IMPORT,
                        format!("unused import `{}` (as `{}`)", import.path, alias),
                        &import.span,
                    );
                }
            }
        }
    }

    // ==================== Type resolution ====================

    /// Resolve a parsed type expression to an interned descriptor. Errors
    /// are reported here; None means resolution failed.
    pub(crate) fn resolve_type(&mut self, ty: &TypeExpr) -> Option<TypeId> {
        match &ty.kind {
            TypeExprKind::Primitive(p) => Some(self.types.primitive(*p)),

            TypeExprKind::Named { name, type_args } => {
                self.resolve_named_type(name, type_args, &ty.span)
            }

            TypeExprKind::Pointer {
                is_mutable,
                pointee,
            } => {
                let pointee = self.resolve_type(pointee)?;
                Some(self.types.intern(TypeKind::Pointer {
                    pointee,
                    is_mutable: *is_mutable,
                }))
            }

            TypeExprKind::Slice(element) => {
                let element = self.resolve_type(element)?;
                Some(self.types.intern(TypeKind::Slice { element }))
            }

            TypeExprKind::Array { element, size } => {
                let element = self.resolve_type(element)?;
                let length = self.eval_const_length(size)?;
                Some(self.types.intern(TypeKind::Array { element, length }))
            }

            TypeExprKind::Tuple(elements) => {
                let mut resolved = Vec::with_capacity(elements.len());
                for element in elements {
                    resolved.push(self.resolve_type(element)?);
                }
                Some(self.types.tuple(resolved))
            }

            TypeExprKind::Option(value) => {
                let value = self.resolve_type(value)?;
                Some(self.types.intern(TypeKind::Option { value }))
            }

            TypeExprKind::Result { ok, err } => {
                let ok = self.resolve_type(ok)?;
                let err = self.resolve_type(err)?;
                Some(self.types.intern(TypeKind::Result { ok, err }))
            }

            TypeExprKind::TaskHandle(result) => {
                let result = self.resolve_type(result)?;
                Some(self.types.intern(TypeKind::TaskHandle { result }))
            }

            TypeExprKind::SelfType => match self.self_type {
                Some(id) => Some(id),
                None => {
                    self.error(
                        error_codes::INVALID_OPERATION,
                        "`Self` is only available inside impl blocks".to_string(),
                        &ty.span,
                    );
                    None
                }
            },
        }
    }

    fn resolve_named_type(
        &mut self,
        name: &str,
        type_args: &[TypeExpr],
        span: &ByteSpan,
    ) -> Option<TypeId> {
        // Inside an impl block, `Self` aliases the target struct
        if name == "Self" {
            match self.self_type {
                Some(id) if type_args.is_empty() => return Some(id),
                Some(_) => {
                    self.error(
                        error_codes::TYPE_MISMATCH,
                        "`Self` does not take type arguments".to_string(),
                        span,
                    );
                    return None;
                }
                None => {
                    self.error(
                        error_codes::INVALID_OPERATION,
                        "`Self` is only available inside impl blocks".to_string(),
                        span,
                    );
                    return None;
                }
            }
        }

        // Type parameters of the enclosing generic declaration
        if self.current_type_params.iter().any(|p| p == name) {
            if !type_args.is_empty() {
                self.error(
                    error_codes::TYPE_MISMATCH,
                    format!("type parameter `{}` does not take type arguments", name),
                    span,
                );
                return None;
            }
            return Some(self.types.intern(TypeKind::TypeParam {
                name: name.to_string(),
            }));
        }

        let symbol = match self.scopes.lookup(name) {
            Some(symbol) if symbol.kind == SymbolKind::Type => symbol.clone(),
            Some(_) => {
                self.error(
                    error_codes::UNDEFINED_SYMBOL,
                    format!("`{}` is not a type", name),
                    span,
                );
                return None;
            }
            None => {
                self.undefined_symbol(name, span);
                return None;
            }
        };

        if type_args.is_empty() {
            if symbol.is_generic {
                self.error(
                    error_codes::TYPE_MISMATCH,
                    format!(
                        "generic type `{}` requires {} type argument(s)",
                        name, symbol.type_param_count
                    ),
                    span,
                );
                return None;
            }
            return Some(symbol.ty);
        }

        if !symbol.is_generic {
            self.error(
                error_codes::TYPE_MISMATCH,
                format!("type `{}` does not take type arguments", name),
                span,
            );
            return None;
        }
        if type_args.len() != symbol.type_param_count {
            self.error(
                error_codes::TYPE_MISMATCH,
                format!(
                    "type `{}` expects {} type argument(s), found {}",
                    name,
                    symbol.type_param_count,
                    type_args.len()
                ),
                span,
            );
            return None;
        }

        let mut args = Vec::with_capacity(type_args.len());
        for arg in type_args {
            args.push(self.resolve_type(arg)?);
        }
        Some(self.types.intern(TypeKind::GenericInstance {
            base: symbol.ty,
            args,
        }))
    }

    /// Array lengths are compile-time integers.
    fn eval_const_length(&mut self, expr: &Expr) -> Option<usize> {
        match &expr.kind {
            ExprKind::IntLiteral(value) if *value >= 0 => Some(*value as usize),
            _ => {
                self.error(
                    error_codes::INVALID_OPERATION,
                    "array length must be a non-negative constant integer".to_string(),
                    &expr.span,
                );
                None
            }
        }
    }
}
