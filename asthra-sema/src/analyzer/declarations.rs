// Declaration registration: struct/enum descriptors first (so forward
// references resolve), then function signatures, then bodies.

use asthra_ast::*;
use asthra_diagnostics::error_codes;

use super::Analyzer;
use crate::symbols::{Symbol, SymbolKind};
use crate::types::{FunctionType, TypeId, TypeKind, VariantInfo};

impl<'a> Analyzer<'a> {
    /// Phase 1: create nominal descriptors and type symbols for every
    /// struct/enum, then resolve their members (two passes so a struct can
    /// mention a later one).
    pub(crate) fn register_type_declarations(&mut self, program: &Program) {
        for decl in &program.decls {
            match decl {
                Decl::Struct(s) => {
                    let id = self.types.declare_struct(&s.name, s.type_params.clone());
                    let symbol = Symbol::type_symbol(
                        &s.name,
                        id,
                        s.visibility,
                        s.type_params.len(),
                        s.span.clone(),
                    );
                    if !self.scopes.insert(symbol) {
                        let span = self.span(&s.span);
                        self.diagnostics.duplicate_symbol(&s.name, span);
                    }
                }
                Decl::Enum(e) => {
                    let id = self.types.declare_enum(&e.name, e.type_params.clone());
                    let symbol = Symbol::type_symbol(
                        &e.name,
                        id,
                        e.visibility,
                        e.type_params.len(),
                        e.span.clone(),
                    );
                    if !self.scopes.insert(symbol) {
                        let span = self.span(&e.span);
                        self.diagnostics.duplicate_symbol(&e.name, span);
                    }
                }
                _ => {}
            }
        }

        for decl in &program.decls {
            match decl {
                Decl::Struct(s) => self.fill_struct(s),
                Decl::Enum(e) => self.fill_enum(e),
                _ => {}
            }
        }
    }

    fn type_id_of(&self, name: &str) -> Option<TypeId> {
        self.scopes
            .lookup(name)
            .filter(|symbol| symbol.kind == SymbolKind::Type)
            .map(|symbol| symbol.ty)
    }

    fn fill_struct(&mut self, decl: &StructDecl) {
        let Some(id) = self.type_id_of(&decl.name) else {
            return;
        };

        let saved = std::mem::replace(&mut self.current_type_params, decl.type_params.clone());
        let mut fields = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for field in &decl.fields {
            if !seen.insert(field.name.clone()) {
                self.error(
                    error_codes::DUPLICATE_SYMBOL,
                    format!("duplicate field `{}` in struct `{}`", field.name, decl.name),
                    &field.span,
                );
                continue;
            }
            if let Some(ty) = self.resolve_type(&field.ty) {
                fields.push((field.name.clone(), ty));
            }
        }
        self.current_type_params = saved;

        self.types.set_struct_fields(id, fields);
    }

    fn fill_enum(&mut self, decl: &EnumDecl) {
        let Some(id) = self.type_id_of(&decl.name) else {
            return;
        };

        let saved = std::mem::replace(&mut self.current_type_params, decl.type_params.clone());
        let mut variants = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for variant in &decl.variants {
            if !seen.insert(variant.name.clone()) {
                self.error(
                    error_codes::DUPLICATE_SYMBOL,
                    format!(
                        "duplicate variant `{}` in enum `{}`",
                        variant.name, decl.name
                    ),
                    &variant.span,
                );
                continue;
            }

            let payload = match &variant.payload {
                None => None,
                Some(VariantPayload::Tuple(types)) => {
                    let mut resolved = Vec::new();
                    for ty in types {
                        if let Some(id) = self.resolve_type(ty) {
                            resolved.push(id);
                        }
                    }
                    match resolved.len() {
                        0 => None,
                        1 => Some(resolved[0]),
                        _ => Some(self.types.tuple(resolved)),
                    }
                }
                Some(VariantPayload::Struct(fields)) => {
                    // Struct-shaped payloads are carried as a tuple of the
                    // field types; patterns address them positionally.
                    let mut resolved = Vec::new();
                    for field in fields {
                        if let Some(id) = self.resolve_type(&field.ty) {
                            resolved.push(id);
                        }
                    }
                    if resolved.is_empty() {
                        None
                    } else {
                        Some(self.types.tuple(resolved))
                    }
                }
            };

            variants.push(VariantInfo {
                name: variant.name.clone(),
                payload,
            });
        }
        self.current_type_params = saved;

        self.types.set_enum_variants(id, variants);
    }

    /// Phase 2: a top-level function's signature becomes a Function symbol.
    pub(crate) fn register_function(&mut self, function: &Function) {
        let Some(ty) = self.function_type(function, false, None) else {
            return;
        };
        let symbol = Symbol::function(&function.name, ty, function.visibility, function.span.clone());
        if !self.scopes.insert(symbol) {
            let span = self.span(&function.span);
            self.diagnostics.duplicate_symbol(&function.name, span);
        }
    }

    pub(crate) fn register_extern_block(&mut self, block: &ExternBlock) {
        for function in &block.functions {
            let mut params = Vec::new();
            let mut ok = true;
            for param in &function.params {
                match self.resolve_type(&param.ty) {
                    Some(ty) => params.push(ty),
                    None => ok = false,
                }
            }
            let Some(return_type) = self.resolve_type(&function.return_type) else {
                continue;
            };
            if !ok {
                continue;
            }

            let ty = self.types.intern(TypeKind::Function(FunctionType {
                params,
                return_type,
                is_extern: true,
                extern_abi: Some(block.abi.clone()),
            }));
            let symbol =
                Symbol::function(&function.name, ty, Visibility::Public, function.span.clone());
            if !self.scopes.insert(symbol) {
                let span = self.span(&function.span);
                self.diagnostics.duplicate_symbol(&function.name, span);
            }
        }
    }

    /// Build a function descriptor from a declaration. For methods,
    /// `self_type` substitutes the receiver and `Self` mentions.
    pub(crate) fn function_type(
        &mut self,
        function: &Function,
        is_method: bool,
        self_type: Option<TypeId>,
    ) -> Option<TypeId> {
        let saved_self = self.self_type;
        if self_type.is_some() {
            self.self_type = self_type;
        }

        let mut params = Vec::new();
        let mut ok = true;
        for (index, param) in function.params.iter().enumerate() {
            if param.name == "self" {
                if !is_method || index != 0 {
                    self.error(
                        error_codes::INVALID_OPERATION,
                        "`self` is only valid as the first parameter of an impl method"
                            .to_string(),
                        &param.span,
                    );
                    ok = false;
                }
                continue;
            }
            match self.resolve_type(&param.ty) {
                Some(ty) => params.push(ty),
                None => ok = false,
            }
        }

        let return_type = self.resolve_type(&function.return_type);
        self.self_type = saved_self;

        let return_type = return_type?;
        if !ok {
            return None;
        }

        Some(self.types.intern(TypeKind::Function(FunctionType {
            params,
            return_type,
            is_extern: false,
            extern_abi: None,
        })))
    }

    /// Phase 3: body analysis. `self_type` is set for impl methods.
    pub(crate) fn analyze_function_body(&mut self, function: &Function, self_type: Option<TypeId>) {
        let saved_self = self.self_type;
        if self_type.is_some() {
            self.self_type = self_type;
        }

        let return_type = self
            .resolve_type(&function.return_type)
            .unwrap_or_else(|| self.types.primitive(PrimitiveType::Void));
        self.return_type_stack.push(return_type);

        self.scopes.enter_scope();
        for param in &function.params {
            if param.name == "self" {
                if let Some(receiver) = self.self_type {
                    self.scopes
                        .insert(Symbol::variable("self", receiver, false, param.span.clone()));
                }
                continue;
            }
            if let Some(ty) = self.resolve_type(&param.ty) {
                if !self
                    .scopes
                    .insert(Symbol::variable(&param.name, ty, false, param.span.clone()))
                {
                    let span = self.span(&param.span);
                    self.diagnostics.duplicate_symbol(&param.name, span);
                }
            }
        }

        // The body block manages its own scope for locals
        self.analyze_block(&function.body);

        self.scopes.exit_scope();
        self.return_type_stack.pop();
        self.self_type = saved_self;
    }
}
