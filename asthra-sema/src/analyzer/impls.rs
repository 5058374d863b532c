// Impl block analysis: method-table construction on the struct's type
// descriptor, the literal-`self` receiver rule, and the `Self` alias for
// the duration of the block.

use asthra_ast::*;
use asthra_diagnostics::error_codes;

use super::Analyzer;
use crate::symbols::SymbolKind;
use crate::types::{MethodInfo, TypeId, TypeKind};

impl<'a> Analyzer<'a> {
    fn impl_target(&mut self, impl_block: &ImplBlock) -> Option<(TypeId, Vec<String>)> {
        let symbol = match self.scopes.lookup(&impl_block.struct_name) {
            Some(symbol) if symbol.kind == SymbolKind::Type => symbol.clone(),
            Some(_) => {
                self.error(
                    error_codes::INVALID_OPERATION,
                    format!("`{}` is not a type", impl_block.struct_name),
                    &impl_block.span,
                );
                return None;
            }
            None => {
                self.error(
                    error_codes::UNDEFINED_SYMBOL,
                    format!(
                        "cannot attach methods to undeclared struct `{}`",
                        impl_block.struct_name
                    ),
                    &impl_block.span,
                );
                return None;
            }
        };

        match self.types.kind(symbol.ty) {
            TypeKind::Struct(s) => Some((symbol.ty, s.type_params.clone())),
            _ => {
                self.error(
                    error_codes::INVALID_OPERATION,
                    format!("impl target `{}` must be a struct", impl_block.struct_name),
                    &impl_block.span,
                );
                None
            }
        }
    }

    /// Phase 2: build the struct's method table from the impl block's
    /// signatures. Instance methods are those whose first parameter is
    /// literally named `self`.
    pub(crate) fn register_impl_block(&mut self, impl_block: &ImplBlock) {
        let Some((struct_id, type_params)) = self.impl_target(impl_block) else {
            return;
        };

        let saved = std::mem::replace(&mut self.current_type_params, type_params);

        for method in &impl_block.methods {
            let is_instance = method.has_self_receiver();

            // `self` anywhere but first is rejected inside function_type;
            // it also catches `self` in free functions.
            let Some(ty) = self.function_type(method, true, Some(struct_id)) else {
                continue;
            };

            let added = self.types.add_method(
                struct_id,
                MethodInfo {
                    name: method.name.clone(),
                    ty,
                    visibility: method.visibility,
                    is_instance_method: is_instance,
                },
            );
            if !added {
                self.error(
                    error_codes::DUPLICATE_SYMBOL,
                    format!(
                        "method `{}` is already defined on `{}`",
                        method.name, impl_block.struct_name
                    ),
                    &method.span,
                );
            }
        }

        self.current_type_params = saved;
    }

    /// Phase 3: analyze method bodies with `self` bound to the struct.
    pub(crate) fn analyze_impl_bodies(&mut self, impl_block: &ImplBlock) {
        let Some((struct_id, type_params)) = self.impl_target(impl_block) else {
            return;
        };

        let saved = std::mem::replace(&mut self.current_type_params, type_params);
        for method in &impl_block.methods {
            self.analyze_function_body(method, Some(struct_id));
        }
        self.current_type_params = saved;
    }
}
