// Statement analysis. Each analyzer returns whether the statement
// definitely diverges (returns Never), which block analysis folds upward:
// a block returns Never iff some contained statement is a return, a
// Never-typed expression statement, a nested block that returns Never, or
// an if whose both branches return Never.

use asthra_ast::*;
use asthra_diagnostics::error_codes;

use super::Analyzer;
use crate::symbols::Symbol;
use crate::types::TypeKind;

impl<'a> Analyzer<'a> {
    /// Analyze a block in a fresh scope; true if the block definitely
    /// returns Never. Statements after the first diverging one get an
    /// unreachable-code advisory (once per block).
    pub(crate) fn analyze_block(&mut self, block: &Block) -> bool {
        self.scopes.enter_scope();

        let mut returns_never = false;
        let mut warned_unreachable = false;
        for stmt in &block.statements {
            if returns_never && !warned_unreachable {
                warned_unreachable = true;
                self.warning(
                    error_codes::UNREACHABLE_CODE,
                    "unreachable statement".to_string(),
                    &stmt.span,
                );
            }
            if self.analyze_statement(stmt) {
                returns_never = true;
            }
        }

        self.scopes.exit_scope();
        returns_never
    }

    pub(crate) fn analyze_statement(&mut self, stmt: &Stmt) -> bool {
        match &stmt.kind {
            StmtKind::Let {
                is_mutable,
                name,
                ty,
                ownership: _,
                value,
            } => {
                self.analyze_let(stmt, *is_mutable, name, ty, value.as_ref());
                false
            }

            StmtKind::Return(value) => {
                self.analyze_return(stmt, value);
                true
            }

            StmtKind::Expression(expr) => {
                let ty = self.analyze_expr(expr, None);
                ty.is_some_and(|id| self.types.is_never(id))
            }

            StmtKind::If(if_stmt) => self.analyze_if(if_stmt),

            StmtKind::IfLet {
                pattern,
                value,
                then_block,
                else_block,
            } => {
                let scrutinee = self.analyze_expr(value, None);

                // Pattern bindings live in a dedicated scope that also
                // encloses the then-block; the else-block sees only the
                // outer scope.
                self.scopes.enter_scope();
                if let Some(ty) = scrutinee {
                    self.validate_pattern(pattern, ty);
                }
                let then_never = self.analyze_block(then_block);
                self.scopes.exit_scope();

                let else_never = match else_block {
                    Some(block) => self.analyze_block(block),
                    None => return false,
                };
                then_never && else_never
            }

            StmtKind::For {
                variable,
                iterable,
                body,
            } => {
                self.analyze_for(stmt, variable, iterable, body);
                false
            }

            StmtKind::Match { scrutinee, arms } => {
                self.analyze_match(scrutinee, arms, None, None);
                false
            }

            StmtKind::Spawn { call } => {
                self.analyze_expr(call, None);
                false
            }

            StmtKind::SpawnWithHandle { handle, call } => {
                if let Some(result) = self.analyze_expr(call, None) {
                    let handle_ty = self.types.intern(TypeKind::TaskHandle { result });
                    if !self.scopes.insert(Symbol::variable(
                        handle,
                        handle_ty,
                        false,
                        stmt.span.clone(),
                    )) {
                        let span = self.span(&stmt.span);
                        self.diagnostics.duplicate_symbol(handle, span);
                    }
                }
                false
            }

            StmtKind::Unsafe(block) => {
                let saved = self.in_unsafe_context;
                self.in_unsafe_context = true;
                let never = self.analyze_block(block);
                self.in_unsafe_context = saved;
                never
            }

            StmtKind::Break | StmtKind::Continue => {
                if self.loop_depth == 0 {
                    let what = if matches!(stmt.kind, StmtKind::Break) {
                        "break"
                    } else {
                        "continue"
                    };
                    self.error(
                        error_codes::INVALID_OPERATION,
                        format!("`{}` outside of a loop", what),
                        &stmt.span,
                    );
                }
                false
            }

            StmtKind::Assign { target, value } => {
                self.analyze_assignment(target, value);
                false
            }

            StmtKind::Block(block) => self.analyze_block(block),
        }
    }

    fn analyze_let(
        &mut self,
        stmt: &Stmt,
        is_mutable: bool,
        name: &str,
        ty: &TypeExpr,
        value: Option<&Expr>,
    ) {
        let declared = self.resolve_type(ty);

        if let (Some(declared), Some(value)) = (declared, value) {
            if let Some(actual) = self.analyze_expr(value, Some(declared)) {
                if !self.types.compatible(declared, actual) {
                    self.type_mismatch(declared, actual, &value.span);
                }
            }
        } else if let Some(value) = value {
            self.analyze_expr(value, None);
        }

        let Some(declared) = declared else {
            return;
        };

        let mut symbol = Symbol::variable(name, declared, is_mutable, stmt.span.clone());
        symbol.is_initialized = value.is_some();
        if !self.scopes.insert(symbol) {
            let span = self.span(&stmt.span);
            self.diagnostics.duplicate_symbol(name, span);
        }
    }

    fn analyze_return(&mut self, stmt: &Stmt, value: &Expr) {
        let Some(&expected) = self.return_type_stack.last() else {
            self.error(
                error_codes::INVALID_RETURN,
                "`return` outside of a function body".to_string(),
                &stmt.span,
            );
            return;
        };

        // `return ();` is the accepted placeholder in a Never function,
        // unreachable as it is.
        if self.types.is_never(expected) && matches!(value.kind, ExprKind::Unit) {
            self.analyze_expr(value, None);
            return;
        }

        if let Some(actual) = self.analyze_expr(value, Some(expected)) {
            if !self.types.compatible(expected, actual) {
                let expected_name = self.types.display(expected);
                let actual_name = self.types.display(actual);
                self.error(
                    error_codes::INVALID_RETURN,
                    format!(
                        "return type mismatch: expected `{}`, found `{}`",
                        expected_name, actual_name
                    ),
                    &value.span,
                );
            }
        }
    }

    fn analyze_if(&mut self, if_stmt: &IfStmt) -> bool {
        if let Some(cond) = self.analyze_expr(&if_stmt.condition, None) {
            if !self.types.is_primitive(cond, PrimitiveType::Bool) && !self.types.is_never(cond) {
                let found = self.types.display(cond);
                self.error(
                    error_codes::TYPE_MISMATCH,
                    format!("if condition must be `bool`, found `{}`", found),
                    &if_stmt.condition.span,
                );
            }
        }

        let then_never = self.analyze_block(&if_stmt.then_block);
        let else_never = match &if_stmt.else_branch {
            Some(ElseBranch::Block(block)) => self.analyze_block(block),
            Some(ElseBranch::If(nested)) => self.analyze_if(nested),
            None => return false,
        };
        then_never && else_never
    }

    fn analyze_for(&mut self, stmt: &Stmt, variable: &str, iterable: &Expr, body: &Block) {
        let element = match self.analyze_expr(iterable, None) {
            Some(ty) => match self.types.kind(ty) {
                TypeKind::Slice { element } => Some(*element),
                _ => {
                    let found = self.types.display(ty);
                    self.error(
                        error_codes::TYPE_MISMATCH,
                        format!("for-in iterates over slices, found `{}`", found),
                        &iterable.span,
                    );
                    None
                }
            },
            None => None,
        };

        self.scopes.enter_scope();
        if let Some(element) = element {
            self.scopes
                .insert(Symbol::variable(variable, element, false, stmt.span.clone()));
        }

        self.loop_depth += 1;
        self.analyze_block(body);
        self.loop_depth -= 1;

        self.scopes.exit_scope();
    }

    fn analyze_assignment(&mut self, target: &Expr, value: &Expr) {
        // Mutability discipline applies to named targets; the first write
        // to an uninitialized let is its initialization.
        if let ExprKind::Ident(name) = &target.kind {
            if let Some(symbol) = self.scopes.lookup(name) {
                if !symbol.is_mutable && symbol.is_initialized {
                    self.error(
                        error_codes::IMMUTABLE_ASSIGN,
                        format!("cannot assign to immutable variable `{}`", name),
                        &target.span,
                    );
                }
            }
            if let Some(symbol) = self.scopes.lookup_mut(name) {
                symbol.is_initialized = true;
            }
        }

        let target_ty = self.analyze_expr(target, None);
        if let Some(expected) = target_ty {
            if let Some(actual) = self.analyze_expr(value, Some(expected)) {
                if !self.types.compatible(expected, actual) {
                    self.type_mismatch(expected, actual, &value.span);
                }
            }
        } else {
            self.analyze_expr(value, None);
        }
    }
}
