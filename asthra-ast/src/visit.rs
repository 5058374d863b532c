//! Tree traversal without re-matching the variant matrix in every client.
//!
//! `Visitor` hooks fire pre-order (`enter_*`) and post-order (`exit_*`);
//! `Expr::children` / `Stmt::child_exprs` expose the child queries the
//! walkers are built on.

use crate::*;

pub trait Visitor {
    fn enter_expr(&mut self, _expr: &Expr) {}
    fn exit_expr(&mut self, _expr: &Expr) {}
    fn enter_stmt(&mut self, _stmt: &Stmt) {}
    fn exit_stmt(&mut self, _stmt: &Stmt) {}
}

impl Expr {
    /// Direct child expressions, in source order.
    pub fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::IntLiteral(_)
            | ExprKind::FloatLiteral(_)
            | ExprKind::StringLiteral(_)
            | ExprKind::CharLiteral(_)
            | ExprKind::BoolLiteral(_)
            | ExprKind::Unit
            | ExprKind::Ident(_)
            | ExprKind::SizeOf(_) => Vec::new(),
            ExprKind::Tuple(items) | ExprKind::Array(items) => items.iter().collect(),
            ExprKind::Binary { left, right, .. } => vec![left, right],
            ExprKind::Unary { operand, .. } => vec![operand],
            ExprKind::FieldAccess { object, .. } => vec![object],
            ExprKind::Index { object, index } => vec![object, index],
            ExprKind::Slice { object, start, end } => {
                let mut children: Vec<&Expr> = vec![object];
                children.extend(start.as_deref());
                children.extend(end.as_deref());
                children
            }
            ExprKind::Call { callee, args } => {
                let mut children: Vec<&Expr> = vec![callee];
                children.extend(args.iter());
                children
            }
            ExprKind::AssociatedCall { args, .. } => args.iter().collect(),
            ExprKind::EnumConstructor { payload, .. } => {
                payload.as_deref().into_iter().collect()
            }
            ExprKind::StructLiteral { fields, .. } => {
                fields.iter().map(|(_, value)| value).collect()
            }
            ExprKind::Await(handle) => vec![handle],
            ExprKind::Match { scrutinee, arms } => {
                let mut children: Vec<&Expr> = vec![scrutinee];
                for arm in arms {
                    if let ArmBody::Expr(body) = &arm.body {
                        children.push(body);
                    }
                }
                children
            }
        }
    }

    pub fn child_count(&self) -> usize {
        self.children().len()
    }

    pub fn child_at(&self, index: usize) -> Option<&Expr> {
        self.children().into_iter().nth(index)
    }
}

impl Stmt {
    /// Expressions held directly by this statement (not those nested in
    /// sub-blocks; the statement walker recurses into blocks itself).
    pub fn child_exprs(&self) -> Vec<&Expr> {
        match &self.kind {
            StmtKind::Let { value, .. } => value.iter().collect(),
            StmtKind::Return(expr) | StmtKind::Expression(expr) => vec![expr],
            StmtKind::If(if_stmt) => vec![&if_stmt.condition],
            StmtKind::IfLet { value, .. } => vec![value],
            StmtKind::For { iterable, .. } => vec![iterable],
            StmtKind::Match { scrutinee, .. } => vec![scrutinee],
            StmtKind::Spawn { call } | StmtKind::SpawnWithHandle { call, .. } => vec![call],
            StmtKind::Assign { target, value } => vec![target, value],
            StmtKind::Unsafe(_) | StmtKind::Block(_) | StmtKind::Break | StmtKind::Continue => {
                Vec::new()
            }
        }
    }
}

pub fn walk_expr<V: Visitor>(visitor: &mut V, expr: &Expr) {
    visitor.enter_expr(expr);
    for child in expr.children() {
        walk_expr(visitor, child);
    }
    visitor.exit_expr(expr);
}

pub fn walk_stmt<V: Visitor>(visitor: &mut V, stmt: &Stmt) {
    visitor.enter_stmt(stmt);
    for expr in stmt.child_exprs() {
        walk_expr(visitor, expr);
    }
    match &stmt.kind {
        StmtKind::If(if_stmt) => walk_if(visitor, if_stmt),
        StmtKind::IfLet {
            then_block,
            else_block,
            ..
        } => {
            walk_block(visitor, then_block);
            if let Some(block) = else_block {
                walk_block(visitor, block);
            }
        }
        StmtKind::For { body, .. } => walk_block(visitor, body),
        StmtKind::Match { arms, .. } => {
            for arm in arms {
                match &arm.body {
                    ArmBody::Expr(expr) => walk_expr(visitor, expr),
                    ArmBody::Block(block) => walk_block(visitor, block),
                }
            }
        }
        StmtKind::Unsafe(block) | StmtKind::Block(block) => walk_block(visitor, block),
        _ => {}
    }
    visitor.exit_stmt(stmt);
}

fn walk_if<V: Visitor>(visitor: &mut V, if_stmt: &IfStmt) {
    walk_block(visitor, &if_stmt.then_block);
    match &if_stmt.else_branch {
        Some(ElseBranch::Block(block)) => walk_block(visitor, block),
        Some(ElseBranch::If(nested)) => {
            walk_expr(visitor, &nested.condition);
            walk_if(visitor, nested);
        }
        None => {}
    }
}

pub fn walk_block<V: Visitor>(visitor: &mut V, block: &Block) {
    for stmt in &block.statements {
        walk_stmt(visitor, stmt);
    }
}

pub fn walk_program<V: Visitor>(visitor: &mut V, program: &Program) {
    for decl in &program.decls {
        match decl {
            Decl::Function(function) => walk_block(visitor, &function.body),
            Decl::Impl(impl_block) => {
                for method in &impl_block.methods {
                    walk_block(visitor, &method.body);
                }
            }
            Decl::Struct(_) | Decl::Enum(_) | Decl::Extern(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        entered: usize,
        exited: usize,
        pre_order: Vec<String>,
        post_order: Vec<String>,
    }

    impl Visitor for Counter {
        fn enter_expr(&mut self, expr: &Expr) {
            self.entered += 1;
            if let ExprKind::Ident(name) = &expr.kind {
                self.pre_order.push(name.clone());
            }
        }
        fn exit_expr(&mut self, expr: &Expr) {
            self.exited += 1;
            if let ExprKind::Ident(name) = &expr.kind {
                self.post_order.push(name.clone());
            }
        }
    }

    fn ident(name: &str) -> Expr {
        Expr {
            id: NodeId(0),
            span: 0..0,
            kind: ExprKind::Ident(name.to_string()),
        }
    }

    #[test]
    fn test_walk_orders() {
        // a + (b * c): pre-order sees a, b, c; post-order likewise but
        // parents fire after children.
        let tree = Expr {
            id: NodeId(0),
            span: 0..0,
            kind: ExprKind::Binary {
                op: BinaryOp::Add,
                left: Box::new(ident("a")),
                right: Box::new(Expr {
                    id: NodeId(0),
                    span: 0..0,
                    kind: ExprKind::Binary {
                        op: BinaryOp::Mul,
                        left: Box::new(ident("b")),
                        right: Box::new(ident("c")),
                    },
                }),
            },
        };

        let mut counter = Counter {
            entered: 0,
            exited: 0,
            pre_order: vec![],
            post_order: vec![],
        };
        walk_expr(&mut counter, &tree);

        assert_eq!(counter.entered, 5);
        assert_eq!(counter.exited, 5);
        assert_eq!(counter.pre_order, vec!["a", "b", "c"]);
        assert_eq!(counter.post_order, vec!["a", "b", "c"]);
        assert_eq!(tree.child_count(), 2);
        assert!(tree.child_at(2).is_none());
    }
}
