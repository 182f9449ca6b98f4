use std::collections::HashMap;

use warpir_core::ast::{AstStmt, AstStmtKind, Expr, ExprKind, FunctionDef, Ident, SymbolId};

/// Assigns the lexical binding identities the host parser left out.
///
/// The embedding host normally hands over a tree with `SymbolId`s already
/// resolved. Trees built by hand or deserialized from a bundle may leave
/// them unset; this walk fills them in following ordinary lexical scoping,
/// keeping every id the host did assign. Identifiers that bind to nothing
/// stay unresolved and are later looked up by name in the host kernel scope.
///
/// One resolver instance serves a whole compilation, so ids handed out for
/// separately parsed function bodies never collide.
pub struct Resolver {
    next_id: u32,
}

impl Resolver {
    pub fn new() -> Self {
        Self { next_id: 0 }
    }

    pub fn resolve_function(&mut self, def: &mut FunctionDef) {
        // Fresh ids must stay clear of anything the host assigned.
        scan_assigned_ids(def, &mut self.next_id);
        let mut scopes = Vec::new();
        self.function(def, &mut scopes);
    }

    fn fresh_id(&mut self) -> SymbolId {
        let id = SymbolId(self.next_id);
        self.next_id += 1;
        id
    }

    fn declare(&mut self, ident: &mut Ident, scopes: &mut Vec<HashMap<String, SymbolId>>) {
        let id = match ident.symbol {
            Some(id) => id,
            None => {
                let id = self.fresh_id();
                ident.symbol = Some(id);
                id
            }
        };
        if let Some(scope) = scopes.last_mut() {
            scope.insert(ident.name.clone(), id);
        }
    }

    fn resolve(&self, ident: &mut Ident, scopes: &[HashMap<String, SymbolId>]) {
        if ident.symbol.is_some() {
            return;
        }
        for scope in scopes.iter().rev() {
            if let Some(id) = scope.get(&ident.name) {
                ident.symbol = Some(*id);
                return;
            }
        }
    }

    fn function(&mut self, def: &mut FunctionDef, scopes: &mut Vec<HashMap<String, SymbolId>>) {
        scopes.push(HashMap::new());
        for param in &mut def.params {
            self.declare(&mut param.ident, scopes);
        }
        for stmt in &mut def.body {
            self.stmt(stmt, scopes);
        }
        scopes.pop();
    }

    fn stmt(&mut self, stmt: &mut AstStmt, scopes: &mut Vec<HashMap<String, SymbolId>>) {
        match &mut stmt.kind {
            AstStmtKind::VarDecl { ident, init } => {
                // The initializer sees the outer binding of a shadowed name.
                self.expr(init, scopes);
                self.declare(ident, scopes);
            }
            AstStmtKind::Assign { target, value, .. } => {
                self.expr(target, scopes);
                self.expr(value, scopes);
            }
            AstStmtKind::ExprStmt(expr) => self.expr(expr, scopes),
            AstStmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.expr(cond, scopes);
                self.block(then_branch, scopes);
                if let Some(else_branch) = else_branch {
                    self.block(else_branch, scopes);
                }
            }
            AstStmtKind::While { cond, body } => {
                self.expr(cond, scopes);
                self.block(body, scopes);
            }
            AstStmtKind::ForOf {
                loop_var,
                iterable,
                body,
            } => {
                self.expr(iterable, scopes);
                scopes.push(HashMap::new());
                self.declare(loop_var, scopes);
                for stmt in body {
                    self.stmt(stmt, scopes);
                }
                scopes.pop();
            }
            AstStmtKind::Return(value) => {
                if let Some(value) = value {
                    self.expr(value, scopes);
                }
            }
            AstStmtKind::Break | AstStmtKind::Continue => {}
            AstStmtKind::Block(stmts) => self.block(stmts, scopes),
        }
    }

    fn block(&mut self, stmts: &mut [AstStmt], scopes: &mut Vec<HashMap<String, SymbolId>>) {
        scopes.push(HashMap::new());
        for stmt in stmts {
            self.stmt(stmt, scopes);
        }
        scopes.pop();
    }

    fn expr(&mut self, expr: &mut Expr, scopes: &mut Vec<HashMap<String, SymbolId>>) {
        match &mut expr.kind {
            ExprKind::IntLiteral(_) | ExprKind::FloatLiteral(_) | ExprKind::BoolLiteral(_) => {}
            ExprKind::Ident(ident) => self.resolve(ident, scopes),
            ExprKind::Binary { left, right, .. } => {
                self.expr(left, scopes);
                self.expr(right, scopes);
            }
            ExprKind::Unary { operand, .. } => self.expr(operand, scopes),
            ExprKind::Call { callee, args } => {
                self.expr(callee, scopes);
                for arg in args {
                    self.expr(arg, scopes);
                }
            }
            ExprKind::Member { object, .. } => self.expr(object, scopes),
            ExprKind::Index { object, indices } => {
                self.expr(object, scopes);
                for index in indices {
                    self.expr(index, scopes);
                }
            }
            ExprKind::ArrayLiteral(elements) => {
                for element in elements {
                    self.expr(element, scopes);
                }
            }
            ExprKind::ObjectLiteral(fields) => {
                for (_, value) in fields {
                    self.expr(value, scopes);
                }
            }
            ExprKind::Arrow(def) => self.function(def, scopes),
        }
    }
}

fn scan_assigned_ids(def: &FunctionDef, next_id: &mut u32) {
    fn scan_ident(ident: &Ident, next_id: &mut u32) {
        if let Some(SymbolId(id)) = ident.symbol {
            *next_id = (*next_id).max(id + 1);
        }
    }

    fn scan_expr(expr: &Expr, next_id: &mut u32) {
        match &expr.kind {
            ExprKind::IntLiteral(_) | ExprKind::FloatLiteral(_) | ExprKind::BoolLiteral(_) => {}
            ExprKind::Ident(ident) => scan_ident(ident, next_id),
            ExprKind::Binary { left, right, .. } => {
                scan_expr(left, next_id);
                scan_expr(right, next_id);
            }
            ExprKind::Unary { operand, .. } => scan_expr(operand, next_id),
            ExprKind::Call { callee, args } => {
                scan_expr(callee, next_id);
                for arg in args {
                    scan_expr(arg, next_id);
                }
            }
            ExprKind::Member { object, .. } => scan_expr(object, next_id),
            ExprKind::Index { object, indices } => {
                scan_expr(object, next_id);
                for index in indices {
                    scan_expr(index, next_id);
                }
            }
            ExprKind::ArrayLiteral(elements) => {
                for element in elements {
                    scan_expr(element, next_id);
                }
            }
            ExprKind::ObjectLiteral(fields) => {
                for (_, value) in fields {
                    scan_expr(value, next_id);
                }
            }
            ExprKind::Arrow(def) => scan_def(def, next_id),
        }
    }

    fn scan_stmt(stmt: &AstStmt, next_id: &mut u32) {
        match &stmt.kind {
            AstStmtKind::VarDecl { ident, init } => {
                scan_ident(ident, next_id);
                scan_expr(init, next_id);
            }
            AstStmtKind::Assign { target, value, .. } => {
                scan_expr(target, next_id);
                scan_expr(value, next_id);
            }
            AstStmtKind::ExprStmt(expr) => scan_expr(expr, next_id),
            AstStmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                scan_expr(cond, next_id);
                for stmt in then_branch {
                    scan_stmt(stmt, next_id);
                }
                if let Some(else_branch) = else_branch {
                    for stmt in else_branch {
                        scan_stmt(stmt, next_id);
                    }
                }
            }
            AstStmtKind::While { cond, body } => {
                scan_expr(cond, next_id);
                for stmt in body {
                    scan_stmt(stmt, next_id);
                }
            }
            AstStmtKind::ForOf {
                loop_var,
                iterable,
                body,
            } => {
                scan_ident(loop_var, next_id);
                scan_expr(iterable, next_id);
                for stmt in body {
                    scan_stmt(stmt, next_id);
                }
            }
            AstStmtKind::Return(value) => {
                if let Some(value) = value {
                    scan_expr(value, next_id);
                }
            }
            AstStmtKind::Break | AstStmtKind::Continue => {}
            AstStmtKind::Block(stmts) => {
                for stmt in stmts {
                    scan_stmt(stmt, next_id);
                }
            }
        }
    }

    fn scan_def(def: &FunctionDef, next_id: &mut u32) {
        for param in &def.params {
            scan_ident(&param.ident, next_id);
        }
        for stmt in &def.body {
            scan_stmt(stmt, next_id);
        }
    }

    scan_def(def, next_id);
}
