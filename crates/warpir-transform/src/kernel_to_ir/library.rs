use warpir_core::ast::{
    AstBinaryOp, AstStmt, AstStmtKind, Expr, ExprKind, FunctionDef, Ident, Param, Span,
};

/// Source-level helper functions that ship with the compiler. They are
/// looked up ahead of all other call resolution and inlined exactly like
/// user functions, so they may call each other and the builtin table.
///
/// Returns a fresh tree each call; the resolver assigns binding ids when the
/// definition is inlined.
pub fn library_function(name: &str) -> Option<FunctionDef> {
    match name {
        "lerp" => Some(lerp()),
        "clamp" => Some(clamp()),
        "smoothstep" => Some(smoothstep()),
        _ => None,
    }
}

/// `lerp(a, b, t) = a * (1 - t) + b * t`
fn lerp() -> FunctionDef {
    def(
        &["a", "b", "t"],
        vec![ret(bin(
            AstBinaryOp::Add,
            bin(
                AstBinaryOp::Mul,
                var("a"),
                bin(AstBinaryOp::Sub, int(1), var("t")),
            ),
            bin(AstBinaryOp::Mul, var("b"), var("t")),
        ))],
    )
}

/// `clamp(x, lo, hi) = max(lo, min(x, hi))`
fn clamp() -> FunctionDef {
    def(
        &["x", "lo", "hi"],
        vec![ret(call(
            "max",
            vec![var("lo"), call("min", vec![var("x"), var("hi")])],
        ))],
    )
}

/// Hermite step between two edges, matching the usual shading-language
/// definition.
fn smoothstep() -> FunctionDef {
    let t_init = call(
        "clamp",
        vec![
            bin(
                AstBinaryOp::Div,
                bin(AstBinaryOp::Sub, var("x"), var("edge0")),
                bin(AstBinaryOp::Sub, var("edge1"), var("edge0")),
            ),
            int(0),
            int(1),
        ],
    );
    def(
        &["edge0", "edge1", "x"],
        vec![
            decl("t", t_init),
            ret(bin(
                AstBinaryOp::Mul,
                bin(AstBinaryOp::Mul, var("t"), var("t")),
                bin(
                    AstBinaryOp::Sub,
                    int(3),
                    bin(AstBinaryOp::Mul, int(2), var("t")),
                ),
            )),
        ],
    )
}

fn def(params: &[&str], body: Vec<AstStmt>) -> FunctionDef {
    FunctionDef {
        params: params
            .iter()
            .map(|name| Param { ident: ident(name) })
            .collect(),
        body,
        span: Span::default(),
    }
}

fn ident(name: &str) -> Ident {
    Ident {
        name: name.to_string(),
        symbol: None,
        span: Span::default(),
    }
}

fn var(name: &str) -> Expr {
    Expr::new(ExprKind::Ident(ident(name)), Span::default())
}

fn int(value: i64) -> Expr {
    Expr::new(ExprKind::IntLiteral(value), Span::default())
}

fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::new(
        ExprKind::Call {
            callee: Box::new(var(name)),
            args,
        },
        Span::default(),
    )
}

fn bin(op: AstBinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        Span::default(),
    )
}

fn decl(name: &str, init: Expr) -> AstStmt {
    AstStmt::new(
        AstStmtKind::VarDecl {
            ident: ident(name),
            init,
        },
        Span::default(),
    )
}

fn ret(value: Expr) -> AstStmt {
    AstStmt::new(AstStmtKind::Return(Some(value)), Span::default())
}
