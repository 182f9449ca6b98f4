/*! Closed syntax tree consumed by the frontend.
 *
 * Parsing the host scripting grammar happens outside this workspace; the
 * parser hands over this tree with lexical binding already resolved. Every
 * node carries a span into the kernel source text so diagnostics can quote
 * the offending code.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Byte range into the kernel source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The source text under this span, clamped to the source bounds.
    pub fn snippet<'a>(&self, source: &'a str) -> &'a str {
        let start = self.start.min(source.len());
        let end = self.end.min(source.len()).max(start);
        &source[start..end]
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Resolved lexical identity of a binding, assigned by the external parser.
/// Two identifiers share a `SymbolId` exactly when they refer to the same
/// binding, which is what distinguishes shadowed names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

/// An identifier occurrence. `symbol` is None for free identifiers, which
/// the frontend resolves against the host kernel scope by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    pub symbol: Option<SymbolId>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AstBinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    LogicalAnd,
    LogicalOr,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    /// Sign-propagating right shift (`>>`).
    Sar,
    /// Zero-filling right shift (`>>>`).
    Shr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AstUnaryOp {
    Neg,
    LogicalNot,
    BitNot,
}

/// Compound-assignment operator, or plain assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    IntLiteral(i64),
    FloatLiteral(f64),
    BoolLiteral(bool),
    Ident(Ident),
    Binary {
        op: AstBinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: AstUnaryOp,
        operand: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Member {
        object: Box<Expr>,
        member: String,
    },
    Index {
        object: Box<Expr>,
        indices: Vec<Expr>,
    },
    ArrayLiteral(Vec<Expr>),
    ObjectLiteral(Vec<(String, Expr)>),
    Arrow(Box<FunctionDef>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstStmt {
    pub kind: AstStmtKind,
    pub span: Span,
}

impl AstStmt {
    pub fn new(kind: AstStmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AstStmtKind {
    VarDecl {
        ident: Ident,
        init: Expr,
    },
    Assign {
        target: Expr,
        op: AssignOp,
        value: Expr,
    },
    ExprStmt(Expr),
    If {
        cond: Expr,
        then_branch: Vec<AstStmt>,
        else_branch: Option<Vec<AstStmt>>,
    },
    While {
        cond: Expr,
        body: Vec<AstStmt>,
    },
    /// `for (v of iterable)`; the iterable is a range/grid/static expression
    /// or a rendering-stage header, decoded by the frontend.
    ForOf {
        loop_var: Ident,
        iterable: Expr,
        body: Vec<AstStmt>,
    },
    Return(Option<Expr>),
    Break,
    Continue,
    Block(Vec<AstStmt>),
}

/// A function or arrow-function body: the kernel itself, or a helper
/// function value inlined into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub params: Vec<Param>,
    pub body: Vec<AstStmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub ident: Ident,
}
