use indexmap::IndexMap;

use warpir_core::ast::{AssignOp, AstStmt, AstStmtKind, Expr, ExprKind, Ident, Span, SymbolId};
use warpir_core::block::Block;
use warpir_core::instructions::{AtomicOp, BinaryOp, StmtId, UnaryOp};
use warpir_core::resources::Field;
use warpir_core::types::{PrimitiveType, StructType, Type};
use warpir_core::values::{ConstVal, Value};

use super::builtins;
use super::context::{LoopKind, LowerContext, Lowered, PipelineBuild, RenderState};
use super::errors::{CompileError, Result};
use super::expression;
use super::intrinsics;
use super::scope::HostValue;
use crate::kernel::RenderPipelineParams;

pub fn lower_stmts(ctx: &mut LowerContext, stmts: &[AstStmt]) -> Result<()> {
    for stmt in stmts {
        lower_stmt(ctx, stmt)?;
    }
    Ok(())
}

pub fn lower_stmt(ctx: &mut LowerContext, stmt: &AstStmt) -> Result<()> {
    tracing::trace!(span = ?stmt.span, "lowering statement");
    if ctx.frame().returned.is_some() {
        return Err(ctx.error_at(
            stmt.span,
            "`return` must be the final statement of the function",
        ));
    }
    if ctx.render.state == RenderState::FinishedVertex && !is_fragment_for(stmt) {
        return Err(ctx.error_at(
            stmt.span,
            "a fragment-for loop must immediately follow its vertex-for loop",
        ));
    }
    match &stmt.kind {
        AstStmtKind::VarDecl { ident, init } => var_decl(ctx, ident, init),
        AstStmtKind::Assign { target, op, value } => assign(ctx, target, *op, value, stmt.span),
        AstStmtKind::ExprStmt(expr) => {
            expression::lower_expr(ctx, expr)?;
            Ok(())
        }
        AstStmtKind::If {
            cond,
            then_branch,
            else_branch,
        } => lower_if(ctx, cond, then_branch, else_branch.as_deref()),
        AstStmtKind::While { cond, body } => lower_while(ctx, cond, body),
        AstStmtKind::ForOf {
            loop_var,
            iterable,
            body,
        } => lower_for_of(ctx, loop_var, iterable, body, stmt.span),
        AstStmtKind::Return(value) => lower_return(ctx, value.as_ref(), stmt.span),
        AstStmtKind::Break => lower_break(ctx, stmt.span),
        AstStmtKind::Continue => lower_continue(ctx, stmt.span),
        AstStmtKind::Block(stmts) => lower_stmts(ctx, stmts),
    }
}

fn var_decl(ctx: &mut LowerContext, ident: &Ident, init: &Expr) -> Result<()> {
    let symbol = require_symbol(ident)?;
    let bound = match expression::lower_expr(ctx, init)? {
        Lowered::Value(value) => {
            let value = expression::read_value(ctx, &value)?;
            if value.ty == Type::Void {
                return Err(ctx.error_at(
                    init.span,
                    "this expression has no value and cannot initialize a variable",
                ));
            }
            Lowered::Value(expression::create_local_var_copy(ctx, &value)?)
        }
        other => other,
    };
    ctx.bind(symbol, bound);
    Ok(())
}

fn assign(
    ctx: &mut LowerContext,
    target: &Expr,
    op: AssignOp,
    value: &Expr,
    span: Span,
) -> Result<()> {
    let dest = match expression::lower_expr(ctx, target)? {
        Lowered::Value(value) if value.is_pointer() => value,
        _ => {
            return Err(ctx.error_at(
                target.span,
                "the left side of an assignment must be an l-value",
            ))
        }
    };
    intrinsics::check_vertex_stage_write(ctx, span, &dest)?;
    let value = expression::lower_read(ctx, value)?;
    match op {
        AssignOp::Assign => builtins::store(ctx.builder, &dest, &value),
        AssignOp::Add => compound_atomic(ctx, AtomicOp::Add, &dest, &value),
        AssignOp::Sub => compound_atomic(ctx, AtomicOp::Sub, &dest, &value),
        AssignOp::BitAnd => compound_atomic(ctx, AtomicOp::BitAnd, &dest, &value),
        AssignOp::BitOr => compound_atomic(ctx, AtomicOp::BitOr, &dest, &value),
        AssignOp::BitXor => compound_atomic(ctx, AtomicOp::BitXor, &dest, &value),
        AssignOp::Mul => compound_serial(ctx, BinaryOp::Mul, &dest, &value),
        AssignOp::Div => compound_serial(ctx, BinaryOp::TrueDiv, &dest, &value),
        AssignOp::Mod => compound_serial(ctx, BinaryOp::Mod, &dest, &value),
    }
}

/// `+=` and friends lower to atomic read-modify-writes so concurrent kernel
/// invocations accumulate correctly; DemoteAtomics strips the atomicity back
/// off destinations that are private to one invocation.
fn compound_atomic(
    ctx: &mut LowerContext,
    op: AtomicOp,
    dest: &Value,
    value: &Value,
) -> Result<()> {
    builtins::apply_atomic(ctx.builder, op, dest, value)?;
    Ok(())
}

/// `*=`, `/=`, and `%=` have no atomic counterpart and lower to a plain
/// load-compute-store.
fn compound_serial(
    ctx: &mut LowerContext,
    op: BinaryOp,
    dest: &Value,
    value: &Value,
) -> Result<()> {
    let current = expression::read_value(ctx, dest)?;
    let result = builtins::apply_binary(ctx.builder, op, &current, value)?;
    builtins::store(ctx.builder, dest, &result)
}

fn lower_if(
    ctx: &mut LowerContext,
    cond: &Expr,
    then_branch: &[AstStmt],
    else_branch: Option<&[AstStmt]>,
) -> Result<()> {
    if let Some(inner) = static_call_arg(cond) {
        let value = expression::lower_read(ctx, inner)?;
        let Some(constant) = value.scalar_const_val() else {
            return Err(ctx.error_at(
                cond.span,
                "static if conditions must be scalar compile-time constants",
            ));
        };
        // Only the taken branch is lowered; the other never reaches the IR.
        return if constant.is_truthy() {
            lower_stmts(ctx, then_branch)
        } else {
            match else_branch {
                Some(stmts) => lower_stmts(ctx, stmts),
                None => Ok(()),
            }
        };
    }
    let value = expression::lower_read(ctx, cond)?;
    if !value.ty.is_scalar() {
        return Err(ctx.error_at(
            cond.span,
            format!("if conditions must be scalars, got {}", value.ty),
        ));
    }
    let cond_stmt = ctx.builder.convert(value.stmts[0], PrimitiveType::I32)?;
    ctx.frame_mut().branch_depth += 1;
    ctx.builder.push_guard();
    let then_outcome = lower_stmts(ctx, then_branch);
    let true_block = ctx.builder.pop_guard()?;
    then_outcome?;
    ctx.builder.push_guard();
    let else_outcome = match else_branch {
        Some(stmts) => lower_stmts(ctx, stmts),
        None => Ok(()),
    };
    let false_block = ctx.builder.pop_guard()?;
    ctx.frame_mut().branch_depth -= 1;
    else_outcome?;
    ctx.builder.if_stmt(cond_stmt, true_block, false_block);
    Ok(())
}

/// `while (c) body` lowers to an unconditional loop whose body re-evaluates
/// the condition and breaks when it fails.
fn lower_while(ctx: &mut LowerContext, cond: &Expr, body: &[AstStmt]) -> Result<()> {
    ctx.frame_mut().loop_stack.push(LoopKind::While);
    ctx.builder.push_guard();
    let outcome = while_body(ctx, cond, body);
    let block = ctx.builder.pop_guard();
    ctx.frame_mut().loop_stack.pop();
    outcome?;
    ctx.builder.while_stmt(block?);
    Ok(())
}

fn while_body(ctx: &mut LowerContext, cond: &Expr, body: &[AstStmt]) -> Result<()> {
    let value = expression::lower_read(ctx, cond)?;
    if !value.ty.is_scalar() {
        return Err(ctx.error_at(
            cond.span,
            format!("while conditions must be scalars, got {}", value.ty),
        ));
    }
    let cond_stmt = ctx.builder.convert(value.stmts[0], PrimitiveType::I32)?;
    let exit = ctx.builder.unary(UnaryOp::LogicNot, cond_stmt)?;
    ctx.builder.push_guard();
    ctx.builder.while_control();
    let break_block = ctx.builder.pop_guard()?;
    ctx.builder.if_stmt(exit, break_block, Block::new());
    lower_stmts(ctx, body)
}

fn lower_for_of(
    ctx: &mut LowerContext,
    loop_var: &Ident,
    iterable: &Expr,
    body: &[AstStmt],
    span: Span,
) -> Result<()> {
    match iterable_call(iterable) {
        Some(("range", args)) => range_loop(ctx, loop_var, args, body, span, false),
        Some(("ndrange", args)) => ndrange_loop(ctx, loop_var, args, body, span, false),
        Some(("static", args)) => {
            let [inner] = args else {
                return Err(ctx.error_at(span, "static() expects exactly one argument"));
            };
            match iterable_call(inner) {
                Some(("range", args)) => range_loop(ctx, loop_var, args, body, span, true),
                Some(("ndrange", args)) => ndrange_loop(ctx, loop_var, args, body, span, true),
                _ => Err(ctx.error_at(
                    span,
                    "static for-of loops iterate over range() or ndrange()",
                )),
            }
        }
        Some(("input_vertices", args)) => vertex_loop(ctx, loop_var, args, body, span),
        Some(("input_fragments", args)) => fragment_loop(ctx, loop_var, args, body, span),
        _ => Err(ctx.error_at(
            span,
            "for-of loops iterate over range(), ndrange(), static(), input_vertices(), or \
             input_fragments()",
        )),
    }
}

fn range_loop(
    ctx: &mut LowerContext,
    loop_var: &Ident,
    args: &[Expr],
    body: &[AstStmt],
    span: Span,
    is_static: bool,
) -> Result<()> {
    let [length] = args else {
        return Err(ctx.error_at(span, "range() expects exactly one argument"));
    };
    let symbol = require_symbol(loop_var)?;
    let length_value = expression::lower_read(ctx, length)?;
    if !matches!(length_value.ty, Type::Scalar(PrimitiveType::I32)) {
        return Err(ctx.error_at(
            length.span,
            format!("range() expects an i32 length, got {}", length_value.ty),
        ));
    }
    if is_static {
        let Some(count) = length_value.const_i32() else {
            return Err(ctx.error_at(
                length.span,
                "static loop bounds must be i32 compile-time constants",
            ));
        };
        // Full unroll; the loop variable is a constant in each copy.
        for i in 0..count.max(0) {
            let stmt = ctx.builder.const_i32(i);
            ctx.bind(symbol, Lowered::Value(Value::scalar_const(stmt, ConstVal::I32(i))));
            lower_stmts(ctx, body)?;
        }
        return Ok(());
    }
    let length_stmt = materialize_i32(ctx, &length_value);
    let loop_id = ctx.builder.reserve_id();
    ctx.frame_mut().loop_stack.push(LoopKind::RangeFor);
    ctx.builder.push_guard();
    let index = ctx.builder.loop_index(loop_id);
    ctx.bind(symbol, Lowered::Value(Value::scalar(PrimitiveType::I32, index)));
    let outcome = lower_stmts(ctx, body);
    let block = ctx.builder.pop_guard();
    ctx.frame_mut().loop_stack.pop();
    outcome?;
    let strictly_serialized = ctx.strictly_serialized();
    ctx.builder
        .range_for(loop_id, length_stmt, strictly_serialized, block?);
    Ok(())
}

/// Re-emit a folded-constant i32 as a Const statement so offloading sees a
/// compile-time trip count.
fn materialize_i32(ctx: &mut LowerContext, value: &Value) -> StmtId {
    match value.const_i32() {
        Some(n) => ctx.builder.const_i32(n),
        None => value.stmts[0],
    }
}

/// A grid loop is one flat range loop over the dimension product; the loop
/// variable decomposes the flat index into one i32 vector component per
/// dimension, row-major with the last dimension fastest.
fn ndrange_loop(
    ctx: &mut LowerContext,
    loop_var: &Ident,
    args: &[Expr],
    body: &[AstStmt],
    span: Span,
    is_static: bool,
) -> Result<()> {
    if args.is_empty() {
        return Err(ctx.error_at(span, "ndrange() expects at least one dimension"));
    }
    let symbol = require_symbol(loop_var)?;
    let mut dims = Vec::with_capacity(args.len());
    for arg in args {
        let value = expression::lower_read(ctx, arg)?;
        if !matches!(value.ty, Type::Scalar(PrimitiveType::I32)) {
            return Err(ctx.error_at(
                arg.span,
                format!("ndrange() dimensions must be i32 scalars, got {}", value.ty),
            ));
        }
        dims.push(value);
    }
    if is_static {
        return static_ndrange_loop(ctx, symbol, &dims, body, span);
    }
    let mut total = dims[0].clone();
    for dim in &dims[1..] {
        total = builtins::apply_binary(ctx.builder, BinaryOp::Mul, &total, dim)?;
    }
    let total_stmt = materialize_i32(ctx, &total);
    let loop_id = ctx.builder.reserve_id();
    ctx.frame_mut().loop_stack.push(LoopKind::RangeFor);
    ctx.builder.push_guard();
    let flat = ctx.builder.loop_index(loop_id);
    // Constant dimensions are re-emitted inside the body so the decomposition
    // arithmetic stays within the offloaded module.
    let dim_stmts: Vec<StmtId> = dims
        .iter()
        .map(|dim| match dim.const_i32() {
            Some(n) => ctx.builder.const_i32(n),
            None => dim.stmts[0],
        })
        .collect();
    let mut components = vec![flat; dims.len()];
    let mut remaining = flat;
    for (i, dim) in dim_stmts.iter().enumerate().rev() {
        components[i] = ctx.builder.binary(BinaryOp::Mod, remaining, *dim)?;
        remaining = ctx.builder.binary(BinaryOp::FloorDiv, remaining, *dim)?;
    }
    let value = Value::new(
        Type::Vector(PrimitiveType::I32, dims.len() as u32),
        components,
        vec![],
    );
    ctx.bind(symbol, Lowered::Value(value));
    let outcome = lower_stmts(ctx, body);
    let block = ctx.builder.pop_guard();
    ctx.frame_mut().loop_stack.pop();
    outcome?;
    let strictly_serialized = ctx.strictly_serialized();
    ctx.builder
        .range_for(loop_id, total_stmt, strictly_serialized, block?);
    Ok(())
}

fn static_ndrange_loop(
    ctx: &mut LowerContext,
    symbol: SymbolId,
    dims: &[Value],
    body: &[AstStmt],
    span: Span,
) -> Result<()> {
    let mut sizes = Vec::with_capacity(dims.len());
    for dim in dims {
        let Some(size) = dim.const_i32() else {
            return Err(ctx.error_at(
                span,
                "static loop bounds must be i32 compile-time constants",
            ));
        };
        sizes.push(size.max(0) as i64);
    }
    let total = sizes.iter().try_fold(1i64, |acc, &size| {
        let product = acc.checked_mul(size)?;
        (product <= i32::MAX as i64).then_some(product)
    });
    let Some(total) = total else {
        return Err(ctx.error_at(span, "static loop is too large to unroll"));
    };
    for flat in 0..total {
        let mut remaining = flat;
        let mut coords = vec![0i64; sizes.len()];
        for (i, &size) in sizes.iter().enumerate().rev() {
            coords[i] = remaining % size;
            remaining /= size;
        }
        let mut stmts = Vec::with_capacity(coords.len());
        let mut constants = Vec::with_capacity(coords.len());
        for &coord in &coords {
            stmts.push(ctx.builder.const_i32(coord as i32));
            constants.push(ConstVal::I32(coord as i32));
        }
        let value = Value::new(
            Type::Vector(PrimitiveType::I32, sizes.len() as u32),
            stmts,
            constants,
        );
        ctx.bind(symbol, Lowered::Value(value));
        lower_stmts(ctx, body)?;
    }
    Ok(())
}

fn vertex_loop(
    ctx: &mut LowerContext,
    loop_var: &Ident,
    args: &[Expr],
    body: &[AstStmt],
    span: Span,
) -> Result<()> {
    if !ctx.at_top_level() {
        return Err(ctx.error_at(
            span,
            "vertex-for loops must be at the top level of the kernel",
        ));
    }
    if args.is_empty() || args.len() > 2 {
        return Err(ctx.error_at(
            span,
            "input_vertices() expects a vertex buffer and an optional index buffer",
        ));
    }
    let symbol = require_symbol(loop_var)?;
    let vertex_buffer = field_arg(ctx, &args[0], "the first argument of input_vertices()")?;
    let index_buffer = match args.get(1) {
        Some(arg) => {
            let field = field_arg(ctx, arg, "the second argument of input_vertices()")?;
            if field.element_type != Type::Scalar(PrimitiveType::I32) {
                return Err(ctx.error_at(
                    arg.span,
                    format!("the index buffer must hold i32 elements, got {}", field.element_type),
                ));
            }
            Some(field)
        }
        None => None,
    };
    ctx.render.current = Some(PipelineBuild {
        vertex_buffer: vertex_buffer.clone(),
        index_buffer,
        interpolated_type: None,
    });
    ctx.render.state = RenderState::InVertex;
    ctx.frame_mut().loop_stack.push(LoopKind::VertexFor);
    ctx.builder.push_guard();
    let element_type = vertex_buffer.element_type.clone();
    let prims = element_type.primitives_list();
    let mut stmts = Vec::with_capacity(prims.len());
    for (location, prim) in prims.into_iter().enumerate() {
        stmts.push(ctx.builder.vertex_input(location as u32, prim));
    }
    ctx.bind(symbol, Lowered::Value(Value::new(element_type, stmts, vec![])));
    let outcome = lower_stmts(ctx, body);
    let block = ctx.builder.pop_guard();
    ctx.frame_mut().loop_stack.pop();
    outcome?;
    ctx.builder.vertex_for(block?);
    ctx.render.state = RenderState::FinishedVertex;
    Ok(())
}

fn fragment_loop(
    ctx: &mut LowerContext,
    loop_var: &Ident,
    args: &[Expr],
    body: &[AstStmt],
    span: Span,
) -> Result<()> {
    if ctx.render.state != RenderState::FinishedVertex {
        return Err(ctx.error_at(
            span,
            "a fragment-for loop must immediately follow its vertex-for loop",
        ));
    }
    if !args.is_empty() {
        return Err(ctx.error_at(span, "input_fragments() expects no arguments"));
    }
    let symbol = require_symbol(loop_var)?;
    // A vertex stage that never called output_vertex interpolates nothing.
    let interpolated_type = ctx
        .render
        .current
        .as_ref()
        .and_then(|pipeline| pipeline.interpolated_type.clone())
        .unwrap_or_else(|| Type::Struct(StructType::new(IndexMap::new())));
    ctx.render.state = RenderState::InFragment;
    ctx.frame_mut().loop_stack.push(LoopKind::FragmentFor);
    ctx.builder.push_guard();
    let prims = interpolated_type.primitives_list();
    let mut stmts = Vec::with_capacity(prims.len());
    for (location, prim) in prims.into_iter().enumerate() {
        stmts.push(ctx.builder.fragment_input(location as u32, prim));
    }
    ctx.bind(
        symbol,
        Lowered::Value(Value::new(interpolated_type.clone(), stmts, vec![])),
    );
    let outcome = lower_stmts(ctx, body);
    let block = ctx.builder.pop_guard();
    ctx.frame_mut().loop_stack.pop();
    outcome?;
    ctx.builder.fragment_for(block?);
    let pipeline = ctx
        .render
        .current
        .take()
        .ok_or_else(|| CompileError::internal("render pipeline state out of sync"))?;
    ctx.render.pipelines.push(RenderPipelineParams {
        vertex_buffer: pipeline.vertex_buffer,
        index_buffer: pipeline.index_buffer,
        interpolated_type,
    });
    ctx.render.state = RenderState::NotStarted;
    Ok(())
}

fn lower_return(ctx: &mut LowerContext, value: Option<&Expr>, span: Span) -> Result<()> {
    let frame = ctx.frame();
    if frame.branch_depth > 0 || !frame.loop_stack.is_empty() {
        return Err(ctx.error_at(span, "return cannot be used inside a loop or branch"));
    }
    let returned = match value {
        Some(expr) => expression::lower_read(ctx, expr)?,
        None => Value::void(),
    };
    if ctx.in_kernel() {
        ctx.builder.return_values(returned.stmts.clone());
        ctx.return_type = returned.ty.clone();
    }
    ctx.frame_mut().returned = Some(returned);
    Ok(())
}

fn lower_break(ctx: &mut LowerContext, span: Span) -> Result<()> {
    if !matches!(ctx.frame().loop_stack.last(), Some(LoopKind::While)) {
        return Err(ctx.error_at(span, "break can only be used inside `while` loops"));
    }
    ctx.builder.while_control();
    Ok(())
}

fn lower_continue(ctx: &mut LowerContext, span: Span) -> Result<()> {
    if ctx.frame().loop_stack.is_empty() {
        return Err(ctx.error_at(span, "continue can only be used inside a loop"));
    }
    ctx.builder.continue_stmt();
    Ok(())
}

fn field_arg(ctx: &mut LowerContext, arg: &Expr, what: &str) -> Result<Field> {
    match expression::lower_expr(ctx, arg)? {
        Lowered::Host(HostValue::Field(field)) => Ok(field),
        other => Err(ctx.error_at(
            arg.span,
            format!("{} must be a field, got a {}", what, other.kind_name()),
        )),
    }
}

fn require_symbol(ident: &Ident) -> Result<SymbolId> {
    ident.symbol.ok_or_else(|| {
        CompileError::internal(format!("`{}` has no binding id", ident.name))
    })
}

fn iterable_call(iterable: &Expr) -> Option<(&str, &[Expr])> {
    let ExprKind::Call { callee, args } = &iterable.kind else {
        return None;
    };
    let ExprKind::Ident(ident) = &callee.kind else {
        return None;
    };
    Some((ident.name.as_str(), args))
}

fn is_fragment_for(stmt: &AstStmt) -> bool {
    let AstStmtKind::ForOf { iterable, .. } = &stmt.kind else {
        return false;
    };
    matches!(iterable_call(iterable), Some(("input_fragments", _)))
}

fn static_call_arg(expr: &Expr) -> Option<&Expr> {
    let ExprKind::Call { callee, args } = &expr.kind else {
        return None;
    };
    let ExprKind::Ident(ident) = &callee.kind else {
        return None;
    };
    if ident.name == "static" {
        if let [arg] = args.as_slice() {
            return Some(arg);
        }
    }
    None
}
