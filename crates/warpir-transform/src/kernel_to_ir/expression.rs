use warpir_core::ast::{AstUnaryOp, Expr, ExprKind, FunctionDef, Ident, Span};
use warpir_core::instructions::UnaryOp;
use warpir_core::resources::Field;
use warpir_core::types::{PrimitiveType, Type};
use warpir_core::values::{self, ConstVal, Value};

use super::builtins;
use super::context::{Frame, LowerContext, Lowered};
use super::errors::{CompileError, Result};
use super::intrinsics;
use super::library;
use super::scope::HostValue;
use super::statement;

/// Host values nested deeper than this do not become kernel constants.
const MAX_HOST_DEPTH: u32 = 1024;

/// Inlined calls nested deeper than this mean runaway recursion.
const MAX_INLINE_DEPTH: usize = 64;

pub fn lower_expr(ctx: &mut LowerContext, expr: &Expr) -> Result<Lowered> {
    match &expr.kind {
        ExprKind::IntLiteral(value) => int_literal(ctx, *value, expr.span).map(Lowered::Value),
        ExprKind::FloatLiteral(value) => {
            let value = *value as f32;
            let stmt = ctx.builder.const_f32(value);
            Ok(Lowered::Value(Value::scalar_const(stmt, ConstVal::F32(value))))
        }
        ExprKind::BoolLiteral(value) => {
            let value = *value as i32;
            let stmt = ctx.builder.const_i32(value);
            Ok(Lowered::Value(Value::scalar_const(stmt, ConstVal::I32(value))))
        }
        ExprKind::Ident(ident) => lower_ident(ctx, ident),
        ExprKind::Binary { op, left, right } => {
            let lhs = lower_read(ctx, left)?;
            let rhs = lower_read(ctx, right)?;
            let op = builtins::binary_op_for(*op);
            builtins::apply_binary(ctx.builder, op, &lhs, &rhs).map(Lowered::Value)
        }
        ExprKind::Unary { op, operand } => {
            let value = lower_read(ctx, operand)?;
            let op = match op {
                AstUnaryOp::Neg => UnaryOp::Neg,
                AstUnaryOp::LogicalNot => UnaryOp::LogicNot,
                AstUnaryOp::BitNot => UnaryOp::BitNot,
            };
            builtins::apply_unary(ctx.builder, op, &value).map(Lowered::Value)
        }
        ExprKind::Call { callee, args } => lower_call(ctx, callee, args, expr.span),
        ExprKind::Member { object, member } => lower_member(ctx, object, member, expr.span),
        ExprKind::Index { object, indices } => lower_index(ctx, object, indices, expr.span),
        ExprKind::ArrayLiteral(items) => array_literal(ctx, items, expr.span).map(Lowered::Value),
        ExprKind::ObjectLiteral(pairs) => object_literal(ctx, pairs).map(Lowered::Value),
        ExprKind::Arrow(def) => Ok(Lowered::Closure((**def).clone())),
    }
}

/// Lower an expression and read it as a kernel value: pointers are
/// dereferenced and host values become compile-time constants.
pub fn lower_read(ctx: &mut LowerContext, expr: &Expr) -> Result<Value> {
    let lowered = lower_expr(ctx, expr)?;
    read_lowered(ctx, &lowered, expr.span)
}

pub fn read_lowered(ctx: &mut LowerContext, lowered: &Lowered, span: Span) -> Result<Value> {
    match lowered {
        Lowered::Value(value) => read_value(ctx, value),
        Lowered::Host(host) => materialize_host(ctx, host, span),
        Lowered::Closure(_) => Err(ctx.error_at(span, "a function cannot be used as a value")),
    }
}

/// Dereference a pointer value, or pass a plain value through.
pub fn read_value(ctx: &mut LowerContext, value: &Value) -> Result<Value> {
    let Type::Pointer(pointee, is_global) = &value.ty else {
        return Ok(value.clone());
    };
    let mut loads = Vec::with_capacity(value.stmts.len());
    for stmt in &value.stmts {
        let load = if *is_global {
            ctx.builder.global_load(*stmt)?
        } else {
            ctx.builder.local_load(*stmt)?
        };
        loads.push(load);
    }
    Ok(Value::new((**pointee).clone(), loads, vec![]))
}

/// Emit a host value as a compile-time constant kernel value. Numbers with
/// no fractional part become i32 under 32-bit wrapping; arrays become
/// vectors or matrices; objects become structs.
pub fn materialize_host(ctx: &mut LowerContext, host: &HostValue, span: Span) -> Result<Value> {
    materialize_at_depth(ctx, host, span, 0)
}

fn materialize_at_depth(
    ctx: &mut LowerContext,
    host: &HostValue,
    span: Span,
    depth: u32,
) -> Result<Value> {
    if depth > MAX_HOST_DEPTH {
        return Err(ctx.error_at(span, "kernel scope value is nested too deeply"));
    }
    match host {
        HostValue::Number(number) => {
            if number.fract() == 0.0 && number.is_finite() {
                let Some(value) = int_to_i32(*number as i64) else {
                    return Err(ctx.error_at(
                        span,
                        format!("{} cannot be expressed as a 32-bit integer", number),
                    ));
                };
                let stmt = ctx.builder.const_i32(value);
                Ok(Value::scalar_const(stmt, ConstVal::I32(value)))
            } else {
                let value = *number as f32;
                let stmt = ctx.builder.const_f32(value);
                Ok(Value::scalar_const(stmt, ConstVal::F32(value)))
            }
        }
        HostValue::Bool(value) => {
            let value = *value as i32;
            let stmt = ctx.builder.const_i32(value);
            Ok(Value::scalar_const(stmt, ConstVal::I32(value)))
        }
        HostValue::Array(items) => {
            if items.is_empty() {
                return Err(ctx.error_at(span, "an empty array cannot be used as a kernel value"));
            }
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                parts.push(materialize_at_depth(ctx, item, span, depth + 1)?);
            }
            let composed = if parts.iter().all(|part| part.ty.is_scalar()) {
                values::compose_vector(&parts)
            } else if parts.iter().all(|part| part.ty.is_vector()) {
                values::compose_matrix(&parts)
            } else {
                return Err(ctx.error_at(
                    span,
                    "array elements must be all numbers or all equally-sized vectors",
                ));
            };
            composed.map_err(|err| ctx.error_at(span, err.to_string()))
        }
        HostValue::Object(members) => {
            let mut fields = Vec::with_capacity(members.len());
            for (name, member) in members {
                fields.push((
                    name.clone(),
                    materialize_at_depth(ctx, member, span, depth + 1)?,
                ));
            }
            Ok(values::compose_struct(fields))
        }
        other => Err(ctx.error_at(
            span,
            format!("a {} cannot be used as a kernel value here", other.kind_name()),
        )),
    }
}

fn int_literal(ctx: &mut LowerContext, value: i64, span: Span) -> Result<Value> {
    let Some(value) = int_to_i32(value) else {
        return Err(ctx.error_at(
            span,
            format!("the integer literal {} cannot be expressed as a 32-bit integer", value),
        ));
    };
    let stmt = ctx.builder.const_i32(value);
    Ok(Value::scalar_const(stmt, ConstVal::I32(value)))
}

/// 32-bit reinterpretation of an integer: values up to `u32::MAX` wrap into
/// the two's-complement range, anything wider is rejected.
fn int_to_i32(value: i64) -> Option<i32> {
    if (i32::MIN as i64..=u32::MAX as i64).contains(&value) {
        Some(value as u32 as i32)
    } else {
        None
    }
}

/// Resolution order for a name: the innermost frame's symbol table, then
/// template arguments, then the host kernel scope.
fn resolve_name(ctx: &LowerContext, ident: &Ident) -> Option<Lowered> {
    if let Some(symbol) = ident.symbol {
        if let Some(lowered) = ctx.lookup(symbol) {
            return Some(lowered.clone());
        }
    }
    if let Some(host) = ctx.template_values.get(&ident.name) {
        return Some(Lowered::Host(host.clone()));
    }
    ctx.scope.get(&ident.name).map(|host| Lowered::Host(host.clone()))
}

fn lower_ident(ctx: &mut LowerContext, ident: &Ident) -> Result<Lowered> {
    resolve_name(ctx, ident).ok_or_else(|| {
        ctx.error_at(ident.span, format!("unresolved identifier: {}", ident.name))
    })
}

fn lower_member(
    ctx: &mut LowerContext,
    object: &Expr,
    member: &str,
    span: Span,
) -> Result<Lowered> {
    if let ExprKind::Ident(ident) = &object.kind {
        if ident.name == "Math" && resolve_name(ctx, ident).is_none() {
            return math_constant(ctx, member, span).map(Lowered::Value);
        }
    }
    match lower_expr(ctx, object)? {
        Lowered::Host(host) => match host.member(member) {
            Some(value) => Ok(Lowered::Host(value.clone())),
            None => Err(ctx.error_at(
                span,
                format!("this {} has no member `{}`", host.kind_name(), member),
            )),
        },
        Lowered::Value(value) => value_member(ctx, &value, member, span).map(Lowered::Value),
        Lowered::Closure(_) => Err(ctx.error_at(span, "a function has no members")),
    }
}

fn math_constant(ctx: &mut LowerContext, member: &str, span: Span) -> Result<Value> {
    let value = match member {
        "PI" => std::f32::consts::PI,
        "E" => std::f32::consts::E,
        _ => {
            return Err(ctx.error_at(span, format!("unknown Math constant `{}`", member)));
        }
    };
    let stmt = ctx.builder.const_f32(value);
    Ok(Value::scalar_const(stmt, ConstVal::F32(value)))
}

/// Struct member access or vector swizzle, preserving pointer-ness so the
/// result stays assignable when the object was.
fn value_member(ctx: &LowerContext, value: &Value, member: &str, span: Span) -> Result<Value> {
    match value.stored_type() {
        Type::Struct(_) => values::struct_member(value, member).ok_or_else(|| {
            ctx.error_at(span, format!("{} has no member `{}`", value.ty, member))
        }),
        Type::Vector(_, _) => {
            let indices = swizzle_indices(member).ok_or_else(|| {
                ctx.error_at(span, format!("invalid swizzle `{}` on {}", member, value.ty))
            })?;
            values::select_components(value, &indices)
                .map_err(|err| ctx.error_at(span, err.to_string()))
        }
        _ => Err(ctx.error_at(span, format!("{} has no member `{}`", value.ty, member))),
    }
}

/// Component indices for a swizzle name. All characters must come from one
/// family: xyzw, rgba, or uv.
fn swizzle_indices(member: &str) -> Option<Vec<usize>> {
    const FAMILIES: [&str; 3] = ["xyzw", "rgba", "uv"];
    if member.is_empty() || member.len() > 4 {
        return None;
    }
    let first = member.chars().next()?;
    let family = FAMILIES.iter().find(|family| family.contains(first))?;
    member.chars().map(|c| family.find(c)).collect()
}

fn lower_index(
    ctx: &mut LowerContext,
    object: &Expr,
    indices: &[Expr],
    span: Span,
) -> Result<Lowered> {
    match lower_expr(ctx, object)? {
        Lowered::Host(HostValue::Field(field)) => {
            field_index(ctx, &field, indices, span).map(Lowered::Value)
        }
        Lowered::Host(host) => host_index(ctx, host, indices, span).map(Lowered::Host),
        Lowered::Value(value) => tensor_index(ctx, &value, indices, span).map(Lowered::Value),
        Lowered::Closure(_) => Err(ctx.error_at(span, "a function cannot be indexed")),
    }
}

/// Index a field: one l-value pointer per primitive of the element type, all
/// sharing the same dynamic index statements.
fn field_index(
    ctx: &mut LowerContext,
    field: &Field,
    indices: &[Expr],
    span: Span,
) -> Result<Value> {
    let dims = field.num_dimensions();
    if indices.len() != dims {
        return Err(ctx.error_at(
            span,
            format!(
                "this field expects {} {}, got {}",
                dims,
                if dims == 1 { "index" } else { "indices" },
                indices.len()
            ),
        ));
    }
    let mut index_stmts = Vec::with_capacity(indices.len());
    for index in indices {
        let value = lower_read(ctx, index)?;
        if !value.ty.is_scalar() {
            return Err(ctx.error_at(
                index.span,
                format!("field indices must be scalars, got {}", value.ty),
            ));
        }
        index_stmts.push(ctx.builder.convert(value.stmts[0], PrimitiveType::I32)?);
    }
    let element_type = field.element_type.clone();
    let prims = element_type.primitives_list();
    let mut stmts = Vec::with_capacity(prims.len());
    for (offset, prim) in prims.into_iter().enumerate() {
        stmts.push(
            ctx.builder
                .global_ptr(field.clone(), index_stmts.clone(), offset as u32, prim),
        );
    }
    Ok(Value::new(Type::pointer(element_type, true), stmts, vec![]))
}

fn host_index(
    ctx: &mut LowerContext,
    host: HostValue,
    indices: &[Expr],
    span: Span,
) -> Result<HostValue> {
    let mut current = host;
    for index in indices {
        let value = lower_read(ctx, index)?;
        let Some(i) = value.const_i32() else {
            return Err(ctx.error_at(
                index.span,
                "indices into host values must be i32 compile-time constants",
            ));
        };
        let element = usize::try_from(i)
            .ok()
            .and_then(|i| current.element(i))
            .cloned();
        current = element
            .ok_or_else(|| ctx.error_at(span, format!("index {} is out of bounds", i)))?;
    }
    Ok(current)
}

/// Vector and matrix indexing with compile-time-constant indices, pointer
/// preserving like member access.
fn tensor_index(
    ctx: &mut LowerContext,
    value: &Value,
    indices: &[Expr],
    span: Span,
) -> Result<Value> {
    let mut consts = Vec::with_capacity(indices.len());
    for index in indices {
        let lowered = lower_read(ctx, index)?;
        let Some(i) = lowered.const_i32() else {
            return Err(ctx.error_at(
                index.span,
                "tensor indices must be i32 compile-time constants",
            ));
        };
        let i = usize::try_from(i)
            .map_err(|_| ctx.error_at(index.span, format!("index {} is out of bounds", i)))?;
        consts.push(i);
    }
    let result = match (value.stored_type(), consts.as_slice()) {
        (Type::Vector(_, _), [i]) => values::vector_component(value, *i),
        (Type::Matrix(_, _, _), [row]) => values::matrix_row(value, *row),
        (Type::Matrix(_, _, _), [row, col]) => values::matrix_entry(value, *row, *col),
        _ => {
            return Err(ctx.error_at(
                span,
                format!("cannot index {} with {} indices", value.ty, consts.len()),
            ))
        }
    };
    result.map_err(|err| ctx.error_at(span, err.to_string()))
}

fn array_literal(ctx: &mut LowerContext, items: &[Expr], span: Span) -> Result<Value> {
    if items.is_empty() {
        return Err(ctx.error_at(span, "empty array literals are not allowed"));
    }
    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        parts.push(lower_read(ctx, item)?);
    }
    let composed = if parts.iter().all(|part| part.ty.is_scalar()) {
        values::compose_vector(&parts)
    } else if parts.iter().all(|part| part.ty.is_vector()) {
        values::compose_matrix(&parts)
    } else {
        return Err(ctx.error_at(
            span,
            "array literal elements must be all scalars or all vectors",
        ));
    };
    composed.map_err(|err| ctx.error_at(span, err.to_string()))
}

fn object_literal(ctx: &mut LowerContext, pairs: &[(String, Expr)]) -> Result<Value> {
    let mut members = Vec::with_capacity(pairs.len());
    for (name, expr) in pairs {
        members.push((name.clone(), lower_read(ctx, expr)?));
    }
    Ok(values::compose_struct(members))
}

fn lower_call(
    ctx: &mut LowerContext,
    callee: &Expr,
    args: &[Expr],
    span: Span,
) -> Result<Lowered> {
    match &callee.kind {
        ExprKind::Ident(ident) => lower_named_call(ctx, ident, args, span),
        ExprKind::Member { object, member } => {
            lower_method_call(ctx, object, member, args, span)
        }
        _ => {
            let lowered = lower_expr(ctx, callee)?;
            call_lowered(ctx, lowered, args, span)
        }
    }
}

/// Call resolution for a plain name: library helpers, then the builtin op
/// table, then atomic/rendering intrinsics, then `static`, then whatever the
/// name resolves to. Builtin names shadow user bindings.
fn lower_named_call(
    ctx: &mut LowerContext,
    ident: &Ident,
    args: &[Expr],
    span: Span,
) -> Result<Lowered> {
    let name = ident.name.as_str();
    if let Some(def) = library::library_function(name) {
        return inline_function(ctx, &def, args, span, false);
    }
    if builtins::is_builtin_name(name) {
        let values = read_args(ctx, args)?;
        let result = builtins::apply_builtin(ctx.builder, name, &values)?.ok_or_else(|| {
            CompileError::internal(format!("builtin `{}` fell through dispatch", name))
        })?;
        return Ok(Lowered::Value(result));
    }
    if intrinsics::is_intrinsic_name(name) {
        let lowered = lower_args(ctx, args)?;
        return intrinsics::apply_intrinsic(ctx, name, &lowered, span)?.ok_or_else(|| {
            CompileError::internal(format!("intrinsic `{}` fell through dispatch", name))
        });
    }
    if name == "static" {
        let [arg] = args else {
            return Err(ctx.error_at(span, "static() expects exactly one argument"));
        };
        return lower_expr(ctx, arg);
    }
    match resolve_name(ctx, ident) {
        Some(callee) => call_lowered(ctx, callee, args, span),
        None if matches!(name, "range" | "ndrange" | "input_vertices" | "input_fragments") => {
            Err(ctx.error_at(
                span,
                format!(
                    "{}() can only be used as the iterated expression of a for-of loop",
                    name
                ),
            ))
        }
        None => Err(ctx.error_at(
            ident.span,
            format!("unresolved identifier: {}", ident.name),
        )),
    }
}

/// Method-call sugar: `v.dot(w)` is `dot(v, w)` when the member names a
/// builtin op; anything else is a member lookup followed by a call.
fn lower_method_call(
    ctx: &mut LowerContext,
    object: &Expr,
    member: &str,
    args: &[Expr],
    span: Span,
) -> Result<Lowered> {
    if builtins::is_builtin_name(member) {
        let mut values = Vec::with_capacity(args.len() + 1);
        values.push(lower_read(ctx, object)?);
        for arg in args {
            values.push(lower_read(ctx, arg)?);
        }
        let result = builtins::apply_builtin(ctx.builder, member, &values)?.ok_or_else(|| {
            CompileError::internal(format!("builtin `{}` fell through dispatch", member))
        })?;
        return Ok(Lowered::Value(result));
    }
    let callee = lower_member(ctx, object, member, span)?;
    call_lowered(ctx, callee, args, span)
}

fn call_lowered(
    ctx: &mut LowerContext,
    callee: Lowered,
    args: &[Expr],
    span: Span,
) -> Result<Lowered> {
    match callee {
        Lowered::Closure(def) => inline_function(ctx, &def, args, span, true),
        Lowered::Host(HostValue::Function(def)) => inline_function(ctx, &def, args, span, false),
        other => Err(ctx.error_at(
            span,
            format!("only functions can be called, got a {}", other.kind_name()),
        )),
    }
}

/// Inline a function call at the call site. Functions defined inside the
/// kernel capture the caller's bindings; functions injected from the host
/// see only their own parameters. Loops inside the body always serialize.
fn inline_function(
    ctx: &mut LowerContext,
    def: &FunctionDef,
    args: &[Expr],
    span: Span,
    capture: bool,
) -> Result<Lowered> {
    if args.len() != def.params.len() {
        return Err(ctx.error_at(
            span,
            format!(
                "this function expects {} argument{}, got {}",
                def.params.len(),
                if def.params.len() == 1 { "" } else { "s" },
                args.len()
            ),
        ));
    }
    if ctx.inline_frames.len() >= MAX_INLINE_DEPTH {
        return Err(ctx.error_at(
            span,
            "function calls are nested too deeply; recursive functions cannot be inlined",
        ));
    }
    let lowered_args = lower_args(ctx, args)?;
    let mut def = def.clone();
    ctx.resolver.resolve_function(&mut def);
    let mut frame = Frame::default();
    if capture {
        frame.symbols = ctx.frame().symbols.clone();
    }
    ctx.push_frame(frame);
    let outcome = bind_and_lower(ctx, &def, lowered_args);
    let frame = ctx.pop_frame();
    outcome?;
    let returned = frame.and_then(|frame| frame.returned);
    Ok(Lowered::Value(returned.unwrap_or_else(Value::void)))
}

fn bind_and_lower(ctx: &mut LowerContext, def: &FunctionDef, args: Vec<Lowered>) -> Result<()> {
    for (param, arg) in def.params.iter().zip(args) {
        let Some(symbol) = param.ident.symbol else {
            return Err(CompileError::internal(format!(
                "parameter `{}` has no binding id",
                param.ident.name
            )));
        };
        let bound = match arg {
            Lowered::Value(value) if !value.is_pointer() => {
                Lowered::Value(create_local_var_copy(ctx, &value)?)
            }
            other => other,
        };
        ctx.bind(symbol, bound);
    }
    statement::lower_stmts(ctx, &def.body)
}

/// Copy a value into fresh stack slots, yielding a local pointer with the
/// same stored type. Declarations and by-value parameters go through here so
/// later assignment has an address to store into.
pub fn create_local_var_copy(ctx: &mut LowerContext, value: &Value) -> Result<Value> {
    let prims = value.ty.primitives_list();
    if prims.len() != value.stmts.len() {
        return Err(CompileError::internal("value layout does not match its type"));
    }
    let mut ptrs = Vec::with_capacity(prims.len());
    for (stmt, prim) in value.stmts.iter().zip(prims) {
        let ptr = ctx.builder.alloca(prim);
        ctx.builder.local_store(ptr, *stmt);
        ptrs.push(ptr);
    }
    Ok(Value::new(Type::pointer(value.ty.clone(), false), ptrs, vec![]))
}

fn lower_args(ctx: &mut LowerContext, args: &[Expr]) -> Result<Vec<Lowered>> {
    args.iter().map(|arg| lower_expr(ctx, arg)).collect()
}

fn read_args(ctx: &mut LowerContext, args: &[Expr]) -> Result<Vec<Value>> {
    args.iter().map(|arg| lower_read(ctx, arg)).collect()
}
