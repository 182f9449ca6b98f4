use warpir_core::ast::AstBinaryOp;
use warpir_core::builder::IrBuilder;
use warpir_core::instructions::{AtomicOp, BinaryOp, StmtId, UnaryOp};
use warpir_core::types::{PrimitiveType, Type};
use warpir_core::values::{self, ConstVal, Value};

use super::errors::{CompileError, Result};

/// The IR op behind a surface binary operator token.
pub fn binary_op_for(op: AstBinaryOp) -> BinaryOp {
    match op {
        AstBinaryOp::Add => BinaryOp::Add,
        AstBinaryOp::Sub => BinaryOp::Sub,
        AstBinaryOp::Mul => BinaryOp::Mul,
        AstBinaryOp::Div => BinaryOp::TrueDiv,
        AstBinaryOp::Mod => BinaryOp::Mod,
        AstBinaryOp::Pow => BinaryOp::Pow,
        AstBinaryOp::Lt => BinaryOp::CmpLt,
        AstBinaryOp::Le => BinaryOp::CmpLe,
        AstBinaryOp::Gt => BinaryOp::CmpGt,
        AstBinaryOp::Ge => BinaryOp::CmpGe,
        AstBinaryOp::Eq => BinaryOp::CmpEq,
        AstBinaryOp::Ne => BinaryOp::CmpNe,
        AstBinaryOp::LogicalAnd => BinaryOp::LogicalAnd,
        AstBinaryOp::LogicalOr => BinaryOp::LogicalOr,
        AstBinaryOp::BitAnd => BinaryOp::BitAnd,
        AstBinaryOp::BitOr => BinaryOp::BitOr,
        AstBinaryOp::BitXor => BinaryOp::BitXor,
        AstBinaryOp::Shl => BinaryOp::BitShl,
        AstBinaryOp::Sar => BinaryOp::BitSar,
        AstBinaryOp::Shr => BinaryOp::BitShr,
    }
}

pub fn unary_builtin(name: &str) -> Option<UnaryOp> {
    Some(match name {
        "neg" => UnaryOp::Neg,
        "sqrt" => UnaryOp::Sqrt,
        "rsqrt" => UnaryOp::Rsqrt,
        "rcp" => UnaryOp::Rcp,
        "inv" => UnaryOp::Inv,
        "sin" => UnaryOp::Sin,
        "asin" => UnaryOp::Asin,
        "cos" => UnaryOp::Cos,
        "acos" => UnaryOp::Acos,
        "tan" => UnaryOp::Tan,
        "tanh" => UnaryOp::Tanh,
        "exp" => UnaryOp::Exp,
        "log" => UnaryOp::Log,
        "abs" => UnaryOp::Abs,
        "sign" => UnaryOp::Sgn,
        "floor" => UnaryOp::Floor,
        "ceil" => UnaryOp::Ceil,
        "round" => UnaryOp::Round,
        "f32" => UnaryOp::CastF32Value,
        "i32" => UnaryOp::CastI32Value,
        "not" => UnaryOp::BitNot,
        "logical_not" => UnaryOp::LogicNot,
        _ => return None,
    })
}

pub fn binary_builtin(name: &str) -> Option<BinaryOp> {
    Some(match name {
        "max" => BinaryOp::Max,
        "min" => BinaryOp::Min,
        "pow" => BinaryOp::Pow,
        "atan2" => BinaryOp::Atan2,
        _ => return None,
    })
}

pub fn atomic_builtin(name: &str) -> Option<AtomicOp> {
    Some(match name {
        "atomic_add" => AtomicOp::Add,
        "atomic_sub" => AtomicOp::Sub,
        "atomic_max" => AtomicOp::Max,
        "atomic_min" => AtomicOp::Min,
        "atomic_and" => AtomicOp::BitAnd,
        "atomic_or" => AtomicOp::BitOr,
        "atomic_xor" => AtomicOp::BitXor,
        _ => return None,
    })
}

/// True when `name` resolves in the builtin table, which also makes it
/// available as a property-style method (`v.dot(w)`).
pub fn is_builtin_name(name: &str) -> bool {
    unary_builtin(name).is_some()
        || binary_builtin(name).is_some()
        || matches!(
            name,
            "dot"
                | "cross"
                | "norm"
                | "norm_sqr"
                | "normalized"
                | "matmul"
                | "transpose"
                | "outer_product"
                | "random"
        )
}

/// Apply a named builtin to already-lowered r-value arguments. Returns
/// `None` when the name is not a builtin so call resolution can continue.
pub fn apply_builtin(
    builder: &mut IrBuilder,
    name: &str,
    args: &[Value],
) -> Result<Option<Value>> {
    if let Some(op) = unary_builtin(name) {
        expect_args(name, args, 1)?;
        return apply_unary(builder, op, &args[0]).map(Some);
    }
    if let Some(op) = binary_builtin(name) {
        expect_args(name, args, 2)?;
        return apply_binary(builder, op, &args[0], &args[1]).map(Some);
    }
    match name {
        "dot" => {
            expect_args(name, args, 2)?;
            dot(builder, &args[0], &args[1]).map(Some)
        }
        "cross" => {
            expect_args(name, args, 2)?;
            cross(builder, &args[0], &args[1]).map(Some)
        }
        "norm" => {
            expect_args(name, args, 1)?;
            norm(builder, &args[0]).map(Some)
        }
        "norm_sqr" => {
            expect_args(name, args, 1)?;
            norm_sqr(builder, &args[0]).map(Some)
        }
        "normalized" => {
            expect_args(name, args, 1)?;
            normalized(builder, &args[0]).map(Some)
        }
        "matmul" => {
            expect_args(name, args, 2)?;
            matmul(builder, &args[0], &args[1]).map(Some)
        }
        "transpose" => {
            expect_args(name, args, 1)?;
            Ok(Some(values::transpose(&args[0])?))
        }
        "outer_product" => {
            expect_args(name, args, 2)?;
            outer_product(builder, &args[0], &args[1]).map(Some)
        }
        "random" => {
            expect_args(name, args, 0)?;
            let stmt = builder.rand(PrimitiveType::F32);
            Ok(Some(Value::scalar(PrimitiveType::F32, stmt)))
        }
        _ => Ok(None),
    }
}

fn expect_args(name: &str, args: &[Value], count: usize) -> Result<()> {
    if args.len() == count {
        Ok(())
    } else {
        Err(CompileError::TypeError(format!(
            "`{}` expects {} argument{}, got {}",
            name,
            count,
            if count == 1 { "" } else { "s" },
            args.len()
        )))
    }
}

/// Elementwise binary op over two r-values, broadcasting a scalar operand
/// over a tensor one. Mismatched tensor shapes are an error, never an
/// implicit broadcast. Constant lanes fold; the fold result rides alongside
/// the emitted statements.
pub fn apply_binary(
    builder: &mut IrBuilder,
    op: BinaryOp,
    left: &Value,
    right: &Value,
) -> Result<Value> {
    let left_prim = numeric_prim(&left.ty, &op.to_string())?;
    let right_prim = numeric_prim(&right.ty, &op.to_string())?;
    let result_prim = op.result_prim(left_prim, right_prim).ok_or_else(|| {
        CompileError::TypeError(format!(
            "operator `{}` cannot be applied to {} and {}",
            op, left.ty, right.ty
        ))
    })?;

    let shape = if left.ty.same_shape(&right.ty) || right.ty.is_scalar() {
        &left.ty
    } else if left.ty.is_scalar() {
        &right.ty
    } else {
        return Err(CompileError::TypeError(format!(
            "shape mismatch for operator `{}`: {} vs {}",
            op, left.ty, right.ty
        )));
    };
    let result_ty = shape.with_primitive(result_prim).ok_or_else(|| {
        CompileError::internal(format!("non-tensor shape {} in binary op", shape))
    })?;

    let lanes = result_ty.num_primitives();
    let mut stmts = Vec::with_capacity(lanes);
    for i in 0..lanes {
        stmts.push(builder.binary(op, lane(left, i), lane(right, i))?);
    }

    let mut constants = Vec::new();
    if left.is_compile_time_constant() && right.is_compile_time_constant() {
        constants.reserve(lanes);
        for i in 0..lanes {
            match (lane_const(left, i), lane_const(right, i)) {
                (Some(a), Some(b)) => match fold_binary(op, a, b) {
                    Some(folded) => constants.push(folded),
                    None => {
                        constants.clear();
                        break;
                    }
                },
                _ => {
                    constants.clear();
                    break;
                }
            }
        }
    }
    Ok(Value::new(result_ty, stmts, constants))
}

/// Elementwise unary op over an r-value, folding constant lanes.
pub fn apply_unary(builder: &mut IrBuilder, op: UnaryOp, value: &Value) -> Result<Value> {
    let prim = numeric_prim(&value.ty, &op.to_string())?;
    let result_prim = op.result_prim(prim).ok_or_else(|| {
        CompileError::TypeError(format!(
            "operator `{}` cannot be applied to {}",
            op, value.ty
        ))
    })?;
    let result_ty = value.ty.with_primitive(result_prim).ok_or_else(|| {
        CompileError::internal(format!("non-tensor type {} in unary op", value.ty))
    })?;

    let mut stmts = Vec::with_capacity(value.stmts.len());
    for &stmt in &value.stmts {
        stmts.push(builder.unary(op, stmt)?);
    }

    let mut constants = Vec::new();
    if value.is_compile_time_constant() {
        constants.reserve(value.constants.len());
        for &c in &value.constants {
            match fold_unary(op, c) {
                Some(folded) => constants.push(folded),
                None => {
                    constants.clear();
                    break;
                }
            }
        }
    }
    Ok(Value::new(result_ty, stmts, constants))
}

/// Value-preserving elementwise cast. A no-op when the primitive already
/// matches.
pub fn cast_to(builder: &mut IrBuilder, value: &Value, prim: PrimitiveType) -> Result<Value> {
    if value.ty.primitive() == Some(prim) {
        return Ok(value.clone());
    }
    let op = match prim {
        PrimitiveType::I32 => UnaryOp::CastI32Value,
        PrimitiveType::F32 => UnaryOp::CastF32Value,
    };
    apply_unary(builder, op, value)
}

/// Store an r-value through a pointer, broadcasting a scalar over a tensor
/// destination and casting each lane to the stored primitive.
pub fn store(builder: &mut IrBuilder, dest: &Value, value: &Value) -> Result<()> {
    let Type::Pointer(pointee, is_global) = &dest.ty else {
        return Err(CompileError::TypeError(format!(
            "store destination must be an l-value, got {}",
            dest.ty
        )));
    };
    let broadcast = value.ty.is_scalar() && !pointee.is_scalar();
    if !broadcast && !pointee.same_shape(&value.ty) {
        return Err(CompileError::TypeError(format!(
            "cannot assign {} to {}",
            value.ty, pointee
        )));
    }
    for (i, prim) in pointee.primitives_list().into_iter().enumerate() {
        let source = if broadcast { value.stmts[0] } else { value.stmts[i] };
        let converted = builder.convert(source, prim)?;
        if *is_global {
            builder.global_store(dest.stmts[i], converted);
        } else {
            builder.local_store(dest.stmts[i], converted);
        }
    }
    Ok(())
}

/// Elementwise atomic read-modify-write through a pointer. Returns the
/// pre-op values as a tensor of the destination's shape.
pub fn apply_atomic(
    builder: &mut IrBuilder,
    op: AtomicOp,
    dest: &Value,
    value: &Value,
) -> Result<Value> {
    let Type::Pointer(pointee, _) = &dest.ty else {
        return Err(CompileError::TypeError(format!(
            "atomic destination must be an l-value, got {}",
            dest.ty
        )));
    };
    let broadcast = value.ty.is_scalar() && !pointee.is_scalar();
    if !broadcast && !pointee.same_shape(&value.ty) {
        return Err(CompileError::TypeError(format!(
            "shape mismatch for atomic {}: {} vs {}",
            op, pointee, value.ty
        )));
    }
    let mut stmts = Vec::with_capacity(dest.stmts.len());
    for (i, prim) in pointee.primitives_list().into_iter().enumerate() {
        if prim == PrimitiveType::F32 && op.to_binary().is_integer_only() {
            return Err(CompileError::TypeError(format!(
                "atomic {} requires i32 operands, got {}",
                op, pointee
            )));
        }
        let source = if broadcast { value.stmts[0] } else { value.stmts[i] };
        let converted = builder.convert(source, prim)?;
        stmts.push(builder.atomic_op(op, dest.stmts[i], converted)?);
    }
    Ok(Value::new((**pointee).clone(), stmts, Vec::new()))
}

fn dot(builder: &mut IrBuilder, a: &Value, b: &Value) -> Result<Value> {
    let (Type::Vector(_, n), Type::Vector(_, m)) = (&a.ty, &b.ty) else {
        return Err(CompileError::TypeError(format!(
            "dot expects two vectors, got {} and {}",
            a.ty, b.ty
        )));
    };
    if n != m {
        return Err(CompileError::TypeError(format!(
            "dot expects vectors of the same size, got {} and {}",
            a.ty, b.ty
        )));
    }
    let products = apply_binary(builder, BinaryOp::Mul, a, b)?;
    let mut sum = values::vector_component(&products, 0)?;
    for i in 1..*n as usize {
        let component = values::vector_component(&products, i)?;
        sum = apply_binary(builder, BinaryOp::Add, &sum, &component)?;
    }
    Ok(sum)
}

fn cross(builder: &mut IrBuilder, a: &Value, b: &Value) -> Result<Value> {
    if !matches!(a.ty, Type::Vector(_, 3)) || !matches!(b.ty, Type::Vector(_, 3)) {
        return Err(CompileError::TypeError(format!(
            "cross expects two 3-component vectors, got {} and {}",
            a.ty, b.ty
        )));
    }
    let mut components = Vec::with_capacity(3);
    for i in 0..3 {
        let (j, k) = ((i + 1) % 3, (i + 2) % 3);
        let aj = values::vector_component(a, j)?;
        let ak = values::vector_component(a, k)?;
        let bj = values::vector_component(b, j)?;
        let bk = values::vector_component(b, k)?;
        let left = apply_binary(builder, BinaryOp::Mul, &aj, &bk)?;
        let right = apply_binary(builder, BinaryOp::Mul, &ak, &bj)?;
        components.push(apply_binary(builder, BinaryOp::Sub, &left, &right)?);
    }
    Ok(values::compose_vector(&components)?)
}

fn norm_sqr(builder: &mut IrBuilder, a: &Value) -> Result<Value> {
    if !a.ty.is_vector() {
        return Err(CompileError::TypeError(format!(
            "norm_sqr expects a vector, got {}",
            a.ty
        )));
    }
    dot(builder, a, a)
}

fn norm(builder: &mut IrBuilder, a: &Value) -> Result<Value> {
    let squared = norm_sqr(builder, a)?;
    apply_unary(builder, UnaryOp::Sqrt, &squared)
}

fn normalized(builder: &mut IrBuilder, a: &Value) -> Result<Value> {
    let length = norm(builder, a)?;
    apply_binary(builder, BinaryOp::TrueDiv, a, &length)
}

fn matmul(builder: &mut IrBuilder, a: &Value, b: &Value) -> Result<Value> {
    match (&a.ty, &b.ty) {
        (Type::Matrix(_, rows, inner), Type::Matrix(_, inner2, cols)) => {
            if inner != inner2 {
                return Err(CompileError::TypeError(format!(
                    "matmul dimension mismatch: {} by {}",
                    a.ty, b.ty
                )));
            }
            let mut row_values = Vec::with_capacity(*rows as usize);
            for i in 0..*rows as usize {
                let mut entries = Vec::with_capacity(*cols as usize);
                for j in 0..*cols as usize {
                    entries.push(matmul_entry(builder, a, b, i, j, *inner as usize)?);
                }
                row_values.push(values::compose_vector(&entries)?);
            }
            Ok(values::compose_matrix(&row_values)?)
        }
        (Type::Matrix(_, rows, inner), Type::Vector(_, len)) => {
            if inner != len {
                return Err(CompileError::TypeError(format!(
                    "matmul dimension mismatch: {} by {}",
                    a.ty, b.ty
                )));
            }
            let mut entries = Vec::with_capacity(*rows as usize);
            for i in 0..*rows as usize {
                let mut sum: Option<Value> = None;
                for t in 0..*inner as usize {
                    let entry = values::matrix_entry(a, i, t)?;
                    let component = values::vector_component(b, t)?;
                    let product = apply_binary(builder, BinaryOp::Mul, &entry, &component)?;
                    sum = Some(match sum {
                        Some(acc) => apply_binary(builder, BinaryOp::Add, &acc, &product)?,
                        None => product,
                    });
                }
                match sum {
                    Some(entry) => entries.push(entry),
                    None => {
                        return Err(CompileError::internal("matmul over zero-width matrix"))
                    }
                }
            }
            Ok(values::compose_vector(&entries)?)
        }
        _ => Err(CompileError::TypeError(format!(
            "matmul expects matrix*matrix or matrix*vector, got {} and {}",
            a.ty, b.ty
        ))),
    }
}

fn matmul_entry(
    builder: &mut IrBuilder,
    a: &Value,
    b: &Value,
    row: usize,
    col: usize,
    inner: usize,
) -> Result<Value> {
    let mut sum: Option<Value> = None;
    for t in 0..inner {
        let left = values::matrix_entry(a, row, t)?;
        let right = values::matrix_entry(b, t, col)?;
        let product = apply_binary(builder, BinaryOp::Mul, &left, &right)?;
        sum = Some(match sum {
            Some(acc) => apply_binary(builder, BinaryOp::Add, &acc, &product)?,
            None => product,
        });
    }
    sum.ok_or_else(|| CompileError::internal("matmul over zero-width matrix"))
}

fn outer_product(builder: &mut IrBuilder, a: &Value, b: &Value) -> Result<Value> {
    let (Type::Vector(_, rows), Type::Vector(_, _)) = (&a.ty, &b.ty) else {
        return Err(CompileError::TypeError(format!(
            "outer_product expects two vectors, got {} and {}",
            a.ty, b.ty
        )));
    };
    let mut row_values = Vec::with_capacity(*rows as usize);
    for i in 0..*rows as usize {
        let component = values::vector_component(a, i)?;
        row_values.push(apply_binary(builder, BinaryOp::Mul, &component, b)?);
    }
    Ok(values::compose_matrix(&row_values)?)
}

fn numeric_prim(ty: &Type, op: &str) -> Result<PrimitiveType> {
    ty.primitive().ok_or_else(|| {
        CompileError::TypeError(format!(
            "operator `{}` expects numeric operands, got {}",
            op, ty
        ))
    })
}

fn lane(value: &Value, i: usize) -> StmtId {
    if value.stmts.len() == 1 {
        value.stmts[0]
    } else {
        value.stmts[i]
    }
}

fn lane_const(value: &Value, i: usize) -> Option<ConstVal> {
    if value.constants.len() == 1 {
        value.constants.first().copied()
    } else {
        value.constants.get(i).copied()
    }
}

/// Compile-time evaluation of one binary lane. Integer arithmetic wraps the
/// way 32-bit device arithmetic does; folds that would divide by an integer
/// zero are skipped so the runtime keeps the behavior.
fn fold_binary(op: BinaryOp, a: ConstVal, b: ConstVal) -> Option<ConstVal> {
    if op.is_comparison() {
        let (x, y) = (a.as_f64(), b.as_f64());
        let result = match op {
            BinaryOp::CmpLt => x < y,
            BinaryOp::CmpLe => x <= y,
            BinaryOp::CmpGt => x > y,
            BinaryOp::CmpGe => x >= y,
            BinaryOp::CmpEq => x == y,
            BinaryOp::CmpNe => x != y,
            _ => return None,
        };
        return Some(ConstVal::I32(result as i32));
    }
    if op.is_integer_only() {
        let (ConstVal::I32(x), ConstVal::I32(y)) = (a, b) else {
            return None;
        };
        let result = match op {
            BinaryOp::BitAnd => x & y,
            BinaryOp::BitOr => x | y,
            BinaryOp::BitXor => x ^ y,
            BinaryOp::BitShl => x.wrapping_shl(y as u32),
            BinaryOp::BitSar => x.wrapping_shr(y as u32),
            BinaryOp::BitShr => (x as u32).wrapping_shr(y as u32) as i32,
            BinaryOp::LogicalAnd => (x != 0 && y != 0) as i32,
            BinaryOp::LogicalOr => (x != 0 || y != 0) as i32,
            _ => return None,
        };
        return Some(ConstVal::I32(result));
    }
    match op {
        BinaryOp::TrueDiv => {
            let y = b.as_f64();
            if y == 0.0 {
                return None;
            }
            Some(ConstVal::F32((a.as_f64() / y) as f32))
        }
        BinaryOp::FloorDiv => {
            let y = b.as_f64();
            if y == 0.0 {
                return None;
            }
            Some(ConstVal::I32((a.as_f64() / y).floor() as i32))
        }
        _ => match (a, b) {
            (ConstVal::I32(x), ConstVal::I32(y)) => {
                let result = match op {
                    BinaryOp::Add => x.wrapping_add(y),
                    BinaryOp::Sub => x.wrapping_sub(y),
                    BinaryOp::Mul => x.wrapping_mul(y),
                    BinaryOp::Mod => x.checked_rem(y)?,
                    BinaryOp::Max => x.max(y),
                    BinaryOp::Min => x.min(y),
                    _ => return None,
                };
                Some(ConstVal::I32(result))
            }
            _ => {
                let (x, y) = (a.as_f64(), b.as_f64());
                let result = match op {
                    BinaryOp::Add => x + y,
                    BinaryOp::Sub => x - y,
                    BinaryOp::Mul => x * y,
                    BinaryOp::Mod => {
                        if y == 0.0 {
                            return None;
                        }
                        x % y
                    }
                    BinaryOp::Max => x.max(y),
                    BinaryOp::Min => x.min(y),
                    BinaryOp::Pow => x.powf(y),
                    BinaryOp::Atan2 => x.atan2(y),
                    _ => return None,
                };
                Some(ConstVal::F32(result as f32))
            }
        },
    }
}

fn fold_unary(op: UnaryOp, c: ConstVal) -> Option<ConstVal> {
    let result = match op {
        UnaryOp::Neg => match c {
            ConstVal::I32(x) => ConstVal::I32(x.wrapping_neg()),
            ConstVal::F32(x) => ConstVal::F32(-x),
        },
        UnaryOp::Abs => match c {
            ConstVal::I32(x) => ConstVal::I32(x.wrapping_abs()),
            ConstVal::F32(x) => ConstVal::F32(x.abs()),
        },
        UnaryOp::Sgn => ConstVal::I32(match c.as_f64().partial_cmp(&0.0)? {
            std::cmp::Ordering::Less => -1,
            std::cmp::Ordering::Equal => 0,
            std::cmp::Ordering::Greater => 1,
        }),
        UnaryOp::Floor => ConstVal::I32(c.as_f64().floor() as i32),
        UnaryOp::Ceil => ConstVal::I32(c.as_f64().ceil() as i32),
        UnaryOp::Round => ConstVal::I32(c.as_f64().round() as i32),
        UnaryOp::CastI32Value => ConstVal::I32(c.as_f64() as i32),
        UnaryOp::CastF32Value => ConstVal::F32(c.as_f64() as f32),
        UnaryOp::CastI32Bits => match c {
            ConstVal::I32(x) => ConstVal::I32(x),
            ConstVal::F32(x) => ConstVal::I32(x.to_bits() as i32),
        },
        UnaryOp::CastF32Bits => match c {
            ConstVal::I32(x) => ConstVal::F32(f32::from_bits(x as u32)),
            ConstVal::F32(x) => ConstVal::F32(x),
        },
        UnaryOp::BitNot => match c {
            ConstVal::I32(x) => ConstVal::I32(!x),
            ConstVal::F32(_) => return None,
        },
        UnaryOp::LogicNot => match c {
            ConstVal::I32(x) => ConstVal::I32((x == 0) as i32),
            ConstVal::F32(_) => return None,
        },
        UnaryOp::Sqrt => ConstVal::F32(c.as_f64().sqrt() as f32),
        UnaryOp::Rsqrt => ConstVal::F32((1.0 / c.as_f64().sqrt()) as f32),
        UnaryOp::Inv | UnaryOp::Rcp => ConstVal::F32((1.0 / c.as_f64()) as f32),
        UnaryOp::Sin => ConstVal::F32(c.as_f64().sin() as f32),
        UnaryOp::Asin => ConstVal::F32(c.as_f64().asin() as f32),
        UnaryOp::Cos => ConstVal::F32(c.as_f64().cos() as f32),
        UnaryOp::Acos => ConstVal::F32(c.as_f64().acos() as f32),
        UnaryOp::Tan => ConstVal::F32(c.as_f64().tan() as f32),
        UnaryOp::Tanh => ConstVal::F32(c.as_f64().tanh() as f32),
        UnaryOp::Exp => ConstVal::F32(c.as_f64().exp() as f32),
        UnaryOp::Log => ConstVal::F32(c.as_f64().ln() as f32),
    };
    Some(result)
}
