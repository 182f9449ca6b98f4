use crate::instructions::StmtId;
use crate::types::{PrimitiveType, StructType, Type};
use crate::{IrError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A compile-time primitive constant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ConstVal {
    I32(i32),
    F32(f32),
}

impl ConstVal {
    pub fn primitive(self) -> PrimitiveType {
        match self {
            ConstVal::I32(_) => PrimitiveType::I32,
            ConstVal::F32(_) => PrimitiveType::F32,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            ConstVal::I32(v) => v as f64,
            ConstVal::F32(v) => v as f64,
        }
    }

    pub fn as_i32(self) -> Option<i32> {
        match self {
            ConstVal::I32(v) => Some(v),
            ConstVal::F32(_) => None,
        }
    }

    /// Static conditions treat any nonzero constant as true.
    pub fn is_truthy(self) -> bool {
        match self {
            ConstVal::I32(v) => v != 0,
            ConstVal::F32(v) => v != 0.0,
        }
    }
}

impl fmt::Display for ConstVal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstVal::I32(v) => write!(f, "{}", v),
            ConstVal::F32(v) => write!(f, "{:?}", v),
        }
    }
}

/// A typed frontend value: one IR statement per flattened primitive, plus a
/// parallel list of compile-time constants. The value is a compile-time
/// constant exactly when the constants list covers every primitive.
///
/// Values are immutable; all vector/matrix/struct algebra below produces new
/// values from slices of existing ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Value {
    pub ty: Type,
    pub stmts: Vec<StmtId>,
    pub constants: Vec<ConstVal>,
}

impl Value {
    pub fn new(ty: Type, stmts: Vec<StmtId>, constants: Vec<ConstVal>) -> Self {
        Self {
            ty,
            stmts,
            constants,
        }
    }

    pub fn void() -> Self {
        Self::new(Type::Void, vec![], vec![])
    }

    pub fn scalar(prim: PrimitiveType, stmt: StmtId) -> Self {
        Self::new(Type::Scalar(prim), vec![stmt], vec![])
    }

    pub fn scalar_const(stmt: StmtId, value: ConstVal) -> Self {
        Self::new(Type::Scalar(value.primitive()), vec![stmt], vec![value])
    }

    pub fn is_compile_time_constant(&self) -> bool {
        self.constants.len() == self.stmts.len()
    }

    /// The constant behind a single-primitive compile-time-constant value.
    pub fn scalar_const_val(&self) -> Option<ConstVal> {
        if self.stmts.len() == 1 && self.is_compile_time_constant() {
            Some(self.constants[0])
        } else {
            None
        }
    }

    /// Compile-time i32, as required for tensor indices and static bounds.
    pub fn const_i32(&self) -> Option<i32> {
        match (self.ty.is_scalar(), self.scalar_const_val()) {
            (true, Some(ConstVal::I32(v))) => Some(v),
            _ => None,
        }
    }

    pub fn num_primitives(&self) -> usize {
        self.stmts.len()
    }

    pub fn is_pointer(&self) -> bool {
        self.ty.is_pointer()
    }

    /// The type stored behind a pointer value, or the type itself otherwise.
    pub fn stored_type(&self) -> &Type {
        match &self.ty {
            Type::Pointer(pointee, _) => pointee,
            other => other,
        }
    }
}

/// A contiguous primitive slice of `value` reinterpreted as `ty`. Constants
/// travel with the slice only when the source covers it.
fn slice_value(value: &Value, offset: usize, len: usize, ty: Type) -> Value {
    let stmts = value.stmts[offset..offset + len].to_vec();
    let constants = if value.is_compile_time_constant() {
        value.constants[offset..offset + len].to_vec()
    } else {
        vec![]
    };
    Value::new(ty, stmts, constants)
}

/// Keeps pointer-ness when slicing through a pointer value: a slice of a
/// pointer is a pointer to the slice.
fn rewrap(source: &Type, inner: Type) -> Type {
    match source {
        Type::Pointer(_, is_global) => Type::pointer(inner, *is_global),
        _ => inner,
    }
}

/// One component of a vector value, as a scalar.
pub fn vector_component(value: &Value, index: usize) -> Result<Value> {
    match value.stored_type() {
        Type::Vector(prim, n) => {
            if index >= *n as usize {
                return Err(IrError::TypeError(format!(
                    "component {} out of range for {}",
                    index, value.ty
                )));
            }
            let ty = rewrap(&value.ty, Type::Scalar(*prim));
            Ok(slice_value(value, index, 1, ty))
        }
        other => Err(IrError::TypeError(format!(
            "cannot take a component of {}",
            other
        ))),
    }
}

/// Reorder/duplicate vector components (swizzling). A single index yields a
/// scalar.
pub fn select_components(value: &Value, indices: &[usize]) -> Result<Value> {
    let (prim, n) = match value.stored_type() {
        Type::Vector(prim, n) => (*prim, *n as usize),
        other => {
            return Err(IrError::TypeError(format!(
                "cannot swizzle {}",
                other
            )))
        }
    };
    for &i in indices {
        if i >= n {
            return Err(IrError::TypeError(format!(
                "component {} out of range for {}",
                i, value.ty
            )));
        }
    }
    let stmts: Vec<StmtId> = indices.iter().map(|&i| value.stmts[i]).collect();
    let constants = if value.is_compile_time_constant() {
        indices.iter().map(|&i| value.constants[i]).collect()
    } else {
        vec![]
    };
    let ty = if indices.len() == 1 {
        Type::Scalar(prim)
    } else {
        Type::Vector(prim, indices.len() as u32)
    };
    Ok(Value::new(rewrap(&value.ty, ty), stmts, constants))
}

/// One row of a matrix value, as a vector.
pub fn matrix_row(value: &Value, row: usize) -> Result<Value> {
    match value.stored_type() {
        Type::Matrix(prim, rows, cols) => {
            if row >= *rows as usize {
                return Err(IrError::TypeError(format!(
                    "row {} out of range for {}",
                    row, value.ty
                )));
            }
            let cols = *cols as usize;
            let ty = rewrap(&value.ty, Type::Vector(*prim, cols as u32));
            Ok(slice_value(value, row * cols, cols, ty))
        }
        other => Err(IrError::TypeError(format!(
            "cannot take a row of {}",
            other
        ))),
    }
}

/// One entry of a matrix value, as a scalar.
pub fn matrix_entry(value: &Value, row: usize, col: usize) -> Result<Value> {
    match value.stored_type() {
        Type::Matrix(prim, rows, cols) => {
            if row >= *rows as usize || col >= *cols as usize {
                return Err(IrError::TypeError(format!(
                    "entry ({}, {}) out of range for {}",
                    row, col, value.ty
                )));
            }
            let offset = row * *cols as usize + col;
            let ty = rewrap(&value.ty, Type::Scalar(*prim));
            Ok(slice_value(value, offset, 1, ty))
        }
        other => Err(IrError::TypeError(format!(
            "cannot index into {}",
            other
        ))),
    }
}

/// Transpose of a matrix value, reusing the operand statements.
pub fn transpose(value: &Value) -> Result<Value> {
    match &value.ty {
        Type::Matrix(prim, rows, cols) => {
            let (rows, cols) = (*rows as usize, *cols as usize);
            let mut stmts = Vec::with_capacity(rows * cols);
            let mut constants = Vec::new();
            let is_const = value.is_compile_time_constant();
            for c in 0..cols {
                for r in 0..rows {
                    stmts.push(value.stmts[r * cols + c]);
                    if is_const {
                        constants.push(value.constants[r * cols + c]);
                    }
                }
            }
            Ok(Value::new(
                Type::Matrix(*prim, cols as u32, rows as u32),
                stmts,
                constants,
            ))
        }
        other => Err(IrError::TypeError(format!("cannot transpose {}", other))),
    }
}

/// Assemble a vector from scalar parts of one primitive kind.
pub fn compose_vector(parts: &[Value]) -> Result<Value> {
    let prim = match parts.first().map(|v| &v.ty) {
        Some(Type::Scalar(p)) => *p,
        _ => {
            return Err(IrError::TypeError(
                "vector literals are built from scalars".into(),
            ))
        }
    };
    let mut stmts = Vec::with_capacity(parts.len());
    let mut constants = Vec::new();
    for part in parts {
        match &part.ty {
            Type::Scalar(p) if *p == prim => {}
            other => {
                return Err(IrError::TypeError(format!(
                    "mixed element type {} in vector literal",
                    other
                )))
            }
        }
        stmts.push(part.stmts[0]);
        constants.extend(part.constants.iter().copied());
    }
    let constants = if constants.len() == stmts.len() {
        constants
    } else {
        vec![]
    };
    Ok(Value::new(
        Type::Vector(prim, parts.len() as u32),
        stmts,
        constants,
    ))
}

/// Assemble a matrix from row vectors of equal width.
pub fn compose_matrix(rows: &[Value]) -> Result<Value> {
    let (prim, cols) = match rows.first().map(|v| &v.ty) {
        Some(Type::Vector(p, n)) => (*p, *n),
        _ => {
            return Err(IrError::TypeError(
                "matrix literals are built from row vectors".into(),
            ))
        }
    };
    let mut stmts = Vec::new();
    let mut constants = Vec::new();
    for row in rows {
        match &row.ty {
            Type::Vector(p, n) if *p == prim && *n == cols => {}
            other => {
                return Err(IrError::TypeError(format!(
                    "mismatched row type {} in matrix literal",
                    other
                )))
            }
        }
        stmts.extend(row.stmts.iter().copied());
        constants.extend(row.constants.iter().copied());
    }
    let constants = if constants.len() == stmts.len() {
        constants
    } else {
        vec![]
    };
    Ok(Value::new(
        Type::Matrix(prim, rows.len() as u32, cols),
        stmts,
        constants,
    ))
}

/// Assemble a struct value; member order defines the flattened layout.
pub fn compose_struct(members: Vec<(String, Value)>) -> Value {
    let mut member_types = IndexMap::new();
    let mut stmts = Vec::new();
    let mut constants = Vec::new();
    for (name, value) in &members {
        member_types.insert(name.clone(), value.ty.clone());
        stmts.extend(value.stmts.iter().copied());
        constants.extend(value.constants.iter().copied());
    }
    let constants = if constants.len() == stmts.len() {
        constants
    } else {
        vec![]
    };
    Value::new(
        Type::Struct(StructType::new(member_types)),
        stmts,
        constants,
    )
}

/// Extract one member of a struct value by name.
pub fn struct_member(value: &Value, name: &str) -> Option<Value> {
    let (member_ty, offset) = match (&value.ty, value.stored_type()) {
        (_, Type::Struct(s)) => (s.member(name)?.clone(), s.member_offset(name)?),
        _ => return None,
    };
    let len = member_ty.num_primitives();
    let ty = match &value.ty {
        Type::Pointer(_, is_global) => Type::pointer(member_ty, *is_global),
        _ => member_ty,
    };
    Some(slice_value(value, offset, len, ty))
}
