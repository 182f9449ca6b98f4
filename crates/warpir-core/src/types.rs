use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two primitive kinds every kernel-side value decomposes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    I32,
    F32,
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveType::I32 => write!(f, "i32"),
            PrimitiveType::F32 => write!(f, "f32"),
        }
    }
}

/// Ordered member map of a struct type. Declaration order defines the
/// flattened storage layout, so equality is order-sensitive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructType {
    pub members: IndexMap<String, Type>,
}

impl StructType {
    pub fn new(members: IndexMap<String, Type>) -> Self {
        Self { members }
    }

    pub fn member(&self, name: &str) -> Option<&Type> {
        self.members.get(name)
    }

    /// Primitive offset of a member: prefix sum of earlier members'
    /// flattened lengths.
    pub fn member_offset(&self, name: &str) -> Option<usize> {
        let mut offset = 0;
        for (member_name, ty) in &self.members {
            if member_name == name {
                return Some(offset);
            }
            offset += ty.num_primitives();
        }
        None
    }
}

impl PartialEq for StructType {
    fn eq(&self, other: &Self) -> bool {
        self.members.len() == other.members.len()
            && self
                .members
                .iter()
                .zip(other.members.iter())
                .all(|((an, at), (bn, bt))| an == bn && at == bt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeCategory {
    Scalar,
    Vector,
    Matrix,
    Struct,
    Pointer,
    Void,
    Function,
    HostObjectReference,
}

/// Every representable kernel-side type.
///
/// Scalars, vectors, and matrices expose a canonical order-stable flattening
/// into primitives; that flattening is the unit of storage, loading, and
/// argument passing everywhere in the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Type {
    Scalar(PrimitiveType),
    Vector(PrimitiveType, u32),
    Matrix(PrimitiveType, u32, u32),
    Struct(StructType),
    Pointer(Box<Type>, bool),
    Void,
    Function,
    HostObjectReference(bool),
}

impl Type {
    pub fn pointer(pointee: Type, is_global: bool) -> Self {
        Type::Pointer(Box::new(pointee), is_global)
    }

    pub fn category(&self) -> TypeCategory {
        match self {
            Type::Scalar(_) => TypeCategory::Scalar,
            Type::Vector(_, _) => TypeCategory::Vector,
            Type::Matrix(_, _, _) => TypeCategory::Matrix,
            Type::Struct(_) => TypeCategory::Struct,
            Type::Pointer(_, _) => TypeCategory::Pointer,
            Type::Void => TypeCategory::Void,
            Type::Function => TypeCategory::Function,
            Type::HostObjectReference(_) => TypeCategory::HostObjectReference,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Type::Scalar(_))
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, Type::Vector(_, _))
    }

    pub fn is_matrix(&self) -> bool {
        matches!(self, Type::Matrix(_, _, _))
    }

    pub fn is_tensor(&self) -> bool {
        matches!(self, Type::Scalar(_) | Type::Vector(_, _) | Type::Matrix(_, _, _))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_, _))
    }

    /// The primitive kind of a tensor-like type.
    pub fn primitive(&self) -> Option<PrimitiveType> {
        match self {
            Type::Scalar(p) | Type::Vector(p, _) | Type::Matrix(p, _, _) => Some(*p),
            _ => None,
        }
    }

    /// Canonical flattening into an ordered list of primitives. Stable and
    /// order-preserving for a given type; struct flattening concatenates the
    /// members' flattenings in declaration order.
    pub fn primitives_list(&self) -> Vec<PrimitiveType> {
        match self {
            Type::Scalar(p) => vec![*p],
            Type::Vector(p, n) => vec![*p; *n as usize],
            Type::Matrix(p, rows, cols) => vec![*p; (*rows * *cols) as usize],
            Type::Struct(s) => s
                .members
                .values()
                .flat_map(|ty| ty.primitives_list())
                .collect(),
            Type::Pointer(pointee, _) => pointee.primitives_list(),
            Type::Void | Type::Function | Type::HostObjectReference(_) => vec![],
        }
    }

    pub fn num_primitives(&self) -> usize {
        match self {
            Type::Scalar(_) => 1,
            Type::Vector(_, n) => *n as usize,
            Type::Matrix(_, rows, cols) => (*rows * *cols) as usize,
            Type::Struct(s) => s.members.values().map(|ty| ty.num_primitives()).sum(),
            Type::Pointer(pointee, _) => pointee.num_primitives(),
            Type::Void | Type::Function | Type::HostObjectReference(_) => 0,
        }
    }

    /// Two tensor-like shapes match when their dimensions agree exactly.
    /// Scalar-with-tensor broadcast happens above the type system, in the
    /// builtin-op layer, never here.
    pub fn same_shape(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Scalar(_), Type::Scalar(_)) => true,
            (Type::Vector(_, a), Type::Vector(_, b)) => a == b,
            (Type::Matrix(_, ar, ac), Type::Matrix(_, br, bc)) => ar == br && ac == bc,
            (Type::Struct(a), Type::Struct(b)) => {
                a.members.len() == b.members.len()
                    && a.members
                        .iter()
                        .zip(b.members.iter())
                        .all(|((an, at), (bn, bt))| an == bn && at.same_shape(bt))
            }
            _ => false,
        }
    }

    /// Same tensor shape with the primitive kind replaced.
    pub fn with_primitive(&self, prim: PrimitiveType) -> Option<Type> {
        match self {
            Type::Scalar(_) => Some(Type::Scalar(prim)),
            Type::Vector(_, n) => Some(Type::Vector(prim, *n)),
            Type::Matrix(_, r, c) => Some(Type::Matrix(prim, *r, *c)),
            _ => None,
        }
    }
}

/// Structural equality on shape and primitive kind. Pointer, Function, and
/// HostObjectReference types only ever equal themselves by identity, which a
/// structural comparison cannot witness, so those arms are always false.
impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Type::Scalar(a), Type::Scalar(b)) => a == b,
            (Type::Vector(ap, an), Type::Vector(bp, bn)) => ap == bp && an == bn,
            (Type::Matrix(ap, ar, ac), Type::Matrix(bp, br, bc)) => {
                ap == bp && ar == br && ac == bc
            }
            (Type::Struct(a), Type::Struct(b)) => a == b,
            (Type::Void, Type::Void) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Scalar(p) => write!(f, "{}", p),
            Type::Vector(p, n) => write!(f, "vec{}<{}>", n, p),
            Type::Matrix(p, rows, cols) => write!(f, "mat{}x{}<{}>", rows, cols, p),
            Type::Struct(s) => {
                write!(f, "struct {{ ")?;
                for (i, (name, ty)) in s.members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, ty)?;
                }
                write!(f, " }}")
            }
            Type::Pointer(pointee, true) => write!(f, "global_ptr<{}>", pointee),
            Type::Pointer(pointee, false) => write!(f, "ptr<{}>", pointee),
            Type::Void => write!(f, "void"),
            Type::Function => write!(f, "function"),
            Type::HostObjectReference(true) => write!(f, "host_ref<static>"),
            Type::HostObjectReference(false) => write!(f, "host_ref"),
        }
    }
}
