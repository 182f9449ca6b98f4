use crate::types::{PrimitiveType, StructType, Type};
use indexmap::IndexMap;

fn vec2f() -> Type {
    Type::Vector(PrimitiveType::F32, 2)
}

fn point_struct() -> Type {
    let mut members = IndexMap::new();
    members.insert("pos".to_string(), vec2f());
    members.insert("id".to_string(), Type::Scalar(PrimitiveType::I32));
    Type::Struct(StructType::new(members))
}

#[test]
fn test_scalar_equality() {
    assert_eq!(
        Type::Scalar(PrimitiveType::I32),
        Type::Scalar(PrimitiveType::I32)
    );
    assert_ne!(
        Type::Scalar(PrimitiveType::I32),
        Type::Scalar(PrimitiveType::F32)
    );
}

#[test]
fn test_vector_equality_requires_width_and_primitive() {
    assert_eq!(vec2f(), Type::Vector(PrimitiveType::F32, 2));
    assert_ne!(vec2f(), Type::Vector(PrimitiveType::F32, 3));
    assert_ne!(vec2f(), Type::Vector(PrimitiveType::I32, 2));
    assert_ne!(vec2f(), Type::Scalar(PrimitiveType::F32));
}

#[test]
fn test_matrix_equality_requires_shape() {
    let m23 = Type::Matrix(PrimitiveType::F32, 2, 3);
    assert_eq!(m23, Type::Matrix(PrimitiveType::F32, 2, 3));
    assert_ne!(m23, Type::Matrix(PrimitiveType::F32, 3, 2));
}

#[test]
fn test_struct_member_order_matters() {
    let mut ab = IndexMap::new();
    ab.insert("a".to_string(), Type::Scalar(PrimitiveType::I32));
    ab.insert("b".to_string(), Type::Scalar(PrimitiveType::F32));
    let mut ba = IndexMap::new();
    ba.insert("b".to_string(), Type::Scalar(PrimitiveType::F32));
    ba.insert("a".to_string(), Type::Scalar(PrimitiveType::I32));

    let ab = Type::Struct(StructType::new(ab.clone()));
    let ab2 = ab.clone();
    let ba = Type::Struct(StructType::new(ba));

    assert_eq!(ab, ab2);
    assert_ne!(ab, ba);
}

#[test]
fn test_pointer_types_never_compare_equal() {
    let p = Type::pointer(Type::Scalar(PrimitiveType::F32), true);
    let q = Type::pointer(Type::Scalar(PrimitiveType::F32), true);
    assert_ne!(p, q);
    assert_ne!(p.clone(), p);
    assert_ne!(Type::Function, Type::Function);
    assert_ne!(
        Type::HostObjectReference(false),
        Type::HostObjectReference(false)
    );
}

#[test]
fn test_flattening_is_declaration_order() {
    use PrimitiveType::*;
    assert_eq!(point_struct().primitives_list(), vec![F32, F32, I32]);
    assert_eq!(
        Type::Matrix(F32, 2, 3).primitives_list(),
        vec![F32, F32, F32, F32, F32, F32]
    );
    assert_eq!(Type::Void.primitives_list(), Vec::<PrimitiveType>::new());
}

#[test]
fn test_num_primitives() {
    assert_eq!(Type::Scalar(PrimitiveType::I32).num_primitives(), 1);
    assert_eq!(vec2f().num_primitives(), 2);
    assert_eq!(Type::Matrix(PrimitiveType::F32, 3, 3).num_primitives(), 9);
    assert_eq!(point_struct().num_primitives(), 3);
}

#[test]
fn test_member_offsets_are_prefix_sums() {
    let ty = match point_struct() {
        Type::Struct(s) => s,
        _ => unreachable!(),
    };
    assert_eq!(ty.member_offset("pos"), Some(0));
    assert_eq!(ty.member_offset("id"), Some(2));
    assert_eq!(ty.member_offset("missing"), None);
}

#[test]
fn test_same_shape_ignores_primitive() {
    assert!(vec2f().same_shape(&Type::Vector(PrimitiveType::I32, 2)));
    assert!(!vec2f().same_shape(&Type::Vector(PrimitiveType::F32, 3)));
    assert!(Type::Scalar(PrimitiveType::I32).same_shape(&Type::Scalar(PrimitiveType::F32)));
    assert!(!vec2f().same_shape(&Type::Scalar(PrimitiveType::F32)));
}

#[test]
fn test_with_primitive() {
    assert_eq!(
        vec2f().with_primitive(PrimitiveType::I32),
        Some(Type::Vector(PrimitiveType::I32, 2))
    );
    assert_eq!(point_struct().with_primitive(PrimitiveType::I32), None);
}

#[test]
fn test_display() {
    assert_eq!(vec2f().to_string(), "vec2<f32>");
    assert_eq!(
        Type::Matrix(PrimitiveType::I32, 4, 4).to_string(),
        "mat4x4<i32>"
    );
    assert_eq!(
        point_struct().to_string(),
        "struct { pos: vec2<f32>, id: i32 }"
    );
    assert_eq!(
        Type::pointer(Type::Scalar(PrimitiveType::F32), true).to_string(),
        "global_ptr<f32>"
    );
}
