use crate::block::Block;
use crate::instructions::{
    AtomicOp, BinaryOp, BuiltInInputKind, Stmt, StmtId, StmtKind, TextureFunctionKind, UnaryOp,
};
use crate::types::PrimitiveType;
use crate::visit::for_each_stmt;

fn stmt(id: u32, kind: StmtKind) -> Stmt {
    Stmt::new(StmtId(id), None, kind)
}

#[test]
fn test_effect_root_classification() {
    let store = stmt(
        0,
        StmtKind::GlobalStore {
            ptr: StmtId(1),
            value: StmtId(2),
        },
    );
    assert!(store.has_observable_effect());

    let atomic = stmt(
        1,
        StmtKind::AtomicOp {
            dest: StmtId(0),
            operand: StmtId(2),
            op: AtomicOp::Add,
        },
    );
    assert!(atomic.has_observable_effect());

    // Reads and pure arithmetic are only live through their consumers.
    assert!(!stmt(2, StmtKind::GlobalLoad { ptr: StmtId(0) }).has_observable_effect());
    assert!(!stmt(3, StmtKind::AtomicLoad { ptr: StmtId(0) }).has_observable_effect());
    assert!(!stmt(4, StmtKind::Rand).has_observable_effect());
    assert!(!stmt(
        5,
        StmtKind::BinaryOp {
            left: StmtId(0),
            right: StmtId(1),
            op: BinaryOp::Add,
        }
    )
    .has_observable_effect());

    assert!(stmt(6, StmtKind::Discard).has_observable_effect());
    assert!(stmt(7, StmtKind::Return { values: vec![] }).has_observable_effect());

    // Texture writes are effects; samples and loads are pure reads.
    let tex = |kind| StmtKind::TextureFunction {
        kind,
        texture: crate::resources::Texture::new(0, 2, false),
        args: vec![],
    };
    assert!(stmt(9, tex(TextureFunctionKind::Store)).has_observable_effect());
    assert!(!stmt(10, tex(TextureFunctionKind::Sample)).has_observable_effect());
    assert!(!stmt(
        11,
        StmtKind::FragmentDerivative {
            direction: crate::instructions::DerivativeDirection::X,
            operand: StmtId(0),
        }
    )
    .has_observable_effect());
    assert!(stmt(
        8,
        StmtKind::If {
            cond: StmtId(0),
            true_branch: Block::new(),
            false_branch: Block::new(),
        }
    )
    .has_observable_effect());
}

#[test]
fn test_pointer_classification() {
    assert!(stmt(0, StmtKind::Alloca).is_pointer());
    assert!(stmt(1, StmtKind::GlobalTemporary { slot: 0 }).is_pointer());
    assert!(!stmt(2, StmtKind::LocalLoad { ptr: StmtId(0) }).is_pointer());
}

#[test]
fn test_operand_enumeration_order() {
    let store = stmt(
        0,
        StmtKind::LocalStore {
            ptr: StmtId(4),
            value: StmtId(9),
        },
    );
    assert_eq!(store.operands(), vec![StmtId(4), StmtId(9)]);

    let tex = stmt(
        1,
        StmtKind::TextureFunction {
            kind: TextureFunctionKind::Sample,
            texture: crate::resources::Texture::new(0, 2, false),
            args: vec![StmtId(2), StmtId(3)],
        },
    );
    assert_eq!(tex.operands(), vec![StmtId(2), StmtId(3)]);

    assert!(stmt(2, StmtKind::Alloca).operands().is_empty());
}

#[test]
fn test_operand_rewrite() {
    let mut binary = stmt(
        0,
        StmtKind::BinaryOp {
            left: StmtId(1),
            right: StmtId(2),
            op: BinaryOp::Mul,
        },
    );
    binary.for_each_operand_mut(|id| *id = StmtId(id.0 + 10));
    assert_eq!(binary.operands(), vec![StmtId(11), StmtId(12)]);
}

#[test]
fn test_nested_block_access() {
    let mut body = Block::new();
    body.push(stmt(1, StmtKind::Continue));
    let range_for = stmt(
        0,
        StmtKind::RangeFor {
            range: StmtId(9),
            strictly_serialized: false,
            is_parallel: false,
            body,
        },
    );
    assert_eq!(range_for.blocks().len(), 1);

    let if_stmt = stmt(
        2,
        StmtKind::If {
            cond: StmtId(0),
            true_branch: Block::new(),
            false_branch: Block::new(),
        },
    );
    assert_eq!(if_stmt.blocks().len(), 2);
    assert!(stmt(3, StmtKind::Rand).blocks().is_empty());
}

#[test]
fn test_walk_visits_nested_statements_in_preorder() {
    let mut inner = Block::new();
    inner.push(stmt(2, StmtKind::Continue));
    let mut root = Block::new();
    root.push(stmt(0, StmtKind::Rand));
    root.push(stmt(
        1,
        StmtKind::While { body: inner },
    ));

    let mut seen = Vec::new();
    for_each_stmt(&root, |s| seen.push(s.id.0));
    assert_eq!(seen, vec![0, 1, 2]);
}

#[test]
fn test_unary_result_rules() {
    use PrimitiveType::*;
    assert_eq!(UnaryOp::Round.result_prim(F32), Some(I32));
    assert_eq!(UnaryOp::CastF32Value.result_prim(I32), Some(F32));
    assert_eq!(UnaryOp::Neg.result_prim(I32), Some(I32));
    assert_eq!(UnaryOp::Abs.result_prim(F32), Some(F32));
    assert_eq!(UnaryOp::Sin.result_prim(I32), Some(F32));
    assert_eq!(UnaryOp::BitNot.result_prim(F32), None);
}

#[test]
fn test_atomic_op_maps_to_binary() {
    assert_eq!(AtomicOp::Add.to_binary(), BinaryOp::Add);
    assert_eq!(AtomicOp::BitXor.to_binary(), BinaryOp::BitXor);
    assert_eq!(AtomicOp::Min.to_binary(), BinaryOp::Min);
}

#[test]
fn test_texture_kind_result_shapes() {
    assert_eq!(TextureFunctionKind::Sample.num_result_components(), 4);
    assert_eq!(TextureFunctionKind::SampleCompare.num_result_components(), 1);
    assert!(!TextureFunctionKind::Store.has_result());
}

#[test]
fn test_statement_tree_survives_json_round_trip() {
    let mut body = Block::new();
    body.push(Stmt::new(
        StmtId(1),
        Some(PrimitiveType::I32),
        StmtKind::LoopIndex {
            loop_stmt: Some(StmtId(0)),
        },
    ));
    let original = stmt(
        0,
        StmtKind::RangeFor {
            range: StmtId(9),
            strictly_serialized: true,
            is_parallel: false,
            body,
        },
    );

    let text = serde_json::to_string(&original).unwrap();
    let decoded: Stmt = serde_json::from_str(&text).unwrap();

    assert_eq!(decoded.id, original.id);
    match decoded.kind {
        StmtKind::RangeFor {
            range,
            strictly_serialized,
            is_parallel,
            body,
        } => {
            assert_eq!(range, StmtId(9));
            assert!(strictly_serialized);
            assert!(!is_parallel);
            assert_eq!(body.len(), 1);
            assert_eq!(body.stmts[0].ret, Some(PrimitiveType::I32));
        }
        other => panic!("expected range_for, got {:?}", other),
    }
}

#[test]
fn test_builtin_input_shapes() {
    assert_eq!(
        BuiltInInputKind::FragCoord.primitive(),
        PrimitiveType::F32
    );
    assert_eq!(BuiltInInputKind::FragCoord.num_components(), 4);
    assert_eq!(
        BuiltInInputKind::VertexIndex.primitive(),
        PrimitiveType::I32
    );
    assert_eq!(BuiltInInputKind::InstanceIndex.num_components(), 1);
}
