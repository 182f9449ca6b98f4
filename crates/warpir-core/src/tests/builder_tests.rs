use crate::builder::IrBuilder;
use crate::instructions::{AtomicOp, BinaryOp, StmtKind, UnaryOp};
use crate::types::PrimitiveType;

#[test]
fn test_binary_result_primitives() {
    let mut b = IrBuilder::new();
    let i = b.const_i32(1);
    let f = b.const_f32(2.0);

    let ii = b.binary(BinaryOp::Add, i, i).unwrap();
    assert_eq!(b.ret_prim(ii), Some(PrimitiveType::I32));

    let mixed = b.binary(BinaryOp::Add, i, f).unwrap();
    assert_eq!(b.ret_prim(mixed), Some(PrimitiveType::F32));

    let div = b.binary(BinaryOp::TrueDiv, i, i).unwrap();
    assert_eq!(b.ret_prim(div), Some(PrimitiveType::F32));

    let fdiv = b.binary(BinaryOp::FloorDiv, f, f).unwrap();
    assert_eq!(b.ret_prim(fdiv), Some(PrimitiveType::I32));

    let cmp = b.binary(BinaryOp::CmpLt, f, f).unwrap();
    assert_eq!(b.ret_prim(cmp), Some(PrimitiveType::I32));
}

#[test]
fn test_integer_only_ops_reject_f32() {
    let mut b = IrBuilder::new();
    let f = b.const_f32(1.0);
    assert!(b.binary(BinaryOp::BitAnd, f, f).is_err());
    assert!(b.unary(UnaryOp::LogicNot, f).is_err());
}

#[test]
fn test_convert_is_noop_on_matching_primitive() {
    let mut b = IrBuilder::new();
    let i = b.const_i32(3);
    assert_eq!(b.convert(i, PrimitiveType::I32).unwrap(), i);

    let as_f = b.convert(i, PrimitiveType::F32).unwrap();
    assert_ne!(as_f, i);
    assert_eq!(b.ret_prim(as_f), Some(PrimitiveType::F32));
}

#[test]
fn test_alloca_load_store_round_trip() {
    let mut b = IrBuilder::new();
    let slot = b.alloca(PrimitiveType::F32);
    let v = b.const_f32(1.5);
    b.local_store(slot, v);
    let loaded = b.local_load(slot).unwrap();
    assert_eq!(b.ret_prim(loaded), Some(PrimitiveType::F32));

    let module = b.finish().unwrap();
    assert_eq!(module.root.len(), 4);
}

#[test]
fn test_atomic_result_follows_destination() {
    let mut b = IrBuilder::new();
    let slot = b.alloca(PrimitiveType::I32);
    let one = b.const_i32(1);
    let old = b.atomic_op(AtomicOp::Add, slot, one).unwrap();
    assert_eq!(b.ret_prim(old), Some(PrimitiveType::I32));
}

#[test]
fn test_guard_nesting_builds_branch_arms() {
    let mut b = IrBuilder::new();
    let cond = b.const_i32(1);

    b.push_guard();
    b.const_f32(1.0);
    let then_block = b.pop_guard().unwrap();

    b.push_guard();
    let else_block = b.pop_guard().unwrap();

    b.if_stmt(cond, then_block, else_block);
    let module = b.finish().unwrap();

    assert_eq!(module.root.len(), 2);
    match &module.root.stmts[1].kind {
        StmtKind::If {
            true_branch,
            false_branch,
            ..
        } => {
            assert_eq!(true_branch.len(), 1);
            assert!(false_branch.is_empty());
        }
        other => panic!("expected if, got {:?}", other),
    }
}

#[test]
fn test_reserved_loop_id_supports_loop_index() {
    let mut b = IrBuilder::new();
    let n = b.const_i32(16);

    let loop_id = b.reserve_id();
    b.push_guard();
    let idx = b.loop_index(loop_id);
    assert_eq!(b.ret_prim(idx), Some(PrimitiveType::I32));
    let body = b.pop_guard().unwrap();
    b.range_for(loop_id, n, false, body);

    let module = b.finish().unwrap();
    assert_eq!(module.root.len(), 2);
    let range_for = &module.root.stmts[1];
    assert_eq!(range_for.id, loop_id);
    match &range_for.kind {
        StmtKind::RangeFor { body, .. } => match &body.stmts[0].kind {
            StmtKind::LoopIndex { loop_stmt } => assert_eq!(*loop_stmt, Some(loop_id)),
            other => panic!("expected loop_index, got {:?}", other),
        },
        other => panic!("expected range_for, got {:?}", other),
    }
}

#[test]
fn test_unclosed_guard_fails_finish() {
    let mut b = IrBuilder::new();
    b.push_guard();
    assert!(b.finish().is_err());
}

#[test]
fn test_pop_without_open_guard_fails() {
    let mut b = IrBuilder::new();
    assert!(b.pop_guard().is_err());
}

#[test]
fn test_ids_stay_monotonic_across_guards() {
    let mut b = IrBuilder::new();
    let a = b.const_i32(0);
    b.push_guard();
    let c = b.const_i32(1);
    let block = b.pop_guard().unwrap();
    b.while_stmt(block);
    let d = b.const_i32(2);

    assert!(a < c && c < d);
    let module = b.finish().unwrap();
    assert_eq!(module.id_bound(), 4);
}

#[test]
fn test_binary_on_missing_value_fails() {
    let mut b = IrBuilder::new();
    let slot = b.alloca(PrimitiveType::I32);
    let store = b.local_store(slot, slot);
    assert!(b.binary(BinaryOp::Add, store, store).is_err());
}
