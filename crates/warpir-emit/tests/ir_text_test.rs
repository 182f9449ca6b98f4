use pretty_assertions::assert_eq;
use warpir_core::{
    Block, ConstVal, Field, OffloadKind, OffloadedModule, PrimitiveType, Stmt, StmtId, StmtKind,
    TripCount, Type,
};
use warpir_emit::{EmitContext, Emittable, EmitterConfig, IrEmitter};

fn stmt(id: u32, ret: Option<PrimitiveType>, kind: StmtKind) -> Stmt {
    Stmt::new(StmtId(id), ret, kind)
}

/// compute(16): f[invocation] = 1.0
fn fill_module() -> OffloadedModule {
    let mut body = Block::new();
    body.push(stmt(
        0,
        Some(PrimitiveType::I32),
        StmtKind::LoopIndex { loop_stmt: None },
    ));
    body.push(stmt(
        1,
        Some(PrimitiveType::F32),
        StmtKind::GlobalPtr {
            field: Field::new(0, 0, vec![16], Type::Scalar(PrimitiveType::F32)),
            indices: vec![StmtId(0)],
            element_offset: 0,
        },
    ));
    body.push(stmt(
        2,
        Some(PrimitiveType::F32),
        StmtKind::Const {
            value: ConstVal::F32(1.0),
        },
    ));
    body.push(stmt(
        3,
        None,
        StmtKind::GlobalStore {
            ptr: StmtId(1),
            value: StmtId(2),
        },
    ));
    OffloadedModule::new(
        OffloadKind::Compute {
            trip_count: TripCount::Constant(16),
        },
        body,
    )
}

#[test]
fn test_compute_module_text() {
    let emitter = IrEmitter::new(EmitterConfig::plain());
    let text = emitter.module_text(&fill_module()).unwrap();
    let expected = "\
compute(16) {
  %0 = loop_index : i32
  %1 = global_ptr field(tree 0, [16], f32)[%0] : f32
  %2 = const 1.0 : f32
  %3 = global_store %1, %2
}
";
    assert_eq!(text, expected);
}

#[test]
fn test_if_else_text() {
    let mut true_branch = Block::new();
    true_branch.push(stmt(
        2,
        Some(PrimitiveType::I32),
        StmtKind::Const {
            value: ConstVal::I32(1),
        },
    ));
    let mut false_branch = Block::new();
    false_branch.push(stmt(
        3,
        Some(PrimitiveType::I32),
        StmtKind::Const {
            value: ConstVal::I32(2),
        },
    ));
    let mut root = Block::new();
    root.push(stmt(
        0,
        Some(PrimitiveType::I32),
        StmtKind::Const {
            value: ConstVal::I32(0),
        },
    ));
    root.push(stmt(
        1,
        None,
        StmtKind::If {
            cond: StmtId(0),
            true_branch,
            false_branch,
        },
    ));
    let module = OffloadedModule::new(OffloadKind::Serial, root);

    let text = IrEmitter::new(EmitterConfig::plain())
        .module_text(&module)
        .unwrap();
    let expected = "\
serial {
  %0 = const 0 : i32
  %1 = if %0 {
    %2 = const 1 : i32
  } else {
    %3 = const 2 : i32
  }
}
";
    assert_eq!(text, expected);
}

#[test]
fn test_loop_header_and_nesting() {
    let mut body = Block::new();
    body.push(stmt(
        2,
        Some(PrimitiveType::I32),
        StmtKind::LoopIndex {
            loop_stmt: Some(StmtId(1)),
        },
    ));
    let mut root = Block::new();
    root.push(stmt(
        0,
        Some(PrimitiveType::I32),
        StmtKind::Const {
            value: ConstVal::I32(4),
        },
    ));
    root.push(stmt(
        1,
        None,
        StmtKind::RangeFor {
            range: StmtId(0),
            strictly_serialized: false,
            is_parallel: false,
            body,
        },
    ));
    let module = OffloadedModule::new(OffloadKind::Serial, root);

    let text = IrEmitter::new(EmitterConfig::plain())
        .module_text(&module)
        .unwrap();
    let expected = "\
serial {
  %0 = const 4 : i32
  %1 = range_for %0 {
    %2 = loop_index %1 : i32
  }
}
";
    assert_eq!(text, expected);
}

#[test]
fn test_type_suffixes_can_be_disabled() {
    let mut config = EmitterConfig::plain();
    config.include_types = false;

    let text = IrEmitter::new(config).module_text(&fill_module()).unwrap();
    assert!(!text.contains(" : "));
    assert!(text.contains("%2 = const 1.0\n"));
}

#[test]
fn test_runtime_trip_count_header() {
    let module = OffloadedModule::new(
        OffloadKind::Compute {
            trip_count: TripCount::TemporarySlot(0),
        },
        Block::new(),
    );
    let text = IrEmitter::new(EmitterConfig::plain())
        .module_text(&module)
        .unwrap();
    assert_eq!(text, "compute(slot 0) {\n}\n");
}

#[test]
fn test_emittable_uses_default_config() {
    let mut context = EmitContext::new();
    context.use_colors = false;

    let mut buffer = Vec::new();
    fill_module().emit(&mut buffer, &mut context).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    assert!(text.starts_with("compute(16) {"));
}
