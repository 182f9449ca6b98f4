use anyhow::{anyhow, bail, Result};
use std::collections::HashMap;
use warpir_core::visit::for_each_stmt;
use warpir_core::{
    Block, ConstVal, Module, OffloadKind, OffloadedModule, StmtId, StmtKind, TripCount,
};

/// Splits a lowered module into the offloaded modules the runtime launches
/// in order.
///
/// Every top-level parallel loop becomes its own compute module with the
/// loop header dropped; the statements between parallel loops become serial
/// modules. A serial module that never writes global state is discarded.
pub fn offload_module(module: Module) -> Result<Vec<OffloadedModule>> {
    let mut gtemp_slots: HashMap<StmtId, u32> = HashMap::new();
    let mut const_vals: HashMap<StmtId, ConstVal> = HashMap::new();
    let mut load_ptrs: HashMap<StmtId, StmtId> = HashMap::new();
    for_each_stmt(&module.root, |stmt| match stmt.kind {
        StmtKind::GlobalTemporary { slot } => {
            gtemp_slots.insert(stmt.id, slot);
        }
        StmtKind::Const { value } => {
            const_vals.insert(stmt.id, value);
        }
        // Atomicity promotion may have rewritten a spilled trip-count load.
        StmtKind::GlobalTemporaryLoad { ptr } | StmtKind::AtomicLoad { ptr } => {
            load_ptrs.insert(stmt.id, ptr);
        }
        _ => {}
    });

    let mut modules: Vec<OffloadedModule> = Vec::new();
    let mut serial = Block::new();

    for stmt in module.root {
        let stmt_id = stmt.id;
        match stmt.kind {
            StmtKind::RangeFor {
                range,
                body,
                is_parallel: true,
                ..
            } => {
                flush_serial(&mut serial, &mut modules);
                let trip_count = if let Some(&value) = const_vals.get(&range) {
                    match value {
                        ConstVal::I32(n) => TripCount::Constant(n),
                        ConstVal::F32(_) => {
                            bail!("parallel loop range {} is not an i32 constant", range)
                        }
                    }
                } else if let Some(ptr) = load_ptrs.get(&range) {
                    let slot = gtemp_slots.get(ptr).copied().ok_or_else(|| {
                        anyhow!("range load {} does not read a temporary slot", range)
                    })?;
                    TripCount::TemporarySlot(slot)
                } else {
                    bail!("parallel loop range {} was not spilled to a temporary slot", range)
                };
                let mut block = body;
                clear_loop_indices(&mut block, stmt_id);
                modules.push(OffloadedModule::new(
                    OffloadKind::Compute { trip_count },
                    block,
                ));
            }
            StmtKind::VertexFor { body } => {
                flush_serial(&mut serial, &mut modules);
                modules.push(OffloadedModule::new(OffloadKind::Vertex, body));
            }
            StmtKind::FragmentFor { body } => {
                flush_serial(&mut serial, &mut modules);
                modules.push(OffloadedModule::new(OffloadKind::Fragment, body));
            }
            _ => serial.push(stmt),
        }
    }
    flush_serial(&mut serial, &mut modules);
    Ok(modules)
}

fn flush_serial(serial: &mut Block, modules: &mut Vec<OffloadedModule>) {
    if serial.is_empty() {
        return;
    }
    let block = std::mem::take(serial);
    if serial_writes_global_state(&block) {
        modules.push(OffloadedModule::new(OffloadKind::Serial, block));
    }
}

fn serial_writes_global_state(block: &Block) -> bool {
    for stmt in block {
        let writes = match &stmt.kind {
            StmtKind::GlobalStore { .. }
            | StmtKind::GlobalTemporaryStore { .. }
            | StmtKind::AtomicOp { .. }
            | StmtKind::AtomicStore { .. }
            | StmtKind::Return { .. } => true,
            StmtKind::TextureFunction { kind, .. } => !kind.has_result(),
            _ => false,
        };
        if writes {
            return true;
        }
        for nested in stmt.blocks() {
            if serial_writes_global_state(nested) {
                return true;
            }
        }
    }
    false
}

/// Indexes of the dropped loop header now mean the module's own invocation
/// index.
fn clear_loop_indices(block: &mut Block, loop_id: StmtId) {
    for stmt in &mut block.stmts {
        if let StmtKind::LoopIndex { loop_stmt } = &mut stmt.kind {
            if *loop_stmt == Some(loop_id) {
                *loop_stmt = None;
            }
        }
        for nested in stmt.blocks_mut() {
            clear_loop_indices(nested, loop_id);
        }
    }
}
