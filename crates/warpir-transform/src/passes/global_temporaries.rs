use super::{IdReplacements, Pass};
use anyhow::{anyhow, bail, Result};
use std::collections::HashMap;
use warpir_core::visit::for_each_stmt;
use warpir_core::{Block, Module, PrimitiveType, Stmt, StmtId, StmtKind};

/// Promotes values that cross the serial/parallel execution boundary into
/// the flat global-temporary address space.
///
/// Three stages share the module's slot allocator:
/// 1. An alloca accessed from a different offload segment than the one that
///    declared it becomes slot-backed. Every rewritten access materializes
///    its own GlobalTemporary pointer, so after offloading each module holds
///    a local copy of the pointer statement.
/// 2. A serial-computed value consumed inside a parallel loop is stored to a
///    slot right after its definition and loaded back before each use.
/// 3. A parallel loop's trip count must survive the split between the loop
///    header and the code that computed it, so anything that is not already
///    a constant or a slot load is spilled through a fresh slot.
pub struct InsertGlobalTemporaries;

impl Pass for InsertGlobalTemporaries {
    fn name(&self) -> &'static str {
        "insert-global-temporaries"
    }

    fn run(&mut self, module: &mut Module) -> Result<()> {
        let mut root = std::mem::take(&mut module.root);

        let mut scan = AllocaScan::new(module);
        scan.scan_block(&root);
        let AllocaScan {
            slots,
            alloca_prims,
            ..
        } = scan;
        if !slots.is_empty() {
            let mut replacements = IdReplacements::new();
            root = rewrite_alloca_accesses(root, &slots, &alloca_prims, &mut replacements, module)?;
            replacements.apply(&mut root);
        }

        let prims = collect_prims(&root);
        let spills = identify_serial_spills(&root, module);
        if !spills.is_empty() {
            root = spill_serial_values(root, &spills, &prims, false, module)?;
        }

        root = spill_loop_ranges(root, module)?;

        module.root = root;
        Ok(())
    }
}

fn collect_prims(root: &Block) -> HashMap<StmtId, PrimitiveType> {
    let mut prims = HashMap::new();
    for_each_stmt(root, |stmt| {
        if let Some(prim) = stmt.ret {
            prims.insert(stmt.id, prim);
        }
    });
    prims
}

fn is_parallel_region(kind: &StmtKind) -> bool {
    matches!(
        kind,
        StmtKind::RangeFor {
            is_parallel: true,
            ..
        } | StmtKind::VertexFor { .. }
            | StmtKind::FragmentFor { .. }
    )
}

/// Stage 1 identification. `segment_allocas` holds the allocas declared in
/// the current offload segment; crossing a parallel-region boundary clears
/// it in both directions, so an access that finds its alloca missing is an
/// access from a different segment.
struct AllocaScan<'m> {
    module: &'m mut Module,
    segment_allocas: std::collections::HashSet<StmtId>,
    alloca_prims: HashMap<StmtId, PrimitiveType>,
    slots: HashMap<StmtId, u32>,
}

impl<'m> AllocaScan<'m> {
    fn new(module: &'m mut Module) -> Self {
        Self {
            module,
            segment_allocas: Default::default(),
            alloca_prims: HashMap::new(),
            slots: HashMap::new(),
        }
    }

    fn maybe_allocate(&mut self, target: StmtId) {
        if !self.alloca_prims.contains_key(&target)
            || self.segment_allocas.contains(&target)
            || self.slots.contains_key(&target)
        {
            return;
        }
        let slot = self.module.alloc_temporary_slot();
        self.slots.insert(target, slot);
    }

    fn scan_block(&mut self, block: &Block) {
        for stmt in block {
            match &stmt.kind {
                StmtKind::Alloca => {
                    if let Some(prim) = stmt.ret {
                        self.alloca_prims.insert(stmt.id, prim);
                    }
                    self.segment_allocas.insert(stmt.id);
                }
                &StmtKind::LocalLoad { ptr } | &StmtKind::LocalStore { ptr, .. } => {
                    self.maybe_allocate(ptr)
                }
                &StmtKind::AtomicOp { dest, .. } => self.maybe_allocate(dest),
                &StmtKind::AtomicLoad { ptr } | &StmtKind::AtomicStore { ptr, .. } => {
                    self.maybe_allocate(ptr)
                }
                _ => {}
            }
            if is_parallel_region(&stmt.kind) {
                self.segment_allocas.clear();
                for nested in stmt.blocks() {
                    self.scan_block(nested);
                }
                self.segment_allocas.clear();
            } else {
                for nested in stmt.blocks() {
                    self.scan_block(nested);
                }
            }
        }
    }
}

/// Stage 1 rewrite. The alloca statements themselves stay behind (now
/// unreferenced); each access becomes a fresh pointer plus the slot-space
/// access of the same flavor.
fn rewrite_alloca_accesses(
    block: Block,
    slots: &HashMap<StmtId, u32>,
    alloca_prims: &HashMap<StmtId, PrimitiveType>,
    replacements: &mut IdReplacements,
    module: &mut Module,
) -> Result<Block> {
    let mut out = Block::new();
    let mut temp_ptr = |alloca: StmtId, out: &mut Block, module: &mut Module| -> Result<StmtId> {
        let slot = slots[&alloca];
        let prim = alloca_prims
            .get(&alloca)
            .copied()
            .ok_or_else(|| anyhow!("promoted alloca {} has no value kind", alloca))?;
        let id = module.alloc_id();
        out.push(Stmt::new(id, Some(prim), StmtKind::GlobalTemporary { slot }));
        Ok(id)
    };

    for mut stmt in block {
        match &stmt.kind {
            &StmtKind::LocalLoad { ptr } if slots.contains_key(&ptr) => {
                let gtemp = temp_ptr(ptr, &mut out, module)?;
                let load_id = module.alloc_id();
                out.push(Stmt::new(
                    load_id,
                    stmt.ret,
                    StmtKind::GlobalTemporaryLoad { ptr: gtemp },
                ));
                replacements.record(stmt.id, load_id);
            }
            &StmtKind::LocalStore { ptr, value } if slots.contains_key(&ptr) => {
                let gtemp = temp_ptr(ptr, &mut out, module)?;
                out.push(Stmt::new(
                    module.alloc_id(),
                    None,
                    StmtKind::GlobalTemporaryStore { ptr: gtemp, value },
                ));
            }
            &StmtKind::AtomicOp { dest, operand, op } if slots.contains_key(&dest) => {
                let gtemp = temp_ptr(dest, &mut out, module)?;
                let new_id = module.alloc_id();
                out.push(Stmt::new(
                    new_id,
                    stmt.ret,
                    StmtKind::AtomicOp {
                        dest: gtemp,
                        operand,
                        op,
                    },
                ));
                replacements.record(stmt.id, new_id);
            }
            &StmtKind::AtomicLoad { ptr } if slots.contains_key(&ptr) => {
                let gtemp = temp_ptr(ptr, &mut out, module)?;
                let new_id = module.alloc_id();
                out.push(Stmt::new(
                    new_id,
                    stmt.ret,
                    StmtKind::AtomicLoad { ptr: gtemp },
                ));
                replacements.record(stmt.id, new_id);
            }
            &StmtKind::AtomicStore { ptr, value } if slots.contains_key(&ptr) => {
                let gtemp = temp_ptr(ptr, &mut out, module)?;
                out.push(Stmt::new(
                    module.alloc_id(),
                    None,
                    StmtKind::AtomicStore { ptr: gtemp, value },
                ));
            }
            _ => {
                for nested in stmt.blocks_mut() {
                    let inner = std::mem::take(nested);
                    *nested =
                        rewrite_alloca_accesses(inner, slots, alloca_prims, replacements, module)?;
                }
                out.push(stmt);
            }
        }
    }
    Ok(out)
}

/// Stage 2 identification: serial non-pointer values with at least one use
/// inside a parallel region, slotted in first-use order.
fn identify_serial_spills(root: &Block, module: &mut Module) -> HashMap<StmtId, u32> {
    fn walk(
        block: &Block,
        in_parallel: bool,
        serial_values: &mut std::collections::HashSet<StmtId>,
        slots: &mut HashMap<StmtId, u32>,
        module: &mut Module,
    ) {
        for stmt in block {
            if !in_parallel && !stmt.is_pointer() && stmt.ret.is_some() {
                serial_values.insert(stmt.id);
            }
            if in_parallel {
                stmt.for_each_operand(|op| {
                    if serial_values.contains(&op) && !slots.contains_key(&op) {
                        let slot = module.alloc_temporary_slot();
                        slots.insert(op, slot);
                    }
                });
            }
            let nested_parallel = in_parallel || is_parallel_region(&stmt.kind);
            for nested in stmt.blocks() {
                walk(nested, nested_parallel, serial_values, slots, module);
            }
        }
    }

    let mut serial_values = std::collections::HashSet::new();
    let mut slots = HashMap::new();
    walk(root, false, &mut serial_values, &mut slots, module);
    slots
}

/// Stage 2 rewrite: store after the serial definition, load before every
/// parallel use.
fn spill_serial_values(
    block: Block,
    spills: &HashMap<StmtId, u32>,
    prims: &HashMap<StmtId, PrimitiveType>,
    in_parallel: bool,
    module: &mut Module,
) -> Result<Block> {
    let mut out = Block::new();
    for mut stmt in block {
        if in_parallel {
            let mut pending: Vec<Stmt> = Vec::new();
            stmt.for_each_operand_mut(|op| {
                if let Some(&slot) = spills.get(op) {
                    let prim = prims.get(op).copied().unwrap_or(PrimitiveType::I32);
                    let gtemp = module.alloc_id();
                    pending.push(Stmt::new(
                        gtemp,
                        Some(prim),
                        StmtKind::GlobalTemporary { slot },
                    ));
                    let load = module.alloc_id();
                    pending.push(Stmt::new(
                        load,
                        Some(prim),
                        StmtKind::GlobalTemporaryLoad { ptr: gtemp },
                    ));
                    *op = load;
                }
            });
            for s in pending {
                out.push(s);
            }
        }

        let nested_parallel = in_parallel || is_parallel_region(&stmt.kind);
        for nested in stmt.blocks_mut() {
            let inner = std::mem::take(nested);
            *nested = spill_serial_values(inner, spills, prims, nested_parallel, module)?;
        }

        let stmt_id = stmt.id;
        let stmt_ret = stmt.ret;
        out.push(stmt);

        if !in_parallel {
            if let Some(&slot) = spills.get(&stmt_id) {
                let prim = stmt_ret
                    .ok_or_else(|| anyhow!("spilled value {} has no value kind", stmt_id))?;
                let gtemp = module.alloc_id();
                out.push(Stmt::new(
                    gtemp,
                    Some(prim),
                    StmtKind::GlobalTemporary { slot },
                ));
                out.push(Stmt::new(
                    module.alloc_id(),
                    None,
                    StmtKind::GlobalTemporaryStore {
                        ptr: gtemp,
                        value: stmt_id,
                    },
                ));
            }
        }
    }
    Ok(out)
}

/// Stage 3: spill any parallel trip count that offloading could not carry
/// across the module split.
fn spill_loop_ranges(block: Block, module: &mut Module) -> Result<Block> {
    #[derive(Clone, Copy, PartialEq)]
    enum RangeKind {
        Constant,
        TemporaryLoad,
        Other,
    }
    let mut kinds: HashMap<StmtId, (RangeKind, Option<PrimitiveType>)> = HashMap::new();
    for_each_stmt(&block, |stmt| {
        let kind = match &stmt.kind {
            StmtKind::Const { .. } => RangeKind::Constant,
            StmtKind::GlobalTemporaryLoad { .. } => RangeKind::TemporaryLoad,
            _ => RangeKind::Other,
        };
        kinds.insert(stmt.id, (kind, stmt.ret));
    });

    let mut out = Block::new();
    for mut stmt in block {
        if let StmtKind::RangeFor {
            range,
            is_parallel: true,
            ..
        } = &mut stmt.kind
        {
            let (kind, ret) = kinds
                .get(range)
                .copied()
                .ok_or_else(|| anyhow!("parallel loop range {} is not defined", range))?;
            if ret != Some(PrimitiveType::I32) {
                bail!("parallel loop range {} must be an i32", range);
            }
            if kind == RangeKind::Other {
                let slot = module.alloc_temporary_slot();
                let gtemp = module.alloc_id();
                out.push(Stmt::new(
                    gtemp,
                    Some(PrimitiveType::I32),
                    StmtKind::GlobalTemporary { slot },
                ));
                out.push(Stmt::new(
                    module.alloc_id(),
                    None,
                    StmtKind::GlobalTemporaryStore {
                        ptr: gtemp,
                        value: *range,
                    },
                ));
                let load = module.alloc_id();
                out.push(Stmt::new(
                    load,
                    Some(PrimitiveType::I32),
                    StmtKind::GlobalTemporaryLoad { ptr: gtemp },
                ));
                *range = load;
            }
        }
        out.push(stmt);
    }
    Ok(out)
}
