use super::{IdReplacements, Pass};
use anyhow::{anyhow, Result};
use std::collections::{HashMap, HashSet};
use warpir_core::visit::for_each_stmt;
use warpir_core::{Block, Module, PrimitiveType, Stmt, StmtId, StmtKind};

/// Strips atomicity from accesses to plain stack allocas.
///
/// After global-temporary insertion, an alloca that is still an alloca is
/// private to one invocation, so no concurrent access is possible: an atomic
/// read-modify-write becomes load, binary op, store, and atomic loads and
/// stores become their ordinary counterparts.
pub struct DemoteAtomics;

impl Pass for DemoteAtomics {
    fn name(&self) -> &'static str {
        "demote-atomics"
    }

    fn run(&mut self, module: &mut Module) -> Result<()> {
        let mut allocas = HashSet::new();
        let mut prims = HashMap::new();
        for_each_stmt(&module.root, |stmt| {
            if matches!(stmt.kind, StmtKind::Alloca) {
                allocas.insert(stmt.id);
            }
            if let Some(prim) = stmt.ret {
                prims.insert(stmt.id, prim);
            }
        });

        let mut replacements = IdReplacements::new();
        let root = std::mem::take(&mut module.root);
        module.root = demote_block(root, &allocas, &prims, &mut replacements, module)?;
        replacements.apply(&mut module.root);
        Ok(())
    }
}

fn demote_block(
    block: Block,
    allocas: &HashSet<StmtId>,
    prims: &HashMap<StmtId, PrimitiveType>,
    replacements: &mut IdReplacements,
    module: &mut Module,
) -> Result<Block> {
    let mut out = Block::new();
    for mut stmt in block {
        match &stmt.kind {
            &StmtKind::AtomicOp { dest, operand, op } if allocas.contains(&dest) => {
                let dest_prim = prims
                    .get(&dest)
                    .copied()
                    .ok_or_else(|| anyhow!("atomic destination {} has no value kind", dest))?;
                let load_id = module.alloc_id();
                out.push(Stmt::new(
                    load_id,
                    Some(dest_prim),
                    StmtKind::LocalLoad { ptr: dest },
                ));

                let binary_op = op.to_binary();
                let operand_prim = prims.get(&operand).copied().unwrap_or(dest_prim);
                let ret = binary_op
                    .result_prim(dest_prim, operand_prim)
                    .unwrap_or(dest_prim);
                let binary_id = module.alloc_id();
                out.push(Stmt::new(
                    binary_id,
                    Some(ret),
                    StmtKind::BinaryOp {
                        left: load_id,
                        right: operand,
                        op: binary_op,
                    },
                ));
                replacements.record(stmt.id, binary_id);

                out.push(Stmt::new(
                    module.alloc_id(),
                    None,
                    StmtKind::LocalStore {
                        ptr: dest,
                        value: binary_id,
                    },
                ));
            }
            &StmtKind::AtomicLoad { ptr } if allocas.contains(&ptr) => {
                let load_id = module.alloc_id();
                out.push(Stmt::new(load_id, stmt.ret, StmtKind::LocalLoad { ptr }));
                replacements.record(stmt.id, load_id);
            }
            &StmtKind::AtomicStore { ptr, value } if allocas.contains(&ptr) => {
                out.push(Stmt::new(
                    module.alloc_id(),
                    None,
                    StmtKind::LocalStore { ptr, value },
                ));
            }
            _ => {
                for nested in stmt.blocks_mut() {
                    let inner = std::mem::take(nested);
                    *nested = demote_block(inner, allocas, prims, replacements, module)?;
                }
                out.push(stmt);
            }
        }
    }
    Ok(out)
}
