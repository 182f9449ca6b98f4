use super::Pass;
use anyhow::Result;
use std::collections::{HashMap, HashSet};
use warpir_core::visit::for_each_stmt;
use warpir_core::{Block, Module, StmtId, StmtKind};

/// Closes atomicity over shared resources.
///
/// If any access to a storage tree, or to the global-temporary space, is
/// atomic anywhere in the module, every plain load and store of that same
/// resource is promoted to its atomic form. Mixed access to concurrently
/// shared memory would lose updates. Statement ids are kept, only the access
/// kind changes, so no operand rewriting is needed.
pub struct PromoteLoadStoreToAtomics;

impl Pass for PromoteLoadStoreToAtomics {
    fn name(&self) -> &'static str {
        "promote-load-store-to-atomics"
    }

    fn run(&mut self, module: &mut Module) -> Result<()> {
        let mut ptr_tree: HashMap<StmtId, u32> = HashMap::new();
        let mut gtemp_ptrs: HashSet<StmtId> = HashSet::new();
        for_each_stmt(&module.root, |stmt| match &stmt.kind {
            StmtKind::GlobalPtr { field, .. } => {
                ptr_tree.insert(stmt.id, field.tree_id);
            }
            StmtKind::GlobalTemporary { .. } => {
                gtemp_ptrs.insert(stmt.id);
            }
            _ => {}
        });

        let mut atomic_trees: HashSet<u32> = HashSet::new();
        let mut atomic_gtemps = false;
        for_each_stmt(&module.root, |stmt| {
            let target = match &stmt.kind {
                StmtKind::AtomicOp { dest, .. } => Some(*dest),
                StmtKind::AtomicLoad { ptr } | StmtKind::AtomicStore { ptr, .. } => Some(*ptr),
                _ => None,
            };
            if let Some(target) = target {
                if let Some(&tree) = ptr_tree.get(&target) {
                    atomic_trees.insert(tree);
                } else if gtemp_ptrs.contains(&target) {
                    atomic_gtemps = true;
                }
            }
        });

        if atomic_trees.is_empty() && !atomic_gtemps {
            return Ok(());
        }

        let shared = |ptr: &StmtId| {
            ptr_tree
                .get(ptr)
                .map_or(false, |tree| atomic_trees.contains(tree))
        };
        promote_block(&mut module.root, &shared, atomic_gtemps);
        Ok(())
    }
}

fn promote_block(block: &mut Block, shared: &dyn Fn(&StmtId) -> bool, atomic_gtemps: bool) {
    for stmt in &mut block.stmts {
        let promoted = match &stmt.kind {
            &StmtKind::GlobalLoad { ptr } if shared(&ptr) => Some(StmtKind::AtomicLoad { ptr }),
            &StmtKind::GlobalStore { ptr, value } if shared(&ptr) => {
                Some(StmtKind::AtomicStore { ptr, value })
            }
            &StmtKind::GlobalTemporaryLoad { ptr } if atomic_gtemps => {
                Some(StmtKind::AtomicLoad { ptr })
            }
            &StmtKind::GlobalTemporaryStore { ptr, value } if atomic_gtemps => {
                Some(StmtKind::AtomicStore { ptr, value })
            }
            _ => None,
        };
        if let Some(kind) = promoted {
            stmt.kind = kind;
        }
        for nested in stmt.blocks_mut() {
            promote_block(nested, shared, atomic_gtemps);
        }
    }
}
