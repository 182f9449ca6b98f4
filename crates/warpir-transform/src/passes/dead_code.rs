use super::Pass;
use anyhow::Result;
use std::collections::{HashMap, HashSet};
use warpir_core::{Block, Module, StmtId};

/// Mark-and-sweep liveness over the statement tree.
///
/// Roots are the statements with observable effects; everything an effectful
/// statement transitively consumes stays, the rest is dropped. Blocks are
/// rebuilt in original order, so the sweep never reorders anything.
pub struct DeadInstructionElimination;

impl Pass for DeadInstructionElimination {
    fn name(&self) -> &'static str {
        "dead-instruction-elimination"
    }

    fn run(&mut self, module: &mut Module) -> Result<()> {
        let mut operands = HashMap::new();
        let mut worklist = Vec::new();
        collect(&module.root, &mut operands, &mut worklist);

        let mut live: HashSet<StmtId> = HashSet::new();
        while let Some(id) = worklist.pop() {
            if !live.insert(id) {
                continue;
            }
            if let Some(deps) = operands.get(&id) {
                worklist.extend(deps.iter().copied());
            }
        }

        let root = std::mem::take(&mut module.root);
        module.root = sweep(root, &live);
        Ok(())
    }
}

fn collect(
    block: &Block,
    operands: &mut HashMap<StmtId, Vec<StmtId>>,
    roots: &mut Vec<StmtId>,
) {
    for stmt in block {
        operands.insert(stmt.id, stmt.operands());
        if stmt.has_observable_effect() {
            roots.push(stmt.id);
        }
        for nested in stmt.blocks() {
            collect(nested, operands, roots);
        }
    }
}

fn sweep(block: Block, live: &HashSet<StmtId>) -> Block {
    let mut out = Block::new();
    for mut stmt in block {
        if !live.contains(&stmt.id) {
            continue;
        }
        for nested in stmt.blocks_mut() {
            let inner = std::mem::take(nested);
            *nested = sweep(inner, live);
        }
        out.push(stmt);
    }
    out
}
