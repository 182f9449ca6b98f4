use anyhow::{bail, Result};
use std::collections::HashMap;
use warpir_core::{Block, OffloadedModule, StmtId};

/// Renumbers one offloaded module's statements densely from zero.
///
/// Runs after offloading rather than in the shared pipeline: each module gets
/// its own numbering, and any operand still referring to a statement from
/// another module is an offload bug worth failing loudly on.
pub struct RemapIds;

impl RemapIds {
    pub fn run(&self, module: &mut OffloadedModule) -> Result<()> {
        let mut map = HashMap::new();
        number_block(&module.block, &mut map);
        rewrite_block(&mut module.block, &map)
    }
}

fn number_block(block: &Block, map: &mut HashMap<StmtId, StmtId>) {
    for stmt in block {
        let next = StmtId(map.len() as u32);
        map.insert(stmt.id, next);
        for nested in stmt.blocks() {
            number_block(nested, map);
        }
    }
}

fn rewrite_block(block: &mut Block, map: &HashMap<StmtId, StmtId>) -> Result<()> {
    for stmt in &mut block.stmts {
        if let Some(&new_id) = map.get(&stmt.id) {
            stmt.id = new_id;
        }
        let mut escaped = None;
        stmt.for_each_operand_mut(|op| match map.get(op) {
            Some(&new_id) => *op = new_id,
            None => escaped = Some(*op),
        });
        if let Some(op) = escaped {
            bail!(
                "operand {} of {} is defined outside the offloaded module",
                op,
                stmt.id
            );
        }
        for nested in stmt.blocks_mut() {
            rewrite_block(nested, map)?;
        }
    }
    Ok(())
}
