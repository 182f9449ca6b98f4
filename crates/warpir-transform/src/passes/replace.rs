use std::collections::HashMap;
use warpir_core::{Block, StmtId};

/// Deferred id substitutions accumulated while a pass rebuilds blocks.
///
/// A pass that replaces a statement with a differently shaped one records
/// old -> new here and applies the whole map once rebuilding is done, so
/// operand references anywhere in the tree are rewritten exactly once.
/// Resolution follows chains, in case a replacement was itself replaced.
#[derive(Debug, Default)]
pub struct IdReplacements {
    map: HashMap<StmtId, StmtId>,
}

impl IdReplacements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, old: StmtId, new: StmtId) {
        self.map.insert(old, new);
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Final substitute for `id`. Bounded by the map size so a malformed
    /// cyclic map cannot loop forever.
    pub fn resolve(&self, mut id: StmtId) -> StmtId {
        for _ in 0..=self.map.len() {
            match self.map.get(&id) {
                Some(&next) => id = next,
                None => break,
            }
        }
        id
    }

    /// Rewrite every operand reference under `block` through the map.
    pub fn apply(&self, block: &mut Block) {
        if self.map.is_empty() {
            return;
        }
        for stmt in &mut block.stmts {
            stmt.for_each_operand_mut(|id| *id = self.resolve(*id));
            for nested in stmt.blocks_mut() {
                self.apply(nested);
            }
        }
    }
}
