use super::Pass;
use anyhow::Result;
use warpir_core::{Module, StmtKind};

/// Marks top-level range loops as parallel unless lowering forced them
/// serial. Only direct children of the root are candidates; a nested loop
/// always runs inside its parent's invocation, so nested parallelism never
/// arises.
pub struct IdentifyParallelLoops;

impl Pass for IdentifyParallelLoops {
    fn name(&self) -> &'static str {
        "identify-parallel-loops"
    }

    fn run(&mut self, module: &mut Module) -> Result<()> {
        for stmt in &mut module.root.stmts {
            if let StmtKind::RangeFor {
                strictly_serialized,
                is_parallel,
                ..
            } = &mut stmt.kind
            {
                *is_parallel = !*strictly_serialized;
            }
        }
        Ok(())
    }
}
