/*! Ordered rewrites between lowering and offload.
 *
 * Each pass is total over the Module and leaves it well formed for the next.
 * The order is load-bearing: global-temporary insertion can introduce new
 * atomic candidates, demotion then strips the atomics insertion made
 * unnecessary, and promotion closes over whatever true sharing remains.
 */

mod dead_code;
mod demote_atomics;
mod fix_op_types;
mod global_temporaries;
mod identify_parallel;
mod offload;
mod promote_atomics;
mod remap_ids;
mod replace;

pub use dead_code::DeadInstructionElimination;
pub use demote_atomics::DemoteAtomics;
pub use fix_op_types::FixOpTypes;
pub use global_temporaries::InsertGlobalTemporaries;
pub use identify_parallel::IdentifyParallelLoops;
pub use offload::offload_module;
pub use promote_atomics::PromoteLoadStoreToAtomics;
pub use remap_ids::RemapIds;
pub use replace::IdReplacements;

use anyhow::{Context, Result};
use warpir_core::Module;

pub trait Pass {
    fn name(&self) -> &'static str;

    fn run(&mut self, module: &mut Module) -> Result<()>;
}

#[derive(Default)]
pub struct PassPipeline {
    passes: Vec<Box<dyn Pass>>,
}

impl PassPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P: Pass + 'static>(&mut self, pass: P) {
        self.passes.push(Box::new(pass));
    }

    pub fn run(&mut self, module: &mut Module) -> Result<()> {
        for pass in &mut self.passes {
            tracing::debug!(pass = pass.name(), "running pass");
            pass.run(module)
                .with_context(|| format!("pass '{}' failed", pass.name()))?;
        }
        Ok(())
    }
}

/// The standard sequence applied to every kernel before offloading. Id
/// remapping is not part of it; that runs per offloaded module afterwards.
pub fn default_pipeline() -> PassPipeline {
    let mut pipeline = PassPipeline::new();
    pipeline.register(FixOpTypes);
    pipeline.register(IdentifyParallelLoops);
    pipeline.register(DeadInstructionElimination);
    pipeline.register(InsertGlobalTemporaries);
    pipeline.register(DemoteAtomics);
    pipeline.register(PromoteLoadStoreToAtomics);
    pipeline
}
