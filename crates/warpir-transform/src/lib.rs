/*! Lower kernel ASTs into offloaded IR.
 *
 * A kernel arrives as a host-language syntax tree plus the host values its
 * free identifiers close over. This crate walks that tree once, building IR
 * through the guard-stack builder, then runs a fixed pass sequence and splits
 * the result at parallel-loop boundaries into the serial/compute/vertex/
 * fragment modules a device backend dispatches.
 */

pub mod cache;
pub mod kernel;
pub mod kernel_to_ir;
pub mod passes;

pub use cache::SpecializationCache;
pub use kernel::{
    ArgSpec, ColorAttachment, CompiledKernel, DepthAttachment, KernelSource, RenderPassParams,
    RenderPipelineParams,
};
pub use kernel_to_ir::{compile_kernel, CompileError, HostValue, KernelScope};
