/*! Unified interface for embedded GPU kernel compilation.
 *
 * Single import for everything you need: lowering host-language kernel ASTs
 * to offloaded IR, caching specializations, and emitting the result as text
 * or JSON. Batteries-included entry point for embedding runtimes.
 */

pub use warpir_core as core;
pub use warpir_emit as emit;
pub use warpir_transform as transform;

pub use warpir_core::{
    ast::FunctionDef,
    block::Block,
    builder::IrBuilder,
    instructions::{Stmt, StmtId, StmtKind},
    module::{Module, OffloadKind, OffloadedModule, TripCount},
    resources::{Field, Texture},
    types::{PrimitiveType, Type},
    values::{ConstVal, Value},
};

pub use warpir_emit::{EmitterConfig, IrEmitter, KernelEmitter};

pub use warpir_transform::{
    compile_kernel, ArgSpec, CompileError, CompiledKernel, HostValue, KernelScope, KernelSource,
    SpecializationCache,
};
