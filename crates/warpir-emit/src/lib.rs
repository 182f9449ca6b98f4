/*! Textual emitters for offloaded kernel IR.
 *
 * The transform crate leaves a kernel as a list of offloaded modules plus
 * its host interface. This crate renders that result for humans and tools:
 * a brace-nested statement listing per module, an interface and render-state
 * summary around them, and pretty JSON for anything serializable.
 */

pub mod config;
pub mod emitter;
pub mod format;
pub mod ir_emitter;
pub mod kernel_emitter;
pub mod output;

pub use config::{EmitterConfig, IndentStyle, VerbosityLevel};
pub use emitter::{EmitContext, EmitHelper, EmitResult, Emittable, Emitter};
pub use format::IrFormatter;
pub use ir_emitter::IrEmitter;
pub use kernel_emitter::KernelEmitter;
pub use output::{json_string, write_json, OutputFormat};
