use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use warpir_core::ast::FunctionDef;
use warpir_core::module::OffloadedModule;
use warpir_core::resources::{Field, Texture};
use warpir_core::types::{PrimitiveType, Type};

/// Content hash identifying one kernel source text across specializations.
pub type SourceDigest = [u8; 32];

/// Kernel source handed over by the embedding host: the raw text, kept for
/// diagnostics and cache identity, plus its parsed tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelSource {
    pub text: String,
    pub def: FunctionDef,
}

impl KernelSource {
    pub fn new(text: impl Into<String>, def: FunctionDef) -> Self {
        Self {
            text: text.into(),
            def,
        }
    }

    /// Digest of the normalized source text. Two declarations of the same
    /// kernel body hash identically regardless of surrounding whitespace.
    pub fn fingerprint(&self) -> SourceDigest {
        let mut hasher = Sha256::new();
        hasher.update(self.text.trim().as_bytes());
        hasher.finalize().into()
    }
}

/// Compilation contract for one kernel parameter.
///
/// `Value` parameters travel through the flat runtime argument buffer, one
/// lane per primitive. `Template` parameters are bound to host values at
/// compile time; each distinct combination of them produces an independent
/// specialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArgSpec {
    Value(Type),
    Template,
}

impl From<Type> for ArgSpec {
    fn from(ty: Type) -> Self {
        ArgSpec::Value(ty)
    }
}

impl From<PrimitiveType> for ArgSpec {
    fn from(prim: PrimitiveType) -> Self {
        ArgSpec::Value(Type::Scalar(prim))
    }
}

/// One color attachment of the kernel's render pass. `clear_color` is set by
/// a `clear_color(...)` call in the kernel; `None` keeps the texture's
/// existing contents when the pass begins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorAttachment {
    pub texture: Texture,
    pub clear_color: Option<[f32; 4]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthAttachment {
    pub texture: Texture,
    pub clear_depth: Option<f32>,
    pub store_depth: bool,
}

/// Attachments shared by every render pipeline in one kernel. Color
/// attachment order assigns the output locations referenced by the IR.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderPassParams {
    pub color_attachments: Vec<ColorAttachment>,
    pub depth_attachment: Option<DepthAttachment>,
}

/// One Vertex-For / Fragment-For pair of the kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderPipelineParams {
    pub vertex_buffer: Field,
    pub index_buffer: Option<Field>,
    /// Type of the value the vertex stage hands to the fragment stage.
    pub interpolated_type: Type,
}

/// Everything a device backend needs to launch one kernel specialization:
/// the offloaded modules in program order plus the argument, return,
/// scratch-region, and render-pass layout they assume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledKernel {
    pub modules: Vec<OffloadedModule>,
    /// Runtime (non-template) argument types, in declaration order.
    pub arg_types: Vec<Type>,
    pub return_type: Type,
    /// Slot count of the kernel-private scratch region shared by the modules.
    pub num_temporary_slots: u32,
    pub render_pipelines: Vec<RenderPipelineParams>,
    pub render_pass: Option<RenderPassParams>,
}

impl CompiledKernel {
    /// Flat primitive count of the runtime argument buffer.
    pub fn num_arg_primitives(&self) -> usize {
        self.arg_types.iter().map(|ty| ty.num_primitives()).sum()
    }

    pub fn has_render_pipelines(&self) -> bool {
        !self.render_pipelines.is_empty()
    }
}
