use std::collections::HashMap;

use indexmap::IndexMap;

use warpir_core::ast::{FunctionDef, Span, SymbolId};
use warpir_core::builder::IrBuilder;
use warpir_core::resources::{Field, Texture};
use warpir_core::types::Type;
use warpir_core::values::Value;

use super::errors::CompileError;
use super::resolve::Resolver;
use super::scope::{HostValue, KernelScope};
use crate::kernel::{ColorAttachment, RenderPassParams, RenderPipelineParams};

/// What one expression lowers to.
#[derive(Debug, Clone)]
pub enum Lowered {
    /// A kernel-side value, possibly a pointer (l-value).
    Value(Value),
    /// A host-side value that has not touched the IR. Normalized into
    /// constants on use, or consumed directly by indexing, calls, and
    /// rendering intrinsics.
    Host(HostValue),
    /// A function value defined inside this kernel. Calling it captures the
    /// caller's live symbol table; externally parsed functions do not.
    Closure(FunctionDef),
}

impl Lowered {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Lowered::Value(_) => "value",
            Lowered::Host(host) => host.kind_name(),
            Lowered::Closure(_) => "function",
        }
    }
}

/// Loop kinds tracked per frame for break/continue validation. Statically
/// unrolled loops are never pushed; break and continue cannot target them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    RangeFor,
    While,
    VertexFor,
    FragmentFor,
}

/// Where the kernel sits in the vertex/fragment grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderState {
    #[default]
    NotStarted,
    InVertex,
    FinishedVertex,
    InFragment,
}

/// The pipeline under construction between an `input_vertices` header and
/// the end of its matching `input_fragments` loop.
#[derive(Debug, Clone)]
pub struct PipelineBuild {
    pub vertex_buffer: Field,
    pub index_buffer: Option<Field>,
    /// Set by `output_vertex`; the last call wins.
    pub interpolated_type: Option<Type>,
}

/// Render-pass attachments and finished pipelines accumulated across the
/// whole kernel. Attachments are shared by every pipeline; each completed
/// Vertex-For/Fragment-For pair appends one entry to `pipelines`.
#[derive(Debug, Default)]
pub struct RenderBuild {
    pub state: RenderState,
    pub current: Option<PipelineBuild>,
    pub pipelines: Vec<RenderPipelineParams>,
    pub pass: RenderPassParams,
}

impl RenderBuild {
    /// Location of `texture` in the color attachment list, appending it on
    /// first use. Output locations in the IR index this list.
    pub fn color_attachment_location(&mut self, texture: Texture) -> u32 {
        if let Some(position) = self
            .pass
            .color_attachments
            .iter()
            .position(|attachment| attachment.texture.id == texture.id)
        {
            return position as u32;
        }
        self.pass.color_attachments.push(ColorAttachment {
            texture,
            clear_color: None,
        });
        (self.pass.color_attachments.len() - 1) as u32
    }
}

/// One lowering frame: the kernel body itself, or one inlined call. Symbol
/// bindings, loop nesting, branch depth, and the pending return value are
/// frame-local; the render grammar and the IR builder are shared.
#[derive(Debug, Default)]
pub struct Frame {
    pub symbols: HashMap<SymbolId, Lowered>,
    pub loop_stack: Vec<LoopKind>,
    pub branch_depth: u32,
    pub returned: Option<Value>,
}

pub struct LowerContext<'a> {
    pub builder: &'a mut IrBuilder,
    pub source: &'a str,
    pub scope: &'a KernelScope,
    /// Template-argument bindings for this specialization, keyed by
    /// parameter name.
    pub template_values: IndexMap<String, HostValue>,
    pub kernel_frame: Frame,
    pub inline_frames: Vec<Frame>,
    pub render: RenderBuild,
    /// Runtime (non-template) argument types, in declaration order.
    pub arg_types: Vec<Type>,
    pub return_type: Type,
    pub resolver: Resolver,
}

impl<'a> LowerContext<'a> {
    pub fn new(builder: &'a mut IrBuilder, source: &'a str, scope: &'a KernelScope) -> Self {
        Self {
            builder,
            source,
            scope,
            template_values: IndexMap::new(),
            kernel_frame: Frame::default(),
            inline_frames: Vec::new(),
            render: RenderBuild::default(),
            arg_types: Vec::new(),
            return_type: Type::Void,
            resolver: Resolver::new(),
        }
    }

    pub fn frame(&self) -> &Frame {
        self.inline_frames.last().unwrap_or(&self.kernel_frame)
    }

    pub fn frame_mut(&mut self) -> &mut Frame {
        self.inline_frames.last_mut().unwrap_or(&mut self.kernel_frame)
    }

    pub fn push_frame(&mut self, frame: Frame) {
        self.inline_frames.push(frame);
    }

    pub fn pop_frame(&mut self) -> Option<Frame> {
        self.inline_frames.pop()
    }

    /// True while lowering the kernel body directly rather than an inlined
    /// function call.
    pub fn in_kernel(&self) -> bool {
        self.inline_frames.is_empty()
    }

    /// Loops inside inlined functions always serialize; only loops written
    /// directly in the kernel body are parallelization candidates.
    pub fn strictly_serialized(&self) -> bool {
        !self.inline_frames.is_empty()
    }

    /// Top level of the kernel body: not inside a function, branch, or loop.
    pub fn at_top_level(&self) -> bool {
        let frame = self.frame();
        self.in_kernel() && frame.branch_depth == 0 && frame.loop_stack.is_empty()
    }

    pub fn bind(&mut self, symbol: SymbolId, value: Lowered) {
        self.frame_mut().symbols.insert(symbol, value);
    }

    pub fn lookup(&self, symbol: SymbolId) -> Option<&Lowered> {
        self.frame().symbols.get(&symbol)
    }

    pub fn error_at(&self, span: Span, message: impl Into<String>) -> CompileError {
        CompileError::at(span, self.source, message)
    }
}
