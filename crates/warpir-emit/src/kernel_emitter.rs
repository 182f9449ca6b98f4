use crate::config::EmitterConfig;
use crate::emitter::{EmitContext, EmitHelper, EmitResult, Emitter};
use crate::format::IrFormatter;
use crate::ir_emitter::IrEmitter;
use std::io::Write;
use warpir_core::visit::for_each_stmt;
use warpir_core::{Block, Type};
use warpir_transform::{CompiledKernel, RenderPassParams, RenderPipelineParams};

/// Prints a compiled kernel: an interface summary, every offloaded module in
/// dispatch order, and the render state when the kernel draws.
#[derive(Default)]
pub struct KernelEmitter {
    config: EmitterConfig,
}

impl KernelEmitter {
    pub fn new(config: EmitterConfig) -> Self {
        Self { config }
    }

    /// Whole-kernel text with context settings taken from the config.
    pub fn kernel_text(&self, kernel: &CompiledKernel) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        let mut context = EmitContext::from_config(&self.config);
        self.emit(kernel, &mut buffer, &mut context)?;
        Ok(String::from_utf8(buffer)?)
    }

    fn emit_interface<W: Write>(
        &self,
        kernel: &CompiledKernel,
        writer: &mut W,
        context: &EmitContext,
    ) -> EmitResult {
        let args = if kernel.arg_types.is_empty() {
            "none".to_string()
        } else {
            let parts: Vec<String> = kernel.arg_types.iter().map(|ty| ty.to_string()).collect();
            parts.join(", ")
        };
        EmitHelper::write_comment(writer, context, &format!("args: {}", args))?;
        if kernel.return_type != Type::Void {
            EmitHelper::write_comment(
                writer,
                context,
                &format!("returns: {}", kernel.return_type),
            )?;
        }
        if kernel.num_temporary_slots > 0 {
            EmitHelper::write_comment(
                writer,
                context,
                &format!("temporary slots: {}", kernel.num_temporary_slots),
            )?;
        }
        Ok(())
    }

    fn pipeline_line(index: usize, pipeline: &RenderPipelineParams) -> String {
        let mut line = format!(
            "pipeline {}: vertex buffer {}",
            index,
            IrFormatter::format_field(&pipeline.vertex_buffer)
        );
        if let Some(index_buffer) = &pipeline.index_buffer {
            line.push_str(&format!(
                ", index buffer {}",
                IrFormatter::format_field(index_buffer)
            ));
        }
        line.push_str(&format!(", interpolated {}", pipeline.interpolated_type));
        line
    }

    fn emit_render_pass<W: Write>(
        pass: &RenderPassParams,
        writer: &mut W,
        context: &EmitContext,
    ) -> EmitResult {
        for (i, attachment) in pass.color_attachments.iter().enumerate() {
            let load_op = match attachment.clear_color {
                Some(c) => format!("clear ({:?}, {:?}, {:?}, {:?})", c[0], c[1], c[2], c[3]),
                None => "load".to_string(),
            };
            EmitHelper::write_line(
                writer,
                context,
                &format!(
                    "color attachment {}: {}, {}",
                    i,
                    IrFormatter::format_texture(&attachment.texture),
                    load_op
                ),
            )?;
        }
        if let Some(depth) = &pass.depth_attachment {
            let load_op = match depth.clear_depth {
                Some(d) => format!("clear {:?}", d),
                None => "load".to_string(),
            };
            let store_op = if depth.store_depth { "store" } else { "discard" };
            EmitHelper::write_line(
                writer,
                context,
                &format!(
                    "depth attachment: {}, {}, {}",
                    IrFormatter::format_texture(&depth.texture),
                    load_op,
                    store_op
                ),
            )?;
        }
        Ok(())
    }

    fn count_stmts(block: &Block) -> usize {
        let mut count = 0;
        for_each_stmt(block, |_| count += 1);
        count
    }
}

impl Emitter for KernelEmitter {
    type Item = CompiledKernel;

    fn emit<W: Write>(
        &self,
        kernel: &CompiledKernel,
        writer: &mut W,
        context: &mut EmitContext,
    ) -> EmitResult {
        let ir = IrEmitter::new(self.config.clone());

        if self.config.verbosity.should_print_interface() {
            self.emit_interface(kernel, writer, context)?;
            if !kernel.modules.is_empty() {
                writeln!(writer)?;
            }
        }

        for (i, module) in kernel.modules.iter().enumerate() {
            if i > 0 {
                writeln!(writer)?;
            }
            if self.config.verbosity.should_print_stats() {
                EmitHelper::write_comment(
                    writer,
                    context,
                    &format!("module {}: {} statements", i, Self::count_stmts(&module.block)),
                )?;
            }
            ir.emit(module, writer, context)?;
        }

        if self.config.verbosity.should_print_render_state() && kernel.has_render_pipelines() {
            EmitHelper::write_section(writer, context, "render state")?;
            for (i, pipeline) in kernel.render_pipelines.iter().enumerate() {
                EmitHelper::write_line(writer, context, &Self::pipeline_line(i, pipeline))?;
            }
            if let Some(pass) = &kernel.render_pass {
                Self::emit_render_pass(pass, writer, context)?;
            }
        }
        Ok(())
    }
}
