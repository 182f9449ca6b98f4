use crate::config::EmitterConfig;
use crate::emitter::{EmitContext, EmitHelper, EmitResult, Emittable, Emitter};
use crate::format::IrFormatter;
use std::io::Write;
use warpir_core::{Block, OffloadedModule, Stmt, StmtKind};

/// Prints one offloaded module as a brace-nested statement listing:
///
/// ```text
/// compute(16) {
///   %0 = loop_index : i32
///   %1 = global_ptr field(tree 0, [16], f32)[%0] : f32
///   %2 = const 1.0 : f32
///   %3 = global_store %1, %2
/// }
/// ```
#[derive(Default)]
pub struct IrEmitter {
    config: EmitterConfig,
}

impl IrEmitter {
    pub fn new(config: EmitterConfig) -> Self {
        Self { config }
    }

    /// Whole-module text with context settings taken from the config.
    pub fn module_text(&self, module: &OffloadedModule) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        let mut context = EmitContext::from_config(&self.config);
        self.emit(module, &mut buffer, &mut context)?;
        Ok(String::from_utf8(buffer)?)
    }

    pub fn emit_block<W: Write>(
        &self,
        block: &Block,
        writer: &mut W,
        context: &mut EmitContext,
    ) -> EmitResult {
        for stmt in block.iter() {
            self.emit_stmt(stmt, writer, context)?;
        }
        Ok(())
    }

    fn emit_stmt<W: Write>(
        &self,
        stmt: &Stmt,
        writer: &mut W,
        context: &mut EmitContext,
    ) -> EmitResult {
        let head = IrFormatter::format_stmt(stmt, self.config.include_types);
        match &stmt.kind {
            StmtKind::If {
                true_branch,
                false_branch,
                ..
            } => {
                EmitHelper::write_line(writer, context, &format!("{} {{", head))?;
                context.indent();
                self.emit_block(true_branch, writer, context)?;
                context.dedent();
                if !false_branch.is_empty() {
                    EmitHelper::write_line(writer, context, "} else {")?;
                    context.indent();
                    self.emit_block(false_branch, writer, context)?;
                    context.dedent();
                }
                EmitHelper::write_line(writer, context, "}")
            }
            StmtKind::RangeFor { body, .. }
            | StmtKind::While { body }
            | StmtKind::VertexFor { body }
            | StmtKind::FragmentFor { body } => {
                EmitHelper::write_block(writer, context, &head, |w, c| self.emit_block(body, w, c))
            }
            _ => EmitHelper::write_line(writer, context, &head),
        }
    }
}

impl Emitter for IrEmitter {
    type Item = OffloadedModule;

    fn emit<W: Write>(
        &self,
        module: &OffloadedModule,
        writer: &mut W,
        context: &mut EmitContext,
    ) -> EmitResult {
        let header = format!("{} {{", IrFormatter::format_module_kind(module.kind));
        EmitHelper::write_colored_line(writer, context, &header, "cyan")?;
        context.indent();
        self.emit_block(&module.block, writer, context)?;
        context.dedent();
        EmitHelper::write_line(writer, context, "}")
    }
}

impl Emittable for OffloadedModule {
    fn emit<W: Write>(&self, writer: &mut W, context: &mut EmitContext) -> EmitResult {
        Emitter::emit(&IrEmitter::default(), self, writer, context)
    }
}
