use super::Pass;
use anyhow::Result;
use std::collections::HashMap;
use warpir_core::{Block, Module, PrimitiveType, Stmt, StmtId, StmtKind, UnaryOp};

/// Reconciles mixed-primitive binary operations.
///
/// The builder records each operation's result primitive but leaves operands
/// as emitted, so `f32 + i32` reaches this pass with one operand of each
/// kind. The only legal mix is i32 with f32; the i32 side gets a
/// value-preserving cast inserted directly before the operation.
pub struct FixOpTypes;

impl Pass for FixOpTypes {
    fn name(&self) -> &'static str {
        "fix-op-types"
    }

    fn run(&mut self, module: &mut Module) -> Result<()> {
        let mut prims = HashMap::new();
        let root = std::mem::take(&mut module.root);
        module.root = fix_block(root, &mut prims, module);
        Ok(())
    }
}

fn fix_block(
    block: Block,
    prims: &mut HashMap<StmtId, PrimitiveType>,
    module: &mut Module,
) -> Block {
    let mut out = Block::new();
    for mut stmt in block {
        if let StmtKind::BinaryOp { left, right, .. } = &mut stmt.kind {
            let lp = prims.get(left).copied();
            let rp = prims.get(right).copied();
            if let (Some(lp), Some(rp)) = (lp, rp) {
                if lp != rp {
                    let operand = if lp == PrimitiveType::I32 { left } else { right };
                    let cast_id = module.alloc_id();
                    out.push(Stmt::new(
                        cast_id,
                        Some(PrimitiveType::F32),
                        StmtKind::UnaryOp {
                            operand: *operand,
                            op: UnaryOp::CastF32Value,
                        },
                    ));
                    prims.insert(cast_id, PrimitiveType::F32);
                    *operand = cast_id;
                }
            }
        }
        if let Some(prim) = stmt.ret {
            prims.insert(stmt.id, prim);
        }
        for nested in stmt.blocks_mut() {
            let inner = std::mem::take(nested);
            *nested = fix_block(inner, prims, module);
        }
        out.push(stmt);
    }
    out
}
