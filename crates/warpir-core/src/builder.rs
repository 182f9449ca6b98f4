use crate::block::Block;
use crate::instructions::{
    AtomicOp, BinaryOp, BuiltInInputKind, BuiltInOutputKind, DerivativeDirection, Stmt, StmtId,
    StmtKind, TextureFunctionKind, UnaryOp,
};
use crate::module::Module;
use crate::resources::{Field, Texture};
use crate::types::PrimitiveType;
use crate::values::ConstVal;
use crate::{IrError, Result};
use std::collections::HashMap;

/// Builds a [`Module`] front to back.
///
/// The builder keeps a stack of in-progress blocks ("guards"): statements are
/// appended to the innermost guard, so the frontend can emit nested branch
/// arms and loop bodies without a separate linking phase. Loop headers whose
/// bodies refer back to them (via LoopIndex) reserve their id up front and
/// are pushed once the body guard is popped.
#[derive(Debug, Default)]
pub struct IrBuilder {
    next_id: u32,
    root: Block,
    guards: Vec<Block>,
    ret_types: HashMap<StmtId, PrimitiveType>,
}

impl IrBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a statement id without emitting anything yet.
    pub fn reserve_id(&mut self) -> StmtId {
        let id = StmtId(self.next_id);
        self.next_id += 1;
        id
    }

    /// The return primitive of an already-emitted statement.
    pub fn ret_prim(&self, id: StmtId) -> Option<PrimitiveType> {
        self.ret_types.get(&id).copied()
    }

    fn require_ret(&self, id: StmtId) -> Result<PrimitiveType> {
        self.ret_prim(id).ok_or_else(|| {
            IrError::BuilderError(format!("{} does not produce a value", id))
        })
    }

    fn append(&mut self, stmt: Stmt) {
        if let Some(prim) = stmt.ret {
            self.ret_types.insert(stmt.id, prim);
        }
        match self.guards.last_mut() {
            Some(guard) => guard.push(stmt),
            None => self.root.push(stmt),
        }
    }

    pub fn push(&mut self, ret: Option<PrimitiveType>, kind: StmtKind) -> StmtId {
        let id = self.reserve_id();
        self.append(Stmt::new(id, ret, kind));
        id
    }

    /// Emit a statement under a previously reserved id.
    pub fn push_with_id(&mut self, id: StmtId, ret: Option<PrimitiveType>, kind: StmtKind) {
        self.append(Stmt::new(id, ret, kind));
    }

    /// Open a nested insertion scope.
    pub fn push_guard(&mut self) {
        self.guards.push(Block::new());
    }

    /// Close the innermost insertion scope and hand back its block.
    pub fn pop_guard(&mut self) -> Result<Block> {
        self.guards
            .pop()
            .ok_or_else(|| IrError::BuilderError("no open guard to pop".into()))
    }

    pub fn finish(self) -> Result<Module> {
        if !self.guards.is_empty() {
            return Err(IrError::BuilderError(format!(
                "{} unclosed guard(s) at end of build",
                self.guards.len()
            )));
        }
        Ok(Module::with_root(self.root, self.next_id))
    }

    pub fn const_val(&mut self, value: ConstVal) -> StmtId {
        self.push(Some(value.primitive()), StmtKind::Const { value })
    }

    pub fn const_i32(&mut self, value: i32) -> StmtId {
        self.const_val(ConstVal::I32(value))
    }

    pub fn const_f32(&mut self, value: f32) -> StmtId {
        self.const_val(ConstVal::F32(value))
    }

    pub fn binary(&mut self, op: BinaryOp, left: StmtId, right: StmtId) -> Result<StmtId> {
        let lp = self.require_ret(left)?;
        let rp = self.require_ret(right)?;
        let ret = op.result_prim(lp, rp).ok_or_else(|| {
            IrError::TypeError(format!("{} is not defined on ({}, {})", op, lp, rp))
        })?;
        Ok(self.push(Some(ret), StmtKind::BinaryOp { left, right, op }))
    }

    pub fn unary(&mut self, op: UnaryOp, operand: StmtId) -> Result<StmtId> {
        let prim = self.require_ret(operand)?;
        let ret = op.result_prim(prim).ok_or_else(|| {
            IrError::TypeError(format!("{} is not defined on {}", op, prim))
        })?;
        Ok(self.push(Some(ret), StmtKind::UnaryOp { operand, op }))
    }

    /// Value-preserving conversion to `prim`; a no-op when the operand
    /// already has that kind.
    pub fn convert(&mut self, operand: StmtId, prim: PrimitiveType) -> Result<StmtId> {
        if self.require_ret(operand)? == prim {
            return Ok(operand);
        }
        let op = match prim {
            PrimitiveType::I32 => UnaryOp::CastI32Value,
            PrimitiveType::F32 => UnaryOp::CastF32Value,
        };
        self.unary(op, operand)
    }

    pub fn alloca(&mut self, prim: PrimitiveType) -> StmtId {
        self.push(Some(prim), StmtKind::Alloca)
    }

    pub fn local_load(&mut self, ptr: StmtId) -> Result<StmtId> {
        let prim = self.require_ret(ptr)?;
        Ok(self.push(Some(prim), StmtKind::LocalLoad { ptr }))
    }

    pub fn local_store(&mut self, ptr: StmtId, value: StmtId) -> StmtId {
        self.push(None, StmtKind::LocalStore { ptr, value })
    }

    pub fn global_ptr(
        &mut self,
        field: Field,
        indices: Vec<StmtId>,
        element_offset: u32,
        prim: PrimitiveType,
    ) -> StmtId {
        self.push(
            Some(prim),
            StmtKind::GlobalPtr {
                field,
                indices,
                element_offset,
            },
        )
    }

    pub fn global_load(&mut self, ptr: StmtId) -> Result<StmtId> {
        let prim = self.require_ret(ptr)?;
        Ok(self.push(Some(prim), StmtKind::GlobalLoad { ptr }))
    }

    pub fn global_store(&mut self, ptr: StmtId, value: StmtId) -> StmtId {
        self.push(None, StmtKind::GlobalStore { ptr, value })
    }

    pub fn global_temporary(&mut self, slot: u32, prim: PrimitiveType) -> StmtId {
        self.push(Some(prim), StmtKind::GlobalTemporary { slot })
    }

    pub fn global_temporary_load(&mut self, ptr: StmtId) -> Result<StmtId> {
        let prim = self.require_ret(ptr)?;
        Ok(self.push(Some(prim), StmtKind::GlobalTemporaryLoad { ptr }))
    }

    pub fn global_temporary_store(&mut self, ptr: StmtId, value: StmtId) -> StmtId {
        self.push(None, StmtKind::GlobalTemporaryStore { ptr, value })
    }

    pub fn atomic_op(&mut self, op: AtomicOp, dest: StmtId, operand: StmtId) -> Result<StmtId> {
        let prim = self.require_ret(dest)?;
        Ok(self.push(Some(prim), StmtKind::AtomicOp { dest, operand, op }))
    }

    pub fn atomic_load(&mut self, ptr: StmtId) -> Result<StmtId> {
        let prim = self.require_ret(ptr)?;
        Ok(self.push(Some(prim), StmtKind::AtomicLoad { ptr }))
    }

    pub fn atomic_store(&mut self, ptr: StmtId, value: StmtId) -> StmtId {
        self.push(None, StmtKind::AtomicStore { ptr, value })
    }

    pub fn arg_load(&mut self, prim: PrimitiveType, arg_index: u32) -> StmtId {
        self.push(Some(prim), StmtKind::ArgLoad { arg_index })
    }

    pub fn rand(&mut self, prim: PrimitiveType) -> StmtId {
        self.push(Some(prim), StmtKind::Rand)
    }

    pub fn loop_index(&mut self, loop_stmt: StmtId) -> StmtId {
        self.push(
            Some(PrimitiveType::I32),
            StmtKind::LoopIndex {
                loop_stmt: Some(loop_stmt),
            },
        )
    }

    pub fn composite_extract(&mut self, composite: StmtId, index: u32) -> Result<StmtId> {
        let prim = self.require_ret(composite)?;
        Ok(self.push(Some(prim), StmtKind::CompositeExtract { composite, index }))
    }

    pub fn vertex_input(&mut self, location: u32, prim: PrimitiveType) -> StmtId {
        self.push(Some(prim), StmtKind::VertexInput { location })
    }

    pub fn vertex_output(&mut self, location: u32, value: StmtId) -> StmtId {
        self.push(None, StmtKind::VertexOutput { location, value })
    }

    pub fn fragment_input(&mut self, location: u32, prim: PrimitiveType) -> StmtId {
        self.push(Some(prim), StmtKind::FragmentInput { location })
    }

    pub fn position_output(&mut self, values: Vec<StmtId>) -> StmtId {
        self.push(
            None,
            StmtKind::BuiltInOutput {
                kind: BuiltInOutputKind::Position,
                location: None,
                values,
            },
        )
    }

    pub fn color_output(&mut self, location: u32, values: Vec<StmtId>) -> StmtId {
        self.push(
            None,
            StmtKind::BuiltInOutput {
                kind: BuiltInOutputKind::Color,
                location: Some(location),
                values,
            },
        )
    }

    pub fn depth_output(&mut self, value: StmtId) -> StmtId {
        self.push(
            None,
            StmtKind::BuiltInOutput {
                kind: BuiltInOutputKind::FragDepth,
                location: None,
                values: vec![value],
            },
        )
    }

    pub fn builtin_input(&mut self, kind: BuiltInInputKind) -> StmtId {
        self.push(Some(kind.primitive()), StmtKind::BuiltInInput { kind })
    }

    pub fn fragment_derivative(
        &mut self,
        direction: DerivativeDirection,
        operand: StmtId,
    ) -> StmtId {
        self.push(
            Some(PrimitiveType::F32),
            StmtKind::FragmentDerivative { direction, operand },
        )
    }

    pub fn discard(&mut self) -> StmtId {
        self.push(None, StmtKind::Discard)
    }

    pub fn texture_function(
        &mut self,
        kind: TextureFunctionKind,
        texture: Texture,
        args: Vec<StmtId>,
    ) -> StmtId {
        let ret = kind.has_result().then_some(PrimitiveType::F32);
        self.push(
            ret,
            StmtKind::TextureFunction {
                kind,
                texture,
                args,
            },
        )
    }

    pub fn return_values(&mut self, values: Vec<StmtId>) -> StmtId {
        self.push(None, StmtKind::Return { values })
    }

    pub fn while_control(&mut self) -> StmtId {
        self.push(None, StmtKind::WhileControl)
    }

    pub fn continue_stmt(&mut self) -> StmtId {
        self.push(None, StmtKind::Continue)
    }

    pub fn if_stmt(&mut self, cond: StmtId, true_branch: Block, false_branch: Block) -> StmtId {
        self.push(
            None,
            StmtKind::If {
                cond,
                true_branch,
                false_branch,
            },
        )
    }

    pub fn while_stmt(&mut self, body: Block) -> StmtId {
        self.push(None, StmtKind::While { body })
    }

    /// Emit a range loop under an id reserved before its body was built, so
    /// LoopIndex statements inside the body can already refer to it.
    pub fn range_for(
        &mut self,
        id: StmtId,
        range: StmtId,
        strictly_serialized: bool,
        body: Block,
    ) {
        self.push_with_id(
            id,
            None,
            StmtKind::RangeFor {
                range,
                strictly_serialized,
                is_parallel: false,
                body,
            },
        );
    }

    pub fn vertex_for(&mut self, body: Block) -> StmtId {
        self.push(None, StmtKind::VertexFor { body })
    }

    pub fn fragment_for(&mut self, body: Block) -> StmtId {
        self.push(None, StmtKind::FragmentFor { body })
    }
}
