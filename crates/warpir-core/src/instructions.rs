use crate::block::Block;
use crate::resources::{Field, Texture};
use crate::types::PrimitiveType;
use crate::values::ConstVal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one IR statement, unique and monotonic within a Module.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct StmtId(pub u32);

impl StmtId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StmtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Mul,
    Add,
    Sub,
    TrueDiv,
    FloorDiv,
    Mod,
    Max,
    Min,
    BitAnd,
    BitOr,
    BitXor,
    BitShl,
    BitShr,
    BitSar,
    CmpLt,
    CmpLe,
    CmpGt,
    CmpGe,
    CmpEq,
    CmpNe,
    Atan2,
    Pow,
    LogicalOr,
    LogicalAnd,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::CmpLt
                | BinaryOp::CmpLe
                | BinaryOp::CmpGt
                | BinaryOp::CmpGe
                | BinaryOp::CmpEq
                | BinaryOp::CmpNe
        )
    }

    pub fn is_integer_only(self) -> bool {
        matches!(
            self,
            BinaryOp::BitAnd
                | BinaryOp::BitOr
                | BinaryOp::BitXor
                | BinaryOp::BitShl
                | BinaryOp::BitShr
                | BinaryOp::BitSar
                | BinaryOp::LogicalOr
                | BinaryOp::LogicalAnd
        )
    }

    /// Result primitive for the given operand primitives, or None when the
    /// combination is ill-typed (integer-only ops applied to f32).
    pub fn result_prim(
        self,
        left: PrimitiveType,
        right: PrimitiveType,
    ) -> Option<PrimitiveType> {
        if self.is_comparison() {
            return Some(PrimitiveType::I32);
        }
        if self.is_integer_only() {
            return if left == PrimitiveType::I32 && right == PrimitiveType::I32 {
                Some(PrimitiveType::I32)
            } else {
                None
            };
        }
        match self {
            BinaryOp::TrueDiv => Some(PrimitiveType::F32),
            BinaryOp::FloorDiv => Some(PrimitiveType::I32),
            _ => {
                if left == right {
                    Some(left)
                } else {
                    Some(PrimitiveType::F32)
                }
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Mul => "mul",
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::TrueDiv => "truediv",
            BinaryOp::FloorDiv => "floordiv",
            BinaryOp::Mod => "mod",
            BinaryOp::Max => "max",
            BinaryOp::Min => "min",
            BinaryOp::BitAnd => "bit_and",
            BinaryOp::BitOr => "bit_or",
            BinaryOp::BitXor => "bit_xor",
            BinaryOp::BitShl => "bit_shl",
            BinaryOp::BitShr => "bit_shr",
            BinaryOp::BitSar => "bit_sar",
            BinaryOp::CmpLt => "cmp_lt",
            BinaryOp::CmpLe => "cmp_le",
            BinaryOp::CmpGt => "cmp_gt",
            BinaryOp::CmpGe => "cmp_ge",
            BinaryOp::CmpEq => "cmp_eq",
            BinaryOp::CmpNe => "cmp_ne",
            BinaryOp::Atan2 => "atan2",
            BinaryOp::Pow => "pow",
            BinaryOp::LogicalOr => "logical_or",
            BinaryOp::LogicalAnd => "logical_and",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Sqrt,
    Round,
    Floor,
    Ceil,
    CastI32Value,
    CastF32Value,
    CastI32Bits,
    CastF32Bits,
    Abs,
    Sgn,
    Sin,
    Asin,
    Cos,
    Acos,
    Tan,
    Tanh,
    Inv,
    Rcp,
    Exp,
    Log,
    Rsqrt,
    BitNot,
    LogicNot,
}

impl UnaryOp {
    pub fn result_prim(self, operand: PrimitiveType) -> Option<PrimitiveType> {
        match self {
            UnaryOp::Round
            | UnaryOp::Floor
            | UnaryOp::Ceil
            | UnaryOp::Sgn
            | UnaryOp::CastI32Value
            | UnaryOp::CastI32Bits => Some(PrimitiveType::I32),
            UnaryOp::CastF32Value | UnaryOp::CastF32Bits => Some(PrimitiveType::F32),
            UnaryOp::BitNot | UnaryOp::LogicNot => {
                if operand == PrimitiveType::I32 {
                    Some(PrimitiveType::I32)
                } else {
                    None
                }
            }
            UnaryOp::Neg | UnaryOp::Abs => Some(operand),
            _ => Some(PrimitiveType::F32),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Neg => "neg",
            UnaryOp::Sqrt => "sqrt",
            UnaryOp::Round => "round",
            UnaryOp::Floor => "floor",
            UnaryOp::Ceil => "ceil",
            UnaryOp::CastI32Value => "cast_i32_value",
            UnaryOp::CastF32Value => "cast_f32_value",
            UnaryOp::CastI32Bits => "cast_i32_bits",
            UnaryOp::CastF32Bits => "cast_f32_bits",
            UnaryOp::Abs => "abs",
            UnaryOp::Sgn => "sgn",
            UnaryOp::Sin => "sin",
            UnaryOp::Asin => "asin",
            UnaryOp::Cos => "cos",
            UnaryOp::Acos => "acos",
            UnaryOp::Tan => "tan",
            UnaryOp::Tanh => "tanh",
            UnaryOp::Inv => "inv",
            UnaryOp::Rcp => "rcp",
            UnaryOp::Exp => "exp",
            UnaryOp::Log => "log",
            UnaryOp::Rsqrt => "rsqrt",
            UnaryOp::BitNot => "bit_not",
            UnaryOp::LogicNot => "logic_not",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AtomicOp {
    Add,
    Sub,
    Max,
    Min,
    BitAnd,
    BitOr,
    BitXor,
}

impl AtomicOp {
    /// The plain binary op with the same semantics, used when an atomic
    /// access is demoted to a local read-modify-write.
    pub fn to_binary(self) -> BinaryOp {
        match self {
            AtomicOp::Add => BinaryOp::Add,
            AtomicOp::Sub => BinaryOp::Sub,
            AtomicOp::Max => BinaryOp::Max,
            AtomicOp::Min => BinaryOp::Min,
            AtomicOp::BitAnd => BinaryOp::BitAnd,
            AtomicOp::BitOr => BinaryOp::BitOr,
            AtomicOp::BitXor => BinaryOp::BitXor,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AtomicOp::Add => "add",
            AtomicOp::Sub => "sub",
            AtomicOp::Max => "max",
            AtomicOp::Min => "min",
            AtomicOp::BitAnd => "bit_and",
            AtomicOp::BitOr => "bit_or",
            AtomicOp::BitXor => "bit_xor",
        }
    }
}

impl fmt::Display for AtomicOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltInOutputKind {
    Position,
    Color,
    FragDepth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltInInputKind {
    VertexIndex,
    InstanceIndex,
    FragCoord,
}

impl BuiltInInputKind {
    pub fn primitive(self) -> PrimitiveType {
        match self {
            BuiltInInputKind::VertexIndex | BuiltInInputKind::InstanceIndex => {
                PrimitiveType::I32
            }
            BuiltInInputKind::FragCoord => PrimitiveType::F32,
        }
    }

    pub fn num_components(self) -> u32 {
        match self {
            BuiltInInputKind::VertexIndex | BuiltInInputKind::InstanceIndex => 1,
            BuiltInInputKind::FragCoord => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DerivativeDirection {
    X,
    Y,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureFunctionKind {
    Sample,
    SampleLod,
    SampleCompare,
    Load,
    Store,
}

impl TextureFunctionKind {
    pub fn has_result(self) -> bool {
        !matches!(self, TextureFunctionKind::Store)
    }

    /// Component count of the result value. Sample-family results are one
    /// texel (4 lanes); compare sampling yields a single depth comparison.
    pub fn num_result_components(self) -> u32 {
        match self {
            TextureFunctionKind::Sample
            | TextureFunctionKind::SampleLod
            | TextureFunctionKind::Load => 4,
            TextureFunctionKind::SampleCompare => 1,
            TextureFunctionKind::Store => 0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TextureFunctionKind::Sample => "sample",
            TextureFunctionKind::SampleLod => "sample_lod",
            TextureFunctionKind::SampleCompare => "sample_compare",
            TextureFunctionKind::Load => "load",
            TextureFunctionKind::Store => "store",
        }
    }
}

/// One IR statement.
///
/// `ret` is the primitive the statement produces, absent for pure-effect
/// statements (stores, control flow, outputs). Operand fields hold non-owning
/// references to earlier statements; nested `Block`s are owned by their
/// control-flow statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stmt {
    pub id: StmtId,
    pub ret: Option<PrimitiveType>,
    pub kind: StmtKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StmtKind {
    Const {
        value: ConstVal,
    },

    RangeFor {
        range: StmtId,
        strictly_serialized: bool,
        is_parallel: bool,
        body: Block,
    },
    /// Index of the enclosing loop invocation. `loop_stmt` names the owning
    /// RangeFor; offloading clears it when that loop becomes a whole parallel
    /// module, where the index is the module's invocation id.
    LoopIndex {
        loop_stmt: Option<StmtId>,
    },
    While {
        body: Block,
    },
    If {
        cond: StmtId,
        true_branch: Block,
        false_branch: Block,
    },
    WhileControl,
    Continue,
    VertexFor {
        body: Block,
    },
    FragmentFor {
        body: Block,
    },

    Alloca,
    LocalLoad {
        ptr: StmtId,
    },
    LocalStore {
        ptr: StmtId,
        value: StmtId,
    },
    GlobalPtr {
        field: Field,
        indices: Vec<StmtId>,
        element_offset: u32,
    },
    GlobalLoad {
        ptr: StmtId,
    },
    GlobalStore {
        ptr: StmtId,
        value: StmtId,
    },
    GlobalTemporary {
        slot: u32,
    },
    GlobalTemporaryLoad {
        ptr: StmtId,
    },
    GlobalTemporaryStore {
        ptr: StmtId,
        value: StmtId,
    },

    AtomicOp {
        dest: StmtId,
        operand: StmtId,
        op: AtomicOp,
    },
    AtomicLoad {
        ptr: StmtId,
    },
    AtomicStore {
        ptr: StmtId,
        value: StmtId,
    },

    BinaryOp {
        left: StmtId,
        right: StmtId,
        op: BinaryOp,
    },
    UnaryOp {
        operand: StmtId,
        op: UnaryOp,
    },

    VertexInput {
        location: u32,
    },
    VertexOutput {
        location: u32,
        value: StmtId,
    },
    FragmentInput {
        location: u32,
    },
    /// `location` is the color attachment index; position and depth outputs
    /// have a fixed destination and carry none.
    BuiltInOutput {
        kind: BuiltInOutputKind,
        location: Option<u32>,
        values: Vec<StmtId>,
    },
    BuiltInInput {
        kind: BuiltInInputKind,
    },
    FragmentDerivative {
        direction: DerivativeDirection,
        operand: StmtId,
    },
    Discard,
    TextureFunction {
        kind: TextureFunctionKind,
        texture: Texture,
        args: Vec<StmtId>,
    },

    ArgLoad {
        arg_index: u32,
    },
    Rand,
    Return {
        values: Vec<StmtId>,
    },
    CompositeExtract {
        composite: StmtId,
        index: u32,
    },
}

impl Stmt {
    pub fn new(id: StmtId, ret: Option<PrimitiveType>, kind: StmtKind) -> Self {
        Self { id, ret, kind }
    }

    /// Statements producing an address rather than a value.
    pub fn is_pointer(&self) -> bool {
        matches!(
            self.kind,
            StmtKind::Alloca | StmtKind::GlobalPtr { .. } | StmtKind::GlobalTemporary { .. }
        )
    }

    /// Effect roots for liveness: anything whose removal would change
    /// observable behavior. Pure value producers (loads, arithmetic,
    /// composites, samples, rand) are live only when something marked
    /// reaches them.
    pub fn has_observable_effect(&self) -> bool {
        match &self.kind {
            StmtKind::TextureFunction { kind, .. } => !kind.has_result(),
            StmtKind::LocalStore { .. }
            | StmtKind::GlobalStore { .. }
            | StmtKind::GlobalTemporaryStore { .. }
            | StmtKind::AtomicOp { .. }
            | StmtKind::AtomicStore { .. }
            | StmtKind::RangeFor { .. }
            | StmtKind::While { .. }
            | StmtKind::If { .. }
            | StmtKind::WhileControl
            | StmtKind::Continue
            | StmtKind::VertexFor { .. }
            | StmtKind::FragmentFor { .. }
            | StmtKind::VertexOutput { .. }
            | StmtKind::BuiltInOutput { .. }
            | StmtKind::Discard
            | StmtKind::Return { .. } => true,
            _ => false,
        }
    }

    /// Visit every operand reference in order.
    pub fn for_each_operand(&self, mut f: impl FnMut(StmtId)) {
        match &self.kind {
            StmtKind::RangeFor { range, .. } => f(*range),
            StmtKind::LoopIndex { loop_stmt } => {
                if let Some(id) = loop_stmt {
                    f(*id);
                }
            }
            StmtKind::If { cond, .. } => f(*cond),
            StmtKind::LocalLoad { ptr }
            | StmtKind::GlobalLoad { ptr }
            | StmtKind::GlobalTemporaryLoad { ptr }
            | StmtKind::AtomicLoad { ptr } => f(*ptr),
            StmtKind::LocalStore { ptr, value }
            | StmtKind::GlobalStore { ptr, value }
            | StmtKind::GlobalTemporaryStore { ptr, value }
            | StmtKind::AtomicStore { ptr, value } => {
                f(*ptr);
                f(*value);
            }
            StmtKind::GlobalPtr { indices, .. } => {
                for idx in indices {
                    f(*idx);
                }
            }
            StmtKind::AtomicOp { dest, operand, .. } => {
                f(*dest);
                f(*operand);
            }
            StmtKind::BinaryOp { left, right, .. } => {
                f(*left);
                f(*right);
            }
            StmtKind::UnaryOp { operand, .. } => f(*operand),
            StmtKind::VertexOutput { value, .. } => f(*value),
            StmtKind::BuiltInOutput { values, .. } => {
                for v in values {
                    f(*v);
                }
            }
            StmtKind::FragmentDerivative { operand, .. } => f(*operand),
            StmtKind::TextureFunction { args, .. } => {
                for a in args {
                    f(*a);
                }
            }
            StmtKind::Return { values } => {
                for v in values {
                    f(*v);
                }
            }
            StmtKind::CompositeExtract { composite, .. } => f(*composite),
            StmtKind::Const { .. }
            | StmtKind::While { .. }
            | StmtKind::WhileControl
            | StmtKind::Continue
            | StmtKind::VertexFor { .. }
            | StmtKind::FragmentFor { .. }
            | StmtKind::Alloca
            | StmtKind::GlobalTemporary { .. }
            | StmtKind::VertexInput { .. }
            | StmtKind::FragmentInput { .. }
            | StmtKind::BuiltInInput { .. }
            | StmtKind::Discard
            | StmtKind::ArgLoad { .. }
            | StmtKind::Rand => {}
        }
    }

    /// Rewrite every operand reference in place.
    pub fn for_each_operand_mut(&mut self, mut f: impl FnMut(&mut StmtId)) {
        match &mut self.kind {
            StmtKind::RangeFor { range, .. } => f(range),
            StmtKind::LoopIndex { loop_stmt } => {
                if let Some(id) = loop_stmt {
                    f(id);
                }
            }
            StmtKind::If { cond, .. } => f(cond),
            StmtKind::LocalLoad { ptr }
            | StmtKind::GlobalLoad { ptr }
            | StmtKind::GlobalTemporaryLoad { ptr }
            | StmtKind::AtomicLoad { ptr } => f(ptr),
            StmtKind::LocalStore { ptr, value }
            | StmtKind::GlobalStore { ptr, value }
            | StmtKind::GlobalTemporaryStore { ptr, value }
            | StmtKind::AtomicStore { ptr, value } => {
                f(ptr);
                f(value);
            }
            StmtKind::GlobalPtr { indices, .. } => {
                for idx in indices {
                    f(idx);
                }
            }
            StmtKind::AtomicOp { dest, operand, .. } => {
                f(dest);
                f(operand);
            }
            StmtKind::BinaryOp { left, right, .. } => {
                f(left);
                f(right);
            }
            StmtKind::UnaryOp { operand, .. } => f(operand),
            StmtKind::VertexOutput { value, .. } => f(value),
            StmtKind::BuiltInOutput { values, .. } => {
                for v in values {
                    f(v);
                }
            }
            StmtKind::FragmentDerivative { operand, .. } => f(operand),
            StmtKind::TextureFunction { args, .. } => {
                for a in args {
                    f(a);
                }
            }
            StmtKind::Return { values } => {
                for v in values {
                    f(v);
                }
            }
            StmtKind::CompositeExtract { composite, .. } => f(composite),
            StmtKind::Const { .. }
            | StmtKind::While { .. }
            | StmtKind::WhileControl
            | StmtKind::Continue
            | StmtKind::VertexFor { .. }
            | StmtKind::FragmentFor { .. }
            | StmtKind::Alloca
            | StmtKind::GlobalTemporary { .. }
            | StmtKind::VertexInput { .. }
            | StmtKind::FragmentInput { .. }
            | StmtKind::BuiltInInput { .. }
            | StmtKind::Discard
            | StmtKind::ArgLoad { .. }
            | StmtKind::Rand => {}
        }
    }

    pub fn operands(&self) -> Vec<StmtId> {
        let mut out = Vec::new();
        self.for_each_operand(|id| out.push(id));
        out
    }

    /// Nested blocks owned by this statement, in source order.
    pub fn blocks(&self) -> Vec<&Block> {
        match &self.kind {
            StmtKind::RangeFor { body, .. }
            | StmtKind::While { body }
            | StmtKind::VertexFor { body }
            | StmtKind::FragmentFor { body } => vec![body],
            StmtKind::If {
                true_branch,
                false_branch,
                ..
            } => vec![true_branch, false_branch],
            _ => vec![],
        }
    }

    pub fn blocks_mut(&mut self) -> Vec<&mut Block> {
        match &mut self.kind {
            StmtKind::RangeFor { body, .. }
            | StmtKind::While { body }
            | StmtKind::VertexFor { body }
            | StmtKind::FragmentFor { body } => vec![body],
            StmtKind::If {
                true_branch,
                false_branch,
                ..
            } => vec![true_branch, false_branch],
            _ => vec![],
        }
    }

    /// Short lowercase mnemonic used by emitters and debug output.
    pub fn opcode(&self) -> &'static str {
        match &self.kind {
            StmtKind::Const { .. } => "const",
            StmtKind::RangeFor { .. } => "range_for",
            StmtKind::LoopIndex { .. } => "loop_index",
            StmtKind::While { .. } => "while",
            StmtKind::If { .. } => "if",
            StmtKind::WhileControl => "break",
            StmtKind::Continue => "continue",
            StmtKind::VertexFor { .. } => "vertex_for",
            StmtKind::FragmentFor { .. } => "fragment_for",
            StmtKind::Alloca => "alloca",
            StmtKind::LocalLoad { .. } => "local_load",
            StmtKind::LocalStore { .. } => "local_store",
            StmtKind::GlobalPtr { .. } => "global_ptr",
            StmtKind::GlobalLoad { .. } => "global_load",
            StmtKind::GlobalStore { .. } => "global_store",
            StmtKind::GlobalTemporary { .. } => "gtemp",
            StmtKind::GlobalTemporaryLoad { .. } => "gtemp_load",
            StmtKind::GlobalTemporaryStore { .. } => "gtemp_store",
            StmtKind::AtomicOp { .. } => "atomic",
            StmtKind::AtomicLoad { .. } => "atomic_load",
            StmtKind::AtomicStore { .. } => "atomic_store",
            StmtKind::BinaryOp { .. } => "binary",
            StmtKind::UnaryOp { .. } => "unary",
            StmtKind::VertexInput { .. } => "vertex_input",
            StmtKind::VertexOutput { .. } => "vertex_output",
            StmtKind::FragmentInput { .. } => "fragment_input",
            StmtKind::BuiltInOutput { .. } => "builtin_output",
            StmtKind::BuiltInInput { .. } => "builtin_input",
            StmtKind::FragmentDerivative { .. } => "derivative",
            StmtKind::Discard => "discard",
            StmtKind::TextureFunction { .. } => "texture",
            StmtKind::ArgLoad { .. } => "arg_load",
            StmtKind::Rand => "rand",
            StmtKind::Return { .. } => "return",
            StmtKind::CompositeExtract { .. } => "composite_extract",
        }
    }
}
