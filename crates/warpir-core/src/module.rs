use crate::block::Block;
use crate::instructions::StmtId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One flat compilation unit: the root statement block plus the monotonic
/// statement-id allocator. Passes that materialize new statements draw ids
/// from the same counter so ids stay unique across the whole pipeline.
///
/// Global-temporary slots live here too. Slots are shared by every offloaded
/// module split out of this unit later, so one counter covers them all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Module {
    pub root: Block,
    next_id: u32,
    next_temporary_slot: u32,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: Block, next_id: u32) -> Self {
        Self {
            root,
            next_id,
            next_temporary_slot: 0,
        }
    }

    pub fn alloc_id(&mut self) -> StmtId {
        let id = StmtId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Upper bound (exclusive) of ids allocated so far.
    pub fn id_bound(&self) -> u32 {
        self.next_id
    }

    pub fn alloc_temporary_slot(&mut self) -> u32 {
        let slot = self.next_temporary_slot;
        self.next_temporary_slot += 1;
        slot
    }

    pub fn num_temporary_slots(&self) -> u32 {
        self.next_temporary_slot
    }
}

/// Trip count of an offloaded compute module: either known at compile time or
/// read out of a global-temporary slot the serial prelude stored it in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TripCount {
    Constant(i32),
    TemporarySlot(u32),
}

/// Execution kind of an offloaded module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OffloadKind {
    Serial,
    Compute { trip_count: TripCount },
    Vertex,
    Fragment,
}

impl OffloadKind {
    pub fn is_serial(&self) -> bool {
        matches!(self, OffloadKind::Serial)
    }

    /// Regions whose bodies run once per element of an index domain, with no
    /// ordering between invocations.
    pub fn is_parallel(&self) -> bool {
        !self.is_serial()
    }

    pub fn name(&self) -> &'static str {
        match self {
            OffloadKind::Serial => "serial",
            OffloadKind::Compute { .. } => "compute",
            OffloadKind::Vertex => "vertex",
            OffloadKind::Fragment => "fragment",
        }
    }
}

impl fmt::Display for OffloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One independently dispatchable fragment of a kernel, produced by the
/// offloading pass. Ids inside are renumbered densely from zero so each
/// module is self-contained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OffloadedModule {
    pub kind: OffloadKind,
    pub block: Block,
}

impl OffloadedModule {
    pub fn new(kind: OffloadKind, block: Block) -> Self {
        Self { kind, block }
    }
}
