/*! Core IR types and builders for GPU kernel compilation.
 *
 * Kernels arrive as host-language ASTs and leave as flat lists of offloaded
 * modules a device backend can consume. This crate provides the middle: a
 * tree-shaped IR over two primitives (i32 and f32), the typed value model
 * that flattens vectors, matrices and structs onto those primitives, and the
 * guard-stack builder the frontend drives while walking the AST.
 */

pub mod ast;
pub mod block;
pub mod builder;
pub mod instructions;
pub mod module;
pub mod resources;
pub mod types;
pub mod values;
pub mod visit;

pub use block::Block;
pub use builder::IrBuilder;
pub use instructions::{
    AtomicOp, BinaryOp, BuiltInInputKind, BuiltInOutputKind, DerivativeDirection, Stmt, StmtId,
    StmtKind, TextureFunctionKind, UnaryOp,
};
pub use module::{Module, OffloadKind, OffloadedModule, TripCount};
pub use resources::{Field, Texture};
pub use types::{PrimitiveType, StructType, Type, TypeCategory};
pub use values::{ConstVal, Value};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IrError {
    #[error("Type error: {0}")]
    TypeError(String),
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    #[error("Builder error: {0}")]
    BuilderError(String),
    #[error("Invalid module: {0}")]
    InvalidModule(String),
}

pub type Result<T> = std::result::Result<T, IrError>;

#[cfg(test)]
mod tests;
