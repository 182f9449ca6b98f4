use crate::types::Type;
use serde::{Deserialize, Serialize};

/// Descriptor of an externally owned field resource.
///
/// Allocation and GPU layout belong to the embedding runtime; the compiler
/// only needs the element type (for flattened addressing), the shape (for
/// index arity), and identity. Fields placed in the same storage tree share
/// one GPU buffer, so `tree_id` is the unit of atomicity analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub tree_id: u32,
    pub offset_in_tree: u32,
    pub shape: Vec<u32>,
    pub element_type: Type,
}

impl Field {
    pub fn new(tree_id: u32, offset_in_tree: u32, shape: Vec<u32>, element_type: Type) -> Self {
        Self {
            tree_id,
            offset_in_tree,
            shape,
            element_type,
        }
    }

    pub fn num_dimensions(&self) -> usize {
        self.shape.len()
    }

    pub fn num_elements(&self) -> u64 {
        self.shape.iter().map(|&d| d as u64).product()
    }
}

/// Descriptor of an externally owned texture resource. Coordinate arity for
/// sampling and loads equals the dimensionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Texture {
    pub id: u32,
    pub num_dimensions: u32,
    pub is_depth: bool,
}

impl Texture {
    pub fn new(id: u32, num_dimensions: u32, is_depth: bool) -> Self {
        Self {
            id,
            num_dimensions,
            is_depth,
        }
    }

    pub fn num_coords(&self) -> u32 {
        self.num_dimensions
    }
}
