use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use warpir_core::ast::FunctionDef;
use warpir_core::resources::{Field, Texture};

/// A host-side value visible to kernel code, either through the kernel scope
/// or as a template argument.
///
/// Numbers, booleans, arrays, and plain objects normalize into compile-time
/// constant kernel values on use. Fields, textures, and functions never
/// normalize; they stay host-side and only specific operations (indexing,
/// calling, rendering intrinsics) consume them. `Opaque` carries an identity
/// handle for anything else the host exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HostValue {
    Number(f64),
    Bool(bool),
    Array(Vec<HostValue>),
    Object(IndexMap<String, HostValue>),
    Field(Field),
    Texture(Texture),
    Function(FunctionDef),
    Opaque(u64),
}

impl HostValue {
    pub fn member(&self, name: &str) -> Option<&HostValue> {
        match self {
            HostValue::Object(members) => members.get(name),
            _ => None,
        }
    }

    pub fn element(&self, index: usize) -> Option<&HostValue> {
        match self {
            HostValue::Array(elements) => elements.get(index),
            _ => None,
        }
    }

    /// Short name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            HostValue::Number(_) => "number",
            HostValue::Bool(_) => "boolean",
            HostValue::Array(_) => "array",
            HostValue::Object(_) => "object",
            HostValue::Field(_) => "field",
            HostValue::Texture(_) => "texture",
            HostValue::Function(_) => "function",
            HostValue::Opaque(_) => "host object",
        }
    }
}

impl From<f64> for HostValue {
    fn from(value: f64) -> Self {
        HostValue::Number(value)
    }
}

impl From<i32> for HostValue {
    fn from(value: i32) -> Self {
        HostValue::Number(value as f64)
    }
}

impl From<bool> for HostValue {
    fn from(value: bool) -> Self {
        HostValue::Bool(value)
    }
}

impl From<Field> for HostValue {
    fn from(field: Field) -> Self {
        HostValue::Field(field)
    }
}

impl From<Texture> for HostValue {
    fn from(texture: Texture) -> Self {
        HostValue::Texture(texture)
    }
}

/// Host values a kernel closes over, captured at kernel-declaration time.
/// Free identifiers in the kernel body resolve here by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KernelScope {
    bindings: IndexMap<String, HostValue>,
}

impl KernelScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<HostValue>) -> &mut Self {
        self.bindings.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&HostValue> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }
}
