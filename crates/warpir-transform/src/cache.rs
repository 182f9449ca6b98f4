use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::kernel::{ArgSpec, CompiledKernel, KernelSource, SourceDigest};
use crate::kernel_to_ir::{compile_kernel, HostValue, KernelScope, Result};

/// One compiled specialization and the template arguments that produced it.
#[derive(Debug, Clone)]
struct CachedInstance {
    template_args: Vec<(String, HostValue)>,
    kernel: Arc<CompiledKernel>,
}

/// Reuses compiled kernels across launches.
///
/// Kernels are keyed by the digest of their trimmed source text, so the same
/// kernel body registered twice shares one entry. Under each entry there is
/// one instance per distinct template-argument assignment, matched by
/// structural equality of the full assignment in both directions.
#[derive(Debug, Default)]
pub struct SpecializationCache {
    kernels: HashMap<SourceDigest, Vec<CachedInstance>>,
}

impl SpecializationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A previously compiled specialization of `source` under exactly these
    /// template arguments.
    pub fn lookup(
        &self,
        source: &KernelSource,
        template_args: &IndexMap<String, HostValue>,
    ) -> Option<Arc<CompiledKernel>> {
        let instances = self.kernels.get(&source.fingerprint())?;
        instances
            .iter()
            .find(|instance| args_match(&instance.template_args, template_args))
            .map(|instance| Arc::clone(&instance.kernel))
    }

    pub fn insert(
        &mut self,
        source: &KernelSource,
        template_args: &IndexMap<String, HostValue>,
        kernel: Arc<CompiledKernel>,
    ) {
        let instance = CachedInstance {
            template_args: template_args
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            kernel,
        };
        self.kernels
            .entry(source.fingerprint())
            .or_default()
            .push(instance);
    }

    /// Look up or compile: the specialization for these template arguments,
    /// compiling and caching it on a miss.
    pub fn specialize(
        &mut self,
        source: &KernelSource,
        scope: &KernelScope,
        arg_specs: &IndexMap<String, ArgSpec>,
        template_args: &IndexMap<String, HostValue>,
    ) -> Result<Arc<CompiledKernel>> {
        if let Some(kernel) = self.lookup(source, template_args) {
            tracing::debug!(template_args = template_args.len(), "specialization cache hit");
            return Ok(kernel);
        }
        tracing::debug!(template_args = template_args.len(), "specialization cache miss");
        let kernel = Arc::new(compile_kernel(source, scope, arg_specs, template_args)?);
        self.insert(source, template_args, Arc::clone(&kernel));
        Ok(kernel)
    }

    /// Number of cached specializations across all kernels.
    pub fn len(&self) -> usize {
        self.kernels.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// With the length check this is set equality: cached pairs and the requested
/// map must contain exactly the same assignments.
fn args_match(cached: &[(String, HostValue)], requested: &IndexMap<String, HostValue>) -> bool {
    cached.len() == requested.len()
        && cached
            .iter()
            .all(|(name, value)| requested.get(name) == Some(value))
}
