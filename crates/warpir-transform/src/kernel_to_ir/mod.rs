/*! Lowering from the host syntax tree to offloaded IR modules.
 *
 * [`compile_kernel`] drives the whole frontend: it resolves bindings,
 * registers kernel arguments, lowers the body through the guard-stack
 * builder, runs the pass pipeline, and splits the result into offloaded
 * modules with densely renumbered ids.
 */

mod builtins;
mod context;
mod errors;
mod expression;
mod intrinsics;
mod library;
mod resolve;
mod scope;
mod statement;


pub use errors::{CompileError, Result};
pub use scope::{HostValue, KernelScope};

use indexmap::IndexMap;

use warpir_core::builder::IrBuilder;
use warpir_core::types::{PrimitiveType, Type};
use warpir_core::values::Value;

use crate::kernel::{ArgSpec, CompiledKernel, KernelSource};
use crate::passes::{default_pipeline, offload_module, RemapIds};
use context::{LowerContext, Lowered, RenderState};

/// Compile one kernel specialization.
///
/// `arg_specs` maps parameter names to their declared argument specs;
/// parameters without one default to f32 scalars. `template_args` supplies
/// a host value for every [`ArgSpec::Template`] parameter, and those values
/// specialize the kernel at compile time instead of being passed at launch.
pub fn compile_kernel(
    source: &KernelSource,
    scope: &KernelScope,
    arg_specs: &IndexMap<String, ArgSpec>,
    template_args: &IndexMap<String, HostValue>,
) -> Result<CompiledKernel> {
    let mut def = source.def.clone();
    let mut builder = IrBuilder::new();
    let mut ctx = LowerContext::new(&mut builder, &source.text, scope);
    ctx.resolver.resolve_function(&mut def);

    for name in arg_specs.keys() {
        if !def.params.iter().any(|param| param.ident.name == *name) {
            return Err(CompileError::TypeError(format!(
                "invalid argument type annotations: `{}` is not a parameter of the kernel",
                name
            )));
        }
    }
    let mut template_params = Vec::new();
    let mut arg_cursor = 0u32;
    for param in &def.params {
        let Some(symbol) = param.ident.symbol else {
            return Err(CompileError::internal(format!(
                "parameter `{}` has no binding id",
                param.ident.name
            )));
        };
        let spec = arg_specs
            .get(&param.ident.name)
            .cloned()
            .unwrap_or(ArgSpec::Value(Type::Scalar(PrimitiveType::F32)));
        match spec {
            ArgSpec::Template => {
                let Some(value) = template_args.get(&param.ident.name) else {
                    return Err(CompileError::TypeError(format!(
                        "missing template argument `{}`",
                        param.ident.name
                    )));
                };
                template_params.push(param.ident.name.clone());
                ctx.template_values
                    .insert(param.ident.name.clone(), value.clone());
            }
            ArgSpec::Value(ty) => {
                let mut stmts = Vec::with_capacity(ty.num_primitives());
                for prim in ty.primitives_list() {
                    stmts.push(ctx.builder.arg_load(prim, arg_cursor));
                    arg_cursor += 1;
                }
                ctx.bind(symbol, Lowered::Value(Value::new(ty.clone(), stmts, vec![])));
                ctx.arg_types.push(ty);
            }
        }
    }
    for name in template_args.keys() {
        if !template_params.contains(name) {
            return Err(CompileError::TypeError(format!(
                "`{}` is not a template parameter of the kernel",
                name
            )));
        }
    }

    statement::lower_stmts(&mut ctx, &def.body)?;

    let arg_types = std::mem::take(&mut ctx.arg_types);
    let return_type = std::mem::replace(&mut ctx.return_type, Type::Void);
    let render = std::mem::take(&mut ctx.render);
    drop(ctx);
    if render.state != RenderState::NotStarted {
        return Err(CompileError::TypeError(
            "a vertex-for loop must be followed by a fragment-for loop".into(),
        ));
    }

    let mut module = builder.finish()?;
    default_pipeline()
        .run(&mut module)
        .map_err(|err| CompileError::internal(format!("{:#}", err)))?;
    let num_temporary_slots = module.num_temporary_slots();
    let mut modules =
        offload_module(module).map_err(|err| CompileError::internal(format!("{:#}", err)))?;
    for module in &mut modules {
        RemapIds
            .run(module)
            .map_err(|err| CompileError::internal(format!("{:#}", err)))?;
    }

    let render_pass = (!render.pipelines.is_empty()).then_some(render.pass);
    Ok(CompiledKernel {
        modules,
        arg_types,
        return_type,
        num_temporary_slots,
        render_pipelines: render.pipelines,
        render_pass,
    })
}
