use warpir_core::ast::Span;
use warpir_core::instructions::{
    BuiltInInputKind, DerivativeDirection, StmtId, TextureFunctionKind,
};
use warpir_core::resources::Texture;
use warpir_core::types::{PrimitiveType, Type};
use warpir_core::values::{self, Value};

use super::builtins;
use super::context::{LowerContext, Lowered, PipelineBuild, RenderState};
use super::errors::Result;
use super::expression::read_lowered;
use super::scope::HostValue;
use crate::kernel::DepthAttachment;

/// True for names [`apply_intrinsic`] handles. Checked before lowering call
/// arguments, since intrinsic arguments must not be dereferenced up front.
pub fn is_intrinsic_name(name: &str) -> bool {
    builtins::atomic_builtin(name).is_some()
        || matches!(
            name,
            "output_vertex"
                | "output_position"
                | "clear_color"
                | "use_depth"
                | "output_color"
                | "output_depth"
                | "discard"
                | "vertex_index"
                | "instance_index"
                | "frag_coord"
                | "dpdx"
                | "dpdy"
                | "texture_sample"
                | "texture_sample_lod"
                | "texture_sample_compare"
                | "texture_load"
                | "texture_store"
        )
}

/// Handle an atomic or rendering intrinsic call. Arguments arrive lowered
/// but not dereferenced, so destinations stay l-values and textures stay
/// host-side. Returns `None` when the name is not an intrinsic, letting call
/// resolution continue to user functions.
pub fn apply_intrinsic(
    ctx: &mut LowerContext,
    name: &str,
    args: &[Lowered],
    span: Span,
) -> Result<Option<Lowered>> {
    if let Some(op) = builtins::atomic_builtin(name) {
        expect_args(ctx, span, name, args, 2, 2)?;
        let dest = match &args[0] {
            Lowered::Value(value) if value.is_pointer() => value.clone(),
            other => {
                return Err(ctx.error_at(
                    span,
                    format!(
                        "the first argument of {}() must be an l-value, got a {}",
                        name,
                        other.kind_name()
                    ),
                ))
            }
        };
        check_vertex_stage_write(ctx, span, &dest)?;
        let value = read_lowered(ctx, &args[1], span)?;
        let result = builtins::apply_atomic(ctx.builder, op, &dest, &value)?;
        return Ok(Some(Lowered::Value(result)));
    }

    let result = match name {
        "output_vertex" => output_vertex(ctx, args, span)?,
        "output_position" => output_position(ctx, args, span)?,
        "clear_color" => clear_color(ctx, args, span)?,
        "use_depth" => use_depth(ctx, args, span)?,
        "output_color" => output_color(ctx, args, span)?,
        "output_depth" => output_depth(ctx, args, span)?,
        "discard" => discard(ctx, args, span)?,
        "vertex_index" => builtin_index(ctx, args, span, "vertex_index", BuiltInInputKind::VertexIndex)?,
        "instance_index" => {
            builtin_index(ctx, args, span, "instance_index", BuiltInInputKind::InstanceIndex)?
        }
        "frag_coord" => frag_coord(ctx, args, span)?,
        "dpdx" => derivative(ctx, args, span, "dpdx", DerivativeDirection::X)?,
        "dpdy" => derivative(ctx, args, span, "dpdy", DerivativeDirection::Y)?,
        "texture_sample" => texture_sample(ctx, args, span)?,
        "texture_sample_lod" => texture_sample_lod(ctx, args, span)?,
        "texture_sample_compare" => texture_sample_compare(ctx, args, span)?,
        "texture_load" => texture_load(ctx, args, span)?,
        "texture_store" => texture_store(ctx, args, span)?,
        _ => return Ok(None),
    };
    Ok(Some(Lowered::Value(result)))
}

/// Global writes from the vertex stage are rejected; the vertex stage is
/// read-only with respect to fields and temporaries.
pub fn check_vertex_stage_write(ctx: &LowerContext, span: Span, dest: &Value) -> Result<()> {
    if ctx.render.state == RenderState::InVertex {
        if let Type::Pointer(_, true) = dest.ty {
            return Err(ctx.error_at(
                span,
                "the vertex stage is not allowed to write to global fields or temporaries",
            ));
        }
    }
    Ok(())
}

fn output_vertex(ctx: &mut LowerContext, args: &[Lowered], span: Span) -> Result<Value> {
    expect_args(ctx, span, "output_vertex", args, 1, 1)?;
    require_state(
        ctx,
        span,
        RenderState::InVertex,
        "output_vertex() can only be called in a vertex-for loop",
    )?;
    let value = read_lowered(ctx, &args[0], span)?;
    current_pipeline_mut(ctx)?.interpolated_type = Some(value.ty.clone());
    for (location, stmt) in value.stmts.iter().enumerate() {
        ctx.builder.vertex_output(location as u32, *stmt);
    }
    Ok(Value::void())
}

fn output_position(ctx: &mut LowerContext, args: &[Lowered], span: Span) -> Result<Value> {
    expect_args(ctx, span, "output_position", args, 1, 1)?;
    require_state(
        ctx,
        span,
        RenderState::InVertex,
        "output_position() can only be called in a vertex-for loop",
    )?;
    let value = read_lowered(ctx, &args[0], span)?;
    if !matches!(value.ty, Type::Vector(PrimitiveType::F32, 4)) {
        return Err(ctx.error_at(
            span,
            format!(
                "output_position() expects a 4-component f32 vector, got {}",
                value.ty
            ),
        ));
    }
    ctx.builder.position_output(value.stmts.clone());
    Ok(Value::void())
}

fn clear_color(ctx: &mut LowerContext, args: &[Lowered], span: Span) -> Result<Value> {
    expect_args(ctx, span, "clear_color", args, 2, 2)?;
    if !ctx.at_top_level() {
        return Err(ctx.error_at(
            span,
            "clear_color() can only be called at the top level of the kernel",
        ));
    }
    let texture = texture_arg(ctx, span, "clear_color", args, 0)?;
    let value = read_lowered(ctx, &args[1], span)?;
    if !matches!(value.ty, Type::Vector(_, 4)) || !value.is_compile_time_constant() {
        return Err(ctx.error_at(
            span,
            "the clear value must be a compile-time constant 4-component vector",
        ));
    }
    let mut clear = [0.0f32; 4];
    for (slot, constant) in clear.iter_mut().zip(&value.constants) {
        *slot = constant.as_f64() as f32;
    }
    let location = ctx.render.color_attachment_location(texture) as usize;
    ctx.render.pass.color_attachments[location].clear_color = Some(clear);
    Ok(Value::void())
}

fn use_depth(ctx: &mut LowerContext, args: &[Lowered], span: Span) -> Result<Value> {
    expect_args(ctx, span, "use_depth", args, 1, 2)?;
    if !ctx.at_top_level() {
        return Err(ctx.error_at(
            span,
            "use_depth() can only be called at the top level of the kernel",
        ));
    }
    let texture = texture_arg(ctx, span, "use_depth", args, 0)?;
    if !texture.is_depth {
        return Err(ctx.error_at(span, "use_depth() expects a depth texture"));
    }
    let (clear_depth, store_depth) = match args.get(1) {
        Some(options) => depth_options(ctx, span, options)?,
        None => (Some(1.0), true),
    };
    if let Some(existing) = &ctx.render.pass.depth_attachment {
        if existing.texture.id != texture.id {
            return Err(ctx.error_at(
                span,
                "a depth attachment is already configured with a different texture",
            ));
        }
    }
    ctx.render.pass.depth_attachment = Some(DepthAttachment {
        texture,
        clear_depth,
        store_depth,
    });
    Ok(Value::void())
}

fn depth_options(
    ctx: &LowerContext,
    span: Span,
    options: &Lowered,
) -> Result<(Option<f32>, bool)> {
    let mut clear_depth = Some(1.0f32);
    let mut store_depth = true;
    match options {
        Lowered::Host(HostValue::Object(members)) => {
            for (key, value) in members {
                match (key.as_str(), value) {
                    ("clear_depth", HostValue::Number(n)) => clear_depth = Some(*n as f32),
                    ("store_depth", HostValue::Bool(b)) => store_depth = *b,
                    ("store_depth", HostValue::Number(n)) => store_depth = *n != 0.0,
                    _ => {
                        return Err(ctx.error_at(
                            span,
                            format!("invalid use_depth() option `{}`", key),
                        ))
                    }
                }
            }
        }
        Lowered::Value(value) => {
            let Type::Struct(members) = &value.ty else {
                return Err(ctx.error_at(
                    span,
                    "use_depth() options must be an object with clear_depth/store_depth",
                ));
            };
            for name in members.members.keys() {
                let member = values::struct_member(value, name).ok_or_else(|| {
                    ctx.error_at(span, format!("invalid use_depth() option `{}`", name))
                })?;
                let constant = member.scalar_const_val().ok_or_else(|| {
                    ctx.error_at(
                        span,
                        "use_depth() options must be compile-time constant scalars",
                    )
                })?;
                match name.as_str() {
                    "clear_depth" => clear_depth = Some(constant.as_f64() as f32),
                    "store_depth" => store_depth = constant.is_truthy(),
                    other => {
                        return Err(ctx.error_at(
                            span,
                            format!("invalid use_depth() option `{}`", other),
                        ))
                    }
                }
            }
        }
        other => {
            return Err(ctx.error_at(
                span,
                format!(
                    "use_depth() options must be an object with clear_depth/store_depth, got a {}",
                    other.kind_name()
                ),
            ))
        }
    }
    Ok((clear_depth, store_depth))
}

fn output_color(ctx: &mut LowerContext, args: &[Lowered], span: Span) -> Result<Value> {
    expect_args(ctx, span, "output_color", args, 2, 2)?;
    require_state(
        ctx,
        span,
        RenderState::InFragment,
        "output_color() can only be called in a fragment-for loop",
    )?;
    let texture = texture_arg(ctx, span, "output_color", args, 0)?;
    if texture.is_depth {
        return Err(ctx.error_at(
            span,
            "a depth texture cannot be used as a color attachment",
        ));
    }
    let value = read_lowered(ctx, &args[1], span)?;
    if !matches!(value.ty, Type::Vector(PrimitiveType::F32, 1 | 2 | 4)) {
        return Err(ctx.error_at(
            span,
            format!(
                "output_color() expects an f32 vector of 1, 2, or 4 components, got {}",
                value.ty
            ),
        ));
    }
    let location = ctx.render.color_attachment_location(texture);
    ctx.builder.color_output(location, value.stmts.clone());
    Ok(Value::void())
}

fn output_depth(ctx: &mut LowerContext, args: &[Lowered], span: Span) -> Result<Value> {
    expect_args(ctx, span, "output_depth", args, 1, 1)?;
    require_state(
        ctx,
        span,
        RenderState::InFragment,
        "output_depth() can only be called in a fragment-for loop",
    )?;
    if ctx.render.pass.depth_attachment.is_none() {
        return Err(ctx.error_at(
            span,
            "output_depth() requires a depth attachment; call use_depth() first",
        ));
    }
    let value = read_lowered(ctx, &args[0], span)?;
    if !matches!(value.ty, Type::Scalar(PrimitiveType::F32)) {
        return Err(ctx.error_at(
            span,
            format!("output_depth() expects an f32 scalar, got {}", value.ty),
        ));
    }
    ctx.builder.depth_output(value.stmts[0]);
    Ok(Value::void())
}

fn discard(ctx: &mut LowerContext, args: &[Lowered], span: Span) -> Result<Value> {
    expect_args(ctx, span, "discard", args, 0, 0)?;
    require_state(
        ctx,
        span,
        RenderState::InFragment,
        "discard() can only be called in a fragment-for loop",
    )?;
    ctx.builder.discard();
    Ok(Value::void())
}

fn builtin_index(
    ctx: &mut LowerContext,
    args: &[Lowered],
    span: Span,
    name: &str,
    kind: BuiltInInputKind,
) -> Result<Value> {
    expect_args(ctx, span, name, args, 0, 0)?;
    require_state(
        ctx,
        span,
        RenderState::InVertex,
        format!("{}() can only be called in a vertex-for loop", name),
    )?;
    let stmt = ctx.builder.builtin_input(kind);
    Ok(Value::scalar(PrimitiveType::I32, stmt))
}

fn frag_coord(ctx: &mut LowerContext, args: &[Lowered], span: Span) -> Result<Value> {
    expect_args(ctx, span, "frag_coord", args, 0, 0)?;
    require_state(
        ctx,
        span,
        RenderState::InFragment,
        "frag_coord() can only be called in a fragment-for loop",
    )?;
    let input = ctx.builder.builtin_input(BuiltInInputKind::FragCoord);
    let mut stmts = Vec::with_capacity(4);
    for i in 0..BuiltInInputKind::FragCoord.num_components() {
        stmts.push(ctx.builder.composite_extract(input, i)?);
    }
    Ok(Value::new(
        Type::Vector(PrimitiveType::F32, 4),
        stmts,
        Vec::new(),
    ))
}

fn derivative(
    ctx: &mut LowerContext,
    args: &[Lowered],
    span: Span,
    name: &str,
    direction: DerivativeDirection,
) -> Result<Value> {
    expect_args(ctx, span, name, args, 1, 1)?;
    require_state(
        ctx,
        span,
        RenderState::InFragment,
        format!("{}() can only be called in a fragment-for loop", name),
    )?;
    let value = read_lowered(ctx, &args[0], span)?;
    if value.ty.primitive() != Some(PrimitiveType::F32) {
        return Err(ctx.error_at(
            span,
            format!("{}() expects f32 values, got {}", name, value.ty),
        ));
    }
    let stmts = value
        .stmts
        .iter()
        .map(|stmt| ctx.builder.fragment_derivative(direction, *stmt))
        .collect();
    Ok(Value::new(value.ty.clone(), stmts, Vec::new()))
}

fn texture_sample(ctx: &mut LowerContext, args: &[Lowered], span: Span) -> Result<Value> {
    expect_args(ctx, span, "texture_sample", args, 2, 2)?;
    require_state(
        ctx,
        span,
        RenderState::InFragment,
        "texture_sample() can only be called in a fragment-for loop; \
         use texture_sample_lod() elsewhere",
    )?;
    let texture = texture_arg(ctx, span, "texture_sample", args, 0)?;
    let coords = read_lowered(ctx, &args[1], span)?;
    let coord_stmts =
        check_coords(ctx, span, "texture_sample", &texture, &coords, PrimitiveType::F32)?;
    texel_result(ctx, TextureFunctionKind::Sample, texture, coord_stmts)
}

fn texture_sample_lod(ctx: &mut LowerContext, args: &[Lowered], span: Span) -> Result<Value> {
    expect_args(ctx, span, "texture_sample_lod", args, 3, 3)?;
    let texture = texture_arg(ctx, span, "texture_sample_lod", args, 0)?;
    let coords = read_lowered(ctx, &args[1], span)?;
    let mut stmts = check_coords(
        ctx,
        span,
        "texture_sample_lod",
        &texture,
        &coords,
        PrimitiveType::F32,
    )?;
    let lod = read_lowered(ctx, &args[2], span)?;
    if !matches!(lod.ty, Type::Scalar(PrimitiveType::F32)) {
        return Err(ctx.error_at(
            span,
            format!(
                "the level-of-detail argument of texture_sample_lod() must be an f32 scalar, got {}",
                lod.ty
            ),
        ));
    }
    stmts.push(lod.stmts[0]);
    texel_result(ctx, TextureFunctionKind::SampleLod, texture, stmts)
}

fn texture_sample_compare(ctx: &mut LowerContext, args: &[Lowered], span: Span) -> Result<Value> {
    expect_args(ctx, span, "texture_sample_compare", args, 3, 3)?;
    require_state(
        ctx,
        span,
        RenderState::InFragment,
        "texture_sample_compare() can only be called in a fragment-for loop",
    )?;
    let texture = texture_arg(ctx, span, "texture_sample_compare", args, 0)?;
    if !texture.is_depth {
        return Err(ctx.error_at(
            span,
            "texture_sample_compare() requires a depth texture",
        ));
    }
    let coords = read_lowered(ctx, &args[1], span)?;
    let mut stmts = check_coords(
        ctx,
        span,
        "texture_sample_compare",
        &texture,
        &coords,
        PrimitiveType::F32,
    )?;
    let reference = read_lowered(ctx, &args[2], span)?;
    if !matches!(reference.ty, Type::Scalar(PrimitiveType::F32)) {
        return Err(ctx.error_at(
            span,
            format!(
                "the comparison reference of texture_sample_compare() must be an f32 scalar, got {}",
                reference.ty
            ),
        ));
    }
    stmts.push(reference.stmts[0]);
    let result = ctx
        .builder
        .texture_function(TextureFunctionKind::SampleCompare, texture, stmts);
    let extracted = ctx.builder.composite_extract(result, 0)?;
    Ok(Value::scalar(PrimitiveType::F32, extracted))
}

fn texture_load(ctx: &mut LowerContext, args: &[Lowered], span: Span) -> Result<Value> {
    expect_args(ctx, span, "texture_load", args, 2, 2)?;
    let texture = texture_arg(ctx, span, "texture_load", args, 0)?;
    let coords = read_lowered(ctx, &args[1], span)?;
    let coord_stmts =
        check_coords(ctx, span, "texture_load", &texture, &coords, PrimitiveType::I32)?;
    texel_result(ctx, TextureFunctionKind::Load, texture, coord_stmts)
}

fn texture_store(ctx: &mut LowerContext, args: &[Lowered], span: Span) -> Result<Value> {
    expect_args(ctx, span, "texture_store", args, 3, 3)?;
    if ctx.render.state == RenderState::InVertex {
        return Err(ctx.error_at(span, "texture stores are not allowed in the vertex stage"));
    }
    let texture = texture_arg(ctx, span, "texture_store", args, 0)?;
    let coords = read_lowered(ctx, &args[1], span)?;
    let mut stmts =
        check_coords(ctx, span, "texture_store", &texture, &coords, PrimitiveType::I32)?;
    let value = read_lowered(ctx, &args[2], span)?;
    if !matches!(value.ty, Type::Vector(PrimitiveType::F32, 4)) {
        return Err(ctx.error_at(
            span,
            format!(
                "texture_store() expects a 4-component f32 vector value, got {}",
                value.ty
            ),
        ));
    }
    stmts.extend_from_slice(&value.stmts);
    ctx.builder
        .texture_function(TextureFunctionKind::Store, texture, stmts);
    Ok(Value::void())
}

fn texel_result(
    ctx: &mut LowerContext,
    kind: TextureFunctionKind,
    texture: Texture,
    args: Vec<StmtId>,
) -> Result<Value> {
    let result = ctx.builder.texture_function(kind, texture, args);
    let mut stmts = Vec::with_capacity(4);
    for i in 0..kind.num_result_components() {
        stmts.push(ctx.builder.composite_extract(result, i)?);
    }
    Ok(Value::new(
        Type::Vector(PrimitiveType::F32, 4),
        stmts,
        Vec::new(),
    ))
}

fn check_coords(
    ctx: &LowerContext,
    span: Span,
    name: &str,
    texture: &Texture,
    coords: &Value,
    prim: PrimitiveType,
) -> Result<Vec<StmtId>> {
    let needed = texture.num_coords();
    let matches = match &coords.ty {
        Type::Scalar(p) => needed == 1 && *p == prim,
        Type::Vector(p, n) => *n == needed && *p == prim,
        _ => false,
    };
    if !matches {
        return Err(ctx.error_at(
            span,
            format!(
                "{}() expects {} {} coordinate component{}, got {}",
                name,
                needed,
                prim,
                if needed == 1 { "" } else { "s" },
                coords.ty
            ),
        ));
    }
    Ok(coords.stmts.clone())
}

fn texture_arg(
    ctx: &LowerContext,
    span: Span,
    name: &str,
    args: &[Lowered],
    index: usize,
) -> Result<Texture> {
    match args.get(index) {
        Some(Lowered::Host(HostValue::Texture(texture))) => Ok(*texture),
        Some(other) => Err(ctx.error_at(
            span,
            format!(
                "the {} argument of {}() must be a texture visible in kernel scope, got a {}",
                ordinal(index),
                name,
                other.kind_name()
            ),
        )),
        None => Err(ctx.error_at(
            span,
            format!("{}() is missing its {} argument", name, ordinal(index)),
        )),
    }
}

fn current_pipeline_mut<'b>(ctx: &'b mut LowerContext) -> Result<&'b mut PipelineBuild> {
    ctx.render
        .current
        .as_mut()
        .ok_or_else(|| super::errors::CompileError::internal("render pipeline state out of sync"))
}

fn require_state(
    ctx: &LowerContext,
    span: Span,
    state: RenderState,
    message: impl Into<String>,
) -> Result<()> {
    if ctx.render.state == state {
        Ok(())
    } else {
        Err(ctx.error_at(span, message))
    }
}

fn expect_args(
    ctx: &LowerContext,
    span: Span,
    name: &str,
    args: &[Lowered],
    min: usize,
    max: usize,
) -> Result<()> {
    if args.len() >= min && args.len() <= max {
        return Ok(());
    }
    let expected = if min == max {
        format!("{}", min)
    } else {
        format!("{} to {}", min, max)
    };
    Err(ctx.error_at(
        span,
        format!(
            "{}() expects {} argument{}, got {}",
            name,
            expected,
            if max == 1 { "" } else { "s" },
            args.len()
        ),
    ))
}

fn ordinal(index: usize) -> &'static str {
    match index {
        0 => "first",
        1 => "second",
        2 => "third",
        _ => "next",
    }
}
