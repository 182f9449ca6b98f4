use indexmap::IndexMap;
use warpir_core::ast::{AstStmt, AstStmtKind, Expr, ExprKind, FunctionDef, Ident, Span};
use warpir_core::{Block, Field, OffloadKind, OffloadedModule, PrimitiveType, Texture, Type};
use warpir_emit::{json_string, EmitterConfig, Emitter, KernelEmitter, VerbosityLevel};
use warpir_transform::{
    compile_kernel, ColorAttachment, CompiledKernel, DepthAttachment, KernelScope, KernelSource,
    RenderPassParams, RenderPipelineParams,
};

fn ident(name: &str) -> Ident {
    Ident {
        name: name.into(),
        symbol: None,
        span: Span::default(),
    }
}

fn expr(kind: ExprKind) -> Expr {
    Expr {
        kind,
        span: Span::default(),
    }
}

fn var(name: &str) -> Expr {
    expr(ExprKind::Ident(ident(name)))
}

fn int(value: i64) -> Expr {
    expr(ExprKind::IntLiteral(value))
}

/// for (i of range(16)) f[i] = i
fn fill_kernel() -> KernelSource {
    let range = expr(ExprKind::Call {
        callee: Box::new(var("range")),
        args: vec![int(16)],
    });
    let target = expr(ExprKind::Index {
        object: Box::new(var("f")),
        indices: vec![var("i")],
    });
    let store = AstStmt::new(
        AstStmtKind::Assign {
            target,
            op: warpir_core::ast::AssignOp::Assign,
            value: var("i"),
        },
        Span::default(),
    );
    let body = vec![AstStmt::new(
        AstStmtKind::ForOf {
            loop_var: ident("i"),
            iterable: range,
            body: vec![store],
        },
        Span::default(),
    )];
    KernelSource::new(
        "",
        FunctionDef {
            params: vec![],
            body,
            span: Span::default(),
        },
    )
}

fn compile_fill() -> CompiledKernel {
    let mut scope = KernelScope::new();
    scope.bind(
        "f",
        Field::new(0, 0, vec![16], Type::Scalar(PrimitiveType::F32)),
    );
    compile_kernel(&fill_kernel(), &scope, &IndexMap::new(), &IndexMap::new()).unwrap()
}

fn render_kernel() -> CompiledKernel {
    CompiledKernel {
        modules: vec![
            OffloadedModule::new(OffloadKind::Vertex, Block::new()),
            OffloadedModule::new(OffloadKind::Fragment, Block::new()),
        ],
        arg_types: vec![],
        return_type: Type::Void,
        num_temporary_slots: 0,
        render_pipelines: vec![RenderPipelineParams {
            vertex_buffer: Field::new(1, 0, vec![3], Type::Vector(PrimitiveType::F32, 2)),
            index_buffer: None,
            interpolated_type: Type::Vector(PrimitiveType::F32, 2),
        }],
        render_pass: Some(RenderPassParams {
            color_attachments: vec![ColorAttachment {
                texture: Texture::new(0, 2, false),
                clear_color: Some([0.0, 0.0, 0.0, 1.0]),
            }],
            depth_attachment: Some(DepthAttachment {
                texture: Texture::new(1, 2, true),
                clear_depth: Some(1.0),
                store_depth: true,
            }),
        }),
    }
}

#[test]
fn test_compiled_kernel_text() {
    let compiled = compile_fill();
    let emitter = KernelEmitter::new(EmitterConfig::plain());
    let text = emitter.kernel_text(&compiled).unwrap();

    assert!(text.contains("// args: none"));
    assert!(text.contains("compute(16) {"));
    assert!(text.contains("global_store"));
    assert!(!text.contains("returns:"));
    assert!(!text.contains("temporary slots:"));
}

#[test]
fn test_quiet_omits_summaries() {
    let mut config = EmitterConfig::plain();
    config.verbosity = VerbosityLevel::Quiet;

    let text = KernelEmitter::new(config)
        .kernel_text(&compile_fill())
        .unwrap();
    assert!(text.starts_with("compute(16) {"));
    assert!(!text.contains("//"));
}

#[test]
fn test_verbose_counts_statements() {
    let mut config = EmitterConfig::plain();
    config.verbosity = VerbosityLevel::Verbose;

    let text = KernelEmitter::new(config)
        .kernel_text(&compile_fill())
        .unwrap();
    assert!(text.contains("// module 0:"));
    assert!(text.contains("statements"));
}

#[test]
fn test_render_state_section() {
    let text = KernelEmitter::new(EmitterConfig::plain())
        .kernel_text(&render_kernel())
        .unwrap();

    assert!(text.contains("vertex {"));
    assert!(text.contains("fragment {"));
    assert!(text.contains("=== render state ==="));
    assert!(text.contains(
        "pipeline 0: vertex buffer field(tree 1, [3], vec2<f32>), interpolated vec2<f32>"
    ));
    assert!(text.contains("color attachment 0: texture(0, 2d), clear (0.0, 0.0, 0.0, 1.0)"));
    assert!(text.contains("depth attachment: texture(1, 2d, depth), clear 1.0, store"));
}

#[test]
fn test_quiet_omits_render_state() {
    let mut config = EmitterConfig::plain();
    config.verbosity = VerbosityLevel::Quiet;

    let text = KernelEmitter::new(config)
        .kernel_text(&render_kernel())
        .unwrap();
    assert!(!text.contains("render state"));
}

#[test]
fn test_trait_emit_matches_inherent_text() {
    let compiled = compile_fill();
    let emitter = KernelEmitter::new(EmitterConfig::plain());

    let mut buffer = Vec::new();
    let mut context = warpir_emit::EmitContext::from_config(&EmitterConfig::plain());
    emitter.emit(&compiled, &mut buffer, &mut context).unwrap();

    assert_eq!(
        String::from_utf8(buffer).unwrap(),
        emitter.kernel_text(&compiled).unwrap()
    );
}

#[test]
fn test_kernel_serializes_to_json() {
    let json = json_string(&compile_fill()).unwrap();
    assert!(json.contains("\"modules\""));
    assert!(json.contains("\"Compute\""));
    assert!(json.contains("\"arg_types\""));
}
