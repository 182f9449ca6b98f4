use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

use warpir_core::ast::{AstStmt, AstStmtKind, Expr, ExprKind, FunctionDef, Ident, Span};
use warpir_core::{Field, PrimitiveType, Type};
use warpir_transform::{KernelScope, KernelSource};

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

fn source(body: Vec<AstStmt>) -> KernelSource {
    KernelSource::new(
        "",
        FunctionDef {
            params: vec![],
            body,
            span: Span::default(),
        },
    )
}

/// for (i of range(16)) f[i] = i, with f bound to a length-16 f32 field.
fn fill_bundle() -> serde_json::Value {
    let range = expr(ExprKind::Call {
        callee: Box::new(var("range")),
        args: vec![expr(ExprKind::IntLiteral(16))],
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

    let mut scope = KernelScope::new();
    scope.bind(
        "f",
        Field::new(0, 0, vec![16], Type::Scalar(PrimitiveType::F32)),
    );

    serde_json::json!({
        "source": source(body),
        "scope": scope,
    })
}

/// References an identifier nothing binds, so compilation must fail.
fn broken_bundle() -> serde_json::Value {
    let body = vec![AstStmt::new(
        AstStmtKind::ExprStmt(var("missing")),
        Span::default(),
    )];
    serde_json::json!({ "source": source(body) })
}

fn write_bundle(dir: &tempfile::TempDir, bundle: &serde_json::Value) -> PathBuf {
    let path = dir.path().join("kernel.json");
    std::fs::write(&path, bundle.to_string()).unwrap();
    path
}

fn warpir() -> Command {
    Command::cargo_bin("warpir").unwrap()
}

#[test]
fn test_compile_prints_ir() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_bundle(&dir, &fill_bundle());

    warpir()
        .arg("compile")
        .arg(&path)
        .arg("--no-color")
        .assert()
        .success()
        .stdout(predicate::str::contains("compute(16) {"))
        .stdout(predicate::str::contains("global_store"));
}

#[test]
fn test_compile_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_bundle(&dir, &fill_bundle());

    warpir()
        .arg("compile")
        .arg(&path)
        .arg("--format")
        .arg("json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"modules\""))
        .stdout(predicate::str::contains("\"Compute\""));
}

#[test]
fn test_compile_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_bundle(&dir, &fill_bundle());
    let out = dir.path().join("kernel.ir");

    warpir()
        .arg("compile")
        .arg(&path)
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.contains("compute(16) {"));
}

#[test]
fn test_quiet_omits_interface() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_bundle(&dir, &fill_bundle());

    warpir()
        .arg("compile")
        .arg(&path)
        .arg("--no-color")
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::contains("// args").not());
}

#[test]
fn test_validate_ok() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_bundle(&dir, &fill_bundle());

    warpir()
        .arg("validate")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("VALID"));
}

#[test]
fn test_validate_rejects_broken_kernel() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_bundle(&dir, &broken_bundle());

    warpir()
        .arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("INVALID"));
}

#[test]
fn test_debug_lists_modules() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_bundle(&dir, &fill_bundle());

    warpir()
        .arg("debug")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 1 module(s)"))
        .stdout(predicate::str::contains("Temporary slots: 0"));
}

#[test]
fn test_missing_input_fails() {
    warpir()
        .arg("compile")
        .arg("does-not-exist.json")
        .assert()
        .failure();
}

#[test]
fn test_unknown_format_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_bundle(&dir, &fill_bundle());

    warpir()
        .arg("compile")
        .arg(&path)
        .arg("--format")
        .arg("yaml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}
