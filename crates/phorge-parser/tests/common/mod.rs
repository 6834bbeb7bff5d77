#![allow(dead_code)]

use phorge_ast::{Expr, Program, Stmt, StmtKind};
use phorge_parser::{parse, ParseError};
use serde_json::Value;

pub fn parse_ok(source: &str) -> Program {
    let result = parse(source);
    assert!(
        result.errors.is_empty(),
        "Unexpected errors for {source:?}: {:#?}",
        result.errors
    );
    result.program
}

pub fn parse_with_errors(source: &str) -> (Program, Vec<ParseError>) {
    let result = parse(source);
    assert!(!result.errors.is_empty(), "Expected errors for {source:?} but got none");
    (result.program, result.errors)
}

pub fn messages(errors: &[ParseError]) -> String {
    errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("\n")
}

/// The expression of the first statement, which must be an expression
/// statement.
pub fn expr(source: &str) -> Expr {
    let program = parse_ok(&format!("<?php {source};"));
    match program.stmts.into_iter().next().map(|s| s.kind) {
        Some(StmtKind::Expression(expr)) => expr,
        other => panic!("expected an expression statement, got {other:?}"),
    }
}

pub fn sexpr(source: &str) -> String {
    expr(source).sexpr()
}

pub fn first_stmt(source: &str) -> Stmt {
    let program = parse_ok(source);
    program
        .stmts
        .into_iter()
        .next()
        .unwrap_or_else(|| panic!("no statements in {source:?}"))
}

/// JSON form of `value` with every key in `drop` removed at any depth.
/// Trees that only differ in offsets (or in the dropped flags) compare
/// equal afterwards.
pub fn json_without<T: serde::Serialize>(value: &T, drop: &[&str]) -> Value {
    let mut json = serde_json::to_value(value).unwrap();
    strip(&mut json, drop);
    json
}

fn strip(value: &mut Value, drop: &[&str]) {
    match value {
        Value::Object(map) => {
            map.retain(|key, _| !drop.contains(&key.as_str()));
            for child in map.values_mut() {
                strip(child, drop);
            }
        }
        Value::Array(items) => {
            for item in items {
                strip(item, drop);
            }
        }
        _ => {}
    }
}
