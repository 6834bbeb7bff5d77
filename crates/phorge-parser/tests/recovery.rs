mod common;

use common::{messages, parse_with_errors};
use phorge_ast::{ClassMemberKind, StmtKind};
use phorge_parser::{parse, parse_with, DiagnosticKind, ParseError, ParserConfig};

fn kinds(errors: &[ParseError]) -> Vec<DiagnosticKind> {
    errors.iter().map(|e| e.kind()).collect()
}

#[test]
fn test_stray_paren_is_isolated() {
    let (program, errors) = parse_with_errors("<?php\n$a = 1;\nfoo());\n$b = 2;\n");
    insta::assert_snapshot!(messages(&errors), @"3:6: expected ';' after expression, found ')'");
    assert_eq!(program.stmts.len(), 3);
    assert!(program
        .stmts
        .iter()
        .all(|s| matches!(s.kind, StmtKind::Expression(_))));
}

#[test]
fn test_missing_semicolon_keeps_next_statement() {
    let (program, errors) = parse_with_errors("<?php $a = 1\n$b = 2;");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().starts_with("2:1: expected ';' after expression"));
    assert_eq!(program.stmts.len(), 2);
}

#[test]
fn test_missing_operand_becomes_error_statement() {
    let (program, errors) = parse_with_errors("<?php $x = ;\necho 'after';");
    assert_eq!(kinds(&errors), vec![DiagnosticKind::NoPrefixParslet]);
    assert!(matches!(program.stmts[0].kind, StmtKind::Error));
    assert!(matches!(program.stmts[1].kind, StmtKind::Echo(_)));
}

#[test]
fn test_broken_method_body_keeps_class() {
    let (program, errors) =
        parse_with_errors("<?php class A { public function f() { return 1 } public $ok; } echo 2;");
    assert_eq!(errors.len(), 1, "{}", messages(&errors));
    let StmtKind::Class(class) = &program.stmts[0].kind else {
        panic!("expected class, got {:?}", program.stmts[0].kind);
    };
    assert_eq!(class.members.len(), 2);
    assert!(matches!(&class.members[1].kind, ClassMemberKind::Property(p) if p.name == "ok"));
    assert!(matches!(program.stmts[1].kind, StmtKind::Echo(_)));
}

#[test]
fn test_unclosed_block_points_at_opener() {
    let (_, errors) = parse_with_errors("<?php function f() {\n$a = 1;\n");
    let unclosed = errors
        .iter()
        .find(|e| matches!(e, ParseError::UnclosedDelimiter { .. }))
        .unwrap_or_else(|| panic!("no unclosed delimiter in {}", messages(&errors)));
    assert!(unclosed.to_string().contains("opened at 1:20"), "{unclosed}");
}

#[test]
fn test_lexer_errors_are_forwarded() {
    let result = parse("<?php $a = 1 \u{1};\n$b = 2;");
    assert_eq!(kinds(&result.errors), vec![DiagnosticKind::Lexical]);
    assert!(result.errors[0].to_string().contains("unexpected character"));
    assert_eq!(result.program.stmts.len(), 2);
}

#[test]
fn test_nesting_limit_is_reported_not_overflowed() {
    let source = format!("<?php $x = {}1{};", "(".repeat(200), ")".repeat(200));
    let result = parse_with(&source, &ParserConfig::default().with_max_depth(32));
    assert!(result
        .errors
        .iter()
        .any(|e| e.to_string().ends_with("nesting deeper than 32 levels")));
    assert_eq!(result.program.stmts.len(), 1);
}

#[test]
fn test_variable_variable_chain_respects_nesting_limit() {
    let source = format!("<?php {}a;\n$b = 1;", "$".repeat(10_000));
    let result = parse_with(&source, &ParserConfig::default().with_max_depth(32));
    assert!(result
        .errors
        .iter()
        .any(|e| e.to_string().ends_with("nesting deeper than 32 levels")));
    let stmts = &result.program.stmts;
    assert_eq!(stmts.len(), 2);
    assert!(matches!(stmts[0].kind, StmtKind::Error));
    assert!(matches!(stmts[1].kind, StmtKind::Expression(_)));
}

#[test]
fn test_deep_type_groups_respect_nesting_limit() {
    let source = format!(
        "<?php function f({}A&B{} $x) {{}}\necho 1;",
        "(".repeat(10_000),
        ")".repeat(10_000)
    );
    let result = parse_with(&source, &ParserConfig::default().with_max_depth(32));
    assert!(result
        .errors
        .iter()
        .any(|e| e.to_string().ends_with("nesting deeper than 32 levels")));
    assert!(matches!(result.program.stmts.last().map(|s| &s.kind), Some(StmtKind::Echo(_))));
}

#[test]
fn test_repeated_nullable_marks_in_a_union_do_not_recurse() {
    let source = format!("<?php function f(A|{}B $x) {{}}", "? ".repeat(50_000));
    let result = parse(&source);
    assert!(result.suppressed_errors > 0);
    let StmtKind::Function(function) = &result.program.stmts[0].kind else {
        panic!("expected function, got {:?}", result.program.stmts[0].kind);
    };
    let hint = function.params[0].type_hint.as_ref().map(|t| t.to_string());
    assert_eq!(hint.as_deref(), Some("A|B"));
}

#[test]
fn test_dangling_modifier_keeps_class_closed() {
    let (program, errors) =
        parse_with_errors("<?php class A { public } class B { #[Attr] } function f() {} echo 1;");
    assert_eq!(errors.len(), 2, "{}", messages(&errors));
    assert!(errors
        .iter()
        .all(|e| e.to_string().contains("expected class member, found '}'")));
    let kinds: Vec<&str> = program
        .stmts
        .iter()
        .map(|s| match &s.kind {
            StmtKind::Class(class) if class.members.is_empty() => "class",
            StmtKind::Function(_) => "function",
            StmtKind::Echo(_) => "echo",
            other => panic!("unexpected statement {other:?}"),
        })
        .collect();
    assert_eq!(kinds, vec!["class", "class", "function", "echo"]);
}

#[test]
fn test_garbage_always_yields_a_program() {
    for source in [
        "",
        "<?php",
        "<?php )))",
        "<?php }}}",
        "<?php class {",
        "<?php function (",
        "<?php match",
        "<?php if (: else",
        "<?php $a->",
        "<?php \"unterminated {$x",
        "<?php #[",
        "<?php use A\\{",
        "<?php enum E: { case }",
    ] {
        let result = parse(source);
        assert!(
            result.program.span.end as usize <= source.len(),
            "{source:?}: {:?}",
            result.program.span
        );
        if source.len() > "<?php".len() {
            assert!(result.has_errors(), "{source:?} parsed without diagnostics");
        }
    }
}
