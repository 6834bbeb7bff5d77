mod common;

use common::{first_stmt, json_without, parse_ok};
use phorge_ast::visitor::{walk_expr, Visitor};
use phorge_ast::{Expr, ExprKind, Program, StmtKind};

fn same_shape(brace: &str, colon: &str) {
    let brace = first_stmt(brace);
    let colon = first_stmt(colon);
    assert_eq!(
        json_without(&brace, &["span", "alternative"]),
        json_without(&colon, &["span", "alternative"]),
    );
    assert_ne!(
        json_without(&brace, &["span"]),
        json_without(&colon, &["span"]),
        "the alternative flag should tell the forms apart"
    );
}

#[test]
fn test_alternative_syntax_is_equivalent() {
    same_shape("<?php if ($x) { t(); }", "<?php if ($x): t(); endif;");
    same_shape(
        "<?php if ($a) { a(); } elseif ($b) { b(); } else { c(); }",
        "<?php if ($a): a(); elseif ($b): b(); else: c(); endif;",
    );
    same_shape("<?php while ($i < 3) { $i++; }", "<?php while ($i < 3): $i++; endwhile;");
    same_shape("<?php for ($i = 0; $i < 3; $i++) { f($i); }", "<?php for ($i = 0; $i < 3; $i++): f($i); endfor;");
    same_shape("<?php foreach ($xs as $k => $v) { f($v); }", "<?php foreach ($xs as $k => $v): f($v); endforeach;");
    same_shape("<?php switch ($x) { case 1: f(); }", "<?php switch ($x): case 1: f(); endswitch;");
    same_shape("<?php declare(ticks=1) { f(); }", "<?php declare(ticks=1): f(); enddeclare;");
}

#[test]
fn test_templates_mix_html_and_code() {
    let program = parse_ok("<ul>\n<?php foreach ($items as $item): ?>\n  <li><?= $item ?></li>\n<?php endforeach; ?>\n</ul>\n");
    let kinds: Vec<&str> = program
        .stmts
        .iter()
        .map(|s| match &s.kind {
            StmtKind::InlineHtml(_) => "html",
            StmtKind::Foreach(_) => "foreach",
            other => panic!("unexpected top-level statement {other:?}"),
        })
        .collect();
    assert_eq!(kinds, vec!["html", "foreach", "html"]);

    let StmtKind::Foreach(each) = &program.stmts[1].kind else {
        unreachable!();
    };
    let StmtKind::Block(body) = &each.body.kind else {
        panic!("expected block body");
    };
    assert!(body.iter().any(|s| matches!(s.kind, StmtKind::Echo(_))));
}

#[test]
fn test_close_tag_ends_line_comment() {
    let program = parse_ok("<?php echo 1; // note ?>\n<b>html</b>");
    assert_eq!(program.stmts.len(), 2);
    assert!(matches!(program.stmts[0].kind, StmtKind::Echo(_)));
    assert!(matches!(&program.stmts[1].kind, StmtKind::InlineHtml(html) if html == "<b>html</b>"));
}

#[test]
fn test_namespaces_and_imports() {
    let program = parse_ok(
        r"<?php
namespace App\Http;

use Psr\Log\LoggerInterface as Logger;
use function App\helpers\{format, render};
use const PHP_EOL;

const VERSION = '1.0', DEBUG = false;
",
    );
    assert!(matches!(program.stmts[0].kind, StmtKind::Namespace(_)));
    let StmtKind::Use(first) = &program.stmts[1].kind else {
        panic!("expected use");
    };
    assert_eq!(first.items[0].alias.as_deref(), Some("Logger"));
    let StmtKind::Use(functions) = &program.stmts[2].kind else {
        panic!("expected use");
    };
    assert_eq!(functions.kind, phorge_ast::UseKind::Function);
    let names: Vec<String> = functions.items.iter().map(|i| i.name.to_string()).collect();
    assert_eq!(names, vec![r"App\helpers\format", r"App\helpers\render"]);

    let StmtKind::Const(consts) = &program.stmts[4].kind else {
        panic!("expected const");
    };
    assert_eq!(consts.clauses.len(), 2);
    assert!(consts.clauses.iter().all(|c| c.visibility == phorge_ast::Visibility::Public));
}

#[derive(Default)]
struct VariableCounter {
    names: Vec<String>,
}

impl Visitor for VariableCounter {
    fn visit_expr(&mut self, expr: &Expr) {
        if let ExprKind::Variable(name) = &expr.kind {
            self.names.push(name.clone());
        }
        walk_expr(self, expr);
    }
}

#[test]
fn test_visitor_reaches_nested_statements() {
    let program: Program = parse_ok(
        "<?php function f($a) { if ($a) { foreach ($a as $b) { echo $b . $c; } } return fn() => $d; }",
    );
    let mut counter = VariableCounter::default();
    counter.visit_program(&program);
    assert_eq!(counter.names, vec!["a", "a", "b", "b", "c", "d"]);
}
