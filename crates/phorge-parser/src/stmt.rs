//! Statements, including the alternative `: ... end*;` forms of the
//! control structures.

use phorge_ast::*;
use phorge_lexer::TokenKind;

use crate::decl;
use crate::expr;
use crate::parser::Parser;

/// Statements up to (not including) one of `terminators` or the end of
/// input. Open and close tags between statements are dropped.
pub(crate) fn parse_statement_list(p: &mut Parser<'_>, terminators: &[TokenKind]) -> Vec<Stmt> {
    let mut stmts = Vec::new();
    loop {
        p.skip_tags();
        let kind = p.current_kind();
        if kind == TokenKind::Eof || terminators.contains(&kind) {
            break;
        }
        let before = p.start_span();
        stmts.push(parse_stmt(p));
        if p.start_span() == before && !p.check(TokenKind::Eof) {
            tracing::debug!(token = %p.current_kind(), offset = before, "statement made no progress");
            p.advance();
        }
    }
    stmts
}

/// One statement. Never fails: a statement that cannot be parsed is
/// reported, skipped up to the next boundary and returned as `Error`.
pub fn parse_stmt(p: &mut Parser<'_>) -> Stmt {
    let start = p.start_span();
    if !p.enter() {
        p.synchronize();
        return Stmt {
            kind: StmtKind::Error,
            span: p.end_span(start),
        };
    }
    let stmt = match statement(p, start) {
        Some(stmt) => stmt,
        None => {
            tracing::debug!(offset = start, token = %p.current_kind(), "resynchronising after a statement error");
            p.synchronize();
            Stmt {
                kind: StmtKind::Error,
                span: p.end_span(start),
            }
        }
    };
    p.leave();
    stmt
}

fn statement(p: &mut Parser<'_>, start: u32) -> Option<Stmt> {
    match p.current_kind() {
        TokenKind::Semicolon => {
            p.advance();
            Some(finish(p, start, StmtKind::Nop))
        }
        TokenKind::InlineHtml => {
            let token = p.advance();
            Some(finish(p, start, StmtKind::InlineHtml(token.text.to_string())))
        }
        TokenKind::Echo | TokenKind::OpenTagWithEcho => parse_echo(p, start),
        TokenKind::Return => parse_return(p, start),
        TokenKind::LeftBrace => parse_block(p, start),
        TokenKind::If => parse_if(p, start),
        TokenKind::While => parse_while(p, start),
        TokenKind::Do => parse_do_while(p, start),
        TokenKind::For => parse_for(p, start),
        TokenKind::Foreach => parse_foreach(p, start),
        TokenKind::Switch => parse_switch(p, start),
        TokenKind::Break => parse_jump(p, start, StmtKind::Break),
        TokenKind::Continue => parse_jump(p, start, StmtKind::Continue),
        TokenKind::Try => parse_try(p, start),
        TokenKind::Goto => parse_goto(p, start),
        TokenKind::Declare => parse_declare(p, start),
        TokenKind::Unset => parse_unset(p, start),
        TokenKind::Global => parse_global(p, start),
        TokenKind::Static if p.peek_kind() == TokenKind::Variable => parse_static_vars(p, start),
        TokenKind::Function if !closure_ahead(p) => decl::parse_function(p, Vec::new(), start),
        TokenKind::Readonly if !class_ahead(p) => parse_expression_stmt(p, start),
        TokenKind::Class
        | TokenKind::Abstract
        | TokenKind::Final
        | TokenKind::Readonly
        | TokenKind::Public
        | TokenKind::Protected
        | TokenKind::Private
        | TokenKind::Var => decl::parse_class(p, Vec::new(), start),
        TokenKind::Interface => decl::parse_interface(p, Vec::new(), start),
        TokenKind::Trait => decl::parse_trait(p, Vec::new(), start),
        TokenKind::Enum_ if p.peek_kind() == TokenKind::Identifier => decl::parse_enum(p, Vec::new(), start),
        TokenKind::Namespace if p.peek_kind() != TokenKind::Backslash => decl::parse_namespace(p, start),
        TokenKind::Use => decl::parse_use(p, start),
        TokenKind::Const => decl::parse_const_statement(p, Vec::new(), start),
        TokenKind::HashBracket => parse_attributed(p, start),
        TokenKind::Identifier if p.peek_kind() == TokenKind::Colon => {
            let label = p.advance();
            p.advance();
            Some(finish(p, start, StmtKind::Label(label.text.to_string())))
        }
        TokenKind::RightBrace => {
            p.unexpected("statement");
            p.advance();
            Some(finish(p, start, StmtKind::Error))
        }
        _ => parse_expression_stmt(p, start),
    }
}

fn finish(p: &Parser<'_>, start: u32, kind: StmtKind) -> Stmt {
    Stmt {
        kind,
        span: p.end_span(start),
    }
}

/// `function (` and `function &(` start a closure, not a declaration.
fn closure_ahead(p: &mut Parser<'_>) -> bool {
    match p.peek_kind() {
        TokenKind::LeftParen => true,
        TokenKind::Ampersand => p.peek2_kind() == TokenKind::LeftParen,
        _ => false,
    }
}

/// `readonly` is also a function name; it only opens a class declaration
/// when more class modifiers or `class` follow.
fn class_ahead(p: &mut Parser<'_>) -> bool {
    matches!(
        p.peek_kind(),
        TokenKind::Class | TokenKind::Final | TokenKind::Abstract
    )
}

fn at_statement_end(p: &Parser<'_>) -> bool {
    matches!(
        p.current_kind(),
        TokenKind::Semicolon | TokenKind::CloseTag | TokenKind::Eof
    )
}

fn parse_expression_stmt(p: &mut Parser<'_>, start: u32) -> Option<Stmt> {
    let expr = p.parse_expression(0)?;
    p.expect_semicolon("expression");
    Some(finish(p, start, StmtKind::Expression(expr)))
}

/// `#[...]` followed by a declaration, or by a closure used as an
/// expression statement.
fn parse_attributed(p: &mut Parser<'_>, start: u32) -> Option<Stmt> {
    let attributes = p.parse_attributes();
    match p.current_kind() {
        TokenKind::Function if !closure_ahead(p) => decl::parse_function(p, attributes, start),
        TokenKind::Readonly if !class_ahead(p) => {
            p.unexpected("declaration after attributes");
            None
        }
        TokenKind::Class | TokenKind::Abstract | TokenKind::Final | TokenKind::Readonly => {
            decl::parse_class(p, attributes, start)
        }
        TokenKind::Interface => decl::parse_interface(p, attributes, start),
        TokenKind::Trait => decl::parse_trait(p, attributes, start),
        TokenKind::Enum_ => decl::parse_enum(p, attributes, start),
        TokenKind::Const => decl::parse_const_statement(p, attributes, start),
        TokenKind::Function | TokenKind::Fn_ | TokenKind::Static => {
            let function = expr::function_after_attributes(p, attributes, start)?;
            let expr = expr::parse_infix_from(p, function, 0)?;
            p.expect_semicolon("expression");
            Some(finish(p, start, StmtKind::Expression(expr)))
        }
        _ => {
            p.unexpected("declaration after attributes");
            None
        }
    }
}

// =============================================================================
// Simple statements
// =============================================================================

/// `echo a, b;` and the `<?= a ?>` short tag.
fn parse_echo(p: &mut Parser<'_>, start: u32) -> Option<Stmt> {
    let keyword = p.advance();
    let mut exprs = vec![p.parse_expression(0)?];
    while p.eat(TokenKind::Comma).is_some() {
        exprs.push(p.parse_expression(0)?);
    }
    let after = if keyword.kind == TokenKind::Echo { "'echo'" } else { "'<?='" };
    p.expect_semicolon(after);
    Some(finish(p, start, StmtKind::Echo(exprs)))
}

fn parse_return(p: &mut Parser<'_>, start: u32) -> Option<Stmt> {
    p.advance();
    let value = if at_statement_end(p) {
        None
    } else {
        Some(p.parse_expression(0)?)
    };
    p.expect_semicolon("'return'");
    Some(finish(p, start, StmtKind::Return(value)))
}

/// `break;`, `continue 2;`
fn parse_jump(p: &mut Parser<'_>, start: u32, kind: fn(Option<Expr>) -> StmtKind) -> Option<Stmt> {
    let keyword = p.advance();
    let levels = if at_statement_end(p) {
        None
    } else {
        Some(p.parse_expression(0)?)
    };
    p.expect_semicolon(&format!("'{}'", keyword.text.to_ascii_lowercase()));
    Some(finish(p, start, kind(levels)))
}

fn parse_block(p: &mut Parser<'_>, start: u32) -> Option<Stmt> {
    let open = p.advance();
    let stmts = parse_statement_list(p, &[TokenKind::RightBrace]);
    p.expect_closing(TokenKind::RightBrace, open)?;
    Some(finish(p, start, StmtKind::Block(stmts)))
}

fn parse_goto(p: &mut Parser<'_>, start: u32) -> Option<Stmt> {
    p.advance();
    let Some((label, _)) = p.eat_identifier_or_keyword() else {
        p.unexpected("label after 'goto'");
        return None;
    };
    p.expect_semicolon("'goto' label");
    Some(finish(p, start, StmtKind::Goto(label)))
}

/// `unset($a, $b[1],);`
fn parse_unset(p: &mut Parser<'_>, start: u32) -> Option<Stmt> {
    p.advance();
    let open = p.expect_after(TokenKind::LeftParen, "'unset'")?;
    let mut targets = Vec::new();
    while !p.check(TokenKind::RightParen) && !p.check(TokenKind::Eof) {
        targets.push(p.parse_expression(0)?);
        if p.eat(TokenKind::Comma).is_none() {
            break;
        }
    }
    p.expect_closing(TokenKind::RightParen, open)?;
    p.expect_semicolon("'unset'");
    Some(finish(p, start, StmtKind::Unset(targets)))
}

fn parse_global(p: &mut Parser<'_>, start: u32) -> Option<Stmt> {
    p.advance();
    let mut vars = vec![p.parse_expression(0)?];
    while p.eat(TokenKind::Comma).is_some() {
        vars.push(p.parse_expression(0)?);
    }
    p.expect_semicolon("'global'");
    Some(finish(p, start, StmtKind::Global(vars)))
}

/// `static $a, $b = 1;`
fn parse_static_vars(p: &mut Parser<'_>, start: u32) -> Option<Stmt> {
    p.advance();
    let mut vars = Vec::new();
    loop {
        let var_start = p.start_span();
        let var = p.expect_after(TokenKind::Variable, "'static'")?;
        let default = match p.eat(TokenKind::Equals) {
            Some(_) => Some(p.parse_expression(0)?),
            None => None,
        };
        vars.push(StaticVar {
            name: expr::variable_name(var.text),
            default,
            span: p.end_span(var_start),
        });
        if p.eat(TokenKind::Comma).is_none() {
            break;
        }
    }
    p.expect_semicolon("static variable");
    Some(finish(p, start, StmtKind::StaticVar(vars)))
}

// =============================================================================
// Control structures
// =============================================================================

/// `( expr )` after a control keyword.
fn parse_condition(p: &mut Parser<'_>, after: &str) -> Option<Expr> {
    let open = p.expect_after(TokenKind::LeftParen, after)?;
    let condition = p.parse_expression(0)?;
    p.expect_closing(TokenKind::RightParen, open)?;
    Some(condition)
}

/// Body of an alternative-syntax branch, wrapped as a block so both
/// surface forms build the same shape.
fn alternative_block(p: &mut Parser<'_>, terminators: &[TokenKind]) -> Stmt {
    let start = p.start_span();
    let stmts = parse_statement_list(p, terminators);
    finish(p, start, StmtKind::Block(stmts))
}

/// `endwhile;` and friends.
fn expect_end(p: &mut Parser<'_>, end: TokenKind, construct: &str) -> Option<()> {
    p.expect_after(end, &format!("'{construct}' body"))?;
    p.expect_semicolon(&end.to_string());
    Some(())
}

fn parse_if(p: &mut Parser<'_>, start: u32) -> Option<Stmt> {
    p.advance();
    let condition = parse_condition(p, "'if'")?;

    if p.eat(TokenKind::Colon).is_some() {
        const BRANCH_ENDS: &[TokenKind] = &[TokenKind::ElseIf, TokenKind::Else, TokenKind::EndIf];
        let then_branch = alternative_block(p, BRANCH_ENDS);
        let mut elseif_branches = Vec::new();
        while p.check(TokenKind::ElseIf) {
            let branch_start = p.start_span();
            p.advance();
            let condition = parse_condition(p, "'elseif'")?;
            p.expect_after(TokenKind::Colon, "'elseif' condition")?;
            let body = alternative_block(p, BRANCH_ENDS);
            elseif_branches.push(ElseIfBranch {
                condition,
                body,
                span: p.end_span(branch_start),
            });
        }
        let else_branch = match p.eat(TokenKind::Else) {
            Some(_) => {
                p.expect_after(TokenKind::Colon, "'else'")?;
                Some(Box::new(alternative_block(p, &[TokenKind::EndIf])))
            }
            None => None,
        };
        expect_end(p, TokenKind::EndIf, "if")?;
        return Some(finish(
            p,
            start,
            StmtKind::If(IfStmt {
                condition,
                then_branch: Box::new(then_branch),
                elseif_branches,
                else_branch,
                alternative: true,
            }),
        ));
    }

    let then_branch = Box::new(parse_stmt(p));
    let mut elseif_branches = Vec::new();
    while p.check(TokenKind::ElseIf) {
        let branch_start = p.start_span();
        p.advance();
        let condition = parse_condition(p, "'elseif'")?;
        let body = parse_stmt(p);
        elseif_branches.push(ElseIfBranch {
            condition,
            body,
            span: p.end_span(branch_start),
        });
    }
    let else_branch = match p.eat(TokenKind::Else) {
        Some(_) => Some(Box::new(parse_stmt(p))),
        None => None,
    };
    Some(finish(
        p,
        start,
        StmtKind::If(IfStmt {
            condition,
            then_branch,
            elseif_branches,
            else_branch,
            alternative: false,
        }),
    ))
}

fn parse_while(p: &mut Parser<'_>, start: u32) -> Option<Stmt> {
    p.advance();
    let condition = parse_condition(p, "'while'")?;
    let alternative = p.eat(TokenKind::Colon).is_some();
    let body = if alternative {
        let body = alternative_block(p, &[TokenKind::EndWhile]);
        expect_end(p, TokenKind::EndWhile, "while")?;
        body
    } else {
        parse_stmt(p)
    };
    Some(finish(
        p,
        start,
        StmtKind::While(WhileStmt {
            condition,
            body: Box::new(body),
            alternative,
        }),
    ))
}

fn parse_do_while(p: &mut Parser<'_>, start: u32) -> Option<Stmt> {
    p.advance();
    let body = parse_stmt(p);
    p.expect_after(TokenKind::While, "'do' body")?;
    let condition = parse_condition(p, "'while'")?;
    p.expect_semicolon("'do-while' condition");
    Some(finish(
        p,
        start,
        StmtKind::DoWhile(DoWhileStmt {
            body: Box::new(body),
            condition,
        }),
    ))
}

/// Comma-separated expressions of one `for` header section, possibly empty.
fn for_section(p: &mut Parser<'_>, end: TokenKind) -> Option<Vec<Expr>> {
    let mut exprs = Vec::new();
    if p.check(end) {
        return Some(exprs);
    }
    loop {
        exprs.push(p.parse_expression(0)?);
        if p.eat(TokenKind::Comma).is_none() {
            return Some(exprs);
        }
    }
}

fn parse_for(p: &mut Parser<'_>, start: u32) -> Option<Stmt> {
    p.advance();
    let open = p.expect_after(TokenKind::LeftParen, "'for'")?;
    let init = for_section(p, TokenKind::Semicolon)?;
    p.expect_after(TokenKind::Semicolon, "'for' initialiser")?;
    let condition = for_section(p, TokenKind::Semicolon)?;
    p.expect_after(TokenKind::Semicolon, "'for' condition")?;
    let update = for_section(p, TokenKind::RightParen)?;
    p.expect_closing(TokenKind::RightParen, open)?;

    let alternative = p.eat(TokenKind::Colon).is_some();
    let body = if alternative {
        let body = alternative_block(p, &[TokenKind::EndFor]);
        expect_end(p, TokenKind::EndFor, "for")?;
        body
    } else {
        parse_stmt(p)
    };
    Some(finish(
        p,
        start,
        StmtKind::For(ForStmt {
            init,
            condition,
            update,
            body: Box::new(body),
            alternative,
        }),
    ))
}

/// `foreach ($subject as [$key =>] [&]$value)`
fn parse_foreach(p: &mut Parser<'_>, start: u32) -> Option<Stmt> {
    p.advance();
    let open = p.expect_after(TokenKind::LeftParen, "'foreach'")?;
    let subject = p.parse_expression(0)?;
    p.expect_after(TokenKind::As, "'foreach' subject")?;
    let first = p.parse_expression(0)?;
    let (key, value) = match p.eat(TokenKind::FatArrow) {
        Some(_) => (Some(first), p.parse_expression(0)?),
        None => (None, first),
    };
    p.expect_closing(TokenKind::RightParen, open)?;

    let alternative = p.eat(TokenKind::Colon).is_some();
    let body = if alternative {
        let body = alternative_block(p, &[TokenKind::EndForeach]);
        expect_end(p, TokenKind::EndForeach, "foreach")?;
        body
    } else {
        parse_stmt(p)
    };
    Some(finish(
        p,
        start,
        StmtKind::Foreach(ForeachStmt {
            subject,
            key,
            value,
            body: Box::new(body),
            alternative,
        }),
    ))
}

fn parse_switch(p: &mut Parser<'_>, start: u32) -> Option<Stmt> {
    p.advance();
    let subject = parse_condition(p, "'switch'")?;
    let (open, alternative) = match p.current_kind() {
        TokenKind::Colon => (p.advance(), true),
        _ => (p.expect_after(TokenKind::LeftBrace, "'switch' subject")?, false),
    };
    let close = if alternative {
        TokenKind::EndSwitch
    } else {
        TokenKind::RightBrace
    };

    let mut cases = Vec::new();
    loop {
        p.skip_tags();
        let case_start = p.start_span();
        let value = match p.current_kind() {
            TokenKind::Case => {
                p.advance();
                Some(p.parse_expression(0)?)
            }
            TokenKind::Default => {
                p.advance();
                None
            }
            TokenKind::Semicolon => {
                p.advance();
                continue;
            }
            kind if kind == close || kind == TokenKind::Eof => break,
            _ => {
                p.unexpected("'case' or 'default'");
                let before = p.start_span();
                parse_stmt(p);
                if p.start_span() == before {
                    p.advance();
                }
                continue;
            }
        };
        if p.eat(TokenKind::Colon).is_none() && p.eat(TokenKind::Semicolon).is_none() {
            p.unexpected("':' after switch case");
        }
        let body = parse_statement_list(p, &[TokenKind::Case, TokenKind::Default, close]);
        cases.push(SwitchCase {
            value,
            body,
            span: p.end_span(case_start),
        });
    }

    if alternative {
        expect_end(p, TokenKind::EndSwitch, "switch")?;
    } else {
        p.expect_closing(TokenKind::RightBrace, open)?;
    }
    Some(finish(
        p,
        start,
        StmtKind::Switch(SwitchStmt {
            subject,
            cases,
            alternative,
        }),
    ))
}

fn parse_try(p: &mut Parser<'_>, start: u32) -> Option<Stmt> {
    let keyword = p.advance();
    let body = decl::parse_block_body(p)?;

    let mut catches = Vec::new();
    while p.check(TokenKind::Catch) {
        let catch_start = p.start_span();
        p.advance();
        let open = p.expect_after(TokenKind::LeftParen, "'catch'")?;
        let mut types = vec![p.parse_name()?];
        while p.eat(TokenKind::Pipe).is_some() {
            types.push(p.parse_name()?);
        }
        let var = p.eat(TokenKind::Variable).map(|token| expr::variable_name(token.text));
        p.expect_closing(TokenKind::RightParen, open)?;
        let body = decl::parse_block_body(p)?;
        catches.push(CatchClause {
            types,
            var,
            body,
            span: p.end_span(catch_start),
        });
    }
    let finally = match p.eat(TokenKind::Finally) {
        Some(_) => Some(decl::parse_block_body(p)?),
        None => None,
    };

    let span = p.end_span(start);
    if catches.is_empty() && finally.is_none() {
        p.malformed_span("'try' needs at least one 'catch' or a 'finally'", span, keyword.position);
    }
    Some(Stmt {
        kind: StmtKind::TryCatch(TryCatchStmt {
            body,
            catches,
            finally,
        }),
        span,
    })
}

/// `declare(strict_types=1);`, `declare(ticks=1) { ... }` or
/// `declare(ticks=1): ... enddeclare;`
fn parse_declare(p: &mut Parser<'_>, start: u32) -> Option<Stmt> {
    p.advance();
    let open = p.expect_after(TokenKind::LeftParen, "'declare'")?;
    let mut directives = Vec::new();
    loop {
        let directive_start = p.start_span();
        let Some((name, _)) = p.eat_identifier_or_keyword() else {
            p.unexpected("declare directive");
            return None;
        };
        p.expect_after(TokenKind::Equals, "directive name")?;
        let value = p.parse_expression(0)?;
        directives.push(DeclareDirective {
            name,
            value,
            span: p.end_span(directive_start),
        });
        if p.eat(TokenKind::Comma).is_none() {
            break;
        }
    }
    p.expect_closing(TokenKind::RightParen, open)?;

    let (body, alternative) = match p.current_kind() {
        TokenKind::Semicolon => {
            p.advance();
            (None, false)
        }
        TokenKind::CloseTag | TokenKind::Eof => (None, false),
        TokenKind::Colon => {
            p.advance();
            let body = alternative_block(p, &[TokenKind::EndDeclare]);
            expect_end(p, TokenKind::EndDeclare, "declare")?;
            (Some(Box::new(body)), true)
        }
        _ => (Some(Box::new(parse_stmt(p))), false),
    };
    Some(finish(
        p,
        start,
        StmtKind::Declare(DeclareStmt {
            directives,
            body,
            alternative,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::diagnostics::DiagnosticKind;

    fn parse(source: &str) -> (Vec<Stmt>, Vec<crate::ParseError>) {
        let mut p = Parser::new(source, ParserConfig::default());
        let program = p.parse_program();
        (program.stmts, p.into_errors())
    }

    fn parse_ok(source: &str) -> Vec<Stmt> {
        let (stmts, errors) = parse(source);
        assert!(errors.is_empty(), "{source}: {errors:?}");
        stmts
    }

    #[test]
    fn test_inline_html_and_short_echo() {
        let stmts = parse_ok("<p><?= $title ?></p>");
        assert_eq!(stmts.len(), 3);
        assert!(matches!(&stmts[0].kind, StmtKind::InlineHtml(html) if html == "<p>"));
        assert!(matches!(&stmts[1].kind, StmtKind::Echo(exprs) if exprs.len() == 1));
        assert!(matches!(&stmts[2].kind, StmtKind::InlineHtml(html) if html == "</p>"));
    }

    #[test]
    fn test_alternative_if_sets_flag() {
        let stmts = parse_ok("<?php if ($a): echo 1; elseif ($b): echo 2; else: echo 3; endif;");
        let StmtKind::If(stmt) = &stmts[0].kind else {
            panic!("expected if");
        };
        assert!(stmt.alternative);
        assert_eq!(stmt.elseif_branches.len(), 1);
        assert!(matches!(&stmt.then_branch.kind, StmtKind::Block(body) if body.len() == 1));
        assert!(stmt.else_branch.is_some());
    }

    #[test]
    fn test_else_if_nests() {
        let stmts = parse_ok("<?php if ($a) {} else if ($b) {} else {}");
        let StmtKind::If(stmt) = &stmts[0].kind else {
            panic!("expected if");
        };
        assert!(!stmt.alternative);
        assert!(stmt.elseif_branches.is_empty());
        let inner = stmt.else_branch.as_deref().unwrap();
        assert!(matches!(&inner.kind, StmtKind::If(nested) if nested.else_branch.is_some()));
    }

    #[test]
    fn test_loops() {
        let stmts = parse_ok(
            "<?php while ($i--): endwhile; do { $i++; } while ($i < 3); for ($i = 0, $j = 1; ; $i++) {} foreach ($xs as $k => &$v): endforeach;",
        );
        assert!(matches!(&stmts[0].kind, StmtKind::While(w) if w.alternative));
        assert!(matches!(&stmts[1].kind, StmtKind::DoWhile(_)));
        let StmtKind::For(header) = &stmts[2].kind else {
            panic!("expected for");
        };
        assert_eq!((header.init.len(), header.condition.len(), header.update.len()), (2, 0, 1));
        let StmtKind::Foreach(each) = &stmts[3].kind else {
            panic!("expected foreach");
        };
        assert!(each.alternative);
        assert_eq!(each.key.as_ref().unwrap().sexpr(), "$k");
        assert_eq!(each.value.sexpr(), "(& $v)");
    }

    #[test]
    fn test_switch_forms() {
        let stmts = parse_ok(
            "<?php switch ($x) { case 1: case 2; echo 'a'; break; default: echo 'b'; } switch ($y): case 1: endswitch;",
        );
        let StmtKind::Switch(first) = &stmts[0].kind else {
            panic!("expected switch");
        };
        assert!(!first.alternative);
        assert_eq!(first.cases.len(), 3);
        assert!(first.cases[0].body.is_empty());
        assert_eq!(first.cases[1].body.len(), 2);
        assert!(first.cases[2].value.is_none());
        assert!(matches!(&stmts[1].kind, StmtKind::Switch(s) if s.alternative && s.cases.len() == 1));
    }

    #[test]
    fn test_try_catch_finally() {
        let stmts = parse_ok("<?php try { f(); } catch (A | \\B\\C $e) {} catch (D) {} finally { g(); }");
        let StmtKind::TryCatch(stmt) = &stmts[0].kind else {
            panic!("expected try");
        };
        assert_eq!(stmt.catches.len(), 2);
        assert_eq!(stmt.catches[0].types.len(), 2);
        assert_eq!(stmt.catches[0].var.as_deref(), Some("e"));
        assert!(stmt.catches[1].var.is_none());
        assert_eq!(stmt.finally.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_bare_try_is_malformed() {
        let (stmts, errors) = parse("<?php try { f(); }");
        assert!(matches!(stmts[0].kind, StmtKind::TryCatch(_)));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), DiagnosticKind::MalformedConstruct);
    }

    #[test]
    fn test_declare_forms() {
        let stmts = parse_ok(
            "<?php declare(strict_types=1); declare(ticks=1) { f(); } declare(ticks=1): f(); enddeclare;",
        );
        let shapes: Vec<(bool, bool)> = stmts
            .iter()
            .map(|s| match &s.kind {
                StmtKind::Declare(d) => (d.body.is_some(), d.alternative),
                other => panic!("expected declare, got {other:?}"),
            })
            .collect();
        assert_eq!(shapes, vec![(false, false), (true, false), (true, true)]);
    }

    #[test]
    fn test_simple_statements() {
        let stmts = parse_ok(
            "<?php start: goto start; unset($a, $b[0],); global $x, $y; static $n = 0, $m; break 2; continue; return; ;",
        );
        assert!(matches!(&stmts[0].kind, StmtKind::Label(l) if l == "start"));
        assert!(matches!(&stmts[1].kind, StmtKind::Goto(l) if l == "start"));
        assert!(matches!(&stmts[2].kind, StmtKind::Unset(t) if t.len() == 2));
        assert!(matches!(&stmts[3].kind, StmtKind::Global(v) if v.len() == 2));
        assert!(matches!(&stmts[4].kind, StmtKind::StaticVar(v) if v.len() == 2 && v[1].default.is_none()));
        assert!(matches!(&stmts[5].kind, StmtKind::Break(Some(_))));
        assert!(matches!(&stmts[6].kind, StmtKind::Continue(None)));
        assert!(matches!(&stmts[7].kind, StmtKind::Return(None)));
        assert!(matches!(&stmts[8].kind, StmtKind::Nop));
    }

    #[test]
    fn test_static_is_disambiguated() {
        let stmts = parse_ok("<?php static::create(); static fn() => 1; static $cache;");
        assert!(matches!(&stmts[0].kind, StmtKind::Expression(_)));
        assert!(matches!(
            &stmts[1].kind,
            StmtKind::Expression(Expr { kind: ExprKind::ArrowFunction(f), .. }) if f.is_static
        ));
        assert!(matches!(&stmts[2].kind, StmtKind::StaticVar(_)));
    }

    #[test]
    fn test_function_declaration_versus_closure() {
        let stmts = parse_ok("<?php function &f() {} function () {}; function &($x) {};");
        assert!(matches!(&stmts[0].kind, StmtKind::Function(f) if f.by_ref && f.name == "f"));
        assert!(matches!(&stmts[1].kind, StmtKind::Expression(_)));
        assert!(matches!(&stmts[2].kind, StmtKind::Expression(_)));
    }

    #[test]
    fn test_attributed_statements() {
        let stmts = parse_ok("<?php #[Pure] function f() {} #[A] final class C {} #[B] fn() => 1;");
        assert!(matches!(&stmts[0].kind, StmtKind::Function(f) if f.attributes.len() == 1));
        assert!(matches!(&stmts[1].kind, StmtKind::Class(c) if c.attributes.len() == 1 && c.modifiers.is_final()));
        assert!(matches!(&stmts[2].kind, StmtKind::Expression(_)));
    }

    #[test]
    fn test_readonly_call_is_an_expression() {
        let stmts = parse_ok("<?php readonly(); readonly class A {}");
        assert!(matches!(&stmts[0].kind, StmtKind::Expression(_)));
        assert!(matches!(&stmts[1].kind, StmtKind::Class(c) if c.modifiers.is_readonly()));
    }

    #[test]
    fn test_stray_closing_brace() {
        let (stmts, errors) = parse("<?php } echo 1;");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), DiagnosticKind::UnexpectedToken);
        assert!(matches!(stmts[0].kind, StmtKind::Error));
        assert!(matches!(stmts[1].kind, StmtKind::Echo(_)));
    }

    #[test]
    fn test_error_isolation() {
        let (stmts, errors) = parse("<?php $a = 1; $b = (2; $c = 3;");
        assert!(!errors.is_empty());
        assert!(matches!(stmts[0].kind, StmtKind::Expression(_)));
        assert!(matches!(stmts.last().map(|s| &s.kind), Some(StmtKind::Expression(e)) if e.sexpr() == "(= $c 3)"));
    }

    #[test]
    fn test_nesting_limit() {
        let source = format!("<?php {}{}", "{".repeat(40), "}".repeat(40));
        let mut p = Parser::new(&source, ParserConfig::default().with_max_depth(10));
        p.parse_program();
        let errors = p.into_errors();
        assert!(errors.iter().any(|e| e.to_string().contains("nesting deeper than 10 levels")));
    }
}
