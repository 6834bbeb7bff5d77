//! Declarations: functions, parameters, class-likes and their members,
//! namespaces and `use` imports.

use phorge_ast::*;
use phorge_lexer::{Token, TokenKind};

use crate::context::ParsingContext;
use crate::expr;
use crate::parser::Parser;
use crate::stmt;
use crate::types;

// =============================================================================
// Modifiers
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModifierSite {
    /// Class-like members and class declarations.
    Member,
    /// Constructor parameters.
    Param,
}

fn accepts_modifier(site: ModifierSite, kind: TokenKind) -> bool {
    match site {
        ModifierSite::Member => kind.is_modifier(),
        ModifierSite::Param => matches!(
            kind,
            TokenKind::Public | TokenKind::Protected | TokenKind::Private | TokenKind::Readonly | TokenKind::Final
        ),
    }
}

/// Collects modifier keywords in whatever order they appear. Repeats and
/// conflicts are reported but do not stop the accumulation.
fn parse_modifiers(p: &mut Parser<'_>, site: ModifierSite) -> Modifiers {
    let mut modifiers = Modifiers::NONE;
    while accepts_modifier(site, p.current_kind()) {
        let token = p.current();
        let flag = match token.kind {
            TokenKind::Public | TokenKind::Protected | TokenKind::Private
                if p.peek_kind() == TokenKind::LeftParen =>
            {
                set_visibility(p)
            }
            kind => {
                p.advance();
                match kind {
                    TokenKind::Public => Modifiers::PUBLIC,
                    TokenKind::Protected => Modifiers::PROTECTED,
                    TokenKind::Private => Modifiers::PRIVATE,
                    TokenKind::Static => Modifiers::STATIC,
                    TokenKind::Abstract => Modifiers::ABSTRACT,
                    TokenKind::Final => Modifiers::FINAL,
                    TokenKind::Readonly => Modifiers::READONLY,
                    _ => Modifiers::VAR,
                }
            }
        };

        if modifiers.contains(flag) {
            p.malformed(format!("duplicate modifier '{}'", token.text), token);
        }
        modifiers.insert(flag);
        if flag.intersects(Modifiers::VISIBILITY | Modifiers::VAR) && conflicting_visibility(modifiers) {
            p.malformed("multiple visibility modifiers", token);
        }
        if modifiers.contains(Modifiers::ABSTRACT | Modifiers::FINAL) && flag.intersects(Modifiers::ABSTRACT | Modifiers::FINAL) {
            p.malformed("a declaration cannot be both abstract and final", token);
        }
    }
    modifiers
}

fn conflicting_visibility(modifiers: Modifiers) -> bool {
    let var = u32::from(modifiers.contains(Modifiers::VAR));
    modifiers.visibility_count() + var > 1
}

/// `public(set)`, `protected(set)`, `private(set)`. Consumes the whole
/// group, including the visibility keyword.
fn set_visibility(p: &mut Parser<'_>) -> Modifiers {
    let keyword = p.advance();
    let open = p.advance();
    if p.check(TokenKind::Identifier) && p.current_text().eq_ignore_ascii_case("set") {
        p.advance();
    } else {
        p.unexpected("'set'");
    }
    p.expect_closing(TokenKind::RightParen, open);
    match keyword.kind {
        TokenKind::Public => Modifiers::PUBLIC_SET,
        TokenKind::Protected => Modifiers::PROTECTED_SET,
        _ => Modifiers::PRIVATE_SET,
    }
}

/// Reports every flag of `modifiers` outside `allowed`.
fn reject_modifiers(p: &mut Parser<'_>, modifiers: Modifiers, allowed: Modifiers, what: &str, at: Token<'_>) {
    let mut rejected = modifiers;
    rejected.remove(allowed);
    for name in rejected.names() {
        p.malformed_span(format!("cannot use '{name}' on {what}"), at.span, at.position);
    }
}

// =============================================================================
// Functions and parameters
// =============================================================================

/// `(params)`. Promoted parameters (`public int $x`) are only accepted when
/// `allow_promotion` is set, i.e. in a constructor.
pub(crate) fn parse_params(p: &mut Parser<'_>, allow_promotion: bool) -> Option<Vec<Param>> {
    let open = p.expect(TokenKind::LeftParen)?;
    let mut params = Vec::new();
    while !p.check(TokenKind::RightParen) && !p.check(TokenKind::Eof) {
        params.push(parse_param(p, allow_promotion)?);
        if p.eat(TokenKind::Comma).is_none() {
            break;
        }
    }
    p.expect_closing(TokenKind::RightParen, open)?;
    Some(params)
}

fn parse_param(p: &mut Parser<'_>, allow_promotion: bool) -> Option<Param> {
    let start = p.start_span();
    let attributes = p.parse_attributes();

    let modifier_token = p.current();
    let modifiers = parse_modifiers(p, ModifierSite::Param);
    if !modifiers.is_empty() && !allow_promotion {
        p.malformed("cannot declare a promoted property outside a constructor", modifier_token);
    }

    let type_hint = match p.current_kind() {
        TokenKind::Variable | TokenKind::Ampersand | TokenKind::Ellipsis => None,
        kind if types::could_start_type(kind) => Some(p.parse_type()?),
        _ => None,
    };
    let by_ref = p.eat(TokenKind::Ampersand).is_some();
    let variadic = p.eat(TokenKind::Ellipsis).is_some();
    let var = p.expect_after(TokenKind::Variable, "parameter type")?;

    let default = match p.eat(TokenKind::Equals) {
        Some(_) => Some(p.parse_expression(0)?),
        None => None,
    };
    let hooks = if !modifiers.is_empty() && p.check(TokenKind::LeftBrace) {
        parse_hooks(p)?
    } else {
        Vec::new()
    };

    Some(Param {
        name: expr::variable_name(var.text),
        type_hint,
        default,
        by_ref,
        variadic,
        modifiers,
        attributes,
        hooks,
        span: p.end_span(start),
    })
}

/// `: Type` after a parameter list. The outer `None` means the type was
/// announced but could not be parsed.
pub(crate) fn parse_return_type(p: &mut Parser<'_>) -> Option<Option<Type>> {
    if p.eat(TokenKind::Colon).is_none() {
        return Some(None);
    }
    p.parse_type().map(Some)
}

/// `{ statements }`
pub(crate) fn parse_block_body(p: &mut Parser<'_>) -> Option<Vec<Stmt>> {
    let open = p.expect(TokenKind::LeftBrace)?;
    let body = stmt::parse_statement_list(p, &[TokenKind::RightBrace]);
    p.expect_closing(TokenKind::RightBrace, open)?;
    Some(body)
}

/// `function [&]name(params)[: type] { body }`
pub(crate) fn parse_function(p: &mut Parser<'_>, attributes: Vec<Attribute>, start: u32) -> Option<Stmt> {
    p.advance();
    let by_ref = p.eat(TokenKind::Ampersand).is_some();
    let (name, _) = p.expect_declaration_name("function name")?;
    let (params, return_type, body) = p.with_context(ParsingContext::Function, |p| {
        let params = parse_params(p, false)?;
        let return_type = parse_return_type(p)?;
        let body = parse_block_body(p)?;
        Some((params, return_type, body))
    })?;
    Some(Stmt {
        kind: StmtKind::Function(FunctionDecl {
            name,
            by_ref,
            params,
            return_type,
            body,
            attributes,
        }),
        span: p.end_span(start),
    })
}

// =============================================================================
// Class-like declarations
// =============================================================================

/// `[abstract|final|readonly] class Name [extends A] [implements B, C] { ... }`
pub(crate) fn parse_class(p: &mut Parser<'_>, attributes: Vec<Attribute>, start: u32) -> Option<Stmt> {
    let first = p.current();
    let modifiers = parse_modifiers(p, ModifierSite::Member);
    reject_modifiers(
        p,
        modifiers,
        Modifiers::ABSTRACT | Modifiers::FINAL | Modifiers::READONLY,
        "a class",
        first,
    );
    p.expect_after(TokenKind::Class, "class modifiers")?;
    let (name, _) = p.expect_declaration_name("class name")?;
    let class = parse_class_rest(p, Some(name), modifiers, attributes)?;
    Some(Stmt {
        kind: StmtKind::Class(class),
        span: p.end_span(start),
    })
}

/// `new class(args) extends A {}`, starting on the attributes or `class`.
/// Returns the class expression and the constructor arguments.
pub(crate) fn parse_anonymous_class(p: &mut Parser<'_>) -> Option<(Expr, Vec<Expr>)> {
    let start = p.start_span();
    let attributes = p.parse_attributes();
    let first = p.current();
    let modifiers = parse_modifiers(p, ModifierSite::Member);
    reject_modifiers(p, modifiers, Modifiers::READONLY, "an anonymous class", first);
    p.expect_after(TokenKind::Class, "'new'")?;

    let args = match p.eat(TokenKind::LeftParen) {
        Some(open) => expr::parse_plain_arguments(p, open, "an anonymous class")?,
        None => Vec::new(),
    };
    let class = parse_class_rest(p, None, modifiers, attributes)?;
    let expr = Expr {
        kind: ExprKind::AnonymousClass(Box::new(class)),
        span: p.end_span(start),
    };
    Some((expr, args))
}

fn parse_class_rest(
    p: &mut Parser<'_>,
    name: Option<String>,
    modifiers: Modifiers,
    attributes: Vec<Attribute>,
) -> Option<ClassDecl> {
    let extends = match p.eat(TokenKind::Extends) {
        Some(_) => Some(p.parse_name()?),
        None => None,
    };
    let implements = match p.eat(TokenKind::Implements) {
        Some(_) => parse_name_list(p)?,
        None => Vec::new(),
    };
    let members = parse_class_body(p, ParsingContext::Class)?;
    Some(ClassDecl {
        name,
        modifiers,
        extends,
        implements,
        members,
        attributes,
    })
}

pub(crate) fn parse_interface(p: &mut Parser<'_>, attributes: Vec<Attribute>, start: u32) -> Option<Stmt> {
    p.advance();
    let (name, _) = p.expect_declaration_name("interface name")?;
    let extends = match p.eat(TokenKind::Extends) {
        Some(_) => parse_name_list(p)?,
        None => Vec::new(),
    };
    let members = parse_class_body(p, ParsingContext::Interface)?;
    Some(Stmt {
        kind: StmtKind::Interface(InterfaceDecl {
            name,
            extends,
            members,
            attributes,
        }),
        span: p.end_span(start),
    })
}

pub(crate) fn parse_trait(p: &mut Parser<'_>, attributes: Vec<Attribute>, start: u32) -> Option<Stmt> {
    p.advance();
    let (name, _) = p.expect_declaration_name("trait name")?;
    let members = parse_class_body(p, ParsingContext::Trait)?;
    Some(Stmt {
        kind: StmtKind::Trait(TraitDecl {
            name,
            members,
            attributes,
        }),
        span: p.end_span(start),
    })
}

/// `enum Name[: backing] [implements A] { ... }`
pub(crate) fn parse_enum(p: &mut Parser<'_>, attributes: Vec<Attribute>, start: u32) -> Option<Stmt> {
    p.advance();
    let (name, _) = p.expect_declaration_name("enum name")?;
    let backing_type = match p.eat(TokenKind::Colon) {
        Some(_) => Some(p.parse_type()?),
        None => None,
    };
    let implements = match p.eat(TokenKind::Implements) {
        Some(_) => parse_name_list(p)?,
        None => Vec::new(),
    };
    let members = parse_class_body(p, ParsingContext::Enum)?;
    Some(Stmt {
        kind: StmtKind::Enum(EnumDecl {
            name,
            backing_type,
            implements,
            members,
            attributes,
        }),
        span: p.end_span(start),
    })
}

fn parse_name_list(p: &mut Parser<'_>) -> Option<Vec<Name>> {
    let mut names = vec![p.parse_name()?];
    while p.eat(TokenKind::Comma).is_some() {
        names.push(p.parse_name()?);
    }
    Some(names)
}

// =============================================================================
// Class bodies
// =============================================================================

/// `{ members }` with `context` pushed for the duration of the body.
fn parse_class_body(p: &mut Parser<'_>, context: ParsingContext) -> Option<Vec<ClassMember>> {
    let open = p.expect(TokenKind::LeftBrace)?;
    let members = p.with_context(context, |p| {
        let mut members = Vec::new();
        while !p.check(TokenKind::RightBrace) && !p.check(TokenKind::Eof) {
            let before = p.start_span();
            match parse_member(p, context) {
                Some(parsed) => members.extend(parsed),
                None => skip_declaration(p, true),
            }
            if p.start_span() == before && !p.check(TokenKind::RightBrace) && !p.check(TokenKind::Eof) {
                tracing::debug!(token = %p.current_kind(), "skipping token in class body");
                p.advance();
            }
        }
        members
    });
    p.expect_closing(TokenKind::RightBrace, open)?;
    Some(members)
}

fn is_member_start(kind: TokenKind) -> bool {
    kind.is_modifier()
        || matches!(
            kind,
            TokenKind::Function | TokenKind::Const | TokenKind::Use | TokenKind::Case | TokenKind::HashBracket
        )
}

/// Recovery inside declaration bodies: skips to the next `;` (consumed),
/// past a balanced `{ ... }` group, or to the enclosing `}`.
fn skip_declaration(p: &mut Parser<'_>, stop_at_member: bool) {
    let mut depth = 0usize;
    loop {
        match p.current_kind() {
            TokenKind::Eof => return,
            TokenKind::RightBrace if depth == 0 => return,
            TokenKind::RightBrace => {
                depth -= 1;
                p.advance();
                if depth == 0 {
                    return;
                }
            }
            TokenKind::LeftBrace => {
                depth += 1;
                p.advance();
            }
            TokenKind::Semicolon if depth == 0 => {
                p.advance();
                return;
            }
            kind if depth == 0 && stop_at_member && is_member_start(kind) => return,
            kind => {
                tracing::trace!(token = %kind, "skipping token");
                p.advance();
            }
        }
    }
}

/// One member, or several for `public $a, $b;`. An empty list means the
/// member was diagnosed and dropped.
fn parse_member(p: &mut Parser<'_>, context: ParsingContext) -> Option<Vec<ClassMember>> {
    let start = p.start_span();
    let attributes = p.parse_attributes();
    let first = p.current();
    let modifiers = parse_modifiers(p, ModifierSite::Member);

    let mut members = match p.current_kind() {
        TokenKind::Function => vec![parse_method(p, context, modifiers, start)?],
        TokenKind::Const => vec![parse_class_constant(p, modifiers, first, start)?],
        TokenKind::Use if modifiers.is_empty() => {
            let member = parse_trait_use(p, start)?;
            if !attributes.is_empty() {
                p.malformed_span("attributes cannot be applied to a trait use", member.span, first.position);
            }
            if context == ParsingContext::Interface {
                p.malformed_span("interfaces cannot use traits", member.span, first.position);
                return Some(Vec::new());
            }
            vec![member]
        }
        TokenKind::Case if modifiers.is_empty() => {
            let member = parse_enum_case(p, start)?;
            if context != ParsingContext::Enum {
                p.malformed_span("enum cases can only be declared in an enum", member.span, first.position);
                return Some(Vec::new());
            }
            vec![member]
        }
        TokenKind::Variable => parse_properties(p, context, modifiers, first, start)?,
        kind if !modifiers.is_empty() && types::could_start_type(kind) => {
            parse_properties(p, context, modifiers, first, start)?
        }
        _ => {
            p.unexpected("class member");
            if !matches!(p.current_kind(), TokenKind::RightBrace | TokenKind::Eof) {
                p.advance();
            }
            return Some(Vec::new());
        }
    };

    for member in &mut members {
        if let Some(slot) = member.attributes_mut() {
            slot.extend(attributes.iter().cloned());
        }
    }
    Some(members)
}

fn parse_method(
    p: &mut Parser<'_>,
    context: ParsingContext,
    modifiers: Modifiers,
    start: u32,
) -> Option<ClassMember> {
    let keyword = p.advance();
    let by_ref = p.eat(TokenKind::Ampersand).is_some();
    let Some((name, _)) = p.eat_identifier_or_keyword() else {
        p.unexpected("method name");
        return None;
    };
    let constructor = name.eq_ignore_ascii_case("__construct") && context != ParsingContext::Interface;

    let (params, return_type, body) = p.with_context(ParsingContext::Method, |p| {
        let params = parse_params(p, constructor)?;
        let return_type = parse_return_type(p)?;
        let body = if p.check(TokenKind::LeftBrace) {
            Some(parse_block_body(p)?)
        } else {
            p.expect_semicolon("method signature");
            None
        };
        Some((params, return_type, body))
    })?;

    let span = p.end_span(start);
    let problem = match (context, body.is_some()) {
        (ParsingContext::Interface, true) => Some("interface methods cannot have a body"),
        (ParsingContext::Interface, false) => None,
        (_, true) if modifiers.is_abstract() => Some("abstract methods cannot have a body"),
        (_, false) if !modifiers.is_abstract() => Some("non-abstract methods must have a body"),
        _ => None,
    };
    if let Some(message) = problem {
        p.malformed_span(message, span, keyword.position);
    }

    Some(ClassMember {
        kind: ClassMemberKind::Method(MethodDecl {
            name,
            modifiers,
            by_ref,
            params,
            return_type,
            body,
            attributes: Vec::new(),
        }),
        span,
    })
}

/// `[modifiers] const [type] A = 1, B = 2;`
fn parse_class_constant(
    p: &mut Parser<'_>,
    modifiers: Modifiers,
    first: Token<'_>,
    start: u32,
) -> Option<ClassMember> {
    reject_modifiers(
        p,
        modifiers,
        Modifiers::VISIBILITY | Modifiers::FINAL,
        "a constant",
        first,
    );
    p.advance();
    let typed = !(p.current_kind().is_identifier_like() && p.peek_kind() == TokenKind::Equals);
    let type_hint = if typed { Some(p.parse_type()?) } else { None };
    let clauses = parse_constant_clauses(p, modifiers.visibility())?;
    Some(ClassMember {
        kind: ClassMemberKind::Constant(ConstDecl {
            modifiers,
            type_hint,
            clauses,
            attributes: Vec::new(),
        }),
        span: p.end_span(start),
    })
}

/// Top-level `const A = 1, B = 2;`
pub(crate) fn parse_const_statement(p: &mut Parser<'_>, attributes: Vec<Attribute>, start: u32) -> Option<Stmt> {
    p.advance();
    let clauses = parse_constant_clauses(p, Visibility::Public)?;
    Some(Stmt {
        kind: StmtKind::Const(ConstDecl {
            modifiers: Modifiers::NONE,
            type_hint: None,
            clauses,
            attributes,
        }),
        span: p.end_span(start),
    })
}

fn parse_constant_clauses(p: &mut Parser<'_>, visibility: Visibility) -> Option<Vec<ConstantClause>> {
    let mut clauses = Vec::new();
    loop {
        let start = p.start_span();
        let Some((name, _)) = p.eat_identifier_or_keyword() else {
            p.unexpected("constant name");
            return None;
        };
        p.expect_after(TokenKind::Equals, "constant name")?;
        let value = p.parse_expression(0)?;
        clauses.push(ConstantClause {
            name,
            value,
            visibility,
            span: p.end_span(start),
        });
        if p.eat(TokenKind::Comma).is_none() {
            break;
        }
    }
    p.expect_semicolon("constant declaration");
    Some(clauses)
}

/// `case Name [= value];`
fn parse_enum_case(p: &mut Parser<'_>, start: u32) -> Option<ClassMember> {
    p.advance();
    let Some((name, _)) = p.eat_identifier_or_keyword() else {
        p.unexpected("case name");
        return None;
    };
    let value = match p.eat(TokenKind::Equals) {
        Some(_) => Some(p.parse_expression(0)?),
        None => None,
    };
    p.expect_semicolon("enum case");
    Some(ClassMember {
        kind: ClassMemberKind::Case(EnumCase {
            name,
            value,
            attributes: Vec::new(),
        }),
        span: p.end_span(start),
    })
}

/// `modifiers [type] $a [= 1] [hooks], $b ...;`
fn parse_properties(
    p: &mut Parser<'_>,
    context: ParsingContext,
    modifiers: Modifiers,
    first: Token<'_>,
    start: u32,
) -> Option<Vec<ClassMember>> {
    let type_hint = if p.check(TokenKind::Variable) {
        None
    } else {
        Some(p.parse_type()?)
    };

    let mut members = Vec::new();
    let mut member_start = start;
    loop {
        let var = p.expect_after(TokenKind::Variable, "property type")?;
        let default = match p.eat(TokenKind::Equals) {
            Some(_) => Some(p.parse_expression(0)?),
            None => None,
        };
        let hooks = if p.check(TokenKind::LeftBrace) {
            parse_hooks(p)?
        } else {
            Vec::new()
        };
        let hooked = !hooks.is_empty();
        members.push(ClassMember {
            kind: ClassMemberKind::Property(PropertyDecl {
                name: expr::variable_name(var.text),
                modifiers,
                type_hint: type_hint.clone(),
                default,
                attributes: Vec::new(),
                hooks,
            }),
            span: p.end_span(member_start),
        });
        if hooked {
            break;
        }
        if p.eat(TokenKind::Comma).is_none() {
            p.expect_semicolon("property declaration");
            break;
        }
        member_start = p.start_span();
    }

    let span = p.end_span(start);
    match context {
        ParsingContext::Interface => {
            p.malformed_span("interfaces cannot declare properties", span, first.position);
            return Some(Vec::new());
        }
        ParsingContext::Enum => {
            p.malformed_span("enums cannot declare properties", span, first.position);
            return Some(Vec::new());
        }
        _ => {}
    }
    if modifiers.is_empty() {
        p.malformed_span("properties need a visibility or 'var'", span, first.position);
    }
    Some(members)
}

// =============================================================================
// Property hooks
// =============================================================================

/// `{ get => expr; set(T $v) { ... } }`
fn parse_hooks(p: &mut Parser<'_>) -> Option<Vec<PropertyHook>> {
    let open = p.advance();
    let hooks = p.with_context(ParsingContext::PropertyHook, |p| {
        let mut hooks = Vec::new();
        while !p.check(TokenKind::RightBrace) && !p.check(TokenKind::Eof) {
            let before = p.start_span();
            match parse_hook(p) {
                Some(Some(hook)) => hooks.push(hook),
                Some(None) => {}
                None => skip_declaration(p, false),
            }
            if p.start_span() == before && !p.check(TokenKind::RightBrace) && !p.check(TokenKind::Eof) {
                p.advance();
            }
        }
        hooks
    });
    p.expect_closing(TokenKind::RightBrace, open)?;
    if hooks.is_empty() {
        p.malformed_span("property hook list cannot be empty", p.end_span(open.span.start), open.position);
    }
    Some(hooks)
}

/// The inner `None` marks a hook that was diagnosed and skipped.
fn parse_hook(p: &mut Parser<'_>) -> Option<Option<PropertyHook>> {
    let start = p.start_span();
    let attributes = p.parse_attributes();
    let is_final = p.eat(TokenKind::Final).is_some();
    let by_ref = p.eat(TokenKind::Ampersand).is_some();

    let name = p.current();
    let kind = match name.text {
        text if name.kind == TokenKind::Identifier && text.eq_ignore_ascii_case("get") => PropertyHookKind::Get,
        text if name.kind == TokenKind::Identifier && text.eq_ignore_ascii_case("set") => PropertyHookKind::Set,
        text if name.kind.is_identifier_like() => {
            p.malformed(format!("unknown property hook '{text}', expected 'get' or 'set'"), name);
            skip_declaration(p, false);
            return Some(None);
        }
        _ => {
            p.unexpected("'get' or 'set'");
            return None;
        }
    };
    p.advance();

    let params = if p.check(TokenKind::LeftParen) {
        parse_params(p, false)?
    } else {
        Vec::new()
    };

    let body = match p.current_kind() {
        TokenKind::LeftBrace => PropertyHookBody::Block(parse_block_body(p)?),
        TokenKind::FatArrow => {
            p.advance();
            let value = p.parse_expression(0)?;
            p.expect_semicolon("property hook");
            PropertyHookBody::Expression(value)
        }
        TokenKind::Semicolon => {
            p.advance();
            PropertyHookBody::Abstract
        }
        _ => {
            p.unexpected("property hook body");
            return None;
        }
    };

    Some(Some(PropertyHook {
        kind,
        body,
        is_final,
        by_ref,
        params,
        attributes,
        span: p.end_span(start),
    }))
}

// =============================================================================
// Trait use
// =============================================================================

/// `use A, B;` or `use A, B { A::x insteadof B; x as protected y; }`
fn parse_trait_use(p: &mut Parser<'_>, start: u32) -> Option<ClassMember> {
    p.advance();
    let traits = parse_name_list(p)?;
    let mut adaptations = Vec::new();
    if let Some(open) = p.eat(TokenKind::LeftBrace) {
        while !p.check(TokenKind::RightBrace) && !p.check(TokenKind::Eof) {
            let before = p.start_span();
            match parse_adaptation(p) {
                Some(adaptation) => adaptations.push(adaptation),
                None => skip_declaration(p, false),
            }
            if p.start_span() == before && !p.check(TokenKind::RightBrace) {
                p.advance();
            }
        }
        p.expect_closing(TokenKind::RightBrace, open)?;
    } else {
        p.expect_semicolon("trait use");
    }
    Some(ClassMember {
        kind: ClassMemberKind::TraitUse(TraitUseDecl { traits, adaptations }),
        span: p.end_span(start),
    })
}

fn parse_adaptation(p: &mut Parser<'_>) -> Option<TraitAdaptation> {
    let start = p.start_span();
    let first = p.parse_name()?;
    let (trait_name, method) = if p.eat(TokenKind::DoubleColon).is_some() {
        let Some((method, _)) = p.eat_identifier_or_keyword() else {
            p.unexpected("method name");
            return None;
        };
        (Some(first), method)
    } else {
        (None, first.to_string())
    };

    let kind = if let Some(keyword) = p.eat(TokenKind::Insteadof) {
        let Some(trait_name) = trait_name else {
            p.malformed("'insteadof' needs a trait-qualified method", keyword);
            return None;
        };
        TraitAdaptationKind::Precedence {
            trait_name,
            method,
            insteadof: parse_name_list(p)?,
        }
    } else if p.eat(TokenKind::As).is_some() {
        let visibility = match p.current_kind() {
            TokenKind::Public => Some(Visibility::Public),
            TokenKind::Protected => Some(Visibility::Protected),
            TokenKind::Private => Some(Visibility::Private),
            _ => None,
        };
        if visibility.is_some() {
            p.advance();
        }
        let alias = p.eat_identifier_or_keyword().map(|(name, _)| name);
        if visibility.is_none() && alias.is_none() {
            p.unexpected("visibility or alias after 'as'");
            return None;
        }
        TraitAdaptationKind::Alias {
            trait_name,
            method,
            visibility,
            alias,
        }
    } else {
        p.unexpected("'insteadof' or 'as'");
        return None;
    };
    p.expect_semicolon("trait adaptation");
    Some(TraitAdaptation {
        kind,
        span: p.end_span(start),
    })
}

// =============================================================================
// Namespaces and imports
// =============================================================================

/// `namespace A;`, `namespace A { ... }` or `namespace { ... }`.
pub(crate) fn parse_namespace(p: &mut Parser<'_>, start: u32) -> Option<Stmt> {
    p.advance();
    let name = if p.check(TokenKind::LeftBrace) {
        None
    } else {
        Some(p.parse_name()?)
    };
    let body = match p.eat(TokenKind::LeftBrace) {
        Some(open) => {
            let stmts = stmt::parse_statement_list(p, &[TokenKind::RightBrace]);
            p.expect_closing(TokenKind::RightBrace, open)?;
            NamespaceBody::Braced(stmts)
        }
        None => {
            p.expect_semicolon("namespace name");
            NamespaceBody::Unbraced
        }
    };
    Some(Stmt {
        kind: StmtKind::Namespace(NamespaceDecl { name, body }),
        span: p.end_span(start),
    })
}

/// `use A\B [as C], ...;`, `use function ...`, `use const ...` and group
/// imports `use A\{B, function c, D as E};`.
pub(crate) fn parse_use(p: &mut Parser<'_>, start: u32) -> Option<Stmt> {
    p.advance();
    let kind = use_kind(p).unwrap_or(UseKind::Normal);

    let mut items = Vec::new();
    loop {
        let item_start = p.start_span();
        let name = p.parse_name()?;
        if p.check(TokenKind::Backslash) && p.peek_kind() == TokenKind::LeftBrace {
            p.advance();
            let open = p.advance();
            while !p.check(TokenKind::RightBrace) && !p.check(TokenKind::Eof) {
                items.push(parse_group_item(p, &name)?);
                if p.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
            p.expect_closing(TokenKind::RightBrace, open)?;
        } else {
            let alias = parse_use_alias(p)?;
            items.push(UseItem {
                name,
                alias,
                kind: None,
                span: p.end_span(item_start),
            });
        }
        if p.eat(TokenKind::Comma).is_none() {
            break;
        }
    }
    p.expect_semicolon("use declaration");

    Some(Stmt {
        kind: StmtKind::Use(UseDecl { kind, items }),
        span: p.end_span(start),
    })
}

fn use_kind(p: &mut Parser<'_>) -> Option<UseKind> {
    if p.eat(TokenKind::Function).is_some() {
        Some(UseKind::Function)
    } else if p.eat(TokenKind::Const).is_some() {
        Some(UseKind::Const)
    } else {
        None
    }
}

fn parse_use_alias(p: &mut Parser<'_>) -> Option<Option<String>> {
    if p.eat(TokenKind::As).is_none() {
        return Some(None);
    }
    match p.eat_identifier_or_keyword() {
        Some((alias, _)) => Some(Some(alias)),
        None => {
            p.unexpected("alias name");
            None
        }
    }
}

fn parse_group_item(p: &mut Parser<'_>, prefix: &Name) -> Option<UseItem> {
    let start = p.start_span();
    let kind = use_kind(p);
    let suffix = p.parse_name()?;
    let alias = parse_use_alias(p)?;

    let mut parts = prefix.parts.clone();
    parts.extend(suffix.parts);
    let name_kind = match prefix.kind {
        NameKind::FullyQualified => NameKind::FullyQualified,
        _ => NameKind::Qualified,
    };
    Some(UseItem {
        name: Name {
            parts,
            kind: name_kind,
            span: prefix.span.merge(suffix.span),
        },
        alias,
        kind,
        span: p.end_span(start),
    })
}
