use phorge_ast::*;
use phorge_lexer::{Token, TokenKind};

use crate::context::ParsingContext;
use crate::decl;
use crate::diagnostics::ParseError;
use crate::interpolation;
use crate::parser::Parser;
use crate::precedence::{self, ASSIGNMENT_BP, LOGICAL_AND_BP, PIPE_BP, TERNARY_BP, UNARY_BP};
use crate::registry;

// =============================================================================
// Engine
// =============================================================================

/// Precedence climbing over the parslet tables. Records `NoPrefixParslet`
/// and yields nothing when the current token cannot start an expression.
pub fn parse_expression(p: &mut Parser<'_>, min_bp: u8) -> Option<Expr> {
    let kind = p.current_kind();
    let Some(prefix) = registry::prefix_parslet(kind) else {
        p.error(ParseError::NoPrefixParslet {
            found: kind,
            span: p.current_span(),
            position: p.current_position(),
        });
        return None;
    };
    let left = prefix(p)?;
    parse_infix_from(p, left, min_bp)
}

/// Continues an expression whose left operand is already built.
pub fn parse_infix_from(p: &mut Parser<'_>, mut left: Expr, min_bp: u8) -> Option<Expr> {
    loop {
        let kind = p.current_kind();
        if precedence::is_terminator(kind) {
            break;
        }
        let bp = precedence::binding_power(kind);
        // An assignment right after a writable operand binds to that operand
        // even under a tighter operator: `!$x = f()`, `$a && $b = 1`.
        if bp <= min_bp && !(kind.is_assignment_op() && is_assignable(&left)) {
            break;
        }
        let Some(infix) = registry::infix_parslet(kind) else {
            break;
        };
        let op = p.advance();
        left = infix(p, left, op)?;
    }
    Some(left)
}

fn is_assignable(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Variable(_)
        | ExprKind::VariableVariable(_)
        | ExprKind::ArrayAccess(_)
        | ExprKind::List(_)
        | ExprKind::Array(_) => true,
        // `Foo::BAR` is a class constant.
        ExprKind::MemberAccess(access) => {
            access.kind != AccessKind::Static || !matches!(access.member.kind, ExprKind::Name(_))
        }
        _ => false,
    }
}

fn node(p: &Parser<'_>, start: u32, kind: ExprKind) -> Expr {
    Expr {
        kind,
        span: p.end_span(start),
    }
}

fn boxed(p: &mut Parser<'_>, min_bp: u8) -> Option<Box<Expr>> {
    p.parse_expression(min_bp).map(Box::new)
}

pub(crate) fn variable_name(text: &str) -> String {
    text.strip_prefix('$').unwrap_or(text).to_string()
}

// =============================================================================
// Prefix parslets: atoms
// =============================================================================

pub(crate) fn variable(p: &mut Parser<'_>) -> Option<Expr> {
    let token = p.advance();
    Some(Expr {
        kind: ExprKind::Variable(variable_name(token.text)),
        span: token.span,
    })
}

/// `$$name`, `${expr}`
pub(crate) fn variable_variable(p: &mut Parser<'_>) -> Option<Expr> {
    let dollar = p.advance();
    let inner = match p.current_kind() {
        TokenKind::Variable => variable(p)?,
        TokenKind::Dollar => {
            if !p.enter() {
                return None;
            }
            let inner = variable_variable(p);
            p.leave();
            inner?
        }
        TokenKind::LeftBrace => {
            let open = p.advance();
            let inner = p.parse_expression(0)?;
            p.expect_closing(TokenKind::RightBrace, open)?;
            inner
        }
        _ => {
            p.unexpected("variable or '{' after '$'");
            return None;
        }
    };
    Some(node(p, dollar.span.start, ExprKind::VariableVariable(Box::new(inner))))
}

pub(crate) fn number(p: &mut Parser<'_>) -> Option<Expr> {
    let token = p.advance();
    let digits = token.text.replace('_', "");
    let kind = match token.kind {
        TokenKind::HexInt => radix_literal(&digits[2..], 16),
        TokenKind::BinInt => radix_literal(&digits[2..], 2),
        TokenKind::OctInt => {
            let octal = digits
                .strip_prefix("0o")
                .or_else(|| digits.strip_prefix("0O"))
                .or_else(|| digits.strip_prefix('0'))
                .unwrap_or(&digits);
            radix_literal(octal, 8)
        }
        TokenKind::Float => match digits.parse::<f64>() {
            Ok(value) => ExprKind::Float(value),
            Err(_) => {
                p.malformed("invalid floating point literal", token);
                ExprKind::Float(0.0)
            }
        },
        // Already reported by the token source.
        TokenKind::InvalidNumber => ExprKind::Int(0),
        _ => match digits.parse::<i64>() {
            Ok(value) => ExprKind::Int(value),
            Err(_) => ExprKind::Float(digits.parse::<f64>().unwrap_or(f64::INFINITY)),
        },
    };
    Some(Expr {
        kind,
        span: token.span,
    })
}

/// Integers past `i64::MAX` become floats.
fn radix_literal(digits: &str, radix: u32) -> ExprKind {
    match i64::from_str_radix(digits, radix) {
        Ok(value) => ExprKind::Int(value),
        Err(_) => ExprKind::Float(
            digits
                .chars()
                .filter_map(|c| c.to_digit(radix))
                .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(d)),
        ),
    }
}

pub(crate) fn string(p: &mut Parser<'_>) -> Option<Expr> {
    let token = p.advance();
    let kind = match token.kind {
        TokenKind::SingleQuoted => ExprKind::String(interpolation::single_quoted(token.text)),
        TokenKind::DoubleQuoted => interpolation::double_quoted(p, token),
        TokenKind::Backtick => interpolation::backtick(p, token),
        _ => interpolation::heredoc(p, token),
    };
    Some(Expr {
        kind,
        span: token.span,
    })
}

pub(crate) fn constant_literal(p: &mut Parser<'_>) -> Option<Expr> {
    let token = p.advance();
    let kind = match token.kind {
        TokenKind::True => ExprKind::Bool(true),
        TokenKind::False => ExprKind::Bool(false),
        _ => ExprKind::Null,
    };
    Some(Expr {
        kind,
        span: token.span,
    })
}

pub(crate) fn magic_constant(p: &mut Parser<'_>) -> Option<Expr> {
    let token = p.advance();
    let kind = match token.kind {
        TokenKind::MagicClass => MagicConstKind::Class,
        TokenKind::MagicDir => MagicConstKind::Dir,
        TokenKind::MagicFile => MagicConstKind::File,
        TokenKind::MagicFunction => MagicConstKind::Function,
        TokenKind::MagicLine => MagicConstKind::Line,
        TokenKind::MagicMethod => MagicConstKind::Method,
        TokenKind::MagicNamespace => MagicConstKind::Namespace,
        TokenKind::MagicTrait => MagicConstKind::Trait,
        _ => MagicConstKind::Property,
    };
    Some(Expr {
        kind: ExprKind::MagicConst(kind),
        span: token.span,
    })
}

/// Constants, function names and class references.
pub(crate) fn name(p: &mut Parser<'_>) -> Option<Expr> {
    let name = p.parse_name()?;
    let span = name.span;
    Some(Expr {
        kind: ExprKind::Name(name),
        span,
    })
}

/// `static function`, `static fn`, or `static` as a class reference.
pub(crate) fn static_prefix(p: &mut Parser<'_>) -> Option<Expr> {
    if matches!(p.peek_kind(), TokenKind::Function | TokenKind::Fn_) {
        let token = p.advance();
        let mut function = match p.current_kind() {
            TokenKind::Function => closure(p)?,
            _ => arrow_function(p)?,
        };
        mark_static(&mut function);
        function.span = function.span.merge(token.span);
        return Some(function);
    }
    let token = p.advance();
    Some(Expr {
        kind: ExprKind::Name(Name::simple(token.text, token.span)),
        span: token.span,
    })
}

fn mark_static(function: &mut Expr) {
    match &mut function.kind {
        ExprKind::Closure(closure) => closure.is_static = true,
        ExprKind::ArrowFunction(arrow) => arrow.is_static = true,
        _ => {}
    }
}

// =============================================================================
// Prefix parslets: operators
// =============================================================================

fn unary_op(kind: TokenKind) -> Option<UnaryOp> {
    let op = match kind {
        TokenKind::Minus => UnaryOp::Negate,
        TokenKind::Plus => UnaryOp::Plus,
        TokenKind::Bang => UnaryOp::Not,
        TokenKind::Tilde => UnaryOp::BitwiseNot,
        TokenKind::PlusPlus => UnaryOp::PreIncrement,
        TokenKind::MinusMinus => UnaryOp::PreDecrement,
        TokenKind::At => UnaryOp::Silence,
        TokenKind::Ampersand => UnaryOp::Reference,
        _ => return None,
    };
    Some(op)
}

pub(crate) fn unary(p: &mut Parser<'_>) -> Option<Expr> {
    let token = p.advance();
    let op = unary_op(token.kind)?;
    let operand = boxed(p, UNARY_BP)?;
    Some(node(p, token.span.start, ExprKind::Unary(UnaryExpr { op, operand })))
}

/// `(expr)`, or a cast such as `(int)` decided by looking two tokens ahead.
pub(crate) fn parenthesized_or_cast(p: &mut Parser<'_>) -> Option<Expr> {
    let open = p.current();
    if let Some(cast) = cast_kind(p) {
        p.advance();
        p.advance();
        p.advance();
        let operand = boxed(p, UNARY_BP)?;
        return Some(node(p, open.span.start, ExprKind::Cast(cast, operand)));
    }

    p.advance();
    let inner = p.parse_expression(0)?;
    p.expect_closing(TokenKind::RightParen, open)?;
    Some(node(p, open.span.start, ExprKind::Parenthesized(Box::new(inner))))
}

fn cast_kind(p: &mut Parser<'_>) -> Option<CastKind> {
    let word = p.peek();
    if !matches!(word.kind, TokenKind::Identifier | TokenKind::Array | TokenKind::Unset)
        || p.peek2_kind() != TokenKind::RightParen
    {
        return None;
    }
    CastKind::from_name(word.text)
}

pub(crate) fn spread(p: &mut Parser<'_>) -> Option<Expr> {
    let token = p.advance();
    let inner = boxed(p, 0)?;
    Some(node(p, token.span.start, ExprKind::Spread(inner)))
}

// =============================================================================
// Prefix parslets: arrays
// =============================================================================

pub(crate) fn short_array(p: &mut Parser<'_>) -> Option<Expr> {
    let open = p.advance();
    let elements = array_elements(p, TokenKind::RightBracket)?;
    p.expect_closing(TokenKind::RightBracket, open)?;
    Some(node(p, open.span.start, ExprKind::Array(elements)))
}

/// `array(...)`
pub(crate) fn array_construct(p: &mut Parser<'_>) -> Option<Expr> {
    let keyword = p.advance();
    let open = p.expect_after(TokenKind::LeftParen, "'array'")?;
    let elements = array_elements(p, TokenKind::RightParen)?;
    p.expect_closing(TokenKind::RightParen, open)?;
    Some(node(p, keyword.span.start, ExprKind::Array(elements)))
}

/// `list(...)`
pub(crate) fn list_construct(p: &mut Parser<'_>) -> Option<Expr> {
    let keyword = p.advance();
    let open = p.expect_after(TokenKind::LeftParen, "'list'")?;
    let elements = array_elements(p, TokenKind::RightParen)?;
    p.expect_closing(TokenKind::RightParen, open)?;
    Some(node(p, keyword.span.start, ExprKind::List(elements)))
}

/// Elements up to (not including) `close`. Empty slots, as in
/// `[, $b] = $pair`, are skipped.
fn array_elements(p: &mut Parser<'_>, close: TokenKind) -> Option<Vec<ArrayElement>> {
    let mut elements = Vec::new();
    while !p.check(close) && !p.check(TokenKind::Eof) {
        if p.eat(TokenKind::Comma).is_some() {
            continue;
        }
        let start = p.start_span();
        let first = p.parse_expression(0)?;
        let element = if p.eat(TokenKind::FatArrow).is_some() {
            let value = p.parse_expression(0)?;
            ArrayElement {
                key: Some(first),
                value,
                span: p.end_span(start),
            }
        } else {
            ArrayElement {
                key: None,
                value: first,
                span: p.end_span(start),
            }
        };
        elements.push(element);
        if p.eat(TokenKind::Comma).is_none() {
            break;
        }
    }
    Some(elements)
}

// =============================================================================
// Prefix parslets: language constructs
// =============================================================================

pub(crate) fn isset(p: &mut Parser<'_>) -> Option<Expr> {
    let keyword = p.advance();
    let open = p.expect_after(TokenKind::LeftParen, "'isset'")?;
    let mut vars = Vec::new();
    while !p.check(TokenKind::RightParen) && !p.check(TokenKind::Eof) {
        vars.push(p.parse_expression(0)?);
        if p.eat(TokenKind::Comma).is_none() {
            break;
        }
    }
    p.expect_closing(TokenKind::RightParen, open)?;
    if vars.is_empty() {
        p.malformed_span("isset() needs at least one argument", p.end_span(keyword.span.start), keyword.position);
    }
    Some(node(p, keyword.span.start, ExprKind::Isset(vars)))
}

fn parenthesized_operand(p: &mut Parser<'_>, after: &str) -> Option<Box<Expr>> {
    let open = p.expect_after(TokenKind::LeftParen, after)?;
    let inner = boxed(p, 0)?;
    p.expect_closing(TokenKind::RightParen, open)?;
    Some(inner)
}

pub(crate) fn empty(p: &mut Parser<'_>) -> Option<Expr> {
    let keyword = p.advance();
    let inner = parenthesized_operand(p, "'empty'")?;
    Some(node(p, keyword.span.start, ExprKind::Empty(inner)))
}

pub(crate) fn eval(p: &mut Parser<'_>) -> Option<Expr> {
    let keyword = p.advance();
    let inner = parenthesized_operand(p, "'eval'")?;
    Some(node(p, keyword.span.start, ExprKind::Eval(inner)))
}

pub(crate) fn include(p: &mut Parser<'_>) -> Option<Expr> {
    let keyword = p.advance();
    let kind = match keyword.kind {
        TokenKind::Include => IncludeKind::Include,
        TokenKind::IncludeOnce => IncludeKind::IncludeOnce,
        TokenKind::Require => IncludeKind::Require,
        _ => IncludeKind::RequireOnce,
    };
    let path = boxed(p, ASSIGNMENT_BP - 1)?;
    Some(node(p, keyword.span.start, ExprKind::Include(kind, path)))
}

/// `exit`, `exit()`, `exit(1)`, and the same for `die`.
pub(crate) fn exit(p: &mut Parser<'_>) -> Option<Expr> {
    let keyword = p.advance();
    let mut status = None;
    if let Some(open) = p.eat(TokenKind::LeftParen) {
        if !p.check(TokenKind::RightParen) {
            status = Some(boxed(p, 0)?);
        }
        p.expect_closing(TokenKind::RightParen, open)?;
    }
    Some(node(p, keyword.span.start, ExprKind::Exit(status)))
}

pub(crate) fn print(p: &mut Parser<'_>) -> Option<Expr> {
    let keyword = p.advance();
    let value = boxed(p, LOGICAL_AND_BP)?;
    Some(node(p, keyword.span.start, ExprKind::Print(value)))
}

pub(crate) fn clone(p: &mut Parser<'_>) -> Option<Expr> {
    let keyword = p.advance();
    let value = boxed(p, UNARY_BP)?;
    Some(node(p, keyword.span.start, ExprKind::Clone(value)))
}

pub(crate) fn throw(p: &mut Parser<'_>) -> Option<Expr> {
    let keyword = p.advance();
    let value = boxed(p, 0)?;
    Some(node(p, keyword.span.start, ExprKind::Throw(value)))
}

/// `yield`, `yield $v`, `yield $k => $v`, `yield from $gen`.
pub(crate) fn yield_expression(p: &mut Parser<'_>) -> Option<Expr> {
    let keyword = p.advance();
    let start = keyword.span.start;

    if p.eat(TokenKind::From).is_some() {
        let value = boxed(p, ASSIGNMENT_BP - 1)?;
        return Some(node(
            p,
            start,
            ExprKind::Yield(YieldExpr {
                key: None,
                value: Some(value),
                from: true,
            }),
        ));
    }

    if precedence::is_terminator(p.current_kind()) {
        return Some(node(
            p,
            start,
            ExprKind::Yield(YieldExpr {
                key: None,
                value: None,
                from: false,
            }),
        ));
    }

    let first = boxed(p, ASSIGNMENT_BP - 1)?;
    let (key, value) = if p.eat(TokenKind::FatArrow).is_some() {
        (Some(first), boxed(p, ASSIGNMENT_BP - 1)?)
    } else {
        (None, first)
    };
    Some(node(
        p,
        start,
        ExprKind::Yield(YieldExpr {
            key,
            value: Some(value),
            from: false,
        }),
    ))
}

// =============================================================================
// Prefix parslets: object creation
// =============================================================================

pub(crate) fn new_expression(p: &mut Parser<'_>) -> Option<Expr> {
    let keyword = p.advance();
    let start = keyword.span.start;

    let anonymous = match p.current_kind() {
        TokenKind::Class | TokenKind::HashBracket => true,
        TokenKind::Readonly | TokenKind::Final | TokenKind::Abstract => p.peek_kind() == TokenKind::Class,
        _ => false,
    };
    if anonymous {
        let (class, args) = decl::parse_anonymous_class(p)?;
        return Some(node(
            p,
            start,
            ExprKind::New(NewExpr {
                class: Box::new(class),
                args,
            }),
        ));
    }

    let class = class_reference(p)?;
    let args = match p.eat(TokenKind::LeftParen) {
        Some(open) => parse_plain_arguments(p, open, "'new'")?,
        None => Vec::new(),
    };
    Some(node(
        p,
        start,
        ExprKind::New(NewExpr {
            class: Box::new(class),
            args,
        }),
    ))
}

/// Class after `new`: a name, a variable with property fetches and
/// indexes (never calls), or a parenthesized expression.
fn class_reference(p: &mut Parser<'_>) -> Option<Expr> {
    let mut class = match p.current_kind() {
        TokenKind::Variable => variable(p)?,
        TokenKind::Dollar => {
            if !p.enter() {
                return None;
            }
            let inner = variable_variable(p);
            p.leave();
            inner?
        }
        TokenKind::LeftParen => {
            let open = p.advance();
            let inner = p.parse_expression(0)?;
            p.expect_closing(TokenKind::RightParen, open)?;
            return Some(node(p, open.span.start, ExprKind::Parenthesized(Box::new(inner))));
        }
        TokenKind::Static => {
            let token = p.advance();
            return Some(Expr {
                kind: ExprKind::Name(Name::simple(token.text, token.span)),
                span: token.span,
            });
        }
        kind if kind.is_identifier_like() || kind == TokenKind::Backslash => return name(p),
        _ => {
            p.unexpected("class name after 'new'");
            return None;
        }
    };

    loop {
        match p.current_kind() {
            TokenKind::Arrow | TokenKind::NullsafeArrow | TokenKind::DoubleColon => {
                let op = p.advance();
                class = member_access(p, class, op)?;
            }
            TokenKind::LeftBracket => {
                let open = p.advance();
                class = index(p, class, open)?;
            }
            _ => break,
        }
    }
    Some(class)
}

// =============================================================================
// Prefix parslets: functions
// =============================================================================

/// `function (...) use (...) { ... }`
pub(crate) fn closure(p: &mut Parser<'_>) -> Option<Expr> {
    closure_with(p, Vec::new())
}

fn closure_with(p: &mut Parser<'_>, attributes: Vec<Attribute>) -> Option<Expr> {
    let keyword = p.advance();
    let by_ref = p.eat(TokenKind::Ampersand).is_some();
    p.with_context(ParsingContext::Closure, |p| {
        let params = decl::parse_params(p, false)?;
        let uses = if p.eat(TokenKind::Use).is_some() {
            closure_uses(p)?
        } else {
            Vec::new()
        };
        let return_type = decl::parse_return_type(p)?;
        let body = decl::parse_block_body(p)?;
        Some(node(
            p,
            keyword.span.start,
            ExprKind::Closure(ClosureExpr {
                is_static: false,
                by_ref,
                params,
                uses,
                return_type,
                body,
                attributes,
            }),
        ))
    })
}

fn closure_uses(p: &mut Parser<'_>) -> Option<Vec<ClosureUse>> {
    let open = p.expect_after(TokenKind::LeftParen, "'use'")?;
    let mut uses = Vec::new();
    while !p.check(TokenKind::RightParen) && !p.check(TokenKind::Eof) {
        let start = p.start_span();
        let by_ref = p.eat(TokenKind::Ampersand).is_some();
        let var = p.expect(TokenKind::Variable)?;
        uses.push(ClosureUse {
            name: variable_name(var.text),
            by_ref,
            span: p.end_span(start),
        });
        if p.eat(TokenKind::Comma).is_none() {
            break;
        }
    }
    p.expect_closing(TokenKind::RightParen, open)?;
    Some(uses)
}

/// `fn (...) => expr`
pub(crate) fn arrow_function(p: &mut Parser<'_>) -> Option<Expr> {
    arrow_function_with(p, Vec::new())
}

fn arrow_function_with(p: &mut Parser<'_>, attributes: Vec<Attribute>) -> Option<Expr> {
    let keyword = p.advance();
    let by_ref = p.eat(TokenKind::Ampersand).is_some();
    p.with_context(ParsingContext::ArrowFunction, |p| {
        let params = decl::parse_params(p, false)?;
        let return_type = decl::parse_return_type(p)?;
        p.expect_after(TokenKind::FatArrow, "arrow function parameters")?;
        let body = boxed(p, 0)?;
        Some(node(
            p,
            keyword.span.start,
            ExprKind::ArrowFunction(ArrowFunctionExpr {
                is_static: false,
                by_ref,
                params,
                return_type,
                body,
                attributes,
            }),
        ))
    })
}

/// `#[Attr] function () {}`, `#[Attr] static fn () => 1`
pub(crate) fn attributed_function(p: &mut Parser<'_>) -> Option<Expr> {
    let start = p.start_span();
    let attributes = p.parse_attributes();
    function_after_attributes(p, attributes, start)
}

/// Closure or arrow function whose attribute list is already parsed.
pub(crate) fn function_after_attributes(
    p: &mut Parser<'_>,
    attributes: Vec<Attribute>,
    start: u32,
) -> Option<Expr> {
    let is_static = p.eat(TokenKind::Static).is_some();
    let mut function = match p.current_kind() {
        TokenKind::Function => closure_with(p, attributes)?,
        TokenKind::Fn_ => arrow_function_with(p, attributes)?,
        _ => {
            p.unexpected("'function' or 'fn' after attributes");
            return None;
        }
    };
    if is_static {
        mark_static(&mut function);
    }
    function.span = p.end_span(start);
    Some(function)
}

// =============================================================================
// Prefix parslets: match
// =============================================================================

pub(crate) fn match_expression(p: &mut Parser<'_>) -> Option<Expr> {
    let keyword = p.advance();
    let subject = parenthesized_operand(p, "'match'")?;
    let open = p.expect_after(TokenKind::LeftBrace, "match subject")?;

    let arms = p.with_context(ParsingContext::Match, |p| {
        let mut arms = Vec::new();
        while !p.check(TokenKind::RightBrace) && !p.check(TokenKind::Eof) {
            arms.push(match_arm(p)?);
            if p.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        Some(arms)
    })?;
    p.expect_closing(TokenKind::RightBrace, open)?;

    Some(node(
        p,
        keyword.span.start,
        ExprKind::Match(MatchExpr { subject, arms }),
    ))
}

/// One arm. A comma directly followed by `=>` is a trailing comma in the
/// condition list, not the start of another condition.
fn match_arm(p: &mut Parser<'_>) -> Option<MatchArm> {
    let start = p.start_span();
    let conditions = if p.check(TokenKind::Default) {
        p.advance();
        p.eat(TokenKind::Comma);
        None
    } else {
        let mut conditions = vec![p.parse_expression(0)?];
        while p.eat(TokenKind::Comma).is_some() {
            if p.check(TokenKind::FatArrow) {
                break;
            }
            conditions.push(p.parse_expression(0)?);
        }
        Some(conditions)
    };
    p.expect_after(TokenKind::FatArrow, "match arm condition")?;
    let body = p.parse_expression(0)?;
    Some(MatchArm {
        conditions,
        body,
        span: p.end_span(start),
    })
}

// =============================================================================
// Infix parslets
// =============================================================================

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::StarStar => BinaryOp::Pow,
        TokenKind::Dot => BinaryOp::Concat,
        TokenKind::EqualsEquals => BinaryOp::Equal,
        TokenKind::BangEquals => BinaryOp::NotEqual,
        TokenKind::EqualsEqualsEquals => BinaryOp::Identical,
        TokenKind::BangEqualsEquals => BinaryOp::NotIdentical,
        TokenKind::LessThan => BinaryOp::Less,
        TokenKind::GreaterThan => BinaryOp::Greater,
        TokenKind::LessThanEquals => BinaryOp::LessOrEqual,
        TokenKind::GreaterThanEquals => BinaryOp::GreaterOrEqual,
        TokenKind::Spaceship => BinaryOp::Spaceship,
        TokenKind::AmpersandAmpersand => BinaryOp::BooleanAnd,
        TokenKind::PipePipe => BinaryOp::BooleanOr,
        TokenKind::Ampersand => BinaryOp::BitwiseAnd,
        TokenKind::Pipe => BinaryOp::BitwiseOr,
        TokenKind::Caret => BinaryOp::BitwiseXor,
        TokenKind::ShiftLeft => BinaryOp::ShiftLeft,
        TokenKind::ShiftRight => BinaryOp::ShiftRight,
        TokenKind::And => BinaryOp::LogicalAnd,
        TokenKind::Or => BinaryOp::LogicalOr,
        TokenKind::Xor => BinaryOp::LogicalXor,
        TokenKind::Instanceof => BinaryOp::Instanceof,
        _ => return None,
    };
    Some(op)
}

fn assign_op(kind: TokenKind) -> Option<AssignOp> {
    let op = match kind {
        TokenKind::Equals => AssignOp::Assign,
        TokenKind::PlusEquals => AssignOp::Plus,
        TokenKind::MinusEquals => AssignOp::Minus,
        TokenKind::StarEquals => AssignOp::Mul,
        TokenKind::SlashEquals => AssignOp::Div,
        TokenKind::PercentEquals => AssignOp::Mod,
        TokenKind::StarStarEquals => AssignOp::Pow,
        TokenKind::DotEquals => AssignOp::Concat,
        TokenKind::AmpersandEquals => AssignOp::BitwiseAnd,
        TokenKind::PipeEquals => AssignOp::BitwiseOr,
        TokenKind::CaretEquals => AssignOp::BitwiseXor,
        TokenKind::ShiftLeftEquals => AssignOp::ShiftLeft,
        TokenKind::ShiftRightEquals => AssignOp::ShiftRight,
        TokenKind::CoalesceEquals => AssignOp::Coalesce,
        _ => return None,
    };
    Some(op)
}

pub(crate) fn binary<'src>(p: &mut Parser<'src>, left: Expr, op: Token<'src>) -> Option<Expr> {
    let bin_op = binary_op(op.kind)?;
    let right = p.parse_expression(precedence::right_binding_power(op.kind))?;
    let span = left.span.merge(right.span);
    Some(Expr {
        kind: ExprKind::Binary(BinaryExpr {
            left: Box::new(left),
            op: bin_op,
            right: Box::new(right),
        }),
        span,
    })
}

/// `=`, compound assignments, and `=&`.
pub(crate) fn assignment<'src>(p: &mut Parser<'src>, target: Expr, op: Token<'src>) -> Option<Expr> {
    let assign = assign_op(op.kind)?;
    let by_ref = assign == AssignOp::Assign && p.eat(TokenKind::Ampersand).is_some();
    let value = p.parse_expression(precedence::right_binding_power(op.kind))?;
    let span = target.span.merge(value.span);
    Some(Expr {
        kind: ExprKind::Assign(AssignExpr {
            target: Box::new(target),
            op: assign,
            by_ref,
            value: Box::new(value),
        }),
        span,
    })
}

/// `c ? a : b` and `c ?: b`. Left-associative: the else branch stops at
/// the next `?`.
pub(crate) fn ternary<'src>(p: &mut Parser<'src>, condition: Expr, _op: Token<'src>) -> Option<Expr> {
    let then_expr = if p.eat(TokenKind::Colon).is_some() {
        None
    } else {
        let then_expr = boxed(p, 0)?;
        p.expect_after(TokenKind::Colon, "ternary branch")?;
        Some(then_expr)
    };
    let else_expr = p.parse_expression(TERNARY_BP)?;
    let span = condition.span.merge(else_expr.span);
    Some(Expr {
        kind: ExprKind::Ternary(TernaryExpr {
            condition: Box::new(condition),
            then_expr,
            else_expr: Box::new(else_expr),
        }),
        span,
    })
}

pub(crate) fn coalesce<'src>(p: &mut Parser<'src>, left: Expr, op: Token<'src>) -> Option<Expr> {
    let right = p.parse_expression(precedence::right_binding_power(op.kind))?;
    let span = left.span.merge(right.span);
    Some(Expr {
        kind: ExprKind::Coalesce(CoalesceExpr {
            left: Box::new(left),
            right: Box::new(right),
        }),
        span,
    })
}

/// `$x |> strlen(...)`
pub(crate) fn pipe<'src>(p: &mut Parser<'src>, input: Expr, _op: Token<'src>) -> Option<Expr> {
    let callable = p.parse_expression(PIPE_BP)?;
    let span = input.span.merge(callable.span);
    Some(Expr {
        kind: ExprKind::Pipe(PipeExpr {
            input: Box::new(input),
            callable: Box::new(callable),
        }),
        span,
    })
}

pub(crate) fn postfix<'src>(_p: &mut Parser<'src>, operand: Expr, op: Token<'src>) -> Option<Expr> {
    let postfix_op = match op.kind {
        TokenKind::PlusPlus => PostfixOp::Increment,
        _ => PostfixOp::Decrement,
    };
    let span = operand.span.merge(op.span);
    Some(Expr {
        kind: ExprKind::Postfix(PostfixExpr {
            operand: Box::new(operand),
            op: postfix_op,
        }),
        span,
    })
}

/// `f(args)`, or the first-class callable `f(...)`.
pub(crate) fn call<'src>(p: &mut Parser<'src>, callee: Expr, open: Token<'src>) -> Option<Expr> {
    let start = callee.span.start;
    let kind = match parse_arguments(p, open)? {
        Arguments::Placeholder => ExprKind::CallableCreate(Box::new(callee)),
        Arguments::List(args) => ExprKind::Call(CallExpr {
            callee: Box::new(callee),
            args,
        }),
    };
    Some(node(p, start, kind))
}

/// `$a[i]`, or `$a[]` for appends.
pub(crate) fn index<'src>(p: &mut Parser<'src>, array: Expr, open: Token<'src>) -> Option<Expr> {
    let start = array.span.start;
    let index = if p.check(TokenKind::RightBracket) {
        None
    } else {
        Some(boxed(p, 0)?)
    };
    p.expect_closing(TokenKind::RightBracket, open)?;
    Some(node(
        p,
        start,
        ExprKind::ArrayAccess(ArrayAccessExpr {
            array: Box::new(array),
            index,
        }),
    ))
}

/// `->`, `?->` and `::` followed by a name, a variable, or `{expr}`.
pub(crate) fn member_access<'src>(p: &mut Parser<'src>, object: Expr, op: Token<'src>) -> Option<Expr> {
    let kind = match op.kind {
        TokenKind::Arrow => AccessKind::Plain,
        TokenKind::NullsafeArrow => AccessKind::Nullsafe,
        _ => AccessKind::Static,
    };
    let member = member_selector(p)?;
    let start = object.span.start;
    Some(node(
        p,
        start,
        ExprKind::MemberAccess(MemberAccessExpr {
            object: Box::new(object),
            member: Box::new(member),
            kind,
        }),
    ))
}

fn member_selector(p: &mut Parser<'_>) -> Option<Expr> {
    let token = p.current();
    match token.kind {
        TokenKind::Variable => variable(p),
        TokenKind::Dollar => variable_variable(p),
        TokenKind::LeftBrace => {
            p.advance();
            let inner = p.parse_expression(0)?;
            p.expect_closing(TokenKind::RightBrace, token)?;
            Some(inner)
        }
        kind if kind.is_identifier_like() => {
            p.advance();
            Some(Expr {
                kind: ExprKind::Name(Name::simple(token.text, token.span)),
                span: token.span,
            })
        }
        _ => {
            p.unexpected("member name");
            None
        }
    }
}

// =============================================================================
// Arguments
// =============================================================================

pub(crate) enum Arguments {
    List(Vec<Expr>),
    /// `(...)`
    Placeholder,
}

/// Arguments after an already consumed `(`, up to and including `)`.
pub(crate) fn parse_arguments<'src>(p: &mut Parser<'src>, open: Token<'src>) -> Option<Arguments> {
    if p.check(TokenKind::Ellipsis) && p.peek_kind() == TokenKind::RightParen {
        p.advance();
        p.advance();
        return Some(Arguments::Placeholder);
    }

    let mut args = Vec::new();
    while !p.check(TokenKind::RightParen) && !p.check(TokenKind::Eof) {
        args.push(argument(p)?);
        if p.eat(TokenKind::Comma).is_none() {
            break;
        }
    }
    p.expect_closing(TokenKind::RightParen, open)?;
    Some(Arguments::List(args))
}

/// Arguments where the `(...)` placeholder is not allowed.
pub(crate) fn parse_plain_arguments<'src>(
    p: &mut Parser<'src>,
    open: Token<'src>,
    owner: &str,
) -> Option<Vec<Expr>> {
    match parse_arguments(p, open)? {
        Arguments::List(args) => Some(args),
        Arguments::Placeholder => {
            let span = p.end_span(open.span.start);
            p.malformed_span(format!("cannot create a callable from {owner}"), span, open.position);
            Some(Vec::new())
        }
    }
}

/// Positional, `name: value`, or `...$spread`.
fn argument(p: &mut Parser<'_>) -> Option<Expr> {
    if p.current_kind().is_identifier_like() && p.peek_kind() == TokenKind::Colon {
        let name = p.advance();
        p.advance();
        let value = boxed(p, 0)?;
        return Some(node(
            p,
            name.span.start,
            ExprKind::NamedArgument(NamedArgument {
                name: name.text.to_string(),
                value,
            }),
        ));
    }
    p.parse_expression(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;

    fn sexpr(source: &str) -> String {
        let text = format!("<?php {source}");
        let mut p = Parser::new(&text, ParserConfig::default());
        p.skip_tags();
        let expr = p.parse_expression(0).expect("expression");
        assert!(p.errors().is_empty(), "{source}: {:?}", p.errors());
        assert!(p.check(TokenKind::Eof), "{source}: trailing {}", p.current_kind());
        expr.sexpr()
    }

    #[test]
    fn test_arithmetic_precedence() {
        assert_eq!(sexpr("1 + 2 * 3"), "(+ 1 (* 2 3))");
        assert_eq!(sexpr("(1 + 2) * 3"), "(* (+ 1 2) 3)");
        assert_eq!(sexpr("$a - $b - $c"), "(- (- $a $b) $c)");
        assert_eq!(sexpr("$a . $b + $c"), "(+ (. $a $b) $c)");
    }

    #[test]
    fn test_right_associative() {
        assert_eq!(sexpr("$a = $b = $c"), "(= $a (= $b $c))");
        assert_eq!(sexpr("$a ** $b ** $c"), "(** $a (** $b $c))");
        assert_eq!(sexpr("$a ?? $b ?? $c"), "(?? $a (?? $b $c))");
    }

    #[test]
    fn test_unary_binds_looser_than_power() {
        assert_eq!(sexpr("-$a ** 2"), "(- (** $a 2))");
        assert_eq!(sexpr("!$a && $b"), "(&& (! $a) $b)");
    }

    #[test]
    fn test_assignment_after_unary_operand() {
        assert_eq!(sexpr("!$x = f()"), "(! (= $x (call f)))");
        assert_eq!(sexpr("$a && $b = 1"), "(&& $a (= $b 1))");
    }

    #[test]
    fn test_keyword_logic_below_assignment() {
        assert_eq!(sexpr("$a = 1 or $b"), "(or (= $a 1) $b)");
        assert_eq!(sexpr("$a and $b xor $c"), "(xor (and $a $b) $c)");
    }

    #[test]
    fn test_ternary() {
        assert_eq!(sexpr("$a ? $b : $c"), "(? $a $b $c)");
        assert_eq!(sexpr("$a ?: $c"), "(?: $a $c)");
        assert_eq!(sexpr("$a ? 1 : 2 ? 3 : 4"), "(? (? $a 1 2) 3 4)");
        assert_eq!(sexpr("$a || $b ? 1 : 2"), "(? (|| $a $b) 1 2)");
    }

    #[test]
    fn test_postfix_chain() {
        assert_eq!(sexpr("f()[0]->m()"), "(call (-> ([] (call f) 0) m))");
        assert_eq!(sexpr("$a?->b::$c"), "(:: (?-> $a b) $c)");
        assert_eq!(sexpr("$o->{$name}"), "(-> $o $name)");
        assert_eq!(sexpr("$i++ + 1"), "(+ (post++ $i) 1)");
        assert_eq!(sexpr("$a[]"), "([] $a)");
    }

    #[test]
    fn test_casts_and_parens() {
        assert_eq!(sexpr("(int) $a + 1"), "(+ ((int) $a) 1)");
        assert_eq!(sexpr("(array) $a"), "((array) $a)");
        assert_eq!(sexpr("(FOO)"), "FOO");
    }

    #[test]
    fn test_numbers() {
        assert_eq!(sexpr("0x1F"), "31");
        assert_eq!(sexpr("0b101"), "5");
        assert_eq!(sexpr("017"), "15");
        assert_eq!(sexpr("0o17"), "15");
        assert_eq!(sexpr("1_000"), "1000");
        assert_eq!(sexpr("1.5"), "1.5");
    }

    #[test]
    fn test_integer_overflow_becomes_float() {
        let mut p = Parser::new("<?php 9223372036854775808 0x8000000000000000", ParserConfig::default());
        p.skip_tags();
        for _ in 0..2 {
            let expr = p.parse_expression(0).unwrap();
            assert!(matches!(expr.kind, ExprKind::Float(v) if v == 9223372036854775808.0));
        }
    }

    #[test]
    fn test_calls_and_arguments() {
        assert_eq!(sexpr("f(1, ...$rest)"), "(call f 1 (... $rest))");
        assert_eq!(sexpr("f(x: 1, list: 2)"), "(call f (x: 1) (list: 2))");
        assert_eq!(sexpr("strlen(...)"), "(callable strlen)");
        assert_eq!(sexpr("$obj->m(...)"), "(callable (-> $obj m))");
        assert_eq!(sexpr(r"\Foo\bar()"), r"(call \Foo\bar)");
    }

    #[test]
    fn test_arrays() {
        assert_eq!(sexpr("[1, 'k' => 2, &$v]"), r#"(array 1 (=> "k" 2) (& $v))"#);
        assert_eq!(sexpr("array(1, 2,)"), "(array 1 2)");
        assert_eq!(sexpr("[$a, [$b]] = $c"), "(= (array $a (array $b)) $c)");
        assert_eq!(sexpr("list($a, $b) = $c"), "(= (list $a $b) $c)");
    }

    #[test]
    fn test_new_and_static() {
        assert_eq!(sexpr("new Foo(1)"), "(new Foo 1)");
        assert_eq!(sexpr("new $cls->name"), "(new (-> $cls name))");
        assert_eq!(sexpr("static::create()"), "(call (:: static create))");
        assert_eq!(sexpr("new class {}"), "(new (class))");
    }

    #[test]
    fn test_functions() {
        assert_eq!(sexpr("fn($x) => $x + 1"), "(fn/1 (+ $x 1))");
        assert_eq!(sexpr("function ($a, $b) use ($c) { return 1; }"), "(closure/2)");
        assert_eq!(sexpr("static fn() => 1"), "(static-fn/0 1)");
    }

    #[test]
    fn test_match_trailing_comma_in_conditions() {
        assert_eq!(
            sexpr("match ($x) { 1, 2, => 'a', default => 'b', }"),
            r#"(match $x (1 2) => "a" default => "b")"#
        );
    }

    #[test]
    fn test_yield_forms() {
        assert_eq!(sexpr("yield"), "(yield)");
        assert_eq!(sexpr("yield $k => $v"), "(yield $k $v)");
        assert_eq!(sexpr("yield from gen()"), "(yield-from (call gen))");
    }

    #[test]
    fn test_constructs() {
        assert_eq!(sexpr("isset($a, $b[1])"), "(isset $a ([] $b 1))");
        assert_eq!(sexpr("exit"), "(exit)");
        assert_eq!(sexpr("print $a . $b"), "(print (. $a $b))");
        assert_eq!(sexpr("include 'a.php'"), r#"(include "a.php")"#);
        assert_eq!(sexpr("$$name"), "($ $name)");
        assert_eq!(sexpr("$x |> strlen(...)"), "(|> $x (callable strlen))");
        assert_eq!(sexpr("$a instanceof Foo"), "(instanceof $a Foo)");
        assert_eq!(sexpr("@$a['x']"), r#"(@ ([] $a "x"))"#);
    }

    #[test]
    fn test_no_prefix_parslet() {
        let mut p = Parser::new("<?php * 2", ParserConfig::default());
        p.skip_tags();
        assert!(p.parse_expression(0).is_none());
        assert_eq!(p.errors().len(), 1);
        assert!(matches!(p.errors()[0], ParseError::NoPrefixParslet { found: TokenKind::Star, .. }));
    }
}
