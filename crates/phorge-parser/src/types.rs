use phorge_ast::*;
use phorge_lexer::TokenKind;

use crate::context::ParsingContext;
use crate::parser::Parser;

/// Whether a type declaration can start at `kind`.
pub fn could_start_type(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Question
            | TokenKind::LeftParen
            | TokenKind::Identifier
            | TokenKind::Backslash
            | TokenKind::Namespace
            | TokenKind::Array
            | TokenKind::Static
            | TokenKind::Self_
            | TokenKind::Parent_
            | TokenKind::Null
            | TokenKind::True
            | TokenKind::False
    )
}

/// `?T`, `A|B|C`, `A&B`, `(A&B)|null`, or a single type.
///
/// Union and intersection members come out as one flat list, and a leading
/// `?` wraps the whole composite.
pub fn parse_type(p: &mut Parser<'_>) -> Option<Type> {
    let start = p.start_span();
    match p.current_kind() {
        TokenKind::Question => {
            p.advance();
            if matches!(p.current_kind(), TokenKind::Question) {
                let extra = p.advance();
                p.malformed("a nullable type cannot be made nullable again", extra);
            }
            let inner = parse_composite(p)?;
            Some(Type {
                kind: TypeKind::Nullable(Box::new(inner)),
                span: p.end_span(start),
            })
        }
        TokenKind::QuestionQuestion => {
            let token = p.advance();
            p.malformed("a nullable type cannot be made nullable again", token);
            let inner = parse_composite(p)?;
            Some(Type {
                kind: TypeKind::Nullable(Box::new(inner)),
                span: p.end_span(start),
            })
        }
        _ => parse_composite(p),
    }
}

fn parse_composite(p: &mut Parser<'_>) -> Option<Type> {
    let start = p.start_span();
    let first = parse_member(p)?;

    if p.check(TokenKind::Pipe) {
        return p.with_context(ParsingContext::UnionType, |p| {
            let mut members = vec![first];
            while p.eat(TokenKind::Pipe).is_some() {
                members.push(parse_member(p)?);
            }
            Some(Type {
                kind: TypeKind::Union(members),
                span: p.end_span(start),
            })
        });
    }

    if continues_intersection(p) {
        if let TypeKind::Intersection(_) = first.kind {
            p.malformed_span(
                "a parenthesized intersection can only be a member of a union",
                first.span,
                p.current_position(),
            );
        }
        let intersection = p.with_context(ParsingContext::IntersectionType, |p| {
            let mut members = vec![first];
            while continues_intersection(p) {
                p.advance();
                members.push(parse_member(p)?);
            }
            Some(Type {
                kind: TypeKind::Intersection(members),
                span: p.end_span(start),
            })
        })?;

        // `A&B|C` needs parentheses, but the intended union is clear enough
        // to keep building it.
        if let Some(bar) = p.eat(TokenKind::Pipe) {
            p.malformed("an intersection inside a union must be parenthesized", bar);
            return p.with_context(ParsingContext::UnionType, |p| {
                let mut members = vec![intersection, parse_member(p)?];
                while p.eat(TokenKind::Pipe).is_some() {
                    members.push(parse_member(p)?);
                }
                Some(Type {
                    kind: TypeKind::Union(members),
                    span: p.end_span(start),
                })
            });
        }
        return Some(intersection);
    }

    Some(first)
}

/// `&` continues an intersection only when a type follows it; otherwise
/// it marks a by-reference parameter.
fn continues_intersection(p: &mut Parser<'_>) -> bool {
    if !p.check(TokenKind::Ampersand) {
        return false;
    }
    let next = p.peek_kind();
    could_start_type(next) && next != TokenKind::Question
}

/// One operand of `|` or `&`.
fn parse_member(p: &mut Parser<'_>) -> Option<Type> {
    while p.check(TokenKind::Question) {
        let token = p.advance();
        p.malformed("'?' cannot mark a member of a union or intersection type", token);
    }
    match p.current_kind() {
        TokenKind::LeftParen => {
            if !p.enter() {
                return None;
            }
            let group = parse_group(p);
            p.leave();
            group
        }
        _ => parse_base(p),
    }
}

/// `(A&B)` inside a union.
fn parse_group(p: &mut Parser<'_>) -> Option<Type> {
    let open = p.advance();
    if p.context() == ParsingContext::IntersectionType {
        p.malformed("an intersection type cannot contain a parenthesized type", open);
    }

    let mut members = p.with_context(ParsingContext::IntersectionType, |p| {
        let mut members = vec![parse_member(p)?];
        loop {
            if p.eat(TokenKind::Ampersand).is_some() {
                members.push(parse_member(p)?);
            } else if let Some(bar) = p.eat(TokenKind::Pipe) {
                p.malformed("a union type cannot be nested inside parentheses", bar);
                members.push(parse_member(p)?);
            } else {
                break;
            }
        }
        Some(members)
    })?;
    p.expect_closing(TokenKind::RightParen, open)?;

    let span = p.end_span(open.span.start);
    if members.len() == 1 {
        p.malformed_span(
            "a parenthesized type must be an intersection of two or more types",
            span,
            open.position,
        );
        return members.pop();
    }
    Some(Type {
        kind: TypeKind::Intersection(members),
        span,
    })
}

fn parse_base(p: &mut Parser<'_>) -> Option<Type> {
    let token = p.current();
    let kind = match token.kind {
        TokenKind::Array => TypeKind::Array,
        TokenKind::Static => TypeKind::Static,
        TokenKind::Self_ | TokenKind::Parent_ => TypeKind::Named(Name::simple(token.text, token.span)),
        TokenKind::Null => TypeKind::Scalar(ScalarType::Null),
        TokenKind::True => TypeKind::Scalar(ScalarType::True),
        TokenKind::False => TypeKind::Scalar(ScalarType::False),
        TokenKind::Identifier if p.peek_kind() != TokenKind::Backslash => {
            if token.text.eq_ignore_ascii_case("callable") {
                TypeKind::Callable
            } else if let Some(scalar) = ScalarType::from_name(token.text) {
                TypeKind::Scalar(scalar)
            } else {
                TypeKind::Named(Name::simple(token.text, token.span))
            }
        }
        TokenKind::Identifier | TokenKind::Backslash | TokenKind::Namespace => {
            let name = p.parse_name()?;
            let span = name.span;
            return Some(Type {
                kind: TypeKind::Named(name),
                span,
            });
        }
        _ => {
            p.unexpected("type");
            return None;
        }
    };
    p.advance();
    Some(Type {
        kind,
        span: token.span,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::diagnostics::DiagnosticKind;

    fn parse(source: &str) -> (Option<Type>, Vec<DiagnosticKind>) {
        let text = format!("<?php {source}");
        let mut p = Parser::new(&text, ParserConfig::default());
        p.skip_tags();
        let ty = parse_type(&mut p);
        let kinds = p.errors().iter().map(|e| e.kind()).collect();
        (ty, kinds)
    }

    fn display(source: &str) -> String {
        let (ty, errors) = parse(source);
        assert!(errors.is_empty(), "{source}: {errors:?}");
        ty.unwrap().to_string()
    }

    #[test]
    fn test_simple_types() {
        assert_eq!(display("int"), "int");
        assert_eq!(display("callable"), "callable");
        assert_eq!(display("array"), "array");
        assert_eq!(display("static"), "static");
        assert_eq!(display(r"\Foo\Bar"), r"\Foo\Bar");
        assert_eq!(display("self"), "self");
    }

    #[test]
    fn test_nullable_wraps_whole_union() {
        let (ty, errors) = parse("?A|B");
        assert!(errors.is_empty());
        let ty = ty.unwrap();
        let TypeKind::Nullable(inner) = &ty.kind else {
            panic!("expected nullable, got {ty}");
        };
        assert_eq!(inner.members().len(), 2);
        assert!(matches!(inner.kind, TypeKind::Union(_)));
    }

    #[test]
    fn test_union_is_flat() {
        let (ty, _) = parse("A|B|C");
        let ty = ty.unwrap();
        let TypeKind::Union(members) = &ty.kind else {
            panic!("expected union");
        };
        assert_eq!(members.len(), 3);
        assert!(members.iter().all(|m| matches!(m.kind, TypeKind::Named(_))));
    }

    #[test]
    fn test_dnf_union_with_intersection() {
        assert_eq!(display("(A&B)|null"), "(A&B)|null");
        assert_eq!(display("A&B&C"), "A&B&C");
        assert_eq!(display("(A&B)|(C&D)|null"), "(A&B)|(C&D)|null");
    }

    #[test]
    fn test_ampersand_before_variable_is_not_intersection() {
        let text = "<?php Foo &$x";
        let mut p = Parser::new(text, ParserConfig::default());
        p.skip_tags();
        let ty = parse_type(&mut p).unwrap();
        assert_eq!(ty.to_string(), "Foo");
        assert!(p.check(TokenKind::Ampersand));
    }

    #[test]
    fn test_invalid_shapes_are_malformed() {
        for source in ["A&(B&C)", "??A", "A|?B", "(A)|B", "A&B|C"] {
            let (ty, errors) = parse(source);
            assert!(ty.is_some(), "{source}");
            assert_eq!(errors, vec![DiagnosticKind::MalformedConstruct], "{source}");
        }
    }

    #[test]
    fn test_missing_type() {
        let (ty, errors) = parse(";");
        assert!(ty.is_none());
        assert_eq!(errors, vec![DiagnosticKind::UnexpectedToken]);
    }
}
