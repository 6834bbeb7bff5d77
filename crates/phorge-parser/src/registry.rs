//! Token kind to parslet tables driving the expression engine.
//!
//! A prefix parslet starts on the current token and consumes the whole
//! construct it recognises. An infix parslet receives the expression built
//! so far plus the operator token, which the engine has already consumed.

use std::collections::HashMap;

use lazy_static::lazy_static;
use phorge_ast::Expr;
use phorge_lexer::{Token, TokenKind};

use crate::expr;
use crate::parser::Parser;

pub type PrefixParslet = for<'src> fn(&mut Parser<'src>) -> Option<Expr>;
pub type InfixParslet = for<'src> fn(&mut Parser<'src>, Expr, Token<'src>) -> Option<Expr>;

lazy_static! {
    static ref PREFIX_PARSLETS: HashMap<TokenKind, PrefixParslet> = prefix_table();
    static ref INFIX_PARSLETS: HashMap<TokenKind, InfixParslet> = infix_table();
}

pub fn prefix_parslet(kind: TokenKind) -> Option<PrefixParslet> {
    PREFIX_PARSLETS.get(&kind).copied()
}

pub fn infix_parslet(kind: TokenKind) -> Option<InfixParslet> {
    INFIX_PARSLETS.get(&kind).copied()
}

fn prefix_table() -> HashMap<TokenKind, PrefixParslet> {
    let mut table: HashMap<TokenKind, PrefixParslet> = HashMap::new();

    table.insert(TokenKind::Variable, expr::variable);
    table.insert(TokenKind::Dollar, expr::variable_variable);

    for kind in [
        TokenKind::Int,
        TokenKind::HexInt,
        TokenKind::BinInt,
        TokenKind::OctInt,
        TokenKind::Float,
        TokenKind::InvalidNumber,
    ] {
        table.insert(kind, expr::number);
    }
    for kind in [
        TokenKind::SingleQuoted,
        TokenKind::DoubleQuoted,
        TokenKind::Backtick,
        TokenKind::Heredoc,
        TokenKind::Nowdoc,
    ] {
        table.insert(kind, expr::string);
    }
    for kind in [TokenKind::True, TokenKind::False, TokenKind::Null] {
        table.insert(kind, expr::constant_literal);
    }
    for kind in [
        TokenKind::MagicClass,
        TokenKind::MagicDir,
        TokenKind::MagicFile,
        TokenKind::MagicFunction,
        TokenKind::MagicLine,
        TokenKind::MagicMethod,
        TokenKind::MagicNamespace,
        TokenKind::MagicTrait,
        TokenKind::MagicProperty,
    ] {
        table.insert(kind, expr::magic_constant);
    }
    for kind in [
        TokenKind::Identifier,
        TokenKind::Backslash,
        TokenKind::Namespace,
        TokenKind::Self_,
        TokenKind::Parent_,
        TokenKind::Enum_,
        TokenKind::From,
        TokenKind::Readonly,
    ] {
        table.insert(kind, expr::name);
    }
    table.insert(TokenKind::Static, expr::static_prefix);

    for kind in [
        TokenKind::Minus,
        TokenKind::Plus,
        TokenKind::Bang,
        TokenKind::Tilde,
        TokenKind::PlusPlus,
        TokenKind::MinusMinus,
        TokenKind::At,
        TokenKind::Ampersand,
    ] {
        table.insert(kind, expr::unary);
    }

    table.insert(TokenKind::LeftParen, expr::parenthesized_or_cast);
    table.insert(TokenKind::LeftBracket, expr::short_array);
    table.insert(TokenKind::Array, expr::array_construct);
    table.insert(TokenKind::List, expr::list_construct);
    table.insert(TokenKind::Isset, expr::isset);
    table.insert(TokenKind::Empty, expr::empty);
    table.insert(TokenKind::Eval, expr::eval);
    for kind in [
        TokenKind::Include,
        TokenKind::IncludeOnce,
        TokenKind::Require,
        TokenKind::RequireOnce,
    ] {
        table.insert(kind, expr::include);
    }
    table.insert(TokenKind::Exit, expr::exit);
    table.insert(TokenKind::Die, expr::exit);
    table.insert(TokenKind::Print, expr::print);
    table.insert(TokenKind::Clone, expr::clone);
    table.insert(TokenKind::New, expr::new_expression);
    table.insert(TokenKind::Function, expr::closure);
    table.insert(TokenKind::Fn_, expr::arrow_function);
    table.insert(TokenKind::HashBracket, expr::attributed_function);
    table.insert(TokenKind::Match_, expr::match_expression);
    table.insert(TokenKind::Yield_, expr::yield_expression);
    table.insert(TokenKind::Throw, expr::throw);
    table.insert(TokenKind::Ellipsis, expr::spread);

    table
}

fn infix_table() -> HashMap<TokenKind, InfixParslet> {
    let mut table: HashMap<TokenKind, InfixParslet> = HashMap::new();

    for kind in [
        TokenKind::Plus,
        TokenKind::Minus,
        TokenKind::Star,
        TokenKind::Slash,
        TokenKind::Percent,
        TokenKind::StarStar,
        TokenKind::Dot,
        TokenKind::EqualsEquals,
        TokenKind::BangEquals,
        TokenKind::EqualsEqualsEquals,
        TokenKind::BangEqualsEquals,
        TokenKind::LessThan,
        TokenKind::GreaterThan,
        TokenKind::LessThanEquals,
        TokenKind::GreaterThanEquals,
        TokenKind::Spaceship,
        TokenKind::AmpersandAmpersand,
        TokenKind::PipePipe,
        TokenKind::Ampersand,
        TokenKind::Pipe,
        TokenKind::Caret,
        TokenKind::ShiftLeft,
        TokenKind::ShiftRight,
        TokenKind::And,
        TokenKind::Or,
        TokenKind::Xor,
        TokenKind::Instanceof,
    ] {
        table.insert(kind, expr::binary);
    }
    for kind in [
        TokenKind::Equals,
        TokenKind::PlusEquals,
        TokenKind::MinusEquals,
        TokenKind::StarEquals,
        TokenKind::SlashEquals,
        TokenKind::PercentEquals,
        TokenKind::StarStarEquals,
        TokenKind::DotEquals,
        TokenKind::AmpersandEquals,
        TokenKind::PipeEquals,
        TokenKind::CaretEquals,
        TokenKind::ShiftLeftEquals,
        TokenKind::ShiftRightEquals,
        TokenKind::CoalesceEquals,
    ] {
        table.insert(kind, expr::assignment);
    }

    table.insert(TokenKind::Question, expr::ternary);
    table.insert(TokenKind::QuestionQuestion, expr::coalesce);
    table.insert(TokenKind::PipeArrow, expr::pipe);
    table.insert(TokenKind::PlusPlus, expr::postfix);
    table.insert(TokenKind::MinusMinus, expr::postfix);
    table.insert(TokenKind::LeftParen, expr::call);
    table.insert(TokenKind::LeftBracket, expr::index);
    table.insert(TokenKind::Arrow, expr::member_access);
    table.insert(TokenKind::NullsafeArrow, expr::member_access);
    table.insert(TokenKind::DoubleColon, expr::member_access);

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::precedence::binding_power;

    #[test]
    fn test_every_infix_token_has_binding_power() {
        for kind in INFIX_PARSLETS.keys() {
            assert!(binding_power(*kind) > 0, "{kind} has an infix parslet but no binding power");
        }
    }

    #[test]
    fn test_tokens_with_both_roles() {
        for kind in [
            TokenKind::Ampersand,
            TokenKind::Minus,
            TokenKind::PlusPlus,
            TokenKind::LeftParen,
            TokenKind::LeftBracket,
        ] {
            assert!(prefix_parslet(kind).is_some(), "{kind} prefix");
            assert!(infix_parslet(kind).is_some(), "{kind} infix");
        }
    }

    #[test]
    fn test_followers_without_infix_role() {
        for kind in [TokenKind::Semicolon, TokenKind::Comma, TokenKind::Variable, TokenKind::RightParen] {
            assert!(infix_parslet(kind).is_none());
        }
    }

    #[test]
    fn test_tokens_that_cannot_start_an_expression() {
        for kind in [
            TokenKind::RightParen,
            TokenKind::Semicolon,
            TokenKind::Star,
            TokenKind::Default,
            TokenKind::Eof,
        ] {
            assert!(prefix_parslet(kind).is_none(), "{kind}");
        }
    }
}
