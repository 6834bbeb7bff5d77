use phorge_lexer::TokenKind;

// Binding powers, lowest to highest. Left-associative operators recurse
// into their right operand with their own power, right-associative ones
// with one less so that an equal operator on the right still binds.
//
//   or            1      and          5      assignment  10 (right)
//   xor           3
//   ?:           20      ??          22 (right)
//   ||           30      &&          32
//   == != <=>    40      < <= > >=   42      |>          44
//   |            50      ^           52      &           54
//   << >>        60
//   + - .        70
//   * / %        80
//   instanceof   90
//   unary       100
//   **          110 (right)
//   postfix     120
//   ( [ -> ?-> ::  130

pub const LOGICAL_OR_BP: u8 = 1;
pub const LOGICAL_XOR_BP: u8 = 3;
pub const LOGICAL_AND_BP: u8 = 5;
pub const ASSIGNMENT_BP: u8 = 10;
pub const TERNARY_BP: u8 = 20;
pub const COALESCE_BP: u8 = 22;
pub const BOOLEAN_OR_BP: u8 = 30;
pub const BOOLEAN_AND_BP: u8 = 32;
pub const EQUALITY_BP: u8 = 40;
pub const RELATIONAL_BP: u8 = 42;
pub const PIPE_BP: u8 = 44;
pub const BITWISE_OR_BP: u8 = 50;
pub const BITWISE_XOR_BP: u8 = 52;
pub const BITWISE_AND_BP: u8 = 54;
pub const SHIFT_BP: u8 = 60;
pub const ADDITIVE_BP: u8 = 70;
pub const MULTIPLICATIVE_BP: u8 = 80;
pub const INSTANCEOF_BP: u8 = 90;
pub const UNARY_BP: u8 = 100;
pub const POWER_BP: u8 = 110;
pub const POSTFIX_BP: u8 = 120;
pub const CALL_BP: u8 = 130;

/// Infix binding power of `kind`; 0 for tokens that never continue an
/// expression.
pub fn binding_power(kind: TokenKind) -> u8 {
    match kind {
        TokenKind::Or => LOGICAL_OR_BP,
        TokenKind::Xor => LOGICAL_XOR_BP,
        TokenKind::And => LOGICAL_AND_BP,
        k if k.is_assignment_op() => ASSIGNMENT_BP,
        TokenKind::Question => TERNARY_BP,
        TokenKind::QuestionQuestion => COALESCE_BP,
        TokenKind::PipePipe => BOOLEAN_OR_BP,
        TokenKind::AmpersandAmpersand => BOOLEAN_AND_BP,
        TokenKind::EqualsEquals
        | TokenKind::BangEquals
        | TokenKind::EqualsEqualsEquals
        | TokenKind::BangEqualsEquals
        | TokenKind::Spaceship => EQUALITY_BP,
        TokenKind::LessThan
        | TokenKind::LessThanEquals
        | TokenKind::GreaterThan
        | TokenKind::GreaterThanEquals => RELATIONAL_BP,
        TokenKind::PipeArrow => PIPE_BP,
        TokenKind::Pipe => BITWISE_OR_BP,
        TokenKind::Caret => BITWISE_XOR_BP,
        TokenKind::Ampersand => BITWISE_AND_BP,
        TokenKind::ShiftLeft | TokenKind::ShiftRight => SHIFT_BP,
        TokenKind::Plus | TokenKind::Minus | TokenKind::Dot => ADDITIVE_BP,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => MULTIPLICATIVE_BP,
        TokenKind::Instanceof => INSTANCEOF_BP,
        TokenKind::StarStar => POWER_BP,
        TokenKind::PlusPlus | TokenKind::MinusMinus => POSTFIX_BP,
        TokenKind::LeftParen
        | TokenKind::LeftBracket
        | TokenKind::Arrow
        | TokenKind::NullsafeArrow
        | TokenKind::DoubleColon => CALL_BP,
        _ => 0,
    }
}

pub fn is_right_associative(kind: TokenKind) -> bool {
    kind.is_assignment_op() || matches!(kind, TokenKind::QuestionQuestion | TokenKind::StarStar)
}

/// Binding power an infix operator passes down when parsing its right
/// operand.
pub fn right_binding_power(kind: TokenKind) -> u8 {
    let bp = binding_power(kind);
    if is_right_associative(kind) {
        bp - 1
    } else {
        bp
    }
}

/// Tokens that always end an expression, whatever the current binding
/// power.
pub fn is_terminator(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Semicolon
            | TokenKind::Comma
            | TokenKind::RightParen
            | TokenKind::RightBracket
            | TokenKind::RightBrace
            | TokenKind::Colon
            | TokenKind::FatArrow
            | TokenKind::As
            | TokenKind::CloseTag
            | TokenKind::Eof
    )
}

/// Whether `kind` can extend an expression that is already complete.
pub fn continues_expression(kind: TokenKind) -> bool {
    !is_terminator(kind) && binding_power(kind) > 0
}
