use std::fmt;

use logos::Logos;
use phorge_ast::{Position, Span};

/// Scans the body of a quoted literal up to and including the closing
/// `quote`, honouring backslash escapes. Returns false when unterminated.
fn lex_quoted(lex: &mut logos::Lexer<TokenKind>, quote: u8) -> bool {
    let bytes = lex.remainder().as_bytes();
    let mut i = 0;
    while i <= bytes.len() {
        let Some(found) = memchr::memchr2(quote, b'\\', &bytes[i..]) else {
            return false;
        };
        let at = i + found;
        if bytes[at] == quote {
            lex.bump(at + 1);
            return true;
        }
        i = at + 2;
    }
    false
}

/// Skips a `//` or `#` comment up to the end of the line or a `?>`,
/// whichever comes first. The newline and the close tag stay in the input.
fn line_comment(lex: &mut logos::Lexer<TokenKind>) -> logos::Skip {
    let rest = lex.remainder().as_bytes();
    let end = memchr::memchr2_iter(b'\n', b'?', rest)
        .find(|&at| rest[at] == b'\n' || rest.get(at + 1) == Some(&b'>'))
        .unwrap_or(rest.len());
    lex.bump(end);
    logos::Skip
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/")]
pub enum TokenKind {
    // --- Literals ---
    #[regex(r"[0-9](_?[0-9])*(\.[0-9](_?[0-9])*)?[eE][+-]?[0-9](_?[0-9])*", priority = 5)]
    #[regex(r"[0-9](_?[0-9])*\.[0-9](_?[0-9])*", priority = 4)]
    #[regex(r"\.[0-9](_?[0-9])*([eE][+-]?[0-9](_?[0-9])*)?", priority = 4)]
    Float,

    #[regex(r"0[xX][0-9a-fA-F](_?[0-9a-fA-F])*")]
    HexInt,

    #[regex(r"0[bB][01](_?[01])*")]
    BinInt,

    #[regex(r"0[oO][0-7](_?[0-7])*", priority = 4)]
    #[regex(r"0[0-7]+", priority = 3)]
    OctInt,

    #[regex(r"[0-9](_?[0-9])*", priority = 1)]
    Int,

    #[regex(r"[bB]?'", |lex| lex_quoted(lex, b'\''))]
    SingleQuoted,

    #[regex(r#"[bB]?""#, |lex| lex_quoted(lex, b'"'))]
    DoubleQuoted,

    #[token("`", |lex| lex_quoted(lex, b'`'))]
    Backtick,

    /// Numeric literal with a misplaced `_` separator.
    InvalidNumber,

    // --- Names ---
    #[regex(r"\$[a-zA-Z_\x{80}-\x{10FFFF}][a-zA-Z0-9_\x{80}-\x{10FFFF}]*")]
    Variable,
    #[token("$")]
    Dollar,

    /// Plain identifier; keywords are resolved from these by the lexer.
    #[regex(r"[a-zA-Z_\x{80}-\x{10FFFF}][a-zA-Z0-9_\x{80}-\x{10FFFF}]*")]
    Identifier,

    // --- Operators ---
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("**")]
    StarStar,
    #[token(".")]
    Dot,

    #[token("=")]
    Equals,
    #[token("+=")]
    PlusEquals,
    #[token("-=")]
    MinusEquals,
    #[token("*=")]
    StarEquals,
    #[token("/=")]
    SlashEquals,
    #[token("%=")]
    PercentEquals,
    #[token("**=")]
    StarStarEquals,
    #[token(".=")]
    DotEquals,
    #[token("&=")]
    AmpersandEquals,
    #[token("|=")]
    PipeEquals,
    #[token("^=")]
    CaretEquals,
    #[token("<<=")]
    ShiftLeftEquals,
    #[token(">>=")]
    ShiftRightEquals,
    #[token("??=")]
    CoalesceEquals,

    #[token("==")]
    EqualsEquals,
    #[token("!=")]
    #[token("<>")]
    BangEquals,
    #[token("===")]
    EqualsEqualsEquals,
    #[token("!==")]
    BangEqualsEquals,
    #[token("<")]
    LessThan,
    #[token(">")]
    GreaterThan,
    #[token("<=")]
    LessThanEquals,
    #[token(">=")]
    GreaterThanEquals,
    #[token("<=>")]
    Spaceship,

    #[token("&&")]
    AmpersandAmpersand,
    #[token("||")]
    PipePipe,
    #[token("!")]
    Bang,

    #[token("&")]
    Ampersand,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("<<")]
    ShiftLeft,
    #[token(">>")]
    ShiftRight,

    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,

    #[token("?")]
    Question,
    #[token("??")]
    QuestionQuestion,
    #[token(":")]
    Colon,
    #[token("=>")]
    FatArrow,
    #[token("|>")]
    PipeArrow,

    // --- Delimiters ---
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token("::")]
    DoubleColon,
    #[token("->")]
    Arrow,
    #[token("?->")]
    NullsafeArrow,
    #[token("\\")]
    Backslash,
    #[token("@")]
    At,
    #[token("#[")]
    HashBracket,
    #[token("...")]
    Ellipsis,

    // --- Keywords (resolved from `Identifier`, see `KEYWORDS`) ---
    Abstract,
    And,
    Array,
    As,
    Break,
    Case,
    Catch,
    Class,
    Clone,
    Const,
    Continue,
    Declare,
    Default,
    Die,
    Do,
    Echo,
    Else,
    ElseIf,
    Empty,
    EndDeclare,
    EndFor,
    EndForeach,
    EndIf,
    EndSwitch,
    EndWhile,
    Enum_,
    Eval,
    Exit,
    Extends,
    False,
    Final,
    Finally,
    Fn_,
    For,
    Foreach,
    From,
    Function,
    Global,
    Goto,
    If,
    Implements,
    Include,
    IncludeOnce,
    Instanceof,
    Insteadof,
    Interface,
    Isset,
    List,
    Match_,
    Namespace,
    New,
    Null,
    Or,
    Parent_,
    Print,
    Private,
    Protected,
    Public,
    Readonly,
    Require,
    RequireOnce,
    Return,
    Self_,
    Static,
    Switch,
    Throw,
    Trait,
    True,
    Try,
    Unset,
    Use,
    Var,
    While,
    Xor,
    Yield_,

    MagicClass,
    MagicDir,
    MagicFile,
    MagicFunction,
    MagicLine,
    MagicMethod,
    MagicNamespace,
    MagicTrait,
    MagicProperty,

    /// Never emitted; the callback skips the comment body.
    #[token("//", line_comment)]
    #[token("#", line_comment)]
    LineComment,

    // --- Produced by the lexer's mode handling, never by logos ---
    /// `<?php`
    OpenTag,
    /// `<?=`
    OpenTagWithEcho,
    /// `?>`, including one directly following newline
    #[token("?>")]
    CloseTag,
    InlineHtml,
    Heredoc,
    Nowdoc,

    Eof,
}

/// Every reserved word with its token kind. Matching is ASCII
/// case-insensitive; the spelling here is the canonical one.
pub const KEYWORDS: &[(&str, TokenKind)] = &[
    ("abstract", TokenKind::Abstract),
    ("and", TokenKind::And),
    ("array", TokenKind::Array),
    ("as", TokenKind::As),
    ("break", TokenKind::Break),
    ("case", TokenKind::Case),
    ("catch", TokenKind::Catch),
    ("class", TokenKind::Class),
    ("clone", TokenKind::Clone),
    ("const", TokenKind::Const),
    ("continue", TokenKind::Continue),
    ("declare", TokenKind::Declare),
    ("default", TokenKind::Default),
    ("die", TokenKind::Die),
    ("do", TokenKind::Do),
    ("echo", TokenKind::Echo),
    ("else", TokenKind::Else),
    ("elseif", TokenKind::ElseIf),
    ("empty", TokenKind::Empty),
    ("enddeclare", TokenKind::EndDeclare),
    ("endfor", TokenKind::EndFor),
    ("endforeach", TokenKind::EndForeach),
    ("endif", TokenKind::EndIf),
    ("endswitch", TokenKind::EndSwitch),
    ("endwhile", TokenKind::EndWhile),
    ("enum", TokenKind::Enum_),
    ("eval", TokenKind::Eval),
    ("exit", TokenKind::Exit),
    ("extends", TokenKind::Extends),
    ("false", TokenKind::False),
    ("final", TokenKind::Final),
    ("finally", TokenKind::Finally),
    ("fn", TokenKind::Fn_),
    ("for", TokenKind::For),
    ("foreach", TokenKind::Foreach),
    ("from", TokenKind::From),
    ("function", TokenKind::Function),
    ("global", TokenKind::Global),
    ("goto", TokenKind::Goto),
    ("if", TokenKind::If),
    ("implements", TokenKind::Implements),
    ("include", TokenKind::Include),
    ("include_once", TokenKind::IncludeOnce),
    ("instanceof", TokenKind::Instanceof),
    ("insteadof", TokenKind::Insteadof),
    ("interface", TokenKind::Interface),
    ("isset", TokenKind::Isset),
    ("list", TokenKind::List),
    ("match", TokenKind::Match_),
    ("namespace", TokenKind::Namespace),
    ("new", TokenKind::New),
    ("null", TokenKind::Null),
    ("or", TokenKind::Or),
    ("parent", TokenKind::Parent_),
    ("print", TokenKind::Print),
    ("private", TokenKind::Private),
    ("protected", TokenKind::Protected),
    ("public", TokenKind::Public),
    ("readonly", TokenKind::Readonly),
    ("require", TokenKind::Require),
    ("require_once", TokenKind::RequireOnce),
    ("return", TokenKind::Return),
    ("self", TokenKind::Self_),
    ("static", TokenKind::Static),
    ("switch", TokenKind::Switch),
    ("throw", TokenKind::Throw),
    ("trait", TokenKind::Trait),
    ("true", TokenKind::True),
    ("try", TokenKind::Try),
    ("unset", TokenKind::Unset),
    ("use", TokenKind::Use),
    ("var", TokenKind::Var),
    ("while", TokenKind::While),
    ("xor", TokenKind::Xor),
    ("yield", TokenKind::Yield_),
    ("__CLASS__", TokenKind::MagicClass),
    ("__DIR__", TokenKind::MagicDir),
    ("__FILE__", TokenKind::MagicFile),
    ("__FUNCTION__", TokenKind::MagicFunction),
    ("__LINE__", TokenKind::MagicLine),
    ("__METHOD__", TokenKind::MagicMethod),
    ("__NAMESPACE__", TokenKind::MagicNamespace),
    ("__TRAIT__", TokenKind::MagicTrait),
    ("__PROPERTY__", TokenKind::MagicProperty),
];

/// Resolves an identifier to its keyword kind, if it is one.
pub fn resolve_keyword(text: &str) -> Option<TokenKind> {
    KEYWORDS
        .iter()
        .find(|(word, _)| word.eq_ignore_ascii_case(text))
        .map(|&(_, kind)| kind)
}

impl TokenKind {
    pub fn is_keyword(self) -> bool {
        KEYWORDS.iter().any(|&(_, kind)| kind == self)
    }

    /// Tokens accepted where a name is expected after `->`, `::`, `const`,
    /// in method declarations and named arguments: identifiers plus every
    /// reserved word.
    pub fn is_identifier_like(self) -> bool {
        self == TokenKind::Identifier || self.is_keyword()
    }

    pub fn is_assignment_op(self) -> bool {
        matches!(
            self,
            TokenKind::Equals
                | TokenKind::PlusEquals
                | TokenKind::MinusEquals
                | TokenKind::StarEquals
                | TokenKind::SlashEquals
                | TokenKind::PercentEquals
                | TokenKind::StarStarEquals
                | TokenKind::DotEquals
                | TokenKind::AmpersandEquals
                | TokenKind::PipeEquals
                | TokenKind::CaretEquals
                | TokenKind::ShiftLeftEquals
                | TokenKind::ShiftRightEquals
                | TokenKind::CoalesceEquals
        )
    }

    /// Declaration modifier keywords, accumulated in any order.
    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            TokenKind::Public
                | TokenKind::Protected
                | TokenKind::Private
                | TokenKind::Static
                | TokenKind::Abstract
                | TokenKind::Final
                | TokenKind::Readonly
                | TokenKind::Var
        )
    }

    pub fn is_magic_const(self) -> bool {
        matches!(
            self,
            TokenKind::MagicClass
                | TokenKind::MagicDir
                | TokenKind::MagicFile
                | TokenKind::MagicFunction
                | TokenKind::MagicLine
                | TokenKind::MagicMethod
                | TokenKind::MagicNamespace
                | TokenKind::MagicTrait
                | TokenKind::MagicProperty
        )
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            TokenKind::Int | TokenKind::HexInt | TokenKind::BinInt | TokenKind::OctInt | TokenKind::Float
        )
    }

    /// Fixed source spelling of punctuation and keywords.
    pub fn lexeme(self) -> Option<&'static str> {
        let text = match self {
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::StarStar => "**",
            TokenKind::Dot => ".",
            TokenKind::Equals => "=",
            TokenKind::PlusEquals => "+=",
            TokenKind::MinusEquals => "-=",
            TokenKind::StarEquals => "*=",
            TokenKind::SlashEquals => "/=",
            TokenKind::PercentEquals => "%=",
            TokenKind::StarStarEquals => "**=",
            TokenKind::DotEquals => ".=",
            TokenKind::AmpersandEquals => "&=",
            TokenKind::PipeEquals => "|=",
            TokenKind::CaretEquals => "^=",
            TokenKind::ShiftLeftEquals => "<<=",
            TokenKind::ShiftRightEquals => ">>=",
            TokenKind::CoalesceEquals => "??=",
            TokenKind::EqualsEquals => "==",
            TokenKind::BangEquals => "!=",
            TokenKind::EqualsEqualsEquals => "===",
            TokenKind::BangEqualsEquals => "!==",
            TokenKind::LessThan => "<",
            TokenKind::GreaterThan => ">",
            TokenKind::LessThanEquals => "<=",
            TokenKind::GreaterThanEquals => ">=",
            TokenKind::Spaceship => "<=>",
            TokenKind::AmpersandAmpersand => "&&",
            TokenKind::PipePipe => "||",
            TokenKind::Bang => "!",
            TokenKind::Ampersand => "&",
            TokenKind::Pipe => "|",
            TokenKind::Caret => "^",
            TokenKind::Tilde => "~",
            TokenKind::ShiftLeft => "<<",
            TokenKind::ShiftRight => ">>",
            TokenKind::PlusPlus => "++",
            TokenKind::MinusMinus => "--",
            TokenKind::Question => "?",
            TokenKind::QuestionQuestion => "??",
            TokenKind::Colon => ":",
            TokenKind::FatArrow => "=>",
            TokenKind::PipeArrow => "|>",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::LeftBracket => "[",
            TokenKind::RightBracket => "]",
            TokenKind::LeftBrace => "{",
            TokenKind::RightBrace => "}",
            TokenKind::Semicolon => ";",
            TokenKind::Comma => ",",
            TokenKind::DoubleColon => "::",
            TokenKind::Arrow => "->",
            TokenKind::NullsafeArrow => "?->",
            TokenKind::Backslash => "\\",
            TokenKind::At => "@",
            TokenKind::HashBracket => "#[",
            TokenKind::Ellipsis => "...",
            TokenKind::Dollar => "$",
            TokenKind::OpenTag => "<?php",
            TokenKind::OpenTagWithEcho => "<?=",
            TokenKind::CloseTag => "?>",
            keyword => {
                return KEYWORDS
                    .iter()
                    .find(|&&(_, kind)| kind == keyword)
                    .map(|&(word, _)| word)
            }
        };
        Some(text)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(text) = self.lexeme() {
            return write!(f, "'{text}'");
        }
        let description = match self {
            TokenKind::Int | TokenKind::HexInt | TokenKind::BinInt | TokenKind::OctInt => "integer",
            TokenKind::Float => "float",
            TokenKind::SingleQuoted | TokenKind::DoubleQuoted => "string",
            TokenKind::Backtick => "backtick string",
            TokenKind::InvalidNumber => "invalid numeric literal",
            TokenKind::Variable => "variable",
            TokenKind::Identifier => "identifier",
            TokenKind::InlineHtml => "inline HTML",
            TokenKind::Heredoc => "heredoc",
            TokenKind::Nowdoc => "nowdoc",
            TokenKind::Eof => "end of file",
            _ => "token",
        };
        f.write_str(description)
    }
}

/// One lexical unit: kind, the exact source slice, and where it sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    pub span: Span,
    pub position: Position,
}

impl<'src> Token<'src> {
    pub fn new(kind: TokenKind, text: &'src str, span: Span, position: Position) -> Self {
        Self {
            kind,
            text,
            span,
            position,
        }
    }

    pub fn eof(offset: u32, position: Position) -> Self {
        Self::new(TokenKind::Eof, "", Span::point(offset), position)
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_keyword_ignores_case() {
        assert_eq!(resolve_keyword("if"), Some(TokenKind::If));
        assert_eq!(resolve_keyword("IF"), Some(TokenKind::If));
        assert_eq!(resolve_keyword("InsteadOf"), Some(TokenKind::Insteadof));
        assert_eq!(resolve_keyword("__line__"), Some(TokenKind::MagicLine));
        assert_eq!(resolve_keyword("myFunc"), None);
    }

    #[test]
    fn test_keyword_lexemes_round_trip_through_table() {
        for &(word, kind) in KEYWORDS {
            assert_eq!(kind.lexeme(), Some(word));
            assert!(kind.is_identifier_like());
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(TokenKind::RightParen.to_string(), "')'");
        assert_eq!(TokenKind::Function.to_string(), "'function'");
        assert_eq!(TokenKind::Variable.to_string(), "variable");
        assert_eq!(TokenKind::Eof.to_string(), "end of file");
    }

    #[test]
    fn test_modifier_set() {
        for kind in [TokenKind::Public, TokenKind::Static, TokenKind::Readonly, TokenKind::Var] {
            assert!(kind.is_modifier());
        }
        assert!(!TokenKind::Function.is_modifier());
        assert!(!TokenKind::Const.is_modifier());
    }

    #[test]
    fn test_is_assignment_op() {
        assert!(TokenKind::Equals.is_assignment_op());
        assert!(TokenKind::CoalesceEquals.is_assignment_op());
        assert!(!TokenKind::EqualsEquals.is_assignment_op());
    }

    #[test]
    fn test_logos_numbers() {
        let mut lex = TokenKind::lexer("42 0xFF 0b1010 077 0o17 3.14 1e10 .5");
        let expected = [
            (TokenKind::Int, "42"),
            (TokenKind::HexInt, "0xFF"),
            (TokenKind::BinInt, "0b1010"),
            (TokenKind::OctInt, "077"),
            (TokenKind::OctInt, "0o17"),
            (TokenKind::Float, "3.14"),
            (TokenKind::Float, "1e10"),
            (TokenKind::Float, ".5"),
        ];
        for (kind, text) in expected {
            assert_eq!(lex.next(), Some(Ok(kind)));
            assert_eq!(lex.slice(), text);
        }
        assert_eq!(lex.next(), None);
    }

    #[test]
    fn test_logos_quoted_strings() {
        let mut lex = TokenKind::lexer(r#"'it\'s' "say \"hi\"" `ls`"#);
        assert_eq!(lex.next(), Some(Ok(TokenKind::SingleQuoted)));
        assert_eq!(lex.slice(), r"'it\'s'");
        assert_eq!(lex.next(), Some(Ok(TokenKind::DoubleQuoted)));
        assert_eq!(lex.next(), Some(Ok(TokenKind::Backtick)));
        assert_eq!(lex.next(), None);
    }

    #[test]
    fn test_logos_unterminated_string_is_error() {
        let mut lex = TokenKind::lexer("'abc");
        assert_eq!(lex.next(), Some(Err(())));
    }

    #[test]
    fn test_logos_comments_skipped() {
        let mut lex = TokenKind::lexer("1 // line\n2 /* block */ 3 # hash\n4");
        for text in ["1", "2", "3", "4"] {
            assert_eq!(lex.next(), Some(Ok(TokenKind::Int)));
            assert_eq!(lex.slice(), text);
        }
    }

    #[test]
    fn test_line_comments_stop_at_close_tag() {
        let mut lex = TokenKind::lexer("1 // a ? b ?> x # c ?>#[");
        assert_eq!(lex.next(), Some(Ok(TokenKind::Int)));
        assert_eq!(lex.next(), Some(Ok(TokenKind::CloseTag)));
        assert_eq!(lex.next(), Some(Ok(TokenKind::Identifier)));
        assert_eq!(lex.next(), Some(Ok(TokenKind::CloseTag)));
        assert_eq!(lex.next(), Some(Ok(TokenKind::HashBracket)));
        assert_eq!(lex.next(), None);
    }
}
