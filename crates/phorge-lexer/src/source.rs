use phorge_ast::Span;

use crate::lexer::LexerError;
use crate::token::{Token, TokenKind};

/// Anything the parser can pull tokens from.
///
/// Implementations must yield an `Eof` token once the input is exhausted and
/// keep yielding it on every later call.
pub trait TokenSource<'src> {
    fn next_token(&mut self) -> Token<'src>;

    /// Peeks `n` tokens past the next one without consuming anything;
    /// `lookahead(0)` is the token the next `next_token` call returns.
    fn lookahead(&mut self, n: usize) -> Token<'src>;

    /// Drains the lexical diagnostics gathered so far.
    fn take_errors(&mut self) -> Vec<LexerError> {
        Vec::new()
    }
}

/// A token source over an already materialised token vector.
pub struct TokenStream<'src> {
    tokens: Vec<Token<'src>>,
    pos: usize,
}

impl<'src> TokenStream<'src> {
    pub fn new(mut tokens: Vec<Token<'src>>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let eof = match tokens.last() {
                Some(last) => Token::eof(last.span.end, last.position.advance(last.text)),
                None => Token::eof(0, Default::default()),
            };
            tokens.push(eof);
        }
        Self { tokens, pos: 0 }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.len() <= 1
    }

    pub fn span(&self) -> Span {
        match (self.tokens.first(), self.tokens.last()) {
            (Some(first), Some(last)) => first.span.merge(last.span),
            _ => Span::DUMMY,
        }
    }

    fn get(&self, index: usize) -> Token<'src> {
        let last = self.tokens.len() - 1;
        self.tokens[index.min(last)]
    }
}

impl<'src> TokenSource<'src> for TokenStream<'src> {
    fn next_token(&mut self) -> Token<'src> {
        let token = self.get(self.pos);
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn lookahead(&mut self, n: usize) -> Token<'src> {
        self.get(self.pos + n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phorge_ast::Position;

    fn tok(kind: TokenKind, text: &'static str, start: u32) -> Token<'static> {
        Token::new(
            kind,
            text,
            Span::new(start, start + text.len() as u32),
            Position::new(1, start + 1),
        )
    }

    #[test]
    fn test_appends_eof_sentinel() {
        let mut stream = TokenStream::new(vec![tok(TokenKind::Variable, "$a", 0)]);
        assert_eq!(stream.len(), 2);
        assert_eq!(stream.next_token().kind, TokenKind::Variable);

        let eof = stream.next_token();
        assert_eq!(eof.kind, TokenKind::Eof);
        assert_eq!(eof.span, Span::point(2));
        assert_eq!(eof.position, Position::new(1, 3));

        assert_eq!(stream.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn test_lookahead_does_not_consume() {
        let mut stream = TokenStream::new(vec![
            tok(TokenKind::LeftParen, "(", 0),
            tok(TokenKind::Identifier, "int", 1),
            tok(TokenKind::RightParen, ")", 4),
        ]);
        assert_eq!(stream.lookahead(1).text, "int");
        assert_eq!(stream.lookahead(2).kind, TokenKind::RightParen);
        assert_eq!(stream.lookahead(10).kind, TokenKind::Eof);
        assert_eq!(stream.next_token().kind, TokenKind::LeftParen);
    }

    #[test]
    fn test_empty_input() {
        let mut stream = TokenStream::new(Vec::new());
        assert!(stream.is_empty());
        assert_eq!(stream.next_token().kind, TokenKind::Eof);
    }
}
