use std::collections::VecDeque;

use logos::Logos;
use memchr::{memchr, memchr_iter, memmem, memrchr};
use phorge_ast::{Position, Span};

use crate::heredoc;
use crate::source::TokenSource;
use crate::token::{resolve_keyword, Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerError {
    pub message: String,
    pub span: Span,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    InlineHtml,
    Php,
}

/// PHP tokenizer with inline-HTML handling and line/column tracking.
pub struct Lexer<'src> {
    source: &'src str,
    /// Absolute offset of `source[0]`.
    base: u32,
    origin: Position,
    mode: Mode,
    pos: usize,
    // Line bookkeeping, advanced lazily up to `counted`.
    line: u32,
    line_start: isize,
    counted: usize,
    buffer: VecDeque<Token<'src>>,
    errors: Vec<LexerError>,
}

impl<'src> Lexer<'src> {
    /// Lexes a whole file, starting in inline-HTML mode. A leading shebang
    /// line is skipped.
    pub fn new(source: &'src str) -> Self {
        let mut lexer = Self::build(source, 0, Position::START, Mode::InlineHtml);
        if source.starts_with("#!") {
            lexer.pos = memchr(b'\n', source.as_bytes()).map_or(source.len(), |nl| nl + 1);
        }
        lexer
    }

    /// Lexes a fragment of PHP code that sits at `offset` / `origin` in some
    /// enclosing file; spans and positions come out absolute.
    pub fn with_origin(source: &'src str, offset: u32, origin: Position) -> Self {
        Self::build(source, offset, origin, Mode::Php)
    }

    fn build(source: &'src str, base: u32, origin: Position, mode: Mode) -> Self {
        Self {
            source,
            base,
            origin,
            mode,
            pos: 0,
            line: origin.line,
            line_start: 1 - origin.column as isize,
            counted: 0,
            buffer: VecDeque::new(),
            errors: Vec::new(),
        }
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Runs the lexer to completion. The token list always ends with `Eof`.
    #[tracing::instrument(skip_all, fields(len = self.source.len()))]
    pub fn tokenize(mut self) -> (Vec<Token<'src>>, Vec<LexerError>) {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            tokens.push(token);
            if token.kind == TokenKind::Eof {
                break;
            }
        }
        tracing::debug!(tokens = tokens.len(), errors = self.errors.len(), "tokenized");
        (tokens, self.errors)
    }

    fn position_at(&mut self, offset: usize) -> Position {
        let source = self.source;
        if offset < self.counted {
            let before = &source.as_bytes()[..offset];
            let line = self.origin.line + memchr_iter(b'\n', before).count() as u32;
            let line_start =
                memrchr(b'\n', before).map_or(1 - self.origin.column as isize, |nl| nl as isize + 1);
            return Position::new(line, (offset as isize - line_start + 1) as u32);
        }
        for nl in memchr_iter(b'\n', &source.as_bytes()[self.counted..offset]) {
            self.line += 1;
            self.line_start = (self.counted + nl + 1) as isize;
        }
        self.counted = offset;
        Position::new(self.line, (offset as isize - self.line_start + 1) as u32)
    }

    fn span(&self, start: usize, end: usize) -> Span {
        Span::new(self.base + start as u32, self.base + end as u32)
    }

    fn emit(&mut self, kind: TokenKind, start: usize, end: usize) -> Token<'src> {
        self.pos = end;
        let position = self.position_at(start);
        Token::new(kind, &self.source[start..end], self.span(start, end), position)
    }

    fn error(&mut self, message: impl Into<String>, start: usize, end: usize) {
        let position = self.position_at(start);
        let span = self.span(start, end);
        let message = message.into();
        tracing::trace!(%position, %message, "lexical error");
        self.errors.push(LexerError {
            message,
            span,
            position,
        });
    }

    fn eof(&mut self) -> Token<'src> {
        let end = self.source.len();
        self.emit(TokenKind::Eof, end, end)
    }

    fn read_next_token(&mut self) -> Token<'src> {
        loop {
            if self.pos >= self.source.len() {
                return self.eof();
            }
            let token = match self.mode {
                Mode::InlineHtml => Some(self.lex_inline_html()),
                Mode::Php => self.lex_php(),
            };
            if let Some(token) = token {
                return token;
            }
        }
    }

    fn lex_inline_html(&mut self) -> Token<'src> {
        let start = self.pos;
        match find_open_tag(&self.source[start..]) {
            Some((0, kind, len)) => {
                self.mode = Mode::Php;
                self.emit(kind, start, start + len)
            }
            Some((at, _, _)) => self.emit(TokenKind::InlineHtml, start, start + at),
            None => self.emit(TokenKind::InlineHtml, start, self.source.len()),
        }
    }

    /// Lexes one token in PHP mode; `None` when garbage was skipped and the
    /// caller should try again.
    fn lex_php(&mut self) -> Option<Token<'src>> {
        let source = self.source;
        let bytes = source.as_bytes();
        let mut inner = TokenKind::lexer(&source[self.pos..]);

        let Some(result) = inner.next() else {
            // Only whitespace and comments remain.
            return Some(self.eof());
        };
        let start = self.pos + inner.span().start;
        let end = self.pos + inner.span().end;

        let kind = match result {
            Ok(kind) => kind,
            Err(()) => return self.lex_invalid(start, end),
        };

        let token = match kind {
            // A closed `/* */` is skipped by logos, so a `/*` reaching here
            // never ends.
            TokenKind::Slash if bytes.get(end) == Some(&b'*') => {
                self.error("unterminated comment", start, source.len());
                self.eof()
            }
            TokenKind::ShiftLeft if bytes.get(end) == Some(&b'<') => self
                .lex_heredoc(start)
                .unwrap_or_else(|| self.emit(kind, start, end)),
            TokenKind::Identifier => {
                let text = &source[start..end];
                if matches!(text, "b" | "B") && source[end..].starts_with("<<<") {
                    if let Some(token) = self.lex_heredoc(start) {
                        return Some(token);
                    }
                }
                let kind = resolve_keyword(text).unwrap_or(TokenKind::Identifier);
                self.emit(kind, start, end)
            }
            TokenKind::CloseTag => {
                let rest = &source[end..];
                let newline = if rest.starts_with("\r\n") {
                    2
                } else {
                    usize::from(rest.starts_with('\n'))
                };
                self.mode = Mode::InlineHtml;
                self.emit(kind, start, end + newline)
            }
            kind if kind.is_numeric() => self.lex_number(kind, start, end),
            _ => self.emit(kind, start, end),
        };
        Some(token)
    }

    fn lex_invalid(&mut self, start: usize, end: usize) -> Option<Token<'src>> {
        let rest = &self.source[start..];
        let unquoted = rest.strip_prefix(['b', 'B']).unwrap_or(rest);
        if unquoted.starts_with(['\'', '"', '`']) {
            self.error("unterminated string literal", start, self.source.len());
            return Some(self.eof());
        }
        let ch = rest.chars().next().unwrap_or('\0');
        let end = end.max(start + ch.len_utf8());
        self.error(format!("unexpected character '{}'", ch.escape_debug()), start, end);
        self.pos = end;
        None
    }

    /// Rejects a literal with a dangling `_` separator (`1_`, `0x_1`),
    /// swallowing the rest of the malformed literal.
    fn lex_number(&mut self, kind: TokenKind, start: usize, end: usize) -> Token<'src> {
        let bytes = self.source.as_bytes();
        let bad_radix = kind == TokenKind::Int
            && end - start == 1
            && bytes[start] == b'0'
            && matches!(bytes.get(end), Some(b'x' | b'X' | b'b' | b'B' | b'o' | b'O'))
            && bytes.get(end + 1) == Some(&b'_');
        if bytes.get(end) != Some(&b'_') && !bad_radix {
            return self.emit(kind, start, end);
        }

        let mut stop = end;
        while let Some(&b) = bytes.get(stop) {
            let exponent_sign = matches!(b, b'+' | b'-') && matches!(bytes[stop - 1], b'e' | b'E');
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || exponent_sign {
                stop += 1;
            } else {
                break;
            }
        }
        self.error("invalid numeric literal", start, stop);
        self.emit(TokenKind::InvalidNumber, start, stop)
    }

    /// Lexes a heredoc/nowdoc starting at `start`. `None` when the text is
    /// not a heredoc header after all (plain `<<` follows).
    fn lex_heredoc(&mut self, start: usize) -> Option<Token<'src>> {
        let source = self.source;
        let (label, nowdoc, header_len) = heredoc::header(&source[start..])?;
        let body_start = start + header_len;
        let Some((line_start, indent)) = heredoc::closing_marker(&source[body_start..], label) else {
            self.error(
                format!("unterminated heredoc, missing closing '{label}'"),
                start,
                source.len(),
            );
            return Some(self.eof());
        };
        let end = body_start + line_start + indent + label.len();
        let kind = if nowdoc {
            TokenKind::Nowdoc
        } else {
            TokenKind::Heredoc
        };
        Some(self.emit(kind, start, end))
    }
}

impl<'src> TokenSource<'src> for Lexer<'src> {
    fn next_token(&mut self) -> Token<'src> {
        match self.buffer.pop_front() {
            Some(token) => token,
            None => self.read_next_token(),
        }
    }

    fn lookahead(&mut self, n: usize) -> Token<'src> {
        while self.buffer.len() <= n {
            let token = self.read_next_token();
            self.buffer.push_back(token);
        }
        self.buffer[n]
    }

    fn take_errors(&mut self) -> Vec<LexerError> {
        std::mem::take(&mut self.errors)
    }
}

/// Finds the next `<?php` (followed by whitespace or end of input) or `<?=`.
/// Returns its offset, kind and length.
fn find_open_tag(text: &str) -> Option<(usize, TokenKind, usize)> {
    let bytes = text.as_bytes();
    for at in memmem::find_iter(bytes, b"<?") {
        let rest = &bytes[at + 2..];
        if rest.first() == Some(&b'=') {
            return Some((at, TokenKind::OpenTagWithEcho, 3));
        }
        if rest.len() >= 3
            && rest[..3].eq_ignore_ascii_case(b"php")
            && rest.get(3).map_or(true, |b| b.is_ascii_whitespace())
        {
            return Some((at, TokenKind::OpenTag, 5));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, _) = Lexer::new(source).tokenize();
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_php_only() {
        assert_eq!(
            kinds("<?php $x = 42;"),
            vec![
                TokenKind::OpenTag,
                TokenKind::Variable,
                TokenKind::Equals,
                TokenKind::Int,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_inline_html_around_tags() {
        assert_eq!(
            kinds("<p><?php echo 1; ?>\n<br>"),
            vec![
                TokenKind::InlineHtml,
                TokenKind::OpenTag,
                TokenKind::Echo,
                TokenKind::Int,
                TokenKind::Semicolon,
                TokenKind::CloseTag,
                TokenKind::InlineHtml,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_close_tag_swallows_one_newline() {
        let (tokens, _) = Lexer::new("<?php ?>\nx").tokenize();
        assert_eq!(tokens[1].kind, TokenKind::CloseTag);
        assert_eq!(tokens[1].text, "?>\n");
        assert_eq!(tokens[2].text, "x");
    }

    #[test]
    fn test_close_tag_inside_line_comment() {
        assert_eq!(
            kinds("<?php echo 1; // note ?>\n<b>html</b>"),
            vec![
                TokenKind::OpenTag,
                TokenKind::Echo,
                TokenKind::Int,
                TokenKind::Semicolon,
                TokenKind::CloseTag,
                TokenKind::InlineHtml,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_short_echo_tag() {
        assert_eq!(
            kinds("<?= $a ?>"),
            vec![
                TokenKind::OpenTagWithEcho,
                TokenKind::Variable,
                TokenKind::CloseTag,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_only_inline_html() {
        assert_eq!(kinds("<b>Hello</b>"), vec![TokenKind::InlineHtml, TokenKind::Eof]);
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_shebang_is_skipped() {
        assert_eq!(
            kinds("#!/usr/bin/env php\n<?php exit;"),
            vec![TokenKind::OpenTag, TokenKind::Exit, TokenKind::Semicolon, TokenKind::Eof]
        );
    }

    #[test]
    fn test_keywords_case_insensitive() {
        assert_eq!(
            kinds("<?php IF Function NULL foo"),
            vec![
                TokenKind::OpenTag,
                TokenKind::If,
                TokenKind::Function,
                TokenKind::Null,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_positions_track_lines_and_columns() {
        let (tokens, _) = Lexer::new("<?php\n  $a =\n\t1;").tokenize();
        let positions: Vec<_> = tokens.iter().map(|t| (t.text, t.position)).collect();
        assert_eq!(
            positions,
            vec![
                ("<?php", Position::new(1, 1)),
                ("$a", Position::new(2, 3)),
                ("=", Position::new(2, 6)),
                ("1", Position::new(3, 2)),
                (";", Position::new(3, 3)),
                ("", Position::new(3, 4)),
            ]
        );
    }

    #[test]
    fn test_with_origin_shifts_spans_and_positions() {
        let (tokens, _) = Lexer::with_origin("$a->b", 100, Position::new(7, 12)).tokenize();
        assert_eq!(tokens[0].span, Span::new(100, 102));
        assert_eq!(tokens[0].position, Position::new(7, 12));
        assert_eq!(tokens[2].position, Position::new(7, 16));
    }

    #[test]
    fn test_heredoc_and_nowdoc_tokens() {
        let source = "<?php $a = <<<EOT\nhi $x\nEOT;\n$b = <<<'N'\nraw\n  N;";
        let (tokens, errors) = Lexer::new(source).tokenize();
        assert!(errors.is_empty());
        let heredoc = tokens.iter().find(|t| t.kind == TokenKind::Heredoc).unwrap();
        assert_eq!(heredoc.text, "<<<EOT\nhi $x\nEOT");
        let nowdoc = tokens.iter().find(|t| t.kind == TokenKind::Nowdoc).unwrap();
        assert_eq!(nowdoc.text, "<<<'N'\nraw\n  N");
    }

    #[test]
    fn test_shift_left_is_not_heredoc() {
        assert_eq!(
            kinds("<?php $a << 2;"),
            vec![
                TokenKind::OpenTag,
                TokenKind::Variable,
                TokenKind::ShiftLeft,
                TokenKind::Int,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_invalid_numeric_literal() {
        let (tokens, errors) = Lexer::new("<?php 1_000_;").tokenize();
        assert_eq!(tokens[1].kind, TokenKind::InvalidNumber);
        assert_eq!(tokens[1].text, "1_000_");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "invalid numeric literal");
    }

    #[test]
    fn test_unterminated_string_reports_and_ends() {
        let (tokens, errors) = Lexer::new("<?php $a = 'abc").tokenize();
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
        assert_eq!(errors[0].message, "unterminated string literal");
        assert_eq!(errors[0].position, Position::new(1, 12));
    }

    #[test]
    fn test_unterminated_comment() {
        let (_, errors) = Lexer::new("<?php $a; /* open").tokenize();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "unterminated comment");
    }

    #[test]
    fn test_unexpected_character_is_skipped() {
        let (tokens, errors) = Lexer::new("<?php $a \u{1} ;").tokenize();
        assert_eq!(errors.len(), 1);
        assert_eq!(tokens[2].kind, TokenKind::Semicolon);
    }

    #[test]
    fn test_lookahead_buffers_without_consuming() {
        let mut lexer = Lexer::new("<?php (int) $x");
        assert_eq!(lexer.next_token().kind, TokenKind::OpenTag);
        assert_eq!(lexer.lookahead(1).text, "int");
        assert_eq!(lexer.lookahead(0).kind, TokenKind::LeftParen);
        assert_eq!(lexer.next_token().kind, TokenKind::LeftParen);
        assert_eq!(lexer.next_token().kind, TokenKind::Identifier);
    }
}
