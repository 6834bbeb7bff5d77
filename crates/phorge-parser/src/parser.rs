use phorge_ast::*;
use phorge_lexer::{Lexer, Token, TokenKind, TokenSource};

use crate::config::ParserConfig;
use crate::context::ParsingContext;
use crate::diagnostics::ParseError;
use crate::{expr, registry, stmt, types};

pub struct Parser<'src> {
    tokens: Box<dyn TokenSource<'src> + 'src>,
    current: Token<'src>,
    /// End offset of the most recently consumed token.
    previous_end: u32,
    contexts: Vec<ParsingContext>,
    errors: Vec<ParseError>,
    suppressed: usize,
    config: ParserConfig,
    depth: u32,
    depth_reported: bool,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str, config: ParserConfig) -> Self {
        Self::from_source(Box::new(Lexer::new(source)), config)
    }

    pub fn from_source(mut tokens: Box<dyn TokenSource<'src> + 'src>, config: ParserConfig) -> Self {
        let current = tokens.next_token();
        let mut parser = Self {
            tokens,
            current,
            previous_end: current.span.start,
            contexts: Vec::new(),
            errors: Vec::new(),
            suppressed: 0,
            config,
            depth: 0,
            depth_reported: false,
        };
        parser.drain_lexer_errors();
        parser
    }

    pub fn config(&self) -> ParserConfig {
        self.config
    }

    // =========================================================================
    // Token navigation
    // =========================================================================

    pub fn current(&self) -> Token<'src> {
        self.current
    }

    pub fn current_kind(&self) -> TokenKind {
        self.current.kind
    }

    pub fn current_span(&self) -> Span {
        self.current.span
    }

    pub fn current_text(&self) -> &'src str {
        self.current.text
    }

    pub fn current_position(&self) -> Position {
        self.current.position
    }

    /// Advance to the next token, returning the consumed one.
    pub fn advance(&mut self) -> Token<'src> {
        let next = self.tokens.next_token();
        let prev = std::mem::replace(&mut self.current, next);
        self.previous_end = prev.span.end;
        self.drain_lexer_errors();
        prev
    }

    fn drain_lexer_errors(&mut self) {
        for err in self.tokens.take_errors() {
            self.error(ParseError::Lexical {
                message: err.message,
                span: err.span,
                position: err.position,
            });
        }
    }

    /// The token after the current one.
    pub fn peek(&mut self) -> Token<'src> {
        self.tokens.lookahead(0)
    }

    pub fn peek_kind(&mut self) -> TokenKind {
        self.tokens.lookahead(0).kind
    }

    /// Two tokens after the current one.
    pub fn peek2_kind(&mut self) -> TokenKind {
        self.tokens.lookahead(1).kind
    }

    pub fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    pub fn eat(&mut self, kind: TokenKind) -> Option<Token<'src>> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Consume `kind` or record what was found instead.
    pub fn expect(&mut self, kind: TokenKind) -> Option<Token<'src>> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            self.unexpected(kind.to_string());
            None
        }
    }

    /// Like [`Parser::expect`] with a more descriptive message.
    pub fn expect_after(&mut self, kind: TokenKind, after: &str) -> Option<Token<'src>> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            self.unexpected(format!("{kind} after {after}"));
            None
        }
    }

    /// Accepts `;`, or a `?>` which ends the statement without being
    /// consumed. When neither is there and the current token cannot begin a
    /// statement, skips to the next boundary.
    pub fn expect_semicolon(&mut self, after: &str) -> Option<Token<'src>> {
        match self.current_kind() {
            TokenKind::Semicolon => Some(self.advance()),
            TokenKind::CloseTag | TokenKind::Eof => {
                if self.check(TokenKind::Eof) {
                    self.unexpected(format!("';' after {after}"));
                }
                None
            }
            kind => {
                self.unexpected(format!("';' after {after}"));
                if !can_begin_statement(kind) {
                    self.synchronize();
                }
                None
            }
        }
    }

    /// Consume the closing delimiter matching `opened`.
    pub fn expect_closing(&mut self, kind: TokenKind, opened: Token<'src>) -> Option<Token<'src>> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            self.error(ParseError::UnclosedDelimiter {
                delimiter: kind,
                opened_at: opened.position,
                opened_span: opened.span,
                found: self.current_kind(),
                span: self.current_span(),
                position: self.current_position(),
            });
            None
        }
    }

    pub fn start_span(&self) -> u32 {
        self.current.span.start
    }

    /// Span from `start` to the end of the last consumed token.
    pub fn end_span(&self, start: u32) -> Span {
        Span::new(start, self.previous_end.max(start))
    }

    /// Consumes the current token as a name when it is an identifier or any
    /// reserved word.
    pub fn eat_identifier_or_keyword(&mut self) -> Option<(String, Span)> {
        if self.current_kind().is_identifier_like() {
            let token = self.advance();
            Some((token.text.to_string(), token.span))
        } else {
            None
        }
    }

    /// Name of a declared function, class-like or label.
    pub fn expect_declaration_name(&mut self, what: &str) -> Option<(String, Span)> {
        match self.current_kind() {
            TokenKind::Identifier | TokenKind::Enum_ | TokenKind::From | TokenKind::Readonly => {
                let token = self.advance();
                Some((token.text.to_string(), token.span))
            }
            _ => {
                self.unexpected(what);
                None
            }
        }
    }

    /// Drops `<?php` and `?>` tags between statements.
    pub fn skip_tags(&mut self) {
        while matches!(self.current_kind(), TokenKind::OpenTag | TokenKind::CloseTag) {
            self.advance();
        }
    }

    // =========================================================================
    // Parsing contexts
    // =========================================================================

    /// Innermost context, `TopLevel` when nothing is open.
    pub fn context(&self) -> ParsingContext {
        self.contexts.last().copied().unwrap_or(ParsingContext::TopLevel)
    }

    pub fn in_context(&self, context: ParsingContext) -> bool {
        self.contexts.contains(&context)
    }

    /// Innermost class-like body, unless a function body sits in between.
    pub fn enclosing_class_like(&self) -> Option<ParsingContext> {
        self.contexts
            .iter()
            .rev()
            .find(|ctx| ctx.is_class_like() || ctx.is_function_like())
            .copied()
            .filter(|ctx| ctx.is_class_like())
    }

    /// Runs `f` with `context` pushed; the context is popped afterwards
    /// whatever `f` returns.
    pub fn with_context<T>(&mut self, context: ParsingContext, f: impl FnOnce(&mut Self) -> T) -> T {
        self.contexts.push(context);
        let result = f(self);
        self.contexts.pop();
        result
    }

    // =========================================================================
    // Nesting depth
    // =========================================================================

    pub(crate) fn depth(&self) -> u32 {
        self.depth
    }

    pub(crate) fn set_depth(&mut self, depth: u32) {
        self.depth = depth;
    }

    /// Enters one nesting level, or reports the limit and refuses.
    pub(crate) fn enter(&mut self) -> bool {
        if self.depth >= self.config.max_depth {
            if !self.depth_reported {
                self.depth_reported = true;
                tracing::debug!(depth = self.depth, "nesting limit reached");
                self.error(ParseError::MalformedConstruct {
                    message: format!("nesting deeper than {} levels", self.config.max_depth),
                    span: self.current_span(),
                    position: self.current_position(),
                });
            }
            return false;
        }
        self.depth += 1;
        true
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // =========================================================================
    // Error handling
    // =========================================================================

    pub fn error(&mut self, err: ParseError) {
        if self.errors.len() >= self.config.max_errors {
            self.suppressed += 1;
            return;
        }
        self.errors.push(err);
    }

    /// Records that `expected` was required where the current token sits.
    pub fn unexpected(&mut self, expected: impl Into<String>) {
        self.error(ParseError::UnexpectedToken {
            expected: expected.into(),
            found: self.current_kind(),
            span: self.current_span(),
            position: self.current_position(),
        });
    }

    /// Records a construct that parsed but is not allowed as written.
    pub fn malformed(&mut self, message: impl Into<String>, token: Token<'src>) {
        self.malformed_span(message, token.span, token.position);
    }

    pub fn malformed_span(&mut self, message: impl Into<String>, span: Span, position: Position) {
        self.error(ParseError::MalformedConstruct {
            message: message.into(),
            span,
            position,
        });
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn suppressed_errors(&self) -> usize {
        self.suppressed
    }

    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    pub(crate) fn finish(self) -> (Vec<ParseError>, usize) {
        (self.errors, self.suppressed)
    }

    /// Panic-mode recovery: advance until a likely statement boundary. A `;`
    /// is consumed, anything that starts a statement is not.
    pub fn synchronize(&mut self) {
        loop {
            match self.current_kind() {
                TokenKind::Eof | TokenKind::RightBrace | TokenKind::CloseTag => break,
                TokenKind::Semicolon => {
                    self.advance();
                    break;
                }
                kind if is_statement_keyword(kind) => break,
                kind => {
                    tracing::trace!(token = %kind, offset = self.current.span.start, "skipping token");
                    self.advance();
                }
            }
        }
    }

    // =========================================================================
    // Names and attributes
    // =========================================================================

    /// `Foo`, `Foo\Bar`, `\Foo\Bar` or `namespace\Foo`. Stops before a `\`
    /// that is not followed by another segment, as in group use.
    pub fn parse_name(&mut self) -> Option<Name> {
        let start = self.start_span();

        let mut kind = NameKind::Unqualified;
        if self.eat(TokenKind::Backslash).is_some() {
            kind = NameKind::FullyQualified;
        } else if self.check(TokenKind::Namespace) && self.peek_kind() == TokenKind::Backslash {
            self.advance();
            self.advance();
            kind = NameKind::Relative;
        }

        let mut parts = Vec::new();
        loop {
            let Some((text, _)) = self.eat_identifier_or_keyword() else {
                self.unexpected("name");
                return None;
            };
            parts.push(text);
            if self.check(TokenKind::Backslash) && self.peek_kind().is_identifier_like() {
                self.advance();
            } else {
                break;
            }
        }

        if kind == NameKind::Unqualified && parts.len() > 1 {
            kind = NameKind::Qualified;
        }
        Some(Name {
            parts,
            kind,
            span: self.end_span(start),
        })
    }

    /// `#[A]`, `#[A(1), B]`, stacked `#[A] #[B]`.
    pub fn parse_attributes(&mut self) -> Vec<Attribute> {
        let mut attributes = Vec::new();
        while let Some(open) = self.eat(TokenKind::HashBracket) {
            let group_start = attributes.len();
            while !self.check(TokenKind::RightBracket) && !self.check(TokenKind::Eof) {
                let start = self.start_span();
                let Some(name) = self.parse_name() else { break };
                let args = match self.eat(TokenKind::LeftParen) {
                    Some(paren) => expr::parse_plain_arguments(self, paren, "attribute").unwrap_or_default(),
                    None => Vec::new(),
                };
                attributes.push(Attribute {
                    name,
                    args,
                    span: self.end_span(start),
                });
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
            if attributes.len() == group_start {
                let span = open.span.merge(self.current_span());
                self.malformed_span("attribute group cannot be empty", span, open.position);
            }
            self.expect_closing(TokenKind::RightBracket, open);
        }
        attributes
    }

    // =========================================================================
    // Entry points
    // =========================================================================

    pub fn parse_program(&mut self) -> Program {
        let start = self.start_span();
        let stmts = stmt::parse_statement_list(self, &[]);
        Program {
            stmts,
            span: Span::new(start, self.current.span.end.max(start)),
        }
    }

    /// One statement, or an `Error` statement after recovery.
    pub fn parse_statement(&mut self) -> Stmt {
        stmt::parse_stmt(self)
    }

    /// Expression whose operators all bind tighter than `min_bp`.
    pub fn parse_expression(&mut self, min_bp: u8) -> Option<Expr> {
        if !self.enter() {
            return None;
        }
        let result = expr::parse_expression(self, min_bp);
        self.leave();
        result
    }

    pub fn parse_type(&mut self) -> Option<Type> {
        types::parse_type(self)
    }
}

/// Tokens the statement parser dispatches on directly.
pub(crate) fn is_statement_keyword(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::If
            | TokenKind::While
            | TokenKind::Do
            | TokenKind::For
            | TokenKind::Foreach
            | TokenKind::Switch
            | TokenKind::Function
            | TokenKind::Return
            | TokenKind::Echo
            | TokenKind::Break
            | TokenKind::Continue
            | TokenKind::Try
            | TokenKind::Throw
            | TokenKind::Goto
            | TokenKind::Declare
            | TokenKind::Unset
            | TokenKind::Global
            | TokenKind::Class
            | TokenKind::Abstract
            | TokenKind::Final
            | TokenKind::Interface
            | TokenKind::Trait
            | TokenKind::Enum_
            | TokenKind::Namespace
            | TokenKind::Use
            | TokenKind::Const
            | TokenKind::Public
            | TokenKind::Protected
            | TokenKind::Private
            | TokenKind::Var
            | TokenKind::HashBracket
            | TokenKind::InlineHtml
            | TokenKind::OpenTag
            | TokenKind::OpenTagWithEcho
    )
}

pub(crate) fn can_begin_statement(kind: TokenKind) -> bool {
    is_statement_keyword(kind)
        || registry::prefix_parslet(kind).is_some()
        || matches!(kind, TokenKind::LeftBrace | TokenKind::Semicolon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;

    fn parser(source: &str) -> Parser<'_> {
        let mut parser = Parser::new(source, ParserConfig::default());
        parser.skip_tags();
        parser
    }

    #[test]
    fn test_navigation() {
        let mut p = parser("<?php $a = 1;");
        assert!(p.check(TokenKind::Variable));
        assert_eq!(p.current_text(), "$a");
        assert_eq!(p.peek_kind(), TokenKind::Equals);
        assert_eq!(p.peek2_kind(), TokenKind::Int);
        assert!(p.eat(TokenKind::Semicolon).is_none());
        assert!(p.eat(TokenKind::Variable).is_some());
        assert!(p.expect(TokenKind::Equals).is_some());
        assert!(p.errors().is_empty());
    }

    #[test]
    fn test_expect_records_unexpected_token() {
        let mut p = parser("<?php )");
        assert!(p.expect(TokenKind::Semicolon).is_none());
        assert_eq!(p.errors().len(), 1);
        assert_eq!(p.errors()[0].kind(), DiagnosticKind::UnexpectedToken);
        assert_eq!(p.errors()[0].to_string(), "1:7: expected ';', found ')'");
    }

    #[test]
    fn test_end_span_covers_consumed_tokens() {
        let mut p = parser("<?php foo  ;");
        let start = p.start_span();
        p.advance();
        assert_eq!(p.end_span(start), Span::new(6, 9));
    }

    #[test]
    fn test_with_context_pops() {
        let mut p = parser("<?php");
        assert_eq!(p.context(), ParsingContext::TopLevel);
        let inner = p.with_context(ParsingContext::Class, |p| {
            p.with_context(ParsingContext::Method, |p| p.context())
        });
        assert_eq!(inner, ParsingContext::Method);
        assert_eq!(p.context(), ParsingContext::TopLevel);
    }

    #[test]
    fn test_enclosing_class_like_stops_at_functions() {
        let mut p = parser("<?php");
        p.with_context(ParsingContext::Enum, |p| {
            assert_eq!(p.enclosing_class_like(), Some(ParsingContext::Enum));
            p.with_context(ParsingContext::Closure, |p| {
                assert_eq!(p.enclosing_class_like(), None);
            });
        });
    }

    #[test]
    fn test_error_cap_counts_suppressed() {
        let mut p = Parser::new("<?php", ParserConfig::default().with_max_errors(2));
        for _ in 0..5 {
            p.unexpected("anything");
        }
        assert_eq!(p.errors().len(), 2);
        assert_eq!(p.suppressed_errors(), 3);
    }

    #[test]
    fn test_synchronize_stops_at_statement_keyword() {
        let mut p = parser("<?php ) ] + echo 1;");
        p.synchronize();
        assert!(p.check(TokenKind::Echo));
    }

    #[test]
    fn test_synchronize_consumes_semicolon() {
        let mut p = parser("<?php ) ; $x");
        p.synchronize();
        assert!(p.check(TokenKind::Variable));
    }

    #[test]
    fn test_parse_name_forms() {
        let mut p = parser(r"<?php \Foo\Bar namespace\Baz Qux\Quux List");
        let fq = p.parse_name().unwrap();
        assert_eq!(fq.kind, NameKind::FullyQualified);
        assert_eq!(fq.to_string(), r"\Foo\Bar");
        let relative = p.parse_name().unwrap();
        assert_eq!(relative.kind, NameKind::Relative);
        assert_eq!(relative.parts, vec!["Baz"]);
        let qualified = p.parse_name().unwrap();
        assert_eq!(qualified.kind, NameKind::Qualified);
        let keyword = p.parse_name().unwrap();
        assert_eq!(keyword.parts, vec!["List"]);
    }

    #[test]
    fn test_empty_attribute_group_is_malformed() {
        let mut p = parser("<?php #[] function");
        let attributes = p.parse_attributes();
        assert!(attributes.is_empty());
        assert_eq!(p.errors().len(), 1);
        assert_eq!(p.errors()[0].kind(), DiagnosticKind::MalformedConstruct);
        assert!(p.check(TokenKind::Function));
    }

    #[test]
    fn test_depth_limit_reported_once() {
        let mut p = Parser::new("<?php", ParserConfig::default().with_max_depth(1));
        assert!(p.enter());
        assert!(!p.enter());
        assert!(!p.enter());
        p.leave();
        assert_eq!(p.errors().len(), 1);
    }
}
