//! Error-tolerant Pratt parser for PHP.
//!
//! Parsing never fails outright: every entry point returns a [`Program`]
//! together with the diagnostics recorded on the way, and regions that
//! could not be parsed show up as `Error` statements or absent children.
//!
//! ```
//! let result = phorge_parser::parse("<?php echo 1 + 2 * 3;");
//! assert!(result.errors.is_empty());
//! assert_eq!(result.program.stmts.len(), 1);
//! ```

pub mod config;
pub mod context;
pub mod decl;
pub mod diagnostics;
pub mod expr;
pub mod interpolation;
pub mod parser;
pub mod precedence;
pub mod registry;
pub mod stmt;
pub mod types;

pub use config::ParserConfig;
pub use context::ParsingContext;
pub use diagnostics::{DiagnosticKind, ParseError};
pub use parser::Parser;

use miette::Diagnostic;
use phorge_ast::Program;
use phorge_lexer::{Token, TokenStream};

pub struct ParseResult {
    pub program: Program,
    pub errors: Vec<ParseError>,
    /// Diagnostics dropped after [`ParserConfig::max_errors`] was reached.
    pub suppressed_errors: usize,
}

impl ParseResult {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty() || self.suppressed_errors > 0
    }

    /// All diagnostics as one renderable report over `source`.
    pub fn into_report(self, source: &str) -> Option<miette::Report> {
        let ParseResult { errors, .. } = self;
        let mut errors = errors.into_iter();
        let first = errors.next()?;
        let related: Vec<ParseError> = errors.collect();
        let report = miette::Report::new(ParseErrors { first, related });
        Some(report.with_source_code(source.to_string()))
    }
}

/// The first diagnostic with the rest attached as related ones, so a
/// single report renders them all.
#[derive(Debug, thiserror::Error)]
#[error("{first}")]
struct ParseErrors {
    first: ParseError,
    related: Vec<ParseError>,
}

impl Diagnostic for ParseErrors {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.first.code()
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.first.help()
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        self.first.labels()
    }

    fn related<'a>(&'a self) -> Option<Box<dyn Iterator<Item = &'a dyn Diagnostic> + 'a>> {
        if self.related.is_empty() {
            return None;
        }
        Some(Box::new(self.related.iter().map(|e| e as &dyn Diagnostic)))
    }
}

fn run(mut parser: Parser<'_>) -> ParseResult {
    let program = parser.parse_program();
    let (errors, suppressed_errors) = parser.finish();
    if !errors.is_empty() {
        tracing::debug!(errors = errors.len(), suppressed = suppressed_errors, "parsed with diagnostics");
    }
    ParseResult {
        program,
        errors,
        suppressed_errors,
    }
}

/// Parses PHP source with the default limits.
#[tracing::instrument(skip_all, fields(len = source.len()))]
pub fn parse(source: &str) -> ParseResult {
    run(Parser::new(source, ParserConfig::default()))
}

#[tracing::instrument(skip_all, fields(len = source.len(), max_depth = config.max_depth))]
pub fn parse_with(source: &str, config: &ParserConfig) -> ParseResult {
    run(Parser::new(source, *config))
}

/// Parses an already tokenized input. An `Eof` token is appended when the
/// vector does not end with one.
#[tracing::instrument(skip_all, fields(tokens = tokens.len()))]
pub fn parse_tokens(tokens: Vec<Token<'_>>) -> ParseResult {
    run(Parser::from_source(
        Box::new(TokenStream::new(tokens)),
        ParserConfig::default(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use phorge_lexer::Lexer;

    #[test]
    fn test_parse_tokens_matches_parse() {
        let source = "<?php $a = [1, 2]; foo($a);";
        let (tokens, lexer_errors) = Lexer::new(source).tokenize();
        assert!(lexer_errors.is_empty());
        let from_tokens = parse_tokens(tokens);
        let from_source = parse(source);
        assert!(!from_tokens.has_errors());
        assert_eq!(
            serde_json::to_value(&from_tokens.program).unwrap(),
            serde_json::to_value(&from_source.program).unwrap()
        );
    }

    #[test]
    fn test_max_errors_suppresses() {
        let source = format!("<?php {}", "f(; ".repeat(20));
        let result = parse_with(&source, &ParserConfig::default().with_max_errors(3));
        assert_eq!(result.errors.len(), 3);
        assert!(result.suppressed_errors > 0);
        assert!(result.has_errors());
    }

    #[test]
    fn test_report_carries_every_diagnostic() {
        let source = "<?php f(; g(;";
        let report = parse(source).into_report(source).unwrap();
        let related = report.related().map(|r| r.count()).unwrap_or(0);
        assert!(related >= 1);
        assert_eq!(report.code().unwrap().to_string(), "phorge::no_prefix_parslet");
    }

    #[test]
    fn test_clean_parse_has_no_report() {
        let source = "<?php echo 'ok';";
        assert!(parse(source).into_report(source).is_none());
    }
}
