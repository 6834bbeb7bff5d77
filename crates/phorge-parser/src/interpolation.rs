//! Decoding of string literal tokens: escape processing, `$var` / `{$expr}`
//! interpolation, heredoc indentation removal.

use phorge_ast::*;
use phorge_lexer::{heredoc, Lexer, Token, TokenKind};

use crate::parser::Parser;

/// Body of a `'...'` literal with `\'` and `\\` resolved.
pub fn single_quoted(text: &str) -> String {
    let inner = strip_quotes(text, '\'');
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next == '\'' || next == '\\' {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// Strips the optional `b` prefix and the surrounding quotes.
fn strip_quotes(text: &str, quote: char) -> &str {
    let text = text.strip_prefix(['b', 'B']).unwrap_or(text);
    let text = text.strip_prefix(quote).unwrap_or(text);
    text.strip_suffix(quote).unwrap_or(text)
}

/// Offset of the body inside a quoted token text.
fn body_offset(text: &str) -> usize {
    if text.starts_with(['b', 'B']) {
        2
    } else {
        1
    }
}

pub fn double_quoted(p: &mut Parser<'_>, token: Token<'_>) -> ExprKind {
    let parts = scan_token(p, token, '"');
    match single_literal(&parts) {
        Some(text) => ExprKind::String(text),
        None => ExprKind::InterpolatedString(parts),
    }
}

pub fn backtick(p: &mut Parser<'_>, token: Token<'_>) -> ExprKind {
    ExprKind::ShellExec(scan_token(p, token, '`'))
}

fn scan_token(p: &mut Parser<'_>, token: Token<'_>, quote: char) -> Vec<StringPart> {
    let offset = body_offset(token.text);
    let body = strip_quotes(token.text, quote);
    Scanner {
        p,
        text: body,
        base: token.span.start + offset as u32,
        cursor: 0,
        cursor_position: token.position.advance(&token.text[..offset]),
        quote: Some(quote),
        indent: 0,
        parts: Vec::new(),
        literal: String::new(),
    }
    .run()
}

fn single_literal(parts: &[StringPart]) -> Option<String> {
    match parts {
        [] => Some(String::new()),
        [StringPart::Literal(text)] => Some(text.clone()),
        _ => None,
    }
}

/// Heredoc or nowdoc. The closing marker's indentation is removed from
/// every body line.
pub fn heredoc<'src>(p: &mut Parser<'src>, token: Token<'src>) -> ExprKind {
    let Some(layout) = heredoc::layout(token.text) else {
        p.malformed("unterminated heredoc", token);
        return ExprKind::String(String::new());
    };

    if token.kind == TokenKind::Nowdoc || layout.nowdoc {
        let value = layout
            .body
            .split('\n')
            .map(|line| strip_indent(line, layout.indent))
            .collect::<Vec<_>>()
            .join("\n");
        return ExprKind::Nowdoc {
            label: layout.label.to_string(),
            value,
        };
    }

    let parts = Scanner {
        p,
        text: layout.body,
        base: token.span.start + layout.body_offset as u32,
        cursor: 0,
        cursor_position: token.position.advance(&token.text[..layout.body_offset]),
        quote: None,
        indent: layout.indent,
        parts: Vec::new(),
        literal: String::new(),
    }
    .run();
    ExprKind::Heredoc {
        label: layout.label.to_string(),
        parts,
    }
}

/// Removes up to `indent` leading spaces or tabs.
fn strip_indent(line: &str, indent: usize) -> &str {
    let width = line
        .bytes()
        .take(indent)
        .take_while(|b| matches!(b, b' ' | b'\t'))
        .count();
    &line[width..]
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || !c.is_ascii()
}

/// Length of the name at the start of `text`, zero if there is none.
fn name_len(text: &str) -> usize {
    match text.chars().next() {
        Some(c) if is_name_start(c) => text.find(|c: char| !is_name_char(c)).unwrap_or(text.len()),
        _ => 0,
    }
}

struct Scanner<'a, 'p, 'src> {
    p: &'p mut Parser<'src>,
    text: &'a str,
    /// Absolute offset of `text`.
    base: u32,
    cursor: usize,
    cursor_position: Position,
    /// Quote character that a backslash escapes, if any.
    quote: Option<char>,
    indent: usize,
    parts: Vec<StringPart>,
    literal: String,
}

impl Scanner<'_, '_, '_> {
    fn run(mut self) -> Vec<StringPart> {
        let mut i = self.skip_indent(0);
        while let Some(c) = self.text[i..].chars().next() {
            i = match c {
                '\\' => self.escape(i),
                '$' => self.dollar(i),
                '{' if self.text[i + 1..].starts_with('$') => self.braced(i),
                '\n' if self.indent > 0 => {
                    self.literal.push('\n');
                    self.skip_indent(i + 1)
                }
                _ => {
                    let rest = &self.text[i..];
                    let first = c.len_utf8();
                    let len = rest[first..]
                        .find(['\\', '$', '{', '\n'])
                        .map_or(rest.len(), |n| n + first);
                    self.literal.push_str(&rest[..len]);
                    i + len
                }
            };
        }
        self.flush();
        self.parts
    }

    fn skip_indent(&self, i: usize) -> usize {
        if self.indent == 0 {
            return i;
        }
        i + (self.text.len() - i - strip_indent(&self.text[i..], self.indent).len())
    }

    fn flush(&mut self) {
        if !self.literal.is_empty() {
            self.parts.push(StringPart::Literal(std::mem::take(&mut self.literal)));
        }
    }

    fn push_expr(&mut self, expr: Expr) {
        self.flush();
        self.parts.push(StringPart::Expr(expr));
    }

    /// Positions only move forward, so they are advanced incrementally.
    fn position_at(&mut self, i: usize) -> Position {
        if i > self.cursor {
            self.cursor_position = self.cursor_position.advance(&self.text[self.cursor..i]);
            self.cursor = i;
        }
        self.cursor_position
    }

    fn span(&self, start: usize, end: usize) -> Span {
        Span::new(self.base + start as u32, self.base + end as u32)
    }

    fn escape(&mut self, i: usize) -> usize {
        let rest = &self.text[i + 1..];
        let Some(next) = rest.chars().next() else {
            self.literal.push('\\');
            return i + 1;
        };
        let simple = match next {
            'n' => Some('\n'),
            't' => Some('\t'),
            'r' => Some('\r'),
            'v' => Some('\x0B'),
            'e' => Some('\x1B'),
            'f' => Some('\x0C'),
            '\\' => Some('\\'),
            '$' => Some('$'),
            c if Some(c) == self.quote => Some(c),
            _ => None,
        };
        if let Some(c) = simple {
            self.literal.push(c);
            return i + 2;
        }

        match next {
            'x' | 'X' => {
                let digits = rest[1..].bytes().take(2).take_while(u8::is_ascii_hexdigit).count();
                if let Ok(byte) = u8::from_str_radix(&rest[1..1 + digits], 16) {
                    self.literal.push(char::from(byte));
                    return i + 2 + digits;
                }
            }
            '0'..='7' => {
                let digits = rest.bytes().take(3).take_while(|b| (b'0'..=b'7').contains(b)).count();
                if let Ok(value) = u32::from_str_radix(&rest[..digits], 8) {
                    self.literal.push(char::from((value & 0xFF) as u8));
                    return i + 1 + digits;
                }
            }
            'u' if rest[1..].starts_with('{') => {
                if let Some(close) = rest.find('}') {
                    let code = u32::from_str_radix(&rest[2..close], 16).ok().and_then(char::from_u32);
                    if let Some(c) = code {
                        self.literal.push(c);
                        return i + 2 + close;
                    }
                }
            }
            _ => {}
        }
        self.literal.push('\\');
        i + 1
    }

    /// `$name`, `$name->prop`, `$name?->prop`, `$name[key]`, `${name}`,
    /// `${expr}`.
    fn dollar(&mut self, i: usize) -> usize {
        let after = &self.text[i + 1..];
        if after.starts_with('{') {
            return self.dollar_brace(i);
        }
        let len = name_len(after);
        if len == 0 {
            self.literal.push('$');
            return i + 1;
        }

        let end = i + 1 + len;
        let var = Expr {
            kind: ExprKind::Variable(after[..len].to_string()),
            span: self.span(i, end),
        };
        let (expr, end) = self.simple_tail(var, i, end);
        self.push_expr(expr);
        end
    }

    /// One property fetch or one index after a simple variable.
    fn simple_tail(&mut self, var: Expr, start: usize, end: usize) -> (Expr, usize) {
        let rest = &self.text[end..];

        let arrow = if rest.starts_with("->") {
            Some((2, AccessKind::Plain))
        } else if rest.starts_with("?->") {
            Some((3, AccessKind::Nullsafe))
        } else {
            None
        };
        if let Some((width, kind)) = arrow {
            let len = name_len(&rest[width..]);
            if len > 0 {
                let name_start = end + width;
                let name_end = name_start + len;
                let member = Expr {
                    kind: ExprKind::Name(Name::simple(&self.text[name_start..name_end], self.span(name_start, name_end))),
                    span: self.span(name_start, name_end),
                };
                let expr = Expr {
                    kind: ExprKind::MemberAccess(MemberAccessExpr {
                        object: Box::new(var),
                        member: Box::new(member),
                        kind,
                    }),
                    span: self.span(start, name_end),
                };
                return (expr, name_end);
            }
        }

        if let Some(inner) = rest.strip_prefix('[') {
            if let Some(close) = inner.find(']') {
                let key_start = end + 1;
                let key_end = key_start + close;
                if let Some(index) = self.simple_index(&inner[..close], key_start, key_end) {
                    let expr = Expr {
                        kind: ExprKind::ArrayAccess(ArrayAccessExpr {
                            array: Box::new(var),
                            index: Some(Box::new(index)),
                        }),
                        span: self.span(start, key_end + 1),
                    };
                    return (expr, key_end + 1);
                }
            }
        }

        (var, end)
    }

    /// `[0]`, `[-1]`, `[key]` or `[$var]` inside a string.
    fn simple_index(&self, key: &str, start: usize, end: usize) -> Option<Expr> {
        let span = self.span(start, end);
        let digits = key.strip_prefix('-').unwrap_or(key);
        let kind = if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            match key.parse::<i64>() {
                Ok(value) if !digits.starts_with('0') || digits == "0" => ExprKind::Int(value),
                _ => ExprKind::String(key.to_string()),
            }
        } else if let Some(name) = key.strip_prefix('$') {
            if name_len(name) != name.len() || name.is_empty() {
                return None;
            }
            ExprKind::Variable(name.to_string())
        } else if !key.is_empty() && name_len(key) == key.len() {
            ExprKind::String(key.to_string())
        } else {
            return None;
        };
        Some(Expr { kind, span })
    }

    /// `${name}` is the variable `$name`; anything else inside the braces is
    /// an expression naming the variable.
    fn dollar_brace(&mut self, i: usize) -> usize {
        let open = i + 1;
        let Some(close) = matching_brace(self.text, open) else {
            self.literal.push('$');
            return i + 1;
        };
        let inner = &self.text[open + 1..close];
        if !inner.is_empty() && name_len(inner) == inner.len() {
            let expr = Expr {
                kind: ExprKind::Variable(inner.to_string()),
                span: self.span(i, close + 1),
            };
            self.push_expr(expr);
            return close + 1;
        }
        match self.sub_expression(open + 1, close) {
            Some(name) => {
                let expr = Expr {
                    kind: ExprKind::VariableVariable(Box::new(name)),
                    span: self.span(i, close + 1),
                };
                self.push_expr(expr);
            }
            None => self.literal.push_str(&self.text[i..=close]),
        }
        close + 1
    }

    /// `{$expr}`
    fn braced(&mut self, i: usize) -> usize {
        let Some(close) = matching_brace(self.text, i) else {
            self.literal.push('{');
            return i + 1;
        };
        match self.sub_expression(i + 1, close) {
            Some(expr) => self.push_expr(expr),
            None => self.literal.push_str(&self.text[i..=close]),
        }
        close + 1
    }

    /// Parses `text[start..end]` as one expression with spans and positions
    /// in the coordinates of the whole file. Diagnostics go to the outer
    /// parser.
    fn sub_expression(&mut self, start: usize, end: usize) -> Option<Expr> {
        let code = &self.text[start..end];
        let position = self.position_at(start);
        let lexer = Lexer::with_origin(code, self.base + start as u32, position);
        let mut sub = Parser::from_source(Box::new(lexer), self.p.config());
        sub.set_depth(self.p.depth());

        let expr = sub.parse_expression(0);
        let expr = match expr {
            Some(expr) if sub.check(TokenKind::Eof) => Some(expr),
            Some(_) => {
                sub.unexpected("'}' to end the interpolated expression");
                None
            }
            None => None,
        };
        let (errors, _) = sub.finish();
        for err in errors {
            self.p.error(err);
        }
        expr
    }
}

/// Offset of the `}` closing the `{` at `open`, skipping quoted strings.
fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            quote @ (b'\'' | b'"') => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;

    fn decode(source: &str) -> (Expr, Vec<crate::ParseError>) {
        let text = format!("<?php {source}");
        let mut p = Parser::new(&text, ParserConfig::default());
        p.skip_tags();
        let expr = p.parse_expression(0).expect("string expression");
        (expr, p.into_errors())
    }

    fn sexpr(source: &str) -> String {
        let (expr, errors) = decode(source);
        assert!(errors.is_empty(), "{source}: {errors:?}");
        expr.sexpr()
    }

    #[test]
    fn test_single_quoted_escapes() {
        assert_eq!(single_quoted(r"'it\'s \\ \n'"), r"it's \ \n");
        assert_eq!(single_quoted("b'x'"), "x");
    }

    #[test]
    fn test_plain_double_quoted_is_string() {
        assert_eq!(sexpr(r#""a\tb\x41\101\u{1F600}""#), "\"a\\tbAA\u{1F600}\"");
        assert_eq!(sexpr(r#""cost: \$5 {not}""#), r#""cost: $5 {not}""#);
    }

    #[test]
    fn test_simple_interpolation() {
        assert_eq!(sexpr(r#""Hi $name!""#), r#"(interp "Hi " $name "!")"#);
        assert_eq!(sexpr(r#""$o->p->q""#), r#"(interp (-> $o p) "->q")"#);
        assert_eq!(sexpr(r#""$o?->p""#), "(interp (?-> $o p))");
        assert_eq!(sexpr(r#""$a[0] $a[-1] $a[k] $a[$i]""#), r#"(interp ([] $a 0) " " ([] $a -1) " " ([] $a "k") " " ([] $a $i))"#);
    }

    #[test]
    fn test_braced_interpolation() {
        assert_eq!(sexpr(r#""{$o->m(1)}s""#), r#"(interp (call (-> $o m) 1) "s")"#);
        assert_eq!(sexpr(r#""${name}""#), "(interp $name)");
        assert_eq!(sexpr(r#""{$a['}']}""#), r#"(interp ([] $a "}"))"#);
    }

    #[test]
    fn test_braced_interpolation_spans_are_absolute() {
        let (expr, _) = decode(r#""ab{$x}""#);
        let ExprKind::InterpolatedString(parts) = expr.kind else {
            panic!("expected interpolation");
        };
        let StringPart::Expr(var) = &parts[1] else {
            panic!("expected expression part");
        };
        // `<?php "ab{` is ten bytes.
        assert_eq!(var.span, Span::new(10, 12));
    }

    #[test]
    fn test_bad_braced_expression_reports_and_keeps_text() {
        let (expr, errors) = decode(r#""{$a +}""#);
        assert_eq!(errors.len(), 1);
        assert_eq!(expr.sexpr(), r#""{$a +}""#);
    }

    #[test]
    fn test_heredoc_strips_closing_indent() {
        let source = "<<<EOT\n    Hello $name\n      bye\n    EOT";
        assert_eq!(sexpr(source), r#"(heredoc "Hello " $name "\n  bye")"#);
    }

    #[test]
    fn test_nowdoc_is_raw() {
        let source = "<<<'EOT'\n  a $b\\n\n  EOT";
        assert_eq!(sexpr(source), r#""a $b\\n""#);
    }

    #[test]
    fn test_backtick() {
        assert_eq!(sexpr("`ls $dir`"), r#"(shell "ls " $dir)"#);
    }
}
