//! Layout of `<<<LABEL` heredoc and `<<<'LABEL'` nowdoc literals, shared by
//! the lexer (to find where the literal ends) and the parser (to extract
//! the body).

use memchr::memchr;

/// The pieces of a complete heredoc/nowdoc token text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeredocLayout<'src> {
    pub label: &'src str,
    pub nowdoc: bool,
    /// Raw body between the header line and the closing marker line,
    /// without the newline that precedes the marker.
    pub body: &'src str,
    /// Byte offset of `body` within the token text.
    pub body_offset: usize,
    /// Width of the closing marker's indentation, removed from every line.
    pub indent: usize,
}

fn is_label_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || !c.is_ascii()
}

/// Parses the opening line. `text` starts at `<<<` (or `b<<<`).
/// Returns the label, whether it is a nowdoc, and the header length
/// including its terminating newline.
pub fn header(text: &str) -> Option<(&str, bool, usize)> {
    let after_prefix = text.strip_prefix(['b', 'B']).unwrap_or(text);
    let spec = after_prefix
        .strip_prefix("<<<")?
        .trim_start_matches([' ', '\t']);

    let (label, nowdoc, rest) = if let Some(quoted) = spec.strip_prefix('\'') {
        let close = quoted.find('\'')?;
        (&quoted[..close], true, &quoted[close + 1..])
    } else if let Some(quoted) = spec.strip_prefix('"') {
        let close = quoted.find('"')?;
        (&quoted[..close], false, &quoted[close + 1..])
    } else {
        let len = spec.find(|c: char| !is_label_char(c)).unwrap_or(spec.len());
        (&spec[..len], false, &spec[len..])
    };

    if label.is_empty()
        || label.starts_with(|c: char| c.is_ascii_digit())
        || !label.chars().all(is_label_char)
    {
        return None;
    }

    let newline = if rest.starts_with("\r\n") {
        2
    } else if rest.starts_with('\n') {
        1
    } else {
        return None;
    };
    Some((label, nowdoc, text.len() - rest.len() + newline))
}

/// Finds the closing marker line in `body`: the label, optionally indented,
/// not followed by another label character. Returns the offset of that
/// line and its indentation width.
pub fn closing_marker(body: &str, label: &str) -> Option<(usize, usize)> {
    let mut line_start = 0;
    loop {
        let line_end = memchr(b'\n', &body.as_bytes()[line_start..])
            .map_or(body.len(), |nl| line_start + nl);
        let line = &body[line_start..line_end];
        let trimmed = line.trim_start_matches([' ', '\t']);
        if let Some(after) = trimmed.strip_prefix(label) {
            if !after.chars().next().is_some_and(is_label_char) {
                return Some((line_start, line.len() - trimmed.len()));
            }
        }
        if line_end >= body.len() {
            return None;
        }
        line_start = line_end + 1;
    }
}

/// Splits a complete heredoc/nowdoc token text.
pub fn layout(text: &str) -> Option<HeredocLayout<'_>> {
    let (label, nowdoc, header_len) = header(text)?;
    let rest = &text[header_len..];
    let (line_start, indent) = closing_marker(rest, label)?;
    let body = if line_start == 0 {
        ""
    } else {
        let raw = &rest[..line_start - 1];
        raw.strip_suffix('\r').unwrap_or(raw)
    };
    Some(HeredocLayout {
        label,
        nowdoc,
        body,
        body_offset: header_len,
        indent,
    })
}
