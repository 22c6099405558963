//! Splits template source into text and tag segments, then tokenizes tag bodies.
//!
//! Whitespace handling follows `trim_blocks` + `lstrip_blocks`: a statement or
//! comment tag alone on its line leaves no trace in the output. A `-` inside
//! the delimiters (`{%-`, `-%}`, `{{-`, `-}}`) strips all adjacent whitespace.
//! Everything between `{% raw %}` and `{% endraw %}` is kept as plain text.

use crate::report_engine::error::TemplateError;
use once_cell::sync::Lazy;
use regex::Regex;

static END_RAW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{%([-+]?)\s*endraw\s*(-?)%\}").expect("valid regex"));

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Segment {
    Text(String),
    Output { source: String, line: usize },
    Statement { source: String, line: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TagKind {
    Output,
    Statement,
    Comment,
}

impl TagKind {
    fn closer(self) -> &'static str {
        match self {
            TagKind::Output => "}}",
            TagKind::Statement => "%}",
            TagKind::Comment => "#}",
        }
    }
}

pub(crate) fn segment(source: &str) -> Result<Vec<Segment>, TemplateError> {
    let mut segments = Vec::new();
    let mut pos = 0;
    let mut line = 1;
    let mut raw_from: Option<usize> = None;

    loop {
        if let Some(raw_line) = raw_from.take() {
            let end = END_RAW
                .captures(&source[pos..])
                .ok_or_else(|| TemplateError::syntax(raw_line, "missing '{% endraw %}'"))?;
            let (tag_start, tag_end) = end
                .get(0)
                .map_or((pos, pos), |m| (pos + m.start(), pos + m.end()));
            let mut text = &source[pos..tag_start];
            match &end[1] {
                "-" => text = text.trim_end(),
                "+" => {}
                _ => {
                    let lead = leading_blank(source, pos, tag_start);
                    text = &text[..text.len() - lead];
                }
            }
            if !text.is_empty() {
                segments.push(Segment::Text(text.to_string()));
            }
            line += newlines(&source[pos..tag_end]);
            pos = tag_end;
            skip_after_tag(source, &mut pos, &mut line, &end[2] == "-", true);
            continue;
        }

        let Some((start, kind)) = next_tag(source, pos) else {
            break;
        };
        let mut text = &source[pos..start];
        line += newlines(text);
        let tag_line = line;

        let mut inner_start = start + 2;
        match source[inner_start..].chars().next() {
            Some('-') => {
                text = text.trim_end();
                inner_start += 1;
            }
            Some('+') if kind != TagKind::Output => inner_start += 1,
            _ if kind != TagKind::Output => {
                let lead = leading_blank(source, pos, start);
                text = &text[..text.len() - lead];
            }
            _ => {}
        }
        if !text.is_empty() {
            segments.push(Segment::Text(text.to_string()));
        }

        let close = find_close(source, inner_start, kind).ok_or_else(|| {
            TemplateError::syntax(
                tag_line,
                format!("unclosed tag, expected '{}'", kind.closer()),
            )
        })?;
        let strip_after = close > inner_start && source.as_bytes()[close - 1] == b'-';
        let inner_end = if strip_after { close - 1 } else { close };
        let inner = source[inner_start..inner_end].trim().to_string();
        line += newlines(&source[start..close]);
        pos = close + 2;

        match kind {
            TagKind::Output => segments.push(Segment::Output {
                source: inner,
                line: tag_line,
            }),
            TagKind::Statement if inner == "raw" => raw_from = Some(tag_line),
            TagKind::Statement => segments.push(Segment::Statement {
                source: inner,
                line: tag_line,
            }),
            TagKind::Comment => {}
        }

        skip_after_tag(source, &mut pos, &mut line, strip_after, kind != TagKind::Output);
    }

    if pos < source.len() {
        segments.push(Segment::Text(source[pos..].to_string()));
    }
    Ok(segments)
}

/// Whitespace consumed after a tag: everything for `-`, otherwise one newline
/// after block and comment tags.
fn skip_after_tag(source: &str, pos: &mut usize, line: &mut usize, strip: bool, trim_newline: bool) {
    let rest = &source[*pos..];
    if strip {
        let skipped = rest.len() - rest.trim_start().len();
        *line += newlines(&rest[..skipped]);
        *pos += skipped;
    } else if trim_newline {
        if rest.starts_with("\r\n") {
            *pos += 2;
            *line += 1;
        } else if rest.starts_with('\n') {
            *pos += 1;
            *line += 1;
        }
    }
}

fn next_tag(source: &str, from: usize) -> Option<(usize, TagKind)> {
    let bytes = source.as_bytes();
    let mut i = from;
    while i + 1 < bytes.len() {
        if bytes[i] == b'{' {
            let kind = match bytes[i + 1] {
                b'{' => Some(TagKind::Output),
                b'%' => Some(TagKind::Statement),
                b'#' => Some(TagKind::Comment),
                _ => None,
            };
            if let Some(kind) = kind {
                return Some((i, kind));
            }
        }
        i += 1;
    }
    None
}

/// Byte offset of the closing delimiter. Quoted strings inside expressions may
/// contain the delimiter.
fn find_close(source: &str, from: usize, kind: TagKind) -> Option<usize> {
    let closer = kind.closer().as_bytes();
    if kind == TagKind::Comment {
        return source[from..].find("#}").map(|offset| from + offset);
    }

    let bytes = source.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = from;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            }
            None => {
                if b == b'\'' || b == b'"' {
                    quote = Some(b);
                } else if bytes[i..].starts_with(closer) {
                    return Some(i);
                }
            }
        }
        i += 1;
    }
    None
}

/// Length of the spaces/tabs between the start of the line and `tag_start`,
/// or 0 when anything else (including an earlier tag) shares the line.
fn leading_blank(source: &str, text_start: usize, tag_start: usize) -> usize {
    let line_start = source[..tag_start].rfind('\n').map_or(0, |i| i + 1);
    if line_start < text_start {
        return 0;
    }
    let lead = &source[line_start..tag_start];
    if lead.chars().all(|c| c == ' ' || c == '\t') {
        lead.len()
    } else {
        0
    }
}

fn newlines(text: &str) -> usize {
    text.bytes().filter(|b| *b == b'\n').count()
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Name(String),
    Str(String),
    Int(i64),
    Float(f64),
    Punct(&'static str),
}

// Longest first so `//` wins over `/`.
const PUNCTUATION: &[&str] = &[
    "//", "==", "!=", "<=", ">=", "+", "-", "*", "/", "%", "~", "<", ">", "(", ")", "[", "]", ",",
    ".", "|", "=", ":",
];

pub(crate) fn tokenize(source: &str, line: usize) -> Result<Vec<Token>, TemplateError> {
    let mut tokens = Vec::new();
    let mut i = 0;

    while let Some(c) = source[i..].chars().next() {
        if c.is_whitespace() {
            i += c.len_utf8();
        } else if c.is_ascii_alphabetic() || c == '_' {
            let len = source[i..]
                .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
                .unwrap_or(source.len() - i);
            tokens.push(Token::Name(source[i..i + len].to_string()));
            i += len;
        } else if c.is_ascii_digit() {
            let (token, len) = number(&source[i..], line)?;
            tokens.push(token);
            i += len;
        } else if c == '\'' || c == '"' {
            let (value, len) = string(&source[i..], c, line)?;
            tokens.push(Token::Str(value));
            i += len;
        } else if let Some(punct) = PUNCTUATION.iter().find(|p| source[i..].starts_with(**p)) {
            tokens.push(Token::Punct(punct));
            i += punct.len();
        } else {
            return Err(TemplateError::syntax(
                line,
                format!("unexpected character '{}'", c),
            ));
        }
    }
    Ok(tokens)
}

fn number(rest: &str, line: usize) -> Result<(Token, usize), TemplateError> {
    let bytes = rest.as_bytes();
    let mut len = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    let digits_from = |at: usize| bytes[at..].iter().take_while(|b| b.is_ascii_digit()).count();
    let mut is_float = false;
    if bytes.get(len) == Some(&b'.') && bytes.get(len + 1).is_some_and(|b| b.is_ascii_digit()) {
        len += 1 + digits_from(len + 1);
        is_float = true;
    }
    if matches!(bytes.get(len), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(len + 1), Some(b'+' | b'-')));
        if bytes.get(len + 1 + sign).is_some_and(|b| b.is_ascii_digit()) {
            len += 1 + sign + digits_from(len + 1 + sign);
            is_float = true;
        }
    }
    if is_float {
        let value = rest[..len]
            .parse::<f64>()
            .map_err(|_| TemplateError::syntax(line, format!("invalid number '{}'", &rest[..len])))?;
        Ok((Token::Float(value), len))
    } else {
        let value = rest[..len]
            .parse::<i64>()
            .map_err(|_| TemplateError::syntax(line, format!("integer '{}' is too large", &rest[..len])))?;
        Ok((Token::Int(value), len))
    }
}

fn string(rest: &str, quote: char, line: usize) -> Result<(String, usize), TemplateError> {
    let mut value = String::new();
    let mut chars = rest.char_indices().skip(1);
    while let Some((i, c)) = chars.next() {
        if c == quote {
            return Ok((value, i + c.len_utf8()));
        }
        if c == '\\' {
            match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, 'r')) => value.push('\r'),
                Some((_, other)) => value.push(other),
                None => break,
            }
        } else {
            value.push(c);
        }
    }
    Err(TemplateError::syntax(line, "unterminated string literal"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Segment {
        Segment::Text(s.to_string())
    }

    #[test]
    fn block_tags_on_their_own_line_leave_no_blank_lines() {
        let segments = segment("a\n  {% if x %}\n  b\n  {% endif %}\nc").unwrap();
        assert_eq!(
            segments,
            vec![
                text("a\n"),
                Segment::Statement {
                    source: "if x".to_string(),
                    line: 2
                },
                text("  b\n"),
                Segment::Statement {
                    source: "endif".to_string(),
                    line: 4
                },
                text("c"),
            ]
        );
    }

    #[test]
    fn output_tags_keep_surrounding_whitespace() {
        let segments = segment("  {{ x }}\n").unwrap();
        assert_eq!(
            segments,
            vec![
                text("  "),
                Segment::Output {
                    source: "x".to_string(),
                    line: 1
                },
                text("\n"),
            ]
        );
    }

    #[test]
    fn dash_modifiers_strip_everything_adjacent() {
        let segments = segment("a  \n {{- x -}} \n b").unwrap();
        assert_eq!(
            segments,
            vec![
                text("a"),
                Segment::Output {
                    source: "x".to_string(),
                    line: 2
                },
                text("b"),
            ]
        );
    }

    #[test]
    fn comments_vanish() {
        assert_eq!(segment("a{# note #}b").unwrap(), vec![text("a"), text("b")]);
    }

    #[test]
    fn closer_inside_a_string_does_not_end_the_tag() {
        let segments = segment("{{ '}}' }}").unwrap();
        assert_eq!(
            segments,
            vec![Segment::Output {
                source: "'}}'".to_string(),
                line: 1
            }]
        );
    }

    #[test]
    fn unclosed_tag_reports_its_line() {
        let err = segment("ok\n{{ x").unwrap_err();
        assert_eq!(
            err,
            TemplateError::syntax(2, "unclosed tag, expected '}}'")
        );
    }

    #[test]
    fn tokenizes_expressions() {
        let tokens = tokenize("(a.b // 2) | round(1) ~ 'x\\'y' != 1.5", 1).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Punct("("),
                Token::Name("a".to_string()),
                Token::Punct("."),
                Token::Name("b".to_string()),
                Token::Punct("//"),
                Token::Int(2),
                Token::Punct(")"),
                Token::Punct("|"),
                Token::Name("round".to_string()),
                Token::Punct("("),
                Token::Int(1),
                Token::Punct(")"),
                Token::Punct("~"),
                Token::Str("x'y".to_string()),
                Token::Punct("!="),
                Token::Float(1.5),
            ]
        );
    }

    #[test]
    fn raw_blocks_keep_tags_as_text() {
        let segments = segment("a\n{% raw %}\n{{ x }} {% if %}\n  {% endraw %}\nb").unwrap();
        assert_eq!(segments, vec![text("a\n"), text("{{ x }} {% if %}\n"), text("b")]);
        assert_eq!(
            segment("x\n{% raw %}{{ y }}").unwrap_err(),
            TemplateError::syntax(2, "missing '{% endraw %}'")
        );
    }

    #[test]
    fn exponent_literals_are_floats() {
        assert_eq!(tokenize("1e16", 1).unwrap(), vec![Token::Float(1e16)]);
        assert_eq!(tokenize("2.5E-3", 1).unwrap(), vec![Token::Float(0.0025)]);
        assert_eq!(
            tokenize("3 e", 1).unwrap(),
            vec![Token::Int(3), Token::Name("e".to_string())]
        );
    }

    #[test]
    fn rejects_stray_characters() {
        assert!(tokenize("a $ b", 3).is_err());
        assert!(tokenize("'open", 1).is_err());
    }
}
