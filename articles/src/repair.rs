//! Best-effort cleanup of near-JSON text produced by a language model.

use serde_json::Value;

/// Returns `raw` unchanged when it already parses, otherwise a repaired copy.
///
/// Code fences and surrounding prose are removed, strings delimited by single
/// or typographic quotes are rewritten with `"`, trailing commas dropped and
/// unterminated strings, objects and arrays closed. Quote characters inside
/// string contents are kept as text. Every `[` or `{` is tried as the start of
/// the value; the first candidate holding objects or arrays wins over one that
/// merely parses (a `[1]` citation in prose). The result is not guaranteed to
/// be valid JSON.
pub fn repair_json(raw: &str) -> String {
    let trimmed = raw.trim();
    if serde_json::from_str::<Value>(trimmed).is_ok() {
        return trimmed.to_string();
    }

    let unfenced = strip_code_fences(trimmed);
    let mut first = None;
    let mut parsed = None;
    for (start, _) in unfenced.match_indices(['[', '{']) {
        let candidate = close_structure(&unfenced[start..]);
        match serde_json::from_str::<Value>(&candidate) {
            Ok(value) if holds_records(&value) => return candidate,
            Ok(_) if parsed.is_none() => parsed = Some(candidate),
            Ok(_) => {}
            Err(_) if first.is_none() => first = Some(candidate),
            Err(_) => {}
        }
    }

    parsed.or(first).unwrap_or_else(|| unfenced.to_string())
}

fn holds_records(value: &Value) -> bool {
    match value {
        Value::Object(_) => true,
        Value::Array(items) => items.iter().any(|item| item.is_object() || item.is_array()),
        _ => false,
    }
}

fn strip_code_fences(text: &str) -> &str {
    let Some(open) = text.find("```") else {
        return text;
    };
    let after = &text[open + 3..];
    // skip the language tag
    let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after[body_start..];
    match body.find("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

#[derive(Clone, Copy)]
enum Quote {
    Double,
    Single,
    Typographic,
}

impl Quote {
    fn opening(ch: char) -> Option<Self> {
        match ch {
            '"' => Some(Quote::Double),
            '\'' => Some(Quote::Single),
            '\u{201c}' | '\u{201d}' | '\u{201e}' => Some(Quote::Typographic),
            _ => None,
        }
    }

    fn closes_with(self, ch: char) -> bool {
        match self {
            Quote::Double => ch == '"',
            Quote::Single => ch == '\'',
            Quote::Typographic => matches!(ch, '\u{201c}' | '\u{201d}' | '\u{201e}'),
        }
    }
}

/// A quote only ends a string when a separator, a closer or the end of the
/// text follows it.
fn ends_string(rest: &[char]) -> bool {
    rest.iter()
        .find(|ch| !ch.is_whitespace())
        .is_none_or(|ch| matches!(ch, ',' | ':' | '}' | ']'))
}

fn close_structure(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    let mut closers: Vec<char> = Vec::new();
    let mut quote: Option<Quote> = None;
    let mut escaped = false;

    for (idx, &ch) in chars.iter().enumerate() {
        if let Some(open) = quote {
            if escaped {
                escaped = false;
                // \' is not a JSON escape
                if ch == '\'' {
                    out.pop();
                }
                out.push(ch);
            } else if ch == '\\' {
                escaped = true;
                out.push(ch);
            } else if open.closes_with(ch) && ends_string(&chars[idx + 1..]) {
                quote = None;
                out.push('"');
            } else {
                match ch {
                    '"' => out.push_str("\\\""),
                    '\n' => out.push_str("\\n"),
                    '\r' => out.push_str("\\r"),
                    '\t' => out.push_str("\\t"),
                    _ => out.push(ch),
                }
            }
            continue;
        }

        if let Some(open) = Quote::opening(ch) {
            quote = Some(open);
            out.push('"');
            continue;
        }

        match ch {
            '{' => {
                closers.push('}');
                out.push(ch);
            }
            '[' => {
                closers.push(']');
                out.push(ch);
            }
            '}' | ']' => {
                drop_trailing_comma(&mut out);
                if closers.last() == Some(&ch) {
                    closers.pop();
                }
                out.push(ch);
                // anything after the outermost value is prose
                if closers.is_empty() {
                    return out;
                }
            }
            _ => out.push(ch),
        }
    }

    if escaped {
        out.pop();
    }
    if quote.is_some() {
        out.push('"');
    }
    while let Some(closer) = closers.pop() {
        drop_trailing_comma(&mut out);
        out.push(closer);
    }
    out
}

fn drop_trailing_comma(out: &mut String) {
    let kept = out.trim_end().len();
    if out[..kept].ends_with(',') {
        out.truncate(kept - 1);
    }
}
