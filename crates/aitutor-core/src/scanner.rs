//! Quote-aware scanning over JSON-like text without a parser.
//!
//! Upstream and inbound payloads have a narrow, fixed shape, so the tutor only ever needs one
//! string field out of them. [`extract_field`] finds it, [`decode`] undoes JSON string escapes and
//! [`escape`] applies them. `decode(&escape(s)) == s` holds for every `s`.

use crate::error::{MalformedReason, ScanError};

fn is_json_ws(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

fn trim_json_ws(s: &str) -> &str {
    s.trim_start_matches(is_json_ws)
}

/// Reads the string value of the first `"field_name"` in `blob`, decoded.
///
/// Only the first occurrence of the quoted name is considered. Between the name and the opening
/// quote of the value only whitespace and a single `:` are allowed.
pub fn extract_field(blob: &str, field_name: &str) -> Result<String, ScanError> {
    let needle = format!("\"{}\"", field_name);
    let start = blob.find(&needle).ok_or(ScanError::NotFound)?;
    let after_name = trim_json_ws(&blob[start + needle.len()..]);

    let after_colon = match after_name.chars().next() {
        Some(':') => trim_json_ws(&after_name[1..]),
        _ => return Err(ScanError::Malformed(MalformedReason::MissingSeparator)),
    };

    let value = match after_colon.chars().next() {
        Some('"') => &after_colon[1..],
        Some(c) => return Err(ScanError::Malformed(MalformedReason::UnexpectedChar(c))),
        None => return Err(ScanError::Malformed(MalformedReason::MissingOpeningQuote)),
    };

    let mut escaped = false;
    for (i, c) in value.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return Ok(decode(&value[..i]));
        }
    }
    Err(ScanError::Malformed(MalformedReason::Incomplete))
}

/// Decodes JSON string escapes in `raw` (the text between the quotes).
///
/// `\uXXXX` is decoded, including surrogate pairs. Unknown escapes and broken `\u` sequences keep
/// the escaped text without the backslash.
pub fn decode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let escape = &rest[pos + 1..];
        let mut chars = escape.chars();
        rest = match chars.next() {
            Some('n') => push_and_skip(&mut out, '\n', escape),
            Some('r') => push_and_skip(&mut out, '\r', escape),
            Some('t') => push_and_skip(&mut out, '\t', escape),
            Some('b') => push_and_skip(&mut out, '\u{8}', escape),
            Some('f') => push_and_skip(&mut out, '\u{c}', escape),
            Some('u') => decode_unicode(&mut out, &escape[1..]),
            Some(other) => push_and_skip(&mut out, other, escape),
            None => {
                out.push('\\');
                ""
            }
        };
    }
    out.push_str(rest);
    out
}

fn push_and_skip<'a>(out: &mut String, c: char, escape: &'a str) -> &'a str {
    out.push(c);
    let skip = escape.chars().next().map(char::len_utf8).unwrap_or(0);
    &escape[skip..]
}

fn hex4(s: &str) -> Option<u16> {
    let digits = s.get(..4)?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(digits, 16).ok()
}

/// `s` starts right after `\u`. Returns the unconsumed remainder.
fn decode_unicode<'a>(out: &mut String, s: &'a str) -> &'a str {
    let Some(unit) = hex4(s) else {
        out.push('u');
        return s;
    };

    if (0xD800..0xDC00).contains(&unit) {
        let low = s[4..].strip_prefix("\\u").and_then(hex4);
        if let Some(low) = low.filter(|l| (0xDC00..0xE000).contains(l)) {
            let code = 0x10000 + ((u32::from(unit) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
            if let Some(c) = char::from_u32(code) {
                out.push(c);
                return &s[10..];
            }
        }
    }

    match char::from_u32(u32::from(unit)) {
        Some(c) => out.push(c),
        None => {
            // lone surrogate
            out.push('u');
            out.push_str(&s[..4]);
        }
    }
    &s[4..]
}

/// Escapes `text` for embedding inside a JSON string literal.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Text following each `"key"` + `:` in `blob`, with whitespace around the colon skipped.
fn values_of<'a>(blob: &'a str, key: &str) -> Vec<&'a str> {
    let needle = format!("\"{}\"", key);
    blob.match_indices(needle.as_str())
        .filter_map(|(i, _)| {
            let rest = trim_json_ws(&blob[i + needle.len()..]);
            rest.strip_prefix(':').map(trim_json_ws)
        })
        .collect()
}

/// True when `"key":"value"` appears anywhere in `blob`, compact or spaced.
pub fn has_string_value(blob: &str, key: &str, value: &str) -> bool {
    let quoted = format!("\"{}\"", value);
    values_of(blob, key)
        .into_iter()
        .any(|v| v.starts_with(quoted.as_str()))
}

/// True when `"key":[]` appears anywhere in `blob`, compact or spaced.
pub fn has_empty_array(blob: &str, key: &str) -> bool {
    values_of(blob, key).into_iter().any(|v| {
        v.strip_prefix('[')
            .map(|inner| trim_json_ws(inner).starts_with(']'))
            .unwrap_or(false)
    })
}
