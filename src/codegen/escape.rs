//! Python string literal escaping and unicode-escape decoding
//!
//! The generated modules must be pure ASCII no matter which script the
//! names are written in, so every non-ASCII code point is spelled out as a
//! `\u`/`\U` escape. Names that arrive with escape sequences still in
//! literal form (`\u00e9` as six characters) are decoded first.

use std::borrow::Cow;

/// Render `value` as a Python string literal after decoding any literal
/// `\u`/`\U` escapes it contains.
pub fn python_literal(value: &str) -> String {
    escape_literal(&decode_unicode_escapes(value))
}

/// Render `value` as a pure-ASCII Python string literal.
///
/// All-ASCII strings follow `repr()`: single quotes unless the text contains
/// a `'` and no `"`, in which case double quotes are used and nothing needs
/// quoting. Strings with any non-ASCII character always use single quotes.
/// Backslash, the active quote, `\n`, `\r` and `\t` get short escapes; other
/// non-printable ASCII becomes `\xNN`; code points above ASCII become `\uNNNN`
/// or `\UNNNNNNNN`.
pub fn escape_literal(value: &str) -> String {
    let quote = if value.is_ascii() && value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for ch in value.chars() {
        let code = ch as u32;
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(ch),
            _ if code < 0x80 => out.push_str(&format!("\\x{code:02x}")),
            _ if code <= 0xFFFF => out.push_str(&format!("\\u{code:04x}")),
            _ => out.push_str(&format!("\\U{code:08x}")),
        }
    }
    out.push(quote);
    out
}

/// Decode literal `\uXXXX` / `\UXXXXXXXX` sequences left in `value`.
///
/// Only strings that contain `\u` or `\U` are considered. The whole string is
/// decoded with Python `unicode_escape` rules, so other escapes such as `\n`
/// are decoded along with them. The input is returned unchanged when it holds
/// characters above U+00FF, when any escape is malformed, or when decoding
/// would not change it.
pub fn decode_unicode_escapes(value: &str) -> Cow<'_, str> {
    if !(value.contains("\\u") || value.contains("\\U")) {
        return Cow::Borrowed(value);
    }
    if value.chars().any(|c| c as u32 > 0xFF) {
        return Cow::Borrowed(value);
    }
    match unescape(value) {
        Some(decoded) if decoded != value => Cow::Owned(decoded),
        _ => Cow::Borrowed(value),
    }
}

/// Apply Python `unicode_escape` decoding to `value`.
///
/// Returns `None` for a trailing backslash, truncated or out-of-range
/// numeric escapes, unpaired surrogates and `\N{...}` names.
pub(crate) fn unescape(value: &str) -> Option<String> {
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len());
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        i += 1;
        if ch != '\\' {
            out.push(ch);
            continue;
        }

        let escape = *chars.get(i)?;
        i += 1;
        match escape {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut code = escape.to_digit(8)?;
                for _ in 0..2 {
                    match chars.get(i).and_then(|c| c.to_digit(8)) {
                        Some(digit) => {
                            code = code * 8 + digit;
                            i += 1;
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(code)?);
            }
            'x' => {
                let code = take_hex(&chars, &mut i, 2)?;
                out.push(char::from_u32(code)?);
            }
            'u' => {
                let code = take_hex(&chars, &mut i, 4)?;
                out.push(decode_utf16_unit(code, &chars, &mut i)?);
            }
            'U' => {
                let code = take_hex(&chars, &mut i, 8)?;
                out.push(char::from_u32(code)?);
            }
            'N' => return None,
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    Some(out)
}

/// Read exactly `len` hex digits starting at `*pos`.
fn take_hex(chars: &[char], pos: &mut usize, len: usize) -> Option<u32> {
    let digits = chars.get(*pos..*pos + len)?;
    let mut code = 0u32;
    for digit in digits {
        code = code * 16 + digit.to_digit(16)?;
    }
    *pos += len;
    Some(code)
}

/// Turn a `\u` code unit into a char, pairing a high surrogate with an
/// immediately following `\u` low surrogate.
fn decode_utf16_unit(code: u32, chars: &[char], pos: &mut usize) -> Option<char> {
    match code {
        0xD800..=0xDBFF => {
            if chars.get(*pos) != Some(&'\\') || chars.get(*pos + 1) != Some(&'u') {
                return None;
            }
            let mut next = *pos + 2;
            let low = take_hex(chars, &mut next, 4)?;
            if !(0xDC00..=0xDFFF).contains(&low) {
                return None;
            }
            *pos = next;
            char::from_u32(0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00))
        }
        0xDC00..=0xDFFF => None,
        _ => char::from_u32(code),
    }
}
