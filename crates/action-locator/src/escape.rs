//! Quoting helpers for CSS and XPath selector text

/// True when `value` can appear after `#` or `.` without escaping.
pub fn is_plain_ident(value: &str) -> bool {
    let mut chars = value.chars();
    let first = match chars.next() {
        Some('-') => match chars.next() {
            Some(c) => c,
            None => return false,
        },
        Some(c) => c,
        None => return false,
    };
    (first == '_' || first.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c == '-' || c.is_ascii_alphanumeric())
}

/// CSS identifier escaping following the CSSOM `CSS.escape` algorithm.
pub fn css_escape_ident(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len());
    for (i, &c) in chars.iter().enumerate() {
        let code = c as u32;
        if c == '\0' {
            out.push('\u{FFFD}');
        } else if (0x01..=0x1f).contains(&code)
            || code == 0x7f
            || (i == 0 && c.is_ascii_digit())
            || (i == 1 && c.is_ascii_digit() && chars[0] == '-')
        {
            out.push_str(&format!("\\{:x} ", code));
        } else if i == 0 && c == '-' && chars.len() == 1 {
            out.push_str("\\-");
        } else if code >= 0x80 || c == '-' || c == '_' || c.is_ascii_alphanumeric() {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}

/// Double-quoted CSS string literal.
pub fn css_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\a "),
            '\r' => out.push_str("\\d "),
            '\0' => out.push('\u{FFFD}'),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// XPath 1.0 string literal; XPath has no escapes, so values containing both
/// quote kinds are assembled with `concat()`.
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('"') {
        return format!("\"{}\"", value);
    }
    if !value.contains('\'') {
        return format!("'{}'", value);
    }
    let parts: Vec<String> = value
        .split('"')
        .map(|part| format!("\"{}\"", part))
        .collect();
    format!("concat({})", parts.join(", '\"', "))
}
