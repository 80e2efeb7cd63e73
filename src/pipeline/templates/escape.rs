//! Per-context escaping for user-supplied strings.
//!
//! The config builder already rejects anything outside
//! `[A-Za-z0-9][A-Za-z0-9 ._-]*`, so these functions are a second layer:
//! each render site escapes for its own context instead of trusting the
//! admission policy alone.

/// Escapes a value for inclusion in XML attribute or element content.
pub fn xml_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes a value for inclusion in a C# double-quoted string literal.
pub fn cs_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes a value for inclusion in a PowerShell single-quoted string.
pub fn ps_escape(value: &str) -> String {
    value.replace('\'', "''")
}

/// Escapes a value for inclusion in a YARA double-quoted string.
pub fn yara_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
