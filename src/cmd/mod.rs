//! Shell command builders
//!
//! All shell-string construction for the external tools lives here, one
//! submodule per tool, so the rest of the harness never concatenates
//! command fragments or worries about escaping.

pub mod docker;
pub mod rally;

/// Escape `s` for interpolation inside a double-quoted shell string.
pub(crate) fn escape_double_quoted(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' | '"' | '$' | '`' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Write `contents` to `path` via a single-quoted `echo` redirect.
pub(crate) fn write_file(path: &str, contents: &str) -> String {
    format!("echo '{contents}' > {path}")
}
