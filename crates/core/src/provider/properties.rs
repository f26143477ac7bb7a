//! Reader and writer for `key=value` properties files.
//!
//! Provider settings are kept in this format so files written by older
//! installations keep working. Supported: `#`/`!` comments, `=`, `:` or
//! whitespace separators, backslash escapes including `\uXXXX`, and lines
//! continued with a trailing backslash.

use std::fmt::Write as _;

/// Parse properties text into key/value pairs in file order. Later
/// duplicates win when collected into a map.
pub fn parse(text: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut lines = text.lines();

    while let Some(line) = lines.next() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }

        let mut logical = String::from(trimmed);
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        let (key, value) = split_key_value(&logical);
        out.push((unescape(key), unescape(value)));
    }
    out
}

// An odd number of trailing backslashes continues the line.
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => return (&line[..i], line[i + 1..].trim_start()),
            c if c.is_whitespace() => {
                let rest = line[i..].trim_start();
                let rest = rest
                    .strip_prefix('=')
                    .or_else(|| rest.strip_prefix(':'))
                    .unwrap_or(rest);
                return (&line[..i], rest.trim_start());
            }
            _ => {}
        }
    }
    (line, "")
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

fn escape(s: &str, is_key: bool, out: &mut String) {
    for (i, c) in s.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{c}' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            c if (c as u32) < 0x20 || (c as u32) > 0x7e => {
                // the file is plain ASCII; everything else is \u escaped
                let mut buf = [0u16; 2];
                for unit in c.encode_utf16(&mut buf) {
                    let _ = write!(out, "\\u{:04X}", unit);
                }
            }
            c => out.push(c),
        }
    }
}

/// Render pairs as properties text with a timestamp comment on top.
pub fn write(pairs: &[(String, String)]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "#{}",
        chrono::Local::now().format("%a %b %d %H:%M:%S %Z %Y")
    );
    for (key, value) in pairs {
        escape(key, true, &mut out);
        out.push('=');
        escape(value, false, &mut out);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pairs(v: &[(&str, &str)]) -> Vec<(String, String)> {
        v.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_separators_and_comments() {
        let text = "# comment\n! other\n\napiKey=abc\nincludeAdult : false\nimageSize w500\nempty=\n";
        assert_eq!(
            parse(text),
            pairs(&[
                ("apiKey", "abc"),
                ("includeAdult", "false"),
                ("imageSize", "w500"),
                ("empty", ""),
            ])
        );
    }

    #[test]
    fn parses_escapes_and_continuations() {
        let text = "key\\ with\\ space=a\\=b\\u00e9\nlong=one \\\n    two\npath=C:\\\\media\n";
        assert_eq!(
            parse(text),
            pairs(&[
                ("key with space", "a=bé"),
                ("long", "one two"),
                ("path", "C:\\media"),
            ])
        );
    }

    #[test]
    fn written_file_parses_back() {
        let original = pairs(&[
            ("apiKey", "x=y:z"),
            ("title", " leading space"),
            ("lang", "Français"),
            ("multi", "a\nb"),
        ]);
        let text = write(&original);
        assert!(text.starts_with('#'));
        assert!(text.is_ascii());
        assert_eq!(parse(&text), original);
    }
}
