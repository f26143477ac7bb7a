//! Fuzzy title matching and sortable titles ("Dark Knight, The").

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// Articles moved to the end of a title for sorting.
pub const DEFAULT_TITLE_PREFIXES: &[&str] = &[
    "A", "An", "The", "Der", "Die", "Das", "Ein", "Eine", "Le", "La", "Les", "L'", "L´", "L`",
    "Un", "Une", "Des", "Du", "D'", "D´", "D`",
];

/// Lowercase, strip diacritics and punctuation, collapse whitespace.
fn normalize(s: &str) -> String {
    let folded: String = s
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    folded.unicode_words().collect::<Vec<_>>().join(" ")
}

/// Similarity of two strings in `[0, 1]` based on shared letter pairs.
pub fn compare_strings(a: &str, b: &str) -> f32 {
    let a = normalize(a);
    let b = normalize(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    strsim::sorensen_dice(&a, &b) as f32
}

/// Score of `title` as a match for `search_term`. Titles stored in sortable
/// form are tried with the article moved back to the front as well.
pub fn calculate_score(search_term: &str, title: &str) -> f32 {
    if search_term.trim().is_empty() || title.trim().is_empty() {
        return 0.0;
    }
    let plain = compare_strings(search_term, title);
    let unsorted = remove_common_sortable_name(title, DEFAULT_TITLE_PREFIXES);
    if unsorted == title {
        return plain;
    }
    plain.max(compare_strings(search_term, &unsorted))
}

fn is_apostrophe(c: char) -> bool {
    matches!(c, '\'' | '´' | '`')
}

fn joins_without_space(prefix: &str) -> bool {
    prefix.chars().last().map_or(false, is_apostrophe)
}

// Case-insensitive `str::strip_prefix`.
fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let mut chars = s.char_indices();
    for p in prefix.chars() {
        let (_, c) = chars.next()?;
        if !c.to_lowercase().eq(p.to_lowercase()) {
            return None;
        }
    }
    Some(chars.as_str())
}

fn is_die_hard(title: &str) -> bool {
    let lower = title.to_lowercase();
    if lower == "die another day" {
        return true;
    }
    match lower.strip_prefix("die hard") {
        Some("") => true,
        Some(rest) => rest.starts_with(':') || rest.starts_with(char::is_whitespace),
        None => false,
    }
}

/// `"The Dark Knight"` becomes `"Dark Knight, The"`.
pub fn sortable_name(title: &str, prefixes: &[impl AsRef<str>]) -> String {
    if title.is_empty() || is_die_hard(title) {
        return title.to_string();
    }
    for prefix in prefixes {
        let prefix = prefix.as_ref();
        let Some(rest) = strip_prefix_ci(title, prefix) else {
            continue;
        };
        let rest = if joins_without_space(prefix) {
            rest.strip_prefix(' ').unwrap_or(rest)
        } else {
            match rest.strip_prefix(' ') {
                Some(r) => r,
                None => continue,
            }
        };
        if !rest.trim().is_empty() {
            return format!("{}, {}", rest, prefix);
        }
    }
    title.to_string()
}

/// Inverse of [`sortable_name`]: `"Bourne Legacy, The"` becomes
/// `"The Bourne Legacy"`.
pub fn remove_common_sortable_name(title: &str, prefixes: &[impl AsRef<str>]) -> String {
    for prefix in prefixes {
        let prefix = prefix.as_ref();
        let suffix = format!(", {}", prefix);
        if title.len() <= suffix.len() {
            continue;
        }
        let cut = title.len() - suffix.len();
        if !title.is_char_boundary(cut) {
            continue;
        }
        if title[cut..].to_lowercase() == suffix.to_lowercase() {
            let base = &title[..cut];
            return if joins_without_space(prefix) {
                format!("{}{}", prefix, base)
            } else {
                format!("{} {}", prefix, base)
            };
        }
    }
    title.to_string()
}
