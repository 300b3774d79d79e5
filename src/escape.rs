//! Mapping between canonical segments and programmatic accessor names.
//!
//! Canonical segment text is what appears in a [`Path`](crate::Path) and in
//! every external key. Accessor names are what code writes to reach a
//! child (`node.api`, `lexicon::root::type_`). The two diverge when the
//! segment is not a usable identifier:
//!
//! | canonical | accessor | rule |
//! |-----------|----------|------|
//! | `type`    | `type_`  | keyword gets a trailing `_` |
//! | `2fa`     | `_2fa`   | leading digit gets a leading `_` |
//! | `_`       | `__`     | a lone underscore is doubled |
//! | `SSL`     | `SSL`    | case is preserved |
//! | `a-b`     | (none)   | no accessor; reachable by segment only |
//!
//! [`segment_for`] is the inverse of [`accessor_for`] and additionally
//! accepts raw identifiers (`r#type`).

/// Rust strict and reserved keywords (2024 edition).
const KEYWORDS: &[&str] = &[
    "Self", "abstract", "as", "async", "await", "become", "box", "break", "const", "continue",
    "crate", "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if",
    "impl", "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv",
    "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

pub fn is_keyword(s: &str) -> bool {
    KEYWORDS.contains(&s)
}

fn is_ident_text(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Accessor name for a canonical segment, or `None` if the segment cannot
/// be spelled as an identifier.
pub fn accessor_for(segment: &str) -> Option<String> {
    if !is_ident_text(segment) {
        return None;
    }
    if segment == "_" {
        return Some("__".to_string());
    }
    if is_keyword(segment) {
        return Some(format!("{segment}_"));
    }
    if segment.starts_with(|c: char| c.is_ascii_digit()) {
        return Some(format!("_{segment}"));
    }
    Some(segment.to_string())
}

/// Canonical segment for an accessor name.
pub fn segment_for(accessor: &str) -> String {
    let accessor = accessor.strip_prefix("r#").unwrap_or(accessor);
    if accessor == "__" {
        return "_".to_string();
    }
    if let Some(rest) = accessor.strip_prefix('_')
        && rest.starts_with(|c: char| c.is_ascii_digit())
    {
        return rest.to_string();
    }
    if let Some(rest) = accessor.strip_suffix('_')
        && is_keyword(rest)
    {
        return rest.to_string();
    }
    accessor.to_string()
}
