//! Constant-name derivation for the external source emitter.
//!
//! The emitter embeds each blob as a constant byte array; the array's
//! name must be a stable, valid identifier of the emission target
//! (C-family source), derived only from the document's file name.

/// Reserved words of the emission target. A derived identifier that
/// collides gets an underscore suffix.
const RESERVED: &[&str] = &[
    "auto",
    "break",
    "case",
    "char",
    "const",
    "continue",
    "default",
    "do",
    "double",
    "else",
    "enum",
    "extern",
    "float",
    "for",
    "goto",
    "if",
    "inline",
    "int",
    "long",
    "register",
    "restrict",
    "return",
    "short",
    "signed",
    "sizeof",
    "static",
    "struct",
    "switch",
    "typedef",
    "union",
    "unsigned",
    "void",
    "volatile",
    "while",
    "_alignas",
    "_alignof",
    "_atomic",
    "_bool",
    "_complex",
    "_generic",
    "_imaginary",
    "_noreturn",
    "_static_assert",
    "_thread_local",
    "import",
    "export",
];

/// Derive the constant identifier for a document file stem.
///
/// Lowercases, maps every character outside `[a-z0-9_]` to `_`, forces a
/// valid identifier start, and suffixes `_` on a reserved-word collision.
/// An empty stem becomes `_`. Deterministic and pure.
pub fn const_ident(stem: &str) -> String {
    let lower = stem.to_lowercase();
    let mut ident = String::with_capacity(lower.len());
    for (i, ch) in lower.chars().enumerate() {
        let valid = if i == 0 {
            ch.is_ascii_alphabetic() || ch == '_'
        } else {
            ch.is_ascii_alphanumeric() || ch == '_'
        };
        ident.push(if valid { ch } else { '_' });
    }

    if ident.is_empty() {
        ident.push('_');
    }
    if RESERVED.contains(&ident.as_str()) {
        ident.push('_');
    }
    ident
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_replaces_punctuation() {
        assert_eq!(const_ident("Arrow-Left.Big"), "arrow_left_big");
    }

    #[test]
    fn digit_start_is_mangled() {
        assert_eq!(const_ident("24px-icon"), "_4px_icon");
    }

    #[test]
    fn reserved_words_get_a_suffix() {
        assert_eq!(const_ident("switch"), "switch_");
        assert_eq!(const_ident("Continue"), "continue_");
    }

    #[test]
    fn empty_stem_becomes_underscore() {
        assert_eq!(const_ident(""), "_");
    }

    #[test]
    fn non_ascii_maps_to_underscores() {
        assert_eq!(const_ident("école"), "_cole");
    }

    #[test]
    fn already_valid_names_pass_through() {
        assert_eq!(const_ident("chevron_down2"), "chevron_down2");
    }
}
