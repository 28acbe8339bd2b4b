//! RFC 1459 casemapping.
//!
//! Nicks and channel names are keyed by their folded form: ASCII letters fold
//! to lowercase and the four punctuation pairs `[]\~` fold to `{}|^`. Two
//! names that fold to the same key are the same name.

/// Fold one character.
#[inline]
pub const fn fold_char(c: char) -> char {
    match c {
        '[' => '{',
        ']' => '}',
        '\\' => '|',
        '~' => '^',
        _ => c.to_ascii_lowercase(),
    }
}

/// Folded key for a nick or channel name.
pub fn irc_to_lower(s: &str) -> String {
    s.chars().map(fold_char).collect()
}

/// Whether `a` and `b` name the same nick or channel.
pub fn irc_eq(a: &str, b: &str) -> bool {
    a.chars().map(fold_char).eq(b.chars().map(fold_char))
}
