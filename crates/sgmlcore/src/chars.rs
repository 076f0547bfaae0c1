//! Characters and character sets
//!
//! Internally every character is a [Char], a 32-bit character number in the
//!     document character set.
//! End of entity is not a character: input sources report it as `None`.

/// A character number in the document character set.
pub type Char = u32;

/// The largest character number a document may use.
pub const CHAR_MAX: Char = 0x10FFFF;

/// Translation between the characters a program is written with and the
///     document character set.
///
/// The reference concrete syntax is specified using letters such as `<` and `B`.
/// Before those letters can be compared with document characters they are
///     translated with [CharsetInfo::exec_to_internal].
pub trait CharsetInfo {
    fn exec_to_internal(&self, c: char) -> Char;

    /// Inverse of [CharsetInfo::exec_to_internal], used only when rendering diagnostics.
    fn internal_to_exec(&self, c: Char) -> Option<char>;

    fn exec_str_to_internal(&self, s: &str) -> Vec<Char> {
        s.chars().map(|c| self.exec_to_internal(c)).collect()
    }
}

/// The charset in which document characters are Unicode scalar values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IdentityCharset;

impl CharsetInfo for IdentityCharset {
    fn exec_to_internal(&self, c: char) -> Char {
        c as Char
    }

    fn internal_to_exec(&self, c: Char) -> Option<char> {
        char::from_u32(c)
    }
}

/// Convert a string to characters using the [IdentityCharset].
pub fn to_chars(s: &str) -> Vec<Char> {
    IdentityCharset.exec_str_to_internal(s)
}

/// Render characters using the [IdentityCharset].
///
/// Character numbers that are not Unicode scalar values are rendered as `&#N;`.
pub fn to_string(chars: &[Char]) -> String {
    let mut s = String::with_capacity(chars.len());
    for &c in chars {
        match char::from_u32(c) {
            Some(c) => s.push(c),
            None => s.push_str(&format!["&#{c};"]),
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_through_identity() {
        let s = "<!DOCTYPE é>";
        assert_eq!(to_string(&to_chars(s)), s);
    }

    #[test]
    fn surrogates_are_escaped() {
        assert_eq!(to_string(&[0x61, 0xD800]), "a&#55296;");
    }
}
