//! Input sources
//!
//! An [InputSource] supplies the characters of one open entity.
//! It has a cursor and the start of the current token; recognizers extend the
//!     token one character at a time with [InputSource::token_char] and then
//!     fix its length with [InputSource::end_token].
//!
//! Character references inside literals are replaced in place: the reference
//!     characters are spliced out of the buffer and the referenced character
//!     put in their position.
//! The original text is shared and never modified; the first substitution
//!     copies it into a private buffer, which is discarded on rewind.

use crate::chars::Char;
use crate::origin::{Location, Origin};
use std::rc::Rc;

#[derive(Clone, Debug)]
enum Buffer {
    Borrowed(Rc<[Char]>),
    OwnedSubstituted { original: Rc<[Char]>, chars: Vec<Char> },
}

impl Buffer {
    fn chars(&self) -> &[Char] {
        match self {
            Buffer::Borrowed(chars) => chars,
            Buffer::OwnedSubstituted { chars, .. } => chars,
        }
    }

    fn original(&self) -> &Rc<[Char]> {
        match self {
            Buffer::Borrowed(original) => original,
            Buffer::OwnedSubstituted { original, .. } => original,
        }
    }
}

/// How a substituted character is to be scanned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubstitutionKind {
    /// The character acts as a function character: it is recognized like any
    ///     other character of the buffer.
    Function,
    /// The character is data regardless of what the recognizer would make of it.
    Data,
}

#[derive(Clone, Debug)]
struct Substitution {
    // Index in the current buffer.
    at: usize,
    // Number of buffer characters the substitution replaced.
    replaced: usize,
    kind: SubstitutionKind,
    origin: Rc<Origin>,
}

/// The characters of one open entity.
#[derive(Clone, Debug)]
pub struct InputSource {
    origin: Rc<Origin>,
    buffer: Buffer,
    cursor: usize,
    token_start: usize,
    rewindable: bool,
    substitutions: Vec<Substitution>,
}

impl InputSource {
    pub fn new(origin: Rc<Origin>, text: Rc<[Char]>) -> InputSource {
        InputSource {
            origin,
            buffer: Buffer::Borrowed(text),
            cursor: 0,
            token_start: 0,
            rewindable: true,
            substitutions: vec![],
        }
    }

    /// Mark the source as one that cannot be read a second time.
    pub fn non_rewindable(mut self) -> InputSource {
        self.rewindable = false;
        self
    }

    pub fn origin(&self) -> &Rc<Origin> {
        &self.origin
    }

    /// The current content of the buffer, with substitutions applied.
    pub fn chars(&self) -> &[Char] {
        self.buffer.chars()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_at_end(&self) -> bool {
        self.cursor >= self.chars().len()
    }

    /// Start a new token at the cursor.
    pub fn start_token(&mut self) {
        self.token_start = self.cursor;
    }

    /// Add the next character to the token, or return `None` at the end of the entity.
    pub fn token_char(&mut self) -> Option<Char> {
        let c = self.chars().get(self.cursor).copied()?;
        self.cursor += 1;
        Some(c)
    }

    /// Set the length of the current token.
    ///
    /// Characters read past the token by [InputSource::token_char] are put back.
    pub fn end_token(&mut self, length: usize) {
        self.cursor = (self.token_start + length).min(self.chars().len());
    }

    /// Start a new token consisting of the next character.
    pub fn get_char(&mut self) -> Option<Char> {
        self.start_token();
        self.token_char()
    }

    /// Move the cursor back to the start of the current token.
    pub fn unget_token(&mut self) {
        self.cursor = self.token_start;
    }

    /// Move the cursor to `index`, which must not be after the end of the buffer.
    ///
    /// The current token becomes empty.
    pub fn set_cursor(&mut self, index: usize) {
        self.cursor = index.min(self.chars().len());
        self.token_start = self.cursor;
    }

    /// Make the current token start at `index` without moving the cursor.
    pub fn restart_token(&mut self, index: usize) {
        self.token_start = index.min(self.cursor);
    }

    pub fn token_start(&self) -> usize {
        self.token_start
    }

    pub fn token_length(&self) -> usize {
        self.cursor - self.token_start
    }

    pub fn token_text(&self) -> &[Char] {
        &self.chars()[self.token_start..self.cursor]
    }

    /// The character before the cursor.
    pub fn current_char(&self) -> Option<Char> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.chars().get(i).copied())
    }

    /// The character at the cursor, without consuming it.
    pub fn peek_char(&self) -> Option<Char> {
        self.chars().get(self.cursor).copied()
    }

    /// Extend the current token over characters satisfying `pred`.
    pub fn extend_token_while<F: Fn(Char) -> bool>(&mut self, pred: F) -> usize {
        let start = self.cursor;
        while let Some(c) = self.peek_char() {
            if !pred(c) {
                break;
            }
            self.cursor += 1;
        }
        self.cursor - start
    }

    /// Replace the buffer characters from `start` up to the cursor with `c`.
    ///
    /// Afterwards the cursor is at `start`, so `c` is the next character read.
    pub fn substitute(&mut self, start: usize, c: Char, kind: SubstitutionKind, origin: Rc<Origin>) {
        let start = start.min(self.cursor);
        let replaced = self.cursor - start;
        let shift = replaced as isize - 1;
        if let Buffer::Borrowed(original) = &self.buffer {
            let original = Rc::clone(original);
            let chars = original.to_vec();
            self.buffer = Buffer::OwnedSubstituted { original, chars };
        }
        if let Buffer::OwnedSubstituted { chars, .. } = &mut self.buffer {
            chars.splice(start..self.cursor, std::iter::once(c));
        }
        // Substituted characters swallowed by this reference lose their own entries.
        self.substitutions
            .retain(|s| s.at < start || s.at >= start + replaced);
        for s in self.substitutions.iter_mut() {
            if s.at >= start + replaced {
                s.at = (s.at as isize - shift) as usize;
            }
        }
        let i = self.substitutions.partition_point(|s| s.at < start);
        self.substitutions.insert(
            i,
            Substitution {
                at: start,
                replaced,
                kind,
                origin,
            },
        );
        self.cursor = start;
        self.token_start = start;
    }

    /// Whether the character at the cursor was substituted as data.
    pub fn at_data_substitution(&self) -> bool {
        self.substitution_at(self.cursor)
            .map(|s| s.kind == SubstitutionKind::Data)
            .unwrap_or(false)
    }

    /// Whether the character at the cursor was substituted for a reference.
    pub fn at_substitution(&self) -> bool {
        self.substitution_at(self.cursor).is_some()
    }

    fn substitution_at(&self, index: usize) -> Option<&Substitution> {
        self.substitutions
            .binary_search_by_key(&index, |s| s.at)
            .ok()
            .map(|i| &self.substitutions[i])
    }

    pub fn is_substituted(&self) -> bool {
        matches!(self.buffer, Buffer::OwnedSubstituted { .. })
    }

    /// Offset in the original text of a buffer index.
    pub fn original_offset(&self, index: usize) -> usize {
        let mut offset = index;
        for s in &self.substitutions {
            if s.at >= index {
                break;
            }
            offset = offset + s.replaced - 1;
        }
        offset
    }

    /// Buffer index of an offset in the original text.
    ///
    /// Offsets inside a substituted reference map to the substituted character.
    pub fn buffer_index(&self, original: usize) -> usize {
        let mut index = original;
        for s in &self.substitutions {
            let start = self.original_offset(s.at);
            if start >= original {
                break;
            }
            if original < start + s.replaced {
                return s.at;
            }
            index = index + 1 - s.replaced;
        }
        index
    }

    /// The location of a buffer index.
    pub fn location(&self, index: usize) -> Location {
        match self.substitution_at(index) {
            Some(s) => Location::new(Rc::clone(&s.origin), 0),
            None => Location::new(Rc::clone(&self.origin), self.original_offset(index)),
        }
    }

    /// The location of the start of the current token.
    pub fn token_location(&self) -> Location {
        self.location(self.token_start)
    }

    pub fn is_rewindable(&self) -> bool {
        self.rewindable
    }

    /// Go back to the start of the original text, discarding substitutions.
    ///
    /// Returns false, changing nothing, if the source cannot be rewound.
    pub fn rewind(&mut self) -> bool {
        if !self.rewindable {
            return false;
        }
        self.buffer = Buffer::Borrowed(Rc::clone(self.buffer.original()));
        self.substitutions.clear();
        self.cursor = 0;
        self.token_start = 0;
        true
    }

    /// Give up the ability to rewind, releasing nothing but the flag.
    pub fn will_not_rewind(&mut self) {
        self.rewindable = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chars::{to_chars, to_string};
    use crate::origin::CharRefOrigin;

    fn source(text: &str) -> InputSource {
        let text: Rc<[Char]> = to_chars(text).into();
        InputSource::new(Origin::document("doc", text.clone()), text)
    }

    fn char_ref_origin(source: &InputSource, start: usize, c: Char) -> Rc<Origin> {
        Rc::new(Origin::NumericCharRef(CharRefOrigin {
            parent: source.location(start),
            ref_length: source.cursor() - start,
            character: c,
            markup: None,
        }))
    }

    #[test]
    fn tokens() {
        let mut s = source("abc");
        s.start_token();
        assert_eq!(s.token_char(), Some('a' as Char));
        assert_eq!(s.token_char(), Some('b' as Char));
        s.end_token(1);
        assert_eq!(to_string(s.token_text()), "a");
        assert_eq!(s.get_char(), Some('b' as Char));
        s.unget_token();
        assert_eq!(s.cursor(), 1);
        s.end_token(10);
        assert_eq!(s.cursor(), 3);
        assert_eq!(s.token_char(), None);
    }

    #[test]
    fn substitution_keeps_original_offsets() {
        let mut s = source("x&#65;y");
        s.set_cursor(6);
        let origin = char_ref_origin(&s, 1, 'A' as Char);
        s.substitute(1, 'A' as Char, SubstitutionKind::Data, origin.clone());
        assert_eq!(to_string(s.chars()), "xAy");
        assert_eq!(s.cursor(), 1);
        assert!(s.at_data_substitution());
        assert_eq!(s.location(1), Location::new(origin, 0));
        assert_eq!(s.location(2).index(), 6);
        assert_eq!(s.original_offset(3), 7);
        assert_eq!(s.buffer_index(6), 2);
        assert_eq!(s.buffer_index(3), 1);
        assert_eq!(s.buffer_index(0), 0);
    }

    #[test]
    fn rewind_discards_substitutions() {
        let mut s = source("&#65;");
        s.set_cursor(5);
        let origin = char_ref_origin(&s, 0, 'A' as Char);
        s.substitute(0, 'A' as Char, SubstitutionKind::Data, origin);
        assert!(s.is_substituted());
        assert!(s.rewind());
        assert!(!s.is_substituted());
        assert_eq!(to_string(s.chars()), "&#65;");
        assert!(!s.at_data_substitution());
    }

    #[test]
    fn non_rewindable() {
        let mut s = source("abc").non_rewindable();
        s.set_cursor(2);
        assert!(!s.rewind());
        assert_eq!(s.cursor(), 2);
    }
}
