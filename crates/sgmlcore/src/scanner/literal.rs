//! Literals
//!
//! [Scanner::collect_literal] reads a literal up to its closing delimiter,
//!     resolving the references in it and normalizing its white space.
//! How white space is treated depends on the kind of literal:
//!
//! - attribute value literals: record starts are dropped; record ends and
//!     separator characters become spaces.
//! - tokenized attribute value literals and minimum literals: runs of spaces,
//!     record ends and separator characters become a single space, record
//!     starts are dropped and leading and trailing spaces are removed.
//! - parameter and system identifier literals are kept as they are.

use super::{RefContext, Reference, Scanner};
use crate::chars::{self, Char};
use crate::error::{
    self, CancelledError, DataDelimiterWarning, Diagnostic, LiteralEntityEndError,
    LiteralLengthError, SimpleStructuralError,
};
use crate::mode::Mode;
use crate::syntax::{DelimGeneral, Quantity, StandardFunction};
use crate::token::TokenKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Normalization {
    AttributeValue,
    SingleSpace,
    Verbatim,
}

impl Normalization {
    fn of(mode: Mode) -> Normalization {
        match mode {
            Mode::Alit | Mode::Alita | Mode::Alite => Normalization::AttributeValue,
            Mode::Talit | Mode::Talita | Mode::Talite | Mode::Mlit | Mode::Mlita => {
                Normalization::SingleSpace
            }
            _ => Normalization::Verbatim,
        }
    }
}

impl Scanner {
    /// Collect a literal whose opening delimiter has just been read, scanning it
    ///     in `mode`.
    ///
    /// Errors in references inside the literal are recorded and the literal
    ///     is still collected.
    /// The literal fails if an entity opened before it ends inside it.
    pub fn collect_literal(&mut self, mode: Mode) -> error::Result<Vec<Char>> {
        let normalization = Normalization::of(mode);
        let space = self
            .syntax
            .standard_function(StandardFunction::Space)
            .unwrap_or(' ' as Char);
        let start_level = self.stack.len();
        let parameter = matches!(mode, Mode::Plit | Mode::Plita | Mode::Plite);
        let mut text: Vec<Char> = vec![];
        self.mode = mode;
        loop {
            if self.poll_cancel() {
                return Err(Diagnostic::boxed(CancelledError, None));
            }
            let token = self.scan(start_level);
            let in_literal_entity = self.stack.len() > start_level;
            match token.kind {
                TokenKind::Lit | TokenKind::Lita if !in_literal_entity => break,
                TokenKind::Ee => {
                    return Err(Diagnostic::boxed(
                        LiteralEntityEndError,
                        Some(self.current_location()),
                    ));
                }
                TokenKind::CroDigit | TokenKind::HcroHexDigit => {
                    let hex = token.kind == TokenKind::HcroHexDigit;
                    if let Err(err) = self.parse_numeric_char_ref(hex) {
                        self.diagnostics.push(*err);
                    }
                }
                TokenKind::CroNameStart => {
                    if let Err(err) = self.parse_named_char_ref() {
                        self.diagnostics.push(*err);
                    }
                }
                TokenKind::EroNameStart | TokenKind::PeroNameStart => {
                    let result = self
                        .parse_entity_reference(token.kind == TokenKind::PeroNameStart)
                        .and_then(|reference| self.reference_entity(&reference, RefContext::Literal));
                    match result {
                        Ok(Reference::Cdata(origin)) | Ok(Reference::Sdata(origin)) => {
                            if let Some(data) = origin.text() {
                                text.extend_from_slice(data);
                            }
                        }
                        Ok(_) => {}
                        Err(err) => self.diagnostics.push(*err),
                    }
                }
                TokenKind::EroGrpo | TokenKind::PeroGrpo => {
                    let error = SimpleStructuralError::new(
                        "a name group entity reference is not allowed in a literal",
                    );
                    let location = Some(self.current_location());
                    self.diagnostics.record(error, location);
                }
                TokenKind::Rs => {
                    if normalization == Normalization::Verbatim {
                        text.extend_from_slice(self.current_token_text());
                    }
                }
                TokenKind::Re | TokenKind::Sepchar | TokenKind::Space => match normalization {
                    Normalization::AttributeValue if token.kind != TokenKind::Space => {
                        text.push(space)
                    }
                    Normalization::SingleSpace => {
                        if text.last().is_some_and(|&c| c != space) {
                            text.push(space);
                        }
                    }
                    _ => text.extend_from_slice(self.current_token_text()),
                },
                TokenKind::CharDelim => {
                    let data = self.current_token_text().to_vec();
                    // Parameter literals warn only for PERO.
                    let warn = !parameter
                        || data.starts_with(self.syntax.delim(DelimGeneral::Pero));
                    if warn {
                        let location = Some(self.current_location());
                        self.diagnostics.record(
                            DataDelimiterWarning {
                                text: chars::to_string(&data),
                            },
                            location,
                        );
                    }
                    text.extend_from_slice(&data);
                }
                TokenKind::Unrecognized => self.report_unrecognized(),
                _ => text.extend_from_slice(self.current_token_text()),
            }
        }
        if normalization == Normalization::SingleSpace && text.last() == Some(&space) {
            text.pop();
        }
        let limit = self.syntax.quantity(Quantity::Litlen);
        if text.len() > limit as usize {
            let location = Some(self.current_location());
            self.diagnostics.record(
                LiteralLengthError {
                    limit,
                    length: text.len(),
                },
                location,
            );
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chars::IdentityCharset;
    use crate::entity::{DeclType, Entity, EntityTable};
    use crate::mode::ModeBucket;
    use crate::options::ScannerOptions;
    use crate::syntax::{Features, Syntax};
    use std::rc::Rc;

    fn scanner_with(syntax: Syntax, text: &str) -> Scanner {
        let mut table = EntityTable::new();
        table.declare(Entity::internal_text("e", DeclType::GeneralEntity, "in\rside"));
        table.declare(Entity::internal_text("p", DeclType::ParameterEntity, "param"));
        table.declare(Entity::internal_text("open", DeclType::GeneralEntity, "x\""));
        table.declare(Entity::internal_cdata("c", "&raw;"));
        let mut scanner = Scanner::new(syntax, Features::default(), ScannerOptions::default())
            .with_entity_manager(Rc::new(table));
        scanner.compile_modes(ModeBucket::Prolog, None);
        scanner.push_document("doc", text);
        scanner
    }

    fn scanner(text: &str) -> Scanner {
        scanner_with(Syntax::reference(&IdentityCharset), text)
    }

    fn collect(text: &str, mode: Mode) -> (String, Vec<String>) {
        let mut scanner = scanner(text);
        let literal = scanner.collect_literal(mode).unwrap();
        (chars::to_string(&literal), scanner.diagnostics().titles())
    }

    macro_rules! literal_tests {
        ( $( ($name: ident, $mode: expr, $input: expr, $want: expr), )+ ) => {
            $(
                #[test]
                fn $name() {
                    let (got, diagnostics) = collect($input, $mode);
                    assert_eq!(got, $want);
                    assert_eq!(diagnostics, Vec::<String>::new());
                }
            )+
        };
    }

    literal_tests![
        (attribute_value_plain, Mode::Alit, "a b\" rest", "a b"),
        (attribute_value_record_boundaries, Mode::Alit, "a\r\nb\tc\"", "a b c"),
        (attribute_value_char_ref, Mode::Alit, "x&#65;y\"", "xAy"),
        (attribute_value_char_ref_keeps_re, Mode::Alit, "&#13;\"", "\r"),
        (attribute_value_named_re_is_a_space, Mode::Alit, "a&#RE;b\"", "a b"),
        (attribute_value_entity, Mode::Alit, "<&e;>\"", "<in side>"),
        (attribute_value_cdata_entity, Mode::Alit, "&c;\"", "&raw;"),
        (alternative_delimiter, Mode::Alita, "a\"b'", "a\"b"),
        (tokenized_squeezes, Mode::Talit, "  a \r\n  b  \"", "a b"),
        (minimum_literal, Mode::Mlit, " -//A//DTD  x//EN \"", "-//A//DTD x//EN"),
        (parameter_literal_entity, Mode::Plit, "a %p; b\"", "a param b"),
        (parameter_literal_keeps_white_space, Mode::Plit, "a\tb  c\"", "a\tb  c"),
        (system_literal, Mode::Slit, "file &e;\"", "file &e;"),
        (empty_literal, Mode::Talit, "\"", ""),
    ];

    #[test]
    fn entity_end_outside_literal() {
        let mut scanner = scanner("abc");
        let err = scanner.collect_literal(Mode::Alit).unwrap_err();
        assert_eq!(err.title(), "an entity ended inside a literal it did not start");
    }

    #[test]
    fn delimiter_inside_entity_does_not_close() {
        let (got, _) = collect("&open;y\"", Mode::Alit);
        assert_eq!(got, "x\"y");
    }

    #[test]
    fn undefined_entity_is_recorded() {
        let (got, diagnostics) = collect("a&nope;b\"", Mode::Alit);
        assert_eq!(got, "ab");
        assert_eq!(diagnostics, vec!["general entity nope is not defined"]);
    }

    #[test]
    fn literal_length() {
        let mut syntax = Syntax::reference(&IdentityCharset);
        syntax.set_quantity(Quantity::Litlen, 3);
        let mut scanner = scanner_with(syntax, "abcd\"");
        assert_eq!(chars::to_string(&scanner.collect_literal(Mode::Alit).unwrap()), "abcd");
        assert_eq!(
            scanner.diagnostics().titles(),
            vec!["length of literal cannot exceed LITLEN (3)"]
        );
    }
}
