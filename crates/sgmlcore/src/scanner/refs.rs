//! Character and entity references
//!
//! The client calls these after getting one of the reference tokens:
//!
//! | token | operation |
//! |---|---|
//! | `CroDigit` | [Scanner::parse_numeric_char_ref] |
//! | `HcroHexDigit` | [Scanner::parse_numeric_char_ref] with `hex` |
//! | `CroNameStart` | [Scanner::parse_named_char_ref] |
//! | `EroNameStart`, `PeroNameStart` | [Scanner::parse_entity_reference] then [Scanner::reference_entity] |
//!
//! A character reference is replaced in the input by the character it refers
//!     to, which is then the next character scanned.
//! A numeric reference always produces data.
//! A named reference produces the function character itself, so `&#RE;`
//!     ends a record like a real record end would.

use super::Scanner;
use crate::chars::{self, Char, CHAR_MAX};
use crate::entity::{DeclType, Entity, EntityKind, InternalKind};
use crate::error::{
    self, CharacterNumberError, Diagnostic, EntityKindError, EntityNotOpenedError,
    FunctionNameError, NameLengthError, RecursiveEntityError, RefcOmittedWarning,
    SimpleStructuralError, UndefinedEntityError,
};
use crate::input::{InputSource, SubstitutionKind};
use crate::mode::Mode;
use crate::origin::{
    CharRefOrigin, EntityOrigin, Location, Markup, NamedCharRefOrigin, Origin, RefEndType,
};
use crate::scanner::Entry;
use crate::syntax::{DelimGeneral, Quantity};
use crate::token::TokenKind;
use sgml_stdext::algorithms::spellcheck;
use std::rc::Rc;

/// Where an entity reference occurs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefContext {
    /// Content of an element.
    Content,
    /// Replaceable character data: RCDATA content or an RCDATA marked section.
    Rcdata,
    /// An attribute value or parameter literal.
    Literal,
    /// A markup declaration outside a declaration subset.
    Declaration,
    /// A declaration subset between declarations.
    DeclarationSubset,
}

impl RefContext {
    pub fn description(self) -> &'static str {
        match self {
            RefContext::Content => "content",
            RefContext::Rcdata => "replaceable character data",
            RefContext::Literal => "a literal",
            RefContext::Declaration => "a markup declaration",
            RefContext::DeclarationSubset => "a declaration subset",
        }
    }
}

/// A parsed entity reference whose entity is declared.
#[derive(Clone, Debug)]
pub struct EntityReference {
    pub entity: Rc<Entity>,
    /// The start of the reference.
    pub location: Location,
    /// Length of the reference in the original text, including its end.
    pub length: usize,
    pub end: RefEndType,
    pub markup: Option<Markup>,
    // Buffer index of the start of the reference in the top input source.
    start: usize,
}

/// What referencing an entity did.
#[derive(Debug)]
pub enum Reference {
    /// The entity's text was pushed on the input stack.
    Pushed,
    /// The reference was replaced in the input by the entity's single character.
    Substituted,
    /// Character data for the client to treat as data.
    Cdata(Rc<Origin>),
    /// Specific character data for the client to treat as data.
    Sdata(Rc<Origin>),
    ExternalData(Rc<Origin>),
    Subdoc(Rc<Origin>),
    /// A processing instruction; the origin's text is the system data.
    Pi(Rc<Origin>),
    /// The entity is ignored.
    Nothing,
}

impl Scanner {
    /// Parse the end of a reference whose name or number has just been read.
    ///
    /// The current token is extended over a REFC or record end that ends the
    ///     reference; any other character is left in the input.
    fn parse_ref_end(&mut self) -> RefEndType {
        let recognizer = self.recognizer(Mode::Ref);
        let Some(source) = self.top_mut() else {
            return RefEndType::Omitted;
        };
        if source.at_substitution() {
            return RefEndType::Omitted;
        }
        let start = source.token_start();
        let end = source.cursor();
        let kind = match recognizer {
            Some(recognizer) => recognizer.recognize(source).kind,
            None => TokenKind::Unrecognized,
        };
        let ref_end = match kind {
            TokenKind::Refc => RefEndType::Refc,
            TokenKind::Re => RefEndType::Re,
            _ => {
                source.set_cursor(end);
                RefEndType::Omitted
            }
        };
        source.restart_token(start);
        ref_end
    }

    fn warn_refc_omitted(&mut self, ref_end: RefEndType) {
        if ref_end == RefEndType::Omitted && self.options.warn_refc_omitted {
            let location = Some(self.current_location());
            self.diagnostics.record(RefcOmittedWarning, location);
        }
    }

    fn add_ref_end(markup: &mut Markup, ref_end: RefEndType) {
        match ref_end {
            RefEndType::Refc => markup.add_delim(DelimGeneral::Refc),
            RefEndType::Re => markup.add_ref_end_re(),
            RefEndType::Omitted => {}
        }
    }

    /// Parse a numeric character reference after a `CroDigit` or
    ///     `HcroHexDigit` token.
    ///
    /// On success the reference is replaced by the character, which is the
    ///     next character scanned and is always data.
    /// A number that is not a character is an error and the reference is skipped.
    pub fn parse_numeric_char_ref(&mut self, hex: bool) -> error::Result<Char> {
        let syntax = Rc::clone(&self.syntax);
        let Some(source) = self.top_mut() else {
            return Err(no_input());
        };
        let delim_length = source.token_length();
        source.extend_token_while(|c| syntax.digit_weight(c, hex).is_some());
        let digits = source.token_text()[delim_length..].to_vec();
        let mut value: Option<Char> = Some(0);
        for &c in &digits {
            let radix = if hex { 16 } else { 10 };
            value = value
                .and_then(|v| v.checked_mul(radix))
                .and_then(|v| v.checked_add(syntax.digit_weight(c, hex).unwrap_or(0)))
                .filter(|&v| v <= CHAR_MAX);
        }
        let ref_end = self.parse_ref_end();
        self.warn_refc_omitted(ref_end);
        let Some(character) = value else {
            return Err(Diagnostic::boxed(
                CharacterNumberError {
                    digits: chars::to_string(&digits),
                },
                Some(self.current_location()),
            ));
        };
        let markup = self.options.keep_markup.then(|| {
            let mut markup = Markup::new();
            markup.add_delim(if hex {
                DelimGeneral::Hcro
            } else {
                DelimGeneral::Cro
            });
            markup.add_number(&digits);
            Scanner::add_ref_end(&mut markup, ref_end);
            markup
        });
        let Some(source) = self.top_mut() else {
            return Err(no_input());
        };
        let start = source.token_start();
        let origin = Rc::new(Origin::NumericCharRef(CharRefOrigin {
            parent: source.location(start),
            ref_length: original_length(source, start),
            character,
            markup,
        }));
        source.substitute(start, character, SubstitutionKind::Data, origin);
        Ok(character)
    }

    /// Parse a named character reference such as `&#RS;` after a
    ///     `CroNameStart` token.
    ///
    /// On success the reference is replaced by the function character, which
    ///     is recognized like any other occurrence of it.
    pub fn parse_named_char_ref(&mut self) -> error::Result<Char> {
        let syntax = Rc::clone(&self.syntax);
        let Some(source) = self.top_mut() else {
            return Err(no_input());
        };
        let delim_length = source.token_length();
        source.extend_token_while(|c| syntax.is_name_char(c));
        let name = source.token_text()[delim_length..].to_vec();
        let ref_end = self.parse_ref_end();
        self.warn_refc_omitted(ref_end);
        let Some(source) = self.top_mut() else {
            return Err(no_input());
        };
        let Some(character) = syntax.function_char(&name) else {
            return Err(Diagnostic::boxed(
                FunctionNameError {
                    name: chars::to_string(&name),
                },
                Some(source.token_location()),
            ));
        };
        let start = source.token_start();
        let origin = Rc::new(Origin::NamedCharRef(NamedCharRefOrigin {
            parent: source.location(start),
            ref_length: original_length(source, start),
            character,
            name,
            ref_end,
        }));
        source.substitute(start, character, SubstitutionKind::Function, origin);
        Ok(character)
    }

    /// Parse a general or parameter entity reference after an
    ///     `EroNameStart` or `PeroNameStart` token, and look the entity up.
    ///
    /// The reference is consumed even if the entity is not declared.
    pub fn parse_entity_reference(&mut self, parameter: bool) -> error::Result<EntityReference> {
        let delim = if parameter {
            DelimGeneral::Pero
        } else {
            DelimGeneral::Ero
        };
        let syntax = Rc::clone(&self.syntax);
        let Some(source) = self.top_mut() else {
            return Err(no_input());
        };
        let delim_length = source.token_length();
        source.extend_token_while(|c| syntax.is_name_char(c));
        let name = source.token_text()[delim_length..].to_vec();
        let location = source.token_location();
        let limit = syntax.quantity(Quantity::Namelen);
        if name.len() > limit as usize {
            self.diagnostics.record(
                NameLengthError {
                    limit,
                    name: chars::to_string(&name),
                },
                Some(location.clone()),
            );
        }
        let ref_end = self.parse_ref_end();
        self.warn_refc_omitted(ref_end);
        let Some(source) = self.top() else {
            return Err(no_input());
        };
        let start = source.token_start();
        let length = original_length(source, start);
        let markup = self.options.keep_markup.then(|| {
            let mut markup = Markup::new();
            markup.add_delim(delim);
            markup.add_name(&name);
            Scanner::add_ref_end(&mut markup, ref_end);
            markup
        });

        let name = chars::to_string(&name);
        let decl_type = if parameter {
            DeclType::ParameterEntity
        } else {
            DeclType::GeneralEntity
        };
        let entity = self
            .entities
            .as_ref()
            .and_then(|entities| entities.lookup(&name, decl_type));
        let Some(entity) = entity else {
            let names = match &self.entities {
                Some(entities) => entities.names(decl_type),
                None => vec![],
            };
            let close_names = spellcheck::find_close_words(&names, &name, 2)
                .into_iter()
                .map(|close| close.word)
                .collect();
            return Err(Diagnostic::boxed(
                UndefinedEntityError {
                    name,
                    parameter,
                    close_names,
                },
                Some(location),
            ));
        };
        Ok(EntityReference {
            entity,
            location,
            length,
            end: ref_end,
            markup,
            start,
        })
    }

    fn entity_origin(&self, reference: &EntityReference, text: Rc<[Char]>) -> Rc<Origin> {
        Rc::new(Origin::Entity(EntityOrigin {
            entity: Rc::clone(&reference.entity),
            text,
            parent: reference.location.clone(),
            ref_length: reference.length,
            markup: reference.markup.clone(),
        }))
    }

    fn check_not_open(&self, reference: &EntityReference) -> error::Result<()> {
        if self.entity_is_open(&reference.entity) {
            return Err(Diagnostic::boxed(
                RecursiveEntityError {
                    entity: reference.entity.name.clone(),
                },
                Some(reference.location.clone()),
            ));
        }
        Ok(())
    }

    fn kind_error(reference: &EntityReference, entity_kind: &'static str, context: RefContext) -> Box<Diagnostic> {
        Diagnostic::boxed(
            EntityKindError {
                entity: reference.entity.name.clone(),
                entity_kind,
                context: context.description(),
            },
            Some(reference.location.clone()),
        )
    }

    /// Do what a reference to an entity does where it occurs.
    ///
    /// Text entities are pushed on the input stack and scanned in the entity
    ///     variant of the active mode.
    /// Must be called right after [Scanner::parse_entity_reference], before
    ///     any other token is read.
    pub fn reference_entity(
        &mut self,
        reference: &EntityReference,
        context: RefContext,
    ) -> error::Result<Reference> {
        match &reference.entity.kind {
            EntityKind::Internal(internal) => match internal.kind {
                InternalKind::Text => {
                    self.check_not_open(reference)?;
                    let origin = self.entity_origin(reference, Rc::clone(&internal.text));
                    let source = InputSource::new(origin, Rc::clone(&internal.text));
                    let entry = Entry::new(self.entity_mode());
                    self.push_input(source, entry)?;
                    Ok(Reference::Pushed)
                }
                InternalKind::Cdata | InternalKind::Sdata => {
                    if context == RefContext::Declaration {
                        let kind = if internal.kind == InternalKind::Cdata {
                            "CDATA"
                        } else {
                            "SDATA"
                        };
                        return Err(Scanner::kind_error(reference, kind, context));
                    }
                    if let Some(err) = self.entity_level_error() {
                        return Err(err);
                    }
                    let origin = self.entity_origin(reference, Rc::clone(&internal.text));
                    Ok(match internal.kind {
                        InternalKind::Cdata => Reference::Cdata(origin),
                        _ => Reference::Sdata(origin),
                    })
                }
                InternalKind::Predefined => {
                    let Some(&c) = internal.text.first() else {
                        return Ok(Reference::Nothing);
                    };
                    let origin = self.entity_origin(reference, Rc::clone(&internal.text));
                    let Some(source) = self.top_mut() else {
                        return Err(no_input());
                    };
                    source.substitute(reference.start, c, SubstitutionKind::Data, origin);
                    Ok(Reference::Substituted)
                }
            },
            EntityKind::ExternalText(id) => {
                self.check_not_open(reference)?;
                let not_opened = |system_id: Option<String>| {
                    Diagnostic::boxed(
                        EntityNotOpenedError {
                            entity: reference.entity.name.clone(),
                            system_id,
                        },
                        Some(reference.location.clone()),
                    )
                };
                let Some(system_id) = &id.system_id else {
                    return Err(not_opened(None));
                };
                let opened = self.entities.as_ref().and_then(|entities| entities.open(id));
                let Some(opened) = opened else {
                    return Err(not_opened(Some(system_id.clone())));
                };
                let origin = self.entity_origin(reference, Rc::clone(&opened.text));
                let mut source = InputSource::new(origin, opened.text);
                if !opened.rewindable {
                    source = source.non_rewindable();
                }
                let entry = Entry::new(self.entity_mode());
                self.push_input(source, entry)?;
                Ok(Reference::Pushed)
            }
            EntityKind::ExternalData(_) => {
                if context != RefContext::Content {
                    return Err(Scanner::kind_error(reference, "external data", context));
                }
                Ok(Reference::ExternalData(self.entity_origin(reference, Rc::from(vec![]))))
            }
            EntityKind::Subdoc(_) => {
                if context != RefContext::Content {
                    return Err(Scanner::kind_error(reference, "subdocument", context));
                }
                Ok(Reference::Subdoc(self.entity_origin(reference, Rc::from(vec![]))))
            }
            EntityKind::Pi(text) => {
                if !matches!(context, RefContext::Content | RefContext::DeclarationSubset) {
                    return Err(Scanner::kind_error(reference, "processing instruction", context));
                }
                Ok(Reference::Pi(self.entity_origin(reference, Rc::clone(text))))
            }
            EntityKind::Ignored => Ok(Reference::Nothing),
        }
    }
}

/// Length in the original text from buffer index `start` to the cursor.
fn original_length(source: &InputSource, start: usize) -> usize {
    source.original_offset(source.cursor()) - source.original_offset(start)
}

fn no_input() -> Box<Diagnostic> {
    Diagnostic::boxed(SimpleStructuralError::new("no input is open"), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chars::IdentityCharset;
    use crate::entity::{EntityTable, ExternalId};
    use crate::mode::ModeBucket;
    use crate::options::ScannerOptions;
    use crate::syntax::{Features, Syntax};

    fn scanner(text: &str, table: EntityTable, options: ScannerOptions) -> Scanner {
        let mut scanner = Scanner::new(
            Syntax::reference(&IdentityCharset),
            Features::default(),
            options,
        )
        .with_entity_manager(Rc::new(table));
        scanner.compile_modes(ModeBucket::Instance, None);
        scanner.push_document("doc", text);
        scanner
    }

    fn table() -> EntityTable {
        let mut table = EntityTable::new();
        table.declare(Entity::internal_text("e", DeclType::GeneralEntity, "<x>"));
        table.declare(Entity::internal_text("loop", DeclType::GeneralEntity, "&loop;"));
        table.declare(Entity::predefined("lt", '<' as Char));
        table.declare(Entity::external_text(
            "ext",
            DeclType::GeneralEntity,
            ExternalId::system("ext.sgm"),
        ));
        table.declare(Entity::external_text(
            "missing",
            DeclType::GeneralEntity,
            ExternalId::system("missing.sgm"),
        ));
        table.declare(Entity::pi("pi", "xml-stylesheet"));
        table.add_storage("ext.sgm", "external", true);
        table
    }

    #[test]
    fn numeric_char_ref_is_data() {
        let mut scanner = scanner("&#60;b", table(), Default::default());
        assert_eq!(scanner.get_token(Mode::Mcon).kind, TokenKind::CroDigit);
        assert_eq!(scanner.parse_numeric_char_ref(false).unwrap(), '<' as Char);
        assert_eq!(scanner.next_token().kind, TokenKind::Char);
        assert_eq!(scanner.current_token_string(), "<");
        assert_eq!(scanner.next_token().kind, TokenKind::Char);
        assert_eq!(scanner.current_token_string(), "b");
    }

    #[test]
    fn hex_char_ref() {
        let mut scanner = scanner("&#x3c;", table(), Default::default());
        assert_eq!(scanner.get_token(Mode::Mcon).kind, TokenKind::HcroHexDigit);
        assert_eq!(scanner.parse_numeric_char_ref(true).unwrap(), 0x3c);
    }

    #[test]
    fn char_number_out_of_range() {
        let mut scanner = scanner("&#99999999999;x", table(), Default::default());
        scanner.get_token(Mode::Mcon);
        let err = scanner.parse_numeric_char_ref(false).unwrap_err();
        assert_eq!(err.title(), "character number 99999999999 is out of range");
        assert_eq!(scanner.next_token().kind, TokenKind::Char);
        assert_eq!(scanner.current_token_string(), "x");
    }

    #[test]
    fn named_char_ref_is_a_function_character() {
        let mut scanner = scanner("&#RS;", table(), Default::default());
        assert_eq!(scanner.get_token(Mode::Mcon).kind, TokenKind::CroNameStart);
        assert_eq!(scanner.parse_named_char_ref().unwrap(), 10);
        assert_eq!(scanner.next_token().kind, TokenKind::Rs);
    }

    #[test]
    fn unknown_function_name() {
        let mut scanner = scanner("&#TAB;", table(), Default::default());
        scanner.get_token(Mode::Mcon);
        let err = scanner.parse_named_char_ref().unwrap_err();
        assert_eq!(err.title(), "`TAB` is not the name of a function character");
    }

    #[test]
    fn refc_omitted_warning() {
        let options = ScannerOptions {
            warn_refc_omitted: true,
            ..Default::default()
        };
        let mut scanner = scanner("&e x", table(), options);
        assert_eq!(scanner.get_token(Mode::Mcon).kind, TokenKind::EroNameStart);
        let reference = scanner.parse_entity_reference(false).unwrap();
        assert_eq!(reference.end, RefEndType::Omitted);
        assert_eq!(reference.length, 2);
        assert_eq!(scanner.diagnostics().titles(), vec!["reference not terminated by the REFC delimiter"]);
    }

    #[test]
    fn record_end_ends_reference() {
        let mut scanner = scanner("&e\rx", table(), Default::default());
        scanner.get_token(Mode::Mcon);
        let reference = scanner.parse_entity_reference(false).unwrap();
        assert_eq!(reference.end, RefEndType::Re);
        assert_eq!(reference.length, 3);
    }

    #[test]
    fn internal_entity_is_pushed() {
        let mut scanner = scanner("&e;y", table(), Default::default());
        scanner.get_token(Mode::Mcon);
        let reference = scanner.parse_entity_reference(false).unwrap();
        assert!(matches!(
            scanner.reference_entity(&reference, RefContext::Content).unwrap(),
            Reference::Pushed
        ));
        assert_eq!(scanner.input_level(), 2);
        assert_eq!(scanner.next_token().kind, TokenKind::StagoNameStart);
        let location = scanner.current_location();
        let origin = location.origin().unwrap();
        assert_eq!(
            chars::to_string(&origin.reference_text(scanner.syntax()).unwrap()),
            "&e;"
        );
    }

    #[test]
    fn recursive_reference() {
        let mut scanner = scanner("&loop;", table(), Default::default());
        scanner.get_token(Mode::Mcon);
        let reference = scanner.parse_entity_reference(false).unwrap();
        scanner.reference_entity(&reference, RefContext::Content).unwrap();
        assert_eq!(scanner.next_token().kind, TokenKind::EroNameStart);
        let reference = scanner.parse_entity_reference(false).unwrap();
        let err = scanner
            .reference_entity(&reference, RefContext::Content)
            .unwrap_err();
        assert_eq!(err.title(), "entity loop is referenced while it is open");
        assert_eq!(scanner.input_level(), 2);
    }

    #[test]
    fn predefined_entity_is_substituted_as_data() {
        let mut scanner = scanner("&lt;p", table(), Default::default());
        scanner.get_token(Mode::Mcon);
        let reference = scanner.parse_entity_reference(false).unwrap();
        assert!(matches!(
            scanner.reference_entity(&reference, RefContext::Content).unwrap(),
            Reference::Substituted
        ));
        assert_eq!(scanner.next_token().kind, TokenKind::Char);
        assert_eq!(scanner.current_token_string(), "<");
        assert_eq!(scanner.input_level(), 1);
    }

    #[test]
    fn external_entity() {
        let mut scanner = scanner("&ext;&missing;", table(), Default::default());
        scanner.get_token(Mode::Mcon);
        let reference = scanner.parse_entity_reference(false).unwrap();
        scanner.reference_entity(&reference, RefContext::Content).unwrap();
        assert_eq!(scanner.next_token().kind, TokenKind::Char);
        scanner.extend_data();
        assert_eq!(scanner.current_token_string(), "external");
        assert_eq!(scanner.next_token().kind, TokenKind::EroNameStart);
        let reference = scanner.parse_entity_reference(false).unwrap();
        let err = scanner
            .reference_entity(&reference, RefContext::Content)
            .unwrap_err();
        assert_eq!(err.title(), "cannot open entity missing (missing.sgm)");
    }

    #[test]
    fn pi_entity_in_literal() {
        let mut scanner = scanner("&pi;", table(), Default::default());
        scanner.get_token(Mode::Mcon);
        let reference = scanner.parse_entity_reference(false).unwrap();
        let err = scanner
            .reference_entity(&reference, RefContext::Literal)
            .unwrap_err();
        assert_eq!(
            err.title(),
            "reference to processing instruction entity pi is not allowed in a literal"
        );
    }

    #[test]
    fn undefined_entity_suggestion() {
        let mut scanner = scanner("&ex;", table(), Default::default());
        scanner.get_token(Mode::Mcon);
        let err = scanner.parse_entity_reference(false).unwrap_err();
        assert_eq!(err.title(), "general entity ex is not defined");
        let notes: Vec<String> = err.error.notes().iter().map(|n| format!["{n}"]).collect();
        assert_eq!(notes, vec!["did you mean e?"]);
    }
}
