//! Origins and locations
//!
//! Every character the scanner hands out has a [Location]: an [Origin] plus an
//!     index into that origin's original text.
//! Origins form a chain: the origin of an entity's replacement text points at
//!     the location of the reference that opened it, which has its own origin,
//!     and so on up to the document entity.
//! Origins are shared and immutable, so a location stays valid after the entity
//!     it points into has been closed.

use crate::chars::{self, Char};
use crate::entity::{Entity, EntityKind};
use crate::syntax::{DelimGeneral, StandardFunction, Syntax};
use std::rc::Rc;

/// How a reference was terminated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RefEndType {
    /// By the REFC delimiter.
    Refc,
    /// By a record end, which is consumed.
    Re,
    /// By a character that is not part of the reference, which is not consumed.
    Omitted,
}

/// One element of the markup of a reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MarkupItem {
    Delimiter(DelimGeneral),
    Name(Vec<Char>),
    Number(Vec<Char>),
    RefEndRe,
}

/// The markup making up a reference, kept so that it can be reproduced exactly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Markup {
    items: Vec<MarkupItem>,
}

impl Markup {
    pub fn new() -> Markup {
        Default::default()
    }

    pub fn add_delim(&mut self, delim: DelimGeneral) {
        self.items.push(MarkupItem::Delimiter(delim));
    }

    pub fn add_name(&mut self, name: &[Char]) {
        self.items.push(MarkupItem::Name(name.to_vec()));
    }

    pub fn add_number(&mut self, digits: &[Char]) {
        self.items.push(MarkupItem::Number(digits.to_vec()));
    }

    pub fn add_ref_end_re(&mut self) {
        self.items.push(MarkupItem::RefEndRe);
    }

    pub fn items(&self) -> &[MarkupItem] {
        &self.items
    }

    /// Reproduce the markup's characters.
    ///
    /// Delimiters are rendered with their current value in `syntax`.
    pub fn render(&self, syntax: &Syntax) -> Vec<Char> {
        let mut out = vec![];
        for item in &self.items {
            match item {
                MarkupItem::Delimiter(delim) => out.extend_from_slice(syntax.delim(*delim)),
                MarkupItem::Name(name) | MarkupItem::Number(name) => out.extend_from_slice(name),
                MarkupItem::RefEndRe => {
                    if let Some(re) = syntax.standard_function(StandardFunction::Re) {
                        out.push(re)
                    }
                }
            }
        }
        out
    }
}

/// A position in the text of an origin.
///
/// Indexes are offsets into the original text of the origin, before any
///     character reference substitution.
/// A location without an origin is null.
#[derive(Clone, Debug, Default)]
pub struct Location {
    origin: Option<Rc<Origin>>,
    index: usize,
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        let same_origin = match (&self.origin, &other.origin) {
            (None, None) => true,
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        };
        same_origin && self.index == other.index
    }
}

impl Location {
    pub fn new(origin: Rc<Origin>, index: usize) -> Location {
        Location {
            origin: Some(origin),
            index,
        }
    }

    pub fn origin(&self) -> Option<&Rc<Origin>> {
        self.origin.as_ref()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_null(&self) -> bool {
        self.origin.is_none()
    }

    /// The location one level up the chain: where the entity or character
    ///     reference containing this location was referenced.
    pub fn parent(&self) -> Option<&Location> {
        self.origin.as_ref()?.parent()
    }

    /// This location followed by each of its ancestors.
    pub fn chain(&self) -> Vec<&Location> {
        let mut chain = vec![self];
        let mut current = self;
        while let Some(parent) = current.parent() {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// The first location in the chain that is in real document text: the
    ///     document entity, or an external entity.
    pub fn external(&self) -> Option<&Location> {
        self.chain()
            .into_iter()
            .find(|location| match location.origin() {
                Some(origin) => origin.is_external(),
                None => false,
            })
    }

    /// `length` characters of the origin's original text starting here.
    pub fn source_text(&self, length: usize) -> Option<Vec<Char>> {
        let text = self.origin.as_ref()?.text()?;
        text.get(self.index..self.index + length).map(<[Char]>::to_vec)
    }

    /// 1-based line number, 0-based column and the content of the line.
    ///
    /// Lines are separated by the RS character, character number 10.
    pub fn line_and_column(&self) -> Option<(usize, usize, Vec<Char>)> {
        let text = self.origin.as_ref()?.text()?;
        let index = self.index.min(text.len());
        let line_start = text[..index]
            .iter()
            .rposition(|&c| c == 10)
            .map(|i| i + 1)
            .unwrap_or(0);
        let line_end = text[index..]
            .iter()
            .position(|&c| c == 10)
            .map(|i| i + index)
            .unwrap_or(text.len());
        let line_number = 1 + text[..line_start].iter().filter(|&&c| c == 10).count();
        Some((
            line_number,
            index - line_start,
            text[line_start..line_end].to_vec(),
        ))
    }
}

/// The text of a document or external entity opened directly.
#[derive(Debug)]
pub struct InputSourceOrigin {
    /// The name to show in diagnostics, such as a system identifier.
    pub name: String,
    pub text: Rc<[Char]>,
    /// Null for the document entity.
    pub parent: Location,
}

/// The replacement text of an entity reference.
#[derive(Debug)]
pub struct EntityOrigin {
    pub entity: Rc<Entity>,
    pub text: Rc<[Char]>,
    /// The start of the reference.
    pub parent: Location,
    /// Length of the reference in the referencing text.
    pub ref_length: usize,
    pub markup: Option<Markup>,
}

/// A single character produced by a numeric character reference.
#[derive(Debug)]
pub struct CharRefOrigin {
    pub parent: Location,
    pub ref_length: usize,
    pub character: Char,
    pub markup: Option<Markup>,
}

/// A single character produced by a named character reference such as `&#RE;`.
#[derive(Debug)]
pub struct NamedCharRefOrigin {
    pub parent: Location,
    pub ref_length: usize,
    pub character: Char,
    pub name: Vec<Char>,
    pub ref_end: RefEndType,
}

/// Why a run of characters exists.
#[derive(Debug)]
pub enum Origin {
    InputSource(InputSourceOrigin),
    Entity(EntityOrigin),
    NumericCharRef(CharRefOrigin),
    NamedCharRef(NamedCharRefOrigin),
}

impl Origin {
    /// The origin of a document entity.
    pub fn document<S: Into<String>>(name: S, text: Rc<[Char]>) -> Rc<Origin> {
        Rc::new(Origin::InputSource(InputSourceOrigin {
            name: name.into(),
            text,
            parent: Location::default(),
        }))
    }

    pub fn parent(&self) -> Option<&Location> {
        let parent = match self {
            Origin::InputSource(o) => &o.parent,
            Origin::Entity(o) => &o.parent,
            Origin::NumericCharRef(o) => &o.parent,
            Origin::NamedCharRef(o) => &o.parent,
        };
        if parent.is_null() {
            None
        } else {
            Some(parent)
        }
    }

    /// The original text of the origin, for origins that have one.
    pub fn text(&self) -> Option<&[Char]> {
        match self {
            Origin::InputSource(o) => Some(&o.text),
            Origin::Entity(o) => Some(&o.text),
            Origin::NumericCharRef(_) | Origin::NamedCharRef(_) => None,
        }
    }

    pub fn entity(&self) -> Option<&Rc<Entity>> {
        match self {
            Origin::Entity(o) => Some(&o.entity),
            _ => None,
        }
    }

    /// Length of the reference that produced this origin in its parent's text.
    pub fn ref_length(&self) -> usize {
        match self {
            Origin::InputSource(_) => 0,
            Origin::Entity(o) => o.ref_length,
            Origin::NumericCharRef(o) => o.ref_length,
            Origin::NamedCharRef(o) => o.ref_length,
        }
    }

    /// Whether the origin's text is real document text rather than a replacement.
    pub fn is_external(&self) -> bool {
        match self {
            Origin::InputSource(_) => true,
            Origin::Entity(o) => matches!(o.entity.kind, EntityKind::ExternalText(_)),
            Origin::NumericCharRef(_) | Origin::NamedCharRef(_) => false,
        }
    }

    /// Name of the origin as shown in diagnostics.
    pub fn display_name(&self) -> String {
        match self {
            Origin::InputSource(o) => o.name.clone(),
            Origin::Entity(o) => format!["entity {}", o.entity.name],
            Origin::NumericCharRef(_) => "numeric character reference".into(),
            Origin::NamedCharRef(o) => {
                format!["character reference {}", chars::to_string(&o.name)]
            }
        }
    }

    /// The original text of the reference that produced this origin.
    ///
    /// Recorded markup is rendered if there is any; otherwise the text is read
    ///     back from the referencing text.
    pub fn reference_text(&self, syntax: &Syntax) -> Option<Vec<Char>> {
        match self {
            Origin::InputSource(_) => None,
            Origin::Entity(o) => match &o.markup {
                Some(markup) => Some(markup.render(syntax)),
                None => o.parent.source_text(o.ref_length),
            },
            Origin::NumericCharRef(o) => match &o.markup {
                Some(markup) => Some(markup.render(syntax)),
                None => o.parent.source_text(o.ref_length),
            },
            Origin::NamedCharRef(o) => {
                let mut markup = Markup::new();
                markup.add_delim(DelimGeneral::Cro);
                markup.add_name(&o.name);
                match o.ref_end {
                    RefEndType::Refc => markup.add_delim(DelimGeneral::Refc),
                    RefEndType::Re => markup.add_ref_end_re(),
                    RefEndType::Omitted => {}
                }
                Some(markup.render(syntax))
            }
        }
    }
}
