//! Entities
//!
//! An [Entity] is a named piece of replacement text or a pointer to external
//!     data.
//! What happens when an entity is referenced depends on its [EntityKind] and
//!     on where the reference occurs; that logic lives in the scanner, as one
//!     `match` over the kind.
//!
//! Entity declarations are parsed by clients of this crate.
//! The scanner only needs to look entities up by name and, for external text
//!     entities, to get their text; both are behind the [EntityManager] trait.

use crate::chars::{self, Char};
use crate::origin::Location;
use std::collections::HashMap;
use std::rc::Rc;

/// The declaration an entity comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeclType {
    GeneralEntity,
    ParameterEntity,
    Doctype,
    Linktype,
}

/// What the text of an internal entity is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InternalKind {
    /// Parsed replacement text.
    Text,
    Cdata,
    Sdata,
    /// An entity defined by the SGML declaration whose text is a single character.
    Predefined,
}

/// Notation data type of an external data entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataType {
    Cdata,
    Sdata,
    Ndata,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExternalId {
    pub system_id: Option<String>,
    pub public_id: Option<String>,
}

impl ExternalId {
    pub fn system<S: Into<String>>(system_id: S) -> ExternalId {
        ExternalId {
            system_id: Some(system_id.into()),
            public_id: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct InternalEntity {
    pub kind: InternalKind,
    pub text: Rc<[Char]>,
}

#[derive(Clone, Debug)]
pub struct ExternalDataEntity {
    pub id: ExternalId,
    pub data_type: DataType,
    pub notation: Option<String>,
}

#[derive(Clone, Debug)]
pub enum EntityKind {
    Internal(InternalEntity),
    ExternalText(ExternalId),
    ExternalData(ExternalDataEntity),
    Subdoc(ExternalId),
    /// A processing instruction entity, with its system data.
    Pi(Rc<[Char]>),
    /// An entity in an ignored marked section or a LINK set that is not active.
    Ignored,
}

#[derive(Clone, Debug)]
pub struct Entity {
    pub name: String,
    pub decl_type: DeclType,
    pub kind: EntityKind,
    /// Where the entity was declared; null for entities made up by a program.
    pub def_location: Location,
}

impl Entity {
    pub fn new<S: Into<String>>(name: S, decl_type: DeclType, kind: EntityKind) -> Entity {
        Entity {
            name: name.into(),
            decl_type,
            kind,
            def_location: Location::default(),
        }
    }

    fn internal(name: &str, decl_type: DeclType, kind: InternalKind, text: &str) -> Entity {
        Entity::new(
            name,
            decl_type,
            EntityKind::Internal(InternalEntity {
                kind,
                text: chars::to_chars(text).into(),
            }),
        )
    }

    pub fn internal_text(name: &str, decl_type: DeclType, text: &str) -> Entity {
        Entity::internal(name, decl_type, InternalKind::Text, text)
    }

    pub fn internal_cdata(name: &str, text: &str) -> Entity {
        Entity::internal(name, DeclType::GeneralEntity, InternalKind::Cdata, text)
    }

    pub fn internal_sdata(name: &str, text: &str) -> Entity {
        Entity::internal(name, DeclType::GeneralEntity, InternalKind::Sdata, text)
    }

    pub fn predefined(name: &str, c: Char) -> Entity {
        Entity::new(
            name,
            DeclType::GeneralEntity,
            EntityKind::Internal(InternalEntity {
                kind: InternalKind::Predefined,
                text: Rc::from(vec![c]),
            }),
        )
    }

    pub fn pi(name: &str, text: &str) -> Entity {
        Entity::new(
            name,
            DeclType::GeneralEntity,
            EntityKind::Pi(chars::to_chars(text).into()),
        )
    }

    pub fn external_text(name: &str, decl_type: DeclType, id: ExternalId) -> Entity {
        Entity::new(name, decl_type, EntityKind::ExternalText(id))
    }

    pub fn with_def_location(mut self, location: Location) -> Entity {
        self.def_location = location;
        self
    }

    pub fn is_parameter(&self) -> bool {
        self.decl_type == DeclType::ParameterEntity
    }

    /// Whether a reference to the entity produces data rather than markup.
    pub fn is_data_or_subdoc(&self) -> bool {
        match &self.kind {
            EntityKind::Internal(internal) => internal.kind != InternalKind::Text,
            EntityKind::ExternalData(_) | EntityKind::Subdoc(_) => true,
            EntityKind::ExternalText(_) | EntityKind::Pi(_) | EntityKind::Ignored => false,
        }
    }

    /// The replacement text of internal and processing instruction entities.
    pub fn text(&self) -> Option<&Rc<[Char]>> {
        match &self.kind {
            EntityKind::Internal(internal) => Some(&internal.text),
            EntityKind::Pi(text) => Some(text),
            _ => None,
        }
    }
}

/// The text of an opened external entity.
#[derive(Clone, Debug)]
pub struct OpenedEntity {
    pub text: Rc<[Char]>,
    /// Name used in diagnostics, normally the system identifier.
    pub name: String,
    /// False for sources such as standard input that cannot be read twice.
    pub rewindable: bool,
}

/// The scanner's view of the entity declarations and the storage manager.
pub trait EntityManager {
    fn lookup(&self, name: &str, decl_type: DeclType) -> Option<Rc<Entity>>;

    /// Open the text of an external entity.
    ///
    /// Returns `None` if the entity cannot be opened; the scanner reports this.
    fn open(&self, id: &ExternalId) -> Option<OpenedEntity>;

    /// Names of the declared entities of a type, used to suggest a close
    ///     name when a reference is to an undefined entity.
    fn names(&self, _decl_type: DeclType) -> Vec<String> {
        vec![]
    }
}

/// An in-memory [EntityManager].
#[derive(Debug, Default)]
pub struct EntityTable {
    general: HashMap<String, Rc<Entity>>,
    parameter: HashMap<String, Rc<Entity>>,
    storage: HashMap<String, OpenedEntity>,
}

impl EntityTable {
    pub fn new() -> EntityTable {
        Default::default()
    }

    /// Declare an entity.
    ///
    /// As in SGML, the first declaration of a name is binding; a later one is
    ///     ignored and `false` is returned.
    pub fn declare(&mut self, entity: Entity) -> bool {
        let map = if entity.is_parameter() {
            &mut self.parameter
        } else {
            &mut self.general
        };
        if map.contains_key(&entity.name) {
            return false;
        }
        map.insert(entity.name.clone(), Rc::new(entity));
        true
    }

    /// Make text available under a system identifier.
    pub fn add_storage(&mut self, system_id: &str, text: &str, rewindable: bool) {
        self.storage.insert(
            system_id.to_string(),
            OpenedEntity {
                text: chars::to_chars(text).into(),
                name: system_id.to_string(),
                rewindable,
            },
        );
    }
}

impl EntityManager for EntityTable {
    fn lookup(&self, name: &str, decl_type: DeclType) -> Option<Rc<Entity>> {
        match decl_type {
            DeclType::ParameterEntity => self.parameter.get(name).cloned(),
            _ => self.general.get(name).cloned(),
        }
    }

    fn open(&self, id: &ExternalId) -> Option<OpenedEntity> {
        self.storage.get(id.system_id.as_ref()?).cloned()
    }

    fn names(&self, decl_type: DeclType) -> Vec<String> {
        let map = match decl_type {
            DeclType::ParameterEntity => &self.parameter,
            _ => &self.general,
        };
        let mut names: Vec<String> = map.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_declaration_is_binding() {
        let mut table = EntityTable::new();
        assert!(table.declare(Entity::internal_text("e", DeclType::GeneralEntity, "one")));
        assert!(!table.declare(Entity::internal_text("e", DeclType::GeneralEntity, "two")));
        assert!(table.declare(Entity::internal_text("e", DeclType::ParameterEntity, "three")));
        let general = table.lookup("e", DeclType::GeneralEntity).unwrap();
        assert_eq!(chars::to_string(general.text().unwrap()), "one");
        let parameter = table.lookup("e", DeclType::ParameterEntity).unwrap();
        assert_eq!(chars::to_string(parameter.text().unwrap()), "three");
    }

    #[test]
    fn open_storage() {
        let mut table = EntityTable::new();
        table.add_storage("a.sgml", "text", false);
        let opened = table.open(&ExternalId::system("a.sgml")).unwrap();
        assert_eq!(chars::to_string(&opened.text), "text");
        assert!(!opened.rewindable);
        assert!(table.open(&ExternalId::system("b.sgml")).is_none());
        assert!(table.open(&ExternalId::default()).is_none());
    }

    #[test]
    fn names_are_sorted() {
        let mut table = EntityTable::new();
        table.declare(Entity::internal_text("b", DeclType::GeneralEntity, ""));
        table.declare(Entity::internal_text("a", DeclType::GeneralEntity, ""));
        table.declare(Entity::internal_text("p", DeclType::ParameterEntity, ""));
        assert_eq!(table.names(DeclType::GeneralEntity), vec!["a", "b"]);
        assert_eq!(table.names(DeclType::ParameterEntity), vec!["p"]);
    }

    #[test]
    fn data_entities() {
        assert!(Entity::internal_cdata("c", "x").is_data_or_subdoc());
        assert!(!Entity::internal_text("t", DeclType::GeneralEntity, "x").is_data_or_subdoc());
        assert!(!Entity::pi("p", "x").is_data_or_subdoc());
    }
}
