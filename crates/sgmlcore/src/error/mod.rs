//! Error handling
//!
//! Every condition the core can report is a type implementing [SgmlError].
//! Together with the location it happened at it becomes a [Diagnostic].
//!
//! There are two ways a diagnostic reaches the client.
//! Operations the client calls directly, such as
//!     [Scanner::reference_entity](crate::scanner::Scanner::reference_entity),
//!     return [Result] and leave it to the client to decide what to do.
//! Conditions the scanner runs into by itself, such as an entity ending in the
//!     middle of a literal, are recorded in the scanner's [Diagnostics] and
//!     scanning continues.
//! Nothing in this crate panics on malformed input.

use crate::chars::Char;
use crate::mode::Mode;
use crate::origin::Location;
use crate::syntax::{DelimGeneral, Quantity};

pub mod display;

pub use display::Note;

/// The result type of fallible core operations.
pub type Result<T> = std::result::Result<T, Box<Diagnostic>>;

/// The broad category of an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Kind {
    /// A problem with the declared concrete syntax.
    Configuration,
    /// A problem with how entities, literals and groups nest.
    Structural,
    /// A limit was exceeded or an entity could not be read.
    Resource,
    /// A problem with a character or a character reference.
    Data,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    Warning,
    /// A capacity or quantity was exceeded; counted as an error.
    Quantity,
    Error,
}

impl Severity {
    pub fn is_error(self) -> bool {
        self != Severity::Warning
    }
}

/// Implementations of this trait describe one condition.
pub trait SgmlError: std::fmt::Debug + 'static {
    fn kind(&self) -> Kind;

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn title(&self) -> String;

    fn notes(&self) -> Vec<Note> {
        vec![]
    }
}

/// An error together with the location it was found at.
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    #[cfg_attr(
        feature = "serde",
        serde(
            serialize_with = "serialize_error",
            deserialize_with = "deserialize_error"
        )
    )]
    pub error: Box<dyn SgmlError>,
    /// Locations refer to shared origins and are not serialized.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub location: Option<Location>,
}

impl Diagnostic {
    pub fn new<E: SgmlError>(error: E, location: Option<Location>) -> Diagnostic {
        Diagnostic {
            error: Box::new(error),
            location,
        }
    }

    /// A boxed diagnostic, the error type of [Result].
    pub fn boxed<E: SgmlError>(error: E, location: Option<Location>) -> Box<Diagnostic> {
        Box::new(Diagnostic::new(error, location))
    }

    pub fn kind(&self) -> Kind {
        self.error.kind()
    }

    pub fn severity(&self) -> Severity {
        self.error.severity()
    }

    pub fn title(&self) -> String {
        self.error.title()
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        display::format_diagnostic(f, self)
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(feature = "serde")]
#[allow(clippy::borrowed_box)] // serde requires this exact signature.
fn serialize_error<S>(value: &Box<dyn SgmlError>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::Serialize;
    let serializable_error = SerializableError {
        kind: value.kind(),
        severity: value.severity(),
        title: value.title(),
        notes: value.notes(),
    };
    serializable_error.serialize(serializer)
}

#[cfg(feature = "serde")]
fn deserialize_error<'de, D>(deserializer: D) -> std::result::Result<Box<dyn SgmlError>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;
    let serializable_error = SerializableError::deserialize(deserializer)?;
    Ok(Box::new(serializable_error))
}

/// The form errors take after a serialization round trip.
#[cfg(feature = "serde")]
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
struct SerializableError {
    kind: Kind,
    severity: Severity,
    title: String,
    notes: Vec<Note>,
}

#[cfg(feature = "serde")]
impl SgmlError for SerializableError {
    fn kind(&self) -> Kind {
        self.kind
    }
    fn severity(&self) -> Severity {
        self.severity
    }
    fn title(&self) -> String {
        self.title.clone()
    }
    fn notes(&self) -> Vec<Note> {
        self.notes.clone()
    }
}

/// The diagnostics recorded while scanning a document.
#[derive(Debug, Default)]
pub struct Diagnostics {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
}

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Default::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity().is_error() {
            self.error_count += 1;
        }
        if diagnostic.kind() == Kind::Configuration {
            log::warn!("{}", diagnostic.title());
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn record<E: SgmlError>(&mut self, error: E, location: Option<Location>) {
        self.push(Diagnostic::new(error, location));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Titles of the recorded diagnostics, in order.
    pub fn titles(&self) -> Vec<String> {
        self.diagnostics.iter().map(Diagnostic::title).collect()
    }

    /// Number of diagnostics that are errors rather than warnings.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Remove and return all recorded diagnostics.
    ///
    /// The error count is not reset; it counts every error of the document.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

fn describe_char(c: Char) -> String {
    match char::from_u32(c) {
        Some(ch) if !ch.is_control() => format!["`{ch}`"],
        _ => format!["number {c}"],
    }
}

/// A one-off structural error with a custom message.
#[derive(Debug)]
pub struct SimpleStructuralError {
    title: String,
    notes: Vec<Note>,
}

impl SimpleStructuralError {
    pub fn new<S: Into<String>>(title: S) -> SimpleStructuralError {
        SimpleStructuralError {
            title: title.into(),
            notes: vec![],
        }
    }

    pub fn with_note<T: Into<Note>>(mut self, note: T) -> Self {
        self.notes.push(note.into());
        self
    }
}

impl SgmlError for SimpleStructuralError {
    fn kind(&self) -> Kind {
        Kind::Structural
    }
    fn title(&self) -> String {
        self.title.clone()
    }
    fn notes(&self) -> Vec<Note> {
        self.notes.clone()
    }
}

#[derive(Debug)]
pub struct EmptyDelimiterError {
    pub delim: DelimGeneral,
}

impl SgmlError for EmptyDelimiterError {
    fn kind(&self) -> Kind {
        Kind::Configuration
    }
    fn title(&self) -> String {
        format!["the {} delimiter is empty", self.delim]
    }
    fn notes(&self) -> Vec<Note> {
        vec!["tokens containing the delimiter are not recognized".into()]
    }
}

#[derive(Debug)]
pub struct LexicalAmbiguityError {
    pub mode: Mode,
    pub recognized: String,
    pub dropped: String,
}

impl SgmlError for LexicalAmbiguityError {
    fn kind(&self) -> Kind {
        Kind::Configuration
    }
    fn title(&self) -> String {
        format![
            "{} and {} are ambiguous in the {} mode",
            self.recognized, self.dropped, self.mode
        ]
    }
    fn notes(&self) -> Vec<Note> {
        vec![format!["{} is recognized; {} never is", self.recognized, self.dropped].into()]
    }
}

#[derive(Debug)]
pub struct EntityLevelError {
    pub limit: u32,
}

impl SgmlError for EntityLevelError {
    fn kind(&self) -> Kind {
        Kind::Resource
    }
    fn severity(&self) -> Severity {
        Severity::Quantity
    }
    fn title(&self) -> String {
        format![
            "number of open entities cannot exceed {} ({})",
            Quantity::Entlvl,
            self.limit
        ]
    }
    fn notes(&self) -> Vec<Note> {
        vec!["the entity was not opened".into()]
    }
}

#[derive(Debug)]
pub struct RecursiveEntityError {
    pub entity: String,
}

impl SgmlError for RecursiveEntityError {
    fn kind(&self) -> Kind {
        Kind::Structural
    }
    fn title(&self) -> String {
        format!["entity {} is referenced while it is open", self.entity]
    }
    fn notes(&self) -> Vec<Note> {
        vec!["an entity cannot be referenced from its own replacement text".into()]
    }
}

#[derive(Debug)]
pub struct EntityCannotRewindError {
    pub name: String,
}

impl SgmlError for EntityCannotRewindError {
    fn kind(&self) -> Kind {
        Kind::Resource
    }
    fn title(&self) -> String {
        format!["{} cannot be read a second time", self.name]
    }
    fn notes(&self) -> Vec<Note> {
        vec!["the document is parsed in a single pass".into()]
    }
}

#[derive(Debug)]
pub struct Pass2EeError;

impl SgmlError for Pass2EeError {
    fn kind(&self) -> Kind {
        Kind::Structural
    }
    fn title(&self) -> String {
        "unexpected end of entity while replaying the first pass".into()
    }
}

#[derive(Debug)]
pub struct LiteralEntityEndError;

impl SgmlError for LiteralEntityEndError {
    fn kind(&self) -> Kind {
        Kind::Structural
    }
    fn title(&self) -> String {
        "an entity ended inside a literal it did not start".into()
    }
    fn notes(&self) -> Vec<Note> {
        vec!["an entity end in a literal must end an entity referenced in the same literal".into()]
    }
}

#[derive(Debug)]
pub struct LiteralLengthError {
    pub limit: u32,
    pub length: usize,
}

impl SgmlError for LiteralLengthError {
    fn kind(&self) -> Kind {
        Kind::Resource
    }
    fn severity(&self) -> Severity {
        Severity::Quantity
    }
    fn title(&self) -> String {
        format![
            "length of literal cannot exceed {} ({})",
            Quantity::Litlen,
            self.limit
        ]
    }
    fn notes(&self) -> Vec<Note> {
        vec![format!["the literal has {} characters", self.length].into()]
    }
}

#[derive(Debug)]
pub struct NameLengthError {
    pub limit: u32,
    pub name: String,
}

impl SgmlError for NameLengthError {
    fn kind(&self) -> Kind {
        Kind::Resource
    }
    fn severity(&self) -> Severity {
        Severity::Quantity
    }
    fn title(&self) -> String {
        format![
            "length of name `{}` exceeds {} ({})",
            self.name,
            Quantity::Namelen,
            self.limit
        ]
    }
}

#[derive(Debug)]
pub struct GroupEntityEndError;

impl SgmlError for GroupEntityEndError {
    fn kind(&self) -> Kind {
        Kind::Structural
    }
    fn title(&self) -> String {
        "a group and the entity it was opened in end separately".into()
    }
    fn notes(&self) -> Vec<Note> {
        vec!["a group must end in the same entity it started in".into()]
    }
}

#[derive(Debug)]
pub struct CharacterNumberError {
    pub digits: String,
}

impl SgmlError for CharacterNumberError {
    fn kind(&self) -> Kind {
        Kind::Data
    }
    fn title(&self) -> String {
        format!["character number {} is out of range", self.digits]
    }
}

#[derive(Debug)]
pub struct FunctionNameError {
    pub name: String,
}

impl SgmlError for FunctionNameError {
    fn kind(&self) -> Kind {
        Kind::Data
    }
    fn title(&self) -> String {
        format!["`{}` is not the name of a function character", self.name]
    }
    fn notes(&self) -> Vec<Note> {
        vec!["named character references can refer to RE, RS, SPACE and the function characters of the syntax".into()]
    }
}

#[derive(Debug)]
pub struct UnrecognizedCharacterError {
    pub character: Char,
    pub mode: Mode,
    pub expected: Vec<String>,
}

impl SgmlError for UnrecognizedCharacterError {
    fn kind(&self) -> Kind {
        Kind::Structural
    }
    fn title(&self) -> String {
        format![
            "character {} is not allowed in the {} mode",
            describe_char(self.character),
            self.mode
        ]
    }
    fn notes(&self) -> Vec<Note> {
        if self.expected.is_empty() {
            return vec![];
        }
        vec![Note::List("expected one of:".into(), self.expected.clone())]
    }
}

#[derive(Debug)]
pub struct NonSgmlCharacterError {
    pub character: Char,
}

impl SgmlError for NonSgmlCharacterError {
    fn kind(&self) -> Kind {
        Kind::Data
    }
    fn title(&self) -> String {
        format!["non SGML character number {}", self.character]
    }
}

#[derive(Debug)]
pub struct RefcOmittedWarning;

impl SgmlError for RefcOmittedWarning {
    fn kind(&self) -> Kind {
        Kind::Structural
    }
    fn severity(&self) -> Severity {
        Severity::Warning
    }
    fn title(&self) -> String {
        "reference not terminated by the REFC delimiter".into()
    }
}

#[derive(Debug)]
pub struct DataDelimiterWarning {
    pub text: String,
}

impl SgmlError for DataDelimiterWarning {
    fn kind(&self) -> Kind {
        Kind::Structural
    }
    fn severity(&self) -> Severity {
        Severity::Warning
    }
    fn title(&self) -> String {
        format!["`{}` starts a delimiter but is treated as data", self.text]
    }
}

#[derive(Debug)]
pub struct EntityNotOpenedError {
    pub entity: String,
    pub system_id: Option<String>,
}

impl SgmlError for EntityNotOpenedError {
    fn kind(&self) -> Kind {
        Kind::Resource
    }
    fn title(&self) -> String {
        match &self.system_id {
            Some(system_id) => format!["cannot open entity {} ({})", self.entity, system_id],
            None => format!["entity {} has no system identifier to open", self.entity],
        }
    }
}

#[derive(Debug)]
pub struct EntityKindError {
    pub entity: String,
    /// The kind of the entity, such as "external data".
    pub entity_kind: &'static str,
    /// Where the reference occurs, such as "a literal".
    pub context: &'static str,
}

impl SgmlError for EntityKindError {
    fn kind(&self) -> Kind {
        Kind::Structural
    }
    fn title(&self) -> String {
        format![
            "reference to {} entity {} is not allowed in {}",
            self.entity_kind, self.entity, self.context
        ]
    }
}

#[derive(Debug)]
pub struct UndefinedEntityError {
    pub name: String,
    pub parameter: bool,
    /// Names of declared entities close to the name.
    pub close_names: Vec<String>,
}

impl SgmlError for UndefinedEntityError {
    fn kind(&self) -> Kind {
        Kind::Structural
    }
    fn title(&self) -> String {
        let kind = if self.parameter { "parameter" } else { "general" };
        format!["{} entity {} is not defined", kind, self.name]
    }
    fn notes(&self) -> Vec<Note> {
        match self.close_names.first() {
            None => vec![],
            Some(close) => vec![format!["did you mean {close}?"].into()],
        }
    }
}

#[derive(Debug)]
pub struct CancelledError;

impl SgmlError for CancelledError {
    fn kind(&self) -> Kind {
        Kind::Resource
    }
    fn title(&self) -> String {
        "scanning was cancelled".into()
    }
    fn notes(&self) -> Vec<Note> {
        vec!["all open entities were closed".into()]
    }
}
