//! Tokens returned by recognizers

use crate::syntax::{DelimGeneral, Set, StandardFunction, Syntax};

/// The kind of a token.
///
/// Most kinds are a delimiter, or a delimiter in context: `EroNameStart` is the
///     ERO delimiter followed by a name start character.
/// For delimiters in context only the delimiter is part of the token;
///     the context character is left in the input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TokenKind {
    /// End of the current entity.
    Ee,
    /// A character that no token of the mode matches.
    Unrecognized,
    And,
    Com,
    CroDigit,
    CroNameStart,
    Dsc,
    Dso,
    Dtgc,
    Dtgo,
    EroNameStart,
    EroGrpo,
    Etago,
    EtagoNameStart,
    EtagoTagc,
    EtagoGrpo,
    Grpc,
    Grpo,
    HcroHexDigit,
    Lit,
    Lita,
    Mdc,
    MdoNameStart,
    MdoMdc,
    MdoCom,
    MdoDso,
    Minus,
    MinusGrpo,
    MscMdc,
    Nestc,
    Net,
    Opt,
    Or,
    Pero,
    PeroNameStart,
    PeroGrpo,
    Pic,
    Pio,
    Plus,
    PlusGrpo,
    Refc,
    Rep,
    Rni,
    Seq,
    Stago,
    StagoNameStart,
    StagoTagc,
    StagoGrpo,
    Tagc,
    Vi,
    Re,
    Rs,
    Space,
    Sepchar,
    S,
    NameStart,
    Digit,
    LcUcNmchar,
    IgnoredChar,
    Char,
    /// A character that would start a delimiter in another mode, recognized as data.
    CharDelim,
    /// The short reference delimiter with this index in the DTD's list.
    Shortref(u16),
}

impl TokenKind {
    /// A short human readable description used in "expected one of" lists.
    pub fn describe(&self, syntax: &Syntax) -> String {
        use DelimGeneral as D;
        use TokenKind::*;
        let delim = |d: D| syntax.describe_delim(d);
        let in_context = |d: D, what: &str| format!["{} followed by {}", delim(d), what];
        match self {
            Ee => "end of entity".into(),
            Unrecognized => "unrecognized character".into(),
            And => delim(D::And),
            Com => delim(D::Com),
            CroDigit => in_context(D::Cro, Set::Digit.name()),
            CroNameStart => in_context(D::Cro, Set::NameStart.name()),
            Dsc => delim(D::Dsc),
            Dso => delim(D::Dso),
            Dtgc => delim(D::Dtgc),
            Dtgo => delim(D::Dtgo),
            EroNameStart => in_context(D::Ero, Set::NameStart.name()),
            EroGrpo => in_context(D::Ero, &delim(D::Grpo)),
            Etago => delim(D::Etago),
            EtagoNameStart => in_context(D::Etago, Set::NameStart.name()),
            EtagoTagc => in_context(D::Etago, &delim(D::Tagc)),
            EtagoGrpo => in_context(D::Etago, &delim(D::Grpo)),
            Grpc => delim(D::Grpc),
            Grpo => delim(D::Grpo),
            HcroHexDigit => in_context(D::Hcro, Set::HexDigit.name()),
            Lit => delim(D::Lit),
            Lita => delim(D::Lita),
            Mdc => delim(D::Mdc),
            MdoNameStart => in_context(D::Mdo, Set::NameStart.name()),
            MdoMdc => in_context(D::Mdo, &delim(D::Mdc)),
            MdoCom => in_context(D::Mdo, &delim(D::Com)),
            MdoDso => in_context(D::Mdo, &delim(D::Dso)),
            Minus => delim(D::Minus),
            MinusGrpo => in_context(D::Minus, &delim(D::Grpo)),
            MscMdc => in_context(D::Msc, &delim(D::Mdc)),
            Nestc => delim(D::Nestc),
            Net => delim(D::Net),
            Opt => delim(D::Opt),
            Or => delim(D::Or),
            Pero => delim(D::Pero),
            PeroNameStart => in_context(D::Pero, Set::NameStart.name()),
            PeroGrpo => in_context(D::Pero, &delim(D::Grpo)),
            Pic => delim(D::Pic),
            Pio => delim(D::Pio),
            Plus => delim(D::Plus),
            PlusGrpo => in_context(D::Plus, &delim(D::Grpo)),
            Refc => delim(D::Refc),
            Rep => delim(D::Rep),
            Rni => delim(D::Rni),
            Seq => delim(D::Seq),
            Stago => delim(D::Stago),
            StagoNameStart => in_context(D::Stago, Set::NameStart.name()),
            StagoTagc => in_context(D::Stago, &delim(D::Tagc)),
            StagoGrpo => in_context(D::Stago, &delim(D::Grpo)),
            Tagc => delim(D::Tagc),
            Vi => delim(D::Vi),
            Re => StandardFunction::Re.name().into(),
            Rs => StandardFunction::Rs.name().into(),
            Space => StandardFunction::Space.name().into(),
            Sepchar => Set::Sepchar.name().into(),
            S => Set::S.name().into(),
            NameStart => Set::NameStart.name().into(),
            Digit => Set::Digit.name().into(),
            LcUcNmchar => Set::Nmchar.name().into(),
            IgnoredChar => "ignored character".into(),
            Char => "data character".into(),
            CharDelim => "delimiter in data".into(),
            Shortref(i) => format!["short reference delimiter {}", i + 1],
        }
    }
}

/// Priority of a token when two tokens end at the same trie node.
///
/// The order, lowest first, is the derive order of the variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Priority {
    /// Plain data characters.
    Data,
    /// Delimiter characters recognized as data, for the data delimiter warning.
    DataDelim,
    /// RE, RS and SPACE.
    Function,
    Shortref,
    /// A bare character class such as separators or name characters.
    Class,
    /// A delimiter followed by a character class.
    DelimClass,
    /// A literal delimiter string.
    Delim,
    EndOfEntity,
}

/// A token: its kind and the range it covers in the active input source's buffer.
///
/// A token never outlives the input source that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub length: usize,
}

impl Token {
    pub(crate) fn end_of_entity(start: usize) -> Token {
        Token {
            kind: TokenKind::Ee,
            start,
            length: 0,
        }
    }

    pub fn is_ee(&self) -> bool {
        self.kind == TokenKind::Ee
    }
}
