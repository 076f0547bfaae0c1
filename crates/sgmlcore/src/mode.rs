//! Lexical modes
//!
//! A mode is a lexical context: inside a tag, inside an attribute value
//!     literal, in mixed content, and so on.
//! The token table below says which tokens each mode recognizes and what
//!     each token is made of.
//! It drives recognizer compilation and the "expected one of" lists in diagnostics.

use crate::syntax::{DelimGeneral, Features, Set, StandardFunction, Syntax};
use crate::token::{Priority, TokenKind};

const USED_IN_SD: u8 = 1;
const USED_IN_PROLOG: u8 = 2;
const USED_IN_INSTANCE: u8 = 4;
const USES_SHORTREFS: u8 = 8;

macro_rules! modes {
    ( $( $(#[$doc: meta])* $variant: ident => ($name: expr, $flags: expr), )+ ) => {
        /// A lexical mode.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum Mode {
            $( $(#[$doc])* $variant, )+
        }

        impl Mode {
            /// All modes, in the order in which buckets are compiled.
            pub const ALL: &'static [Mode] = &[ $( Mode::$variant, )+ ];

            pub fn name(self) -> &'static str {
                match self {
                    $( Mode::$variant => $name, )+
                }
            }

            fn flags(self) -> u8 {
                match self {
                    $( Mode::$variant => $flags, )+
                }
            }
        }
    };
}

modes!(
    /// Model group or name group.
    Grp => ("grp", USED_IN_PROLOG | USED_IN_INSTANCE),
    /// Attribute value literal delimited by LIT.
    Alit => ("alit", USED_IN_PROLOG | USED_IN_INSTANCE),
    Alita => ("alita", USED_IN_PROLOG | USED_IN_INSTANCE),
    /// Attribute value literal, inside an entity referenced from it.
    Alite => ("alite", USED_IN_PROLOG | USED_IN_INSTANCE),
    /// Tokenized attribute value literal.
    Talit => ("talit", USED_IN_PROLOG | USED_IN_INSTANCE),
    Talita => ("talita", USED_IN_PROLOG | USED_IN_INSTANCE),
    Talite => ("talite", USED_IN_PROLOG | USED_IN_INSTANCE),
    /// Markup declaration.
    Md => ("md", USED_IN_PROLOG | USED_IN_INSTANCE),
    MdMinus => ("mdMinus", USED_IN_PROLOG),
    MdPero => ("mdPero", USED_IN_PROLOG),
    /// SGML declaration.
    Sd => ("sd", USED_IN_SD),
    Com => ("com", USED_IN_PROLOG | USED_IN_INSTANCE),
    Sdcom => ("sdcom", USED_IN_SD),
    Pi => ("pi", USED_IN_PROLOG | USED_IN_INSTANCE),
    /// Reference end.
    Ref => ("ref", USED_IN_PROLOG | USED_IN_INSTANCE | USED_IN_SD),
    /// Ignored marked section.
    Ims => ("ims", USED_IN_PROLOG | USED_IN_INSTANCE),
    /// CDATA marked section.
    Cms => ("cms", USED_IN_PROLOG | USED_IN_INSTANCE),
    /// RCDATA marked section.
    Rcms => ("rcms", USED_IN_PROLOG | USED_IN_INSTANCE),
    /// Prolog, before the document type declaration.
    Pro => ("pro", USED_IN_PROLOG),
    /// Declaration subset.
    Ds => ("ds", USED_IN_PROLOG),
    /// Declaration subset, inside an entity.
    Dsi => ("dsi", USED_IN_PROLOG),
    /// Parameter literal.
    Plit => ("plit", USED_IN_PROLOG),
    Plita => ("plita", USED_IN_PROLOG),
    Plite => ("plite", USED_IN_PROLOG),
    Sdplit => ("sdplit", USED_IN_SD),
    Sdplita => ("sdplita", USED_IN_SD),
    /// After a model group, where an occurrence indicator may follow.
    Grpsuf => ("grpsuf", USED_IN_PROLOG),
    /// Minimum literal.
    Mlit => ("mlit", USED_IN_PROLOG | USED_IN_SD),
    Mlita => ("mlita", USED_IN_PROLOG | USED_IN_SD),
    /// Attribute specification list in a declaration.
    As => ("as", USED_IN_PROLOG),
    PiPas => ("piPas", USED_IN_PROLOG),
    /// System identifier literal.
    Slit => ("slit", USED_IN_PROLOG),
    Slita => ("slita", USED_IN_PROLOG),
    Sdslit => ("sdslit", USED_IN_SD),
    Sdslita => ("sdslita", USED_IN_SD),
    /// CDATA content.
    Ccon => ("ccon", USED_IN_INSTANCE),
    /// RCDATA content.
    Rccon => ("rccon", USED_IN_INSTANCE),
    Cconnet => ("cconnet", USED_IN_INSTANCE),
    Rcconnet => ("rcconnet", USED_IN_INSTANCE),
    /// RCDATA content, inside an entity.
    Rccone => ("rccone", USED_IN_INSTANCE),
    Tag => ("tag", USED_IN_INSTANCE),
    /// Element content.
    Econ => ("econ", USED_IN_INSTANCE | USES_SHORTREFS),
    /// Mixed content.
    Mcon => ("mcon", USED_IN_INSTANCE | USES_SHORTREFS),
    Econnet => ("econnet", USED_IN_INSTANCE | USES_SHORTREFS),
    Mconnet => ("mconnet", USED_IN_INSTANCE | USES_SHORTREFS),
);

impl Mode {
    pub fn used_in_sd(self) -> bool {
        self.flags() & USED_IN_SD != 0
    }

    pub fn used_in_prolog(self) -> bool {
        self.flags() & USED_IN_PROLOG != 0
    }

    pub fn used_in_instance(self) -> bool {
        self.flags() & USED_IN_INSTANCE != 0
    }

    /// Whether short reference delimiters are recognized in the mode.
    pub fn uses_shortrefs(self) -> bool {
        self.flags() & USES_SHORTREFS != 0
    }

    /// The mode to scan an entity in when it is referenced from this mode.
    ///
    /// Literals and declaration subsets have separate modes inside entities,
    ///     because the closing delimiter is not recognized there.
    pub fn in_entity(self) -> Mode {
        match self {
            Mode::Alit | Mode::Alita => Mode::Alite,
            Mode::Talit | Mode::Talita => Mode::Talite,
            Mode::Plit | Mode::Plita => Mode::Plite,
            Mode::Ds => Mode::Dsi,
            Mode::Rccon | Mode::Rcconnet => Mode::Rccone,
            mode => mode,
        }
    }

    /// Whether character data is recognized in the mode; used to decide where
    ///     delimiters recognized as data are worth a warning.
    pub fn warns_data_delim(self) -> bool {
        self.uses_shortrefs()
            || matches!(
                self,
                Mode::Alit | Mode::Alita | Mode::Alite | Mode::Talit | Mode::Talita | Mode::Talite
            )
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A batch of modes compiled together over one partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModeBucket {
    /// Modes of the SGML declaration, compiled with the reference syntax.
    Sd,
    /// Modes of the prolog, compiled once the SGML declaration is known.
    Prolog,
    /// Content modes, compiled once the DTD and its short references are known.
    Instance,
}

impl ModeBucket {
    /// The modes in the bucket.
    ///
    /// When the syntax has short references and is not scope-instance the
    ///     prolog bucket covers every mode that does not use short references,
    ///     and the instance bucket only the ones that do.
    pub fn modes(self, syntax: &Syntax, features: &Features) -> Vec<Mode> {
        let filter: fn(Mode, bool, bool) -> bool = match self {
            ModeBucket::Sd => |mode, _, _| mode.used_in_sd(),
            ModeBucket::Prolog => |mode, scope_instance, has_shortrefs| {
                if scope_instance {
                    mode.used_in_prolog()
                } else if has_shortrefs {
                    (mode.used_in_prolog() || mode.used_in_instance()) && !mode.uses_shortrefs()
                } else {
                    mode.used_in_prolog() || mode.used_in_instance()
                }
            },
            ModeBucket::Instance => |mode, scope_instance, has_shortrefs| {
                if scope_instance {
                    mode.used_in_instance()
                } else if has_shortrefs {
                    mode.uses_shortrefs()
                } else {
                    false
                }
            },
        };
        Mode::ALL
            .iter()
            .copied()
            .filter(|&mode| filter(mode, features.scope_instance, syntax.has_shortrefs()))
            .collect()
    }
}

/// A SGML declaration feature a token depends on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Requirement {
    Always,
    EmptyStartTag,
    EmptyEndTag,
    Concur,
    LinkOrConcur,
    NotKeepRsRe,
}

impl Requirement {
    fn is_met(self, features: &Features) -> bool {
        match self {
            Requirement::Always => true,
            Requirement::EmptyStartTag => features.empty_start_tag,
            Requirement::EmptyEndTag => features.empty_end_tag,
            Requirement::Concur => features.concur,
            Requirement::LinkOrConcur => features.link || features.concur,
            Requirement::NotKeepRsRe => !features.keep_rs_re,
        }
    }
}

/// What a token is made of.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Contents {
    Delim(DelimGeneral),
    /// Two delimiters in sequence; both are part of the token.
    DelimDelim(DelimGeneral, DelimGeneral),
    /// A delimiter followed by a character of a set; only the delimiter is
    ///     part of the token.
    DelimSet(DelimGeneral, Set),
    Set(Set),
    Function(StandardFunction),
}

/// One token of a mode, as produced by [tokens].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenInfo {
    pub token: TokenKind,
    pub contents: Contents,
    pub priority: Priority,
}

struct Row {
    token: TokenKind,
    requirement: Requirement,
    contents: Contents,
    modes: &'static [Mode],
}

use DelimGeneral as D;
use Mode as M;
use TokenKind as T;

const CHAR_REF_MODES: &[Mode] = &[
    M::Econ, M::Mcon, M::Rccon, M::Econnet, M::Mconnet, M::Rcconnet, M::Rccone,
    M::Plit, M::Plita, M::Plite, M::Sdplit, M::Sdplita,
    M::Alit, M::Alita, M::Alite, M::Talit, M::Talita, M::Talite, M::Rcms,
];
const HEX_CHAR_REF_MODES: &[Mode] = &[
    M::Econ, M::Mcon, M::Rccon, M::Econnet, M::Mconnet, M::Rcconnet, M::Rccone,
    M::Plit, M::Plita, M::Plite,
    M::Alit, M::Alita, M::Alite, M::Talit, M::Talita, M::Talite, M::Rcms,
];
const ENTITY_REF_MODES: &[Mode] = &[
    M::Econ, M::Mcon, M::Rccon, M::Econnet, M::Mconnet, M::Rcconnet, M::Rccone,
    M::Alit, M::Alita, M::Alite, M::Talit, M::Talita, M::Talite, M::Rcms,
];
const END_TAG_MODES: &[Mode] = &[
    M::Econ, M::Mcon, M::Ccon, M::Rccon, M::Econnet, M::Mconnet, M::Cconnet, M::Rcconnet,
];
const START_TAG_MODES: &[Mode] = &[M::Econ, M::Mcon, M::Econnet, M::Mconnet];
const DECLARATION_MODES: &[Mode] = &[
    M::Econ, M::Mcon, M::Econnet, M::Mconnet, M::Pro, M::Ds, M::Dsi,
];
const PARAMETER_REF_MODES: &[Mode] = &[
    M::Md, M::MdMinus, M::MdPero, M::Ds, M::Dsi, M::Grp,
    M::Plit, M::Plita, M::Plite, M::Sdplit, M::Sdplita,
];
const RECORD_MODES: &[Mode] = &[
    M::Mcon, M::Ccon, M::Rccon, M::Mconnet, M::Cconnet, M::Rcconnet, M::Rccone, M::Cms, M::Rcms,
];
const NET_MODES: &[Mode] = &[M::Econnet, M::Mconnet, M::Cconnet, M::Rcconnet];

macro_rules! row {
    ($token: expr, $contents: expr, $modes: expr) => {
        row!($token, Always, $contents, $modes)
    };
    ($token: expr, $requirement: ident, $contents: expr, $modes: expr) => {
        Row {
            token: $token,
            requirement: Requirement::$requirement,
            contents: $contents,
            modes: $modes,
        }
    };
}

static TOKEN_TABLE: &[Row] = &[
    // Delimiters and delimiters in context.
    row!(T::And, Contents::Delim(D::And), &[M::Grp]),
    row!(
        T::Com,
        Contents::Delim(D::Com),
        &[M::Md, M::MdMinus, M::MdPero, M::Sd, M::Com, M::Sdcom, M::PiPas]
    ),
    row!(T::CroDigit, Contents::DelimSet(D::Cro, Set::Digit), CHAR_REF_MODES),
    row!(T::CroNameStart, Contents::DelimSet(D::Cro, Set::NameStart), CHAR_REF_MODES),
    row!(T::Dsc, Contents::Delim(D::Dsc), &[M::As, M::Ds]),
    row!(T::Dso, Contents::Delim(D::Dso), &[M::Md]),
    row!(T::Dtgc, Contents::Delim(D::Dtgc), &[M::Grp]),
    row!(T::Dtgo, Contents::Delim(D::Dtgo), &[M::Grp]),
    row!(T::EroNameStart, Contents::DelimSet(D::Ero, Set::NameStart), ENTITY_REF_MODES),
    row!(T::EroGrpo, LinkOrConcur, Contents::DelimDelim(D::Ero, D::Grpo), ENTITY_REF_MODES),
    row!(T::Etago, Contents::Delim(D::Etago), &[M::Tag]),
    row!(T::EtagoNameStart, Contents::DelimSet(D::Etago, Set::NameStart), END_TAG_MODES),
    row!(T::EtagoTagc, EmptyEndTag, Contents::DelimDelim(D::Etago, D::Tagc), END_TAG_MODES),
    row!(T::EtagoGrpo, Concur, Contents::DelimDelim(D::Etago, D::Grpo), END_TAG_MODES),
    row!(T::Grpc, Contents::Delim(D::Grpc), &[M::Grp]),
    row!(T::Grpo, Contents::Delim(D::Grpo), &[M::Md, M::MdMinus, M::Grp]),
    row!(T::HcroHexDigit, Contents::DelimSet(D::Hcro, Set::HexDigit), HEX_CHAR_REF_MODES),
    row!(
        T::Lit,
        Contents::Delim(D::Lit),
        &[
            M::Alit, M::Talit, M::Plit, M::Sdplit, M::Mlit, M::Slit, M::Sdslit,
            M::As, M::PiPas, M::Tag, M::Md, M::Sd, M::Grp,
        ]
    ),
    row!(
        T::Lita,
        Contents::Delim(D::Lita),
        &[
            M::Alita, M::Talita, M::Plita, M::Sdplita, M::Mlita, M::Slita, M::Sdslita,
            M::As, M::PiPas, M::Tag, M::Md, M::Sd, M::Grp,
        ]
    ),
    row!(T::Mdc, Contents::Delim(D::Mdc), &[M::Md, M::Sd]),
    row!(T::MdoNameStart, Contents::DelimSet(D::Mdo, Set::NameStart), DECLARATION_MODES),
    row!(T::MdoMdc, Contents::DelimDelim(D::Mdo, D::Mdc), DECLARATION_MODES),
    row!(T::MdoCom, Contents::DelimDelim(D::Mdo, D::Com), DECLARATION_MODES),
    row!(
        T::MdoDso,
        Contents::DelimDelim(D::Mdo, D::Dso),
        &[M::Econ, M::Mcon, M::Econnet, M::Mconnet, M::Ds, M::Dsi, M::Ims]
    ),
    row!(T::Minus, Contents::Delim(D::Minus), &[M::MdMinus, M::Sd]),
    row!(T::MinusGrpo, Contents::DelimDelim(D::Minus, D::Grpo), &[M::Md]),
    row!(
        T::MscMdc,
        Contents::DelimDelim(D::Msc, D::Mdc),
        &[
            M::Ims, M::Cms, M::Rcms, M::Econ, M::Mcon, M::Econnet, M::Mconnet, M::Ds, M::Dsi,
        ]
    ),
    row!(T::Nestc, Contents::Delim(D::Nestc), &[M::Tag]),
    row!(T::Net, Contents::Delim(D::Net), NET_MODES),
    row!(T::Opt, Contents::Delim(D::Opt), &[M::Grp, M::Grpsuf]),
    row!(T::Or, Contents::Delim(D::Or), &[M::Grp]),
    row!(T::Pero, Contents::Delim(D::Pero), &[M::MdPero]),
    row!(T::PeroNameStart, Contents::DelimSet(D::Pero, Set::NameStart), PARAMETER_REF_MODES),
    row!(T::PeroGrpo, LinkOrConcur, Contents::DelimDelim(D::Pero, D::Grpo), PARAMETER_REF_MODES),
    row!(T::Pic, Contents::Delim(D::Pic), &[M::Pi]),
    row!(T::Pio, Contents::Delim(D::Pio), DECLARATION_MODES),
    row!(T::Plus, Contents::Delim(D::Plus), &[M::Grp, M::Grpsuf]),
    row!(T::PlusGrpo, Contents::DelimDelim(D::Plus, D::Grpo), &[M::Md]),
    row!(T::Refc, Contents::Delim(D::Refc), &[M::Ref]),
    row!(T::Rep, Contents::Delim(D::Rep), &[M::Grp, M::Grpsuf]),
    row!(T::Rni, Contents::Delim(D::Rni), &[M::Grp, M::Md, M::MdPero]),
    row!(T::Seq, Contents::Delim(D::Seq), &[M::Grp]),
    row!(T::Stago, Contents::Delim(D::Stago), &[M::Tag]),
    row!(T::StagoNameStart, Contents::DelimSet(D::Stago, Set::NameStart), START_TAG_MODES),
    row!(T::StagoTagc, EmptyStartTag, Contents::DelimDelim(D::Stago, D::Tagc), START_TAG_MODES),
    row!(T::StagoGrpo, Concur, Contents::DelimDelim(D::Stago, D::Grpo), START_TAG_MODES),
    row!(T::Tagc, Contents::Delim(D::Tagc), &[M::Tag]),
    row!(T::Vi, Contents::Delim(D::Vi), &[M::Tag, M::As, M::PiPas]),
    // Function characters and character classes.
    row!(T::Re, NotKeepRsRe, Contents::Function(StandardFunction::Re), RECORD_MODES),
    row!(
        T::Re,
        Contents::Function(StandardFunction::Re),
        &[
            M::Ref, M::Mlit, M::Mlita, M::Alit, M::Alita, M::Alite, M::Talit, M::Talita, M::Talite,
        ]
    ),
    row!(T::Rs, NotKeepRsRe, Contents::Function(StandardFunction::Rs), RECORD_MODES),
    row!(
        T::Rs,
        Contents::Function(StandardFunction::Rs),
        &[M::Mlit, M::Mlita, M::Alit, M::Alita, M::Alite, M::Talit, M::Talita, M::Talite]
    ),
    row!(
        T::Space,
        Contents::Function(StandardFunction::Space),
        &[M::Mlit, M::Mlita, M::Talit, M::Talita, M::Talite]
    ),
    row!(
        T::Sepchar,
        Contents::Set(Set::Sepchar),
        &[M::Alit, M::Alita, M::Alite, M::Talit, M::Talita, M::Talite]
    ),
    row!(
        T::S,
        Contents::Set(Set::S),
        &[
            M::Econ, M::Econnet, M::Grp, M::Md, M::MdMinus, M::MdPero, M::Sd,
            M::Pro, M::Ds, M::Dsi, M::As, M::PiPas, M::Tag,
        ]
    ),
    row!(
        T::NameStart,
        Contents::Set(Set::NameStart),
        &[M::Grp, M::Md, M::MdMinus, M::MdPero, M::Sd, M::As, M::PiPas, M::Tag]
    ),
    row!(
        T::Digit,
        Contents::Set(Set::Digit),
        &[M::Grp, M::Md, M::MdMinus, M::Sd, M::As, M::PiPas, M::Tag]
    ),
    row!(
        T::LcUcNmchar,
        Contents::Set(Set::Nmchar),
        &[M::Grp, M::Md, M::As, M::PiPas, M::Tag]
    ),
    row!(T::IgnoredChar, Contents::Set(Set::SgmlChar), &[M::Ims]),
    // Character data is recognized in element content too; it starts #PCDATA.
    row!(
        T::Char,
        Contents::Set(Set::SgmlChar),
        &[
            M::Alit, M::Alita, M::Alite, M::Talit, M::Talita, M::Talite,
            M::Com, M::Pi, M::Cms, M::Rcms, M::Plit, M::Plita, M::Plite, M::Slit, M::Slita,
            M::Econ, M::Mcon, M::Ccon, M::Rccon,
            M::Econnet, M::Mconnet, M::Cconnet, M::Rcconnet, M::Rccone,
        ]
    ),
    row!(T::Char, Contents::Set(Set::MinimumData), &[M::Mlit, M::Mlita]),
    row!(
        T::Char,
        Contents::Set(Set::Significant),
        &[M::Sdplit, M::Sdplita, M::Sdslit, M::Sdslita, M::Sdcom]
    ),
];

fn priority(token: TokenKind, contents: Contents) -> Priority {
    match contents {
        Contents::Delim(_) | Contents::DelimDelim(_, _) => Priority::Delim,
        Contents::DelimSet(_, _) => Priority::DelimClass,
        Contents::Function(_) => Priority::Function,
        Contents::Set(_) => match token {
            TokenKind::Char | TokenKind::IgnoredChar => Priority::Data,
            _ => Priority::Class,
        },
    }
}

/// The tokens recognized in a mode, given the declaration's features.
pub fn tokens(mode: Mode, features: &Features) -> impl Iterator<Item = TokenInfo> + '_ {
    TOKEN_TABLE
        .iter()
        .filter(move |row| row.modes.contains(&mode) && row.requirement.is_met(features))
        .map(|row| TokenInfo {
            token: row.token,
            contents: row.contents,
            priority: priority(row.token, row.contents),
        })
}

/// Descriptions of the tokens recognized in a mode, for "expected one of" lists.
///
/// Short references are listed as one entry.
pub fn expected_tokens(mode: Mode, syntax: &Syntax, features: &Features) -> Vec<String> {
    let mut expected: Vec<String> = vec![];
    for info in tokens(mode, features) {
        let description = info.token.describe(syntax);
        if !expected.contains(&description) {
            expected.push(description);
        }
    }
    if mode.uses_shortrefs() {
        expected.push("short reference delimiter".into());
    }
    expected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chars::IdentityCharset;

    #[test]
    fn mode_count() {
        assert_eq!(Mode::ALL.len(), 45);
    }

    #[test]
    fn features_gate_tokens() {
        let has = |features: &Features, token: TokenKind| {
            tokens(Mode::Mcon, features).any(|info| info.token == token)
        };
        let mut features = Features::default();
        assert!(!has(&features, TokenKind::StagoTagc));
        assert!(!has(&features, TokenKind::EroGrpo));
        assert!(has(&features, TokenKind::Re));
        features.empty_start_tag = true;
        features.link = true;
        features.keep_rs_re = true;
        assert!(has(&features, TokenKind::StagoTagc));
        assert!(has(&features, TokenKind::EroGrpo));
        assert!(!has(&features, TokenKind::StagoGrpo));
        assert!(!has(&features, TokenKind::Re));
    }

    #[test]
    fn record_ends_in_literals_ignore_keep_rs_re() {
        let features = Features {
            keep_rs_re: true,
            ..Default::default()
        };
        assert!(tokens(Mode::Alit, &features).any(|info| info.token == TokenKind::Re));
    }

    #[test]
    fn priorities() {
        let features = Features::default();
        let of = |mode: Mode, token: TokenKind| {
            tokens(mode, &features)
                .find(|info| info.token == token)
                .unwrap()
                .priority
        };
        assert_eq!(of(Mode::Mcon, TokenKind::Char), Priority::Data);
        assert_eq!(of(Mode::Econ, TokenKind::S), Priority::Class);
        assert_eq!(of(Mode::Mcon, TokenKind::MdoCom), Priority::Delim);
        assert_eq!(of(Mode::Mcon, TokenKind::EroNameStart), Priority::DelimClass);
        assert_eq!(of(Mode::Mcon, TokenKind::Re), Priority::Function);
    }

    fn bucket(bucket: ModeBucket, scope_instance: bool, has_shortrefs: bool) -> Vec<Mode> {
        let mut syntax = Syntax::reference(&IdentityCharset);
        syntax.set_has_shortrefs(has_shortrefs);
        let features = Features {
            scope_instance,
            ..Default::default()
        };
        bucket.modes(&syntax, &features)
    }

    #[test]
    fn buckets_with_shortrefs() {
        let prolog = bucket(ModeBucket::Prolog, false, true);
        let instance = bucket(ModeBucket::Instance, false, true);
        assert!(prolog.contains(&Mode::Tag));
        assert!(!prolog.contains(&Mode::Mcon));
        assert_eq!(instance, vec![Mode::Econ, Mode::Mcon, Mode::Econnet, Mode::Mconnet]);
        assert!(!prolog.contains(&Mode::Sd));
    }

    #[test]
    fn buckets_without_shortrefs() {
        assert!(bucket(ModeBucket::Prolog, false, false).contains(&Mode::Mcon));
        assert!(bucket(ModeBucket::Instance, false, false).is_empty());
    }

    #[test]
    fn buckets_scope_instance() {
        let prolog = bucket(ModeBucket::Prolog, true, true);
        let instance = bucket(ModeBucket::Instance, true, true);
        assert!(!prolog.contains(&Mode::Tag));
        assert!(prolog.contains(&Mode::Md));
        assert!(instance.contains(&Mode::Tag));
        assert!(instance.contains(&Mode::Md));
        assert!(!instance.contains(&Mode::Ds));
    }

    #[test]
    fn sd_bucket() {
        let sd = bucket(ModeBucket::Sd, false, true);
        assert_eq!(
            sd,
            vec![
                Mode::Sd, Mode::Sdcom, Mode::Ref, Mode::Sdplit, Mode::Sdplita,
                Mode::Mlit, Mode::Mlita, Mode::Sdslit, Mode::Sdslita,
            ]
        );
    }

    #[test]
    fn in_entity() {
        assert_eq!(Mode::Alita.in_entity(), Mode::Alite);
        assert_eq!(Mode::Ds.in_entity(), Mode::Dsi);
        assert_eq!(Mode::Rcconnet.in_entity(), Mode::Rccone);
        assert_eq!(Mode::Mcon.in_entity(), Mode::Mcon);
    }

    #[test]
    fn expected_tokens_lists_delimiters() {
        let syntax = Syntax::reference(&IdentityCharset);
        let expected = expected_tokens(Mode::Ref, &syntax, &Features::default());
        assert_eq!(expected, vec!["REFC (\";\")".to_string(), "RE".to_string()]);
    }
}
