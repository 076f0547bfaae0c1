//! Concrete syntax
//!
//! A [Syntax] is everything an SGML declaration can change about how a document
//!     is tokenized: the general delimiters, the character classes, the function
//!     characters and the quantities.
//! The scanner never hard-codes any of these; recognizers are compiled from
//!     whichever syntax is current.

use crate::chars::{self, Char, CharsetInfo, CHAR_MAX};
use sgml_stdext::collections::rangeset::RangeSet;
use std::sync::atomic::{AtomicU64, Ordering};

macro_rules! named_enum {
    (
        $( #[$meta: meta] )*
        $name: ident { $( $variant: ident => $text: expr, )+ }
    ) => {
        $( #[$meta] )*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum $name {
            $( $variant, )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[ $( $name::$variant, )+ ];

            /// The name used for this value in SGML declarations and diagnostics.
            pub fn name(self) -> &'static str {
                match self {
                    $( $name::$variant => $text, )+
                }
            }

            pub fn index(self) -> usize {
                self as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.name())
            }
        }
    };
}

named_enum!(
    /// A general delimiter role.
    DelimGeneral {
        And => "AND",
        Com => "COM",
        Cro => "CRO",
        Dsc => "DSC",
        Dso => "DSO",
        Dtgc => "DTGC",
        Dtgo => "DTGO",
        Ero => "ERO",
        Etago => "ETAGO",
        Grpc => "GRPC",
        Grpo => "GRPO",
        Hcro => "HCRO",
        Lit => "LIT",
        Lita => "LITA",
        Mdc => "MDC",
        Mdo => "MDO",
        Minus => "MINUS",
        Msc => "MSC",
        Net => "NET",
        Nestc => "NESTC",
        Opt => "OPT",
        Or => "OR",
        Pero => "PERO",
        Pic => "PIC",
        Pio => "PIO",
        Plus => "PLUS",
        Refc => "REFC",
        Rep => "REP",
        Rni => "RNI",
        Seq => "SEQ",
        Stago => "STAGO",
        Tagc => "TAGC",
        Vi => "VI",
    }
);

named_enum!(
    /// A character class.
    Set {
        NameStart => "name start character",
        Digit => "digit",
        HexDigit => "hexadecimal digit",
        Nmchar => "name character",
        S => "separator",
        Blank => "blank",
        Sepchar => "separator character",
        MinimumData => "minimum data character",
        Significant => "significant character",
        FunctionChar => "function character",
        SgmlChar => "SGML character",
    }
);

named_enum!(
    /// The three function characters every syntax has.
    StandardFunction {
        Re => "RE",
        Rs => "RS",
        Space => "SPACE",
    }
);

named_enum!(
    /// A capacity-like limit of the concrete syntax.
    Quantity {
        Attcnt => "ATTCNT",
        Attsplen => "ATTSPLEN",
        Bseqlen => "BSEQLEN",
        Dtaglen => "DTAGLEN",
        Dtemplen => "DTEMPLEN",
        Entlvl => "ENTLVL",
        Grpcnt => "GRPCNT",
        Grpgtcnt => "GRPGTCNT",
        Grplvl => "GRPLVL",
        Litlen => "LITLEN",
        Namelen => "NAMELEN",
        Normsep => "NORMSEP",
        Pilen => "PILEN",
        Taglen => "TAGLEN",
        Taglvl => "TAGLVL",
    }
);

impl Quantity {
    /// The value of the quantity in the reference quantity set.
    pub fn reference_value(self) -> u32 {
        match self {
            Quantity::Attcnt => 40,
            Quantity::Attsplen => 960,
            Quantity::Bseqlen => 960,
            Quantity::Dtaglen => 16,
            Quantity::Dtemplen => 16,
            Quantity::Entlvl => 16,
            Quantity::Grpcnt => 32,
            Quantity::Grpgtcnt => 96,
            Quantity::Grplvl => 16,
            Quantity::Litlen => 240,
            Quantity::Namelen => 8,
            Quantity::Normsep => 2,
            Quantity::Pilen => 240,
            Quantity::Taglen => 960,
            Quantity::Taglvl => 24,
        }
    }
}

/// How an added function character behaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FunctionClass {
    /// An inert function character.
    Funchar,
    /// A separator character, such as TAB in the reference syntax.
    Sepchar,
}

/// Identifier of one state of a [Syntax].
///
/// Every syntax gets a fresh version when it is built and every time it is modified.
/// Recognizers compiled for one version are never used with another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SyntaxVersion(u64);

static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

impl SyntaxVersion {
    fn next() -> SyntaxVersion {
        SyntaxVersion(NEXT_VERSION.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SyntaxVersion {
    fn default() -> Self {
        SyntaxVersion::next()
    }
}

/// A character substitution, used for NAMECASE GENERAL case folding.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubstTable {
    // Sorted by source character.
    pairs: Vec<(Char, Char)>,
}

impl SubstTable {
    pub fn add(&mut self, from: Char, to: Char) {
        match self.pairs.binary_search_by_key(&from, |&(f, _)| f) {
            Ok(i) => self.pairs[i].1 = to,
            Err(i) => self.pairs.insert(i, (from, to)),
        }
    }

    pub fn subst(&self, c: Char) -> Char {
        match self.pairs.binary_search_by_key(&c, |&(f, _)| f) {
            Ok(i) => self.pairs[i].1,
            Err(_) => c,
        }
    }

    /// All characters other than `c` that are substituted by `c`.
    pub fn inverse(&self, c: Char) -> Vec<Char> {
        self.pairs
            .iter()
            .filter(|&&(from, to)| to == c && from != c)
            .map(|&(from, _)| from)
            .collect()
    }

    pub fn subst_all(&self, chars: &[Char]) -> Vec<Char> {
        chars.iter().map(|&c| self.subst(c)).collect()
    }
}

/// Switches from the SGML declaration that change which tokens a mode recognizes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Features {
    pub empty_start_tag: bool,
    pub empty_end_tag: bool,
    pub concur: bool,
    pub link: bool,
    pub keep_rs_re: bool,
    /// The document syntax applies only to the instance; the prolog uses the reference syntax.
    pub scope_instance: bool,
}

/// A concrete syntax.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Syntax {
    delims: Vec<Vec<Char>>,
    sets: Vec<RangeSet>,
    standard_functions: [Option<Char>; 3],
    functions: Vec<(Vec<Char>, Char)>,
    extra_name_chars: RangeSet,
    quantities: Vec<u32>,
    namecase_general: bool,
    upper_subst: SubstTable,
    identity_subst: SubstTable,
    has_shortrefs: bool,
    b_char: Char,
    // Weight of each digit and hexadecimal letter.
    digit_weights: Vec<(Char, u32)>,
    #[cfg_attr(feature = "serde", serde(skip))]
    version: SyntaxVersion,
}

impl Syntax {
    /// Build the reference concrete syntax, with the reference quantity set,
    ///     TAB as a separator character and `NAMECASE GENERAL YES`.
    pub fn reference(charset: &dyn CharsetInfo) -> Syntax {
        let c = |ch: char| charset.exec_to_internal(ch);
        let mut sets = vec![RangeSet::new(); Set::ALL.len()];
        let mut upper_subst = SubstTable::default();
        for (lc, uc) in ('a'..='z').zip('A'..='Z') {
            let (lc, uc) = (c(lc), c(uc));
            for set in [Set::NameStart, Set::MinimumData] {
                sets[set.index()].add(lc);
                sets[set.index()].add(uc);
            }
            upper_subst.add(lc, uc);
        }
        let mut digit_weights = vec![];
        for (weight, (lc, uc)) in ('a'..='f').zip('A'..='F').enumerate() {
            for ch in [lc, uc] {
                sets[Set::HexDigit.index()].add(c(ch));
                digit_weights.push((c(ch), 10 + weight as u32));
            }
        }
        for (weight, ch) in ('0'..='9').enumerate() {
            for set in [Set::Digit, Set::HexDigit, Set::MinimumData] {
                sets[set.index()].add(c(ch));
            }
            digit_weights.push((c(ch), weight as u32));
        }
        for ch in "'()+,-./:=?".chars() {
            sets[Set::MinimumData.index()].add(c(ch));
        }
        sets[Set::SgmlChar.index()] = RangeSet::from_ranges([
            (9, 10),
            (13, 13),
            (32, 126),
            (160, 0xD7FF),
            (0xE000, CHAR_MAX),
        ]);
        let mut syntax = Syntax {
            delims: vec![vec![]; DelimGeneral::ALL.len()],
            sets,
            standard_functions: [None; 3],
            functions: vec![],
            extra_name_chars: RangeSet::new(),
            quantities: Quantity::ALL.iter().map(|q| q.reference_value()).collect(),
            namecase_general: true,
            upper_subst,
            identity_subst: SubstTable::default(),
            has_shortrefs: true,
            b_char: c('B'),
            digit_weights,
            version: SyntaxVersion::next(),
        };
        syntax.set_standard_function(StandardFunction::Re, 13);
        syntax.set_standard_function(StandardFunction::Rs, 10);
        syntax.set_standard_function(StandardFunction::Space, 32);
        syntax.add_function_char(&charset.exec_str_to_internal("TAB"), FunctionClass::Sepchar, 9);
        syntax.add_name_chars(&RangeSet::from_iter([c('-'), c('.')]));
        for (delim, text) in [
            (DelimGeneral::And, "&"),
            (DelimGeneral::Com, "--"),
            (DelimGeneral::Cro, "&#"),
            (DelimGeneral::Dsc, "]"),
            (DelimGeneral::Dso, "["),
            (DelimGeneral::Dtgc, "]"),
            (DelimGeneral::Dtgo, "["),
            (DelimGeneral::Ero, "&"),
            (DelimGeneral::Etago, "</"),
            (DelimGeneral::Grpc, ")"),
            (DelimGeneral::Grpo, "("),
            (DelimGeneral::Hcro, "&#x"),
            (DelimGeneral::Lit, "\""),
            (DelimGeneral::Lita, "'"),
            (DelimGeneral::Mdc, ">"),
            (DelimGeneral::Mdo, "<!"),
            (DelimGeneral::Minus, "-"),
            (DelimGeneral::Msc, "]]"),
            (DelimGeneral::Net, "/"),
            (DelimGeneral::Nestc, "/"),
            (DelimGeneral::Opt, "?"),
            (DelimGeneral::Or, "|"),
            (DelimGeneral::Pero, "%"),
            (DelimGeneral::Pic, ">"),
            (DelimGeneral::Pio, "<?"),
            (DelimGeneral::Plus, "+"),
            (DelimGeneral::Refc, ";"),
            (DelimGeneral::Rep, "*"),
            (DelimGeneral::Rni, "#"),
            (DelimGeneral::Seq, ","),
            (DelimGeneral::Stago, "<"),
            (DelimGeneral::Tagc, ">"),
            (DelimGeneral::Vi, "="),
        ] {
            syntax.set_delim(delim, &charset.exec_str_to_internal(text));
        }
        syntax
    }

    pub fn version(&self) -> SyntaxVersion {
        self.version
    }

    fn touch(&mut self) {
        self.version = SyntaxVersion::next();
    }

    pub fn delim(&self, delim: DelimGeneral) -> &[Char] {
        &self.delims[delim.index()]
    }

    /// Set a general delimiter. An empty string is accepted and skipped at compile time.
    pub fn set_delim(&mut self, delim: DelimGeneral, text: &[Char]) {
        let text = self.general_subst().subst_all(text);
        for &c in &text {
            self.sets[Set::Significant.index()].add(c);
        }
        self.delims[delim.index()] = text;
        self.touch();
    }

    pub fn set(&self, set: Set) -> &RangeSet {
        &self.sets[set.index()]
    }

    pub fn standard_function(&self, function: StandardFunction) -> Option<Char> {
        self.standard_functions[function.index()]
    }

    pub fn set_standard_function(&mut self, function: StandardFunction, c: Char) {
        self.standard_functions[function.index()] = Some(c);
        for set in [Set::MinimumData, Set::S, Set::FunctionChar, Set::Significant] {
            self.sets[set.index()].add(c);
        }
        if function == StandardFunction::Space {
            self.sets[Set::Blank.index()].add(c);
        }
        self.touch();
    }

    /// Declare an additional named function character, as in the FUNCTION
    ///     section of an SGML declaration.
    pub fn add_function_char(&mut self, name: &[Char], class: FunctionClass, c: Char) {
        if class == FunctionClass::Sepchar {
            for set in [Set::S, Set::Blank, Set::Sepchar] {
                self.sets[set.index()].add(c);
            }
        }
        self.sets[Set::FunctionChar.index()].add(c);
        self.sets[Set::Significant.index()].add(c);
        let name = self.upper_subst.subst_all(name);
        self.functions.retain(|(n, _)| *n != name);
        self.functions.push((name, c));
        self.touch();
    }

    /// Look up a function character by name, as used in a named character reference.
    ///
    /// Names are folded to upper case when `NAMECASE GENERAL` is set.
    pub fn function_char(&self, name: &[Char]) -> Option<Char> {
        let name = self.general_subst().subst_all(name);
        for function in StandardFunction::ALL {
            if let Some(c) = self.standard_function(*function) {
                let function_name: Vec<Char> = chars::to_chars(function.name());
                if function_name == name {
                    return Some(c);
                }
            }
        }
        self.functions
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, c)| c)
    }

    /// Add characters to the name character class (LCNMCHAR and UCNMCHAR).
    pub fn add_name_chars(&mut self, chars: &RangeSet) {
        self.extra_name_chars = self.extra_name_chars.union(chars);
        for set in [Set::Nmchar, Set::Significant] {
            self.sets[set.index()] = self.sets[set.index()].union(chars);
        }
        self.touch();
    }

    /// Add characters to the name start character class.
    pub fn add_name_start_chars(&mut self, chars: &RangeSet) {
        for set in [Set::NameStart, Set::Significant] {
            self.sets[set.index()] = self.sets[set.index()].union(chars);
        }
        self.touch();
    }

    /// Replace the SGML character class, for example after declaring shunned characters.
    pub fn set_sgml_chars(&mut self, chars: RangeSet) {
        self.sets[Set::SgmlChar.index()] = chars;
        self.touch();
    }

    pub fn is_name_start(&self, c: Char) -> bool {
        self.set(Set::NameStart).contains(c)
    }

    /// Whether the character can continue a name.
    pub fn is_name_char(&self, c: Char) -> bool {
        self.set(Set::NameStart).contains(c)
            || self.set(Set::Digit).contains(c)
            || self.set(Set::Nmchar).contains(c)
    }

    pub fn quantity(&self, quantity: Quantity) -> u32 {
        self.quantities[quantity.index()]
    }

    pub fn set_quantity(&mut self, quantity: Quantity, value: u32) {
        self.quantities[quantity.index()] = value;
        self.touch();
    }

    pub fn namecase_general(&self) -> bool {
        self.namecase_general
    }

    pub fn set_namecase_general(&mut self, b: bool) {
        self.namecase_general = b;
        self.touch();
    }

    /// The substitution applied to names and delimiters.
    pub fn general_subst(&self) -> &SubstTable {
        if self.namecase_general {
            &self.upper_subst
        } else {
            &self.identity_subst
        }
    }

    /// Whether the syntax declares any short reference delimiters.
    pub fn has_shortrefs(&self) -> bool {
        self.has_shortrefs
    }

    pub fn set_has_shortrefs(&mut self, b: bool) {
        self.has_shortrefs = b;
        self.touch();
    }

    /// The internal character used for the blank-sequence letter `B` in short references.
    pub fn b_char(&self) -> Char {
        self.b_char
    }

    /// The value of a digit, or of a hexadecimal digit when `hex` is set.
    pub fn digit_weight(&self, c: Char, hex: bool) -> Option<u32> {
        let set = if hex { Set::HexDigit } else { Set::Digit };
        if !self.set(set).contains(c) {
            return None;
        }
        self.digit_weights
            .iter()
            .find(|&&(d, _)| d == c)
            .map(|&(_, weight)| weight)
    }

    /// Human readable form of a delimiter, such as `STAGO ("<")`.
    pub fn describe_delim(&self, delim: DelimGeneral) -> String {
        format!["{} (\"{}\")", delim, chars::to_string(self.delim(delim))]
    }

    /// The delimiter-in-name characters: those added with [Syntax::add_name_chars].
    pub fn extra_name_chars(&self) -> &RangeSet {
        &self.extra_name_chars
    }
}

/// The short reference delimiters declared by a DTD, in declaration order.
///
/// The index of a delimiter in this list is the index carried by
///     [TokenKind::Shortref](crate::token::TokenKind::Shortref).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shortrefs {
    delims: Vec<Vec<Char>>,
}

impl Shortrefs {
    pub fn new() -> Shortrefs {
        Default::default()
    }

    /// Build the list from strings in the [IdentityCharset](crate::chars::IdentityCharset).
    pub fn from_strs(delims: &[&str]) -> Shortrefs {
        Shortrefs {
            delims: delims.iter().map(|s| chars::to_chars(s)).collect(),
        }
    }

    pub fn push(&mut self, delim: Vec<Char>) {
        self.delims.push(delim);
    }

    pub fn len(&self) -> usize {
        self.delims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delims.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&[Char]> {
        self.delims.get(i).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = &[Char]> {
        self.delims.iter().map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chars::{to_chars, IdentityCharset};

    #[test]
    fn reference_delimiters() {
        let syntax = Syntax::reference(&IdentityCharset);
        assert_eq!(syntax.delim(DelimGeneral::Mdo), to_chars("<!").as_slice());
        assert_eq!(syntax.delim(DelimGeneral::Hcro), to_chars("&#X").as_slice());
        assert_eq!(syntax.quantity(Quantity::Entlvl), 16);
    }

    #[test]
    fn reference_sets() {
        let syntax = Syntax::reference(&IdentityCharset);
        assert!(syntax.set(Set::Blank).contains(9));
        assert!(syntax.set(Set::Blank).contains(32));
        assert!(!syntax.set(Set::Blank).contains(13));
        assert!(syntax.set(Set::S).contains(13));
        assert!(syntax.set(Set::Nmchar).contains('-' as Char));
        assert!(!syntax.set(Set::Nmchar).contains('a' as Char));
        assert!(!syntax.set(Set::SgmlChar).contains(0));
        assert!(!syntax.set(Set::SgmlChar).contains(0x85));
        assert!(syntax.set(Set::Significant).contains('<' as Char));
    }

    #[test]
    fn function_names_fold_case() {
        let syntax = Syntax::reference(&IdentityCharset);
        assert_eq!(syntax.function_char(&to_chars("re")), Some(13));
        assert_eq!(syntax.function_char(&to_chars("Tab")), Some(9));
        assert_eq!(syntax.function_char(&to_chars("TABX")), None);
    }

    #[test]
    fn modifying_changes_version() {
        let mut syntax = Syntax::reference(&IdentityCharset);
        let before = syntax.version();
        syntax.set_quantity(Quantity::Entlvl, 3);
        assert_ne!(before, syntax.version());
        assert_ne!(
            Syntax::reference(&IdentityCharset).version(),
            Syntax::reference(&IdentityCharset).version()
        );
    }

    #[test]
    fn digit_weights() {
        let syntax = Syntax::reference(&IdentityCharset);
        assert_eq!(syntax.digit_weight('7' as Char, false), Some(7));
        assert_eq!(syntax.digit_weight('b' as Char, false), None);
        assert_eq!(syntax.digit_weight('b' as Char, true), Some(11));
        assert_eq!(syntax.digit_weight('F' as Char, true), Some(15));
        assert_eq!(syntax.digit_weight('g' as Char, true), None);
    }

    #[test]
    fn subst_inverse() {
        let syntax = Syntax::reference(&IdentityCharset);
        let subst = syntax.general_subst();
        assert_eq!(subst.subst('x' as Char), 'X' as Char);
        assert_eq!(subst.inverse('X' as Char), vec!['x' as Char]);
        assert!(subst.inverse('x' as Char).is_empty());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip_gets_a_new_version() {
        let mut syntax = Syntax::reference(&IdentityCharset);
        syntax.set_delim(DelimGeneral::Mdo, &to_chars("<?!"));
        let serialized = serde_json::to_string(&syntax).unwrap();
        let deserialized: Syntax = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized.delim(DelimGeneral::Mdo), to_chars("<?!").as_slice());
        assert_eq!(deserialized.quantity(Quantity::Litlen), 240);
        assert_eq!(deserialized.function_char(&to_chars("rs")), Some(10));
        assert_ne!(deserialized.version(), syntax.version());
    }
}
