//! Compiling a batch of modes
//!
//! All modes of a [ModeBucket](crate::mode::ModeBucket) share one partition.
//! Compilation first collects every delimiter, function character and set the
//!     batch uses, builds the partition, and then builds one trie per mode.

use super::trie::TrieBuilder;
use super::Recognizer;
use crate::chars::Char;
use crate::mode::{self, Contents, Mode};
use crate::partition::{EquivCode, Partition, EE_CODE};
use crate::syntax::{DelimGeneral, Features, Quantity, Set, Shortrefs, StandardFunction, Syntax};
use crate::token::{Priority, TokenKind};
use sgml_stdext::collections::charmap::CharMap;
use sgml_stdext::collections::rangeset::RangeSet;
use std::rc::Rc;

/// The result of compiling a batch of modes.
#[derive(Debug)]
pub struct CompiledModes {
    pub recognizers: Vec<Recognizer>,
    /// Pairs of tokens that end at the same place with the same priority;
    ///     the first token of each pair is the one recognized.
    pub ambiguities: Vec<(Mode, TokenKind, TokenKind)>,
    /// Delimiters used by the batch that are empty in the syntax.
    pub empty_delims: Vec<DelimGeneral>,
    pub partition: Rc<Partition>,
}

/// A short reference delimiter split around its blank sequence.
#[derive(Debug, Default, PartialEq, Eq)]
struct ShortrefParts {
    prefix: Vec<Char>,
    blanks: usize,
    suffix: Vec<Char>,
}

/// Split a short reference at its first run of `b_char`.
///
/// Only the first run is a blank sequence; later occurrences of the letter
///     are matched literally.
fn split_shortref(delim: &[Char], b_char: Char) -> ShortrefParts {
    let Some(first) = delim.iter().position(|&c| c == b_char) else {
        return ShortrefParts {
            prefix: delim.to_vec(),
            ..Default::default()
        };
    };
    let blanks = delim[first..]
        .iter()
        .take_while(|&&c| c == b_char)
        .count();
    ShortrefParts {
        prefix: delim[..first].to_vec(),
        blanks,
        suffix: delim[first + blanks..].to_vec(),
    }
}

fn codes_of_set<'a>(partition: &'a Partition, used_sets: &[Set], set: Set) -> &'a [EquivCode] {
    match used_sets.iter().position(|&s| s == set) {
        Some(i) => partition.set_codes(i),
        None => &[],
    }
}

#[derive(Default)]
struct Usage {
    delims: Vec<bool>,
    sets: Vec<bool>,
    functions: Vec<bool>,
    shortrefs: bool,
}

fn usage(modes: &[Mode], features: &Features) -> Usage {
    let mut usage = Usage {
        delims: vec![false; DelimGeneral::ALL.len()],
        sets: vec![false; Set::ALL.len()],
        functions: vec![false; StandardFunction::ALL.len()],
        shortrefs: false,
    };
    for &mode in modes {
        for info in mode::tokens(mode, features) {
            match info.contents {
                Contents::Delim(d) => usage.delims[d.index()] = true,
                Contents::DelimDelim(d1, d2) => {
                    usage.delims[d1.index()] = true;
                    usage.delims[d2.index()] = true;
                }
                Contents::DelimSet(d, s) => {
                    usage.delims[d.index()] = true;
                    usage.sets[s.index()] = true;
                }
                Contents::Set(s) => usage.sets[s.index()] = true,
                Contents::Function(f) => usage.functions[f.index()] = true,
            }
        }
        usage.shortrefs |= mode.uses_shortrefs();
    }
    usage
}

/// Compile recognizers for `modes`.
///
/// `shortrefs` are the short reference delimiters of the current DTD; they
///     are only used for modes that recognize short references.
/// With `warn_data_delim`, delimiter characters in data are recognized as
///     [TokenKind::CharDelim] in the modes where that is worth a warning.
pub fn compile_modes(
    modes: &[Mode],
    syntax: &Syntax,
    features: &Features,
    shortrefs: Option<&Shortrefs>,
    warn_data_delim: bool,
) -> CompiledModes {
    let mut usage = usage(modes, features);
    let b_char = syntax.b_char();
    let subst = syntax.general_subst();

    let mut chars = RangeSet::new();
    for function in StandardFunction::ALL {
        if usage.functions[function.index()] {
            if let Some(c) = syntax.standard_function(*function) {
                chars.add(c);
            }
        }
    }
    let mut empty_delims = vec![];
    for delim in DelimGeneral::ALL {
        if !usage.delims[delim.index()] {
            continue;
        }
        let text = syntax.delim(*delim);
        if text.is_empty() {
            empty_delims.push(*delim);
        }
        for &c in text {
            chars.add(c);
        }
    }
    let shortref_parts: Vec<ShortrefParts> = match shortrefs {
        Some(shortrefs) if usage.shortrefs => shortrefs
            .iter()
            .map(|delim| split_shortref(&subst.subst_all(delim), b_char))
            .collect(),
        _ => vec![],
    };
    for parts in &shortref_parts {
        if parts.blanks > 0 {
            usage.sets[Set::Blank.index()] = true;
        }
        for &c in parts.prefix.iter().chain(parts.suffix.iter()) {
            chars.add(c);
        }
    }

    let used_sets: Vec<Set> = Set::ALL
        .iter()
        .copied()
        .filter(|set| usage.sets[set.index()])
        .collect();
    let set_refs: Vec<&RangeSet> = used_sets.iter().map(|&set| syntax.set(set)).collect();
    let partition = Rc::new(Partition::new(&chars, &set_refs, subst));
    let set_codes = |set: Set| codes_of_set(&partition, &used_sets, set);
    let codes = |text: &[Char]| -> Vec<EquivCode> {
        text.iter().map(|&c| partition.char_code(c)).collect()
    };
    let delim_codes = |delim: DelimGeneral| codes(syntax.delim(delim));

    let mut data_delim_codes: Vec<EquivCode> = vec![];
    if warn_data_delim {
        for info in mode::tokens(Mode::Mcon, features) {
            let delim = match info.contents {
                Contents::Delim(d) | Contents::DelimDelim(d, _) | Contents::DelimSet(d, _) => d,
                _ => continue,
            };
            if info.token == TokenKind::MscMdc {
                continue;
            }
            if let Some(&c) = syntax.delim(delim).first() {
                let code = partition.char_code(c);
                if !data_delim_codes.contains(&code) {
                    data_delim_codes.push(code);
                }
            }
        }
    }

    let bseqlen = syntax.quantity(Quantity::Bseqlen) as usize;
    let mut recognizers = vec![];
    let mut ambiguities = vec![];
    for &mode in modes {
        let mut builder = TrieBuilder::new(partition.n_codes());
        builder.recognize_ee(EE_CODE, TokenKind::Ee);
        for info in mode::tokens(mode, features) {
            match info.contents {
                Contents::Delim(d) => builder.recognize(&delim_codes(d), info.token, info.priority),
                Contents::DelimDelim(d1, d2) => {
                    let (first, second) = (delim_codes(d1), delim_codes(d2));
                    if !first.is_empty() && !second.is_empty() {
                        let both: Vec<EquivCode> = first.into_iter().chain(second).collect();
                        builder.recognize(&both, info.token, info.priority);
                    }
                }
                Contents::DelimSet(d, s) => {
                    let prefix = delim_codes(d);
                    if !prefix.is_empty() {
                        builder.recognize_with_set(&prefix, set_codes(s), info.token, info.priority);
                    }
                }
                Contents::Set(s) => {
                    builder.recognize_with_set(&[], set_codes(s), info.token, info.priority)
                }
                Contents::Function(f) => {
                    if let Some(c) = syntax.standard_function(f) {
                        builder.recognize(&[partition.char_code(c)], info.token, info.priority);
                    }
                }
            }
        }
        if mode.uses_shortrefs() {
            for (i, parts) in shortref_parts.iter().enumerate() {
                let token = TokenKind::Shortref(i as u16);
                if parts.blanks > 0 {
                    builder.recognize_b(
                        &codes(&parts.prefix),
                        parts.blanks,
                        bseqlen.max(parts.blanks),
                        set_codes(Set::Blank),
                        &codes(&parts.suffix),
                        token,
                        Priority::Shortref,
                    );
                } else {
                    builder.recognize(&codes(&parts.prefix), token, Priority::Shortref);
                }
            }
        }
        if warn_data_delim {
            let extra: Vec<EquivCode> = match mode {
                Mode::Plit | Mode::Plita | Mode::Plite => syntax
                    .delim(DelimGeneral::Pero)
                    .first()
                    .map(|&c| partition.char_code(c))
                    .into_iter()
                    .collect(),
                mode if mode.warns_data_delim() => data_delim_codes.clone(),
                _ => vec![],
            };
            for code in extra {
                builder.recognize(&[code], TokenKind::CharDelim, Priority::DataDelim);
            }
        }
        let (trie, mode_ambiguities) = builder.finish();
        ambiguities.extend(
            mode_ambiguities
                .into_iter()
                .map(|(first, second)| (mode, first, second)),
        );
        recognizers.push(Recognizer::new(mode, trie, Rc::clone(&partition)));
    }
    log::debug!(
        "compiled {} modes over {} equivalence classes ({} trie nodes)",
        recognizers.len(),
        partition.max_code(),
        recognizers
            .iter()
            .map(|r| r.trie().n_nodes())
            .sum::<usize>()
    );
    CompiledModes {
        recognizers,
        ambiguities,
        empty_delims,
        partition,
    }
}

/// The characters that are always plain data in mixed content.
///
/// Such characters can be consumed in a run without asking a recognizer:
///     they are SGML characters that do not start a delimiter of the
///     `mconnet` mode or a short reference, and are not function characters
///     or in a character class the mode recognizes.
#[derive(Clone, Debug)]
pub struct NormalMap {
    map: CharMap<bool>,
}

impl NormalMap {
    pub fn contains(&self, c: Char) -> bool {
        self.map.get(c)
    }
}

pub fn compile_normal_map(
    syntax: &Syntax,
    features: &Features,
    shortrefs: Option<&Shortrefs>,
) -> NormalMap {
    let mut map = CharMap::new(false);
    for &(lo, hi) in syntax.set(Set::SgmlChar).ranges() {
        map.set_range(lo, hi, true);
    }
    let subst = syntax.general_subst();
    let exclude_char = |map: &mut CharMap<bool>, c: Char| {
        map.set_char(c, false);
        for inverse in subst.inverse(c) {
            map.set_char(inverse, false);
        }
    };
    let exclude_set = |map: &mut CharMap<bool>, set: Set| {
        for &(lo, hi) in syntax.set(set).ranges() {
            map.set_range(lo, hi, false);
        }
    };
    for info in mode::tokens(Mode::Mconnet, features) {
        match info.contents {
            Contents::Delim(d) | Contents::DelimDelim(d, _) | Contents::DelimSet(d, _) => {
                if let Some(&c) = syntax.delim(d).first() {
                    exclude_char(&mut map, c);
                }
            }
            Contents::Set(s) => {
                if info.token != TokenKind::Char {
                    exclude_set(&mut map, s);
                }
            }
            Contents::Function(f) => {
                if let Some(c) = syntax.standard_function(f) {
                    map.set_char(c, false);
                }
            }
        }
    }
    if let Some(shortrefs) = shortrefs {
        for delim in shortrefs.iter() {
            let Some(&first) = delim.first() else {
                continue;
            };
            let first = subst.subst(first);
            if first == syntax.b_char() {
                exclude_set(&mut map, Set::Blank);
            } else {
                exclude_char(&mut map, first);
            }
        }
    }
    NormalMap { map }
}
