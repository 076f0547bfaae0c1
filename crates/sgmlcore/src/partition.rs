//! Character partitioning
//!
//! Recognizers do not work on characters directly.
//! Before a batch of modes is compiled, every character number is assigned an
//!     [EquivCode]: two characters get the same code exactly when no delimiter,
//!     function character or character class used by the batch tells them apart.
//! The tries are then built over this small alphabet.
//!
//! Code 0 is reserved for the end of an entity.
//! Character numbers above [CHAR_MAX] are outside the repertoire and share it.

use crate::chars::{Char, CHAR_MAX};
use crate::syntax::SubstTable;
use sgml_stdext::collections::charmap::CharMap;
use sgml_stdext::collections::rangeset::RangeSet;

/// An equivalence class of characters.
pub type EquivCode = u16;

/// The code of the end of entity pseudo-character.
pub const EE_CODE: EquivCode = 0;

#[derive(Debug)]
struct EquivClass {
    set: RangeSet,
    // Bit i is set if the class is contained in the i-th set.
    in_sets: u64,
}

/// A partition of the character numbers.
#[derive(Debug, Clone)]
pub struct Partition {
    map: CharMap<EquivCode>,
    max_code: EquivCode,
    set_codes: Vec<Vec<EquivCode>>,
}

impl Partition {
    /// Build the coarsest partition that separates each of `chars` from every
    ///     other character and respects every one of `sets`.
    ///
    /// Characters are compared after substitution, so with case folding a
    ///     delimiter character and its lower case form share a code.
    /// At most 64 sets are supported; there are 11 character classes.
    pub fn new(chars: &RangeSet, sets: &[&RangeSet], subst: &SubstTable) -> Partition {
        let mut classes = vec![EquivClass {
            set: RangeSet::from_ranges([(0, CHAR_MAX)]),
            in_sets: 0,
        }];
        for c in chars.iter() {
            refine_by_char(&mut classes, subst.subst(c));
        }
        for (i, set) in sets.iter().enumerate() {
            refine_by_set(&mut classes, set, 1 << i);
        }

        let mut map = CharMap::new(EE_CODE);
        let mut set_codes = vec![vec![]; sets.len()];
        let mut max_code: EquivCode = 0;
        for class in &classes {
            max_code += 1;
            for (i, codes) in set_codes.iter_mut().enumerate() {
                if class.in_sets & (1 << i) != 0 {
                    codes.push(max_code);
                }
            }
            for &(lo, hi) in class.set.ranges() {
                map.set_range(lo, hi, max_code);
            }
        }
        for c in chars.iter() {
            let s = subst.subst(c);
            let code = map.get(s);
            map.set_char(c, code);
            for inverse in subst.inverse(s) {
                map.set_char(inverse, code);
            }
        }
        Partition {
            map,
            max_code,
            set_codes,
        }
    }

    /// The code of a character.
    pub fn char_code(&self, c: Char) -> EquivCode {
        self.map.get(c)
    }

    /// The code of a character, or [EE_CODE] for the end of an entity.
    pub fn code(&self, c: Option<Char>) -> EquivCode {
        match c {
            None => EE_CODE,
            Some(c) => self.map.get(c),
        }
    }

    /// Codes of the classes contained in the `i`-th set passed to [Partition::new].
    pub fn set_codes(&self, i: usize) -> &[EquivCode] {
        &self.set_codes[i]
    }

    pub fn max_code(&self) -> EquivCode {
        self.max_code
    }

    /// Size of the alphabet, including the end of entity code.
    pub fn n_codes(&self) -> usize {
        self.max_code as usize + 1
    }
}

fn refine_by_char(classes: &mut Vec<EquivClass>, c: Char) {
    let Some(i) = classes.iter().position(|class| class.set.contains(c)) else {
        return;
    };
    if classes[i].set.len() == 1 {
        return;
    }
    let single = RangeSet::singleton(c);
    classes[i].set = classes[i].set.difference(&single);
    let in_sets = classes[i].in_sets;
    classes.push(EquivClass {
        set: single,
        in_sets,
    });
}

fn refine_by_set(classes: &mut Vec<EquivClass>, set: &RangeSet, bit: u64) {
    let n = classes.len();
    for i in 0..n {
        let inside = classes[i].set.intersection(set);
        if inside.is_empty() {
            continue;
        }
        if inside == classes[i].set {
            classes[i].in_sets |= bit;
            continue;
        }
        classes[i].set = classes[i].set.difference(&inside);
        let in_sets = classes[i].in_sets | bit;
        classes.push(EquivClass {
            set: inside,
            in_sets,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};

    fn set(s: &str) -> RangeSet {
        s.chars().map(|c| c as Char).collect()
    }

    #[test]
    fn delimiter_chars_get_their_own_codes() {
        let letters = RangeSet::from_ranges([('a' as u32, 'z' as u32)]);
        let p = Partition::new(&set("<!"), &[&letters], &SubstTable::default());
        let lt = p.char_code('<' as Char);
        let bang = p.char_code('!' as Char);
        let a = p.char_code('a' as Char);
        let other = p.char_code('?' as Char);
        assert_ne!(lt, bang);
        assert_ne!(lt, a);
        assert_ne!(a, other);
        assert_eq!(a, p.char_code('q' as Char));
        assert_eq!(other, p.char_code(0x10FFFF));
        assert_eq!(p.set_codes(0), &[a]);
        assert!([lt, bang, a, other].iter().all(|&c| c != EE_CODE));
        assert_eq!(p.code(None), EE_CODE);
        assert_eq!(p.n_codes(), 5);
    }

    #[test]
    fn characters_outside_repertoire_get_end_of_entity_code() {
        let p = Partition::new(&set("<"), &[], &SubstTable::default());
        assert_eq!(p.char_code(CHAR_MAX + 1), EE_CODE);
        assert_eq!(p.char_code(u32::MAX), EE_CODE);
        assert_ne!(p.char_code(CHAR_MAX), EE_CODE);
        assert_ne!(p.char_code(0), EE_CODE);
    }

    #[test]
    fn overlapping_sets_split() {
        let digits = set("0123456789");
        let hex = set("0123456789abcdef");
        let p = Partition::new(&RangeSet::new(), &[&digits, &hex], &SubstTable::default());
        let zero = p.char_code('0' as Char);
        let a = p.char_code('a' as Char);
        assert_ne!(zero, a);
        assert_eq!(p.set_codes(0), &[zero]);
        let mut hex_codes = p.set_codes(1).to_vec();
        hex_codes.sort();
        let mut want = vec![zero, a];
        want.sort();
        assert_eq!(hex_codes, want);
    }

    #[test]
    fn substitution_shares_codes() {
        let mut subst = SubstTable::default();
        subst.add('x' as Char, 'X' as Char);
        let p = Partition::new(&set("X"), &[], &subst);
        assert_eq!(p.char_code('x' as Char), p.char_code('X' as Char));
        assert_ne!(p.char_code('y' as Char), p.char_code('X' as Char));
    }

    // Two characters share a code iff they agree on membership of every
    // delimiter character and every set.
    #[test]
    fn random_partitions_are_exact() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(17);
        let alphabet: Vec<Char> = (0..40).map(|i| 'A' as Char + i).collect();
        for _ in 0..200 {
            let mut chars = RangeSet::new();
            for _ in 0..rng.gen_range(0..6) {
                chars.add(alphabet[rng.gen_range(0..alphabet.len())]);
            }
            let sets: Vec<RangeSet> = (0..rng.gen_range(0..5))
                .map(|_| {
                    let lo = alphabet[rng.gen_range(0..alphabet.len())];
                    let hi = lo + rng.gen_range(0..10);
                    RangeSet::from_ranges([(lo, hi)])
                })
                .collect();
            let set_refs: Vec<&RangeSet> = sets.iter().collect();
            let p = Partition::new(&chars, &set_refs, &SubstTable::default());
            let signature = |c: Char| -> (Option<Char>, Vec<bool>) {
                (
                    if chars.contains(c) { Some(c) } else { None },
                    sets.iter().map(|s| s.contains(c)).collect(),
                )
            };
            for &x in &alphabet {
                for &y in &alphabet {
                    assert_eq!(
                        p.char_code(x) == p.char_code(y),
                        signature(x) == signature(y),
                        "characters {x} and {y}"
                    );
                }
            }
        }
    }
}
