//! Recognizers
//!
//! A [Recognizer] finds the next token of one mode.
//! It walks its [trie::Trie] with the equivalence codes of the input
//!     characters for as long as there are edges to follow, and returns the
//!     deepest accepting node seen on the way.
//! Characters read past the end of the token are put back with
//!     [InputSource::end_token].
//!
//! A node may also carry the blank run of a short reference.
//! Its edges and its run are both tried: the run's blanks are read again from
//!     the node's position, so a longer literal path never hides the run.

pub mod compile;
pub mod trie;

use crate::input::InputSource;
use crate::mode::Mode;
use crate::partition::{EquivCode, Partition, EE_CODE};
use crate::syntax::SyntaxVersion;
use crate::token::{Priority, Token, TokenKind};
use std::collections::HashMap;
use std::rc::Rc;
use trie::{NodeId, Trie, ROOT};

/// The compiled scanner of one mode.
#[derive(Debug)]
pub struct Recognizer {
    mode: Mode,
    trie: Trie,
    partition: Rc<Partition>,
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    depth: usize,
    length: usize,
    token: TokenKind,
    priority: Priority,
}

impl Candidate {
    fn beats(&self, other: &Candidate) -> bool {
        (self.depth, self.length, self.priority) > (other.depth, other.length, other.priority)
    }
}

impl Recognizer {
    pub fn new(mode: Mode, trie: Trie, partition: Rc<Partition>) -> Recognizer {
        Recognizer {
            mode,
            trie,
            partition,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn trie(&self) -> &Trie {
        &self.trie
    }

    pub fn partition(&self) -> &Rc<Partition> {
        &self.partition
    }

    /// Recognize the next token of `input`.
    ///
    /// The token starts at the cursor and the cursor is left at its end.
    /// A character no token matches is returned as a one character
    ///     [TokenKind::Unrecognized] token.
    pub fn recognize(&self, input: &mut InputSource) -> Token {
        input.start_token();
        let start = input.token_start();
        let mut best: Option<Candidate> = None;
        let mut runs: Vec<(NodeId, usize)> = vec![];
        self.walk(input, ROOT, 0, None, &mut best, &mut runs);
        // Each blank run passed on the way is an alternative to the edges
        //     followed from its node.
        while let Some((node, depth)) = runs.pop() {
            let Some(run) = self.trie.run(node) else {
                continue;
            };
            input.end_token(depth);
            let mut depth = depth;
            let mut blanks = 0;
            let mut code = self.read(input);
            while blanks < run.max_blanks && code.is_some_and(|code| run.is_blank(code)) {
                blanks += 1;
                depth += 1;
                code = self.read(input);
            }
            self.consider(run.target, depth, &mut best);
            self.walk(input, run.target, depth, Some(code), &mut best, &mut runs);
        }
        match best {
            Some(candidate) => {
                input.end_token(candidate.length);
                Token {
                    kind: candidate.token,
                    start,
                    length: input.token_length(),
                }
            }
            None => {
                input.end_token(1);
                Token {
                    kind: TokenKind::Unrecognized,
                    start,
                    length: input.token_length(),
                }
            }
        }
    }

    /// Follow trie edges from `node` for as long as the input allows.
    ///
    /// `pending` is a code already read from the input.
    fn walk(
        &self,
        input: &mut InputSource,
        mut node: NodeId,
        mut depth: usize,
        mut pending: Option<Option<EquivCode>>,
        best: &mut Option<Candidate>,
        runs: &mut Vec<(NodeId, usize)>,
    ) {
        loop {
            if self.trie.run(node).is_some() {
                runs.push((node, depth));
            }
            let code = match pending.take() {
                Some(code) => code,
                None => self.read(input),
            };
            let Some(code) = code else {
                return;
            };
            let Some(next) = self.trie.next(node, code) else {
                return;
            };
            node = next;
            depth += 1;
            self.consider(node, depth, best);
            if code == EE_CODE {
                return;
            }
        }
    }

    /// Read the code of the next character.
    ///
    /// Returns `None` for a character outside the partitioned repertoire; no
    ///     edge is ever followed on one.
    fn read(&self, input: &mut InputSource) -> Option<EquivCode> {
        let c = input.token_char();
        let code = self.partition.code(c);
        if code == EE_CODE && c.is_some() {
            return None;
        }
        Some(code)
    }

    fn consider(&self, node: NodeId, depth: usize, best: &mut Option<Candidate>) {
        let Some(accept) = self.trie.accept(node) else {
            return;
        };
        let candidate = Candidate {
            depth,
            length: depth.saturating_sub(accept.lookahead as usize),
            token: accept.token,
            priority: accept.priority,
        };
        match best {
            Some(current) if !candidate.beats(current) => {}
            _ => *best = Some(candidate),
        }
    }
}

/// Compiled recognizers, keyed by mode and syntax version.
///
/// A recognizer compiled for one version of a syntax is never used with
///     another version.
#[derive(Debug, Default)]
pub struct RecognizerCache {
    recognizers: HashMap<(Mode, SyntaxVersion), Rc<Recognizer>>,
}

impl RecognizerCache {
    pub fn new() -> RecognizerCache {
        Default::default()
    }

    pub fn get(&self, mode: Mode, version: SyntaxVersion) -> Option<&Rc<Recognizer>> {
        self.recognizers.get(&(mode, version))
    }

    /// Add a recognizer, replacing any compiled earlier for the same mode and version.
    pub fn insert(&mut self, version: SyntaxVersion, recognizer: Recognizer) -> Rc<Recognizer> {
        let recognizer = Rc::new(recognizer);
        self.recognizers
            .insert((recognizer.mode(), version), Rc::clone(&recognizer));
        recognizer
    }

    /// Drop recognizers compiled for other versions of the syntax.
    pub fn retain_version(&mut self, version: SyntaxVersion) {
        self.recognizers.retain(|&(_, v), _| v == version);
    }

    pub fn len(&self) -> usize {
        self.recognizers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recognizers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chars::{to_chars, to_string, IdentityCharset};
    use crate::mode::ModeBucket;
    use crate::origin::Origin;
    use crate::syntax::{Features, Shortrefs, Syntax};
    use rand::{Rng, SeedableRng};

    fn recognizers(shortrefs: &[&str]) -> (Syntax, HashMap<Mode, Recognizer>) {
        let syntax = Syntax::reference(&IdentityCharset);
        let features = Features::default();
        let shortrefs = Shortrefs::from_strs(shortrefs);
        let mut all = HashMap::new();
        for bucket in [ModeBucket::Prolog, ModeBucket::Instance] {
            let modes = bucket.modes(&syntax, &features);
            let compiled =
                compile::compile_modes(&modes, &syntax, &features, Some(&shortrefs), false);
            for recognizer in compiled.recognizers {
                all.insert(recognizer.mode(), recognizer);
            }
        }
        (syntax, all)
    }

    fn scan(recognizer: &Recognizer, text: &str) -> Vec<(TokenKind, String)> {
        let chars: Rc<[u32]> = to_chars(text).into();
        let mut input = InputSource::new(Origin::document("test", chars.clone()), chars);
        let mut tokens = vec![];
        loop {
            let token = recognizer.recognize(&mut input);
            if token.is_ee() {
                return tokens;
            }
            tokens.push((token.kind, to_string(input.token_text())));
        }
    }

    macro_rules! recognizer_tests {
        ( $( ($name: ident, $mode: expr, $shortrefs: expr, $input: expr, $want: expr), )+ ) => {
            $(
                #[test]
                fn $name() {
                    let (_, recognizers) = recognizers(&$shortrefs);
                    let got = scan(&recognizers[&$mode], $input);
                    let want: Vec<(TokenKind, String)> = $want
                        .into_iter()
                        .map(|(kind, text): (TokenKind, &str)| (kind, text.to_string()))
                        .collect();
                    assert_eq!(got, want);
                }
            )+
        };
    }

    recognizer_tests!(
        (
            comment_declaration_open,
            Mode::Mcon, [], "<!--",
            vec![(TokenKind::MdoCom, "<!--")]
        ),
        (
            start_tag_open_leaves_name,
            Mode::Mcon, [], "<a",
            vec![(TokenKind::StagoNameStart, "<"), (TokenKind::Char, "a")]
        ),
        (
            lone_stago_is_data,
            Mode::Mcon, [], "< ",
            vec![(TokenKind::Char, "<"), (TokenKind::Char, " ")]
        ),
        (
            entity_reference_open,
            Mode::Mcon, [], "&x;",
            vec![(TokenKind::EroNameStart, "&"), (TokenKind::Char, "x"), (TokenKind::Char, ";")]
        ),
        (
            char_refs,
            Mode::Alit, [], "&#9&#xA&#RE",
            vec![
                (TokenKind::CroDigit, "&#"), (TokenKind::Char, "9"),
                (TokenKind::HcroHexDigit, "&#x"), (TokenKind::Char, "A"),
                (TokenKind::CroNameStart, "&#"), (TokenKind::Char, "R"), (TokenKind::Char, "E"),
            ]
        ),
        (
            record_ends_in_content,
            Mode::Mcon, [], "a\r\n",
            vec![(TokenKind::Char, "a"), (TokenKind::Re, "\r"), (TokenKind::Rs, "\n")]
        ),
        (
            separators_in_tag,
            Mode::Tag, [], "a1 =>",
            vec![
                (TokenKind::NameStart, "a"), (TokenKind::Digit, "1"), (TokenKind::S, " "),
                (TokenKind::Vi, "="), (TokenKind::Tagc, ">"),
            ]
        ),
        (
            pero_name_start_beats_pero,
            Mode::MdPero, [], "%a% ",
            vec![
                (TokenKind::PeroNameStart, "%"), (TokenKind::NameStart, "a"),
                (TokenKind::Pero, "%"), (TokenKind::S, " "),
            ]
        ),
        (
            blank_sequence_shortref,
            Mode::Mcon, ["B"], "a  b",
            vec![(TokenKind::Char, "a"), (TokenKind::Shortref(0), "  "), (TokenKind::Char, "b")]
        ),
        (
            blank_sequence_with_suffix,
            Mode::Mcon, ["B&"], "a \t &",
            vec![(TokenKind::Char, "a"), (TokenKind::Shortref(0), " \t &")]
        ),
        (
            longer_shortref_wins,
            Mode::Mcon, ["B", "BB"], "  | ",
            vec![(TokenKind::Shortref(1), "  "), (TokenKind::Char, "|"), (TokenKind::Shortref(0), " ")]
        ),
        (
            blank_run_reaches_longer_suffix,
            Mode::Mcon, ["BB", "B\r"], "  \rx",
            vec![(TokenKind::Shortref(1), "  \r"), (TokenKind::Char, "x")]
        ),
        (
            blank_run_falls_back_to_shorter_shortref,
            Mode::Mcon, ["B", "BBx"], "  y",
            vec![(TokenKind::Shortref(0), "  "), (TokenKind::Char, "y")]
        ),
        (
            blank_run_with_literal_suffix_still_matches,
            Mode::Mcon, ["B", "BBx"], "   x",
            vec![(TokenKind::Shortref(1), "   x")]
        ),
        (
            literal_shortref,
            Mode::Mcon, ["--"], "a--b-",
            vec![
                (TokenKind::Char, "a"), (TokenKind::Shortref(0), "--"),
                (TokenKind::Char, "b"), (TokenKind::Char, "-"),
            ]
        ),
        (
            control_character_unrecognized,
            Mode::Mcon, [], "\u{1}a",
            vec![(TokenKind::Unrecognized, "\u{1}"), (TokenKind::Char, "a")]
        ),
        (
            ignored_marked_section,
            Mode::Ims, [], "x]]><![",
            vec![(TokenKind::IgnoredChar, "x"), (TokenKind::MscMdc, "]]>"), (TokenKind::MdoDso, "<![")]
        ),
    );

    #[test]
    fn single_blank_in_element_content_is_separator() {
        let (_, recognizers) = recognizers(&["BB"]);
        let got = scan(&recognizers[&Mode::Econ], " x  ");
        assert_eq!(
            got,
            vec![
                (TokenKind::S, " ".to_string()),
                (TokenKind::Char, "x".to_string()),
                (TokenKind::Shortref(0), "  ".to_string()),
            ]
        );
    }

    #[test]
    fn blank_run_is_bounded() {
        let mut syntax = Syntax::reference(&IdentityCharset);
        syntax.set_quantity(crate::syntax::Quantity::Bseqlen, 3);
        let features = Features::default();
        let compiled = compile::compile_modes(
            &[Mode::Mcon],
            &syntax,
            &features,
            Some(&Shortrefs::from_strs(&["B"])),
            false,
        );
        let recognizer = &compiled.recognizers[0];
        let got = scan(recognizer, "     ");
        assert_eq!(
            got,
            vec![
                (TokenKind::Shortref(0), "   ".to_string()),
                (TokenKind::Shortref(0), "  ".to_string()),
            ]
        );
    }

    #[test]
    fn character_outside_repertoire_is_unrecognized() {
        let (_, recognizers) = recognizers(&[]);
        let recognizer = &recognizers[&Mode::Mcon];
        assert_eq!(recognizer.partition().char_code(0x110000), EE_CODE);
        let chars: Rc<[u32]> = vec![0x110000, 'a' as u32].into();
        let mut input = InputSource::new(Origin::document("test", chars.clone()), chars);
        let token = recognizer.recognize(&mut input);
        assert_eq!(token.kind, TokenKind::Unrecognized);
        assert_eq!(token.length, 1);
        assert_eq!(recognizer.recognize(&mut input).kind, TokenKind::Char);
        assert!(recognizer.recognize(&mut input).is_ee());
    }

    #[test]
    fn end_of_entity_has_no_length() {
        let (_, recognizers) = recognizers(&[]);
        let chars: Rc<[u32]> = to_chars("").into();
        let mut input = InputSource::new(Origin::document("test", chars.clone()), chars);
        let token = recognizers[&Mode::Mcon].recognize(&mut input);
        assert_eq!(token.kind, TokenKind::Ee);
        assert_eq!(token.length, 0);
    }

    // For random text, the token returned is never shorter than a delimiter
    // of the mode that matches at the same position.
    #[test]
    fn random_text_longest_match() {
        let (_, recognizers) = recognizers(&[]);
        let recognizer = &recognizers[&Mode::Mcon];
        let alphabet: Vec<char> = "<!-/&#;x]> \r".chars().collect();
        let delims: Vec<Vec<u32>> = ["<!--", "<!>", "<![", "]]>"]
            .iter()
            .map(|s| to_chars(s))
            .collect();
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        for _ in 0..300 {
            let text: String = (0..rng.gen_range(1..12))
                .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
                .collect();
            let chars: Rc<[u32]> = to_chars(&text).into();
            let mut input = InputSource::new(Origin::document("test", chars.clone()), chars.clone());
            loop {
                let token = recognizer.recognize(&mut input);
                if token.is_ee() {
                    break;
                }
                assert!(token.length >= 1, "{text:?}");
                let rest = &chars[token.start..];
                for delim in &delims {
                    if rest.starts_with(delim) {
                        assert!(token.length >= 2, "{text:?}: {:?}", token);
                    }
                }
            }
        }
    }
}
