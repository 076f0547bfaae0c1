//! Trie construction
//!
//! A [TrieBuilder] inserts code sequences, each with a token and a priority,
//!     into a prefix trie over [EquivCode]s.
//! When two different tokens end at the same node with the same length and
//!     priority the first one inserted is kept and the pair is recorded as an
//!     ambiguity.
//!
//! Blank sequences in short references do not fit in a plain trie because
//!     they match any number of blanks.
//! A node can instead carry a [BlankRun]: the recognizer greedily consumes
//!     blanks from the node and continues at the run's target node.
//! The node's own edges are tried as well.

use crate::partition::EquivCode;
use crate::token::{Priority, TokenKind};

pub(crate) type NodeId = u32;

pub(crate) const ROOT: NodeId = 0;

/// A token accepted at a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Accept {
    pub token: TokenKind,
    pub priority: Priority,
    /// Number of trailing characters on the path that are context, not part of the token.
    pub lookahead: u8,
}

#[derive(Clone, Debug)]
pub(crate) struct BlankRun {
    is_blank: Vec<bool>,
    /// Blanks the run may consume beyond those on the path to the node.
    pub max_blanks: usize,
    pub target: NodeId,
}

impl BlankRun {
    pub fn is_blank(&self, code: EquivCode) -> bool {
        self.is_blank.get(code as usize).copied().unwrap_or(false)
    }
}

#[derive(Clone, Debug, Default)]
struct Node {
    // Empty for leaves, otherwise indexed by code.
    next: Vec<Option<NodeId>>,
    accept: Option<Accept>,
    run: Option<BlankRun>,
}

/// A compiled trie.
#[derive(Clone, Debug)]
pub struct Trie {
    nodes: Vec<Node>,
    n_codes: usize,
}

impl Trie {
    pub(crate) fn next(&self, node: NodeId, code: EquivCode) -> Option<NodeId> {
        self.nodes[node as usize]
            .next
            .get(code as usize)
            .copied()
            .flatten()
    }

    pub(crate) fn accept(&self, node: NodeId) -> Option<&Accept> {
        self.nodes[node as usize].accept.as_ref()
    }

    pub(crate) fn run(&self, node: NodeId) -> Option<&BlankRun> {
        self.nodes[node as usize].run.as_ref()
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_codes(&self) -> usize {
        self.n_codes
    }
}

/// Builder for a [Trie].
#[derive(Debug)]
pub struct TrieBuilder {
    trie: Trie,
    ambiguities: Vec<(TokenKind, TokenKind)>,
}

impl TrieBuilder {
    pub fn new(n_codes: usize) -> TrieBuilder {
        TrieBuilder {
            trie: Trie {
                nodes: vec![Node::default()],
                n_codes,
            },
            ambiguities: vec![],
        }
    }

    /// Recognize the end of entity code at the root, with the highest priority.
    pub fn recognize_ee(&mut self, code: EquivCode, token: TokenKind) {
        let node = self.force_next(ROOT, code);
        self.set_accept(
            node,
            Accept {
                token,
                priority: Priority::EndOfEntity,
                // The end of entity is not consumed.
                lookahead: 1,
            },
        );
    }

    /// Recognize a fixed sequence of codes. An empty sequence is ignored.
    pub fn recognize(&mut self, codes: &[EquivCode], token: TokenKind, priority: Priority) {
        if codes.is_empty() {
            return;
        }
        let node = self.extend(ROOT, codes);
        self.set_accept(
            node,
            Accept {
                token,
                priority,
                lookahead: 0,
            },
        );
    }

    /// Recognize `prefix` followed by any one code in `set`.
    ///
    /// With an empty prefix this recognizes a bare character class and the
    ///     class character is the token.
    /// Otherwise the class character is lookahead and only the prefix is the token.
    pub fn recognize_with_set(
        &mut self,
        prefix: &[EquivCode],
        set: &[EquivCode],
        token: TokenKind,
        priority: Priority,
    ) {
        let node = self.extend(ROOT, prefix);
        let lookahead = if prefix.is_empty() { 0 } else { 1 };
        for &code in set {
            let next = self.force_next(node, code);
            self.set_accept(
                next,
                Accept {
                    token,
                    priority,
                    lookahead,
                },
            );
        }
    }

    /// Recognize `prefix`, then at least `min_blanks` blank codes, then `suffix`.
    ///
    /// The blank run is greedy and the whole run is at most `max_blanks` long.
    #[allow(clippy::too_many_arguments)]
    pub fn recognize_b(
        &mut self,
        prefix: &[EquivCode],
        min_blanks: usize,
        max_blanks: usize,
        blank_codes: &[EquivCode],
        suffix: &[EquivCode],
        token: TokenKind,
        priority: Priority,
    ) {
        let node = self.extend(ROOT, prefix);
        let accept = Accept {
            token,
            priority,
            lookahead: 0,
        };
        self.do_b(node, min_blanks, 0, max_blanks, blank_codes, suffix, accept);
    }

    #[allow(clippy::too_many_arguments)]
    fn do_b(
        &mut self,
        node: NodeId,
        remaining: usize,
        seen: usize,
        max_blanks: usize,
        blank_codes: &[EquivCode],
        suffix: &[EquivCode],
        accept: Accept,
    ) {
        if remaining > 0 {
            for &code in blank_codes {
                let next = self.force_next(node, code);
                self.do_b(
                    next,
                    remaining - 1,
                    seen + 1,
                    max_blanks,
                    blank_codes,
                    suffix,
                    accept,
                );
            }
            return;
        }
        let existing = self.trie.nodes[node as usize]
            .run
            .as_ref()
            .map(|run| run.target);
        let target = match existing {
            Some(target) => target,
            None => {
                let target = self.new_node();
                let mut is_blank = vec![false; self.trie.n_codes];
                for &code in blank_codes {
                    if let Some(b) = is_blank.get_mut(code as usize) {
                        *b = true;
                    }
                }
                self.trie.nodes[node as usize].run = Some(BlankRun {
                    is_blank,
                    max_blanks: max_blanks.saturating_sub(seen),
                    target,
                });
                target
            }
        };
        let end = self.extend(target, suffix);
        self.set_accept(end, accept);
    }

    /// Finish building, returning the trie and the ambiguous token pairs.
    pub fn finish(self) -> (Trie, Vec<(TokenKind, TokenKind)>) {
        (self.trie, self.ambiguities)
    }

    fn new_node(&mut self) -> NodeId {
        self.trie.nodes.push(Node::default());
        (self.trie.nodes.len() - 1) as NodeId
    }

    fn force_next(&mut self, node: NodeId, code: EquivCode) -> NodeId {
        if let Some(next) = self.trie.next(node, code) {
            return next;
        }
        let next = self.new_node();
        let n_codes = self.trie.n_codes;
        let edges = &mut self.trie.nodes[node as usize].next;
        if edges.is_empty() {
            edges.resize(n_codes, None);
        }
        if let Some(edge) = edges.get_mut(code as usize) {
            *edge = Some(next);
        }
        next
    }

    fn extend(&mut self, node: NodeId, codes: &[EquivCode]) -> NodeId {
        codes
            .iter()
            .fold(node, |node, &code| self.force_next(node, code))
    }

    fn set_accept(&mut self, node: NodeId, new: Accept) {
        let slot = &mut self.trie.nodes[node as usize].accept;
        let Some(old) = *slot else {
            *slot = Some(new);
            return;
        };
        if old.token == new.token && old.lookahead == new.lookahead {
            if new.priority > old.priority {
                *slot = Some(new);
            }
            return;
        }
        // Less lookahead means a longer token.
        if new.lookahead != old.lookahead {
            if new.lookahead < old.lookahead {
                *slot = Some(new);
            }
            return;
        }
        if new.priority > old.priority {
            *slot = Some(new);
        } else if new.priority == old.priority {
            let pair = (old.token, new.token);
            if !self.ambiguities.contains(&pair) {
                self.ambiguities.push(pair);
            }
        }
    }
}
