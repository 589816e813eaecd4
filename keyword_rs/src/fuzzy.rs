use std::rc::Rc;

use foldhash::HashSet;

use crate::clean_name::CleanName;
use crate::trie::{KeywordTrie, NodeId};

/// A trie node reachable from the start node within the edit budget.
///
/// `cost` is the Levenshtein distance between the target word and the edge
/// path leading to `node`; `depth` is that path's length in characters.
#[derive(Debug, Clone, Copy)]
pub struct FuzzyCandidate<'a> {
    pub node: NodeId,
    pub cost: usize,
    pub depth: usize,
    /// Payload of `node` when the candidate is an accepting node.
    pub clean_name: Option<&'a CleanName>,
}

/// Lazy enumerator of fuzzy-reachable word ends, in depth-first order.
///
/// Classic Wagner–Fischer rows are carried down the trie: each edge character
/// derives a new row from its parent's, and a branch is abandoned as soon as
/// the row minimum exceeds the budget. A node is a candidate when its final
/// cell is within budget and the node either accepts or has an outgoing
/// boundary-character edge (a word end inside the trie). Candidates are
/// yielded without descending further along that branch.
///
/// Both case edges of a shared child are traversed separately; distance is
/// case-exact, so the two spellings can reach a node at different costs.
/// Edges are visited in case-folded alphabetical order with the lowercase
/// spelling first, which makes enumeration order (and the scanner's
/// first-candidate choice) deterministic.
#[derive(Debug)]
pub struct FuzzyCandidates<'a> {
    trie: &'a KeywordTrie,
    non_word_boundaries: &'a HashSet<char>,
    word: Vec<char>,
    max_cost: usize,
    stack: Vec<Frame>,
}

#[derive(Debug)]
struct Frame {
    ch: char,
    node: NodeId,
    /// The parent's DP row, shared by sibling frames.
    rows: Rc<[usize]>,
    depth: usize,
}

impl<'a> FuzzyCandidates<'a> {
    pub(crate) fn from_node(
        trie: &'a KeywordTrie,
        non_word_boundaries: &'a HashSet<char>,
        start: NodeId,
        word: &str,
        max_cost: usize,
    ) -> Self {
        let word: Vec<char> = word.chars().collect();
        let rows: Rc<[usize]> = (0..=word.len()).collect();
        let mut candidates = FuzzyCandidates {
            trie,
            non_word_boundaries,
            word,
            max_cost,
            stack: Vec::new(),
        };
        candidates.push_children(start, &rows, 1);
        candidates
    }

    /// Pushes `node`'s edges so the stack pops them in case-folded
    /// alphabetical order, lowercase before uppercase.
    fn push_children(&mut self, node: NodeId, rows: &Rc<[usize]>, depth: usize) {
        fn visit_key(ch: char) -> (char, bool) {
            (ch.to_lowercase().next().unwrap_or(ch), ch.is_uppercase())
        }
        let mut edges: Vec<(char, NodeId)> = self
            .trie
            .node(node)
            .edges
            .iter()
            .map(|(&ch, &target)| (ch, target))
            .collect();
        edges.sort_unstable_by(|a, b| visit_key(b.0).cmp(&visit_key(a.0)));
        for (ch, target) in edges {
            self.stack.push(Frame {
                ch,
                node: target,
                rows: Rc::clone(rows),
                depth,
            });
        }
    }

    /// True when `node` ends a word inside the trie: it accepts, or some
    /// outgoing edge carries a boundary character.
    fn at_word_end(&self, node: NodeId) -> bool {
        let node = self.trie.node(node);
        node.clean_name.is_some()
            || node
                .edges
                .keys()
                .any(|ch| !self.non_word_boundaries.contains(ch))
    }
}

impl<'a> Iterator for FuzzyCandidates<'a> {
    type Item = FuzzyCandidate<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(Frame { ch, node, rows, depth }) = self.stack.pop() {
            let columns = self.word.len() + 1;
            let mut new_rows = Vec::with_capacity(columns);
            new_rows.push(rows[0] + 1);
            for col in 1..columns {
                let insert_cost = new_rows[col - 1] + 1;
                let delete_cost = rows[col] + 1;
                let replace_cost = rows[col - 1] + usize::from(self.word[col - 1] != ch);
                new_rows.push(insert_cost.min(delete_cost).min(replace_cost));
            }
            let cost = new_rows[columns - 1];

            if cost <= self.max_cost && self.at_word_end(node) {
                return Some(FuzzyCandidate {
                    node,
                    cost,
                    depth,
                    clean_name: self.trie.clean_name(node),
                });
            }
            if new_rows.iter().copied().min().unwrap_or(0) <= self.max_cost {
                let shared: Rc<[usize]> = new_rows.into();
                self.push_children(node, &shared, depth + 1);
            }
        }
        None
    }
}
