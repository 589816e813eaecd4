use foldhash::{HashMap, HashMapExt};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::clean_name::CleanName;

/// Identity of a node inside the keyword store.
///
/// Nodes live in an arena and are addressed by index, so two edges carrying
/// the same [NodeId] point at the *same* node. That is what turns the trie
/// into a DAG in mixed-case mode: the upper- and lower-case edges of a letter
/// resolve to one shared child, and identity comparison is plain `==`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

const ROOT: NodeId = NodeId(0);

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub(crate) struct TrieNode {
    pub(crate) edges: HashMap<char, NodeId>,
    pub(crate) clean_name: Option<CleanName>,
}

/// Arena-backed character trie holding every registered keyword.
///
/// Nodes reference children through `char → NodeId` edges; removed nodes go
/// onto a free list and are reused by later insertions. A node is accepting
/// iff it carries a [CleanName] payload, and `word_count` tracks accepting
/// nodes (counted once per node, not per edge).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub(crate) struct KeywordTrie {
    nodes: Vec<TrieNode>,
    free: Vec<NodeId>,
    case_sensitive: bool,
    word_count: usize,
}

/// Simple per-character case folding: a character participates in case
/// sharing only when both of its foldings are a single scalar value.
/// Multi-scalar foldings behave like uncased characters and get one edge.
fn fold_pair(ch: char) -> Option<(char, char)> {
    let mut lower = ch.to_lowercase();
    let mut upper = ch.to_uppercase();
    match (lower.next(), lower.next(), upper.next(), upper.next()) {
        (Some(l), None, Some(u), None) if l != u => Some((l, u)),
        _ => None,
    }
}

impl KeywordTrie {
    pub(crate) fn new(case_sensitive: bool) -> Self {
        KeywordTrie {
            nodes: vec![TrieNode::default()],
            free: Vec::new(),
            case_sensitive,
            word_count: 0,
        }
    }

    #[inline]
    pub(crate) fn root(&self) -> NodeId {
        ROOT
    }

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &TrieNode {
        &self.nodes[id.index()]
    }

    #[inline]
    pub(crate) fn child(&self, id: NodeId, ch: char) -> Option<NodeId> {
        self.nodes[id.index()].edges.get(&ch).copied()
    }

    #[inline]
    pub(crate) fn clean_name(&self, id: NodeId) -> Option<&CleanName> {
        self.nodes[id.index()].clean_name.as_ref()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.word_count
    }

    /// Installs `clean_name` at the end of `word`'s path, creating nodes as
    /// needed. Returns whether a new keyword was registered; re-inserting an
    /// existing keyword overwrites its payload without touching the count.
    pub(crate) fn insert(&mut self, word: &str, clean_name: CleanName) -> bool {
        debug_assert!(!word.is_empty());
        let mut cur = ROOT;
        for ch in word.chars() {
            cur = if self.case_sensitive {
                self.descend_or_create(cur, ch)
            } else {
                self.descend_or_create_folded(cur, ch)
            };
        }
        let node = &mut self.nodes[cur.index()];
        let is_new = node.clean_name.is_none();
        node.clean_name = Some(clean_name);
        if is_new {
            self.word_count += 1;
        }
        is_new
    }

    /// Removes `word` if present, pruning every node the removal leaves with
    /// no payload and no edges. The walk follows the literal characters of
    /// `word`: in mixed-case mode both case edges exist, so any stored
    /// spelling resolves without folding.
    pub(crate) fn remove(&mut self, word: &str) -> bool {
        if word.is_empty() {
            return false;
        }
        let mut path = Vec::new();
        let mut cur = ROOT;
        for ch in word.chars() {
            match self.child(cur, ch) {
                Some(next) => {
                    path.push((ch, cur));
                    cur = next;
                }
                None => return false,
            }
        }
        if self.nodes[cur.index()].clean_name.is_none() {
            return false;
        }
        self.nodes[cur.index()].clean_name = None;
        self.word_count -= 1;

        // Bubble up: detach each node that ended up empty, dropping the
        // sibling case edge when it points at the same child.
        let mut child = cur;
        for (ch, parent) in path.into_iter().rev() {
            let node = &self.nodes[child.index()];
            if node.clean_name.is_some() || !node.edges.is_empty() {
                break;
            }
            self.nodes[parent.index()].edges.remove(&ch);
            if let Some((lower, upper)) = fold_pair(ch) {
                let other = if ch == lower { upper } else { lower };
                if self.nodes[parent.index()].edges.get(&other) == Some(&child) {
                    self.nodes[parent.index()].edges.remove(&other);
                }
            }
            self.release(child);
            child = parent;
        }
        true
    }

    /// Literal walk along `word`; no case folding (see [Self::remove]).
    pub(crate) fn lookup(&self, word: &str) -> Option<NodeId> {
        let mut cur = ROOT;
        for ch in word.chars() {
            cur = self.child(cur, ch)?;
        }
        Some(cur)
    }

    /// Depth-first enumeration of every accepting node, one entry per node.
    ///
    /// Edges are grouped by target identity so a case-shared child is visited
    /// once, under its lowercase edge character; without the grouping a
    /// mixed-case store would be walked once per spelling.
    pub(crate) fn all_keywords(&self) -> HashMap<String, CleanName> {
        let mut out = HashMap::with_capacity(self.word_count);
        let mut prefix = String::new();
        self.collect_keywords(ROOT, &mut prefix, &mut out);
        out
    }

    fn collect_keywords(
        &self,
        id: NodeId,
        prefix: &mut String,
        out: &mut HashMap<String, CleanName>,
    ) {
        let node = self.node(id);
        if let Some(clean_name) = &node.clean_name {
            out.insert(prefix.clone(), clean_name.clone());
        }
        let mut edges: Vec<(char, NodeId)> = node.edges.iter().map(|(&c, &n)| (c, n)).collect();
        edges.sort_unstable_by_key(|&(ch, _)| (ch.to_lowercase().next().unwrap_or(ch), ch.is_uppercase()));
        // at most two edges (the case pair) can share a target
        let mut visited: Vec<NodeId> = Vec::new();
        for (ch, target) in edges {
            if visited.contains(&target) {
                continue;
            }
            visited.push(target);
            prefix.push(ch);
            self.collect_keywords(target, prefix, out);
            prefix.pop();
        }
    }

    fn descend_or_create(&mut self, cur: NodeId, ch: char) -> NodeId {
        if let Some(next) = self.child(cur, ch) {
            return next;
        }
        let next = self.allocate();
        self.nodes[cur.index()].edges.insert(ch, next);
        next
    }

    /// Mixed-case descent: reuse whichever case edge already exists, then
    /// bind *both* case edges to the chosen child.
    fn descend_or_create_folded(&mut self, cur: NodeId, ch: char) -> NodeId {
        let Some((lower, upper)) = fold_pair(ch) else {
            return self.descend_or_create(cur, ch);
        };
        let edges = &self.nodes[cur.index()].edges;
        let existing = edges.get(&lower).or_else(|| edges.get(&upper)).copied();
        let next = existing.unwrap_or_else(|| self.allocate());
        let edges = &mut self.nodes[cur.index()].edges;
        edges.insert(lower, next);
        edges.insert(upper, next);
        next
    }

    fn allocate(&mut self) -> NodeId {
        match self.free.pop() {
            Some(id) => id,
            None => {
                let id = NodeId(u32::try_from(self.nodes.len()).expect("node arena overflow"));
                self.nodes.push(TrieNode::default());
                id
            }
        }
    }

    fn release(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.index()];
        node.edges.clear();
        node.clean_name = None;
        self.free.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_edges_share_one_child() {
        let mut trie = KeywordTrie::new(false);
        trie.insert("ab", CleanName::from("ab"));
        let root = trie.root();
        assert_eq!(trie.child(root, 'a'), trie.child(root, 'A'));
        let mid = trie.child(root, 'a').unwrap();
        assert_eq!(trie.child(mid, 'b'), trie.child(mid, 'B'));
        assert_ne!(trie.child(root, 'a'), trie.child(mid, 'b'));
    }

    #[test]
    fn case_sensitive_keeps_single_edges() {
        let mut trie = KeywordTrie::new(true);
        trie.insert("a", CleanName::from("a"));
        assert!(trie.child(trie.root(), 'a').is_some());
        assert!(trie.child(trie.root(), 'A').is_none());
    }

    #[test]
    fn removal_collapses_case_pairs_and_reuses_nodes() {
        let mut trie = KeywordTrie::new(false);
        trie.insert("ab", CleanName::from("ab"));
        assert!(trie.remove("aB"));
        assert!(trie.node(trie.root()).edges.is_empty());
        assert_eq!(trie.len(), 0);

        // freed nodes come back out of the arena
        let nodes_before = trie.nodes.len();
        trie.insert("xy", CleanName::from("xy"));
        assert_eq!(trie.nodes.len(), nodes_before);
    }

    #[test]
    fn removal_stops_at_shared_prefix() {
        let mut trie = KeywordTrie::new(true);
        trie.insert("ab", CleanName::from("ab"));
        trie.insert("abc", CleanName::from("abc"));
        assert!(trie.remove("abc"));
        assert_eq!(trie.len(), 1);
        assert!(trie.lookup("ab").is_some_and(|id| trie.clean_name(id).is_some()));
        assert!(trie.lookup("abc").is_none());
    }

    #[test]
    fn uncased_characters_get_one_edge() {
        let mut trie = KeywordTrie::new(false);
        trie.insert("a_1", CleanName::from("a_1"));
        let mid = trie.child(trie.root(), 'A').unwrap();
        assert_eq!(trie.node(mid).edges.len(), 1);
    }
}
