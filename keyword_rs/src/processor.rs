use std::ops::Index;

use foldhash::{HashMap, HashSet, HashSetExt};
use log::{debug, trace};
#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::clean_name::CleanName;
use crate::error::KeywordError;
use crate::fuzzy::FuzzyCandidates;
use crate::trie::{KeywordTrie, NodeId};

/// A single extracted occurrence, with byte offsets into the scanned text.
///
/// `start..end` always falls on character boundaries, so the span can be
/// sliced back out of the input directly. A multi-label keyword produces one
/// [KeywordSpan] per clean name, all carrying the same offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct KeywordSpan<'a> {
    pub clean_name: &'a str,
    pub start: usize,
    pub end: usize,
}

/// One committed match before multi-label fan-out.
#[derive(Clone, Copy)]
struct RawMatch<'a> {
    clean_name: &'a CleanName,
    start: usize,
    end: usize,
}

/// A high-throughput multi-keyword extractor and replacer.
///
/// Keywords live in a character trie scanned in a single left-to-right pass,
/// so extraction cost is linear in the text length regardless of how many
/// keywords are registered. Matches are non-overlapping, leftmost-longest,
/// and only reported when both ends sit on a word boundary.
///
/// In mixed-case mode (`case_sensitive = false`) the upper- and lower-case
/// edges of every letter share one child node, so any spelling of a stored
/// keyword resolves without transforming the input text.
///
/// # Example
///
/// ```
/// use keyword_rs::KeywordProcessor;
///
/// let mut processor = KeywordProcessor::new(false);
/// processor.add_keyword_with_clean_name("Big Apple", "New York");
/// processor.add_keyword("Bay Area");
///
/// assert_eq!(
///     processor.extract_keywords("I love the big apple and the bay area"),
///     ["New York", "Bay Area"],
/// );
/// assert_eq!(
///     processor.replace_keywords("I love the Big Apple."),
///     "I love the New York.",
/// );
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeywordProcessor {
    case_sensitive: bool,
    non_word_boundaries: HashSet<char>,
    trie: KeywordTrie,
}

fn default_non_word_boundaries() -> HashSet<char> {
    let mut set = HashSet::with_capacity(63);
    set.extend('a'..='z');
    set.extend('A'..='Z');
    set.extend('0'..='9');
    set.insert('_');
    set
}

impl KeywordProcessor {
    /// Creates an empty processor. `case_sensitive` is fixed for the
    /// processor's lifetime; the boundary set starts as ASCII letters,
    /// digits and underscore and can be edited at any time.
    pub fn new(case_sensitive: bool) -> Self {
        KeywordProcessor {
            case_sensitive,
            non_word_boundaries: default_non_word_boundaries(),
            trie: KeywordTrie::new(case_sensitive),
        }
    }

    /// Number of distinct keywords registered.
    pub fn len(&self) -> usize {
        self.trie.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// The characters considered *inside* a word; everything else delimits
    /// words. Matches must be flanked by delimiters (or text ends).
    pub fn non_word_boundaries(&self) -> &HashSet<char> {
        &self.non_word_boundaries
    }

    /// Mutable access to the boundary set. Edits take effect on the next
    /// scan; scans in flight are unaffected because they borrow the set.
    pub fn non_word_boundaries_mut(&mut self) -> &mut HashSet<char> {
        &mut self.non_word_boundaries
    }

    /// Registers `word` mapping to itself. Returns whether the keyword is
    /// new; re-adding an existing keyword returns `false`.
    pub fn add_keyword(&mut self, word: impl AsRef<str>) -> bool {
        let word = word.as_ref();
        self.add_keyword_with_clean_name(word, word)
    }

    /// Registers `word` mapping to `clean_name` (a single name or an ordered
    /// list of names). An empty clean name falls back to the keyword itself;
    /// an empty keyword is a no-op returning `false`. Re-adding an existing
    /// keyword overwrites its clean name and returns `false`.
    pub fn add_keyword_with_clean_name(
        &mut self,
        word: impl AsRef<str>,
        clean_name: impl Into<CleanName>,
    ) -> bool {
        let word = word.as_ref();
        if word.is_empty() {
            return false;
        }
        let mut clean_name = clean_name.into();
        if clean_name.is_empty() {
            clean_name = CleanName::from(word);
        }
        let added = self.trie.insert(word, clean_name);
        if added {
            trace!("registered keyword {word:?}");
        }
        added
    }

    /// Bulk registration of bare keywords, each mapping to itself.
    pub fn add_keywords_from_iter<I>(&mut self, iter: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for word in iter {
            self.add_keyword(word);
        }
    }

    /// Bulk registration of `(keyword, clean name)` pairs.
    pub fn add_keywords_with_clean_name_from_iter<I, W, C>(&mut self, iter: I)
    where
        I: IntoIterator<Item = (W, C)>,
        W: AsRef<str>,
        C: Into<CleanName>,
    {
        for (word, clean_name) in iter {
            self.add_keyword_with_clean_name(word, clean_name);
        }
    }

    /// Deletes `word` and prunes any branch the deletion leaves unused.
    /// Returns whether a keyword was removed. The walk is literal: in
    /// mixed-case mode every stored spelling resolves, so `"TeSt"` removes a
    /// keyword added as `"test"`.
    pub fn remove_keyword(&mut self, word: impl AsRef<str>) -> bool {
        let word = word.as_ref();
        let removed = self.trie.remove(word);
        if removed {
            debug!("removed keyword {word:?}, {} remaining", self.len());
        }
        removed
    }

    /// The clean name stored for `word`, if present.
    pub fn get_keyword(&self, word: impl AsRef<str>) -> Option<&CleanName> {
        self.trie
            .lookup(word.as_ref())
            .and_then(|node| self.trie.clean_name(node))
    }

    pub fn contains(&self, word: impl AsRef<str>) -> bool {
        self.get_keyword(word).is_some()
    }

    /// Every registered keyword and its clean name, one entry per accepting
    /// node. Mixed-case spellings of one keyword share a node and therefore
    /// produce a single entry, under the representative spelling.
    pub fn get_all_keywords(&self) -> HashMap<String, CleanName> {
        self.trie.all_keywords()
    }

    /// Mapping-style lookup; absent keys surface
    /// [KeywordError::MissingKeyword].
    pub fn get(&self, key: &str) -> Result<&CleanName, KeywordError> {
        self.get_keyword(key)
            .ok_or_else(|| KeywordError::MissingKeyword(key.to_owned()))
    }

    /// Mapping-style insert; see [Self::add_keyword_with_clean_name].
    pub fn set(&mut self, key: impl AsRef<str>, clean_name: impl Into<CleanName>) -> bool {
        self.add_keyword_with_clean_name(key, clean_name)
    }

    /// Mapping-style removal; see [Self::remove_keyword].
    pub fn delete(&mut self, key: impl AsRef<str>) -> bool {
        self.remove_keyword(key)
    }

    /// Direct iteration is deliberately unsupported because enumeration
    /// order over the shared-node store is ambiguous; the call always
    /// returns [KeywordError::IterationUnsupported]. Use
    /// [Self::get_all_keywords] to materialise the keyword map.
    pub fn iter(&self) -> Result<std::iter::Empty<(String, CleanName)>, KeywordError> {
        Err(KeywordError::IterationUnsupported)
    }

    /// Scans `text` once and returns the clean names of every keyword
    /// occurrence sitting at word boundaries, leftmost-longest first. A
    /// multi-label keyword contributes each of its names in order.
    pub fn extract_keywords<'a>(&'a self, text: &str) -> Vec<&'a str> {
        self.scan(text, 0)
            .into_iter()
            .flat_map(|found| found.clean_name.names())
            .collect()
    }

    /// Like [Self::extract_keywords], but each name carries the byte span
    /// of its occurrence.
    ///
    /// ```
    /// use keyword_rs::KeywordProcessor;
    ///
    /// let mut processor = KeywordProcessor::new(false);
    /// processor.add_keyword("apple");
    ///
    /// let spans = processor.extract_keywords_with_span("an apple.");
    /// assert_eq!((spans[0].clean_name, spans[0].start, spans[0].end), ("apple", 3, 8));
    /// ```
    pub fn extract_keywords_with_span<'a>(&'a self, text: &str) -> Vec<KeywordSpan<'a>> {
        Self::fan_out(self.scan(text, 0))
    }

    /// Fuzzy extraction: when the scan cannot advance on the next character
    /// it may extend the current walk across small errors, spending edit
    /// distance from a budget of `max_cost` per candidate sequence. A zero
    /// budget is exact extraction.
    pub fn extract_keywords_fuzzy<'a>(&'a self, text: &str, max_cost: usize) -> Vec<&'a str> {
        self.scan(text, max_cost)
            .into_iter()
            .flat_map(|found| found.clean_name.names())
            .collect()
    }

    /// Fuzzy extraction with byte spans; see [Self::extract_keywords_fuzzy].
    pub fn extract_keywords_with_span_fuzzy<'a>(
        &'a self,
        text: &str,
        max_cost: usize,
    ) -> Vec<KeywordSpan<'a>> {
        Self::fan_out(self.scan(text, max_cost))
    }

    /// Rewrites `text`, substituting every match with the first clean name
    /// of its keyword. Everything outside matches is copied verbatim, and
    /// substituted text is never rescanned.
    pub fn replace_keywords(&self, text: &str) -> String {
        self.replace_within_cost(text, 0)
    }

    /// Replacement over the fuzzy scan; see [Self::extract_keywords_fuzzy].
    pub fn replace_keywords_fuzzy(&self, text: &str, max_cost: usize) -> String {
        self.replace_within_cost(text, max_cost)
    }

    /// Lazily enumerates trie nodes within edit distance `max_cost` of
    /// `word` that end a stored word: accepting nodes, and nodes whose
    /// outgoing edges include a boundary character.
    ///
    /// ```
    /// use keyword_rs::KeywordProcessor;
    ///
    /// let mut processor = KeywordProcessor::new(true);
    /// processor.add_keyword("apple");
    /// processor.add_keyword("banana");
    ///
    /// let candidate = processor.levensthein("aple", 1).next().unwrap();
    /// assert_eq!(candidate.cost, 1);
    /// assert_eq!(candidate.clean_name.unwrap().first(), "apple");
    /// ```
    pub fn levensthein<'a>(&'a self, word: &str, max_cost: usize) -> FuzzyCandidates<'a> {
        FuzzyCandidates::from_node(
            &self.trie,
            &self.non_word_boundaries,
            self.trie.root(),
            word,
            max_cost,
        )
    }

    /// Extracts from each text. Runs in parallel with the `rayon` feature,
    /// sequentially without it.
    pub fn batch_extract_keywords<'a>(&'a self, texts: &[&str]) -> Vec<Vec<&'a str>> {
        #[cfg(feature = "rayon")]
        {
            texts
                .par_iter()
                .map(|&text| self.extract_keywords(text))
                .collect()
        }
        #[cfg(not(feature = "rayon"))]
        {
            texts
                .iter()
                .map(|&text| self.extract_keywords(text))
                .collect()
        }
    }

    /// Replaces within each text. Runs in parallel with the `rayon`
    /// feature, sequentially without it.
    pub fn batch_replace_keywords(&self, texts: &[&str]) -> Vec<String> {
        #[cfg(feature = "rayon")]
        {
            texts
                .par_iter()
                .map(|&text| self.replace_keywords(text))
                .collect()
        }
        #[cfg(not(feature = "rayon"))]
        {
            texts
                .iter()
                .map(|&text| self.replace_keywords(text))
                .collect()
        }
    }

    fn fan_out(matches: Vec<RawMatch<'_>>) -> Vec<KeywordSpan<'_>> {
        matches
            .into_iter()
            .flat_map(|found| {
                found.clean_name.names().map(move |clean_name| KeywordSpan {
                    clean_name,
                    start: found.start,
                    end: found.end,
                })
            })
            .collect()
    }

    fn replace_within_cost(&self, text: &str, max_cost: usize) -> String {
        let mut output = String::with_capacity(text.len());
        let mut prev_end = 0;
        for found in self.scan(text, max_cost) {
            output.push_str(&text[prev_end..found.start]);
            output.push_str(found.clean_name.first());
            prev_end = found.end;
        }
        output.push_str(&text[prev_end..]);
        output
    }

    /// The longest prefix of inside-word characters starting at `from`.
    fn next_word(&self, chars: &[(usize, char)], from: usize) -> String {
        chars[from..]
            .iter()
            .map(|&(_, ch)| ch)
            .take_while(|ch| self.non_word_boundaries.contains(ch))
            .collect()
    }

    /// First fuzzy continuation from `from` along `word`, if any, with the
    /// distance it costs.
    fn fuzzy_continuation(
        &self,
        from: NodeId,
        word: &str,
        max_cost: usize,
    ) -> Option<(NodeId, usize)> {
        FuzzyCandidates::from_node(&self.trie, &self.non_word_boundaries, from, word, max_cost)
            .next()
            .map(|candidate| (candidate.node, candidate.cost))
    }

    /// The single-pass longest-match scan shared by extraction and
    /// replacement.
    ///
    /// Two cursors move together: `idx` walks the text while `cursor` walks
    /// the trie, and `sequence_start` remembers where the active walk left
    /// the root. On a separator the walk either commits (the most recent
    /// accepting node wins, favouring the longest continuation reachable
    /// through in-keyword separators) or resets. With a positive `max_cost`,
    /// a cursor that cannot advance tries to buy its way through the next
    /// word via bounded edit distance before giving up; spent distance
    /// accumulates across the words of one candidate sequence and the budget
    /// is restored whenever the cursor resets to the root.
    fn scan<'a>(&'a self, text: &str, max_cost: usize) -> Vec<RawMatch<'a>> {
        let mut matches = Vec::new();
        if text.is_empty() {
            return matches;
        }
        trace!("scanning {} bytes with edit budget {max_cost}", text.len());

        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let n = chars.len();
        let byte_at = |i: usize| if i < n { chars[i].0 } else { text.len() };

        let root = self.trie.root();
        let mut cursor = root;
        let mut sequence_start = 0usize;
        let mut reset_cursor = false;
        let mut budget = max_cost;
        let mut idx = 0usize;

        while idx < n {
            let ch = chars[idx].1;
            if !self.non_word_boundaries.contains(&ch) {
                // Separator: the active walk can commit here, or continue
                // through an in-keyword separator edge.
                if self.trie.clean_name(cursor).is_some() || self.trie.child(cursor, ch).is_some() {
                    let mut longest = None;
                    let mut sequence_end = 0usize;
                    let mut longer_found = false;

                    if let Some(clean_name) = self.trie.clean_name(cursor) {
                        longest = Some(clean_name);
                        sequence_end = idx;
                    }
                    if let Some(continued) = self.trie.child(cursor, ch) {
                        let mut inner = continued;
                        let mut idy = idx + 1;
                        let mut abandoned = false;
                        while idy < n {
                            let inner_ch = chars[idy].1;
                            if !self.non_word_boundaries.contains(&inner_ch) {
                                if let Some(clean_name) = self.trie.clean_name(inner) {
                                    longest = Some(clean_name);
                                    sequence_end = idy;
                                    longer_found = true;
                                }
                            }
                            if let Some(next) = self.trie.child(inner, inner_ch) {
                                inner = next;
                            } else if budget > 0 {
                                let next_word = self.next_word(&chars, idy);
                                let word_len = next_word.chars().count();
                                match self.fuzzy_continuation(inner, &next_word, budget) {
                                    Some((node, cost)) => {
                                        budget -= cost;
                                        idy = idy + word_len - 1;
                                        inner = node;
                                    }
                                    None => {
                                        abandoned = true;
                                        break;
                                    }
                                }
                            } else {
                                abandoned = true;
                                break;
                            }
                            idy += 1;
                        }
                        if !abandoned {
                            // ran off the end of the text mid-walk
                            if let Some(clean_name) = self.trie.clean_name(inner) {
                                longest = Some(clean_name);
                                sequence_end = idy;
                                longer_found = true;
                            }
                        }
                        if longer_found {
                            idx = sequence_end;
                        }
                    }
                    if let Some(clean_name) = longest {
                        matches.push(RawMatch {
                            clean_name,
                            start: byte_at(sequence_start),
                            end: byte_at(idx),
                        });
                    }
                }
                cursor = root;
                reset_cursor = true;
            } else if let Some(next) = self.trie.child(cursor, ch) {
                cursor = next;
            } else if budget > 0 {
                let next_word = self.next_word(&chars, idx);
                let word_len = next_word.chars().count();
                match self.fuzzy_continuation(cursor, &next_word, budget) {
                    Some((node, cost)) => {
                        budget -= cost;
                        cursor = node;
                    }
                    None => {
                        cursor = root;
                        reset_cursor = true;
                    }
                }
                idx = idx + word_len - 1;
            } else {
                cursor = root;
                reset_cursor = true;
                // skip to the end of the current word
                let mut idy = idx + 1;
                while idy < n {
                    if !self.non_word_boundaries.contains(&chars[idy].1) {
                        break;
                    }
                    idy += 1;
                }
                idx = idy;
            }

            // end of text: commit a pending accepting walk
            if idx + 1 >= n {
                if let Some(clean_name) = self.trie.clean_name(cursor) {
                    matches.push(RawMatch {
                        clean_name,
                        start: byte_at(sequence_start),
                        end: text.len(),
                    });
                }
            }
            idx += 1;
            if reset_cursor {
                reset_cursor = false;
                sequence_start = idx;
                budget = max_cost;
            }
        }
        debug!("scan finished with {} matches", matches.len());
        matches
    }
}

impl Default for KeywordProcessor {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Index<&str> for KeywordProcessor {
    type Output = CleanName;

    /// Mapping-style access; panics on an absent key the way the standard
    /// map types do. Use [KeywordProcessor::get] for a fallible lookup.
    fn index(&self, key: &str) -> &CleanName {
        self.get_keyword(key)
            .unwrap_or_else(|| panic!("keyword not found: {key:?}"))
    }
}
