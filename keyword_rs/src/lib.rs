//! Multi-keyword extraction and replacement over arbitrary text.
//!
//! Keywords are stored in a character trie (a DAG in mixed-case mode, where
//! both case edges of a letter share one child) and matched in a single
//! linear pass with word-boundary semantics, which outruns a compiled
//! alternation regex by orders of magnitude once the dictionary grows to
//! tens of thousands of entries. Scanning, replacement and a bounded
//! edit-distance ("fuzzy") mode all run off the same structure.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod clean_name;
pub use clean_name::CleanName;

mod error;
pub use error::KeywordError;

mod fuzzy;
pub use fuzzy::{FuzzyCandidate, FuzzyCandidates};

mod processor;
pub use processor::{KeywordProcessor, KeywordSpan};

mod trie;
pub use trie::NodeId;
