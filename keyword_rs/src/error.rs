use thiserror::Error;

/// Failure conditions surfaced by the mapping-style accessors.
///
/// Scans that find nothing, removals of absent keywords, and boundary-set
/// edits are not errors; they report through their return values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeywordError {
    /// Mapping-style lookup of a keyword that was never added.
    #[error("keyword not found: {0:?}")]
    MissingKeyword(String),

    /// Direct iteration over a processor is deliberately unsupported:
    /// enumeration order over the shared-node store is ambiguous. Call
    /// `get_all_keywords` to materialise the keyword map instead.
    #[error("iteration over a keyword processor is not supported; use get_all_keywords")]
    IterationUnsupported,
}
