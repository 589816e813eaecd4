use std::borrow::Cow;
use std::slice;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The label(s) a keyword maps to.
///
/// Most keywords carry a single clean name; a keyword may instead carry an
/// ordered list of names, in which case extraction reports every name and
/// replacement uses the first. List order is preserved as given.
///
/// # Example
///
/// ```
/// use keyword_rs::{CleanName, KeywordProcessor};
///
/// let mut processor = KeywordProcessor::new(false);
/// processor.add_keyword_with_clean_name("Apple", ["Fruit", "Tech"]);
/// assert_eq!(
///     processor.get_keyword("Apple"),
///     Some(&CleanName::Many(vec!["Fruit".into(), "Tech".into()]))
/// );
/// assert_eq!(processor.extract_keywords("I have an Apple"), ["Fruit", "Tech"]);
/// assert_eq!(processor.replace_keywords("I have an Apple"), "I have an Fruit");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CleanName {
    Single(String),
    Many(Vec<String>),
}

impl CleanName {
    /// Every name, in insertion order. A `Single` yields exactly one.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        match self {
            CleanName::Single(name) => slice::from_ref(name),
            CleanName::Many(names) => names.as_slice(),
        }
        .iter()
        .map(String::as_str)
    }

    /// The replacement name: the single name, or the head of the list.
    pub fn first(&self) -> &str {
        self.names().next().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        match self {
            CleanName::Single(_) => 1,
            CleanName::Many(names) => names.len(),
        }
    }

    /// True when there is no usable name, i.e. an empty single name or an
    /// empty list. Such payloads are never stored; insertion falls back to
    /// the keyword itself.
    pub fn is_empty(&self) -> bool {
        match self {
            CleanName::Single(name) => name.is_empty(),
            CleanName::Many(names) => names.is_empty(),
        }
    }
}

impl From<String> for CleanName {
    fn from(name: String) -> Self {
        CleanName::Single(name)
    }
}

impl From<&str> for CleanName {
    fn from(name: &str) -> Self {
        CleanName::Single(name.to_owned())
    }
}

impl<'a> From<Cow<'a, str>> for CleanName {
    fn from(name: Cow<'a, str>) -> Self {
        CleanName::Single(name.into_owned())
    }
}

impl From<Vec<String>> for CleanName {
    fn from(names: Vec<String>) -> Self {
        CleanName::Many(names)
    }
}

impl From<Vec<&str>> for CleanName {
    fn from(names: Vec<&str>) -> Self {
        CleanName::Many(names.into_iter().map(str::to_owned).collect())
    }
}

impl From<&[&str]> for CleanName {
    fn from(names: &[&str]) -> Self {
        CleanName::Many(names.iter().map(|&name| name.to_owned()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for CleanName {
    fn from(names: [&str; N]) -> Self {
        CleanName::Many(names.iter().map(|&name| name.to_owned()).collect())
    }
}

impl FromIterator<String> for CleanName {
    fn from_iter<I: IntoIterator<Item = String>>(names: I) -> Self {
        CleanName::Many(names.into_iter().collect())
    }
}
