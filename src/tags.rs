/// Tag dictionary types and reference resolution
use indexmap::IndexMap;

/// Error types for resolving a marker reference against the tag store
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceError {
    /// A path segment was absent from the node being traversed
    NotFound(String),
    /// The referenced node flattened to zero options
    Empty(String),
}

impl std::fmt::Display for ReferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceError::NotFound(segment) => write!(f, "tag '{}' not found", segment),
            ReferenceError::Empty(path) => write!(f, "no options found for tag '{}'", path),
        }
    }
}

impl std::error::Error for ReferenceError {}

/// One node of a tag dictionary: a leaf option, an ordered sequence,
/// or an ordered mapping of named sub-collections.
///
/// The structure is built once from a tree-shaped source, so cycles
/// cannot occur and recursion over it always terminates.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Scalar(String),
    List(Vec<TagValue>),
    Map(IndexMap<String, TagValue>),
}

impl TagValue {
    /// Flatten this node into its option strings, depth-first.
    ///
    /// Scalars yield themselves, lists concatenate their elements in
    /// declaration order, and maps concatenate each key's flattened value
    /// in iteration order. Repeated option values stay distinct entries.
    pub fn flatten(&self) -> Vec<String> {
        let mut options = Vec::new();
        self.flatten_into(&mut options);
        options
    }

    fn flatten_into(&self, options: &mut Vec<String>) {
        match self {
            TagValue::Scalar(value) => options.push(value.clone()),
            TagValue::List(items) => {
                for item in items {
                    item.flatten_into(options);
                }
            }
            TagValue::Map(map) => {
                for value in map.values() {
                    value.flatten_into(options);
                }
            }
        }
    }
}

/// An in-memory tag dictionary, keyed by top-level tag name.
///
/// Immutable once handed to a [`Selector`](crate::Selector): the store is
/// replaced wholesale on reload rather than mutated in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TagStore {
    tags: IndexMap<String, TagValue>,
}

impl TagStore {
    /// Create an empty store
    pub fn new() -> Self {
        TagStore {
            tags: IndexMap::new(),
        }
    }

    /// Add a top-level tag, replacing any previous value under that name
    pub fn insert(&mut self, name: impl Into<String>, value: TagValue) {
        self.tags.insert(name.into(), value);
    }

    /// Look up a top-level tag by name
    pub fn get(&self, name: &str) -> Option<&TagValue> {
        self.tags.get(name)
    }

    /// Names of all top-level tags, in load order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl FromIterator<(String, TagValue)> for TagStore {
    fn from_iter<I: IntoIterator<Item = (String, TagValue)>>(iter: I) -> Self {
        TagStore {
            tags: iter.into_iter().collect(),
        }
    }
}

/// Resolve a colon-path against the store and flatten the node it lands on.
///
/// Traversal starts at `store[path[0]]`; every further segment must name a
/// key of the current mapping node. Fails with [`ReferenceError::NotFound`]
/// naming the first missing segment, or [`ReferenceError::Empty`] if the
/// final node flattens to nothing.
pub fn resolve(store: &TagStore, path: &[String]) -> Result<Vec<String>, ReferenceError> {
    let first = path
        .first()
        .ok_or_else(|| ReferenceError::NotFound(String::new()))?;
    let mut node = store
        .get(first)
        .ok_or_else(|| ReferenceError::NotFound(first.clone()))?;

    for segment in &path[1..] {
        node = match node {
            TagValue::Map(map) => map.get(segment.as_str()),
            _ => None,
        }
        .ok_or_else(|| ReferenceError::NotFound(segment.clone()))?;
    }

    let options = node.flatten();
    if options.is_empty() {
        return Err(ReferenceError::Empty(path.join(":")));
    }
    Ok(options)
}
