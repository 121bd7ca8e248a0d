/// Prompt Selector - template expansion over hierarchical tag dictionaries
///
/// This library expands `@[N[-M]$$]ref@` markers embedded in free-form
/// text against a named tag dictionary, either by deterministically
/// enumerating every combination for sequential round-robin traversal or
/// by drawing a fresh random selection per call.
///
/// # Example
///
/// ```
/// use prompt_selector::{SelectionMode, Selector, TagStore, TagValue};
///
/// let mut store = TagStore::new();
/// store.insert(
///     "color",
///     TagValue::List(vec![
///         TagValue::Scalar("red".to_string()),
///         TagValue::Scalar("blue".to_string()),
///     ]),
/// );
///
/// let mut selector = Selector::new(store).with_mode(SelectionMode::RoundRobin);
/// assert_eq!(selector.count_combinations("a @color@ shirt").unwrap(), 2);
///
/// let step = selector.round_robin_step("a @color@ shirt").unwrap();
/// assert_eq!(step.text, "a red shirt");
/// assert_eq!(step.label, "1/2 color");
/// ```
pub mod combinations;
pub mod loader;
pub mod parser;
pub mod selector;
pub mod tags;

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Re-export main types for convenience
pub use combinations::{count_combinations, enumerate_combinations, Expansion};
pub use loader::{LoadError, TagSource};
pub use parser::Marker;
pub use selector::{RoundRobinStep, SelectionMode, Selector, SelectorError};
pub use tags::{resolve, ReferenceError, TagStore, TagValue};

/// Parse all substitution markers in a text
///
/// # Example
/// ```
/// use prompt_selector::parse;
///
/// let markers = parse("a @color@ @1-2$$size@ shirt");
/// assert_eq!(markers.len(), 2);
/// ```
pub fn parse(text: &str) -> Vec<Marker> {
    parser::parse(text)
}

/// Expand a text once with a deterministic random draw per marker
///
/// This is a convenience wrapper for one-shot use; hold a [`Selector`]
/// instead when expanding repeatedly against the same store.
///
/// # Example
/// ```
/// use prompt_selector::{expand_random_with_seed, TagStore, TagValue};
///
/// let mut store = TagStore::new();
/// store.insert("color", TagValue::Scalar("red".to_string()));
/// let output = expand_random_with_seed(&store, "a @color@ shirt", 42);
/// assert_eq!(output, "a red shirt");
/// ```
pub fn expand_random_with_seed(store: &TagStore, text: &str, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    selector::random_expand_with(store, text, &mut rng)
}
