/// Stateful selection over template expansions
///
/// A [`Selector`] owns the tag store for its lifetime and drives the two
/// expansion strategies: cache-backed round-robin traversal of the full
/// enumeration, and independent per-call random draws. One selector serves
/// one generation session; calls against the same instance must be
/// serialized by the caller, there is no internal locking.
use crate::combinations::{count_combinations, enumerate_combinations, Expansion, OPTION_SEPARATOR};
use crate::parser::{self, Marker};
use crate::tags::{resolve, ReferenceError, TagStore};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

/// Upper bound on marker substitutions per random-expansion call, a
/// safety valve against options that themselves contain markers
pub const MAX_RANDOM_ITERATIONS: usize = 100;

/// How the selector picks an expansion per call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Sequential traversal of the cached enumeration, wrapping at the end
    RoundRobin,
    /// Fresh independent draw per marker on every call
    Random,
}

impl std::fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionMode::RoundRobin => write!(f, "round_robin"),
            SelectionMode::Random => write!(f, "random"),
        }
    }
}

impl std::str::FromStr for SelectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "round_robin" | "round-robin" => Ok(SelectionMode::RoundRobin),
            "random" => Ok(SelectionMode::Random),
            other => Err(format!("unknown selection mode '{}'", other)),
        }
    }
}

/// Error types for selector operations
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorError {
    Reference(ReferenceError),
    /// A cached expansion's length no longer matches the marker count.
    /// This is an internal invariant violation, not a user error.
    IndexMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for SelectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectorError::Reference(e) => write!(f, "{}", e),
            SelectorError::IndexMismatch { expected, actual } => write!(
                f,
                "internal error: {} markers but {} cached values",
                expected, actual
            ),
        }
    }
}

impl std::error::Error for SelectorError {}

impl From<ReferenceError> for SelectorError {
    fn from(e: ReferenceError) -> Self {
        SelectorError::Reference(e)
    }
}

/// One round-robin result: the expanded text and a position label of the
/// form `"{cursor+1}/{total} {comma-joined reference paths}"`
#[derive(Debug, Clone, PartialEq)]
pub struct RoundRobinStep {
    pub text: String,
    pub label: String,
}

struct RoundRobinCache {
    text: String,
    expansions: Vec<Expansion>,
    cursor: usize,
}

/// Stateful expansion engine over one tag store
pub struct Selector {
    store: TagStore,
    mode: SelectionMode,
    cache: Option<RoundRobinCache>,
}

impl Selector {
    /// Create a selector over a loaded store, in random mode
    pub fn new(store: TagStore) -> Self {
        Selector {
            store,
            mode: SelectionMode::Random,
            cache: None,
        }
    }

    /// Set the selection mode
    pub fn with_mode(mut self, mode: SelectionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn store(&self) -> &TagStore {
        &self.store
    }

    /// Change the selection mode, dropping any round-robin cache
    pub fn set_mode(&mut self, mode: SelectionMode) {
        self.mode = mode;
        self.cache = None;
    }

    /// Replace the tag store wholesale, dropping any round-robin cache
    pub fn reload(&mut self, store: TagStore) {
        self.store = store;
        self.cache = None;
    }

    /// Count the distinct expansions of a text against the current store
    pub fn count_combinations(&self, text: &str) -> Result<u128, ReferenceError> {
        count_combinations(&self.store, text)
    }

    /// Human-readable count line, e.g. `"Combinations: 1,234"`, with
    /// errors folded into the text
    pub fn count_display(&self, text: &str) -> String {
        match self.count_combinations(text) {
            Ok(count) => format!("Combinations: {}", group_thousands(count)),
            Err(e) => format!("Combinations: Error: {}", e),
        }
    }

    /// Produce the next sequential expansion of `text`.
    ///
    /// The full enumeration is computed and cached on first use and
    /// whenever `text` differs from the cached text; otherwise the cache
    /// is reused and the cursor advances by one, wrapping to the start
    /// after the last expansion. Each marker's literal text is replaced at
    /// its first remaining occurrence, left to right, so repeated
    /// identical markers each consume one cached value.
    pub fn round_robin_step(&mut self, text: &str) -> Result<RoundRobinStep, SelectorError> {
        let markers = parser::parse(text);
        if markers.is_empty() {
            return Ok(RoundRobinStep {
                text: text.to_string(),
                label: String::new(),
            });
        }

        let stale = !matches!(&self.cache, Some(cache) if cache.text == text);
        if stale {
            let expansions = enumerate_combinations(&self.store, &markers)?;
            debug!(
                markers = markers.len(),
                expansions = expansions.len(),
                "rebuilt round-robin cache"
            );
            self.cache = Some(RoundRobinCache {
                text: text.to_string(),
                expansions,
                cursor: 0,
            });
        }

        let Some(cache) = self.cache.as_mut() else {
            // Unreachable: the cache was just rebuilt above
            error!("round-robin cache missing after rebuild");
            return Err(SelectorError::IndexMismatch {
                expected: markers.len(),
                actual: 0,
            });
        };

        let total = cache.expansions.len();
        if total == 0 {
            // Unreachable: every marker contributes at least one candidate
            error!("round-robin cache is empty despite parsed markers");
            return Err(SelectorError::IndexMismatch {
                expected: markers.len(),
                actual: 0,
            });
        }

        let expansion = &cache.expansions[cache.cursor];
        if expansion.len() != markers.len() {
            error!(
                expected = markers.len(),
                actual = expansion.len(),
                "cached expansion does not match marker count"
            );
            return Err(SelectorError::IndexMismatch {
                expected: markers.len(),
                actual: expansion.len(),
            });
        }

        let mut output = text.to_string();
        for (marker, replacement) in markers.iter().zip(expansion) {
            if output.contains(&marker.raw) {
                output = output.replacen(&marker.raw, replacement, 1);
            } else {
                warn!(marker = %marker.raw, "marker no longer present at substitution time");
            }
        }

        let label = format!(
            "{}/{} {}",
            cache.cursor + 1,
            total,
            joined_paths(&markers)
        );
        cache.cursor = (cache.cursor + 1) % total;

        Ok(RoundRobinStep {
            text: output,
            label,
        })
    }

    /// Expand `text` with one fresh random draw per marker.
    ///
    /// Never fails: a reference that cannot be resolved substitutes an
    /// inline `Error: …` string for that marker and the rest of the text
    /// still renders. With `Some(seed)` the draw is reproducible for this
    /// call only; the seeded generator is local and does not constrain
    /// later unseeded calls.
    pub fn random_expand(&self, text: &str, seed: Option<u64>) -> String {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        random_expand_with(&self.store, text, &mut rng)
    }

    /// Expand `text` according to the current mode. This is the display
    /// boundary: every error comes back as an `"Error: …"` string rather
    /// than a result, so the output is always directly presentable.
    pub fn expand(&mut self, text: &str, seed: Option<u64>) -> String {
        match self.mode {
            SelectionMode::RoundRobin => match self.round_robin_step(text) {
                Ok(step) => {
                    debug!(label = %step.label, "round-robin selection");
                    step.text
                }
                Err(e) => format!("Error: {}", e),
            },
            SelectionMode::Random => self.random_expand(text, seed),
        }
    }
}

/// Random expansion against a store with a caller-supplied generator.
///
/// Rewrites the leftmost marker repeatedly, up to [`MAX_RANDOM_ITERATIONS`]
/// substitutions; if the cap is hit the partially substituted text is
/// returned as-is.
pub fn random_expand_with<R: Rng>(store: &TagStore, text: &str, rng: &mut R) -> String {
    let mut output = text.to_string();
    for _ in 0..MAX_RANDOM_ITERATIONS {
        let Some(marker) = parser::find_first(&output) else {
            break;
        };
        let replacement = match resolve(store, &marker.path) {
            Ok(options) => {
                let count = rng.gen_range(marker.min_count..=marker.max_count);
                let mut selected = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    selected.push(options[rng.gen_range(0..options.len())].clone());
                }
                selected.join(OPTION_SEPARATOR)
            }
            Err(e) => format!("Error: {}", e),
        };
        output = output.replacen(&marker.raw, &replacement, 1);
    }
    output
}

fn joined_paths(markers: &[Marker]) -> String {
    markers
        .iter()
        .map(Marker::path_display)
        .collect::<Vec<_>>()
        .join(", ")
}

fn group_thousands(value: u128) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::TagValue;

    fn store() -> TagStore {
        let mut store = TagStore::new();
        store.insert(
            "color",
            TagValue::List(vec![
                TagValue::Scalar("red".to_string()),
                TagValue::Scalar("blue".to_string()),
            ]),
        );
        store
    }

    #[test]
    fn test_default_mode_is_random() {
        assert_eq!(Selector::new(store()).mode(), SelectionMode::Random);
    }

    #[test]
    fn test_mode_round_trips_through_strings() {
        let mode: SelectionMode = "round_robin".parse().unwrap();
        assert_eq!(mode, SelectionMode::RoundRobin);
        assert_eq!(mode.to_string(), "round_robin");
        assert!("nonsense".parse::<SelectionMode>().is_err());
    }

    #[test]
    fn test_set_mode_clears_cache() {
        let mut selector = Selector::new(store()).with_mode(SelectionMode::RoundRobin);
        selector.round_robin_step("@color@").unwrap();
        selector.set_mode(SelectionMode::RoundRobin);
        // Cursor restarts from the first expansion after the mode change
        let step = selector.round_robin_step("@color@").unwrap();
        assert_eq!(step.text, "red");
    }

    #[test]
    fn test_reload_clears_cache_and_swaps_store() {
        let mut selector = Selector::new(store()).with_mode(SelectionMode::RoundRobin);
        selector.round_robin_step("@color@").unwrap();

        let mut replacement = TagStore::new();
        replacement.insert("color", TagValue::Scalar("green".to_string()));
        selector.reload(replacement);

        let step = selector.round_robin_step("@color@").unwrap();
        assert_eq!(step.text, "green");
        assert_eq!(step.label, "1/1 color");
    }

    #[test]
    fn test_count_display_groups_thousands() {
        let mut store = TagStore::new();
        let options = (0..10)
            .map(|i| TagValue::Scalar(i.to_string()))
            .collect::<Vec<_>>();
        store.insert("digit", TagValue::List(options));
        let selector = Selector::new(store);
        // 10^4 per marker
        assert_eq!(
            selector.count_display("@4$$digit@"),
            "Combinations: 10,000"
        );
        assert_eq!(selector.count_display("no markers"), "Combinations: 1");
    }

    #[test]
    fn test_count_display_folds_errors() {
        let selector = Selector::new(store());
        assert_eq!(
            selector.count_display("@missing@"),
            "Combinations: Error: tag 'missing' not found"
        );
    }

    #[test]
    fn test_expand_folds_round_robin_errors_to_text() {
        let mut selector = Selector::new(store()).with_mode(SelectionMode::RoundRobin);
        let output = selector.expand("@missing@", None);
        assert_eq!(output, "Error: tag 'missing' not found");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }
}
