/// Combination counting and exhaustive enumeration
///
/// Selections are drawn with replacement and order matters: a marker with
/// k options and count range [a, b] contributes sum of k^c for c in a..=b,
/// and the whole text's count is the product across markers. Enumeration
/// materializes the same space in the same order, so the counter's result
/// always equals the enumerator's length for a given text and store.
use crate::parser::{parse, Marker};
use crate::tags::{resolve, ReferenceError, TagStore};

/// One replacement string per marker, in parse order
pub type Expansion = Vec<String>;

/// Separator used when a marker draws more than one selection
pub const OPTION_SEPARATOR: &str = ", ";

/// Count the distinct expansions of a text against a store.
///
/// Returns 1 for text without markers. All-or-nothing: the first marker
/// whose reference fails to resolve aborts the count. Arithmetic saturates
/// at `u128::MAX`; callers should size-limit texts before enumerating.
pub fn count_combinations(store: &TagStore, text: &str) -> Result<u128, ReferenceError> {
    if !text.contains('@') {
        return Ok(1);
    }
    let markers = parse(text);

    let mut total: u128 = 1;
    for marker in &markers {
        let options = resolve(store, &marker.path)?;
        let k = options.len() as u128;

        let mut marker_total: u128 = 0;
        for count in marker.min_count..=marker.max_count {
            marker_total = marker_total.saturating_add(k.saturating_pow(count));
        }
        total = total.saturating_mul(marker_total);
    }
    Ok(total)
}

/// Materialize every expansion of the given markers, in a stable order:
/// the Cartesian product across markers in parse order, where each
/// marker's candidates run through its count range ascending and, within
/// a count, through ordered tuples drawn with replacement from its
/// options in declaration order.
///
/// Fails rather than truncating if any marker's reference fails to
/// resolve.
pub fn enumerate_combinations(
    store: &TagStore,
    markers: &[Marker],
) -> Result<Vec<Expansion>, ReferenceError> {
    let mut per_marker = Vec::with_capacity(markers.len());
    for marker in markers {
        per_marker.push(marker_candidates(store, marker)?);
    }

    let mut expansions = Vec::new();
    let mut current = Vec::with_capacity(per_marker.len());
    cartesian(&per_marker, &mut current, &mut expansions);
    Ok(expansions)
}

/// All candidate replacement strings for one marker: every ordered tuple
/// of its options, with replacement, for every count in its range, each
/// tuple joined into a single string
fn marker_candidates(store: &TagStore, marker: &Marker) -> Result<Vec<String>, ReferenceError> {
    let options = resolve(store, &marker.path)?;
    let mut candidates = Vec::new();
    for count in marker.min_count..=marker.max_count {
        let mut selection = Vec::with_capacity(count as usize);
        push_tuples(&options, count as usize, &mut selection, &mut candidates);
    }
    Ok(candidates)
}

fn push_tuples(
    options: &[String],
    remaining: usize,
    selection: &mut Vec<String>,
    candidates: &mut Vec<String>,
) {
    if remaining == 0 {
        candidates.push(selection.join(OPTION_SEPARATOR));
        return;
    }
    for option in options {
        selection.push(option.clone());
        push_tuples(options, remaining - 1, selection, candidates);
        selection.pop();
    }
}

fn cartesian(per_marker: &[Vec<String>], current: &mut Vec<String>, out: &mut Vec<Expansion>) {
    if current.len() == per_marker.len() {
        out.push(current.clone());
        return;
    }
    for candidate in &per_marker[current.len()] {
        current.push(candidate.clone());
        cartesian(per_marker, current, out);
        current.pop();
    }
}
