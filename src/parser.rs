/// Scanner for `@...@` substitution markers
///
/// Grammar: `"@" [count "$$"] path "@"` where `count` is `digits` or
/// `digits "-" digits` and `path` is colon-separated segments. Matching is
/// non-greedy: a marker body runs to the first following `@`, so markers
/// cannot nest and cannot contain a literal `@`.

/// One parsed marker occurrence
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// The literal marker text, including both delimiters, used for
    /// exact-occurrence substitution later
    pub raw: String,
    /// Reference path, split on `:`
    pub path: Vec<String>,
    /// Inclusive lower bound on selections drawn per expansion
    pub min_count: u32,
    /// Inclusive upper bound on selections drawn per expansion
    pub max_count: u32,
}

impl Marker {
    /// The reference path rejoined with `:`, as written in the source text
    pub fn path_display(&self) -> String {
        self.path.join(":")
    }
}

/// Parse all markers in a text, in left-to-right order of appearance.
///
/// Never fails: text without well-formed markers simply yields none, and
/// duplicate marker text produces one entry per occurrence.
pub fn parse(text: &str) -> Vec<Marker> {
    let mut markers = Vec::new();
    let mut pos = 0;
    while let Some((marker, next)) = scan_from(text, pos) {
        markers.push(marker);
        pos = next;
    }
    markers
}

/// Find the leftmost marker in a text, if any
pub fn find_first(text: &str) -> Option<Marker> {
    scan_from(text, 0).map(|(marker, _)| marker)
}

/// Scan for the next marker at or after `start`, returning it together
/// with the byte offset just past its closing `@`
fn scan_from(text: &str, start: usize) -> Option<(Marker, usize)> {
    let mut pos = start;
    loop {
        let open = pos + text[pos..].find('@')?;
        let body_start = open + 1;
        let close = body_start + text[body_start..].find('@')?;
        let body = &text[body_start..close];
        if body.is_empty() {
            // "@@" opens nothing; its second '@' may open the next marker
            pos = close;
            continue;
        }

        let (min_count, max_count, reference) = split_count_prefix(body);
        let marker = Marker {
            raw: text[open..=close].to_string(),
            path: reference.split(':').map(str::to_string).collect(),
            min_count,
            max_count,
        };
        return Some((marker, close + 1));
    }
}

/// Split an optional `D$$` / `D-D$$` count prefix off a marker body.
///
/// A body that does not carry a complete prefix is returned whole as the
/// reference with counts 1/1, and count digits that fail to parse also
/// fall back to 1/1 rather than erroring. The two bounds may appear in
/// either order in the source text.
fn split_count_prefix(body: &str) -> (u32, u32, &str) {
    let digits_end = body
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(body.len());
    if digits_end == 0 {
        return (1, 1, body);
    }
    let first = &body[..digits_end];
    let mut rest = &body[digits_end..];

    let mut second = None;
    if let Some(stripped) = rest.strip_prefix('-') {
        let second_end = stripped
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(stripped.len());
        if second_end == 0 {
            return (1, 1, body);
        }
        second = Some(&stripped[..second_end]);
        rest = &stripped[second_end..];
    }

    let Some(reference) = rest.strip_prefix("$$") else {
        return (1, 1, body);
    };
    if reference.is_empty() {
        return (1, 1, body);
    }

    match (first.parse::<u32>(), second.map(str::parse::<u32>)) {
        (Ok(a), None) => (a, a, reference),
        (Ok(a), Some(Ok(b))) => (a.min(b), a.max(b), reference),
        _ => (1, 1, reference),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_markers() {
        assert!(parse("a plain prompt").is_empty());
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_simple_marker() {
        let markers = parse("a @color@ shirt");
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].raw, "@color@");
        assert_eq!(markers[0].path, vec!["color"]);
        assert_eq!(markers[0].min_count, 1);
        assert_eq!(markers[0].max_count, 1);
    }

    #[test]
    fn test_count_prefix() {
        let markers = parse("@2$$outfit@");
        assert_eq!(markers[0].path, vec!["outfit"]);
        assert_eq!(markers[0].min_count, 2);
        assert_eq!(markers[0].max_count, 2);
    }

    #[test]
    fn test_count_range_and_colon_path() {
        let markers = parse("@1-3$$style:formal@");
        assert_eq!(markers[0].raw, "@1-3$$style:formal@");
        assert_eq!(markers[0].path, vec!["style", "formal"]);
        assert_eq!(markers[0].min_count, 1);
        assert_eq!(markers[0].max_count, 3);
    }

    #[test]
    fn test_count_range_is_order_independent() {
        let markers = parse("@3-1$$style@");
        assert_eq!(markers[0].min_count, 1);
        assert_eq!(markers[0].max_count, 3);
    }

    #[test]
    fn test_multiple_markers_in_order() {
        let markers = parse("a @color@ @1-2$$size@ shirt");
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].raw, "@color@");
        assert_eq!(markers[1].raw, "@1-2$$size@");
    }

    #[test]
    fn test_duplicate_markers_reported_separately() {
        let markers = parse("@color@ and @color@");
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0], markers[1]);
    }

    #[test]
    fn test_unterminated_marker_ignored() {
        assert!(parse("a @color shirt").is_empty());
        let markers = parse("@color@ and @size");
        assert_eq!(markers.len(), 1);
    }

    #[test]
    fn test_empty_body_is_not_a_marker() {
        assert!(parse("@@").is_empty());
        // The second '@' of "@@" can still open a real marker
        let markers = parse("@@color@");
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].raw, "@color@");
    }

    #[test]
    fn test_incomplete_count_prefix_stays_in_reference() {
        // No "$$" terminator, so the digits are part of the path
        let markers = parse("@12-x@");
        assert_eq!(markers[0].path, vec!["12-x"]);
        assert_eq!(markers[0].min_count, 1);
        assert_eq!(markers[0].max_count, 1);
    }

    #[test]
    fn test_dangling_dash_is_not_a_count() {
        let markers = parse("@12-$$x@");
        assert_eq!(markers[0].path, vec!["12-$$x"]);
        assert_eq!(markers[0].min_count, 1);
    }

    #[test]
    fn test_overflowing_count_falls_back_to_one() {
        let markers = parse("@99999999999$$color@");
        assert_eq!(markers[0].path, vec!["color"]);
        assert_eq!(markers[0].min_count, 1);
        assert_eq!(markers[0].max_count, 1);
    }

    #[test]
    fn test_zero_count_is_allowed() {
        let markers = parse("@0-2$$color@");
        assert_eq!(markers[0].min_count, 0);
        assert_eq!(markers[0].max_count, 2);
    }

    #[test]
    fn test_find_first() {
        let marker = find_first("x @a@ y @b@").unwrap();
        assert_eq!(marker.raw, "@a@");
        assert!(find_first("no markers").is_none());
    }
}
