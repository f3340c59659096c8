//! Linear search over small string slices, used by content-type negotiation.

/// Returns the index of the first element of `haystack` matching `needle`.
///
/// With `partial` set, an element matches as soon as it contains `needle` as
/// a substring — the fuzzy mode content-type negotiation relies on, so that
/// a declared `application/json; charset=utf-8` still matches an accepted
/// `application/json`.
pub(crate) fn find<S: AsRef<str>>(haystack: &[S], needle: &str, partial: bool) -> Option<usize> {
    haystack.iter().position(|candidate| {
        let candidate = candidate.as_ref();
        if partial {
            candidate.contains(needle)
        } else {
            candidate == needle
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_exact_match() {
        let list = ["a", "b", "c"];
        assert_eq!(find(&list, "b", false), Some(1));
        assert_eq!(find(&list, "z", false), None);
    }

    #[test]
    fn exact_mode_rejects_substrings() {
        let list = ["abc", "bcd"];
        assert_eq!(find(&list, "b", false), None);
    }

    #[test]
    fn finds_partial_match() {
        let list = ["abc", "bcd", "cde"];
        assert_eq!(find(&list, "d", true), Some(1));
        assert_eq!(find(&list, "de", true), Some(2));
        assert_eq!(find(&list, "x", true), None);
    }
}
