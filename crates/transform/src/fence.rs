//! Code-fence aware regex rewriting.
//!
//! A position is inside a fenced code block when an odd number of "```"
//! delimiters occur strictly before it. This is a textual heuristic, not a
//! markdown parse: an unbalanced or inline "```" shifts every later region.

use regex::{Captures, Regex};

/// Fence delimiter.
pub const FENCE: &str = "```";

/// Positions of every fence delimiter in a text.
#[derive(Debug, Clone)]
pub struct FenceMap {
    /// Byte offsets where each delimiter starts, ascending.
    starts: Vec<usize>,
}

impl FenceMap {
    pub fn new(text: &str) -> Self {
        Self {
            starts: text.match_indices(FENCE).map(|(idx, _)| idx).collect(),
        }
    }

    /// Number of complete delimiters before `position`.
    pub fn delimiters_before(&self, position: usize) -> usize {
        self.starts
            .iter()
            .take_while(|start| **start + FENCE.len() <= position)
            .count()
    }

    pub fn is_inside(&self, position: usize) -> bool {
        self.delimiters_before(position) % 2 == 1
    }
}

/// Convenience wrapper around [`FenceMap::is_inside`].
pub fn is_in_code_block(text: &str, position: usize) -> bool {
    FenceMap::new(text).is_inside(position)
}

/// Replace every match of `pattern` that starts outside a code fence.
///
/// Matches are collected against the original text first and then
/// substituted right to left, so earlier offsets stay valid while the
/// string is rebuilt.
pub fn replace_outside_fences<F>(text: &str, pattern: &Regex, mut replacement: F) -> String
where
    F: FnMut(&Captures<'_>) -> String,
{
    let fences = FenceMap::new(text);
    let matches: Vec<(std::ops::Range<usize>, String)> = pattern
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            if fences.is_inside(whole.start()) {
                return None;
            }
            Some((whole.range(), replacement(&caps)))
        })
        .collect();

    let mut result = text.to_string();
    for (range, value) in matches.into_iter().rev() {
        result.replace_range(range, &value);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_inside_fence() {
        let text = "before\n```\ninside\n```\nafter";
        assert!(!is_in_code_block(text, 0));
        assert!(is_in_code_block(text, text.find("inside").unwrap()));
        assert!(!is_in_code_block(text, text.find("after").unwrap()));
    }

    #[test]
    fn delimiter_counted_only_when_complete() {
        let text = "```abc";
        // Position 2 is within the delimiter itself: not yet counted.
        assert_eq!(FenceMap::new(text).delimiters_before(2), 0);
        assert_eq!(FenceMap::new(text).delimiters_before(3), 1);
    }

    #[test]
    fn unbalanced_fence_swallows_the_rest() {
        let text = "```\nopen\nafter";
        assert!(is_in_code_block(text, text.find("after").unwrap()));
    }

    #[test]
    fn replaces_outside_only() {
        let re = Regex::new(r"x(\d)").unwrap();
        let text = "x1 ```x2``` x3";
        let out = replace_outside_fences(text, &re, |caps| format!("<{}>", &caps[1]));
        assert_eq!(out, "<1> ```x2``` <3>");
    }

    #[test]
    fn replacement_of_different_length_keeps_offsets() {
        let re = Regex::new(r"ab").unwrap();
        let out = replace_outside_fences("ab-ab-ab", &re, |_| "longer".to_string());
        assert_eq!(out, "longer-longer-longer");
    }
}
