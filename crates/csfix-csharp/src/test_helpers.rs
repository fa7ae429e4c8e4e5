// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Caret-marker helpers for refactoring tests.
//!
//! Fixtures mark caret positions with `$`. One marker is a caret; two
//! markers delimit a selection, whose start is used as the caret.

/// Caret marker character.
pub const MARKER: char = '$';

/// Remove every marker from `marked`, returning the clean text and the
/// byte offsets (in the clean text) where markers stood.
pub fn strip_markers(marked: &str) -> (String, Vec<usize>) {
    let mut text = String::with_capacity(marked.len());
    let mut offsets = Vec::new();
    for ch in marked.chars() {
        if ch == MARKER {
            offsets.push(text.len());
        } else {
            text.push(ch);
        }
    }
    (text, offsets)
}

/// Clean text and caret offset of a fixture with one or two markers.
///
/// # Panics
///
/// Panics if the fixture has no marker or more than two. Test-only.
pub fn caret(marked: &str) -> (String, usize) {
    let (text, offsets) = strip_markers(marked);
    match offsets.as_slice() {
        [caret] | [caret, _] => (text, *caret),
        _ => panic!(
            "fixture must contain one or two '{}' markers, found {}:\n{}",
            MARKER,
            offsets.len(),
            marked
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_marker() {
        let (text, offset) = caret("event $H e;");
        assert_eq!(text, "event H e;");
        assert_eq!(offset, 6);
    }

    #[test]
    fn selection_uses_start() {
        let (text, offsets) = strip_markers("event $H $e;");
        assert_eq!(text, "event H e;");
        assert_eq!(offsets, vec![6, 8]);
        assert_eq!(caret("event $H $e;").1, 6);
    }

    #[test]
    #[should_panic(expected = "one or two")]
    fn missing_marker_panics() {
        caret("event H e;");
    }
}
