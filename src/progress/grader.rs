// src/progress/grader.rs

use std::collections::BTreeSet;

/// Collects the positions flagged as correct.
pub fn correct_indices(correct_flags: &[bool]) -> BTreeSet<usize> {
    correct_flags
        .iter()
        .enumerate()
        .filter_map(|(i, &flag)| flag.then_some(i))
        .collect()
}

/// Grades a selection against an exercise's answer key.
///
/// The answer is correct only when `selected` is exactly the set of positions
/// flagged in `correct_flags`. There is no partial credit: a subset or a
/// superset of the correct options is wrong.
///
/// An empty selection is never correct. Callers are expected to reject it
/// before grading.
pub fn grade(selected: &BTreeSet<usize>, correct_flags: &[bool]) -> bool {
    if selected.is_empty() {
        return false;
    }

    let expected = correct_indices(correct_flags);
    // A key without any correct option cannot be satisfied.
    !expected.is_empty() && *selected == expected
}
