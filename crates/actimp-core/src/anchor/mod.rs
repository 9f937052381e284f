//! Anchor-based extraction over flattened page fragments.
//!
//! Handlers locate a known landmark fragment and read values at fixed
//! offsets from it. Every search returns `None` when nothing matches, so a
//! missing landmark can never be confused with a valid index.

pub mod datetime;
pub mod table;

pub use datetime::{
    compose_activity_datetime, compose_activity_datetime_at, ActivityDateTime, DateTimeLayout,
};
pub use table::{FieldRule, FieldValue, FieldValues, Landmark, OffsetTable, ValueKind};

use regex::Regex;

use crate::error::ParserError;
use crate::models::activity::Page;
use crate::normalize::patterns::ISIN;

/// Concatenate pages into one fragment sequence.
pub fn flatten_pages(pages: &[Page]) -> Vec<String> {
    pages.iter().flatten().cloned().collect()
}

/// First index at or after `offset` whose fragment satisfies `predicate`.
pub fn find_first_index_matching<S, F>(lines: &[S], offset: usize, predicate: F) -> Option<usize>
where
    S: AsRef<str>,
    F: Fn(&str) -> bool,
{
    lines
        .iter()
        .enumerate()
        .skip(offset)
        .find(|(_, line)| predicate(line.as_ref()))
        .map(|(idx, _)| idx)
}

/// First index at or after `offset` whose fragment matches `regex`.
pub fn find_first_regex_index<S: AsRef<str>>(lines: &[S], regex: &Regex, offset: usize) -> Option<usize> {
    find_first_index_matching(lines, offset, |line| regex.is_match(line))
}

/// First index at or after `offset` holding an ISIN-shaped fragment.
pub fn find_first_isin_index<S: AsRef<str>>(lines: &[S], offset: usize) -> Option<usize> {
    find_first_regex_index(lines, &ISIN, offset)
}

/// Smallest index at or after `offset` whose fragment equals any of `terms`.
pub fn find_first_of_any<S: AsRef<str>>(lines: &[S], terms: &[&str], offset: usize) -> Option<usize> {
    find_first_index_matching(lines, offset, |line| terms.contains(&line))
}

/// First index whose fragment equals `term`.
pub fn find_exact<S: AsRef<str>>(lines: &[S], term: &str) -> Option<usize> {
    find_first_index_matching(lines, 0, |line| line == term)
}

/// Last index whose fragment equals `term`.
pub fn find_last_exact<S: AsRef<str>>(lines: &[S], term: &str) -> Option<usize> {
    lines.iter().rposition(|line| line.as_ref() == term)
}

/// Concatenation of the fragments in `start..end`, for labels the renderer split apart.
pub fn join_range<S: AsRef<str>>(lines: &[S], start: usize, end: usize) -> Option<String> {
    lines
        .get(start..end)
        .map(|range| range.iter().map(|line| line.as_ref()).collect())
}

/// Whether the `length` fragments starting at the first exact `start` term spell `expected`.
pub fn spells_from<S: AsRef<str>>(lines: &[S], start: &str, length: usize, expected: &str) -> bool {
    find_exact(lines, start)
        .and_then(|idx| join_range(lines, idx, idx + length))
        .is_some_and(|joined| joined == expected)
}

/// Index `base + offset` when it lies inside `lines`.
pub fn offset_index<S>(lines: &[S], base: usize, offset: isize) -> Option<usize> {
    let target = base.checked_add_signed(offset)?;
    (target < lines.len()).then_some(target)
}

/// Fragment at `base + offset`, failing when the position falls outside the content.
pub fn token_at<'a, S: AsRef<str>>(
    lines: &'a [S],
    landmark: &str,
    base: usize,
    offset: isize,
) -> Result<&'a str, ParserError> {
    offset_index(lines, base, offset)
        .map(|idx| lines[idx].as_ref())
        .ok_or_else(|| ParserError::OffsetOutOfRange {
            landmark: landmark.to_string(),
            index: base,
            offset,
        })
}

/// Locate `term` exactly and return the fragment `offset` positions away.
pub fn token_after_exact<'a, S: AsRef<str>>(
    lines: &'a [S],
    term: &str,
    offset: isize,
) -> Result<&'a str, ParserError> {
    let base = find_exact(lines, term).ok_or_else(|| ParserError::MissingLandmark {
        landmark: term.to_string(),
    })?;
    token_at(lines, term, base, offset)
}
