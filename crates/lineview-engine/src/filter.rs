//! Client-side search over execution event rows.

use crate::events::ExecutionEvent;

/// Indices of the rows matching `query`.
///
/// A row matches when any of its seven searchable fields contains the
/// query, ignoring case. The query is matched as typed, spaces included;
/// only an empty query matches every row. Always pass the canonical
/// collection: filtering an already filtered list would lose rows a
/// broader query should bring back.
pub fn filter_events(rows: &[ExecutionEvent], query: &str) -> Vec<usize> {
    let needle = query.to_lowercase();
    rows.iter()
        .enumerate()
        .filter(|(_, row)| needle.is_empty() || matches(row, &needle))
        .map(|(index, _)| index)
        .collect()
}

fn matches(row: &ExecutionEvent, needle: &str) -> bool {
    row.searchable_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}
