//! Offset/limit paging over consolidated records.

/// One page of items and whether more follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page
    pub hits: Vec<T>,
    /// Whether any item exists past this page
    pub has_more: bool,
}

/// Returns `items[offset..offset + limit]` and whether items remain after it.
///
/// Offsets past the end give an empty page with `has_more == false`.
pub fn paginate<T>(items: Vec<T>, offset: usize, limit: usize) -> Page<T> {
    let total = items.len();
    let end = offset.saturating_add(limit);
    let hits = items.into_iter().skip(offset).take(limit).collect();

    Page {
        hits,
        has_more: total > end,
    }
}
