//! Page slicing over the full aggregated result list.

/// One page of results.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// The slice for the requested page, at most `page_size` items.
    pub items: Vec<T>,
    /// Size of the full result list.
    pub total: usize,
    /// Whether at least one further page exists.
    pub has_more: bool,
}

/// Slice `items` into page `page` of `page_size` entries.
///
/// Pages are 1-based; page 0 is clamped to 1. A page beyond the end
/// yields an empty slice with `has_more == false`, never an error.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let total = items.len();
    let page = page.max(1);
    let start = (page - 1).saturating_mul(page_size);
    let end = start.saturating_add(page_size).min(total);
    let slice = if start >= total {
        Vec::new()
    } else {
        items[start..end].to_vec()
    };
    Page {
        items: slice,
        total,
        has_more: start.saturating_add(page_size) < total,
    }
}
