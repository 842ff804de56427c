use serde::Serialize;

pub const DEFAULT_PER_PAGE: u32 = 10;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub current_page: u32,
    pub last_page: u32,
    pub per_page: u32,
    pub total: u64,
    pub has_prev: bool,
    pub has_next: bool,
}

impl PageInfo {
    /// Builds page metadata from the numbers a paginated backend response
    /// reports. `last_page` is never below 1 and `current_page` is clamped.
    pub fn new(current_page: u32, last_page: u32, per_page: u32, total: u64) -> Self {
        let last_page = last_page.max(1);
        let current_page = current_page.clamp(1, last_page);
        PageInfo {
            current_page,
            last_page,
            per_page,
            total,
            has_prev: current_page > 1,
            has_next: current_page < last_page,
        }
    }
}

pub fn clamp_per_page(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE)
}

pub fn clamp_page(requested: Option<u32>) -> u32 {
    requested.unwrap_or(1).max(1)
}

/// Slices an already-fetched list. Pages past the end land on the last page.
pub fn paginate<T: Clone>(items: &[T], page: u32, per_page: u32) -> (Vec<T>, PageInfo) {
    let per_page = per_page.max(1);
    let total = items.len() as u64;
    let last_page = ((items.len() as u32).saturating_add(per_page - 1) / per_page).max(1);
    let info = PageInfo::new(page, last_page, per_page, total);
    let start = ((info.current_page - 1) * per_page) as usize;
    let end = (start + per_page as usize).min(items.len());
    let slice = if start < items.len() {
        items[start..end].to_vec()
    } else {
        Vec::new()
    };
    (slice, info)
}

/// Case-insensitive substring match over any of `fields`. An empty or blank
/// query matches everything.
pub fn matches_filter(query: &str, fields: &[&str]) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    fields
        .iter()
        .any(|f| f.to_lowercase().contains(&needle))
}
