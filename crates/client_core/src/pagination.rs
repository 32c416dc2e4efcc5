//! Page strip computation for the customer list footer.

/// Number of pages needed to show `count` items, never less than one.
pub fn total_pages(count: u64, page_size: u32) -> u32 {
    if page_size == 0 || count == 0 {
        return 1;
    }
    let pages = count.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Page numbers around `current_page`, with `None` marking elided ranges.
/// Always keeps two pages at each edge and a window of two before and four
/// after the current page.
pub fn page_strip(total_pages: u32, current_page: u32) -> Vec<Option<u32>> {
    let current_page = current_page.clamp(1, total_pages.max(1));
    build_strip(total_pages, current_page, 2, 2, 4, 2)
}

fn build_strip(
    last_page: u32,
    current_page: u32,
    left_edge: u32,
    left_current: u32,
    right_current: u32,
    right_edge: u32,
) -> Vec<Option<u32>> {
    if last_page == 0 {
        return vec![];
    }

    let mut pages = Vec::new();

    let left_end = (1 + left_edge).min(last_page.saturating_add(1));
    pages.extend((1..left_end).map(Some));

    let mid_start = left_end.max(current_page.saturating_sub(left_current));
    let mid_end = current_page
        .saturating_add(right_current)
        .saturating_add(1)
        .min(last_page.saturating_add(1));

    if mid_start > left_end {
        pages.push(None);
    }
    pages.extend((mid_start..mid_end).map(Some));

    let right_start = mid_end.max(last_page.saturating_sub(right_edge) + 1);

    if right_start > mid_end {
        pages.push(None);
    }
    pages.extend((right_start..=last_page).map(Some));

    pages
}
