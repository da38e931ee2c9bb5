use std::collections::BTreeSet;

use crate::controller::ResultSummary;
use crate::query::QueryState;

/// Up to this many pages every page gets a link.
pub const MAX_UNCOMPRESSED: usize = 7;
/// Pages shown on each side of the current one when compressing.
pub const NEIGHBOURS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Page(usize),
    Ellipsis,
}

/// Page links for the pagination control, zero-based.
///
/// First, last and current page are always shown, along with up to
/// [`NEIGHBOURS`] pages either side of the current one. Runs of skipped
/// pages collapse into one ellipsis.
pub fn page_links(current: usize, total: usize) -> Vec<PageLink> {
    if total <= 1 {
        return Vec::new();
    }
    if total <= MAX_UNCOMPRESSED {
        return (0..total).map(PageLink::Page).collect();
    }

    let last = total - 1;
    let current = current.min(last);

    let mut pages = BTreeSet::from([0, last, current]);
    let low = current.saturating_sub(NEIGHBOURS).max(1);
    let high = (current + NEIGHBOURS).min(last - 1);
    pages.extend(low..=high);

    let mut links = Vec::with_capacity(pages.len() + 2);
    let mut previous: Option<usize> = None;
    for page in pages {
        if let Some(previous) = previous
            && page - previous > 1
        {
            links.push(PageLink::Ellipsis);
        }
        links.push(PageLink::Page(page));
        previous = Some(page);
    }

    links
}

/// The 1-based, inclusive item range shown on the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemRange {
    pub first: u64,
    pub last: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PaginationView {
    pub links: Vec<PageLink>,
    pub current: usize,
    pub previous: Option<usize>,
    pub next: Option<usize>,
    pub range: Option<ItemRange>,
}

impl PaginationView {
    pub fn is_hidden(&self) -> bool {
        self.links.is_empty()
    }
}

pub fn render_pagination(query: &QueryState, summary: Option<&ResultSummary>) -> PaginationView {
    let Some(summary) = summary else {
        return PaginationView::default();
    };

    let current = query.page_index();
    let total = summary.total_pages;

    let range = (!summary.items.is_empty()).then(|| {
        let first = (current * query.page_size()) as u64 + 1;
        ItemRange {
            first,
            last: first + summary.items.len() as u64 - 1,
            total: summary.total_items,
        }
    });

    PaginationView {
        links: page_links(current, total),
        current,
        previous: current.checked_sub(1).filter(|page| *page < total),
        next: Some(current + 1).filter(|page| *page < total),
        range,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PageLink::{Ellipsis, Page};

    #[test]
    fn single_page_has_no_links() {
        assert!(page_links(0, 0).is_empty());
        assert!(page_links(0, 1).is_empty());
    }

    #[test]
    fn small_totals_list_every_page() {
        assert_eq!(
            page_links(3, 7),
            (0..7).map(Page).collect::<Vec<_>>()
        );
    }

    #[test]
    fn middle_page_compresses_both_sides() {
        assert_eq!(
            page_links(5, 10),
            vec![Page(0), Ellipsis, Page(3), Page(4), Page(5), Page(6), Page(7), Ellipsis, Page(9)]
        );
    }

    #[test]
    fn edges_do_not_duplicate_first_or_last() {
        assert_eq!(
            page_links(0, 10),
            vec![Page(0), Page(1), Page(2), Ellipsis, Page(9)]
        );
        assert_eq!(
            page_links(9, 10),
            vec![Page(0), Ellipsis, Page(7), Page(8), Page(9)]
        );
    }

    #[test]
    fn adjacent_window_needs_no_ellipsis() {
        assert_eq!(
            page_links(3, 10),
            vec![Page(0), Page(1), Page(2), Page(3), Page(4), Page(5), Ellipsis, Page(9)]
        );
    }

    #[test]
    fn view_reports_range_and_neighbours() {
        let mut query = QueryState::new(20);
        query.set_page(2);
        let device = ersha_core::Device {
            id: ersha_core::DeviceId::from("sw-1"),
            name: "sw-1".into(),
            device_type: ersha_core::DeviceType::Switch,
            status: ersha_core::DeviceStatus::Active,
            address: None,
            location: None,
            serial_number: None,
            description: None,
            created_at: None,
            updated_at: None,
        };
        let summary = ResultSummary {
            items: vec![device; 5],
            total_items: 45,
            total_pages: 3,
        };

        let view = render_pagination(&query, Some(&summary));
        assert_eq!(view.links, vec![Page(0), Page(1), Page(2)]);
        assert_eq!(view.previous, Some(1));
        assert_eq!(view.next, None);
        assert_eq!(
            view.range,
            Some(ItemRange {
                first: 41,
                last: 45,
                total: 45
            })
        );
    }

    #[test]
    fn empty_result_hides_pagination() {
        let query = QueryState::new(20);
        let summary = ResultSummary {
            items: Vec::new(),
            total_items: 0,
            total_pages: 0,
        };
        let view = render_pagination(&query, Some(&summary));
        assert!(view.is_hidden());
        assert_eq!(view.range, None);
        assert_eq!(view.next, None);

        assert_eq!(render_pagination(&query, None), PaginationView::default());
    }
}
