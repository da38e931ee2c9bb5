use ersha_core::{DeviceStatus, DeviceType, PageQuery, Sort, SortColumn, SortDirection};

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// A filter value. `None` means "any".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Status(Option<DeviceStatus>),
    Type(Option<DeviceType>),
}

/// What the operator is currently looking at.
///
/// Only the list controller holds one of these; everything else sees a
/// [`PageQuery`] snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    page_index: usize,
    page_size: usize,
    sort: Sort,
    status_filter: Option<DeviceStatus>,
    type_filter: Option<DeviceType>,
    search_text: String,
}

impl Default for QueryState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl QueryState {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_index: 0,
            page_size: page_size.max(1),
            sort: Sort::default(),
            status_filter: None,
            type_filter: None,
            search_text: String::new(),
        }
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn sort(&self) -> Sort {
        self.sort
    }

    pub fn status_filter(&self) -> Option<DeviceStatus> {
        self.status_filter
    }

    pub fn type_filter(&self) -> Option<DeviceType> {
        self.type_filter
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    /// Same column flips the direction, a new column starts ascending.
    pub(crate) fn toggle_sort(&mut self, column: SortColumn) {
        self.sort = if self.sort.column == column {
            Sort::new(column, self.sort.direction.reversed())
        } else {
            Sort::new(column, SortDirection::Ascending)
        };
        self.page_index = 0;
    }

    pub(crate) fn apply_filter(&mut self, filter: Filter) {
        match filter {
            Filter::Status(status) => self.status_filter = status,
            Filter::Type(device_type) => self.type_filter = device_type,
        }
        self.page_index = 0;
    }

    pub(crate) fn set_search(&mut self, text: String) {
        self.search_text = text;
        self.page_index = 0;
    }

    pub(crate) fn set_page(&mut self, page_index: usize) {
        self.page_index = page_index;
    }

    /// Back to the default sort with no filters, keeping the page size.
    pub(crate) fn reset(&mut self) {
        *self = Self::new(self.page_size);
    }

    pub fn snapshot(&self) -> PageQuery {
        let q = self.search_text.trim();

        PageQuery {
            page: self.page_index,
            size: self.page_size,
            sort: self.sort,
            status: self.status_filter,
            device_type: self.type_filter,
            q: (!q.is_empty()).then(|| q.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_sort_flips_direction_on_same_column() {
        let mut state = QueryState::default();
        state.toggle_sort(SortColumn::Name);
        assert_eq!(state.sort(), Sort::new(SortColumn::Name, SortDirection::Ascending));

        state.toggle_sort(SortColumn::Name);
        assert_eq!(state.sort(), Sort::new(SortColumn::Name, SortDirection::Descending));

        state.toggle_sort(SortColumn::Status);
        assert_eq!(state.sort(), Sort::new(SortColumn::Status, SortDirection::Ascending));
    }

    #[test]
    fn mutators_reset_page() {
        let mut state = QueryState::default();

        state.set_page(4);
        state.apply_filter(Filter::Status(Some(DeviceStatus::Inactive)));
        assert_eq!(state.page_index(), 0);

        state.set_page(4);
        state.set_search("core".to_string());
        assert_eq!(state.page_index(), 0);

        state.set_page(4);
        state.toggle_sort(SortColumn::Location);
        assert_eq!(state.page_index(), 0);
    }

    #[test]
    fn snapshot_trims_search_and_drops_blank() {
        let mut state = QueryState::new(50);
        state.set_search("   ".to_string());
        assert_eq!(state.snapshot().q, None);

        state.set_search("  edge fw ".to_string());
        let query = state.snapshot();
        assert_eq!(query.q.as_deref(), Some("edge fw"));
        assert_eq!(query.size, 50);
    }

    #[test]
    fn reset_keeps_page_size() {
        let mut state = QueryState::new(10);
        state.apply_filter(Filter::Type(Some(DeviceType::Sensor)));
        state.toggle_sort(SortColumn::Name);
        state.reset();

        assert_eq!(state, QueryState::new(10));
    }
}
