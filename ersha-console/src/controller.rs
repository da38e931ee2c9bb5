use ersha_core::{Device, Page, PageQuery, SortColumn};
use tracing::{debug, info, warn};

use crate::error::ConsoleError;
use crate::query::{Filter, QueryState};

/// Identifies one issued reload. Only the latest one may touch the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// A collection fetch the event loop has to perform on the controller's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadRequest {
    pub generation: Generation,
    pub query: PageQuery,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    Errored(ConsoleError),
}

/// The last page the server gave us, in server order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSummary {
    pub items: Vec<Device>,
    pub total_items: u64,
    pub total_pages: usize,
}

impl From<Page<Device>> for ResultSummary {
    fn from(page: Page<Device>) -> Self {
        Self {
            items: page.content,
            total_items: page.total_elements,
            total_pages: page.total_pages,
        }
    }
}

/// Outcome of feeding a response into [`ListController::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciled {
    Applied,
    /// A newer reload was issued after this one.
    Stale,
    /// The page index fell past the end; the request re-fetches the last page.
    Clamped(ReloadRequest),
    Failed(ConsoleError),
    /// The session was rejected. Raised even for stale responses.
    Unauthorized,
}

/// Owns the query state and reconciles collection responses into a summary.
///
/// Performs no IO. Every accepted intent returns the [`ReloadRequest`] the
/// caller must execute, and the result goes back through [`apply`](Self::apply).
#[derive(Debug)]
pub struct ListController {
    query: QueryState,
    summary: Option<ResultSummary>,
    state: LoadState,
    generation: u64,
}

impl ListController {
    pub fn new(page_size: usize) -> Self {
        Self {
            query: QueryState::new(page_size),
            summary: None,
            state: LoadState::Idle,
            generation: 0,
        }
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    pub fn summary(&self) -> Option<&ResultSummary> {
        self.summary.as_ref()
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    pub fn current_generation(&self) -> Generation {
        Generation(self.generation)
    }

    fn issue(&mut self) -> ReloadRequest {
        self.generation += 1;
        self.state = LoadState::Loading;

        let query = self.query.snapshot();
        info!(
            generation = self.generation,
            page = query.page,
            sort = %query.sort,
            "reload issued"
        );

        ReloadRequest {
            generation: Generation(self.generation),
            query,
        }
    }

    pub fn refresh(&mut self) -> ReloadRequest {
        self.issue()
    }

    pub fn set_sort(&mut self, column: SortColumn) -> ReloadRequest {
        self.query.toggle_sort(column);
        self.issue()
    }

    pub fn set_filter(&mut self, filter: Filter) -> ReloadRequest {
        self.query.apply_filter(filter);
        self.issue()
    }

    pub fn set_search(&mut self, text: String) -> ReloadRequest {
        self.query.set_search(text);
        self.issue()
    }

    pub fn reset(&mut self) -> ReloadRequest {
        self.query.reset();
        self.issue()
    }

    /// Ignored unless `page_index` exists in the last summary.
    pub fn go_to_page(&mut self, page_index: usize) -> Option<ReloadRequest> {
        let total_pages = self.summary.as_ref()?.total_pages;
        if page_index >= total_pages {
            debug!(page_index, total_pages, "ignoring out of range page");
            return None;
        }

        self.query.set_page(page_index);
        Some(self.issue())
    }

    pub fn next_page(&mut self) -> Option<ReloadRequest> {
        self.go_to_page(self.query.page_index() + 1)
    }

    pub fn previous_page(&mut self) -> Option<ReloadRequest> {
        let previous = self.query.page_index().checked_sub(1)?;
        self.go_to_page(previous)
    }

    /// Periodic reload. Suppressed while a modal flow is active.
    pub fn auto_refresh(&mut self, modal_active: bool) -> Option<ReloadRequest> {
        if modal_active {
            debug!("auto refresh suppressed while a dialog is open");
            return None;
        }
        Some(self.issue())
    }

    pub fn apply(
        &mut self,
        generation: Generation,
        result: Result<Page<Device>, ConsoleError>,
    ) -> Reconciled {
        let current = generation.0 == self.generation;

        if let Err(ConsoleError::Auth) = result {
            if current {
                self.state = LoadState::Idle;
            }
            return Reconciled::Unauthorized;
        }

        if !current {
            debug!(
                generation = generation.0,
                latest = self.generation,
                "dropping stale response"
            );
            return Reconciled::Stale;
        }

        let page = match result {
            Ok(page) => page,
            Err(err) => {
                warn!(error = %err, "reload failed");
                self.summary = None;
                self.state = LoadState::Errored(err.clone());
                return Reconciled::Failed(err);
            }
        };

        let page_index = self.query.page_index();
        if page.total_pages > 0 && page_index >= page.total_pages {
            let last = page.total_pages - 1;
            info!(page_index, last, "page out of range, clamping");
            // The out-of-range page has no rows; keep showing the previous
            // ones until the follow-up reload lands.
            self.query.set_page(last);
            return Reconciled::Clamped(self.issue());
        }
        if page.total_pages == 0 {
            self.query.set_page(0);
        }

        self.summary = Some(page.into());
        self.state = LoadState::Loaded;
        Reconciled::Applied
    }
}
