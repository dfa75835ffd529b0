//! Top-level listing state: filters, page, fetched results and bookmarks.
//!
//! The board never talks to the network itself. Callers ask it for a
//! [`FetchTicket`], run the request however they like, and hand the result
//! back through [`Board::complete_fetch`]. Every ticket carries a generation
//! number; only the most recently issued generation is accepted, so a slow
//! response to an old filter can never overwrite newer results.

use std::rc::Rc;
use tracing::{debug, warn};

use crate::bookmarks::SharedBookmarks;
use crate::error::ApiResult;
use crate::models::{JobListing, JobType, JobsPage};
use crate::pagination::Paginator;
use crate::query::{FilterState, JobQuery};
use crate::window::{PaginationPolicy, ResultWindow, MAX_BATCH_SIZE};

/// What the caller has to do after a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Unchanged,
    Redraw,
    Fetch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub query: JobQuery,
}

pub struct Board {
    filters: FilterState,
    paginator: Paginator,
    window: ResultWindow,
    bookmarks: SharedBookmarks,
    fetch_limit: u32,
    generation: u64,
    loading: bool,
    last_error: Option<String>,
}

impl Board {
    pub fn new(
        policy: PaginationPolicy,
        page_size: u32,
        fetch_limit: u32,
        bookmarks: SharedBookmarks,
    ) -> Self {
        Self {
            filters: FilterState::default(),
            paginator: Paginator::default(),
            window: ResultWindow::new(policy, page_size),
            bookmarks,
            fetch_limit: fetch_limit.clamp(page_size.max(1), MAX_BATCH_SIZE.max(page_size)),
            generation: 0,
            loading: false,
            last_error: None,
        }
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    pub fn bookmarks(&self) -> SharedBookmarks {
        Rc::clone(&self.bookmarks)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn total_items(&self) -> u64 {
        self.window.total_items()
    }

    // --- Filter changes: all of them go back to page 1 ---

    /// Update the search term. Nothing is fetched until [`Board::submit_search`].
    pub fn set_search(&mut self, term: &str) {
        if self.filters.search != term {
            self.filters.search = term.to_string();
            self.paginator.reset();
        }
    }

    pub fn submit_search(&mut self) -> Effect {
        self.paginator.reset();
        Effect::Fetch
    }

    pub fn toggle_type(&mut self, job_type: JobType) -> Effect {
        self.filters.toggle_type(job_type);
        self.filters_changed()
    }

    pub fn set_salary_ceiling(&mut self, ceiling: u64) -> Effect {
        let before = self.filters.salary_ceiling();
        self.filters.set_salary_ceiling(ceiling);
        if self.filters.salary_ceiling() == before {
            return Effect::Unchanged;
        }
        self.filters_changed()
    }

    pub fn reset_filters(&mut self) -> Effect {
        self.filters = FilterState::default();
        self.paginator.reset();
        Effect::Fetch
    }

    fn filters_changed(&mut self) -> Effect {
        self.paginator.reset();
        match self.window.policy() {
            PaginationPolicy::Client => {
                self.window.apply_filters(&self.filters);
                self.paginator.set_total(self.window.total_pages());
                Effect::Redraw
            }
            PaginationPolicy::Server => Effect::Fetch,
        }
    }

    // --- Page changes never re-run filters ---

    pub fn next_page(&mut self) -> Effect {
        let changed = self.paginator.next();
        self.page_changed(changed)
    }

    pub fn previous_page(&mut self) -> Effect {
        let changed = self.paginator.previous();
        self.page_changed(changed)
    }

    pub fn go_to_page(&mut self, page: u32) -> Effect {
        let changed = self.paginator.go_to(page);
        self.page_changed(changed)
    }

    /// Jump to a page before the page count is known. Server mode requests
    /// that page directly and clamps once a response reports the totals.
    pub fn seek_page(&mut self, page: u32) -> Effect {
        match self.window.policy() {
            PaginationPolicy::Server => {
                let page = page.max(1);
                self.paginator = Paginator::new(page, page.max(self.paginator.total()));
                Effect::Fetch
            }
            PaginationPolicy::Client => self.go_to_page(page),
        }
    }

    fn page_changed(&self, changed: bool) -> Effect {
        match (changed, self.window.policy()) {
            (false, _) => Effect::Unchanged,
            (true, PaginationPolicy::Client) => Effect::Redraw,
            (true, PaginationPolicy::Server) => Effect::Fetch,
        }
    }

    // --- Fetch lifecycle ---

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        self.loading = true;
        let query = match self.window.policy() {
            PaginationPolicy::Server => JobQuery::build(
                &self.filters,
                self.paginator.current(),
                self.window.page_size(),
            ),
            PaginationPolicy::Client => JobQuery::batch(&self.filters, self.fetch_limit),
        };
        debug!(generation = self.generation, ?query, "fetch issued");
        FetchTicket {
            generation: self.generation,
            query,
        }
    }

    /// Apply a fetch result. Returns false when the response belongs to a
    /// superseded request and was dropped.
    pub fn complete_fetch(&mut self, generation: u64, result: ApiResult<JobsPage>) -> bool {
        if generation != self.generation {
            warn!(generation, latest = self.generation, "discarding stale response");
            return false;
        }
        self.loading = false;
        match result {
            Ok(page) => {
                debug!(jobs = page.jobs.len(), server_page = ?page.page, "fetch completed");
                self.last_error = None;
                self.window.load(page, &self.filters);
            }
            Err(e) => {
                warn!(error = %e, "job fetch failed");
                self.last_error = Some(e.user_message());
                self.window.clear();
            }
        }
        self.paginator.set_total(self.window.total_pages());
        true
    }

    // --- Derived views ---

    pub fn visible_jobs(&self) -> Vec<JobListing> {
        let items = self.window.current_page_items(self.paginator.current());
        self.bookmarks.borrow().annotate(items)
    }

    pub fn saved_jobs(&self) -> Vec<JobListing> {
        self.window.bookmarked(&self.bookmarks.borrow())
    }

    pub fn toggle_bookmark(&mut self, id: &str) -> bool {
        self.bookmarks.borrow_mut().toggle(id)
    }
}
