use serde::Deserialize;

use crate::bookmarks::BookmarkTracker;
use crate::models::{JobListing, JobsPage};
use crate::pagination::page_count;
use crate::query::FilterState;

/// Largest batch requested in client pagination mode.
pub const MAX_BATCH_SIZE: u32 = 50;

/// Where slicing into pages happens. One policy per window; they are never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PaginationPolicy {
    /// Each fetch returns exactly one page; totals come from the server.
    Server,
    /// One large batch is fetched and filtered + sliced locally.
    #[default]
    Client,
}

/// Most recent fetch result and the slice of it that is on screen.
#[derive(Debug)]
pub struct ResultWindow {
    policy: PaginationPolicy,
    page_size: u32,
    fetched: Vec<JobListing>,
    filtered: Vec<JobListing>,
    total_items: u64,
    total_pages: u32,
}

impl ResultWindow {
    pub fn new(policy: PaginationPolicy, page_size: u32) -> Self {
        Self {
            policy,
            page_size: page_size.max(1),
            fetched: Vec::new(),
            filtered: Vec::new(),
            total_items: 0,
            total_pages: 1,
        }
    }

    pub fn policy(&self) -> PaginationPolicy {
        self.policy
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Store a fetched page. In client mode the batch is filtered right away.
    pub fn load(&mut self, page: JobsPage, filters: &FilterState) {
        match self.policy {
            PaginationPolicy::Server => {
                let fetched_len = page.jobs.len() as u64;
                self.total_items = page.total_items.unwrap_or(fetched_len);
                self.total_pages = match page.total_pages {
                    Some(pages) => pages.max(1),
                    None => page_count(self.total_items, self.page_size),
                };
                self.fetched = page.jobs;
                self.filtered.clear();
            }
            PaginationPolicy::Client => {
                self.fetched = page.jobs;
                self.apply_filters(filters);
            }
        }
    }

    /// Re-run the local type/salary filter over the stored batch. A no-op in
    /// server mode, where the server already filtered the page.
    pub fn apply_filters(&mut self, filters: &FilterState) {
        if self.policy != PaginationPolicy::Client {
            return;
        }
        self.filtered = self
            .fetched
            .iter()
            .filter(|job| filters.matches(job))
            .cloned()
            .collect();
        self.total_items = self.filtered.len() as u64;
        self.total_pages = page_count(self.total_items, self.page_size);
    }

    /// Empty-result state after a failed fetch.
    pub fn clear(&mut self) {
        self.fetched.clear();
        self.filtered.clear();
        self.total_items = 0;
        self.total_pages = 1;
    }

    pub fn current_page_items(&self, page: u32) -> &[JobListing] {
        match self.policy {
            PaginationPolicy::Server => {
                let end = self.fetched.len().min(self.page_size as usize);
                &self.fetched[..end]
            }
            PaginationPolicy::Client => {
                let size = self.page_size as usize;
                let start = (page.max(1) as usize - 1).saturating_mul(size);
                if start >= self.filtered.len() {
                    return &[];
                }
                let end = (start + size).min(self.filtered.len());
                &self.filtered[start..end]
            }
        }
    }

    /// Bookmarked listings among everything the window currently holds.
    pub fn bookmarked(&self, tracker: &BookmarkTracker) -> Vec<JobListing> {
        let pool = match self.policy {
            PaginationPolicy::Server => &self.fetched,
            PaginationPolicy::Client => &self.filtered,
        };
        tracker.saved(pool)
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn total_items(&self) -> u64 {
        self.total_items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{sample_listing, JobType};

    fn batch(n: usize) -> Vec<JobListing> {
        (0..n)
            .map(|i| {
                let t = if i % 2 == 0 { JobType::FullTime } else { JobType::Contract };
                sample_listing(&i.to_string(), t, Some(10_000 * (i as u64 + 1)))
            })
            .collect()
    }

    #[test]
    fn test_empty_fetch_has_one_page() {
        for policy in [PaginationPolicy::Server, PaginationPolicy::Client] {
            let mut w = ResultWindow::new(policy, 5);
            let page = JobsPage {
                total_items: Some(0),
                ..Default::default()
            };
            w.load(page, &FilterState::default());
            assert!(w.current_page_items(1).is_empty());
            assert_eq!(w.total_pages(), 1);
        }
    }

    #[test]
    fn test_server_policy_passes_through_and_uses_server_totals() {
        let mut w = ResultWindow::new(PaginationPolicy::Server, 5);
        let page = JobsPage {
            jobs: batch(5),
            total_items: Some(23),
            ..Default::default()
        };
        w.load(page, &FilterState::default());
        assert_eq!(w.total_pages(), 5);
        assert_eq!(w.total_items(), 23);
        assert_eq!(w.current_page_items(4).len(), 5);

        let page = JobsPage {
            jobs: batch(2),
            total_items: Some(23),
            total_pages: Some(0),
            page: Some(5),
        };
        w.load(page, &FilterState::default());
        assert_eq!(w.total_pages(), 1);
    }

    #[test]
    fn test_client_policy_slices_filtered_batch() {
        let mut w = ResultWindow::new(PaginationPolicy::Client, 3);
        let mut filters = FilterState::default();
        w.load(JobsPage { jobs: batch(10), ..Default::default() }, &filters);
        assert_eq!(w.total_pages(), 4);
        let ids: Vec<&str> = w.current_page_items(4).iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec!["9"]);
        assert!(w.current_page_items(5).is_empty());

        filters.toggle_type(JobType::Contract);
        w.apply_filters(&filters);
        assert_eq!(w.total_items(), 5);
        assert_eq!(w.total_pages(), 2);
        assert!(w.current_page_items(1).iter().all(|j| j.job_type == JobType::Contract));

        filters.set_salary_ceiling(40_000);
        w.apply_filters(&filters);
        let ids: Vec<&str> = w.current_page_items(1).iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_bookmarked_subset_uses_tracker() {
        let mut w = ResultWindow::new(PaginationPolicy::Client, 3);
        w.load(JobsPage { jobs: batch(6), ..Default::default() }, &FilterState::default());
        let mut tracker = BookmarkTracker::default();
        tracker.toggle("4");
        tracker.toggle("missing");
        let saved = w.bookmarked(&tracker);
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id, "4");
    }

    #[test]
    fn test_clear_resets_to_empty_state() {
        let mut w = ResultWindow::new(PaginationPolicy::Client, 5);
        w.load(JobsPage { jobs: batch(12), ..Default::default() }, &FilterState::default());
        w.clear();
        assert_eq!(w.total_pages(), 1);
        assert_eq!(w.total_items(), 0);
        assert!(w.current_page_items(1).is_empty());
    }
}
