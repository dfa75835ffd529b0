use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::models::JobListing;

/// One tracker is shared by every view so "is this job saved" has a single answer.
pub type SharedBookmarks = Rc<RefCell<BookmarkTracker>>;

/// Client-local saved jobs. Never synchronized to the server.
#[derive(Debug, Default)]
pub struct BookmarkTracker {
    ids: HashSet<String>,
}

impl BookmarkTracker {
    pub fn shared() -> SharedBookmarks {
        Rc::new(RefCell::new(Self::default()))
    }

    /// Flip membership, returning whether `id` is bookmarked afterwards.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    pub fn is_bookmarked(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Copies of `items` whose flag reflects this tracker, not whatever the API sent.
    pub fn annotate(&self, items: &[JobListing]) -> Vec<JobListing> {
        items
            .iter()
            .map(|job| JobListing {
                bookmarked: self.is_bookmarked(&job.id),
                ..job.clone()
            })
            .collect()
    }

    pub fn saved<'a, I>(&self, items: I) -> Vec<JobListing>
    where
        I: IntoIterator<Item = &'a JobListing>,
    {
        items
            .into_iter()
            .filter(|job| self.is_bookmarked(&job.id))
            .map(|job| JobListing {
                bookmarked: true,
                ..job.clone()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{sample_listing, JobType};

    #[test]
    fn test_toggle_twice_restores_membership() {
        let mut tracker = BookmarkTracker::default();
        assert!(tracker.toggle("42"));
        assert!(tracker.is_bookmarked("42"));
        assert!(!tracker.toggle("42"));
        assert!(!tracker.is_bookmarked("42"));
        assert_eq!(tracker.len(), 0);

        tracker.toggle("7");
        tracker.toggle("9");
        tracker.toggle("9");
        assert!(tracker.is_bookmarked("7"));
        assert!(!tracker.is_bookmarked("9"));
    }

    #[test]
    fn test_annotate_overrides_server_flag() {
        let mut stale = sample_listing("1", JobType::Hybrid, None);
        stale.bookmarked = true;
        let fresh = sample_listing("2", JobType::Hybrid, None);

        let mut tracker = BookmarkTracker::default();
        tracker.toggle("2");

        let annotated = tracker.annotate(&[stale.clone(), fresh]);
        assert!(!annotated[0].bookmarked);
        assert!(annotated[1].bookmarked);
        assert!(stale.bookmarked, "input must not be mutated");
    }

    #[test]
    fn test_shared_tracker_is_seen_by_all_holders() {
        let list_view = BookmarkTracker::shared();
        let detail_view = Rc::clone(&list_view);

        detail_view.borrow_mut().toggle("abc");
        assert!(list_view.borrow().is_bookmarked("abc"));

        let jobs = vec![
            sample_listing("abc", JobType::Contract, None),
            sample_listing("def", JobType::Contract, None),
        ];
        let saved = list_view.borrow().saved(&jobs);
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id, "abc");
        assert!(saved[0].bookmarked);
    }
}
