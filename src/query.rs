use std::collections::BTreeSet;

use crate::models::{JobListing, JobType, MAX_SALARY_CEILING};

/// What the user has asked to see. Job types are single-select: toggling the
/// selected type clears it, toggling any other type replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub search: String,
    selected_types: BTreeSet<JobType>,
    salary_ceiling: u64,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search: String::new(),
            selected_types: BTreeSet::new(),
            salary_ceiling: MAX_SALARY_CEILING,
        }
    }
}

impl FilterState {
    pub fn selected_types(&self) -> &BTreeSet<JobType> {
        &self.selected_types
    }

    pub fn toggle_type(&mut self, job_type: JobType) {
        if self.selected_types.contains(&job_type) {
            self.selected_types.clear();
        } else {
            self.selected_types.clear();
            self.selected_types.insert(job_type);
        }
    }

    pub fn salary_ceiling(&self) -> u64 {
        self.salary_ceiling
    }

    pub fn set_salary_ceiling(&mut self, ceiling: u64) {
        self.salary_ceiling = ceiling.min(MAX_SALARY_CEILING);
    }

    pub fn has_salary_filter(&self) -> bool {
        self.salary_ceiling < MAX_SALARY_CEILING
    }

    pub fn search_term(&self) -> Option<&str> {
        let term = self.search.trim();
        (!term.is_empty()).then_some(term)
    }

    pub fn single_type(&self) -> Option<&JobType> {
        if self.selected_types.len() == 1 {
            self.selected_types.iter().next()
        } else {
            None
        }
    }

    /// Local type + salary predicate used when filtering a fetched batch.
    /// Listings with an unreadable salary are excluded while a ceiling is active.
    pub fn matches(&self, job: &JobListing) -> bool {
        if !self.selected_types.is_empty() && !self.selected_types.contains(&job.job_type) {
            return false;
        }
        if self.has_salary_filter() {
            return matches!(job.salary, Some(s) if s <= self.salary_ceiling);
        }
        true
    }
}

/// Request descriptor for `GET /jobs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobQuery {
    pub page: u32,
    pub limit: u32,
    pub title: Option<String>,
    pub job_type: Option<JobType>,
    pub min_salary: Option<u64>,
    pub max_salary: Option<u64>,
}

impl JobQuery {
    /// Full descriptor for one server-side page.
    pub fn build(filters: &FilterState, page: u32, limit: u32) -> Self {
        let (min_salary, max_salary) = if filters.has_salary_filter() {
            (Some(0), Some(filters.salary_ceiling()))
        } else {
            (None, None)
        };
        Self {
            page,
            limit,
            title: filters.search_term().map(str::to_string),
            job_type: filters.single_type().cloned(),
            min_salary,
            max_salary,
        }
    }

    /// Descriptor for a client-paginated batch: only the search term goes to
    /// the server, type and salary are applied to the batch locally.
    pub fn batch(filters: &FilterState, limit: u32) -> Self {
        Self {
            page: 1,
            limit,
            title: filters.search_term().map(str::to_string),
            job_type: None,
            min_salary: None,
            max_salary: None,
        }
    }

    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string()), ("limit", self.limit.to_string())];
        if let Some(title) = &self.title {
            pairs.push(("title", title.clone()));
        }
        if let Some(t) = &self.job_type {
            pairs.push(("type", t.as_str().to_string()));
        }
        if let Some(min) = self.min_salary {
            pairs.push(("minSalary", min.to_string()));
        }
        if let Some(max) = self.max_salary {
            pairs.push(("maxSalary", max.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_listing as listing;

    #[test]
    fn test_default_query_has_only_paging() {
        let q = JobQuery::build(&FilterState::default(), 1, 5);
        assert_eq!(q.to_pairs(), vec![("page", "1".to_string()), ("limit", "5".to_string())]);
    }

    #[test]
    fn test_max_ceiling_attaches_no_salary_params() {
        let mut f = FilterState::default();
        f.set_salary_ceiling(MAX_SALARY_CEILING);
        let q = JobQuery::build(&f, 2, 5);
        assert_eq!(q.min_salary, None);
        assert_eq!(q.max_salary, None);

        f.set_salary_ceiling(90_000);
        let q = JobQuery::build(&f, 2, 5);
        assert_eq!(q.min_salary, Some(0));
        assert_eq!(q.max_salary, Some(90_000));
    }

    #[test]
    fn test_ceiling_is_clamped() {
        let mut f = FilterState::default();
        f.set_salary_ceiling(500_000);
        assert_eq!(f.salary_ceiling(), MAX_SALARY_CEILING);
        assert!(!f.has_salary_filter());
    }

    #[test]
    fn test_title_is_trimmed_and_omitted_when_blank() {
        let mut f = FilterState::default();
        f.search = "   ".to_string();
        assert_eq!(JobQuery::build(&f, 1, 5).title, None);
        f.search = "  rust  ".to_string();
        assert_eq!(JobQuery::build(&f, 1, 5).title.as_deref(), Some("rust"));
    }

    #[test]
    fn test_type_toggle_is_single_select() {
        let mut f = FilterState::default();
        f.toggle_type(JobType::Hybrid);
        f.toggle_type(JobType::Contract);
        assert_eq!(f.selected_types().len(), 1);
        assert_eq!(f.single_type(), Some(&JobType::Contract));

        f.toggle_type(JobType::Contract);
        assert!(f.selected_types().is_empty());
        assert_eq!(JobQuery::build(&f, 1, 5).job_type, None);
    }

    #[test]
    fn test_pairs_order_and_names() {
        let mut f = FilterState::default();
        f.search = "design".to_string();
        f.toggle_type(JobType::FullTime);
        f.set_salary_ceiling(60_000);
        let pairs = JobQuery::build(&f, 3, 5).to_pairs();
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["page", "limit", "title", "type", "minSalary", "maxSalary"]);
        assert_eq!(pairs[3].1, "Full-time");
    }

    #[test]
    fn test_batch_query_keeps_only_title() {
        let mut f = FilterState::default();
        f.search = "ops".to_string();
        f.toggle_type(JobType::Volunteer);
        f.set_salary_ceiling(10_000);
        let q = JobQuery::batch(&f, 50);
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, 50);
        assert_eq!(q.title.as_deref(), Some("ops"));
        assert_eq!(q.job_type, None);
        assert_eq!(q.max_salary, None);
    }

    #[test]
    fn test_matches_type_and_salary() {
        let mut f = FilterState::default();
        assert!(f.matches(&listing("1", JobType::Hybrid, None)));

        f.set_salary_ceiling(50_000);
        assert!(f.matches(&listing("1", JobType::Hybrid, Some(50_000))));
        assert!(!f.matches(&listing("2", JobType::Hybrid, Some(50_001))));
        assert!(!f.matches(&listing("3", JobType::Hybrid, None)));

        f.toggle_type(JobType::Contract);
        assert!(!f.matches(&listing("1", JobType::Hybrid, Some(10))));
        assert!(f.matches(&listing("4", JobType::Contract, Some(10))));
    }
}
