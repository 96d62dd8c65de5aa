use serde::Serialize;

use crate::models::JobRecord;

/// Records whose title or company profile contains `query`, ignoring case.
/// An empty query passes everything. Catalog order is preserved.
pub fn filter<'a>(catalog: &'a [JobRecord], query: &str) -> Vec<&'a JobRecord> {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return catalog.iter().collect();
    }
    catalog
        .iter()
        .filter(|job| {
            job.title.to_lowercase().contains(&needle)
                || job.company_profile.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Grows a visible prefix of the filtered list one page at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    display_count: usize,
    page_size: usize,
}

impl Pagination {
    pub fn new(page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            display_count: page_size,
            page_size,
        }
    }

    #[allow(dead_code)]
    pub fn display_count(&self) -> usize {
        self.display_count
    }

    pub fn visible<'a, T>(&self, filtered: &'a [T]) -> &'a [T] {
        &filtered[..self.display_count.min(filtered.len())]
    }

    pub fn has_more(&self, filtered_len: usize) -> bool {
        self.display_count < filtered_len
    }

    pub fn remaining(&self, filtered_len: usize) -> usize {
        filtered_len.saturating_sub(self.display_count)
    }

    /// Shows one more page, never past `filtered_len`.
    pub fn load_more(&mut self, filtered_len: usize) {
        if self.has_more(filtered_len) {
            self.display_count = (self.display_count + self.page_size).min(filtered_len);
        }
    }

    /// Back to the first page. Called whenever the query changes.
    pub fn reset(&mut self) {
        self.display_count = self.page_size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<JobRecord> {
        vec![
            JobRecord::new(0, "Data Scientist", "Acme Analytics", "Models"),
            JobRecord::new(1, "Backend Developer", "Beta Corp", "APIs"),
            JobRecord::new(2, "Office Manager", "DataWorks Ltd", "Admin"),
            JobRecord::new(3, "Frontend Developer", "Gamma", "UI"),
        ]
    }

    fn ids(records: &[&JobRecord]) -> Vec<usize> {
        records.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_empty_query_returns_everything_in_order() {
        let catalog = catalog();
        assert_eq!(ids(&filter(&catalog, "")), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_query_matches_title_or_company_case_insensitively() {
        let catalog = catalog();
        assert_eq!(ids(&filter(&catalog, "data")), vec![0, 2]);
        assert_eq!(ids(&filter(&catalog, "DEVELOPER")), vec![1, 3]);
        assert_eq!(ids(&filter(&catalog, "beta")), vec![1]);
        assert!(filter(&catalog, "zzz").is_empty());
    }

    #[test]
    fn test_query_does_not_search_description() {
        let catalog = catalog();
        assert!(filter(&catalog, "apis").is_empty());
    }

    #[test]
    fn test_filter_results_all_contain_query() {
        let catalog = catalog();
        for q in ["a", "de", "Ltd", "er", "o"] {
            let needle = q.to_lowercase();
            for job in filter(&catalog, q) {
                assert!(
                    job.title.to_lowercase().contains(&needle)
                        || job.company_profile.to_lowercase().contains(&needle)
                );
            }
        }
    }

    #[test]
    fn test_pagination_starts_at_one_page() {
        let page = Pagination::new(12);
        let items: Vec<usize> = (0..30).collect();
        assert_eq!(page.visible(&items).len(), 12);
        assert!(page.has_more(items.len()));
        assert_eq!(page.remaining(items.len()), 18);
    }

    #[test]
    fn test_load_more_is_bounded_by_filtered_len() {
        let mut page = Pagination::new(12);
        page.load_more(30);
        assert_eq!(page.display_count(), 24);
        page.load_more(30);
        assert_eq!(page.display_count(), 30);
        assert!(!page.has_more(30));
        page.load_more(30);
        assert_eq!(page.display_count(), 30);
    }

    #[test]
    fn test_load_more_on_short_list_is_a_no_op() {
        let mut page = Pagination::new(12);
        page.load_more(5);
        assert_eq!(page.display_count(), 12);
        assert!(!page.has_more(5));
        let items = [1, 2, 3, 4, 5];
        assert_eq!(page.visible(&items).len(), 5);
    }

    #[test]
    fn test_has_more_iff_count_below_len() {
        let mut page = Pagination::new(12);
        for len in [0, 11, 12, 13, 40] {
            page.reset();
            while page.has_more(len) {
                assert!(page.display_count() < len);
                page.load_more(len);
            }
            assert!(page.display_count() >= len);
        }
    }

    #[test]
    fn test_reset_returns_to_first_page() {
        let mut page = Pagination::new(12);
        page.load_more(100);
        page.load_more(100);
        page.reset();
        assert_eq!(page.display_count(), 12);
    }
}
