//! One-based paging for the admin submission lists.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Raw query string. Unparseable values fall back to the defaults.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SubmissionFilter {
    pub status: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageQuery {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageQuery {
    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }
}

fn parse(value: Option<&str>) -> Option<u32> {
    value.and_then(|v| v.trim().parse().ok())
}

impl From<&SubmissionFilter> for PageQuery {
    fn from(filter: &SubmissionFilter) -> Self {
        let page = parse(filter.page.as_deref()).filter(|p| *p >= 1);
        let limit = parse(filter.limit.as_deref()).filter(|l| (1..=MAX_PAGE_LIMIT).contains(l));
        Self {
            page: page.unwrap_or(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPage<T> {
    pub submissions: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

impl<T> SubmissionPage<T> {
    pub fn new(submissions: Vec<T>, total: u64, query: PageQuery) -> Self {
        Self {
            submissions,
            total,
            page: query.page,
            limit: query.limit,
            total_pages: total.div_ceil(u64::from(query.limit.max(1))),
        }
    }
}

/// Slices one page out of rows already in display order.
pub fn page_of<T>(rows: Vec<T>, query: PageQuery) -> (Vec<T>, u64) {
    let total = rows.len() as u64;
    let page = rows
        .into_iter()
        .skip(query.offset())
        .take(query.limit as usize)
        .collect();
    (page, total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(page: &str, limit: &str) -> SubmissionFilter {
        SubmissionFilter {
            status: None,
            page: Some(page.into()),
            limit: Some(limit.into()),
        }
    }

    #[test]
    fn test_page_query_defaults() {
        assert_eq!(PageQuery::from(&filter("0", "500")), PageQuery::default());
        assert_eq!(PageQuery::from(&filter("abc", "")), PageQuery::default());
        let q = PageQuery::from(&filter("3", "20"));
        assert_eq!(q.offset(), 40);
    }

    #[test]
    fn test_page_of_counts_pages() {
        let q = PageQuery { page: 2, limit: 2 };
        let (rows, total) = page_of(vec![1, 2, 3, 4, 5], q);
        assert_eq!(rows, vec![3, 4]);
        let page = SubmissionPage::new(rows, total, q);
        assert_eq!(page.total_pages, 3);
    }
}
