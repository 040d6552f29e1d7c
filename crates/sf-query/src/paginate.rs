//! Count-then-page fetching.
//!
//! Salesforce returns at most 2000 records per query call (200 when every
//! field is selected with `FIELDS(ALL)`) and refuses an OFFSET above 2000.
//! A query is therefore fetched in pages of `ceiling` records at increasing
//! offsets, and anything past `2000 + ceiling` matches cannot be reached.

use std::future::Future;

use tracing::{debug, warn};

use crate::error::{Error, ErrorKind, Result};
use crate::result::PagedResult;
use crate::soql::Soql;

/// Records per query call for an ordinary projection.
pub const QUERY_PAGE_LIMIT: u32 = 2000;

/// Records per query call with `FIELDS(ALL)`.
pub const FIELDS_ALL_PAGE_LIMIT: u32 = 200;

/// Largest OFFSET the server accepts.
pub const MAX_OFFSET: u32 = 2000;

/// Projection that selects every field.
pub const FIELDS_ALL: &str = "FIELDS(ALL)";

/// How one query will be paged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePlan {
    /// Records to fetch in total.
    pub total: u64,
    /// Records per page.
    pub ceiling: u32,
}

impl PagePlan {
    /// Plan a fetch of `counted` matches.
    ///
    /// A non-zero `limit` caps both the page size and the total. Fails with
    /// [`ErrorKind::TooManyResults`] when the total cannot be reached through
    /// OFFSET paging.
    pub fn new(counted: u64, limit: u32, fields_all: bool) -> Result<Self> {
        let mut ceiling = if fields_all {
            FIELDS_ALL_PAGE_LIMIT
        } else {
            QUERY_PAGE_LIMIT
        };
        let mut total = counted;

        if limit > 0 {
            ceiling = ceiling.min(limit);
            total = total.min(u64::from(limit));
        }

        if total > u64::from(MAX_OFFSET) + u64::from(ceiling) {
            return Err(Error::new(ErrorKind::TooManyResults { count: total }));
        }

        Ok(Self { total, ceiling })
    }

    /// Number of query calls the plan takes; at least one.
    pub fn pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.ceiling)).max(1)
    }
}

/// Fetch every page of `soql` according to `plan`.
///
/// `fetch_page` receives rendered statements and returns one page each.
/// Pages are requested in increasing offset order and merged in that order.
/// A page without records ends the loop early. The last page only asks
/// for the records still missing, and the result never exceeds the plan's
/// total.
pub async fn fetch_pages<F, Fut>(soql: &Soql, plan: PagePlan, mut fetch_page: F) -> Result<PagedResult>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<PagedResult>>,
{
    let mut soql = soql.clone();
    soql.set_limit(plan.ceiling);
    soql.set_offset(0);

    let mut result = fetch_page(soql.render()?).await?;
    result.total = plan.total;

    while (result.len() as u64) < plan.total {
        // Bounded by the plan: len <= total <= MAX_OFFSET + ceiling.
        let offset = u32::try_from(result.len()).unwrap_or(u32::MAX);
        let remaining = plan.total - result.len() as u64;
        let limit = u32::try_from(remaining).map_or(plan.ceiling, |r| r.min(plan.ceiling));
        soql.set_limit(limit);
        soql.set_offset(offset);
        debug!(offset, limit, total = plan.total, "Fetching next page");

        let page = fetch_page(soql.render()?).await?;
        if page.is_empty() {
            warn!(
                fetched = result.len(),
                total = plan.total,
                "Query returned fewer records than counted"
            );
            break;
        }
        result = result.merge(page);
    }

    let total = usize::try_from(plan.total).unwrap_or(usize::MAX);
    if result.len() > total {
        warn!(
            fetched = result.len(),
            total = plan.total,
            "Query returned more records than requested"
        );
        result.records.truncate(total);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::Record;
    use serde_json::json;
    use std::sync::Mutex;

    fn page(start: usize, count: usize) -> PagedResult {
        let records = (start..start + count)
            .map(|i| serde_json::from_value::<Record>(json!({"Id": format!("r{i}")})).unwrap())
            .collect();
        PagedResult::new(count as u64, true, records)
    }

    fn base_query() -> Soql {
        Soql::new()
            .with_select("Id")
            .with_from("Case")
            .unwrap()
    }

    #[test]
    fn test_plan_ceilings() {
        assert_eq!(
            PagePlan::new(3500, 0, false).unwrap(),
            PagePlan { total: 3500, ceiling: 2000 }
        );
        assert_eq!(
            PagePlan::new(450, 0, true).unwrap(),
            PagePlan { total: 450, ceiling: 200 }
        );
        assert_eq!(
            PagePlan::new(3500, 50, false).unwrap(),
            PagePlan { total: 50, ceiling: 50 }
        );
        assert_eq!(
            PagePlan::new(10, 500, true).unwrap(),
            PagePlan { total: 10, ceiling: 200 }
        );
    }

    #[test]
    fn test_plan_too_many_results() {
        let err = PagePlan::new(4500, 0, true).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::TooManyResults { count: 4500 }));
        assert!(err.to_string().contains("4500"));

        let err = PagePlan::new(4001, 0, false).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::TooManyResults { count: 4001 }));

        assert!(PagePlan::new(4000, 0, false).is_ok());
        assert!(PagePlan::new(2200, 0, true).is_ok());
    }

    #[test]
    fn test_plan_pages() {
        assert_eq!(PagePlan::new(0, 0, false).unwrap().pages(), 1);
        assert_eq!(PagePlan::new(3500, 0, false).unwrap().pages(), 2);
        assert_eq!(PagePlan::new(450, 0, true).unwrap().pages(), 3);
    }

    #[tokio::test]
    async fn test_fetch_pages_walks_offsets() {
        let plan = PagePlan::new(450, 0, true).unwrap();
        let seen = Mutex::new(Vec::new());

        let result = fetch_pages(&base_query(), plan, |q| {
            seen.lock().unwrap().push(q.clone());
            let start = seen.lock().unwrap().len() - 1;
            async move { Ok(page(start * 200, if start == 2 { 50 } else { 200 })) }
        })
        .await
        .unwrap();

        assert_eq!(result.len(), 450);
        assert_eq!(result.total, 450);
        assert!(result.complete);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "SELECT Id FROM Case ORDER BY Id LIMIT 200".to_string(),
                "SELECT Id FROM Case ORDER BY Id LIMIT 200 OFFSET 200".to_string(),
                "SELECT Id FROM Case ORDER BY Id LIMIT 200 OFFSET 400".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_pages_last_page_shrinks_to_limit() {
        let plan = PagePlan::new(250, 250, true).unwrap();
        assert_eq!(plan, PagePlan { total: 250, ceiling: 200 });
        let seen = Mutex::new(Vec::new());

        let result = fetch_pages(&base_query(), plan, |q| {
            seen.lock().unwrap().push(q.clone());
            let start = seen.lock().unwrap().len() - 1;
            async move { Ok(page(start * 200, if start == 0 { 200 } else { 50 })) }
        })
        .await
        .unwrap();

        assert_eq!(result.len(), 250);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "SELECT Id FROM Case ORDER BY Id LIMIT 200".to_string(),
                "SELECT Id FROM Case ORDER BY Id LIMIT 50 OFFSET 200".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_pages_truncates_oversized_pages() {
        let plan = PagePlan::new(3500, 3000, false).unwrap();
        assert_eq!(plan, PagePlan { total: 3000, ceiling: 2000 });

        // A server ignoring LIMIT still cannot push the result past the total.
        let result = fetch_pages(&base_query(), plan, |_| async { Ok(page(0, 2000)) })
            .await
            .unwrap();

        assert_eq!(result.len(), 3000);
        assert_eq!(result.total, 3000);
    }

    #[tokio::test]
    async fn test_fetch_pages_zero_total_single_call() {
        let plan = PagePlan::new(0, 0, false).unwrap();
        let calls = Mutex::new(0);

        let result = fetch_pages(&base_query(), plan, |_| {
            *calls.lock().unwrap() += 1;
            async { Ok(PagedResult::new(0, true, vec![])) }
        })
        .await
        .unwrap();

        assert_eq!(*calls.lock().unwrap(), 1);
        assert!(result.is_empty());
        assert!(result.complete);
        assert_eq!(result.total, 0);
    }

    #[tokio::test]
    async fn test_fetch_pages_stops_on_empty_page() {
        let plan = PagePlan::new(300, 0, true).unwrap();
        let calls = Mutex::new(0);

        let result = fetch_pages(&base_query(), plan, |_| {
            let n = {
                let mut calls = calls.lock().unwrap();
                *calls += 1;
                *calls
            };
            async move {
                Ok(if n == 1 { page(0, 200) } else { PagedResult::new(0, true, vec![]) })
            }
        })
        .await
        .unwrap();

        assert_eq!(*calls.lock().unwrap(), 2);
        assert_eq!(result.len(), 200);
        assert_eq!(result.total, 300);
    }

    #[tokio::test]
    async fn test_fetch_pages_propagates_errors() {
        let plan = PagePlan::new(10, 0, false).unwrap();
        let err = fetch_pages(&base_query(), plan, |_| async {
            Err::<PagedResult, _>(Error::new(ErrorKind::Transport("down".into())))
        })
        .await
        .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Transport(_)));
    }
}
