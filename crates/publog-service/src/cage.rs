//! Contractor (CAGE) queries over `P_CAGE`.

use std::sync::Arc;

use publog_core::{tables, CageCode};
use publog_store::{Store, Value};

use crate::config::Limits;
use crate::error::{Result, ServiceError};
use crate::matching::{exact_code, like_pattern};
use crate::records::{CageRecord, CageStats, GroupCount};
use crate::types::{LocationFilter, Page};

const GET_BY_CODE: &str = "SELECT * FROM P_CAGE WHERE CAGE_CODE = ? LIMIT 1";

const SEARCH: &str = "SELECT * FROM P_CAGE \
     WHERE UPPER(COMPANY) LIKE ? OR UPPER(CITY) LIKE ? OR UPPER(CAGE_CODE) LIKE ? \
     ORDER BY COMPANY LIMIT ? OFFSET ?";

const COUNT: &str = "SELECT COUNT(*) FROM P_CAGE";

const BY_STATUS: &str = "SELECT CAGE_STATUS, COUNT(*) AS count FROM P_CAGE \
     GROUP BY CAGE_STATUS ORDER BY count DESC";

const TOP_COUNTRIES: &str = "SELECT COUNTRY, COUNT(*) AS count FROM P_CAGE \
     GROUP BY COUNTRY ORDER BY count DESC LIMIT 10";

/// Contractor lookups and searches.
pub struct CageService<S: Store> {
    store: Arc<S>,
    limits: Limits,
}

impl<S: Store> CageService<S> {
    /// Create a new contractor service.
    #[must_use]
    pub fn new(store: Arc<S>, limits: Limits) -> Self {
        Self { store, limits }
    }

    /// Look up one contractor by its five-character code.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` if the code is malformed, or
    /// `ServiceError::Store` if the query fails.
    pub fn get_by_code(&self, code: &str) -> Result<Option<CageRecord>> {
        let code: CageCode = code.parse()?;
        let rows = self
            .store
            .query(GET_BY_CODE, &[Value::from(code.as_str())])?;
        Ok(rows.into_iter().next().map(CageRecord::from))
    }

    /// Substring search over company name, city, and code, ordered by company.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for an out-of-range page, or
    /// `ServiceError::Store` if the query fails.
    pub fn search(&self, term: &str, page: Page) -> Result<Vec<CageRecord>> {
        let page = page.validate(self.limits.max_search_results)?;
        let pattern = like_pattern(term);
        let rows = self.store.query(
            SEARCH,
            &[
                pattern.clone(),
                pattern.clone(),
                pattern,
                Value::Integer(page.limit),
                Value::Integer(page.offset),
            ],
        )?;
        Ok(rows.into_iter().map(CageRecord::from).collect())
    }

    /// Contractors matching every supplied location filter.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` if no filter is supplied or the
    /// limit is out of range. Both are checked before querying.
    pub fn search_by_location(
        &self,
        filter: &LocationFilter,
        limit: i64,
    ) -> Result<Vec<CageRecord>> {
        if filter.is_empty() {
            return Err(ServiceError::InvalidArgument(
                "at least one of state, city, or country is required".to_string(),
            ));
        }
        let page = Page::first(limit).validate(self.limits.max_search_results)?;

        let supplied = |f: &Option<String>| {
            f.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
        };
        let mut conditions = Vec::new();
        let mut params = Vec::new();
        if let Some(state) = supplied(&filter.state) {
            conditions.push("UPPER(STATE_PROVINCE) = ?");
            params.push(exact_code(&state));
        }
        if let Some(city) = supplied(&filter.city) {
            conditions.push("UPPER(CITY) LIKE ?");
            params.push(like_pattern(&city));
        }
        if let Some(country) = supplied(&filter.country) {
            conditions.push("UPPER(COUNTRY) LIKE ?");
            params.push(like_pattern(&country));
        }
        params.push(Value::Integer(page.limit));

        let sql = format!(
            "SELECT * FROM P_CAGE WHERE {} ORDER BY COMPANY LIMIT ?",
            conditions.join(" AND ")
        );
        let rows = self.store.query(&sql, &params)?;
        Ok(rows.into_iter().map(CageRecord::from).collect())
    }

    /// Totals by status and the ten most common countries.
    ///
    /// Returns empty statistics, and logs the failure, if the relation is
    /// absent or the aggregation fails.
    #[must_use]
    pub fn stats(&self) -> CageStats {
        match self.try_stats() {
            Ok(stats) => stats,
            Err(e) => {
                tracing::error!(table = tables::P_CAGE, error = %e, "Failed to compute contractor stats");
                CageStats::default()
            }
        }
    }

    fn try_stats(&self) -> Result<CageStats> {
        let total_records = self
            .store
            .query_scalar(COUNT, &[])?
            .and_then(|v| v.as_i64())
            .and_then(|n| u64::try_from(n).ok())
            .unwrap_or(0);
        let by_status = self
            .store
            .query(BY_STATUS, &[])?
            .iter()
            .map(|row| GroupCount::from_row(row, "CAGE_STATUS"))
            .collect();
        let top_countries = self
            .store
            .query(TOP_COUNTRIES, &[])?
            .iter()
            .map(|row| GroupCount::from_row(row, "COUNTRY"))
            .collect();
        Ok(CageStats {
            total_records,
            by_status,
            top_countries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::load;
    use publog_store::SqliteStore;

    const CAGE_CSV: &str = "\
CAGE_CODE,COMPANY,CITY,STATE_PROVINCE,COUNTRY,CAGE_STATUS
1ABC2,ACME WIDGETS,DAYTON,OH,UNITED STATES,A
3DEF4,BOLT WORKS,COLUMBUS,OH,UNITED STATES,A
5GHI6,CANADIAN GEAR,TORONTO,ON,CANADA,H
7JKL8,DAYTON TOOL,SPRINGFIELD,IL,UNITED STATES,A
";

    fn create_test_service() -> CageService<SqliteStore> {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        load(&store, tables::P_CAGE, CAGE_CSV);
        CageService::new(store, Limits::default())
    }

    #[test]
    fn get_by_code_normalizes_case() {
        let service = create_test_service();
        let record = service.get_by_code("1abc2").unwrap().unwrap();
        assert_eq!(record.company.as_deref(), Some("ACME WIDGETS"));
        assert!(service.get_by_code("9ZZZ9").unwrap().is_none());
    }

    #[test]
    fn get_by_code_rejects_malformed() {
        let service = create_test_service();
        assert!(matches!(
            service.get_by_code("TOO-LONG"),
            Err(ServiceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn search_matches_company_or_city() {
        let service = create_test_service();
        let results = service.search("dayton", Page::first(10)).unwrap();
        let codes: Vec<&str> = results.iter().map(|r| r.cage_code.as_str()).collect();
        // ordered by company
        assert_eq!(codes, vec!["1ABC2", "7JKL8"]);

        let page = service.search("dayton", Page::new(1, 1)).unwrap();
        assert_eq!(page[0].cage_code, "7JKL8");
    }

    #[test]
    fn search_rejects_bad_page() {
        let service = create_test_service();
        assert!(matches!(
            service.search("a", Page::first(0)),
            Err(ServiceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn location_requires_a_filter() {
        let service = create_test_service();
        let err = service
            .search_by_location(&LocationFilter::default(), 10)
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));
    }

    #[test]
    fn location_filters_combine() {
        let service = create_test_service();
        let filter = LocationFilter {
            state: Some("oh".into()),
            city: Some("col".into()),
            country: None,
        };
        let results = service.search_by_location(&filter, 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].cage_code, "3DEF4");
    }

    #[test]
    fn stats_group_counts() {
        let service = create_test_service();
        let stats = service.stats();
        assert_eq!(stats.total_records, 4);
        assert_eq!(stats.by_status[0].value.as_deref(), Some("A"));
        assert_eq!(stats.by_status[0].count, 3);
        assert_eq!(stats.top_countries[0].value.as_deref(), Some("UNITED STATES"));
    }

    #[test]
    fn stats_empty_when_relation_absent() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let service = CageService::new(store, Limits::default());
        assert_eq!(service.stats(), CageStats::default());
    }
}
