//! Federal Supply Class and Group queries over `V_H2_FSC` and `V_H2_FSG`.
//!
//! Groups are not stored as such: the group of a class is `class div 100`,
//! so group listings are derived from the class codes in `V_H2_FSG`.

use std::sync::Arc;

use publog_core::FsgCode;
use publog_store::{Store, Value};

use crate::config::Limits;
use crate::error::Result;
use crate::matching::{like_pattern, ClassCode};
use crate::records::{FscRecord, FsgRecord};

const LIST_GROUPS: &str = "SELECT DISTINCT CAST(FSC AS INTEGER) / 100 AS FSG, FSG_TITLE \
     FROM V_H2_FSG ORDER BY FSG";

const LIST_CLASSES: &str = "SELECT * FROM V_H2_FSC ORDER BY FSC";

const IN_RANGE: &str = "SELECT * FROM V_H2_FSC \
     WHERE CAST(FSC AS INTEGER) >= ? AND CAST(FSC AS INTEGER) < ? ORDER BY FSC";

const SEARCH_CODE_OR_TITLE: &str = "SELECT * FROM V_H2_FSC \
     WHERE FSC = ? OR UPPER(FSC_TITLE) LIKE ? ORDER BY FSC LIMIT ?";

const SEARCH_TITLE: &str = "SELECT * FROM V_H2_FSC \
     WHERE UPPER(FSC_TITLE) LIKE ? ORDER BY FSC LIMIT ?";

/// Supply class and group lookups.
pub struct ClassificationService<S: Store> {
    store: Arc<S>,
    limits: Limits,
}

impl<S: Store> ClassificationService<S> {
    /// Create a new classification service.
    #[must_use]
    pub fn new(store: Arc<S>, limits: Limits) -> Self {
        Self { store, limits }
    }

    /// Distinct groups with their titles, ordered by group code.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Store` if the query fails.
    pub fn list_groups(&self) -> Result<Vec<FsgRecord>> {
        let rows = self.store.query(LIST_GROUPS, &[])?;
        Ok(rows.into_iter().map(FsgRecord::from).collect())
    }

    /// Every class, ordered by code.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Store` if the query fails.
    pub fn list_classes(&self) -> Result<Vec<FscRecord>> {
        let rows = self.store.query(LIST_CLASSES, &[])?;
        Ok(rows.into_iter().map(FscRecord::from).collect())
    }

    /// Look up one class.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Store` if the query fails.
    pub fn get_class(&self, code: &ClassCode) -> Result<Option<FscRecord>> {
        let (condition, value) = code.condition();
        let sql = format!("SELECT * FROM V_H2_FSC WHERE {condition} LIMIT 1");
        let rows = self.store.query(&sql, &[value])?;
        Ok(rows.into_iter().next().map(FscRecord::from))
    }

    /// Look up one class from a string, numeric when it parses as one.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Store` if the query fails.
    pub fn get_class_str(&self, code: &str) -> Result<Option<FscRecord>> {
        self.get_class(&ClassCode::parse(code))
    }

    /// Classes in a group, ordered by code. Empty if `group` does not parse.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Store` if the query fails.
    pub fn classes_in_group(&self, group: &str) -> Result<Vec<FscRecord>> {
        let group: FsgCode = match group.parse() {
            Ok(group) => group,
            Err(e) => {
                tracing::debug!(group = %group, error = %e, "Unparseable group code");
                return Ok(Vec::new());
            }
        };
        let (start, end) = group.class_range();
        let rows = self.store.query(
            IN_RANGE,
            &[Value::from(u32::from(start)), Value::from(u32::from(end))],
        )?;
        Ok(rows.into_iter().map(FscRecord::from).collect())
    }

    /// Classes whose code equals an integer `term`, or whose title contains
    /// `term`. Capped regardless of caller limits.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Store` if the query fails.
    pub fn search(&self, term: &str) -> Result<Vec<FscRecord>> {
        let pattern = like_pattern(term);
        let cap = Value::Integer(self.limits.classification_search_cap);
        let rows = match term.trim().parse::<i64>() {
            Ok(code) => self
                .store
                .query(SEARCH_CODE_OR_TITLE, &[Value::Integer(code), pattern, cap])?,
            Err(_) => self.store.query(SEARCH_TITLE, &[pattern, cap])?,
        };
        Ok(rows.into_iter().map(FscRecord::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::load;
    use publog_core::tables;
    use publog_store::SqliteStore;

    const FSC_CSV: &str = "\
FSC,FSC_TITLE
5820,\"RADIO AND TELEVISION COMMUNICATION EQUIPMENT, EXCEPT AIRBORNE\"
5821,\"RADIO AND TELEVISION COMMUNICATION EQUIPMENT, AIRBORNE\"
5905,\"RESISTORS\"
1005,\"GUNS, THROUGH 30 MM\"
";

    const FSG_CSV: &str = "\
FSC,FSG_TITLE
5820,COMMUNICATION EQUIPMENT
5821,COMMUNICATION EQUIPMENT
5905,ELECTRICAL COMPONENTS
1005,WEAPONS
";

    fn create_test_service() -> ClassificationService<SqliteStore> {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        load(&store, tables::V_H2_FSC, FSC_CSV);
        load(&store, tables::V_H2_FSG, FSG_CSV);
        ClassificationService::new(store, Limits::default())
    }

    #[test]
    fn groups_are_derived_from_classes() {
        let service = create_test_service();
        let groups = service.list_groups().unwrap();
        let codes: Vec<i64> = groups.iter().map(|g| g.fsg).collect();
        assert_eq!(codes, vec![10, 58, 59]);
    }

    #[test]
    fn numeric_and_text_lookups_agree() {
        let service = create_test_service();
        let by_str = service.get_class_str("5820").unwrap().unwrap();
        let by_num = service.get_class(&ClassCode::Numeric(5820)).unwrap().unwrap();
        assert_eq!(by_str, by_num);
        assert_eq!(by_num.fsc, "5820");

        assert!(service.get_class_str("58XX").unwrap().is_none());
        assert!(service.get_class(&ClassCode::Numeric(9999)).unwrap().is_none());
    }

    #[test]
    fn classes_in_group_range() {
        let service = create_test_service();
        let classes = service.classes_in_group("58").unwrap();
        let codes: Vec<&str> = classes.iter().map(|c| c.fsc.as_str()).collect();
        assert_eq!(codes, vec!["5820", "5821"]);
    }

    #[test]
    fn classes_in_unparseable_group_is_empty() {
        let service = create_test_service();
        assert!(service.classes_in_group("radio").unwrap().is_empty());
    }

    #[test]
    fn search_by_code_or_title() {
        let service = create_test_service();
        let by_code = service.search("5905").unwrap();
        assert_eq!(by_code.len(), 1);
        assert_eq!(by_code[0].title.as_deref(), Some("RESISTORS"));

        let by_title = service.search("airborne").unwrap();
        assert_eq!(by_title.len(), 2);
    }

    #[test]
    fn search_is_capped() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        load(&store, tables::V_H2_FSC, FSC_CSV);
        let limits = Limits {
            classification_search_cap: 1,
            ..Limits::default()
        };
        let service = ClassificationService::new(store, limits);
        assert_eq!(service.search("radio").unwrap().len(), 1);
    }

    #[test]
    fn missing_relation_is_a_query_error() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let service = ClassificationService::new(store, Limits::default());
        assert!(service.list_classes().is_err());
    }
}
