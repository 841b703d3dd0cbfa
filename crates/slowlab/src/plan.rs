//! Query plan capture.
//!
//! Plans are collected through an ordered list of strategies. The first one
//! the engine accepts wins; each failure is kept so the final error can say
//! what went wrong.

use std::fmt::{self, Display};

use slowlab_store::{OrderStore, StoreError};
use slowlab_types::{PlanRow, SqlParam};
use tracing::debug;

/// How a plan is requested from the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStrategy {
    /// Executes the query and reports actual row counts and timings.
    Analyze,
    /// Reports the estimated plan without executing.
    Static,
}

impl PlanStrategy {
    pub fn prefix(self) -> &'static str {
        match self {
            PlanStrategy::Analyze => "EXPLAIN ANALYZE ",
            PlanStrategy::Static => "EXPLAIN ",
        }
    }

    pub fn wrap(self, sql: &str) -> String {
        format!("{}{sql}", self.prefix())
    }
}

impl Display for PlanStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix().trim_end())
    }
}

/// A plan returned by one strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedPlan {
    pub strategy: PlanStrategy,
    pub rows: Vec<PlanRow>,
}

impl CapturedPlan {
    /// Renders each row as one `column=value ...` line.
    pub fn lines(&self) -> Vec<String> {
        self.rows.iter().map(PlanRow::to_line).collect()
    }
}

/// Every strategy failed.
#[derive(Debug)]
pub struct PlanError {
    pub attempts: Vec<(PlanStrategy, StoreError)>,
}

impl Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.attempts.last() {
            Some((_, err)) => write!(f, "failed to collect EXPLAIN: {err}"),
            None => f.write_str("failed to collect EXPLAIN: no plan strategies configured"),
        }
    }
}

impl std::error::Error for PlanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.attempts
            .last()
            .map(|(_, err)| err as &(dyn std::error::Error + 'static))
    }
}

/// Ordered plan strategies.
#[derive(Debug, Clone)]
pub struct PlanCapture {
    strategies: Vec<PlanStrategy>,
}

impl Default for PlanCapture {
    fn default() -> Self {
        Self::new(vec![PlanStrategy::Analyze, PlanStrategy::Static])
    }
}

impl PlanCapture {
    pub fn new(strategies: Vec<PlanStrategy>) -> Self {
        Self { strategies }
    }

    /// Tries each strategy in order and returns the first plan collected.
    pub fn capture(
        &self,
        store: &mut dyn OrderStore,
        sql: &str,
        params: &[SqlParam],
    ) -> Result<CapturedPlan, PlanError> {
        let mut attempts = Vec::new();
        for &strategy in &self.strategies {
            match store.fetch_rows(&strategy.wrap(sql), params) {
                Ok(rows) => return Ok(CapturedPlan { strategy, rows }),
                Err(err) => {
                    debug!(%strategy, error = %err, "plan strategy failed");
                    attempts.push((strategy, err));
                }
            }
        }
        Err(PlanError { attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slowlab_store::DuckDbStore;
    use slowlab_types::{Order, OrderFilter};

    /// Rejects any statement starting with one of `rejected`.
    struct PickyStore {
        inner: DuckDbStore,
        rejected: Vec<&'static str>,
        seen: Vec<String>,
    }

    impl OrderStore for PickyStore {
        fn ensure_schema(&mut self) -> Result<(), StoreError> {
            self.inner.ensure_schema()
        }

        fn insert_batch(&mut self, orders: &[Order]) -> Result<(), StoreError> {
            self.inner.insert_batch(orders)
        }

        fn count(&mut self, filter: &OrderFilter) -> Result<u64, StoreError> {
            self.inner.count(filter)
        }

        fn first_order(&mut self, filter: &OrderFilter) -> Result<Option<Order>, StoreError> {
            self.inner.first_order(filter)
        }

        fn drain(&mut self, sql: &str, params: &[SqlParam]) -> Result<u64, StoreError> {
            self.inner.drain(sql, params)
        }

        fn fetch_rows(&mut self, sql: &str, params: &[SqlParam]) -> Result<Vec<PlanRow>, StoreError> {
            self.seen.push(sql.to_string());
            if self.rejected.iter().any(|prefix| sql.starts_with(prefix)) {
                return Err(StoreError::Query(format!("rejected: {sql}")));
            }
            self.inner.fetch_rows(sql, params)
        }

        fn name(&self) -> &'static str {
            "picky"
        }
    }

    fn picky(rejected: Vec<&'static str>) -> PickyStore {
        let mut inner = DuckDbStore::open_in_memory().unwrap();
        inner.ensure_schema().unwrap();
        PickyStore {
            inner,
            rejected,
            seen: Vec::new(),
        }
    }

    const SQL: &str = "SELECT customer_id FROM orders WHERE customer_id = 100";

    #[test]
    fn test_first_strategy_wins() {
        let mut store = picky(vec![]);
        let plan = PlanCapture::default().capture(&mut store, SQL, &[]).unwrap();

        assert_eq!(plan.strategy, PlanStrategy::Analyze);
        assert!(!plan.rows.is_empty());
        assert_eq!(store.seen.len(), 1);
    }

    #[test]
    fn test_falls_back_to_static_explain() {
        let mut store = picky(vec!["EXPLAIN ANALYZE"]);
        let plan = PlanCapture::default().capture(&mut store, SQL, &[]).unwrap();

        assert_eq!(plan.strategy, PlanStrategy::Static);
        assert_eq!(store.seen, vec![
            format!("EXPLAIN ANALYZE {SQL}"),
            format!("EXPLAIN {SQL}"),
        ]);
        assert!(plan.lines().iter().all(|line| line.contains('=')));
    }

    #[test]
    fn test_all_strategies_failing_reports_last_error() {
        let mut store = picky(vec!["EXPLAIN"]);
        let err = PlanCapture::default().capture(&mut store, SQL, &[]).unwrap_err();

        assert_eq!(err.attempts.len(), 2);
        assert_eq!(
            err.to_string(),
            format!("failed to collect EXPLAIN: query error: rejected: EXPLAIN {SQL}")
        );
    }

    #[test]
    fn test_empty_strategy_list() {
        let mut store = picky(vec![]);
        let err = PlanCapture::new(vec![]).capture(&mut store, SQL, &[]).unwrap_err();
        assert!(err.attempts.is_empty());
        assert!(store.seen.is_empty());
    }
}
