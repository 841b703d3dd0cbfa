//! Paired slow/fast query scenarios and the runner that measures them.
//!
//! Each pair demonstrates one indexing pitfall. The runner makes sure the
//! data a scenario needs exists, times the query until its cursor is fully
//! drained and captures the plan. A failing scenario is recorded and the run
//! moves on.

use std::fmt::{self, Display};
use std::time::{Duration, Instant};

use slowlab_store::{OrderStore, StoreError};
use slowlab_types::SqlParam;
use tracing::{info, warn};

use crate::plan::PlanCapture;
use crate::populate::{PopulateError, Populator};
use crate::record::{self, DATE_RANGE_DAY, HOT_CUSTOMER_ID, HOT_PHONE};

/// Ensures the rows a scenario reads exist. Returns the rows inserted.
pub type Precondition = fn(&Populator, &mut dyn OrderStore) -> Result<u64, PopulateError>;

// ============================================================================
// Catalog
// ============================================================================

/// The pitfall a scenario pair compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioGroup {
    BookmarkLookup,
    FunctionOnIndexedColumn,
    TypeMatching,
}

impl ScenarioGroup {
    pub fn label(self) -> &'static str {
        match self {
            ScenarioGroup::BookmarkLookup => "Bookmark lookup",
            ScenarioGroup::FunctionOnIndexedColumn => "Function on indexed column",
            ScenarioGroup::TypeMatching => "Type matching",
        }
    }
}

impl Display for ScenarioGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One query to measure.
#[derive(Debug, Clone)]
pub struct ScenarioDefinition {
    pub group: ScenarioGroup,
    pub name: &'static str,
    pub description: &'static str,
    /// SQL with `?` placeholders.
    pub query: &'static str,
    pub params: Vec<SqlParam>,
    pub precondition: Option<Precondition>,
}

fn hot_customer(populator: &Populator, store: &mut dyn OrderStore) -> Result<u64, PopulateError> {
    populator.ensure_hot_customer_orders(store)
}

fn hot_phone(populator: &Populator, store: &mut dyn OrderStore) -> Result<u64, PopulateError> {
    populator.ensure_hot_phone_orders(store)
}

fn date_range(populator: &Populator, store: &mut dyn OrderStore) -> Result<u64, PopulateError> {
    populator.ensure_date_range_orders(store)
}

/// Returns the scenarios in run order: slow variant first in each pair.
pub fn catalog() -> Vec<ScenarioDefinition> {
    let (window_start, window_end) = record::date_range_window();

    vec![
        ScenarioDefinition {
            group: ScenarioGroup::BookmarkLookup,
            name: "bookmark-lookup",
            description: "Secondary index hit, then a row fetch for every column of each match",
            query: "SELECT * FROM orders WHERE customer_id = ?",
            params: vec![SqlParam::from(HOT_CUSTOMER_ID)],
            precondition: Some(hot_customer),
        },
        ScenarioDefinition {
            group: ScenarioGroup::BookmarkLookup,
            name: "covering-index",
            description: "Only the indexed column is selected, so the index answers alone",
            query: "SELECT customer_id FROM orders WHERE customer_id = ?",
            params: vec![SqlParam::from(HOT_CUSTOMER_ID)],
            precondition: Some(hot_customer),
        },
        ScenarioDefinition {
            group: ScenarioGroup::FunctionOnIndexedColumn,
            name: "function-wrapped",
            description: "Formatting created_at in the predicate hides it from the index",
            query: "SELECT * FROM orders WHERE strftime(created_at, '%Y-%m-%d') = ?",
            params: vec![SqlParam::from(DATE_RANGE_DAY)],
            precondition: Some(date_range),
        },
        ScenarioDefinition {
            group: ScenarioGroup::FunctionOnIndexedColumn,
            name: "range-predicate",
            description: "Half-open range on the bare column keeps the index usable",
            query: "SELECT * FROM orders WHERE created_at >= ? AND created_at < ?",
            params: vec![
                SqlParam::Timestamp(window_start),
                SqlParam::Timestamp(window_end),
            ],
            precondition: Some(date_range),
        },
        ScenarioDefinition {
            group: ScenarioGroup::TypeMatching,
            name: "implicit-coercion",
            description: "Text phone compared as a number, converting every row",
            query: "SELECT * FROM orders WHERE phone = 13812345678",
            params: Vec::new(),
            precondition: Some(hot_phone),
        },
        ScenarioDefinition {
            group: ScenarioGroup::TypeMatching,
            name: "type-matched",
            description: "Text phone compared with a text parameter",
            query: "SELECT * FROM orders WHERE phone = ?",
            params: vec![SqlParam::from(HOT_PHONE)],
            precondition: Some(hot_phone),
        },
    ]
}

// ============================================================================
// Results
// ============================================================================

/// Why a scenario produced no measurement.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("setup: {0}")]
    Setup(#[source] PopulateError),

    #[error("query: {0}")]
    Query(#[source] StoreError),

    #[error("aborted")]
    Aborted,
}

/// Outcome of one scenario in one run.
#[derive(Debug)]
pub struct ScenarioResult {
    pub group: ScenarioGroup,
    pub name: &'static str,
    pub description: &'static str,
    pub duration: Duration,
    pub row_count: u64,
    /// One entry per plan row, or a single failure line.
    pub plan: Vec<String>,
    pub error: Option<ScenarioError>,
}

impl ScenarioResult {
    fn new(scenario: &ScenarioDefinition) -> Self {
        Self {
            group: scenario.group,
            name: scenario.name,
            description: scenario.description,
            duration: Duration::ZERO,
            row_count: 0,
            plan: Vec::new(),
            error: None,
        }
    }

    fn failed(mut self, error: ScenarioError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// `OK`, or `ERR: ` followed by the failure.
    pub fn status(&self) -> String {
        match &self.error {
            None => "OK".to_string(),
            Some(err) => format!("ERR: {err}"),
        }
    }
}

// ============================================================================
// Runner
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerOptions {
    /// Collect a query plan after each successful query.
    pub capture_plans: bool,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            capture_plans: true,
        }
    }
}

/// Runs scenarios sequentially against one store.
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    populator: Populator,
    plans: PlanCapture,
    options: RunnerOptions,
}

impl ScenarioRunner {
    /// Creates a runner whose preconditions top up through `populator`.
    ///
    /// The populator's abort flag also stops the run.
    pub fn new(populator: Populator) -> Self {
        Self {
            populator,
            plans: PlanCapture::default(),
            options: RunnerOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: RunnerOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_plan_capture(mut self, plans: PlanCapture) -> Self {
        self.plans = plans;
        self
    }

    /// Returns exactly one result per scenario, in order.
    pub fn run(
        &self,
        store: &mut dyn OrderStore,
        scenarios: &[ScenarioDefinition],
    ) -> Vec<ScenarioResult> {
        scenarios
            .iter()
            .map(|scenario| self.run_one(store, scenario))
            .collect()
    }

    /// Runs a single scenario. Failures are recorded on the result.
    pub fn run_one(
        &self,
        store: &mut dyn OrderStore,
        scenario: &ScenarioDefinition,
    ) -> ScenarioResult {
        let result = ScenarioResult::new(scenario);
        if self.populator.abort_flag().is_raised() {
            return result.failed(ScenarioError::Aborted);
        }

        if let Some(precondition) = scenario.precondition
            && let Err(err) = precondition(&self.populator, store)
        {
            warn!(scenario = scenario.name, error = %err, "scenario setup failed");
            return result.failed(ScenarioError::Setup(err));
        }

        let started = Instant::now();
        let row_count = match store.drain(scenario.query, &scenario.params) {
            Ok(rows) => rows,
            Err(err) => {
                warn!(scenario = scenario.name, error = %err, "scenario query failed");
                return result.failed(ScenarioError::Query(err));
            }
        };
        let duration = started.elapsed();
        info!(
            scenario = scenario.name,
            rows = row_count,
            elapsed_ms = duration.as_secs_f64() * 1_000.0,
            "scenario measured"
        );

        let plan = if self.options.capture_plans {
            match self.plans.capture(store, scenario.query, &scenario.params) {
                Ok(plan) => plan.lines(),
                Err(err) => vec![err.to_string()],
            }
        } else {
            Vec::new()
        };

        ScenarioResult {
            duration,
            row_count,
            plan,
            ..result
        }
    }
}
