//! # slowlab: indexing pitfall lab
//!
//! Seeds an `orders` table with deterministic synthetic data, then runs
//! paired slow/fast queries and captures their plans:
//!
//! | Pitfall | Slow | Fast |
//! |---|---|---|
//! | Bookmark lookup | `bookmark-lookup` | `covering-index` |
//! | Function on indexed column | `function-wrapped` | `range-predicate` |
//! | Type matching | `implicit-coercion` | `type-matched` |
//!
//! The crate never talks to an engine directly. Everything goes through
//! [`slowlab_store::OrderStore`].
//!
//! ```rust,no_run
//! use slowlab::{Populator, ScenarioRunner, SeedConfig, catalog};
//! use slowlab_store::{DuckDbStore, OrderStore};
//!
//! let mut store = DuckDbStore::open_in_memory()?;
//! store.ensure_schema()?;
//!
//! let populator = Populator::new(SeedConfig::default());
//! populator.seed_all(&mut store)?;
//!
//! for result in ScenarioRunner::new(populator).run(&mut store, &catalog()) {
//!     println!("{} {:?} {}", result.name, result.duration, result.status());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod abort;
pub mod plan;
pub mod populate;
pub mod record;
pub mod rng;
pub mod scenario;

pub use abort::AbortFlag;
pub use plan::{CapturedPlan, PlanCapture, PlanError, PlanStrategy};
pub use populate::{
    PopulateError, Population, PopulationReport, PopulationTargets, Populator, SeedConfig,
};
pub use rng::LabRng;
pub use scenario::{
    RunnerOptions, ScenarioDefinition, ScenarioError, ScenarioGroup, ScenarioResult,
    ScenarioRunner, catalog,
};
