//! # Relational store boundary
//!
//! The lab never stores or indexes anything itself. It drives an external
//! relational engine through the [`OrderStore`] trait, which covers exactly
//! what seeding and the scenario runner need:
//!
//! - **Schema**: create the `orders` table and its secondary indexes
//! - **Bulk insert**: write one batch of [`Order`]s
//! - **Counting**: `count(*)` under a typed [`OrderFilter`]
//! - **Template lookup**: the lowest-id row matching a filter
//! - **Raw queries**: execute parameterized SQL and drain the cursor, or
//!   collect rows as ordered key/value pairs (used for `EXPLAIN` output)
//!
//! ## Backends
//!
//! - **`DuckDbStore`**: embedded DuckDB, on disk or in memory
//!
//! ## Usage
//!
//! ```rust,no_run
//! use slowlab_store::{DuckDbStore, OrderStore};
//! use slowlab_types::OrderFilter;
//!
//! let mut store = DuckDbStore::open("slowlab.duckdb", &[])?;
//! store.ensure_schema()?;
//! let total = store.count(&OrderFilter::All)?;
//! println!("{total} orders");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use slowlab_types::{Order, OrderFilter, PlanRow, SqlParam};

pub mod duckdb;
pub mod schema;

pub use self::duckdb::DuckDbStore;

// ============================================================================
// Store Trait
// ============================================================================

/// A SQL-executing connection holding the `orders` table.
///
/// The trait is object safe: scenario preconditions receive
/// `&mut dyn OrderStore`.
pub trait OrderStore {
    /// Creates the sequence, table and indexes if they are missing.
    fn ensure_schema(&mut self) -> Result<(), StoreError>;

    /// Inserts one batch atomically. Identity values on the input are
    /// ignored; the store assigns them.
    fn insert_batch(&mut self, orders: &[Order]) -> Result<(), StoreError>;

    /// Counts rows matching `filter`.
    fn count(&mut self, filter: &OrderFilter) -> Result<u64, StoreError>;

    /// Returns the matching row with the lowest id, if any.
    fn first_order(&mut self, filter: &OrderFilter) -> Result<Option<Order>, StoreError>;

    /// Executes a query and counts rows until the cursor is exhausted.
    ///
    /// Callers time this call: the measured span covers submission and the
    /// full drain.
    fn drain(&mut self, sql: &str, params: &[SqlParam]) -> Result<u64, StoreError>;

    /// Executes a query and returns each row as ordered `(column, value)`
    /// pairs rendered as text.
    fn fetch_rows(&mut self, sql: &str, params: &[SqlParam]) -> Result<Vec<PlanRow>, StoreError>;

    /// Returns the name of this backend (for logging).
    fn name(&self) -> &'static str;
}

// ============================================================================
// Store Error Types
// ============================================================================

/// Errors raised at the store boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The engine could not be opened or configured.
    #[error("connection error: {0}")]
    Connect(String),

    /// Schema creation failed.
    #[error("schema error: {0}")]
    Schema(String),

    /// An insert or its transaction failed.
    #[error("write error: {0}")]
    Write(String),

    /// A read query failed to prepare, execute or drain.
    #[error("query error: {0}")]
    Query(String),

    /// A row could not be converted into an [`Order`].
    #[error("decode error: {0}")]
    Decode(String),
}
