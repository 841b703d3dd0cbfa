//! Idempotent dataset population.
//!
//! Every population is guarded by count-then-top-up: the populator counts the
//! rows that already match the population's filter and inserts only the
//! deficit. Re-running with the same targets inserts nothing, and a run that
//! was interrupted resumes where it stopped.

use std::fmt::{self, Display};

use chrono::{NaiveDateTime, Utc};
use slowlab_store::{OrderStore, StoreError};
use slowlab_types::{CustomerId, Order, OrderFilter};
use tracing::{debug, info, warn};

use crate::abort::AbortFlag;
use crate::record::{
    self, HOT_CUSTOMER_ID, HOT_PHONE, build_order, date_range_order, hot_customer_clone,
    hot_phone_order,
};
use crate::rng::LabRng;

/// Batch size used when the configured size is zero.
pub const DEFAULT_BATCH_SIZE: usize = 1_000;

/// Hot-customer clones are always written in batches of this size.
pub const HOT_CUSTOMER_BATCH_SIZE: usize = 1_000;

pub const DEFAULT_SEED: u64 = 42;

const HOT_PHONE_STREAM: u64 = 2;
const DATE_RANGE_STREAM: u64 = 3;

// ============================================================================
// Configuration
// ============================================================================

/// One of the four independently topped-up row sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Population {
    General,
    HotCustomer,
    HotPhone,
    DateRange,
}

impl Display for Population {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Population::General => "general",
            Population::HotCustomer => "hot-customer",
            Population::HotPhone => "hot-phone",
            Population::DateRange => "date-range",
        })
    }
}

/// Row count each population is topped up to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopulationTargets {
    pub orders: u64,
    pub hot_customer: u64,
    pub hot_phone: u64,
    pub date_range: u64,
}

impl Default for PopulationTargets {
    fn default() -> Self {
        Self {
            orders: 1_000_000,
            hot_customer: 1_000_000,
            hot_phone: 2_000,
            date_range: 2_000,
        }
    }
}

/// Seeding parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedConfig {
    pub targets: PopulationTargets,
    /// Rows per insert statement for the general, hot-phone and date-range
    /// populations.
    pub batch_size: usize,
    pub seed: u64,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            targets: PopulationTargets::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            seed: DEFAULT_SEED,
        }
    }
}

impl SeedConfig {
    /// Returns a copy with a zero batch size replaced by
    /// [`DEFAULT_BATCH_SIZE`] and the general target raised to the
    /// hot-customer target.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.batch_size == 0 {
            self.batch_size = DEFAULT_BATCH_SIZE;
        }
        if self.targets.orders < self.targets.hot_customer {
            self.targets.orders = self.targets.hot_customer;
        }
        self
    }

    /// Returns true when [`SeedConfig::normalized`] would raise the general
    /// target.
    pub fn orders_below_minimum(&self) -> bool {
        self.targets.orders < self.targets.hot_customer
    }
}

/// Rows inserted by one [`Populator::seed_all`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulationReport {
    pub general: u64,
    pub hot_customer: u64,
    pub hot_phone: u64,
    pub date_range: u64,
}

impl PopulationReport {
    pub fn total(&self) -> u64 {
        self.general + self.hot_customer + self.hot_phone + self.date_range
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PopulateError {
    #[error("count {population} orders: {source}")]
    Count {
        population: Population,
        source: StoreError,
    },

    #[error("fetch template order: no order found for customer {customer}")]
    MissingTemplate { customer: CustomerId },

    #[error("fetch template order: {0}")]
    TemplateLookup(#[source] StoreError),

    #[error("insert {population} batch: {source}")]
    Write {
        population: Population,
        source: StoreError,
    },

    #[error("population aborted")]
    Aborted,
}

// ============================================================================
// Populator
// ============================================================================

/// Tops up the store toward [`PopulationTargets`].
///
/// The populator holds no connection. Every method borrows the store for the
/// duration of the call, so scenario preconditions can share it.
#[derive(Debug, Clone)]
pub struct Populator {
    config: SeedConfig,
    now: NaiveDateTime,
    abort: AbortFlag,
}

impl Populator {
    /// Creates a populator anchored at the current UTC time.
    pub fn new(config: SeedConfig) -> Self {
        Self::with_now(config, Utc::now().naive_utc())
    }

    /// Creates a populator anchored at `now`, making its output fully
    /// reproducible.
    pub fn with_now(config: SeedConfig, now: NaiveDateTime) -> Self {
        Self {
            config: config.normalized(),
            now,
            abort: AbortFlag::new(),
        }
    }

    #[must_use]
    pub fn with_abort(mut self, abort: AbortFlag) -> Self {
        self.abort = abort;
        self
    }

    /// Returns the normalized configuration.
    pub fn config(&self) -> &SeedConfig {
        &self.config
    }

    pub fn abort_flag(&self) -> &AbortFlag {
        &self.abort
    }

    /// Tops up the general population to `targets.orders` rows in total.
    ///
    /// New rows continue the global index from the current row count.
    pub fn seed_orders<S>(&self, store: &mut S) -> Result<u64, PopulateError>
    where
        S: OrderStore + ?Sized,
    {
        let population = Population::General;
        let target = self.config.targets.orders;
        let Some(existing) = self.deficit(store, population, &OrderFilter::All, target)? else {
            return Ok(0);
        };

        let mut rng = LabRng::new(self.config.seed);
        let now = self.now;
        self.fill(store, population, existing, target, self.config.batch_size, |index| {
            build_order(index, &mut rng, now)
        })
    }

    /// Tops up rows owned by [`HOT_CUSTOMER_ID`] by cloning the customer's
    /// lowest-id order.
    pub fn ensure_hot_customer_orders<S>(&self, store: &mut S) -> Result<u64, PopulateError>
    where
        S: OrderStore + ?Sized,
    {
        let population = Population::HotCustomer;
        let filter = OrderFilter::Customer(HOT_CUSTOMER_ID);
        let target = self.config.targets.hot_customer;
        let Some(existing) = self.deficit(store, population, &filter, target)? else {
            return Ok(0);
        };

        let template = store
            .first_order(&filter)
            .map_err(PopulateError::TemplateLookup)?
            .ok_or(PopulateError::MissingTemplate {
                customer: HOT_CUSTOMER_ID,
            })?;
        debug!(template_id = ?template.id, "hot-customer template loaded");

        self.fill(store, population, existing, target, HOT_CUSTOMER_BATCH_SIZE, |n| {
            hot_customer_clone(&template, n)
        })
    }

    /// Tops up rows whose phone is [`HOT_PHONE`].
    pub fn ensure_hot_phone_orders<S>(&self, store: &mut S) -> Result<u64, PopulateError>
    where
        S: OrderStore + ?Sized,
    {
        let population = Population::HotPhone;
        let filter = OrderFilter::Phone(HOT_PHONE.to_string());
        let target = self.config.targets.hot_phone;
        let Some(existing) = self.deficit(store, population, &filter, target)? else {
            return Ok(0);
        };

        let mut rng = LabRng::for_stream(self.config.seed, HOT_PHONE_STREAM);
        let now = self.now;
        self.fill(store, population, existing, target, self.config.batch_size, |n| {
            hot_phone_order(n, &mut rng, now)
        })
    }

    /// Tops up rows created inside the 2024-01-01 window.
    pub fn ensure_date_range_orders<S>(&self, store: &mut S) -> Result<u64, PopulateError>
    where
        S: OrderStore + ?Sized,
    {
        let population = Population::DateRange;
        let (start, end) = record::date_range_window();
        let filter = OrderFilter::CreatedBetween { start, end };
        let target = self.config.targets.date_range;
        let Some(existing) = self.deficit(store, population, &filter, target)? else {
            return Ok(0);
        };

        let mut rng = LabRng::for_stream(self.config.seed, DATE_RANGE_STREAM);
        self.fill(store, population, existing, target, self.config.batch_size, |n| {
            date_range_order(n, &mut rng)
        })
    }

    /// Runs every population in dependency order. The general population
    /// goes first because it creates the hot-customer template.
    pub fn seed_all<S>(&self, store: &mut S) -> Result<PopulationReport, PopulateError>
    where
        S: OrderStore + ?Sized,
    {
        let report = PopulationReport {
            general: self.seed_orders(store)?,
            hot_customer: self.ensure_hot_customer_orders(store)?,
            hot_phone: self.ensure_hot_phone_orders(store)?,
            date_range: self.ensure_date_range_orders(store)?,
        };
        info!(inserted = report.total(), "seeding complete");
        Ok(report)
    }

    /// Returns the current matching count when it is below `target`.
    fn deficit<S>(
        &self,
        store: &mut S,
        population: Population,
        filter: &OrderFilter,
        target: u64,
    ) -> Result<Option<u64>, PopulateError>
    where
        S: OrderStore + ?Sized,
    {
        let existing = store
            .count(filter)
            .map_err(|source| PopulateError::Count { population, source })?;
        if existing >= target {
            debug!(%population, existing, target, "population already at target");
            return Ok(None);
        }
        info!(%population, existing, target, "topping up population");
        Ok(Some(existing))
    }

    /// Inserts rows `existing..target`, built by `make`, flushing every
    /// `batch_size` rows and once more for the remainder.
    fn fill<S, F>(
        &self,
        store: &mut S,
        population: Population,
        existing: u64,
        target: u64,
        batch_size: usize,
        mut make: F,
    ) -> Result<u64, PopulateError>
    where
        S: OrderStore + ?Sized,
        F: FnMut(u64) -> Order,
    {
        let batch_size = batch_size.max(1);
        let mut batch: Vec<Order> = Vec::with_capacity(batch_size);
        let mut inserted = 0u64;

        for n in existing..target {
            batch.push(make(n));
            if batch.len() == batch_size {
                inserted += self.flush(store, population, &mut batch)?;
            }
        }
        if !batch.is_empty() {
            inserted += self.flush(store, population, &mut batch)?;
        }

        info!(%population, inserted, "population topped up");
        Ok(inserted)
    }

    fn flush<S>(
        &self,
        store: &mut S,
        population: Population,
        batch: &mut Vec<Order>,
    ) -> Result<u64, PopulateError>
    where
        S: OrderStore + ?Sized,
    {
        if self.abort.is_raised() {
            warn!(%population, "abort requested, stopping population");
            return Err(PopulateError::Aborted);
        }
        store
            .insert_batch(batch)
            .map_err(|source| PopulateError::Write { population, source })?;
        let written = batch.len() as u64;
        debug!(%population, rows = written, "batch inserted");
        batch.clear();
        Ok(written)
    }
}
