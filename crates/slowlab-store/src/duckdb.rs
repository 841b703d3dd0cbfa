//! DuckDB store implementation.
//!
//! Wraps an embedded DuckDB connection. Secondary indexes are ART indexes,
//! and both `EXPLAIN ANALYZE` and `EXPLAIN` are available for plan capture.

use chrono::{DateTime, NaiveDateTime};
use duckdb::types::{TimeUnit, Value, ValueRef};
use duckdb::{Config, Connection, params_from_iter};
use slowlab_types::{CustomerId, Order, OrderFilter, PlanRow, SqlParam};
use tracing::{debug, info};

use crate::schema::{self, ORDERS_DDL};
use crate::{OrderStore, StoreError};

/// Path that opens a transient in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// DuckDB-backed [`OrderStore`].
pub struct DuckDbStore {
    conn: Connection,
}

impl DuckDbStore {
    /// Opens (or creates) a database at `path`, applying engine settings such
    /// as `threads` or `memory_limit`. `":memory:"` opens a transient store.
    pub fn open(path: &str, settings: &[(String, String)]) -> Result<Self, StoreError> {
        let mut config = Config::default();
        for (key, value) in settings {
            config = config.with(key, value).map_err(|e| {
                StoreError::Connect(format!("invalid DuckDB setting {key}={value}: {e}"))
            })?;
        }

        let conn = if path == IN_MEMORY {
            Connection::open_in_memory_with_flags(config)
        } else {
            Connection::open_with_flags(path, config)
        }
        .map_err(|e| StoreError::Connect(format!("failed to open DuckDB at {path}: {e}")))?;

        info!(path, settings = settings.len(), "DuckDB store opened");
        Ok(Self { conn })
    }

    /// Opens an in-memory store with default settings.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::open(IN_MEMORY, &[])
    }

    /// Converts a bound parameter into a DuckDB value.
    fn to_value(param: &SqlParam) -> Value {
        match param {
            SqlParam::Int(n) => Value::BigInt(*n),
            SqlParam::Text(s) => Value::Text(s.clone()),
            SqlParam::Timestamp(ts) => timestamp_value(*ts),
        }
    }

    fn to_values(params: &[SqlParam]) -> Vec<Value> {
        params.iter().map(Self::to_value).collect()
    }

    /// Renders a DuckDB value as display text for plan rows.
    fn render_value(value: ValueRef<'_>) -> String {
        match value {
            ValueRef::Null => "NULL".to_string(),
            ValueRef::Boolean(b) => b.to_string(),
            ValueRef::TinyInt(i) => i.to_string(),
            ValueRef::SmallInt(i) => i.to_string(),
            ValueRef::Int(i) => i.to_string(),
            ValueRef::BigInt(i) => i.to_string(),
            ValueRef::HugeInt(i) => i.to_string(),
            ValueRef::UTinyInt(i) => i.to_string(),
            ValueRef::USmallInt(i) => i.to_string(),
            ValueRef::UInt(i) => i.to_string(),
            ValueRef::UBigInt(i) => i.to_string(),
            ValueRef::Float(f) => f.to_string(),
            ValueRef::Double(f) => f.to_string(),
            ValueRef::Decimal(d) => d.to_string(),
            ValueRef::Timestamp(unit, raw) => from_timestamp(unit, raw).map_or_else(
                || raw.to_string(),
                |ts| ts.format(slowlab_types::DATE_TIME_LAYOUT).to_string(),
            ),
            ValueRef::Text(s) => String::from_utf8_lossy(s).to_string(),
            ValueRef::Blob(b) => format!("<{} bytes>", b.len()),
            _ => "?".to_string(),
        }
    }

    /// Decodes a row selected by [`schema::first_order_sql`].
    fn decode_order(row: &duckdb::Row<'_>) -> Result<Order, StoreError> {
        let text = |idx: usize| {
            row.get::<_, String>(idx)
                .map_err(|e| StoreError::Decode(format!("column {idx}: {e}")))
        };
        let int = |idx: usize| {
            row.get::<_, i64>(idx)
                .map_err(|e| StoreError::Decode(format!("column {idx}: {e}")))
        };
        let timestamp = |idx: usize| -> Result<Option<NaiveDateTime>, StoreError> {
            let value = row
                .get_ref(idx)
                .map_err(|e| StoreError::Decode(format!("column {idx}: {e}")))?;
            match value {
                ValueRef::Null => Ok(None),
                ValueRef::Timestamp(unit, raw) => from_timestamp(unit, raw)
                    .map(Some)
                    .ok_or_else(|| StoreError::Decode(format!("column {idx}: timestamp out of range"))),
                other => Err(StoreError::Decode(format!(
                    "column {idx}: expected TIMESTAMP, found {other:?}"
                ))),
            }
        };
        let required = |idx: usize| {
            timestamp(idx)?
                .ok_or_else(|| StoreError::Decode(format!("column {idx}: unexpected NULL")))
        };

        Ok(Order {
            id: Some(int(0)? as u64),
            customer_id: CustomerId::new(int(1)? as u64),
            customer_name: text(2)?,
            phone: text(3)?,
            status: text(4)?,
            product_category: text(5)?,
            region: text(6)?,
            total_amount: row
                .get::<_, f64>(7)
                .map_err(|e| StoreError::Decode(format!("column 7: {e}")))?,
            discount_code: text(8)?,
            note: text(9)?,
            created_at: required(10)?,
            updated_at: required(11)?,
            shipped_at: timestamp(12)?,
        })
    }
}

impl OrderStore for DuckDbStore {
    fn ensure_schema(&mut self) -> Result<(), StoreError> {
        self.conn
            .execute_batch(ORDERS_DDL)
            .map_err(|e| StoreError::Schema(format!("DuckDB error: {e}")))?;
        debug!("orders schema ensured");
        Ok(())
    }

    fn insert_batch(&mut self, orders: &[Order]) -> Result<(), StoreError> {
        if orders.is_empty() {
            return Ok(());
        }

        let sql = schema::insert_sql(orders.len());
        let mut values = Vec::with_capacity(orders.len() * schema::INSERT_COLUMNS.len());
        for order in orders {
            values.extend([
                Value::BigInt(order.customer_id.as_u64() as i64),
                Value::Text(order.customer_name.clone()),
                Value::Text(order.phone.clone()),
                Value::Text(order.status.clone()),
                Value::Text(order.product_category.clone()),
                Value::Text(order.region.clone()),
                Value::Double(order.total_amount),
                Value::Text(order.discount_code.clone()),
                Value::Text(order.note.clone()),
                timestamp_value(order.created_at),
                timestamp_value(order.updated_at),
                order.shipped_at.map_or(Value::Null, timestamp_value),
            ]);
        }

        let tx = self
            .conn
            .transaction()
            .map_err(|e| StoreError::Write(format!("failed to begin transaction: {e}")))?;
        tx.execute(&sql, params_from_iter(values))
            .map_err(|e| StoreError::Write(format!("DuckDB error: {e}")))?;
        tx.commit()
            .map_err(|e| StoreError::Write(format!("failed to commit batch: {e}")))?;
        Ok(())
    }

    fn count(&mut self, filter: &OrderFilter) -> Result<u64, StoreError> {
        let (clause, params) = filter.to_sql();
        let sql = schema::count_sql(clause);
        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(Self::to_values(&params)), |row| {
                row.get(0)
            })
            .map_err(|e| StoreError::Query(format!("count {filter}: {e}")))?;
        Ok(count as u64)
    }

    fn first_order(&mut self, filter: &OrderFilter) -> Result<Option<Order>, StoreError> {
        let (clause, params) = filter.to_sql();
        let sql = schema::first_order_sql(clause);
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| StoreError::Query(format!("DuckDB syntax error: {e}")))?;
        let mut rows = stmt
            .query(params_from_iter(Self::to_values(&params)))
            .map_err(|e| StoreError::Query(format!("DuckDB runtime error: {e}")))?;

        match rows
            .next()
            .map_err(|e| StoreError::Query(format!("failed to fetch row: {e}")))?
        {
            Some(row) => Self::decode_order(row).map(Some),
            None => Ok(None),
        }
    }

    fn drain(&mut self, sql: &str, params: &[SqlParam]) -> Result<u64, StoreError> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| StoreError::Query(format!("DuckDB syntax error: {e}")))?;
        let mut rows = stmt
            .query(params_from_iter(Self::to_values(params)))
            .map_err(|e| StoreError::Query(format!("DuckDB runtime error: {e}")))?;

        let mut count = 0u64;
        while rows
            .next()
            .map_err(|e| StoreError::Query(format!("failed to fetch row: {e}")))?
            .is_some()
        {
            count += 1;
        }
        Ok(count)
    }

    fn fetch_rows(&mut self, sql: &str, params: &[SqlParam]) -> Result<Vec<PlanRow>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| StoreError::Query(format!("DuckDB syntax error: {e}")))?;
        let mut rows = stmt
            .query(params_from_iter(Self::to_values(params)))
            .map_err(|e| StoreError::Query(format!("DuckDB runtime error: {e}")))?;

        // Column metadata is only available once the statement has executed,
        // so names are read from the first row.
        let mut columns: Vec<String> = Vec::new();
        let mut out = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| StoreError::Query(format!("failed to fetch row: {e}")))?
        {
            if columns.is_empty() {
                let stmt = row.as_ref();
                for i in 0..stmt.column_count() {
                    let name = stmt
                        .column_name(i)
                        .map_err(|e| StoreError::Query(format!("failed to get column name: {e}")))?
                        .to_string();
                    columns.push(name);
                }
            }

            let mut plan_row = PlanRow::new();
            for (i, column) in columns.iter().enumerate() {
                let value = row
                    .get_ref(i)
                    .map_err(|e| StoreError::Query(format!("failed to get column {i}: {e}")))?;
                plan_row.push(column.clone(), Self::render_value(value));
            }
            out.push(plan_row);
        }

        Ok(out)
    }

    fn name(&self) -> &'static str {
        "DuckDB"
    }
}

fn timestamp_value(ts: NaiveDateTime) -> Value {
    Value::Timestamp(TimeUnit::Microsecond, ts.and_utc().timestamp_micros())
}

fn from_timestamp(unit: TimeUnit, raw: i64) -> Option<NaiveDateTime> {
    let micros = match unit {
        TimeUnit::Second => raw.checked_mul(1_000_000)?,
        TimeUnit::Millisecond => raw.checked_mul(1_000)?,
        TimeUnit::Microsecond => raw,
        TimeUnit::Nanosecond => raw / 1_000,
    };
    DateTime::from_timestamp_micros(micros).map(|dt| dt.naive_utc())
}
