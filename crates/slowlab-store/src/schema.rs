//! DDL for the `orders` table.
//!
//! Every statement is idempotent so `ensure_schema` can run on each start.

/// Sequence, table and secondary indexes.
pub const ORDERS_DDL: &str = "
CREATE SEQUENCE IF NOT EXISTS orders_id_seq START 1;

CREATE TABLE IF NOT EXISTS orders (
    id               BIGINT PRIMARY KEY DEFAULT nextval('orders_id_seq'),
    customer_id      BIGINT NOT NULL,
    customer_name    VARCHAR(64) NOT NULL,
    phone            VARCHAR(32) NOT NULL,
    status           VARCHAR(32) NOT NULL,
    product_category VARCHAR(32) NOT NULL,
    region           VARCHAR(32) NOT NULL,
    total_amount     DOUBLE NOT NULL,
    discount_code    VARCHAR(32) NOT NULL,
    note             VARCHAR(255) NOT NULL,
    created_at       TIMESTAMP NOT NULL,
    updated_at       TIMESTAMP NOT NULL,
    shipped_at       TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_orders_customer_id ON orders (customer_id);
CREATE INDEX IF NOT EXISTS idx_orders_customer_name ON orders (customer_name);
CREATE INDEX IF NOT EXISTS idx_orders_phone ON orders (phone);
CREATE INDEX IF NOT EXISTS idx_orders_status ON orders (status);
CREATE INDEX IF NOT EXISTS idx_orders_product_category ON orders (product_category);
CREATE INDEX IF NOT EXISTS idx_orders_region ON orders (region);
CREATE INDEX IF NOT EXISTS idx_orders_created_at ON orders (created_at);
CREATE INDEX IF NOT EXISTS idx_orders_updated_at ON orders (updated_at);
CREATE INDEX IF NOT EXISTS idx_orders_shipped_at ON orders (shipped_at);
";

/// Columns written by an insert, in bind order. `id` comes from the sequence.
pub const INSERT_COLUMNS: [&str; 12] = [
    "customer_id",
    "customer_name",
    "phone",
    "status",
    "product_category",
    "region",
    "total_amount",
    "discount_code",
    "note",
    "created_at",
    "updated_at",
    "shipped_at",
];

/// Builds a multi-row `INSERT` with `rows` placeholder tuples.
pub fn insert_sql(rows: usize) -> String {
    let tuple = format!("({})", vec!["?"; INSERT_COLUMNS.len()].join(", "));
    let values = vec![tuple; rows].join(", ");
    format!(
        "INSERT INTO orders ({}) VALUES {values}",
        INSERT_COLUMNS.join(", ")
    )
}

/// Builds the lowest-id lookup used to fetch clone templates.
pub fn first_order_sql(clause: Option<&str>) -> String {
    let filter = clause.map(|c| format!(" WHERE {c}")).unwrap_or_default();
    format!(
        "SELECT id, {} FROM orders{filter} ORDER BY id ASC LIMIT 1",
        INSERT_COLUMNS.join(", ")
    )
}

/// Builds a filtered `count(*)`.
pub fn count_sql(clause: Option<&str>) -> String {
    let filter = clause.map(|c| format!(" WHERE {c}")).unwrap_or_default();
    format!("SELECT count(*) FROM orders{filter}")
}
