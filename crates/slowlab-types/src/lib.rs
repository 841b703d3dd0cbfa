//! # slowlab-types: Core types for `slowlab`
//!
//! This crate contains the types shared between the dataset generator, the
//! store boundary and the scenario runner:
//! - Entity IDs ([`CustomerId`])
//! - The seeded record ([`Order`])
//! - Typed row filters for counting and template lookups ([`OrderFilter`])
//! - Bound query parameters ([`SqlParam`])
//! - Engine-agnostic query plan rows ([`PlanRow`])

use std::fmt::{self, Display};

use chrono::NaiveDateTime;
use serde::Serialize;

/// Layout used when timestamps are rendered as SQL literals or plan values.
pub const DATE_TIME_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

// ============================================================================
// Entity IDs
// ============================================================================

/// Identifier of the customer that owns an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CustomerId(u64);

impl CustomerId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CustomerId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<CustomerId> for u64 {
    fn from(id: CustomerId) -> Self {
        id.0
    }
}

// ============================================================================
// Order
// ============================================================================

/// A simplified transactional record that the lab queries inefficiently.
///
/// `id` is `None` until the store assigns one. `phone` is always text, even
/// though it looks numeric: the type-coercion scenarios depend on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: Option<u64>,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub phone: String,
    pub status: String,
    pub product_category: String,
    pub region: String,
    pub total_amount: f64,
    pub discount_code: String,
    pub note: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub shipped_at: Option<NaiveDateTime>,
}

impl Order {
    /// Returns true when the fulfillment timestamp, if any, is strictly after
    /// creation.
    pub fn is_chronological(&self) -> bool {
        self.shipped_at.is_none_or(|shipped| shipped > self.created_at)
    }
}

// ============================================================================
// Filters and parameters
// ============================================================================

/// Typed predicate over the `orders` table.
///
/// Each population target is guarded by a count over one of these filters.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderFilter {
    /// Every row.
    All,
    /// Rows owned by one customer.
    Customer(CustomerId),
    /// Rows with an exact contact string.
    Phone(String),
    /// Rows created in the half-open window `[start, end)`.
    CreatedBetween {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}

impl OrderFilter {
    /// Returns the `WHERE` clause body (or `None` for [`OrderFilter::All`])
    /// and the parameters it binds, in placeholder order.
    pub fn to_sql(&self) -> (Option<&'static str>, Vec<SqlParam>) {
        match self {
            OrderFilter::All => (None, Vec::new()),
            OrderFilter::Customer(id) => {
                (Some("customer_id = ?"), vec![SqlParam::from(*id)])
            }
            OrderFilter::Phone(phone) => (Some("phone = ?"), vec![SqlParam::Text(phone.clone())]),
            OrderFilter::CreatedBetween { start, end } => (
                Some("created_at >= ? AND created_at < ?"),
                vec![SqlParam::Timestamp(*start), SqlParam::Timestamp(*end)],
            ),
        }
    }
}

impl Display for OrderFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderFilter::All => write!(f, "all orders"),
            OrderFilter::Customer(id) => write!(f, "customer_id = {id}"),
            OrderFilter::Phone(phone) => write!(f, "phone = '{phone}'"),
            OrderFilter::CreatedBetween { start, end } => write!(
                f,
                "created_at in [{}, {})",
                start.format(DATE_TIME_LAYOUT),
                end.format(DATE_TIME_LAYOUT)
            ),
        }
    }
}

/// A value bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Int(i64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl From<CustomerId> for SqlParam {
    fn from(id: CustomerId) -> Self {
        SqlParam::Int(id.as_u64() as i64)
    }
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        SqlParam::Text(value.to_string())
    }
}

impl Display for SqlParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlParam::Int(n) => write!(f, "{n}"),
            SqlParam::Text(s) => write!(f, "'{s}'"),
            SqlParam::Timestamp(ts) => write!(f, "'{}'", ts.format(DATE_TIME_LAYOUT)),
        }
    }
}

// ============================================================================
// Query plans
// ============================================================================

/// One row of `EXPLAIN` output.
///
/// Plan shape differs between engines and versions, so a row is an ordered
/// list of `(column, value)` pairs rather than a fixed record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanRow(Vec<(String, String)>);

impl PlanRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.0.push((column.into(), value.into()));
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(column, _)| column.as_str())
    }

    /// Looks up a value by column name.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Renders the row as `column=value` pairs joined by single spaces.
    pub fn to_line(&self) -> String {
        self.0
            .iter()
            .map(|(column, value)| format!("{column}={value}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use test_case::test_case;

    fn ts(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn order(shipped_at: Option<NaiveDateTime>) -> Order {
        Order {
            id: None,
            customer_id: CustomerId::new(7),
            customer_name: "Customer 000007".to_string(),
            phone: "13800000000".to_string(),
            status: "paid".to_string(),
            product_category: "books".to_string(),
            region: "north".to_string(),
            total_amount: 12.5,
            discount_code: "CODE07".to_string(),
            note: "note".to_string(),
            created_at: ts(1),
            updated_at: ts(1),
            shipped_at,
        }
    }

    #[test_case(None, true ; "unshipped")]
    #[test_case(Some(ts(2)), true ; "shipped later")]
    #[test_case(Some(ts(1)), false ; "shipped at creation")]
    #[test_case(Some(ts(0)), false ; "shipped before creation")]
    fn test_is_chronological(shipped_at: Option<NaiveDateTime>, expected: bool) {
        assert_eq!(order(shipped_at).is_chronological(), expected);
    }

    #[test]
    fn test_filter_sql_binds_in_placeholder_order() {
        let filter = OrderFilter::CreatedBetween {
            start: ts(0),
            end: ts(23),
        };
        let (clause, params) = filter.to_sql();
        assert_eq!(clause, Some("created_at >= ? AND created_at < ?"));
        assert_eq!(
            params,
            vec![SqlParam::Timestamp(ts(0)), SqlParam::Timestamp(ts(23))]
        );

        assert_eq!(OrderFilter::All.to_sql(), (None, Vec::new()));
    }

    #[test]
    fn test_customer_filter_binds_integer() {
        let (clause, params) = OrderFilter::Customer(CustomerId::new(100)).to_sql();
        assert_eq!(clause, Some("customer_id = ?"));
        assert_eq!(params, vec![SqlParam::Int(100)]);
    }

    #[test]
    fn test_param_display() {
        assert_eq!(SqlParam::Int(100).to_string(), "100");
        assert_eq!(SqlParam::from("138").to_string(), "'138'");
        assert_eq!(
            SqlParam::Timestamp(ts(0)).to_string(),
            "'2024-01-01 00:00:00'"
        );
    }

    #[test]
    fn test_plan_row_preserves_column_order() {
        let mut row = PlanRow::new();
        row.push("explain_key", "physical_plan");
        row.push("explain_value", "SEQ_SCAN");

        assert_eq!(
            row.columns().collect::<Vec<_>>(),
            vec!["explain_key", "explain_value"]
        );
        assert_eq!(row.get("explain_value"), Some("SEQ_SCAN"));
        assert_eq!(row.get("missing"), None);
        assert_eq!(
            row.to_line(),
            "explain_key=physical_plan explain_value=SEQ_SCAN"
        );
    }

    #[test]
    fn test_order_serializes_phone_as_string() {
        let json = serde_json::to_value(order(None)).unwrap();
        assert!(json["phone"].is_string());
        assert!(json["shipped_at"].is_null());
    }
}
