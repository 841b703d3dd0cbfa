//! Synthetic order construction.
//!
//! One builder per population. Every builder takes the random source and
//! the reference time explicitly, so a population is a pure function of its
//! seed, its row indices and `now`.

use std::sync::LazyLock;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use slowlab_types::{CustomerId, Order};

use crate::rng::LabRng;

// ============================================================================
// Constants
// ============================================================================

/// The deliberately overrepresented customer.
pub const HOT_CUSTOMER_ID: CustomerId = CustomerId::new(100);

/// General records with a global index below this belong to the hot customer.
pub const HOT_CUSTOMER_SEED_ROWS: u64 = 1_000;

/// Upper bound (inclusive) of random customer ids for general records.
pub const MAX_CUSTOMER_ID: u64 = 50_000;

/// Contact string shared by every hot-phone row. Stored as text.
pub const HOT_PHONE: &str = "13812345678";

/// Calendar day holding every date-range row.
pub const DATE_RANGE_DAY: &str = "2024-01-01";

/// Character limit of the repeated-token prefix on hot-customer notes.
pub const HOT_NOTE_PREFIX_CHARS: usize = 70;

/// Order statuses with their relative weights.
pub const STATUSES: [(&str, u32); 4] = [
    ("pending", 30),
    ("paid", 40),
    ("fulfilled", 20),
    ("cancelled", 10),
];

pub const CATEGORIES: [&str; 5] = ["fashion", "electronics", "books", "grocery", "home"];

pub const REGIONS: [&str; 4] = ["north", "south", "east", "west"];

pub const NOTE_SAMPLES: [&str; 5] = [
    "Need gift wrap and rush delivery please.",
    "Customer called to change shipping address.",
    "Large wholesale order awaiting approval.",
    "Repeat customer eligible for loyalty perks.",
    "Flagged for manual fraud review before shipment.",
];

const HOURS_PER_YEAR: u64 = 365 * 24;
const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Repeated-token payload that makes hot-customer rows wide.
static HOT_NOTE_PREFIX: LazyLock<String> = LazyLock::new(|| {
    "hot-order-payload "
        .repeat(40)
        .chars()
        .take(HOT_NOTE_PREFIX_CHARS)
        .collect()
});

/// Returns the half-open window `[2024-01-01 00:00, 2024-01-02 00:00)`.
pub fn date_range_window() -> (NaiveDateTime, NaiveDateTime) {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .expect("2024-01-01 is a valid date");
    (start, start + Duration::days(1))
}

/// Returns the hot-customer note for clone number `n`.
pub fn hot_note(n: u64) -> String {
    format!("{}#{n}", HOT_NOTE_PREFIX.as_str())
}

fn customer_name(id: CustomerId) -> String {
    format!("Customer {:06}", id.as_u64())
}

// ============================================================================
// Builders
// ============================================================================

/// Builds general record number `index`.
///
/// The first [`HOT_CUSTOMER_SEED_ROWS`] indices go to [`HOT_CUSTOMER_ID`] so
/// the hot-customer population always has a template to clone.
pub fn build_order(index: u64, rng: &mut LabRng, now: NaiveDateTime) -> Order {
    let customer_id = if index < HOT_CUSTOMER_SEED_ROWS {
        HOT_CUSTOMER_ID
    } else {
        CustomerId::new(rng.next_in(1, MAX_CUSTOMER_ID))
    };

    let created_at = rng.hours_before(now, HOURS_PER_YEAR);
    let shipped_at = (rng.next_f64() >= 0.3)
        .then(|| created_at + Duration::hours(rng.next_in(1, 72) as i64));

    Order {
        id: None,
        customer_id,
        customer_name: customer_name(customer_id),
        phone: rng.phone(),
        status: rng.weighted_choice(&STATUSES).to_string(),
        product_category: rng.choose(&CATEGORIES).to_string(),
        region: rng.choose(&REGIONS).to_string(),
        total_amount: 10.0 + rng.next_f64() * 990.0,
        discount_code: rng.discount_code(),
        note: rng.choose(&NOTE_SAMPLES).to_string(),
        created_at,
        updated_at: created_at,
        shipped_at,
    }
}

/// Clones `template` as hot-customer row number `n`.
///
/// Identity is cleared, timestamps shift forward by `n` seconds and the note
/// becomes the wide repeated-token payload suffixed with `n`.
pub fn hot_customer_clone(template: &Order, n: u64) -> Order {
    let offset = Duration::seconds(n as i64);
    let created_at = template.created_at + offset;
    Order {
        id: None,
        created_at,
        updated_at: created_at,
        shipped_at: template.shipped_at.map(|shipped| shipped + offset),
        note: hot_note(n),
        ..template.clone()
    }
}

/// Builds hot-phone row number `n`. These rows are never shipped.
pub fn hot_phone_order(n: u64, rng: &mut LabRng, now: NaiveDateTime) -> Order {
    let customer_id = CustomerId::new(HOT_CUSTOMER_ID.as_u64() + 2_000 + n);
    let created_at = rng.hours_before(now, HOURS_PER_YEAR);
    let statuses: Vec<&str> = STATUSES.iter().map(|(status, _)| *status).collect();

    Order {
        id: None,
        customer_id,
        customer_name: format!("PhoneHot {n:06}"),
        phone: HOT_PHONE.to_string(),
        status: rng.choose(&statuses).to_string(),
        product_category: "electronics".to_string(),
        region: "east".to_string(),
        total_amount: 199.0 + rng.next_f64() * 50.0,
        discount_code: "PHONEHOT".to_string(),
        note: format!("Phone hot sample #{n}"),
        created_at,
        updated_at: created_at,
        shipped_at: None,
    }
}

/// Builds date-range row number `n`, created inside [`date_range_window`].
pub fn date_range_order(n: u64, rng: &mut LabRng) -> Order {
    let (start, _) = date_range_window();
    let customer_id = CustomerId::new(HOT_CUSTOMER_ID.as_u64() + 1_000);
    let created_at = rng.seconds_after(start, SECONDS_PER_DAY);
    let shipped_at = (rng.next_f64() >= 0.4)
        .then(|| created_at + Duration::hours(rng.next_in(1, 48) as i64));

    Order {
        id: None,
        customer_id,
        customer_name: format!("DateHot {n:06}"),
        phone: rng.phone(),
        status: rng.weighted_choice(&STATUSES).to_string(),
        product_category: rng.choose(&CATEGORIES).to_string(),
        region: rng.choose(&REGIONS).to_string(),
        total_amount: 50.0 + rng.next_f64() * 500.0,
        discount_code: rng.discount_code(),
        note: format!("date-range order {DATE_RANGE_DAY} #{n}"),
        created_at,
        updated_at: created_at,
        shipped_at,
    }
}
