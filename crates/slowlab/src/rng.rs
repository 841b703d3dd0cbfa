//! Seeded random helpers for synthetic data.
//!
//! All randomness flows through an explicit [`LabRng`]. There is no global
//! generator: the same seed always reproduces the same dataset, on every
//! platform, because the underlying generator is ChaCha8.

use chrono::{Duration, NaiveDateTime};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Phone number prefixes. Every synthetic phone is one of these followed by
/// eight digits.
pub const PHONE_PREFIXES: [&str; 5] = ["138", "139", "137", "188", "199"];

/// Number of digits appended to a phone prefix.
pub const PHONE_SUFFIX_DIGITS: usize = 8;

/// Deterministic random source threaded through every generator call.
#[derive(Debug, Clone)]
pub struct LabRng {
    inner: ChaCha8Rng,
}

impl LabRng {
    /// Creates a generator from a seed.
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Creates an independent generator for one population.
    ///
    /// Streams sharing a seed never overlap, so populations can be generated
    /// in any order without disturbing each other.
    pub fn for_stream(seed: u64, stream: u64) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(seed);
        inner.set_stream(stream);
        Self { inner }
    }

    /// Returns a uniform integer in `[0, bound)`. A zero bound yields 0.
    pub fn next_below(&mut self, bound: u64) -> u64 {
        if bound == 0 {
            return 0;
        }
        self.inner.gen_range(0..bound)
    }

    /// Returns a uniform index in `[0, len)`.
    pub fn next_usize(&mut self, len: usize) -> usize {
        self.next_below(len as u64) as usize
    }

    /// Returns a uniform float in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.inner.gen_range(0.0..1.0)
    }

    /// Returns a uniform integer in `[low, high]`.
    pub fn next_in(&mut self, low: u64, high: u64) -> u64 {
        if high <= low {
            return low;
        }
        self.inner.gen_range(low..=high)
    }

    /// Picks one item uniformly.
    ///
    /// # Panics
    ///
    /// Panics if `items` is empty.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.next_usize(items.len())]
    }

    /// Picks a category with probability `weight / sum(weights)`.
    ///
    /// Draws `n` uniformly in `[0, sum)` and subtracts weights in category
    /// order until `n` goes negative. Falls back to the first category when
    /// nothing is selected, which consistent weights never produce.
    ///
    /// # Panics
    ///
    /// Panics if `choices` is empty.
    pub fn weighted_choice<'a, T>(&mut self, choices: &'a [(T, u32)]) -> &'a T {
        let total: u64 = choices.iter().map(|(_, w)| u64::from(*w)).sum();
        let mut n = self.next_below(total) as i64;
        for (item, weight) in choices {
            n -= i64::from(*weight);
            if n < 0 {
                return item;
            }
        }
        &choices[0].0
    }

    /// Returns a phone-like token: a known prefix and an 8-digit zero-padded
    /// suffix, always as text.
    pub fn phone(&mut self) -> String {
        let prefix = self.choose(&PHONE_PREFIXES);
        let suffix = self.next_below(100_000_000);
        format!("{prefix}{suffix:0width$}", width = PHONE_SUFFIX_DIGITS)
    }

    /// Returns a discount token `CODE00`..`CODE99`.
    pub fn discount_code(&mut self) -> String {
        format!("CODE{:02}", self.next_below(100))
    }

    /// Returns `now` minus a whole number of hours in `[0, max_hours)`.
    pub fn hours_before(&mut self, now: NaiveDateTime, max_hours: u64) -> NaiveDateTime {
        now - Duration::hours(self.next_below(max_hours) as i64)
    }

    /// Returns `start` plus a whole number of seconds in `[0, max_seconds)`.
    pub fn seconds_after(&mut self, start: NaiveDateTime, max_seconds: u64) -> NaiveDateTime {
        start + Duration::seconds(self.next_below(max_seconds) as i64)
    }
}

/// Returns true if `phone` is a known prefix followed by exactly eight ASCII
/// digits.
pub fn is_synthetic_phone(phone: &str) -> bool {
    PHONE_PREFIXES.iter().any(|prefix| {
        phone.strip_prefix(*prefix).is_some_and(|suffix| {
            suffix.len() == PHONE_SUFFIX_DIGITS && suffix.bytes().all(|b| b.is_ascii_digit())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    const STATUSES: [(&str, u32); 4] = [
        ("pending", 30),
        ("paid", 40),
        ("fulfilled", 20),
        ("cancelled", 10),
    ];

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = LabRng::new(42);
        let mut b = LabRng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_below(1_000_000), b.next_below(1_000_000));
        }
    }

    #[test]
    fn test_streams_diverge() {
        let mut a = LabRng::for_stream(42, 1);
        let mut b = LabRng::for_stream(42, 2);
        let xs: Vec<u64> = (0..16).map(|_| a.next_below(u64::MAX)).collect();
        let ys: Vec<u64> = (0..16).map(|_| b.next_below(u64::MAX)).collect();
        assert_ne!(xs, ys);
    }

    #[test]
    fn test_weighted_choice_converges() {
        let mut rng = LabRng::new(7);
        let draws = 100_000;
        let mut counts: HashMap<&str, u32> = HashMap::new();
        for _ in 0..draws {
            *counts.entry(*rng.weighted_choice(&STATUSES)).or_default() += 1;
        }

        for (status, weight) in STATUSES {
            let observed = f64::from(counts[status]) / f64::from(draws);
            let expected = f64::from(weight) / 100.0;
            assert!(
                (observed - expected).abs() < 0.01,
                "{status}: observed {observed}, expected {expected}"
            );
        }
    }

    #[test]
    fn test_weighted_choice_skips_zero_weights() {
        let mut rng = LabRng::new(3);
        let choices = [("never", 0), ("always", 5)];
        for _ in 0..1_000 {
            assert_eq!(*rng.weighted_choice(&choices), "always");
        }
    }

    #[test]
    fn test_choose_covers_all_items() {
        let mut rng = LabRng::new(11);
        let items = ["north", "south", "east", "west"];
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1_000 {
            seen.insert(*rng.choose(&items));
        }
        assert_eq!(seen.len(), items.len());
    }

    #[test]
    fn test_phone_shape() {
        let mut rng = LabRng::new(5);
        for _ in 0..1_000 {
            let phone = rng.phone();
            assert_eq!(phone.len(), 11);
            assert!(is_synthetic_phone(&phone), "bad phone {phone}");
        }
    }

    #[test]
    fn test_is_synthetic_phone_rejects_bad_tokens() {
        assert!(is_synthetic_phone("13800000000"));
        assert!(!is_synthetic_phone("1380000000"));
        assert!(!is_synthetic_phone("12300000000"));
        assert!(!is_synthetic_phone("1380000000a"));
    }

    #[test]
    fn test_discount_code_shape() {
        let mut rng = LabRng::new(9);
        for _ in 0..200 {
            let code = rng.discount_code();
            assert_eq!(code.len(), 6);
            assert!(code.starts_with("CODE"));
        }
    }

    #[test]
    fn test_time_helpers_stay_in_bounds() {
        let now = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let mut rng = LabRng::new(1);
        for _ in 0..1_000 {
            let past = rng.hours_before(now, 365 * 24);
            assert!(past <= now);
            assert!(now - past < Duration::days(365));

            let later = rng.seconds_after(now, 24 * 60 * 60);
            assert!(later >= now);
            assert!(later - now < Duration::days(1));
        }
    }

    #[test]
    fn test_next_in_is_inclusive() {
        let mut rng = LabRng::new(2);
        let mut seen_low = false;
        let mut seen_high = false;
        for _ in 0..1_000 {
            let v = rng.next_in(1, 3);
            assert!((1..=3).contains(&v));
            seen_low |= v == 1;
            seen_high |= v == 3;
        }
        assert!(seen_low && seen_high);
    }
}
