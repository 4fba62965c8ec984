//! Cached `Date` header values.
//!
//! Formatting an IMF-fixdate on every response is wasted work when thousands of
//! responses share the same second. [`DateService`] keeps the formatted value
//! of the current second in an [`ArcSwap`] and re-formats only when a caller
//! observes that the second has changed.

use arc_swap::ArcSwap;
use httpdate::fmt_http_date;
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

static DATE_SERVICE: Lazy<DateService> = Lazy::new(DateService::new);

#[derive(Debug)]
pub struct DateService {
    current: ArcSwap<CachedDate>,
}

#[derive(Debug)]
struct CachedDate {
    second: u64,
    http_date: String,
}

impl CachedDate {
    fn at(now: SystemTime) -> Self {
        Self { second: unix_second(now), http_date: fmt_http_date(now) }
    }
}

impl DateService {
    pub fn new() -> Self {
        Self { current: ArcSwap::from_pointee(CachedDate::at(SystemTime::now())) }
    }

    /// The process-wide instance used by [`ResponseBuilder`](crate::codec::ResponseBuilder).
    pub fn global() -> &'static DateService {
        &DATE_SERVICE
    }

    /// Calls `f` with the formatted date of the current second.
    pub fn with_http_date<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&[u8]) -> R,
    {
        let now = SystemTime::now();
        let current = self.current.load();
        if current.second == unix_second(now) {
            return f(current.http_date.as_bytes());
        }

        let fresh = Arc::new(CachedDate::at(now));
        self.current.store(Arc::clone(&fresh));
        f(fresh.http_date.as_bytes())
    }
}

impl Default for DateService {
    fn default() -> Self {
        Self::new()
    }
}

fn unix_second(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH).map_or(0, |elapsed| elapsed.as_secs())
}
