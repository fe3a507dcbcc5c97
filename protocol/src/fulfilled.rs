//! Tracking of per-peer fulfilled requests.
//!
//! Certain requests (like a full governance object sync) may be served to a
//! peer only once per window; a repeat is a protocol offense. The tracker
//! records (peer address, request name) pairs with an expiry.

use orin_types::Timestamp;
use std::collections::HashMap;
use std::sync::Mutex;

/// How long a fulfilled request stays on record.
const FULFILLED_REQUEST_EXPIRE_SECS: i64 = 60 * 60;

/// Bookkeeping for requests already served per peer address.
#[derive(Default)]
pub struct FulfilledRequestTracker {
    fulfilled: Mutex<HashMap<(String, &'static str), Timestamp>>,
}

impl FulfilledRequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `request` was already fulfilled for `addr` and has not expired.
    pub fn has_fulfilled(&self, addr: &str, request: &'static str, now: Timestamp) -> bool {
        let map = self.fulfilled.lock().expect("fulfilled lock poisoned");
        map.get(&(addr.to_owned(), request))
            .map(|expires| now < *expires)
            .unwrap_or(false)
    }

    /// Record that `request` has been fulfilled for `addr`.
    pub fn add_fulfilled(&self, addr: &str, request: &'static str, now: Timestamp) {
        let mut map = self.fulfilled.lock().expect("fulfilled lock poisoned");
        map.insert(
            (addr.to_owned(), request),
            now.saturating_add(FULFILLED_REQUEST_EXPIRE_SECS),
        );
    }

    /// Drop expired records.
    pub fn sweep(&self, now: Timestamp) {
        let mut map = self.fulfilled.lock().expect("fulfilled lock poisoned");
        map.retain(|_, expires| now < *expires);
    }

    pub fn len(&self) -> usize {
        self.fulfilled.lock().expect("fulfilled lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
