use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// A shared, lock-protected value.
pub type Atomic<T> = Arc<RwLock<T>>;

/// Wraps a value in an [Atomic].
pub fn atomic<T>(t: T) -> Atomic<T> {
    Arc::new(RwLock::new(t))
}

// Fast path: returns 0 on any error instead of double error handling
#[inline]
pub fn current_time_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}
