//! ID generation utilities
//!
//! Session identifiers handed out by in-process gateways.

use std::sync::atomic::{AtomicU32, Ordering};

static SESSION_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a unique session ID
///
/// Format: `session-{timestamp_ms}-{counter:04}`
/// Example: `session-1738300800123-0007`
pub fn generate_session_id() -> String {
    let counter = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("session-{}-{:04}", now_ms(), counter % 10_000)
}
