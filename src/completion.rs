//! Completion detection - has the agent signalled that the task is done?

/// True when `sentinel` occurs in `response`.
///
/// Case-sensitive substring match over the full response. A missing or empty
/// sentinel disables detection, so the loop runs its whole budget.
pub fn detect(response: &str, sentinel: Option<&str>) -> bool {
    match sentinel {
        Some(sentinel) if !sentinel.is_empty() => response.contains(sentinel),
        _ => false,
    }
}
