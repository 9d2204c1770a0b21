//! Domain-specific assertion macros for runlog harnesses.
//!
//! These wrap `pretty_assertions` and add context-rich failure messages that
//! make it clear *which* records were expected and which came back.

/// Assert that a slice of `&LogRecord` has exactly the given ids, in order.
///
/// ```rust
/// assert_ids!(store.filter_by_level(&["ERROR"]), [7, 10]);
/// ```
#[macro_export]
macro_rules! assert_ids {
    ($records:expr, [$($id:expr),* $(,)?]) => {{
        let actual: Vec<usize> = $records.iter().map(|r| r.id).collect();
        let expected: Vec<usize> = vec![$($id),*];
        pretty_assertions::assert_eq!(actual, expected, "record ids differ");
    }};
}

/// Assert that every record in a slice carries one of the given levels.
///
/// ```rust
/// assert_all_levels!(records, ["WARNING", "CRITICAL"]);
/// ```
#[macro_export]
macro_rules! assert_all_levels {
    ($records:expr, [$($level:expr),+ $(,)?]) => {{
        let allowed: &[&str] = &[$($level),+];
        for record in $records.iter() {
            if !allowed.contains(&record.level.as_str()) {
                panic!(
                    "assert_all_levels! failed: record {} has level {:?}, allowed {:?}\n  message: {:?}",
                    record.id, record.level, allowed, record.message
                );
            }
        }
    }};
}

/// Assert that ids run `0..len` with no gaps or repeats.
#[macro_export]
macro_rules! assert_contiguous_ids {
    ($store:expr) => {{
        let store: &runlog::LogStore = &$store;
        for (expected, record) in store.records().iter().enumerate() {
            if record.id != expected {
                panic!(
                    "assert_contiguous_ids! failed: position {} holds id {}",
                    expected, record.id
                );
            }
        }
    }};
}
