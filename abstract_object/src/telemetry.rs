//! Process-wide counters. Semantically inert — tracked for tests and
//! regression dashboards only, never consulted by the core logic itself.

use std::sync::atomic::{AtomicU64, Ordering};

static OBJECTS_CONSTRUCTED: AtomicU64 = AtomicU64::new(0);
static MAKE_WRITABLE_CALLS: AtomicU64 = AtomicU64::new(0);

pub(crate) fn note_object_constructed() {
    OBJECTS_CONSTRUCTED.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn note_make_writable() {
    MAKE_WRITABLE_CALLS.fetch_add(1, Ordering::Relaxed);
}

/// Number of [`crate::object::AbstractObject`]s constructed since the last [`reset`].
pub fn objects_constructed() -> u64 {
    OBJECTS_CONSTRUCTED.load(Ordering::Relaxed)
}

/// Number of copy-on-write materializations since the last [`reset`].
pub fn make_writable_calls() -> u64 {
    MAKE_WRITABLE_CALLS.load(Ordering::Relaxed)
}

/// Resets both counters to zero. Intended for test isolation between cases.
pub fn reset() {
    OBJECTS_CONSTRUCTED.store(0, Ordering::Relaxed);
    MAKE_WRITABLE_CALLS.store(0, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_zeroes_both_counters() {
        note_object_constructed();
        note_make_writable();
        reset();
        assert_eq!(objects_constructed(), 0);
        assert_eq!(make_writable_calls(), 0);
    }

    #[test]
    fn counters_increment_by_one() {
        reset();
        note_object_constructed();
        note_object_constructed();
        assert_eq!(objects_constructed(), 2);
    }
}
