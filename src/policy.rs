//! Process-wide error policy.
//!
//! Default is lenient: a failing block is logged and skipped so one bad
//! item never stalls the stream. Strict mode makes `finalize`/`shutdown`
//! surface the first recorded error instead, which is what tests and batch
//! tooling want.

use std::sync::atomic::{AtomicBool, Ordering};

static STRICT: AtomicBool = AtomicBool::new(false);

/// Turn strict error surfacing on or off for the whole process.
pub fn set_strict(strict: bool) {
    STRICT.store(strict, Ordering::Relaxed);
}

/// Whether errors should be surfaced rather than logged and skipped.
pub fn strict() -> bool {
    STRICT.load(Ordering::Relaxed)
}
