// Copyright 2026 the Reprise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cooperative cancellation and progress reporting for replays.
//!
//! A [`Cookie`] is shared between the thread running a replay and whoever
//! wants to watch or stop it. Every field is atomic, so a `&Cookie` can be
//! handed to another thread while the replay is in flight.

use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Cancellation and progress handle polled by the player between nodes.
#[derive(Debug, Default)]
pub struct Cookie {
    abort: AtomicBool,
    progress: AtomicUsize,
    progress_max: AtomicUsize,
    incomplete: AtomicBool,
}

impl Cookie {
    /// Creates a fresh cookie.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            abort: AtomicBool::new(false),
            progress: AtomicUsize::new(0),
            progress_max: AtomicUsize::new(0),
            incomplete: AtomicBool::new(false),
        }
    }

    /// Asks any replay using this cookie to stop at the next node boundary.
    pub fn abort(&self) {
        self.abort.store(true, Ordering::Relaxed);
    }

    /// Returns whether an abort has been requested.
    #[must_use]
    pub fn is_abort_requested(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }

    /// Number of nodes consumed so far.
    #[must_use]
    pub fn progress(&self) -> usize {
        self.progress.load(Ordering::Relaxed)
    }

    /// Total number of nodes the replay will visit.
    #[must_use]
    pub fn progress_max(&self) -> usize {
        self.progress_max.load(Ordering::Relaxed)
    }

    /// Returns whether a replay stopped before reaching the end of its list.
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        self.incomplete.load(Ordering::Relaxed)
    }

    pub(crate) fn begin(&self, total: usize) {
        self.progress_max.store(total, Ordering::Relaxed);
    }

    /// Progress only ever moves forward, even if the cookie is reused.
    pub(crate) fn advance(&self, done: usize) {
        self.progress.fetch_max(done, Ordering::Relaxed);
    }

    pub(crate) fn mark_incomplete(&self) {
        self.incomplete.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_monotonic() {
        let cookie = Cookie::new();
        cookie.advance(5);
        cookie.advance(3);
        assert_eq!(cookie.progress(), 5);
    }

    #[test]
    fn abort_is_sticky() {
        let cookie = Cookie::new();
        assert!(!cookie.is_abort_requested());
        cookie.abort();
        assert!(cookie.is_abort_requested());
        assert!(!cookie.is_incomplete());
    }
}
