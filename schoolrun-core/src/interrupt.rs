//! Cooperative cancellation for long-running optimisation calls.
//!
//! Optimisers poll an [`Interrupt`] between greedy iterations, between
//! routes and between clusters. All state is local to the call, so stopping
//! early never leaves anything half-applied.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

/// Polled by optimisers to decide whether to stop early.
pub trait Interrupt: Send + Sync {
    /// Whether the caller has abandoned the call.
    fn is_interrupted(&self) -> bool;
}

/// Never interrupts.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverInterrupt;

impl Interrupt for NeverInterrupt {
    fn is_interrupted(&self) -> bool {
        false
    }
}

/// Interrupts once a wall-clock instant has passed.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use schoolrun_core::{Deadline, Interrupt};
///
/// let deadline = Deadline::after(Duration::from_secs(60));
/// assert!(!deadline.is_interrupted());
/// assert!(Deadline::after(Duration::ZERO).is_interrupted());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// Deadline at a fixed instant.
    #[must_use]
    pub const fn at(at: Instant) -> Self {
        Self { at }
    }

    /// Deadline `budget` from now.
    #[must_use]
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }
}

impl Interrupt for Deadline {
    fn is_interrupted(&self) -> bool {
        Instant::now() >= self.at
    }
}

/// Shared flag another thread can raise to cancel a call.
///
/// Clones share the same flag.
#[derive(Debug, Default, Clone)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Fresh, unraised flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether the flag has been raised.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Interrupt for CancelFlag {
    fn is_interrupted(&self) -> bool {
        self.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn cancel_flag_is_shared_between_clones() {
        let flag = CancelFlag::new();
        let observer = flag.clone();
        assert!(!observer.is_interrupted());
        flag.cancel();
        assert!(observer.is_interrupted());
    }

    #[rstest]
    fn cancel_flag_crosses_threads() {
        let flag = CancelFlag::new();
        let remote = flag.clone();
        std::thread::spawn(move || remote.cancel())
            .join()
            .expect("cancelling thread");
        assert!(flag.is_cancelled());
    }

    #[rstest]
    fn past_deadline_interrupts() {
        let past = Instant::now();
        assert!(Deadline::at(past).is_interrupted());
        assert!(!NeverInterrupt.is_interrupted());
    }
}
