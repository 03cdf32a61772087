//! Explicit identifier sequences threaded through one call.

/// Monotonic identifier generator.
///
/// Each optimisation call owns its sequences, so concurrent calls never
/// share counters and identical inputs produce identical identifiers.
///
/// # Examples
/// ```
/// use schoolrun_core::Sequence;
///
/// let mut ids = Sequence::default();
/// assert_eq!(ids.next_id(), 1);
/// assert_eq!(ids.next_id(), 2);
/// assert_eq!(ids.peek(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    next: u64,
}

impl Sequence {
    /// Sequence whose first identifier is `first`.
    #[must_use]
    pub const fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    /// Take the next identifier.
    pub const fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next = self.next.saturating_add(1);
        id
    }

    /// Identifier the next call to [`Self::next_id`] returns.
    #[must_use]
    pub const fn peek(&self) -> u64 {
        self.next
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::starting_at(1)
    }
}
