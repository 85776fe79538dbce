//! Shared time budgets for multi-step operations.
//!
//! A [`DeadlineBudget`] is constructed once from the caller's total timeout
//! and consulted by every step of the operation. It is an absolute expiry,
//! not a mutable countdown: copies observe the same deadline, nothing can
//! extend it, and [`remaining`](DeadlineBudget::remaining) only shrinks.

use std::time::Duration;
use tokio::time::Instant;

/// A shrink-only time allowance distributed across the steps of one logical
/// operation.
#[derive(Debug, Clone, Copy)]
pub struct DeadlineBudget {
    deadline: Option<Instant>,
}

impl DeadlineBudget {
    /// Creates a budget expiring `total` from now, or an unbounded budget
    /// when no total is given.
    pub fn new(total: Option<Duration>) -> Self {
        Self {
            deadline: total.map(|t| Instant::now() + t),
        }
    }

    /// A budget with no deadline.
    pub fn unbounded() -> Self {
        Self { deadline: None }
    }

    /// Time left before the deadline, clamped to zero; `None` when no
    /// deadline was set.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Whether the budget has run out. An unbounded budget never expires.
    pub fn expired(&self) -> bool {
        matches!(self.remaining(), Some(left) if left.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn remaining_shrinks_and_clamps_to_zero() {
        let budget = DeadlineBudget::new(Some(Duration::from_millis(100)));
        assert_eq!(budget.remaining(), Some(Duration::from_millis(100)));

        tokio::time::advance(Duration::from_millis(60)).await;
        assert_eq!(budget.remaining(), Some(Duration::from_millis(40)));
        assert!(!budget.expired());

        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(budget.remaining(), Some(Duration::ZERO));
        assert!(budget.expired());
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_budget_never_expires() {
        let budget = DeadlineBudget::unbounded();
        tokio::time::advance(Duration::from_secs(3600)).await;
        assert_eq!(budget.remaining(), None);
        assert!(!budget.expired());
    }

    #[tokio::test(start_paused = true)]
    async fn copies_share_the_same_deadline() {
        let budget = DeadlineBudget::new(Some(Duration::from_secs(1)));
        let copy = budget;
        tokio::time::advance(Duration::from_millis(400)).await;
        assert_eq!(budget.remaining(), copy.remaining());
    }
}
