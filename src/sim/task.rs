//! Cooperative, budgeted execution of long computations.
//!
//! A [`ResumableTask`] performs a bounded amount of work per call and hands
//! control back to its host. The host decides when to resume, and can cancel
//! between calls through a [`CancelToken`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Outcome of one resume call.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress<T> {
    /// Work remains; call `resume` again.
    Suspended,
    Done(T),
}

impl<T> Progress<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, Progress::Done(_))
    }
}

/// Work that can be split into bounded slices.
pub trait ResumableTask {
    type Output;

    /// Performs at most `budget` units of work.
    fn resume(&mut self, budget: usize) -> Result<Progress<Self::Output>>;
}

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Resumes `task` until it is done, checking `cancel` before every slice.
///
/// A zero budget is treated as 1.
pub fn run_to_completion<T>(task: &mut T, budget: usize, cancel: &CancelToken) -> Result<T::Output>
where
    T: ResumableTask + ?Sized,
{
    let budget = budget.max(1);
    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if let Progress::Done(out) = task.resume(budget)? {
            return Ok(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sums `0..n` in slices.
    struct Counter {
        next: usize,
        n: usize,
        sum: usize,
        calls: usize,
    }

    impl ResumableTask for Counter {
        type Output = usize;

        fn resume(&mut self, budget: usize) -> Result<Progress<usize>> {
            self.calls += 1;
            let end = (self.next + budget).min(self.n);
            self.sum += (self.next..end).sum::<usize>();
            self.next = end;
            if self.next == self.n {
                Ok(Progress::Done(self.sum))
            } else {
                Ok(Progress::Suspended)
            }
        }
    }

    fn counter(n: usize) -> Counter {
        Counter {
            next: 0,
            n,
            sum: 0,
            calls: 0,
        }
    }

    #[test]
    fn test_run_to_completion() {
        let mut task = counter(10);
        let out = run_to_completion(&mut task, 3, &CancelToken::new()).unwrap();
        assert_eq!(out, 45);
        assert_eq!(task.calls, 4);
    }

    #[test]
    fn test_zero_budget_still_progresses() {
        let mut task = counter(3);
        assert_eq!(run_to_completion(&mut task, 0, &CancelToken::new()).unwrap(), 3);
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
        let mut task = counter(10);
        assert!(matches!(
            run_to_completion(&mut task, 3, &token),
            Err(Error::Cancelled)
        ));
        assert_eq!(task.calls, 0);
    }
}
