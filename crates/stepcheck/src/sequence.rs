//! The server's single shared sequence counter.

use parking_lot::Mutex;

/// Result of one validation attempt against the shared sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The step was the expected next one; the counter now equals it.
    Accepted { current_step: i64 },
    /// The step was anything else; the counter still moved forward by one.
    Rejected { current_step: i64 },
}

impl Admission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Admission::Accepted { .. })
    }

    pub fn current_step(&self) -> i64 {
        match self {
            Admission::Accepted { current_step } | Admission::Rejected { current_step } => {
                *current_step
            }
        }
    }
}

/// Highest step accepted as in-order, shared by every connection.
///
/// The counter never decreases. Each call to [`SequenceTracker::try_accept`]
/// moves it forward: to `step_id` when the step is the expected next one,
/// and by exactly one otherwise.
#[derive(Debug, Default)]
pub struct SequenceTracker {
    current_step: Mutex<i64>,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(current_step: i64) -> Self {
        Self {
            current_step: Mutex::new(current_step),
        }
    }

    pub fn current(&self) -> i64 {
        *self.current_step.lock()
    }

    pub fn try_accept(&self, step_id: i64) -> Admission {
        let mut current = self.current_step.lock();
        if current.checked_add(1) == Some(step_id) {
            *current = step_id;
            Admission::Accepted {
                current_step: *current,
            }
        } else {
            *current = current.saturating_add(1);
            Admission::Rejected {
                current_step: *current,
            }
        }
    }
}
