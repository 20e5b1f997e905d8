//! Per-camera command scheduling.
use std::{collections::VecDeque, fmt::Display};
use tokio::time::Instant;

/// Kind of command, for coalescing.
///
/// A newer queued command replaces an older queued command of the same
/// category, because only the latest one matters (eg: a joystick sending a
/// stream of speed changes). [Category::Uncategorized] commands never
/// replace each other.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Category {
    Move,
    Zoom,
    Preset,
    Menu,
    Inquiry,
    Uncategorized,
}

impl Category {
    const fn coalesces(&self) -> bool {
        !matches!(self, Self::Uncategorized)
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// Bounded-concurrency command queue with coalescing.
///
/// Jobs are either _dispatched_ (sent to the camera, waiting for a reply) or
/// _waiting_ (not yet sent). At most `concurrency` jobs are dispatched at any
/// time, and both sets are kept in submission order.
///
/// The queue doesn't settle jobs itself: every method which removes a job
/// hands it back to the caller.
#[derive(Debug)]
pub struct CommandQueue<T> {
    concurrency: usize,
    dispatched: VecDeque<(Instant, T)>,
    waiting: VecDeque<(Category, T)>,
}

impl<T> CommandQueue<T> {
    /// Creates a queue allowing `concurrency` dispatched jobs. This is raised
    /// to 1 if it is 0.
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            dispatched: VecDeque::new(),
            waiting: VecDeque::new(),
        }
    }

    /// Adds a job to the end of the queue.
    ///
    /// If a waiting job has the same category, `job` takes its place and the
    /// older job is returned, superseded.
    pub fn submit(&mut self, category: Category, job: T) -> Option<T> {
        if category.coalesces() {
            if let Some((_, old)) = self.waiting.iter_mut().rev().find(|(c, _)| *c == category) {
                return Some(std::mem::replace(old, job));
            }
        }
        self.waiting.push_back((category, job));
        None
    }

    /// Dispatches the oldest waiting job if there is a free slot, with a
    /// reply `deadline`.
    ///
    /// Returns the job so that the caller can send it.
    pub fn next_ready(&mut self, deadline: Instant) -> Option<&mut T> {
        if self.dispatched.len() >= self.concurrency {
            return None;
        }
        let (_, job) = self.waiting.pop_front()?;
        self.dispatched.push_back((deadline, job));
        self.dispatched.back_mut().map(|(_, job)| job)
    }

    /// Removes the oldest dispatched job, which any reply belongs to.
    pub fn pop_oldest(&mut self) -> Option<T> {
        self.dispatched.pop_front().map(|(_, job)| job)
    }

    /// Earliest reply deadline of any dispatched job.
    pub fn earliest_deadline(&self) -> Option<Instant> {
        self.dispatched.iter().map(|(d, _)| *d).min()
    }

    /// Removes every dispatched job whose deadline is at or before `now`.
    pub fn take_expired(&mut self, now: Instant) -> Vec<T> {
        let mut expired = Vec::new();
        let mut remaining = VecDeque::with_capacity(self.dispatched.len());
        for (deadline, job) in self.dispatched.drain(..) {
            if deadline <= now {
                expired.push(job);
            } else {
                remaining.push_back((deadline, job));
            }
        }
        self.dispatched = remaining;
        expired
    }

    pub fn drain_dispatched(&mut self) -> impl Iterator<Item = T> + '_ {
        self.dispatched.drain(..).map(|(_, job)| job)
    }

    pub fn drain_waiting(&mut self) -> impl Iterator<Item = T> + '_ {
        self.waiting.drain(..).map(|(_, job)| job)
    }

    /// Number of dispatched jobs.
    pub fn in_flight(&self) -> usize {
        self.dispatched.len()
    }

    /// Number of waiting jobs.
    pub fn pending(&self) -> usize {
        self.waiting.len()
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }
}
