//! The host's deferred-task queue.
//!
//! The deferred machinery never runs a reaction handler inline. It submits a
//! [`Task`] to the [`TaskQueue`] behind a [`Host`] and relies on the queue to
//! run it after the current synchronous work, in submission order.
use std::{cell::RefCell, collections::VecDeque, fmt, rc::Rc};

pub type Task = Box<dyn FnOnce()>;

/// "Run this later" primitive supplied by the host.
///
/// Implementations must not run `task` before `submit` returns, and must run
/// tasks submitted from the same turn in submission order.
pub trait TaskQueue {
    fn submit(&self, task: Task);
}

/// Cheap, clonable handle onto a [`TaskQueue`], carried by every deferred
/// value created against it.
#[derive(Clone)]
pub struct Host {
    queue: Rc<dyn TaskQueue>,
}

impl Host {
    pub fn new<Q>(queue: Q) -> Self
    where
        Q: TaskQueue + 'static,
    {
        Self {
            queue: Rc::new(queue),
        }
    }

    pub(crate) fn submit<F>(&self, task: F)
    where
        F: FnOnce() + 'static,
    {
        self.queue.submit(Box::new(task));
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host").finish_non_exhaustive()
    }
}

/// A FIFO [`TaskQueue`] drained explicitly by its owner.
///
/// # Examples
///
/// ```
/// use thenable::{JobQueue, TaskQueue};
/// use std::{cell::Cell, rc::Rc};
///
/// let jobs = JobQueue::new();
/// let ran = Rc::new(Cell::new(false));
/// let flag = ran.clone();
/// jobs.submit(Box::new(move || flag.set(true)));
/// assert!(!ran.get());
/// assert_eq!(jobs.run_until_idle(), 1);
/// assert!(ran.get());
/// ```
#[derive(Clone, Default)]
pub struct JobQueue {
    jobs: Rc<RefCell<VecDeque<Task>>>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.borrow().is_empty()
    }

    /// Runs the oldest task, if any. Returns whether a task ran.
    pub fn run_once(&self) -> bool {
        let next = self.jobs.borrow_mut().pop_front();
        match next {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Runs tasks until the queue is empty, including tasks submitted by the
    /// tasks being run. Returns how many ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_once() {
            ran += 1;
        }
        tracing::trace!(ran, "job queue idle");
        ran
    }
}

impl TaskQueue for JobQueue {
    fn submit(&self, task: Task) {
        self.jobs.borrow_mut().push_back(task);
    }
}

impl fmt::Debug for JobQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobQueue").field("len", &self.len()).finish()
    }
}
