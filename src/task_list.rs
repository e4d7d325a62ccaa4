//! `TaskList` — LIFO teardown callbacks with per-task panic isolation.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use parking_lot::Mutex;

use crate::error::TaskPanic;
use crate::marker::NonCopyable;

type Task = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct TaskState {
    tasks: Vec<Task>,
    ran: bool,
}

/// An append-only list of callbacks run at most once, last-added first.
///
/// The usual use is deterministic teardown: register a close action right
/// after acquiring each resource, then call [`run`](TaskList::run) once to
/// release everything in reverse acquisition order. A panicking task does not
/// stop the rest; its panic is returned as an error.
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use tinysync::TaskList;
///
/// let order = Arc::new(Mutex::new(Vec::new()));
/// let list = TaskList::new();
/// for i in 1..=3 {
///     let order = Arc::clone(&order);
///     list.add(move || order.lock().unwrap().push(i));
/// }
/// assert!(list.run().is_empty());
/// assert_eq!(*order.lock().unwrap(), [3, 2, 1]);
/// ```
#[derive(Default)]
pub struct TaskList {
    state: Mutex<TaskState>,
    _marker: NonCopyable,
}

impl TaskList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a task.
    ///
    /// Tasks added after [`run`](TaskList::run) has started are accepted but
    /// never executed; they are dropped on the spot, releasing whatever they
    /// captured.
    pub fn add<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.state.lock();
        if state.ran {
            // Drop outside the lock: the captures' destructors may call back in.
            drop(state);
            drop(task);
            tracing::debug!("task added after run; dropped without running");
            return;
        }
        state.tasks.push(Box::new(task));
    }

    /// Runs every registered task in reverse registration order.
    ///
    /// Only the first call does anything; it drains the list and later calls
    /// return an empty vector. A task that panics is recorded and the
    /// remaining tasks still run. The returned errors are in execution order.
    ///
    /// A panic carrying an `anyhow::Error` is returned as is, a
    /// `Box<dyn Error + Send + Sync>` keeps its message, and a string payload
    /// becomes a [`TaskPanic`].
    pub fn run(&self) -> Vec<anyhow::Error> {
        let tasks = {
            let mut state = self.state.lock();
            if state.ran {
                return Vec::new();
            }
            state.ran = true;
            std::mem::take(&mut state.tasks)
        };

        tracing::debug!(tasks = tasks.len(), "running task list");
        let mut errors = Vec::new();
        for (index, task) in tasks.into_iter().enumerate().rev() {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
                let error = panic_to_error(payload);
                tracing::warn!(index, %error, "task panicked");
                errors.push(error);
            }
        }
        errors
    }

    /// Number of tasks waiting to run. Zero once the list has run.
    pub fn len(&self) -> usize {
        self.state.lock().tasks.len()
    }

    /// Returns `true` if no task is waiting to run.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` once [`run`](TaskList::run) has been called.
    pub fn has_run(&self) -> bool {
        self.state.lock().ran
    }
}

impl fmt::Debug for TaskList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("TaskList")
            .field("pending", &state.tasks.len())
            .field("ran", &state.ran)
            .finish()
    }
}

fn panic_to_error(payload: Box<dyn Any + Send>) -> anyhow::Error {
    let payload = match payload.downcast::<anyhow::Error>() {
        Ok(error) => return *error,
        Err(payload) => payload,
    };
    let payload = match payload.downcast::<Box<dyn std::error::Error + Send + Sync>>() {
        Ok(error) => return anyhow::anyhow!(*error),
        Err(payload) => payload,
    };
    let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked with a non-string payload".to_owned()
    };
    TaskPanic::new(message).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex as StdMutex};
    use std::thread;

    fn recorder() -> (Arc<StdMutex<Vec<u32>>>, impl Fn(u32) -> Box<dyn FnOnce() + Send>) {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let make = move |id: u32| {
            let sink = Arc::clone(&sink);
            Box::new(move || sink.lock().unwrap().push(id)) as Box<dyn FnOnce() + Send>
        };
        (log, make)
    }

    #[test]
    fn runs_in_reverse_order() {
        let (log, task) = recorder();
        let list = TaskList::new();
        list.add(task(1));
        list.add(task(2));
        list.add(task(3));
        assert_eq!(list.len(), 3);
        assert!(list.run().is_empty());
        assert_eq!(*log.lock().unwrap(), [3, 2, 1]);
    }

    #[test]
    fn panicking_task_is_isolated() {
        let (log, task) = recorder();
        let list = TaskList::new();
        list.add(task(1));
        list.add(|| panic!("disk on fire"));
        list.add(task(3));

        let errors = list.run();
        assert_eq!(*log.lock().unwrap(), [3, 1]);
        assert_eq!(errors.len(), 1);
        let panic = errors[0].downcast_ref::<TaskPanic>().expect("message payload");
        assert_eq!(panic.message(), "disk on fire");
        assert_eq!(errors[0].to_string(), "panic: disk on fire");
    }

    #[test]
    fn second_run_is_a_noop() {
        let (log, task) = recorder();
        let list = TaskList::new();
        list.add(task(1));
        list.add(|| panic!("once"));
        assert_eq!(list.run().len(), 1);
        assert!(list.has_run());
        assert!(list.run().is_empty());
        assert_eq!(*log.lock().unwrap(), [1]);
    }

    #[test]
    fn tasks_added_after_run_never_execute() {
        let (log, task) = recorder();
        let list = TaskList::new();
        list.add(task(1));
        list.run();
        list.add(task(2));
        assert!(list.run().is_empty());
        assert_eq!(*log.lock().unwrap(), [1]);
    }

    #[test]
    fn error_payloads_pass_through() {
        #[derive(Debug, thiserror::Error)]
        #[error("socket already closed")]
        struct Closed;

        let list = TaskList::new();
        list.add(|| panic::panic_any(anyhow::Error::new(Closed)));
        list.add(|| {
            let boxed: Box<dyn std::error::Error + Send + Sync> = "flush failed".into();
            panic::panic_any(boxed)
        });
        list.add(|| panic::panic_any(42_u8));

        let errors = list.run();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].downcast_ref::<TaskPanic>().is_some());
        assert_eq!(errors[1].to_string(), "flush failed");
        assert!(errors[2].downcast_ref::<Closed>().is_some());
    }

    #[test]
    fn a_task_may_add_to_the_running_list() {
        let list = Arc::new(TaskList::new());
        let inner = Arc::clone(&list);
        list.add(move || inner.add(|| unreachable!("added during run")));
        assert!(list.run().is_empty());
        assert_eq!(list.len(), 0);
    }

    #[test]
    fn late_task_is_dropped_immediately() {
        let list = TaskList::new();
        list.run();

        let held = Arc::new(());
        let captured = Arc::clone(&held);
        list.add(move || drop(captured));

        assert_eq!(Arc::strong_count(&held), 1);
        assert_eq!(list.len(), 0);
        assert!(list.is_empty());
        assert!(list.has_run());
    }

    #[test]
    fn concurrent_adds_are_all_run() {
        let list = TaskList::new();
        let hits = Arc::new(StdMutex::new(0_u32));
        thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..50 {
                        let hits = Arc::clone(&hits);
                        list.add(move || *hits.lock().unwrap() += 1);
                    }
                });
            }
        });
        assert!(list.run().is_empty());
        assert_eq!(*hits.lock().unwrap(), 200);
    }
}
