//! Execution contexts for callback delivery.

use crate::error::{self, Result};

/// A deferred unit of callback work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// A place callbacks can be submitted to run.
///
/// The pool owns one "main" dispatcher standing in for a UI or main-loop
/// thread; requests that did not opt into background delivery have their
/// callbacks routed through it.
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, task: Task);
}

/// Serialized dispatcher backed by a dedicated thread.
///
/// Tasks run one at a time in submission order, mimicking a main-loop
/// thread without tying the engine to any UI toolkit.
pub struct SerialDispatcher {
    tx: crossbeam_channel::Sender<Task>,
}

impl SerialDispatcher {
    /// Start the dispatcher thread under the given name.
    pub fn spawn(name: &str) -> Result<Self> {
        let (tx, rx) = crossbeam_channel::unbounded::<Task>();
        std::thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                for task in rx {
                    task();
                }
            })
            .map_err(error::builder)?;
        Ok(Self { tx })
    }
}

impl Dispatcher for SerialDispatcher {
    fn dispatch(&self, task: Task) {
        // The thread only exits once every sender is dropped, so a send
        // failure means the dispatcher is already torn down.
        if self.tx.send(task).is_err() {
            tracing::warn!(target: "restq::pool", "dispatcher thread is gone, dropping callback");
        }
    }
}

/// Runs tasks immediately on the calling thread. Meant for tests that
/// want deterministic, synchronous callback delivery.
#[derive(Debug, Default)]
pub struct InlineDispatcher;

impl Dispatcher for InlineDispatcher {
    fn dispatch(&self, task: Task) {
        task();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn serial_dispatcher_runs_tasks_in_order() {
        let dispatcher = SerialDispatcher::spawn("test-main").unwrap();
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let (tx, rx) = std::sync::mpsc::channel();
        for i in 0..8 {
            let log = log.clone();
            let tx = tx.clone();
            dispatcher.dispatch(Box::new(move || {
                log.lock().unwrap().push(i);
                tx.send(()).unwrap();
            }));
        }
        for _ in 0..8 {
            rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap();
        }
        assert_eq!(*log.lock().unwrap(), (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn inline_dispatcher_runs_synchronously() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = counter.clone();
        InlineDispatcher.dispatch(Box::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
