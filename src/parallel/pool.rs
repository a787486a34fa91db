//! Fixed-size worker pool over a [`ConcurrentQueue`] of boxed jobs.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

use super::queue::ConcurrentQueue;
use crate::{Error, Result};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Completion handle for a submitted task.
#[derive(Debug)]
pub struct TaskHandle<T> {
    rx: Receiver<std::result::Result<T, String>>,
}

impl<T> TaskHandle<T> {
    /// Block until the task finishes.
    ///
    /// A panic inside the task is reported here as [`Error::TaskFailed`]; it does not
    /// affect the worker or any other task.
    pub fn join(self) -> Result<T> {
        match self.rx.recv() {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(msg)) => Err(Error::TaskFailed(msg)),
            Err(_) => Err(Error::TaskFailed(
                "task was dropped before it ran".to_owned(),
            )),
        }
    }
}

pub struct ThreadPool {
    queue: Arc<ConcurrentQueue<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("workers", &self.workers.len())
            .field("queued", &self.queue.len())
            .finish()
    }
}

impl ThreadPool {
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidConfig("thread pool size must be > 0".to_owned()));
        }

        let queue: Arc<ConcurrentQueue<Job>> = Arc::new(ConcurrentQueue::new());
        let mut pool = Self {
            queue,
            workers: Vec::with_capacity(size),
        };
        for id in 0..size {
            let queue = Arc::clone(&pool.queue);
            let handle = thread::Builder::new()
                .name(format!("policy-worker-{id}"))
                .spawn(move || worker_loop(id, &queue))
                .map_err(|e| Error::Io(format!("failed to spawn worker {id}: {e}")))?;
            pool.workers.push(handle);
        }
        log::debug!("thread pool started with {size} workers");
        Ok(pool)
    }

    /// Number of live workers; `0` after shutdown.
    #[inline]
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queue `f` for execution on a worker.
    ///
    /// Fails with [`Error::QueueClosed`] after [`ThreadPool::shutdown`].
    pub fn submit<F, T>(&self, f: F) -> Result<TaskHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let job: Job = Box::new(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(f)).map_err(panic_message);
            // The caller may have dropped its handle; nothing to report then.
            let _ = tx.send(result);
        });
        self.queue.push(job)?;
        Ok(TaskHandle { rx })
    }

    /// Stop accepting work, let queued tasks finish, and join every worker. Idempotent.
    pub fn shutdown(&mut self) {
        self.queue.shutdown();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::warn!("thread pool worker exited with a panic");
            }
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(id: usize, queue: &ConcurrentQueue<Job>) {
    log::trace!("worker {id} started");
    while let Ok(job) = queue.pop() {
        job();
    }
    log::trace!("worker {id} exiting");
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn results_come_back_through_handles() {
        let pool = ThreadPool::new(4).unwrap();
        let handles: Vec<_> = (0..32u64)
            .map(|i| pool.submit(move || i * i).unwrap())
            .collect();
        let results: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results, (0..32u64).map(|i| i * i).collect::<Vec<_>>());
    }

    #[test]
    fn panics_are_isolated_to_their_handle() {
        let pool = ThreadPool::new(1).unwrap();
        let bad = pool.submit(|| -> u32 { panic!("boom") }).unwrap();
        let good = pool.submit(|| 7u32).unwrap();

        match bad.join() {
            Err(Error::TaskFailed(msg)) => assert!(msg.contains("boom"), "{msg}"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(good.join().unwrap(), 7);
    }

    #[test]
    fn shutdown_runs_queued_tasks_then_rejects() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut pool = ThreadPool::new(2).unwrap();
        for _ in 0..50 {
            let counter = Arc::clone(&counter);
            pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        pool.shutdown();
        assert_eq!(counter.load(Ordering::SeqCst), 50);
        assert_eq!(pool.size(), 0);
        assert!(matches!(pool.submit(|| ()), Err(Error::QueueClosed)));

        pool.shutdown();
    }

    #[test]
    fn zero_workers_is_rejected() {
        assert!(matches!(ThreadPool::new(0), Err(Error::InvalidConfig(_))));
    }
}
