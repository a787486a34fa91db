//! Blocking FIFO with cooperative shutdown.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::{Error, Result};

#[derive(Debug)]
struct State<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Multi-producer, multi-consumer blocking queue.
///
/// After [`ConcurrentQueue::shutdown`]:
///
/// - `push` fails immediately with [`Error::QueueClosed`];
/// - items already queued are still handed out by `pop`/`try_pop`;
/// - once the queue is empty, every pending and future `pop` returns [`Error::QueueClosed`].
#[derive(Debug)]
pub struct ConcurrentQueue<T> {
    state: Mutex<State<T>>,
    available: Condvar,
}

impl<T> Default for ConcurrentQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ConcurrentQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                items: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    // Jobs never run under the lock, so a poisoned mutex still guards consistent data.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, item: T) -> Result<()> {
        let mut state = self.lock();
        if state.closed {
            return Err(Error::QueueClosed);
        }
        state.items.push_back(item);
        drop(state);
        self.available.notify_one();
        Ok(())
    }

    /// Block until an item is available or the queue is shut down and drained.
    pub fn pop(&self) -> Result<T> {
        let mut state = self.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                return Ok(item);
            }
            if state.closed {
                return Err(Error::QueueClosed);
            }
            state = self
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Non-blocking pop. `Ok(None)` means "empty for now".
    pub fn try_pop(&self) -> Result<Option<T>> {
        let mut state = self.lock();
        match state.items.pop_front() {
            Some(item) => Ok(Some(item)),
            None if state.closed => Err(Error::QueueClosed),
            None => Ok(None),
        }
    }

    /// Close the queue and wake every blocked consumer. Idempotent.
    pub fn shutdown(&self) {
        self.lock().closed = true;
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn fifo_order() {
        let q = ConcurrentQueue::new();
        for i in 0..5 {
            q.push(i).unwrap();
        }
        assert_eq!(q.len(), 5);
        let got: Vec<i32> = (0..5).map(|_| q.pop().unwrap()).collect();
        assert_eq!(got, vec![0, 1, 2, 3, 4]);
        assert_eq!(q.try_pop().unwrap(), None);
    }

    #[test]
    fn shutdown_drains_then_closes() {
        let q = ConcurrentQueue::new();
        q.push("a").unwrap();
        q.push("b").unwrap();
        q.shutdown();

        assert_eq!(q.push("c"), Err(Error::QueueClosed));
        assert_eq!(q.pop().unwrap(), "a");
        assert_eq!(q.try_pop().unwrap(), Some("b"));
        assert_eq!(q.pop(), Err(Error::QueueClosed));
        assert_eq!(q.try_pop(), Err(Error::QueueClosed));
    }

    #[test]
    fn shutdown_wakes_blocked_consumers() {
        let q = Arc::new(ConcurrentQueue::<u32>::new());
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let q = Arc::clone(&q);
                thread::spawn(move || q.pop())
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        q.shutdown();
        for w in waiters {
            assert_eq!(w.join().unwrap(), Err(Error::QueueClosed));
        }
    }

    #[test]
    fn blocked_pop_receives_later_push() {
        let q = Arc::new(ConcurrentQueue::new());
        let consumer = {
            let q = Arc::clone(&q);
            thread::spawn(move || q.pop())
        };
        thread::sleep(Duration::from_millis(10));
        q.push(42).unwrap();
        assert_eq!(consumer.join().unwrap(), Ok(42));
    }
}
