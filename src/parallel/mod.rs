//! Thread-based serving of frozen policies.
//!
//! - [`ConcurrentQueue`]: blocking FIFO with shutdown.
//! - [`ThreadPool`]: fixed workers draining a queue of jobs, results via [`TaskHandle`].
//! - [`ParallelAgent`]: a shared, read-only policy evaluated on a pool.
//!
//! Training stays single-threaded; only inference is fanned out.

pub mod agent;
pub mod pool;
pub mod queue;

pub use agent::ParallelAgent;
pub use pool::{TaskHandle, ThreadPool};
pub use queue::ConcurrentQueue;
