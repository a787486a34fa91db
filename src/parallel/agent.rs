use std::sync::Arc;

use super::pool::{TaskHandle, ThreadPool};
use crate::agent::{Action, act_with};
use crate::env::State;
use crate::layer::Layer;
use crate::Result;

/// A frozen policy served from a worker pool.
///
/// The model is moved behind an [`Arc`] at construction and only ever read through
/// [`Layer::infer`], so any number of workers can evaluate it at once. To change the
/// parameters, build a new agent.
#[derive(Debug)]
pub struct ParallelAgent {
    model: Arc<dyn Layer>,
    pool: ThreadPool,
}

impl ParallelAgent {
    pub fn new<L: Layer + 'static>(model: L, workers: usize) -> Result<Self> {
        Self::from_shared(Arc::new(model), workers)
    }

    pub fn from_shared(model: Arc<dyn Layer>, workers: usize) -> Result<Self> {
        Ok(Self {
            model,
            pool: ThreadPool::new(workers)?,
        })
    }

    pub fn model(&self) -> &dyn Layer {
        self.model.as_ref()
    }

    #[inline]
    pub fn workers(&self) -> usize {
        self.pool.size()
    }

    /// Schedule action selection on the pool.
    ///
    /// The outer `Result` fails with `Error::QueueClosed` after shutdown; the handle yields
    /// the inference result.
    pub fn act_async(&self, state: State) -> Result<TaskHandle<Result<Action>>> {
        let model = Arc::clone(&self.model);
        self.pool.submit(move || act_with(model.as_ref(), &state))
    }

    /// Select an action on the calling thread.
    pub fn act(&self, state: &State) -> Result<Action> {
        act_with(self.model.as_ref(), state)
    }

    /// Fan `states` out to the pool and collect the actions in input order.
    pub fn act_batch(&self, states: &[State]) -> Result<Vec<Action>> {
        let handles = states
            .iter()
            .map(|&s| self.act_async(s))
            .collect::<Result<Vec<_>>>()?;
        handles.into_iter().map(|h| h.join()?).collect()
    }

    /// Finish queued requests and stop the workers.
    pub fn shutdown(&mut self) {
        self.pool.shutdown();
    }
}
