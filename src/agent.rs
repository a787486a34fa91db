//! Mapping network outputs to paddle actions.
//!
//! A policy network emits one score per action in its first three output columns:
//! column 0 is `Down`, column 1 is `Stay`, column 2 is `Up`. The chosen action is the
//! arg-max over those columns, ties resolved toward the lower index.

use crate::env::{STATE_DIM, State};
use crate::layer::{Layer, Params};
use crate::metrics::argmax;
use crate::tensor::Matrix;
use crate::{Error, Result};

/// Number of output columns a policy network must provide.
pub const NUM_ACTIONS: usize = 3;

/// Dead zone for [`heuristic_action`]: the paddle holds still while the ball is this close.
pub const HEURISTIC_TOLERANCE: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Move the paddle toward larger `y`.
    Down,
    Stay,
    /// Move the paddle toward smaller `y`.
    Up,
}

impl Action {
    pub const ALL: [Action; NUM_ACTIONS] = [Action::Down, Action::Stay, Action::Up];

    /// Signed paddle direction: `+1`, `0`, or `-1`.
    #[inline]
    pub fn value(self) -> i32 {
        match self {
            Action::Down => 1,
            Action::Stay => 0,
            Action::Up => -1,
        }
    }

    /// Output column that scores this action.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Action::Down => 0,
            Action::Stay => 1,
            Action::Up => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn one_hot(self) -> [f32; NUM_ACTIONS] {
        let mut v = [0.0; NUM_ACTIONS];
        v[self.index()] = 1.0;
        v
    }
}

/// Arg-max over the first [`NUM_ACTIONS`] entries of `row`; ties go to the lowest index.
fn argmax_action(row: &[f32]) -> Result<Action> {
    row.get(..NUM_ACTIONS)
        .and_then(argmax)
        .and_then(Action::from_index)
        .ok_or_else(|| {
            Error::Shape(format!(
                "policy output must have at least {NUM_ACTIONS} columns, got {}",
                row.len()
            ))
        })
}

fn ensure_action_columns(output: &Matrix) -> Result<()> {
    if output.cols() < NUM_ACTIONS {
        return Err(Error::Shape(format!(
            "policy output must have at least {NUM_ACTIONS} columns, got {}",
            output.cols()
        )));
    }
    Ok(())
}

/// Action for the first row of `output`.
pub fn select_action(output: &Matrix) -> Result<Action> {
    ensure_action_columns(output)?;
    argmax_action(output.row(0)?)
}

/// One action per row of `output`.
pub fn select_actions(output: &Matrix) -> Result<Vec<Action>> {
    ensure_action_columns(output)?;
    output
        .as_slice()
        .chunks_exact(output.cols())
        .map(argmax_action)
        .collect()
}

/// The hand-written labeling rule used to build training targets: chase the ball
/// vertically, holding still inside a small dead zone.
pub fn heuristic_action(state: &State) -> Action {
    let diff = state.ball_y - state.paddle_y;
    if diff > HEURISTIC_TOLERANCE {
        Action::Down
    } else if diff < -HEURISTIC_TOLERANCE {
        Action::Up
    } else {
        Action::Stay
    }
}

/// Encode a batch of states as a `[n, STATE_DIM]` input matrix.
pub fn states_to_matrix(states: &[State]) -> Matrix {
    let mut x = Matrix::zeros([states.len(), STATE_DIM]);
    for (row, s) in x.as_mut_slice().chunks_exact_mut(STATE_DIM).zip(states) {
        row.copy_from_slice(&s.to_array());
    }
    x
}

/// Run `model` on a single state and pick the arg-max action.
pub fn act_with<L: Layer + ?Sized>(model: &L, state: &State) -> Result<Action> {
    let input = states_to_matrix(std::slice::from_ref(state));
    select_action(&model.infer(&input)?)
}

/// A policy: any layer (typically a [`crate::Sequential`]) plus the arg-max action rule.
#[derive(Debug, Clone)]
pub struct PolicyAgent<L> {
    model: L,
}

impl<L: Layer> PolicyAgent<L> {
    pub fn new(model: L) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &L {
        &self.model
    }

    pub fn into_model(self) -> L {
        self.model
    }

    /// Choose an action for `state`. Uses [`Layer::infer`], so no cache is written.
    pub fn act(&self, state: &State) -> Result<Action> {
        act_with(&self.model, state)
    }
}

impl<L: Layer> Params for PolicyAgent<L> {
    fn num_params(&self) -> usize {
        self.model.num_params()
    }

    fn write_params(&self, out: &mut Vec<f32>) {
        self.model.write_params(out);
    }

    fn set_params(&mut self, params: &[f32]) -> Result<()> {
        self.model.set_params(params)
    }
}
