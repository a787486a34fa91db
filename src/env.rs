//! A minimal Pong simulation used to exercise trained policies.
//!
//! Coordinates are normalized to `[0, 1]`. The agent controls the paddle on the right
//! edge; the left edge is a plain wall. Each [`PongEnv::step`] moves the paddle, advances
//! the ball one tick, and resolves collisions.

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::agent::Action;

const PADDLE_HEIGHT: f32 = 0.2;
const PADDLE_WIDTH: f32 = 0.02;
const BALL_RADIUS: f32 = 0.02;
const PADDLE_SPEED: f32 = 0.04;
const PADDLE_MIN: f32 = 0.1;
const PADDLE_MAX: f32 = 0.9;
const BASE_VX: f32 = 0.03;
const VELOCITY_JITTER: f32 = 0.05;
const HIT_SPEEDUP: f32 = 1.05;
const SPIN: f32 = 0.5;
// Nudge applied after a bounce so the ball leaves the collision zone.
const SEPARATION: f32 = 0.001;

/// Width of a [`State`] as a network input row.
pub const STATE_DIM: usize = 3;

/// Observation handed to a policy: `[ball_x, ball_y, paddle_y]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct State {
    pub ball_x: f32,
    pub ball_y: f32,
    pub paddle_y: f32,
}

impl State {
    pub fn new(ball_x: f32, ball_y: f32, paddle_y: f32) -> Self {
        Self {
            ball_x,
            ball_y,
            paddle_y,
        }
    }

    #[inline]
    pub fn to_array(self) -> [f32; STATE_DIM] {
        [self.ball_x, self.ball_y, self.paddle_y]
    }
}

/// Outcome of one [`PongEnv::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub state: State,
    /// `+1` for a paddle hit, `-1` for a miss, `0` otherwise.
    pub reward: f32,
    pub done: bool,
}

#[derive(Debug, Clone)]
pub struct PongEnv {
    ball_x: f32,
    ball_y: f32,
    ball_vx: f32,
    ball_vy: f32,
    paddle_y: f32,
    done: bool,
    rng: StdRng,
    jitter: Uniform<f32>,
}

impl PongEnv {
    /// Create an environment with a deterministic RNG and reset it.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: StdRng) -> Self {
        let mut env = Self {
            ball_x: 0.5,
            ball_y: 0.5,
            ball_vx: BASE_VX,
            ball_vy: 0.0,
            paddle_y: 0.5,
            done: false,
            rng,
            jitter: Uniform::new(-VELOCITY_JITTER, VELOCITY_JITTER),
        };
        env.reset();
        env
    }

    /// Start a new episode: ball centred and heading mostly right, paddle centred.
    pub fn reset(&mut self) -> State {
        self.ball_x = 0.5;
        self.ball_y = 0.5;
        self.ball_vx = BASE_VX + self.jitter.sample(&mut self.rng);
        self.ball_vy = self.jitter.sample(&mut self.rng);
        self.paddle_y = 0.5;
        self.done = false;
        self.state()
    }

    #[inline]
    pub fn state(&self) -> State {
        State::new(self.ball_x, self.ball_y, self.paddle_y)
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn step(&mut self, action: Action) -> Step {
        if self.done {
            return Step {
                state: self.state(),
                reward: 0.0,
                done: true,
            };
        }

        self.paddle_y =
            (self.paddle_y + action.value() as f32 * PADDLE_SPEED).clamp(PADDLE_MIN, PADDLE_MAX);

        self.ball_x += self.ball_vx;
        self.ball_y += self.ball_vy;

        let mut reward = 0.0;

        if self.ball_y <= BALL_RADIUS || self.ball_y >= 1.0 - BALL_RADIUS {
            self.ball_vy = -self.ball_vy;
            self.ball_y = self.ball_y.clamp(BALL_RADIUS, 1.0 - BALL_RADIUS);
        }

        let paddle_face = 1.0 - PADDLE_WIDTH - BALL_RADIUS;
        if self.ball_x >= paddle_face {
            let top = self.paddle_y - PADDLE_HEIGHT / 2.0;
            let bottom = self.paddle_y + PADDLE_HEIGHT / 2.0;
            if (top..=bottom).contains(&self.ball_y) {
                self.ball_vx = -self.ball_vx * HIT_SPEEDUP;
                self.ball_vy += (self.ball_y - self.paddle_y) * SPIN;
                self.ball_x = paddle_face - SEPARATION;
                reward = 1.0;
            } else if self.ball_x >= 1.0 {
                reward = -1.0;
                self.done = true;
            }
        }

        if self.ball_x <= BALL_RADIUS {
            self.ball_vx = -self.ball_vx;
            self.ball_x = BALL_RADIUS + SEPARATION;
        }

        Step {
            state: self.state(),
            reward,
            done: self.done,
        }
    }

    #[cfg(test)]
    fn set_ball(&mut self, x: f32, y: f32, vx: f32, vy: f32) {
        self.ball_x = x;
        self.ball_y = y;
        self.ball_vx = vx;
        self.ball_vy = vy;
    }
}
