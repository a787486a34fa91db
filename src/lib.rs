//! A small feed-forward network crate for learning control policies.
//!
//! `rust-policy-nn` is a from-scratch implementation of a strided tensor type and a
//! layer-based network trained with hand-written backpropagation. It ships with a
//! tiny Pong simulation and the glue needed to label samples, train a policy, and
//! serve it from a worker pool.
//!
//! # Design goals
//!
//! - Small, readable core: every layer implements its own gradient; there is no autodiff.
//! - Clear contracts: shapes are validated and reported as [`Error::Shape`].
//! - Whole-model parameter access: any model flattens to one ordered `Vec<f32>` and
//!   back, which is what regularization, pruning, and persistence build on.
//!
//! # Panics vs `Result`
//!
//! - Hot-path element access (`tensor[[i, j]]`) panics on out-of-range indices.
//! - Everything else ([`Tensor::get`], layer passes, training, I/O) returns [`Result`].
//!
//! # Data layout and shapes
//!
//! - Scalars are `f32`; tensors are row-major with the last axis contiguous.
//! - Layers consume and produce `[batch, features]` matrices.
//! - Dense weights have shape `[in_features, out_features]`.
//!
//! # Quick start
//!
//! ```rust
//! use rust_policy_nn::{Matrix, NetworkBuilder};
//!
//! # fn main() -> rust_policy_nn::Result<()> {
//! let x = Matrix::from_vec([4, 2], vec![0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0])?;
//! let y = Matrix::from_vec([4, 1], vec![0.0, 1.0, 1.0, 0.0])?;
//!
//! let mut net = NetworkBuilder::new(2)?
//!     .dense(8)?
//!     .relu()
//!     .dense(1)?
//!     .build_with_seed(0)?;
//!
//! let loss = net.train(&x, &y, 200, 0.05)?;
//! assert!(loss.is_finite());
//! # Ok(())
//! # }
//! ```
//!
//! # Training a policy
//!
//! ```rust
//! use rust_policy_nn::{Dataset, Samples, TrainConfig, policy_network};
//!
//! # fn main() -> rust_policy_nn::Result<()> {
//! let csv = "0.5,0.8,0.5\n0.5,0.2,0.5\n0.5,0.5,0.5\n";
//! let (samples, _report) = Samples::from_csv_reader(csv.as_bytes())?;
//! let data = Dataset::labeled(&samples)?;
//!
//! let cfg = TrainConfig {
//!     epochs: 20,
//!     hidden: vec![8],
//!     ..TrainConfig::default()
//! };
//! let mut net = policy_network(&cfg.hidden, cfg.init, cfg.seed)?;
//! let report = net.fit(&data, &cfg)?;
//! assert_eq!(report.history.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod agent;
pub mod builder;
pub mod config;
pub mod data;
pub mod dense;
pub mod env;
pub mod error;
pub mod layer;
pub mod loss;
pub(crate) mod matmul;
pub mod metrics;
pub mod network;
pub mod parallel;
pub mod params_io;
pub mod regularize;
pub mod sequential;
pub mod tensor;
pub mod train;

pub use activation::ReLU;
pub use agent::{Action, PolicyAgent, heuristic_action, select_action, select_actions};
pub use builder::{NetworkBuilder, policy_network};
pub use config::TrainConfig;
pub use data::{Dataset, LoadReport, Samples};
pub use dense::Dense;
pub use env::{PongEnv, State, Step};
pub use error::{Error, Result};
pub use layer::{Init, Layer, Params};
pub use loss::MseLoss;
pub use network::NeuralNetwork;
pub use parallel::{ConcurrentQueue, ParallelAgent, TaskHandle, ThreadPool};
pub use sequential::Sequential;
pub use tensor::{Matrix, Tensor, Vector};
pub use train::{EpochRecord, EvalReport, FitReport};
