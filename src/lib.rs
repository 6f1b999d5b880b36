//! `decaying_thompson`: contextual Thompson sampling that forgets.
//!
//! A fixed set of arms (rate-control modes, backends, anything you choose
//! between repeatedly) is tracked with a Beta-Bernoulli belief per arm. Old
//! evidence fades exponentially with time, so the policy keeps up when an
//! arm's success rate drifts.
//!
//! Each decision step:
//! 1. [`sample`] decays every arm to the current time, draws
//!    `p_i ~ Beta(1 + alpha_i, 1 + beta_i)`, and picks
//!    `argmax_i p_i * context_i` (lowest index on ties).
//! 2. After the environment reports back, [`update`] decays only the pulled
//!    arm to the current time and adds the new success/failure counts.
//!
//! **Goals:**
//! - **Explicit state**: [`BanditState`] is a value moved in and returned;
//!   the controller owns the only live copy. No interior mutability.
//! - **Single-use randomness**: an [`RngKey`] is moved into every call, so a
//!   key cannot seed two draws. [`KeyStream`] hands out fresh ones.
//! - **Reproducible**: same state + same key → same choice.
//! - **Fail before touching**: shape, index, count and time checks run at the
//!   boundary; an error never leaves a half-updated state behind.
//!
//! **Pieces:**
//! - [`decay_one`] / [`decay_all`] / [`Decay`]: exponential forgetting, with a
//!   [`BackwardTimePolicy`] for time that runs backward.
//! - [`update`] / [`sample`] / [`sample_explain`]: the free-function core.
//! - [`ContextualThompson`]: binds a context vector and decay rate once and
//!   exposes `init` / `update` / `sample`.
//! - [`EGreedy`]: epsilon-greedy alternative with the same calling convention.
//! - [`Agent`]: common trait for driving either agent from [`Observation`] maps.
//! - [`spaces`]: input/output schemas ([`Space`]) and untyped [`Value`]s.
//! - [`logs`]: routing of observations, state and metrics to [`LogSink`]s.
//!
//! **Non-goals:**
//! - No arm discovery: the arm count is fixed at construction.
//! - No persistence, no multi-instance management, no training loop.
//!
//! # Example
//!
//! ```rust
//! use decaying_thompson::{ContextualThompson, ContextualThompsonConfig, KeyStream};
//!
//! let ts = ContextualThompson::new(
//!     vec![1.0, 1.0],
//!     ContextualThompsonConfig { decay: 0.1, ..Default::default() },
//! )
//! .unwrap();
//! let mut keys = KeyStream::new(7);
//! let mut state = ts.init();
//!
//! for step in 0..10 {
//!     let t = step as f64;
//!     let (next, arm) = ts.sample(state, keys.next_key(), t).unwrap();
//!     let success = arm == 0;
//!     state = ts
//!         .update(next, keys.next_key(), arm, success as u64, !success as u64, t)
//!         .unwrap();
//! }
//! assert_eq!(state.n_arms(), 2);
//! ```

#![forbid(unsafe_code)]

mod error;
pub use error::*;

mod state;
pub use state::*;

mod key;
pub use key::*;

mod decay;
pub use decay::*;

mod thompson;
pub use thompson::*;

mod egreedy;
pub use egreedy::*;

mod policy;
pub use policy::Agent;

pub mod spaces;
pub use spaces::{NumKind, Observation, Space, Value};

pub mod logs;
pub use logs::{
    LogSink, LoggableState, LogsObserver, MemorySink, Source, SourceType, TracingSink,
};
