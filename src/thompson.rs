//! Contextual Beta-Bernoulli Thompson sampling with exponential forgetting.
//!
//! Each arm keeps decayed success/failure pseudo-counts. To choose an arm,
//! every arm is decayed to the current time, `p_i ~ Beta(1 + alpha_i, 1 + beta_i)`
//! is drawn, and the arm maximizing `p_i * context_i` wins (lowest index on
//! ties). Outcomes are folded in for one arm at a time.
//!
//! Notes:
//! - [`update`] and [`sample`] are pure: state in, state out.
//! - Randomness comes only from the [`RngKey`] moved into [`sample`]; equal
//!   keys and states give equal choices.
//! - [`ContextualThompson`] fixes the context vector and decay rate once and
//!   exposes the bound `init`/`update`/`sample` trio.

use rand_distr::{Beta, Distribution};

use crate::decay::{decay_all, decay_one, BackwardTimePolicy, Decay};
use crate::error::{BanditError, Result};
use crate::key::RngKey;
use crate::spaces::{self, Observation, Space};
use crate::state::BanditState;

/// Per-arm diagnostics of one [`sample_explain`] call.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SampleDecision {
    /// Chosen arm index.
    pub arm: usize,
    /// Posterior draws `p_i`, one per arm.
    pub draws: Vec<f64>,
    /// Context-weighted scores `p_i * context_i` the arg-max ran over.
    pub scores: Vec<f64>,
}

pub(crate) fn check_time(time: f64) -> Result<()> {
    if !(time.is_finite() && time >= 0.0) {
        return Err(BanditError::InvalidTime { time });
    }
    Ok(())
}

/// Fold `n_successful`/`n_failed` into `arm` after decaying it to `time`.
///
/// The key argument is accepted so update and sample share one calling
/// convention; it is dropped unused and no randomness is derived from it.
pub fn update(
    state: BanditState,
    _key: RngKey,
    arm: usize,
    n_successful: u64,
    n_failed: u64,
    time: f64,
    decay: &Decay,
) -> Result<BanditState> {
    state.validate(state.n_arms())?;
    state.check_arm(arm)?;
    check_time(time)?;
    decay.check_time(&state, [arm], time)?;

    let mut state = decay_one(state, arm, time, decay);
    state.alpha[arm] += n_successful as f64;
    state.beta[arm] += n_failed as f64;
    tracing::debug!(arm, n_successful, n_failed, time, "thompson update");
    Ok(state)
}

/// Decay every arm to `time` and choose one.
///
/// The caller must never reuse a key; moving it in here enforces that.
pub fn sample(
    state: BanditState,
    key: RngKey,
    time: f64,
    context: &[f64],
    decay: &Decay,
) -> Result<(BanditState, usize)> {
    let (state, d) = sample_explain(state, key, time, context, decay)?;
    Ok((state, d.arm))
}

/// Like [`sample`], but also returns the per-arm draws and scores.
pub fn sample_explain(
    state: BanditState,
    key: RngKey,
    time: f64,
    context: &[f64],
    decay: &Decay,
) -> Result<(BanditState, SampleDecision)> {
    let n = state.n_arms();
    state.validate(n)?;
    if context.len() != n {
        return Err(BanditError::ShapeMismatch {
            what: "context",
            expected: n,
            got: context.len(),
        });
    }
    if n == 0 {
        return Err(BanditError::InvalidParameter {
            name: "n_arms",
            value: 0.0,
        });
    }
    check_time(time)?;
    decay.check_time(&state, 0..n, time)?;

    let state = decay_all(state, time, decay);
    let mut rng = key.into_rng();
    let draws: Vec<f64> = state
        .alpha
        .iter()
        .zip(&state.beta)
        .map(|(&a, &b)| match Beta::new(1.0 + a, 1.0 + b) {
            Ok(dist) => dist.sample(&mut rng),
            // Counts are finite and non-negative once the checks above pass.
            Err(_) => 0.5,
        })
        .collect();
    let scores: Vec<f64> = draws.iter().zip(context).map(|(p, c)| p * c).collect();
    let arm = argmax_first(&scores);

    tracing::debug!(arm, time, score = scores[arm], "thompson sample");
    Ok((state, SampleDecision { arm, draws, scores }))
}

/// Index of the largest score, lowest index among ties. NaN never wins.
pub(crate) fn argmax_first(scores: &[f64]) -> usize {
    let mut best = 0;
    let mut best_score = f64::NEG_INFINITY;
    for (i, &s) in scores.iter().enumerate() {
        if s > best_score {
            best = i;
            best_score = s;
        }
    }
    best
}

/// Configuration for [`ContextualThompson`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContextualThompsonConfig {
    /// Decay rate (must be finite and `>= 0`). `0.0` disables forgetting.
    pub decay: f64,
    /// How to treat a `time` earlier than an arm's last decay.
    pub backward_time: BackwardTimePolicy,
}

impl Default for ContextualThompsonConfig {
    fn default() -> Self {
        Self {
            decay: 0.0,
            backward_time: BackwardTimePolicy::Reject,
        }
    }
}

/// Thompson sampler bound to a fixed context vector and decay rate.
///
/// The number of arms is `context.len()`. The instance holds no state of its
/// own; the controller threads [`BanditState`] through every call.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextualThompson {
    context: Vec<f64>,
    decay: Decay,
}

impl ContextualThompson {
    /// Context must be non-empty and finite; negative weights are allowed.
    pub fn new(context: Vec<f64>, cfg: ContextualThompsonConfig) -> Result<Self> {
        if context.is_empty() {
            return Err(BanditError::InvalidParameter {
                name: "n_arms",
                value: 0.0,
            });
        }
        if let Some(&bad) = context.iter().find(|c| !c.is_finite()) {
            return Err(BanditError::InvalidParameter {
                name: "context",
                value: bad,
            });
        }
        let decay = Decay::new(cfg.decay, cfg.backward_time)?;
        Ok(Self { context, decay })
    }

    pub fn n_arms(&self) -> usize {
        self.context.len()
    }

    pub fn context(&self) -> &[f64] {
        &self.context
    }

    pub fn decay(&self) -> &Decay {
        &self.decay
    }

    pub fn init(&self) -> BanditState {
        BanditState::init(self.n_arms())
    }

    pub fn update(
        &self,
        state: BanditState,
        key: RngKey,
        action: usize,
        n_successful: u64,
        n_failed: u64,
        time: f64,
    ) -> Result<BanditState> {
        state.validate(self.n_arms())?;
        update(state, key, action, n_successful, n_failed, time, &self.decay)
    }

    pub fn sample(
        &self,
        state: BanditState,
        key: RngKey,
        time: f64,
    ) -> Result<(BanditState, usize)> {
        state.validate(self.n_arms())?;
        sample(state, key, time, &self.context, &self.decay)
    }

    pub fn sample_explain(
        &self,
        state: BanditState,
        key: RngKey,
        time: f64,
    ) -> Result<(BanditState, SampleDecision)> {
        state.validate(self.n_arms())?;
        sample_explain(state, key, time, &self.context, &self.decay)
    }

    /// [`update`](Self::update) driven by an untyped observation map.
    pub fn update_observation(
        &self,
        state: BanditState,
        key: RngKey,
        obs: &Observation,
    ) -> Result<BanditState> {
        let action = spaces::read_action(obs, "action", self.n_arms())?;
        let n_successful = spaces::read_count(obs, "n_successful")?;
        let n_failed = spaces::read_count(obs, "n_failed")?;
        let time = spaces::read_time(obs, "time")?;
        self.update(state, key, action, n_successful, n_failed, time)
    }

    /// [`sample`](Self::sample) driven by an untyped observation map.
    pub fn sample_observation(
        &self,
        state: BanditState,
        key: RngKey,
        obs: &Observation,
    ) -> Result<(BanditState, usize)> {
        let time = spaces::read_time(obs, "time")?;
        self.sample(state, key, time)
    }

    /// Construction parameters: `context` and `decay`.
    pub fn parameter_space(n_arms: usize) -> Space {
        Space::dict([
            ("context", Space::float_box(f64::NEG_INFINITY, f64::INFINITY, n_arms)),
            ("decay", Space::float_box(0.0, f64::INFINITY, 1)),
        ])
    }

    pub fn update_observation_space(&self) -> Space {
        Space::dict([
            ("action", Space::Discrete(self.n_arms())),
            ("n_successful", Space::int_box(0.0, f64::INFINITY, 1)),
            ("n_failed", Space::int_box(0.0, f64::INFINITY, 1)),
            ("time", Space::float_box(0.0, f64::INFINITY, 1)),
        ])
    }

    pub fn sample_observation_space(&self) -> Space {
        Space::dict([("time", Space::float_box(0.0, f64::INFINITY, 1))])
    }

    pub fn action_space(&self) -> Space {
        Space::Discrete(self.n_arms())
    }
}
