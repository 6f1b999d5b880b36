//! Epsilon-greedy agent with optimistic start and optional recency weighting.
//!
//! With probability `epsilon` a uniformly random arm is chosen, otherwise
//! the arm with the highest action-value estimate (lowest index on ties).
//! Like the Thompson agent, state is threaded by value and every stochastic
//! call consumes an [`RngKey`].

use rand::Rng;

use crate::error::{BanditError, Result};
use crate::key::RngKey;
use crate::spaces::{self, Observation, Space};
use crate::thompson::argmax_first;

/// Configuration for [`EGreedy`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EGreedyConfig {
    /// Exploration probability in `[0, 1]`.
    pub epsilon: f64,
    /// Initial action-value estimate for every arm.
    pub optimistic_start: f64,
    /// Step size in `[0, 1]`. `0.0` means sample averaging (`1 / n`); any other
    /// value is an exponential recency-weighted average.
    pub alpha: f64,
}

impl Default for EGreedyConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.1,
            optimistic_start: 0.0,
            alpha: 0.0,
        }
    }
}

/// Action-value estimates and try counts.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EGreedyState {
    pub(crate) q: Vec<f64>,
    pub(crate) n: Vec<u64>,
}

impl EGreedyState {
    pub fn q(&self) -> &[f64] {
        &self.q
    }

    /// Tries per arm; starts at `1` so the first sample-average step is a plain overwrite.
    pub fn n(&self) -> &[u64] {
        &self.n
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EGreedy {
    n_arms: usize,
    cfg: EGreedyConfig,
}

impl EGreedy {
    pub fn new(n_arms: usize, cfg: EGreedyConfig) -> Result<Self> {
        if n_arms == 0 {
            return Err(BanditError::InvalidParameter {
                name: "n_arms",
                value: 0.0,
            });
        }
        for (name, value) in [("epsilon", cfg.epsilon), ("alpha", cfg.alpha)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(BanditError::InvalidParameter { name, value });
            }
        }
        if !cfg.optimistic_start.is_finite() {
            return Err(BanditError::InvalidParameter {
                name: "optimistic_start",
                value: cfg.optimistic_start,
            });
        }
        Ok(Self { n_arms, cfg })
    }

    pub fn n_arms(&self) -> usize {
        self.n_arms
    }

    pub fn config(&self) -> &EGreedyConfig {
        &self.cfg
    }

    pub fn init(&self) -> EGreedyState {
        EGreedyState {
            q: vec![self.cfg.optimistic_start; self.n_arms],
            n: vec![1; self.n_arms],
        }
    }

    fn check_state(&self, state: &EGreedyState) -> Result<()> {
        for (what, got) in [("q", state.q.len()), ("n", state.n.len())] {
            if got != self.n_arms {
                return Err(BanditError::ShapeMismatch {
                    what,
                    expected: self.n_arms,
                    got,
                });
            }
        }
        Ok(())
    }

    /// Move `action`'s estimate toward `reward`. The key is not used.
    pub fn update(
        &self,
        mut state: EGreedyState,
        _key: RngKey,
        action: usize,
        reward: f64,
    ) -> Result<EGreedyState> {
        self.check_state(&state)?;
        if action >= self.n_arms {
            return Err(BanditError::IndexOutOfRange {
                index: action,
                n_arms: self.n_arms,
            });
        }
        if !reward.is_finite() {
            return Err(BanditError::InvalidParameter {
                name: "reward",
                value: reward,
            });
        }
        let step = if self.cfg.alpha == 0.0 {
            1.0 / state.n[action] as f64
        } else {
            self.cfg.alpha
        };
        state.q[action] += step * (reward - state.q[action]);
        state.n[action] = state.n[action].saturating_add(1);
        tracing::debug!(action, reward, q = state.q[action], "egreedy update");
        Ok(state)
    }

    /// Choose an arm. The state is returned unchanged.
    pub fn sample(&self, state: EGreedyState, key: RngKey) -> Result<(EGreedyState, usize)> {
        self.check_state(&state)?;
        let (explore_key, choice_key) = key.split();
        let explore = explore_key.into_rng().random::<f64>() < self.cfg.epsilon;
        let action = if explore {
            choice_key.into_rng().random_range(0..self.n_arms)
        } else {
            argmax_first(&state.q)
        };
        tracing::debug!(action, explore, "egreedy sample");
        Ok((state, action))
    }

    pub fn update_observation(
        &self,
        state: EGreedyState,
        key: RngKey,
        obs: &Observation,
    ) -> Result<EGreedyState> {
        let action = spaces::read_action(obs, "action", self.n_arms)?;
        let reward = spaces::read_scalar(obs, "reward")?;
        self.update(state, key, action, reward)
    }

    pub fn parameter_space() -> Space {
        Space::dict([
            ("n_arms", Space::int_box(1.0, f64::INFINITY, 1)),
            ("epsilon", Space::float_box(0.0, 1.0, 1)),
            ("optimistic_start", Space::float_box(0.0, f64::INFINITY, 1)),
            ("alpha", Space::float_box(0.0, 1.0, 1)),
        ])
    }

    pub fn update_observation_space(&self) -> Space {
        Space::dict([
            ("action", Space::Discrete(self.n_arms)),
            (
                "reward",
                Space::float_box(f64::NEG_INFINITY, f64::INFINITY, 1),
            ),
        ])
    }

    /// Sampling needs no inputs.
    pub fn sample_observation_space(&self) -> Space {
        Space::Dict(Default::default())
    }

    pub fn action_space(&self) -> Space {
        Space::Discrete(self.n_arms)
    }
}
