//! Common `Agent` interface over the stateless-agent / explicit-state pattern.
//!
//! [`ContextualThompson`] and [`EGreedy`] both take their state by value,
//! consume an [`RngKey`] per call and read their inputs from an
//! [`Observation`]. This trait makes that explicit so a controller can drive
//! either one (and check its schemas) without knowing which it holds.
//!
//! The typed `update`/`sample` methods on each agent stay the primary API;
//! the trait only covers what the two have in common.

use crate::egreedy::{EGreedy, EGreedyState};
use crate::error::Result;
use crate::key::RngKey;
use crate::spaces::{Observation, Space};
use crate::state::BanditState;
use crate::thompson::ContextualThompson;

/// An agent whose state is owned and threaded by the caller.
///
/// # Example
///
/// ```rust
/// use decaying_thompson::{
///     Agent, ContextualThompson, ContextualThompsonConfig, KeyStream, Observation, Value,
/// };
///
/// fn step<A: Agent>(agent: &A, state: A::State, keys: &mut KeyStream, t: f64) -> A::State {
///     let obs = Observation::from([("time".to_string(), Value::Float(t))]);
///     let (state, _arm) = agent.sample_observation(state, keys.next_key(), &obs).unwrap();
///     state
/// }
///
/// let ts = ContextualThompson::new(vec![1.0, 0.5], ContextualThompsonConfig::default()).unwrap();
/// let mut keys = KeyStream::new(0);
/// let state = step(&ts, ts.init(), &mut keys, 1.0);
/// assert_eq!(state.last_decay(), &[1.0, 1.0]);
/// ```
pub trait Agent {
    type State;

    fn init(&self) -> Self::State;

    /// Fold in one observation shaped like [`update_observation_space`](Agent::update_observation_space).
    fn update_observation(
        &self,
        state: Self::State,
        key: RngKey,
        obs: &Observation,
    ) -> Result<Self::State>;

    /// Choose an arm from inputs shaped like [`sample_observation_space`](Agent::sample_observation_space).
    fn sample_observation(
        &self,
        state: Self::State,
        key: RngKey,
        obs: &Observation,
    ) -> Result<(Self::State, usize)>;

    fn update_observation_space(&self) -> Space;

    fn sample_observation_space(&self) -> Space;

    fn action_space(&self) -> Space;
}

impl Agent for ContextualThompson {
    type State = BanditState;

    fn init(&self) -> BanditState {
        ContextualThompson::init(self)
    }
    fn update_observation(
        &self,
        state: BanditState,
        key: RngKey,
        obs: &Observation,
    ) -> Result<BanditState> {
        ContextualThompson::update_observation(self, state, key, obs)
    }
    fn sample_observation(
        &self,
        state: BanditState,
        key: RngKey,
        obs: &Observation,
    ) -> Result<(BanditState, usize)> {
        ContextualThompson::sample_observation(self, state, key, obs)
    }
    fn update_observation_space(&self) -> Space {
        ContextualThompson::update_observation_space(self)
    }
    fn sample_observation_space(&self) -> Space {
        ContextualThompson::sample_observation_space(self)
    }
    fn action_space(&self) -> Space {
        ContextualThompson::action_space(self)
    }
}

impl Agent for EGreedy {
    type State = EGreedyState;

    fn init(&self) -> EGreedyState {
        EGreedy::init(self)
    }
    fn update_observation(
        &self,
        state: EGreedyState,
        key: RngKey,
        obs: &Observation,
    ) -> Result<EGreedyState> {
        EGreedy::update_observation(self, state, key, obs)
    }
    fn sample_observation(
        &self,
        state: EGreedyState,
        key: RngKey,
        _obs: &Observation,
    ) -> Result<(EGreedyState, usize)> {
        self.sample(state, key)
    }
    fn update_observation_space(&self) -> Space {
        EGreedy::update_observation_space(self)
    }
    fn sample_observation_space(&self) -> Space {
        EGreedy::sample_observation_space(self)
    }
    fn action_space(&self) -> Space {
        EGreedy::action_space(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::egreedy::EGreedyConfig;
    use crate::key::KeyStream;
    use crate::spaces::Value;
    use crate::thompson::ContextualThompsonConfig;

    /// Drive any agent for a few steps; reward arm 0, punish everything else.
    fn run_generic<A: Agent>(agent: &A, mut state: A::State, reward_key: &str) -> A::State {
        let mut keys = KeyStream::new(17);
        for t in 0..20 {
            let time = t as f64;
            let sample_obs = Observation::from([("time".to_string(), Value::Float(time))]);
            let (next, arm) = agent
                .sample_observation(state, keys.next_key(), &sample_obs)
                .unwrap();
            assert!(agent.action_space().contains(&Value::Int(arm as i64)));

            let win = arm == 0;
            let mut obs = Observation::from([
                ("action".to_string(), Value::Int(arm as i64)),
                ("time".to_string(), Value::Float(time)),
            ]);
            if reward_key == "reward" {
                obs.insert("reward".to_string(), Value::Float(if win { 1.0 } else { 0.0 }));
            } else {
                obs.insert("n_successful".to_string(), Value::Int(win as i64));
                obs.insert("n_failed".to_string(), Value::Int(!win as i64));
            }
            assert!(agent.update_observation_space().contains(&Value::Dict(obs.clone())));
            state = agent.update_observation(next, keys.next_key(), &obs).unwrap();
        }
        state
    }

    #[test]
    fn thompson_implements_agent() {
        let ts = ContextualThompson::new(vec![1.0, 1.0, 1.0], ContextualThompsonConfig::default())
            .unwrap();
        let s = run_generic(&ts, Agent::init(&ts), "counts");
        let total: f64 = s.alpha().iter().chain(s.beta()).sum();
        assert_eq!(total, 20.0);
    }

    #[test]
    fn egreedy_implements_agent() {
        let eg = EGreedy::new(3, EGreedyConfig::default()).unwrap();
        let s = run_generic(&eg, Agent::init(&eg), "reward");
        let tries: u64 = s.n().iter().sum();
        assert_eq!(tries, 3 + 20);
    }

    #[test]
    fn egreedy_sample_schema_is_empty() {
        let eg = EGreedy::new(2, EGreedyConfig::default()).unwrap();
        assert_eq!(
            Agent::sample_observation_space(&eg),
            Space::Dict(Default::default())
        );
    }
}
