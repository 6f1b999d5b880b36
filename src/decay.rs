//! Exponential forgetting of accumulated evidence.
//!
//! An arm last brought up to date at `last` and decayed to `time` has its
//! pseudo-counts scaled by `exp(rate * (last - time))`. With `rate > 0` and
//! time moving forward that factor lies in `(0, 1]`, giving a half-life of
//! `ln 2 / rate`. `rate == 0` disables forgetting entirely.
//!
//! The helpers here do no validation: [`update`](crate::update) and
//! [`sample`](crate::sample) check indices, times and shapes first.

use crate::error::{BanditError, Result};
use crate::state::BanditState;

/// What to do when `time` is earlier than an arm's recorded `last_decay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BackwardTimePolicy {
    /// Fail the update/sample with [`BanditError::BackwardTime`].
    #[default]
    Reject,
    /// Keep evidence as-is (factor clamped to 1) and move `last_decay` to `time`.
    Clamp,
    /// Apply the formula literally; evidence grows by `exp(rate * (last - time)) > 1`.
    Amplify,
}

/// A validated decay rate plus its backward-time policy.
///
/// Built from [`ContextualThompsonConfig`](crate::ContextualThompsonConfig)
/// or [`Decay::new`]; there is no way to hold an unchecked rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decay {
    rate: f64,
    policy: BackwardTimePolicy,
}

impl Decay {
    /// `rate` must be finite and `>= 0`.
    pub fn new(rate: f64, policy: BackwardTimePolicy) -> Result<Self> {
        if !(rate.is_finite() && rate >= 0.0) {
            return Err(BanditError::InvalidParameter {
                name: "decay",
                value: rate,
            });
        }
        Ok(Self { rate, policy })
    }

    /// No forgetting.
    pub fn disabled() -> Self {
        Self {
            rate: 0.0,
            policy: BackwardTimePolicy::Reject,
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn policy(&self) -> BackwardTimePolicy {
        self.policy
    }

    pub fn is_disabled(&self) -> bool {
        self.rate == 0.0
    }

    /// Time for evidence to halve; infinite when decay is disabled.
    pub fn half_life(&self) -> f64 {
        if self.is_disabled() {
            f64::INFINITY
        } else {
            std::f64::consts::LN_2 / self.rate
        }
    }

    /// Multiplier for evidence last decayed at `last` when moving to `time`.
    ///
    /// Only [`BackwardTimePolicy::Amplify`] ever returns a value above `1`;
    /// `Reject` is enforced before decay runs, so here it behaves like `Clamp`.
    pub fn factor(&self, last: f64, time: f64) -> f64 {
        let f = (self.rate * (last - time)).exp();
        match self.policy {
            BackwardTimePolicy::Amplify => f,
            BackwardTimePolicy::Reject | BackwardTimePolicy::Clamp => f.min(1.0),
        }
    }

    /// Boundary check run before any state is touched.
    ///
    /// Under `Reject` it fails if any of `arms` was last decayed after `time`;
    /// under `Amplify` it fails if scaling an arm would overflow its counts.
    pub(crate) fn check_time<I>(&self, state: &BanditState, arms: I, time: f64) -> Result<()>
    where
        I: IntoIterator<Item = usize>,
    {
        for arm in arms {
            let last = state.last_decay[arm];
            if time < last {
                match self.policy {
                    BackwardTimePolicy::Reject => {
                        return Err(BanditError::BackwardTime {
                            arm,
                            last_decay: last,
                            time,
                        });
                    }
                    BackwardTimePolicy::Clamp => {
                        tracing::warn!(
                            arm,
                            last_decay = last,
                            time,
                            "time moved backward; clamping decay"
                        );
                    }
                    BackwardTimePolicy::Amplify => {
                        let f = self.factor(last, time);
                        let overflows = [state.alpha[arm], state.beta[arm]]
                            .into_iter()
                            .any(|x| !scale(x, f).is_finite());
                        if overflows {
                            return Err(BanditError::EvidenceOverflow { arm, factor: f });
                        }
                        tracing::warn!(
                            arm,
                            last_decay = last,
                            time,
                            factor = f,
                            "time moved backward; amplifying evidence"
                        );
                    }
                }
            }
        }
        Ok(())
    }
}

/// `x * f`, except that zero evidence stays zero even for an infinite factor.
fn scale(x: f64, f: f64) -> f64 {
    if x == 0.0 {
        0.0
    } else {
        x * f
    }
}

impl Default for Decay {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Bring one arm up to `time`; every other arm is untouched.
///
/// Zero counts stay zero. Called directly with an `Amplify` decay and a large
/// backward step, non-zero counts can still reach infinity; `update` and
/// `sample` refuse such steps up front.
///
/// # Panics
///
/// If `arm >= state.n_arms()`.
pub fn decay_one(mut state: BanditState, arm: usize, time: f64, decay: &Decay) -> BanditState {
    let f = decay.factor(state.last_decay[arm], time);
    state.alpha[arm] = scale(state.alpha[arm], f);
    state.beta[arm] = scale(state.beta[arm], f);
    state.last_decay[arm] = time;
    tracing::trace!(arm, time, factor = f, "decayed arm");
    state
}

/// Bring every arm up to `time`, each relative to its own `last_decay`.
pub fn decay_all(mut state: BanditState, time: f64, decay: &Decay) -> BanditState {
    let BanditState {
        alpha,
        beta,
        last_decay,
    } = &mut state;
    for ((a, b), last) in alpha
        .iter_mut()
        .zip(beta.iter_mut())
        .zip(last_decay.iter_mut())
    {
        let f = decay.factor(*last, time);
        *a = scale(*a, f);
        *b = scale(*b, f);
        *last = time;
    }
    tracing::trace!(n_arms = state.n_arms(), time, "decayed all arms");
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(alpha: Vec<f64>, beta: Vec<f64>, last: Vec<f64>) -> BanditState {
        BanditState::from_parts(alpha, beta, last).unwrap()
    }

    #[test]
    fn decay_one_magnitude() {
        let s = state_with(vec![10.0, 3.0], vec![0.0, 1.0], vec![0.0, 0.0]);
        let d = Decay::new(1.0, BackwardTimePolicy::Reject).unwrap();
        let s = decay_one(s, 0, 5.0, &d);
        let expected = 10.0 * (-5.0f64).exp();
        assert!((s.alpha()[0] - expected).abs() < 1e-12);
        assert!((s.alpha()[0] - 0.0674).abs() < 1e-3);
        assert_eq!(s.last_decay(), &[5.0, 0.0]);
        // Other arm untouched.
        assert_eq!(s.alpha()[1], 3.0);
        assert_eq!(s.beta()[1], 1.0);
    }

    #[test]
    fn disabled_decay_only_moves_clock() {
        let s = state_with(vec![4.0, 2.0], vec![1.0, 7.0], vec![0.0, 3.0]);
        let out = decay_all(s.clone(), 100.0, &Decay::disabled());
        assert_eq!(out.alpha(), s.alpha());
        assert_eq!(out.beta(), s.beta());
        assert_eq!(out.last_decay(), &[100.0, 100.0]);
    }

    #[test]
    fn decay_all_uses_per_arm_elapsed_time() {
        let s = state_with(vec![1.0, 1.0], vec![1.0, 1.0], vec![0.0, 2.0]);
        let d = Decay::new(0.5, BackwardTimePolicy::Reject).unwrap();
        let out = decay_all(s, 4.0, &d);
        assert!((out.alpha()[0] - (-2.0f64).exp()).abs() < 1e-12);
        assert!((out.alpha()[1] - (-1.0f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn second_decay_at_same_time_is_noop() {
        let s = state_with(vec![8.0], vec![2.0], vec![0.0]);
        let d = Decay::new(0.3, BackwardTimePolicy::Reject).unwrap();
        let once = decay_all(s, 3.0, &d);
        let twice = decay_all(once.clone(), 3.0, &d);
        assert_eq!(once, twice);
    }

    #[test]
    fn half_life_halves_evidence() {
        let d = Decay::new(0.25, BackwardTimePolicy::Reject).unwrap();
        let s = decay_one(state_with(vec![6.0], vec![2.0], vec![0.0]), 0, d.half_life(), &d);
        assert!((s.alpha()[0] - 3.0).abs() < 1e-9);
        assert!((s.beta()[0] - 1.0).abs() < 1e-9);
        assert_eq!(Decay::disabled().half_life(), f64::INFINITY);
    }

    #[test]
    fn backward_factor_depends_on_policy() {
        let clamp = Decay::new(1.0, BackwardTimePolicy::Clamp).unwrap();
        let amplify = Decay::new(1.0, BackwardTimePolicy::Amplify).unwrap();
        assert_eq!(clamp.factor(5.0, 4.0), 1.0);
        assert!((amplify.factor(5.0, 4.0) - 1.0f64.exp()).abs() < 1e-12);
    }

    #[test]
    fn reject_policy_flags_backward_time() {
        let s = state_with(vec![0.0, 0.0], vec![0.0, 0.0], vec![0.0, 5.0]);
        let d = Decay::new(1.0, BackwardTimePolicy::Reject).unwrap();
        assert!(d.check_time(&s, [0], 1.0).is_ok());
        assert_eq!(
            d.check_time(&s, 0..2, 1.0),
            Err(BanditError::BackwardTime {
                arm: 1,
                last_decay: 5.0,
                time: 1.0
            })
        );
    }

    #[test]
    fn amplify_overflow_is_refused_before_decay() {
        let s = state_with(vec![0.0, 3.0], vec![0.0, 0.0], vec![0.0, 1000.0]);
        let d = Decay::new(1.0, BackwardTimePolicy::Amplify).unwrap();
        assert_eq!(d.factor(1000.0, 0.0), f64::INFINITY);
        assert_eq!(
            d.check_time(&s, 0..2, 0.0),
            Err(BanditError::EvidenceOverflow {
                arm: 1,
                factor: f64::INFINITY
            })
        );
    }

    #[test]
    fn zero_evidence_survives_infinite_factor() {
        let s = state_with(vec![0.0], vec![0.0], vec![1000.0]);
        let d = Decay::new(1.0, BackwardTimePolicy::Amplify).unwrap();
        assert!(d.check_time(&s, [0], 0.0).is_ok());
        let out = decay_all(s, 0.0, &d);
        assert_eq!(out.alpha(), &[0.0]);
        assert_eq!(out.beta(), &[0.0]);
        assert_eq!(out.last_decay(), &[0.0]);
    }

    #[test]
    fn negative_or_nan_rate_is_rejected() {
        assert!(Decay::new(-0.1, BackwardTimePolicy::Reject).is_err());
        assert!(Decay::new(f64::NAN, BackwardTimePolicy::Reject).is_err());
        assert!(Decay::new(0.0, BackwardTimePolicy::Clamp).unwrap().is_disabled());
    }
}
