//! Per-arm Beta belief plus the time each arm was last decayed.
//!
//! A `BanditState` is a plain value. Operations take it by move and hand
//! back a new one, so the controller holds exactly one live state at a time.

use crate::error::{BanditError, Result};

/// Accumulated (decayed) evidence for every arm.
///
/// `alpha`/`beta` are pseudo-counts of successes/failures; the sampling prior
/// adds `1` to each, so the zero state is a uniform `Beta(1, 1)` per arm.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BanditState {
    pub(crate) alpha: Vec<f64>,
    pub(crate) beta: Vec<f64>,
    pub(crate) last_decay: Vec<f64>,
}

impl BanditState {
    /// Zero evidence and `last_decay = 0` for `n_arms` arms.
    pub fn init(n_arms: usize) -> Self {
        Self {
            alpha: vec![0.0; n_arms],
            beta: vec![0.0; n_arms],
            last_decay: vec![0.0; n_arms],
        }
    }

    /// Rebuild a state from raw arrays (e.g. one the controller persisted).
    ///
    /// Lengths must agree and every pseudo-count must be finite and `>= 0`.
    pub fn from_parts(alpha: Vec<f64>, beta: Vec<f64>, last_decay: Vec<f64>) -> Result<Self> {
        let n = alpha.len();
        for (what, got) in [("beta", beta.len()), ("last_decay", last_decay.len())] {
            if got != n {
                return Err(BanditError::ShapeMismatch {
                    what,
                    expected: n,
                    got,
                });
            }
        }
        for (name, xs) in [("alpha", &alpha), ("beta", &beta)] {
            if let Some(&bad) = xs.iter().find(|x| !(x.is_finite() && **x >= 0.0)) {
                return Err(BanditError::InvalidParameter { name, value: bad });
            }
        }
        if let Some(&bad) = last_decay.iter().find(|t| !(t.is_finite() && **t >= 0.0)) {
            return Err(BanditError::InvalidTime { time: bad });
        }
        Ok(Self {
            alpha,
            beta,
            last_decay,
        })
    }

    pub fn n_arms(&self) -> usize {
        self.alpha.len()
    }

    pub fn alpha(&self) -> &[f64] {
        &self.alpha
    }

    pub fn beta(&self) -> &[f64] {
        &self.beta
    }

    pub fn last_decay(&self) -> &[f64] {
        &self.last_decay
    }

    /// Posterior mean `(1 + alpha) / (2 + alpha + beta)` of one arm.
    pub fn expected_value(&self, arm: usize) -> Option<f64> {
        let a = *self.alpha.get(arm)?;
        let b = *self.beta.get(arm)?;
        Some((1.0 + a) / (2.0 + a + b))
    }

    /// Total (decayed) evidence `alpha + beta` of one arm.
    pub fn evidence(&self, arm: usize) -> Option<f64> {
        Some(self.alpha.get(arm)? + self.beta.get(arm)?)
    }

    /// Check that all three arrays have exactly `n_arms` entries.
    pub fn validate(&self, n_arms: usize) -> Result<()> {
        for (what, got) in [
            ("alpha", self.alpha.len()),
            ("beta", self.beta.len()),
            ("last_decay", self.last_decay.len()),
        ] {
            if got != n_arms {
                return Err(BanditError::ShapeMismatch {
                    what,
                    expected: n_arms,
                    got,
                });
            }
        }
        Ok(())
    }

    pub(crate) fn check_arm(&self, arm: usize) -> Result<()> {
        if arm >= self.n_arms() {
            return Err(BanditError::IndexOutOfRange {
                index: arm,
                n_arms: self.n_arms(),
            });
        }
        Ok(())
    }
}
