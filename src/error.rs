//! Error type shared by every boundary operation.
//!
//! All variants are precondition violations: they are detected before any
//! state is touched, so a returned error never comes with a half-updated
//! state.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, BanditError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BanditError {
    /// An array did not have the length the instance was built for.
    #[error("shape mismatch for {what}: expected {expected}, got {got}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("arm index {index} out of range for {n_arms} arms")]
    IndexOutOfRange { index: usize, n_arms: usize },

    /// A success/failure count was negative or not an integer.
    #[error("invalid count for `{field}`: {value}")]
    InvalidCount { field: &'static str, value: f64 },

    #[error("invalid time {time}: must be finite and non-negative")]
    InvalidTime { time: f64 },

    /// `time` is earlier than the arm's last decay and the policy rejects it.
    #[error("time {time} is earlier than last decay {last_decay} of arm {arm}")]
    BackwardTime {
        arm: usize,
        last_decay: f64,
        time: f64,
    },

    /// Amplified evidence of `arm` would no longer be a finite pseudo-count.
    #[error("amplifying arm {arm} by {factor} overflows its evidence")]
    EvidenceOverflow { arm: usize, factor: f64 },

    #[error("invalid parameter `{name}`: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("observation is missing field `{field}`")]
    MissingField { field: String },

    #[error("invalid observation field `{field}`: {reason}")]
    InvalidObservation { field: String, reason: String },

    #[error("no log sink named `{0}`")]
    UnknownSource(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_values() {
        let e = BanditError::IndexOutOfRange {
            index: 5,
            n_arms: 3,
        };
        assert_eq!(e.to_string(), "arm index 5 out of range for 3 arms");

        let e = BanditError::ShapeMismatch {
            what: "context",
            expected: 3,
            got: 2,
        };
        assert!(e.to_string().contains("context"));
    }
}
