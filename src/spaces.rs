//! Input/output schemas and the untyped values that travel through them.
//!
//! A controller that routes observations generically (rather than calling the
//! typed `update`/`sample`) describes them with [`Space`] and carries them as
//! an [`Observation`] map. Agents publish the spaces they expect so a
//! surrounding framework can check compatibility before wiring things up.

use std::collections::BTreeMap;

use crate::error::{BanditError, Result};

/// Element type of a [`Space::Box`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NumKind {
    Int,
    Float,
}

/// Shape and range of an input or output.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Space {
    /// Integers `0..n`.
    Discrete(usize),
    /// `shape` numbers, each in `[low, high]`.
    Box {
        low: f64,
        high: f64,
        shape: usize,
        kind: NumKind,
    },
    /// Named sub-spaces.
    Dict(BTreeMap<String, Space>),
}

/// A single untyped observation value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Int(i64),
    Float(f64),
    Array(Vec<f64>),
    Dict(BTreeMap<String, Value>),
}

/// Named values supplied to an agent for one call.
pub type Observation = BTreeMap<String, Value>;

impl Value {
    /// The value as one number: ints, floats, and single-element arrays.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(x) => Some(*x),
            Value::Array(xs) if xs.len() == 1 => Some(xs[0]),
            _ => None,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Array(_) => "array",
            Value::Dict(_) => "dict",
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<Vec<f64>> for Value {
    fn from(xs: Vec<f64>) -> Self {
        Value::Array(xs)
    }
}

impl Space {
    pub fn float_box(low: f64, high: f64, shape: usize) -> Self {
        Space::Box {
            low,
            high,
            shape,
            kind: NumKind::Float,
        }
    }

    pub fn int_box(low: f64, high: f64, shape: usize) -> Self {
        Space::Box {
            low,
            high,
            shape,
            kind: NumKind::Int,
        }
    }

    pub fn dict<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Space)>,
    {
        Space::Dict(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    /// Whether `value` is a member of this space.
    pub fn contains(&self, value: &Value) -> bool {
        match (self, value) {
            (Space::Discrete(n), Value::Int(i)) => *i >= 0 && (*i as u64) < *n as u64,
            (
                Space::Box {
                    low,
                    high,
                    shape,
                    kind,
                },
                v,
            ) => {
                let elems: Vec<f64> = match v {
                    Value::Int(i) => vec![*i as f64],
                    Value::Float(x) => vec![*x],
                    Value::Array(xs) => xs.clone(),
                    _ => return false,
                };
                elems.len() == *shape
                    && elems.iter().all(|x| {
                        !x.is_nan()
                            && x >= low
                            && x <= high
                            && (*kind == NumKind::Float || x.fract() == 0.0)
                    })
            }
            (Space::Dict(spaces), Value::Dict(values)) => spaces
                .iter()
                .all(|(k, s)| values.get(k).is_some_and(|v| s.contains(v))),
            _ => false,
        }
    }

    /// Whether everything produced under `self` is acceptable input for `required`.
    ///
    /// Dict spaces only need to cover the keys `required` names; extra keys
    /// on the producing side are ignored.
    pub fn is_compatible(&self, required: &Space) -> bool {
        match (self, required) {
            (Space::Discrete(a), Space::Discrete(b)) => a <= b,
            (
                Space::Discrete(n),
                Space::Box {
                    low, high, shape, ..
                },
            ) => *shape == 1 && *low <= 0.0 && (*n as f64 - 1.0) <= *high,
            (
                Space::Box {
                    low: l1,
                    high: h1,
                    shape: s1,
                    kind: k1,
                },
                Space::Box {
                    low: l2,
                    high: h2,
                    shape: s2,
                    kind: k2,
                },
            ) => {
                s1 == s2
                    && l1 >= l2
                    && h1 <= h2
                    && !(*k1 == NumKind::Float && *k2 == NumKind::Int)
            }
            (Space::Dict(have), Space::Dict(need)) => need
                .iter()
                .all(|(k, s)| have.get(k).is_some_and(|h| h.is_compatible(s))),
            _ => false,
        }
    }
}

fn field<'a>(obs: &'a Observation, name: &str) -> Result<&'a Value> {
    obs.get(name).ok_or_else(|| BanditError::MissingField {
        field: name.to_string(),
    })
}

fn expect_scalar(value: &Value, name: &str) -> Result<f64> {
    value
        .as_scalar()
        .ok_or_else(|| BanditError::InvalidObservation {
            field: name.to_string(),
            reason: format!("expected a number, got {}", value.kind_name()),
        })
}

/// Read an arm index in `0..n_arms`.
pub(crate) fn read_action(obs: &Observation, name: &str, n_arms: usize) -> Result<usize> {
    let v = field(obs, name)?;
    let Value::Int(i) = v else {
        return Err(BanditError::InvalidObservation {
            field: name.to_string(),
            reason: format!("expected an int, got {}", v.kind_name()),
        });
    };
    let index = usize::try_from(*i).map_err(|_| BanditError::InvalidObservation {
        field: name.to_string(),
        reason: format!("negative arm index {i}"),
    })?;
    if index >= n_arms {
        return Err(BanditError::IndexOutOfRange { index, n_arms });
    }
    Ok(index)
}

/// Read a non-negative integral count that fits in a `u64`.
pub(crate) fn read_count(obs: &Observation, name: &'static str) -> Result<u64> {
    let x = expect_scalar(field(obs, name)?, name)?;
    // `u64::MAX as f64` rounds up to 2^64, which itself does not fit.
    if !(x.is_finite() && x >= 0.0 && x.fract() == 0.0 && x < u64::MAX as f64) {
        return Err(BanditError::InvalidCount {
            field: name,
            value: x,
        });
    }
    Ok(x as u64)
}

/// Read a finite, non-negative time.
pub(crate) fn read_time(obs: &Observation, name: &str) -> Result<f64> {
    let t = expect_scalar(field(obs, name)?, name)?;
    crate::thompson::check_time(t)?;
    Ok(t)
}

/// Read any finite number.
pub(crate) fn read_scalar(obs: &Observation, name: &str) -> Result<f64> {
    let x = expect_scalar(field(obs, name)?, name)?;
    if !x.is_finite() {
        return Err(BanditError::InvalidObservation {
            field: name.to_string(),
            reason: format!("non-finite value {x}"),
        });
    }
    Ok(x)
}
