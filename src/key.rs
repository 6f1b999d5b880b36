//! Single-use random keys.
//!
//! A [`RngKey`] is neither `Clone` nor `Copy`: passing it to
//! [`sample`](crate::sample) moves it, so the same key cannot seed two
//! draws. Fresh keys come from [`RngKey::split`] or a [`KeyStream`].
//!
//! Derivation uses SplitMix64 mixing. It is not cryptographic; it only has
//! to give well-spread, reproducible seeds.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// One-shot seed for a stochastic operation.
#[derive(Debug, PartialEq, Eq)]
pub struct RngKey(u64);

impl RngKey {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Consume this key, returning two keys independent of it and of each other.
    #[must_use]
    pub fn split(self) -> (RngKey, RngKey) {
        let a = splitmix64(self.0);
        let b = splitmix64(a ^ 0xD1B5_4A32_D192_ED03);
        (RngKey(a), RngKey(b))
    }

    /// Consume this key, returning `n` fresh keys.
    #[must_use]
    pub fn split_n(self, n: usize) -> Vec<RngKey> {
        let mut out = Vec::with_capacity(n);
        let mut h = self.0;
        for _ in 0..n {
            h = splitmix64(h);
            out.push(RngKey(h));
        }
        out
    }

    /// Turn the key into a seeded generator. This is the only way to draw from it.
    pub fn into_rng(self) -> StdRng {
        StdRng::seed_from_u64(self.0)
    }
}

/// Counter-based key generator: each call yields a key never handed out before.
#[derive(Debug, Clone)]
pub struct KeyStream {
    seed: u64,
    counter: u64,
}

impl KeyStream {
    pub fn new(seed: u64) -> Self {
        Self { seed, counter: 0 }
    }

    /// Number of keys handed out so far.
    pub fn issued(&self) -> u64 {
        self.counter
    }

    pub fn next_key(&mut self) -> RngKey {
        let k = splitmix64(self.seed ^ splitmix64(self.counter));
        self.counter = self.counter.wrapping_add(1);
        RngKey(k)
    }
}

impl Iterator for KeyStream {
    type Item = RngKey;

    fn next(&mut self) -> Option<RngKey> {
        Some(self.next_key())
    }
}

#[inline]
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
