//! Property tests for the invariants every reachable state must satisfy.
//!
//! 1. **Non-negativity**: `alpha`/`beta` stay `>= 0` under any sequence of
//!    updates and samples with non-decreasing time.
//! 2. **Bounded action**: `sample` always returns an index in `0..n_arms`.
//! 3. **Disabled decay**: with rate `0`, decay only moves the clock.
//! 4. **Idempotent decay**: decaying twice to the same time changes nothing.
//! 5. **Clock**: after `sample`, every arm's `last_decay` equals the sample time.

use decaying_thompson::{
    decay_all, decay_one, BackwardTimePolicy, BanditState, ContextualThompson,
    ContextualThompsonConfig, Decay, KeyStream,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Step {
    Update { arm: usize, succ: u64, fail: u64, dt: f64 },
    Sample { dt: f64 },
}

fn arb_step(n_arms: usize) -> impl Strategy<Value = Step> {
    prop_oneof![
        (0..n_arms, 0u64..50, 0u64..50, 0.0f64..5.0)
            .prop_map(|(arm, succ, fail, dt)| Step::Update { arm, succ, fail, dt }),
        (0.0f64..5.0).prop_map(|dt| Step::Sample { dt }),
    ]
}

fn arb_run() -> impl Strategy<Value = (Vec<f64>, f64, Vec<Step>)> {
    (1usize..6).prop_flat_map(|n| {
        (
            prop::collection::vec(-2.0f64..2.0, n),
            0.0f64..3.0,
            prop::collection::vec(arb_step(n), 0..60),
        )
    })
}

fn arb_state() -> impl Strategy<Value = BanditState> {
    (1usize..8).prop_flat_map(|n| {
        (
            prop::collection::vec(0.0f64..100.0, n),
            prop::collection::vec(0.0f64..100.0, n),
            prop::collection::vec(0.0f64..10.0, n),
        )
            .prop_map(|(a, b, t)| BanditState::from_parts(a, b, t).unwrap())
    })
}

proptest! {
    #[test]
    fn evidence_stays_non_negative_and_actions_in_range(
        (context, rate, steps) in arb_run(),
        seed in any::<u64>(),
    ) {
        let n = context.len();
        let ts = ContextualThompson::new(
            context,
            ContextualThompsonConfig { decay: rate, backward_time: BackwardTimePolicy::Reject },
        ).unwrap();
        let mut keys = KeyStream::new(seed);
        let mut state = ts.init();
        let mut time = 0.0;

        for step in steps {
            match step {
                Step::Update { arm, succ, fail, dt } => {
                    time += dt;
                    state = ts.update(state, keys.next_key(), arm, succ, fail, time).unwrap();
                    prop_assert_eq!(state.last_decay()[arm], time);
                }
                Step::Sample { dt } => {
                    time += dt;
                    let (next, arm) = ts.sample(state, keys.next_key(), time).unwrap();
                    prop_assert!(arm < n);
                    prop_assert!(next.last_decay().iter().all(|&t| t == time));
                    state = next;
                }
            }
            prop_assert_eq!(state.n_arms(), n);
            for i in 0..n {
                prop_assert!(state.alpha()[i] >= 0.0, "alpha[{}]={}", i, state.alpha()[i]);
                prop_assert!(state.beta()[i] >= 0.0, "beta[{}]={}", i, state.beta()[i]);
            }
        }
    }

    #[test]
    fn disabled_decay_is_identity_on_beliefs(state in arb_state(), dt in 0.0f64..1.0e6) {
        let time = state.last_decay().iter().copied().fold(0.0, f64::max) + dt;
        let out = decay_all(state.clone(), time, &Decay::disabled());
        prop_assert_eq!(out.alpha(), state.alpha());
        prop_assert_eq!(out.beta(), state.beta());

        let one = decay_one(state.clone(), 0, time, &Decay::disabled());
        prop_assert_eq!(one.alpha(), state.alpha());
        prop_assert_eq!(one.last_decay()[0], time);
    }

    #[test]
    fn decay_all_twice_at_same_time_is_noop(
        state in arb_state(),
        rate in 0.0f64..5.0,
        dt in 0.0f64..20.0,
    ) {
        let d = Decay::new(rate, BackwardTimePolicy::Reject).unwrap();
        let time = state.last_decay().iter().copied().fold(0.0, f64::max) + dt;
        let once = decay_all(state, time, &d);
        let twice = decay_all(once.clone(), time, &d);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn forward_decay_never_grows_evidence(
        state in arb_state(),
        rate in 0.0f64..5.0,
        dt in 0.0f64..20.0,
    ) {
        let d = Decay::new(rate, BackwardTimePolicy::Amplify).unwrap();
        let time = state.last_decay().iter().copied().fold(0.0, f64::max) + dt;
        let out = decay_all(state.clone(), time, &d);
        for i in 0..state.n_arms() {
            prop_assert!(out.alpha()[i] <= state.alpha()[i]);
            prop_assert!(out.beta()[i] <= state.beta()[i]);
        }
    }

    #[test]
    fn sample_is_a_function_of_state_and_key(
        state in arb_state(),
        seed in any::<u64>(),
    ) {
        let n = state.n_arms();
        let context = vec![1.0; n];
        let time = state.last_decay().iter().copied().fold(0.0, f64::max);
        let (s1, a1) = decaying_thompson::sample(
            state.clone(), decaying_thompson::RngKey::new(seed), time, &context, &Decay::disabled(),
        ).unwrap();
        let (s2, a2) = decaying_thompson::sample(
            state, decaying_thompson::RngKey::new(seed), time, &context, &Decay::disabled(),
        ).unwrap();
        prop_assert_eq!(a1, a2);
        prop_assert_eq!(s1, s2);
    }
}
