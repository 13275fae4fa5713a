//! Ergonomic testing utilities for reducers
//!
//! A fluent Given-When-Then API. Several `when_action` calls replay the actions
//! in order against the same state; effect assertions see the effects of the
//! last action only, which is what a test of "the second submit is ignored"
//! needs to look at.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use horizon_core::{effect::Effect, reducer::Reducer};

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for effect assertion functions
type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// # Example
///
/// ```ignore
/// ReducerTest::new(PurchaseReducer::new())
///     .with_env(env)
///     .given_state(PurchaseState::new(event, tiers))
///     .when_action(PurchaseAction::Submit)
///     .when_action(PurchaseAction::Submit)
///     .then_state(|state| assert_eq!(state.attempt, 1))
///     .then_effects(assertions::assert_no_effects)
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    actions: Vec<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            actions: Vec::new(),
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Append an action to replay (When)
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    /// Append several actions to replay in order (When)
    #[must_use]
    pub fn when_actions(mut self, actions: impl IntoIterator<Item = A>) -> Self {
        self.actions.extend(actions);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the effects of the last action (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, environment or at least one action is missing,
    /// or if any assertion fails.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");
        let env = self
            .environment
            .expect("Environment must be set with with_env()");
        assert!(
            !self.actions.is_empty(),
            "At least one action must be set with when_action()"
        );

        let mut last_effects = Vec::new();
        for action in self.actions {
            last_effects = self.reducer.reduce(&mut state, action, &env).into_vec();
        }

        for assertion in self.state_assertions {
            assertion(&state);
        }
        for assertion in self.effect_assertions {
            assertion(&last_effects);
        }
    }
}

/// Helper assertions for effects
pub mod assertions {
    use horizon_core::effect::Effect;

    /// Assert that there are no effects (or only no-ops)
    ///
    /// # Panics
    ///
    /// Panics if any effect would do work.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_noop),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert that effects contain at least one Future effect
    ///
    /// # Panics
    ///
    /// Panics if no Future effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Future(_))),
            "Expected at least one Future effect, but none found"
        );
    }

    /// Assert that effects contain at least one Delay effect
    ///
    /// # Panics
    ///
    /// Panics if no Delay effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_delay_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Delay { .. })),
            "Expected at least one Delay effect, but none found"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_core::{SmallVec, effect::Effect, smallvec};
    use std::time::Duration;

    #[derive(Clone, Debug)]
    struct SeatState {
        held: u32,
    }

    #[derive(Clone, Debug)]
    enum SeatAction {
        Hold,
        HoldWithExpiry,
    }

    struct SeatReducer;

    impl Reducer for SeatReducer {
        type State = SeatState;
        type Action = SeatAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            state.held += 1;
            match action {
                SeatAction::Hold => smallvec![Effect::None],
                SeatAction::HoldWithExpiry => smallvec![Effect::Delay {
                    duration: Duration::from_secs(60),
                    action: Box::new(SeatAction::Hold),
                }],
            }
        }
    }

    #[test]
    fn replays_actions_in_order() {
        ReducerTest::new(SeatReducer)
            .with_env(())
            .given_state(SeatState { held: 0 })
            .when_actions([SeatAction::Hold, SeatAction::Hold, SeatAction::Hold])
            .then_state(|state| assert_eq!(state.held, 3))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn effect_assertions_see_last_action_only() {
        ReducerTest::new(SeatReducer)
            .with_env(())
            .given_state(SeatState { held: 0 })
            .when_action(SeatAction::HoldWithExpiry)
            .when_action(SeatAction::Hold)
            .then_effects(|effects| assertions::assert_effects_count(effects, 1))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn delay_assertion_finds_delay() {
        ReducerTest::new(SeatReducer)
            .with_env(())
            .given_state(SeatState { held: 0 })
            .when_action(SeatAction::HoldWithExpiry)
            .then_effects(assertions::assert_has_delay_effect)
            .run();
    }
}
