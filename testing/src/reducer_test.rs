//! Given-When-Then harness for reducers.
//!
//! A test names a starting state, one or more actions reduced in order,
//! and assertions about where the state ended up and what the last action
//! asked the store to do. Effects are inspected, never executed; use
//! [`crate::effects::run_effects`] when a test needs their output.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use agriguard_core::{effect::Effect, reducer::Reducer};

type StateCheck<S> = Box<dyn FnOnce(&S)>;
type EffectCheck<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent reducer test.
///
/// # Example
///
/// ```ignore
/// use agriguard_testing::{assertions, ReducerTest};
///
/// ReducerTest::new(IdentityReducer::new())
///     .with_env(test_environment())
///     .given_state(pending_state())
///     .when_action(AuthAction::SkipLinking)
///     .then_state(|state| assert_eq!(state.status(), AuthStatus::GuestAuthenticated))
///     .then_effects(|effects| assertions::assert_no_effects(effects))
///     .run();
/// ```
pub struct ReducerTest<R>
where
    R: Reducer,
{
    reducer: R,
    environment: Option<R::Environment>,
    state: Option<R::State>,
    actions: Vec<R::Action>,
    state_checks: Vec<StateCheck<R::State>>,
    effect_checks: Vec<EffectCheck<R::Action>>,
}

impl<R> ReducerTest<R>
where
    R: Reducer,
{
    /// Start a test for `reducer`.
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            state: None,
            actions: Vec::new(),
            state_checks: Vec::new(),
            effect_checks: Vec::new(),
        }
    }

    /// Environment the reducer sees.
    #[must_use]
    pub fn with_env(mut self, env: R::Environment) -> Self {
        self.environment = Some(env);
        self
    }

    /// Starting state.
    #[must_use]
    pub fn given_state(mut self, state: R::State) -> Self {
        self.state = Some(state);
        self
    }

    /// Queue one action.
    #[must_use]
    pub fn when_action(mut self, action: R::Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Queue several actions, reduced back to back with no effect run in
    /// between.
    #[must_use]
    pub fn when_actions<I>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = R::Action>,
    {
        self.actions.extend(actions);
        self
    }

    /// Check the state after the last action.
    #[must_use]
    pub fn then_state<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&R::State) + 'static,
    {
        self.state_checks.push(Box::new(check));
        self
    }

    /// Check the effects returned by the last action.
    #[must_use]
    pub fn then_effects<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&[Effect<R::Action>]) + 'static,
    {
        self.effect_checks.push(Box::new(check));
        self
    }

    /// Reduce the queued actions, run the checks and hand back the final
    /// state for further inspection.
    ///
    /// # Panics
    ///
    /// Panics when the state, environment or at least one action is
    /// missing, or when a check fails.
    #[allow(clippy::panic)] // Test harness
    pub fn run(self) -> R::State {
        let Some(mut state) = self.state else {
            panic!("ReducerTest needs a starting state: call given_state()");
        };
        let Some(env) = self.environment else {
            panic!("ReducerTest needs an environment: call with_env()");
        };
        assert!(
            !self.actions.is_empty(),
            "ReducerTest needs at least one action: call when_action()"
        );

        let mut effects = Vec::new();
        for action in self.actions {
            effects = self.reducer.reduce(&mut state, action, &env).into_vec();
        }

        for check in self.state_checks {
            check(&state);
        }
        for check in self.effect_checks {
            check(&effects);
        }
        state
    }
}

/// Checks over returned effects.
pub mod assertions {
    use agriguard_core::effect::Effect;

    /// Nothing for the store to do: every effect is `None` or an empty
    /// combinator.
    ///
    /// # Panics
    ///
    /// Panics if any effect would do work.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_none),
            "expected no work, got {effects:?}"
        );
    }

    /// At least one top-level effect is an async `Future`.
    ///
    /// # Panics
    ///
    /// Panics if there is none.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_future_effect<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Future(_))),
            "expected an async effect, got {effects:?}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agriguard_core::{smallvec, SmallVec};

    /// A token slot: set, cleared, or refreshed through an async effect.
    #[derive(Clone, Debug, PartialEq)]
    enum SlotAction {
        Set(&'static str),
        Clear,
        Refresh,
    }

    struct SlotReducer;

    impl Reducer for SlotReducer {
        type State = Option<&'static str>;
        type Action = SlotAction;
        type Environment = &'static str;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            refreshed: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                SlotAction::Set(token) => {
                    *state = Some(token);
                    smallvec![Effect::None]
                },
                SlotAction::Clear => {
                    *state = None;
                    smallvec![Effect::merge(vec![Effect::None])]
                },
                SlotAction::Refresh if state.is_some() => {
                    let token = *refreshed;
                    smallvec![Effect::future(async move { Some(SlotAction::Set(token)) })]
                },
                SlotAction::Refresh => smallvec![Effect::None],
            }
        }
    }

    #[test]
    fn single_action() {
        let state = ReducerTest::new(SlotReducer)
            .with_env("tok-2")
            .given_state(None)
            .when_action(SlotAction::Set("tok-1"))
            .then_state(|state| assert_eq!(*state, Some("tok-1")))
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();

        assert_eq!(state, Some("tok-1"));
    }

    #[test]
    fn actions_reduce_in_order() {
        ReducerTest::new(SlotReducer)
            .with_env("tok-2")
            .given_state(Some("tok-1"))
            .when_actions([SlotAction::Clear, SlotAction::Set("tok-3")])
            .then_state(|state| assert_eq!(*state, Some("tok-3")))
            .run();

        ReducerTest::new(SlotReducer)
            .with_env("tok-2")
            .given_state(Some("tok-1"))
            .when_actions([SlotAction::Set("tok-3"), SlotAction::Clear])
            .then_state(|state| assert_eq!(*state, None))
            .run();
    }

    #[test]
    fn effects_come_from_the_last_action() {
        ReducerTest::new(SlotReducer)
            .with_env("tok-2")
            .given_state(None)
            .when_action(SlotAction::Set("tok-1"))
            .when_action(SlotAction::Refresh)
            .then_effects(|effects| assertions::assert_has_future_effect(effects))
            .run();

        ReducerTest::new(SlotReducer)
            .with_env("tok-2")
            .given_state(Some("tok-1"))
            .when_actions([SlotAction::Refresh, SlotAction::Clear])
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    #[should_panic(expected = "at least one action")]
    fn missing_action_panics() {
        let _ = ReducerTest::new(SlotReducer)
            .with_env("tok-2")
            .given_state(None)
            .run();
    }

    #[test]
    #[should_panic(expected = "expected an async effect")]
    fn future_check_rejects_plain_effects() {
        assertions::assert_has_future_effect::<SlotAction>(&[Effect::None, Effect::merge(vec![])]);
    }
}
