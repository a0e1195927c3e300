//! Given/When/Then harness for reducers.
//!
//! A scenario seeds a state, applies one action, and then checks what the
//! reducer left behind. Checks run in the order they were declared, state
//! and effect checks interleaved.

#![allow(clippy::module_name_repetitions)] // ReducerTest reads best at call sites

use metrotik_core::{effect::Effect, reducer::Reducer};

/// A deferred check against the outcome of one reduction
enum Check<S, A> {
    State(Box<dyn FnOnce(&S)>),
    Effects(Box<dyn FnOnce(&[Effect<A>])>),
}

/// One reducer scenario, built fluently and executed by [`ReducerTest::run`]
///
/// # Example
///
/// ```ignore
/// use metrotik_testing::{assertions, ReducerTest};
///
/// ReducerTest::new(AccountReducer::new())
///     .with_env(AccountEnvironment::new(Rc::new(test_clock())))
///     .given_state(AccountState::new(holder))
///     .when_action(AccountAction::CreditFunds { amount })
///     .then_state(|state| assert_eq!(state.funds, Money::from_dollars(10)))
///     .then_effects(|effects| assertions::assert_published_count(effects, 1))
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    env: Option<E>,
    given: Option<S>,
    when: Option<A>,
    checks: Vec<Check<S, A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Start a scenario for `reducer`
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            env: None,
            given: None,
            when: None,
            checks: Vec::new(),
        }
    }

    /// Environment the reducer sees
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.env = Some(env);
        self
    }

    /// State before the action
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.given = Some(state);
        self
    }

    /// The action under test
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.when = Some(action);
        self
    }

    /// Check the state after the action
    #[must_use]
    pub fn then_state<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.checks.push(Check::State(Box::new(check)));
        self
    }

    /// Check the effects the reducer returned
    #[must_use]
    pub fn then_effects<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.checks.push(Check::Effects(Box::new(check)));
        self
    }

    /// Reduce once and run every check
    ///
    /// # Panics
    ///
    /// Panics when the scenario is missing its state, action or environment,
    /// and whenever a check fails.
    #[allow(clippy::panic)] // Failing a scenario is a test failure
    pub fn run(self) {
        let Some(mut state) = self.given else {
            panic!("scenario has no state: call given_state()");
        };
        let Some(action) = self.when else {
            panic!("scenario has no action: call when_action()");
        };
        let Some(env) = self.env else {
            panic!("scenario has no environment: call with_env()");
        };

        let effects = self.reducer.reduce(&mut state, action, &env);

        for check in self.checks {
            match check {
                Check::State(check) => check(&state),
                Check::Effects(check) => check(&effects),
            }
        }
    }
}

/// Checks over the effects a reducer returned
pub mod assertions {
    use metrotik_core::effect::Effect;

    /// The reducer asked for nothing to happen
    ///
    /// `Effect::None` entries are allowed.
    ///
    /// # Panics
    ///
    /// Panics if any effect does something.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_none),
            "reducer returned work to do: {effects:?}"
        );
    }

    /// Exactly `expected` effects were returned, counting `Effect::None`
    ///
    /// # Panics
    ///
    /// Panics on any other count.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "wrong number of effects returned"
        );
    }

    /// Collect every action the effects publish, in execution order
    #[must_use]
    pub fn published<A>(effects: &[Effect<A>]) -> Vec<&A> {
        effects.iter().flat_map(Effect::published).collect()
    }

    /// Collect every action the effects feed back into the reducer
    #[must_use]
    pub fn sent<A>(effects: &[Effect<A>]) -> Vec<&A> {
        fn walk<'a, A>(effect: &'a Effect<A>, out: &mut Vec<&'a A>) {
            match effect {
                Effect::Send(action) => out.push(action),
                Effect::Sequential(effects) => {
                    for effect in effects {
                        walk(effect, out);
                    }
                },
                Effect::None | Effect::Publish(_) => {},
            }
        }

        let mut out = Vec::new();
        for effect in effects {
            walk(effect, &mut out);
        }
        out
    }

    /// Assert that exactly `expected` actions are published
    ///
    /// # Panics
    ///
    /// Panics if the number of published actions doesn't match.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_published_count<A: std::fmt::Debug>(effects: &[Effect<A>], expected: usize) {
        let actions = published(effects);
        assert_eq!(
            actions.len(),
            expected,
            "Expected {expected} published actions, but found {actions:?}"
        );
    }

    /// Assert that at least one action is fed back into the reducer
    ///
    /// # Panics
    ///
    /// Panics if no `Send` effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_send_effect<A>(effects: &[Effect<A>]) {
        assert!(
            !sent(effects).is_empty(),
            "Expected at least one Send effect, but none found"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrotik_core::{smallvec, SmallVec};

    #[derive(Clone, Debug)]
    struct TestState {
        count: i32,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum TestAction {
        Increment,
        Decrement,
        Changed(i32),
    }

    struct TestReducer;

    struct TestEnv;

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = TestEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TestAction::Increment => {
                    state.count += 1;
                    smallvec![Effect::Publish(TestAction::Changed(state.count))]
                },
                TestAction::Decrement => {
                    state.count -= 1;
                    smallvec![Effect::None]
                },
                TestAction::Changed(_) => smallvec![Effect::Send(TestAction::Decrement)],
            }
        }
    }

    #[test]
    fn test_reducer_test_increment() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 0 })
            .when_action(TestAction::Increment)
            .then_state(|state| {
                assert_eq!(state.count, 1);
            })
            .then_effects(|effects| {
                assertions::assert_published_count(effects, 1);
                assert_eq!(assertions::published(effects), vec![&TestAction::Changed(1)]);
            })
            .run();
    }

    #[test]
    fn test_reducer_test_decrement() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 5 })
            .when_action(TestAction::Decrement)
            .then_state(|state| {
                assert_eq!(state.count, 4);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_sent_effects() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 0 })
            .when_action(TestAction::Changed(3))
            .then_effects(|effects| {
                assertions::assert_has_send_effect(effects);
                assert_eq!(assertions::sent(effects), vec![&TestAction::Decrement]);
            })
            .run();
    }

    #[test]
    fn test_checks_run_in_declared_order() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let order = Rc::new(RefCell::new(Vec::new()));
        let (first, second, third) = (Rc::clone(&order), Rc::clone(&order), Rc::clone(&order));

        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 0 })
            .when_action(TestAction::Increment)
            .then_effects(move |_| first.borrow_mut().push("effects"))
            .then_state(move |_| second.borrow_mut().push("state"))
            .then_effects(move |_| third.borrow_mut().push("effects again"))
            .run();

        assert_eq!(*order.borrow(), vec!["effects", "state", "effects again"]);
    }

    #[test]
    #[should_panic(expected = "scenario has no action")]
    fn test_missing_action_fails_the_scenario() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 0 })
            .run();
    }

    #[test]
    fn test_assertions_effects_count() {
        assertions::assert_effects_count(&[Effect::<TestAction>::None], 1);
        assertions::assert_effects_count::<TestAction>(&[], 0);
    }
}
