//! # Metrotik Core
//!
//! Core traits and types for the Metrotik ticketing simulation.
//!
//! This crate provides the small set of abstractions every feature crate is
//! built on:
//!
//! - **State**: Domain state for a feature (owned, cloneable data)
//! - **Action**: All possible inputs to a reducer (commands and events)
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Descriptions of follow-up work, executed by the runtime
//! - **Environment**: Injected dependencies, such as the [`environment::Clock`]
//! - **Listeners**: Synchronous observer registries keyed by subscriber identity
//!
//! Everything here is single-threaded and synchronous. A reducer runs to
//! completion, then the runtime drains the effects it returned before the next
//! action is accepted.
//!
//! ## Example
//!
//! ```
//! use metrotik_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Clone, Debug, Default)]
//! struct TurnstileState {
//!     passes: u32,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum TurnstileAction {
//!     Pass,
//!     Passed { total: u32 },
//! }
//!
//! struct TurnstileReducer;
//!
//! impl Reducer for TurnstileReducer {
//!     type State = TurnstileState;
//!     type Action = TurnstileAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut TurnstileState,
//!         action: TurnstileAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<TurnstileAction>; 4]> {
//!         match action {
//!             TurnstileAction::Pass => {
//!                 state.passes += 1;
//!                 smallvec![Effect::Publish(TurnstileAction::Passed { total: state.passes })]
//!             }
//!             TurnstileAction::Passed { .. } => SmallVec::new(),
//!         }
//!     }
//! }
//!
//! let mut state = TurnstileState::default();
//! let effects = TurnstileReducer.reduce(&mut state, TurnstileAction::Pass, &());
//! assert_eq!(state.passes, 1);
//! assert_eq!(effects.len(), 1);
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use smallvec::{smallvec, SmallVec};

pub mod listeners;

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all business logic and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Validates the action against the current state
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed
        ///
        /// Most actions produce zero to two effects, so the result is
        /// stack-allocated for up to four.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe what should happen after a reducer returns. They are
/// values, not execution: the runtime interprets them in order.
pub mod effect {
    /// Effect type - describes follow-up work to be executed by the runtime
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects carry (feedback loop)
    #[derive(Clone, PartialEq, Eq)]
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects one after another, in order
        Sequential(Vec<Effect<Action>>),

        /// Feed an action back into the reducer once the current one returns
        Send(Action),

        /// Deliver an action to every subscriber without reducing it
        ///
        /// This is how reducers announce events to observers.
        Publish(Action),
    }

    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Send(action) => f.debug_tuple("Effect::Send").field(action).finish(),
                Effect::Publish(action) => {
                    f.debug_tuple("Effect::Publish").field(action).finish()
                },
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Returns true if this effect does nothing
        #[must_use]
        pub fn is_none(&self) -> bool {
            match self {
                Effect::None => true,
                Effect::Sequential(effects) => effects.iter().all(Effect::is_none),
                Effect::Send(_) | Effect::Publish(_) => false,
            }
        }

        /// Collect every published action, in execution order
        #[must_use]
        pub fn published(&self) -> Vec<&Action> {
            let mut out = Vec::new();
            self.collect_published(&mut out);
            out
        }

        fn collect_published<'a>(&'a self, out: &mut Vec<&'a Action>) {
            match self {
                Effect::Publish(action) => out.push(action),
                Effect::Sequential(effects) => {
                    for effect in effects {
                        effect.collect_published(out);
                    }
                },
                Effect::None | Effect::Send(_) => {},
            }
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// Implementations must return the time at the moment of the call; callers
    /// rely on reading it fresh for every validity check.
    pub trait Clock {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system wall clock
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
        fn now(&self) -> DateTime<Utc> {
            (**self).now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::effect::Effect;
    use super::environment::{Clock, SystemClock};

    #[test]
    fn test_effect_is_none() {
        assert!(Effect::<u8>::None.is_none());
        assert!(Effect::<u8>::chain(vec![Effect::None, Effect::None]).is_none());
        assert!(!Effect::Publish(1u8).is_none());
        assert!(!Effect::chain(vec![Effect::None, Effect::Send(2u8)]).is_none());
    }

    #[test]
    fn test_published_preserves_order() {
        let effect = Effect::chain(vec![
            Effect::Publish(1u8),
            Effect::Send(2),
            Effect::chain(vec![Effect::Publish(3), Effect::None]),
            Effect::Publish(4),
        ]);

        assert_eq!(effect.published(), vec![&1, &3, &4]);
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
