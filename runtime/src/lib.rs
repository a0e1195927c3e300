//! # Metrotik Runtime
//!
//! Runtime implementation for Metrotik reducers.
//!
//! This crate provides the [`Store`], which owns a feature's state and drives
//! its reducer:
//!
//! - **Store**: Holds state, reducer, environment and subscribers
//! - **Effect Executor**: Interprets effect descriptions in order
//! - **Feedback Loop**: `action → reducer → effects → action`, bounded per send
//!
//! The store is synchronous. [`Store::send`] returns only once the action and
//! every action it fed back have been reduced, and every published action
//! has been delivered to every subscriber.
//!
//! ## Example
//!
//! ```ignore
//! use metrotik_runtime::Store;
//!
//! let mut store = Store::new(initial_state, my_reducer, environment);
//!
//! store.subscribe(|action| println!("published: {action:?}"));
//! store.send(Action::DoSomething)?;
//!
//! let value = store.state(|s| s.some_field);
//! ```

use metrotik_core::{
    effect::Effect,
    listeners::{Listeners, SubscriberId},
    reducer::Reducer,
};
use std::collections::VecDeque;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// A single send fed back more actions than the store allows
        ///
        /// Actions reduced before the limit was hit keep their state changes.
        /// This almost always means two actions keep sending each other.
        #[error("Action budget of {budget} exhausted while processing a single send")]
        ActionBudgetExhausted {
            /// The configured maximum number of reductions per send
            budget: usize,
        },
    }
}

pub use error::StoreError;

/// Store configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Maximum number of reductions (the initial action plus feedback) per send
    pub action_budget: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { action_budget: 64 }
    }
}

/// Summary of what a single [`Store::send`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SendReport {
    /// Number of actions passed through the reducer
    pub reduced: usize,
    /// Number of actions delivered to subscribers
    pub published: usize,
}

/// The Store - runtime coordinator for a reducer
///
/// # Type Parameters
///
/// - `S`: State type
/// - `A`: Action type
/// - `E`: Environment type
/// - `R`: Reducer implementation
pub struct Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    state: S,
    reducer: R,
    environment: E,
    config: StoreConfig,
    subscribers: Listeners<A>,
}

impl<S, A, E, R> Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Create a new store with initial state, reducer, and environment
    #[must_use]
    pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
        Self::with_config(initial_state, reducer, environment, StoreConfig::default())
    }

    /// Create a new store with an explicit configuration
    #[must_use]
    pub fn with_config(initial_state: S, reducer: R, environment: E, config: StoreConfig) -> Self {
        Self {
            state: initial_state,
            reducer,
            environment,
            config,
            subscribers: Listeners::new(),
        }
    }

    /// Send an action to the store
    ///
    /// 1. Calls the reducer with (state, action, environment)
    /// 2. Executes the returned effects in order
    /// 3. Reduces any actions the effects fed back, breadth first
    ///
    /// Published actions reach subscribers before the next fed-back action
    /// is reduced.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ActionBudgetExhausted`] if the feedback loop
    /// exceeds [`StoreConfig::action_budget`] reductions.
    #[tracing::instrument(skip(self, action), name = "store_send")]
    pub fn send(&mut self, action: A) -> Result<SendReport, StoreError> {
        let mut report = SendReport::default();
        let mut pending = VecDeque::from([action]);

        while let Some(next) = pending.pop_front() {
            if report.reduced >= self.config.action_budget {
                tracing::warn!(budget = self.config.action_budget, "Action budget exhausted");
                return Err(StoreError::ActionBudgetExhausted {
                    budget: self.config.action_budget,
                });
            }

            let effects = self.reducer.reduce(&mut self.state, next, &self.environment);
            report.reduced += 1;
            metrics::counter!("store.actions.total").increment(1);
            tracing::trace!("Reducer completed, returned {} effects", effects.len());

            for effect in effects {
                self.execute_effect(effect, &mut pending, &mut report);
            }
        }

        tracing::debug!(
            reduced = report.reduced,
            published = report.published,
            "Action processing completed"
        );
        Ok(report)
    }

    fn execute_effect(
        &mut self,
        effect: Effect<A>,
        pending: &mut VecDeque<A>,
        report: &mut SendReport,
    ) {
        match effect {
            Effect::None => {},
            Effect::Sequential(effects) => {
                for effect in effects {
                    self.execute_effect(effect, pending, report);
                }
            },
            Effect::Send(action) => pending.push_back(action),
            Effect::Publish(action) => {
                self.subscribers.notify(&action);
                report.published += 1;
                metrics::counter!("store.published.total").increment(1);
            },
        }
    }

    /// Subscribe to every action published by the reducer
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriberId
    where
        F: FnMut(&A) + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    /// Remove a subscriber
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Number of registered subscribers
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Read current state via a closure
    ///
    /// ```ignore
    /// let funds = store.state(|s| s.funds);
    /// ```
    pub fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        f(&self.state)
    }

    /// The injected environment
    #[must_use]
    pub const fn environment(&self) -> &E {
        &self.environment
    }
}

impl<S, A, E, R> std::fmt::Debug for Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
    S: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrotik_core::{smallvec, SmallVec};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct GateState {
        opened: u32,
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    enum GateAction {
        Open,
        OpenTwice,
        Opened(u32),
        PingPong,
    }

    struct GateReducer;

    impl Reducer for GateReducer {
        type State = GateState;
        type Action = GateAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut GateState,
            action: GateAction,
            _env: &(),
        ) -> SmallVec<[Effect<GateAction>; 4]> {
            match action {
                GateAction::Open => {
                    state.opened += 1;
                    smallvec![Effect::Publish(GateAction::Opened(state.opened))]
                },
                GateAction::OpenTwice => smallvec![Effect::chain(vec![
                    Effect::Send(GateAction::Open),
                    Effect::Send(GateAction::Open),
                ])],
                GateAction::Opened(_) => SmallVec::new(),
                GateAction::PingPong => smallvec![Effect::Send(GateAction::PingPong)],
            }
        }
    }

    fn recording_store() -> (Store<GateState, GateAction, (), GateReducer>, Rc<RefCell<Vec<GateAction>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut store = Store::new(GateState::default(), GateReducer, ());
        let sink = Rc::clone(&seen);
        store.subscribe(move |action| sink.borrow_mut().push(action.clone()));
        (store, seen)
    }

    #[test]
    fn test_send_reduces_and_publishes() {
        let (mut store, seen) = recording_store();

        let report = store.send(GateAction::Open);

        assert_eq!(report, Ok(SendReport { reduced: 1, published: 1 }));
        assert_eq!(store.state(|s| s.opened), 1);
        assert_eq!(*seen.borrow(), vec![GateAction::Opened(1)]);
    }

    #[test]
    fn test_feedback_actions_are_reduced_in_order() {
        let (mut store, seen) = recording_store();

        let report = store.send(GateAction::OpenTwice);

        assert_eq!(report, Ok(SendReport { reduced: 3, published: 2 }));
        assert_eq!(*seen.borrow(), vec![GateAction::Opened(1), GateAction::Opened(2)]);
    }

    #[test]
    fn test_action_budget_stops_feedback_loops() {
        let mut store = Store::with_config(
            GateState::default(),
            GateReducer,
            (),
            StoreConfig { action_budget: 5 },
        );

        assert_eq!(
            store.send(GateAction::PingPong),
            Err(StoreError::ActionBudgetExhausted { budget: 5 })
        );
    }

    #[test]
    fn test_unsubscribed_callbacks_are_not_called() {
        let (mut store, seen) = recording_store();
        let extra = store.subscribe(|_| {});
        assert_eq!(store.subscriber_count(), 2);
        assert!(store.unsubscribe(extra));

        let _ = store.send(GateAction::Open);
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(store.subscriber_count(), 1);
    }
}
