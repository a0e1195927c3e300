//! Rider account aggregate.
//!
//! The account moves between three standings:
//!
//! | Standing      | credit                          | debit                                  | deactivate |
//! |---------------|---------------------------------|----------------------------------------|------------|
//! | Good Standing | add                             | subtract; below zero → In Debt         | → Deactivated |
//! | In Debt       | add; above zero → Good Standing | rejected                               | rejected |
//! | Deactivated   | rejected                        | subtract only if funds stay ≥ 0        | rejected |
//!
//! Every attempt, successful or not, publishes exactly one [`AccountEvent`]:
//! fund mutations as [`AccountAction::TransactionRecorded`], deactivation
//! outcomes as [`AccountAction::StandingChanged`]. A mutation that moves the
//! account between standings additionally publishes the transition.

use crate::error::Result;
use crate::types::{AccountHolder, FundMutation, Money, PurchaseRecord};
use chrono::{DateTime, Utc};
use metrotik_core::{
    effect::Effect, environment::Clock, listeners::SubscriberId, reducer::Reducer, smallvec,
    SmallVec,
};
use metrotik_runtime::Store;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// The three mutually exclusive account standings
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Standing {
    /// Funds may be added or spent, and the balance may go negative once
    #[default]
    GoodStanding,
    /// Balance went negative; only credits are accepted
    InDebt,
    /// Closed; remaining credit may be spent but nothing added
    Deactivated,
}

impl Standing {
    /// Display label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::GoodStanding => "Good Standing",
            Self::InDebt => "In Debt",
            Self::Deactivated => "Deactivated",
        }
    }
}

impl fmt::Display for Standing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of an attempted account operation, handed to observers
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountEvent {
    /// Originating account
    pub account_id: u32,
    /// Human-readable description
    pub message: String,
    /// Whether the operation went through
    pub success: bool,
    /// When it happened
    pub occurred_at: DateTime<Utc>,
}

/// Account state
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    /// Rider identity
    pub holder: AccountHolder,
    /// Current balance
    pub funds: Money,
    /// Current standing
    pub standing: Standing,
    /// Every ticket bought, oldest first
    pub purchase_history: Vec<PurchaseRecord>,
}

impl AccountState {
    /// A new account in good standing with no funds
    #[must_use]
    pub const fn new(holder: AccountHolder) -> Self {
        Self {
            holder,
            funds: Money::ZERO,
            standing: Standing::GoodStanding,
            purchase_history: Vec::new(),
        }
    }
}

/// Actions for the account (commands and events)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccountAction {
    // ========== Commands ==========
    /// Add funds
    CreditFunds {
        /// Amount to add
        amount: FundMutation,
    },
    /// Remove funds
    DebitFunds {
        /// Amount to remove
        amount: FundMutation,
    },
    /// Pay for a purchase; declined unless current funds cover it
    Charge {
        /// Price to pay
        amount: FundMutation,
    },
    /// Close the account
    Deactivate,
    /// Append a ticket to the purchase history
    RecordPurchase {
        /// The purchase
        record: PurchaseRecord,
    },

    // ========== Events ==========
    /// Outcome of a credit, debit or charge
    TransactionRecorded(AccountEvent),
    /// Outcome of a deactivation attempt, or a standing transition
    StandingChanged(AccountEvent),
}

/// Environment dependencies for the account reducer
#[derive(Clone)]
pub struct AccountEnvironment {
    /// Clock for stamping events
    pub clock: Rc<dyn Clock>,
}

impl AccountEnvironment {
    /// Creates a new `AccountEnvironment`
    #[must_use]
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self { clock }
    }
}

/// Reducer implementing the standing table
#[derive(Clone, Debug, Default)]
pub struct AccountReducer;

type Effects = SmallVec<[Effect<AccountAction>; 4]>;

impl AccountReducer {
    /// Creates a new `AccountReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn event(
        state: &AccountState,
        env: &AccountEnvironment,
        message: String,
        success: bool,
    ) -> AccountEvent {
        AccountEvent {
            account_id: state.holder.account_id,
            message,
            success,
            occurred_at: env.clock.now(),
        }
    }

    fn transaction(
        state: &AccountState,
        env: &AccountEnvironment,
        message: String,
        success: bool,
    ) -> Effect<AccountAction> {
        tracing::info!(standing = %state.standing, funds = %state.funds, success, "{message}");
        Effect::Publish(AccountAction::TransactionRecorded(Self::event(
            state, env, message, success,
        )))
    }

    fn transition(
        state: &mut AccountState,
        env: &AccountEnvironment,
        to: Standing,
    ) -> Effect<AccountAction> {
        let from = state.standing;
        state.standing = to;
        let message = format!("Account changed from: {from} to: {to}");
        tracing::info!(%from, %to, "Account standing changed");
        Effect::Publish(AccountAction::StandingChanged(Self::event(
            state, env, message, true,
        )))
    }

    fn standing_rejected(
        state: &AccountState,
        env: &AccountEnvironment,
        message: String,
    ) -> Effect<AccountAction> {
        tracing::info!(standing = %state.standing, "{message}");
        Effect::Publish(AccountAction::StandingChanged(Self::event(
            state, env, message, false,
        )))
    }

    fn credit(state: &mut AccountState, amount: Money, env: &AccountEnvironment) -> Effects {
        match state.standing {
            Standing::GoodStanding => {
                state.funds = state.funds + amount;
                smallvec![Self::transaction(
                    state,
                    env,
                    format!("Credit of: {amount} successful."),
                    true
                )]
            },
            Standing::InDebt => {
                state.funds = state.funds + amount;
                let mut effects = Effects::new();
                if state.funds.is_positive() {
                    effects.push(Self::transition(state, env, Standing::GoodStanding));
                }
                effects.push(Self::transaction(
                    state,
                    env,
                    format!("Credit of: {amount} successful."),
                    true,
                ));
                effects
            },
            Standing::Deactivated => smallvec![Self::transaction(
                state,
                env,
                format!("Credit of: {amount} unsuccessful. Account is deactivated."),
                false
            )],
        }
    }

    fn debit(state: &mut AccountState, amount: Money, env: &AccountEnvironment) -> Effects {
        let remaining = state.funds - amount;
        match state.standing {
            Standing::GoodStanding => {
                let mut effects = Effects::new();
                if remaining.is_negative() {
                    effects.push(Self::transition(state, env, Standing::InDebt));
                }
                state.funds = remaining;
                effects.push(Self::transaction(
                    state,
                    env,
                    format!("Debit of: {amount} successful."),
                    true,
                ));
                effects
            },
            Standing::InDebt => smallvec![Self::transaction(
                state,
                env,
                format!(
                    "Debit of: {amount} unsuccessful. Cannot deduct funds from account state: {}",
                    state.standing
                ),
                false
            )],
            Standing::Deactivated if remaining.is_negative() => smallvec![Self::transaction(
                state,
                env,
                format!(
                    "Debit of: {amount} unsuccessful. Deactivated account must only use remaining credit. It cannot enter arrears."
                ),
                false
            )],
            Standing::Deactivated => {
                state.funds = remaining;
                smallvec![Self::transaction(
                    state,
                    env,
                    format!("Debit of: {amount} successful."),
                    true
                )]
            },
        }
    }

    fn deactivate(state: &mut AccountState, env: &AccountEnvironment) -> Effects {
        match state.standing {
            Standing::GoodStanding => smallvec![Self::transition(state, env, Standing::Deactivated)],
            Standing::InDebt => smallvec![Self::standing_rejected(
                state,
                env,
                format!(
                    "Accounts in state: {} cannot be deactivated. The account must be returned to good standing before being deactivated.",
                    state.standing
                )
            )],
            Standing::Deactivated => smallvec![Self::standing_rejected(
                state,
                env,
                "Account has already been deactivated.".to_string()
            )],
        }
    }
}

impl Reducer for AccountReducer {
    type State = AccountState;
    type Action = AccountAction;
    type Environment = AccountEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            AccountAction::CreditFunds { amount } => Self::credit(state, amount.amount(), env),

            AccountAction::DebitFunds { amount } => Self::debit(state, amount.amount(), env),

            AccountAction::Charge { amount } => {
                if (state.funds - amount.amount()).is_negative() {
                    return smallvec![Self::transaction(
                        state,
                        env,
                        format!(
                            "Charge of: {amount} declined. Insufficient funds: balance is {}.",
                            state.funds
                        ),
                        false
                    )];
                }
                smallvec![Effect::Send(AccountAction::DebitFunds { amount })]
            },

            AccountAction::Deactivate => Self::deactivate(state, env),

            AccountAction::RecordPurchase { record } => {
                tracing::debug!(ticket_id = %record.ticket_id, "Ticket added to purchase history");
                state.purchase_history.push(record);
                SmallVec::new()
            },

            // ========== Events ==========
            // Announcements only; they carry nothing to apply
            AccountAction::TransactionRecorded(_) | AccountAction::StandingChanged(_) => {
                SmallVec::new()
            },
        }
    }
}

/// A rider account driven through its own store
///
/// Funds change only through [`Account::credit_funds`], [`Account::debit_funds`]
/// and [`Account::charge`]; the standing changes only as a consequence of those
/// and [`Account::deactivate`].
pub struct Account {
    store: Store<AccountState, AccountAction, AccountEnvironment, AccountReducer>,
}

impl Account {
    /// Opens an account in good standing with zero funds
    #[must_use]
    pub fn open(holder: AccountHolder, env: AccountEnvironment) -> Self {
        tracing::info!(account_id = holder.account_id, name = %holder.full_name(), "Account opened");
        Self {
            store: Store::new(AccountState::new(holder), AccountReducer::new(), env),
        }
    }

    /// Add funds
    ///
    /// # Errors
    ///
    /// Returns [`MetrotikError::InvalidFundMutation`](crate::error::MetrotikError::InvalidFundMutation)
    /// for a negative amount, before the account is touched.
    pub fn credit_funds(&mut self, amount: Money) -> Result<()> {
        let amount = FundMutation::new(amount)?;
        self.store.send(AccountAction::CreditFunds { amount })?;
        Ok(())
    }

    /// Remove funds, following the standing table
    ///
    /// # Errors
    ///
    /// Returns [`MetrotikError::InvalidFundMutation`](crate::error::MetrotikError::InvalidFundMutation)
    /// for a negative amount, before the account is touched.
    pub fn debit_funds(&mut self, amount: Money) -> Result<()> {
        let amount = FundMutation::new(amount)?;
        self.store.send(AccountAction::DebitFunds { amount })?;
        Ok(())
    }

    /// Pay `price` out of current funds
    ///
    /// Returns whether exactly `price` was taken from the account.
    ///
    /// # Errors
    ///
    /// Returns [`MetrotikError::InvalidFundMutation`](crate::error::MetrotikError::InvalidFundMutation)
    /// for a negative price.
    pub fn charge(&mut self, price: Money) -> Result<bool> {
        let amount = FundMutation::new(price)?;
        let before = self.funds();
        self.store.send(AccountAction::Charge { amount })?;
        let paid = self.funds() == before - price;
        tracing::debug!(%price, paid, "Charge processed");
        Ok(paid)
    }

    /// Close the account, following the standing table
    ///
    /// # Errors
    ///
    /// Returns an error only if the account store rejects the action.
    pub fn deactivate(&mut self) -> Result<()> {
        self.store.send(AccountAction::Deactivate)?;
        Ok(())
    }

    /// Append a ticket to the purchase history
    ///
    /// # Errors
    ///
    /// Returns an error only if the account store rejects the action.
    pub fn record_purchase(&mut self, record: PurchaseRecord) -> Result<()> {
        self.store.send(AccountAction::RecordPurchase { record })?;
        Ok(())
    }

    /// Observe credit, debit and charge outcomes
    pub fn subscribe_transactions<F>(&mut self, mut observer: F) -> SubscriberId
    where
        F: FnMut(&AccountEvent) + 'static,
    {
        self.store.subscribe(move |action| {
            if let AccountAction::TransactionRecorded(event) = action {
                observer(event);
            }
        })
    }

    /// Observe deactivation outcomes and standing transitions
    pub fn subscribe_state_changes<F>(&mut self, mut observer: F) -> SubscriberId
    where
        F: FnMut(&AccountEvent) + 'static,
    {
        self.store.subscribe(move |action| {
            if let AccountAction::StandingChanged(event) = action {
                observer(event);
            }
        })
    }

    /// Stop observing
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.store.unsubscribe(id)
    }

    /// Current balance
    #[must_use]
    pub fn funds(&self) -> Money {
        self.store.state(|s| s.funds)
    }

    /// Current standing
    #[must_use]
    pub fn standing(&self) -> Standing {
        self.store.state(|s| s.standing)
    }

    /// Rider identity
    #[must_use]
    pub fn holder(&self) -> AccountHolder {
        self.store.state(|s| s.holder.clone())
    }

    /// Every ticket bought, oldest first
    #[must_use]
    pub fn purchase_history(&self) -> Vec<PurchaseRecord> {
        self.store.state(|s| s.purchase_history.clone())
    }

    /// Read the whole state via a closure
    pub fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&AccountState) -> T,
    {
        self.store.state(f)
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.store.state(|s| f.debug_struct("Account").field("state", s).finish())
    }
}
