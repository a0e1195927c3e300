//! User-facing notification queue.
//!
//! Three producers feed one FIFO queue: ticket invalidations, account
//! transactions and account standing changes. The UI drains it once per
//! refresh.

use crate::account::AccountEvent;
use crate::ticket::TicketInvalidated;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Shared handle to the notification queue
///
/// Clones refer to the same queue, so observers registered on tickets and
/// accounts can each hold one.
#[derive(Clone, Debug, Default)]
pub struct NotificationBus {
    queue: Rc<RefCell<VecDeque<String>>>,
}

impl NotificationBus {
    /// Creates an empty bus
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a message
    pub fn push(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::trace!(%message, "Notification queued");
        self.queue.borrow_mut().push_back(message);
    }

    /// Take every queued message, oldest first, leaving the queue empty
    #[must_use]
    pub fn drain(&self) -> Vec<String> {
        self.queue.borrow_mut().drain(..).collect()
    }

    /// Messages waiting
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Whether nothing is waiting
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Observer to register on a ticket
    pub fn ticket_observer(&self) -> impl FnMut(&TicketInvalidated) + 'static + use<> {
        let bus = self.clone();
        move |event| bus.push(format!("Ticket ID: {} is now invalid.", event.ticket_id))
    }

    /// Observer to register for account transactions or standing changes
    pub fn account_observer(&self) -> impl FnMut(&AccountEvent) + 'static + use<> {
        let bus = self.clone();
        move |event| bus.push(event.message.clone())
    }
}
