//! Fan-out of notifications to subscribers over crossbeam channels.

use std::sync::Mutex;

use crossbeam_channel::{Receiver, Sender};

use crate::sync::lock;
use crate::update::Notification;

#[derive(Default)]
pub struct ObserverSet {
    subscribers: Mutex<Vec<Sender<Notification>>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new observer. Dropping the receiver unsubscribes it.
    pub fn subscribe(&self) -> Receiver<Notification> {
        let (tx, rx) = crossbeam_channel::unbounded();
        lock(&self.subscribers).push(tx);
        rx
    }

    /// Deliver to every live subscriber, pruning disconnected ones.
    pub fn publish(&self, notification: Notification) {
        lock(&self.subscribers).retain(|tx| tx.send(notification.clone()).is_ok());
    }

    pub fn len(&self) -> usize {
        lock(&self.subscribers).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
