use std::fmt;

use super::signal::{Notification, Topic};
use crate::id::{IdGenerator, SubscriptionId};

type Handler = Box<dyn FnMut(&Notification)>;

struct Subscription {
    id: SubscriptionId,
    topic: Topic,
    handler: Handler,
}

/// Typed publish/subscribe channel the orchestrator announces ticks on.
///
/// Handlers run synchronously in subscription order and only ever see the
/// notification, never the registry.
#[derive(Default)]
pub struct NotificationBus {
    ids: IdGenerator,
    subscriptions: Vec<Subscription>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &mut self,
        topic: Topic,
        handler: impl FnMut(&Notification) + 'static,
    ) -> SubscriptionId {
        let id = self.ids.next_id();
        self.subscriptions.push(Subscription {
            id,
            topic,
            handler: Box::new(handler),
        });
        id
    }

    /// Remove a handler. Returns false if the id was unknown or already removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    /// Deliver to every handler subscribed to the notification's topic.
    /// Returns the number of handlers invoked.
    pub fn publish(&mut self, notification: &Notification) -> usize {
        let topic = notification.topic();
        let mut delivered = 0;
        for sub in self.subscriptions.iter_mut().filter(|s| s.topic == topic) {
            (sub.handler)(notification);
            delivered += 1;
        }
        delivered
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.subscriptions.iter().filter(|s| s.topic == topic).count()
    }
}

impl fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationBus")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}
