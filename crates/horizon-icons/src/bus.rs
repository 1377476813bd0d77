//! Process wide notification that an icon group changed.
//!
//! Every loader subscribes when it is created and receives the raw group
//! values published through [`ChangeBus::emit_change`] on its own channel.
//! Loaders drain their channel at the start of each operation, so handling
//! always happens on the loader's own thread and a loader never reenters
//! itself. Delivery is best effort: the same group may arrive several
//! times and handlers must be idempotent.

use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};
use parking_lot::Mutex;

use crate::signal::Signal;
use crate::types::IconGroup;

/// Publish/subscribe hub for icon change notifications.
#[derive(Debug, Default)]
pub struct ChangeBus {
    subscribers: Mutex<Vec<Sender<i32>>>,
    changed: Signal<IconGroup>,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new receiver of change notifications.
    pub fn subscribe(&self) -> ChangeSubscription {
        let (sender, receiver) = unbounded();
        self.subscribers.lock().push(sender);
        ChangeSubscription { receiver }
    }

    /// Announce that icons of `group` changed.
    ///
    /// Every live subscription receives the group. Subscriptions whose
    /// receiver was dropped are forgotten.
    pub fn emit_change(&self, group: IconGroup) {
        self.emit_raw(group.to_raw());
    }

    /// Announce a change using the integer wire representation of a group.
    pub fn emit_raw(&self, raw_group: i32) {
        let delivered = {
            let mut subscribers = self.subscribers.lock();
            subscribers.retain(|sender| sender.send(raw_group).is_ok());
            subscribers.len()
        };
        tracing::debug!(target: "horizon_icons::bus", group = raw_group, delivered, "Icon change emitted");
        self.changed.emit(IconGroup::from_raw_or_default(raw_group));
    }

    /// Emitted synchronously for every published change.
    pub fn changed(&self) -> &Signal<IconGroup> {
        &self.changed
    }

    /// Subscriptions alive at the last emission, plus any added since.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

/// One loader's end of the [`ChangeBus`].
#[derive(Debug)]
pub struct ChangeSubscription {
    receiver: Receiver<i32>,
}

impl ChangeSubscription {
    /// Take every pending notification.
    ///
    /// Invalid raw groups are normalized to `Desktop`. Each group appears
    /// once, in order of first arrival.
    pub fn drain(&self) -> Vec<IconGroup> {
        let mut groups = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(raw) => {
                    let group = IconGroup::from_raw_or_default(raw);
                    if !groups.contains(&group) {
                        groups.push(group);
                    }
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        groups
    }

    pub fn has_pending(&self) -> bool {
        !self.receiver.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_every_subscriber_receives() {
        let bus = ChangeBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();

        bus.emit_change(IconGroup::Toolbar);
        bus.emit_change(IconGroup::Small);
        bus.emit_change(IconGroup::Toolbar);

        assert_eq!(a.drain(), vec![IconGroup::Toolbar, IconGroup::Small]);
        assert_eq!(b.drain(), vec![IconGroup::Toolbar, IconGroup::Small]);
        assert!(a.drain().is_empty());
    }

    #[test]
    fn test_invalid_raw_group_is_normalized() {
        let bus = ChangeBus::new();
        let sub = bus.subscribe();
        bus.emit_raw(42);
        assert_eq!(sub.drain(), vec![IconGroup::Desktop]);
    }

    #[test]
    fn test_dropped_subscription_is_forgotten() {
        let bus = ChangeBus::new();
        let kept = bus.subscribe();
        drop(bus.subscribe());
        assert_eq!(bus.subscriber_count(), 2);

        bus.emit_change(IconGroup::Panel);
        assert!(kept.has_pending());
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_changed_signal() {
        let bus = ChangeBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        bus.changed().connect(move |group| seen_clone.lock().push(*group));

        bus.emit_change(IconGroup::Dialog);
        assert_eq!(*seen.lock(), vec![IconGroup::Dialog]);
    }
}
