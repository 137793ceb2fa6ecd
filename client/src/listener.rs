//! Live update listener.
//!
//! A [`Subscription`] releases itself on drop, so holding at most one per
//! gateway binding is enough to guarantee a single live subscription.

use std::{
    rc::Rc,
    sync::mpsc::{self, Receiver},
};

use log::debug;

use crate::{
    error::{BallotError, Operation, Result},
    gateway::{BallotGateway, SubscriptionId, VotedEvent},
};

pub struct Subscription {
    gateway: Rc<dyn BallotGateway>,
    id: SubscriptionId,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        debug!("releasing Voted subscription {:?} on {}", self.id, self.gateway.ballot());
        self.gateway.unsubscribe(self.id);
    }
}

/// `Voted` events for one binding, buffered until the session polls them.
pub struct LiveUpdates {
    subscription: Subscription,
    events: Receiver<VotedEvent>,
}

impl LiveUpdates {
    pub fn subscribe(gateway: &Rc<dyn BallotGateway>) -> Result<Self> {
        let (sink, events) = mpsc::channel();
        let id = gateway
            .subscribe_voted(sink)
            .map_err(BallotError::call(Operation::SubscribeVoted))?;
        debug!("subscribed to Voted on {} as {:?}", gateway.ballot(), id);
        Ok(Self {
            subscription: Subscription {
                gateway: Rc::clone(gateway),
                id,
            },
            events,
        })
    }

    pub fn subscription_id(&self) -> SubscriptionId {
        self.subscription.id()
    }

    /// Take every event received since the last call.
    pub fn drain(&self) -> Vec<VotedEvent> {
        self.events.try_iter().collect()
    }
}
