//! Broker engine
//!
//! This module contains the coordinator responsible for:
//! - the topic, producer and observer registries
//! - the subscribe/unsubscribe protocol over a single subscription relation
//! - publishing through producers and fanning out to observers
//! - the bounded message log
//! - saving and restoring snapshots through a `SnapshotStore`
//!
//! Concurrency and usage notes:
//! - `Coordinator` is `Send + Sync`; share it behind an `Arc` and call its
//!   methods from any number of threads or tasks.
//! - All state sits behind one coordinator-wide lock. Every operation takes
//!   the lock once, so each is atomic with respect to the others.
//! - Snapshot file I/O happens outside the lock. A load parses the stored
//!   snapshot first and then applies it in a single locked step.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, warn};

use crate::broker::log::MessageLog;
use crate::broker::message::Published;
use crate::broker::observer::Observer;
use crate::broker::outcome::Entities;
use crate::broker::producer::Producer;
use crate::broker::registry::Registry;
use crate::broker::subscription::SubscriptionIndex;
use crate::broker::topic::{DeliveryReport, Topic};
use crate::config::{BrokerSettings, Settings, SnapshotBackend};
use crate::persistence::{JsonFileStore, SledStore, Snapshot, SnapshotStore};
use crate::utils::{BrokerResult, DeliveryError, EntityKind};

/// Everything the coordinator guards with its lock.
#[derive(Debug)]
pub struct BrokerState {
    pub(crate) topics: Registry<Topic>,
    pub(crate) producers: Registry<Producer>,
    pub(crate) observers: Registry<Observer>,
    pub(crate) subscriptions: SubscriptionIndex,
    pub(crate) log: MessageLog,
    observer_capacity: usize,
}

impl BrokerState {
    pub fn new(settings: &BrokerSettings) -> Self {
        Self {
            topics: Registry::new(EntityKind::Topic),
            producers: Registry::new(EntityKind::Producer),
            observers: Registry::new(EntityKind::Observer),
            subscriptions: SubscriptionIndex::new(),
            log: MessageLog::with_capacity(settings.log_capacity),
            observer_capacity: settings.observer_buffer_capacity,
        }
    }

    pub fn topic(&self, id: &str) -> BrokerResult<&Topic> {
        self.topics.get(id)
    }

    pub fn log(&mut self, text: &str) {
        self.log.append(text);
    }

    /// Fan `message` out to every observer subscribed to `topic`, in
    /// subscription order. Subscribers missing from the observer registry are
    /// reported as failed deliveries.
    pub fn deliver(&mut self, topic: &str, message: &str) -> BrokerResult<Vec<DeliveryReport>> {
        let topic = self.topics.get(topic)?;

        let reports = self
            .subscriptions
            .subscribers(&topic.name)
            .map(|id| match self.observers.get_mut(id) {
                Ok(observer) => topic.deliver(message, observer),
                Err(_) => {
                    warn!(topic = %topic.name, subscriber = %id, "subscriber is not registered");
                    DeliveryReport::failed(id, DeliveryError::Unregistered(id.clone()))
                }
            })
            .collect();
        Ok(reports)
    }

    /// Projection of ids and non-empty subscriptions.
    pub fn snapshot(&self) -> Snapshot {
        let observers = self.observers.ids();
        let subscriptions = observers
            .iter()
            .map(|id| (id.clone(), self.subscriptions.topics_of(id)))
            .filter(|(_, topics)| !topics.is_empty())
            .collect();

        Snapshot {
            topics: self.topics.ids(),
            producers: self.producers.ids(),
            observers,
            subscriptions,
        }
    }

    pub fn entities(&self) -> Entities {
        let observers = self.observers.ids();
        let subscriptions = observers
            .iter()
            .map(|id| (id.clone(), self.subscriptions.topics_of(id)))
            .collect();

        Entities {
            topics: self.topics.ids(),
            producers: self.producers.ids(),
            observers,
            subscriptions,
        }
    }

    /// Drop every entity. Subscriptions are severed topic by topic before the
    /// registries are emptied.
    pub fn clear_all(&mut self) {
        for topic in self.topics.ids() {
            let severed = self.subscriptions.unlink_topic(&topic);
            debug!(topic = %topic, subscribers = severed.len(), "unlinked topic");
        }
        self.subscriptions.clear();
        self.topics.clear();
        self.producers.clear();
        self.observers.clear();
        self.log("cleared all existing entities");
    }

    /// Replace the current state with `snapshot`.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.clear_all();

        for id in &snapshot.topics {
            if self.topics.insert(id, Topic::new(id)).is_ok() {
                self.log(&format!("loaded topic '{id}' from snapshot"));
            }
        }
        for id in &snapshot.producers {
            if self.producers.insert(id, Producer::new(id)).is_ok() {
                self.log(&format!("loaded producer {id} from snapshot"));
            }
        }
        for id in &snapshot.observers {
            let observer = Observer::with_capacity(id, self.observer_capacity);
            if self.observers.insert(id, observer).is_ok() {
                self.log(&format!("loaded observer {id} from snapshot"));
            }
        }

        for (observer, topics) in &snapshot.subscriptions {
            if !self.observers.contains(observer) {
                warn!(observer = %observer, "snapshot subscription names unknown observer, skipped");
                continue;
            }
            for topic in topics {
                if !self.topics.contains(topic) {
                    warn!(observer = %observer, topic = %topic, "snapshot subscription names unknown topic, skipped");
                    continue;
                }
                if self.subscriptions.link(observer, topic) {
                    self.log(&format!(
                        "loaded subscription from snapshot: observer {observer} to topic '{topic}'"
                    ));
                }
            }
        }
    }
}

/// The single entry point for all broker operations.
#[derive(Debug)]
pub struct Coordinator {
    state: Mutex<BrokerState>,
    store: Box<dyn SnapshotStore>,
}

impl Coordinator {
    /// Coordinator with default capacities that snapshots to `store`.
    pub fn new(store: impl SnapshotStore + 'static) -> Self {
        Self::with_settings(store, &BrokerSettings::default())
    }

    pub fn with_settings(store: impl SnapshotStore + 'static, settings: &BrokerSettings) -> Self {
        Self {
            state: Mutex::new(BrokerState::new(settings)),
            store: Box::new(store),
        }
    }

    /// Build a coordinator and its snapshot store from loaded settings.
    pub fn from_settings(settings: &Settings) -> BrokerResult<Self> {
        let path = &settings.persistence.path;
        let coordinator = match settings.persistence.backend {
            SnapshotBackend::Json => Self::with_settings(JsonFileStore::new(path), &settings.broker),
            SnapshotBackend::Sled => Self::with_settings(SledStore::open(path)?, &settings.broker),
        };
        info!(store = %coordinator.store.location(), "coordinator ready");
        Ok(coordinator)
    }

    fn state(&self) -> MutexGuard<'_, BrokerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn store_location(&self) -> String {
        self.store.location()
    }

    pub fn create_topic(&self, id: &str) -> BrokerResult<String> {
        let mut state = self.state();
        state.topics.insert(id, Topic::new(id))?;
        state.log(&format!("created topic '{id}'"));
        Ok(format!("topic '{id}' created"))
    }

    /// Delete a topic, unsubscribing every observer from it first.
    pub fn delete_topic(&self, id: &str) -> BrokerResult<String> {
        let mut state = self.state();
        state.topics.get(id)?;
        let severed = state.subscriptions.unlink_topic(id);
        state.topics.remove(id)?;
        debug!(topic = id, unsubscribed = severed.len(), "topic removed");
        state.log(&format!("deleted topic '{id}'"));
        Ok(format!("topic '{id}' deleted"))
    }

    pub fn create_producer(&self, id: &str) -> BrokerResult<String> {
        let mut state = self.state();
        state.producers.insert(id, Producer::new(id))?;
        state.log(&format!("created producer {id}"));
        Ok(format!("producer {id} created"))
    }

    pub fn delete_producer(&self, id: &str) -> BrokerResult<String> {
        let mut state = self.state();
        state.producers.remove(id)?;
        state.log(&format!("deleted producer {id}"));
        Ok(format!("producer {id} deleted"))
    }

    pub fn create_observer(&self, id: &str) -> BrokerResult<String> {
        let mut state = self.state();
        let observer = Observer::with_capacity(id, state.observer_capacity);
        state.observers.insert(id, observer)?;
        state.log(&format!("created observer {id}"));
        Ok(format!("observer {id} created"))
    }

    /// Delete an observer and every subscription it holds.
    pub fn delete_observer(&self, id: &str) -> BrokerResult<String> {
        let mut state = self.state();
        state.observers.get(id)?;
        let severed = state.subscriptions.unlink_observer(id);
        state.observers.remove(id)?;
        debug!(observer = id, unsubscribed = severed.len(), "observer removed");
        state.log(&format!("deleted observer {id}"));
        Ok(format!("observer {id} deleted"))
    }

    /// Subscribe an observer to a topic. Subscribing twice is a no-op.
    pub fn subscribe(&self, observer: &str, topic: &str) -> BrokerResult<String> {
        let mut state = self.state();
        state.observers.get(observer)?;
        state.topics.get(topic)?;

        if !state.subscriptions.link(observer, topic) {
            debug!(observer, topic, "already subscribed");
        }
        state.log(&format!("observer {observer} subscribed to topic '{topic}'"));
        Ok(format!("observer {observer} subscribed to topic '{topic}'"))
    }

    /// Unsubscribe an observer from a topic. Unsubscribing an unlinked pair
    /// is a no-op.
    pub fn unsubscribe(&self, observer: &str, topic: &str) -> BrokerResult<String> {
        let mut state = self.state();
        state.observers.get(observer)?;
        state.topics.get(topic)?;

        if !state.subscriptions.unlink(observer, topic) {
            debug!(observer, topic, "was not subscribed");
        }
        state.log(&format!("observer {observer} unsubscribed from topic '{topic}'"));
        Ok(format!("observer {observer} unsubscribed from topic '{topic}'"))
    }

    /// Publish `content` from `producer` to `topic`.
    pub fn publish(&self, producer: &str, topic: &str, content: &str) -> BrokerResult<Published> {
        let mut state = self.state();
        let producer = state.producers.get(producer)?.clone();
        producer.publish(&mut state, topic, content)
    }

    /// Messages received by `observer`, oldest first. Unknown observers have none.
    pub fn observer_messages(&self, observer: &str) -> Vec<String> {
        self.state()
            .observers
            .get(observer)
            .map(Observer::messages)
            .unwrap_or_default()
    }

    pub fn subscriptions_of(&self, observer: &str) -> BrokerResult<Vec<String>> {
        let state = self.state();
        state.observers.get(observer)?;
        Ok(state.subscriptions.topics_of(observer))
    }

    pub fn subscribers_of(&self, topic: &str) -> BrokerResult<Vec<String>> {
        let state = self.state();
        state.topics.get(topic)?;
        Ok(state.subscriptions.subscribers_of(topic))
    }

    pub fn message_log(&self) -> Vec<String> {
        self.state().log.read()
    }

    pub fn list_entities(&self) -> Entities {
        self.state().entities()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state().snapshot()
    }

    /// Write the current ids and subscriptions to the snapshot store.
    pub fn save_snapshot(&self) -> BrokerResult<String> {
        let snapshot = self.snapshot();
        let location = self.store.location();

        match self.store.save(&snapshot) {
            Ok(()) => {
                self.state().log(&format!("snapshot saved to {location}"));
                Ok(format!("snapshot saved to {location}"))
            }
            Err(e) => {
                error!(store = %location, "snapshot save failed: {e}");
                self.state().log(&format!("failed to save snapshot: {e}"));
                Err(e)
            }
        }
    }

    /// Replace all state with the stored snapshot. The current state is
    /// discarded without backup.
    pub fn load_snapshot(&self) -> BrokerResult<String> {
        let location = self.store.location();
        let snapshot = match self.store.load() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(store = %location, "snapshot load failed: {e}");
                self.state().log(&format!("failed to load snapshot: {e}"));
                return Err(e);
            }
        };

        let mut state = self.state();
        state.restore(&snapshot);
        state.log(&format!("snapshot loaded from {location}"));
        Ok(format!("snapshot loaded from {location}"))
    }
}
