//! Subscription relation
//!
//! All observer/topic links live in one `SubscriptionIndex`. The index keeps
//! the relation keyed both ways, and `link`/`unlink` are the only writers, so
//! a topic's subscriber list and an observer's subscription list can never
//! disagree.
//!
//! Both directions keep insertion order: `subscribers_of` yields observers in
//! the order they subscribed, `topics_of` yields topics in the order the
//! observer subscribed to them.

use std::collections::HashMap;

use indexmap::IndexSet;

#[derive(Debug, Default)]
pub struct SubscriptionIndex {
    by_topic: HashMap<String, IndexSet<String>>,
    by_observer: HashMap<String, IndexSet<String>>,
}

/// Drop `member` from the set stored under `key`, pruning the set once empty.
fn detach(side: &mut HashMap<String, IndexSet<String>>, key: &str, member: &str) -> bool {
    let Some(members) = side.get_mut(key) else {
        return false;
    };
    let removed = members.shift_remove(member);
    if members.is_empty() {
        side.remove(key);
    }
    removed
}

impl SubscriptionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link `observer` to `topic`. Returns `false` if the link already existed.
    pub fn link(&mut self, observer: &str, topic: &str) -> bool {
        let topics = self.by_observer.entry(observer.to_string()).or_default();
        if !topics.insert(topic.to_string()) {
            return false;
        }
        self.by_topic
            .entry(topic.to_string())
            .or_default()
            .insert(observer.to_string());
        true
    }

    /// Remove the link. Returns `false` if there was nothing to remove.
    pub fn unlink(&mut self, observer: &str, topic: &str) -> bool {
        if !detach(&mut self.by_observer, observer, topic) {
            return false;
        }
        detach(&mut self.by_topic, topic, observer);
        true
    }

    /// Observers linked to `topic`, borrowed, in subscription order.
    pub fn subscribers(&self, topic: &str) -> impl Iterator<Item = &String> {
        self.by_topic.get(topic).into_iter().flatten()
    }

    pub fn subscribers_of(&self, topic: &str) -> Vec<String> {
        self.subscribers(topic).cloned().collect()
    }

    pub fn topics_of(&self, observer: &str) -> Vec<String> {
        self.by_observer
            .get(observer)
            .map(|topics| topics.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Sever every link to `topic`, returning the observers that were linked.
    pub fn unlink_topic(&mut self, topic: &str) -> Vec<String> {
        let observers: Vec<String> = self
            .by_topic
            .remove(topic)
            .map(|observers| observers.into_iter().collect())
            .unwrap_or_default();
        for observer in &observers {
            detach(&mut self.by_observer, observer, topic);
        }
        observers
    }

    /// Sever every link from `observer`, returning the topics that were linked.
    pub fn unlink_observer(&mut self, observer: &str) -> Vec<String> {
        let topics: Vec<String> = self
            .by_observer
            .remove(observer)
            .map(|topics| topics.into_iter().collect())
            .unwrap_or_default();
        for topic in &topics {
            detach(&mut self.by_topic, topic, observer);
        }
        topics
    }

    pub fn clear(&mut self) {
        self.by_topic.clear();
        self.by_observer.clear();
    }
}
