use std::sync::Arc;

use tempfile::TempDir;

use super::log::MessageLog;
use super::registry::Registry;
use super::subscription::SubscriptionIndex;
use super::topic::{DeliveryReport, DeliveryStatus, Receipt, Subscriber, Topic};
use super::{BrokerState, Coordinator, Observer, Outcome};
use crate::config::BrokerSettings;
use crate::persistence::JsonFileStore;
use crate::utils::{BrokerError, DeliveryError, EntityKind};

fn test_coordinator() -> (Coordinator, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("config.json"));
    (Coordinator::new(store), dir)
}

fn news_fixture() -> (Coordinator, TempDir) {
    let (coordinator, dir) = test_coordinator();
    coordinator.create_topic("news").unwrap();
    coordinator.create_producer("p1").unwrap();
    coordinator.create_observer("o1").unwrap();
    (coordinator, dir)
}

/// Subscriber that always refuses delivery.
struct Refusing {
    id: String,
}

impl Subscriber for Refusing {
    fn id(&self) -> &str {
        &self.id
    }

    fn receive(&mut self, _message: &str, _topic: &str) -> Result<Receipt, DeliveryError> {
        Err(DeliveryError::Rejected {
            id: self.id.clone(),
            reason: "closed".to_string(),
        })
    }
}

#[test]
fn test_registry_rejects_duplicates_and_keeps_order() {
    let mut registry = Registry::new(EntityKind::Producer);
    registry.insert("b", 1).unwrap();
    registry.insert("a", 2).unwrap();

    let err = registry.insert("b", 3).unwrap_err();
    assert!(matches!(
        err,
        BrokerError::AlreadyExists { kind: EntityKind::Producer, ref id } if id == "b"
    ));
    assert_eq!(registry.ids(), vec!["b", "a"]);

    registry.remove("b").unwrap();
    assert_eq!(registry.ids(), vec!["a"]);
    assert!(matches!(
        registry.remove("b"),
        Err(BrokerError::NotFound { .. })
    ));
}

#[test]
fn test_subscription_index_is_consistent_both_ways() {
    let mut index = SubscriptionIndex::new();
    assert!(index.link("o1", "news"));
    assert!(index.link("o2", "news"));
    assert!(index.link("o1", "sports"));
    assert!(!index.link("o1", "news"));

    assert_eq!(index.subscribers_of("news"), vec!["o1", "o2"]);
    assert_eq!(index.topics_of("o1"), vec!["news", "sports"]);

    assert_eq!(index.unlink_topic("news"), vec!["o1", "o2"]);
    assert_eq!(index.topics_of("o1"), vec!["sports"]);
    assert!(index.topics_of("o2").is_empty());
    assert!(!index.unlink("o2", "news"));
}

#[test]
fn test_message_log_keeps_most_recent_entries() {
    let mut log = MessageLog::new();
    for i in 0..150 {
        log.append(&format!("event {i}"));
    }

    let entries = log.read();
    assert_eq!(entries.len(), 100);
    assert!(entries[0].ends_with("] event 50"));
    assert!(entries[99].ends_with("] event 149"));
    assert!(entries[0].starts_with('['));
}

#[test]
fn test_observer_buffer_evicts_oldest() {
    let mut observer = Observer::with_capacity("o1", 2);
    assert_eq!(observer.receive("a", "t").unwrap(), Receipt::Stored);
    assert_eq!(observer.receive("b", "t").unwrap(), Receipt::Stored);
    assert_eq!(
        observer.receive("c", "t").unwrap(),
        Receipt::StoredWithEviction
    );
    assert_eq!(observer.messages(), vec!["[topic=t] b", "[topic=t] c"]);
}

#[test]
fn test_delivery_isolates_failing_subscriber() {
    let topic = Topic::new("news");
    let mut subscribers: Vec<Box<dyn Subscriber>> = vec![
        Box::new(Observer::new("first")),
        Box::new(Refusing {
            id: "broken".to_string(),
        }),
        Box::new(Observer::new("last")),
    ];

    let reports: Vec<DeliveryReport> = subscribers
        .iter_mut()
        .map(|subscriber| topic.deliver("hello", subscriber.as_mut()))
        .collect();

    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].status, DeliveryStatus::Delivered);
    assert!(matches!(reports[1].status, DeliveryStatus::Failed(_)));
    assert_eq!(reports[2].subscriber, "last");
    assert_eq!(reports[2].status, DeliveryStatus::Delivered);
}

#[test]
fn test_create_topic_twice_fails() {
    let (coordinator, _dir) = test_coordinator();
    assert!(coordinator.create_topic("news").is_ok());

    let err = coordinator.create_topic("news").unwrap_err();
    assert!(matches!(err, BrokerError::AlreadyExists { kind: EntityKind::Topic, .. }));
    assert_eq!(err.to_string(), "topic 'news' already exists");
}

#[test]
fn test_create_producer_and_observer_twice_fails() {
    let (coordinator, _dir) = test_coordinator();
    coordinator.create_producer("p1").unwrap();
    coordinator.create_observer("o1").unwrap();

    assert!(matches!(
        coordinator.create_producer("p1"),
        Err(BrokerError::AlreadyExists { kind: EntityKind::Producer, .. })
    ));
    assert!(matches!(
        coordinator.create_observer("o1"),
        Err(BrokerError::AlreadyExists { kind: EntityKind::Observer, .. })
    ));
    assert!(coordinator.observer_messages("o1").is_empty());
    assert!(coordinator.subscriptions_of("o1").unwrap().is_empty());
}

#[test]
fn test_delete_unknown_topic_fails() {
    let (coordinator, _dir) = test_coordinator();
    assert!(matches!(
        coordinator.delete_topic("ghost"),
        Err(BrokerError::NotFound { kind: EntityKind::Topic, .. })
    ));
}

#[test]
fn test_subscribe_and_unsubscribe() {
    let (coordinator, _dir) = news_fixture();

    coordinator.subscribe("o1", "news").unwrap();
    assert_eq!(coordinator.subscriptions_of("o1").unwrap(), vec!["news"]);
    assert_eq!(coordinator.subscribers_of("news").unwrap(), vec!["o1"]);

    coordinator.unsubscribe("o1", "news").unwrap();
    assert!(coordinator.subscriptions_of("o1").unwrap().is_empty());
    assert!(coordinator.subscribers_of("news").unwrap().is_empty());
}

#[test]
fn test_subscribe_twice_is_a_noop() {
    let (coordinator, _dir) = news_fixture();

    coordinator.subscribe("o1", "news").unwrap();
    assert!(coordinator.subscribe("o1", "news").is_ok());

    assert_eq!(coordinator.subscriptions_of("o1").unwrap(), vec!["news"]);
    assert_eq!(coordinator.subscribers_of("news").unwrap(), vec!["o1"]);
}

#[test]
fn test_subscribe_requires_both_entities() {
    let (coordinator, _dir) = news_fixture();

    assert!(matches!(
        coordinator.subscribe("ghost", "news"),
        Err(BrokerError::NotFound { kind: EntityKind::Observer, .. })
    ));
    assert!(matches!(
        coordinator.subscribe("o1", "ghost"),
        Err(BrokerError::NotFound { kind: EntityKind::Topic, .. })
    ));
    assert!(matches!(
        coordinator.unsubscribe("o1", "ghost"),
        Err(BrokerError::NotFound { kind: EntityKind::Topic, .. })
    ));
    assert!(matches!(
        coordinator.unsubscribe("ghost", "news"),
        Err(BrokerError::NotFound { kind: EntityKind::Observer, ref id }) if id == "ghost"
    ));
    assert_eq!(coordinator.message_log().len(), 3);
}

#[test]
fn test_delete_topic_unlinks_every_subscriber() {
    let (coordinator, _dir) = news_fixture();
    coordinator.create_observer("o2").unwrap();
    coordinator.create_topic("sports").unwrap();
    coordinator.subscribe("o1", "news").unwrap();
    coordinator.subscribe("o2", "news").unwrap();
    coordinator.subscribe("o2", "sports").unwrap();

    coordinator.delete_topic("news").unwrap();

    assert!(coordinator.subscriptions_of("o1").unwrap().is_empty());
    assert_eq!(coordinator.subscriptions_of("o2").unwrap(), vec!["sports"]);
    assert_eq!(coordinator.list_entities().topics, vec!["sports"]);
}

#[test]
fn test_delete_observer_severs_subscriptions() {
    let (coordinator, _dir) = news_fixture();
    coordinator.subscribe("o1", "news").unwrap();

    coordinator.delete_observer("o1").unwrap();

    assert!(coordinator.subscribers_of("news").unwrap().is_empty());
    assert!(!coordinator.list_entities().subscriptions.contains_key("o1"));
    let published = coordinator.publish("p1", "news", "anyone?").unwrap();
    assert!(published.deliveries.is_empty());
}

#[test]
fn test_delete_producer() {
    let (coordinator, _dir) = news_fixture();
    coordinator.delete_producer("p1").unwrap();

    assert!(matches!(
        coordinator.publish("p1", "news", "hello"),
        Err(BrokerError::NotFound { kind: EntityKind::Producer, .. })
    ));
}

#[test]
fn test_publish_delivers_and_logs() {
    let (coordinator, _dir) = news_fixture();
    coordinator.subscribe("o1", "news").unwrap();
    let log_before = coordinator.message_log().len();

    let published = coordinator.publish("p1", "news", "hello").unwrap();
    assert_eq!(published.delivered_count(), 1);
    assert!(published.message.starts_with("[producer p1]["));
    assert!(published.message.ends_with("] hello"));

    let messages = coordinator.observer_messages("o1");
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("[topic=news] [producer p1]"));
    assert!(messages[0].ends_with("hello"));

    let log = coordinator.message_log();
    assert_eq!(log.len(), log_before + 1);
    let entry = log.last().unwrap();
    assert!(entry.contains("producer p1"));
    assert!(entry.contains("'news'"));
}

#[test]
fn test_publish_to_nonexistent_topic() {
    let (coordinator, _dir) = news_fixture();
    coordinator.subscribe("o1", "news").unwrap();
    let log_before = coordinator.message_log();

    let err = coordinator.publish("p1", "ghost", "hello").unwrap_err();
    assert!(matches!(err, BrokerError::NotFound { kind: EntityKind::Topic, .. }));

    assert_eq!(coordinator.message_log(), log_before);
    assert!(coordinator.observer_messages("o1").is_empty());
}

#[test]
fn test_publish_reaches_only_subscribers_in_order() {
    let (coordinator, _dir) = news_fixture();
    coordinator.create_observer("o2").unwrap();
    coordinator.create_observer("o3").unwrap();
    coordinator.subscribe("o2", "news").unwrap();
    coordinator.subscribe("o1", "news").unwrap();

    let published = coordinator.publish("p1", "news", "hi").unwrap();
    let order: Vec<_> = published
        .deliveries
        .iter()
        .map(|d| d.subscriber.as_str())
        .collect();
    assert_eq!(order, vec!["o2", "o1"]);
    assert!(coordinator.observer_messages("o3").is_empty());
}

#[test]
fn test_deliver_reports_unregistered_subscriber_in_place() {
    let mut state = BrokerState::new(&BrokerSettings::default());
    state.topics.insert("news", Topic::new("news")).unwrap();
    for id in ["o1", "o2"] {
        state.observers.insert(id, Observer::new(id)).unwrap();
    }
    state.subscriptions.link("o2", "news");
    state.subscriptions.link("ghost", "news");
    state.subscriptions.link("o1", "news");

    let reports = state.deliver("news", "hello").unwrap();

    let order: Vec<&str> = reports.iter().map(|r| r.subscriber.as_str()).collect();
    assert_eq!(order, vec!["o2", "ghost", "o1"]);
    assert_eq!(reports[0].status, DeliveryStatus::Delivered);
    assert_eq!(
        reports[1].status,
        DeliveryStatus::Failed(DeliveryError::Unregistered("ghost".to_string()))
    );
    assert_eq!(reports[2].status, DeliveryStatus::Delivered);
    assert_eq!(state.observers.get("o1").unwrap().messages(), vec!["[topic=news] hello"]);
}

#[test]
fn test_publish_and_delete_with_many_subscribers() {
    let (coordinator, _dir) = news_fixture();
    coordinator.create_topic("sports").unwrap();
    let ids: Vec<String> = (0..3000).map(|i| format!("obs-{i}")).collect();
    for id in &ids {
        coordinator.create_observer(id).unwrap();
        coordinator.subscribe(id, "sports").unwrap();
    }
    // subscribe to news in reverse creation order
    for id in ids.iter().rev() {
        coordinator.subscribe(id, "news").unwrap();
    }

    let published = coordinator.publish("p1", "news", "extra").unwrap();
    assert_eq!(published.delivered_count(), ids.len());
    let order: Vec<&str> = published
        .deliveries
        .iter()
        .map(|report| report.subscriber.as_str())
        .collect();
    let expected: Vec<&str> = ids.iter().rev().map(String::as_str).collect();
    assert_eq!(order, expected);

    coordinator.unsubscribe("obs-1500", "news").unwrap();
    assert_eq!(coordinator.subscribers_of("news").unwrap().len(), ids.len() - 1);

    coordinator.delete_topic("news").unwrap();
    assert_eq!(coordinator.subscriptions_of("obs-0").unwrap(), vec!["sports"]);
    assert_eq!(coordinator.subscribers_of("sports").unwrap(), ids);
}

#[test]
fn test_listing_keeps_observer_creation_order() {
    let (coordinator, _dir) = news_fixture();
    coordinator.create_topic("sports").unwrap();
    for id in ["zeta", "alpha", "mid"] {
        coordinator.create_observer(id).unwrap();
    }
    coordinator.subscribe("mid", "sports").unwrap();
    coordinator.subscribe("mid", "news").unwrap();
    coordinator.subscribe("zeta", "news").unwrap();

    let entities = coordinator.list_entities();
    let keys: Vec<&str> = entities.subscriptions.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["o1", "zeta", "alpha", "mid"]);
    assert_eq!(entities.subscriptions["mid"], vec!["sports", "news"]);

    let keys: Vec<String> = coordinator.snapshot().subscriptions.into_keys().collect();
    assert_eq!(keys, vec!["zeta", "mid"]);
}

#[test]
fn test_observer_buffer_capacity_from_settings() {
    let dir = tempfile::tempdir().unwrap();
    let settings = BrokerSettings {
        log_capacity: 5,
        observer_buffer_capacity: 2,
    };
    let coordinator =
        Coordinator::with_settings(JsonFileStore::new(dir.path().join("c.json")), &settings);
    coordinator.create_topic("news").unwrap();
    coordinator.create_producer("p1").unwrap();
    coordinator.create_observer("o1").unwrap();
    coordinator.subscribe("o1", "news").unwrap();

    for i in 0..3 {
        coordinator.publish("p1", "news", &format!("m{i}")).unwrap();
    }

    let messages = coordinator.observer_messages("o1");
    assert_eq!(messages.len(), 2);
    assert!(messages[1].ends_with("m2"));
    assert_eq!(coordinator.message_log().len(), 5);
}

#[test]
fn test_outcome_projection() {
    let (coordinator, _dir) = test_coordinator();

    let ok = Outcome::from(coordinator.create_topic("news"));
    assert!(ok.success);
    assert_eq!(ok.msg, "topic 'news' created");

    let failed = Outcome::from(coordinator.create_topic("news"));
    assert!(!failed.success);
    assert_eq!(failed.msg, "topic 'news' already exists");
}

#[test]
fn test_concurrent_publishers() {
    let (coordinator, _dir) = news_fixture();
    coordinator.subscribe("o1", "news").unwrap();
    let coordinator = Arc::new(coordinator);

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let coordinator = Arc::clone(&coordinator);
            std::thread::spawn(move || {
                for i in 0..25 {
                    coordinator
                        .publish("p1", "news", &format!("t{t}-m{i}"))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(coordinator.observer_messages("o1").len(), 200);
    assert_eq!(coordinator.message_log().len(), 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_subscription_churn_stays_consistent() {
    let (coordinator, _dir) = test_coordinator();
    coordinator.create_topic("news").unwrap();
    for i in 0..10 {
        coordinator.create_observer(&format!("o{i}")).unwrap();
    }
    let coordinator = Arc::new(coordinator);

    let mut tasks = Vec::new();
    for i in 0..10 {
        let coordinator = Arc::clone(&coordinator);
        tasks.push(tokio::spawn(async move {
            let id = format!("o{i}");
            for _ in 0..20 {
                coordinator.subscribe(&id, "news").unwrap();
                coordinator.unsubscribe(&id, "news").unwrap();
            }
            if i % 2 == 0 {
                coordinator.subscribe(&id, "news").unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let subscribers = coordinator.subscribers_of("news").unwrap();
    assert_eq!(subscribers.len(), 5);
    for i in 0..10 {
        let topics = coordinator.subscriptions_of(&format!("o{i}")).unwrap();
        assert_eq!(topics.is_empty(), i % 2 == 1);
        assert_eq!(subscribers.contains(&format!("o{i}")), i % 2 == 0);
    }
}

#[test]
fn test_from_settings_selects_backend() {
    use crate::config::{Settings, SnapshotBackend};

    let dir = tempfile::tempdir().unwrap();
    let mut settings = Settings::default();
    settings.persistence.backend = SnapshotBackend::Sled;
    settings.persistence.path = dir.path().join("db").display().to_string();

    let coordinator = Coordinator::from_settings(&settings).unwrap();
    assert!(coordinator.store_location().starts_with("sled:"));

    settings.persistence.backend = SnapshotBackend::Json;
    settings.persistence.path = dir.path().join("config.json").display().to_string();
    let coordinator = Coordinator::from_settings(&settings).unwrap();
    assert!(coordinator.store_location().ends_with("config.json"));
}
