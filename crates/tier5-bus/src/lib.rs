use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tier5_schema::ConsoleEvent;
use tokio::sync::{mpsc, RwLock};

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum Topic {
    Toast,
    ReloginRequired,
    PendingRefreshed,
    SelectionChanged,
    StoresRefreshed,
    CorrectionSubmitted,
    ChatQueuedOffline,
}

impl Topic {
    pub fn from_event(event: &ConsoleEvent) -> Self {
        match event {
            ConsoleEvent::Toast { .. } => Topic::Toast,
            ConsoleEvent::ReloginRequired => Topic::ReloginRequired,
            ConsoleEvent::PendingRefreshed { .. } => Topic::PendingRefreshed,
            ConsoleEvent::SelectionChanged { .. } => Topic::SelectionChanged,
            ConsoleEvent::StoresRefreshed { .. } => Topic::StoresRefreshed,
            ConsoleEvent::CorrectionSubmitted { .. } => Topic::CorrectionSubmitted,
            ConsoleEvent::ChatQueuedOffline { .. } => Topic::ChatQueuedOffline,
        }
    }
}

type Subscriber = mpsc::Sender<ConsoleEvent>;
type SubscriberMap = Arc<RwLock<HashMap<Topic, Vec<Subscriber>>>>;

async fn deliver(subscribers: &SubscriberMap, event: ConsoleEvent) {
    let topic = Topic::from_event(&event);
    let subs = subscribers.read().await;
    if let Some(subscribers) = subs.get(&topic) {
        for tx in subscribers {
            if tx.try_send(event.clone()).is_err() {
                tracing::debug!(?topic, "dropping console event for slow or closed subscriber");
            }
        }
    }
}

pub struct EventBus {
    subscribers: SubscriberMap,
    capacity: usize,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    pub async fn subscribe(&self, topic: Topic) -> mpsc::Receiver<ConsoleEvent> {
        let (tx, rx) = mpsc::channel(self.capacity);
        let mut subs = self.subscribers.write().await;
        subs.entry(topic).or_default().push(tx);
        rx
    }

    pub async fn publish(&self, event: ConsoleEvent) -> Result<()> {
        deliver(&self.subscribers, event).await;
        Ok(())
    }

    pub fn publisher(&self) -> BusPublisher {
        BusPublisher {
            subscribers: self.subscribers.clone(),
        }
    }
}

#[derive(Clone)]
pub struct BusPublisher {
    subscribers: SubscriberMap,
}

impl BusPublisher {
    pub async fn publish(&self, event: ConsoleEvent) -> Result<()> {
        deliver(&self.subscribers, event).await;
        Ok(())
    }
}
