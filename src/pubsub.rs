//! Pub/sub integration across graphs.
//!
//! The core treats both collaborators as opaque:
//!
//! - a [`MessageBus`] accepts subscribers and carries published values to
//!   them;
//! - a [`TopicStore`] hands out write sinks for named topics, backing
//!   publisher nodes.
//!
//! [`subscribe`] wires a bus into a lowered graph's ingress; [`publish`]
//! appends a publisher node that writes through a store writer and announces
//! on the bus. [`InMemoryBus`] implements both traits and is the crate's
//! default: an unbounded channel drained by a background listener task that
//! fans values out to every subscriber.

use crate::graphs::GraphError;
use crate::node::{Node, Sink, Transform, TransformError};
use crate::types::{next_node_seq, NodeId, Payload};
use async_trait::async_trait;
use miette::Diagnostic;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::{sync::oneshot, task};

/// Errors surfaced by a [`TopicStore`].
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    /// The store has no such topic. Raised at publisher construction.
    #[error("store has no topic {topic}")]
    #[diagnostic(
        code(ramify::store::unknown_topic),
        help("Register the topic with the store before publishing to it.")
    )]
    UnknownTopic { topic: String },

    /// A write to the backing store failed.
    #[error("store write failed: {message}")]
    #[diagnostic(code(ramify::store::write))]
    Write { message: String },
}

/// Write sink for one topic, handed out by a [`TopicStore`].
pub type TopicWriter<T> = Arc<dyn Fn(T) -> Result<(), StoreError> + Send + Sync + 'static>;

/// The persistent store backing publish topics. Opaque to the core.
pub trait TopicStore<T: Payload>: Send + Sync {
    /// A write sink for `topic`.
    ///
    /// # Errors
    ///
    /// [`StoreError::UnknownTopic`] for topics the store does not carry.
    fn writer(&self, topic: &str) -> Result<TopicWriter<T>, StoreError>;
}

/// A subscriber before registration: an id and an (always empty) transform
/// slot. [`subscribe`] rejects subscribers that carry a transform — their
/// only job is forwarding into the root ingress.
pub struct Subscriber<T: Payload> {
    pub id: NodeId,
    pub transform: Option<Arc<dyn Transform<T>>>,
}

impl<T: Payload> Subscriber<T> {
    pub fn new(id: impl Into<NodeId>) -> Self {
        Subscriber {
            id: id.into(),
            transform: None,
        }
    }
}

/// A subscriber as the bus sees it: the bus calls `deliver` for every
/// published value.
pub struct BoundSubscriber<T: Payload> {
    pub id: NodeId,
    pub deliver: Sink<T>,
}

/// An external message bus. Opaque to the core.
pub trait MessageBus<T: Payload>: Send + Sync {
    /// Register a subscriber; the bus calls its sink for every value
    /// produced after registration.
    fn add_subscriber(&self, subscriber: BoundSubscriber<T>);

    /// Announce a value produced on `topic`.
    fn publish(&self, topic: &str, value: T);
}

/// Register `subscriber` on `bus` so that published values land in the
/// root's ingress. Delivery failures (a bounded ingress at capacity) are
/// logged and swallowed.
///
/// # Errors
///
/// [`GraphError::SubscriberHasTransform`] when the subscriber carries a
/// transform; [`GraphError::MissingIngress`] when `root` has not been
/// lowered with an ingress.
pub fn subscribe<T: Payload>(
    bus: &dyn MessageBus<T>,
    subscriber: Subscriber<T>,
    root: &Node<T>,
) -> Result<(), GraphError> {
    if subscriber.transform.is_some() {
        return Err(GraphError::SubscriberHasTransform { id: subscriber.id });
    }
    let Some(ingress) = root.runtime().and_then(|rt| rt.ingress.clone()) else {
        return Err(GraphError::MissingIngress);
    };

    let id = subscriber.id.clone();
    let deliver: Sink<T> = Arc::new(move |value: T| {
        if let Err(error) = ingress.offer(value) {
            tracing::warn!(subscriber = %id, %error, "subscription delivery rejected");
        }
    });
    bus.add_subscriber(BoundSubscriber {
        id: subscriber.id,
        deliver,
    });
    Ok(())
}

/// Configuration for [`publish`].
pub struct PublishConfig<T: Payload> {
    pub topic: Option<String>,
    pub store: Arc<dyn TopicStore<T>>,
    pub id: Option<NodeId>,
}

impl<T: Payload> PublishConfig<T> {
    pub fn new(store: Arc<dyn TopicStore<T>>) -> Self {
        PublishConfig {
            topic: None,
            store,
            id: None,
        }
    }

    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Append a publisher node under `parent`: every value it receives is
/// written through the store's writer for the configured topic, announced on
/// `bus`, and passed through unchanged. Returns the publisher's id.
///
/// # Errors
///
/// [`GraphError::MissingTopic`] when the config has no topic;
/// [`GraphError::Store`] when the store refuses the topic;
/// [`GraphError::NodeNotFound`] when `parent` does not exist.
pub fn publish<T: Payload>(
    bus: Arc<dyn MessageBus<T>>,
    parent: &NodeId,
    config: PublishConfig<T>,
    root: &mut Node<T>,
) -> Result<NodeId, GraphError> {
    let Some(topic) = config.topic else {
        return Err(GraphError::MissingTopic);
    };
    let writer = config.store.writer(&topic)?;
    let id = config
        .id
        .unwrap_or_else(|| NodeId::derived(&format!("publish:{topic}"), next_node_seq()));

    let node = Node::from_arc(
        id.clone(),
        Arc::new(Publisher {
            topic,
            writer,
            bus,
        }),
    );
    root.append_child(parent, node)?;
    Ok(id)
}

struct Publisher<T: Payload> {
    topic: String,
    writer: TopicWriter<T>,
    bus: Arc<dyn MessageBus<T>>,
}

#[async_trait]
impl<T: Payload> Transform<T> for Publisher<T> {
    async fn apply(&self, input: T) -> Result<Vec<T>, TransformError> {
        (self.writer)(input.clone())?;
        self.bus.publish(&self.topic, input.clone());
        Ok(vec![input])
    }
}

/// In-memory bus and store in one: published values flow through an
/// unbounded channel to a background listener, which fans each one out to
/// every subscriber; written values accumulate per topic.
///
/// Topic routing on the delivery side is a real bus's concern — this one
/// broadcasts every published value to all subscribers.
pub struct InMemoryBus<T: Payload> {
    subscribers: Arc<Mutex<Vec<BoundSubscriber<T>>>>,
    topics: Arc<Mutex<FxHashMap<String, Vec<T>>>>,
    channel: (flume::Sender<(String, T)>, flume::Receiver<(String, T)>),
    listener: Arc<Mutex<Option<ListenerState>>>,
}

struct ListenerState {
    shutdown_tx: oneshot::Sender<()>,
    handle: task::JoinHandle<()>,
}

impl<T: Payload> InMemoryBus<T> {
    /// A bus whose store carries the given topics.
    pub fn new<I, S>(topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let topics = topics
            .into_iter()
            .map(|name| (name.into(), Vec::new()))
            .collect();
        InMemoryBus {
            subscribers: Arc::new(Mutex::new(Vec::new())),
            topics: Arc::new(Mutex::new(topics)),
            channel: flume::unbounded(),
            listener: Arc::new(Mutex::new(None)),
        }
    }

    /// Spawn the background listener that drains published values to the
    /// subscribers. Idempotent: calling multiple times has no effect.
    pub fn listen(&self) {
        let mut guard = self.listener.lock();
        if guard.is_some() {
            return;
        }

        let receiver = self.channel.1.clone();
        let subscribers = self.subscribers.clone();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let handle = task::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    received = receiver.recv_async() => match received {
                        Err(_) => break,
                        Ok((topic, value)) => {
                            let subscribers = subscribers.lock();
                            tracing::trace!(%topic, fanout = subscribers.len(), "delivering");
                            for subscriber in subscribers.iter() {
                                (subscriber.deliver)(value.clone());
                            }
                        }
                    }
                }
            }
        });

        *guard = Some(ListenerState {
            shutdown_tx,
            handle,
        });
    }

    /// Stop the background listener. Values published afterwards sit in
    /// the channel until `listen` runs again.
    pub async fn stop_listener(&self) {
        let state = self.listener.lock().take();
        if let Some(state) = state {
            let _ = state.shutdown_tx.send(());
            let _ = state.handle.await;
        }
    }

    /// Values written to `topic` so far, oldest first.
    pub fn written(&self, topic: &str) -> Vec<T> {
        self.topics
            .lock()
            .get(topic)
            .cloned()
            .unwrap_or_default()
    }
}

impl<T: Payload> MessageBus<T> for InMemoryBus<T> {
    fn add_subscriber(&self, subscriber: BoundSubscriber<T>) {
        self.subscribers.lock().push(subscriber);
    }

    fn publish(&self, topic: &str, value: T) {
        let _ = self.channel.0.send((topic.to_string(), value));
    }
}

impl<T: Payload> TopicStore<T> for InMemoryBus<T> {
    fn writer(&self, topic: &str) -> Result<TopicWriter<T>, StoreError> {
        if !self.topics.lock().contains_key(topic) {
            return Err(StoreError::UnknownTopic {
                topic: topic.to_string(),
            });
        }
        let topics = self.topics.clone();
        let topic = topic.to_string();
        Ok(Arc::new(move |value: T| {
            match topics.lock().get_mut(&topic) {
                Some(written) => {
                    written.push(value);
                    Ok(())
                }
                None => Err(StoreError::UnknownTopic {
                    topic: topic.clone(),
                }),
            }
        }))
    }
}

impl<T: Payload> Drop for InMemoryBus<T> {
    fn drop(&mut self) {
        if let Some(state) = self.listener.lock().take() {
            let _ = state.shutdown_tx.send(());
            state.handle.abort();
        }
    }
}
