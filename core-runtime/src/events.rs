//! # Event Bus
//!
//! Typed publish/subscribe built on `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! - [`EventBus<E>`]: cloneable publisher handle. Every clone feeds the same
//!   channel; emitting never blocks and never waits for subscribers.
//! - [`EventStream<E>`]: one subscriber. It receives every event emitted after
//!   it was created, optionally filtered. Dropping it (or calling
//!   [`EventStream::unsubscribe`]) detaches it; attaching or detaching
//!   observers has no effect on publishers.
//!
//! ```text
//! ┌───────────┐  emit   ┌───────────┐  recv   ┌──────────────┐
//! │ publisher ├────────>│ EventBus  ├────────>│ EventStream  │
//! └───────────┘         │(broadcast)├────────>│ EventStream  │
//!                       └───────────┘         └──────────────┘
//! ```
//!
//! ## Lagging
//!
//! Each subscriber buffers at most `capacity` events. A subscriber that falls
//! further behind gets `RecvError::Lagged(n)` once and then continues with the
//! oldest retained event. `RecvError::Closed` means every publisher is gone.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::EventBus;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus: EventBus<u32> = EventBus::new(16);
//! let mut stream = bus.subscribe();
//!
//! bus.emit(7).ok();
//! assert_eq!(stream.recv().await.unwrap(), 7);
//! # }
//! ```

use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};

/// Default per-subscriber buffer size.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Central publisher for events of type `E`.
pub struct EventBus<E> {
    sender: broadcast::Sender<E>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<E: Clone + Send + 'static> EventBus<E> {
    /// Creates a bus whose subscribers each buffer up to `capacity` events.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to every current subscriber.
    ///
    /// Returns the number of subscribers that will see it, or an error when
    /// nobody is listening. Publishers normally ignore that error.
    pub fn emit(&self, event: E) -> Result<usize, SendError<E>> {
        self.sender.send(event)
    }

    /// Attaches a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> EventStream<E> {
        EventStream::new(self.sender.subscribe())
    }

    /// Number of attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<E: Clone + Send + 'static> Default for EventBus<E> {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.sender.receiver_count())
            .finish()
    }
}

type EventFilter<E> = Box<dyn Fn(&E) -> bool + Send + Sync>;

/// A single subscription to an [`EventBus`].
pub struct EventStream<E> {
    receiver: broadcast::Receiver<E>,
    filter: Option<EventFilter<E>>,
}

impl<E: Clone> EventStream<E> {
    fn new(receiver: broadcast::Receiver<E>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only deliver events for which `predicate` returns `true`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &E) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Waits for the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// `RecvError::Lagged(n)` if this subscriber missed `n` events,
    /// `RecvError::Closed` once every publisher has been dropped.
    pub async fn recv(&mut self) -> Result<E, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Returns the next buffered event without waiting, or `None` if nothing
    /// matching is buffered right now.
    pub fn try_recv(&mut self) -> Option<Result<E, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }

    /// Drains every buffered event that passes the filter, skipping over lag.
    pub fn drain(&mut self) -> Vec<E> {
        let mut events = Vec::new();
        while let Some(result) = self.try_recv() {
            match result {
                Ok(event) => events.push(event),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
        events
    }

    /// Detaches from the bus. Equivalent to dropping the stream.
    pub fn unsubscribe(self) {}
}

impl<E> fmt::Debug for EventStream<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}
