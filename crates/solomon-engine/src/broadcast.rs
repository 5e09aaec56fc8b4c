//! Per-session fan-out of stream events.
//!
//! Each subscriber owns an unbounded queue with a tracked depth. Publishing
//! never blocks:
//! - partial text chunks are skipped for a subscriber whose depth has
//!   reached the soft limit;
//! - every other event is always enqueued;
//! - a subscriber whose depth reaches the hard limit is evicted, after a
//!   final `error` event telling it why.
//!
//! The hub itself is not synchronised; it lives inside the session state and
//! is only touched under the session lock, which is what orders events.

use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::Stream;
use solomon_common::StreamEvent;
use tokio::sync::mpsc;
use tracing::warn;

struct Subscriber {
    id: u64,
    tx: mpsc::UnboundedSender<StreamEvent>,
    depth: Arc<AtomicUsize>,
}

pub struct BroadcastHub {
    subscribers: Vec<Subscriber>,
    soft_limit: usize,
    hard_limit: usize,
    next_id: u64,
    closed: bool,
}

impl BroadcastHub {
    pub fn new(soft_limit: usize, hard_limit: usize) -> Self {
        Self {
            subscribers: Vec::new(),
            soft_limit,
            hard_limit: hard_limit.max(soft_limit),
            next_id: 0,
            closed: false,
        }
    }

    /// Register a new observer. After termination the returned stream is
    /// already finished.
    pub fn subscribe(&mut self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let depth = Arc::new(AtomicUsize::new(0));
        if !self.closed {
            self.next_id += 1;
            self.subscribers.push(Subscriber {
                id: self.next_id,
                tx,
                depth: Arc::clone(&depth),
            });
        }
        Subscription { rx, depth }
    }

    /// Deliver `event` to every live subscriber. Returns how many received it.
    pub fn publish(&mut self, event: &StreamEvent) -> usize {
        if self.closed {
            return 0;
        }

        let soft = self.soft_limit;
        let hard = self.hard_limit;
        let mut delivered = 0;

        self.subscribers.retain(|sub| {
            let depth = sub.depth.load(Ordering::Acquire);
            if depth >= hard {
                warn!(subscriber = sub.id, depth, "Evicting subscriber that fell too far behind");
                sub.depth.fetch_add(1, Ordering::AcqRel);
                let _ = sub.tx.send(StreamEvent::Error {
                    error: "subscription closed: too far behind".into(),
                });
                return false;
            }
            if event.is_lossy() && depth >= soft {
                return true;
            }
            sub.depth.fetch_add(1, Ordering::AcqRel);
            if sub.tx.send(event.clone()).is_err() {
                // Receiver dropped: the observer went away.
                return false;
            }
            delivered += 1;
            true
        });

        delivered
    }

    /// Close every subscriber exactly once. Returns `false` if already closed.
    pub fn terminate(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        self.subscribers.clear();
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// One observer's view of a session's events. Ends when the session ends,
/// the observer is evicted, or the hub is dropped.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<StreamEvent>,
    depth: Arc<AtomicUsize>,
}

impl Subscription {
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        let event = self.rx.recv().await;
        if event.is_some() {
            self.depth.fetch_sub(1, Ordering::AcqRel);
        }
        event
    }

    /// Take an already-queued event without waiting.
    pub fn try_recv(&mut self) -> Option<StreamEvent> {
        let event = self.rx.try_recv().ok();
        if event.is_some() {
            self.depth.fetch_sub(1, Ordering::AcqRel);
        }
        event
    }
}

impl Stream for Subscription {
    type Item = StreamEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.rx.poll_recv(cx) {
            Poll::Ready(Some(event)) => {
                this.depth.fetch_sub(1, Ordering::AcqRel);
                Poll::Ready(Some(event))
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use solomon_common::MessageRole;

    fn msg(text: &str) -> StreamEvent {
        StreamEvent::message(MessageRole::Assistant, text)
    }

    fn drain(sub: &mut Subscription) -> Vec<StreamEvent> {
        std::iter::from_fn(|| sub.try_recv()).collect()
    }

    #[tokio::test]
    async fn every_subscriber_sees_every_event_in_order() {
        let mut hub = BroadcastHub::new(8, 64);
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();

        assert_eq!(hub.publish(&msg("one")), 2);
        assert_eq!(hub.publish(&StreamEvent::Done), 2);

        for sub in [&mut a, &mut b] {
            assert_eq!(sub.recv().await, Some(msg("one")));
            assert_eq!(sub.recv().await, Some(StreamEvent::Done));
        }
    }

    #[test]
    fn late_subscriber_misses_earlier_events() {
        let mut hub = BroadcastHub::new(8, 64);
        hub.publish(&msg("early"));
        let mut late = hub.subscribe();
        hub.publish(&msg("late"));
        assert_eq!(drain(&mut late), vec![msg("late")]);
    }

    #[test]
    fn slow_subscriber_loses_chunks_but_not_reliable_events() {
        let mut hub = BroadcastHub::new(2, 100);
        let mut slow = hub.subscribe();

        hub.publish(&msg("a"));
        hub.publish(&msg("b"));
        // At the soft limit: chunks are skipped, the rest still queue.
        hub.publish(&StreamEvent::chunk("dropped"));
        hub.publish(&StreamEvent::Error { error: "kept".into() });

        let events = drain(&mut slow);
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| !e.is_lossy()));
        assert_eq!(events[2], StreamEvent::Error { error: "kept".into() });
    }

    #[test]
    fn subscriber_past_hard_limit_is_evicted() {
        let mut hub = BroadcastHub::new(1, 3);
        let mut stuck = hub.subscribe();
        let mut reader = hub.subscribe();

        for i in 0..3 {
            hub.publish(&msg(&i.to_string()));
            drain(&mut reader);
        }
        assert_eq!(hub.subscriber_count(), 2);

        hub.publish(&msg("overflow"));
        assert_eq!(hub.subscriber_count(), 1);

        let events = drain(&mut stuck);
        assert_eq!(events.len(), 4);
        assert!(matches!(events.last(), Some(StreamEvent::Error { .. })));
        assert_eq!(drain(&mut reader), vec![msg("overflow")]);
    }

    #[tokio::test]
    async fn terminate_closes_streams_once() {
        let mut hub = BroadcastHub::new(8, 64);
        let mut sub = hub.subscribe();
        hub.publish(&msg("last words"));

        assert!(hub.terminate());
        assert!(!hub.terminate());
        assert_eq!(hub.publish(&msg("ignored")), 0);

        assert_eq!(sub.recv().await, Some(msg("last words")));
        assert_eq!(sub.recv().await, None);
        assert_eq!(sub.recv().await, None);
    }

    #[tokio::test]
    async fn subscribe_after_terminate_is_finished() {
        let mut hub = BroadcastHub::new(8, 64);
        hub.terminate();
        let mut sub = hub.subscribe();
        assert_eq!(sub.next().await, None);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn dropped_receiver_is_pruned() {
        let mut hub = BroadcastHub::new(8, 64);
        let sub = hub.subscribe();
        drop(sub);
        assert_eq!(hub.publish(&msg("x")), 0);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn stream_impl_tracks_backlog() {
        let mut hub = BroadcastHub::new(8, 64);
        let mut sub = hub.subscribe();
        hub.publish(&msg("a"));
        hub.publish(&msg("b"));
        assert_eq!(sub.depth.load(Ordering::Acquire), 2);
        assert_eq!(sub.next().await, Some(msg("a")));
        assert_eq!(sub.depth.load(Ordering::Acquire), 1);
    }
}
