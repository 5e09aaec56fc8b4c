//! Per-session turn sequencing.
//!
//! Every turn takes a ticket while the session lock is held, so tickets follow
//! message order. A turn may only start once every lower ticket has finished.

use tokio::sync::watch;

pub(crate) struct TurnQueue {
    completed: watch::Sender<u64>,
}

impl TurnQueue {
    pub(crate) fn new() -> Self {
        let (completed, _) = watch::channel(0);
        Self { completed }
    }

    /// Wait until all turns before `ticket` are done. The returned guard marks
    /// `ticket` as done when dropped.
    pub(crate) async fn wait_for(&self, ticket: u64) -> TurnGuard<'_> {
        let mut rx = self.completed.subscribe();
        // The sender lives in `self`, so this cannot fail while we borrow it.
        let _ = rx.wait_for(|done| *done >= ticket).await;
        TurnGuard {
            queue: self,
            ticket,
        }
    }

    pub(crate) fn completed(&self) -> u64 {
        *self.completed.borrow()
    }

    fn advance_past(&self, ticket: u64) {
        self.completed.send_modify(|done| {
            if *done <= ticket {
                *done = ticket + 1;
            }
        });
    }
}

/// Releases the next turn when dropped, including on early return or panic.
pub(crate) struct TurnGuard<'a> {
    queue: &'a TurnQueue,
    ticket: u64,
}

impl TurnGuard<'_> {
    pub(crate) fn ticket(&self) -> u64 {
        self.ticket
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.queue.advance_past(self.ticket);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    #[tokio::test]
    async fn first_ticket_runs_immediately() {
        let queue = TurnQueue::new();
        let guard = queue.wait_for(0).await;
        assert_eq!(guard.ticket(), 0);
        drop(guard);
        assert_eq!(queue.completed(), 1);
    }

    #[tokio::test]
    async fn later_tickets_wait_for_earlier_ones() {
        let queue = Arc::new(TurnQueue::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for ticket in (0..3u64).rev() {
            let queue = Arc::clone(&queue);
            let order = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                let _turn = queue.wait_for(ticket).await;
                order.lock().await.push(ticket);
                tokio::time::sleep(Duration::from_millis(5)).await;
                order.lock().await.push(ticket);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(*order.lock().await, vec![0, 0, 1, 1, 2, 2]);
    }
}
