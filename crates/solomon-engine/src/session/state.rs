use chrono::{DateTime, Utc};
use solomon_common::{ActionId, ActionStatus, AiAction, Message, SessionStatus, StreamEvent};

use crate::broadcast::BroadcastHub;

/// Everything about a session that changes after creation. Only ever
/// touched under the session lock, and never across an await.
pub(crate) struct SessionState {
    pub(crate) status: SessionStatus,
    pub(crate) ended_at: Option<DateTime<Utc>>,
    pub(crate) messages: Vec<Message>,
    /// In proposal order.
    pub(crate) actions: Vec<AiAction>,
    pub(crate) hub: BroadcastHub,
    pub(crate) last_activity: DateTime<Utc>,
    /// Ticket handed to the next scheduled turn.
    pub(crate) next_turn: u64,
}

impl SessionState {
    pub(crate) fn new(system_prompt: String, hub: BroadcastHub) -> Self {
        Self {
            status: SessionStatus::Active,
            ended_at: None,
            messages: vec![Message::system(system_prompt)],
            actions: Vec::new(),
            hub,
            last_activity: Utc::now(),
            next_turn: 0,
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    pub(crate) fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    pub(crate) fn publish(&mut self, event: StreamEvent) {
        self.hub.publish(&event);
    }

    /// Append a message and announce it.
    pub(crate) fn record(&mut self, message: Message) {
        let event = StreamEvent::message(message.role, message.content.clone());
        self.messages.push(message);
        self.touch();
        self.publish(event);
    }

    pub(crate) fn take_ticket(&mut self) -> u64 {
        let ticket = self.next_turn;
        self.next_turn += 1;
        ticket
    }

    pub(crate) fn action(&self, id: ActionId) -> Option<&AiAction> {
        self.actions.iter().find(|a| a.id == id)
    }

    pub(crate) fn action_mut(&mut self, id: ActionId) -> Option<&mut AiAction> {
        self.actions.iter_mut().find(|a| a.id == id)
    }

    pub(crate) fn pending_count(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| a.status == ActionStatus::Pending)
            .count()
    }
}
