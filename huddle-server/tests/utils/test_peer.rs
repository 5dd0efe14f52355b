use huddle_core::{ClientEvent, PeerId, RoomId, ServerEvent};
use huddle_server::{SignalRelay, Transport};
use serde_json::Value;
use tokio::sync::mpsc;

use super::event_helpers::drain_events;

/// An in-process participant: a transport bound to the relay plus its outbound queue.
pub struct TestPeer {
    pub id: PeerId,
    pub transport: Transport,
    pub rx: mpsc::UnboundedReceiver<ServerEvent>,
    /// Events drained while looking for the roster, kept for `events()`.
    pending: Vec<ServerEvent>,
}

impl TestPeer {
    pub fn new(relay: &SignalRelay, id: &str) -> Self {
        let (transport, rx) = relay.connect();
        Self {
            id: PeerId::from(id),
            transport,
            rx,
            pending: Vec::new(),
        }
    }

    /// Join `room` and return the roster delivered in `existing-users`.
    pub fn join(&mut self, relay: &SignalRelay, room: &str) -> Vec<PeerId> {
        relay.handle_event(
            &mut self.transport,
            ClientEvent::JoinRoom {
                room: RoomId::from(room),
                participant: Some(self.id.clone()),
            },
        );

        let mut roster = Vec::new();
        for event in drain_events(&mut self.rx) {
            match event {
                ServerEvent::ExistingUsers(users) => roster = users,
                ServerEvent::Welcome { .. } => {}
                other => self.pending.push(other),
            }
        }
        roster
    }

    pub fn signal(&mut self, relay: &SignalRelay, to: &PeerId, signal: Value) {
        relay.handle_event(
            &mut self.transport,
            ClientEvent::Signal {
                to: to.clone(),
                signal,
            },
        );
    }

    pub fn disconnect(&mut self, relay: &SignalRelay) {
        relay.on_disconnect(&mut self.transport);
    }

    pub fn events(&mut self) -> Vec<ServerEvent> {
        let mut events = std::mem::take(&mut self.pending);
        events.extend(drain_events(&mut self.rx));
        events
    }
}
