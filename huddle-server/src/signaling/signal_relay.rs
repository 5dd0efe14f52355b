use crate::room::RoomRegistry;
use crate::transport::{Binding, Transport};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use huddle_core::{ClientEvent, IceServerConfig, PeerId, RoomId, ServerEvent};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

struct PeerEntry {
    connection: Uuid,
    tx: mpsc::UnboundedSender<ServerEvent>,
}

struct RelayInner {
    peers: DashMap<PeerId, PeerEntry>,
    registry: RoomRegistry,
    ice_servers: Vec<IceServerConfig>,
}

/// Сигнальный ретранслятор: вводит участников комнаты друг другу и
/// пересылает непрозрачные сигналы адресату по его идентификатору.
///
/// Поле `from` всегда берётся из привязки транспорта, а не из данных клиента.
#[derive(Clone)]
pub struct SignalRelay {
    inner: Arc<RelayInner>,
}

impl SignalRelay {
    pub fn new(registry: RoomRegistry, ice_servers: Vec<IceServerConfig>) -> Self {
        Self {
            inner: Arc::new(RelayInner {
                peers: DashMap::new(),
                registry,
                ice_servers,
            }),
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.inner.registry
    }

    pub fn get_ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    /// Opens a new unbound transport together with the queue its writer drains.
    pub fn connect(&self) -> (Transport, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Transport::new(tx), rx)
    }

    pub fn handle_event(&self, transport: &mut Transport, event: ClientEvent) {
        match event {
            ClientEvent::JoinRoom { room, participant } => {
                self.on_join(transport, room, participant);
            }
            ClientEvent::Signal { to, signal } => {
                self.on_signal(transport, to, signal);
            }
            ClientEvent::LeaveRoom => {
                self.on_disconnect(transport);
            }
        }
    }

    pub fn on_join(&self, transport: &mut Transport, room: RoomId, participant: Option<PeerId>) {
        if let Some(binding) = transport.binding() {
            warn!(
                "Transport {} already joined room {} as {}, ignoring join to '{}'",
                transport.id(),
                binding.room,
                binding.participant,
                room
            );
            transport.send(ServerEvent::Error {
                message: format!("already joined room {}", binding.room),
            });
            return;
        }

        let participant = participant.unwrap_or_else(PeerId::new);

        match self.inner.peers.entry(participant.clone()) {
            Entry::Occupied(_) => {
                warn!(
                    "Participant id {} is already bound to another transport",
                    participant
                );
                transport.send(ServerEvent::Error {
                    message: format!("participant id {} is already in use", participant),
                });
                return;
            }
            Entry::Vacant(slot) => {
                slot.insert(PeerEntry {
                    connection: transport.id(),
                    tx: transport.sender(),
                });
            }
        }

        transport.bind(Binding {
            room: room.clone(),
            participant: participant.clone(),
        });

        // Welcome and roster are queued under the room lock, so a concurrent
        // leave or join reaches the joiner only after its own welcome.
        let joiner = &*transport;
        let roster = self.inner.registry.join_with(&room, &participant, |roster| {
            for member in roster {
                self.send_event(member, ServerEvent::UserConnected(participant.clone()));
            }
            joiner.send(ServerEvent::Welcome {
                participant: participant.clone(),
                ice_servers: self.get_ice_servers(),
            });
            joiner.send(ServerEvent::ExistingUsers(roster.to_vec()));
        });
        info!(
            "Peer {} joined room '{}' ({} already there)",
            participant,
            room,
            roster.len()
        );
    }

    pub fn on_signal(&self, transport: &Transport, to: PeerId, signal: Value) {
        let Some(binding) = transport.binding() else {
            warn!(
                "Dropping signal from transport {} that has not joined a room",
                transport.id()
            );
            return;
        };

        if to == binding.participant {
            debug!("Dropping signal {} addressed to itself", to);
            return;
        }

        if !self.inner.registry.is_member(&binding.room, &to) {
            debug!(
                "Dropping signal {} -> {}: recipient not in room {}",
                binding.participant, to, binding.room
            );
            return;
        }

        self.send_event(
            &to,
            ServerEvent::Signal {
                from: binding.participant.clone(),
                signal,
            },
        );
    }

    /// Idempotent: the binding is taken on the first call, later calls find nothing to undo.
    pub fn on_disconnect(&self, transport: &mut Transport) {
        let Some(Binding { room, participant }) = transport.take_binding() else {
            return;
        };

        let mut remaining = 0;
        self.inner.registry.leave_with(&room, &participant, |members| {
            remaining = members.len();
            for member in members {
                self.send_event(member, ServerEvent::UserDisconnected(participant.clone()));
            }
        });
        self.inner
            .peers
            .remove_if(&participant, |_, entry| entry.connection == transport.id());

        info!(
            "Peer {} left room '{}' ({} remaining)",
            participant, room, remaining
        );
    }

    pub fn is_connected(&self, peer_id: &PeerId) -> bool {
        self.inner.peers.contains_key(peer_id)
    }

    fn send_event(&self, peer_id: &PeerId, event: ServerEvent) -> bool {
        let Some(peer) = self.inner.peers.get(peer_id) else {
            debug!("Attempted to send event to disconnected user {}", peer_id);
            return false;
        };

        if let Err(e) = peer.tx.send(event) {
            error!("Failed to queue event for {}: {}", peer_id, e);
            return false;
        }
        true
    }
}
