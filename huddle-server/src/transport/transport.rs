use huddle_core::{PeerId, RoomId, ServerEvent};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Привязка соединения к участнику и комнате, устанавливается в момент `join-room`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub room: RoomId,
    pub participant: PeerId,
}

/// Одно сигнальное соединение (обычно WebSocket).
///
/// Все обработчики одного транспорта вызываются последовательно владельцем
/// `&mut Transport`, поэтому привязка не требует синхронизации.
pub struct Transport {
    id: Uuid,
    tx: mpsc::UnboundedSender<ServerEvent>,
    binding: Option<Binding>,
}

impl Transport {
    pub fn new(tx: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tx,
            binding: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn binding(&self) -> Option<&Binding> {
        self.binding.as_ref()
    }

    pub fn participant(&self) -> Option<&PeerId> {
        self.binding.as_ref().map(|binding| &binding.participant)
    }

    pub(crate) fn sender(&self) -> mpsc::UnboundedSender<ServerEvent> {
        self.tx.clone()
    }

    pub(crate) fn bind(&mut self, binding: Binding) {
        self.binding = Some(binding);
    }

    pub(crate) fn take_binding(&mut self) -> Option<Binding> {
        self.binding.take()
    }

    /// Returns `false` once the writer side of the connection is gone.
    pub fn send(&self, event: ServerEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}
