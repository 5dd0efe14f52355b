use crate::room::Room;
use dashmap::DashMap;
use huddle_core::{PeerId, RoomId};
use std::sync::Arc;
use tracing::{debug, info};

/// Реестр комнат: код комнаты -> текущий состав.
///
/// Все мутации одной комнаты выполняются под блокировкой её записи в `DashMap`,
/// так что снимок состава при входе всегда согласован с параллельными входами
/// и выходами. Пустая комната удаляется сразу же.
#[derive(Clone, Default)]
pub struct RoomRegistry {
    rooms: Arc<DashMap<RoomId, Room>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Добавляет участника в комнату (создавая её при необходимости)
    /// и возвращает всех остальных, кто был в комнате до него.
    pub fn join(&self, room_id: &RoomId, peer_id: &PeerId) -> Vec<PeerId> {
        self.join_with(room_id, peer_id, |_| {})
    }

    /// То же, что [`join`](Self::join), но `on_joined` получает состав,
    /// пока запись комнаты ещё заблокирована: уведомления, поставленные
    /// в очередь внутри, не обгонят события параллельных входов и выходов.
    pub fn join_with<F>(&self, room_id: &RoomId, peer_id: &PeerId, on_joined: F) -> Vec<PeerId>
    where
        F: FnOnce(&[PeerId]),
    {
        let mut room = self.rooms.entry(room_id.clone()).or_insert_with(|| {
            info!("Creating new room: {}", room_id);
            Room::default()
        });

        let roster = room.members_excluding(peer_id);
        if room.insert(peer_id.clone()) {
            debug!(
                "Peer {} joined room {} ({} members)",
                peer_id,
                room_id,
                room.len()
            );
        }
        on_joined(&roster);
        roster
    }

    /// Убирает участника. Вызов для отсутствующего участника или комнаты ничего не делает.
    pub fn leave(&self, room_id: &RoomId, peer_id: &PeerId) -> bool {
        self.leave_with(room_id, peer_id, |_| {})
    }

    /// `on_left` видит оставшихся участников под блокировкой комнаты и
    /// вызывается только если участник действительно был в ней.
    pub fn leave_with<F>(&self, room_id: &RoomId, peer_id: &PeerId, on_left: F) -> bool
    where
        F: FnOnce(&[PeerId]),
    {
        let removed = match self.rooms.get_mut(room_id) {
            Some(mut room) => {
                let removed = room.remove(peer_id);
                if removed {
                    on_left(room.members());
                }
                removed
            }
            None => false,
        };

        if self
            .rooms
            .remove_if(room_id, |_, room| room.is_empty())
            .is_some()
        {
            info!("Room {} is empty, removing", room_id);
        }

        removed
    }

    pub fn members_excluding(&self, room_id: &RoomId, peer_id: &PeerId) -> Vec<PeerId> {
        self.rooms
            .get(room_id)
            .map(|room| room.members_excluding(peer_id))
            .unwrap_or_default()
    }

    pub fn members(&self, room_id: &RoomId) -> Vec<PeerId> {
        self.rooms
            .get(room_id)
            .map(|room| room.members().to_vec())
            .unwrap_or_default()
    }

    pub fn is_member(&self, room_id: &RoomId, peer_id: &PeerId) -> bool {
        self.rooms
            .get(room_id)
            .is_some_and(|room| room.contains(peer_id))
    }

    pub fn contains_room(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
