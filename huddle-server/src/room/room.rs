use huddle_core::PeerId;

/// Состав одной комнаты. Порядок хранения совпадает с порядком входа,
/// поэтому ростер, отдаваемый новому участнику, детерминирован.
#[derive(Debug, Default)]
pub struct Room {
    members: Vec<PeerId>,
}

impl Room {
    pub fn insert(&mut self, peer_id: PeerId) -> bool {
        if self.contains(&peer_id) {
            return false;
        }
        self.members.push(peer_id);
        true
    }

    pub fn remove(&mut self, peer_id: &PeerId) -> bool {
        let before = self.members.len();
        self.members.retain(|member| member != peer_id);
        self.members.len() != before
    }

    pub fn contains(&self, peer_id: &PeerId) -> bool {
        self.members.iter().any(|member| member == peer_id)
    }

    pub fn members_excluding(&self, peer_id: &PeerId) -> Vec<PeerId> {
        self.members
            .iter()
            .filter(|member| *member != peer_id)
            .cloned()
            .collect()
    }

    pub fn members(&self) -> &[PeerId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
