use crate::directory::SessionDirectory;
use crate::error::ClientError;
use crate::media::MediaCapability;
use crate::negotiation::{
    DEFAULT_MAX_ICE_RESTARTS, NegotiationPhase, PeerEventSender, SignalSender,
};
use huddle_core::{ClientEvent, IceServerConfig, PeerId, RoomId};
use std::sync::Arc;
use tracing::info;

mod handle_signal_impl;
mod ws_setup_impl;

pub use ws_setup_impl::*;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub url: String,
    pub room: RoomId,
    /// Желаемый идентификатор; без него сервер выдаст свой.
    pub participant: Option<PeerId>,
    /// Перекрывает список, присланный сервером в `welcome`.
    pub ice_servers: Option<Vec<IceServerConfig>>,
    pub max_ice_restarts: u32,
}

impl EngineConfig {
    pub fn new(url: impl Into<String>, room: impl Into<RoomId>) -> Self {
        Self {
            url: url.into(),
            room: room.into(),
            participant: None,
            ice_servers: None,
            max_ice_restarts: DEFAULT_MAX_ICE_RESTARTS,
        }
    }

    pub fn with_participant(mut self, participant: impl Into<PeerId>) -> Self {
        self.participant = Some(participant.into());
        self
    }

    pub fn with_ice_servers(mut self, ice_servers: Vec<IceServerConfig>) -> Self {
        self.ice_servers = Some(ice_servers);
        self
    }
}

/// Huddle client room state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Участник комнаты: держит локальные медиа и по сессии на каждого
/// другого участника, реагируя на события сигнального сервера.
pub struct ParticipantEngine<C: MediaCapability> {
    config: EngineConfig,
    capability: Arc<C>,
    local_media: Arc<C::LocalMedia>,
    outbound: SignalSender,
    events: PeerEventSender<C::Track>,
    state: ConnectionState,
    directory: Option<SessionDirectory<C>>,
}

impl<C: MediaCapability> ParticipantEngine<C> {
    /// Captures local media, then asks the relay to join the configured room.
    ///
    /// Nothing is sent when capture fails.
    pub async fn join(
        capability: C,
        config: EngineConfig,
        outbound: SignalSender,
        events: PeerEventSender<C::Track>,
    ) -> Result<Self, ClientError> {
        let local_media = capability.capture().await.map_err(ClientError::Capture)?;

        let join = ClientEvent::JoinRoom {
            room: config.room.clone(),
            participant: config.participant.clone(),
        };
        outbound.send(join).map_err(|_| ClientError::Disconnected)?;
        info!("Joining room '{}'", config.room);

        Ok(Self {
            config,
            capability: Arc::new(capability),
            local_media: Arc::new(local_media),
            outbound,
            events,
            state: ConnectionState::Connecting,
            directory: None,
        })
    }

    /// Leaves the room and waits until every media session is released.
    pub async fn leave(&mut self) {
        if self.outbound.send(ClientEvent::LeaveRoom).is_err() {
            info!("Signaling channel already closed while leaving");
        }
        self.close_sessions().await;
        info!("Left room '{}'", self.config.room);
    }

    pub(crate) async fn close_sessions(&mut self) {
        if let Some(mut directory) = self.directory.take() {
            directory.close_all().await;
        }
        self.state = ConnectionState::Disconnected;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Identity bound by the relay, known after `welcome`.
    pub fn local_id(&self) -> Option<&PeerId> {
        self.directory.as_ref().map(SessionDirectory::local_id)
    }

    pub fn session_count(&self) -> usize {
        self.directory.as_ref().map_or(0, SessionDirectory::len)
    }

    pub fn has_session(&self, peer: &PeerId) -> bool {
        self.directory.as_ref().is_some_and(|d| d.contains(peer))
    }

    pub fn phase_of(&self, peer: &PeerId) -> Option<NegotiationPhase> {
        self.directory.as_ref().and_then(|d| d.phase_of(peer))
    }

    pub fn directory(&self) -> Option<&SessionDirectory<C>> {
        self.directory.as_ref()
    }
}
