mod negotiator;
mod session;

pub use negotiator::*;
pub use session::*;

use crate::media::ConnectivityState;
use huddle_core::{ClientEvent, IceServerConfig, PeerId, SignalPayload};
use tokio::sync::mpsc;

pub const DEFAULT_MAX_ICE_RESTARTS: u32 = 3;

/// Фаза рукопожатия с одним удалённым участником.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationPhase {
    Idle,
    HaveLocalOffer,
    HaveRemoteOffer,
    Stable,
    Closed,
}

#[derive(Debug, Clone)]
pub struct NegotiationConfig {
    pub ice_servers: Vec<IceServerConfig>,
    pub max_ice_restarts: u32,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            ice_servers: huddle_core::utils::default_ice_servers(),
            max_ice_restarts: DEFAULT_MAX_ICE_RESTARTS,
        }
    }
}

/// Исходящие сигналы всех сессий сливаются в одну очередь транспорта.
pub type SignalSender = mpsc::UnboundedSender<ClientEvent<SignalPayload>>;

/// События для слоя UI.
#[derive(Debug)]
pub enum PeerEvent<T> {
    PhaseChanged {
        peer: PeerId,
        phase: NegotiationPhase,
    },
    RemoteTrack {
        peer: PeerId,
        track: T,
    },
    Connectivity {
        peer: PeerId,
        state: ConnectivityState,
    },
    /// ICE restarts are exhausted; the session stays open.
    Degraded {
        peer: PeerId,
    },
    Closed {
        peer: PeerId,
    },
}

pub type PeerEventSender<T> = mpsc::UnboundedSender<PeerEvent<T>>;
