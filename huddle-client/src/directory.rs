use crate::media::MediaCapability;
use crate::negotiation::{NegotiationPhase, SessionContext, SessionHandle, spawn_session};
use huddle_core::{PeerId, SdpType, SignalPayload};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Не больше одной сессии на удалённого участника.
pub struct SessionDirectory<C: MediaCapability> {
    ctx: Arc<SessionContext<C>>,
    sessions: HashMap<PeerId, SessionHandle>,
}

impl<C: MediaCapability> SessionDirectory<C> {
    pub fn new(ctx: SessionContext<C>) -> Self {
        Self {
            ctx: Arc::new(ctx),
            sessions: HashMap::new(),
        }
    }

    pub fn local_id(&self) -> &PeerId {
        &self.ctx.local
    }

    /// Returns the session with `peer`, creating it if there is none yet.
    pub fn ensure(&mut self, peer: &PeerId, initiator: bool) -> &SessionHandle {
        let ctx = &self.ctx;
        self.sessions.entry(peer.clone()).or_insert_with(|| {
            info!(
                "Opening session with {} ({})",
                peer,
                if initiator { "initiator" } else { "responder" }
            );
            spawn_session(Arc::clone(ctx), peer.clone(), initiator)
        })
    }

    /// Routes a signal to the session with `from`. Only an offer opens a
    /// responder session; anything else from an unknown peer is dropped.
    pub fn deliver(&mut self, from: &PeerId, payload: SignalPayload) {
        if from == &self.ctx.local {
            debug!("Ignoring signal that claims to come from ourselves");
            return;
        }
        let is_offer = matches!(
            &payload,
            SignalPayload::Description { sdp } if sdp.sdp_type == SdpType::Offer
        );
        if !is_offer && !self.sessions.contains_key(from) {
            warn!(
                "Dropping {} from {}: no session and not an offer",
                payload_kind(&payload),
                from
            );
            return;
        }
        let session = self.ensure(from, false);
        if !session.deliver(payload) {
            debug!("Session with {} is gone, dropping signal", from);
        }
    }

    /// Closes and forgets the session with `peer`. Safe to call for unknown peers.
    pub fn remove(&mut self, peer: &PeerId) -> bool {
        match self.sessions.remove(peer) {
            Some(mut session) => {
                session.shutdown();
                info!("Closing session with {}", peer);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, peer: &PeerId) -> Option<&SessionHandle> {
        self.sessions.get(peer)
    }

    pub fn phase_of(&self, peer: &PeerId) -> Option<NegotiationPhase> {
        self.sessions.get(peer).map(SessionHandle::phase)
    }

    pub fn contains(&self, peer: &PeerId) -> bool {
        self.sessions.contains_key(peer)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn peers(&self) -> Vec<PeerId> {
        self.sessions.keys().cloned().collect()
    }

    /// Closes every session and waits for each media session to shut down.
    pub async fn close_all(&mut self) {
        let sessions: Vec<SessionHandle> = self.sessions.drain().map(|(_, s)| s).collect();
        futures::future::join_all(sessions.into_iter().map(SessionHandle::close)).await;
    }
}

fn payload_kind(payload: &SignalPayload) -> &'static str {
    match payload {
        SignalPayload::Description { sdp } => match sdp.sdp_type {
            SdpType::Offer => "offer",
            SdpType::Answer => "answer",
        },
        SignalPayload::Candidate { .. } => "candidate",
    }
}
