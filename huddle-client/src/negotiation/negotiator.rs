use crate::error::NegotiationError;
use crate::media::{ConnectivityState, MediaSession};
use crate::negotiation::{NegotiationPhase, SignalSender};
use huddle_core::{ClientEvent, IceCandidate, PeerId, SdpType, SessionDescription, SignalPayload};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Итог обработки сообщения о связности.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartOutcome {
    Ignored,
    Restarted,
    Exhausted,
}

/// Машина состояний offer/answer для одной пары участников.
///
/// Владеет медиа-сессией и очередью кандидатов, пришедших раньше удалённого
/// описания. При glare уступает сторона с большим `PeerId`: она откатывает
/// свой offer и отвечает на чужой, меньшая сторона чужой offer игнорирует.
pub struct Negotiator<S: MediaSession> {
    local: PeerId,
    remote: PeerId,
    initiator: bool,
    media: S,
    phase: NegotiationPhase,
    remote_description_set: bool,
    pending_candidates: VecDeque<IceCandidate>,
    ice_restarts: u32,
    max_ice_restarts: u32,
    outbound: SignalSender,
}

impl<S: MediaSession> Negotiator<S> {
    pub fn new(
        local: PeerId,
        remote: PeerId,
        initiator: bool,
        media: S,
        max_ice_restarts: u32,
        outbound: SignalSender,
    ) -> Self {
        Self {
            local,
            remote,
            initiator,
            media,
            phase: NegotiationPhase::Idle,
            remote_description_set: false,
            pending_candidates: VecDeque::new(),
            ice_restarts: 0,
            max_ice_restarts,
            outbound,
        }
    }

    pub fn phase(&self) -> NegotiationPhase {
        self.phase
    }

    pub fn remote(&self) -> &PeerId {
        &self.remote
    }

    pub fn is_initiator(&self) -> bool {
        self.initiator
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending_candidates.len()
    }

    pub fn media(&self) -> &S {
        &self.media
    }

    /// Уступает ли эта сторона при одновременных offer.
    pub fn is_polite(&self) -> bool {
        self.local > self.remote
    }

    pub async fn start(&mut self) -> Result<(), NegotiationError> {
        if self.initiator {
            self.send_offer(false).await?;
        }
        Ok(())
    }

    pub async fn handle_signal(&mut self, payload: SignalPayload) -> Result<(), NegotiationError> {
        if self.phase == NegotiationPhase::Closed {
            return Err(NegotiationError::Closed);
        }

        match payload {
            SignalPayload::Description { sdp } => match sdp.sdp_type {
                SdpType::Offer => self.on_offer(sdp).await,
                SdpType::Answer => self.on_answer(sdp).await,
            },
            SignalPayload::Candidate { candidate } => self.on_candidate(candidate).await,
        }
    }

    async fn on_offer(&mut self, offer: SessionDescription) -> Result<(), NegotiationError> {
        match self.phase {
            NegotiationPhase::Idle | NegotiationPhase::Stable => {}
            NegotiationPhase::HaveLocalOffer => {
                if !self.is_polite() {
                    info!(
                        "Offer collision with {}: keeping local offer",
                        self.remote
                    );
                    return Ok(());
                }
                info!(
                    "Offer collision with {}: rolling back local offer",
                    self.remote
                );
                self.media.rollback().await?;
                self.phase = self.settled_phase();
            }
            NegotiationPhase::HaveRemoteOffer => {
                return Err(NegotiationError::Protocol(
                    "offer received while answering another offer".to_string(),
                ));
            }
            NegotiationPhase::Closed => return Err(NegotiationError::Closed),
        }

        let prior = self.phase;
        self.phase = NegotiationPhase::HaveRemoteOffer;

        if let Err(e) = self.media.set_remote_description(offer).await {
            self.phase = prior;
            return Err(e.into());
        }
        self.on_remote_description_applied().await;

        // The media layer already holds the remote offer, so a failed answer
        // leaves the phase at HaveRemoteOffer.
        let answer = self.create_and_apply_answer().await?;

        self.phase = NegotiationPhase::Stable;
        self.send(SignalPayload::Description { sdp: answer });
        debug!("Answered offer from {}", self.remote);
        Ok(())
    }

    async fn create_and_apply_answer(&mut self) -> Result<SessionDescription, NegotiationError> {
        let answer = self.media.create_answer().await?;
        self.media.set_local_description(answer.clone()).await?;
        Ok(answer)
    }

    async fn on_answer(&mut self, answer: SessionDescription) -> Result<(), NegotiationError> {
        if self.phase != NegotiationPhase::HaveLocalOffer {
            return Err(NegotiationError::Protocol(format!(
                "answer received in phase {:?}",
                self.phase
            )));
        }

        self.media.set_remote_description(answer).await?;
        self.phase = NegotiationPhase::Stable;
        self.on_remote_description_applied().await;
        debug!("Negotiation with {} is stable", self.remote);
        Ok(())
    }

    async fn on_candidate(&mut self, candidate: IceCandidate) -> Result<(), NegotiationError> {
        if !self.remote_description_set {
            debug!("Queueing candidate from {} until remote description", self.remote);
            self.pending_candidates.push_back(candidate);
            return Ok(());
        }

        self.apply_candidate(candidate).await;
        Ok(())
    }

    async fn on_remote_description_applied(&mut self) {
        if self.remote_description_set {
            return;
        }
        self.remote_description_set = true;

        while let Some(candidate) = self.pending_candidates.pop_front() {
            self.apply_candidate(candidate).await;
        }
    }

    async fn apply_candidate(&self, candidate: IceCandidate) {
        if let Err(e) = self.media.add_candidate(candidate).await {
            warn!("Failed to add ICE candidate from {}: {:?}", self.remote, e);
        }
    }

    /// Публикует локальный кандидат удалённой стороне.
    pub fn send_local_candidate(&self, candidate: IceCandidate) {
        if self.phase == NegotiationPhase::Closed {
            return;
        }
        self.send(SignalPayload::Candidate { candidate });
    }

    /// Restarts ICE on `Failed`. `Disconnected` is left for the media layer to recover from.
    ///
    /// An offer still waiting for its answer counts as a failed attempt: it is
    /// rolled back and replaced with a fresh restart offer.
    pub async fn on_connectivity(
        &mut self,
        state: ConnectivityState,
    ) -> Result<RestartOutcome, NegotiationError> {
        match state {
            ConnectivityState::Connected => {
                self.ice_restarts = 0;
                Ok(RestartOutcome::Ignored)
            }
            ConnectivityState::Failed => {
                let unanswered = match self.phase {
                    NegotiationPhase::Stable => false,
                    NegotiationPhase::HaveLocalOffer => true,
                    phase => {
                        debug!(
                            "Connectivity to {} failed in phase {:?}, not restarting",
                            self.remote, phase
                        );
                        return Ok(RestartOutcome::Ignored);
                    }
                };
                if self.ice_restarts >= self.max_ice_restarts {
                    warn!(
                        "Connectivity to {} failed after {} ICE restarts",
                        self.remote, self.ice_restarts
                    );
                    return Ok(RestartOutcome::Exhausted);
                }

                self.ice_restarts += 1;
                if unanswered {
                    info!("Offer to {} was never answered, rolling it back", self.remote);
                    self.media.rollback().await?;
                    self.phase = self.settled_phase();
                }
                info!(
                    "Restarting ICE with {} (attempt {})",
                    self.remote, self.ice_restarts
                );
                self.send_offer(true).await?;
                Ok(RestartOutcome::Restarted)
            }
            _ => Ok(RestartOutcome::Ignored),
        }
    }

    async fn send_offer(&mut self, ice_restart: bool) -> Result<(), NegotiationError> {
        if !matches!(
            self.phase,
            NegotiationPhase::Idle | NegotiationPhase::Stable
        ) {
            return Err(NegotiationError::Protocol(format!(
                "cannot create offer in phase {:?}",
                self.phase
            )));
        }

        let offer = self.media.create_offer(ice_restart).await?;
        self.media.set_local_description(offer.clone()).await?;
        self.phase = NegotiationPhase::HaveLocalOffer;
        self.send(SignalPayload::Description { sdp: offer });
        debug!("Sent offer to {}", self.remote);
        Ok(())
    }

    /// Releases the media session. Only the first call has an effect.
    pub async fn close(&mut self) {
        if self.phase == NegotiationPhase::Closed {
            return;
        }
        self.phase = NegotiationPhase::Closed;
        self.pending_candidates.clear();

        if let Err(e) = self.media.close().await {
            warn!("Failed to close media session with {}: {:?}", self.remote, e);
        }
        info!("Session with {} closed", self.remote);
    }

    fn settled_phase(&self) -> NegotiationPhase {
        if self.remote_description_set {
            NegotiationPhase::Stable
        } else {
            NegotiationPhase::Idle
        }
    }

    fn send(&self, signal: SignalPayload) {
        let event = ClientEvent::Signal {
            to: self.remote.clone(),
            signal,
        };
        if self.outbound.send(event).is_err() {
            debug!("Signaling channel closed, dropping signal to {}", self.remote);
        }
    }
}
