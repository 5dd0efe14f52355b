use crate::media::{MediaCapability, MediaEvent, MediaSession};
use crate::negotiation::{
    NegotiationConfig, NegotiationPhase, Negotiator, PeerEvent, PeerEventSender, RestartOutcome,
    SignalSender,
};
use huddle_core::{PeerId, SignalPayload};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Всё, что нужно для запуска сессии с очередным участником комнаты.
pub struct SessionContext<C: MediaCapability> {
    pub local: PeerId,
    pub capability: Arc<C>,
    pub local_media: Arc<C::LocalMedia>,
    pub config: NegotiationConfig,
    pub outbound: SignalSender,
    pub events: PeerEventSender<C::Track>,
}

/// Хэндл фоновой задачи, которая ведёт одну сессию.
///
/// Сигналы обрабатываются задачей строго по очереди. Закрытие вытесняет
/// текущую операцию: её future отбрасывается до вызова `close` у медиа-сессии.
pub struct SessionHandle {
    remote: PeerId,
    initiator: bool,
    input: mpsc::UnboundedSender<SignalPayload>,
    close_tx: Option<oneshot::Sender<()>>,
    phase: watch::Receiver<NegotiationPhase>,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    pub fn remote(&self) -> &PeerId {
        &self.remote
    }

    pub fn is_initiator(&self) -> bool {
        self.initiator
    }

    pub fn phase(&self) -> NegotiationPhase {
        *self.phase.borrow()
    }

    pub fn watch_phase(&self) -> watch::Receiver<NegotiationPhase> {
        self.phase.clone()
    }

    /// Queues a signal for the session. Returns `false` once the session is gone.
    pub fn deliver(&self, payload: SignalPayload) -> bool {
        self.input.send(payload).is_ok()
    }

    /// Requests close without waiting for the media session to shut down.
    pub fn shutdown(&mut self) {
        if let Some(close_tx) = self.close_tx.take() {
            let _ = close_tx.send(());
        }
    }

    pub async fn close(mut self) {
        self.shutdown();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Session task for {} ended abnormally: {}", self.remote, e);
            }
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub fn spawn_session<C: MediaCapability>(
    ctx: Arc<SessionContext<C>>,
    remote: PeerId,
    initiator: bool,
) -> SessionHandle {
    let (input_tx, input_rx) = mpsc::unbounded_channel();
    let (close_tx, close_rx) = oneshot::channel();
    let (phase_tx, phase_rx) = watch::channel(NegotiationPhase::Idle);

    let task = tokio::spawn(run_session(
        ctx,
        remote.clone(),
        initiator,
        input_rx,
        close_rx,
        phase_tx,
    ));

    SessionHandle {
        remote,
        initiator,
        input: input_tx,
        close_tx: Some(close_tx),
        phase: phase_rx,
        task: Some(task),
    }
}

/// `None` when close won the race and `op` was dropped unfinished.
async fn until_closed<F: Future>(close_rx: &mut oneshot::Receiver<()>, op: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = close_rx => None,
        output = op => Some(output),
    }
}

async fn run_session<C: MediaCapability>(
    ctx: Arc<SessionContext<C>>,
    remote: PeerId,
    initiator: bool,
    mut input_rx: mpsc::UnboundedReceiver<SignalPayload>,
    mut close_rx: oneshot::Receiver<()>,
    phase_tx: watch::Sender<NegotiationPhase>,
) {
    let (media_tx, mut media_rx) = mpsc::unbounded_channel();

    let setup = async {
        let media = ctx
            .capability
            .create_session(&ctx.config.ice_servers, media_tx)
            .await?;
        media.add_local_media(&ctx.local_media).await?;
        anyhow::Ok(media)
    };

    let media = match until_closed(&mut close_rx, setup).await {
        Some(Ok(media)) => media,
        Some(Err(e)) => {
            warn!("Failed to create media session with {}: {:?}", remote, e);
            finish(&ctx, &remote, &phase_tx);
            return;
        }
        None => {
            finish(&ctx, &remote, &phase_tx);
            return;
        }
    };

    let mut negotiator = Negotiator::new(
        ctx.local.clone(),
        remote.clone(),
        initiator,
        media,
        ctx.config.max_ice_restarts,
        ctx.outbound.clone(),
    );

    let mut published = NegotiationPhase::Idle;

    match until_closed(&mut close_rx, negotiator.start()).await {
        Some(Ok(())) => publish_phase(&ctx, &remote, &phase_tx, &mut published, negotiator.phase()),
        Some(Err(e)) => warn!("Failed to start negotiation with {}: {}", remote, e),
        None => {
            negotiator.close().await;
            finish(&ctx, &remote, &phase_tx);
            return;
        }
    }

    loop {
        let closed = tokio::select! {
            biased;
            _ = &mut close_rx => true,
            Some(payload) = input_rx.recv() => {
                match until_closed(&mut close_rx, negotiator.handle_signal(payload)).await {
                    Some(Ok(())) => false,
                    Some(Err(e)) => {
                        warn!("Dropping signal from {}: {}", remote, e);
                        false
                    }
                    None => true,
                }
            }
            Some(event) = media_rx.recv() => match event {
                MediaEvent::Candidate(candidate) => {
                    negotiator.send_local_candidate(candidate);
                    false
                }
                MediaEvent::RemoteTrack(track) => {
                    let _ = ctx.events.send(PeerEvent::RemoteTrack {
                        peer: remote.clone(),
                        track,
                    });
                    false
                }
                MediaEvent::Connectivity(state) => {
                    let _ = ctx.events.send(PeerEvent::Connectivity {
                        peer: remote.clone(),
                        state,
                    });
                    match until_closed(&mut close_rx, negotiator.on_connectivity(state)).await {
                        Some(Ok(RestartOutcome::Exhausted)) => {
                            let _ = ctx.events.send(PeerEvent::Degraded { peer: remote.clone() });
                            false
                        }
                        Some(Ok(_)) => false,
                        Some(Err(e)) => {
                            warn!("ICE restart with {} failed: {}", remote, e);
                            false
                        }
                        None => true,
                    }
                }
            },
            else => true,
        };

        if closed {
            break;
        }
        publish_phase(&ctx, &remote, &phase_tx, &mut published, negotiator.phase());
    }

    negotiator.close().await;
    finish(&ctx, &remote, &phase_tx);
}

fn publish_phase<C: MediaCapability>(
    ctx: &SessionContext<C>,
    remote: &PeerId,
    phase_tx: &watch::Sender<NegotiationPhase>,
    published: &mut NegotiationPhase,
    phase: NegotiationPhase,
) {
    if *published == phase {
        return;
    }
    *published = phase;
    phase_tx.send_replace(phase);
    debug!("Session with {} is now {:?}", remote, phase);
    let _ = ctx.events.send(PeerEvent::PhaseChanged {
        peer: remote.clone(),
        phase,
    });
}

fn finish<C: MediaCapability>(
    ctx: &SessionContext<C>,
    remote: &PeerId,
    phase_tx: &watch::Sender<NegotiationPhase>,
) {
    phase_tx.send_replace(NegotiationPhase::Closed);
    let _ = ctx.events.send(PeerEvent::PhaseChanged {
        peer: remote.clone(),
        phase: NegotiationPhase::Closed,
    });
    let _ = ctx.events.send(PeerEvent::Closed { peer: remote.clone() });
}
