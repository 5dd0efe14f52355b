use huddle_client::{
    MediaCapability, MediaSession, NegotiationPhase, Negotiator, WebrtcCapability, WebrtcSession,
};
use huddle_core::{PeerId, SdpType, SignalPayload};
use tokio::sync::mpsc;

use crate::integration::{init_tracing, outbound_channel};
use crate::utils::drain_signals;

async fn webrtc_session(capability: &WebrtcCapability) -> WebrtcSession {
    let tracks = capability.capture().await.unwrap();
    let (events, _events_rx) = mpsc::unbounded_channel();
    let session = capability.create_session(&[], events).await.unwrap();
    session.add_local_media(&tracks).await.unwrap();
    session
}

/// Glare on the real backend: B rolls its offer back, answers A, both settle.
#[tokio::test]
async fn test_simultaneous_offers_settle_on_webrtc_backend() {
    init_tracing();

    let capability = WebrtcCapability::new();
    let (a_out, mut a_rx) = outbound_channel();
    let (b_out, mut b_rx) = outbound_channel();
    let mut a = Negotiator::new(
        PeerId::from("A"),
        PeerId::from("B"),
        true,
        webrtc_session(&capability).await,
        3,
        a_out,
    );
    let mut b = Negotiator::new(
        PeerId::from("B"),
        PeerId::from("A"),
        true,
        webrtc_session(&capability).await,
        3,
        b_out,
    );

    a.start().await.unwrap();
    b.start().await.unwrap();
    let a_offer = drain_signals(&mut a_rx).pop().unwrap();
    let b_offer = drain_signals(&mut b_rx).pop().unwrap();

    a.handle_signal(b_offer).await.unwrap();
    assert_eq!(a.phase(), NegotiationPhase::HaveLocalOffer);

    b.handle_signal(a_offer).await.unwrap();
    assert_eq!(b.phase(), NegotiationPhase::Stable);

    let b_answer = drain_signals(&mut b_rx)
        .into_iter()
        .find(|s| matches!(s, SignalPayload::Description { sdp } if sdp.sdp_type == SdpType::Answer))
        .unwrap();
    a.handle_signal(b_answer).await.unwrap();
    assert_eq!(a.phase(), NegotiationPhase::Stable);

    a.close().await;
    b.close().await;
}
