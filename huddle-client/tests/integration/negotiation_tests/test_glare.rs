use huddle_client::{NegotiationPhase, Negotiator};
use huddle_core::{ClientEvent, PeerId, SignalPayload};

use crate::integration::{init_tracing, outbound_channel};
use crate::utils::{MediaCall, MockSession, drain_signals};

/// Both sides offer at once: only the greater id (B) yields.
#[tokio::test]
async fn test_simultaneous_offers_resolve_to_one_session() {
    init_tracing();

    let (a_media, a_spy) = MockSession::new("A");
    let (b_media, b_spy) = MockSession::new("B");
    let (a_out, mut a_rx) = outbound_channel();
    let (b_out, mut b_rx) = outbound_channel();

    let mut a = Negotiator::new(PeerId::from("A"), PeerId::from("B"), true, a_media, 3, a_out);
    let mut b = Negotiator::new(PeerId::from("B"), PeerId::from("A"), true, b_media, 3, b_out);
    assert!(!a.is_polite());
    assert!(b.is_polite());

    a.start().await.unwrap();
    b.start().await.unwrap();

    let a_offer = drain_signals(&mut a_rx).pop().unwrap();
    let b_offer = drain_signals(&mut b_rx).pop().unwrap();

    // Deliver crosswise.
    a.handle_signal(b_offer).await.unwrap();
    b.handle_signal(a_offer.clone()).await.unwrap();

    assert_eq!(a.phase(), NegotiationPhase::HaveLocalOffer);
    assert_eq!(b.phase(), NegotiationPhase::Stable);
    assert!(drain_signals(&mut a_rx).is_empty());

    let b_answer = drain_signals(&mut b_rx).pop().unwrap();
    a.handle_signal(b_answer.clone()).await.unwrap();
    assert_eq!(a.phase(), NegotiationPhase::Stable);

    let rollbacks = a_spy.count(|c| *c == MediaCall::Rollback)
        + b_spy.count(|c| *c == MediaCall::Rollback);
    assert_eq!(rollbacks, 1);
    assert_eq!(b_spy.count(|c| *c == MediaCall::Rollback), 1);

    // Each side's remote description is the other side's final local one.
    let SignalPayload::Description { sdp: a_offer_sdp } = a_offer else {
        panic!("expected offer");
    };
    let SignalPayload::Description { sdp: b_answer_sdp } = b_answer else {
        panic!("expected answer");
    };
    assert_eq!(b_spy.remote_descriptions(), vec![a_offer_sdp.clone()]);
    assert_eq!(a_spy.remote_descriptions(), vec![b_answer_sdp.clone()]);
    assert_eq!(a_spy.local_descriptions().last(), Some(&a_offer_sdp));
    assert_eq!(b_spy.local_descriptions().last(), Some(&b_answer_sdp));
}

#[tokio::test]
async fn test_offer_in_stable_is_renegotiation() {
    init_tracing();

    let (media, spy) = MockSession::new("B");
    let (outbound, mut rx) = outbound_channel();
    let mut b = Negotiator::new(PeerId::from("B"), PeerId::from("A"), false, media, 3, outbound);

    for n in 1..=2 {
        b.handle_signal(SignalPayload::Description {
            sdp: huddle_core::SessionDescription::offer(format!("offer-{}", n)),
        })
        .await
        .unwrap();
        assert_eq!(b.phase(), NegotiationPhase::Stable);
    }

    assert_eq!(spy.count(|c| *c == MediaCall::Rollback), 0);
    let answers = drain_outbound_answers(&mut rx);
    assert_eq!(answers, 2);
}

fn drain_outbound_answers(
    rx: &mut tokio::sync::mpsc::UnboundedReceiver<ClientEvent<SignalPayload>>,
) -> usize {
    drain_signals(rx)
        .into_iter()
        .filter(|s| matches!(s, SignalPayload::Description { sdp } if sdp.sdp_type == huddle_core::SdpType::Answer))
        .count()
}
