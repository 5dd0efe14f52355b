use huddle_client::{ConnectivityState, NegotiationConfig, NegotiationPhase, PeerEvent, spawn_session};
use huddle_core::{ClientEvent, PeerId, SdpType, SessionDescription, SignalPayload};
use std::sync::Arc;

use crate::integration::{init_tracing, test_context};
use crate::utils::{MediaCall, MockMedia, wait_for_event, wait_until};

#[tokio::test]
async fn test_initiator_sends_offer_then_candidate() {
    init_tracing();

    let media = MockMedia::new("A");
    let mut t = test_context("A", &media, NegotiationConfig::default());
    let handle = spawn_session(Arc::new(t.ctx), PeerId::from("B"), true);

    let first = t.outbound_rx.recv().await.unwrap();
    let second = t.outbound_rx.recv().await.unwrap();

    assert!(matches!(
        first,
        ClientEvent::Signal { to, signal: SignalPayload::Description { sdp } }
            if to == PeerId::from("B") && sdp.sdp_type == SdpType::Offer
    ));
    assert!(matches!(
        second,
        ClientEvent::Signal { signal: SignalPayload::Candidate { .. }, .. }
    ));

    let spy = &media.spies()[0];
    assert_eq!(spy.calls()[0], MediaCall::AddLocalMedia);
    assert_eq!(handle.phase(), NegotiationPhase::HaveLocalOffer);

    handle.deliver(SignalPayload::Description {
        sdp: SessionDescription::answer("answer-from-B"),
    });
    wait_for_event(&mut t.events_rx, |e| {
        matches!(e, PeerEvent::PhaseChanged { phase: NegotiationPhase::Stable, .. })
    })
    .await
    .unwrap();

    handle.close().await;
}

#[tokio::test]
async fn test_remote_track_and_connectivity_reach_application() {
    init_tracing();

    let media = MockMedia::new("A");
    let mut t = test_context("A", &media, NegotiationConfig::default());
    let handle = spawn_session(Arc::new(t.ctx), PeerId::from("B"), false);

    let spies = media.clone();
    wait_until(move || spies.session_count() == 1).await.unwrap();
    let spy = media.spies()[0].clone();

    spy.emit_track("camera");
    spy.report(ConnectivityState::Disconnected);

    let track = wait_for_event(&mut t.events_rx, |e| matches!(e, PeerEvent::RemoteTrack { .. }))
        .await
        .unwrap();
    assert!(matches!(track, PeerEvent::RemoteTrack { track, .. } if track == "camera"));

    let state = wait_for_event(&mut t.events_rx, |e| matches!(e, PeerEvent::Connectivity { .. }))
        .await
        .unwrap();
    assert!(matches!(
        state,
        PeerEvent::Connectivity { state: ConnectivityState::Disconnected, .. }
    ));

    handle.close().await;
}

#[tokio::test]
async fn test_exhausted_restarts_report_degraded() {
    init_tracing();

    let media = MockMedia::new("B");
    let config = NegotiationConfig {
        max_ice_restarts: 0,
        ..NegotiationConfig::default()
    };
    let mut t = test_context("B", &media, config);
    let handle = spawn_session(Arc::new(t.ctx), PeerId::from("A"), false);

    handle.deliver(SignalPayload::Description {
        sdp: SessionDescription::offer("offer-from-A"),
    });
    wait_for_event(&mut t.events_rx, |e| {
        matches!(e, PeerEvent::PhaseChanged { phase: NegotiationPhase::Stable, .. })
    })
    .await
    .unwrap();

    media.spies()[0].report(ConnectivityState::Failed);

    wait_for_event(&mut t.events_rx, |e| matches!(e, PeerEvent::Degraded { .. }))
        .await
        .unwrap();
    assert_eq!(handle.phase(), NegotiationPhase::Stable);
    assert_eq!(
        media.spies()[0].count(|c| matches!(c, MediaCall::CreateOffer { .. })),
        0
    );

    handle.close().await;
}

#[tokio::test]
async fn test_lost_restart_answers_report_degraded() {
    init_tracing();

    let media = MockMedia::new("A");
    let config = NegotiationConfig {
        max_ice_restarts: 1,
        ..NegotiationConfig::default()
    };
    let mut t = test_context("A", &media, config);
    let handle = spawn_session(Arc::new(t.ctx), PeerId::from("B"), true);

    let spies = media.clone();
    wait_until(move || spies.session_count() == 1).await.unwrap();
    let spy = media.spies()[0].clone();

    handle.deliver(SignalPayload::Description {
        sdp: SessionDescription::answer("answer-from-B"),
    });
    wait_for_event(&mut t.events_rx, |e| {
        matches!(e, PeerEvent::PhaseChanged { phase: NegotiationPhase::Stable, .. })
    })
    .await
    .unwrap();

    spy.report(ConnectivityState::Failed);
    wait_for_event(&mut t.events_rx, |e| {
        matches!(e, PeerEvent::PhaseChanged { phase: NegotiationPhase::HaveLocalOffer, .. })
    })
    .await
    .unwrap();

    // B never answers the restart offer.
    spy.report(ConnectivityState::Failed);
    wait_for_event(&mut t.events_rx, |e| matches!(e, PeerEvent::Degraded { .. }))
        .await
        .unwrap();
    assert_eq!(
        spy.count(|c| *c == MediaCall::CreateOffer { ice_restart: true }),
        1
    );

    handle.close().await;
}
