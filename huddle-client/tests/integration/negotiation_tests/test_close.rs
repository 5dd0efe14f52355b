use huddle_client::{ConnectivityState, NegotiationError, NegotiationPhase, Negotiator};
use huddle_core::{IceCandidate, PeerId, SessionDescription, SignalPayload};

use crate::integration::{init_tracing, outbound_channel};
use crate::utils::{MediaCall, MockSession, drain_signals};

#[tokio::test]
async fn test_close_runs_once() {
    init_tracing();

    let (media, spy) = MockSession::new("A");
    let (outbound, mut rx) = outbound_channel();
    let mut negotiator = Negotiator::new(
        PeerId::from("A"),
        PeerId::from("B"),
        true,
        media,
        3,
        outbound,
    );
    negotiator.start().await.unwrap();
    drain_signals(&mut rx);

    negotiator.close().await;
    negotiator.close().await;

    assert_eq!(negotiator.phase(), NegotiationPhase::Closed);
    assert_eq!(spy.count(|c| *c == MediaCall::Close), 1);

    let result = negotiator
        .handle_signal(SignalPayload::Description {
            sdp: SessionDescription::answer("late"),
        })
        .await;
    assert!(matches!(result, Err(NegotiationError::Closed)));

    negotiator.send_local_candidate(IceCandidate::new("late"));
    let outcome = negotiator.on_connectivity(ConnectivityState::Failed).await;
    assert!(outcome.is_ok());
    assert!(drain_signals(&mut rx).is_empty());
    assert!(spy.remote_descriptions().is_empty());
}
