use huddle_core::{PeerId, ServerEvent};
use serde_json::json;

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::{TestPeer, assert_no_event};

#[tokio::test]
async fn test_signal_is_forwarded_verbatim() {
    init_tracing();

    let relay = create_test_relay();
    let mut a = TestPeer::new(&relay, "A");
    let mut b = TestPeer::new(&relay, "B");
    a.join(&relay, "room42");
    b.join(&relay, "room42");
    a.events();

    // The relay must not care what the payload looks like.
    let payload = json!({ "anything": [1, 2, 3], "nested": { "sdp": null } });
    b.signal(&relay, &PeerId::from("A"), payload.clone());

    assert_eq!(
        a.events(),
        vec![ServerEvent::Signal {
            from: PeerId::from("B"),
            signal: payload,
        }]
    );
    assert!(b.events().is_empty());
}

#[tokio::test]
async fn test_rapid_candidates_keep_order() {
    init_tracing();

    let relay = create_test_relay();
    let mut a = TestPeer::new(&relay, "A");
    let mut b = TestPeer::new(&relay, "B");
    a.join(&relay, "room42");
    b.join(&relay, "room42");
    b.events();

    let count = 20;
    for i in 0..count {
        a.signal(
            &relay,
            &PeerId::from("B"),
            json!({ "candidate": { "candidate": format!("candidate:{i}") } }),
        );
    }

    let received: Vec<String> = b
        .events()
        .into_iter()
        .filter_map(|event| match event {
            ServerEvent::Signal { signal, .. } => signal["candidate"]["candidate"]
                .as_str()
                .map(str::to_string),
            _ => None,
        })
        .collect();

    let expected: Vec<String> = (0..count).map(|i| format!("candidate:{i}")).collect();
    assert_eq!(received, expected);
}

#[tokio::test]
async fn test_signal_before_join_is_dropped() {
    init_tracing();

    let relay = create_test_relay();
    let mut a = TestPeer::new(&relay, "A");
    let mut stranger = TestPeer::new(&relay, "S");
    a.join(&relay, "room42");
    a.events();

    stranger.signal(&relay, &PeerId::from("A"), json!({ "candidate": {} }));

    assert_no_event(&mut a.rx).await;
}
