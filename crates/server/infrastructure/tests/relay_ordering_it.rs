//! Relay ordering and join-boundary integration tests
//!
//! Drives the relay from many concurrent connection tasks and checks what
//! each outbound queue observed against the final transcript.

use futures::future::join_all;
use parlor_server_infrastructure::realtime::{PresenceRelay, RealtimeMetrics};
use parlor_shared::realtime::{ServerMessage, TranscriptEntry};
use rstest::{fixture, rstest};
use std::sync::Arc;
use tokio::sync::mpsc;

// ═══════════════════════════════════════════════════════════════════════════
// Fixtures
// ═══════════════════════════════════════════════════════════════════════════

#[fixture]
fn relay() -> Arc<PresenceRelay> {
    Arc::new(PresenceRelay::new(None, RealtimeMetrics::new().unwrap()))
}

fn decode_all(rx: &mut mpsc::Receiver<String>) -> Vec<ServerMessage> {
    let mut messages = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        messages.push(serde_json::from_str(&frame).unwrap());
    }
    messages
}

fn broadcast_seqs(messages: &[ServerMessage]) -> Vec<u64> {
    messages
        .iter()
        .filter_map(|m| match m {
            ServerMessage::Entry(entry) => Some(entry.seq),
            _ => None,
        })
        .collect()
}

fn history(messages: &[ServerMessage]) -> Vec<TranscriptEntry> {
    match messages.first() {
        Some(ServerMessage::History { entries }) => entries.clone(),
        other => panic!("expected history first, got {:?}", other),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════

/// Every recipient sees a contiguous run of the transcript, in append order,
/// starting right after the snapshot it was handed at join.
#[rstest]
#[case(2, 10)]
#[case(8, 25)]
#[case(16, 5)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_clients_observe_transcript_order(
    relay: Arc<PresenceRelay>,
    #[case] clients: usize,
    #[case] messages_per_client: usize,
) {
    let mut tasks = Vec::new();
    for client in 0..clients {
        let relay = relay.clone();
        tasks.push(tokio::spawn(async move {
            let (tx, rx) = mpsc::channel(4096);
            let id = relay.on_connect(tx).await;
            relay
                .on_identity_announced(&id, format!("client-{client}"))
                .await
                .unwrap();
            for n in 0..messages_per_client {
                relay.on_message(&id, &format!("m{n}")).await;
                tokio::task::yield_now().await;
            }
            rx
        }));
    }

    let receivers: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    let transcript = relay.snapshot().await;
    let transcript_seqs: Vec<u64> = transcript.iter().map(|e| e.seq).collect();
    assert_eq!(transcript.len(), clients * (messages_per_client + 1));
    assert_eq!(transcript_seqs, (1..=transcript.len() as u64).collect::<Vec<_>>());

    for mut rx in receivers {
        let messages = decode_all(&mut rx);
        let snapshot = history(&messages);
        let observed = broadcast_seqs(&messages);

        // Nothing lost or duplicated across the join boundary.
        let expected_first = snapshot.len() as u64 + 1;
        assert_eq!(observed.first().copied(), Some(expected_first));
        assert_eq!(
            observed,
            (expected_first..=transcript.len() as u64).collect::<Vec<_>>()
        );
        assert_eq!(snapshot, transcript[..snapshot.len()].to_vec());
    }
}

#[rstest]
#[tokio::test]
async fn documented_three_client_scenario(relay: Arc<PresenceRelay>) {
    let (tx_a, mut rx_a) = mpsc::channel(64);
    let (tx_b, mut rx_b) = mpsc::channel(64);
    let a = relay.on_connect(tx_a).await;
    let b = relay.on_connect(tx_b).await;

    relay.on_identity_announced(&a, "Alice").await.unwrap();
    relay.on_identity_announced(&b, "Bob").await.unwrap();
    relay.on_message(&a, "hi").await;

    let expected = vec![
        "Alice joined the chat.".to_string(),
        "Bob joined the chat.".to_string(),
        "Alice: hi".to_string(),
    ];
    let transcript: Vec<String> = relay.snapshot().await.into_iter().map(|e| e.text).collect();
    assert_eq!(transcript, expected);

    let a_messages = decode_all(&mut rx_a);
    assert_eq!(broadcast_seqs(&a_messages), vec![1, 2, 3]);
    let b_messages = decode_all(&mut rx_b);
    assert_eq!(history(&b_messages).len(), 1);
    assert_eq!(broadcast_seqs(&b_messages), vec![2, 3]);

    let (tx_c, mut rx_c) = mpsc::channel(64);
    let c = relay.on_connect(tx_c).await;
    relay.on_identity_announced(&c, "Carol").await.unwrap();

    let c_messages = decode_all(&mut rx_c);
    let replayed: Vec<String> = history(&c_messages).into_iter().map(|e| e.text).collect();
    assert_eq!(replayed, expected);
    assert_eq!(broadcast_seqs(&c_messages), vec![4]);
}

#[rstest]
#[tokio::test]
async fn concurrent_double_disconnect_yields_single_notice(relay: Arc<PresenceRelay>) {
    let (tx_w, mut rx_w) = mpsc::channel(64);
    let watcher = relay.on_connect(tx_w).await;
    relay.on_identity_announced(&watcher, "Watcher").await.unwrap();

    let (tx, _rx) = mpsc::channel(64);
    let leaver = relay.on_connect(tx).await;
    relay.on_identity_announced(&leaver, "Leaver").await.unwrap();
    decode_all(&mut rx_w);

    let attempts = (0..8).map(|_| {
        let relay = relay.clone();
        let leaver = leaver.clone();
        tokio::spawn(async move { relay.on_disconnect(&leaver).await })
    });
    let notices: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .filter_map(|r| r.unwrap())
        .collect();

    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].text, "Leaver left the chat.");
    assert_eq!(broadcast_seqs(&decode_all(&mut rx_w)).len(), 1);
}
