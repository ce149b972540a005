//! Producer → witness → attestation flow over loopback WebSockets

use crate::test_utils::*;
use mirrorwitness_crypto::{hash_payload, verify_signature_hex, SealedArtifact};
use mirrorwitness_mesh::{
    check_reply, deliver, DeliveryOutcome, ProducerNode, ProducerSettings, QuorumPolicy,
    WireMessage,
};
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_reference_observation_is_attested() {
    let (bytes, cid) = reference_artifact();
    let (again, cid_again) = reference_artifact();
    assert_eq!(bytes, again);
    assert_eq!(cid, cid_again);

    let artifact = SealedArtifact::from_bytes(&bytes).unwrap();
    assert_eq!(artifact.sealed_until, 1300.0);
    assert_eq!(artifact.nonce, 42);

    let witness = TestWitness::spawn(1, "s3cret").await;
    let mut client = witness.connect().await;
    send_text(&mut client, &task_frame("s3cret", &bytes)).await;

    let reply = recv_text(&mut client, Duration::from_secs(2)).await.unwrap();
    let attestation = match WireMessage::from_json(&reply).unwrap() {
        WireMessage::WitnessSignature(attestation) => attestation,
        other => panic!("unexpected reply: {other:?}"),
    };

    assert_eq!(attestation.witness_id, 1);
    assert_eq!(attestation.cid, cid);
    assert_eq!(attestation.payload_hash, hash_payload(&bytes));
    assert_eq!(attestation.pubkey, witness.public_key_hex);
    verify_signature_hex(&attestation.pubkey, &bytes, &attestation.signature).unwrap();
}

#[tokio::test]
async fn test_wrong_secret_gets_no_reply() {
    let (bytes, _) = reference_artifact();
    let witness = TestWitness::spawn(1, "s3cret").await;
    let mut client = witness.connect().await;

    send_text(&mut client, &task_frame("not-the-secret", &bytes)).await;
    assert!(recv_text(&mut client, Duration::from_millis(300)).await.is_none());
}

#[tokio::test]
async fn test_connection_survives_bad_frames() {
    let (bytes, _) = reference_artifact();
    let witness = TestWitness::spawn(2, "s3cret").await;
    let mut client = witness.connect().await;

    send_text(&mut client, "not json at all").await;
    send_text(&mut client, &task_frame("wrong", &bytes)).await;
    send_text(&mut client, &task_frame("s3cret", &bytes)).await;

    // Only the last frame earns a reply, on the same connection
    let reply = recv_text(&mut client, Duration::from_secs(2)).await.unwrap();
    let (_, cid) = reference_artifact();
    let attestation = check_reply(&reply, &cid, &bytes).unwrap();
    assert_eq!(attestation.witness_id, 2);
}

#[tokio::test]
async fn test_replies_follow_arrival_order() {
    let witness = TestWitness::spawn(3, "s3cret").await;
    let mut client = witness.connect().await;

    let payloads: Vec<Vec<u8>> = (0..5u64)
        .map(|nonce| {
            mirrorwitness_crypto::seal(&reference_observation(), 300.0, nonce)
                .unwrap()
                .to_bytes()
                .unwrap()
        })
        .collect();
    for payload in &payloads {
        send_text(&mut client, &task_frame("s3cret", payload)).await;
    }

    for payload in &payloads {
        let reply = recv_text(&mut client, Duration::from_secs(2)).await.unwrap();
        let cid = mirrorwitness_crypto::address_of(payload);
        check_reply(&reply, &cid, payload).unwrap();
    }
}

#[tokio::test]
async fn test_witnesses_sign_with_distinct_identities() {
    let (bytes, cid) = reference_artifact();
    let a = TestWitness::spawn(1, "s3cret").await;
    let b = TestWitness::spawn(2, "s3cret").await;
    let frame = task_frame("s3cret", &bytes);

    let mut keys = Vec::new();
    for witness in [&a, &b] {
        let outcome =
            deliver(&witness.endpoint, &frame, &cid, &bytes, Duration::from_secs(2)).await;
        match outcome {
            DeliveryOutcome::Attested(attestation) => keys.push(attestation.pubkey),
            other => panic!("witness {} did not attest: {other:?}", witness.witness_id),
        }
    }
    assert_ne!(keys[0], keys[1]);
}

#[tokio::test]
async fn test_unreachable_witness_does_not_delay_others() {
    let good = TestWitness::spawn(1, "s3cret").await;
    let misconfigured = TestWitness::spawn(2, "other").await;
    let settings = ProducerSettings {
        witness_endpoints: vec![
            unreachable_endpoint().await,
            misconfigured.endpoint.clone(),
            good.endpoint.clone(),
        ],
        delivery_timeout: Duration::from_millis(500),
        quorum: QuorumPolicy::k_of_n(1),
        ..ProducerSettings::default()
    };
    let mut producer = ProducerNode::new(settings, secret("s3cret"));

    let started = Instant::now();
    let report = producer.run_cycle().await.unwrap();

    // Deliveries run concurrently, so one deadline bounds the whole cycle
    assert!(started.elapsed() < Duration::from_millis(1500));
    assert_eq!(report.deliveries.len(), 3);
    assert!(matches!(report.deliveries[0].outcome, DeliveryOutcome::Failed(_)));
    assert!(matches!(report.deliveries[1].outcome, DeliveryOutcome::Delivered));
    assert!(matches!(report.deliveries[2].outcome, DeliveryOutcome::Attested(_)));
    assert_eq!(report.attested_count(), 1);
    assert!(report.quorum_met);
}

#[tokio::test]
async fn test_producer_cycles_continue_after_failures() {
    let settings = ProducerSettings {
        witness_endpoints: vec![unreachable_endpoint().await],
        delivery_timeout: Duration::from_millis(200),
        ..ProducerSettings::default()
    };
    let mut producer = ProducerNode::new(settings, secret("s3cret"));

    let first = producer.run_cycle().await.unwrap();
    let second = producer.run_cycle().await.unwrap();

    assert_eq!(producer.cycles(), 2);
    assert_ne!(first.cid, second.cid);
    assert_eq!(
        first.commit.map(|c| c.cid),
        Some(first.cid.as_str().to_string())
    );
}
