//! Forged and tampered frames must never elicit a signature

use crate::test_utils::*;
use mirrorwitness_crypto::{address_of, SealedArtifact};
use mirrorwitness_mesh::{AuthenticatedMessage, WireMessage};
use std::time::Duration;

const QUIET: Duration = Duration::from_millis(300);

async fn assert_no_reply(frame: &str) {
    let witness = TestWitness::spawn(1, "s3cret").await;
    let mut client = witness.connect().await;
    send_text(&mut client, frame).await;
    assert!(recv_text(&mut client, QUIET).await.is_none());
}

fn tagged_message(payload: &[u8]) -> AuthenticatedMessage {
    AuthenticatedMessage::new(&secret("s3cret"), payload, address_of(payload), 1000.0).unwrap()
}

#[tokio::test]
async fn test_swapped_payload_is_dropped() {
    let (bytes, _) = reference_artifact();
    let mut message = tagged_message(&bytes);

    let mut artifact = SealedArtifact::from_bytes(&bytes).unwrap();
    artifact.observation.altitude = 50.0;
    message.payload = hex::encode(&artifact.to_bytes().unwrap());

    assert_no_reply(&WireMessage::NewTask(message).to_json().unwrap()).await;
}

#[tokio::test]
async fn test_shifted_timestamp_is_dropped() {
    let (bytes, _) = reference_artifact();
    let mut message = tagged_message(&bytes);
    message.timestamp += 1.0;

    assert_no_reply(&WireMessage::NewTask(message).to_json().unwrap()).await;
}

#[tokio::test]
async fn test_flipped_tag_is_dropped() {
    let (bytes, _) = reference_artifact();
    let mut message = tagged_message(&bytes);
    let flipped = if message.hmac.starts_with('0') { "1" } else { "0" };
    message.hmac.replace_range(0..1, flipped);

    assert_no_reply(&WireMessage::NewTask(message).to_json().unwrap()).await;
}

#[tokio::test]
async fn test_authenticated_non_artifact_is_dropped() {
    let message = tagged_message(b"{\"lat\": \"north\"}");
    assert_no_reply(&WireMessage::NewTask(message).to_json().unwrap()).await;
}

#[tokio::test]
async fn test_missing_fields_are_dropped() {
    assert_no_reply(r#"{"type":"new_task","payload":"00"}"#).await;
    assert_no_reply(r#"{"type":"unknown"}"#).await;
}
