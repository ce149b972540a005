//! Test utilities for end-to-end protocol tests

use futures_util::{SinkExt, StreamExt};
use mirrorwitness_core::Observation;
use mirrorwitness_crypto::{address_of, seal, ContentId, SharedSecret};
use mirrorwitness_mesh::{AuthenticatedMessage, WireMessage, WitnessNode};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// The reference observation used across scenarios.
pub fn reference_observation() -> Observation {
    Observation::gps(1000.0, 37.7749, -122.4194, 95.3)
}

/// Sealed bytes and CID of the reference observation with nonce 42.
pub fn reference_artifact() -> (Vec<u8>, ContentId) {
    let bytes = seal(&reference_observation(), 300.0, 42)
        .unwrap()
        .to_bytes()
        .unwrap();
    let cid = address_of(&bytes);
    (bytes, cid)
}

pub fn secret(value: &str) -> SharedSecret {
    SharedSecret::new(value.as_bytes()).unwrap()
}

/// A `new_task` frame for `payload` tagged under `secret`.
pub fn task_frame(secret_value: &str, payload: &[u8]) -> String {
    let message =
        AuthenticatedMessage::new(&secret(secret_value), payload, address_of(payload), 1000.0)
            .unwrap();
    WireMessage::NewTask(message).to_json().unwrap()
}

/// A witness running on a loopback port with its own key directory.
pub struct TestWitness {
    pub witness_id: u32,
    pub endpoint: String,
    pub public_key_hex: String,
    _key_dir: TempDir,
}

impl TestWitness {
    pub async fn spawn(witness_id: u32, secret_value: &str) -> Self {
        let key_dir = tempfile::tempdir().unwrap();
        let key_path = key_dir.path().join(format!("witness_{witness_id}.key"));
        let keypair = mirrorwitness_identity::load_or_create(witness_id, &key_path).unwrap();
        let node = Arc::new(WitnessNode::new(keypair, secret(secret_value)));
        let public_key_hex = node.public_key_hex();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("ws://{}", listener.local_addr().unwrap());
        tokio::spawn(node.serve(listener));

        Self {
            witness_id,
            endpoint,
            public_key_hex,
            _key_dir: key_dir,
        }
    }

    pub async fn connect(&self) -> Client {
        let (client, _) = connect_async(self.endpoint.as_str()).await.unwrap();
        client
    }
}

/// An endpoint with nothing listening behind it.
pub async fn unreachable_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("ws://{}", listener.local_addr().unwrap());
    drop(listener);
    endpoint
}

pub async fn send_text(client: &mut Client, text: &str) {
    client.send(Message::Text(text.to_string())).await.unwrap();
}

/// Next text frame, or `None` if nothing arrives within `wait`.
pub async fn recv_text(client: &mut Client, wait: Duration) -> Option<String> {
    let deadline = tokio::time::Instant::now() + wait;
    loop {
        match tokio::time::timeout_at(deadline, client.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => return Some(text),
            Ok(Some(Ok(_))) => continue,
            _ => return None,
        }
    }
}
