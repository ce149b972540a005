//! Witness node: authenticate, sign and attest sealed artifacts.
//!
//! One task is spawned per accepted connection. Messages on a connection
//! are processed strictly in arrival order; connections are independent.
//! Nothing is shared between them except the read-only keypair and secret.
//!
//! Messages that fail authentication or decoding are dropped without a
//! reply, so unauthenticated peers cannot elicit signed material.

use futures_util::{SinkExt, StreamExt};
use mirrorwitness_core::Observation;
use mirrorwitness_crypto::{address_of, SealedArtifact, SharedSecret};
use mirrorwitness_identity::WitnessKeypair;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::error::{MeshError, MeshResult};
use crate::message::{AuthenticatedMessage, SignedAttestation, WireMessage};

/// Default displacement per witness id, in degrees.
pub const DEFAULT_GPS_OFFSET_DEG: f64 = 0.001;

/// Independent measurement capability of a witness.
///
/// Given what the producer reported, return what this witness observed.
pub trait Corroborator: Send + Sync {
    fn corroborate(&self, reported: &Observation) -> Observation;
}

/// Simulated independent measurement: a fixed offset scaled by witness id.
#[derive(Debug, Clone)]
pub struct OffsetCorroborator {
    offset_deg: f64,
}

impl OffsetCorroborator {
    pub fn new(witness_id: u32, gps_offset_deg: f64) -> Self {
        Self {
            offset_deg: gps_offset_deg * witness_id as f64,
        }
    }
}

impl Corroborator for OffsetCorroborator {
    fn corroborate(&self, reported: &Observation) -> Observation {
        reported.offset_by(self.offset_deg, self.offset_deg)
    }
}

/// A long-running witness service.
pub struct WitnessNode {
    keypair: WitnessKeypair,
    secret: SharedSecret,
    corroborator: Box<dyn Corroborator>,
}

impl WitnessNode {
    /// Create a witness with the default offset corroborator.
    pub fn new(keypair: WitnessKeypair, secret: SharedSecret) -> Self {
        let corroborator = OffsetCorroborator::new(keypair.witness_id(), DEFAULT_GPS_OFFSET_DEG);
        Self {
            keypair,
            secret,
            corroborator: Box::new(corroborator),
        }
    }

    /// Replace the independent measurement source.
    pub fn with_corroborator(mut self, corroborator: impl Corroborator + 'static) -> Self {
        self.corroborator = Box::new(corroborator);
        self
    }

    pub fn witness_id(&self) -> u32 {
        self.keypair.witness_id()
    }

    pub fn public_key_hex(&self) -> String {
        self.keypair.public_key_hex()
    }

    /// Handle one text frame. `Ok(None)` means the frame needs no reply.
    pub fn process_message(&self, text: &str) -> MeshResult<Option<SignedAttestation>> {
        match WireMessage::from_json(text)? {
            WireMessage::NewTask(task) => self.process_task(&task).map(Some),
            WireMessage::WitnessSignature(_) => Ok(None),
        }
    }

    /// Authenticate, decode, corroborate and sign one task.
    pub fn process_task(&self, task: &AuthenticatedMessage) -> MeshResult<SignedAttestation> {
        task.authenticate(&self.secret)?;

        let payload = task.decode_payload()?;
        let artifact = SealedArtifact::from_bytes(&payload)?;
        if address_of(&payload) != task.cid {
            return Err(MeshError::Validation(format!(
                "cid {} does not address the payload",
                task.cid
            )));
        }

        let observed = self.corroborator.corroborate(&artifact.observation);
        debug!(
            witness_id = self.witness_id(),
            reported_lat = artifact.observation.latitude,
            reported_lon = artifact.observation.longitude,
            observed_lat = observed.latitude,
            observed_lon = observed.longitude,
            "Corroborated observation"
        );

        let attestation = SignedAttestation::create(&self.keypair, &payload, task.cid.clone());
        info!(
            witness_id = self.witness_id(),
            cid = %task.cid.short(),
            payload_hash = %&attestation.payload_hash[..16],
            "Signed task"
        );
        Ok(attestation)
    }

    /// Bind `addr` and serve forever.
    pub async fn run(self: Arc<Self>, addr: &str) -> MeshResult<()> {
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener).await
    }

    /// Accept connections on `listener` forever.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> MeshResult<()> {
        info!(
            witness_id = self.witness_id(),
            addr = %listener.local_addr()?,
            pubkey = %&self.public_key_hex()[..32],
            "Witness listening"
        );

        loop {
            match listener.accept().await {
                Ok((stream, peer_addr)) => {
                    info!(witness_id = self.witness_id(), %peer_addr, "New connection");
                    let node = Arc::clone(&self);

                    tokio::spawn(async move {
                        if let Err(e) = node.handle_connection(stream, peer_addr).await {
                            warn!(%peer_addr, error = %e, "Connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }

    async fn handle_connection(&self, stream: TcpStream, peer_addr: SocketAddr) -> MeshResult<()> {
        let endpoint = peer_addr.to_string();
        let ws_stream = accept_async(stream)
            .await
            .map_err(|e| MeshError::transport(&endpoint, e))?;
        let (mut ws_sender, mut ws_receiver) = ws_stream.split();

        while let Some(frame) = ws_receiver.next().await {
            let text = match frame {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => {
                    debug!(%peer_addr, "Client disconnected");
                    break;
                }
                Ok(_) => continue,
                Err(e) => return Err(MeshError::transport(&endpoint, e)),
            };

            match self.process_message(&text) {
                Ok(Some(attestation)) => {
                    let reply = WireMessage::WitnessSignature(attestation).to_json()?;
                    ws_sender
                        .send(Message::Text(reply))
                        .await
                        .map_err(|e| MeshError::transport(&endpoint, e))?;
                }
                Ok(None) => {}
                Err(MeshError::Authentication) => {
                    warn!(
                        witness_id = self.witness_id(),
                        %peer_addr,
                        "Authentication failed; dropping message"
                    );
                }
                Err(e) => {
                    warn!(
                        witness_id = self.witness_id(),
                        %peer_addr,
                        error = %e,
                        "Dropping message"
                    );
                }
            }
        }

        Ok(())
    }
}
