//! Producer node: sample, seal, address, authenticate and fan out.
//!
//! Each cycle walks `Idle → Sampling → Sealing → Addressing →
//! Authenticating → Broadcasting → Idle`. Every witness is contacted
//! concurrently under its own deadline and all deliveries are joined
//! before the cycle ends. A failing witness is reported in the cycle
//! result and never aborts the cycle.

use futures_util::future::join_all;
use futures_util::{SinkExt, Stream, StreamExt};
use mirrorwitness_core::{
    unix_time_secs, with_retry, CommitConfirmation, DroneSimulator, LedgerSink, Observation,
    ProducerConfig, SimulatedLedger, StorageReceipt, TelemetrySource,
};
use mirrorwitness_crypto::{
    address_of, seal_with_random_nonce, ChainSubmission, ConstraintProof, ConstraintProver,
    ContentId, SharedSecret, ThresholdProver,
};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{timeout_at, Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::error::{MeshError, MeshResult};
use crate::message::{AuthenticatedMessage, SignedAttestation, WireMessage};
use crate::quorum::QuorumPolicy;

type WitnessStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Where the producer is within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerStage {
    Idle,
    Sampling,
    Sealing,
    Addressing,
    Authenticating,
    Broadcasting,
}

/// Runtime settings for a producer.
#[derive(Debug, Clone)]
pub struct ProducerSettings {
    pub witness_endpoints: Vec<String>,
    pub seal_duration_secs: f64,
    pub sample_period: Duration,
    pub delivery_timeout: Duration,
    pub quorum: QuorumPolicy,
    /// Observations per constraint proof; 0 disables proving
    pub proof_batch: usize,
    pub sink_attempts: u32,
}

impl From<&ProducerConfig> for ProducerSettings {
    fn from(config: &ProducerConfig) -> Self {
        Self {
            witness_endpoints: config.witness_endpoints.clone(),
            seal_duration_secs: config.seal_duration_secs,
            sample_period: Duration::from_millis(config.sample_period_ms),
            delivery_timeout: Duration::from_millis(config.delivery_timeout_ms),
            quorum: QuorumPolicy::k_of_n(config.quorum),
            proof_batch: config.proof_batch,
            sink_attempts: config.sink_attempts,
        }
    }
}

impl Default for ProducerSettings {
    fn default() -> Self {
        Self::from(&ProducerConfig::default())
    }
}

/// Result of delivering one task to one witness.
#[derive(Debug, Clone)]
pub enum DeliveryOutcome {
    /// The witness returned a valid attestation
    Attested(SignedAttestation),
    /// Sent, but no reply arrived before the deadline
    Delivered,
    /// The witness replied with something that did not verify
    Rejected(String),
    /// Connect or send failed, or the deadline passed first
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct Delivery {
    pub endpoint: String,
    pub outcome: DeliveryOutcome,
}

/// Everything that happened in one producer cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub observation: Observation,
    pub cid: ContentId,
    pub payload: Vec<u8>,
    pub deliveries: Vec<Delivery>,
    pub quorum_met: bool,
    pub storage: Option<StorageReceipt>,
    pub commit: Option<CommitConfirmation>,
    /// Set on the cycle that closed a proof batch
    pub proof: Option<ConstraintProof>,
}

impl CycleReport {
    /// Valid attestations collected this cycle.
    pub fn attestations(&self) -> impl Iterator<Item = &SignedAttestation> {
        self.deliveries.iter().filter_map(|d| match &d.outcome {
            DeliveryOutcome::Attested(attestation) => Some(attestation),
            _ => None,
        })
    }

    pub fn attested_count(&self) -> usize {
        self.attestations().count()
    }
}

/// The single observation producer.
pub struct ProducerNode {
    settings: ProducerSettings,
    secret: SharedSecret,
    telemetry: Box<dyn TelemetrySource>,
    fallback: DroneSimulator,
    sink: Box<dyn LedgerSink>,
    prover: Box<dyn ConstraintProver>,
    batch: Vec<Observation>,
    stage: ProducerStage,
    cycles: u64,
}

impl ProducerNode {
    /// Create a producer sampling the drone simulator into an in-memory ledger.
    pub fn new(settings: ProducerSettings, secret: SharedSecret) -> Self {
        Self {
            settings,
            secret,
            telemetry: Box::new(DroneSimulator::new()),
            fallback: DroneSimulator::new(),
            sink: Box::new(SimulatedLedger::new()),
            prover: Box::new(ThresholdProver::default()),
            batch: Vec::new(),
            stage: ProducerStage::Idle,
            cycles: 0,
        }
    }

    pub fn with_telemetry(mut self, telemetry: impl TelemetrySource + 'static) -> Self {
        self.telemetry = Box::new(telemetry);
        self
    }

    pub fn with_sink(mut self, sink: impl LedgerSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn with_prover(mut self, prover: impl ConstraintProver + 'static) -> Self {
        self.prover = Box::new(prover);
        self
    }

    pub fn stage(&self) -> ProducerStage {
        self.stage
    }

    pub fn settings(&self) -> &ProducerSettings {
        &self.settings
    }

    /// Completed cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run cycles on the sample period forever.
    ///
    /// A failed cycle is logged and the loop moves on to the next tick. A
    /// cycle that overruns the period delays the next tick instead of
    /// triggering a burst of catch-up cycles.
    pub async fn run(mut self) -> MeshResult<()> {
        if self.settings.sample_period.is_zero() {
            return Err(MeshError::Config(
                "sample period must be greater than zero".to_string(),
            ));
        }

        info!(
            witnesses = self.settings.witness_endpoints.len(),
            period_ms = self.settings.sample_period.as_millis() as u64,
            quorum = self.settings.quorum.required(),
            "Producer started"
        );

        let mut ticker = sample_ticker(self.settings.sample_period);
        loop {
            ticker.tick().await;
            if let Err(e) = self.run_cycle().await {
                warn!(error = %e, "Cycle failed");
                self.stage = ProducerStage::Idle;
            }
        }
    }

    /// Run one complete cycle.
    pub async fn run_cycle(&mut self) -> MeshResult<CycleReport> {
        self.stage = ProducerStage::Sampling;
        let observation = self.sample();

        self.stage = ProducerStage::Sealing;
        let artifact = seal_with_random_nonce(&observation, self.settings.seal_duration_secs)?;
        let payload = artifact.to_bytes()?;

        self.stage = ProducerStage::Addressing;
        let cid = address_of(&payload);
        let (storage, commit) = self.persist(&cid, &payload);

        self.stage = ProducerStage::Authenticating;
        let task =
            AuthenticatedMessage::new(&self.secret, &payload, cid.clone(), unix_time_secs())?;
        let frame = WireMessage::NewTask(task).to_json()?;

        self.stage = ProducerStage::Broadcasting;
        let deliveries = broadcast(
            &self.settings.witness_endpoints,
            &frame,
            &cid,
            &payload,
            self.settings.delivery_timeout,
        )
        .await;

        let attested = deliveries
            .iter()
            .filter(|d| matches!(d.outcome, DeliveryOutcome::Attested(_)))
            .count();
        let quorum_met = self
            .settings
            .quorum
            .is_met(attested, self.settings.witness_endpoints.len());
        if quorum_met {
            info!(cid = %cid.short(), attested, total = deliveries.len(), "Cycle attested");
        } else {
            warn!(
                cid = %cid.short(),
                attested,
                required = self.settings.quorum.required(),
                "Quorum not met"
            );
        }

        let proof = self.extend_batch(observation.clone());

        self.stage = ProducerStage::Idle;
        self.cycles += 1;

        Ok(CycleReport {
            observation,
            cid,
            payload,
            deliveries,
            quorum_met,
            storage,
            commit,
            proof,
        })
    }

    fn sample(&mut self) -> Observation {
        match self.telemetry.observe() {
            Ok(observation) => observation,
            Err(e) => {
                warn!(error = %e, "Telemetry unavailable; using simulated sample");
                self.fallback.step_at(unix_time_secs())
            }
        }
    }

    fn persist(
        &mut self,
        cid: &ContentId,
        payload: &[u8],
    ) -> (Option<StorageReceipt>, Option<CommitConfirmation>) {
        let attempts = self.settings.sink_attempts;
        let sink = &mut self.sink;

        let storage = match with_retry(attempts, "store", || sink.store(cid.as_str(), payload)) {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(cid = %cid.short(), error = %e, "Storage failed");
                return (None, None);
            }
        };

        match with_retry(attempts, "commit", || sink.commit(cid.as_str())) {
            Ok(confirmation) => {
                debug!(cid = %cid.short(), transaction = %confirmation.transaction, "Committed");
                (Some(storage), Some(confirmation))
            }
            Err(e) => {
                warn!(cid = %cid.short(), error = %e, "Commit failed");
                (Some(storage), None)
            }
        }
    }

    fn extend_batch(&mut self, observation: Observation) -> Option<ConstraintProof> {
        if self.settings.proof_batch == 0 {
            return None;
        }
        self.batch.push(observation);
        if self.batch.len() < self.settings.proof_batch {
            return None;
        }

        let batch = std::mem::take(&mut self.batch);
        match self.prover.prove(&batch) {
            Ok(proof) => {
                let ChainSubmission {
                    proof_hash,
                    max_value,
                    verified,
                } = proof.to_chain_submission();
                info!(
                    circuit = %proof.circuit,
                    num_points = batch.len(),
                    %proof_hash,
                    max_value,
                    verified,
                    accepted = self.prover.verify(&proof),
                    "Constraint proof generated"
                );
                Some(proof)
            }
            Err(e) => {
                warn!(error = %e, "Constraint proof failed");
                None
            }
        }
    }
}

/// Fixed-period ticker; overrunning cycles push later ticks back.
fn sample_ticker(period: Duration) -> Interval {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Deliver `frame` to every endpoint concurrently and wait for all of them.
pub async fn broadcast(
    endpoints: &[String],
    frame: &str,
    cid: &ContentId,
    payload: &[u8],
    timeout: Duration,
) -> Vec<Delivery> {
    let deliveries = endpoints.iter().map(|endpoint| async move {
        let outcome = deliver(endpoint, frame, cid, payload, timeout).await;
        match &outcome {
            DeliveryOutcome::Attested(attestation) => debug!(
                %endpoint,
                witness_id = attestation.witness_id,
                "Attestation received"
            ),
            DeliveryOutcome::Delivered => debug!(%endpoint, "Delivered without attestation"),
            DeliveryOutcome::Rejected(reason) => {
                warn!(%endpoint, %reason, "Attestation rejected")
            }
            DeliveryOutcome::Failed(reason) => warn!(%endpoint, %reason, "Delivery failed"),
        }
        Delivery {
            endpoint: endpoint.clone(),
            outcome,
        }
    });

    join_all(deliveries).await
}

/// Deliver one task to one witness and check its reply.
///
/// Connect, send and reply all share one deadline of `timeout`.
pub async fn deliver(
    endpoint: &str,
    frame: &str,
    cid: &ContentId,
    payload: &[u8],
    timeout: Duration,
) -> DeliveryOutcome {
    let deadline = Instant::now() + timeout;

    let mut ws = match send_task(endpoint, frame, deadline).await {
        Ok(ws) => ws,
        Err(e) => return DeliveryOutcome::Failed(e.to_string()),
    };

    let reply = match timeout_at(deadline, next_text(&mut ws)).await {
        Ok(Some(text)) => text,
        Ok(None) | Err(_) => return DeliveryOutcome::Delivered,
    };
    let _ = ws.close(None).await;

    match check_reply(&reply, cid, payload) {
        Ok(attestation) => DeliveryOutcome::Attested(attestation),
        Err(e) => DeliveryOutcome::Rejected(e.to_string()),
    }
}

/// Connect to `endpoint` and send `frame`, both before `deadline`.
async fn send_task(endpoint: &str, frame: &str, deadline: Instant) -> MeshResult<WitnessStream> {
    let (mut ws, _) = timeout_at(deadline, connect_async(endpoint))
        .await
        .map_err(|_| MeshError::Timeout(format!("connect to {endpoint}")))?
        .map_err(|e| MeshError::transport(endpoint, e))?;

    timeout_at(deadline, ws.send(Message::Text(frame.to_string())))
        .await
        .map_err(|_| MeshError::Timeout(format!("send to {endpoint}")))?
        .map_err(|e| MeshError::transport(endpoint, e))?;

    Ok(ws)
}

async fn next_text<S>(ws: &mut S) -> Option<String>
where
    S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    while let Some(frame) = ws.next().await {
        match frame {
            Ok(Message::Text(text)) => return Some(text),
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => continue,
        }
    }
    None
}

/// Parse a witness reply and verify it against what was sent.
pub fn check_reply(reply: &str, cid: &ContentId, payload: &[u8]) -> MeshResult<SignedAttestation> {
    match WireMessage::from_json(reply)? {
        WireMessage::WitnessSignature(attestation) => {
            attestation.verify_for(cid, payload)?;
            Ok(attestation)
        }
        WireMessage::NewTask(_) => Err(MeshError::AttestationRejected(
            "witness replied with a task".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::witness::WitnessNode;
    use mirrorwitness_core::{CoreError, CoreResult};
    use mirrorwitness_crypto::{hash_payload, SealedArtifact};
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    const SECRET: &str = "s3cret";

    fn secret(value: &str) -> SharedSecret {
        SharedSecret::new(value.as_bytes()).unwrap()
    }

    async fn spawn_witness(id: u32, key_dir: &std::path::Path, value: &str) -> String {
        let keypair =
            mirrorwitness_identity::load_or_create(id, &key_dir.join(format!("witness_{id}.key")))
                .unwrap();
        let node = Arc::new(WitnessNode::new(keypair, secret(value)));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(node.serve(listener));
        format!("ws://{addr}")
    }

    async fn dead_endpoint() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("ws://{addr}")
    }

    fn settings(endpoints: Vec<String>) -> ProducerSettings {
        ProducerSettings {
            witness_endpoints: endpoints,
            delivery_timeout: Duration::from_millis(500),
            proof_batch: 3,
            ..ProducerSettings::default()
        }
    }

    struct BrokenTelemetry;

    impl TelemetrySource for BrokenTelemetry {
        fn observe(&mut self) -> CoreResult<Observation> {
            Err(CoreError::Telemetry("sensor offline".to_string()))
        }
    }

    struct SharedLedger(Arc<Mutex<SimulatedLedger>>);

    impl LedgerSink for SharedLedger {
        fn store(&mut self, cid: &str, bytes: &[u8]) -> CoreResult<StorageReceipt> {
            self.0.lock().unwrap().store(cid, bytes)
        }

        fn commit(&mut self, cid: &str) -> CoreResult<CommitConfirmation> {
            self.0.lock().unwrap().commit(cid)
        }
    }

    #[tokio::test]
    async fn test_zero_sample_period_is_config_error() {
        let config = ProducerSettings {
            sample_period: Duration::ZERO,
            ..settings(Vec::new())
        };
        let result = ProducerNode::new(config, secret(SECRET)).run().await;

        assert!(matches!(result, Err(MeshError::Config(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overrun_cycle_delays_next_tick() {
        let period = Duration::from_secs(1);
        let mut ticker = sample_ticker(period);
        assert_eq!(ticker.missed_tick_behavior(), MissedTickBehavior::Delay);

        ticker.tick().await;
        tokio::time::sleep(Duration::from_millis(2500)).await;
        ticker.tick().await;
        let after_overrun = Instant::now();
        ticker.tick().await;

        assert_eq!(Instant::now() - after_overrun, period);
    }

    #[tokio::test]
    async fn test_ledger_retention_bounded_across_cycles() {
        let ledger = Arc::new(Mutex::new(SimulatedLedger::with_retention(8)));
        let mut producer = ProducerNode::new(settings(Vec::new()), secret(SECRET))
            .with_sink(SharedLedger(Arc::clone(&ledger)));

        for _ in 0..50 {
            let report = producer.run_cycle().await.unwrap();
            assert!(report.commit.is_some());
        }

        let ledger = ledger.lock().unwrap();
        assert_eq!(ledger.retained_blobs(), 8);
        assert_eq!(ledger.total_commits(), 50);
    }

    #[tokio::test]
    async fn test_cycle_collects_attestations() {
        let dir = tempfile::tempdir().unwrap();
        let endpoints = vec![
            spawn_witness(1, dir.path(), SECRET).await,
            spawn_witness(2, dir.path(), SECRET).await,
        ];
        let mut producer = ProducerNode::new(settings(endpoints), secret(SECRET))
            .with_telemetry(DroneSimulator::with_seed(1));

        let report = producer.run_cycle().await.unwrap();

        assert_eq!(report.attested_count(), 2);
        assert!(report.quorum_met);
        assert_eq!(producer.stage(), ProducerStage::Idle);
        assert_eq!(producer.cycles(), 1);
        assert_eq!(report.cid, address_of(&report.payload));
        for attestation in report.attestations() {
            assert_eq!(attestation.payload_hash, hash_payload(&report.payload));
            assert_eq!(attestation.cid, report.cid);
        }

        let artifact = SealedArtifact::from_bytes(&report.payload).unwrap();
        assert_eq!(artifact.observation, report.observation);
        assert_eq!(artifact.sealed_until, report.observation.timestamp + 300.0);
        assert!(report.storage.is_some());
        assert!(report.commit.is_some());
    }

    #[tokio::test]
    async fn test_unreachable_witness_does_not_block_others() {
        let dir = tempfile::tempdir().unwrap();
        let endpoints = vec![
            dead_endpoint().await,
            spawn_witness(2, dir.path(), SECRET).await,
        ];
        let mut producer = ProducerNode::new(settings(endpoints), secret(SECRET));

        let report = producer.run_cycle().await.unwrap();

        assert_eq!(report.deliveries.len(), 2);
        assert!(matches!(report.deliveries[0].outcome, DeliveryOutcome::Failed(_)));
        assert!(matches!(report.deliveries[1].outcome, DeliveryOutcome::Attested(_)));
    }

    #[tokio::test]
    async fn test_wrong_secret_yields_no_attestation() {
        let dir = tempfile::tempdir().unwrap();
        let endpoints = vec![spawn_witness(1, dir.path(), "other").await];
        let mut producer = ProducerNode::new(settings(endpoints), secret(SECRET));

        let report = producer.run_cycle().await.unwrap();

        assert_eq!(report.attested_count(), 0);
        assert!(matches!(report.deliveries[0].outcome, DeliveryOutcome::Delivered));
    }

    #[tokio::test]
    async fn test_quorum_reported_not_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let endpoints = vec![
            spawn_witness(1, dir.path(), SECRET).await,
            dead_endpoint().await,
        ];
        let mut config = settings(endpoints);
        config.quorum = QuorumPolicy::k_of_n(2);
        let mut producer = ProducerNode::new(config, secret(SECRET));

        let report = producer.run_cycle().await.unwrap();

        assert_eq!(report.attested_count(), 1);
        assert!(!report.quorum_met);
    }

    #[tokio::test]
    async fn test_telemetry_failure_falls_back_to_simulator() {
        let mut producer =
            ProducerNode::new(settings(Vec::new()), secret(SECRET)).with_telemetry(BrokenTelemetry);

        let report = producer.run_cycle().await.unwrap();

        assert!(report.deliveries.is_empty());
        assert!(report.quorum_met);
        assert!((report.observation.latitude - 37.7749).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_proof_emitted_every_batch() {
        let mut producer = ProducerNode::new(settings(Vec::new()), secret(SECRET))
            .with_telemetry(DroneSimulator::with_seed(9));

        assert!(producer.run_cycle().await.unwrap().proof.is_none());
        assert!(producer.run_cycle().await.unwrap().proof.is_none());
        let proof = producer.run_cycle().await.unwrap().proof.unwrap();

        assert_eq!(proof.public_inputs.num_points, 3);
        assert!(proof.constraint_satisfied);
        assert!(producer.run_cycle().await.unwrap().proof.is_none());
    }

    #[tokio::test]
    async fn test_silent_endpoint_times_out() {
        // Accepts TCP but never completes the WebSocket handshake
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("ws://{}", listener.local_addr().unwrap());
        let cid = address_of(b"payload");

        let outcome = deliver(&endpoint, "{}", &cid, b"payload", Duration::from_millis(200)).await;

        match outcome {
            DeliveryOutcome::Failed(reason) => assert!(reason.contains("timed out")),
            other => panic!("expected a timeout, got {other:?}"),
        }
        drop(listener);
    }

    #[test]
    fn test_check_reply_rejects_foreign_payload() {
        let dir = tempfile::tempdir().unwrap();
        let keypair =
            mirrorwitness_identity::load_or_create(1, &dir.path().join("witness_1.key")).unwrap();
        let payload = b"{\"sealed\":true}";
        let cid = address_of(payload);
        let attestation = SignedAttestation::create(&keypair, payload, cid.clone());
        let reply = WireMessage::WitnessSignature(attestation).to_json().unwrap();

        assert!(check_reply(&reply, &cid, payload).is_ok());
        assert!(check_reply(&reply, &cid, b"something else").is_err());
        assert!(check_reply("not json", &cid, payload).is_err());
    }

    #[test]
    fn test_settings_from_config() {
        let config = ProducerConfig {
            quorum: 2,
            delivery_timeout_ms: 250,
            ..ProducerConfig::default()
        };
        let settings = ProducerSettings::from(&config);

        assert_eq!(settings.quorum.required(), 2);
        assert_eq!(settings.delivery_timeout, Duration::from_millis(250));
        assert_eq!(settings.witness_endpoints.len(), 3);
    }
}
