use tracing::info;

use relay_checkpoint::FileCheckpointStore;
use relay_publish::AmqpPublisher;
use relay_source::LedgerBlockSource;

use crate::config::AdapterConfig;
use crate::error::BootstrapError;
use crate::supervisor::Supervisor;

/// Supervisor over the real ledger, AMQP broker and checkpoint file.
pub type LiveSupervisor = Supervisor<LedgerBlockSource, AmqpPublisher, FileCheckpointStore>;

/// Build the live collaborators from `config`.
///
/// Loads the ledger key pair, prepares the checkpoint location and connects
/// to the broker. The ledger itself is not contacted until the supervisor
/// runs.
pub async fn connect(config: &AdapterConfig) -> Result<LiveSupervisor, BootstrapError> {
    let (source, checkpoints) = prepare(config)?;
    let publisher = AmqpPublisher::connect(config.broker.clone()).await?;
    info!(
        ledger = %config.ledger.endpoint,
        account = %config.ledger.account,
        broker = %config.broker.address(),
        exchange = %config.broker.exchange,
        checkpoint = %config.checkpoint.path.display(),
        "chain adapter assembled"
    );
    Ok(Supervisor::new(source, publisher, checkpoints))
}

/// Validate `config` and build everything except the publisher, so callers
/// can pair the ledger source with a different [`Republisher`].
///
/// [`Republisher`]: relay_publish::Republisher
pub fn prepare(
    config: &AdapterConfig,
) -> Result<(LedgerBlockSource, FileCheckpointStore), BootstrapError> {
    config.validate()?;
    let checkpoints = FileCheckpointStore::create(&config.checkpoint.path)?;
    let source = LedgerBlockSource::from_config(&config.ledger)?;
    Ok((source, checkpoints))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    use relay_checkpoint::CheckpointStore;
    use relay_crypto::{KeyPair, SigningKey};
    use relay_protocol::{RelayCodec, RelayMessage};
    use relay_publish::BrokerPublisher;
    use relay_types::{Block, BlockHeight};

    use crate::error::ErrorKind;
    use crate::state::AdapterState;

    async fn bind() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        (listener, addr)
    }

    /// Ledger node that serves `last` blocks, then closes once `close` fires.
    async fn fake_ledger(last: u64, close: oneshot::Receiver<()>) -> String {
        let (listener, addr) = bind().await;
        tokio::spawn(async move {
            let (mut conn, _) = listener.accept().await.unwrap();
            let Some(RelayMessage::Subscribe(req)) = RelayCodec::read_frame(&mut conn).await.unwrap() else {
                panic!("expected Subscribe");
            };
            req.verify().unwrap();
            for h in req.first_height().get()..=last {
                let block = Block::new(BlockHeight::new(h), format!("block-{h}").into_bytes());
                RelayCodec::write_frame(&mut conn, &RelayMessage::block(&block))
                    .await
                    .unwrap();
            }
            let _ = close.await;
        });
        addr
    }

    /// Broker that acknowledges every publish and records its height.
    async fn fake_broker() -> (u16, Arc<Mutex<Vec<u64>>>) {
        let (listener, _) = bind().await;
        let port = listener.local_addr().unwrap().port();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = seen.clone();
        tokio::spawn(async move {
            let (mut conn, _) = listener.accept().await.unwrap();
            while let Ok(Some(RelayMessage::Publish { message_id, height, .. })) =
                RelayCodec::read_frame(&mut conn).await
            {
                record.lock().unwrap().push(height.get());
                RelayCodec::write_frame(&mut conn, &RelayMessage::PublishAck { message_id })
                    .await
                    .unwrap();
            }
        });
        (port, seen)
    }

    /// The live wiring, with the framed broker standing in for AMQP.
    async fn connect_framed(
        config: &AdapterConfig,
    ) -> Supervisor<LedgerBlockSource, BrokerPublisher, FileCheckpointStore> {
        let (source, checkpoints) = prepare(config).unwrap();
        let publisher = BrokerPublisher::connect(config.broker.clone()).await.unwrap();
        Supervisor::new(source, publisher, checkpoints)
    }

    fn config(dir: &Path, ledger: String, broker_port: u16) -> AdapterConfig {
        let mut config = AdapterConfig::default();
        let keys = KeyPair::new(SigningKey::generate_with(&mut StdRng::seed_from_u64(42)));
        keys.store(&dir.join("keys"), &config.ledger.account).unwrap();
        config.ledger.endpoint = ledger;
        config.ledger.keys_dir = dir.join("keys");
        config.broker.host = "127.0.0.1".into();
        config.broker.port = broker_port;
        config.checkpoint.path = dir.join("state").join("last_block");
        config
    }

    #[tokio::test]
    async fn relays_over_the_network_then_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let (close, closed) = oneshot::channel();
        let ledger = fake_ledger(5, closed).await;
        let (port, seen) = fake_broker().await;
        let config = config(dir.path(), ledger, port);

        let supervisor = connect_framed(&config).await;
        let mut states = supervisor.state_watch();
        let run = tokio::spawn(supervisor.run());

        // Healthy: all five blocks relayed and the adapter still streaming.
        let checkpoints = FileCheckpointStore::new(&config.checkpoint.path);
        tokio::time::timeout(Duration::from_secs(5), async {
            while checkpoints.get().unwrap() < BlockHeight::new(5) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!run.is_finished());
        assert_eq!(*states.borrow_and_update(), AdapterState::Streaming);

        // Forcibly close the ledger side.
        let started = Instant::now();
        close.send(()).unwrap();
        let done = tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .expect("adapter still running 5s after ledger loss")
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(*states.borrow(), AdapterState::Terminated);

        assert_eq!(done.kind(), ErrorKind::ConnectionLost);
        assert_eq!(done.exit_code(), 10);
        assert_eq!(done.last_checkpoint, Some(BlockHeight::new(5)));
        assert_eq!(checkpoints.get().unwrap(), BlockHeight::new(5));
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn restart_resumes_after_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let (close, closed) = oneshot::channel();
        let ledger = fake_ledger(7, closed).await;
        let (port, seen) = fake_broker().await;
        let config = config(dir.path(), ledger, port);
        FileCheckpointStore::create(&config.checkpoint.path)
            .unwrap()
            .set(BlockHeight::new(4))
            .unwrap();

        let run = tokio::spawn(connect_framed(&config).await.run());
        let checkpoints = FileCheckpointStore::new(&config.checkpoint.path);
        tokio::time::timeout(Duration::from_secs(5), async {
            while checkpoints.get().unwrap() < BlockHeight::new(7) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        drop(close);
        let done = run.await.unwrap();

        assert_eq!(done.blocks_relayed, 3);
        assert_eq!(*seen.lock().unwrap(), vec![5, 6, 7]);
    }

    #[tokio::test]
    async fn unreachable_broker_fails_bootstrap() {
        let dir = tempfile::tempdir().unwrap();
        let (listener, _) = bind().await;
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let config = config(dir.path(), "127.0.0.1:1".into(), port);

        let err = connect(&config).await.err().unwrap();
        assert!(matches!(err, BootstrapError::Publish(_)));
        assert_eq!(err.exit_code(), ErrorKind::PublishFailure.exit_code());
    }

    #[tokio::test]
    async fn missing_keys_fail_bootstrap() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path(), "127.0.0.1:1".into(), 5672);
        config.ledger.keys_dir = dir.path().join("elsewhere");

        let err = connect(&config).await.err().unwrap();
        assert!(matches!(err, BootstrapError::Source(_)));
        assert_eq!(err.exit_code(), crate::error::BOOTSTRAP_EXIT_CODE);
    }
}
