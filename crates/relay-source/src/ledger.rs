use std::io;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use socket2::{SockRef, TcpKeepalive};
use tokio::net::TcpStream;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use relay_crypto::KeyPair;
use relay_protocol::{ProtocolError, RelayCodec, RelayMessage, SubscribeRequest};
use relay_types::{AccountId, Block, BlockHeight};

use crate::error::{SourceError, SourceResult};
use crate::stream::{BlockSink, BlockStream};
use crate::traits::BlockSource;

/// Idle time before the kernel starts probing a silent ledger connection.
const KEEPALIVE_IDLE: Duration = Duration::from_secs(30);
#[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(10);
#[cfg(any(target_os = "linux", target_os = "macos"))]
const KEEPALIVE_RETRIES: u32 = 3;

/// Where the ledger node lives and who the adapter is to it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// `host:port` of the node's block streaming endpoint.
    pub endpoint: String,
    /// Account with block-read permission.
    pub account: AccountId,
    /// Directory holding `<account>.priv` and `<account>.pub`.
    pub keys_dir: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            endpoint: "127.0.0.1:50051".into(),
            account: AccountId::new("relay", "notary").expect("valid default account"),
            keys_dir: PathBuf::from("keys"),
        }
    }
}

/// Block subscription to a remote ledger node over TCP.
///
/// `open` connects, sends a signed [`SubscribeRequest`] and spawns one reader
/// task that decodes `Block` frames into the returned stream. The reader is
/// the only producer, so blocks are handed over strictly one at a time. It
/// stops at the first `Error` frame, unexpected frame, I/O error or EOF and
/// passes that on as the stream's terminal error.
pub struct LedgerBlockSource {
    endpoint: String,
    account: AccountId,
    keys: KeyPair,
    active: Option<AbortHandle>,
}

impl LedgerBlockSource {
    pub fn new(endpoint: impl Into<String>, account: AccountId, keys: KeyPair) -> Self {
        Self {
            endpoint: endpoint.into(),
            account,
            keys,
            active: None,
        }
    }

    /// Build from configuration, loading the account's key pair from disk.
    pub fn from_config(config: &LedgerConfig) -> SourceResult<Self> {
        let keys = KeyPair::load(&config.keys_dir, &config.account)?;
        Ok(Self::new(config.endpoint.clone(), config.account.clone(), keys))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn account(&self) -> &AccountId {
        &self.account
    }
}

#[async_trait]
impl BlockSource for LedgerBlockSource {
    async fn open(&mut self, after: BlockHeight) -> SourceResult<BlockStream> {
        if let Some(previous) = self.active.take() {
            debug!("closing previous ledger subscription");
            previous.abort();
        }

        let mut conn = TcpStream::connect(&self.endpoint)
            .await
            .map_err(|e| SourceError::ConnectionLost(format!("connect {}: {e}", self.endpoint)))?;
        tune_socket(&conn).map_err(|e| SourceError::ConnectionLost(e.to_string()))?;

        let request = SubscribeRequest::signed(self.account.clone(), after, &self.keys);
        RelayCodec::write_frame(&mut conn, &RelayMessage::Subscribe(request))
            .await
            .map_err(transport_error)?;

        let (sink, stream) = BlockStream::channel(after);
        let reader = tokio::spawn(read_blocks(conn, sink));
        self.active = Some(reader.abort_handle());

        info!(
            endpoint = %self.endpoint,
            account = %self.account,
            from = %after.next(),
            "subscribed to ledger block stream"
        );
        Ok(stream.attach(reader))
    }
}

async fn read_blocks(mut conn: TcpStream, sink: BlockSink) {
    let error = loop {
        match RelayCodec::read_frame(&mut conn).await {
            Ok(Some(RelayMessage::Block { height, payload })) => {
                if !sink.deliver(Block::new(height, payload)).await {
                    return;
                }
            }
            Ok(Some(RelayMessage::Error { code, message })) => {
                break SourceError::Remote { code, message };
            }
            Ok(Some(other)) => break SourceError::UnexpectedMessage(other.type_name()),
            Ok(None) => {
                break SourceError::ConnectionLost("ledger closed the block stream".into());
            }
            Err(e) => break transport_error(e),
        }
    };
    warn!(%error, "ledger block stream ended");
    sink.fail(error).await;
}

/// Disable Nagle and turn on TCP keepalive, so a ledger host that vanishes
/// without closing the connection still surfaces as a read error.
fn tune_socket(conn: &TcpStream) -> io::Result<()> {
    conn.set_nodelay(true)?;
    let keepalive = TcpKeepalive::new().with_time(KEEPALIVE_IDLE);
    #[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
    let keepalive = keepalive.with_interval(KEEPALIVE_INTERVAL);
    #[cfg(any(target_os = "linux", target_os = "macos"))]
    let keepalive = keepalive.with_retries(KEEPALIVE_RETRIES);
    SockRef::from(conn).set_tcp_keepalive(&keepalive)
}

fn transport_error(e: ProtocolError) -> SourceError {
    match e {
        ProtocolError::Io(io) => SourceError::ConnectionLost(io.to_string()),
        other => SourceError::Protocol(other),
    }
}
