use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::task::AbortHandle;

use relay_types::{Block, BlockHeight};

use crate::error::{SourceError, SourceResult};
use crate::stream::BlockStream;
use crate::traits::BlockSource;

/// What a scripted stream does once its blocks run out.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ScriptTail {
    /// Drop the connection, as a ledger node going away would.
    #[default]
    Disconnect,
    /// Stay open without delivering anything.
    Hang,
    /// End with a remote error frame.
    RemoteError { code: u32, message: String },
}

/// Shared record of every height a [`ScriptedBlockSource`] was opened at.
#[derive(Clone, Debug, Default)]
pub struct OpenLog(Arc<Mutex<Vec<BlockHeight>>>);

impl OpenLog {
    pub fn heights(&self) -> Vec<BlockHeight> {
        self.0.lock().expect("lock poisoned").clone()
    }

    fn record(&self, after: BlockHeight) {
        self.0.lock().expect("lock poisoned").push(after);
    }
}

/// In-memory block source over a fixed chain.
///
/// Intended for tests and embedding. By default it behaves like a well-formed
/// ledger: `open(after)` streams only the blocks above `after`. A
/// [`verbatim`](Self::verbatim) source instead replays its blocks exactly as
/// given, which is how malformed streams (gaps, replays) are produced.
pub struct ScriptedBlockSource {
    blocks: Vec<Block>,
    skip_processed: bool,
    tail: ScriptTail,
    opens: OpenLog,
    active: Option<AbortHandle>,
}

impl ScriptedBlockSource {
    /// A source serving `blocks`, skipping those at or below the open height.
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            skip_processed: true,
            tail: ScriptTail::default(),
            opens: OpenLog::default(),
            active: None,
        }
    }

    /// A well-formed chain of heights `1..=len` with payloads `block-<h>`.
    pub fn chain(len: u64) -> Self {
        Self::new(
            (1..=len)
                .map(|h| Block::new(BlockHeight::new(h), format!("block-{h}").into_bytes()))
                .collect(),
        )
    }

    /// A source that delivers `blocks` as-is on every open.
    pub fn verbatim(blocks: Vec<Block>) -> Self {
        Self {
            skip_processed: false,
            ..Self::new(blocks)
        }
    }

    pub fn with_tail(mut self, tail: ScriptTail) -> Self {
        self.tail = tail;
        self
    }

    /// Handle for inspecting open calls after the source has been moved.
    pub fn open_log(&self) -> OpenLog {
        self.opens.clone()
    }
}

#[async_trait]
impl BlockSource for ScriptedBlockSource {
    async fn open(&mut self, after: BlockHeight) -> SourceResult<BlockStream> {
        if let Some(previous) = self.active.take() {
            previous.abort();
        }
        self.opens.record(after);

        let blocks: Vec<Block> = self
            .blocks
            .iter()
            .filter(|b| !self.skip_processed || b.height > after)
            .cloned()
            .collect();
        let tail = self.tail.clone();

        let (sink, stream) = BlockStream::channel(after);
        let producer = tokio::spawn(async move {
            for block in blocks {
                if !sink.deliver(block).await {
                    return;
                }
            }
            match tail {
                ScriptTail::Disconnect => {
                    sink.fail(SourceError::ConnectionLost("scripted ledger disconnected".into()))
                        .await
                }
                ScriptTail::Hang => {
                    let _sink = sink;
                    std::future::pending::<()>().await
                }
                ScriptTail::RemoteError { code, message } => {
                    sink.fail(SourceError::Remote { code, message }).await
                }
            }
        });
        self.active = Some(producer.abort_handle());
        Ok(stream.attach(producer))
    }
}
