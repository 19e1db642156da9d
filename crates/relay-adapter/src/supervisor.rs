use std::convert::Infallible;

use tokio::sync::watch;
use tracing::{debug, error, info};

use relay_checkpoint::CheckpointStore;
use relay_publish::Republisher;
use relay_source::BlockSource;
use relay_types::BlockHeight;

use crate::error::{AdapterError, AdapterResult, ErrorKind};
use crate::state::AdapterState;

/// How a run ended.
#[derive(Debug)]
pub struct Termination {
    pub error: AdapterError,
    /// Last checkpoint known to be durable, `None` if it could not be read.
    pub last_checkpoint: Option<BlockHeight>,
    /// Blocks published and checkpointed during this run.
    pub blocks_relayed: u64,
}

impl Termination {
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }
}

#[derive(Default)]
struct Progress {
    checkpoint: Option<BlockHeight>,
    relayed: u64,
}

/// Drives one adapter run from the stored checkpoint until the first failure.
///
/// Strictly sequential: one block is received, published, then checkpointed
/// before the next one is read. The checkpoint is read exactly once, at
/// startup, and is only ever written with the height of a block the
/// publisher has confirmed, so it never moves backwards and never passes a
/// block that was not delivered.
pub struct Supervisor<S, P, C> {
    source: S,
    publisher: P,
    checkpoints: C,
    state: watch::Sender<AdapterState>,
}

impl<S, P, C> Supervisor<S, P, C>
where
    S: BlockSource,
    P: Republisher,
    C: CheckpointStore,
{
    pub fn new(source: S, publisher: P, checkpoints: C) -> Self {
        let (state, _) = watch::channel(AdapterState::Init);
        Self {
            source,
            publisher,
            checkpoints,
            state,
        }
    }

    /// Observe state changes, including the final `Terminated`.
    pub fn state_watch(&self) -> watch::Receiver<AdapterState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> AdapterState {
        *self.state.borrow()
    }

    /// Relay blocks until something fails. Never returns early otherwise.
    pub async fn run(mut self) -> Termination {
        let mut progress = Progress::default();
        let error = match self.relay(&mut progress).await {
            Ok(never) => match never {},
            Err(e) => e,
        };
        error!(
            kind = %error.kind(),
            %error,
            checkpoint = ?progress.checkpoint.map(BlockHeight::get),
            relayed = progress.relayed,
            "adapter terminated"
        );
        self.enter(AdapterState::Terminated);
        Termination {
            error,
            last_checkpoint: progress.checkpoint,
            blocks_relayed: progress.relayed,
        }
    }

    async fn relay(&mut self, progress: &mut Progress) -> AdapterResult<Infallible> {
        let mut last = self.checkpoints.get()?;
        progress.checkpoint = Some(last);
        info!(checkpoint = %last, resume_from = %last.next(), "starting chain adapter");

        self.enter(AdapterState::Connecting);
        let mut stream = self.source.open(last).await?;
        self.enter(AdapterState::Streaming);

        loop {
            let block = stream.next().await?;
            if block.height <= last {
                return Err(AdapterError::StreamOrderingViolation {
                    expected: last.next(),
                    actual: block.height,
                });
            }

            self.enter(AdapterState::Publishing);
            self.publisher
                .publish(&block)
                .await
                .map_err(|source| AdapterError::PublishFailure {
                    height: block.height,
                    source,
                })?;

            self.enter(AdapterState::Checkpointing);
            self.checkpoints.set(block.height)?;
            last = block.height;
            progress.checkpoint = Some(last);
            progress.relayed += 1;
            info!(
                height = %block.height,
                hash = %block.hash().short_hex(),
                bytes = block.len(),
                "block relayed"
            );

            self.enter(AdapterState::Streaming);
        }
    }

    fn enter(&self, next: AdapterState) {
        let current = *self.state.borrow();
        debug_assert!(
            current.can_transition_to(next),
            "invalid adapter transition {current} -> {next}"
        );
        debug!(from = %current, to = %next, "state transition");
        self.state.send_replace(next);
    }
}
