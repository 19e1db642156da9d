use std::fmt;

/// Lifecycle of one adapter run.
///
/// ```text
/// Init -> Connecting -> Streaming -> Publishing -> Checkpointing -> Streaming -> ...
///                                                     any state -> Terminated
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AdapterState {
    /// Reading the stored checkpoint.
    Init,
    /// Opening the block subscription at checkpoint + 1.
    Connecting,
    /// Waiting for the next block.
    Streaming,
    /// Handing a block to the broker.
    Publishing,
    /// Persisting the height of the block just published.
    Checkpointing,
    /// Failed; the run is over.
    Terminated,
}

impl AdapterState {
    pub fn can_transition_to(self, next: AdapterState) -> bool {
        use AdapterState::*;
        match (self, next) {
            (Terminated, _) => false,
            (_, Terminated) => true,
            (Init, Connecting)
            | (Connecting, Streaming)
            | (Streaming, Publishing)
            | (Publishing, Checkpointing)
            | (Checkpointing, Streaming) => true,
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == AdapterState::Terminated
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AdapterState::Init => "init",
            AdapterState::Connecting => "connecting",
            AdapterState::Streaming => "streaming",
            AdapterState::Publishing => "publishing",
            AdapterState::Checkpointing => "checkpointing",
            AdapterState::Terminated => "terminated",
        }
    }
}

impl fmt::Display for AdapterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
