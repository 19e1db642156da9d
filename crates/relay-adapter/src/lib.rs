//! Chain adapter core: relays every ledger block to a broker, in order,
//! checkpointing after each one.
//!
//! The [`Supervisor`] wires three collaborators together:
//!
//! - a [`BlockSource`](relay_source::BlockSource) opened just after the
//!   stored checkpoint,
//! - a [`Republisher`](relay_publish::Republisher) that must confirm each
//!   block before the adapter moves on,
//! - a [`CheckpointStore`](relay_checkpoint::CheckpointStore) written after
//!   every confirmed publish.
//!
//! Any failure ends the run. There is no retry, reconnect or backoff inside
//! the process; the returned [`Termination`] carries an exit code and an
//! external supervisor restarts the process, which then resumes from the
//! last checkpoint. A block published just before a crash may therefore be
//! published again after the restart (at-least-once).

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod state;
pub mod supervisor;

pub use bootstrap::{connect, prepare, LiveSupervisor};
pub use config::{AdapterConfig, CheckpointConfig, ConfigError, ConfigResult};
pub use error::{AdapterError, AdapterResult, BootstrapError, ErrorKind, BOOTSTRAP_EXIT_CODE};
pub use state::AdapterState;
pub use supervisor::{Supervisor, Termination};
