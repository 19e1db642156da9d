//! Block republishing for the chain adapter.
//!
//! A [`Republisher`] puts one block onto the broker and reports whether the
//! broker took it. Failures are returned, never retried or swallowed: a block
//! that silently failed to publish would leave an invisible hole in every
//! downstream consumer's view of the ledger.

pub mod amqp;
pub mod broker;
pub mod error;
pub mod memory;
pub mod traits;

pub use amqp::AmqpPublisher;
pub use broker::{BrokerConfig, BrokerPublisher};
pub use error::{PublishError, PublishResult};
pub use memory::RecordingPublisher;
pub use traits::Republisher;
