//! Request/status correlation engine
//!
//! One [`ExchangeCoordinator`] per node holds exactly one open exchange. The
//! public request methods install a request state and hand it to the
//! [`MeshTransport`]; write completions and notifications then move it to the
//! matching status state and back to idle.

mod coordinator;
mod listener;
pub mod registry;
mod segmentation;
mod state;
mod transport;

pub use coordinator::{
    ExchangeConfig, ExchangeCoordinator, ExchangeStats, OnOffTarget, TransitionOutcome,
};
pub use listener::{ConfigurationStatusListener, MeshManagerListener, NoopListener};
pub use segmentation::SegmentedTransfer;
pub use state::{
    Awaiting, ExchangeContext, ExchangeId, MeshMessageState, MessageState, NoOperation, Outgoing,
    StateCategory, StateTag,
};
pub use transport::{
    BlockAck, EncryptionKey, InboundMessage, MeshTransport, OutboundMessage, OutboundRequest,
};
