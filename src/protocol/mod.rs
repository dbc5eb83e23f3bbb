//! Access-layer wire types and the node data model
//!
//! Encryption and segmentation belong to the lower transport; this module only
//! covers opcodes and message parameters.

mod access;
mod config;
mod error;
mod generic;
mod node;
mod opcode;
mod status;

pub use access::{AccessMessage, MicSize};
pub use config::{
    AppKeyAdd, AppKeyStatus, BindingKind, CompositionData, CompositionDataGet,
    CompositionDataStatus, ElementComposition, Features, ModelAppBinding, ModelAppStatus,
    ModelPublicationStatus, ModelSubscription, ModelSubscriptionStatus, PublicationParams,
    PublishRetransmit, SubscriptionAction, node_reset,
};
pub use error::{Error, Result};
pub use generic::{GenericOnOffStatus, OnOffSet, StepResolution, TransitionTime, on_off_get};
pub use node::{
    Address, AppKey, Element, KeyIndex, MeshModel, ModelId, ProvisionedNode, UnicastAddress,
    pack_key_indexes, unpack_key_indexes,
};
pub use opcode::Opcode;
pub use status::StatusCode;

/// Maximum access payload carried by a single unsegmented PDU
pub const MAX_UNSEGMENTED_ACCESS_PAYLOAD: usize = 11;

/// Maximum segments in one segmented transaction (SegN is 5 bits)
pub const MAX_SEGMENTS: usize = 32;
