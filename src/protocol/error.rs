//! Mesh configuration client error types

use thiserror::Error;

use super::Opcode;

/// Errors raised while building requests or decoding access-layer payloads
#[derive(Error, Debug)]
pub enum Error {
    /// Payload ended before a field could be read
    #[error("truncated payload: need {needed} bytes, got {got}")]
    Truncated {
        /// Needed size
        needed: usize,
        /// Actual size
        got: usize,
    },

    /// Opcode octet is reserved for future use
    #[error("invalid opcode octet: {byte:#04x}")]
    InvalidOpcode {
        /// Offending leading octet
        byte: u8,
    },

    /// Payload carries a different opcode than the one awaited
    #[error("unexpected opcode: expected {expected}, got {found}")]
    UnexpectedOpcode {
        /// Awaited opcode
        expected: Opcode,
        /// Received opcode
        found: Opcode,
    },

    /// Status code outside the defined range
    #[error("invalid status code: {code:#04x}")]
    InvalidStatusCode {
        /// Raw status octet
        code: u8,
    },

    /// Address is not in the unicast range
    #[error("invalid unicast address: {address:#06x}")]
    InvalidUnicastAddress {
        /// Raw address
        address: u16,
    },

    /// Subscriptions only take group or virtual addresses
    #[error("invalid subscription address: {address:#06x}")]
    InvalidSubscriptionAddress {
        /// Raw address
        address: u16,
    },

    /// Key index does not fit in 12 bits
    #[error("invalid key index: {index:#x} (max 0xfff)")]
    InvalidKeyIndex {
        /// Raw index
        index: u16,
    },

    /// App key is not valid hex
    #[error("invalid app key: {0}")]
    InvalidAppKey(#[from] hex::FromHexError),

    /// App key has the wrong length
    #[error("invalid app key length: {len} bytes (expected 16)")]
    InvalidAppKeyLength {
        /// Decoded length
        len: usize,
    },

    /// Transition step count out of range
    #[error("invalid transition steps: {steps} (max 62)")]
    InvalidTransitionTime {
        /// Requested steps
        steps: u8,
    },

    /// Publish retransmit parameters do not fit their bit fields
    #[error("invalid publish retransmit: count {count} (max 7), steps {steps} (max 31)")]
    InvalidPublishRetransmit {
        /// Retransmit count
        count: u8,
        /// Interval steps
        steps: u8,
    },

    /// Lower transport produced more segments than a block ack can cover
    #[error("too many segments: {count} (max {max})")]
    TooManySegments {
        /// Produced segments
        count: usize,
        /// Maximum allowed
        max: usize,
    },

    /// An element lists more models of one kind than its count octet holds
    #[error("too many models in element: {count} (max 255)")]
    TooManyModels {
        /// Models of the offending kind
        count: usize,
    },

    /// Lower transport produced no PDU at all
    #[error("transport produced an empty message")]
    EmptyMessage,

    /// Transport refused to build or encrypt a message
    #[error("transport error: {0}")]
    Transport(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
