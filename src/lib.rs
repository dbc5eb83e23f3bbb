//! meshcfg - Bluetooth mesh configuration client exchange engine
//!
//! Correlates configuration and Generic OnOff requests with the status
//! messages a node sends back. Each node gets its own [`ExchangeCoordinator`],
//! which holds one open exchange and is driven by two bearer events: a write
//! completing and a notification arriving.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use bytes::Bytes;
//! use meshcfg::{
//!     ExchangeCoordinator, InboundMessage, MeshTransport, NoopListener, OutboundMessage,
//!     OutboundRequest, ProvisionedNode, Result, UnicastAddress,
//! };
//!
//! struct Bearer;
//!
//! impl MeshTransport for Bearer {
//!     fn create_message(
//!         &mut self,
//!         _node: &ProvisionedNode,
//!         request: &OutboundRequest,
//!     ) -> Result<OutboundMessage> {
//!         Ok(OutboundMessage::unsegmented(request.message.encode()))
//!     }
//!
//!     fn parse_pdu(&mut self, _node: &ProvisionedNode, _pdu: &[u8]) -> Option<InboundMessage> {
//!         None
//!     }
//!
//!     fn send_pdu(&mut self, _node: &ProvisionedNode, _pdu: &Bytes) {}
//! }
//!
//! let node = Arc::new(ProvisionedNode::new(
//!     "lamp",
//!     UnicastAddress::new(0x0002)?,
//!     UnicastAddress::new(0x0001)?,
//! ));
//! let mut coordinator = ExchangeCoordinator::new(Bearer, NoopListener, NoopListener);
//! coordinator.send_app_key_add(
//!     Arc::clone(&node),
//!     0,
//!     "63964771734fbd76e3b40519d1d94a48",
//!     false,
//! )?;
//! coordinator.on_write_complete(&node, &[]);
//! # Ok::<(), meshcfg::Error>(())
//! ```
//!
//! # Layout
//!
//! - [`protocol`] - opcodes, access message codecs and the node data model
//! - [`exchange`] - message states, the request/status registry and the coordinator

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod exchange;
pub mod protocol;

pub use exchange::{
    BlockAck, ConfigurationStatusListener, EncryptionKey, ExchangeConfig, ExchangeCoordinator,
    ExchangeId, ExchangeStats, InboundMessage, MeshManagerListener, MeshMessageState, MeshTransport,
    MessageState, NoopListener, OnOffTarget, OutboundMessage, OutboundRequest, StateCategory,
    StateTag, TransitionOutcome,
};
pub use protocol::{
    Address, AppKey, Error, KeyIndex, MeshModel, ModelId, Opcode, ProvisionedNode, Result,
    UnicastAddress,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
