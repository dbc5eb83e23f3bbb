//! Node data model consumed by the exchange engine
//!
//! Nodes are owned by the caller's registry. The engine only reads them while
//! an exchange is in flight and reports anything that must be persisted back
//! through the listeners.

use std::collections::BTreeMap;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{CompositionData, Error, Result};

/// Unicast element address (0x0001..=0x7FFF)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UnicastAddress(u16);

impl UnicastAddress {
    /// Highest unicast address
    pub const MAX: u16 = 0x7FFF;

    /// Create a validated unicast address
    pub const fn new(address: u16) -> Result<Self> {
        if address == 0 || address > Self::MAX {
            return Err(Error::InvalidUnicastAddress { address });
        }
        Ok(Self(address))
    }

    /// Raw value
    #[must_use]
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Address `count` elements further on, if still unicast
    #[must_use]
    pub fn offset(self, count: usize) -> Option<Self> {
        let count = u16::try_from(count).ok()?;
        let next = self.0.checked_add(count)?;
        Self::new(next).ok()
    }

    /// Little endian wire octets
    #[must_use]
    pub const fn to_le_bytes(self) -> [u8; 2] {
        self.0.to_le_bytes()
    }
}

impl fmt::Display for UnicastAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// Any mesh destination address (unicast, virtual or group)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Address(pub u16);

impl Address {
    /// Unassigned address
    pub const UNASSIGNED: Self = Self(0x0000);

    /// Check if unicast
    #[must_use]
    pub const fn is_unicast(self) -> bool {
        self.0 != 0 && self.0 <= UnicastAddress::MAX
    }

    /// Check if virtual
    #[must_use]
    pub const fn is_virtual(self) -> bool {
        matches!(self.0, 0x8000..=0xBFFF)
    }

    /// Check if group
    #[must_use]
    pub const fn is_group(self) -> bool {
        self.0 >= 0xC000
    }
}

impl From<UnicastAddress> for Address {
    fn from(address: UnicastAddress) -> Self {
        Self(address.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// Global NetKey / AppKey index (12 bits)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeyIndex(u16);

impl KeyIndex {
    /// Largest encodable index
    pub const MAX: u16 = 0x0FFF;

    /// Create a validated key index
    pub const fn new(index: u16) -> Result<Self> {
        if index > Self::MAX {
            return Err(Error::InvalidKeyIndex { index });
        }
        Ok(Self(index))
    }

    /// Raw value
    #[must_use]
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Build from the low 12 bits of a raw value
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits & Self::MAX)
    }
}

/// Pack two key indexes into three octets, `first` in the low 12 bits
#[must_use]
pub fn pack_key_indexes(first: KeyIndex, second: KeyIndex) -> [u8; 3] {
    let packed = u32::from(first.0) | (u32::from(second.0) << 12);
    let [b0, b1, b2, _] = packed.to_le_bytes();
    [b0, b1, b2]
}

/// Inverse of [`pack_key_indexes`]
#[must_use]
pub fn unpack_key_indexes(octets: [u8; 3]) -> (KeyIndex, KeyIndex) {
    let packed = u32::from_le_bytes([octets[0], octets[1], octets[2], 0]);
    (
        KeyIndex::from_bits((packed & 0x0FFF) as u16),
        KeyIndex::from_bits((packed >> 12) as u16),
    )
}

/// 128-bit application key
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AppKey([u8; AppKey::LEN]);

impl AppKey {
    /// Key length in bytes
    pub const LEN: usize = 16;

    /// Wrap raw key bytes
    #[must_use]
    pub const fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    /// Parse a 32-digit hex string
    pub fn from_hex(hex_key: &str) -> Result<Self> {
        let decoded = hex::decode(hex_key.trim())?;
        let bytes: [u8; Self::LEN] = decoded
            .as_slice()
            .try_into()
            .map_err(|_| Error::InvalidAppKeyLength { len: decoded.len() })?;
        Ok(Self(bytes))
    }

    /// Borrow key bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }
}

impl fmt::Debug for AppKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppKey").finish_non_exhaustive()
    }
}

/// SIG or vendor model identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ModelId {
    /// 16-bit Bluetooth SIG model
    Sig(u16),
    /// Vendor model qualified by company identifier
    Vendor {
        /// Company identifier
        company_id: u16,
        /// Vendor-assigned model id
        model_id: u16,
    },
}

impl ModelId {
    /// Configuration Server
    pub const CONFIGURATION_SERVER: Self = Self::Sig(0x0000);
    /// Configuration Client
    pub const CONFIGURATION_CLIENT: Self = Self::Sig(0x0001);
    /// Generic OnOff Server
    pub const GENERIC_ON_OFF_SERVER: Self = Self::Sig(0x1000);
    /// Generic OnOff Client
    pub const GENERIC_ON_OFF_CLIENT: Self = Self::Sig(0x1001);

    /// Wire length in octets
    #[must_use]
    pub const fn encoded_len(self) -> usize {
        match self {
            Self::Sig(_) => 2,
            Self::Vendor { .. } => 4,
        }
    }

    /// Append the identifier in wire order
    pub fn encode(self, out: &mut Vec<u8>) {
        match self {
            Self::Sig(id) => out.extend_from_slice(&id.to_le_bytes()),
            Self::Vendor {
                company_id,
                model_id,
            } => {
                out.extend_from_slice(&company_id.to_le_bytes());
                out.extend_from_slice(&model_id.to_le_bytes());
            }
        }
    }

    /// Decode a trailing identifier; its length selects SIG or vendor form
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        match *bytes {
            [a, b] => Ok(Self::Sig(u16::from_le_bytes([a, b]))),
            [a, b, c, d] => Ok(Self::Vendor {
                company_id: u16::from_le_bytes([a, b]),
                model_id: u16::from_le_bytes([c, d]),
            }),
            _ => Err(Error::Truncated {
                needed: if bytes.len() < 2 { 2 } else { 4 },
                got: bytes.len(),
            }),
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sig(id) => write!(f, "{id:#06x}"),
            Self::Vendor {
                company_id,
                model_id,
            } => write!(f, "{company_id:#06x}:{model_id:#06x}"),
        }
    }
}

/// A model hosted on one of a node's elements
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeshModel {
    /// Model identifier
    pub model_id: ModelId,
    /// App keys bound to the model
    pub bound_app_keys: Vec<KeyIndex>,
    /// Current publish address, if any
    pub publish_address: Option<Address>,
    /// Subscription list
    pub subscriptions: Vec<Address>,
}

impl MeshModel {
    /// Model with no bindings, publication or subscriptions
    #[must_use]
    pub fn new(model_id: ModelId) -> Self {
        Self {
            model_id,
            bound_app_keys: Vec::new(),
            publish_address: None,
            subscriptions: Vec::new(),
        }
    }
}

/// Addressable element of a node
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Element {
    /// Element unicast address
    pub address: UnicastAddress,
    /// GATT namespace location descriptor
    pub location: u16,
    /// Hosted models
    pub models: Vec<MeshModel>,
}

/// A node that completed provisioning
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProvisionedNode {
    /// Human-readable name
    pub name: String,
    /// Primary element address
    pub unicast_address: UnicastAddress,
    /// Address the configuration client sends from
    pub configuration_src: UnicastAddress,
    /// Network key index used for configuration
    pub net_key_index: KeyIndex,
    /// Composition page 0, once retrieved
    pub composition: Option<CompositionData>,
    /// Elements keyed by address
    pub elements: BTreeMap<UnicastAddress, Element>,
    /// App keys added to the node
    pub app_keys: BTreeMap<KeyIndex, AppKey>,
}

impl ProvisionedNode {
    /// Freshly provisioned node with no composition data
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        unicast_address: UnicastAddress,
        configuration_src: UnicastAddress,
    ) -> Self {
        Self {
            name: name.into(),
            unicast_address,
            configuration_src,
            net_key_index: KeyIndex::default(),
            composition: None,
            elements: BTreeMap::new(),
            app_keys: BTreeMap::new(),
        }
    }

    /// Number of elements, falling back to one before composition is known
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.composition
            .as_ref()
            .map(|composition| composition.elements.len())
            .or_else(|| (!self.elements.is_empty()).then_some(self.elements.len()))
            .unwrap_or(1)
    }
}
