//! Access-layer opcodes

use std::fmt;

use super::{Error, Result};

/// Access-layer opcode (1, 2 or 3 octets on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Opcode(u32);

impl Opcode {
    /// Config AppKey Add
    pub const CONFIG_APPKEY_ADD: Self = Self(0x00);
    /// Config Composition Data Status
    pub const CONFIG_COMPOSITION_DATA_STATUS: Self = Self(0x02);
    /// Config Model Publication Set
    pub const CONFIG_MODEL_PUBLICATION_SET: Self = Self(0x03);
    /// Config AppKey Status
    pub const CONFIG_APPKEY_STATUS: Self = Self(0x8003);
    /// Config Composition Data Get
    pub const CONFIG_COMPOSITION_DATA_GET: Self = Self(0x8008);
    /// Config Model Publication Status
    pub const CONFIG_MODEL_PUBLICATION_STATUS: Self = Self(0x8019);
    /// Config Model Subscription Add
    pub const CONFIG_MODEL_SUBSCRIPTION_ADD: Self = Self(0x801B);
    /// Config Model Subscription Delete
    pub const CONFIG_MODEL_SUBSCRIPTION_DELETE: Self = Self(0x801C);
    /// Config Model Subscription Status
    pub const CONFIG_MODEL_SUBSCRIPTION_STATUS: Self = Self(0x801F);
    /// Config Model App Bind
    pub const CONFIG_MODEL_APP_BIND: Self = Self(0x803D);
    /// Config Model App Status
    pub const CONFIG_MODEL_APP_STATUS: Self = Self(0x803E);
    /// Config Model App Unbind
    pub const CONFIG_MODEL_APP_UNBIND: Self = Self(0x803F);
    /// Config Node Reset
    pub const CONFIG_NODE_RESET: Self = Self(0x8049);
    /// Config Node Reset Status
    pub const CONFIG_NODE_RESET_STATUS: Self = Self(0x804A);
    /// Generic OnOff Get
    pub const GENERIC_ON_OFF_GET: Self = Self(0x8201);
    /// Generic OnOff Set
    pub const GENERIC_ON_OFF_SET: Self = Self(0x8202);
    /// Generic OnOff Set Unacknowledged
    pub const GENERIC_ON_OFF_SET_UNACKNOWLEDGED: Self = Self(0x8203);
    /// Generic OnOff Status
    pub const GENERIC_ON_OFF_STATUS: Self = Self(0x8204);

    /// Create from raw value, validating the encoding class
    pub fn new(value: u32) -> Result<Self> {
        let opcode = Self(value);
        if opcode.len().is_some() {
            return Ok(opcode);
        }
        let leading = match value {
            0..=0xFF => value,
            0x100..=0xFFFF => value >> 8,
            _ => value >> 16,
        };
        Err(Error::InvalidOpcode {
            byte: (leading & 0xFF) as u8,
        })
    }

    /// Vendor opcode: 6-bit opcode plus company identifier
    #[must_use]
    pub const fn vendor(opcode: u8, company_id: u16) -> Self {
        Self((((0xC0 | (opcode & 0x3F)) as u32) << 16) | company_id as u32)
    }

    /// Raw value
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Encoded length in octets, `None` for values outside every class
    #[must_use]
    pub const fn len(self) -> Option<usize> {
        match self.0 {
            0x00..=0x7E => Some(1),
            0x8000..=0xBFFF => Some(2),
            0x00C0_0000..=0x00FF_FFFF => Some(3),
            _ => None,
        }
    }

    /// Check if this is a vendor opcode
    #[must_use]
    pub const fn is_vendor(self) -> bool {
        matches!(self.len(), Some(3))
    }

    /// Append the opcode octets to `out`
    pub fn encode(self, out: &mut Vec<u8>) {
        let [_, b2, b1, b0] = self.0.to_be_bytes();
        match self.len() {
            Some(1) => out.push(b0),
            Some(2) => out.extend_from_slice(&[b1, b0]),
            // company id is little endian after the opcode octet
            Some(3) => out.extend_from_slice(&[b2, b0, b1]),
            _ => {}
        }
    }

    /// Split an access payload into its opcode and parameters
    pub fn decode(payload: &[u8]) -> Result<(Self, &[u8])> {
        let Some(&first) = payload.first() else {
            return Err(Error::Truncated { needed: 1, got: 0 });
        };
        let len = match first >> 6 {
            0b00 | 0b01 if first == 0x7F => return Err(Error::InvalidOpcode { byte: first }),
            0b00 | 0b01 => 1,
            0b10 => 2,
            _ => 3,
        };
        if payload.len() < len {
            return Err(Error::Truncated {
                needed: len,
                got: payload.len(),
            });
        }
        let value = match len {
            1 => u32::from(first),
            2 => u32::from(u16::from_be_bytes([payload[0], payload[1]])),
            _ => (u32::from(first) << 16) | u32::from(u16::from_le_bytes([payload[1], payload[2]])),
        };
        Ok((Self(value), &payload[len..]))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.len() {
            Some(1) => write!(f, "{:#04x}", self.0),
            Some(2) => write!(f, "{:#06x}", self.0),
            _ => write!(f, "{:#08x}", self.0),
        }
    }
}
