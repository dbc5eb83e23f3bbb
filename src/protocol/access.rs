//! Access-layer message: opcode plus parameters

use bytes::{BufMut, Bytes, BytesMut};

use super::{Error, Opcode, Result};

/// Upper transport MIC size, selected by the SZMIC/ASZMIC bit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MicSize {
    /// 32-bit TransMIC
    #[default]
    Mic32,
    /// 64-bit TransMIC (segmented messages only)
    Mic64,
}

impl MicSize {
    /// Map the aszmic flag onto a MIC size
    #[must_use]
    pub const fn from_aszmic(aszmic: bool) -> Self {
        if aszmic { Self::Mic64 } else { Self::Mic32 }
    }

    /// MIC length in octets
    #[must_use]
    pub const fn len(self) -> usize {
        match self {
            Self::Mic32 => 4,
            Self::Mic64 => 8,
        }
    }
}

/// Decrypted access-layer message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessMessage {
    opcode: Opcode,
    parameters: Bytes,
}

impl AccessMessage {
    /// Create a new message
    pub fn new(opcode: Opcode, parameters: impl Into<Bytes>) -> Self {
        Self {
            opcode,
            parameters: parameters.into(),
        }
    }

    /// Message without parameters
    #[must_use]
    pub fn empty(opcode: Opcode) -> Self {
        Self::new(opcode, Bytes::new())
    }

    /// Get opcode
    #[must_use]
    pub const fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Get parameters
    #[must_use]
    pub fn parameters(&self) -> &Bytes {
        &self.parameters
    }

    /// Encode opcode and parameters into a single access payload
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut opcode = Vec::with_capacity(3);
        self.opcode.encode(&mut opcode);
        let mut out = BytesMut::with_capacity(opcode.len() + self.parameters.len());
        out.put_slice(&opcode);
        out.put_slice(&self.parameters);
        out.freeze()
    }

    /// Decode an access payload
    pub fn decode(payload: &Bytes) -> Result<Self> {
        let (opcode, parameters) = Opcode::decode(payload)?;
        let offset = payload.len() - parameters.len();
        Ok(Self {
            opcode,
            parameters: payload.slice(offset..),
        })
    }

    /// Decode and require a specific opcode
    pub fn decode_expecting(payload: &Bytes, expected: Opcode) -> Result<Self> {
        let message = Self::decode(payload)?;
        if message.opcode != expected {
            return Err(Error::UnexpectedOpcode {
                expected,
                found: message.opcode,
            });
        }
        Ok(message)
    }
}

/// Cursor over message parameters
#[derive(Debug)]
pub(crate) struct ParamReader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> ParamReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.offset + len;
        if end > self.buf.len() {
            return Err(Error::Truncated {
                needed: end,
                got: self.buf.len(),
            });
        }
        let slice = &self.buf[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    pub(crate) fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u16_le(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub(crate) fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let slice = &self.buf[self.offset..];
        self.offset = self.buf.len();
        slice
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_message_layout() {
        let message = AccessMessage::new(Opcode::CONFIG_APPKEY_STATUS, vec![0x00, 0x01, 0x02]);
        let encoded = message.encode();
        assert_eq!(encoded.as_ref(), &[0x80, 0x03, 0x00, 0x01, 0x02]);

        let decoded = AccessMessage::decode(&encoded).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn test_decode_expecting_rejects_other_opcode() {
        let payload = AccessMessage::empty(Opcode::CONFIG_NODE_RESET_STATUS).encode();
        let err = AccessMessage::decode_expecting(&payload, Opcode::GENERIC_ON_OFF_STATUS)
            .unwrap_err();
        assert!(matches!(err, Error::UnexpectedOpcode { .. }));
    }

    #[test]
    fn test_param_reader_reports_truncation() {
        let mut reader = ParamReader::new(&[0x01, 0x02, 0x03]);
        assert_eq!(reader.u8().unwrap(), 0x01);
        assert_eq!(reader.remaining(), 2);
        assert!(matches!(
            reader.array::<4>(),
            Err(Error::Truncated { needed: 5, got: 3 })
        ));
        assert_eq!(reader.u16_le().unwrap(), 0x0302);
    }

    #[test]
    fn test_mic_size_from_aszmic() {
        assert_eq!(MicSize::from_aszmic(false).len(), 4);
        assert_eq!(MicSize::from_aszmic(true), MicSize::Mic64);
    }
}
