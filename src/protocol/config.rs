//! Configuration model messages
//!
//! Request types build their access payload; status types decode theirs. Each
//! status decoder takes the parameters that follow the opcode.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::access::ParamReader;
use super::{
    AccessMessage, Address, AppKey, Error, KeyIndex, ModelId, Opcode, Result, StatusCode,
    UnicastAddress, pack_key_indexes, unpack_key_indexes,
};

fn status_code(reader: &mut ParamReader<'_>) -> Result<StatusCode> {
    let code = reader.u8()?;
    StatusCode::from_u8(code).ok_or(Error::InvalidStatusCode { code })
}

fn element_address(reader: &mut ParamReader<'_>) -> Result<UnicastAddress> {
    UnicastAddress::new(reader.u16_le()?)
}

/// Feature bits advertised in composition data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Features(u16);

impl Features {
    /// Relay feature
    pub const RELAY: u16 = 1 << 0;
    /// Proxy feature
    pub const PROXY: u16 = 1 << 1;
    /// Friend feature
    pub const FRIEND: u16 = 1 << 2;
    /// Low power feature
    pub const LOW_POWER: u16 = 1 << 3;

    /// Create from raw bits
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Raw bits
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Check if feature is supported
    #[must_use]
    pub const fn has(self, feature: u16) -> bool {
        (self.0 & feature) != 0
    }
}

/// Element entry of composition data page 0
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ElementComposition {
    /// Location descriptor
    pub location: u16,
    /// SIG and vendor models, SIG first
    pub models: Vec<ModelId>,
}

/// Composition data page 0
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompositionData {
    /// Company identifier
    pub company_id: u16,
    /// Product identifier
    pub product_id: u16,
    /// Product version identifier
    pub version_id: u16,
    /// Minimum replay protection list entries
    pub crpl: u16,
    /// Supported features
    pub features: Features,
    /// Elements in address order
    pub elements: Vec<ElementComposition>,
}

impl CompositionData {
    /// Decode page 0 body (everything after the page octet)
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut reader = ParamReader::new(body);
        let company_id = reader.u16_le()?;
        let product_id = reader.u16_le()?;
        let version_id = reader.u16_le()?;
        let crpl = reader.u16_le()?;
        let features = Features::from_bits(reader.u16_le()?);

        let mut elements = Vec::new();
        while reader.remaining() > 0 {
            let location = reader.u16_le()?;
            let sig_count = usize::from(reader.u8()?);
            let vendor_count = usize::from(reader.u8()?);
            let mut models = Vec::with_capacity(sig_count + vendor_count);
            for _ in 0..sig_count {
                models.push(ModelId::Sig(reader.u16_le()?));
            }
            for _ in 0..vendor_count {
                models.push(ModelId::decode(reader.take(4)?)?);
            }
            elements.push(ElementComposition { location, models });
        }

        Ok(Self {
            company_id,
            product_id,
            version_id,
            crpl,
            features,
            elements,
        })
    }

    /// Encode page 0 body, inverse of [`CompositionData::decode`]
    ///
    /// Fails with [`Error::TooManyModels`] when an element has more than 255
    /// SIG or vendor models.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(10 + self.elements.len() * 8);
        for field in [
            self.company_id,
            self.product_id,
            self.version_id,
            self.crpl,
            self.features.bits(),
        ] {
            out.extend_from_slice(&field.to_le_bytes());
        }
        for element in &self.elements {
            out.extend_from_slice(&element.location.to_le_bytes());
            let (sig, vendor): (Vec<&ModelId>, Vec<&ModelId>) = element
                .models
                .iter()
                .partition(|model| matches!(model, ModelId::Sig(_)));
            for count in [sig.len(), vendor.len()] {
                out.push(u8::try_from(count).map_err(|_| Error::TooManyModels { count })?);
            }
            for model in sig.into_iter().chain(vendor) {
                model.encode(&mut out);
            }
        }
        Ok(out)
    }
}

/// Config Composition Data Get
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompositionDataGet {
    /// Requested page
    pub page: u8,
}

impl CompositionDataGet {
    /// Build the access message
    #[must_use]
    pub fn access_message(&self) -> AccessMessage {
        AccessMessage::new(Opcode::CONFIG_COMPOSITION_DATA_GET, vec![self.page])
    }
}

/// Config Composition Data Status
///
/// Only page 0 has a layout this crate understands. Other pages keep their
/// body as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionDataStatus {
    /// Page number
    pub page: u8,
    /// Page body after the page octet
    pub body: Vec<u8>,
    /// Decoded contents, present for page 0 only
    pub data: Option<CompositionData>,
}

impl CompositionDataStatus {
    /// Decode status parameters
    pub fn decode(params: &[u8]) -> Result<Self> {
        let mut reader = ParamReader::new(params);
        let page = reader.u8()?;
        let body = reader.rest();
        let data = match page {
            0 => Some(CompositionData::decode(body)?),
            _ => None,
        };
        Ok(Self {
            page,
            body: body.to_vec(),
            data,
        })
    }

    /// Element count reported by a page 0 status
    #[must_use]
    pub fn element_count(&self) -> Option<usize> {
        self.data.as_ref().map(|data| data.elements.len())
    }
}

/// Config AppKey Add
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppKeyAdd {
    /// Network key the app key is bound to
    pub net_key_index: KeyIndex,
    /// Index to store the app key under
    pub app_key_index: KeyIndex,
    /// Key material
    pub app_key: AppKey,
}

impl AppKeyAdd {
    /// Build the access message
    #[must_use]
    pub fn access_message(&self) -> AccessMessage {
        let mut params = Vec::with_capacity(3 + AppKey::LEN);
        params.extend_from_slice(&pack_key_indexes(self.net_key_index, self.app_key_index));
        params.extend_from_slice(self.app_key.as_bytes());
        AccessMessage::new(Opcode::CONFIG_APPKEY_ADD, params)
    }
}

/// Config AppKey Status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppKeyStatus {
    /// Outcome
    pub status: StatusCode,
    /// Network key index
    pub net_key_index: KeyIndex,
    /// App key index
    pub app_key_index: KeyIndex,
}

impl AppKeyStatus {
    /// Decode status parameters
    pub fn decode(params: &[u8]) -> Result<Self> {
        let mut reader = ParamReader::new(params);
        let status = status_code(&mut reader)?;
        let (net_key_index, app_key_index) = unpack_key_indexes(reader.array::<3>()?);
        Ok(Self {
            status,
            net_key_index,
            app_key_index,
        })
    }
}

/// Whether a model app request binds or unbinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// Config Model App Bind
    Bind,
    /// Config Model App Unbind
    Unbind,
}

/// Config Model App Bind / Unbind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelAppBinding {
    /// Bind or unbind
    pub kind: BindingKind,
    /// Element hosting the model
    pub element_address: UnicastAddress,
    /// App key to (un)bind
    pub app_key_index: KeyIndex,
    /// Target model
    pub model_id: ModelId,
}

impl ModelAppBinding {
    /// Build the access message
    #[must_use]
    pub fn access_message(&self) -> AccessMessage {
        let opcode = match self.kind {
            BindingKind::Bind => Opcode::CONFIG_MODEL_APP_BIND,
            BindingKind::Unbind => Opcode::CONFIG_MODEL_APP_UNBIND,
        };
        let mut params = Vec::with_capacity(4 + self.model_id.encoded_len());
        params.extend_from_slice(&self.element_address.to_le_bytes());
        params.extend_from_slice(&self.app_key_index.value().to_le_bytes());
        self.model_id.encode(&mut params);
        AccessMessage::new(opcode, params)
    }
}

/// Config Model App Status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelAppStatus {
    /// Outcome
    pub status: StatusCode,
    /// Element hosting the model
    pub element_address: UnicastAddress,
    /// App key index
    pub app_key_index: KeyIndex,
    /// Target model
    pub model_id: ModelId,
}

impl ModelAppStatus {
    /// Decode status parameters
    pub fn decode(params: &[u8]) -> Result<Self> {
        let mut reader = ParamReader::new(params);
        let status = status_code(&mut reader)?;
        let element_address = element_address(&mut reader)?;
        let app_key_index = KeyIndex::from_bits(reader.u16_le()?);
        let model_id = ModelId::decode(reader.rest())?;
        Ok(Self {
            status,
            element_address,
            app_key_index,
            model_id,
        })
    }
}

/// Publish retransmit count and interval
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishRetransmit {
    count: u8,
    interval_steps: u8,
}

impl PublishRetransmit {
    /// Create from a 3-bit count and 5-bit interval in 50 ms steps
    pub const fn new(count: u8, interval_steps: u8) -> Result<Self> {
        if count > 0x07 || interval_steps > 0x1F {
            return Err(Error::InvalidPublishRetransmit {
                count,
                steps: interval_steps,
            });
        }
        Ok(Self {
            count,
            interval_steps,
        })
    }

    /// Retransmissions per publication
    #[must_use]
    pub const fn count(self) -> u8 {
        self.count
    }

    /// 50 ms steps between retransmissions, minus one
    #[must_use]
    pub const fn interval_steps(self) -> u8 {
        self.interval_steps
    }

    const fn to_octet(self) -> u8 {
        self.count | (self.interval_steps << 3)
    }

    const fn from_octet(octet: u8) -> Self {
        Self {
            count: octet & 0x07,
            interval_steps: octet >> 3,
        }
    }
}

/// Publication parameters of a Config Model Publication Set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicationParams {
    /// Element hosting the model
    pub element_address: UnicastAddress,
    /// Address to publish to
    pub publish_address: Address,
    /// App key used for publications
    pub app_key_index: KeyIndex,
    /// Use friendship credentials
    pub credential_flag: bool,
    /// Publish TTL
    pub publish_ttl: u8,
    /// Encoded publish period
    pub publish_period: u8,
    /// Retransmission settings
    pub retransmit: PublishRetransmit,
    /// Target model
    pub model_id: ModelId,
}

impl PublicationParams {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.element_address.to_le_bytes());
        out.extend_from_slice(&self.publish_address.0.to_le_bytes());
        let key_and_flag = self.app_key_index.value() | (u16::from(self.credential_flag) << 12);
        out.extend_from_slice(&key_and_flag.to_le_bytes());
        out.push(self.publish_ttl);
        out.push(self.publish_period);
        out.push(self.retransmit.to_octet());
        self.model_id.encode(out);
    }

    fn decode(reader: &mut ParamReader<'_>) -> Result<Self> {
        let element_address = element_address(reader)?;
        let publish_address = Address(reader.u16_le()?);
        let key_and_flag = reader.u16_le()?;
        let publish_ttl = reader.u8()?;
        let publish_period = reader.u8()?;
        let retransmit = PublishRetransmit::from_octet(reader.u8()?);
        let model_id = ModelId::decode(reader.rest())?;
        Ok(Self {
            element_address,
            publish_address,
            app_key_index: KeyIndex::from_bits(key_and_flag),
            credential_flag: key_and_flag & (1 << 12) != 0,
            publish_ttl,
            publish_period,
            retransmit,
            model_id,
        })
    }

    /// Build the access message
    #[must_use]
    pub fn access_message(&self) -> AccessMessage {
        let mut params = Vec::with_capacity(9 + self.model_id.encoded_len());
        self.encode(&mut params);
        AccessMessage::new(Opcode::CONFIG_MODEL_PUBLICATION_SET, params)
    }
}

/// Config Model Publication Status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelPublicationStatus {
    /// Outcome
    pub status: StatusCode,
    /// Publication parameters echoed by the node
    pub publication: PublicationParams,
}

impl ModelPublicationStatus {
    /// Decode status parameters
    pub fn decode(params: &[u8]) -> Result<Self> {
        let mut reader = ParamReader::new(params);
        let status = status_code(&mut reader)?;
        let publication = PublicationParams::decode(&mut reader)?;
        Ok(Self {
            status,
            publication,
        })
    }
}

/// Subscription list operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionAction {
    /// Config Model Subscription Add
    Add,
    /// Config Model Subscription Delete
    Delete,
}

impl SubscriptionAction {
    /// Request opcode for this action
    #[must_use]
    pub const fn opcode(self) -> Opcode {
        match self {
            Self::Add => Opcode::CONFIG_MODEL_SUBSCRIPTION_ADD,
            Self::Delete => Opcode::CONFIG_MODEL_SUBSCRIPTION_DELETE,
        }
    }
}

/// Config Model Subscription Add / Delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSubscription {
    /// Add or delete
    pub action: SubscriptionAction,
    /// Element hosting the model
    pub element_address: UnicastAddress,
    /// Group or virtual address
    pub address: Address,
    /// Target model
    pub model_id: ModelId,
}

impl ModelSubscription {
    /// Build the access message
    #[must_use]
    pub fn access_message(&self) -> AccessMessage {
        let mut params = Vec::with_capacity(4 + self.model_id.encoded_len());
        params.extend_from_slice(&self.element_address.to_le_bytes());
        params.extend_from_slice(&self.address.0.to_le_bytes());
        self.model_id.encode(&mut params);
        AccessMessage::new(self.action.opcode(), params)
    }
}

/// Config Model Subscription Status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSubscriptionStatus {
    /// Outcome
    pub status: StatusCode,
    /// Element hosting the model
    pub element_address: UnicastAddress,
    /// Subscription address
    pub address: Address,
    /// Target model
    pub model_id: ModelId,
}

impl ModelSubscriptionStatus {
    /// Decode status parameters
    pub fn decode(params: &[u8]) -> Result<Self> {
        let mut reader = ParamReader::new(params);
        let status = status_code(&mut reader)?;
        let element_address = element_address(&mut reader)?;
        let address = Address(reader.u16_le()?);
        let model_id = ModelId::decode(reader.rest())?;
        Ok(Self {
            status,
            element_address,
            address,
            model_id,
        })
    }
}

/// Config Node Reset
#[must_use]
pub fn node_reset() -> AccessMessage {
    AccessMessage::empty(Opcode::CONFIG_NODE_RESET)
}
