//! Generic OnOff model messages

use std::time::Duration;

use super::access::ParamReader;
use super::{AccessMessage, Error, Opcode, Result};

/// Step resolution of a transition time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StepResolution {
    /// 100 milliseconds
    Millis100 = 0b00,
    /// 1 second
    Seconds1 = 0b01,
    /// 10 seconds
    Seconds10 = 0b10,
    /// 10 minutes
    Minutes10 = 0b11,
}

impl StepResolution {
    const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::Millis100,
            0b01 => Self::Seconds1,
            0b10 => Self::Seconds10,
            _ => Self::Minutes10,
        }
    }

    const fn step(self) -> Duration {
        match self {
            Self::Millis100 => Duration::from_millis(100),
            Self::Seconds1 => Duration::from_secs(1),
            Self::Seconds10 => Duration::from_secs(10),
            Self::Minutes10 => Duration::from_secs(600),
        }
    }
}

/// Generic Default Transition Time encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionTime {
    steps: u8,
    resolution: StepResolution,
}

impl TransitionTime {
    /// Steps value meaning "unknown"
    pub const UNKNOWN_STEPS: u8 = 0x3F;

    /// Create a transition time of `steps` (0..=62) at `resolution`
    pub const fn new(steps: u8, resolution: StepResolution) -> Result<Self> {
        if steps >= Self::UNKNOWN_STEPS {
            return Err(Error::InvalidTransitionTime { steps });
        }
        Ok(Self { steps, resolution })
    }

    /// Decode the packed octet
    #[must_use]
    pub const fn from_octet(octet: u8) -> Self {
        Self {
            steps: octet & 0x3F,
            resolution: StepResolution::from_bits(octet >> 6),
        }
    }

    /// Packed octet
    #[must_use]
    pub const fn to_octet(self) -> u8 {
        self.steps | ((self.resolution as u8) << 6)
    }

    /// Number of steps
    #[must_use]
    pub const fn steps(self) -> u8 {
        self.steps
    }

    /// Step resolution
    #[must_use]
    pub const fn resolution(self) -> StepResolution {
        self.resolution
    }

    /// Duration, `None` when the node reports it as unknown
    #[must_use]
    pub fn duration(self) -> Option<Duration> {
        if self.steps == Self::UNKNOWN_STEPS {
            return None;
        }
        Some(self.resolution.step() * u32::from(self.steps))
    }
}

/// Parameters of a Generic OnOff Set (acknowledged or not)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnOffSet {
    /// Target state
    pub state: bool,
    /// Transition to apply, if any
    pub transition: Option<TransitionTime>,
    /// Execution delay in 5 ms steps; only sent with a transition
    pub delay: Option<u8>,
}

impl OnOffSet {
    /// Immediate set without transition
    #[must_use]
    pub const fn immediate(state: bool) -> Self {
        Self {
            state,
            transition: None,
            delay: None,
        }
    }

    /// Build the access message for either set flavour
    #[must_use]
    pub fn access_message(&self, tid: u8, acknowledged: bool) -> AccessMessage {
        let opcode = if acknowledged {
            Opcode::GENERIC_ON_OFF_SET
        } else {
            Opcode::GENERIC_ON_OFF_SET_UNACKNOWLEDGED
        };
        let mut params = vec![u8::from(self.state), tid];
        if let Some(transition) = self.transition {
            params.push(transition.to_octet());
            params.push(self.delay.unwrap_or(0));
        }
        AccessMessage::new(opcode, params)
    }
}

/// Generic OnOff Get
#[must_use]
pub fn on_off_get() -> AccessMessage {
    AccessMessage::empty(Opcode::GENERIC_ON_OFF_GET)
}

/// Generic OnOff Status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenericOnOffStatus {
    /// Present state
    pub present: bool,
    /// Target state while a transition runs
    pub target: Option<bool>,
    /// Time left in the running transition
    pub remaining_time: Option<TransitionTime>,
}

impl GenericOnOffStatus {
    /// Decode status parameters
    pub fn decode(params: &[u8]) -> Result<Self> {
        let mut reader = ParamReader::new(params);
        let present = reader.u8()? != 0;
        if reader.remaining() == 0 {
            return Ok(Self {
                present,
                target: None,
                remaining_time: None,
            });
        }
        let target = reader.u8()? != 0;
        let remaining_time = TransitionTime::from_octet(reader.u8()?);
        Ok(Self {
            present,
            target: Some(target),
            remaining_time: Some(remaining_time),
        })
    }
}
