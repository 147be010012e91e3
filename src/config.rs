use core::convert::Infallible;

use embassy_time::Duration;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::module_timing;

/// Placeholder for an unconnected control pin.
///
/// Reads as "power present" so a driver without a `V_INT` connection skips
/// straight to probing the AT interface.
pub struct NoPin;

impl ErrorType for NoPin {
    type Error = Infallible;
}

impl InputPin for NoPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Mobile network operator profile (`+UMNOPROF`).
///
/// Discriminants are the wire values the modem stores and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MnoProfile {
    /// Readback failed, or the modem reports no profile.
    Error = 0,
    /// SIM-based automatic selection. Does not work with roaming SIMs.
    Auto = 1,
    Att = 2,
    Verizon = 3,
    Telstra = 4,
    TMobile = 5,
    ChinaTelecom = 6,
    Sprint = 8,
    Vodafone = 19,
    Telus = 21,
    DeutscheTelekom = 31,
    StandardEurope = 100,
}

impl From<u8> for MnoProfile {
    fn from(v: u8) -> Self {
        match v {
            1 => Self::Auto,
            2 => Self::Att,
            3 => Self::Verizon,
            4 => Self::Telstra,
            5 => Self::TMobile,
            6 => Self::ChinaTelecom,
            8 => Self::Sprint,
            19 => Self::Vodafone,
            21 => Self::Telus,
            31 => Self::DeutscheTelekom,
            100 => Self::StandardEurope,
            _ => Self::Error,
        }
    }
}

/// Packet data protocol type for the PDP context (`+CGDCONT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PdpType {
    Ipv4,
    NonIp,
    Ipv4v6,
    Ipv6,
    /// No PDP context is configured during bring-up.
    None,
}

impl PdpType {
    /// The `+CGDCONT` string form, or `None` when no context is wanted.
    pub(crate) fn as_str(self) -> Option<&'static str> {
        match self {
            Self::Ipv4 => Some("IP"),
            Self::NonIp => Some("NONIP"),
            Self::Ipv4v6 => Some("IPV4V6"),
            Self::Ipv6 => Some("IPV6"),
            Self::None => Option::None,
        }
    }
}

/// Carrier configuration, compared against live modem state during bring-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NetworkConfig<'a> {
    pub apn: Option<&'a str>,
    pub mno: MnoProfile,
    pub pdp: PdpType,
}

impl NetworkConfig<'_> {
    pub const VERIZON: Self = Self {
        apn: Some("vzwinternet"),
        mno: MnoProfile::Verizon,
        pdp: PdpType::Ipv4v6,
    };

    pub const HOLOGRAM: Self = Self {
        apn: Some("hologram"),
        mno: MnoProfile::StandardEurope,
        pdp: PdpType::Ipv4,
    };
}

/// Construction-time driver configuration.
///
/// Owned by the driver for its whole lifetime; nothing here changes behind
/// its back.
pub struct Config<'a, PWR, VINT> {
    pub(crate) pwr_pin: Option<PWR>,
    pub(crate) vint_pin: Option<VINT>,
    pub(crate) network: NetworkConfig<'a>,
    pub(crate) attempt_timeout: Duration,
    pub(crate) registration_timeout: Duration,
    pub(crate) registration_poll_interval: Duration,
}

impl<'a, PWR, VINT> Config<'a, PWR, VINT>
where
    PWR: OutputPin,
    VINT: InputPin,
{
    pub fn new(network: NetworkConfig<'a>) -> Self {
        Self {
            pwr_pin: None,
            vint_pin: None,
            network,
            attempt_timeout: Duration::from_millis(5000),
            registration_timeout: module_timing::registration_timeout(),
            registration_poll_interval: module_timing::registration_poll_interval(),
        }
    }

    /// Attach the `PWR_ON` control output.
    pub fn with_pwr(self, pwr_pin: PWR) -> Self {
        Self {
            pwr_pin: Some(pwr_pin),
            ..self
        }
    }

    /// Attach the `V_INT` power indicator input.
    pub fn with_vint(self, vint_pin: VINT) -> Self {
        Self {
            vint_pin: Some(vint_pin),
            ..self
        }
    }

    /// Default per-command response deadline.
    pub fn attempt_timeout(self, attempt_timeout: Duration) -> Self {
        Self {
            attempt_timeout,
            ..self
        }
    }

    /// Overall network registration deadline.
    pub fn registration_timeout(self, registration_timeout: Duration) -> Self {
        Self {
            registration_timeout,
            ..self
        }
    }

    /// Interval between registration status polls.
    pub fn registration_poll_interval(self, registration_poll_interval: Duration) -> Self {
        Self {
            registration_poll_interval,
            ..self
        }
    }
}
