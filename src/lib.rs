#![cfg_attr(not(test), no_std)]

//! # Cellular shield driver
//!
//! Blocking driver for LTE Cat-M1/NB-IoT shields built around the u-blox
//! SARA-R4 module family, spoken to over a byte-oriented serial link with
//! AT commands.
//!
//! The crate covers two things: the AT command transaction engine (one
//! command line out, echo skipped, optional `+NAME: payload` reply parsed,
//! final `OK`/`ERROR` awaited, with bounded retries on a silent modem) and
//! the bring-up sequence that takes the module from an unknown power state
//! to registered on a cellular network.
//!
//! The driver is transport-agnostic: it is generic over any serial handle
//! implementing the blocking [`embedded_io`] traits (`Read` + `Write` +
//! `ReadReady`) and over `embedded-hal` digital pins for the `PWR_ON`
//! control line and the `V_INT` power indicator. Timestamps and delays come
//! from `embassy-time`, so an `embassy-time` driver must be linked in.
//!
//! ## Example
//!
//! ```
//! use cellular_shield::{Config, LteClient, NetworkConfig};
//!
//! let config = Config::new(NetworkConfig::HOLOGRAM)
//!     .with_pwr(pwr_on_pin)
//!     .with_vint(vint_pin);
//!
//! let mut modem = LteClient::new(uart, config);
//! modem.init()?;
//! ```
//!
//! Socket-level data transfer, SMS and unsolicited result code handling are
//! out of scope.

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

mod client;
pub mod command;
pub mod config;
pub mod error;
mod module_timing;
mod network;
mod power;
pub mod registration;

#[cfg(test)]
mod test_helpers;

pub use client::LteClient;
pub use command::Command;
pub use config::{Config, MnoProfile, NetworkConfig, NoPin, PdpType};
pub use error::Error;
pub use registration::RegistrationStatus;
