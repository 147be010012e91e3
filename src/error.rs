/// Everything that can go wrong in a transaction or during bring-up.
///
/// `Timeout` is the only transient failure: the transaction executor retries
/// it while the command's retry budget lasts, and only while the modem has
/// not yet echoed anything back. Every other variant is terminal for the
/// call that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// No (or an incomplete) response before the transaction deadline.
    Timeout,
    /// The reply echoed a different command name than the one issued.
    InvalidResponse,
    /// A data reply or unrecognizable token arrived where none was expected.
    UnexpectedData,
    /// A final `OK` arrived while a data reply was still outstanding.
    UnexpectedOk,
    /// The modem answered `ERROR`.
    DeviceError,
    /// The modem never became reachable during bring-up.
    DeviceNotFound,
    /// The modem's active MNO profile does not match the configured one,
    /// even after reconfiguration.
    BadNetworkConfig,
    /// Automatic profile selection left the modem without a concrete
    /// profile. Usually means the SIM is not from a major carrier.
    AutoProfileSelectFailed,
    /// No home or roaming registration before the registration deadline.
    RegistrationFailed,
    /// A power-control or power-indicator pin operation failed.
    IoPin,
    /// The serial transport failed.
    Io,
}
