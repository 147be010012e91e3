//! AT command transaction descriptors and the fixed command set used
//! during bring-up.
//!
//! Commands follow the u-blox SARA-R4 AT manual: an optional `AT` attention
//! token, the command text, `\r\n`. Structured replies come back as
//! `+NAME: payload` lines and every transaction ends in `OK` or `ERROR`.

use embassy_time::Duration;

/// Attention token prepended to a command line unless [`Command::raw`].
pub(crate) const ATTENTION: &[u8] = b"AT";

/// Marker byte introducing a structured data reply.
pub(crate) const DATA_PREFIX: u8 = b'+';

/// Longest command-name echo the executor verifies, `+` included.
pub(crate) const COMMAND_NAME_MAX: usize = 10;

/// Default retry budget for one transaction.
pub(crate) const DEFAULT_TRIES: u8 = 5;

/// Echo off. Harmless and idempotent, so it doubles as the liveness probe.
pub(crate) const PROBE: &str = "E0";

/// Silent reset with SIM reset.
pub(crate) const RESET: &str = "+CFUN=15";

/// Radio off, required while the MNO profile changes.
pub(crate) const RADIO_OFF: &str = "+CFUN=0";

/// Automatic operator selection.
pub(crate) const AUTO_REGISTRATION: &str = "+COPS=0";

/// Active MNO profile query.
pub(crate) const MNO_QUERY: &str = "+UMNOPROF?";

/// Network registration status query.
pub(crate) const REGISTRATION_QUERY: &str = "+CREG?";

/// Baseline configuration, issued in order during bring-up.
pub(crate) const SETUP_SEQUENCE: &[&str] = &[
    // GPIO1 as network status indication
    "+UGPIOC=16,2",
    // GPIO2 as GNSS supply enable
    "+UGPIOC=23,3",
    // GPIO3 as module status indication
    "+UGPIOC=24,10",
    // SMS message format: text
    "+CMGF=1",
    // automatic timezone update
    "+CTZU=1",
];

/// One AT transaction: the command text plus how to run it.
///
/// The response deadline falls back to the driver's configured default when
/// not overridden here. Retries cover a single failure mode, the modem not
/// echoing anything back at all; everything else fails the call outright.
#[derive(Debug, Clone)]
pub struct Command<'a> {
    pub(crate) text: &'a str,
    pub(crate) at: bool,
    pub(crate) timeout: Option<Duration>,
    pub(crate) tries: u8,
}

impl<'a> Command<'a> {
    pub const fn new(text: &'a str) -> Self {
        Self {
            text,
            at: true,
            timeout: None,
            tries: DEFAULT_TRIES,
        }
    }

    /// Send the line without the `AT` attention token.
    pub const fn raw(mut self) -> Self {
        self.at = false;
        self
    }

    /// Override the per-attempt response deadline.
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the retry budget.
    pub const fn tries(mut self, tries: u8) -> Self {
        self.tries = tries;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let cmd = Command::new("+CREG?");
        assert_eq!(cmd.text, "+CREG?");
        assert!(cmd.at);
        assert_eq!(cmd.timeout, None);
        assert_eq!(cmd.tries, DEFAULT_TRIES);
    }

    #[test]
    fn builder_overrides() {
        let cmd = Command::new("+CFUN=15")
            .raw()
            .timeout(Duration::from_secs(10))
            .tries(1);
        assert!(!cmd.at);
        assert_eq!(cmd.timeout, Some(Duration::from_secs(10)));
        assert_eq!(cmd.tries, 1);
    }
}
