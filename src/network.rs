use core::fmt::Write as _;

use embassy_time::{block_for, Duration, Instant};
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_io::{Read, ReadReady, Write};
use heapless::String;

use crate::client::LteClient;
use crate::command::{Command, AUTO_REGISTRATION, MNO_QUERY, RADIO_OFF, REGISTRATION_QUERY};
use crate::config::{MnoProfile, NetworkConfig};
use crate::error::Error;
use crate::registration::RegistrationStatus;

impl<'a, S, PWR, VINT> LteClient<'a, S, PWR, VINT>
where
    S: Read + Write + ReadReady,
    PWR: OutputPin,
    VINT: InputPin,
{
    /// Compare the modem's active MNO profile against the configured one.
    ///
    /// A configured `Auto` is satisfied by any concrete profile, since the
    /// modem reports whatever the SIM selected.
    pub(crate) fn verify_network(&mut self) -> Result<(), Error> {
        let active = self.active_profile()?;
        let wanted = self.config.network.mno;
        let matches = match wanted {
            MnoProfile::Auto => active != MnoProfile::Error,
            wanted => active == wanted,
        };
        if matches {
            debug!("MNO profile verified: {:?}", active);
            Ok(())
        } else {
            warn!(
                "MNO profile mismatch: active {:?}, configured {:?}",
                active, wanted
            );
            Err(Error::BadNetworkConfig)
        }
    }

    /// Reprogram the carrier profile and PDP context to match the
    /// configured [`NetworkConfig`].
    ///
    /// The radio is taken down for the profile write and a reset makes the
    /// new profile take effect before registration is re-enabled.
    pub(crate) fn configure_network(&mut self) -> Result<(), Error> {
        let network = self.config.network;
        info!("Configuring network for MNO profile {:?}", network.mno);

        self.send(&Command::new(RADIO_OFF))?;

        let mut line: String<128> = String::new();
        write!(line, "+UMNOPROF={}", network.mno as u8).map_err(|_| Error::BadNetworkConfig)?;
        self.send(&Command::new(&line))?;

        self.reset()?;

        if network.mno == MnoProfile::Auto {
            // Auto selection only works for major-carrier SIMs; make sure
            // the modem actually picked something.
            let active = self.active_profile()?;
            if active == MnoProfile::Error {
                error!("Automatic profile selection failed");
                return Err(Error::AutoProfileSelectFailed);
            }
        }

        if let (Some(apn), Some(pdp)) = (network.apn, network.pdp.as_str()) {
            line.clear();
            write!(line, "+CGDCONT=1,\"{}\",\"{}\"", pdp, apn)
                .map_err(|_| Error::BadNetworkConfig)?;
            self.send(&Command::new(&line))?;
        }

        self.send(&Command::new(AUTO_REGISTRATION))
    }

    /// Poll registration status until home/roaming service or `timeout`.
    pub(crate) fn wait_registration(&mut self, timeout: Duration) -> Result<(), Error> {
        let start = Instant::now();
        loop {
            let status = self.registration_status()?;
            if status.registered() {
                info!("Registered: {:?}", status);
                return Ok(());
            }
            if start.elapsed() > timeout {
                error!("Registration timed out in state {:?}", status);
                return Err(Error::RegistrationFailed);
            }
            debug!("Not yet registered: {:?}", status);
            block_for(self.config.registration_poll_interval);
        }
    }

    /// One `+CREG?` status query.
    pub fn registration_status(&mut self) -> Result<RegistrationStatus, Error> {
        let mut reply = [0u8; 16];
        let len = self.query(&Command::new(REGISTRATION_QUERY), &mut reply)?;
        RegistrationStatus::from_reply(&reply[..len])
    }

    /// Switch the modem to a different carrier configuration at runtime.
    ///
    /// Applies the new profile, verifies it stuck, and waits for
    /// registration on the new network.
    pub fn set_network_config(&mut self, network: NetworkConfig<'a>) -> Result<(), Error> {
        self.config.network = network;
        self.configure_network()?;
        self.verify_network()?;
        self.wait_registration(self.config.registration_timeout)
    }

    /// Ask the modem for its active `+UMNOPROF` carrier profile.
    fn active_profile(&mut self) -> Result<MnoProfile, Error> {
        let mut reply = [0u8; 16];
        let len = self.query(&Command::new(MNO_QUERY), &mut reply)?;
        // An empty or non-numeric reply lands on `Error`, which every
        // comparison treats as a mismatch.
        Ok(MnoProfile::from(
            parse_decimal(&reply[..len]).unwrap_or_default(),
        ))
    }
}

/// Leading decimal integer of a reply payload, if any.
fn parse_decimal(payload: &[u8]) -> Option<u8> {
    let mut value: u16 = 0;
    let mut digits = 0;
    for &byte in payload {
        if !byte.is_ascii_digit() {
            break;
        }
        value = value * 10 + u16::from(byte - b'0');
        if value > u16::from(u8::MAX) {
            return None;
        }
        digits += 1;
    }
    (digits > 0).then_some(value as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PdpType;
    use crate::test_helpers::{test_client, test_client_with, MockSerial};

    #[test]
    fn parse_decimal_payloads() {
        assert_eq!(parse_decimal(b"0"), Some(0));
        assert_eq!(parse_decimal(b"19"), Some(19));
        assert_eq!(parse_decimal(b"100"), Some(100));
        assert_eq!(parse_decimal(b"42,1"), Some(42));
        assert_eq!(parse_decimal(b""), None);
        assert_eq!(parse_decimal(b"x9"), None);
        assert_eq!(parse_decimal(b"300"), None);
    }

    #[test]
    fn verify_accepts_matching_profile() {
        let serial = MockSerial::new().reply(b"AT+UMNOPROF?\r\n+UMNOPROF: 3\r\n\r\nOK\r\n");
        let mut client = test_client(serial);
        assert_eq!(client.verify_network(), Ok(()));
    }

    #[test]
    fn verify_rejects_mismatched_profile() {
        let serial = MockSerial::new().reply(b"AT+UMNOPROF?\r\n+UMNOPROF: 2\r\n\r\nOK\r\n");
        let mut client = test_client(serial);
        assert_eq!(client.verify_network(), Err(Error::BadNetworkConfig));
    }

    #[test]
    fn verify_auto_accepts_any_concrete_profile() {
        let network = NetworkConfig {
            apn: None,
            mno: MnoProfile::Auto,
            pdp: PdpType::None,
        };

        let serial = MockSerial::new().reply(b"AT+UMNOPROF?\r\n+UMNOPROF: 2\r\n\r\nOK\r\n");
        let mut client = test_client_with(serial, network);
        assert_eq!(client.verify_network(), Ok(()));

        let serial = MockSerial::new().reply(b"AT+UMNOPROF?\r\n+UMNOPROF: 0\r\n\r\nOK\r\n");
        let mut client = test_client_with(serial, network);
        assert_eq!(client.verify_network(), Err(Error::BadNetworkConfig));
    }

    #[test]
    fn configure_network_issues_full_sequence() {
        let serial = MockSerial::new()
            .reply(b"AT+CFUN=0\r\nOK\r\n")
            .reply(b"AT+UMNOPROF=3\r\nOK\r\n")
            .reply(b"AT+CFUN=15\r\nOK\r\n")
            .reply(b"ATE0\r\nOK\r\n")
            .reply(b"AT+CGDCONT=1,\"IPV4V6\",\"vzwinternet\"\r\nOK\r\n")
            .reply(b"AT+COPS=0\r\nOK\r\n");
        let mut client = test_client(serial);
        assert_eq!(client.configure_network(), Ok(()));

        let (serial, _) = client.free();
        assert_eq!(
            serial.sent_lines(),
            [
                "AT+CFUN=0",
                "AT+UMNOPROF=3",
                "AT+CFUN=15",
                "ATE0",
                "AT+CGDCONT=1,\"IPV4V6\",\"vzwinternet\"",
                "AT+COPS=0",
            ]
        );
    }

    #[test]
    fn configure_network_without_pdp_skips_context() {
        let network = NetworkConfig {
            apn: Some("hologram"),
            mno: MnoProfile::StandardEurope,
            pdp: PdpType::None,
        };
        let serial = MockSerial::new()
            .reply(b"AT+CFUN=0\r\nOK\r\n")
            .reply(b"AT+UMNOPROF=100\r\nOK\r\n")
            .reply(b"AT+CFUN=15\r\nOK\r\n")
            .reply(b"ATE0\r\nOK\r\n")
            .reply(b"AT+COPS=0\r\nOK\r\n");
        let mut client = test_client_with(serial, network);
        assert_eq!(client.configure_network(), Ok(()));

        let (serial, _) = client.free();
        assert!(!serial
            .sent_lines()
            .iter()
            .any(|line| line.starts_with("AT+CGDCONT")));
    }

    #[test]
    fn auto_profile_that_selects_nothing_is_terminal() {
        let network = NetworkConfig {
            apn: None,
            mno: MnoProfile::Auto,
            pdp: PdpType::None,
        };
        let serial = MockSerial::new()
            .reply(b"AT+CFUN=0\r\nOK\r\n")
            .reply(b"AT+UMNOPROF=1\r\nOK\r\n")
            .reply(b"AT+CFUN=15\r\nOK\r\n")
            .reply(b"ATE0\r\nOK\r\n")
            .reply(b"AT+UMNOPROF?\r\n+UMNOPROF: 0\r\n\r\nOK\r\n");
        let mut client = test_client_with(serial, network);
        assert_eq!(
            client.configure_network(),
            Err(Error::AutoProfileSelectFailed)
        );
    }

    #[test]
    fn registration_succeeds_after_searching() {
        let serial = MockSerial::new()
            .reply(b"AT+CREG?\r\n+CREG: 0,2\r\n\r\nOK\r\n")
            .reply(b"AT+CREG?\r\n+CREG: 0,2\r\n\r\nOK\r\n")
            .reply(b"AT+CREG?\r\n+CREG: 0,1\r\n\r\nOK\r\n");
        let mut client = test_client(serial);
        assert_eq!(client.wait_registration(Duration::from_secs(2)), Ok(()));

        // two poll intervals: three queries total
        let (serial, _) = client.free();
        assert_eq!(serial.flushes, 3);
    }

    #[test]
    fn registration_deadline_fails() {
        let mut serial = MockSerial::new();
        for _ in 0..32 {
            serial = serial.reply(b"AT+CREG?\r\n+CREG: 0,2\r\n\r\nOK\r\n");
        }
        let mut client = test_client(serial);
        assert_eq!(
            client.wait_registration(Duration::from_millis(100)),
            Err(Error::RegistrationFailed)
        );
    }

    #[test]
    fn denied_registration_keeps_polling_until_deadline() {
        let mut serial = MockSerial::new();
        for _ in 0..32 {
            serial = serial.reply(b"AT+CREG?\r\n+CREG: 0,3\r\n\r\nOK\r\n");
        }
        let mut client = test_client(serial);
        assert_eq!(
            client.wait_registration(Duration::from_millis(100)),
            Err(Error::RegistrationFailed)
        );

        let (serial, _) = client.free();
        assert!(serial.flushes > 1);
    }
}
