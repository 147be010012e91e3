use std::collections::VecDeque;

use embassy_time::Duration;

use crate::client::LteClient;
use crate::config::{Config, NetworkConfig, NoPin};

/// Serial double that releases one scripted modem reply per command flush.
///
/// Replies are whole transcripts, echo line included, exactly as the modem
/// would put them on the wire. Everything the driver writes is recorded for
/// asserting command order.
#[derive(Debug, Default)]
pub struct MockSerial {
    rx: VecDeque<u8>,
    replies: VecDeque<Vec<u8>>,
    pub tx: Vec<u8>,
    pub flushes: usize,
}

impl MockSerial {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the modem's reply to the next command.
    pub fn reply(mut self, reply: &[u8]) -> Self {
        self.replies.push_back(reply.to_vec());
        self
    }

    /// Lines written by the driver so far.
    pub fn sent_lines(&self) -> Vec<String> {
        String::from_utf8(self.tx.clone())
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect()
    }
}

impl embedded_io::ErrorType for MockSerial {
    type Error = core::convert::Infallible;
}

impl embedded_io::Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.rx.pop_front() {
            Some(byte) => {
                buf[0] = byte;
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

impl embedded_io::ReadReady for MockSerial {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.rx.is_empty())
    }
}

impl embedded_io::Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.tx.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.flushes += 1;
        if let Some(reply) = self.replies.pop_front() {
            self.rx.extend(reply);
        }
        Ok(())
    }
}

/// Driver over a scripted serial with deadlines short enough for tests.
pub fn test_client(serial: MockSerial) -> LteClient<'static, MockSerial, NoPin, NoPin> {
    test_client_with(serial, NetworkConfig::VERIZON)
}

pub fn test_client_with(
    serial: MockSerial,
    network: NetworkConfig<'static>,
) -> LteClient<'static, MockSerial, NoPin, NoPin> {
    let config = Config::new(network)
        .attempt_timeout(Duration::from_millis(20))
        .registration_timeout(Duration::from_millis(500))
        .registration_poll_interval(Duration::from_millis(10));
    LteClient::new(serial, config)
}
