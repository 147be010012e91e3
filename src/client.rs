use embassy_time::{block_for, Duration, Instant};
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_io::{Read, ReadReady, Write};

use crate::command::{
    Command, ATTENTION, COMMAND_NAME_MAX, DATA_PREFIX, DEFAULT_TRIES, PROBE, RESET, SETUP_SEQUENCE,
};
use crate::config::Config;
use crate::error::Error;
use crate::module_timing::{
    command_settle_time, config_command_delay, power_on_timeout, power_retry_delay, reset_timeout,
};

/// Token classes recognized while scanning a response stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum ResponseKind {
    /// `+` data marker; the stream is left positioned just past it.
    Data,
    /// Final `OK` line, consumed through its newline.
    Ok,
    /// Final `ERROR` line.
    Error,
    /// The reader's deadline elapsed mid-scan.
    Timeout,
    /// A token outside the response grammar.
    Unknown,
}

impl ResponseKind {
    /// The error raised when this kind shows up where another was required.
    fn unexpected(self) -> Error {
        match self {
            Self::Ok => Error::UnexpectedOk,
            Self::Data | Self::Unknown => Error::UnexpectedData,
            Self::Error => Error::DeviceError,
            Self::Timeout => Error::Timeout,
        }
    }
}

/// Bring-up progress. [`LteClient::init`] performs one transition per loop
/// turn; `Registered` is the only successful exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum InitState {
    Unpowered,
    AwaitingPowerIndicator,
    Configuring,
    NetworkUnverified,
    NetworkConfiguring,
    Registered,
}

/// Driver for an LTE shield spoken to over a blocking serial link.
///
/// Owns its transport and control pins exclusively. All calls are
/// synchronous and bounded by per-call deadlines; only one transaction can
/// be in flight, which `&mut self` enforces. Wrap the driver in a mutex if
/// several logical threads need it.
pub struct LteClient<'a, S, PWR, VINT> {
    pub(crate) serial: S,
    pub(crate) config: Config<'a, PWR, VINT>,
}

impl<'a, S, PWR, VINT> LteClient<'a, S, PWR, VINT>
where
    S: Read + Write + ReadReady,
    PWR: OutputPin,
    VINT: InputPin,
{
    pub fn new(serial: S, config: Config<'a, PWR, VINT>) -> Self {
        Self { serial, config }
    }

    /// Release the serial handle and configuration (pins included).
    pub fn free(self) -> (S, Config<'a, PWR, VINT>) {
        (self.serial, self.config)
    }

    /// Bring the modem from an unknown power state to registered on a
    /// network.
    ///
    /// Powers the module if the indicator says it is off, applies the
    /// baseline configuration, verifies (and at most once reprograms) the
    /// carrier profile, then waits for network registration. The specific
    /// terminal error is surfaced so callers can tell a missing module from
    /// a wrong SIM from missing coverage.
    pub fn init(&mut self) -> Result<(), Error> {
        info!("Initializing LTE shield");
        let mut state = InitState::Unpowered;
        let mut reconfigured = false;
        loop {
            trace!("Bring-up state: {:?}", state);
            state = match state {
                InitState::Unpowered => {
                    if self.has_power()? {
                        InitState::Configuring
                    } else {
                        self.power_toggle()?;
                        InitState::AwaitingPowerIndicator
                    }
                }
                InitState::AwaitingPowerIndicator => {
                    if !self.wait_power_indicator(power_on_timeout())? {
                        warn!("Shield did not indicate power on, probing anyway");
                    }
                    InitState::Configuring
                }
                InitState::Configuring => {
                    self.configure()?;
                    InitState::NetworkUnverified
                }
                InitState::NetworkUnverified => match self.verify_network() {
                    Ok(()) => {
                        self.wait_registration(self.config.registration_timeout)?;
                        InitState::Registered
                    }
                    Err(Error::BadNetworkConfig) if !reconfigured => InitState::NetworkConfiguring,
                    Err(e) => return Err(e),
                },
                InitState::NetworkConfiguring => {
                    reconfigured = true;
                    self.configure_network()?;
                    InitState::NetworkUnverified
                }
                InitState::Registered => {
                    info!("LTE shield registered on network");
                    return Ok(());
                }
            };
        }
    }

    /// Check that the modem is responding at the AT interface, poking it
    /// with the echo-off probe up to `attempts` times.
    pub fn is_alive(&mut self, attempts: u8) -> Result<(), Error> {
        self.send(&Command::new(PROBE).tries(attempts))
    }

    /// Soft-reset the modem and make sure it answers again.
    ///
    /// The reset transaction gets a much longer deadline than a normal
    /// command; the module may take several seconds to come back. The
    /// follow-up probe also turns the rebooted module's echo back off.
    pub fn reset(&mut self) -> Result<(), Error> {
        self.send(&Command::new(RESET).timeout(reset_timeout()))?;
        self.is_alive(DEFAULT_TRIES)
    }

    /// Find the modem and apply the baseline one-shot configuration.
    ///
    /// Probes the AT interface, toggling power between probe rounds while a
    /// power pin is available, then runs the setup sequence and finishes
    /// with a reset.
    fn configure(&mut self) -> Result<(), Error> {
        let mut rounds = 0;
        while self.is_alive(DEFAULT_TRIES).is_err() {
            rounds += 1;
            if rounds >= 4 || self.config.pwr_pin.is_none() {
                error!("Could not find LTE shield");
                return Err(Error::DeviceNotFound);
            }
            self.power_toggle()?;
            block_for(power_retry_delay());
        }
        for command in SETUP_SEQUENCE {
            self.send(&Command::new(command))?;
            block_for(config_command_delay());
        }
        self.reset()
    }

    /// Execute a command whose only reply is the final `OK`.
    pub fn send(&mut self, cmd: &Command<'_>) -> Result<(), Error> {
        self.transaction(cmd, None).map(|_| ())
    }

    /// Execute a query and copy its `+NAME: payload` reply into `response`.
    ///
    /// Returns the payload length. A reply longer than `response` is
    /// clipped to the buffer, which is not an error.
    pub fn query(&mut self, cmd: &Command<'_>, response: &mut [u8]) -> Result<usize, Error> {
        self.transaction(cmd, Some(response))
    }

    /// One command/response transaction, retried while the modem stays
    /// silent.
    ///
    /// Per attempt: write the line, skip the local echo, parse the data
    /// reply when requested, then require the `OK` terminator. A missing
    /// echo means the module never heard us and consumes one retry; any
    /// response that arrives but violates the protocol fails immediately.
    fn transaction(
        &mut self,
        cmd: &Command<'_>,
        mut response: Option<&mut [u8]>,
    ) -> Result<usize, Error> {
        let timeout = cmd.timeout.unwrap_or(self.config.attempt_timeout);
        'attempts: for attempt in 0..cmd.tries.max(1) {
            trace!("try {}: {}", attempt, cmd.text);

            if cmd.at {
                self.serial.write_all(ATTENTION).map_err(|_| Error::Io)?;
            }
            self.serial
                .write_all(cmd.text.as_bytes())
                .map_err(|_| Error::Io)?;
            self.serial.write_all(b"\r\n").map_err(|_| Error::Io)?;
            self.serial.flush().map_err(|_| Error::Io)?;

            block_for(command_settle_time());
            let start = Instant::now();

            // The first line back is the local echo. Nothing at all here
            // means the module missed the transmission, the one retryable
            // failure.
            loop {
                match self.read_byte(start, timeout)? {
                    Some(b'\n') => break,
                    Some(_) => {}
                    None => continue 'attempts,
                }
            }

            let mut len = 0;
            if let Some(buf) = response.as_deref_mut() {
                len = self.read_data_reply(cmd, start, timeout, buf)?;
            }

            return match self.read_response(start, timeout)? {
                ResponseKind::Ok => Ok(len),
                other => {
                    error!("Unexpected response at terminator: {:?}", other);
                    Err(other.unexpected())
                }
            };
        }
        Err(Error::Timeout)
    }

    /// Parse a structured `+NAME: payload` reply into `buf`.
    ///
    /// The reply must classify as data and must echo the issued command's
    /// own name (up to the first `=` or `?`); the payload runs to the end
    /// of the line.
    fn read_data_reply(
        &mut self,
        cmd: &Command<'_>,
        start: Instant,
        timeout: Duration,
        buf: &mut [u8],
    ) -> Result<usize, Error> {
        match self.read_response(start, timeout)? {
            ResponseKind::Data => {}
            other => {
                error!("Unexpected response to data query: {:?}", other);
                return Err(other.unexpected());
            }
        }

        // Both sides' `+` markers are already consumed: the command's by
        // `skip(1)`, the reply's by the classifier.
        for expected in cmd.text.bytes().skip(1).take(COMMAND_NAME_MAX - 1) {
            if expected == b'=' || expected == b'?' {
                break;
            }
            let got = self.read_byte(start, timeout)?.ok_or(Error::Timeout)?;
            if got != expected {
                error!("Command/response name mismatch");
                self.drain_diagnostic(got);
                return Err(Error::InvalidResponse);
            }
        }

        // The ": " separating name and payload.
        for _ in 0..2 {
            self.read_byte(start, timeout)?.ok_or(Error::Timeout)?;
        }

        let mut len = 0;
        let mut clipped = false;
        loop {
            let byte = self.read_byte(start, timeout)?.ok_or(Error::Timeout)?;
            if byte == b'\r' || byte == b'\n' {
                break;
            }
            if len < buf.len() {
                buf[len] = byte;
                len += 1;
            } else {
                // Keep consuming so the terminator still classifies cleanly.
                clipped = true;
            }
        }
        if clipped {
            warn!("Response clipped to {} bytes", buf.len());
        }
        Ok(len)
    }

    /// Classify the next response token, skipping whitespace between
    /// tokens.
    fn read_response(&mut self, start: Instant, timeout: Duration) -> Result<ResponseKind, Error> {
        loop {
            let Some(byte) = self.read_byte(start, timeout)? else {
                return Ok(ResponseKind::Timeout);
            };
            match byte {
                b'\r' | b'\n' | b' ' => {}
                DATA_PREFIX => return Ok(ResponseKind::Data),
                b'O' => loop {
                    match self.read_byte(start, timeout)? {
                        Some(b'\n') => return Ok(ResponseKind::Ok),
                        Some(_) => {}
                        None => return Ok(ResponseKind::Timeout),
                    }
                },
                b'E' => {
                    error!("Modem answered ERROR");
                    self.drain_diagnostic(byte);
                    return Ok(ResponseKind::Error);
                }
                other => {
                    warn!("Unexpected response byte {}", other);
                    self.drain_diagnostic(other);
                    return Ok(ResponseKind::Unknown);
                }
            }
        }
    }

    /// Pull one byte off the wire, bounded by the transaction deadline.
    ///
    /// `None` means the deadline elapsed; all 256 byte values are legal
    /// payload.
    fn read_byte(&mut self, start: Instant, timeout: Duration) -> Result<Option<u8>, Error> {
        let mut byte = [0u8; 1];
        loop {
            let ready = self.serial.read_ready().map_err(|_| Error::Io)?;
            if ready && self.serial.read(&mut byte).map_err(|_| Error::Io)? == 1 {
                trace!("rx {}", byte[0]);
                return Ok(Some(byte[0]));
            }
            if start.elapsed() > timeout {
                return Ok(None);
            }
        }
    }

    /// Flush whatever else the modem already buffered, for the log only.
    fn drain_diagnostic(&mut self, first: u8) {
        debug!("First offending byte: {}", first);
        let mut byte = [0u8; 1];
        while matches!(self.serial.read_ready(), Ok(true)) {
            if !matches!(self.serial.read(&mut byte), Ok(1)) {
                break;
            }
            trace!("discarded {}", byte[0]);
        }
    }
}
