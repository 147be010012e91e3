use embassy_time::{block_for, Duration, Instant};
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_io::{Read, ReadReady, Write};

use crate::client::LteClient;
use crate::error::Error;
use crate::module_timing::power_pulse_time;

impl<'a, S, PWR, VINT> LteClient<'a, S, PWR, VINT>
where
    S: Read + Write + ReadReady,
    PWR: OutputPin,
    VINT: InputPin,
{
    /// Whether the module signals power on its `V_INT` indicator pin.
    ///
    /// Without an indicator pin the module is assumed powered and the AT
    /// probe decides.
    pub fn has_power(&mut self) -> Result<bool, Error> {
        if let Some(pin) = self.config.vint_pin.as_mut() {
            pin.is_high().map_err(|_| Error::IoPin)
        } else {
            info!("No VInt pin configured");
            Ok(true)
        }
    }

    /// Pulse `PWR_ON` low to toggle the module's power state.
    ///
    /// The line idles high; on real hardware the module's internal pull-up
    /// holds it there once released.
    pub(crate) fn power_toggle(&mut self) -> Result<(), Error> {
        if let Some(pin) = self.config.pwr_pin.as_mut() {
            debug!("Toggling module power");
            pin.set_low().map_err(|_| Error::IoPin)?;
            block_for(power_pulse_time());
            pin.set_high().map_err(|_| Error::IoPin)?;
        } else {
            warn!("No power pin configured");
        }
        Ok(())
    }

    /// Poll the power indicator until it reports on or `timeout` elapses.
    pub(crate) fn wait_power_indicator(&mut self, timeout: Duration) -> Result<bool, Error> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            if self.has_power()? {
                return Ok(true);
            }
            block_for(Duration::from_millis(5));
        }
        Ok(false)
    }
}
