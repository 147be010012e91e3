use embassy_time::Duration;

/// Low time of `PWR_ON` to toggle the module's power state
pub fn power_pulse_time() -> Duration {
    Duration::from_millis(3200)
}

/// Time to wait for `V_INT` to rise after a power pulse
pub fn power_on_timeout() -> Duration {
    Duration::from_millis(12_000)
}

/// Back-off between power-toggle retries while probing for the module
pub fn power_retry_delay() -> Duration {
    Duration::from_millis(12_000)
}

/// Response deadline for the `AT+CFUN=15` reset transaction
///
/// The datasheet allows the module several seconds to reboot, far beyond
/// the default per-command deadline.
pub fn reset_timeout() -> Duration {
    Duration::from_millis(10_000)
}

/// Pause between writing a command line and reading back the response,
/// as recommended by the datasheet
pub fn command_settle_time() -> Duration {
    Duration::from_millis(20)
}

/// Pause between consecutive baseline configuration commands
pub fn config_command_delay() -> Duration {
    Duration::from_millis(100)
}

/// Interval between `+CREG?` registration polls
pub fn registration_poll_interval() -> Duration {
    Duration::from_millis(500)
}

/// Overall deadline for network registration
pub fn registration_timeout() -> Duration {
    Duration::from_secs(30)
}
