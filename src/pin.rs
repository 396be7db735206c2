//! Control of the discrete GPIO lines wired to the module: the active-low reset line and the
//! backlight enable.
use embedded_hal::{delay::DelayNs, digital::OutputPin};

/// Output level of a control line.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PinLevel {
    Low,
    High,
}

impl From<bool> for PinLevel {
    fn from(value: bool) -> Self {
        if value {
            PinLevel::High
        } else {
            PinLevel::Low
        }
    }
}

/// Capabilities the driver needs from a GPIO line. Pins that are already configured as outputs
/// by the HAL only need to implement `set_level`; hosted platforms where lines must be claimed
/// (for example Linux sysfs) implement `export` and `close` as well.
pub trait ControlPin {
    type Error: core::fmt::Debug;

    /// Claims the line from the operating system.
    fn export(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Configures the line as an output.
    fn set_direction_output(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_level(&mut self, level: PinLevel) -> Result<(), Self::Error>;

    /// Drives the line low for `duration_ms` and then back high.
    fn pulse<D: DelayNs>(&mut self, delay: &mut D, duration_ms: u32) -> Result<(), Self::Error> {
        self.set_level(PinLevel::Low)?;
        delay.delay_ms(duration_ms);
        self.set_level(PinLevel::High)
    }

    /// Releases the line.
    fn close(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Adapts any `embedded-hal` output pin to a [`ControlPin`].
pub struct OutputControlPin<P>
where
    P: OutputPin,
{
    pin: P,
}

impl<P> OutputControlPin<P>
where
    P: OutputPin,
{
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Returns the wrapped pin.
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P> ControlPin for OutputControlPin<P>
where
    P: OutputPin,
{
    type Error = P::Error;

    fn set_level(&mut self, level: PinLevel) -> Result<(), Self::Error> {
        match level {
            PinLevel::Low => self.pin.set_low(),
            PinLevel::High => self.pin.set_high(),
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use embedded_hal_mock::eh1::{
        delay::NoopDelay,
        digital::{Mock as PinMock, State as PinState, Transaction as PinTransaction},
    };

    #[test]
    fn test_pulse_drives_low_then_high() {
        let expectations = [
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ];
        let mut pin = OutputControlPin::new(PinMock::new(&expectations));
        assert!(pin.export().is_ok());
        assert!(pin.set_direction_output().is_ok());
        assert!(pin.pulse(&mut NoopDelay::new(), 1).is_ok());
        assert!(pin.close().is_ok());
        pin.into_inner().done();
    }

    #[test]
    fn test_set_level() {
        let expectations = [
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
        ];
        let mut pin = OutputControlPin::new(PinMock::new(&expectations));
        assert!(pin.set_level(true.into()).is_ok());
        assert!(pin.set_level(PinLevel::Low).is_ok());
        pin.into_inner().done();
    }
}
