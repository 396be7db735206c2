//! Hosted Linux bindings: the bus is a `/dev/i2c-N` character device and the reset and backlight
//! lines are sysfs GPIOs.
use linux_embedded_hal::{sysfs_gpio, Delay, I2cdev, SysfsPin};

use crate::{
    pin::{ControlPin, PinLevel},
    DisplayConfig, DisplayError, St7032iDisplay,
};

/// Display driven through Linux userspace interfaces.
pub type LinuxDisplay = St7032iDisplay<I2cdev, SysfsPin, Delay>;

impl ControlPin for SysfsPin {
    type Error = sysfs_gpio::Error;

    fn export(&mut self) -> Result<(), Self::Error> {
        self.0.export()
    }

    fn set_direction_output(&mut self) -> Result<(), Self::Error> {
        self.0.set_direction(sysfs_gpio::Direction::Out)
    }

    fn set_level(&mut self, level: PinLevel) -> Result<(), Self::Error> {
        match level {
            PinLevel::Low => self.0.set_value(0),
            PinLevel::High => self.0.set_value(1),
        }
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        self.0.unexport()
    }
}

impl LinuxDisplay {
    /// Opens the bus device at `bus_path`, claims the two sysfs GPIO lines by number and starts a
    /// display session on them.
    pub fn open_linux(
        bus_path: &str,
        reset_gpio: u64,
        backlight_gpio: u64,
        config: DisplayConfig,
    ) -> Result<Self, DisplayError<I2cdev, SysfsPin>> {
        let i2c = match I2cdev::new(bus_path) {
            Ok(i2c) => i2c,
            Err(_e) => {
                #[cfg(feature = "log")]
                log::warn!("cannot open i2c bus {}: {}", bus_path, _e);
                return Err(DisplayError::BusOpen);
            }
        };
        let mut display = St7032iDisplay::new_with_config(
            i2c,
            SysfsPin::new(reset_gpio),
            SysfsPin::new(backlight_gpio),
            Delay,
            config,
        );
        display.open()?;
        Ok(display)
    }
}
