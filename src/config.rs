use core::fmt::Display;

/// Default I2C address of the ST7032i.
pub const DEFAULT_I2C_ADDRESS: u8 = 0x3E;

// internal oscillator frequency in Hz for each F2..F0 setting, per supply voltage
const OSC_FREQUENCY_3V3_HZ: [u16; 8] = [122, 131, 144, 161, 183, 221, 274, 347];
const OSC_FREQUENCY_5V_HZ: [u16; 8] = [120, 133, 149, 167, 192, 227, 277, 347];

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// Supply voltage the display module is powered from. Selects the oscillator frequency table and
/// whether the internal voltage booster is enabled.
pub enum SupplyVoltage {
    /// 2.7 V to 3.6 V, booster required
    V3_3,
    /// 4.5 V to 5.5 V, booster off
    V5,
}

impl SupplyVoltage {
    /// Oscillator frequency table, indexed by the F2..F0 field of the bias/oscillator register.
    pub const fn oscillator_frequencies(&self) -> &'static [u16; 8] {
        match self {
            SupplyVoltage::V3_3 => &OSC_FREQUENCY_3V3_HZ,
            SupplyVoltage::V5 => &OSC_FREQUENCY_5V_HZ,
        }
    }

    /// Whether the internal booster has to be on for the LCD drive voltage to be reached.
    pub const fn booster_required(&self) -> bool {
        match self {
            SupplyVoltage::V3_3 => true,
            SupplyVoltage::V5 => false,
        }
    }
}

impl From<&SupplyVoltage> for &'static str {
    fn from(supply: &SupplyVoltage) -> Self {
        match supply {
            SupplyVoltage::V3_3 => "3.3V",
            SupplyVoltage::V5 => "5V",
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SupplyVoltage {
    fn format(&self, fmt: defmt::Formatter) {
        let msg: &'static str = From::from(self);
        defmt::write!(fmt, "{}", msg);
    }
}

impl Display for SupplyVoltage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg: &'static str = From::from(self);
        write!(f, "{}", msg)
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
/// The geometry of the LCD module. ST7032i modules have at most two rows of up to 20 characters.
pub enum LcdDisplayType {
    /// 8x2 display
    Lcd8x2,
    /// 16x1 display
    Lcd16x1,
    /// 16x2 display
    Lcd16x2,
    /// 20x2 display
    Lcd20x2,
}

impl From<&LcdDisplayType> for &'static str {
    fn from(display_type: &LcdDisplayType) -> Self {
        match display_type {
            LcdDisplayType::Lcd8x2 => "8x2",
            LcdDisplayType::Lcd16x1 => "16x1",
            LcdDisplayType::Lcd16x2 => "16x2",
            LcdDisplayType::Lcd20x2 => "20x2",
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LcdDisplayType {
    fn format(&self, fmt: defmt::Formatter) {
        let msg: &'static str = From::from(self);
        defmt::write!(fmt, "{}", msg);
    }
}

#[cfg(feature = "ufmt")]
impl ufmt::uDisplay for LcdDisplayType {
    fn fmt<W>(&self, w: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        let msg: &'static str = From::from(self);
        ufmt::uwrite!(w, "{}", msg)
    }
}

impl Display for LcdDisplayType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg: &'static str = From::from(self);
        write!(f, "{}", msg)
    }
}

impl LcdDisplayType {
    /// Get the number of rows for the display type
    pub const fn rows(&self) -> u8 {
        match self {
            LcdDisplayType::Lcd16x1 => 1,
            _ => 2,
        }
    }

    /// Get the number of columns for the display type
    pub const fn cols(&self) -> u8 {
        match self {
            LcdDisplayType::Lcd8x2 => 8,
            LcdDisplayType::Lcd16x1 => 16,
            LcdDisplayType::Lcd16x2 => 16,
            LcdDisplayType::Lcd20x2 => 20,
        }
    }

    /// DDRAM address of the first character of each row.
    pub const fn row_offsets(&self) -> [u8; 2] {
        [0x00, 0x40]
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
/// Static configuration of a display session. The defaults match the timing requirements of the
/// ST7032i datasheet and a 16x2 module powered from 3.3 V.
pub struct DisplayConfig {
    /// I2C address of the controller
    pub address: u8,
    pub lcd_type: LcdDisplayType,
    pub supply: SupplyVoltage,
    /// Minimum wait after every command before the next one may be issued.
    pub settle_delay_us: u32,
    /// Wait after the execution of the clear and home commands.
    pub long_command_delay_us: u32,
    /// Length of the low pulse on the reset line.
    pub reset_pulse_ms: u32,
    /// Wait after reset before the chip accepts commands.
    pub power_on_delay_ms: u32,
    /// Wait after enabling the follower for the LCD drive voltage to stabilize.
    pub follower_stabilize_ms: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_I2C_ADDRESS,
            lcd_type: LcdDisplayType::Lcd16x2,
            supply: SupplyVoltage::V3_3,
            settle_delay_us: 100,
            long_command_delay_us: 1530,
            reset_pulse_ms: 1,
            power_on_delay_ms: 40,
            follower_stabilize_ms: 200,
        }
    }
}

impl DisplayConfig {
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    pub fn with_lcd_type(mut self, lcd_type: LcdDisplayType) -> Self {
        self.lcd_type = lcd_type;
        self
    }

    pub fn with_supply(mut self, supply: SupplyVoltage) -> Self {
        self.supply = supply;
        self
    }

    pub fn with_settle_delay_us(mut self, settle_delay_us: u32) -> Self {
        self.settle_delay_us = settle_delay_us;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oscillator_tables() {
        assert_eq!(SupplyVoltage::V3_3.oscillator_frequencies()[4], 183);
        assert_eq!(SupplyVoltage::V5.oscillator_frequencies()[4], 192);
        assert_eq!(SupplyVoltage::V3_3.oscillator_frequencies()[7], 347);
        assert!(SupplyVoltage::V3_3.booster_required());
        assert!(!SupplyVoltage::V5.booster_required());
    }

    #[test]
    fn test_config_builders() {
        let config = DisplayConfig::default()
            .with_address(0x3C)
            .with_lcd_type(LcdDisplayType::Lcd20x2)
            .with_supply(SupplyVoltage::V5)
            .with_settle_delay_us(30);
        assert_eq!(config.address, 0x3C);
        assert_eq!(config.lcd_type.cols(), 20);
        assert_eq!(config.supply, SupplyVoltage::V5);
        assert_eq!(config.settle_delay_us, 30);
        assert_eq!(config.power_on_delay_ms, 40);
    }
}
