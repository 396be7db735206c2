//! This Rust `embedded-hal`-based library controls a [Sitronix ST7032i](https://www.newhavendisplay.com/app_notes/ST7032.pdf)
//! compatible character display (Winstar WO/WH series and similar modules) over I2C, together with the two GPIO lines such modules
//! usually expose: an active-low reset line and a backlight enable. It works in an embedded, `no_std` environment, and on Linux
//! through the optional `linux` feature.
//!
//! The ST7032i decodes its commands in one of two instruction sets. The normal set (IS0) holds the familiar HD44780 style
//! commands, the extended set (IS1) holds the contrast, bias, oscillator and power settings. The same command byte means
//! different things in each set, so this driver tracks which set the chip is in and switches it transparently before every
//! command that needs the other one.
//!
//! Key features include:
//! - Convenient high-level API for controlling the display, with every setting readable back from the driver
//! - Transparent instruction set switching
//! - Registers restored to their previous value when a write fails
//! - Contrast, bias, oscillator, booster and follower control
//! - Reset and backlight line control
//! - `core::fmt::Write` implementation for easy use with the `write!` macro
//! - Compatible with the `embedded-hal` traits v1.0 and later
//! - Optional support for the `defmt`, `log` and `ufmt` frameworks
//!
//! ## Usage
//! Add this to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! st7032i-display = { version = "0.1", features = ["defmt"] }
//! ```
//! Create the display from an I2C bus, the two control pins and a delay provider. Pins that implement `OutputPin` are wrapped
//! in an `OutputControlPin`:
//! ```rust
//! use st7032i_display::{pin::OutputControlPin, St7032iDisplay, State};
//!
//! let mut lcd = St7032iDisplay::new(
//!     i2c,
//!     OutputControlPin::new(reset_pin),
//!     OutputControlPin::new(backlight_pin),
//!     delay,
//! );
//! // pulses reset and runs the initialization sequence
//! lcd.open()?;
//! lcd.clear()?.contrast(40)?.cursor(true, false)?;
//! lcd.write_string("Hello, world!")?;
//! // can also use the `core::fmt::write!` macro
//! use core::fmt::Write;
//! write!(lcd, "{}", 42)?;
//! lcd.close()?;
//! ```
//! On Linux with the `linux` feature, the display can be opened from the bus device path and the sysfs GPIO numbers:
//! ```rust
//! let mut lcd = st7032i_display::LinuxDisplay::open_linux("/dev/i2c-1", 60, 48, Default::default())?;
//! lcd.write_string("Hello")?;
//! ```
//!
//! Every method that changes the display returns a `Result` that wraps the display object in `Ok()`, allowing for easy chaining.
//! Queries such as `get_contrast` or `is_cursor_on` only read the driver's copy of the registers and never touch the bus.
//!
#![no_std]
use core::fmt::Display;

use embedded_hal::{delay::DelayNs, i2c};

mod config;
mod driver;
mod logging;
pub mod pin;
pub mod registers;

#[cfg(feature = "linux")]
mod linux;
#[cfg(test)]
mod test_support;

pub use config::{DisplayConfig, LcdDisplayType, SupplyVoltage, DEFAULT_I2C_ADDRESS};
pub use driver::instruction_set::InstructionSet;
pub use driver::CommandKind;
#[cfg(feature = "linux")]
pub use linux::LinuxDisplay;

use driver::{
    st7032i::{
        CommandDispatcher, CommandTiming, ST7032i, LCD_CMD_CLEARDISPLAY, LCD_CMD_RETURNHOME,
        LCD_CMD_SETCGRAMADDR, LCD_CMD_SETDDRAMADDR,
    },
    DeviceHardwareTrait,
};
use pin::{ControlPin, PinLevel};
use registers::{
    check_field, split_contrast, BiasOscillator, ContrastLow, CursorDisplayShift, DisplayMode,
    EntryMode, FieldOutOfRange, FollowerControl, FunctionSet, IconAddress, PowerIconContrast,
    RegisterFile,
};

/// Errors that can occur when driving the display
pub enum DisplayError<I2C, PIN>
where
    I2C: i2c::I2c,
    PIN: ControlPin,
{
    /// The bus device could not be opened
    BusOpen,
    /// I2C error returned from the underlying I2C implementation
    BusIo(I2C::Error),
    /// A multi-byte write stopped after `written` bytes
    PartialWrite { written: usize, error: I2C::Error },
    /// A value does not fit the register field it is meant for
    InvalidArgument,
    /// Error returned by the reset or backlight line
    PinError(PIN::Error),
    /// Formatting error
    FormattingError(core::fmt::Error),
    /// The display session has not been opened
    NotOpen,
}

impl<I2C, PIN> From<core::fmt::Error> for DisplayError<I2C, PIN>
where
    I2C: i2c::I2c,
    PIN: ControlPin,
{
    fn from(err: core::fmt::Error) -> Self {
        DisplayError::FormattingError(err)
    }
}

impl<I2C, PIN> From<FieldOutOfRange> for DisplayError<I2C, PIN>
where
    I2C: i2c::I2c,
    PIN: ControlPin,
{
    fn from(_: FieldOutOfRange) -> Self {
        DisplayError::InvalidArgument
    }
}

impl<I2C, PIN> From<&DisplayError<I2C, PIN>> for &'static str
where
    I2C: i2c::I2c,
    PIN: ControlPin,
{
    fn from(err: &DisplayError<I2C, PIN>) -> Self {
        match err {
            DisplayError::BusOpen => "Bus open error",
            DisplayError::BusIo(_) => "I2C error",
            DisplayError::PartialWrite { .. } => "Partial write",
            DisplayError::InvalidArgument => "Invalid argument",
            DisplayError::PinError(_) => "Pin error",
            DisplayError::FormattingError(_) => "Formatting error",
            DisplayError::NotOpen => "Display not open",
        }
    }
}

impl<I2C, PIN> core::fmt::Debug for DisplayError<I2C, PIN>
where
    I2C: i2c::I2c,
    PIN: ControlPin,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DisplayError::BusOpen => write!(f, "BusOpen"),
            DisplayError::BusIo(e) => f.debug_tuple("BusIo").field(e).finish(),
            DisplayError::PartialWrite { written, error } => f
                .debug_struct("PartialWrite")
                .field("written", written)
                .field("error", error)
                .finish(),
            DisplayError::InvalidArgument => write!(f, "InvalidArgument"),
            DisplayError::PinError(e) => f.debug_tuple("PinError").field(e).finish(),
            DisplayError::FormattingError(e) => f.debug_tuple("FormattingError").field(e).finish(),
            DisplayError::NotOpen => write!(f, "NotOpen"),
        }
    }
}

#[cfg(feature = "defmt")]
impl<I2C, PIN> defmt::Format for DisplayError<I2C, PIN>
where
    I2C: i2c::I2c,
    PIN: ControlPin,
{
    fn format(&self, fmt: defmt::Formatter) {
        let msg: &'static str = From::from(self);
        defmt::write!(fmt, "{}", msg);
    }
}

#[cfg(feature = "ufmt")]
impl<I2C, PIN> ufmt::uDisplay for DisplayError<I2C, PIN>
where
    I2C: i2c::I2c,
    PIN: ControlPin,
{
    fn fmt<W>(&self, w: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        let msg: &'static str = From::from(self);
        ufmt::uwrite!(w, "{}", msg)
    }
}

impl<I2C, PIN> Display for DisplayError<I2C, PIN>
where
    I2C: i2c::I2c,
    PIN: ControlPin,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg: &'static str = From::from(self);
        write!(f, "{}", msg)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// Requested state of an on/off setting.
pub enum State {
    On,
    Off,
    /// Invert the current setting
    Toggle,
}

impl State {
    /// The new setting given the current one.
    pub const fn apply(self, current: bool) -> bool {
        match self {
            State::On => true,
            State::Off => false,
            State::Toggle => !current,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// Direction of cursor movement or display shift.
pub enum Direction {
    Left,
    Right,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// LCD drive bias.
pub enum Bias {
    OneFifth,
    OneFourth,
}

/// The bus and delay provider owned by the device driver.
pub struct DeviceSetupConfig<I2C, DELAY>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    i2c: I2C,
    address: u8,
    delay: DELAY,
}

/// An ST7032i character display with its reset and backlight lines.
pub struct St7032iDisplay<I2C, PIN, DELAY>
where
    I2C: i2c::I2c,
    PIN: ControlPin,
    DELAY: DelayNs,
{
    device: ST7032i<I2C, DELAY>,
    actions: CommandDispatcher<I2C, DELAY>,
    reset_pin: PIN,
    backlight_pin: PIN,
    config: DisplayConfig,
    backlight_on: bool,
    open: bool,
}

impl<I2C, PIN, DELAY> St7032iDisplay<I2C, PIN, DELAY>
where
    I2C: i2c::I2c,
    PIN: ControlPin,
    DELAY: DelayNs,
{
    /// Create a new display object with the default configuration.
    pub fn new(i2c: I2C, reset_pin: PIN, backlight_pin: PIN, delay: DELAY) -> Self {
        Self::new_with_config(i2c, reset_pin, backlight_pin, delay, DisplayConfig::default())
    }

    /// Create a new display object with a specific configuration.
    pub fn new_with_config(
        i2c: I2C,
        reset_pin: PIN,
        backlight_pin: PIN,
        delay: DELAY,
        config: DisplayConfig,
    ) -> Self {
        let timing = CommandTiming {
            settle_delay_us: config.settle_delay_us,
            long_command_delay_us: config.long_command_delay_us,
        };
        Self {
            device: ST7032i::new(DeviceSetupConfig {
                i2c,
                address: config.address,
                delay,
            }),
            actions: CommandDispatcher::new(config.supply, timing),
            reset_pin,
            backlight_pin,
            config,
            backlight_on: false,
            open: false,
        }
    }

    /// Start a session: claims both lines, pulses reset, initializes the chip with the power-on
    /// register values and switches the backlight on. If any step fails both lines are closed
    /// again before the error is returned.
    pub fn open(&mut self) -> Result<&mut Self, DisplayError<I2C, PIN>> {
        logging::debug!("opening display session");
        // not open again until the new session has started
        self.open = false;
        if let Err(e) = self.start_session() {
            logging::warning!("display session failed to start");
            // report the failure that stopped the session, not the close result
            let _ = self.close_lines();
            return Err(e);
        }
        self.open = true;
        Ok(self)
    }

    fn start_session(&mut self) -> Result<(), DisplayError<I2C, PIN>> {
        self.reset_pin.export().map_err(DisplayError::PinError)?;
        self.reset_pin
            .set_direction_output()
            .map_err(DisplayError::PinError)?;
        // leave the reset state once the line is an output
        self.reset_pin
            .set_level(PinLevel::High)
            .map_err(DisplayError::PinError)?;
        self.backlight_pin.export().map_err(DisplayError::PinError)?;
        self.backlight_pin
            .set_direction_output()
            .map_err(DisplayError::PinError)?;

        self.actions.reset_session(self.config.supply);
        self.hardware_reset()?;
        self.actions
            .write_init_sequence(&mut self.device, self.config.follower_stabilize_ms)
            .map_err(DisplayError::BusIo)?;
        self.set_backlight_line(true)
    }

    fn hardware_reset(&mut self) -> Result<(), DisplayError<I2C, PIN>> {
        self.reset_pin
            .pulse(self.device.delay(), self.config.reset_pulse_ms)
            .map_err(DisplayError::PinError)?;
        self.device.delay().delay_ms(self.config.power_on_delay_ms);
        Ok(())
    }

    /// Closes both lines and clears the session and backlight flags whatever the close results are.
    fn close_lines(&mut self) -> Result<(), DisplayError<I2C, PIN>> {
        self.open = false;
        self.backlight_on = false;
        let reset = self.reset_pin.close();
        let backlight = self.backlight_pin.close();
        reset.and(backlight).map_err(DisplayError::PinError)
    }

    /// End the session and release both lines. Both lines are closed even if closing the first
    /// one fails; the first error is returned.
    pub fn close(&mut self) -> Result<(), DisplayError<I2C, PIN>> {
        logging::debug!("closing display session");
        self.close_lines()
    }

    /// Gives back the bus, the reset pin, the backlight pin and the delay provider.
    pub fn release(self) -> (I2C, PIN, PIN, DELAY) {
        let Self {
            device,
            reset_pin,
            backlight_pin,
            ..
        } = self;
        let config = device.release();
        (config.i2c, reset_pin, backlight_pin, config.delay)
    }

    /// Whether a session is open.
    pub fn is_open(&self) -> bool {
        self.open
    }

    fn ensure_open(&self) -> Result<(), DisplayError<I2C, PIN>> {
        if !self.open {
            return Err(DisplayError::NotOpen);
        }
        Ok(())
    }

    /// Pulse the reset line and write the current register values to the chip again.
    pub fn reset(&mut self) -> Result<&mut Self, DisplayError<I2C, PIN>> {
        self.ensure_open()?;
        self.hardware_reset()?;
        self.actions.resync_after_reset();
        self.actions
            .write_init_sequence(&mut self.device, self.config.follower_stabilize_ms)
            .map_err(DisplayError::BusIo)?;
        Ok(self)
    }

    /// returns the configuration used to create the display
    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    /// returns the `LcdDisplayType` used to create the display
    pub fn display_type(&self) -> LcdDisplayType {
        self.config.lcd_type
    }

    /// The driver's copy of the chip registers.
    pub fn registers(&self) -> &RegisterFile {
        self.actions.registers()
    }

    //--------------------------------------------------------------------------------------------------
    // high level commands, for the user!
    //--------------------------------------------------------------------------------------------------

    /// Switch the display on or off. The display contents are kept while off.
    pub fn power(&mut self, state: State) -> Result<&mut Self, DisplayError<I2C, PIN>> {
        self.ensure_open()?;
        self.actions
            .modify(&mut self.device, |r: &mut DisplayMode| {
                r.set_display_on(state.apply(r.display_on()))
            })
            .map_err(DisplayError::BusIo)?;
        Ok(self)
    }

    /// Set the cursor visibility and blinking.
    pub fn cursor(
        &mut self,
        visible: bool,
        blinking: bool,
    ) -> Result<&mut Self, DisplayError<I2C, PIN>> {
        self.ensure_open()?;
        self.actions
            .modify(&mut self.device, |r: &mut DisplayMode| {
                r.set_cursor_on(visible);
                r.set_blink_on(blinking);
            })
            .map_err(DisplayError::BusIo)?;
        Ok(self)
    }

    /// Set the contrast, 0 to 63. The value is split over two registers; if the second write fails
    /// the first one is rolled back in the driver as well, so `get_contrast` keeps reporting the
    /// previous value.
    pub fn contrast(&mut self, value: u8) -> Result<&mut Self, DisplayError<I2C, PIN>> {
        let (low, high) = split_contrast(value)?;
        self.ensure_open()?;
        let previous_low = self.actions.registers().contrast_low;

        self.actions
            .modify(&mut self.device, |r: &mut ContrastLow| r.set_contrast_low(low))
            .map_err(DisplayError::BusIo)?;
        if let Err(e) = self
            .actions
            .modify(&mut self.device, |r: &mut PowerIconContrast| {
                r.set_contrast_high(high)
            })
        {
            self.actions.restore(previous_low);
            return Err(DisplayError::BusIo(e));
        }
        Ok(self)
    }

    /// Set the direction the cursor moves in after a character is written.
    pub fn direction(&mut self, direction: Direction) -> Result<&mut Self, DisplayError<I2C, PIN>> {
        self.ensure_open()?;
        self.actions
            .modify(&mut self.device, |r: &mut EntryMode| {
                r.set_cursor_right(direction == Direction::Right)
            })
            .map_err(DisplayError::BusIo)?;
        Ok(self)
    }

    /// Set whether the whole display shifts when a character is written.
    pub fn shift(&mut self, state: State) -> Result<&mut Self, DisplayError<I2C, PIN>> {
        self.ensure_open()?;
        self.actions
            .modify(&mut self.device, |r: &mut EntryMode| {
                r.set_shift(state.apply(r.shift()))
            })
            .map_err(DisplayError::BusIo)?;
        Ok(self)
    }

    /// Set double height font mode.
    pub fn double_height(&mut self, state: State) -> Result<&mut Self, DisplayError<I2C, PIN>> {
        self.ensure_open()?;
        self.actions
            .modify(&mut self.device, |r: &mut FunctionSet| {
                r.set_double_height(state.apply(r.double_height()))
            })
            .map_err(DisplayError::BusIo)?;
        Ok(self)
    }

    /// Set two line mode.
    pub fn two_lines(&mut self, state: State) -> Result<&mut Self, DisplayError<I2C, PIN>> {
        self.ensure_open()?;
        self.actions
            .modify(&mut self.device, |r: &mut FunctionSet| {
                r.set_two_lines(state.apply(r.two_lines()))
            })
            .map_err(DisplayError::BusIo)?;
        Ok(self)
    }

    /// Shift the whole display one position without changing the DDRAM contents.
    pub fn shift_display(
        &mut self,
        direction: Direction,
    ) -> Result<&mut Self, DisplayError<I2C, PIN>> {
        self.shift_register(true, direction)
    }

    /// Move the cursor one position without writing.
    pub fn move_cursor(&mut self, direction: Direction) -> Result<&mut Self, DisplayError<I2C, PIN>> {
        self.shift_register(false, direction)
    }

    fn shift_register(
        &mut self,
        display: bool,
        direction: Direction,
    ) -> Result<&mut Self, DisplayError<I2C, PIN>> {
        self.ensure_open()?;
        self.actions
            .modify(&mut self.device, |r: &mut CursorDisplayShift| {
                r.set_display_shift(display);
                r.set_right(direction == Direction::Right);
            })
            .map_err(DisplayError::BusIo)?;
        Ok(self)
    }

    /// Clear the display
    pub fn clear(&mut self) -> Result<&mut Self, DisplayError<I2C, PIN>> {
        self.ensure_open()?;
        self.actions
            .write_long_immediate(&mut self.device, LCD_CMD_CLEARDISPLAY)
            .map_err(DisplayError::BusIo)?;
        Ok(self)
    }

    /// Set the cursor to the home position.
    pub fn home(&mut self) -> Result<&mut Self, DisplayError<I2C, PIN>> {
        self.ensure_open()?;
        self.actions
            .write_long_immediate(&mut self.device, LCD_CMD_RETURNHOME)
            .map_err(DisplayError::BusIo)?;
        Ok(self)
    }

    /// Set the cursor position at specified column and row. Columns and rows are zero-indexed.
    pub fn set_cursor(&mut self, col: u8, row: u8) -> Result<&mut Self, DisplayError<I2C, PIN>> {
        let lcd_type = self.config.lcd_type;
        if row >= lcd_type.rows() || col >= lcd_type.cols() {
            return Err(DisplayError::InvalidArgument);
        }
        self.ensure_open()?;
        let address = lcd_type.row_offsets()[row as usize] + col;
        self.actions
            .write_immediate(
                &mut self.device,
                InstructionSet::Normal,
                LCD_CMD_SETDDRAMADDR | address,
                0,
            )
            .map_err(DisplayError::BusIo)?;
        Ok(self)
    }

    /// Create a new custom character in one of the eight CGRAM locations. The address counter is
    /// left in CGRAM, so call `set_cursor` or `home` before writing text again.
    pub fn create_char(
        &mut self,
        location: u8,
        charmap: [u8; 8],
    ) -> Result<&mut Self, DisplayError<I2C, PIN>> {
        let location = check_field(location, 3)?;
        self.ensure_open()?;
        self.actions
            .write_immediate(
                &mut self.device,
                InstructionSet::Normal,
                LCD_CMD_SETCGRAMADDR | (location << 3),
                0,
            )
            .map_err(DisplayError::BusIo)?;
        for (written, row) in charmap.iter().enumerate() {
            self.actions
                .write_data(&mut self.device, *row)
                .map_err(|error| DisplayError::PartialWrite { written, error })?;
        }
        Ok(self)
    }

    /// Write one character code at the cursor position.
    pub fn write_char(&mut self, ch: u8) -> Result<&mut Self, DisplayError<I2C, PIN>> {
        self.ensure_open()?;
        self.actions
            .write_data(&mut self.device, ch)
            .map_err(DisplayError::BusIo)?;
        Ok(self)
    }

    /// Write a string at the cursor position, one byte per character cell. The bytes are sent as
    /// they are, so only ASCII text maps one character to one cell; other characters arrive as
    /// their UTF-8 bytes and should be written with `write_char` using the ROM code instead.
    /// Returns the number of bytes written. If a byte fails the rest is not sent and the error
    /// carries how many bytes made it to the display.
    pub fn write_string(&mut self, text: &str) -> Result<usize, DisplayError<I2C, PIN>> {
        self.ensure_open()?;
        for (written, ch) in text.bytes().enumerate() {
            if let Err(error) = self.actions.write_data(&mut self.device, ch) {
                logging::warning!("string write stopped after {} bytes", written);
                return Err(DisplayError::PartialWrite { written, error });
            }
        }
        Ok(text.len())
    }

    /// Turn the backlight on or off
    pub fn backlight(&mut self, state: State) -> Result<&mut Self, DisplayError<I2C, PIN>> {
        self.ensure_open()?;
        self.set_backlight_line(state.apply(self.backlight_on))?;
        Ok(self)
    }

    fn set_backlight_line(&mut self, on: bool) -> Result<(), DisplayError<I2C, PIN>> {
        self.backlight_pin
            .set_level(PinLevel::from(on))
            .map_err(DisplayError::PinError)?;
        self.backlight_on = on;
        Ok(())
    }

    /// Select the LCD drive bias.
    pub fn set_bias(&mut self, bias: Bias) -> Result<&mut Self, DisplayError<I2C, PIN>> {
        self.ensure_open()?;
        self.actions
            .modify(&mut self.device, |r: &mut BiasOscillator| {
                r.set_quarter_bias(bias == Bias::OneFourth)
            })
            .map_err(DisplayError::BusIo)?;
        Ok(self)
    }

    /// Adjust the internal oscillator, 0 to 7. See `oscillator_frequency_hz` for the resulting
    /// frequency.
    pub fn set_oscillator(&mut self, adjust: u8) -> Result<&mut Self, DisplayError<I2C, PIN>> {
        let adjust = check_field(adjust, 3)?;
        self.ensure_open()?;
        self.actions
            .modify(&mut self.device, |r: &mut BiasOscillator| {
                r.set_frequency_adjust(adjust)
            })
            .map_err(DisplayError::BusIo)?;
        Ok(self)
    }

    /// Switch the internal voltage booster.
    pub fn booster(&mut self, state: State) -> Result<&mut Self, DisplayError<I2C, PIN>> {
        self.ensure_open()?;
        self.actions
            .modify(&mut self.device, |r: &mut PowerIconContrast| {
                r.set_booster_on(state.apply(r.booster_on()))
            })
            .map_err(DisplayError::BusIo)?;
        Ok(self)
    }

    /// Switch the icon display.
    pub fn icon(&mut self, state: State) -> Result<&mut Self, DisplayError<I2C, PIN>> {
        self.ensure_open()?;
        self.actions
            .modify(&mut self.device, |r: &mut PowerIconContrast| {
                r.set_icon_on(state.apply(r.icon_on()))
            })
            .map_err(DisplayError::BusIo)?;
        Ok(self)
    }

    /// Configure the voltage follower and its amplifier ratio, 0 to 7.
    pub fn set_follower(&mut self, on: bool, ratio: u8) -> Result<&mut Self, DisplayError<I2C, PIN>> {
        let ratio = check_field(ratio, 3)?;
        self.ensure_open()?;
        self.actions
            .modify(&mut self.device, |r: &mut FollowerControl| {
                r.set_follower_on(on);
                r.set_amplifier_ratio(ratio);
            })
            .map_err(DisplayError::BusIo)?;
        Ok(self)
    }

    /// Write the five segment bits of one icon RAM address (0 to 15). The address counter is left
    /// in icon RAM, so call `set_cursor` or `home` before writing text again.
    pub fn set_icon(&mut self, address: u8, segments: u8) -> Result<&mut Self, DisplayError<I2C, PIN>> {
        let address = check_field(address, 4)?;
        let segments = check_field(segments, 5)?;
        self.ensure_open()?;
        self.actions
            .modify(&mut self.device, |r: &mut IconAddress| r.set_address(address))
            .map_err(DisplayError::BusIo)?;
        self.actions
            .write_data(&mut self.device, segments)
            .map_err(DisplayError::BusIo)?;
        Ok(self)
    }

    //--------------------------------------------------------------------------------------------------
    // queries, answered from the driver's register copy
    //--------------------------------------------------------------------------------------------------

    pub fn is_display_on(&self) -> bool {
        self.registers().display_mode.display_on()
    }

    pub fn is_cursor_on(&self) -> bool {
        self.registers().display_mode.cursor_on()
    }

    pub fn is_blink_on(&self) -> bool {
        self.registers().display_mode.blink_on()
    }

    pub fn is_two_lines(&self) -> bool {
        self.registers().function_set.two_lines()
    }

    pub fn is_double_height(&self) -> bool {
        self.registers().function_set.double_height()
    }

    pub fn is_shift_on(&self) -> bool {
        self.registers().entry_mode.shift()
    }

    pub fn get_direction(&self) -> Direction {
        if self.registers().entry_mode.cursor_right() {
            Direction::Right
        } else {
            Direction::Left
        }
    }

    /// The contrast value last written successfully.
    pub fn get_contrast(&self) -> u8 {
        self.registers().contrast()
    }

    pub fn is_backlight_on(&self) -> bool {
        self.backlight_on
    }

    /// The instruction set the chip was last switched to.
    pub fn instruction_set(&self) -> InstructionSet {
        self.actions.instruction_set()
    }

    /// Frame frequency of the internal oscillator at the configured supply voltage.
    pub fn oscillator_frequency_hz(&self) -> u16 {
        let adjust = self.registers().bias_oscillator.frequency_adjust();
        self.config.supply.oscillator_frequencies()[adjust as usize]
    }
}

/// Implement the `core::fmt::Write` trait for the display, allowing it to be used with the `write!` macro.
impl<I2C, PIN, DELAY> core::fmt::Write for St7032iDisplay<I2C, PIN, DELAY>
where
    I2C: i2c::I2c,
    PIN: ControlPin,
    DELAY: DelayNs,
{
    fn write_str(&mut self, s: &str) -> Result<(), core::fmt::Error> {
        if let Err(_e) = self.write_string(s) {
            return Err(core::fmt::Error);
        }
        Ok(())
    }
}

#[cfg(feature = "ufmt")]
/// Implement the `ufmt::uWrite` trait for the display, allowing it to be used with the `uwriteln!` and `uwrite!` macros.
impl<I2C, PIN, DELAY> ufmt::uWrite for St7032iDisplay<I2C, PIN, DELAY>
where
    I2C: i2c::I2c,
    PIN: ControlPin,
    DELAY: DelayNs,
{
    fn write_str(&mut self, s: &str) -> Result<(), DisplayError<I2C, PIN>> {
        self.write_string(s)?;
        Ok(())
    }

    type Error = DisplayError<I2C, PIN>;
}
