pub mod instruction_set;
pub mod st7032i;

use embedded_hal::{delay::DelayNs, i2c};

use crate::DeviceSetupConfig;

/// Kind of a physical command, sent as the leading control byte of every bus write.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CommandKind {
    /// Instruction for the command decoder.
    Control,
    /// Byte for the DDRAM, CGRAM or icon RAM at the current address counter.
    Data,
}

/// Trait for device hardware implementations. Embodies how a single command byte reaches the
/// controller, and owns the bus and delay provider used to do so.
pub trait DeviceHardwareTrait<I2C, DELAY>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    fn new(config: DeviceSetupConfig<I2C, DELAY>) -> Self;

    /// returns configured i2c address
    fn i2c_address(&self) -> u8;

    /// return a mutable reference to the delay object
    fn delay(&mut self) -> &mut DELAY;

    /// returns the i2c object. mostly used for testing
    fn i2c(&mut self) -> &mut I2C;

    /// Writes one command to the controller. Every command is a single bus transaction.
    fn write_command(&mut self, kind: CommandKind, payload: u8) -> Result<(), I2C::Error>;

    /// Gives back the bus and delay provider.
    fn release(self) -> DeviceSetupConfig<I2C, DELAY>;
}
