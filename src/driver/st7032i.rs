use core::marker::PhantomData;

use embedded_hal::{delay::DelayNs, i2c};

use crate::{
    driver::{CommandKind, DeviceHardwareTrait},
    logging,
    registers::{
        BiasOscillator, ContrastLow, CursorDisplayShift, DisplayMode, EntryMode, FollowerControl,
        FunctionSet, PowerIconContrast, Register, RegisterFile,
    },
    DeviceSetupConfig, SupplyVoltage,
};

use super::instruction_set::{InstructionSet, InstructionSetState};

const CONTROL_RS_DATA: u8 = 0b0100_0000;
const CONTROL_RS_COMMAND: u8 = 0b0000_0000;

// immediate commands of instruction set 0, they carry no register state
pub const LCD_CMD_CLEARDISPLAY: u8 = 0x01; //  Clear display, set cursor position to zero
pub const LCD_CMD_RETURNHOME: u8 = 0x02; //  Set cursor position to zero
pub const LCD_CMD_SETCGRAMADDR: u8 = 0x40; //  Set the CGRAM (character generator RAM) address
pub const LCD_CMD_SETDDRAMADDR: u8 = 0x80; //  Set the DDRAM (Display Data RAM) address

/// ST7032i device driver implementation
pub struct ST7032i<I2C, DELAY>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    config: DeviceSetupConfig<I2C, DELAY>,
}

impl<I2C, DELAY> DeviceHardwareTrait<I2C, DELAY> for ST7032i<I2C, DELAY>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    fn new(config: DeviceSetupConfig<I2C, DELAY>) -> Self {
        ST7032i { config }
    }

    fn i2c_address(&self) -> u8 {
        self.config.address
    }

    fn delay(&mut self) -> &mut DELAY {
        &mut self.config.delay
    }

    fn i2c(&mut self) -> &mut I2C {
        &mut self.config.i2c
    }

    /// The control byte has Co = 0 (last control byte) and RS selecting instruction or data.
    fn write_command(&mut self, kind: CommandKind, payload: u8) -> Result<(), I2C::Error> {
        let control_byte = match kind {
            CommandKind::Control => CONTROL_RS_COMMAND,
            CommandKind::Data => CONTROL_RS_DATA,
        };
        let address = self.i2c_address();
        logging::trace!(
            "i2c write {:#x}: {:#x} {:#x}",
            address,
            control_byte,
            payload
        );
        self.config.i2c.write(address, &[control_byte, payload])
    }

    fn release(self) -> DeviceSetupConfig<I2C, DELAY> {
        self.config
    }
}

/// Waits the dispatcher enforces after commands.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct CommandTiming {
    /// after every command
    pub settle_delay_us: u32,
    /// additionally after clear and home
    pub long_command_delay_us: u32,
}

/// Serializes register updates into bus commands. Owns the in-memory register file and the
/// instruction-set state, switches the chip's instruction set ahead of a register that needs it,
/// and rolls a register back to its previous value when its write does not reach the chip.
pub struct CommandDispatcher<I2C, DELAY>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    registers: RegisterFile,
    instruction_set: InstructionSetState,
    timing: CommandTiming,
    _i2c: PhantomData<I2C>,
    _delay: PhantomData<DELAY>,
}

impl<I2C, DELAY> CommandDispatcher<I2C, DELAY>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    pub fn new(supply: SupplyVoltage, timing: CommandTiming) -> Self {
        Self {
            registers: RegisterFile::power_on_defaults(supply),
            instruction_set: InstructionSetState::new(),
            timing,
            _i2c: PhantomData,
            _delay: PhantomData,
        }
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    pub fn instruction_set(&self) -> InstructionSet {
        self.instruction_set.current()
    }

    /// Puts a register back to `value` without touching the bus.
    pub fn restore<R: Register>(&mut self, value: R) {
        self.registers
            .set(value.with_instruction_set(self.instruction_set.current()));
    }

    /// Starts a new session: power-on register values and the chip's post-reset mode.
    pub fn reset_session(&mut self, supply: SupplyVoltage) {
        self.registers = RegisterFile::power_on_defaults(supply);
        self.instruction_set.reset();
    }

    /// The chip was reset but the register values are to be kept.
    pub fn resync_after_reset(&mut self) {
        self.instruction_set.reset();
        let function_set = self.registers.function_set;
        self.restore(function_set);
    }

    /// Writes one command and waits for the chip to settle.
    fn send<DEVICE>(
        &mut self,
        device: &mut DEVICE,
        kind: CommandKind,
        payload: u8,
        extra_delay_us: u32,
    ) -> Result<(), I2C::Error>
    where
        DEVICE: DeviceHardwareTrait<I2C, DELAY>,
    {
        device.write_command(kind, payload)?;
        device
            .delay()
            .delay_us(self.timing.settle_delay_us + extra_delay_us);
        Ok(())
    }

    /// Makes sure the chip decodes commands of `target`. A failed switch leaves the tracked
    /// instruction set untouched.
    fn ensure_instruction_set<DEVICE>(
        &mut self,
        device: &mut DEVICE,
        target: InstructionSet,
    ) -> Result<(), I2C::Error>
    where
        DEVICE: DeviceHardwareTrait<I2C, DELAY>,
    {
        if let Some(switch) = self.instruction_set.plan(self.registers.function_set, target) {
            logging::trace!("switching to instruction set {}", switch.target);
            self.send(device, CommandKind::Control, switch.command, 0)?;
            self.instruction_set
                .commit(switch, &mut self.registers.function_set);
        }
        Ok(())
    }

    /// Writes a new value of register `R`. On failure the register is restored to the value it
    /// had before the call and no further command is sent.
    pub fn write_register<DEVICE, R>(
        &mut self,
        device: &mut DEVICE,
        value: R,
    ) -> Result<(), I2C::Error>
    where
        DEVICE: DeviceHardwareTrait<I2C, DELAY>,
        R: Register,
    {
        let snapshot: R = self.registers.get();

        // the switch is built from the function-set value the chip already holds
        let result = self
            .ensure_instruction_set(device, R::INSTRUCTION_SET)
            .and_then(|_| {
                let value = value.with_instruction_set(self.instruction_set.current());
                self.registers.set(value);
                self.send(device, CommandKind::Control, value.bits(), 0)
            });

        if let Err(e) = result {
            logging::warning!("write of {} failed, rolling back", R::NAME);
            self.restore(snapshot);
            return Err(e);
        }
        Ok(())
    }

    /// Read-modify-write of register `R`.
    pub fn modify<DEVICE, R, F>(&mut self, device: &mut DEVICE, f: F) -> Result<(), I2C::Error>
    where
        DEVICE: DeviceHardwareTrait<I2C, DELAY>,
        R: Register,
        F: FnOnce(&mut R),
    {
        let mut value: R = self.registers.get();
        f(&mut value);
        self.write_register(device, value)
    }

    /// Sends a command that has no register behind it, such as clear or a DDRAM address.
    pub fn write_immediate<DEVICE>(
        &mut self,
        device: &mut DEVICE,
        set: InstructionSet,
        command: u8,
        extra_delay_us: u32,
    ) -> Result<(), I2C::Error>
    where
        DEVICE: DeviceHardwareTrait<I2C, DELAY>,
    {
        self.ensure_instruction_set(device, set)?;
        self.send(device, CommandKind::Control, command, extra_delay_us)
    }

    /// Sends a clear or home command, which need the long execution wait.
    pub fn write_long_immediate<DEVICE>(
        &mut self,
        device: &mut DEVICE,
        command: u8,
    ) -> Result<(), I2C::Error>
    where
        DEVICE: DeviceHardwareTrait<I2C, DELAY>,
    {
        let extra = self.timing.long_command_delay_us;
        self.write_immediate(device, InstructionSet::Normal, command, extra)
    }

    /// Writes one byte to the RAM selected by the address counter. Data writes are decoded the
    /// same way in both instruction sets.
    pub fn write_data<DEVICE>(&mut self, device: &mut DEVICE, data: u8) -> Result<(), I2C::Error>
    where
        DEVICE: DeviceHardwareTrait<I2C, DELAY>,
    {
        self.send(device, CommandKind::Data, data, 0)
    }

    /// Writes every register to the chip in initialization order. The extended set registers
    /// have to be configured before the display is switched on in the normal set.
    pub fn write_init_sequence<DEVICE>(
        &mut self,
        device: &mut DEVICE,
        follower_stabilize_ms: u32,
    ) -> Result<(), I2C::Error>
    where
        DEVICE: DeviceHardwareTrait<I2C, DELAY>,
    {
        logging::debug!("writing init sequence");
        let regs = self.registers;
        self.write_register::<_, FunctionSet>(device, regs.function_set)?;
        self.write_register::<_, BiasOscillator>(device, regs.bias_oscillator)?;
        self.write_register::<_, ContrastLow>(device, regs.contrast_low)?;
        self.write_register::<_, PowerIconContrast>(device, regs.power_icon_contrast)?;
        self.write_register::<_, FollowerControl>(device, regs.follower)?;
        // wait for the LCD drive voltage to stabilize
        device.delay().delay_ms(follower_stabilize_ms);
        self.write_register::<_, DisplayMode>(device, regs.display_mode)?;
        self.write_register::<_, EntryMode>(device, regs.entry_mode)?;
        self.write_register::<_, CursorDisplayShift>(device, regs.cursor_display_shift)?;
        Ok(())
    }
}

#[cfg(test)]
mod lib_tests {
    extern crate std;
    use super::*;
    use crate::test_support::RecordingDelay;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::{
        delay::NoopDelay,
        i2c::{Mock as I2cMock, Transaction as I2cTransaction},
    };

    const TIMING: CommandTiming = CommandTiming {
        settle_delay_us: 100,
        long_command_delay_us: 1530,
    };

    fn device<DELAY: DelayNs>(
        expected: &[I2cTransaction],
        delay: DELAY,
    ) -> ST7032i<I2cMock, DELAY> {
        ST7032i::new(DeviceSetupConfig {
            i2c: I2cMock::new(expected),
            address: 0x3e,
            delay,
        })
    }

    fn cmd(payload: u8) -> I2cTransaction {
        I2cTransaction::write(0x3e, std::vec![0x00, payload])
    }

    #[test]
    fn test_write_command() {
        let expected_i2c_transactions = std::vec![
            I2cTransaction::write(0x3e, std::vec![0b0100_0000, 0x48]),
            I2cTransaction::write(0x3e, std::vec![0b0000_0000, 0xAB]),
        ];
        let mut device = device(&expected_i2c_transactions, NoopDelay::new());
        assert!(device.write_command(CommandKind::Data, 0x48).is_ok());
        assert!(device.write_command(CommandKind::Control, 0xAB).is_ok());
        device.i2c().done();
    }

    #[test]
    fn test_write_command_uses_configured_address() {
        let expected_i2c_transactions = std::vec![I2cTransaction::write(0x3c, std::vec![0x40, 0x41])];
        let mut device = ST7032i::new(DeviceSetupConfig {
            i2c: I2cMock::new(&expected_i2c_transactions),
            address: 0x3c,
            delay: NoopDelay::new(),
        });
        assert_eq!(device.i2c_address(), 0x3c);
        assert!(device.write_command(CommandKind::Data, 0x41).is_ok());
        device.i2c().done();
    }

    #[test]
    fn test_extended_register_switches_once() {
        let expected_i2c_transactions = std::vec![
            cmd(0x39), // function set, IS1
            cmd(0x7F), // contrast low
            cmd(0x57), // power/icon/contrast high, no second switch
        ];
        let mut device = device(&expected_i2c_transactions, RecordingDelay::new());
        let mut actions: CommandDispatcher<I2cMock, RecordingDelay> =
            CommandDispatcher::new(SupplyVoltage::V3_3, TIMING);

        assert!(actions
            .modify(&mut device, |r: &mut ContrastLow| r.set_contrast_low(0x0F))
            .is_ok());
        assert!(actions
            .modify(&mut device, |r: &mut PowerIconContrast| r.set_contrast_high(0x03))
            .is_ok());
        assert_eq!(actions.instruction_set(), InstructionSet::Extended);
        assert!(actions.registers().function_set.extended_instruction_set());
        assert_eq!(actions.registers().contrast(), 63);

        let mut config = device.release();
        config.i2c.done();
        // one settle wait per physical command
        assert_eq!(config.delay.count_us(100), 3);
    }

    #[test]
    fn test_failed_switch_aborts_write() {
        let expected_i2c_transactions = std::vec![cmd(0x39).with_error(ErrorKind::Other)];
        let mut device = device(&expected_i2c_transactions, NoopDelay::new());
        let mut actions: CommandDispatcher<I2cMock, NoopDelay> =
            CommandDispatcher::new(SupplyVoltage::V3_3, TIMING);
        let before = *actions.registers();

        let result = actions.modify(&mut device, |r: &mut FollowerControl| {
            r.set_amplifier_ratio(2)
        });
        assert_eq!(result, Err(ErrorKind::Other));
        assert_eq!(*actions.registers(), before);
        assert_eq!(actions.instruction_set(), InstructionSet::Normal);
        device.i2c().done();
    }

    #[test]
    fn test_failed_target_write_rolls_back_register_only() {
        let expected_i2c_transactions = std::vec![
            cmd(0x39),
            cmd(0x6A).with_error(ErrorKind::Other),
        ];
        let mut device = device(&expected_i2c_transactions, NoopDelay::new());
        let mut actions: CommandDispatcher<I2cMock, NoopDelay> =
            CommandDispatcher::new(SupplyVoltage::V3_3, TIMING);

        let result = actions.modify(&mut device, |r: &mut FollowerControl| {
            r.set_amplifier_ratio(2)
        });
        assert!(result.is_err());
        assert_eq!(actions.registers().follower.amplifier_ratio(), 5);
        // the switch itself reached the chip
        assert_eq!(actions.instruction_set(), InstructionSet::Extended);
        assert!(actions.registers().function_set.extended_instruction_set());
        device.i2c().done();
    }

    #[test]
    fn test_function_set_write_from_extended_set() {
        let expected_i2c_transactions = std::vec![
            cmd(0x39), // to IS1
            cmd(0x14), // bias/osc
            cmd(0x38), // back to IS0
            cmd(0x3C), // double height, selector stays IS0
        ];
        let mut device = device(&expected_i2c_transactions, NoopDelay::new());
        let mut actions: CommandDispatcher<I2cMock, NoopDelay> =
            CommandDispatcher::new(SupplyVoltage::V3_3, TIMING);

        let bias = actions.registers().bias_oscillator;
        assert!(actions.write_register(&mut device, bias).is_ok());
        assert!(actions
            .modify(&mut device, |r: &mut FunctionSet| r.set_double_height(true))
            .is_ok());
        assert_eq!(actions.instruction_set(), InstructionSet::Normal);
        assert_eq!(actions.registers().function_set.bits(), 0x3C);
        device.i2c().done();
    }

    #[test]
    fn test_failed_function_set_write_keeps_selector_in_sync() {
        let expected_i2c_transactions = std::vec![
            cmd(0x39),
            cmd(0x14),
            cmd(0x38),
            cmd(0x3C).with_error(ErrorKind::Other),
        ];
        let mut device = device(&expected_i2c_transactions, NoopDelay::new());
        let mut actions: CommandDispatcher<I2cMock, NoopDelay> =
            CommandDispatcher::new(SupplyVoltage::V3_3, TIMING);

        let bias = actions.registers().bias_oscillator;
        assert!(actions.write_register(&mut device, bias).is_ok());
        assert!(actions
            .modify(&mut device, |r: &mut FunctionSet| r.set_double_height(true))
            .is_err());
        // double height rolled back, selector reflects the switch that did happen
        assert_eq!(actions.instruction_set(), InstructionSet::Normal);
        assert_eq!(actions.registers().function_set.bits(), 0x38);
        device.i2c().done();
    }

    #[test]
    fn test_long_immediate_from_extended_set() {
        let expected_i2c_transactions = std::vec![
            cmd(0x39),
            cmd(0x14),
            cmd(0x38),
            cmd(LCD_CMD_CLEARDISPLAY),
        ];
        let mut device = device(&expected_i2c_transactions, RecordingDelay::new());
        let mut actions: CommandDispatcher<I2cMock, RecordingDelay> =
            CommandDispatcher::new(SupplyVoltage::V3_3, TIMING);

        let bias = actions.registers().bias_oscillator;
        assert!(actions.write_register(&mut device, bias).is_ok());
        assert!(actions
            .write_long_immediate(&mut device, LCD_CMD_CLEARDISPLAY)
            .is_ok());

        let mut config = device.release();
        config.i2c.done();
        assert_eq!(config.delay.count_us(100), 3);
        assert_eq!(config.delay.count_us(100 + 1530), 1);
    }

    #[test]
    fn test_data_write_ignores_instruction_set() {
        let expected_i2c_transactions = std::vec![
            cmd(0x39),
            cmd(0x40),
            I2cTransaction::write(0x3e, std::vec![0x40, 0x1F]),
        ];
        let mut device = device(&expected_i2c_transactions, NoopDelay::new());
        let mut actions: CommandDispatcher<I2cMock, NoopDelay> =
            CommandDispatcher::new(SupplyVoltage::V3_3, TIMING);

        let icon = actions.registers().icon_address;
        assert!(actions.write_register(&mut device, icon).is_ok());
        assert!(actions.write_data(&mut device, 0x1F).is_ok());
        assert_eq!(actions.instruction_set(), InstructionSet::Extended);
        device.i2c().done();
    }

    #[test]
    fn test_init_sequence() {
        let expected_i2c_transactions = std::vec![
            cmd(0x38), // function set, pins IS0
            cmd(0x39), // switch to IS1
            cmd(0x14), // bias 1/5, osc F=4
            cmd(0x78), // contrast low
            cmd(0x54), // booster on, contrast high
            cmd(0x6D), // follower on, ratio 5
            cmd(0x38), // switch to IS0
            cmd(0x0C), // display on
            cmd(0x06), // entry mode
            cmd(0x1C), // cursor/display shift
        ];
        let mut device = device(&expected_i2c_transactions, RecordingDelay::new());
        let mut actions: CommandDispatcher<I2cMock, RecordingDelay> =
            CommandDispatcher::new(SupplyVoltage::V3_3, TIMING);

        assert!(actions.write_init_sequence(&mut device, 200).is_ok());
        assert_eq!(actions.instruction_set(), InstructionSet::Normal);

        let mut config = device.release();
        config.i2c.done();
        assert_eq!(config.delay.count_us(100), 10);
        assert_eq!(config.delay.count_ms(200), 1);
    }

    #[test]
    fn test_init_sequence_stops_at_first_failure() {
        let expected_i2c_transactions = std::vec![
            cmd(0x38),
            cmd(0x39),
            cmd(0x14).with_error(ErrorKind::Other),
        ];
        let mut device = device(&expected_i2c_transactions, NoopDelay::new());
        let mut actions: CommandDispatcher<I2cMock, NoopDelay> =
            CommandDispatcher::new(SupplyVoltage::V3_3, TIMING);

        assert!(actions.write_init_sequence(&mut device, 200).is_err());
        device.i2c().done();
    }

    #[test]
    fn test_resync_after_reset_clears_selector() {
        let expected_i2c_transactions = std::vec![cmd(0x39), cmd(0x14)];
        let mut device = device(&expected_i2c_transactions, NoopDelay::new());
        let mut actions: CommandDispatcher<I2cMock, NoopDelay> =
            CommandDispatcher::new(SupplyVoltage::V3_3, TIMING);

        let bias = actions.registers().bias_oscillator;
        assert!(actions.write_register(&mut device, bias).is_ok());
        actions.resync_after_reset();
        assert_eq!(actions.instruction_set(), InstructionSet::Normal);
        assert!(!actions.registers().function_set.extended_instruction_set());
        device.i2c().done();
    }
}
