//! Bit-packed models of the ST7032i command registers.
//!
//! Every register is a `bitfield!` over a single byte. The constant opcode bits of each command
//! are not stored as fields; they are masked in by [`Register::bits`] so a register value can only
//! ever encode to a well-formed command byte for its own instruction.
use bitfield::bitfield;

use crate::config::SupplyVoltage;
use crate::driver::instruction_set::InstructionSet;

/// Largest contrast value accepted by the chip (6 bits).
pub const CONTRAST_MAX: u8 = 63;

/// A value did not fit in the bit width of the register field it was meant for.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct FieldOutOfRange;

/// Checks that `value` fits in a field that is `width` bits wide.
pub fn check_field(value: u8, width: u32) -> Result<u8, FieldOutOfRange> {
    if width < 8 && (value >> width) != 0 {
        return Err(FieldOutOfRange);
    }
    Ok(value)
}

/// Splits a contrast value into the (low nibble, high two bits) pair stored in the
/// contrast-low and power/icon/contrast-high registers.
pub fn split_contrast(value: u8) -> Result<(u8, u8), FieldOutOfRange> {
    if value > CONTRAST_MAX {
        return Err(FieldOutOfRange);
    }
    Ok((value & 0x0F, (value >> 4) & 0x03))
}

/// Common behaviour of the nine command registers.
pub trait Register: Copy + core::fmt::Debug {
    /// Human readable register name, used in log output.
    const NAME: &'static str;
    /// The instruction set the chip must be in for this register's opcode to be decoded.
    const INSTRUCTION_SET: InstructionSet;
    /// Constant opcode bits of the command.
    const OPCODE: u8;
    /// Mask selecting the constant opcode bits.
    const OPCODE_MASK: u8;

    fn raw(&self) -> u8;
    fn from_raw(raw: u8) -> Self;

    /// Location of this register inside the register file.
    fn slot(file: &RegisterFile) -> &Self;
    fn slot_mut(file: &mut RegisterFile) -> &mut Self;

    /// Encodes the register into the command byte sent on the bus.
    fn bits(&self) -> u8 {
        (self.raw() & !Self::OPCODE_MASK) | Self::OPCODE
    }

    /// Decodes a command byte. Returns `None` if the opcode bits do not belong to this register.
    fn from_bits(bits: u8) -> Option<Self> {
        if bits & Self::OPCODE_MASK != Self::OPCODE {
            return None;
        }
        Some(Self::from_raw(bits))
    }

    /// Returns a copy of the register as it must be encoded while the chip is in `set`.
    /// Only the function-set register carries the selector, every other register is unaffected.
    fn with_instruction_set(self, _set: InstructionSet) -> Self {
        self
    }
}

macro_rules! register {
    ($ty:ident, $name:literal, $set:ident, $opcode:literal, $mask:literal, $slot:ident) => {
        impl Register for $ty {
            const NAME: &'static str = $name;
            const INSTRUCTION_SET: InstructionSet = InstructionSet::$set;
            const OPCODE: u8 = $opcode;
            const OPCODE_MASK: u8 = $mask;

            fn raw(&self) -> u8 {
                self.0
            }

            fn from_raw(raw: u8) -> Self {
                Self(raw)
            }

            fn slot(file: &RegisterFile) -> &Self {
                &file.$slot
            }

            fn slot_mut(file: &mut RegisterFile) -> &mut Self {
                &mut file.$slot
            }
        }
    };
}

// ---- instruction set 0 ------------------------------------------------------------------------

bitfield! {
    /// Display on/off control: `0000_1DCB`
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct DisplayMode(u8);
    impl Debug;
    pub blink_on, set_blink_on: 0;
    pub cursor_on, set_cursor_on: 1;
    pub display_on, set_display_on: 2;
}
register!(DisplayMode, "display-mode", Normal, 0b0000_1000, 0b1111_1000, display_mode);

bitfield! {
    /// Function set: `001 DL N DH 0 IS`
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct FunctionSet(u8);
    impl Debug;
    pub extended_instruction_set, set_extended_instruction_set: 0;
    pub double_height, set_double_height: 2;
    pub two_lines, set_two_lines: 3;
    pub eight_bit_bus, set_eight_bit_bus: 4;
}

impl Register for FunctionSet {
    const NAME: &'static str = "function-set";
    const INSTRUCTION_SET: InstructionSet = InstructionSet::Normal;
    const OPCODE: u8 = 0b0010_0000;
    // bit 1 is a fixed zero
    const OPCODE_MASK: u8 = 0b1110_0010;

    fn raw(&self) -> u8 {
        self.0
    }

    fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    fn slot(file: &RegisterFile) -> &Self {
        &file.function_set
    }

    fn slot_mut(file: &mut RegisterFile) -> &mut Self {
        &mut file.function_set
    }

    fn with_instruction_set(mut self, set: InstructionSet) -> Self {
        self.set_extended_instruction_set(set == InstructionSet::Extended);
        self
    }
}

bitfield! {
    /// Entry mode set: `0000_01 ID S`
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct EntryMode(u8);
    impl Debug;
    pub shift, set_shift: 0;
    pub cursor_right, set_cursor_right: 1;
}
register!(EntryMode, "entry-mode", Normal, 0b0000_0100, 0b1111_1100, entry_mode);

bitfield! {
    /// Cursor or display shift: `0001 SC RL 00`
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct CursorDisplayShift(u8);
    impl Debug;
    pub right, set_right: 2;
    pub display_shift, set_display_shift: 3;
}
register!(
    CursorDisplayShift,
    "cursor-display-shift",
    Normal,
    0b0001_0000,
    0b1111_0011,
    cursor_display_shift
);

// ---- instruction set 1 ------------------------------------------------------------------------

bitfield! {
    /// Bias selection and internal OSC frequency adjust: `0001 BS F2 F1 F0`
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct BiasOscillator(u8);
    impl Debug;
    pub u8, frequency_adjust, set_frequency_adjust: 2, 0;
    pub quarter_bias, set_quarter_bias: 3;
}
register!(BiasOscillator, "bias-osc-frequency", Extended, 0b0001_0000, 0b1111_0000, bias_oscillator);

bitfield! {
    /// Icon RAM address set: `0100 AC3..AC0`
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct IconAddress(u8);
    impl Debug;
    pub u8, address, set_address: 3, 0;
}
register!(IconAddress, "icon-ram-address", Extended, 0b0100_0000, 0b1111_0000, icon_address);

bitfield! {
    /// Power/icon control/contrast set: `0101 Ion Bon C5 C4`
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct PowerIconContrast(u8);
    impl Debug;
    pub u8, contrast_high, set_contrast_high: 1, 0;
    pub booster_on, set_booster_on: 2;
    pub icon_on, set_icon_on: 3;
}
register!(
    PowerIconContrast,
    "power-icon-contrast",
    Extended,
    0b0101_0000,
    0b1111_0000,
    power_icon_contrast
);

bitfield! {
    /// Follower control: `0110 Fon Rab2..Rab0`
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct FollowerControl(u8);
    impl Debug;
    pub u8, amplifier_ratio, set_amplifier_ratio: 2, 0;
    pub follower_on, set_follower_on: 3;
}
register!(FollowerControl, "follower", Extended, 0b0110_0000, 0b1111_0000, follower);

bitfield! {
    /// Contrast set, low nibble: `0111 C3..C0`
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct ContrastLow(u8);
    impl Debug;
    pub u8, contrast_low, set_contrast_low: 3, 0;
}
register!(ContrastLow, "contrast-low", Extended, 0b0111_0000, 0b1111_0000, contrast_low);

/// Default follower amplifier ratio (Rab2..Rab0).
pub const FOLLOWER_RATIO_DEFAULT: u8 = 0b101;
/// Default low nibble of the contrast value.
pub const CONTRAST_LOW_DEFAULT: u8 = 0b1000;

/// In-memory copy of every command register of the chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterFile {
    pub display_mode: DisplayMode,
    pub function_set: FunctionSet,
    pub entry_mode: EntryMode,
    pub cursor_display_shift: CursorDisplayShift,
    pub bias_oscillator: BiasOscillator,
    pub icon_address: IconAddress,
    pub power_icon_contrast: PowerIconContrast,
    pub follower: FollowerControl,
    pub contrast_low: ContrastLow,
}

impl RegisterFile {
    /// Register values established by the initialization sequence. The booster is only needed
    /// when the module runs from a 3.3 V supply.
    pub fn power_on_defaults(supply: SupplyVoltage) -> Self {
        let mut power_icon_contrast = PowerIconContrast(0b0101_0000);
        power_icon_contrast.set_booster_on(supply.booster_required());

        let mut follower = FollowerControl(0b0110_0000);
        follower.set_follower_on(true);
        follower.set_amplifier_ratio(FOLLOWER_RATIO_DEFAULT);

        let mut contrast_low = ContrastLow(0b0111_0000);
        contrast_low.set_contrast_low(CONTRAST_LOW_DEFAULT);

        Self {
            // display on, cursor off, blink off
            display_mode: DisplayMode(0b0000_1100),
            // 8 bit bus, two lines, single height, IS0
            function_set: FunctionSet(0b0011_1000),
            // cursor moves right, no display shift
            entry_mode: EntryMode(0b0000_0110),
            cursor_display_shift: CursorDisplayShift(0b0001_1100),
            // 1/5 bias, F = 4
            bias_oscillator: BiasOscillator(0b0001_0100),
            icon_address: IconAddress(0b0100_0000),
            power_icon_contrast,
            follower,
            contrast_low,
        }
    }

    /// The 6-bit contrast value composed from its two halves.
    pub fn contrast(&self) -> u8 {
        (self.power_icon_contrast.contrast_high() << 4) | self.contrast_low.contrast_low()
    }

    pub fn get<R: Register>(&self) -> R {
        *R::slot(self)
    }

    pub fn set<R: Register>(&mut self, value: R) {
        *R::slot_mut(self) = value;
    }
}
