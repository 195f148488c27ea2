//! Register map and config word model of the ADS1x15 devices.
//!
//! The config register is a single 16-bit word made of independent bitfields:
//!
//! ```text
//!  15 | 14:12 | 11:9 |  8   | 7:5 |     4     |    3     |    2     |   1:0
//!  OS |  MUX  | PGA  | MODE | DR  | COMP_MODE | COMP_POL | COMP_LAT | COMP_QUE
//! ```
//!
//! Everything in here is pure data, no bus access takes place.

//==================================================================================================
// Register addresses
//==================================================================================================

/// Register pointer addresses
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    Conversion = 0b00,
    Config = 0b01,
    LoThresh = 0b10,
    HiThresh = 0b11,
}

impl Register {
    #[inline]
    pub const fn addr(self) -> u8 {
        self as u8
    }
}

const OS_SHIFT: u16 = 15;
const MUX_SHIFT: u16 = 12;
const PGA_SHIFT: u16 = 9;
const MODE_SHIFT: u16 = 8;
const DR_SHIFT: u16 = 5;
const COMP_MODE_SHIFT: u16 = 4;
const COMP_POL_SHIFT: u16 = 3;
const COMP_LAT_SHIFT: u16 = 2;
const COMP_QUE_SHIFT: u16 = 0;

const OS_MASK: u16 = 0b1 << OS_SHIFT;
const MUX_MASK: u16 = 0b111 << MUX_SHIFT;
const PGA_MASK: u16 = 0b111 << PGA_SHIFT;
const MODE_MASK: u16 = 0b1 << MODE_SHIFT;
const DR_MASK: u16 = 0b111 << DR_SHIFT;

//==================================================================================================
// Fields
//==================================================================================================

/// Operational status bit.
///
/// On writes, [OperationalStatus::StartConversion] starts a single conversion when the device is
/// in power-down state. On reads the bit is cleared while a conversion is in progress and set
/// while the device is idle.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperationalStatus {
    NoEffect = 0b0,
    #[default]
    StartConversion = 0b1,
}

/// Input multiplexer configuration
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mux {
    /// AINp = AIN0, AINn = AIN1
    #[default]
    DiffP0N1 = 0b000,
    /// AINp = AIN0, AINn = AIN3
    DiffP0N3 = 0b001,
    /// AINp = AIN1, AINn = AIN3
    DiffP1N3 = 0b010,
    /// AINp = AIN2, AINn = AIN3
    DiffP2N3 = 0b011,
    /// AIN0 against GND
    SingleA0 = 0b100,
    SingleA1 = 0b101,
    SingleA2 = 0b110,
    SingleA3 = 0b111,
}

impl Mux {
    pub const fn from_code(code: u16) -> Self {
        match code & 0b111 {
            0b000 => Self::DiffP0N1,
            0b001 => Self::DiffP0N3,
            0b010 => Self::DiffP1N3,
            0b011 => Self::DiffP2N3,
            0b100 => Self::SingleA0,
            0b101 => Self::SingleA1,
            0b110 => Self::SingleA2,
            _ => Self::SingleA3,
        }
    }

    /// The single-ended channel this mux code routes to the converter, if any
    pub const fn channel(self) -> Option<Channel> {
        match self {
            Self::SingleA0 => Some(Channel::A0),
            Self::SingleA1 => Some(Channel::A1),
            Self::SingleA2 => Some(Channel::A2),
            Self::SingleA3 => Some(Channel::A3),
            _ => None,
        }
    }
}

/// Programmable gain amplifier setting, named after its full-scale range.
///
/// The codes `0b110` and `0b111` are aliases of [Gain::Fsr0v256] on the device and decode to it.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Gain {
    /// ±6.144 V
    Fsr6v144 = 0b000,
    /// ±4.096 V
    Fsr4v096 = 0b001,
    /// ±2.048 V, power-on default
    #[default]
    Fsr2v048 = 0b010,
    /// ±1.024 V
    Fsr1v024 = 0b011,
    /// ±0.512 V
    Fsr0v512 = 0b100,
    /// ±0.256 V
    Fsr0v256 = 0b101,
}

impl Gain {
    pub const ALL: [Gain; 6] = [
        Gain::Fsr6v144,
        Gain::Fsr4v096,
        Gain::Fsr2v048,
        Gain::Fsr1v024,
        Gain::Fsr0v512,
        Gain::Fsr0v256,
    ];

    pub const fn from_code(code: u16) -> Self {
        match code & 0b111 {
            0b000 => Self::Fsr6v144,
            0b001 => Self::Fsr4v096,
            0b010 => Self::Fsr2v048,
            0b011 => Self::Fsr1v024,
            0b100 => Self::Fsr0v512,
            _ => Self::Fsr0v256,
        }
    }
}

/// Device operating mode
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    Continuous = 0b0,
    /// Single-shot mode or power-down state
    #[default]
    SingleShot = 0b1,
}

/// Data rate code. The sample rate behind each code depends on the device variant:
///
/// | code | ADS1115 | ADS1015  |
/// |------|---------|----------|
/// | Dr0  | 8 SPS   | 128 SPS  |
/// | Dr1  | 16 SPS  | 250 SPS  |
/// | Dr2  | 32 SPS  | 490 SPS  |
/// | Dr3  | 64 SPS  | 920 SPS  |
/// | Dr4  | 128 SPS | 1600 SPS |
/// | Dr5  | 250 SPS | 2400 SPS |
/// | Dr6  | 475 SPS | 3300 SPS |
/// | Dr7  | 860 SPS | 3300 SPS |
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataRate {
    Dr0 = 0b000,
    Dr1 = 0b001,
    Dr2 = 0b010,
    Dr3 = 0b011,
    #[default]
    Dr4 = 0b100,
    Dr5 = 0b101,
    Dr6 = 0b110,
    Dr7 = 0b111,
}

impl DataRate {
    pub const fn from_code(code: u16) -> Self {
        match code & 0b111 {
            0b000 => Self::Dr0,
            0b001 => Self::Dr1,
            0b010 => Self::Dr2,
            0b011 => Self::Dr3,
            0b100 => Self::Dr4,
            0b101 => Self::Dr5,
            0b110 => Self::Dr6,
            _ => Self::Dr7,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ComparatorMode {
    #[default]
    Traditional = 0b0,
    Window = 0b1,
}

/// Polarity of the ALERT/RDY pin
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ComparatorPolarity {
    #[default]
    ActiveLow = 0b0,
    ActiveHigh = 0b1,
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ComparatorLatching {
    #[default]
    NonLatching = 0b0,
    Latching = 0b1,
}

/// Number of successive conversions exceeding a threshold before ALERT/RDY is asserted
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ComparatorQueue {
    AssertAfterOne = 0b00,
    AssertAfterTwo = 0b01,
    AssertAfterFour = 0b10,
    /// Comparator disabled, ALERT/RDY in high impedance
    #[default]
    Disabled = 0b11,
}

/// Comparator fields. They are not touched by the acquisition paths and carried through
/// unchanged on every config write.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Comparator {
    pub mode: ComparatorMode,
    pub polarity: ComparatorPolarity,
    pub latching: ComparatorLatching,
    pub queue: ComparatorQueue,
}

/// Single-ended input channel
#[derive(Debug, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Channel {
    A0 = 0,
    A1 = 1,
    A2 = 2,
    A3 = 3,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::A0, Channel::A1, Channel::A2, Channel::A3];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn mux(self) -> Mux {
        match self {
            Self::A0 => Mux::SingleA0,
            Self::A1 => Mux::SingleA1,
            Self::A2 => Mux::SingleA2,
            Self::A3 => Mux::SingleA3,
        }
    }
}

impl TryFrom<u8> for Channel {
    type Error = crate::AdcError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::A0),
            1 => Ok(Self::A1),
            2 => Ok(Self::A2),
            3 => Ok(Self::A3),
            _ => Err(crate::AdcError::InvalidChannel),
        }
    }
}

//==================================================================================================
// Config word
//==================================================================================================

/// All fields of the config register
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigFields {
    pub os: OperationalStatus,
    pub mux: Mux,
    pub gain: Gain,
    pub mode: Mode,
    pub data_rate: DataRate,
    pub comparator: Comparator,
}

impl Default for ConfigFields {
    /// Power-on reset state, `0x8583`
    fn default() -> Self {
        Self {
            os: OperationalStatus::StartConversion,
            mux: Mux::DiffP0N1,
            gain: Gain::Fsr2v048,
            mode: Mode::SingleShot,
            data_rate: DataRate::Dr4,
            comparator: Comparator::default(),
        }
    }
}

/// Packed value of the config register
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigWord(u16);

impl ConfigWord {
    #[inline]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn assemble(fields: &ConfigFields) -> Self {
        let cmp = &fields.comparator;
        Self(
            ((fields.os as u16) << OS_SHIFT)
                | ((fields.mux as u16) << MUX_SHIFT)
                | ((fields.gain as u16) << PGA_SHIFT)
                | ((fields.mode as u16) << MODE_SHIFT)
                | ((fields.data_rate as u16) << DR_SHIFT)
                | ((cmp.mode as u16) << COMP_MODE_SHIFT)
                | ((cmp.polarity as u16) << COMP_POL_SHIFT)
                | ((cmp.latching as u16) << COMP_LAT_SHIFT)
                | ((cmp.queue as u16) << COMP_QUE_SHIFT),
        )
    }

    pub const fn decompose(self) -> ConfigFields {
        let w = self.0;
        ConfigFields {
            os: if w & OS_MASK != 0 {
                OperationalStatus::StartConversion
            } else {
                OperationalStatus::NoEffect
            },
            mux: Mux::from_code(w >> MUX_SHIFT),
            gain: Gain::from_code(w >> PGA_SHIFT),
            mode: if w & MODE_MASK != 0 {
                Mode::SingleShot
            } else {
                Mode::Continuous
            },
            data_rate: DataRate::from_code(w >> DR_SHIFT),
            comparator: Comparator {
                mode: if (w >> COMP_MODE_SHIFT) & 1 != 0 {
                    ComparatorMode::Window
                } else {
                    ComparatorMode::Traditional
                },
                polarity: if (w >> COMP_POL_SHIFT) & 1 != 0 {
                    ComparatorPolarity::ActiveHigh
                } else {
                    ComparatorPolarity::ActiveLow
                },
                latching: if (w >> COMP_LAT_SHIFT) & 1 != 0 {
                    ComparatorLatching::Latching
                } else {
                    ComparatorLatching::NonLatching
                },
                queue: match (w >> COMP_QUE_SHIFT) & 0b11 {
                    0b00 => ComparatorQueue::AssertAfterOne,
                    0b01 => ComparatorQueue::AssertAfterTwo,
                    0b10 => ComparatorQueue::AssertAfterFour,
                    _ => ComparatorQueue::Disabled,
                },
            },
        }
    }

    #[inline]
    pub const fn with_os(self, os: OperationalStatus) -> Self {
        Self((self.0 & !OS_MASK) | ((os as u16) << OS_SHIFT))
    }

    #[inline]
    pub const fn with_mux(self, mux: Mux) -> Self {
        Self((self.0 & !MUX_MASK) | ((mux as u16) << MUX_SHIFT))
    }

    #[inline]
    pub const fn with_mode(self, mode: Mode) -> Self {
        Self((self.0 & !MODE_MASK) | ((mode as u16) << MODE_SHIFT))
    }

    #[inline]
    pub const fn with_gain(self, gain: Gain) -> Self {
        Self((self.0 & !PGA_MASK) | ((gain as u16) << PGA_SHIFT))
    }

    #[inline]
    pub const fn with_data_rate(self, data_rate: DataRate) -> Self {
        Self((self.0 & !DR_MASK) | ((data_rate as u16) << DR_SHIFT))
    }

    /// Only meaningful for words read back from the device
    #[inline]
    pub const fn conversion_in_progress(self) -> bool {
        self.0 & OS_MASK == 0
    }
}

impl From<ConfigFields> for ConfigWord {
    fn from(fields: ConfigFields) -> Self {
        Self::assemble(&fields)
    }
}
