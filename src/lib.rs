//! Type-Safe API and sampling engine for the ADS1115 and ADS1015 ADC devices
//!
//! ## Usage
//!
//! The devices are accessed through a [RegisterInterface]. For I2C buses implementing the
//! [embedded_hal::i2c::I2c] trait, the [I2cInterface] can be used directly.
//!
//! With the `std` feature (enabled by default), the [Ads1x15] engine can be created with
//! [`Ads1x15::ads1115`], [`Ads1x15::ads1015`] or [`Ads1x15::new`] for a custom [AdcConfig].
//! It offers single-shot reads as well as two continuous sampling modes:
//!
//!  - [`Ads1x15::start_fast`] converts one channel continuously and polls the result
//!  - [`Ads1x15::start_slow`] cycles through all channels with a registered observer using
//!    single-shot conversions
//!
//! Changes are reported to per-channel observers registered with [`Ads1x15::set_observer`].
//!
//! Without `std`, the register model in [register] and the register sequences in
//! [acquisition] can be used to build a custom driver.
//!
//! ## Example
//!
//! ```ignore
//! let iface = I2cInterface::new(i2c, SlaveAddr::Gnd);
//! let mut adc = Ads1x15::new(iface, AdcConfig::default().with_gain(Gain::Fsr4v096));
//! let sample = adc.read_channel(Channel::A0)?;
//! adc.set_observer(Channel::A0, Some(Box::new(|volts| println!("{volts} V"))));
//! adc.start_fast(Channel::A0, 0.05, Duration::from_millis(10))?;
//! ```
#![cfg_attr(not(feature = "std"), no_std)]

pub mod acquisition;
pub mod config;
pub mod error;
pub mod interface;
pub mod register;
pub mod scale;
#[cfg(feature = "std")]
pub mod sampling;

pub use config::{AdcConfig, ConversionWait};
pub use error::{AdcError, Error};
pub use interface::{I2cInterface, RegisterInterface, SlaveAddr};
pub use register::{Channel, DataRate, Gain, Mux};
pub use scale::ConversionSample;
#[cfg(feature = "std")]
pub use sampling::{Ads1x15, Observer, SessionState};

//==================================================================================================
// Type-level support
//==================================================================================================

/// Device specific properties. Everything else, including the register map, is shared by the
/// device family.
pub trait Variant: private::Sealed + Send + Sync + 'static {
    const NAME: &'static str;
    const RESOLUTION_BITS: u8;
    /// Samples per second for each data rate code
    const DATA_RATES: [u16; 8];

    /// Conversion register content to a right-justified two's complement code
    fn decode(raw: u16) -> i16;
    /// Right-justified code to the threshold register layout
    fn encode(code: i16) -> u16;

    #[inline]
    fn samples_per_second(data_rate: DataRate) -> u16 {
        Self::DATA_RATES[data_rate as usize]
    }
}

/// 16-bit device, 8 SPS to 860 SPS
#[derive(Debug, Default, Clone, Copy)]
pub struct Ads1115;

/// 12-bit device, 128 SPS to 3300 SPS. Results are left-justified in the 16-bit registers.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ads1015;

impl private::Sealed for Ads1115 {}
impl Variant for Ads1115 {
    const NAME: &'static str = "ADS1115";
    const RESOLUTION_BITS: u8 = 16;
    const DATA_RATES: [u16; 8] = [8, 16, 32, 64, 128, 250, 475, 860];

    #[inline]
    fn decode(raw: u16) -> i16 {
        raw as i16
    }

    #[inline]
    fn encode(code: i16) -> u16 {
        code as u16
    }
}

impl private::Sealed for Ads1015 {}
impl Variant for Ads1015 {
    const NAME: &'static str = "ADS1015";
    const RESOLUTION_BITS: u8 = 12;
    const DATA_RATES: [u16; 8] = [128, 250, 490, 920, 1600, 2400, 3300, 3300];

    #[inline]
    fn decode(raw: u16) -> i16 {
        // Arithmetic shift keeps the sign
        (raw as i16) >> 4
    }

    #[inline]
    fn encode(code: i16) -> u16 {
        (code << 4) as u16
    }
}

mod private {
    pub trait Sealed {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ads1015_codes_are_left_justified() {
        assert_eq!(Ads1015::decode(0x7FF0), 2047);
        assert_eq!(Ads1015::decode(0x8000), -2048);
        assert_eq!(Ads1015::decode(0xFFF0), -1);
        assert_eq!(Ads1015::encode(-1), 0xFFF0);
        assert_eq!(Ads1015::encode(2047), 0x7FF0);
    }

    #[test]
    fn ads1115_codes_are_twos_complement() {
        assert_eq!(Ads1115::decode(0x7FFF), i16::MAX);
        assert_eq!(Ads1115::decode(0x8000), i16::MIN);
        assert_eq!(Ads1115::encode(-2), 0xFFFE);
    }

    #[test]
    fn data_rate_tables() {
        assert_eq!(Ads1115::samples_per_second(DataRate::Dr0), 8);
        assert_eq!(Ads1115::samples_per_second(DataRate::Dr7), 860);
        assert_eq!(Ads1015::samples_per_second(DataRate::Dr4), 1600);
        assert_eq!(Ads1015::samples_per_second(DataRate::Dr7), 3300);
    }
}
