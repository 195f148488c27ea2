//! Gain table and scaled conversion results
use crate::{register::Gain, Variant};

/// One row of the gain table
#[derive(Debug, PartialEq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GainEntry {
    pub gain: Gain,
    /// Full-scale range in volts. The input range is ± this value.
    pub full_scale: f32,
    pub volts_per_bit: f32,
}

impl Gain {
    pub const fn full_scale_volts(self) -> f32 {
        match self {
            Gain::Fsr6v144 => 6.144,
            Gain::Fsr4v096 => 4.096,
            Gain::Fsr2v048 => 2.048,
            Gain::Fsr1v024 => 1.024,
            Gain::Fsr0v512 => 0.512,
            Gain::Fsr0v256 => 0.256,
        }
    }

    /// Size of one LSB in volts for the given device variant
    #[inline]
    pub fn volts_per_bit<V: Variant>(self) -> f32 {
        self.full_scale_volts() / (1u32 << (V::RESOLUTION_BITS - 1)) as f32
    }

    pub fn entry<V: Variant>(self) -> GainEntry {
        GainEntry {
            gain: self,
            full_scale: self.full_scale_volts(),
            volts_per_bit: self.volts_per_bit::<V>(),
        }
    }
}

pub fn gain_table<V: Variant>() -> [GainEntry; 6] {
    Gain::ALL.map(Gain::entry::<V>)
}

/// Raw conversion result together with the scale that was in force when it was taken
#[derive(Debug, PartialEq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConversionSample {
    raw: i16,
    volts_per_bit: f32,
}

impl ConversionSample {
    #[inline]
    pub const fn new(raw: i16, volts_per_bit: f32) -> Self {
        Self { raw, volts_per_bit }
    }

    #[inline]
    pub const fn raw(&self) -> i16 {
        self.raw
    }

    #[inline]
    pub const fn volts_per_bit(&self) -> f32 {
        self.volts_per_bit
    }

    #[inline]
    pub fn volts(&self) -> f32 {
        self.raw as f32 * self.volts_per_bit
    }
}
