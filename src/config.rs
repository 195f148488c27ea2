use crate::register::{
    Comparator, ConfigFields, ConfigWord, DataRate, Gain, Mode, Mux, OperationalStatus,
};

/// How a single-shot acquisition waits for the end of the conversion
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConversionWait {
    /// Sleep for the nominal conversion time plus the data rate tolerance
    #[default]
    Delay,
    /// Poll the OS bit of the config register. Polling gives up after twice the nominal
    /// conversion time and the conversion register is read regardless.
    PollReady,
}

/// User facing acquisition settings. The multiplexer, mode and OS fields are owned by the
/// acquisition paths and filled in per request.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdcConfig {
    pub gain: Gain,
    pub data_rate: DataRate,
    pub comparator: Comparator,
    pub wait: ConversionWait,
}

impl AdcConfig {
    pub fn with_gain(mut self, gain: Gain) -> Self {
        self.gain = gain;
        self
    }

    pub fn with_data_rate(mut self, data_rate: DataRate) -> Self {
        self.data_rate = data_rate;
        self
    }

    pub fn with_comparator(mut self, comparator: Comparator) -> Self {
        self.comparator = comparator;
        self
    }

    pub fn with_wait(mut self, wait: ConversionWait) -> Self {
        self.wait = wait;
        self
    }

    /// Config word starting a single conversion on `mux`
    pub fn single_shot_word(&self, mux: Mux) -> ConfigWord {
        self.word(mux, Mode::SingleShot, OperationalStatus::StartConversion)
    }

    /// Config word putting the device into continuous conversion on `mux`
    pub fn continuous_word(&self, mux: Mux) -> ConfigWord {
        self.word(mux, Mode::Continuous, OperationalStatus::NoEffect)
    }

    /// Config word for single-shot mode without starting a conversion
    pub fn idle_word(&self, mux: Mux) -> ConfigWord {
        self.word(mux, Mode::SingleShot, OperationalStatus::NoEffect)
    }

    fn word(&self, mux: Mux, mode: Mode, os: OperationalStatus) -> ConfigWord {
        ConfigWord::assemble(&ConfigFields {
            os,
            mux,
            gain: self.gain,
            mode,
            data_rate: self.data_rate,
            comparator: self.comparator,
        })
    }
}
