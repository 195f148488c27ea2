//! Register sequences for the acquisition paths.
//!
//! These functions only talk to the transport. Arbitration between callers is up to the owner
//! of the bus, see the `sampling` module for the threaded engine doing this.
use embedded_hal::delay::DelayNs;

use crate::{
    config::{AdcConfig, ConversionWait},
    error::Error,
    interface::RegisterInterface,
    register::{ConfigWord, DataRate, Gain, Mux, Register},
    scale::ConversionSample,
    Variant,
};

/// Sleep between two conversion-ready polls
pub const POLL_INTERVAL_US: u32 = 100;

/// Nominal duration of one conversion, rounded up to whole microseconds
#[inline]
pub fn conversion_time_us<V: Variant>(data_rate: DataRate) -> u32 {
    let sps = V::samples_per_second(data_rate) as u32;
    1_000_000_u32.div_ceil(sps)
}

/// Conversion time plus the 10 % data rate tolerance of the internal oscillator
#[inline]
fn settle_time_us<V: Variant>(data_rate: DataRate) -> u32 {
    let t = conversion_time_us::<V>(data_rate);
    t + t / 10 + 50
}

/// Upper bound of conversion-ready polls before the result is read regardless
#[inline]
fn max_polls<V: Variant>(data_rate: DataRate) -> u32 {
    (2 * conversion_time_us::<V>(data_rate)).div_ceil(POLL_INTERVAL_US)
}

/// Longest time a [single_shot] acquisition waits for its conversion with the given settings
pub fn single_shot_time_us<V: Variant>(cfg: &AdcConfig) -> u32 {
    match cfg.wait {
        ConversionWait::Delay => settle_time_us::<V>(cfg.data_rate),
        ConversionWait::PollReady => max_polls::<V>(cfg.data_rate) * POLL_INTERVAL_US,
    }
}

/// Check the OS bit of the config register
pub fn poll_ready<IF: RegisterInterface>(bus: &mut IF) -> nb::Result<(), Error<IF::Error>> {
    let word = ConfigWord::from_bits(
        bus.read_register(Register::Config)
            .map_err(Error::Transport)?,
    );
    if word.conversion_in_progress() {
        return Err(nb::Error::WouldBlock);
    }
    Ok(())
}

fn wait_for_conversion<IF, V, D>(
    bus: &mut IF,
    cfg: &AdcConfig,
    delay: &mut D,
) -> Result<(), Error<IF::Error>>
where
    IF: RegisterInterface,
    V: Variant,
    D: DelayNs,
{
    match cfg.wait {
        ConversionWait::Delay => {
            delay.delay_us(settle_time_us::<V>(cfg.data_rate));
            Ok(())
        }
        ConversionWait::PollReady => {
            let max_polls = max_polls::<V>(cfg.data_rate);
            for _ in 0..max_polls {
                match poll_ready(bus) {
                    Ok(()) => return Ok(()),
                    Err(nb::Error::WouldBlock) => delay.delay_us(POLL_INTERVAL_US),
                    Err(nb::Error::Other(e)) => return Err(e),
                }
            }
            log::warn!("conversion not finished after {} polls, reading anyway", max_polls);
            Ok(())
        }
    }
}

/// Start a single conversion on `mux`, wait for it and read back the scaled result
pub fn single_shot<IF, V, D>(
    bus: &mut IF,
    cfg: &AdcConfig,
    mux: Mux,
    delay: &mut D,
) -> Result<ConversionSample, Error<IF::Error>>
where
    IF: RegisterInterface,
    V: Variant,
    D: DelayNs,
{
    let word = cfg.single_shot_word(mux);
    bus.write_register(Register::Config, word.bits())
        .map_err(Error::Transport)?;
    wait_for_conversion::<IF, V, D>(bus, cfg, delay)?;
    read_latest::<IF, V>(bus, cfg.gain)
}

/// Read the conversion register without touching the configuration
pub fn read_latest<IF, V>(bus: &mut IF, gain: Gain) -> Result<ConversionSample, Error<IF::Error>>
where
    IF: RegisterInterface,
    V: Variant,
{
    let raw = bus
        .read_register(Register::Conversion)
        .map_err(Error::Transport)?;
    Ok(ConversionSample::new(V::decode(raw), gain.volts_per_bit::<V>()))
}

/// Put the device into continuous conversion mode on `mux`
pub fn start_continuous<IF: RegisterInterface>(
    bus: &mut IF,
    cfg: &AdcConfig,
    mux: Mux,
) -> Result<(), Error<IF::Error>> {
    let word = cfg.continuous_word(mux);
    log::debug!("config <- {:#06x} (continuous)", word.bits());
    bus.write_register(Register::Config, word.bits())
        .map_err(Error::Transport)
}

/// Return to single-shot mode without starting a conversion. The device powers down.
pub fn power_down<IF: RegisterInterface>(
    bus: &mut IF,
    cfg: &AdcConfig,
    mux: Mux,
) -> Result<(), Error<IF::Error>> {
    let word = cfg.idle_word(mux);
    log::debug!("config <- {:#06x} (power-down)", word.bits());
    bus.write_register(Register::Config, word.bits())
        .map_err(Error::Transport)
}

/// Write the comparator thresholds, given in raw conversion codes
pub fn write_thresholds<IF, V>(bus: &mut IF, low: i16, high: i16) -> Result<(), Error<IF::Error>>
where
    IF: RegisterInterface,
    V: Variant,
{
    bus.write_register(Register::LoThresh, V::encode(low))
        .map_err(Error::Transport)?;
    bus.write_register(Register::HiThresh, V::encode(high))
        .map_err(Error::Transport)
}

/// Turn the ALERT/RDY pin into a conversion-ready signal. The comparator queue must not be
/// [crate::register::ComparatorQueue::Disabled] for the pin to be driven.
pub fn enable_conversion_ready_pin<IF: RegisterInterface>(
    bus: &mut IF,
) -> Result<(), Error<IF::Error>> {
    bus.write_register(Register::HiThresh, 0x8000)
        .map_err(Error::Transport)?;
    bus.write_register(Register::LoThresh, 0x0000)
        .map_err(Error::Transport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{register::Mode, Ads1015, Ads1115};

    #[derive(Default)]
    struct FakeRegs {
        regs: [u16; 4],
        writes: usize,
        busy_polls: u32,
        config_reads: u32,
        fail: bool,
    }

    impl RegisterInterface for FakeRegs {
        type Error = ();

        fn write_register(&mut self, register: Register, word: u16) -> Result<(), ()> {
            if self.fail {
                return Err(());
            }
            self.writes += 1;
            self.regs[register.addr() as usize] = word;
            Ok(())
        }

        fn read_register(&mut self, register: Register) -> Result<u16, ()> {
            if self.fail {
                return Err(());
            }
            let word = self.regs[register.addr() as usize];
            if register == Register::Config {
                self.config_reads += 1;
                if self.busy_polls > 0 {
                    self.busy_polls -= 1;
                    return Ok(word & 0x7FFF);
                }
                return Ok(word | 0x8000);
            }
            Ok(word)
        }
    }

    #[derive(Default)]
    struct CountingDelay {
        total_ns: u64,
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += ns as u64;
        }
    }

    #[test]
    fn conversion_times() {
        assert_eq!(conversion_time_us::<Ads1115>(DataRate::Dr0), 125_000);
        assert_eq!(conversion_time_us::<Ads1115>(DataRate::Dr4), 7_813);
        assert_eq!(conversion_time_us::<Ads1115>(DataRate::Dr7), 1_163);
        assert_eq!(conversion_time_us::<Ads1015>(DataRate::Dr7), 304);
    }

    #[test]
    fn single_shot_time_covers_the_wait() {
        let cfg = AdcConfig::default();
        assert_eq!(single_shot_time_us::<Ads1115>(&cfg), 7_813 + 781 + 50);
        let polled = cfg.with_wait(ConversionWait::PollReady);
        assert_eq!(single_shot_time_us::<Ads1115>(&polled), 15_700);
        let fast = polled.with_data_rate(DataRate::Dr7);
        assert_eq!(single_shot_time_us::<Ads1115>(&fast), 24 * POLL_INTERVAL_US);
    }

    #[test]
    fn single_shot_with_delay() {
        let mut bus = FakeRegs::default();
        bus.regs[0] = 8000;
        let mut delay = CountingDelay::default();
        let cfg = AdcConfig::default().with_gain(Gain::Fsr4v096);

        let sample = single_shot::<_, Ads1115, _>(&mut bus, &cfg, Mux::SingleA2, &mut delay).unwrap();
        assert_eq!(sample.raw(), 8000);
        assert!((sample.volts() - 1.0).abs() < 1e-6);
        assert_eq!(bus.writes, 1);
        let written = ConfigWord::from_bits(bus.regs[1]).decompose();
        assert_eq!(written.mux, Mux::SingleA2);
        assert_eq!(written.mode, Mode::SingleShot);
        // 7813 us conversion plus tolerance
        assert_eq!(delay.total_ns, (7813 + 781 + 50) * 1000);
        assert_eq!(bus.config_reads, 0);
    }

    #[test]
    fn single_shot_polls_until_ready() {
        let mut bus = FakeRegs {
            busy_polls: 3,
            ..Default::default()
        };
        bus.regs[0] = 0xFFF0;
        let mut delay = CountingDelay::default();
        let cfg = AdcConfig::default().with_wait(ConversionWait::PollReady);

        let sample = single_shot::<_, Ads1015, _>(&mut bus, &cfg, Mux::DiffP0N1, &mut delay).unwrap();
        assert_eq!(sample.raw(), -1);
        assert_eq!(bus.config_reads, 4);
        assert_eq!(delay.total_ns, 3 * POLL_INTERVAL_US as u64 * 1000);
    }

    #[test]
    fn polling_is_bounded() {
        let mut bus = FakeRegs {
            busy_polls: u32::MAX,
            ..Default::default()
        };
        let mut delay = CountingDelay::default();
        let cfg = AdcConfig::default()
            .with_wait(ConversionWait::PollReady)
            .with_data_rate(DataRate::Dr7);

        single_shot::<_, Ads1115, _>(&mut bus, &cfg, Mux::SingleA0, &mut delay).unwrap();
        // 2 * 1163 us in 100 us steps
        assert_eq!(bus.config_reads, 24);
    }

    #[test]
    fn transport_fault_propagates() {
        let mut bus = FakeRegs {
            fail: true,
            ..Default::default()
        };
        let mut delay = CountingDelay::default();
        let res =
            single_shot::<_, Ads1115, _>(&mut bus, &AdcConfig::default(), Mux::SingleA0, &mut delay);
        assert!(matches!(res, Err(Error::Transport(()))));
        assert_eq!(delay.total_ns, 0);
    }

    #[test]
    fn continuous_and_power_down_words() {
        let mut bus = FakeRegs::default();
        let cfg = AdcConfig::default();
        start_continuous(&mut bus, &cfg, Mux::SingleA1).unwrap();
        let fields = ConfigWord::from_bits(bus.regs[1]).decompose();
        assert_eq!(fields.mode, Mode::Continuous);
        assert_eq!(fields.mux, Mux::SingleA1);

        power_down(&mut bus, &cfg, Mux::SingleA1).unwrap();
        assert_eq!(bus.regs[1], 0x5583);
    }

    #[test]
    fn threshold_encoding() {
        let mut bus = FakeRegs::default();
        write_thresholds::<_, Ads1015>(&mut bus, -2, 100).unwrap();
        assert_eq!(bus.regs[2], 0xFFE0);
        assert_eq!(bus.regs[3], 100 << 4);

        write_thresholds::<_, Ads1115>(&mut bus, -2, 100).unwrap();
        assert_eq!(bus.regs[2], 0xFFFE);
        assert_eq!(bus.regs[3], 100);

        enable_conversion_ready_pin(&mut bus).unwrap();
        assert_eq!(bus.regs[3], 0x8000);
        assert_eq!(bus.regs[2], 0x0000);
    }
}
