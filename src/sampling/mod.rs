//! Threaded sampling engine.
//!
//! [Ads1x15] owns the register interface of one device and arbitrates between the three ways of
//! acquiring data:
//!
//!  - Single-shot reads, executed synchronously on the caller's thread
//!    ([Ads1x15::read_channel], [Ads1x15::read_mux])
//!  - Fast mode, one channel with the device in continuous conversion mode, polled by a worker
//!    thread ([Ads1x15::start_fast])
//!  - Slow mode, round-robin single-shot conversions over all channels with a registered
//!    observer, performed by a worker thread ([Ads1x15::start_slow])
//!
//! While a sampling session is running it owns the device registers. Single-shot reads and
//! register writes fail with [AdcError::DeviceBusy] and starting a second session fails with
//! [AdcError::AlreadyRunning]. These checks happen before any bus access.
//!
//! Readings are passed to the observer of their channel, see [Ads1x15::set_observer], but only
//! if they differ from the last reported value of that channel by more than the session
//! threshold. The first reading of a channel is always reported.
//!
//! A transport fault during a session ends the session. [Ads1x15::state] then returns
//! [SessionState::Faulted] until the fault is collected with [Ads1x15::take_fault] or a new
//! session is started.
use core::{fmt::Debug, marker::PhantomData};
use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    thread,
    time::Duration,
};

use embedded_hal::delay::DelayNs;

use crate::{
    acquisition,
    config::AdcConfig,
    error::{AdcError, Error},
    interface::RegisterInterface,
    register::{Channel, ConfigWord, Mux, Register},
    scale::ConversionSample,
    Ads1015, Ads1115, Variant,
};

mod observer;
mod worker;

pub use observer::{ChangeDetector, Observer};
use observer::ObserverTable;
use worker::{ExclusivityToken, Exit, Worker};

/// [DelayNs] implementation sleeping the current thread
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(ns.into()));
    }
}

/// Externally visible state of the sampling engine
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SessionState {
    Idle,
    Fast(Channel),
    Slow,
    /// The last session was terminated by a transport fault
    Faulted,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum SessionKind {
    Fast(Channel),
    Slow,
}

struct Session<E> {
    kind: SessionKind,
    worker: Worker<Error<E>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn invalid_frequency(requested: Duration, minimum: Duration) -> AdcError {
    AdcError::InvalidFrequency {
        requested_us: u64::try_from(requested.as_micros()).unwrap_or(u64::MAX),
        minimum_us: u64::try_from(minimum.as_micros()).unwrap_or(u64::MAX),
    }
}

//==================================================================================================
// Engine
//==================================================================================================

pub struct Ads1x15<IF: RegisterInterface, V: Variant = Ads1115> {
    bus: Arc<Mutex<IF>>,
    observers: Arc<Mutex<ObserverTable>>,
    token: ExclusivityToken,
    config: AdcConfig,
    session: Option<Session<IF::Error>>,
    fault: Option<Error<IF::Error>>,
    variant: PhantomData<V>,
}

impl<IF> Ads1x15<IF, Ads1115>
where
    IF: RegisterInterface + Send + 'static,
    IF::Error: Debug + Send + 'static,
{
    pub fn ads1115(interface: IF) -> Self {
        Self::new(interface, AdcConfig::default())
    }
}

impl<IF> Ads1x15<IF, Ads1015>
where
    IF: RegisterInterface + Send + 'static,
    IF::Error: Debug + Send + 'static,
{
    pub fn ads1015(interface: IF) -> Self {
        Self::new(interface, AdcConfig::default())
    }
}

impl<IF, V> Ads1x15<IF, V>
where
    IF: RegisterInterface + Send + 'static,
    IF::Error: Debug + Send + 'static,
    V: Variant,
{
    /// Create the engine. No register access takes place until the first request.
    pub fn new(interface: IF, config: AdcConfig) -> Self {
        Self {
            bus: Arc::new(Mutex::new(interface)),
            observers: Arc::default(),
            token: ExclusivityToken::default(),
            config,
            session: None,
            fault: None,
            variant: PhantomData,
        }
    }

    #[inline]
    pub fn config(&self) -> &AdcConfig {
        &self.config
    }

    /// Replace the acquisition settings. They are applied with the next config register write.
    pub fn set_config(&mut self, config: AdcConfig) -> Result<(), AdcError> {
        if self.token.is_held() {
            return Err(AdcError::DeviceBusy);
        }
        self.config = config;
        Ok(())
    }

    /// Shortest fast mode period the configured data rate can sustain
    pub fn min_period(&self) -> Duration {
        Duration::from_micros(
            acquisition::conversion_time_us::<V>(self.config.data_rate).into(),
        )
    }

    /// Shortest slow mode period, one complete single-shot acquisition per tick
    pub fn min_slow_period(&self) -> Duration {
        Duration::from_micros(acquisition::single_shot_time_us::<V>(&self.config).into())
    }

    /// Run `f` with exclusive register access on the caller's thread
    fn with_registers<T>(
        &mut self,
        f: impl FnOnce(&mut IF, &AdcConfig) -> Result<T, Error<IF::Error>>,
    ) -> Result<T, Error<IF::Error>> {
        let _claim = self.token.try_claim().ok_or(AdcError::DeviceBusy)?;
        let mut bus = lock(&self.bus);
        f(&mut *bus, &self.config)
    }

    //==============================================================================================
    // Single-shot
    //==============================================================================================

    /// Single-shot conversion of a single-ended channel
    pub fn read_channel(&mut self, channel: Channel) -> Result<ConversionSample, Error<IF::Error>> {
        self.read_mux(channel.mux())
    }

    /// Single-shot conversion of any input pair, including the differential ones
    pub fn read_mux(&mut self, mux: Mux) -> Result<ConversionSample, Error<IF::Error>> {
        self.with_registers(|bus, cfg| {
            acquisition::single_shot::<IF, V, _>(bus, cfg, mux, &mut StdDelay)
        })
    }

    /// Read back the config register. Useful to check whether the device responds at all.
    pub fn probe(&mut self) -> Result<ConfigWord, Error<IF::Error>> {
        self.with_registers(|bus, _| {
            bus.read_register(Register::Config)
                .map(ConfigWord::from_bits)
                .map_err(Error::Transport)
        })
    }

    /// Write the comparator thresholds in raw conversion codes
    pub fn set_thresholds(&mut self, low: i16, high: i16) -> Result<(), Error<IF::Error>> {
        self.with_registers(|bus, _| acquisition::write_thresholds::<IF, V>(bus, low, high))
    }

    pub fn enable_conversion_ready_pin(&mut self) -> Result<(), Error<IF::Error>> {
        self.with_registers(|bus, _| acquisition::enable_conversion_ready_pin(bus))
    }

    //==============================================================================================
    // Observers
    //==============================================================================================

    /// Register, replace or remove (`None`) the observer of a channel.
    ///
    /// Takes effect with the next tick of a running session. Removing observers never stops a
    /// session. In slow mode, the channels are sampled in the order their observers were first
    /// registered.
    pub fn set_observer(&self, channel: Channel, observer: Option<Observer>) {
        lock(&self.observers).set(channel, observer);
    }

    //==============================================================================================
    // Sampling sessions
    //==============================================================================================

    fn check_idle(&mut self) -> Result<(), AdcError> {
        self.reap();
        if self.session.is_some() || self.token.is_held() {
            return Err(AdcError::AlreadyRunning);
        }
        Ok(())
    }

    /// Start fast mode: the device converts `channel` continuously and a worker thread reads the
    /// conversion register every `period`.
    pub fn start_fast(
        &mut self,
        channel: Channel,
        threshold: f32,
        period: Duration,
    ) -> Result<(), Error<IF::Error>> {
        self.check_idle()?;
        let minimum = self.min_period();
        if period < minimum {
            return Err(invalid_frequency(period, minimum).into());
        }
        let claim = self.token.try_claim().ok_or(AdcError::AlreadyRunning)?;
        acquisition::start_continuous(&mut *lock(&self.bus), &self.config, channel.mux())?;

        let bus = Arc::clone(&self.bus);
        let observers = Arc::clone(&self.observers);
        let gain = self.config.gain;
        let mut detector = ChangeDetector::new(threshold);
        let tick = move || -> Result<(), Error<IF::Error>> {
            let sample = acquisition::read_latest::<IF, V>(&mut *lock(&bus), gain)?;
            let value = sample.volts();
            if detector.is_change(channel, value) && lock(&observers).dispatch(channel, value) {
                log::trace!("{:?}: {} V", channel, value);
                detector.commit(channel, value);
            }
            Ok(())
        };
        match Worker::spawn("ads1x15-fast", period, claim, tick) {
            Ok(worker) => {
                log::info!(
                    "{} fast sampling on {:?} every {:?}, threshold {} V",
                    V::NAME,
                    channel,
                    period,
                    threshold
                );
                self.fault = None;
                self.session = Some(Session {
                    kind: SessionKind::Fast(channel),
                    worker,
                });
                Ok(())
            }
            Err(e) => {
                self.power_down(channel);
                Err(Error::Spawn(e))
            }
        }
    }

    /// Start slow mode: every `period` a worker thread performs a single-shot conversion on the
    /// next channel with a registered observer.
    ///
    /// Each of the N registered channels is refreshed once every `N * period`, which must leave
    /// room for N single-shot acquisitions, see [Ads1x15::min_slow_period]. N is taken from the
    /// channels registered at start, with at least one channel assumed.
    pub fn start_slow(&mut self, threshold: f32, period: Duration) -> Result<(), Error<IF::Error>> {
        self.check_idle()?;
        let channels = lock(&self.observers).len().max(1) as u32;
        let per_channel_min = self
            .min_slow_period()
            .checked_mul(channels)
            .unwrap_or(Duration::MAX);
        let per_channel = period.checked_mul(channels).unwrap_or(Duration::MAX);
        if per_channel < per_channel_min {
            return Err(invalid_frequency(per_channel, per_channel_min).into());
        }
        let claim = self.token.try_claim().ok_or(AdcError::AlreadyRunning)?;

        let bus = Arc::clone(&self.bus);
        let observers = Arc::clone(&self.observers);
        let config = self.config;
        let mut detector = ChangeDetector::new(threshold);
        let mut cursor = None;
        let tick = move || -> Result<(), Error<IF::Error>> {
            let Some(channel) = lock(&observers).next_after(cursor) else {
                return Ok(());
            };
            cursor = Some(channel);
            let sample = acquisition::single_shot::<IF, V, _>(
                &mut *lock(&bus),
                &config,
                channel.mux(),
                &mut StdDelay,
            )?;
            let value = sample.volts();
            if detector.is_change(channel, value) && lock(&observers).dispatch(channel, value) {
                log::trace!("{:?}: {} V", channel, value);
                detector.commit(channel, value);
            }
            Ok(())
        };
        let worker = Worker::spawn("ads1x15-slow", period, claim, tick).map_err(Error::Spawn)?;
        log::info!(
            "{} slow sampling over {} channel(s) every {:?}, threshold {} V",
            V::NAME,
            channels,
            period,
            threshold
        );
        self.fault = None;
        self.session = Some(Session {
            kind: SessionKind::Slow,
            worker,
        });
        Ok(())
    }
}

impl<IF: RegisterInterface, V: Variant> Ads1x15<IF, V> {
    /// Stop fast mode and power the device down. Does nothing if fast mode is not running.
    pub fn stop_fast(&mut self) {
        if let Some(SessionKind::Fast(channel)) = self.session.as_ref().map(|s| s.kind) {
            self.end_session();
            self.power_down(channel);
            log::info!("{} fast sampling stopped", V::NAME);
        }
    }

    /// Stop slow mode. Does nothing if slow mode is not running.
    pub fn stop_slow(&mut self) {
        if let Some(SessionKind::Slow) = self.session.as_ref().map(|s| s.kind) {
            self.end_session();
            log::info!("{} slow sampling stopped", V::NAME);
        }
    }

    pub fn state(&mut self) -> SessionState {
        self.reap();
        match (self.session.as_ref().map(|s| s.kind), &self.fault) {
            (Some(SessionKind::Fast(channel)), _) => SessionState::Fast(channel),
            (Some(SessionKind::Slow), _) => SessionState::Slow,
            (None, Some(_)) => SessionState::Faulted,
            (None, None) => SessionState::Idle,
        }
    }

    /// Collect the fault which terminated the last session, if any
    pub fn take_fault(&mut self) -> Option<Error<IF::Error>> {
        self.reap();
        self.fault.take()
    }

    /// Join a session whose worker exited on its own. A terminated fast session leaves the
    /// device converting, so it is powered down like on [Ads1x15::stop_fast].
    fn reap(&mut self) {
        let finished = match &self.session {
            Some(session) if session.worker.is_finished() => session.kind,
            _ => return,
        };
        self.end_session();
        if let SessionKind::Fast(channel) = finished {
            self.power_down(channel);
        }
    }

    fn end_session(&mut self) {
        if let Some(session) = self.session.take() {
            match session.worker.stop() {
                Ok(()) => (),
                Err(Exit::Fault(e)) => self.fault = Some(e),
                Err(Exit::Panic) => self.fault = Some(Error::WorkerPanicked),
            }
        }
    }

    /// Best effort, a failure is only logged
    fn power_down(&mut self, channel: Channel) {
        if acquisition::power_down(&mut *lock(&self.bus), &self.config, channel.mux()).is_err() {
            log::warn!("{}: power-down after fast sampling failed", V::NAME);
        }
    }
}

impl<IF: RegisterInterface, V: Variant> Drop for Ads1x15<IF, V> {
    fn drop(&mut self) {
        self.stop_fast();
        self.stop_slow();
    }
}
