use thiserror::Error;

/// Device level errors. All of them are detected before any register access takes place.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcError {
    /// A sampling session owns the device registers
    #[error("device registers are owned by a running sampling session")]
    DeviceBusy,
    /// A sampling session of either kind is already running
    #[error("a sampling session is already running")]
    AlreadyRunning,
    /// The requested polling period is shorter than one conversion at the configured data rate
    #[error("polling period of {requested_us} us is below the minimum of {minimum_us} us")]
    InvalidFrequency { requested_us: u64, minimum_us: u64 },
    #[error("invalid channel or multiplexer code")]
    InvalidChannel,
}

#[derive(Debug, Error)]
pub enum Error<E> {
    #[error(transparent)]
    Adc(#[from] AdcError),
    /// Fault reported by the register transport, passed through unchanged
    #[error("register transport fault: {0:?}")]
    Transport(E),
    #[cfg(feature = "std")]
    #[error("failed to spawn sampling worker: {0}")]
    Spawn(std::io::Error),
    /// A sampling worker panicked, usually inside an observer
    #[cfg(feature = "std")]
    #[error("sampling worker panicked")]
    WorkerPanicked,
}

impl<E> Error<E> {
    /// Device level error kind, if this is one
    pub fn adc(&self) -> Option<AdcError> {
        match self {
            Error::Adc(e) => Some(*e),
            _ => None,
        }
    }
}
