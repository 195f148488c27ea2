use std::{
    fmt::Debug,
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, RecvTimeoutError, Sender},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

//==================================================================================================
// Exclusivity token
//==================================================================================================

/// Ownership flag of the device registers. There is one per device instance.
#[derive(Debug, Default, Clone)]
pub(crate) struct ExclusivityToken(Arc<AtomicBool>);

impl ExclusivityToken {
    pub fn try_claim(&self) -> Option<Claim> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Claim(Arc::clone(&self.0)))
    }

    pub fn is_held(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Held ownership of the device registers, released on drop
#[derive(Debug)]
pub(crate) struct Claim(Arc<AtomicBool>);

impl Drop for Claim {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

//==================================================================================================
// Periodic worker
//==================================================================================================

/// Why a worker thread ended on its own
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Exit<E> {
    /// A tick returned an error
    Fault(E),
    /// A tick panicked, usually inside an observer
    Panic,
}

/// Dedicated thread calling a tick function once per period.
///
/// The stop channel doubles as the sleep between ticks, so a stop request interrupts the wait
/// immediately. A period too long to be represented as a deadline waits for the stop request
/// only. A tick error ends the thread and is handed out by [Worker::stop]. The register claim
/// lives on the worker thread and is released when it exits.
pub(crate) struct Worker<E> {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<Result<(), E>>>,
}

impl<E: Send + Debug + 'static> Worker<E> {
    pub fn spawn<F>(name: &str, period: Duration, claim: Claim, mut tick: F) -> io::Result<Self>
    where
        F: FnMut() -> Result<(), E> + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name(name.into())
            .spawn(move || {
                let _claim = claim;
                let mut next = Instant::now().checked_add(period);
                loop {
                    let Some(deadline) = next else {
                        // Returns on stop or on disconnect
                        let _ = stop_rx.recv();
                        return Ok(());
                    };
                    match stop_rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                        Err(RecvTimeoutError::Timeout) => (),
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => return Ok(()),
                    }
                    let started = Instant::now();
                    if let Err(e) = tick() {
                        log::error!(
                            "{} terminated on fault: {:?}",
                            thread::current().name().unwrap_or("sampling worker"),
                            e
                        );
                        return Err(e);
                    }
                    next = started.checked_add(period);
                }
            })?;
        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }
}

impl<E> Worker<E> {
    /// The thread exited on its own, only possible after a fault or panic
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Signal the thread and wait for it. No tick runs after this returns.
    pub fn stop(mut self) -> Result<(), Exit<E>> {
        self.join()
    }

    fn join(&mut self) -> Result<(), Exit<E>> {
        // Dropping the sender wakes up the receiver with a disconnect
        drop(self.stop_tx.take());
        match self.handle.take().map(JoinHandle::join) {
            Some(Ok(result)) => result.map_err(Exit::Fault),
            Some(Err(_)) => {
                log::error!("sampling worker panicked");
                Err(Exit::Panic)
            }
            None => Ok(()),
        }
    }
}

impl<E> Drop for Worker<E> {
    fn drop(&mut self) {
        let _ = self.join();
    }
}
