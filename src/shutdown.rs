//! Process-wide shutdown request
//!
//! Signal listeners and the poller only ever store into these atomics; the
//! main loop reads them every exit-check interval. Create the flag and call
//! `listen_for_signals` before the timer starts.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

use nix::libc;
use tokio::signal::unix::{signal, SignalKind};

#[derive(Debug, Default)]
pub struct Shutdown {
    requested: AtomicBool,
    signal: AtomicI32,
    faulted: AtomicBool,
}

impl Shutdown {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Record the signal that asked us to stop
    pub fn request(&self, signal: i32) {
        self.signal.store(signal, Ordering::Relaxed);
        self.requested.store(true, Ordering::Release);
    }

    /// Stop because polling can no longer make progress
    pub fn fault(&self) {
        self.faulted.store(true, Ordering::Relaxed);
        self.requested.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    pub fn is_faulted(&self) -> bool {
        self.faulted.load(Ordering::Relaxed)
    }

    /// Signal number, if a signal caused the shutdown
    pub fn signal(&self) -> Option<i32> {
        match self.signal.load(Ordering::Relaxed) {
            0 => None,
            signo => Some(signo),
        }
    }
}

/// Register SIGINT, SIGTERM, SIGHUP and SIGQUIT and flag `shutdown` on the
/// first one delivered. Must be called inside the tokio runtime.
pub fn listen_for_signals(shutdown: Arc<Shutdown>) -> std::io::Result<()> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;
    let mut quit = signal(SignalKind::quit())?;

    tokio::spawn(async move {
        let signo = tokio::select! {
            _ = interrupt.recv() => libc::SIGINT,
            _ = terminate.recv() => libc::SIGTERM,
            _ = hangup.recv() => libc::SIGHUP,
            _ = quit.recv() => libc::SIGQUIT,
        };
        shutdown.request(signo);
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initially_clear() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_requested());
        assert!(!shutdown.is_faulted());
        assert_eq!(shutdown.signal(), None);
    }

    #[test]
    fn test_signal_request() {
        let shutdown = Shutdown::new();
        shutdown.request(libc::SIGTERM);
        assert!(shutdown.is_requested());
        assert!(!shutdown.is_faulted());
        assert_eq!(shutdown.signal(), Some(libc::SIGTERM));
    }

    #[test]
    fn test_fault_requests_shutdown() {
        let shutdown = Shutdown::new();
        shutdown.fault();
        assert!(shutdown.is_requested());
        assert!(shutdown.is_faulted());
        assert_eq!(shutdown.signal(), None);
    }

    #[tokio::test]
    async fn test_signal_sets_flag() {
        let shutdown = Shutdown::new();
        listen_for_signals(Arc::clone(&shutdown)).unwrap();

        nix::sys::signal::raise(nix::sys::signal::Signal::SIGHUP).unwrap();

        for _ in 0..100 {
            if shutdown.is_requested() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(shutdown.signal(), Some(libc::SIGHUP));
    }
}
