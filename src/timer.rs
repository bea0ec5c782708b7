//! Periodic timer on a dedicated worker thread
//!
//! `Idle --start--> Running --stop--> Idle`. Starting a running timer and
//! stopping an idle one are both no-ops.
//!
//! The worker waits up to one interval on a condition variable and then runs
//! the action. `stop` interrupts the wait, and a worker woken that way exits
//! without running the action again. If `stop` lands right as an interval
//! elapses, one last invocation may still happen; it always finishes before
//! `stop` returns.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::logger::Logger;

type Action = Box<dyn FnMut() + Send>;

struct Shared {
    running: Mutex<bool>,
    trigger: Condvar,
}

impl Shared {
    fn running(&self) -> MutexGuard<'_, bool> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct Timer<L: Logger> {
    interval: Duration,
    logger: L,
    action: Arc<Mutex<Action>>,
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl<L: Logger> Timer<L> {
    pub fn new(interval: Duration, logger: L, action: impl FnMut() + Send + 'static) -> Self {
        Self {
            interval,
            logger,
            action: Arc::new(Mutex::new(Box::new(action))),
            shared: Arc::new(Shared {
                running: Mutex::new(false),
                trigger: Condvar::new(),
            }),
            worker: None,
        }
    }

    pub fn start(&mut self) {
        if self.worker.is_some() {
            return;
        }

        *self.shared.running() = true;

        let interval = self.interval;
        let action = Arc::clone(&self.action);
        let shared = Arc::clone(&self.shared);

        match thread::Builder::new()
            .name("pisense-timer".to_string())
            .spawn(move || run(interval, &action, &shared))
        {
            Ok(worker) => {
                self.worker = Some(worker);
                self.logger
                    .debug(&format!("Timer started: interval={:?}", self.interval));
            }
            Err(e) => {
                self.logger
                    .error(&format!("Failed to spawn timer thread: {}", e));
                *self.shared.running() = false;
            }
        }
    }

    /// Interrupt the pending wait and block until the worker has exited.
    pub fn stop(&mut self) {
        *self.shared.running() = false;
        self.shared.trigger.notify_all();

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                self.logger.error("Timer action panicked");
            }
            self.logger.debug("Timer stopped");
        }
    }
}

impl<L: Logger> Drop for Timer<L> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(interval: Duration, action: &Mutex<Action>, shared: &Shared) {
    let mut running = shared.running();

    while *running {
        running = shared
            .trigger
            .wait_timeout_while(running, interval, |running| *running)
            .map(|(guard, _)| guard)
            .unwrap_or_else(|e| e.into_inner().0);

        if !*running {
            break;
        }

        // Never hold the state lock across the action, or stop() would wait on it
        drop(running);
        (action.lock().unwrap_or_else(PoisonError::into_inner))();
        running = shared.running();
    }
}
