//! Runners for the three ways pisense drives the board: one sample, a hardware
//! check, or the polling loop.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;

use crate::config::Config;
use crate::i2c::{LinuxI2c, Transport};
use crate::logger::{Logger, TracingLogger};
use crate::sensors::{CpuTemperature, SenseHat};
use crate::shutdown::Shutdown;
use crate::timer::Timer;

type Board = SenseHat<LinuxI2c, TracingLogger>;

fn open_board(config: &Config) -> anyhow::Result<Board> {
    let options = config.sense_hat_options()?;
    let board = SenseHat::open(&config.bus.path, TracingLogger, options)
        .with_context(|| format!("Failed to initialise Sense HAT on {}", config.bus.path))?;

    if options.compensation.needs_external_metric() {
        return Ok(board.with_ambient(CpuTemperature));
    }
    Ok(board)
}

/// Write one JSON line and flush it
fn emit(out: &mut impl Write, record: &impl Serialize) -> io::Result<()> {
    let line = serde_json::to_string(record)?;
    writeln!(out, "{}", line)?;
    out.flush()
}

/// Take a single sample and print it
pub fn run_once(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Running once...");
    let mut board = open_board(config)?;
    let reading = board.sample().context("Failed to sample Sense HAT")?;
    emit(&mut io::stdout().lock(), &reading)?;
    Ok(())
}

/// Check every chip's identity register, print the report, fail if any chip fails
pub fn run_verify(config: &Config) -> anyhow::Result<()> {
    let mut board = open_board(config)?;
    let report = board.verify();
    emit(&mut io::stdout().lock(), &report)?;

    if !report.all_passed {
        let failed: Vec<_> = report.failed().map(|check| check.name).collect();
        anyhow::bail!("Hardware verification failed: {}", failed.join(", "));
    }
    Ok(())
}

/// Counts consecutive failed samples
#[derive(Debug)]
struct FailureBudget {
    limit: u32,
    consecutive: u32,
}

impl FailureBudget {
    fn new(limit: u32) -> Self {
        Self {
            limit,
            consecutive: 0,
        }
    }

    /// Returns true once `limit` failures have happened in a row
    fn record(&mut self, success: bool) -> bool {
        if success {
            self.consecutive = 0;
            return false;
        }
        self.consecutive = self.consecutive.saturating_add(1);
        self.consecutive >= self.limit
    }
}

/// Poll the board on stdout until `shutdown` is requested
pub async fn run_polling(config: Config, shutdown: Arc<Shutdown>) -> anyhow::Result<()> {
    let board = open_board(&config)?;
    poll(board, TracingLogger, io::stdout(), &config, shutdown).await
}

/// Sample `board` on the configured interval and write each reading to `out`.
///
/// A sample that cannot be taken or written is skipped and retried on the
/// next tick. Too many failures in a row, or a closed output, raise a fault
/// which stops polling and makes this return an error.
async fn poll<T, L, W>(
    mut board: SenseHat<T, L>,
    logger: L,
    mut out: W,
    config: &Config,
    shutdown: Arc<Shutdown>,
) -> anyhow::Result<()>
where
    T: Transport + Send + 'static,
    L: Logger + Clone + Send + 'static,
    W: Write + Send + 'static,
{
    logger.info("Starting Sense application...");

    // Must finish before the timer thread takes over the bus
    if config.debug.run_health_check_on_startup {
        logger.info("Running health check...");
        board.verify();
    }

    let limit = config.app.max_consecutive_failures;
    let mut budget = FailureBudget::new(limit);
    let poll_shutdown = Arc::clone(&shutdown);
    let poll_logger = logger.clone();

    let mut timer = Timer::new(config.app.polling_interval(), logger.clone(), move || {
        if poll_shutdown.is_requested() {
            return;
        }

        let success = match board.sample() {
            Ok(reading) => match emit(&mut out, &reading) {
                Ok(()) => true,
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                    poll_logger.critical("Output closed, stopping");
                    poll_shutdown.fault();
                    return;
                }
                Err(e) => {
                    poll_logger.warn(&format!("Failed to write reading: {}", e));
                    false
                }
            },
            Err(e) => {
                poll_logger.warn(&format!("Skipping sample: {}", e));
                false
            }
        };

        if budget.record(success) {
            poll_logger.critical(&format!("{} consecutive samples failed, stopping", limit));
            poll_shutdown.fault();
        }
    });

    timer.start();

    while !shutdown.is_requested() {
        tokio::time::sleep(config.app.exit_check_interval()).await;
    }

    match shutdown.signal() {
        Some(signo) => logger.warn(&format!("Exiting... (signal: {})", signo)),
        None => logger.warn("Exiting..."),
    }

    tokio::task::spawn_blocking(move || timer.stop())
        .await
        .context("Timer shutdown failed")?;

    logger.info("Sense application closed");

    if shutdown.is_faulted() {
        anyhow::bail!("Polling aborted: readings could not be taken or written");
    }
    Ok(())
}
