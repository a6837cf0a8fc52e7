use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::runtime::{Builder, Runtime};
use tokio::signal::unix::{Signal, SignalKind, signal};

pub const TOKIO: &str = "tokio";
pub const STD: &str = "std";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pace {
    Continue,
    /// The user asked the process to stop; finish up without further frames.
    Interrupted,
}

pub trait TimeBackend {
    /// Monotonic milliseconds since the backend was initialised.
    fn get_time(&self) -> u64;

    fn sleep(&mut self, ms: u64) -> Pace;
}

/// Sleeps on a current-thread tokio runtime, waking early on SIGINT or SIGTERM.
pub struct TokioClock {
    origin: Instant,
    runtime: Runtime,
    interrupt: Signal,
    terminate: Signal,
}

impl TokioClock {
    pub fn new() -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .context("build tokio runtime")?;
        let (interrupt, terminate) = {
            let _guard = runtime.enter();
            (
                signal(SignalKind::interrupt()).context("setup SIGINT handler")?,
                signal(SignalKind::terminate()).context("setup SIGTERM handler")?,
            )
        };
        Ok(Self {
            origin: Instant::now(),
            runtime,
            interrupt,
            terminate,
        })
    }
}

impl TimeBackend for TokioClock {
    fn get_time(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn sleep(&mut self, ms: u64) -> Pace {
        let Self {
            runtime,
            interrupt,
            terminate,
            ..
        } = self;
        runtime.block_on(async {
            tokio::select! {
                _ = interrupt.recv() => Pace::Interrupted,
                _ = terminate.recv() => Pace::Interrupted,
                _ = tokio::time::sleep(Duration::from_millis(ms)) => Pace::Continue,
            }
        })
    }
}

/// Plain blocking sleeps; signals keep their default behaviour.
pub struct StdClock {
    origin: Instant,
}

impl StdClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl TimeBackend for StdClock {
    fn get_time(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn sleep(&mut self, ms: u64) -> Pace {
        thread::sleep(Duration::from_millis(ms));
        Pace::Continue
    }
}

pub fn tokio_clock() -> Result<Box<dyn TimeBackend>> {
    Ok(Box::new(TokioClock::new()?))
}

pub fn std_clock() -> Result<Box<dyn TimeBackend>> {
    Ok(Box::new(StdClock::new()))
}
