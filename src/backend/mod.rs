//! Platform capabilities the orchestrator drives: persisted state (OS), the live
//! gamma table (video), ramp computation (gamma) and pacing (time).
//!
//! Each capability has a fixed list of compiled-in variants. One variant per
//! capability is chosen at startup and released by dropping it.

pub mod gamma;
pub mod os;
pub mod time;
pub mod video;

use std::fmt;
use std::path::PathBuf;

use crate::error::{Error, Result};

pub use gamma::GammaBackend;
pub use os::{OpenMode, OsBackend};
pub use time::{Pace, TimeBackend};
pub use video::VideoBackend;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    Os,
    Video,
    Gamma,
    Time,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Capability::Os => "os",
            Capability::Video => "video",
            Capability::Gamma => "gamma",
            Capability::Time => "time",
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Selector {
    /// First auto-detectable variant that initialises.
    #[default]
    Auto,
    Index(usize),
}

type Init<T> = Box<dyn Fn() -> anyhow::Result<Box<T>>>;

struct Variant<T: ?Sized> {
    name: &'static str,
    auto: bool,
    init: Init<T>,
}

pub struct Variants<T: ?Sized> {
    capability: Capability,
    variants: Vec<Variant<T>>,
}

impl<T: ?Sized> Variants<T> {
    pub fn new(capability: Capability) -> Self {
        Self {
            capability,
            variants: Vec::new(),
        }
    }

    /// Adds a variant that auto-detection may pick.
    pub fn with(
        self,
        name: &'static str,
        init: impl Fn() -> anyhow::Result<Box<T>> + 'static,
    ) -> Self {
        self.push(name, true, Box::new(init))
    }

    /// Adds a variant that is only used when selected explicitly.
    pub fn with_manual(
        self,
        name: &'static str,
        init: impl Fn() -> anyhow::Result<Box<T>> + 'static,
    ) -> Self {
        self.push(name, false, Box::new(init))
    }

    fn push(mut self, name: &'static str, auto: bool, init: Init<T>) -> Self {
        self.variants.push(Variant { name, auto, init });
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.variants.iter().map(|v| v.name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.variants.iter().position(|v| v.name == name)
    }

    /// `"auto"` maps to [`Selector::Auto`]; an unknown name selects nothing.
    pub fn selector(&self, name: &str) -> Selector {
        if name == "auto" {
            return Selector::Auto;
        }
        match self.position(name) {
            Some(index) => Selector::Index(index),
            None => {
                let known: Vec<_> = self.names().collect();
                log::warn!(
                    "unknown {} backend {name:?}, known: {}",
                    self.capability,
                    known.join(", ")
                );
                Selector::Index(self.variants.len())
            }
        }
    }

    pub fn init(&self, selector: Selector) -> Result<Box<T>> {
        let candidates: Vec<&Variant<T>> = match selector {
            Selector::Auto => self.variants.iter().filter(|v| v.auto).collect(),
            Selector::Index(i) => self.variants.get(i).into_iter().collect(),
        };
        for variant in candidates {
            match (variant.init)() {
                Ok(backend) => {
                    log::debug!("{} backend: {}", self.capability, variant.name);
                    return Ok(backend);
                }
                Err(err) => {
                    log::info!(
                        "{} backend {} unavailable: {err:#}",
                        self.capability,
                        variant.name
                    );
                }
            }
        }
        Err(Error::BackendUnavailable(self.capability))
    }
}

/// Every compiled-in variant, per capability.
pub struct Registry {
    pub os: Variants<dyn OsBackend>,
    pub video: Variants<dyn VideoBackend>,
    pub gamma: Variants<dyn GammaBackend>,
    pub time: Variants<dyn TimeBackend>,
}

impl Registry {
    pub fn native(state_dir: Option<PathBuf>) -> Self {
        Self {
            os: Variants::new(Capability::Os)
                .with("unix", move || os::unix(state_dir.clone())),
            video: Variants::new(Capability::Video)
                .with("wayland", video::connect_wayland)
                .with_manual("dry-run", || video::dry_run(video::DRY_RUN_DEPTH)),
            gamma: Variants::new(Capability::Gamma)
                .with(gamma::ABSOLUTE, gamma::absolute)
                .with(gamma::RELATIVE, gamma::relative),
            time: Variants::new(Capability::Time)
                .with(time::TOKIO, time::tokio_clock)
                .with(time::STD, time::std_clock),
        }
    }
}
