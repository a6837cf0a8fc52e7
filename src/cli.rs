use clap::error::ErrorKind;
use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

use crate::app::Request;
use crate::backend::{Registry, Selector, Variants};
use crate::color::{Channel, Rgb};

#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum OsArg {
    Auto,
    Unix,
}

#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum VideoArg {
    Auto,
    Wayland,
    DryRun,
}

#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum GammaArg {
    Auto,
    Absolute,
    Relative,
}

#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum TimeArg {
    Auto,
    Tokio,
    Std,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "redlux",
    version,
    about = "Adjusts screen color temperature",
    after_help = "On Wayland the compositor restores its own gamma as soon as redlux exits."
)]
pub struct Opts {
    /// Color temperature in kelvin (1000-40000)
    #[arg(short = 'k', long = "kelvin", default_value_t = 3400)]
    pub kelvin: u32,

    /// Target color as #rrggbb, used instead of --kelvin
    #[arg(short = 'c', long = "color")]
    pub color: Option<Rgb>,

    /// Red color channel (0-255 or auto)
    #[arg(short = 'r', long = "red", default_value = "auto")]
    pub red: Channel,

    /// Green color channel (0-255 or auto)
    #[arg(short = 'g', long = "green", default_value = "auto")]
    pub green: Channel,

    /// Blue color channel (0-255 or auto)
    #[arg(short = 'b', long = "blue", default_value = "auto")]
    pub blue: Channel,

    /// Reset display gamma to identity (no color bias)
    #[arg(short = 'i', long = "identity")]
    pub identity: bool,

    /// Reset display gamma to the last saved gamma
    #[arg(short = 'R', long = "reset")]
    pub reset: bool,

    /// Save the current gamma (done automatically on the first run after boot)
    #[arg(short = 's', long = "save")]
    pub save: bool,

    /// Animation time in milliseconds
    #[arg(short = 'a', long = "animate", default_value_t = 0)]
    pub animate: u64,

    /// Animation delay per frame in milliseconds
    #[arg(short = 'd', long = "delay", default_value_t = 0)]
    pub delay: u64,

    /// Directory holding the saved gamma
    #[arg(long = "state-dir")]
    pub state_dir: Option<PathBuf>,

    /// Platform backend
    #[arg(long = "os", value_enum, default_value_t = OsArg::Auto)]
    pub os: OsArg,

    /// Display backend (wayland adjustments last only while redlux runs)
    #[arg(long = "video", value_enum, default_value_t = VideoArg::Auto)]
    pub video: VideoArg,

    /// Gamma computation backend
    #[arg(long = "gamma", value_enum, default_value_t = GammaArg::Auto)]
    pub gamma: GammaArg,

    /// Timing backend
    #[arg(long = "time", value_enum, default_value_t = TimeArg::Auto)]
    pub time: TimeArg,

    /// More log output (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

fn select<A: ValueEnum, T: ?Sized>(arg: &A, variants: &Variants<T>) -> Selector {
    match arg.to_possible_value() {
        Some(value) => variants.selector(value.get_name()),
        None => Selector::Auto,
    }
}

/// Help and version requests succeed; any other parse failure is a usage error.
pub fn exit_code(err: &clap::Error) -> u8 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

impl Opts {
    pub fn request(&self, registry: &Registry) -> Request {
        Request {
            kelvin: self.kelvin,
            color: self.color,
            channels: [self.red, self.green, self.blue],
            identity: self.identity,
            reset: self.reset,
            save: self.save,
            animate_ms: self.animate,
            delay_ms: self.delay,
            os: select(&self.os, &registry.os),
            video: select(&self.video, &registry.video),
            gamma: select(&self.gamma, &registry.gamma),
            time: select(&self.time, &registry.time),
        }
    }
}
