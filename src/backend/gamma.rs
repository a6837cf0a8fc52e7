use anyhow::Result;

use crate::color::Rgb;
use crate::gamma::{self, GammaRamp};

pub const ABSOLUTE: &str = "absolute";
pub const RELATIVE: &str = "relative";

/// Turns a target color into a ramp.
pub trait GammaBackend {
    /// Whether `set_default_gamma` must be called before computing ramps.
    fn needs_default_gamma(&self) -> bool;

    fn set_default_gamma(&mut self, ramp: &GammaRamp);

    fn rgb(&self, color: Rgb, out: &mut GammaRamp);

    /// The ramp that applies no color bias.
    fn identity(&self, out: &mut GammaRamp);
}

/// Computes ramps from scratch; ignores the saved default.
pub struct Absolute;

impl GammaBackend for Absolute {
    fn needs_default_gamma(&self) -> bool {
        false
    }

    fn set_default_gamma(&mut self, _ramp: &GammaRamp) {}

    fn rgb(&self, color: Rgb, out: &mut GammaRamp) {
        gamma::absolute(color, out);
    }

    fn identity(&self, out: &mut GammaRamp) {
        gamma::identity(out);
    }
}

/// Scales the saved default ramp, keeping whatever calibration it carries.
#[derive(Default)]
pub struct Relative {
    base: Option<GammaRamp>,
}

impl GammaBackend for Relative {
    fn needs_default_gamma(&self) -> bool {
        true
    }

    fn set_default_gamma(&mut self, ramp: &GammaRamp) {
        self.base = Some(ramp.clone());
    }

    fn rgb(&self, color: Rgb, out: &mut GammaRamp) {
        match &self.base {
            Some(base) => gamma::relative(base, color, out),
            None => {
                log::warn!("no default gamma set, scaling identity instead");
                let mut base = GammaRamp::new(out.depth());
                gamma::identity(&mut base);
                gamma::relative(&base, color, out);
            }
        }
    }

    fn identity(&self, out: &mut GammaRamp) {
        match &self.base {
            Some(base) => out.copy_from(base),
            None => gamma::identity(out),
        }
    }
}

pub fn absolute() -> Result<Box<dyn GammaBackend>> {
    Ok(Box::new(Absolute))
}

pub fn relative() -> Result<Box<dyn GammaBackend>> {
    Ok(Box::new(Relative::default()))
}
