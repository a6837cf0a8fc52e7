pub mod wayland;

use anyhow::Result;

use crate::gamma::{self, GammaRamp};

/// Ramp depth of the dry-run display.
pub const DRY_RUN_DEPTH: usize = 256;

/// The display's live gamma table.
pub trait VideoBackend {
    /// Entries per channel; fixed for the lifetime of the backend.
    fn gamma_ramp_size(&self) -> usize;

    /// Gamma variant best suited to this display, if it has a preference.
    fn gamma_hint(&self) -> Option<&'static str> {
        None
    }

    fn get_gamma(&mut self, ramp: &mut GammaRamp) -> Result<()>;

    fn set_gamma(&mut self, ramp: &GammaRamp) -> Result<()>;
}

/// Keeps the ramp in memory and logs what would have been applied.
pub struct DryRun {
    live: GammaRamp,
    applied: usize,
}

impl DryRun {
    pub fn new(depth: usize) -> Self {
        let mut live = GammaRamp::new(depth);
        gamma::identity(&mut live);
        Self { live, applied: 0 }
    }
}

impl VideoBackend for DryRun {
    fn gamma_ramp_size(&self) -> usize {
        self.live.depth()
    }

    fn get_gamma(&mut self, ramp: &mut GammaRamp) -> Result<()> {
        ramp.copy_from(&self.live);
        Ok(())
    }

    fn set_gamma(&mut self, ramp: &GammaRamp) -> Result<()> {
        self.live.copy_from(ramp);
        self.applied += 1;
        let [r, g, b] = ramp.channels().map(|c| c.last().copied().unwrap_or(0));
        log::info!(
            "dry-run: ramp #{} ({} entries) peaks at r={r} g={g} b={b}",
            self.applied,
            ramp.depth()
        );
        Ok(())
    }
}

pub fn connect_wayland() -> Result<Box<dyn VideoBackend>> {
    Ok(Box::new(wayland::WaylandVideo::connect()?))
}

pub fn dry_run(depth: usize) -> Result<Box<dyn VideoBackend>> {
    Ok(Box::new(DryRun::new(depth)))
}
