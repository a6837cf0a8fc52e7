use std::io::{Read, Write};

use crate::color::Rgb;
use crate::error::{Error, Result};

/// Full-scale output range of a ramp sample; samples are `u16`.
const FULL_SCALE: u32 = 65536;

/// Red, green and blue lookup tables of equal depth, stored back to back
/// in a single buffer (the layout both the compositor and the saved blob use).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GammaRamp {
    data: Box<[u16]>,
}

impl GammaRamp {
    pub fn new(depth: usize) -> Self {
        Self {
            data: vec![0; depth * 3].into(),
        }
    }

    pub fn depth(&self) -> usize {
        self.data.len() / 3
    }

    pub fn red(&self) -> &[u16] {
        &self.data[..self.depth()]
    }

    pub fn green(&self) -> &[u16] {
        let depth = self.depth();
        &self.data[depth..2 * depth]
    }

    pub fn blue(&self) -> &[u16] {
        &self.data[2 * self.depth()..]
    }

    pub fn channels(&self) -> [&[u16]; 3] {
        [self.red(), self.green(), self.blue()]
    }

    pub fn channels_mut(&mut self) -> [&mut [u16]; 3] {
        let depth = self.depth();
        let (red, rest) = self.data.split_at_mut(depth);
        let (green, blue) = rest.split_at_mut(depth);
        [red, green, blue]
    }

    /// Panics if the depths differ.
    pub fn copy_from(&mut self, other: &GammaRamp) {
        self.data.copy_from_slice(&other.data);
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.data
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.as_slice())
    }

    /// Size of the saved form: every sample in native byte order.
    pub fn byte_len(&self) -> u64 {
        std::mem::size_of_val::<[u16]>(&self.data) as u64
    }

    pub fn save(&self, mut w: impl Write) -> Result<()> {
        w.write_all(self.as_bytes())?;
        w.flush()?;
        Ok(())
    }

    /// Fills the ramp from a saved blob. The blob must hold exactly
    /// `byte_len()` bytes.
    pub fn load(&mut self, mut r: impl Read) -> Result<()> {
        let expected = self.byte_len();
        let mut bytes = Vec::with_capacity(expected as usize);
        r.read_to_end(&mut bytes)?;
        if bytes.len() as u64 != expected {
            return Err(Error::PersistedGammaCorrupt {
                expected,
                found: bytes.len() as u64,
            });
        }
        bytemuck::cast_slice_mut::<u16, u8>(&mut self.data).copy_from_slice(&bytes);
        Ok(())
    }
}

/// Linear passthrough: sample `i` of every channel is `i * (65536 / depth)`.
pub fn identity(ramp: &mut GammaRamp) {
    let step = FULL_SCALE / ramp.depth().max(1) as u32;
    for channel in ramp.channels_mut() {
        for (i, sample) in channel.iter_mut().enumerate() {
            *sample = (i as u32 * step) as u16;
        }
    }
}

/// Scales each channel linearly towards `color`.
///
/// The per-step increment is `(65536 / depth) * (level / 255)` and samples are
/// accumulated then truncated, so the top of each channel sits slightly below
/// `65536 * level / 255`.
pub fn absolute(color: Rgb, ramp: &mut GammaRamp) {
    let white = FULL_SCALE as f64 / ramp.depth() as f64;
    for (channel, level) in ramp.channels_mut().into_iter().zip(color.channels()) {
        let increment = white * (level as f64 / 255.0);
        let mut acc = 0.0_f64;
        for sample in channel.iter_mut() {
            *sample = acc as u16;
            acc += increment;
        }
    }
}

/// Scales each channel of `base` by `level / 255`, truncating.
pub fn relative(base: &GammaRamp, color: Rgb, ramp: &mut GammaRamp) {
    for ((out, src), level) in ramp
        .channels_mut()
        .into_iter()
        .zip(base.channels())
        .zip(color.channels())
    {
        for (o, &s) in out.iter_mut().zip(src) {
            *o = (s as u32 * level as u32 / 255) as u16;
        }
    }
}
