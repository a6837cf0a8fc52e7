use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Text that keeps the Kelvin-derived value for a channel.
pub const AUTO: &str = "auto";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    r: u8,
    g: u8,
    b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn channels(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// `0xRRGGBB`; bits above 24 are ignored.
    pub fn from_packed(packed: u32) -> Self {
        Self::new((packed >> 16) as u8, (packed >> 8) as u8, packed as u8)
    }

    pub fn packed(&self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Replaces each channel whose override is not `auto`.
    pub fn with_overrides(self, [r, g, b]: [Channel; 3]) -> Self {
        Self::new(r.resolve(self.r), g.resolve(self.g), b.resolve(self.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.packed())
    }
}

impl FromStr for Rgb {
    type Err = Error;

    /// Accepts `#rrggbb` or `rrggbb`.
    fn from_str(s: &str) -> Result<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidChannelValue(s.to_string()));
        }
        u32::from_str_radix(hex, 16)
            .map(Rgb::from_packed)
            .map_err(|_| Error::InvalidChannelValue(s.to_string()))
    }
}

/// A per-channel override as given on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Channel {
    #[default]
    Auto,
    Level(i64),
}

impl Channel {
    /// Out-of-range levels clamp to 0..=255.
    pub fn resolve(self, fallback: u8) -> u8 {
        match self {
            Channel::Auto => fallback,
            Channel::Level(level) => {
                let clamped = level.clamp(0, 255);
                if clamped != level {
                    log::warn!("channel value {level} clamped to {clamped}");
                }
                clamped as u8
            }
        }
    }
}

impl FromStr for Channel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(AUTO) {
            return Ok(Channel::Auto);
        }
        let (negative, digits) = match s.strip_prefix('-') {
            Some(digits) => (true, digits),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidChannelValue(s.to_string()));
        }
        // Only overflow can fail here; it saturates and clamps like any large level.
        let level = digits.parse::<i64>().unwrap_or(i64::MAX);
        Ok(Channel::Level(if negative { -level } else { level }))
    }
}
