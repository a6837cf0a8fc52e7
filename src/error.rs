use std::path::PathBuf;

use thiserror::Error;

use crate::backend::Capability;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no {0} backend could be initialised")]
    BackendUnavailable(Capability),

    #[error("invalid channel value {0:?} (expected 0-255 or \"auto\")")]
    InvalidChannelValue(String),

    #[error("no saved gamma at {}; run with --save first", .0.display())]
    PersistedGammaMissing(PathBuf),

    #[error("saved gamma is {found} bytes, expected {expected} for this display")]
    PersistedGammaCorrupt { expected: u64, found: u64 },

    #[error(transparent)]
    Backend(#[from] anyhow::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::BackendUnavailable(cap) => match cap {
                Capability::Os => 2,
                Capability::Video => 3,
                Capability::Gamma => 4,
                Capability::Time => 5,
            },
            _ => 1,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
