use std::env;
use std::fs::{DirBuilder, File, OpenOptions};
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::PathBuf;

use anyhow::{Context, Result};

use super::time;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
}

/// Storage for named blobs that outlive a single run.
pub trait OsBackend {
    /// Preferred time variant for this platform, if any.
    fn time_hint(&self) -> Option<&'static str> {
        None
    }

    fn path(&self, name: &str) -> PathBuf;

    fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    /// The returned file is closed when dropped.
    fn open(&self, name: &str, mode: OpenMode) -> Result<File>;
}

/// Blobs live in a per-user directory that is cleared on reboot.
pub struct UnixOs {
    dir: PathBuf,
}

impl UnixOs {
    pub fn new(dir: PathBuf) -> Result<Self> {
        DirBuilder::new()
            .recursive(true)
            .mode(0o700)
            .create(&dir)
            .with_context(|| format!("create state directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// `$XDG_RUNTIME_DIR/redlux`, falling back to `/tmp/redlux-<uid>`.
    pub fn default_dir() -> PathBuf {
        match env::var_os("XDG_RUNTIME_DIR") {
            Some(runtime) if !runtime.is_empty() => PathBuf::from(runtime).join("redlux"),
            _ => PathBuf::from(format!("/tmp/redlux-{}", nix::unistd::getuid())),
        }
    }
}

impl OsBackend for UnixOs {
    /// The tokio clock wakes early on SIGINT and SIGTERM.
    fn time_hint(&self) -> Option<&'static str> {
        Some(time::TOKIO)
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn open(&self, name: &str, mode: OpenMode) -> Result<File> {
        let path = self.path(name);
        let file = match mode {
            OpenMode::Read => File::open(&path),
            OpenMode::Write => OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&path),
        };
        file.with_context(|| format!("open {} for {mode:?}", path.display()))
    }
}

pub fn unix(state_dir: Option<PathBuf>) -> Result<Box<dyn OsBackend>> {
    let dir = state_dir.unwrap_or_else(UnixOs::default_dir);
    Ok(Box::new(UnixOs::new(dir)?))
}
