//! Abstraction over the host filesystem the harness reads from.
//!
//! Fixtures are written to real temporary directories, but the vendor/device-ID
//! database is read from the host. Routing that read through `FileSystem` lets
//! tests simulate hosts that lack it.

use std::io;
use std::path::Path;

/// Read-only access to host files.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as raw bytes.
    ///
    /// A missing file must be reported as `io::ErrorKind::NotFound`; callers
    /// treat that kind as "try the next location".
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// The machine the tests run on.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}
