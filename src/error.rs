//! Error types for fixture construction and provider queries.

use std::io;
use std::path::PathBuf;

/// Errors raised while building or tearing down a fixture tree.
#[derive(Debug)]
pub enum FixtureError {
    /// A declared path is absolute or escapes the fixture root.
    InvalidPath(PathBuf),
    /// The temporary root directory could not be created.
    CreateRoot(io::Error),
    /// A directory inside the fixture could not be created.
    CreateDir { path: PathBuf, source: io::Error },
    /// A file inside the fixture could not be written.
    WriteFile { path: PathBuf, source: io::Error },
    /// None of the candidate vendor/device-ID database paths exist on the host.
    PciIdsNotFound { searched: Vec<PathBuf> },
    /// The vendor/device-ID database exists but could not be read.
    ReadPciIds { path: PathBuf, source: io::Error },
    /// A symlink inside the fixture could not be created.
    Symlink {
        link: PathBuf,
        target: PathBuf,
        source: io::Error,
    },
    /// The fixture root could not be removed.
    Teardown { root: PathBuf, source: io::Error },
}

impl std::fmt::Display for FixtureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FixtureError::InvalidPath(path) => {
                write!(f, "invalid fixture path {:?}: must stay inside the fixture root", path)
            }
            FixtureError::CreateRoot(e) => write!(f, "error creating fake root dir: {}", e),
            FixtureError::CreateDir { path, source } => {
                write!(f, "error creating fake directory {:?}: {}", path, source)
            }
            FixtureError::WriteFile { path, source } => {
                write!(f, "error creating fake file {:?}: {}", path, source)
            }
            FixtureError::PciIdsNotFound { searched } => {
                write!(f, "pci.ids not found, searched: ")?;
                for (i, path) in searched.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", path.display())?;
                }
                Ok(())
            }
            FixtureError::ReadPciIds { path, source } => {
                write!(f, "error reading file {:?}: {}", path, source)
            }
            FixtureError::Symlink {
                link,
                target,
                source,
            } => write!(
                f,
                "error creating fake symlink {:?} -> {:?}: {}",
                link, target, source
            ),
            FixtureError::Teardown { root, source } => {
                write!(f, "error tearing down fake filesystem {:?}: {}", root, source)
            }
        }
    }
}

impl std::error::Error for FixtureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FixtureError::InvalidPath(_) | FixtureError::PciIdsNotFound { .. } => None,
            FixtureError::CreateRoot(source)
            | FixtureError::CreateDir { source, .. }
            | FixtureError::WriteFile { source, .. }
            | FixtureError::ReadPciIds { source, .. }
            | FixtureError::Symlink { source, .. }
            | FixtureError::Teardown { source, .. } => Some(source),
        }
    }
}

/// Errors returned by [`crate::netlink::NetlinkProvider`] implementations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// No provider has been installed in the process-wide slot.
    NotInstalled,
    /// A scripted provider received a call it has no expectation for.
    Unscripted { method: &'static str, arg: String },
    /// A scripted provider was told to fail this call.
    Scripted(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::NotInstalled => write!(f, "no netlink provider installed"),
            ProviderError::Unscripted { method, arg } => {
                write!(f, "unexpected call {}({:?}): no matching expectation", method, arg)
            }
            ProviderError::Scripted(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}
