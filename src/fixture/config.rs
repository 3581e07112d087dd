//! Knobs for how a fixture is materialized.

use std::env;
use std::path::PathBuf;

/// Environment variable naming a single host `pci.ids` to use instead of the defaults.
pub const ENV_PCI_IDS: &str = "HWTREE_FIXTURE_PCI_IDS";
/// Environment variable naming the directory fixture roots are created in.
pub const ENV_TMPDIR: &str = "HWTREE_FIXTURE_TMPDIR";

/// Host locations of the vendor/device-ID database, in probe order.
///
/// Fedora/RHEL ship it under `hwdata`, Debian-based systems under `misc`.
pub const HOST_PCI_IDS_PATHS: [&str; 2] = ["/usr/share/hwdata/pci.ids", "/usr/share/misc/pci.ids"];

/// Where the fixture's `usr/share/hwdata/pci.ids` comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PciIdsSource {
    /// Copy the first of these host paths that exists.
    Host(Vec<PathBuf>),
    /// Write these bytes; no host access.
    Bundled(Vec<u8>),
}

impl Default for PciIdsSource {
    fn default() -> Self {
        PciIdsSource::Host(HOST_PCI_IDS_PATHS.iter().map(PathBuf::from).collect())
    }
}

/// Configuration for [`crate::fixture::FixtureSpec::try_activate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureConfig {
    /// Name prefix of the temporary root directory.
    pub temp_prefix: String,
    /// Parent of the temporary root; `None` uses the system temp dir.
    pub temp_parent: Option<PathBuf>,
    /// Where the vendor/device-ID database comes from.
    pub pci_ids: PciIdsSource,
    /// Repoint the process-wide bus-tree roots at the fixture.
    pub publish_bus_paths: bool,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            temp_prefix: "sriov".to_string(),
            temp_parent: None,
            pci_ids: PciIdsSource::default(),
            publish_bus_paths: true,
        }
    }
}

impl FixtureConfig {
    /// Defaults with [`ENV_PCI_IDS`] and [`ENV_TMPDIR`] applied.
    pub fn from_env() -> Self {
        Self::default().with_overrides(env::var(ENV_PCI_IDS).ok(), env::var(ENV_TMPDIR).ok())
    }

    fn with_overrides(mut self, pci_ids: Option<String>, tmpdir: Option<String>) -> Self {
        if let Some(path) = pci_ids.filter(|p| !p.is_empty()) {
            self.pci_ids = PciIdsSource::Host(vec![PathBuf::from(path)]);
        }
        if let Some(dir) = tmpdir.filter(|d| !d.is_empty()) {
            self.temp_parent = Some(PathBuf::from(dir));
        }
        self
    }

    /// Uses the given bytes as the vendor/device-ID database.
    pub fn with_bundled_pci_ids(mut self, content: impl Into<Vec<u8>>) -> Self {
        self.pci_ids = PciIdsSource::Bundled(content.into());
        self
    }

    /// Creates fixture roots under `dir`.
    pub fn with_temp_parent(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_parent = Some(dir.into());
        self
    }

    /// Builds the tree without touching the process-wide bus-tree roots.
    pub fn unpublished(mut self) -> Self {
        self.publish_bus_paths = false;
        self
    }
}
