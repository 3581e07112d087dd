//! Disposable device trees on real temporary storage.
//!
//! A [`FixtureSpec`] declares directories, files and symlinks. Activating it
//! builds the tree under a fresh temp root, seeds the support paths that
//! device-discovery code expects, and repoints the process-wide bus-tree
//! roots at it.
//!
//! # Usage
//!
//! ```no_run
//! use hwtree_fixture::fixture::FixtureSpec;
//! use hwtree_fixture::sysfs::sys_bus_pci;
//!
//! let fixture = FixtureSpec::sriov_pf_with_vfs(2).activate();
//! assert!(sys_bus_pci().join("0000:3b:00.0/virtfn1").exists());
//! fixture.teardown();
//! ```
//!
//! Fixtures publish into process-wide state, so tests that activate them
//! must not run concurrently; mark them `#[serial]`.

mod builder;
mod config;
mod devices;
mod scenarios;
mod spec;

pub use builder::ActiveFixture;
pub use config::{ENV_PCI_IDS, ENV_TMPDIR, FixtureConfig, HOST_PCI_IDS_PATHS, PciIdsSource};
pub use devices::{AuxDevice, PciDevice};
pub use spec::FixtureSpec;
