//! Sysfs layout and the process-wide bus-tree roots.
//!
//! Device-discovery code locates PCI and auxiliary devices through
//! [`sys_bus_pci`] and [`sys_bus_aux`]. Fixtures repoint both at a fake tree.

mod paths;

pub use paths::{BusPaths, bus_paths, reset_bus_paths, set_bus_paths, sys_bus_aux, sys_bus_pci};
pub(crate) use paths::{PublicationId, publish_bus_paths, withdraw_bus_paths};

/// PCI device entries, relative to a filesystem root.
pub const SYS_BUS_PCI_DEVICES: &str = "sys/bus/pci/devices";
/// PCI driver entries, relative to a filesystem root.
pub const SYS_BUS_PCI_DRIVERS: &str = "sys/bus/pci/drivers";
/// Auxiliary bus device entries, relative to a filesystem root.
pub const SYS_BUS_AUX_DEVICES: &str = "sys/bus/auxiliary/devices";
/// Network class entries, relative to a filesystem root.
pub const SYS_CLASS_NET: &str = "sys/class/net";
/// Directory holding the vendor/device-ID database.
pub const HWDATA_DIR: &str = "usr/share/hwdata";
/// Runtime container device-interface (CDI) spec directory.
pub const CDI_DIR: &str = "var/run/cdi";
/// Vendor/device-ID database inside a fixture root.
pub const PCI_IDS: &str = "usr/share/hwdata/pci.ids";
