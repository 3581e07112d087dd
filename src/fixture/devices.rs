//! Helpers that expand a device description into sysfs-shaped spec entries.
//!
//! The fixture lays devices out as real directories directly under
//! `sys/bus/pci/devices` (not symlinks into `sys/devices`), so sibling links
//! such as `virtfn0 -> ../0000:3b:02.0` resolve inside the tree.

use std::collections::BTreeMap;
use std::path::PathBuf;

use super::spec::FixtureSpec;
use crate::sysfs::{SYS_BUS_AUX_DEVICES, SYS_BUS_PCI_DEVICES, SYS_BUS_PCI_DRIVERS, SYS_CLASS_NET};

/// A PCI function as seen under `/sys/bus/pci/devices/<address>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PciDevice {
    address: String,
    vendor: String,
    device: String,
    class: String,
    driver: Option<String>,
    numa_node: i32,
    netdevs: Vec<String>,
    total_vfs: Option<u32>,
    vfs: Vec<PciDevice>,
    attrs: BTreeMap<String, Vec<u8>>,
}

impl PciDevice {
    /// Creates an Ethernet-class function with no driver bound.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            vendor: "0x0000".to_string(),
            device: "0x0000".to_string(),
            class: "0x020000".to_string(),
            driver: None,
            numa_node: -1,
            netdevs: Vec::new(),
            total_vfs: None,
            vfs: Vec::new(),
            attrs: BTreeMap::new(),
        }
    }

    /// Vendor ID, with or without the `0x` prefix.
    pub fn vendor(mut self, id: &str) -> Self {
        self.vendor = hex_id(id);
        self
    }

    /// Device ID, with or without the `0x` prefix.
    pub fn device(mut self, id: &str) -> Self {
        self.device = hex_id(id);
        self
    }

    /// Class code, with or without the `0x` prefix.
    pub fn class(mut self, code: &str) -> Self {
        self.class = hex_id(code);
        self
    }

    /// Binds the function to `driver`.
    pub fn driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }

    /// NUMA node written to `numa_node`; `-1` means none.
    pub fn numa_node(mut self, node: i32) -> Self {
        self.numa_node = node;
        self
    }

    /// Adds a network interface owned by this function.
    pub fn netdev(mut self, name: impl Into<String>) -> Self {
        self.netdevs.push(name.into());
        self
    }

    /// Sets `sriov_totalvfs`. Defaults to the number of attached VFs.
    pub fn total_vfs(mut self, total: u32) -> Self {
        self.total_vfs = Some(total);
        self
    }

    /// Attaches a virtual function, wiring `virtfnN` and `physfn` links.
    pub fn vf(mut self, vf: PciDevice) -> Self {
        self.vfs.push(vf);
        self
    }

    /// Adds an arbitrary attribute file in the device directory.
    pub fn attr(mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.attrs.insert(name.into(), content.into());
        self
    }

    /// PCI address, e.g. `0000:3b:00.0`.
    pub fn address(&self) -> &str {
        &self.address
    }

    fn dir(&self) -> PathBuf {
        PathBuf::from(SYS_BUS_PCI_DEVICES).join(&self.address)
    }

    fn add_to(&self, spec: &mut FixtureSpec) {
        let dir = self.dir();
        spec.add_dir(&dir);
        spec.add_file(dir.join("vendor"), line(&self.vendor));
        spec.add_file(dir.join("device"), line(&self.device));
        spec.add_file(dir.join("class"), line(&self.class));
        spec.add_file(dir.join("numa_node"), line(&self.numa_node.to_string()));
        for (name, content) in &self.attrs {
            spec.add_file(dir.join(name), content.clone());
        }

        if let Some(driver) = &self.driver {
            let driver_dir = PathBuf::from(SYS_BUS_PCI_DRIVERS).join(driver);
            spec.add_dir(&driver_dir);
            spec.add_symlink(
                dir.join("driver"),
                format!("../../../../bus/pci/drivers/{}", driver),
            );
            spec.add_symlink(
                driver_dir.join(&self.address),
                format!("../../devices/{}", self.address),
            );
        }

        for netdev in &self.netdevs {
            spec.add_dir(dir.join("net").join(netdev));
            spec.add_symlink(
                PathBuf::from(SYS_CLASS_NET).join(netdev),
                format!("../../bus/pci/devices/{}/net/{}", self.address, netdev),
            );
        }

        if self.total_vfs.is_some() || !self.vfs.is_empty() {
            let total = self.total_vfs.unwrap_or(0).max(self.vfs.len() as u32);
            spec.add_file(dir.join("sriov_totalvfs"), line(&total.to_string()));
            spec.add_file(dir.join("sriov_numvfs"), line(&self.vfs.len().to_string()));
        }

        for (index, vf) in self.vfs.iter().enumerate() {
            vf.add_to(spec);
            spec.add_symlink(
                dir.join(format!("virtfn{}", index)),
                format!("../{}", vf.address),
            );
            spec.add_symlink(vf.dir().join("physfn"), format!("../{}", self.address));
        }
    }
}

/// A device on the auxiliary bus, e.g. an mlx5 scalable function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxDevice {
    name: String,
    sfnum: Option<u32>,
    netdevs: Vec<String>,
}

impl AuxDevice {
    /// Creates a device named like `mlx5_core.sf.2`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sfnum: None,
            netdevs: Vec::new(),
        }
    }

    /// Scalable function number, written to `sfnum`.
    pub fn sfnum(mut self, sfnum: u32) -> Self {
        self.sfnum = Some(sfnum);
        self
    }

    /// Adds a network interface under `net/`.
    pub fn netdev(mut self, name: impl Into<String>) -> Self {
        self.netdevs.push(name.into());
        self
    }

    fn add_to(&self, spec: &mut FixtureSpec) {
        let dir = PathBuf::from(SYS_BUS_AUX_DEVICES).join(&self.name);
        spec.add_dir(&dir);
        if let Some(sfnum) = self.sfnum {
            spec.add_file(dir.join("sfnum"), line(&sfnum.to_string()));
        }
        for netdev in &self.netdevs {
            spec.add_dir(dir.join("net").join(netdev));
            spec.add_symlink(
                PathBuf::from(SYS_CLASS_NET).join(netdev),
                format!("../../bus/auxiliary/devices/{}/net/{}", self.name, netdev),
            );
        }
    }
}

impl FixtureSpec {
    /// Adds a PCI function and, recursively, its VFs.
    pub fn pci_device(mut self, device: PciDevice) -> Self {
        device.add_to(&mut self);
        self
    }

    /// Adds an auxiliary bus device.
    pub fn aux_device(mut self, device: AuxDevice) -> Self {
        device.add_to(&mut self);
        self
    }
}

fn hex_id(id: &str) -> String {
    let digits = id.trim_start_matches("0x");
    format!("0x{}", digits.to_ascii_lowercase())
}

fn line(value: &str) -> Vec<u8> {
    format!("{}\n", value).into_bytes()
}
