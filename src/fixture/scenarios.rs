//! Pre-built fixture specs for common NIC topologies.

use super::devices::{AuxDevice, PciDevice};
use super::spec::FixtureSpec;

const INTEL: &str = "8086";
const MELLANOX: &str = "15b3";

impl FixtureSpec {
    /// One Intel X710 physical function with a netdev and no VFs.
    pub fn single_pf() -> Self {
        Self::new().pci_device(
            PciDevice::new("0000:3b:00.0")
                .vendor(INTEL)
                .device("1572")
                .driver("i40e")
                .numa_node(0)
                .netdev("enp59s0f0"),
        )
    }

    /// An Intel X710 physical function with `vfs` iavf-bound virtual functions.
    ///
    /// VFs are numbered like the kernel does: `0000:3b:02.0` .. `0000:3b:02.7`,
    /// then `0000:3b:03.0` and so on.
    pub fn sriov_pf_with_vfs(vfs: usize) -> Self {
        let mut pf = PciDevice::new("0000:3b:00.0")
            .vendor(INTEL)
            .device("1572")
            .driver("i40e")
            .numa_node(0)
            .netdev("enp59s0f0")
            .total_vfs(64);

        for index in 0..vfs {
            let address = format!("0000:3b:{:02x}.{}", 2 + index / 8, index % 8);
            pf = pf.vf(
                PciDevice::new(address)
                    .vendor(INTEL)
                    .device("154c")
                    .driver("iavf")
                    .numa_node(0)
                    .netdev(format!("enp59s0f0v{}", index)),
            );
        }

        Self::new().pci_device(pf)
    }

    /// A ConnectX-6 Dx physical function plus one scalable function on the auxiliary bus.
    pub fn pf_with_subfunction() -> Self {
        Self::new()
            .pci_device(
                PciDevice::new("0000:03:00.0")
                    .vendor(MELLANOX)
                    .device("101d")
                    .driver("mlx5_core")
                    .numa_node(0)
                    .netdev("enp3s0f0np0")
                    .total_vfs(8),
            )
            .aux_device(
                AuxDevice::new("mlx5_core.sf.2")
                    .sfnum(88)
                    .netdev("enp3s0f0s88"),
            )
    }
}
