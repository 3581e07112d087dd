//! Records returned by link, eswitch and route queries.

use std::fmt;
use std::net::Ipv4Addr;

/// RFC 2863 operational state of a link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OperState {
    #[default]
    Unknown,
    NotPresent,
    Down,
    LowerLayerDown,
    Testing,
    Dormant,
    Up,
}

/// Attributes of a network link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkAttrs {
    /// Interface index; 0 when unknown.
    pub index: i32,
    pub name: String,
    pub mtu: u32,
    /// MAC address bytes.
    pub hardware_addr: Vec<u8>,
    /// Link-layer encapsulation, e.g. `ether` or `infiniband`.
    pub encap_type: String,
    /// Index of the master (bond/bridge) link; 0 when none.
    pub master_index: i32,
    pub oper_state: OperState,
}

/// Embedded switch attributes of a devlink device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EswitchAttrs {
    /// `legacy` or `switchdev` on real hardware.
    pub mode: String,
    pub inline_mode: String,
    pub encap_mode: String,
}

/// An IPv4 network in CIDR form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Network {
    addr: Ipv4Addr,
    prefix_len: u8,
}

impl Ipv4Network {
    /// Returns `None` when `prefix_len` exceeds 32.
    pub fn new(addr: Ipv4Addr, prefix_len: u8) -> Option<Self> {
        (prefix_len <= 32).then_some(Self { addr, prefix_len })
    }

    pub fn addr(&self) -> Ipv4Addr {
        self.addr
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }
}

impl fmt::Display for Ipv4Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix_len)
    }
}

/// An IPv4 route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Route {
    pub link_index: i32,
    /// Destination network; `None` means the default route.
    pub dst: Option<Ipv4Network>,
    pub gateway: Option<Ipv4Addr>,
    /// Preferred source address.
    pub src: Option<Ipv4Addr>,
    pub table: u32,
}
