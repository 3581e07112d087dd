//! hwtree-fixture - isolated device-topology environments for tests.
//!
//! This library provides:
//! - `fixture` - disposable sysfs-style trees that the process-wide bus-tree
//!   roots are redirected to
//! - `netlink` - a swappable link/eswitch/route query provider and a scripted mock
//! - `hostfs` - the host filesystem abstraction used to seed fixtures
//!
//! # Example
//!
//! ```no_run
//! use hwtree_fixture::fixture::FixtureSpec;
//! use hwtree_fixture::netlink::{install_default_mock, netlink_provider};
//!
//! let fixture = FixtureSpec::new()
//!     .dir("sys/bus/pci/devices/0000:00:00.0")
//!     .file("config/foo.yaml", "a: 1")
//!     .activate();
//! install_default_mock();
//!
//! let link = netlink_provider().unwrap().get_link_attrs("eth0").unwrap();
//! assert_eq!(link.encap_type, "fakeLinkType");
//!
//! fixture.teardown();
//! ```

#![cfg(unix)]

pub mod error;
pub mod fixture;
pub mod hostfs;
pub mod logging;
pub mod netlink;
pub mod sysfs;

pub use error::{FixtureError, ProviderError};
