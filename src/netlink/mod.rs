//! Link, eswitch and route queries behind a swappable provider.
//!
//! Code under test calls [`netlink_provider`]; tests install a
//! [`ScriptedProvider`] first, usually via [`install_default_mock`].

mod mock;
mod provider;
mod types;

pub use mock::{
    ArgMatcher, Call, FAKE_ESWITCH_MODE, FAKE_LINK_TYPE, Method, ScriptedProvider,
    install_default_mock,
};
pub use provider::{NetlinkProvider, clear_netlink_provider, netlink_provider, set_netlink_provider};
pub use types::{EswitchAttrs, Ipv4Network, LinkAttrs, OperState, Route};
