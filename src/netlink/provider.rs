//! The query-provider capability and its process-wide slot.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use super::types::{EswitchAttrs, LinkAttrs, Route};
use crate::error::ProviderError;

/// Link, eswitch and route queries used by device-discovery code.
///
/// The real netlink-backed implementation lives outside this crate and
/// registers itself with [`set_netlink_provider`].
pub trait NetlinkProvider: Send + Sync {
    /// Attributes of the link named `name`.
    fn get_link_attrs(&self, name: &str) -> Result<LinkAttrs, ProviderError>;

    /// Eswitch attributes of the devlink device at `pci_addr`.
    fn get_devlink_device_eswitch_attrs(
        &self,
        pci_addr: &str,
    ) -> Result<EswitchAttrs, ProviderError>;

    /// IPv4 routes through the link named `name`.
    fn get_ipv4_route_list(&self, name: &str) -> Result<Vec<Route>, ProviderError>;
}

static NETLINK_PROVIDER: RwLock<Option<Arc<dyn NetlinkProvider>>> = RwLock::new(None);

/// Makes `provider` the active instance, returning the one it replaced.
pub fn set_netlink_provider(provider: Arc<dyn NetlinkProvider>) -> Option<Arc<dyn NetlinkProvider>> {
    let mut slot = NETLINK_PROVIDER
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    let previous = slot.replace(provider);
    debug!(replaced = previous.is_some(), "netlink provider installed");
    previous
}

/// Returns the active instance.
pub fn netlink_provider() -> Result<Arc<dyn NetlinkProvider>, ProviderError> {
    NETLINK_PROVIDER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .ok_or(ProviderError::NotInstalled)
}

/// Empties the slot.
pub fn clear_netlink_provider() {
    NETLINK_PROVIDER
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
}
