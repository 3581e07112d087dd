//! Scripted stand-in for [`NetlinkProvider`].
//!
//! Behavior is declared up front as `(method, argument matcher) -> response`
//! pairs. The first matching expectation for a method wins; a call nothing
//! matches returns [`ProviderError::Unscripted`]. Every call is recorded.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use super::provider::{NetlinkProvider, set_netlink_provider};
use super::types::{EswitchAttrs, LinkAttrs, Route};
use crate::error::ProviderError;

/// Encapsulation type reported by [`ScriptedProvider::default_mock`].
pub const FAKE_LINK_TYPE: &str = "fakeLinkType";
/// Eswitch mode reported by [`ScriptedProvider::default_mock`].
pub const FAKE_ESWITCH_MODE: &str = "fakeMode";

/// The provider operations, named as in the netlink library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    LinkAttrs,
    EswitchAttrs,
    Ipv4Routes,
}

impl Method {
    /// Name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Method::LinkAttrs => "GetLinkAttrs",
            Method::EswitchAttrs => "GetDevLinkDeviceEswitchAttrs",
            Method::Ipv4Routes => "GetIPv4RouteList",
        }
    }
}

/// Which argument values an expectation applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgMatcher {
    /// Any string.
    Any,
    /// Exactly this string.
    Exact(String),
}

impl ArgMatcher {
    /// Shorthand for [`ArgMatcher::Exact`].
    pub fn exact(arg: impl Into<String>) -> Self {
        ArgMatcher::Exact(arg.into())
    }

    fn matches(&self, arg: &str) -> bool {
        match self {
            ArgMatcher::Any => true,
            ArgMatcher::Exact(expected) => expected == arg,
        }
    }
}

/// A recorded provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub method: Method,
    /// Interface name or PCI address passed to the call.
    pub arg: String,
}

type Script<T> = Vec<(ArgMatcher, Result<T, ProviderError>)>;

/// A provider whose answers are declared up front.
///
/// ```
/// use hwtree_fixture::netlink::{ArgMatcher, LinkAttrs, NetlinkProvider, ScriptedProvider};
///
/// let provider = ScriptedProvider::new().on_link_attrs(
///     ArgMatcher::exact("eth0"),
///     Ok(LinkAttrs { mtu: 9000, ..Default::default() }),
/// );
/// assert_eq!(provider.get_link_attrs("eth0").unwrap().mtu, 9000);
/// assert!(provider.get_link_attrs("eth1").is_err());
/// ```
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    link_attrs: Script<LinkAttrs>,
    eswitch_attrs: Script<EswitchAttrs>,
    ipv4_routes: Script<Vec<Route>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedProvider {
    /// Creates a provider with no expectations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every query with a fixed synthetic record.
    ///
    /// Link queries report [`FAKE_LINK_TYPE`], eswitch queries report
    /// [`FAKE_ESWITCH_MODE`], and route queries return one route with no
    /// destination.
    pub fn default_mock() -> Self {
        Self::new()
            .on_link_attrs(
                ArgMatcher::Any,
                Ok(LinkAttrs {
                    encap_type: FAKE_LINK_TYPE.to_string(),
                    ..Default::default()
                }),
            )
            .on_eswitch_attrs(
                ArgMatcher::Any,
                Ok(EswitchAttrs {
                    mode: FAKE_ESWITCH_MODE.to_string(),
                    ..Default::default()
                }),
            )
            .on_ipv4_routes(ArgMatcher::Any, Ok(vec![Route::default()]))
    }

    /// Answers matching link queries with `response`.
    ///
    /// Expectations are tried in registration order; the first match wins.
    pub fn on_link_attrs(
        mut self,
        matcher: ArgMatcher,
        response: Result<LinkAttrs, ProviderError>,
    ) -> Self {
        self.link_attrs.push((matcher, response));
        self
    }

    /// Answers matching eswitch queries with `response`.
    pub fn on_eswitch_attrs(
        mut self,
        matcher: ArgMatcher,
        response: Result<EswitchAttrs, ProviderError>,
    ) -> Self {
        self.eswitch_attrs.push((matcher, response));
        self
    }

    /// Answers matching route queries with `response`.
    pub fn on_ipv4_routes(
        mut self,
        matcher: ArgMatcher,
        response: Result<Vec<Route>, ProviderError>,
    ) -> Self {
        self.ipv4_routes.push((matcher, response));
        self
    }

    /// Installs this provider as the process-wide instance.
    pub fn install(self) -> Arc<Self> {
        let provider = Arc::new(self);
        set_netlink_provider(provider.clone());
        provider
    }

    /// All calls so far, oldest first.
    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of calls made to `method`.
    pub fn call_count(&self, method: Method) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|call| call.method == method)
            .count()
    }

    fn answer<T: Clone>(
        &self,
        method: Method,
        script: &Script<T>,
        arg: &str,
    ) -> Result<T, ProviderError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Call {
                method,
                arg: arg.to_string(),
            });

        script
            .iter()
            .find(|(matcher, _)| matcher.matches(arg))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| {
                Err(ProviderError::Unscripted {
                    method: method.name(),
                    arg: arg.to_string(),
                })
            })
    }
}

impl NetlinkProvider for ScriptedProvider {
    fn get_link_attrs(&self, name: &str) -> Result<LinkAttrs, ProviderError> {
        self.answer(Method::LinkAttrs, &self.link_attrs, name)
    }

    fn get_devlink_device_eswitch_attrs(
        &self,
        pci_addr: &str,
    ) -> Result<EswitchAttrs, ProviderError> {
        self.answer(Method::EswitchAttrs, &self.eswitch_attrs, pci_addr)
    }

    fn get_ipv4_route_list(&self, name: &str) -> Result<Vec<Route>, ProviderError> {
        self.answer(Method::Ipv4Routes, &self.ipv4_routes, name)
    }
}

/// Installs [`ScriptedProvider::default_mock`] as the process-wide provider.
///
/// Any previously installed provider is discarded. The returned handle can
/// be used to assert on recorded calls.
pub fn install_default_mock() -> Arc<ScriptedProvider> {
    let provider = ScriptedProvider::default_mock().install();
    debug!("default mock netlink provider installed");
    provider
}
