//! Process-wide bus-tree roots.

use std::path::{Path, PathBuf};
use std::sync::{LazyLock, PoisonError, RwLock, RwLockWriteGuard};

use super::{SYS_BUS_AUX_DEVICES, SYS_BUS_PCI_DEVICES};

/// Roots of the PCI and auxiliary device trees.
///
/// Also usable on its own as an explicit context object, see
/// [`crate::fixture::ActiveFixture::bus_paths`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusPaths {
    /// Directory whose entries are PCI devices (`/sys/bus/pci/devices`).
    pub pci_devices: PathBuf,
    /// Directory whose entries are auxiliary devices (`/sys/bus/auxiliary/devices`).
    pub aux_devices: PathBuf,
}

impl BusPaths {
    /// The real host locations.
    pub fn host() -> Self {
        Self::under(Path::new("/"))
    }

    /// Both trees rebased under `root`.
    pub fn under(root: &Path) -> Self {
        Self {
            pci_devices: root.join(SYS_BUS_PCI_DEVICES),
            aux_devices: root.join(SYS_BUS_AUX_DEVICES),
        }
    }
}

impl Default for BusPaths {
    fn default() -> Self {
        Self::host()
    }
}

/// Current roots plus every fixture publication still alive, oldest first.
#[derive(Debug)]
struct PathState {
    current: BusPaths,
    published: Vec<Publication>,
    next_id: u64,
}

#[derive(Debug)]
struct Publication {
    id: u64,
    paths: BusPaths,
    /// Roots to fall back to once this publication is withdrawn.
    previous: BusPaths,
}

/// Handle to a publication made by [`publish_bus_paths`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PublicationId(u64);

static BUS_PATHS: LazyLock<RwLock<PathState>> = LazyLock::new(|| {
    RwLock::new(PathState {
        current: BusPaths::host(),
        published: Vec::new(),
        next_id: 0,
    })
});

fn write_state() -> RwLockWriteGuard<'static, PathState> {
    BUS_PATHS.write().unwrap_or_else(PoisonError::into_inner)
}

/// Returns the current PCI device tree root.
pub fn sys_bus_pci() -> PathBuf {
    bus_paths().pci_devices
}

/// Returns the current auxiliary device tree root.
pub fn sys_bus_aux() -> PathBuf {
    bus_paths().aux_devices
}

/// Returns a copy of both current roots.
pub fn bus_paths() -> BusPaths {
    BUS_PATHS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .current
        .clone()
}

/// Replaces both roots, returning the values they had before.
///
/// Fixture publications are not tracked by this; use it for ad-hoc overrides.
pub fn set_bus_paths(paths: BusPaths) -> BusPaths {
    std::mem::replace(&mut write_state().current, paths)
}

/// Points both roots back at the host and forgets every live publication.
///
/// Fixtures torn down afterwards leave the roots alone.
pub fn reset_bus_paths() {
    let mut state = write_state();
    state.current = BusPaths::host();
    state.published.clear();
}

/// Makes `paths` the current roots and records what they replaced.
pub(crate) fn publish_bus_paths(paths: BusPaths) -> PublicationId {
    let mut state = write_state();
    let id = state.next_id;
    state.next_id += 1;
    let previous = std::mem::replace(&mut state.current, paths.clone());
    state.published.push(Publication {
        id,
        paths,
        previous,
    });
    PublicationId(id)
}

/// Withdraws a publication, in any order relative to the others.
///
/// Withdrawing the newest publication restores the roots it replaced, unless
/// they were overridden since. Withdrawing an older one hands its fallback to
/// the publication stacked directly above it, so the roots never fall back
/// to a tree that is already gone. Returns false for an unknown handle.
pub(crate) fn withdraw_bus_paths(id: PublicationId) -> bool {
    let mut guard = write_state();
    let state = &mut *guard;
    let Some(index) = state.published.iter().position(|p| p.id == id.0) else {
        return false;
    };
    let withdrawn = state.published.remove(index);

    match state.published.get_mut(index) {
        Some(above) => above.previous = withdrawn.previous,
        None => {
            if state.current == withdrawn.paths {
                state.current = withdrawn.previous;
            }
        }
    }
    true
}
