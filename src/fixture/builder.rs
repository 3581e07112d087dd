//! Materializes a [`FixtureSpec`] on disk and publishes its bus-tree roots.
//!
//! Steps run in a fixed order: temp root, declared dirs, declared files,
//! support dirs, `pci.ids`, declared symlinks, bus-tree roots. A failure at
//! any step removes the partial tree and leaves the process-wide roots alone.

use std::fs::{DirBuilder, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt, symlink};
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info, warn};

use super::config::{FixtureConfig, PciIdsSource};
use super::spec::FixtureSpec;
use crate::error::FixtureError;
use crate::hostfs::{FileSystem, RealFs};
use crate::sysfs::{
    BusPaths, CDI_DIR, HWDATA_DIR, PCI_IDS, PublicationId, publish_bus_paths, withdraw_bus_paths,
};

const DIR_MODE: u32 = 0o755;
const FILE_MODE: u32 = 0o600;

impl FixtureSpec {
    /// Builds the fixture using [`FixtureConfig::from_env`] and the real host.
    ///
    /// # Panics
    /// On any setup failure. A broken fixture makes the test meaningless.
    pub fn activate(&self) -> ActiveFixture {
        self.activate_with(&FixtureConfig::from_env(), &RealFs::new())
    }

    /// Builds the fixture with an explicit config and host filesystem.
    ///
    /// # Panics
    /// On any setup failure.
    pub fn activate_with<F: FileSystem + ?Sized>(
        &self,
        config: &FixtureConfig,
        host: &F,
    ) -> ActiveFixture {
        match self.try_activate(config, host) {
            Ok(fixture) => fixture,
            Err(e) => panic!("{}", e),
        }
    }

    /// Builds the fixture, returning the first failure instead of panicking.
    ///
    /// # Arguments
    /// * `config` - Temp location, `pci.ids` source and publishing mode
    /// * `host` - Filesystem the host `pci.ids` is read from
    pub fn try_activate<F: FileSystem + ?Sized>(
        &self,
        config: &FixtureConfig,
        host: &F,
    ) -> Result<ActiveFixture, FixtureError> {
        self.validate()?;

        let root = create_root(config)?;
        let base = root.path();
        debug!(root = %base.display(), "created fixture root");

        for dir in &self.dirs {
            create_dir(&base.join(dir))?;
        }
        for (name, body) in &self.files {
            write_file(&base.join(name), body)?;
        }

        create_dir(&base.join(HWDATA_DIR))?;
        create_dir(&base.join(CDI_DIR))?;

        let pci_ids = load_pci_ids(&config.pci_ids, host)?;
        write_file(&base.join(PCI_IDS), &pci_ids)?;

        for (link, target) in &self.symlinks {
            create_symlink(&base.join(link), target)?;
        }
        debug!(
            dirs = self.dirs.len(),
            files = self.files.len(),
            symlinks = self.symlinks.len(),
            "populated fixture tree"
        );

        let root_path = base.to_path_buf();
        let bus_paths = BusPaths::under(&root_path);
        let publication = config
            .publish_bus_paths
            .then(|| publish_bus_paths(bus_paths.clone()));

        info!(
            root = %root_path.display(),
            published = config.publish_bus_paths,
            "fixture activated"
        );

        Ok(ActiveFixture {
            root_path,
            root: Some(root),
            bus_paths,
            publication,
        })
    }
}

/// A materialized fixture tree.
///
/// Dropping it removes the tree and withdraws its bus-tree roots, logging
/// rather than panicking on failure. Fixtures may be torn down in any order;
/// the roots never fall back to a tree that was already removed. Use [`ActiveFixture::teardown`]
/// to make cleanup failures fail the test.
#[derive(Debug)]
pub struct ActiveFixture {
    root_path: PathBuf,
    root: Option<TempDir>,
    bus_paths: BusPaths,
    /// `None` when not published.
    publication: Option<PublicationId>,
}

impl ActiveFixture {
    /// The fixture root directory.
    pub fn root(&self) -> &Path {
        &self.root_path
    }

    /// Resolves a path relative to the fixture root.
    pub fn path(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.root_path.join(rel)
    }

    /// The bus-tree roots of this fixture, whether or not they were published.
    pub fn bus_paths(&self) -> &BusPaths {
        &self.bus_paths
    }

    /// Removes the tree and restores the previous bus-tree roots.
    pub fn try_teardown(mut self) -> Result<(), FixtureError> {
        self.release()
    }

    /// Removes the tree and restores the previous bus-tree roots.
    ///
    /// # Panics
    /// If the tree cannot be removed.
    pub fn teardown(self) {
        if let Err(e) = self.try_teardown() {
            panic!("{}", e);
        }
    }

    fn release(&mut self) -> Result<(), FixtureError> {
        if let Some(publication) = self.publication.take() {
            if !withdraw_bus_paths(publication) {
                debug!(
                    root = %self.root_path.display(),
                    "bus paths reset since activation, leaving them"
                );
            }
        }

        let Some(root) = self.root.take() else {
            return Ok(());
        };
        root.close().map_err(|source| FixtureError::Teardown {
            root: self.root_path.clone(),
            source,
        })?;
        info!(root = %self.root_path.display(), "fixture torn down");
        Ok(())
    }
}

impl Drop for ActiveFixture {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(error = %e, "fixture cleanup failed");
        }
    }
}

fn create_root(config: &FixtureConfig) -> Result<TempDir, FixtureError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(&config.temp_prefix);
    let root = match &config.temp_parent {
        Some(parent) => builder.tempdir_in(parent),
        None => builder.tempdir(),
    };
    root.map_err(FixtureError::CreateRoot)
}

fn create_dir(path: &Path) -> Result<(), FixtureError> {
    DirBuilder::new()
        .recursive(true)
        .mode(DIR_MODE)
        .create(path)
        .map_err(|source| FixtureError::CreateDir {
            path: path.to_path_buf(),
            source,
        })
}

fn create_parent(path: &Path) -> Result<(), FixtureError> {
    match path.parent() {
        Some(parent) if !parent.exists() => create_dir(parent),
        _ => Ok(()),
    }
}

fn write_file(path: &Path, body: &[u8]) -> Result<(), FixtureError> {
    create_parent(path)?;
    let write = || -> io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(FILE_MODE)
            .open(path)?;
        file.write_all(body)
    };
    write().map_err(|source| FixtureError::WriteFile {
        path: path.to_path_buf(),
        source,
    })
}

fn create_symlink(link: &Path, target: &Path) -> Result<(), FixtureError> {
    create_parent(link)?;
    symlink(target, link).map_err(|source| FixtureError::Symlink {
        link: link.to_path_buf(),
        target: target.to_path_buf(),
        source,
    })
}

/// Resolves the vendor/device-ID database bytes.
///
/// Host candidates are probed in order; only a missing file moves on to the
/// next one; any other read error is reported against its path.
fn load_pci_ids<F: FileSystem + ?Sized>(
    source: &PciIdsSource,
    host: &F,
) -> Result<Vec<u8>, FixtureError> {
    let candidates = match source {
        PciIdsSource::Bundled(bytes) => {
            debug!(bytes = bytes.len(), "using bundled pci.ids");
            return Ok(bytes.clone());
        }
        PciIdsSource::Host(candidates) => candidates,
    };

    for path in candidates {
        match host.read(path) {
            Ok(bytes) => {
                debug!(path = %path.display(), bytes = bytes.len(), "using host pci.ids");
                return Ok(bytes);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "host pci.ids not present");
            }
            Err(source) => {
                return Err(FixtureError::ReadPciIds {
                    path: path.clone(),
                    source,
                });
            }
        }
    }

    Err(FixtureError::PciIdsNotFound {
        searched: candidates.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hostfs::MockFs;
    use crate::sysfs::{bus_paths, reset_bus_paths, sys_bus_aux, sys_bus_pci};
    use serial_test::serial;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    const PCI_IDS_BODY: &str = "8086  Intel Corporation\n\t1572  Ethernet Controller X710\n";

    fn host_with_hwdata() -> MockFs {
        MockFs::new().with_file("/usr/share/hwdata/pci.ids", PCI_IDS_BODY)
    }

    fn scratch_config(scratch: &TempDir) -> FixtureConfig {
        FixtureConfig::default()
            .with_temp_parent(scratch.path())
            .unpublished()
    }

    fn mode(path: &Path) -> u32 {
        fs::symlink_metadata(path).unwrap().permissions().mode() & 0o777
    }

    fn scenario_spec() -> FixtureSpec {
        FixtureSpec::new()
            .dir("sys/bus/pci/devices/0000:00:00.0")
            .file("config/foo.yaml", "a: 1")
            .symlink(
                "sys/bus/pci/devices/0000:00:00.0/link",
                "../../../../class/net/eth0",
            )
    }

    #[test]
    #[serial(process_state)]
    fn test_concrete_scenario_end_to_end() {
        crate::logging::init_test_tracing();
        reset_bus_paths();
        let scratch = tempfile::tempdir().unwrap();
        let config = FixtureConfig::default().with_temp_parent(scratch.path());

        let fixture = scenario_spec().activate_with(&config, &host_with_hwdata());
        let root = fixture.root().to_path_buf();

        assert!(root.join("sys/bus/pci/devices/0000:00:00.0").is_dir());
        assert_eq!(
            fs::read_to_string(root.join("config/foo.yaml")).unwrap(),
            "a: 1"
        );
        assert_eq!(
            fs::read_link(root.join("sys/bus/pci/devices/0000:00:00.0/link")).unwrap(),
            PathBuf::from("../../../../class/net/eth0")
        );
        assert!(sys_bus_pci().starts_with(&root));
        assert!(sys_bus_aux().starts_with(&root));
        assert_eq!(sys_bus_pci(), root.join("sys/bus/pci/devices"));
        assert_eq!(sys_bus_aux(), root.join("sys/bus/auxiliary/devices"));

        fixture.teardown();

        let err = fs::metadata(&root).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert_eq!(bus_paths(), BusPaths::host());
    }

    #[test]
    fn test_declared_entries_and_support_files_exist() {
        let scratch = tempfile::tempdir().unwrap();
        let spec = FixtureSpec::new()
            .dir("a/b/c")
            .dir("d")
            .file("d/one", "1")
            .file("two", vec![0u8, 1, 2]);

        let fixture = spec.activate_with(&scratch_config(&scratch), &host_with_hwdata());

        assert!(fixture.path("a/b/c").is_dir());
        assert!(fixture.path("d").is_dir());
        assert_eq!(fs::read(fixture.path("d/one")).unwrap(), b"1");
        assert_eq!(fs::read(fixture.path("two")).unwrap(), vec![0u8, 1, 2]);
        assert!(fixture.path("usr/share/hwdata").is_dir());
        assert!(fixture.path("var/run/cdi").is_dir());
        assert_eq!(
            fs::read_to_string(fixture.path("usr/share/hwdata/pci.ids")).unwrap(),
            PCI_IDS_BODY
        );
    }

    #[test]
    fn test_root_naming_and_permissions() {
        let scratch = tempfile::tempdir().unwrap();
        let fixture = FixtureSpec::new()
            .dir("sys")
            .file("sys/attr", "x")
            .activate_with(&scratch_config(&scratch), &host_with_hwdata());

        let name = fixture.root().file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("sriov"));
        assert_eq!(fixture.root().parent(), Some(scratch.path()));
        assert_eq!(mode(fixture.root()) & 0o077, 0);
        assert_eq!(mode(&fixture.path("sys/attr")), 0o600);
    }

    #[test]
    fn test_declared_dirs_use_dir_mode() {
        let scratch = tempfile::tempdir().unwrap();
        let fixture = FixtureSpec::new()
            .dir("sys/bus")
            .file("config/foo.yaml", "a: 1")
            .activate_with(&scratch_config(&scratch), &host_with_hwdata());

        let umask_dir = scratch.path().join("umask");
        DirBuilder::new().mode(0o777).create(&umask_dir).unwrap();
        let umask = !mode(&umask_dir) & 0o777;

        for dir in ["sys", "sys/bus", "config", HWDATA_DIR, CDI_DIR] {
            assert_eq!(
                mode(&fixture.path(dir)),
                DIR_MODE & !umask,
                "mode of {}",
                dir
            );
        }
    }

    #[test]
    fn test_nested_symlink_cannot_escape_root() {
        let scratch = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let err = FixtureSpec::new()
            .symlink("a", outside.path())
            .symlink("a/b", "target")
            .try_activate(&scratch_config(&scratch), &host_with_hwdata())
            .unwrap_err();

        assert!(matches!(err, FixtureError::InvalidPath(p) if p == Path::new("a/b")));
        assert_eq!(fs::read_dir(outside.path()).unwrap().count(), 0);
        assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_each_activation_gets_a_fresh_root() {
        let scratch = tempfile::tempdir().unwrap();
        let config = scratch_config(&scratch);
        let host = host_with_hwdata();

        let first = FixtureSpec::new().activate_with(&config, &host);
        let second = FixtureSpec::new().activate_with(&config, &host);
        assert_ne!(first.root(), second.root());
    }

    #[test]
    fn test_file_overwrites_existing_content() {
        let scratch = tempfile::tempdir().unwrap();
        let fixture = FixtureSpec::new()
            .file("usr/share/hwdata/pci.ids", "stale")
            .activate_with(&scratch_config(&scratch), &host_with_hwdata());

        assert_eq!(
            fs::read_to_string(fixture.path(PCI_IDS)).unwrap(),
            PCI_IDS_BODY
        );
    }

    #[test]
    fn test_symlink_targets_are_verbatim() {
        let scratch = tempfile::tempdir().unwrap();
        let fixture = FixtureSpec::new()
            .symlink("dangling", "does/not/exist")
            .symlink("absolute", "/definitely/not/here")
            .symlink("nested/parent/link", "../sibling")
            .activate_with(&scratch_config(&scratch), &host_with_hwdata());

        for (link, target) in [
            ("dangling", "does/not/exist"),
            ("absolute", "/definitely/not/here"),
            ("nested/parent/link", "../sibling"),
        ] {
            assert_eq!(
                fs::read_link(fixture.path(link)).unwrap(),
                PathBuf::from(target)
            );
            assert!(!fixture.path(link).exists());
        }
    }

    #[test]
    fn test_pci_ids_falls_back_to_misc() {
        let scratch = tempfile::tempdir().unwrap();
        let host = MockFs::new().with_file("/usr/share/misc/pci.ids", "debian");

        let fixture = FixtureSpec::new().activate_with(&scratch_config(&scratch), &host);
        assert_eq!(fs::read_to_string(fixture.path(PCI_IDS)).unwrap(), "debian");
    }

    #[test]
    fn test_pci_ids_prefers_hwdata() {
        let scratch = tempfile::tempdir().unwrap();
        let host = MockFs::new()
            .with_file("/usr/share/hwdata/pci.ids", "hwdata")
            .with_file("/usr/share/misc/pci.ids", "misc");

        let fixture = FixtureSpec::new().activate_with(&scratch_config(&scratch), &host);
        assert_eq!(fs::read_to_string(fixture.path(PCI_IDS)).unwrap(), "hwdata");
    }

    #[test]
    fn test_bundled_pci_ids_skips_host() {
        let scratch = tempfile::tempdir().unwrap();
        let config = scratch_config(&scratch).with_bundled_pci_ids("bundled");

        let fixture = FixtureSpec::new().activate_with(&config, &MockFs::new());
        assert_eq!(fs::read_to_string(fixture.path(PCI_IDS)).unwrap(), "bundled");
    }

    #[test]
    #[serial(process_state)]
    fn test_missing_pci_ids_leaves_no_state() {
        reset_bus_paths();
        let scratch = tempfile::tempdir().unwrap();
        let config = FixtureConfig::default().with_temp_parent(scratch.path());

        let err = scenario_spec()
            .try_activate(&config, &MockFs::new())
            .unwrap_err();

        assert!(matches!(
            &err,
            FixtureError::PciIdsNotFound { searched } if searched.len() == 2
        ));
        assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
        assert_eq!(bus_paths(), BusPaths::host());
    }

    #[test]
    #[should_panic(expected = "pci.ids not found")]
    fn test_activate_with_panics_on_missing_pci_ids() {
        let scratch = tempfile::tempdir().unwrap();
        FixtureSpec::new().activate_with(&scratch_config(&scratch), &MockFs::new());
    }

    #[test]
    fn test_invalid_path_fails_before_creating_root() {
        let scratch = tempfile::tempdir().unwrap();
        let err = FixtureSpec::new()
            .file("../escape", "x")
            .try_activate(&scratch_config(&scratch), &host_with_hwdata())
            .unwrap_err();

        assert!(matches!(err, FixtureError::InvalidPath(_)));
        assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_symlink_collision_is_reported() {
        let scratch = tempfile::tempdir().unwrap();
        let err = FixtureSpec::new()
            .file("taken", "x")
            .symlink("taken", "elsewhere")
            .try_activate(&scratch_config(&scratch), &host_with_hwdata())
            .unwrap_err();

        assert!(err.to_string().starts_with("error creating fake symlink"));
        assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_unpublished_fixture_exposes_context() {
        let scratch = tempfile::tempdir().unwrap();
        let fixture = FixtureSpec::new()
            .dir("sys/bus/pci/devices/0000:3b:00.0")
            .activate_with(&scratch_config(&scratch), &host_with_hwdata());

        let paths = fixture.bus_paths();
        assert_eq!(paths.pci_devices, fixture.path("sys/bus/pci/devices"));
        assert!(paths.pci_devices.join("0000:3b:00.0").is_dir());
    }

    #[test]
    fn test_try_teardown_removes_root() {
        let scratch = tempfile::tempdir().unwrap();
        let fixture = scenario_spec().activate_with(&scratch_config(&scratch), &host_with_hwdata());
        let root = fixture.root().to_path_buf();

        fixture.try_teardown().unwrap();
        assert!(!root.exists());
    }

    #[test]
    fn test_teardown_of_vanished_root_fails() {
        let scratch = tempfile::tempdir().unwrap();
        let fixture = FixtureSpec::new().activate_with(&scratch_config(&scratch), &host_with_hwdata());
        fs::remove_dir_all(fixture.root()).unwrap();

        let err = fixture.try_teardown().unwrap_err();
        assert!(matches!(err, FixtureError::Teardown { .. }));
    }

    #[test]
    #[serial(process_state)]
    fn test_drop_cleans_up_after_panic() {
        crate::logging::init_test_tracing();
        reset_bus_paths();
        let scratch = tempfile::tempdir().unwrap();
        let config = FixtureConfig::default()
            .with_temp_parent(scratch.path())
            .with_bundled_pci_ids("x");

        let result = std::panic::catch_unwind(|| {
            let _fixture = FixtureSpec::new().dir("sys").activate_with(&config, &MockFs::new());
            panic!("assertion failed inside test body");
        });

        assert!(result.is_err());
        assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
        assert_eq!(bus_paths(), BusPaths::host());
    }

    #[test]
    #[serial(process_state)]
    fn test_nested_fixtures_restore_in_order() {
        reset_bus_paths();
        let scratch = tempfile::tempdir().unwrap();
        let config = FixtureConfig::default()
            .with_temp_parent(scratch.path())
            .with_bundled_pci_ids("x");
        let host = MockFs::new();

        let outer = FixtureSpec::new().activate_with(&config, &host);
        let inner = FixtureSpec::new().activate_with(&config, &host);
        assert_eq!(bus_paths(), *inner.bus_paths());

        inner.teardown();
        assert_eq!(bus_paths(), *outer.bus_paths());

        outer.teardown();
        assert_eq!(bus_paths(), BusPaths::host());
    }

    #[test]
    #[serial(process_state)]
    fn test_out_of_order_teardown_never_points_at_removed_root() {
        reset_bus_paths();
        let scratch = tempfile::tempdir().unwrap();
        let config = FixtureConfig::default()
            .with_temp_parent(scratch.path())
            .with_bundled_pci_ids("x");
        let host = MockFs::new();

        let outer = FixtureSpec::new().activate_with(&config, &host);
        let inner = FixtureSpec::new().activate_with(&config, &host);
        let outer_root = outer.root().to_path_buf();
        let inner_paths = inner.bus_paths().clone();

        outer.teardown();
        assert!(!outer_root.exists());
        assert_eq!(bus_paths(), inner_paths);

        inner.teardown();
        assert!(!sys_bus_pci().starts_with(&outer_root));
        assert_eq!(bus_paths(), BusPaths::host());
    }
}
