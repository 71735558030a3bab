use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use once_cell::unsync::OnceCell;
use tracing::warn;

use crate::canonical;
use crate::collect;
use crate::error::CollectError;
use crate::host::HostSystem;
use crate::model::{
    DeviceMapperAlias, DeviceMapperEntry, FilesystemInfo, LogicalVolume, PhysicalVolume,
    VolumeGroup,
};

pub struct Inventory<H: HostSystem> {
    host: H,
    warnings: RefCell<Vec<String>>,
    dm_aliases: OnceCell<Vec<DeviceMapperAlias>>,
    dm_names: OnceCell<HashMap<String, String>>,
    device_mapper: OnceCell<HashMap<String, DeviceMapperEntry>>,
    swap_devices: OnceCell<HashSet<String>>,
    filesystems: OnceCell<Vec<FilesystemInfo>>,
    filesystems_by_device: OnceCell<HashMap<String, FilesystemInfo>>,
    physical_volumes: OnceCell<HashMap<String, PhysicalVolume>>,
    volume_groups: OnceCell<Vec<VolumeGroup>>,
    logical_volumes: OnceCell<Vec<LogicalVolume>>,
    logical_volumes_by_name: OnceCell<HashMap<(String, String), LogicalVolume>>,
    vm_disks: OnceCell<HashMap<String, String>>,
    physical_disks: OnceCell<Vec<String>>,
    root_filesystem_bytes: OnceCell<u64>,
}

impl<H: HostSystem> Inventory<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            warnings: RefCell::new(Vec::new()),
            dm_aliases: OnceCell::new(),
            dm_names: OnceCell::new(),
            device_mapper: OnceCell::new(),
            swap_devices: OnceCell::new(),
            filesystems: OnceCell::new(),
            filesystems_by_device: OnceCell::new(),
            physical_volumes: OnceCell::new(),
            volume_groups: OnceCell::new(),
            logical_volumes: OnceCell::new(),
            logical_volumes_by_name: OnceCell::new(),
            vm_disks: OnceCell::new(),
            physical_disks: OnceCell::new(),
            root_filesystem_bytes: OnceCell::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        warn!("{message}");
        self.warnings.borrow_mut().push(message);
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.borrow().clone()
    }

    fn or_warn<T: Default>(&self, context: &str, result: Result<T, CollectError>) -> T {
        match result {
            Ok(value) => value,
            Err(err) => {
                self.warn(format!("{context}: {err}"));
                T::default()
            }
        }
    }

    // Canonical id of a `/dev/...` path. Only depends on the `/dev/mapper`
    // listing, so it is safe to call while any other table is being built.
    pub fn canonicalize(&self, device: &str) -> Option<String> {
        canonical::canonicalize(&self.host, self.dm_names(), device)
    }

    pub fn device_mapper_aliases(&self) -> &[DeviceMapperAlias] {
        self.dm_aliases.get_or_init(|| {
            let aliases = collect::collect_device_mapper_aliases(&self.host);
            self.or_warn("cannot list device-mapper aliases", aliases)
        })
    }

    pub fn dm_names(&self) -> &HashMap<String, String> {
        self.dm_names
            .get_or_init(|| canonical::alias_map(self.device_mapper_aliases()))
    }

    pub fn device_mapper(&self) -> &HashMap<String, DeviceMapperEntry> {
        self.device_mapper.get_or_init(|| {
            let entries = self.or_warn(
                "cannot list device-mapper devices",
                collect::collect_device_mapper(&self.host),
            );
            entries
                .into_iter()
                .map(|entry| (entry.name.clone(), entry))
                .collect()
        })
    }

    pub fn swap_devices(&self) -> &HashSet<String> {
        self.swap_devices.get_or_init(|| {
            let devices =
                collect::collect_swap_devices(&self.host, |device| self.canonicalize(device));
            self.or_warn("cannot list swap devices", devices)
                .into_iter()
                .collect()
        })
    }

    pub fn filesystems(&self) -> &[FilesystemInfo] {
        self.filesystems.get_or_init(|| {
            let filesystems =
                collect::collect_filesystems(&self.host, |device| self.canonicalize(device));
            self.or_warn("cannot list filesystems", filesystems)
        })
    }

    pub fn filesystems_by_device(&self) -> &HashMap<String, FilesystemInfo> {
        self.filesystems_by_device.get_or_init(|| {
            self.filesystems()
                .iter()
                .map(|fs| (fs.device.clone(), fs.clone()))
                .collect()
        })
    }

    pub fn physical_volumes(&self) -> &HashMap<String, PhysicalVolume> {
        self.physical_volumes.get_or_init(|| {
            let volumes =
                collect::collect_physical_volumes(&self.host, |device| self.canonicalize(device));
            self.or_warn("cannot list LVM physical volumes", volumes)
                .into_iter()
                .map(|pv| (pv.device.clone(), pv))
                .collect()
        })
    }

    pub fn volume_groups(&self) -> &[VolumeGroup] {
        self.volume_groups.get_or_init(|| {
            if !self.host.is_root() {
                self.warn("cannot list LVM devices: running as non-root");
            }
            let groups = collect::collect_volume_groups(&self.host);
            self.or_warn("cannot list LVM volume groups", groups)
        })
    }

    pub fn all_logical_volumes(&self) -> &[LogicalVolume] {
        self.logical_volumes.get_or_init(|| {
            let volumes = collect::collect_logical_volumes(&self.host);
            self.or_warn("cannot list LVM logical volumes", volumes)
        })
    }

    pub fn public_logical_volumes(&self) -> impl Iterator<Item = &LogicalVolume> {
        self.all_logical_volumes().iter().filter(|lv| lv.is_public())
    }

    pub fn logical_volume(&self, vg_name: &str, lv_name: &str) -> Option<&LogicalVolume> {
        self.logical_volumes_by_name
            .get_or_init(|| {
                self.all_logical_volumes()
                    .iter()
                    .map(|lv| ((lv.vg_name.clone(), lv.name.clone()), lv.clone()))
                    .collect()
            })
            .get(&(vg_name.to_string(), lv_name.to_string()))
    }

    pub fn vm_disks(&self) -> &HashMap<String, String> {
        self.vm_disks.get_or_init(|| {
            let mappings = collect::collect_vm_disks(&self.host, |device| self.canonicalize(device));
            self.or_warn("cannot list KVM virtual machines", mappings)
                .into_iter()
                .map(|mapping| (mapping.device, mapping.vm_name))
                .collect()
        })
    }

    pub fn physical_disks(&self) -> &[String] {
        self.physical_disks.get_or_init(|| {
            let disks = collect::collect_physical_disks(&self.host);
            self.or_warn("cannot discover block devices", disks)
        })
    }

    pub fn root_filesystem_bytes(&self) -> u64 {
        *self
            .root_filesystem_bytes
            .get_or_init(|| match self.host.root_filesystem_bytes() {
                Ok(bytes) => bytes,
                Err(err) => {
                    self.warn(format!("cannot determine size of /: {err}"));
                    0
                }
            })
    }
}
