use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use crate::collect::SIMFS;
use crate::device::disk_name_of;
use crate::host::HostSystem;
use crate::model::{FilesystemInfo, LogicalVolume, PhysicalVolume};
use crate::topology::Inventory;

pub const MAX_LV_NESTING: usize = 16;

impl<H: HostSystem> Inventory<H> {
    pub fn holders(&self, device: &str) -> Vec<String> {
        if device == SIMFS {
            return Vec::new();
        }
        let Some(dir) = self.sys_dir(device) else {
            return Vec::new();
        };
        let path = format!("{dir}/holders");
        match self.host().list_directory(&path) {
            Ok(mut holders) => {
                holders.sort();
                holders
            }
            Err(err) => {
                debug!("cannot list {path}: {err}");
                Vec::new()
            }
        }
    }

    pub fn raid_holders(&self, device: &str) -> Vec<String> {
        self.holders(device)
            .into_iter()
            .filter(|holder| holder.starts_with("md"))
            .collect()
    }

    pub fn dm_holders(&self, device: &str) -> Vec<String> {
        let dm_names = self.dm_names();
        self.holders(device)
            .into_iter()
            .filter(|holder| holder.starts_with("dm-"))
            .map(|holder| dm_names.get(&holder).cloned().unwrap_or(holder))
            .collect()
    }

    // First hit of `lookup` on the device itself, then its RAID holders,
    // then its dm holders.
    pub fn resolve_first<'a, T, F>(&'a self, device: &str, lookup: F) -> Option<&'a T>
    where
        F: Fn(&str) -> Option<&'a T>,
    {
        if let Some(found) = lookup(device) {
            return Some(found);
        }
        self.raid_holders(device)
            .iter()
            .chain(self.dm_holders(device).iter())
            .find_map(|holder| lookup(holder))
    }

    pub fn filesystem_for(&self, device: &str) -> Option<&FilesystemInfo> {
        let filesystems = self.filesystems_by_device();
        self.resolve_first(device, |id| filesystems.get(id))
    }

    pub fn physical_volume_for(&self, device: &str) -> Option<&PhysicalVolume> {
        let volumes = self.physical_volumes();
        self.resolve_first(device, |id| volumes.get(id))
    }

    pub fn vm_for(&self, device: &str) -> Option<&str> {
        let vm_disks = self.vm_disks();
        self.resolve_first(device, |id| vm_disks.get(id))
            .map(String::as_str)
    }

    pub fn is_swap(&self, device: &str) -> bool {
        self.swap_devices().contains(device)
    }

    pub fn usage(&self, device: &str) -> String {
        let mut users = self
            .raid_holders(device)
            .into_iter()
            .map(|md| format!("{md}:"))
            .collect::<Vec<_>>();
        if let Some(pv) = self.physical_volume_for(device) {
            users.push(format!("LVM: {}", pv.vg_name));
        }
        if let Some(vm) = self.vm_for(device) {
            users.push(format!("KVM: {vm}"));
        }
        if self.is_swap(device) {
            users.push("swap".to_string());
        }
        if let Some(fs) = self.filesystem_for(device) {
            users.push(fs.fs_type.clone());
            users.push(fs.mount_point.clone());
        }
        users.retain(|user| !user.is_empty());
        users.join(" ")
    }

    // RAID membership alone does not count: an idle array member is unused.
    pub fn is_used(&self, device: &str) -> bool {
        self.physical_volume_for(device).is_some()
            || self.vm_for(device).is_some()
            || self.is_swap(device)
            || self.filesystem_for(device).is_some()
    }

    pub fn disks_of(&self, lv: &LogicalVolume) -> BTreeSet<String> {
        let mut disks = BTreeSet::new();
        let mut visited = HashSet::new();
        self.collect_disks_of(lv, 0, &mut visited, &mut disks);
        disks
    }

    fn collect_disks_of(
        &self,
        lv: &LogicalVolume,
        depth: usize,
        visited: &mut HashSet<(String, String)>,
        disks: &mut BTreeSet<String>,
    ) {
        if !visited.insert((lv.vg_name.clone(), lv.name.clone())) {
            debug!("logical volume {}/{} references itself", lv.vg_name, lv.name);
            return;
        }
        for reference in &lv.located_on {
            if reference.starts_with("/dev/") {
                let partition = self
                    .canonicalize(reference)
                    .unwrap_or_else(|| reference.clone());
                disks.insert(disk_name_of(&partition).to_string());
                continue;
            }
            let nested_name = format!("[{reference}]");
            match self.logical_volume(&lv.vg_name, &nested_name) {
                Some(nested) if depth < MAX_LV_NESTING => {
                    self.collect_disks_of(nested, depth + 1, visited, disks);
                }
                Some(_) => {
                    debug!(
                        "giving up on {}/{nested_name}: nested deeper than {MAX_LV_NESTING}",
                        lv.vg_name
                    );
                    disks.insert(reference.clone());
                }
                None => {
                    disks.insert(reference.clone());
                }
            }
        }
    }
}
