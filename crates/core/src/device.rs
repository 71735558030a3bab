use tracing::debug;

use crate::collect::{SIMFS, SYS_BLOCK};
use crate::host::HostSystem;
use crate::topology::Inventory;

// The kernel counts in 512-byte sectors regardless of the disk's real
// sector size.
pub const SECTOR_SIZE: u64 = 512;

const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskProbe {
    pub name: String,
    pub model: String,
    pub size_bytes: u64,
    pub firmware_rev: String,
    pub is_ssd: bool,
}

pub fn disk_name_of(partition: &str) -> &str {
    let disk = partition.trim_end_matches(|c: char| c.is_ascii_digit());
    match disk.strip_suffix('p') {
        Some(stem) if stem.ends_with(|c: char| c.is_ascii_digit()) => stem,
        _ => disk,
    }
}

impl<H: HostSystem> Inventory<H> {
    pub fn probe_disk(&self, disk: &str) -> DiskProbe {
        DiskProbe {
            name: disk.to_string(),
            model: self.disk_model(disk),
            size_bytes: self.disk_size_bytes(disk),
            firmware_rev: self.disk_firmware_rev(disk),
            is_ssd: self.is_ssd(disk),
        }
    }

    pub fn disk_size_bytes(&self, disk: &str) -> u64 {
        if disk == SIMFS {
            return self.root_filesystem_bytes();
        }
        self.read_sectors(&format!("{SYS_BLOCK}/{disk}/size"))
            .unwrap_or_else(|| {
                self.warn(format!("cannot determine size of {disk}"));
                0
            })
    }

    pub fn disk_model(&self, disk: &str) -> String {
        if disk.starts_with("xvd") {
            return "Xen virtual disk".to_string();
        }
        if disk.starts_with("vd") {
            return "KVM virtual disk".to_string();
        }
        if disk == SIMFS {
            return "OpenVZ virtual filesystem".to_string();
        }
        let path = format!("{SYS_BLOCK}/{disk}/device/model");
        self.host().read_attribute(&path).unwrap_or_else(|err| {
            debug!("cannot read {path}: {err}");
            UNKNOWN.to_string()
        })
    }

    pub fn disk_firmware_rev(&self, disk: &str) -> String {
        if ["xvd", "vd", SIMFS]
            .iter()
            .any(|prefix| disk.starts_with(prefix))
        {
            return "N/A".to_string();
        }
        let firmware_rev = format!("{SYS_BLOCK}/{disk}/device/firmware_rev");
        let path = if self.host().path_exists(&firmware_rev) {
            firmware_rev
        } else {
            format!("{SYS_BLOCK}/{disk}/device/rev")
        };
        self.host().read_attribute(&path).unwrap_or_else(|err| {
            debug!("cannot read {path}: {err}");
            UNKNOWN.to_string()
        })
    }

    // Non-rotational according to the block queue. Devices without a queue
    // directory (dm-crypt and friends) count as rotational.
    pub fn is_ssd(&self, disk: &str) -> bool {
        if disk == SIMFS {
            return false;
        }
        self.host()
            .read_attribute(&format!("{SYS_BLOCK}/{disk}/queue/rotational"))
            .map(|rotational| rotational == "0")
            .unwrap_or(false)
    }

    pub fn partitions(&self, disk: &str) -> Vec<String> {
        if disk == SIMFS {
            return vec![SIMFS.to_string()];
        }
        let dir = format!("{SYS_BLOCK}/{disk}");
        let mut partitions = match self.host().list_directory(&dir) {
            Ok(names) => names
                .into_iter()
                .filter(|name| name.starts_with(disk))
                .collect::<Vec<_>>(),
            Err(err) => {
                debug!("cannot list {dir}: {err}");
                Vec::new()
            }
        };
        partitions.sort();
        partitions
    }

    pub fn sys_dir(&self, device: &str) -> Option<String> {
        if let Some(name) = device.strip_prefix("mapper/") {
            let kernel_name = match self.device_mapper().get(name) {
                Some(entry) => entry.kernel_name(),
                None => self
                    .dm_names()
                    .iter()
                    .find(|(_, alias)| alias.as_str() == device)
                    .map(|(number, _)| number.clone())?,
            };
            return Some(format!("{SYS_BLOCK}/{kernel_name}"));
        }
        if device.starts_with("md") || device.starts_with("dm-") {
            return Some(format!("{SYS_BLOCK}/{device}"));
        }
        Some(format!("{SYS_BLOCK}/{}/{device}", disk_name_of(device)))
    }

    pub fn partition_size_bytes(&self, partition: &str) -> u64 {
        if partition == SIMFS {
            return self.disk_size_bytes(SIMFS);
        }
        self.sys_dir(partition)
            .and_then(|dir| self.read_sectors(&format!("{dir}/size")))
            .unwrap_or_else(|| {
                self.warn(format!("cannot determine size of {partition}"));
                0
            })
    }

    pub fn partition_offset_bytes(&self, partition: &str) -> u64 {
        if partition == SIMFS {
            return 0;
        }
        self.sys_dir(partition)
            .and_then(|dir| self.read_sectors(&format!("{dir}/start")))
            .unwrap_or(0)
    }

    fn read_sectors(&self, path: &str) -> Option<u64> {
        match self.host().read_attribute(path) {
            Ok(value) => match value.parse::<u64>() {
                Ok(sectors) => {
                    let bytes = sectors.checked_mul(SECTOR_SIZE);
                    if bytes.is_none() {
                        debug!("{path} holds {value:?}: too many sectors");
                    }
                    bytes
                }
                Err(err) => {
                    debug!("{path} holds {value:?}: {err}");
                    None
                }
            },
            Err(err) => {
                debug!("cannot read {path}: {err}");
                None
            }
        }
    }
}
