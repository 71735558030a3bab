use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub const REPORT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilesystemInfo {
    pub device: String,
    pub mount_point: String,
    pub fs_type: String,
    pub size_kb: u64,
    pub used_kb: u64,
    pub avail_kb: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhysicalVolume {
    pub device: String,
    pub vg_name: String,
    pub free_kb: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VolumeGroup {
    pub name: String,
    pub size_kb: u64,
    pub used_kb: u64,
    pub free_kb: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogicalVolume {
    pub name: String,
    pub vg_name: String,
    pub size_bytes: u64,
    pub device: String,
    pub role: String,
    pub located_on: BTreeSet<String>,
    pub is_open: bool,
}

impl LogicalVolume {
    pub fn is_public(&self) -> bool {
        self.role.split(',').any(|role| role.trim() == "public")
    }

    pub fn is_internal(&self) -> bool {
        self.name.starts_with('[') && self.name.ends_with(']')
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceMapperEntry {
    pub name: String,
    pub major: u32,
    pub minor: u32,
}

impl DeviceMapperEntry {
    pub fn kernel_name(&self) -> String {
        format!("dm-{}", self.minor)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceMapperAlias {
    pub name: String,
    pub number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VmDiskMapping {
    pub vm_name: String,
    pub device: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryReport {
    pub report_version: String,
    #[serde(default)]
    pub generated_at: Option<String>,
    pub disks: Vec<DiskReport>,
    pub volume_groups: Vec<VolumeGroupReport>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl Default for InventoryReport {
    fn default() -> Self {
        Self {
            report_version: REPORT_VERSION.to_string(),
            generated_at: None,
            disks: Vec::new(),
            volume_groups: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiskReport {
    pub name: String,
    pub model: String,
    pub size_bytes: u64,
    pub firmware_rev: String,
    pub is_ssd: bool,
    pub partitions: Vec<VolumeUsage>,
    #[serde(default)]
    pub unallocated_bytes: u64,
    #[serde(default)]
    pub trailing_free_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VolumeUsage {
    pub name: String,
    pub size_bytes: u64,
    pub usage: String,
    pub is_used: bool,
    #[serde(default)]
    pub is_ssd: bool,
    #[serde(default)]
    pub filesystem: Option<FilesystemInfo>,
    #[serde(default)]
    pub physical_volume: Option<PhysicalVolume>,
    #[serde(default)]
    pub free_bytes: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VolumeGroupReport {
    pub name: String,
    pub size_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    pub logical_volumes: Vec<VolumeUsage>,
}
