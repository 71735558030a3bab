use std::env;

use serde::{Deserialize, Serialize};

use crate::collect::{DEV_MAPPER, LIBVIRT_QEMU_DIR, SIMFS_DEVICE, SYS_BLOCK};
use crate::host::HostSystem;

pub const REQUIRED_TOOLS: &[&str] = &["df", "dmsetup", "vgdisplay", "pvdisplay", "lvs"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolStatus {
    pub name: String,
    pub available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorInfo {
    pub os: String,
    pub arch: String,
    pub is_root: bool,
    pub sys_block_present: bool,
    pub device_mapper_present: bool,
    pub root_filesystem_bytes: Option<u64>,
    pub tools: Vec<ToolStatus>,
    pub notes: Vec<String>,
}

pub fn collect_doctor_info<H: HostSystem + ?Sized>(host: &H) -> DoctorInfo {
    let is_root = host.is_root();
    let sys_block_present = host.path_exists(SYS_BLOCK);
    let tools = REQUIRED_TOOLS
        .iter()
        .map(|name| ToolStatus {
            name: name.to_string(),
            available: host.command_available(name),
        })
        .collect::<Vec<_>>();

    let mut notes = vec!["Read-only: nothing on the host is modified.".to_string()];
    if !is_root {
        notes.push("LVM details need root; volume groups may be missing or incomplete.".to_string());
    }
    if !sys_block_present {
        if host.path_exists(SIMFS_DEVICE) {
            notes.push("No /sys/block; reporting the OpenVZ simfs root filesystem.".to_string());
        } else {
            notes.push("No /sys/block and no /dev/simfs; no disks can be discovered.".to_string());
        }
    }
    for tool in tools.iter().filter(|tool| !tool.available) {
        notes.push(format!("`{}` not found on PATH.", tool.name));
    }
    if !host.path_exists(LIBVIRT_QEMU_DIR) {
        notes.push(format!("{LIBVIRT_QEMU_DIR} not present; VM disks are not mapped."));
    }

    DoctorInfo {
        os: env::consts::OS.to_string(),
        arch: env::consts::ARCH.to_string(),
        is_root,
        sys_block_present,
        device_mapper_present: host.path_exists(DEV_MAPPER),
        root_filesystem_bytes: host.root_filesystem_bytes().ok(),
        tools,
        notes,
    }
}
