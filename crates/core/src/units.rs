use serde::{Deserialize, Serialize};

use crate::model::{FilesystemInfo, PhysicalVolume};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitFormat {
    // 1 KB = 1000 B
    #[default]
    Decimal,
    // 1 KiB = 1024 B
    Binary,
}

impl UnitFormat {
    pub fn format(self, bytes: u64) -> String {
        match self {
            Self::Decimal => fmt_size_decimal(bytes),
            Self::Binary => fmt_size_binary(bytes),
        }
    }
}

fn fmt_size(bytes: u64, base: f64, prefixes: &[&str]) -> String {
    let mut size = bytes as f64;
    let mut unit = "B";
    for prefix in prefixes {
        if size < base {
            break;
        }
        size /= base;
        unit = prefix;
    }
    format!("{size:.1} {unit}")
}

pub fn fmt_size_decimal(bytes: u64) -> String {
    fmt_size(bytes, 1000.0, &["KB", "MB", "GB", "TB", "PB"])
}

pub fn fmt_size_binary(bytes: u64) -> String {
    fmt_size(bytes, 1024.0, &["KiB", "MiB", "GiB", "TiB", "PiB"])
}

pub fn free_bytes(
    filesystem: Option<&FilesystemInfo>,
    physical_volume: Option<&PhysicalVolume>,
) -> Option<u64> {
    filesystem
        .map(|fs| fs.avail_kb * 1024)
        .or_else(|| physical_volume.map(|pv| pv.free_kb * 1024))
}

pub fn fmt_free_space(
    free_bytes: Option<u64>,
    size_bytes: u64,
    unit_format: UnitFormat,
    show_used: bool,
) -> String {
    match free_bytes {
        None => String::new(),
        Some(free) if show_used => {
            format!("{} used", unit_format.format(size_bytes.saturating_sub(free)))
        }
        Some(free) => format!("{} free", unit_format.format(free)),
    }
}
