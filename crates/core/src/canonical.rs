use std::collections::HashMap;

use crate::host::HostSystem;
use crate::model::DeviceMapperAlias;

pub const DEV_DIR: &str = "/dev/";

pub fn alias_map(aliases: &[DeviceMapperAlias]) -> HashMap<String, String> {
    aliases
        .iter()
        .map(|alias| (alias.number.clone(), alias.name.clone()))
        .collect()
}

pub fn canonicalize<H: HostSystem + ?Sized>(
    host: &H,
    dm_names: &HashMap<String, String>,
    device: &str,
) -> Option<String> {
    let mut name = device.strip_prefix(DEV_DIR)?.to_string();
    if name.is_empty() {
        return None;
    }

    if name.starts_with("cciss/") {
        name = name.replace('/', "!");
    }

    if name.starts_with("dm-") {
        if let Some(alias) = dm_names.get(&name) {
            name = alias.clone();
        }
    }

    // /dev/<vg>/<lv> and friends are symlinks to ../dm-N
    if name.contains('/') && !name.starts_with("mapper/") {
        if let Ok(target) = host.read_symlink(device) {
            let kernel_name = target.rsplit('/').next().unwrap_or_default();
            if kernel_name.starts_with("dm-") {
                if let Some(alias) = dm_names.get(kernel_name) {
                    name = alias.clone();
                }
            }
        }
    }

    Some(name)
}
