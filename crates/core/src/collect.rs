use serde::Deserialize;
use tracing::debug;

use crate::error::CollectError;
use crate::host::HostSystem;
use crate::model::{
    DeviceMapperAlias, DeviceMapperEntry, FilesystemInfo, LogicalVolume, PhysicalVolume,
    VmDiskMapping, VolumeGroup,
};

pub const SYS_BLOCK: &str = "/sys/block";
pub const DEV_MAPPER: &str = "/dev/mapper";
pub const SIMFS_DEVICE: &str = "/dev/simfs";
pub const SIMFS: &str = "simfs";
pub const PROC_SWAPS: &str = "/proc/swaps";
pub const LIBVIRT_QEMU_DIR: &str = "/etc/libvirt/qemu";

const PHYSICAL_DISK_PREFIXES: &[&str] = &["sd", "cciss", "xvd", "vd", "nvme"];

pub const DF_WITH_TYPE: &[&str] = &["df", "-P", "--local", "--print-type", "-x", "debugfs"];
pub const DF_WITHOUT_TYPE: &[&str] = &["df", "-P", "--local", "-x", "debugfs"];
pub const DMSETUP_INFO: &[&str] = &["dmsetup", "-c", "--noheadings", "info"];
pub const VGDISPLAY: &[&str] = &["vgdisplay", "-c"];
pub const PVDISPLAY: &[&str] = &["pvdisplay", "-c"];
pub const LVS_COLUMNS: &str =
    "lv_name,vg_name,lv_size,lv_dm_path,lv_role,devices,metadata_devices,lv_device_open";
pub const LVS: &[&str] = &[
    "lvs",
    "--separator=:",
    "--units=b",
    "--nosuffix",
    "--noheadings",
    "-o",
    LVS_COLUMNS,
    "--all",
];

pub fn parse_swaps<F>(text: &str, canonicalize: F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    text.lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().next())
        .filter_map(canonicalize)
        .collect()
}

// `df -P` output; `has_type` tells whether it came from `--print-type`.
// The header is skipped unread since `df` translates it. Pseudo filesystems
// (`tmpfs`, `udev`) are dropped because their source is not under `/dev`.
pub fn parse_df<F>(text: &str, has_type: bool, canonicalize: F) -> Vec<FilesystemInfo>
where
    F: Fn(&str) -> Option<String>,
{
    // source, [type,] size, used, avail, capacity; the mount point is the rest
    let leading = if has_type { 6 } else { 5 };

    let mut filesystems = Vec::new();
    for line in text.lines().skip(1) {
        let Some((fields, mount_point)) = split_leading_fields(line, leading) else {
            debug!("skipping short df line: {line:?}");
            continue;
        };
        let numbers = &fields[leading - 4..];
        let (Ok(size_kb), Ok(used_kb), Ok(avail_kb)) = (
            numbers[0].parse::<u64>(),
            numbers[1].parse::<u64>(),
            numbers[2].parse::<u64>(),
        ) else {
            debug!("skipping malformed df line: {line:?}");
            continue;
        };
        let Some(device) = canonicalize(fields[0]) else {
            continue;
        };
        filesystems.push(FilesystemInfo {
            device,
            mount_point: mount_point.to_string(),
            fs_type: if has_type {
                fields[1].to_string()
            } else {
                String::new()
            },
            size_kb,
            used_kb,
            avail_kb,
        });
    }
    filesystems
}

fn split_leading_fields(line: &str, count: usize) -> Option<(Vec<&str>, &str)> {
    let mut fields = Vec::with_capacity(count);
    let mut rest = line.trim_start();
    while fields.len() < count {
        let end = rest.find(char::is_whitespace)?;
        fields.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }
    (!rest.is_empty()).then_some((fields, rest))
}

pub fn parse_dmsetup_info(text: &str) -> Vec<DeviceMapperEntry> {
    let mut entries = Vec::new();
    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let fields = line.split(':').collect::<Vec<_>>();
        if fields.len() != 8 {
            debug!("skipping dmsetup line with {} columns", fields.len());
            continue;
        }
        let (Ok(major), Ok(minor)) = (fields[1].parse(), fields[2].parse()) else {
            debug!("skipping malformed dmsetup line: {line:?}");
            continue;
        };
        entries.push(DeviceMapperEntry {
            name: fields[0].to_string(),
            major,
            minor,
        });
    }
    entries
}

// `vgdisplay -c`, 17 colon-separated columns. Column 12 is the size in KiB,
// 13 the extent size in KiB, 15 and 16 the allocated and free extents.
pub fn parse_vgdisplay(text: &str) -> Vec<VolumeGroup> {
    let mut groups = Vec::new();
    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let fields = line.split(':').collect::<Vec<_>>();
        if fields.len() != 17 {
            debug!("skipping vgdisplay line with {} columns", fields.len());
            continue;
        }
        let numbers = (
            fields[11].parse::<u64>(),
            fields[12].parse::<u64>(),
            fields[14].parse::<u64>(),
            fields[15].parse::<u64>(),
        );
        let (Ok(size_kb), Ok(extent_kb), Ok(used_extents), Ok(free_extents)) = numbers else {
            debug!("skipping malformed vgdisplay line: {line:?}");
            continue;
        };
        let (Some(used_kb), Some(free_kb)) = (
            used_extents.checked_mul(extent_kb),
            free_extents.checked_mul(extent_kb),
        ) else {
            debug!("skipping vgdisplay line with out-of-range extents: {line:?}");
            continue;
        };
        groups.push(VolumeGroup {
            name: fields[0].to_string(),
            size_kb,
            used_kb,
            free_kb,
        });
    }
    groups
}

// `pvdisplay -c`, 12 colon-separated columns. `pvcreate` without `vgextend`
// interleaves prose like `"/dev/sdc2" is a new physical volume of ...`,
// which falls out on the column count.
pub fn parse_pvdisplay<F>(text: &str, canonicalize: F) -> Vec<PhysicalVolume>
where
    F: Fn(&str) -> Option<String>,
{
    let mut volumes = Vec::new();
    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let fields = line.split(':').collect::<Vec<_>>();
        if fields.len() != 12 {
            debug!("skipping pvdisplay line: {line:?}");
            continue;
        }
        let (Ok(extent_kb), Ok(free_extents)) =
            (fields[7].parse::<u64>(), fields[9].parse::<u64>())
        else {
            debug!("skipping malformed pvdisplay line: {line:?}");
            continue;
        };
        let Some(free_kb) = free_extents.checked_mul(extent_kb) else {
            debug!("skipping pvdisplay line with out-of-range extents: {line:?}");
            continue;
        };
        let Some(device) = canonicalize(fields[0]) else {
            continue;
        };
        volumes.push(PhysicalVolume {
            device,
            vg_name: fields[1].to_string(),
            free_kb,
        });
    }
    volumes
}

// `lvs` with `LVS_COLUMNS`. The `devices` and `metadata_devices` columns
// list `where(first_extent)` items; `where` is a `/dev` path or the bare
// name of an internal sub-volume.
pub fn parse_lvs(text: &str) -> Vec<LogicalVolume> {
    let mut volumes = Vec::new();
    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let fields = line.split(':').collect::<Vec<_>>();
        if fields.len() != 8 {
            debug!("skipping lvs line with {} columns", fields.len());
            continue;
        }
        let Some(device) = fields[3]
            .strip_prefix("/dev/")
            .filter(|device| device.starts_with("mapper/"))
        else {
            debug!("skipping lvs line without a /dev/mapper path: {line:?}");
            continue;
        };
        let Ok(size_bytes) = fields[2].parse::<u64>() else {
            debug!("skipping lvs line with bad size: {line:?}");
            continue;
        };
        let located_on = fields[5]
            .split(',')
            .chain(fields[6].split(','))
            .filter_map(|item| item.split('(').next())
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect();
        volumes.push(LogicalVolume {
            name: fields[0].to_string(),
            vg_name: fields[1].to_string(),
            size_bytes,
            device: device.to_string(),
            role: fields[4].to_string(),
            located_on,
            is_open: !fields[7].trim().is_empty(),
        });
    }
    volumes
}

#[derive(Debug, Default, Deserialize)]
struct Domain {
    #[serde(default)]
    devices: Option<DomainDevices>,
}

#[derive(Debug, Default, Deserialize)]
struct DomainDevices {
    #[serde(default, rename = "disk")]
    disks: Vec<DomainDisk>,
}

#[derive(Debug, Deserialize)]
struct DomainDisk {
    #[serde(default)]
    source: Option<DiskSource>,
}

#[derive(Debug, Deserialize)]
struct DiskSource {
    #[serde(default, rename = "@file")]
    file: Option<String>,

    #[serde(default, rename = "@dev")]
    dev: Option<String>,
}

impl DiskSource {
    fn path(&self) -> Option<&str> {
        self.file
            .as_deref()
            .filter(|file| !file.is_empty())
            .or(self.dev.as_deref())
    }
}

pub fn parse_libvirt_domain<F>(
    vm_name: &str,
    xml: &str,
    canonicalize: F,
) -> Result<Vec<VmDiskMapping>, CollectError>
where
    F: Fn(&str) -> Option<String>,
{
    let domain: Domain = quick_xml::de::from_str(xml).map_err(|err| CollectError::Parse {
        what: format!("libvirt domain {vm_name}"),
        detail: err.to_string(),
    })?;

    Ok(domain
        .devices
        .unwrap_or_default()
        .disks
        .iter()
        .filter_map(|disk| disk.source.as_ref()?.path())
        .filter_map(|path| canonicalize(path))
        .map(|device| VmDiskMapping {
            vm_name: vm_name.to_string(),
            device,
        })
        .collect())
}

pub fn collect_swap_devices<H, F>(host: &H, canonicalize: F) -> Result<Vec<String>, CollectError>
where
    H: HostSystem + ?Sized,
    F: Fn(&str) -> Option<String>,
{
    let text = host
        .read_file(PROC_SWAPS)
        .map_err(|err| CollectError::io(PROC_SWAPS, err))?;
    Ok(parse_swaps(&text, canonicalize))
}

pub fn collect_filesystems<H, F>(
    host: &H,
    canonicalize: F,
) -> Result<Vec<FilesystemInfo>, CollectError>
where
    H: HostSystem + ?Sized,
    F: Fn(&str) -> Option<String>,
{
    let primary = host.run_command(DF_WITH_TYPE);
    if let Ok(text) = &primary {
        if !text.trim().is_empty() {
            return Ok(parse_df(text, true, canonicalize));
        }
    }
    debug!("df --print-type produced nothing, retrying without it");
    match host.run_command(DF_WITHOUT_TYPE) {
        Ok(text) => Ok(parse_df(&text, false, canonicalize)),
        Err(err) => primary
            .map(|text| parse_df(&text, true, canonicalize))
            .map_err(|_| err),
    }
}

pub fn collect_physical_disks<H>(host: &H) -> Result<Vec<String>, CollectError>
where
    H: HostSystem + ?Sized,
{
    if host.path_exists(SYS_BLOCK) {
        let mut disks = host
            .list_directory(SYS_BLOCK)
            .map_err(|err| CollectError::io(SYS_BLOCK, err))?
            .into_iter()
            .filter(|name| {
                PHYSICAL_DISK_PREFIXES
                    .iter()
                    .any(|prefix| name.starts_with(prefix))
            })
            .collect::<Vec<_>>();
        disks.sort();
        return Ok(disks);
    }
    if host.path_exists(SIMFS_DEVICE) {
        return Ok(vec![SIMFS.to_string()]);
    }
    Err(CollectError::Io {
        path: SYS_BLOCK.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "/sys/block is missing"),
    })
}

pub fn collect_device_mapper<H>(host: &H) -> Result<Vec<DeviceMapperEntry>, CollectError>
where
    H: HostSystem + ?Sized,
{
    Ok(parse_dmsetup_info(&host.run_command(DMSETUP_INFO)?))
}

pub fn collect_device_mapper_aliases<H>(host: &H) -> Result<Vec<DeviceMapperAlias>, CollectError>
where
    H: HostSystem + ?Sized,
{
    let mut names = match host.list_directory(DEV_MAPPER) {
        Ok(names) => names,
        Err(err) => {
            debug!("cannot list {DEV_MAPPER}: {err}");
            return Ok(Vec::new());
        }
    };
    names.sort();

    let mut aliases = Vec::new();
    for name in names {
        let Ok(target) = host.read_symlink(&format!("{DEV_MAPPER}/{name}")) else {
            continue;
        };
        let number = target.rsplit('/').next().unwrap_or_default().to_string();
        aliases.push(DeviceMapperAlias {
            name: format!("mapper/{name}"),
            number,
        });
    }
    Ok(aliases)
}

pub fn collect_volume_groups<H>(host: &H) -> Result<Vec<VolumeGroup>, CollectError>
where
    H: HostSystem + ?Sized,
{
    Ok(parse_vgdisplay(&host.run_command(VGDISPLAY)?))
}

pub fn collect_physical_volumes<H, F>(
    host: &H,
    canonicalize: F,
) -> Result<Vec<PhysicalVolume>, CollectError>
where
    H: HostSystem + ?Sized,
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_pvdisplay(&host.run_command(PVDISPLAY)?, canonicalize))
}

pub fn collect_logical_volumes<H>(host: &H) -> Result<Vec<LogicalVolume>, CollectError>
where
    H: HostSystem + ?Sized,
{
    Ok(parse_lvs(&host.run_command(LVS)?))
}

pub fn collect_vm_disks<H, F>(host: &H, canonicalize: F) -> Result<Vec<VmDiskMapping>, CollectError>
where
    H: HostSystem + ?Sized,
    F: Fn(&str) -> Option<String>,
{
    if !host.path_exists(LIBVIRT_QEMU_DIR) {
        return Ok(Vec::new());
    }
    let mut files = host
        .list_directory(LIBVIRT_QEMU_DIR)
        .map_err(|err| CollectError::io(LIBVIRT_QEMU_DIR, err))?
        .into_iter()
        .filter(|name| name.ends_with(".xml"))
        .collect::<Vec<_>>();
    files.sort();

    let mut mappings = Vec::new();
    for file in files {
        let vm_name = file.trim_end_matches(".xml");
        let path = format!("{LIBVIRT_QEMU_DIR}/{file}");
        let xml = match host.read_file(&path) {
            Ok(xml) => xml,
            Err(err) => {
                debug!("cannot read {path}: {err}");
                continue;
            }
        };
        match parse_libvirt_domain(vm_name, &xml, &canonicalize) {
            Ok(found) => mappings.extend(found),
            Err(err) => debug!("{err}"),
        }
    }
    Ok(mappings)
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::testing::FakeHost;

    fn strip_dev(device: &str) -> Option<String> {
        device.strip_prefix("/dev/").map(str::to_string)
    }

    const DF_OUTPUT: &str = indoc! {"
        Filesystem                Type     1024-blocks      Used Available Capacity Mounted on
        udev                      devtmpfs     8124044         0   8124044       0% /dev
        tmpfs                     tmpfs        1630584     19392   1611192       2% /run
        /dev/mapper/platonas-root ext4       471950640 143870928 304082888      33% /
        /dev/loop0                squashfs       10112     10112         0     100% /snap/kubectl/250
        /dev/sda1                 ext2          482922    143130    314858      32% /boot
        tmpfs                     tmpfs        1630584      7328   1623256       1% /run/user/1000
    "};

    #[test]
    fn swaps_skip_header_and_canonicalize() {
        let text = indoc! {"
            Filename\t\t\t\tType\t\tSize\tUsed\tPriority
            /dev/sda3                               partition\t8269820\t0\t-1
            /dev/null                               partition\t2097152\t0\t-1
        "};
        assert_eq!(parse_swaps(text, strip_dev), vec!["sda3", "null"]);
    }

    #[test]
    fn df_keeps_only_dev_backed_filesystems() {
        let filesystems = parse_df(DF_OUTPUT, true, strip_dev);
        assert_eq!(
            filesystems
                .iter()
                .map(|fs| (fs.device.as_str(), fs.mount_point.as_str(), fs.fs_type.as_str()))
                .collect::<Vec<_>>(),
            vec![
                ("mapper/platonas-root", "/", "ext4"),
                ("loop0", "/snap/kubectl/250", "squashfs"),
                ("sda1", "/boot", "ext2"),
            ]
        );
        assert_eq!(
            filesystems[2],
            FilesystemInfo {
                device: "sda1".to_string(),
                mount_point: "/boot".to_string(),
                fs_type: "ext2".to_string(),
                size_kb: 482922,
                used_kb: 143130,
                avail_kb: 314858,
            }
        );
    }

    #[test]
    fn df_without_type_column_and_spaced_mount_point() {
        let text = indoc! {"
            Filesystem     1024-blocks      Used Available Capacity Mounted on
            /dev/sdb1          1000000    400000    600000      40% /media/usb  stick
            garbage line
        "};
        let filesystems = parse_df(text, false, strip_dev);
        assert_eq!(filesystems.len(), 1);
        assert_eq!(filesystems[0].mount_point, "/media/usb  stick");
        assert_eq!(filesystems[0].fs_type, "");
        assert_eq!(filesystems[0].avail_kb, 600000);
    }

    #[test]
    fn df_header_language_does_not_matter() {
        let text = indoc! {"
            Dateisystem    Typ  1024-Blöcke   Benutzt Verfügbar Kapazität Eingehängt auf
            /dev/sda1      ext2      482922    143130    314858       32% /boot
        "};
        let filesystems = parse_df(text, true, strip_dev);
        assert_eq!(filesystems.len(), 1);
        assert_eq!(filesystems[0].fs_type, "ext2");
        assert_eq!(filesystems[0].mount_point, "/boot");
        assert_eq!(filesystems[0].avail_kb, 314858);
    }

    #[test]
    fn dmsetup_rows() {
        let text = indoc! {"
            platonas-swap_1:253:2:L--w:2:1:0:LVM-blahblah
            platonas-root:253:1:L--w:1:1:0:LVM-blahblah
            sda5_crypt:253:0:L--w:2:1:0:CRYPT-LUKS1-blah-sda5_crypt
            No devices found
        "};
        let entries = parse_dmsetup_info(text);
        assert_eq!(
            entries,
            vec![
                DeviceMapperEntry {
                    name: "platonas-swap_1".to_string(),
                    major: 253,
                    minor: 2
                },
                DeviceMapperEntry {
                    name: "platonas-root".to_string(),
                    major: 253,
                    minor: 1
                },
                DeviceMapperEntry {
                    name: "sda5_crypt".to_string(),
                    major: 253,
                    minor: 0
                },
            ]
        );
        assert_eq!(entries[2].kernel_name(), "dm-0");
    }

    #[test]
    fn vgdisplay_computes_used_and_free_from_extents() {
        let text = "  fridge:r/w:772:-1:0:13:10:-1:0:4:4:1463189504:4096:357224:155674:201550:vdq2Ht-m5RN-rD0v\n";
        assert_eq!(
            parse_vgdisplay(text),
            vec![VolumeGroup {
                name: "fridge".to_string(),
                size_kb: 1463189504,
                used_kb: 155674 * 4096,
                free_kb: 201550 * 4096,
            }]
        );
    }

    #[test]
    fn pvdisplay_skips_pvcreate_chatter() {
        let text = concat!(
            "  /dev/mapper/sda5_crypt:platonas:975765504:-1:8:8:-1:4096:119111:0:119111:mRMbR0\n",
            "  \"/dev/sdc2\" is a new physical volume of \"231.95 GiB\"\n",
            "  /dev/sdc2:fridge:486443376:-1:8:8:-1:4096:59380:33779:25601:VUA1rj\n",
        );
        assert_eq!(
            parse_pvdisplay(text, strip_dev),
            vec![
                PhysicalVolume {
                    device: "mapper/sda5_crypt".to_string(),
                    vg_name: "platonas".to_string(),
                    free_kb: 0,
                },
                PhysicalVolume {
                    device: "sdc2".to_string(),
                    vg_name: "fridge".to_string(),
                    free_kb: 33779 * 4096,
                },
            ]
        );
    }

    #[test]
    fn out_of_range_extents_skip_only_that_line() {
        let vgs = concat!(
            "  broken:r/w:772:-1:0:1:1:-1:0:1:1:100:18446744073709551615:10:2:8:xxxxxx\n",
            "  fridge:r/w:772:-1:0:13:10:-1:0:4:4:1463189504:4096:357224:155674:201550:vdq2Ht\n",
        );
        let groups = parse_vgdisplay(vgs);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "fridge");

        let pvs = concat!(
            "  /dev/sdb1:broken:100:-1:8:8:-1:18446744073709551615:10:2:8:xxxxxx\n",
            "  /dev/sdc2:fridge:486443376:-1:8:8:-1:4096:59380:33779:25601:VUA1rj\n",
        );
        let volumes = parse_pvdisplay(pvs, strip_dev);
        assert_eq!(volumes.len(), 1);
        assert_eq!(volumes[0].device, "sdc2");
    }

    #[test]
    fn lvs_merges_data_and_metadata_devices() {
        let text = concat!(
            "  root:platonas:491119443968:/dev/mapper/platonas-root:public:/dev/mapper/sda5_crypt(0)::open\n",
            "  www:fridge:10737418240:/dev/mapper/fridge-www:public:www_rimage_0(0),www_rimage_1(0):www_rmeta_0(0),www_rmeta_1(0):open\n",
            "  [www_rimage_0]:fridge:10737418240:/dev/mapper/fridge-www_rimage_0:private,raid,image:/dev/sda2(38661)::\n",
            "  thin:vg:1024:/weird/path:public:/dev/sdz1(0)::open\n",
        );
        let volumes = parse_lvs(text);
        assert_eq!(volumes.len(), 3);

        assert_eq!(volumes[0].device, "mapper/platonas-root");
        assert_eq!(
            volumes[0].located_on.iter().collect::<Vec<_>>(),
            vec!["/dev/mapper/sda5_crypt"]
        );
        assert!(volumes[0].is_open);

        assert_eq!(
            volumes[1].located_on.iter().collect::<Vec<_>>(),
            vec!["www_rimage_0", "www_rimage_1", "www_rmeta_0", "www_rmeta_1"]
        );

        assert!(volumes[2].is_internal());
        assert!(!volumes[2].is_public());
        assert!(!volumes[2].is_open);
    }

    #[test]
    fn libvirt_disk_sources() {
        let xml = indoc! {r#"
            <domain type='kvm'>
              <name>box</name>
              <devices>
                <emulator>/usr/bin/kvm</emulator>
                <disk type='file' device='disk'>
                  <driver name='qemu' type='raw'/>
                  <source file='/dev/fridge/box'/>
                  <target dev='vda' bus='virtio'/>
                </disk>
                <disk type='block' device='disk'>
                  <source dev='/dev/sdb'/>
                </disk>
                <disk type='file' device='cdrom'>
                  <source file='/var/lib/libvirt/images/install.iso'/>
                </disk>
                <interface type='network'>
                  <source network='default'/>
                </interface>
              </devices>
            </domain>
        "#};
        let mappings = parse_libvirt_domain("box", xml, strip_dev).expect("valid xml");
        assert_eq!(
            mappings,
            vec![
                VmDiskMapping {
                    vm_name: "box".to_string(),
                    device: "fridge/box".to_string(),
                },
                VmDiskMapping {
                    vm_name: "box".to_string(),
                    device: "sdb".to_string(),
                },
            ]
        );
    }

    #[test]
    fn physical_disks_filter_virtual_devices() {
        let host = FakeHost::new()
            .symlink("/sys/block/dm-0", "../devices/virtual/block/dm-0")
            .symlink("/sys/block/loop0", "../devices/virtual/block/loop0")
            .symlink("/sys/block/sdb", "../devices/pci0000:00/block/sdb")
            .symlink("/sys/block/sda", "../devices/pci0000:00/block/sda")
            .symlink("/sys/block/nvme0n1", "../devices/pci0000:00/nvme/nvme0n1");
        assert_eq!(
            collect_physical_disks(&host).expect("disks"),
            vec!["nvme0n1", "sda", "sdb"]
        );
    }

    #[test]
    fn physical_disks_in_openvz_container() {
        let host = FakeHost::new().file("/dev/simfs", "character device actually");
        assert_eq!(collect_physical_disks(&host).expect("disks"), vec!["simfs"]);
    }

    #[test]
    fn physical_disks_without_sysfs_is_an_error() {
        let host = FakeHost::new();
        assert!(collect_physical_disks(&host).is_err());
    }

    #[test]
    fn device_mapper_aliases_skip_control_node() {
        let host = FakeHost::new()
            .file("/dev/mapper/control", "not a symlink")
            .symlink("/dev/mapper/sda5_crypt", "../dm-0")
            .symlink("/dev/mapper/platonas-root", "../dm-1");
        assert_eq!(
            collect_device_mapper_aliases(&host).expect("aliases"),
            vec![
                DeviceMapperAlias {
                    name: "mapper/platonas-root".to_string(),
                    number: "dm-1".to_string(),
                },
                DeviceMapperAlias {
                    name: "mapper/sda5_crypt".to_string(),
                    number: "dm-0".to_string(),
                },
            ]
        );
        assert!(collect_device_mapper_aliases(&FakeHost::new())
            .expect("missing dir is empty")
            .is_empty());
    }

    #[test]
    fn filesystems_fall_back_to_df_without_type() {
        let host = FakeHost::new().command(
            &DF_WITHOUT_TYPE.join(" "),
            indoc! {"
                Filesystem     1024-blocks      Used Available Capacity Mounted on
                /dev/sda1           482922    143130    314858      32% /boot
            "},
        );
        let filesystems = collect_filesystems(&host, strip_dev).expect("fallback");
        assert_eq!(filesystems.len(), 1);
        assert_eq!(filesystems[0].device, "sda1");
    }

    #[test]
    fn vm_disks_absent_without_libvirt() {
        let host = FakeHost::new();
        assert!(collect_vm_disks(&host, strip_dev).expect("empty").is_empty());
    }
}
