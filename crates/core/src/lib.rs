pub mod canonical;
pub mod collect;
pub mod device;
pub mod doctor;
pub mod error;
pub mod host;
pub mod model;
pub mod report;
pub mod reporter;
pub mod resolve;
pub mod topology;
pub mod units;

#[cfg(test)]
mod testing;

pub use device::{disk_name_of, DiskProbe};
pub use doctor::{collect_doctor_info, DoctorInfo, ToolStatus};
pub use error::CollectError;
pub use host::{HostSystem, LinuxHost};
pub use model::{
    DeviceMapperAlias, DeviceMapperEntry, DiskReport, FilesystemInfo, InventoryReport,
    LogicalVolume, PhysicalVolume, VmDiskMapping, VolumeGroup, VolumeGroupReport, VolumeUsage,
    REPORT_VERSION,
};
pub use report::{
    generate_report, inventory_report, measure_layout, render, report_html, report_json,
    report_text, OutputFormat, ReportOptions,
};
pub use reporter::{HtmlReporter, JsonReporter, Layout, PartitionRow, Reporter, TextReporter};
pub use topology::Inventory;
pub use units::{fmt_free_space, fmt_size_binary, fmt_size_decimal, UnitFormat};
