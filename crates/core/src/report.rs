use serde::{Deserialize, Serialize};

use crate::host::HostSystem;
use crate::model::InventoryReport;
use crate::reporter::{HtmlReporter, JsonReporter, Layout, PartitionRow, Reporter, TextReporter};
use crate::topology::Inventory;
use crate::units::UnitFormat;

// Extended partition placeholders show up as a couple of sectors.
const PLACEHOLDER_PARTITION_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportOptions {
    pub verbose: u8,
    pub unit_format: UnitFormat,
    pub show_used: bool,
    pub min_name_width: usize,
    pub min_usage_width: usize,
    pub generated_at: Option<String>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            verbose: 1,
            unit_format: UnitFormat::Decimal,
            show_used: false,
            min_name_width: 8,
            min_usage_width: 30,
            generated_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Html,
    Json,
}

pub fn measure_layout<H: HostSystem>(inventory: &Inventory<H>, options: &ReportOptions) -> Layout {
    let mut layout = Layout {
        name_width: options.min_name_width,
        usage_width: options.min_usage_width,
    };
    for disk in inventory.physical_disks() {
        for partition in inventory.partitions(disk) {
            layout.name_width = layout.name_width.max(partition.len() + 1);
            layout.usage_width = layout.usage_width.max(inventory.usage(&partition).len());
        }
    }
    if !inventory.volume_groups().is_empty() {
        for lv in inventory.public_logical_volumes() {
            layout.name_width = layout.name_width.max(lv.name.len() + 1);
            layout.usage_width = layout.usage_width.max(inventory.usage(&lv.device).len());
        }
    }
    layout
}

pub fn generate_report<H: HostSystem>(
    inventory: &Inventory<H>,
    options: &ReportOptions,
    reporter: &mut dyn Reporter,
) {
    reporter.start_report();

    for disk in inventory.physical_disks() {
        let probe = inventory.probe_disk(disk);
        reporter.start_disk(&probe);

        let mut unallocated_bytes = probe.size_bytes;
        let mut last_partition_end = 0;
        for partition in inventory.partitions(disk) {
            let size_bytes = inventory.partition_size_bytes(&partition);
            if size_bytes <= PLACEHOLDER_PARTITION_BYTES && options.verbose < 2 {
                continue;
            }
            let usage = inventory.usage(&partition);
            reporter.partition(&PartitionRow {
                name: &partition,
                size_bytes,
                usage: &usage,
                filesystem: inventory.filesystem_for(&partition),
                physical_volume: inventory.physical_volume_for(&partition),
                is_used: inventory.is_used(&partition),
                is_ssd: false,
            });
            unallocated_bytes = unallocated_bytes.saturating_sub(size_bytes);
            let partition_end = inventory.partition_offset_bytes(&partition) + size_bytes;
            last_partition_end = last_partition_end.max(partition_end);
        }
        reporter.end_disk(
            unallocated_bytes,
            probe.size_bytes.saturating_sub(last_partition_end),
        );
    }

    for vg in inventory.volume_groups() {
        reporter.start_volume_group(vg);
        for lv in inventory
            .public_logical_volumes()
            .filter(|lv| lv.vg_name == vg.name)
        {
            let usage = inventory.usage(&lv.device);
            let is_ssd = inventory
                .disks_of(lv)
                .iter()
                .all(|disk| inventory.is_ssd(disk));
            reporter.logical_volume(lv, &usage, inventory.filesystem_for(&lv.device), is_ssd);
        }
        reporter.end_volume_group(vg);
    }

    reporter.end_report(&inventory.warnings());
}

pub fn report_text<H: HostSystem>(inventory: &Inventory<H>, options: &ReportOptions) -> String {
    let layout = measure_layout(inventory, options);
    let mut reporter = TextReporter::new(options, layout);
    generate_report(inventory, options, &mut reporter);
    reporter.finish()
}

pub fn report_html<H: HostSystem>(inventory: &Inventory<H>, options: &ReportOptions) -> String {
    let mut reporter = HtmlReporter::new(options);
    generate_report(inventory, options, &mut reporter);
    reporter.finish()
}

pub fn inventory_report<H: HostSystem>(
    inventory: &Inventory<H>,
    options: &ReportOptions,
) -> InventoryReport {
    let mut reporter = JsonReporter::new(options);
    generate_report(inventory, options, &mut reporter);
    reporter.into_report()
}

pub fn report_json<H: HostSystem>(
    inventory: &Inventory<H>,
    options: &ReportOptions,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&inventory_report(inventory, options))
}

pub fn render<H: HostSystem>(
    inventory: &Inventory<H>,
    options: &ReportOptions,
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(report_text(inventory, options)),
        OutputFormat::Html => Ok(report_html(inventory, options)),
        OutputFormat::Json => report_json(inventory, options),
    }
}
