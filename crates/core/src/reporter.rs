use crate::device::DiskProbe;
use crate::model::{
    DiskReport, FilesystemInfo, InventoryReport, LogicalVolume, PhysicalVolume, VolumeGroup,
    VolumeGroupReport, VolumeUsage,
};
use crate::report::ReportOptions;
use crate::units::{fmt_free_space, free_bytes, UnitFormat};

const NOTABLE_TRAILING_FREE_BYTES: u64 = 100 * 1000 * 1000;

#[derive(Debug, Clone, Copy)]
pub struct PartitionRow<'a> {
    pub name: &'a str,
    pub size_bytes: u64,
    pub usage: &'a str,
    pub filesystem: Option<&'a FilesystemInfo>,
    pub physical_volume: Option<&'a PhysicalVolume>,
    pub is_used: bool,
    pub is_ssd: bool,
}

pub trait Reporter {
    fn start_report(&mut self) {}

    fn end_report(&mut self, _warnings: &[String]) {}

    fn start_disk(&mut self, disk: &DiskProbe);

    fn end_disk(&mut self, unallocated_bytes: u64, trailing_free_bytes: u64);

    fn partition(&mut self, row: &PartitionRow<'_>);

    fn start_volume_group(&mut self, vg: &VolumeGroup);

    fn end_volume_group(&mut self, vg: &VolumeGroup);

    fn logical_volume(
        &mut self,
        lv: &LogicalVolume,
        usage: &str,
        filesystem: Option<&FilesystemInfo>,
        is_ssd: bool,
    ) {
        self.partition(&PartitionRow {
            name: &lv.name,
            size_bytes: lv.size_bytes,
            usage,
            filesystem,
            physical_volume: None,
            is_used: lv.is_open,
            is_ssd,
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub name_width: usize,
    pub usage_width: usize,
}

fn show_trailing_free(verbose: u8, trailing_free_bytes: u64) -> bool {
    trailing_free_bytes > 0
        && (verbose >= 2 || trailing_free_bytes > NOTABLE_TRAILING_FREE_BYTES)
}

fn row_free_space(row: &PartitionRow<'_>, unit_format: UnitFormat, show_used: bool) -> String {
    fmt_free_space(
        free_bytes(row.filesystem, row.physical_volume),
        row.size_bytes,
        unit_format,
        show_used,
    )
}

#[derive(Debug)]
pub struct TextReporter {
    verbose: u8,
    unit_format: UnitFormat,
    show_used: bool,
    layout: Layout,
    out: String,
}

impl TextReporter {
    pub fn new(options: &ReportOptions, layout: Layout) -> Self {
        Self {
            verbose: options.verbose,
            unit_format: options.unit_format,
            show_used: options.show_used,
            layout,
            out: String::new(),
        }
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn line(&mut self, line: &str) {
        self.out.push_str(line.trim_end());
        self.out.push('\n');
    }

    fn size(&self, bytes: u64) -> String {
        self.unit_format.format(bytes)
    }
}

impl Reporter for TextReporter {
    fn start_disk(&mut self, disk: &DiskProbe) {
        let mut heading = format!(
            "{}: {} ({})",
            disk.name,
            disk.model,
            self.size(disk.size_bytes)
        );
        if self.verbose >= 2 {
            heading.push_str(&format!(", firmware revision {}", disk.firmware_rev));
        }
        if disk.is_ssd && !disk.model.contains("SSD") {
            heading.push_str(" [SSD]");
        }
        self.line(&heading);
    }

    fn end_disk(&mut self, mut unallocated_bytes: u64, trailing_free_bytes: u64) {
        let name_width = self.layout.name_width;
        if show_trailing_free(self.verbose, trailing_free_bytes) {
            let line = format!(
                "  {:name_width$} {:>10} (unused)",
                "",
                self.size(trailing_free_bytes)
            );
            self.line(&line);
            unallocated_bytes = unallocated_bytes.saturating_sub(trailing_free_bytes);
        }
        if unallocated_bytes > 0 && self.verbose >= 2 {
            let line = format!(
                "  {:name_width$} {:>10} (metadata/internal fragmentation)",
                "",
                self.size(unallocated_bytes)
            );
            self.line(&line);
        }
    }

    fn partition(&mut self, row: &PartitionRow<'_>) {
        let Layout {
            name_width,
            usage_width,
        } = self.layout;
        let mut usage = row.usage.to_string();
        if row.is_ssd && self.verbose >= 2 {
            usage.push_str(" [SSD]");
        }
        let line = format!(
            "  {:name_width$} {:>10}  {:usage_width$}  {:>15}",
            format!("{}:", row.name),
            self.size(row.size_bytes),
            usage,
            row_free_space(row, self.unit_format, self.show_used),
        );
        self.line(&line);
    }

    fn start_volume_group(&mut self, vg: &VolumeGroup) {
        let heading = format!("{}: LVM ({})", vg.name, self.size(vg.size_kb * 1024));
        self.line(&heading);
    }

    fn end_volume_group(&mut self, vg: &VolumeGroup) {
        if vg.free_kb >= 1024 || self.verbose >= 2 {
            let name_width = self.layout.name_width;
            let line = format!(
                "  {:name_width$} {:>10}",
                "free:",
                self.size(vg.free_kb * 1024)
            );
            self.line(&line);
        }
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[derive(Debug)]
pub struct HtmlReporter {
    verbose: u8,
    unit_format: UnitFormat,
    show_used: bool,
    out: String,
}

impl HtmlReporter {
    pub fn new(options: &ReportOptions) -> Self {
        Self {
            verbose: options.verbose,
            unit_format: options.unit_format,
            show_used: options.show_used,
            out: String::new(),
        }
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn line(&mut self, line: &str) {
        self.out.push_str(line);
        self.out.push('\n');
    }

    fn size(&self, bytes: u64) -> String {
        self.unit_format.format(bytes)
    }

    fn heading_row(&mut self, text: &str, badges: &[&str]) {
        self.line("<tr>");
        self.line("  <th colspan=\"4\">");
        self.line(&format!("    {}", escape_html(text)));
        self.badges(badges);
        self.line("  </th>");
        self.line("</tr>");
    }

    fn row(&mut self, cells: [&str; 4], tr_class: &str, badges: &[&str]) {
        let [name, size, usage, free_space] = cells;
        self.open_tag("tr", tr_class, 0);
        self.cell(name, "", badges);
        self.cell(size, "text-right", &[]);
        self.cell(usage, "", &[]);
        self.cell(free_space, "text-right", &[]);
        self.line("</tr>");
    }

    fn cell(&mut self, text: &str, css_class: &str, badges: &[&str]) {
        self.open_tag("td", css_class, 1);
        if !text.is_empty() {
            self.line(&format!("    {}", escape_html(text)));
        }
        self.badges(badges);
        self.line("  </td>");
    }

    fn open_tag(&mut self, name: &str, css_class: &str, indent: usize) {
        let indent = "  ".repeat(indent);
        if css_class.is_empty() {
            self.line(&format!("{indent}<{name}>"));
        } else {
            self.line(&format!("{indent}<{name} class=\"{css_class}\">"));
        }
    }

    fn badges(&mut self, badges: &[&str]) {
        for badge in badges {
            self.line(&format!(
                "    <span class=\"label label-info\">{}</span>",
                escape_html(badge)
            ));
        }
    }
}

impl Reporter for HtmlReporter {
    fn start_report(&mut self) {
        self.line("<table class=\"disk-inventory table table-hover\">");
    }

    fn end_report(&mut self, warnings: &[String]) {
        self.line("</table>");
        for warning in warnings {
            self.line(&format!("<p class=\"warning\">{}</p>", escape_html(warning)));
        }
    }

    fn start_disk(&mut self, disk: &DiskProbe) {
        let heading = format!(
            "{}: {} ({}), firmware revision {}",
            disk.name,
            disk.model,
            self.size(disk.size_bytes),
            disk.firmware_rev
        );
        let badges: &[&str] = if disk.is_ssd { &["SSD"] } else { &[] };
        self.heading_row(&heading, badges);
    }

    fn end_disk(&mut self, mut unallocated_bytes: u64, trailing_free_bytes: u64) {
        if show_trailing_free(self.verbose, trailing_free_bytes) {
            let size = self.size(trailing_free_bytes);
            self.row(["", &size, "(unused)", ""], "text-muted", &[]);
            unallocated_bytes = unallocated_bytes.saturating_sub(trailing_free_bytes);
        }
        if unallocated_bytes > 0 && self.verbose >= 2 {
            let size = self.size(unallocated_bytes);
            self.row(
                ["", &size, "(metadata/internal fragmentation)", ""],
                "text-muted",
                &[],
            );
        }
    }

    fn partition(&mut self, row: &PartitionRow<'_>) {
        let mut usage = row.usage.to_string();
        if !row.is_used {
            if usage.is_empty() {
                usage.push_str("(unused)");
            } else if usage.starts_with("md") {
                usage.push_str(" (unused)");
            }
        }
        let size = self.size(row.size_bytes);
        let free_space = row_free_space(row, self.unit_format, self.show_used);
        let tr_class = if row.is_used { "" } else { "text-muted" };
        let badges: &[&str] = if row.is_ssd { &["SSD"] } else { &[] };
        self.row([row.name, &size, &usage, &free_space], tr_class, badges);
    }

    fn start_volume_group(&mut self, vg: &VolumeGroup) {
        let heading = format!("{}: LVM ({})", vg.name, self.size(vg.size_kb * 1024));
        self.heading_row(&heading, &[]);
    }

    fn end_volume_group(&mut self, vg: &VolumeGroup) {
        if vg.free_kb >= 1024 || self.verbose >= 2 {
            let size = self.size(vg.free_kb * 1024);
            self.row(["free", &size, "", ""], "text-muted", &[]);
        }
    }
}

#[derive(Debug)]
pub struct JsonReporter {
    report: InventoryReport,
}

impl JsonReporter {
    pub fn new(options: &ReportOptions) -> Self {
        Self {
            report: InventoryReport {
                generated_at: options.generated_at.clone(),
                ..InventoryReport::default()
            },
        }
    }

    pub fn into_report(self) -> InventoryReport {
        self.report
    }

    fn volume_usage(row: &PartitionRow<'_>) -> VolumeUsage {
        VolumeUsage {
            name: row.name.to_string(),
            size_bytes: row.size_bytes,
            usage: row.usage.to_string(),
            is_used: row.is_used,
            is_ssd: row.is_ssd,
            filesystem: row.filesystem.cloned(),
            physical_volume: row.physical_volume.cloned(),
            free_bytes: free_bytes(row.filesystem, row.physical_volume),
        }
    }
}

impl Reporter for JsonReporter {
    fn end_report(&mut self, warnings: &[String]) {
        self.report.warnings = warnings.to_vec();
    }

    fn start_disk(&mut self, disk: &DiskProbe) {
        self.report.disks.push(DiskReport {
            name: disk.name.clone(),
            model: disk.model.clone(),
            size_bytes: disk.size_bytes,
            firmware_rev: disk.firmware_rev.clone(),
            is_ssd: disk.is_ssd,
            partitions: Vec::new(),
            unallocated_bytes: 0,
            trailing_free_bytes: 0,
        });
    }

    fn end_disk(&mut self, unallocated_bytes: u64, trailing_free_bytes: u64) {
        if let Some(disk) = self.report.disks.last_mut() {
            disk.unallocated_bytes = unallocated_bytes;
            disk.trailing_free_bytes = trailing_free_bytes;
        }
    }

    fn partition(&mut self, row: &PartitionRow<'_>) {
        if let Some(disk) = self.report.disks.last_mut() {
            disk.partitions.push(Self::volume_usage(row));
        }
    }

    fn start_volume_group(&mut self, vg: &VolumeGroup) {
        self.report.volume_groups.push(VolumeGroupReport {
            name: vg.name.clone(),
            size_bytes: vg.size_kb * 1024,
            used_bytes: vg.used_kb * 1024,
            free_bytes: vg.free_kb * 1024,
            logical_volumes: Vec::new(),
        });
    }

    fn end_volume_group(&mut self, _vg: &VolumeGroup) {}

    fn logical_volume(
        &mut self,
        lv: &LogicalVolume,
        usage: &str,
        filesystem: Option<&FilesystemInfo>,
        is_ssd: bool,
    ) {
        let row = PartitionRow {
            name: &lv.name,
            size_bytes: lv.size_bytes,
            usage,
            filesystem,
            physical_volume: None,
            is_used: lv.is_open,
            is_ssd,
        };
        if let Some(vg) = self.report.volume_groups.last_mut() {
            vg.logical_volumes.push(Self::volume_usage(&row));
        }
    }
}
