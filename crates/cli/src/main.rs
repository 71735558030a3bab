use std::io::{self, Write};

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::{ArgAction, Args, Parser, Subcommand};
use disk_inventory_core::{
    collect_doctor_info, fmt_size_decimal, render, DoctorInfo, Inventory, LinuxHost,
    OutputFormat, ReportOptions, UnitFormat,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "disk-inventory",
    version,
    about = "List physical disks, partitions, LVM volumes and what each one is used for."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    report: ReportArgs,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show environment details and which inventory sources are available.
    Doctor(DoctorArgs),
}

#[derive(Debug, Args)]
struct ReportArgs {
    /// More detail: firmware, placeholder partitions, SSD flags, all free space.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Decimal units, 1 KB = 1000 B (default).
    #[arg(long, conflicts_with = "si")]
    decimal: bool,

    /// Binary units, 1 KiB = 1024 B.
    #[arg(long)]
    si: bool,

    /// Show used space instead of free space.
    #[arg(long)]
    used: bool,

    /// Emit an HTML table.
    #[arg(long, conflicts_with = "json")]
    html: bool,

    /// Emit a JSON document.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct DoctorArgs {
    /// Emit JSON instead of text.
    #[arg(long)]
    json: bool,
}

impl ReportArgs {
    fn options(&self) -> ReportOptions {
        ReportOptions {
            verbose: self.verbose.saturating_add(1),
            unit_format: if self.si && !self.decimal {
                UnitFormat::Binary
            } else {
                UnitFormat::Decimal
            },
            show_used: self.used,
            generated_at: self
                .json
                .then(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
            ..ReportOptions::default()
        }
    }

    fn format(&self) -> OutputFormat {
        if self.html {
            OutputFormat::Html
        } else if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Doctor(args)) => run_doctor_command(args),
        None => run_report_command(&cli.report),
    }
}

fn run_report_command(args: &ReportArgs) -> Result<()> {
    let inventory = Inventory::new(LinuxHost::new());
    let payload = render(&inventory, &args.options(), args.format())
        .context("failed to serialize inventory report")?;
    write_stdout(&payload)
}

fn run_doctor_command(args: DoctorArgs) -> Result<()> {
    let info = collect_doctor_info(&LinuxHost::new());
    if args.json {
        let payload =
            serde_json::to_string_pretty(&info).context("failed to serialize doctor info")?;
        return write_stdout(&format!("{payload}\n"));
    }
    write_stdout(&doctor_text(&info))
}

fn doctor_text(info: &DoctorInfo) -> String {
    let mut out = String::new();
    out.push_str(&format!("OS: {} ({})\n", info.os, info.arch));
    out.push_str(&format!("Running as root: {}\n", yes_no(info.is_root)));
    out.push_str(&format!("/sys/block present: {}\n", yes_no(info.sys_block_present)));
    out.push_str(&format!(
        "/dev/mapper present: {}\n",
        yes_no(info.device_mapper_present)
    ));
    if let Some(bytes) = info.root_filesystem_bytes {
        out.push_str(&format!("Root filesystem: {}\n", fmt_size_decimal(bytes)));
    }
    out.push_str("Tools:\n");
    for tool in &info.tools {
        let status = if tool.available { "found" } else { "missing" };
        out.push_str(&format!("- {}: {status}\n", tool.name));
    }
    for note in &info.notes {
        out.push_str(&format!("Note: {note}\n"));
    }
    out
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn write_stdout(payload: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(payload.as_bytes())
        .and_then(|()| stdout.flush())
        .context("failed to write to stdout")
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("disk-inventory").chain(args.iter().copied()))
    }

    #[test]
    fn verbosity_counts_from_one() {
        let cli = parse(&[]).expect("parse");
        assert_eq!(cli.report.options().verbose, 1);
        let cli = parse(&["-vv"]).expect("parse");
        assert_eq!(cli.report.options().verbose, 3);
    }

    #[test]
    fn unit_and_format_flags() {
        let cli = parse(&["--si", "--used", "--html"]).expect("parse");
        let options = cli.report.options();
        assert_eq!(options.unit_format, UnitFormat::Binary);
        assert!(options.show_used);
        assert_eq!(cli.report.format(), OutputFormat::Html);
        assert_eq!(options.generated_at, None);

        let cli = parse(&["--json"]).expect("parse");
        assert_eq!(cli.report.format(), OutputFormat::Json);
        assert!(cli.report.options().generated_at.is_some());
    }

    #[test]
    fn exclusive_flags_conflict() {
        assert!(parse(&["--decimal", "--si"]).is_err());
        assert!(parse(&["--html", "--json"]).is_err());
    }

    #[test]
    fn doctor_subcommand() {
        let cli = parse(&["doctor", "--json"]).expect("parse");
        assert!(matches!(cli.command, Some(Commands::Doctor(DoctorArgs { json: true }))));
    }

    #[test]
    fn doctor_text_lists_tools_and_notes() {
        let info = DoctorInfo {
            os: "linux".to_string(),
            arch: "x86_64".to_string(),
            is_root: false,
            sys_block_present: true,
            device_mapper_present: false,
            root_filesystem_bytes: Some(42_000_000_000),
            tools: vec![disk_inventory_core::ToolStatus {
                name: "lvs".to_string(),
                available: false,
            }],
            notes: vec!["LVM details need root.".to_string()],
        };
        let text = doctor_text(&info);
        assert!(text.contains("Running as root: no\n"));
        assert!(text.contains("Root filesystem: 42.0 GB\n"));
        assert!(text.contains("- lvs: missing\n"));
        assert!(text.ends_with("Note: LVM details need root.\n"));
    }
}
