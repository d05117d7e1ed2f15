// Entry point and high-level CLI flow.
//
// - Load the ledger CSV and, in single-month mode, keep one statistic month.
// - Build one report table per insurance category.
// - Write one CSV "sheet" per category, an optional JSON dump, and print
//   Markdown previews to the console.
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use insurance_report::config::{split_names, ReportConfig};
use insurance_report::output::{self, Layout};
use insurance_report::{loader, reports, util};
use log::info;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LayoutArg {
    Long,
    Wide,
}

impl From<LayoutArg> for Layout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Long => Layout::Long,
            LayoutArg::Wide => Layout::Wide,
        }
    }
}

/// Build per-category insurance business reports from a policy ledger
#[derive(Parser, Debug)]
#[command(name = "insurance-report", version, about)]
struct Cli {
    /// Ledger CSV (UTF-8)
    #[arg(short, long)]
    input: PathBuf,

    /// Directory receiving one CSV per category
    #[arg(short, long, default_value = "reports")]
    output_dir: PathBuf,

    /// JSON configuration file (column names, labels, options)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Sheet layout
    #[arg(long, value_enum, default_value = "wide")]
    layout: LayoutArg,

    /// Also dump every table to this JSON file
    #[arg(long)]
    json: Option<PathBuf>,

    /// Rows to preview per category on the console
    #[arg(long, default_value_t = 3)]
    preview: usize,

    /// Report a single statistic month only
    #[arg(long)]
    single_month: bool,

    /// Statistic month for single-month mode (defaults to two months ago)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    statistic_month: Option<u32>,

    /// Pinned company names, whitespace separated
    #[arg(long)]
    pinned: Option<String>,

    /// Category left out of the report
    #[arg(long)]
    exclude: Option<String>,

    /// Value substituted for missing cells
    #[arg(long)]
    fill_value: Option<f64>,
}

fn load_config(cli: &Cli) -> Result<ReportConfig> {
    let mut config = match &cli.config {
        Some(path) => ReportConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => ReportConfig::default(),
    };
    if let Some(names) = &cli.pinned {
        config.top_3_company_names = split_names(names);
    }
    if let Some(name) = &cli.exclude {
        config.excluded_category_name = name.trim().to_string();
    }
    if let Some(v) = cli.fill_value {
        config.fill_value = v;
    }
    if cli.single_month {
        config.single_month_mode = true;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let (mut raw, load_report) = loader::load_raw_table(&cli.input)
        .with_context(|| format!("loading {}", cli.input.display()))?;
    println!(
        "Processing dataset... ({} rows loaded)",
        util::format_int(load_report.total_rows)
    );
    if load_report.short_rows > 0 {
        println!(
            "Note: {} rows had fewer cells than the header; missing cells were filled.",
            util::format_int(load_report.short_rows)
        );
    }

    if config.single_month_mode {
        let month = cli
            .statistic_month
            .unwrap_or_else(|| loader::statistic_month(chrono::Local::now().date_naive()));
        let kept = loader::filter_statistic_month(&mut raw, &config.fields, month)?;
        println!(
            "Single-month mode: statistic month {} ({} rows)",
            month,
            util::format_int(kept)
        );
    }

    let tables = reports::generate(&raw, &config)?;
    let paths = output::write_sheets(
        &cli.output_dir,
        &tables,
        &config.fields,
        &config.labels,
        cli.layout.into(),
    )
    .with_context(|| format!("writing sheets to {}", cli.output_dir.display()))?;

    for (table, path) in tables.values().zip(&paths) {
        println!("\n{}\n", table.category);
        println!(
            "{}\n",
            output::preview_table(table, &config.fields, &config.labels, cli.preview)
        );
        println!("(Full table exported to {})", path.display());
    }

    if let Some(json) = &cli.json {
        output::write_json(json, &tables)
            .with_context(|| format!("writing {}", json.display()))?;
        println!("\nAll tables saved to {}", json.display());
    }

    let categories: Vec<&str> = tables.keys().map(String::as_str).collect();
    info!("categories reported: {}", categories.join(", "));
    Ok(())
}
