use std::io::{self, Write};

use anyhow::Context;
use clap::Parser;
use tracing::info;

use pop_dashboard::config::{ReportArgs, ReportFormat};
use pop_dashboard::dataset::COLUMNS;
use pop_dashboard::format::thousands;
use pop_dashboard::{compute, logging, Dashboard, FilterOptions, Selection, TableSource};

fn main() -> anyhow::Result<()> {
    let args = ReportArgs::parse();
    logging::init_stderr_tracing();

    let source = args.source.source()?;
    let table = source.load().context("failed to load the population table")?;
    let options = FilterOptions::from_records(&table);
    let selection = selection_from_args(&args, &options);
    info!(
        prefectures = selection.prefectures.len(),
        year = selection.year,
        "rendering report"
    );

    let dashboard = compute(&table, &selection);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.format {
        ReportFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &dashboard)?;
            writeln!(out)?;
        }
        ReportFormat::Text => write_text(&mut out, &dashboard)?,
    }
    Ok(())
}

fn selection_from_args(args: &ReportArgs, options: &FilterOptions) -> Selection {
    let default = options.default_selection();
    let year = args
        .year
        .or_else(|| default.as_ref().map(|s| s.year))
        .unwrap_or(0);
    if args.none {
        Selection::new(Vec::<String>::new(), year)
    } else if args.prefectures.is_empty() {
        let prefectures = default.map(|s| s.prefectures).unwrap_or_default();
        Selection { prefectures, year }
    } else {
        Selection::new(args.prefectures.iter().cloned(), year)
    }
}

fn write_text<W: Write>(out: &mut W, dashboard: &Dashboard) -> io::Result<()> {
    let names: Vec<&str> = dashboard.selection.prefectures.iter().map(String::as_str).collect();
    writeln!(out, "都道府県: {}", names.join(", "))?;
    writeln!(out, "西暦（年）: {}", dashboard.selection.year)?;
    writeln!(out)?;

    let totals = dashboard.totals;
    writeln!(out, "総人口:   {:>15}", thousands(totals.total))?;
    writeln!(out, "男性人口: {:>15}", thousands(totals.male))?;
    writeln!(out, "女性人口: {:>15}", thousands(totals.female))?;
    writeln!(out)?;

    writeln!(out, "{}", COLUMNS.join("\t"))?;
    for record in &dashboard.filtered.records {
        writeln!(out, "{}", record.cells().join("\t"))?;
    }
    writeln!(out)?;

    writeln!(out, "都道府県名\t性別\t人口")?;
    for row in &dashboard.long_form {
        let population = row.population.map(|v| v.to_string()).unwrap_or_default();
        writeln!(out, "{}\t{}\t{}", row.prefecture, row.sex.column(), population)?;
    }
    writeln!(out)?;

    writeln!(out, "人口推移（総数）")?;
    for series in &dashboard.trend_series {
        let points: Vec<String> = series
            .points
            .iter()
            .map(|(year, total)| format!("{year}={}", thousands(*total)))
            .collect();
        writeln!(out, "{}: {}", series.prefecture, points.join(" "))?;
    }
    Ok(())
}
