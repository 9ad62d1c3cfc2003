// Entry point and high-level CLI flow.
//
// - `clean` reads the four raw extracts, cleans them and writes the cleaned
//   copies, printing per-dataset counts.
// - `report` loads the cleaned copies, builds the dashboard for the given
//   filter plus the story tables, exports every table and previews them.
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use cre_trends::canonical::Canonicalizer;
use cre_trends::config::PipelineConfig;
use cre_trends::geocode::GeocodeCache;
use cre_trends::industry::IndustryClassifier;
use cre_trends::logging::{init_logging, LogConfig, LogFormat};
use cre_trends::reports::{self, DashboardFilter, OccupancyView};
use cre_trends::types::{MapPinRow, MetroRentRow, RankingRow, SeriesRow};
use cre_trends::{loader, output, util};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "cre-trends", version, about = "Clean and summarize commercial real-estate market extracts")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// More diagnostics on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only report errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Diagnostic line layout.
    #[arg(long = "log-format", value_enum, default_value = "full", global = true)]
    log_format: LogFormatArg,
}

#[derive(Subcommand)]
enum Command {
    /// Clean the raw extracts and write the cleaned CSVs.
    Clean(CommonArgs),
    /// Build dashboard and story tables from the cleaned CSVs.
    Report(ReportArgs),
}

#[derive(Args)]
struct CommonArgs {
    /// JSON pipeline configuration; built-in defaults when omitted.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory holding the raw extracts.
    #[arg(long = "data-dir", value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Directory for cleaned files and report exports.
    #[arg(long = "output-dir", value_name = "DIR")]
    output_dir: Option<PathBuf>,
}

#[derive(Args)]
struct ReportArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// First quarter shown on the dashboard (YYYY-MM-DD, inclusive).
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last quarter shown on the dashboard (YYYY-MM-DD, inclusive).
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Occupancy series shown on the dashboard.
    #[arg(long, value_enum, default_value = "raw")]
    view: ViewArg,

    /// Rows shown per console preview.
    #[arg(long, default_value_t = 5)]
    preview: usize,
}

#[derive(Clone, Copy, ValueEnum)]
enum ViewArg {
    Raw,
    #[value(name = "2y")]
    TwoYear,
    #[value(name = "3y")]
    ThreeYear,
}

impl From<ViewArg> for OccupancyView {
    fn from(value: ViewArg) -> Self {
        match value {
            ViewArg::Raw => OccupancyView::Raw,
            ViewArg::TwoYear => OccupancyView::TwoYear,
            ViewArg::ThreeYear => OccupancyView::ThreeYear,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Full,
    Compact,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Full => LogFormat::Full,
            LogFormatArg::Compact => LogFormat::Compact,
        }
    }
}

fn load_config(args: &CommonArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    Ok(config)
}

fn run_clean(args: &CommonArgs) -> Result<()> {
    let config = load_config(args)?;
    println!("Cleaning datasets from {} ...\n", config.data_dir.display());
    let reports = loader::clean_all(&config).context("cleaning failed")?;
    for r in &reports {
        println!(
            "{}: {} rows read, {} kept ({} duplicates, {} empty, {} missing required fields)",
            r.dataset,
            util::format_int(r.total_rows),
            util::format_int(r.kept_rows),
            util::format_int(r.duplicates),
            util::format_int(r.empty_rows),
            util::format_int(r.missing_required),
        );
    }
    println!("\nCleaned files saved to {}", config.output_dir.display());
    Ok(())
}

fn export<T: Serialize>(dir: &Path, file: &str, rows: &[T]) -> Result<PathBuf> {
    let path = dir.join(file);
    output::write_csv(&path, rows).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

fn exported(path: &Path) {
    println!("(Full table exported to {})\n", path.display());
}

#[derive(Serialize)]
struct Summary<'a> {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    view: String,
    insights: &'a cre_trends::types::Insights,
    region_shift: &'a [(String, f64)],
    construction_leasing_msf: &'a [(String, f64)],
}

fn run_report(args: &ReportArgs) -> Result<()> {
    let config = load_config(&args.common)?;
    let tables = config.lookup_tables().context("failed to load lookup tables")?;
    let canon = Canonicalizer::new(&tables);
    let classifier = IndustryClassifier::new(&tables.industries);
    let data = loader::load_cleaned(&config).context("failed to load cleaned datasets")?;
    let cache_path = config.data_dir.join(&config.geocode_cache);
    let cache = GeocodeCache::load(&cache_path)
        .with_context(|| format!("failed to read geocode cache {}", cache_path.display()))?;

    let filter = DashboardFilter {
        start: args.start,
        end: args.end,
        view: args.view.into(),
    };
    let dashboard = reports::build_dashboard(&data, filter);
    let story = reports::build_story(&data, &canon, &classifier, &cache, &config);
    let out = config.output_dir.as_path();
    std::fs::create_dir_all(out).with_context(|| format!("failed to create {}", out.display()))?;
    let n = args.preview;

    println!("Generating reports...");
    println!("Outputs saved to {}\n", out.display());

    let prices = reports::series_rows(&dashboard.price_trends, 2);
    let file = export(out, "dashboard_price_trends.csv", &prices)?;
    output::preview_table(1, "Average Overall Rent by Market", None, &prices, n);
    exported(&file);

    let occupancy = reports::occupancy_rows(&dashboard.occupancy, filter.view);
    let file = export(out, "dashboard_occupancy.csv", &occupancy)?;
    let view = filter.view.to_string();
    output::preview_table(2, "Occupancy by Market", Some(&view), &occupancy, n);
    exported(&file);

    let activity = reports::ranking_rows(&dashboard.lease_activity, 0);
    let file = export(out, "dashboard_lease_activity.csv", &activity)?;
    output::preview_table(3, "Leased Square Feet by Market", None, &activity, n);
    exported(&file);

    let unemployment = reports::series_rows(&dashboard.unemployment, 2);
    let file = export(out, "dashboard_unemployment.csv", &unemployment)?;
    output::preview_table(4, "Unemployment Rate by State", None, &unemployment, n);
    exported(&file);

    let rent_index: Vec<SeriesRow> = reports::series_rows(&story.rent_index, 2);
    let file = export(out, "story_rent_index.csv", &rent_index)?;
    let growth: Vec<RankingRow> = reports::ranking_rows(&story.rent_growth, 2);
    export(out, "story_rent_growth.csv", &growth)?;
    output::preview_table(5, "Rent Growth Since Baseline (%)", Some(&config.baseline.to_string()), &growth, n);
    exported(&file);

    let construction = reports::series_rows(&story.industry_leasing, 0);
    let file = export(out, "story_industry_leasing.csv", &construction)?;
    let totals = reports::ranking_rows(&story.industry_totals, 2);
    export(out, "story_industry_totals.csv", &totals)?;
    output::preview_table(6, "Industry Leasing Since Baseline (M SF)", Some(&config.target_industry), &totals, n);
    exported(&file);

    let change = reports::ranking_rows(&story.occupancy_change, 1);
    let file = export(out, "story_occupancy_change.csv", &change)?;
    output::preview_table(7, "Occupancy Change vs Pre-Period (pct points)", None, &change, n);
    exported(&file);

    let file = out.join("story_industry_share.csv");
    output::write_pivot_csv(&file, &story.industry_share, "Metro", 1)
        .with_context(|| format!("failed to write {}", file.display()))?;
    output::preview_pivot(8, "Industry Share by Metro (%)", &story.industry_share, "Metro", 1);
    exported(&file);

    let metro_rent: Vec<MetroRentRow> = reports::metro_rent_rows(&story.metro_rent);
    let file = export(out, "story_metro_rent.csv", &metro_rent)?;
    output::preview_table(9, "Cost-of-Living Indexed Rent by Metro", None, &metro_rent, n);
    exported(&file);

    let space = reports::ranking_rows(&story.metro_space, 0);
    let file = export(out, "story_metro_space.csv", &space)?;
    output::preview_table(10, "Available Space by Metro", None, &space, n);
    exported(&file);

    let regions = reports::region_rows(&story.region_leasing);
    let file = export(out, "story_region_leasing.csv", &regions)?;
    output::preview_table(11, "Quarterly Leasing by Region", None, &regions, n);
    exported(&file);

    let file = out.join("story_occupancy_heatmap.csv");
    output::write_pivot_csv(&file, &story.occupancy_heatmap, "Quarter", 4)
        .with_context(|| format!("failed to write {}", file.display()))?;
    output::preview_pivot(12, "Occupancy by Quarter and Year", &story.occupancy_heatmap, "Quarter", 4);
    exported(&file);

    let pins: &[MapPinRow] = &story.map_pins;
    let file = export(out, "story_map_pins.csv", pins)?;
    output::preview_table(13, "Mapped Leases", Some(&config.map_metro), pins, n);
    exported(&file);

    let region_years = reports::region_year_rows(&story.region_price_leasing);
    let file = export(out, "story_region_price_leasing.csv", &region_years)?;
    output::preview_table(14, "Average Leasing per Region and Year", None, &region_years, n);
    exported(&file);

    let rebound = reports::grouped_rows(&story.occupancy_rebound, 4);
    let file = export(out, "story_occupancy_rebound.csv", &rebound)?;
    let since = format!("{}+", config.shift_year);
    output::preview_table(15, "Occupancy Rebound: Sunbelt vs Coastal", Some(&since), &rebound, n);
    exported(&file);

    let highlights = reports::series_rows(&story.unemployment_highlights, 2);
    let file = export(out, "story_unemployment_highlights.csv", &highlights)?;
    output::preview_table(16, "Unemployment: US Average and Key States", None, &highlights, n);
    exported(&file);

    let occ_average = reports::series_rows(&story.occupancy_us_average, 4);
    let file = export(out, "story_occupancy_us_average.csv", &occ_average)?;
    output::preview_table(17, "Average Occupancy per Quarter", None, &occ_average, n);
    exported(&file);

    let summary = Summary {
        start: filter.start,
        end: filter.end,
        view,
        insights: &dashboard.insights,
        region_shift: &story.region_shift,
        construction_leasing_msf: &story.industry_totals,
    };
    let file = out.join("summary.json");
    output::write_json(&file, &summary).with_context(|| format!("failed to write {}", file.display()))?;
    println!("Summary (summary.json):");
    if let Some((market, rent)) = &dashboard.insights.most_affordable_market {
        println!("  Most affordable market: {} (${})", market, util::format_number(*rent, 2));
    }
    if let Some((market, occ)) = &dashboard.insights.highest_occupancy_market {
        println!("  Highest occupancy: {} ({}%)", market, util::format_number(occ * 100.0, 1));
    }
    if let Some((market, sf)) = &dashboard.insights.most_active_market {
        println!("  Most active market: {} ({} SF leased)", market, util::format_number(*sf, 0));
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(
        &LogConfig::from_flags(cli.verbose, cli.quiet).with_format(cli.log_format.into()),
    );
    let result = match &cli.command {
        Command::Clean(args) => run_clean(args),
        Command::Report(args) => run_report(args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
