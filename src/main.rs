use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use lodging_dash::dashboard::territory_views;
use lodging_dash::export::{write_views, ViewFormat};
use lodging_dash::{
    ColumnSchema, Dashboard, DashboardConfig, DatasetCache, Metric, MetricView, RegionMode,
    ValueColumn,
};

#[derive(Parser)]
#[command(name = "lodging-dash")]
#[command(about = "Year-over-year lodging facility metrics by region and municipality")]
#[command(version)]
struct Cli {
    /// Path to a JSON config file (default: ./lodging-dash.json if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the three long-form tables (overrides config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tables for selected municipalities
    Municipalities {
        /// Municipality name, repeatable
        #[arg(long = "name")]
        names: Vec<String>,

        #[command(flatten)]
        view: ViewArgs,
    },
    /// Tables for selected areas
    Regions {
        /// Area name, repeatable (e.g. 南部, 宮古)
        #[arg(long = "region")]
        regions: Vec<String>,

        /// Use the area → municipality breakdown instead of name matching
        #[arg(long)]
        classified: bool,

        #[command(flatten)]
        view: ViewArgs,
    },
    /// Prefecture-wide totals
    Territory {
        #[arg(long, value_enum, default_value = "value")]
        column: ColumnArg,

        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// List selectable municipalities
    List,
}

#[derive(Args)]
struct ViewArgs {
    /// Metric, repeatable
    #[arg(long, value_enum, default_values = ["facilities"])]
    metric: Vec<MetricArg>,

    /// First year (inclusive, overrides config)
    #[arg(long)]
    from: Option<i32>,

    /// Last year (inclusive, overrides config)
    #[arg(long)]
    to: Option<i32>,

    #[arg(long, value_enum, default_value = "value")]
    column: ColumnArg,

    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricArg {
    Facilities,
    Rooms,
    Capacity,
}

impl From<MetricArg> for Metric {
    fn from(m: MetricArg) -> Self {
        match m {
            MetricArg::Facilities => Metric::Facilities,
            MetricArg::Rooms => Metric::Rooms,
            MetricArg::Capacity => Metric::Capacity,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ColumnArg {
    Value,
    Delta,
}

impl From<ColumnArg> for ValueColumn {
    fn from(c: ColumnArg) -> Self {
        match c {
            ColumnArg::Value => ValueColumn::Value,
            ColumnArg::Delta => ValueColumn::Delta,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Csv,
    /// Chart series as `name,year,value` rows
    SeriesCsv,
    Json,
}

impl From<OutputFormat> for ViewFormat {
    fn from(f: OutputFormat) -> Self {
        match f {
            OutputFormat::Table => ViewFormat::Table,
            OutputFormat::Csv => ViewFormat::Csv,
            OutputFormat::SeriesCsv => ViewFormat::SeriesCsv,
            OutputFormat::Json => ViewFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = DashboardConfig::discover(cli.config.as_deref()).context("reading config")?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    match cli.command {
        Commands::Territory { column, format } => {
            let views = territory_views()?;
            emit(&views, column.into(), format, &config.columns)
        }
        Commands::List => {
            let dashboard = open(&config)?;
            let stdout = io::stdout();
            let mut out = stdout.lock();
            for name in dashboard.municipality_options() {
                writeln!(out, "{name}")?;
            }
            Ok(())
        }
        Commands::Municipalities { names, view } => {
            let mut dashboard = open(&config)?;
            apply_view_args(&mut dashboard, &view)?;
            for name in &names {
                dashboard.toggle_municipality(name);
            }
            let views = dashboard.municipality_views()?;
            if views.is_empty() {
                eprintln!("No data for the selected municipalities. Pass --name to select one.");
                return Ok(());
            }
            emit(&views, view.column.into(), view.format, &config.columns)
        }
        Commands::Regions {
            regions,
            classified,
            view,
        } => {
            let mut dashboard = open(&config)?;
            apply_view_args(&mut dashboard, &view)?;
            if classified {
                dashboard.region_mode = RegionMode::Classified;
            }
            for region in &regions {
                dashboard.toggle_region(region);
            }
            let views = dashboard.region_views()?;
            if views.is_empty() {
                eprintln!(
                    "No area selected. Pass --region with one of: {}",
                    config.regions.join(", ")
                );
                return Ok(());
            }
            emit(&views, view.column.into(), view.format, &config.columns)
        }
    }
}

fn open(config: &DashboardConfig) -> Result<Dashboard> {
    let cache = DatasetCache::new();
    let sources = config.sources();
    let dataset = cache
        .get_or_load(&sources)
        .with_context(|| format!("loading tables from {}", config.data_dir.display()))?;
    Ok(Dashboard::new(dataset, config)?)
}

fn apply_view_args(dashboard: &mut Dashboard, view: &ViewArgs) -> Result<()> {
    dashboard.metrics.clear();
    for &m in &view.metric {
        let metric = Metric::from(m);
        if !dashboard.metrics.contains(&metric) {
            dashboard.metrics.push(metric);
        }
    }
    let min = view.from.unwrap_or(dashboard.years.min());
    let max = view.to.unwrap_or(dashboard.years.max());
    dashboard.set_years(min, max)?;
    Ok(())
}

fn emit(
    views: &[MetricView],
    column: ValueColumn,
    format: OutputFormat,
    columns: &ColumnSchema,
) -> Result<()> {
    let stdout = io::stdout();
    write_views(views, column, format.into(), columns, stdout.lock())?;
    Ok(())
}
