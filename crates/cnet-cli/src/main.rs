//! cnetcheck: audit a control network for islands and measurement defects.

mod report;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use cnet_check::{run_audit, AuditConfig, LabelOpener, LogProgress};
use cnet_core::{ControlNet, ImageCatalog};
use tracing::info;

use report::{write_reports, Categories, Delimiter, Report, ReportOptions};

#[derive(Debug, Parser)]
#[command(name = "cnetcheck", version)]
#[command(about = "Check a control network for disconnected images and measurement defects")]
struct Args {
    /// Control network (JSON).
    #[arg(long)]
    cnet: PathBuf,

    /// List of image label files, one per line.
    #[arg(long)]
    from_list: PathBuf,

    /// Prefix prepended to every report file name.
    #[arg(long, default_value = "")]
    prefix: String,

    /// Optional JSON AuditConfig. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Field separator of report rows.
    #[arg(long, value_enum, default_value_t = DelimitArg::Tab)]
    delimit: DelimitArg,

    /// Separator used with `--delimit custom`.
    #[arg(long)]
    custom: Option<String>,

    /// Minimum convex hull / frame area ratio per image.
    #[arg(long)]
    tolerance: Option<f64>,

    /// Treat ignored points and measures like any other.
    #[arg(long)]
    no_ignore: bool,

    /// Maximum number of label files held open at once.
    #[arg(long)]
    cache_capacity: Option<usize>,

    /// Report categories to skip (comma separated).
    #[arg(long, value_enum, value_delimiter = ',')]
    skip: Vec<Category>,

    /// Also write the full audit as JSON to this path.
    #[arg(long)]
    json: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DelimitArg {
    Tab,
    Comma,
    Space,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Category {
    SingleMeasure,
    NoLatLon,
    NoControl,
    NoCube,
    SingleCube,
    LowCoverage,
}

fn load_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let data =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("cannot parse {}", path.display()))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn delimiter(args: &Args) -> Result<Delimiter> {
    Ok(match args.delimit {
        DelimitArg::Tab => Delimiter::Tab,
        DelimitArg::Comma => Delimiter::Comma,
        DelimitArg::Space => Delimiter::Space,
        DelimitArg::Custom => match &args.custom {
            Some(s) if !s.is_empty() => Delimiter::Custom(s.clone()),
            _ => bail!("--delimit custom requires a non-empty --custom separator"),
        },
    })
}

fn categories(skip: &[Category]) -> Categories {
    let on = |c: Category| !skip.contains(&c);
    Categories {
        single_measure: on(Category::SingleMeasure),
        no_lat_lon: on(Category::NoLatLon),
        no_control: on(Category::NoControl),
        no_cube: on(Category::NoCube),
        single_cube: on(Category::SingleCube),
        low_coverage: on(Category::LowCoverage),
    }
}

fn audit_config(args: &Args, categories: &Categories) -> Result<AuditConfig> {
    let mut config = match &args.config {
        Some(path) => load_json_file::<AuditConfig>(path)?,
        None => AuditConfig::default(),
    };
    if let Some(tolerance) = args.tolerance {
        config.tolerance = tolerance;
    }
    if let Some(capacity) = args.cache_capacity {
        config.cache_capacity = capacity;
    }
    if args.no_ignore {
        config.honor_ignore = false;
    }
    config.check_reprojection &= categories.no_lat_lon;
    config.check_coverage &= categories.low_coverage;
    Ok(config)
}

fn run_from_args(args: &Args) -> Result<Report> {
    let categories = categories(&args.skip);
    let config = audit_config(args, &categories)?;
    let options = ReportOptions {
        prefix: args.prefix.clone(),
        delimiter: delimiter(args)?,
        categories,
        cnet_name: display_name(&args.cnet),
        list_name: display_name(&args.from_list),
    };

    let net: ControlNet = load_json_file(&args.cnet)?;
    let catalog = ImageCatalog::from_list_file(&args.from_list)?;
    info!(
        points = net.num_points(),
        images = catalog.len(),
        "inputs loaded"
    );

    let mut progress = LogProgress::new();
    let audit = run_audit(&net, &catalog, LabelOpener, &config, &mut progress)?;

    if let Some(path) = &args.json {
        let json = serde_json::to_string_pretty(&audit)?;
        fs::write(path, json).with_context(|| format!("cannot write {}", path.display()))?;
    }

    write_reports(&audit, &catalog, &options)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = try_main() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let args = Args::parse();
    let report = run_from_args(&args)?;
    for (keyword, count) in &report.results {
        info!(keyword, count, "result");
    }
    info!(files = report.files.len(), "reports written");
    print!("{}", report.summary);
    Ok(())
}
