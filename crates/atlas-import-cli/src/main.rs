use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use tracing::{error, info};

use atlas_import_core::catalog;
use atlas_import_core::config::{FitHeuristic, ImportConfig};
use atlas_import_core::{run_import, AssetDatabase, ImportError};

#[derive(Parser, Debug)]
#[command(
    name = "atlas-import",
    about = "Pack source images into texture atlas pages and project them onto sprites, backgrounds and fonts",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true, help_heading = "Logging")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(short, long, default_value_t = false, global = true, help_heading = "Logging")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full import pipeline against an asset database
    Import(ImportArgs),
    /// Validate the import folder without packing anything
    Validate(ImportArgs),
}

#[derive(Parser, Debug, Clone)]
struct ImportArgs {
    // Input/Output
    /// JSON or YAML config file
    #[arg(help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Import folder (overrides the config file)
    #[arg(short, long, help_heading = "Input/Output")]
    directory: Option<String>,
    /// Folder receiving pages, manifest and log (overrides the config file)
    #[arg(long, help_heading = "Input/Output")]
    temp_folder: Option<String>,
    /// Load the asset database from this JSON file instead of starting empty
    #[arg(long, help_heading = "Input/Output")]
    db: Option<PathBuf>,
    /// Write the projected asset database as JSON
    #[arg(long, help_heading = "Input/Output")]
    dump_db: Option<PathBuf>,

    // Packing
    /// Wildcard matched against file names
    #[arg(long, help_heading = "Packing")]
    search_pattern: Option<String>,
    /// Atlas page size in pixels (pages are square)
    #[arg(long, help_heading = "Packing")]
    texture_size: Option<u32>,
    /// Pixels left free between packed images
    #[arg(long, help_heading = "Packing")]
    padding: Option<u32>,
    /// Best-fit heuristic: area | max_one_axis
    #[arg(long, help_heading = "Packing")]
    fit: Option<String>,
    /// Import images from unrecognized folders as sprites
    #[arg(long, default_value_t = false, help_heading = "Packing")]
    import_unknown_as_sprite: bool,
    /// Log skip decisions for unknown-folder images
    #[arg(long, default_value_t = false, help_heading = "Packing")]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);
    let result = match &cli.command {
        Commands::Import(args) => run_with_config(args, run_import_command),
        Commands::Validate(args) => run_with_config(args, run_validate_command),
    };
    if let Err(e) = result {
        // Fatal core errors carry a numeric outcome code; use it as the
        // process exit code so callers can dispatch on it.
        let code = e
            .downcast_ref::<ImportError>()
            .map(ImportError::outcome_code)
            .unwrap_or(1);
        error!(code, "{e:#}");
        std::process::exit(code);
    }
}

fn run_with_config(
    args: &ImportArgs,
    run: fn(&ImportArgs, ImportConfig) -> anyhow::Result<()>,
) -> anyhow::Result<()> {
    let cfg = build_config(args)?;
    run(args, cfg)
}

fn run_import_command(args: &ImportArgs, cfg: ImportConfig) -> anyhow::Result<()> {
    let mut db = load_database(args)?;
    let report = run_import(&cfg, &mut db)?;
    for err in &report.asset_errors {
        error!("{err}");
    }
    info!(
        pages = report.pages,
        placements = report.placements,
        sprites = report.sprites_created,
        backgrounds = report.backgrounds_created,
        fonts = report.fonts_created,
        rejected = report.rejected.len(),
        manifest = %report.manifest_path.display(),
        "import complete"
    );
    if let Some(path) = &args.dump_db {
        let json = serde_json::to_string_pretty(&db)?;
        fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
        info!(path = %path.display(), "asset database written");
    }
    Ok(())
}

fn run_validate_command(_args: &ImportArgs, cfg: ImportConfig) -> anyhow::Result<()> {
    cfg.validate()?;
    catalog::validate_import_folder(Path::new(&cfg.directory), &cfg)?;
    info!(directory = %cfg.directory, "import folder is valid");
    Ok(())
}

/// Loads the config file (JSON by extension, YAML otherwise) and applies
/// command-line overrides on top.
fn build_config(args: &ImportArgs) -> anyhow::Result<ImportConfig> {
    let mut cfg = if let Some(path) = &args.config {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        if path.extension().is_some_and(|e| e == "json") {
            serde_json::from_str(&text)
                .with_context(|| format!("parse config {}", path.display()))?
        } else {
            serde_yaml::from_str(&text)
                .with_context(|| format!("parse config {}", path.display()))?
        }
    } else {
        ImportConfig::default()
    };

    if let Some(v) = &args.directory {
        cfg.directory = v.clone();
    }
    if let Some(v) = &args.temp_folder {
        cfg.temp_folder = v.clone();
    }
    if let Some(v) = &args.search_pattern {
        cfg.search_pattern = v.clone();
    }
    if let Some(v) = args.texture_size {
        cfg.texture_size = v;
    }
    if let Some(v) = args.padding {
        cfg.padding_between_images = v;
    }
    if let Some(v) = &args.fit {
        cfg.fit_heuristic = v
            .parse::<FitHeuristic>()
            .map_err(|_| anyhow::anyhow!("unknown fit heuristic: {v}"))?;
    }
    if args.import_unknown_as_sprite {
        cfg.import_unknown_as_sprite = true;
    }
    if args.debug {
        cfg.debug = true;
    }
    Ok(cfg)
}

fn load_database(args: &ImportArgs) -> anyhow::Result<AssetDatabase> {
    match &args.db {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("read database {}", path.display()))?;
            let db = serde_json::from_str(&text)
                .with_context(|| format!("parse database {}", path.display()))?;
            Ok(db)
        }
        None => Ok(AssetDatabase::default()),
    }
}

fn init_tracing(quiet: bool, verbose: u8) {
    use tracing_subscriber::EnvFilter;
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
