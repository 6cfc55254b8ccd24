use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "mascot", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the resolved (uncolored) layers as JSON.
    Layers(LayersArgs),
    /// Colorize and export the character as a PNG.
    Export(ExportArgs),
    /// Report required categories that are still unselected.
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
struct Inputs {
    /// Catalog JSON.
    #[arg(long)]
    catalog: PathBuf,

    /// Selection state JSON.
    #[arg(long)]
    state: PathBuf,
}

#[derive(Parser, Debug)]
struct LayersArgs {
    #[command(flatten)]
    inputs: Inputs,

    /// View direction (front, side, half-side, back); defaults to the state's own.
    #[arg(long)]
    direction: Option<mascot::Direction>,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    #[command(flatten)]
    inputs: Inputs,

    /// Directory that image paths in the catalog are resolved against.
    #[arg(long)]
    assets: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Named export preset (standard, hires, web, thumbnail).
    #[arg(long, conflicts_with = "scale")]
    preset: Option<mascot::ExportPreset>,

    /// Explicit resolution multiplier.
    #[arg(long)]
    scale: Option<f64>,

    /// View direction; defaults to the state's own.
    #[arg(long)]
    direction: Option<mascot::Direction>,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    #[command(flatten)]
    inputs: Inputs,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Layers(args) => cmd_layers(args),
        Command::Export(args) => cmd_export(args),
        Command::Check(args) => cmd_check(args),
    }
}

fn load(inputs: &Inputs) -> anyhow::Result<(mascot::Engine, mascot::SelectionState)> {
    let catalog = mascot::Catalog::from_path(&inputs.catalog)?;
    let state = mascot::SelectionState::from_path(&inputs.state)?;
    state
        .validate(&catalog)
        .with_context(|| format!("state '{}'", inputs.state.display()))?;
    let engine = mascot::Engine::new(catalog, mascot::EngineConfig::from_env())?;
    Ok((engine, state))
}

fn cmd_layers(args: LayersArgs) -> anyhow::Result<()> {
    let (engine, mut state) = load(&args.inputs)?;
    if let Some(direction) = args.direction {
        state = state.set_direction(direction);
    }
    let layers = engine.layers(&state);
    let json = serde_json::to_string_pretty(&layers).context("serialize layers")?;
    println!("{json}");
    Ok(())
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let (engine, mut state) = load(&args.inputs)?;
    if let Some(direction) = args.direction {
        state = state.set_direction(direction);
    }

    let missing = state.missing_required(engine.catalog());
    if !missing.is_empty() {
        anyhow::bail!(
            "character is incomplete; missing required categories: {}",
            join(&missing)
        );
    }

    let scale = args.preset.map(mascot::ExportPreset::scale).or(args.scale);
    let source = mascot::FsAssetSource::new(&args.assets);
    let png = engine.export_png(&state, &source, scale)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, png).with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let (engine, state) = load(&args.inputs)?;
    let missing = state.missing_required(engine.catalog());
    if missing.is_empty() {
        println!("complete");
        return Ok(());
    }
    for category in &missing {
        println!("missing {category}");
    }
    anyhow::bail!("{} required categories unselected", missing.len())
}

fn join(ids: &[mascot::CategoryId]) -> String {
    ids.iter()
        .map(mascot::CategoryId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
