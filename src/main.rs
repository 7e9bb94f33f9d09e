use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use simplelog::{Config, LevelFilter, WriteLogger};

use studylens::heatmap::{self, HeatmapStyle};
use studylens::highlights::load_highlights_file;
use studylens::settings;
use studylens::synthetic;

#[derive(Parser)]
#[command(name = "studylens", about = "Selection heatmap tooling", version)]
struct Cli {
    /// Write logs to this file instead of discarding them
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StyleArg {
    Flat,
    Smoothed,
}

impl From<StyleArg> for HeatmapStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Flat => HeatmapStyle::Flat,
            StyleArg::Smoothed => HeatmapStyle::Smoothed,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Generate a synthetic highlight population as a JSON file
    Synthesize {
        /// Number of pages to cover
        #[arg(long, default_value_t = 8)]
        pages: u32,

        /// Uniformly random population instead of the patterned one
        #[arg(long)]
        random: bool,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Output JSON file
        #[arg(long)]
        out: PathBuf,
    },

    /// Render a heatmap overlay PNG from a highlights file
    Heatmap {
        /// Highlights JSON file (see `synthesize`)
        #[arg(long)]
        selections: PathBuf,

        /// Page to aggregate (1-based)
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Canvas width in pixels
        #[arg(long, default_value_t = 600)]
        width: u32,

        /// Canvas height in pixels
        #[arg(long, default_value_t = 800)]
        height: u32,

        /// Rendering fidelity
        #[arg(long, value_enum, default_value = "smoothed")]
        style: StyleArg,

        /// Output PNG file
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_path) = &cli.log_file {
        let log_file = File::create(log_path)
            .with_context(|| format!("failed to create log file {log_path:?}"))?;
        WriteLogger::init(LevelFilter::Debug, Config::default(), log_file)
            .context("failed to initialize logger")?;
    }

    settings::load_settings();

    match cli.command {
        Command::Synthesize {
            pages,
            random,
            seed,
            out,
        } => synthesize(pages, random, seed, &out),

        Command::Heatmap {
            selections,
            page,
            width,
            height,
            style,
            out,
        } => render_heatmap(&selections, page, width, height, style.into(), &out),
    }
}

fn synthesize(pages: u32, random: bool, seed: Option<u64>, out: &PathBuf) -> Result<()> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let highlights = if random {
        synthetic::generate_random(&mut rng, pages)
    } else {
        synthetic::generate_patterned(&mut rng, pages)
    };

    let content = serde_json::to_string_pretty(&highlights)
        .context("failed to serialize synthetic highlights")?;
    std::fs::write(out, content).with_context(|| format!("failed to write {out:?}"))?;

    info!("wrote {} synthetic highlights to {out:?}", highlights.len());
    println!("{} highlights -> {}", highlights.len(), out.display());
    Ok(())
}

fn render_heatmap(
    selections: &PathBuf,
    page: u32,
    width: u32,
    height: u32,
    style: HeatmapStyle,
    out: &PathBuf,
) -> Result<()> {
    let highlights = load_highlights_file(selections)
        .with_context(|| format!("failed to load highlights from {selections:?}"))?;
    if highlights.is_empty() {
        warn!("no highlights loaded from {selections:?}");
    }

    let grid_size = settings::settings().grid_size;
    let grid = heatmap::build_grid(&highlights, page, width, height, grid_size);
    let data = heatmap::HeatmapData {
        page_number: page,
        regions: heatmap::to_regions(&grid),
    };
    info!(
        "page {page}: {} hot cells, max intensity {}",
        data.regions.len(),
        grid.max_intensity()
    );

    let overlay = heatmap::render(&data.regions, style, grid.cell_size(), width, height);
    overlay
        .save(out)
        .with_context(|| format!("failed to write overlay to {out:?}"))?;

    println!(
        "page {page}: {} regions, max intensity {} -> {}",
        data.regions.len(),
        grid.max_intensity(),
        out.display()
    );
    Ok(())
}
