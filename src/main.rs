use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

mod cache_bust;
mod error;
mod fetch;
mod images;
mod indices;
mod old_index;
mod output;
mod rajahinta;
mod tilasto;
mod types;
mod update;
mod utils;

#[derive(Parser)]
#[command(name = "hitas-tools")]
#[command(about = "Maintenance tools for the HITAS index site")]
struct Cli {
    /// Directory holding the dated indices-*.json files
    #[arg(long, global = true, env = "HITAS_DATA_DIR", default_value = "docs/data")]
    data_dir: PathBuf,

    /// Root of the published site
    #[arg(long, global = true, default_value = "docs")]
    docs_dir: PathBuf,

    /// Directory with the favicon sources
    #[arg(long, global = true, default_value = "public")]
    public_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download all HITAS PDFs and write a new dated indices JSON
    Update {
        /// Also repoint `const INDICES_FILE` in this HTML file
        #[arg(long, value_name = "HTML")]
        html: Option<PathBuf>,
    },
    /// Fetch and print the current rajaneliöhinta
    Rajahinta,
    /// Fetch and print the old market price index (pre-2011 apartments)
    OldIndex,
    /// Show the accumulated rajaneliöhinta history
    Tilasto {
        /// Write the series to this JSON file
        #[arg(short, long)]
        export: Option<PathBuf>,
    },
    /// Append ?v=<git revision> to CSS/JS references in the site's HTML
    CacheBust,
    /// Render favicon.svg to 16, 32 and 180 pixel PNGs
    Favicons,
    /// Render og-image.svg to a 1200x630 PNG
    OgImage {
        /// Directory holding og-image.svg
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Update { html } => update::run_update(&cli.data_dir, html.as_ref()),
        Commands::Rajahinta => rajahinta::run_rajahinta(),
        Commands::OldIndex => old_index::run_old_index(),
        Commands::Tilasto { export } => tilasto::run_tilasto(&cli.data_dir, export.as_deref()),
        Commands::CacheBust => cache_bust::run_cache_bust(&cli.docs_dir),
        Commands::Favicons => images::run_favicons(&cli.public_dir),
        Commands::OgImage { dir } => images::run_og_image(&dir),
    }
}
