use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use proxy_sheet::{Cli, Command, OutputLayout, Pipeline};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let page = cli.command.page().page_spec();

    let pages = match &cli.command {
        Command::Crop { output, input, .. } => {
            let grid = cli
                .command
                .grid_spec()
                .context("crop command without a grid")?;
            info!(
                input = %input.display(),
                output = %output.display(),
                columns = grid.columns,
                rows = grid.rows,
                skip = ?grid.skip,
                "cutting sheet"
            );
            Pipeline::new(page, OutputLayout::new(output))
                .run_sheet(input, &grid)
                .with_context(|| format!("Failed to process sheet: {:?}", input))?
        }
        Command::Join { output, dir, .. } => {
            info!(dir = %dir.display(), output = %output.display(), "joining folder");
            Pipeline::new(page, OutputLayout::new(output))
                .run_folder(dir)
                .with_context(|| format!("Failed to process folder: {:?}", dir))?
        }
    };

    info!(count = pages.len(), "done");
    for page in &pages {
        println!("{}", page.display());
    }

    Ok(())
}
