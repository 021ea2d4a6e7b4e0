use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(version, about)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the kustomization with the images used by its resources added to `images`
    ///
    /// Existing `images` entries are not consulted, running this on a kustomization that
    /// already lists an image appends a second entry for it.
    Discover { dir: PathBuf },
    /// Print the kustomization's resources with its `images` applied
    Build { dir: PathBuf },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut stdout = std::io::stdout().lock();
    match args.command {
        Command::Discover { dir } => imagetag::discover(&dir, &mut stdout)
            .with_context(|| format!("discovering images in {}", dir.display()))?,
        Command::Build { dir } => imagetag::build(&dir, &mut stdout)
            .with_context(|| format!("building {}", dir.display()))?,
    }

    Ok(())
}
